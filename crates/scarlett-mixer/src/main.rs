//! scarlett-mixer — matrix mixer control for Focusrite Scarlett USB interfaces.
//!
//! Talks to the card's ALSA control list (with the `alsa` feature) or to a
//! JSON snapshot of it (`--snapshot`), so everything except `monitor` on
//! real hardware also works offline.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{ArgAction, Parser};

mod cli;

/// Shared shutdown flag — set by Ctrl+C handler.
pub static RUNNING: AtomicBool = AtomicBool::new(true);

#[derive(Parser)]
#[command(
    name = "scarlett-mixer",
    version,
    about = "Matrix mixer control for Focusrite Scarlett USB interfaces"
)]
struct Args {
    /// Output as JSON (for devices, probe, detect, dump, reset, defaults, config)
    #[arg(long, global = true)]
    json: bool,

    /// ALSA device of the card, e.g. hw:2 (default: from config)
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// Only use the built-in model table, never derive a layout
    #[arg(long, global = true)]
    preset_only: bool,

    /// More output: -v info, -vv debug and control list, -vvv trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Use a control snapshot (from `dump`) instead of hardware
    #[arg(long, global = true, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Config file to read instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: cli::Command,
}

fn main() {
    let args = Args::parse();

    // Config is read before the logger exists; its warnings are replayed below.
    let (config, warnings) = cli::load_config(args.config.as_deref());
    let verbose = args.verbose.max(config.verbose);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli::log_filter(verbose)))
        .format_timestamp(None)
        .format_target(false)
        .init();

    for w in &warnings {
        log::warn!("{w}");
    }

    ctrlc::set_handler(move || {
        RUNNING.store(false, Ordering::SeqCst);
    })
    .ok();

    let opts = cli::GlobalOpts::resolve(
        config,
        cli::Overrides {
            device: args.device,
            preset_only: args.preset_only,
            verbose,
            snapshot: args.snapshot,
            config_path: args.config,
        },
    );

    if let Err(e) = cli::run(args.command, &opts, args.json) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
