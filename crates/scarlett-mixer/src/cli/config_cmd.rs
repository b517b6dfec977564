//! `config` subcommand — show resolved configuration and file paths.

use super::{Config, ConfigOutput, GlobalOpts, Result, kv, kv_indent, kv_width};

pub(super) fn cmd_config(opts: &GlobalOpts, json: bool) -> Result<()> {
    let config = &opts.config;
    let config_path = opts.config_path.clone().or_else(Config::path);
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());
    let problems: Vec<String> = match config.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    };

    if json {
        let output = ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            settings: config.clone(),
            problems,
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return Ok(());
    }

    // Human-readable output
    let w = kv_width(
        &["Config file:", "Snapshot:"],
        &["device:", "autodetect:", "verbose:", "poll_interval_ms:"],
    );

    match &config_path {
        Some(p) => {
            if config_exists {
                kv("Config file:", format_args!("{} (loaded)", p.display()), w);
            } else {
                kv(
                    "Config file:",
                    format_args!("{} (not found, using defaults)", p.display()),
                    w,
                );
            }
        }
        None => kv("Config file:", "(no config directory)", w),
    }
    if let Some(snapshot) = &opts.snapshot {
        kv("Snapshot:", snapshot.display(), w);
    }
    println!();

    println!("Settings:");
    kv_indent("device:", &config.device, w);
    kv_indent("autodetect:", config.autodetect, w);
    kv_indent("verbose:", config.verbose, w);
    kv_indent("poll_interval_ms:", config.poll_interval_ms, w);

    if !problems.is_empty() {
        println!();
        println!("Problems:");
        for p in &problems {
            println!("  {p}");
        }
    }
    Ok(())
}
