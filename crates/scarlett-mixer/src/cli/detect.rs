//! `detect` subcommand — derive a layout from a snapshot file (no hardware required).

use std::path::Path;

use super::{
    ControlSnapshot, DetectOutput, GlobalOpts, ProfileSource, Result, kv, kv_indent, kv_width,
};
use scarlett_mixer_lib::context::MixerContext;
use scarlett_mixer_lib::{detect, models};

pub(super) fn cmd_detect(opts: &GlobalOpts, snapshot_file: &Path, json: bool) -> Result<()> {
    let snapshot = ControlSnapshot::load(snapshot_file)?;
    let infos = snapshot.infos();
    let candidate = detect::detect(&snapshot.card_name, &infos);
    let missing = candidate.missing_fields();
    let has_static = models::lookup(&snapshot.card_name).is_some();
    let adopted = match MixerContext::resolve(&snapshot.card_name, &infos, opts.config.autodetect) {
        Ok(ctx) => Some(ctx.source),
        Err(e) => {
            log::info!("[detect] {e}");
            None
        }
    };

    if json {
        let output = DetectOutput {
            card_name: snapshot.card_name.clone(),
            control_count: infos.len(),
            complete: missing.is_empty(),
            missing,
            has_static_profile: has_static,
            adopted,
            candidate,
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return Ok(());
    }

    let w = kv_width(
        &["Card:", "Controls:", "Candidate:", "Built-in layout:", "Would use:"],
        &[
            "Matrix:",
            "Capture inputs:",
            "Output buses:",
            "Stereo buses:",
            "Aux buses:",
            "Master:",
            "Hi-Z / Pad / Air:",
        ],
    );

    kv("Card:", &snapshot.card_name, w);
    kv("Controls:", infos.len(), w);
    if missing.is_empty() {
        kv("Candidate:", "complete", w);
    } else {
        kv(
            "Candidate:",
            format_args!("incomplete (missing {})", missing.join(", ")),
            w,
        );
    }
    kv("Built-in layout:", if has_static { "yes" } else { "no" }, w);
    let verdict = match adopted {
        Some(ProfileSource::Detected) => "derived layout",
        Some(ProfileSource::Static) => "built-in layout",
        None => "nothing (unsupported)",
    };
    kv("Would use:", verdict, w);
    println!();

    println!("Derived layout:");
    let c = &candidate;
    kv_indent(
        "Matrix:",
        format_args!(
            "{} x {} at {} (stride {})",
            c.matrix_inputs, c.matrix_outputs, c.matrix_offset, c.matrix_stride
        ),
        w,
    );
    kv_indent(
        "Capture inputs:",
        format_args!("{} at {}", c.capture_inputs, c.capture_offset),
        w,
    );
    kv_indent("Output buses:", c.output_buses, w);
    kv_indent("Stereo buses:", c.stereo_buses, w);
    kv_indent("Aux buses:", c.aux_buses, w);
    match c.master {
        Some(idx) => kv_indent("Master:", idx, w),
        None => kv_indent("Master:", "none", w),
    }
    kv_indent(
        "Hi-Z / Pad / Air:",
        format_args!("{} / {} / {}", c.hiz_count, c.pad_count, c.air_count),
        w,
    );
    Ok(())
}
