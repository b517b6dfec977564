//! `probe` subcommand — open the card and show the layout the mixer will use.

use super::{
    ControlEndpoint, ControlId, GlobalOpts, ProbeOutput, Result, Session, kv, kv_indent, kv_width,
};
use scarlett_mixer_lib::profile::{DeviceProfile, MatrixOrder};

fn device_label(opts: &GlobalOpts) -> String {
    match &opts.snapshot {
        Some(path) => format!("snapshot {}", path.display()),
        None => opts.config.device.clone(),
    }
}

fn gain_slots(p: &DeviceProfile, first: usize, count: usize) -> String {
    if count == 0 {
        return "none".into();
    }
    let labels: Vec<String> = (first..first + count).map(|n| p.gain_label(n)).collect();
    format!("{count} ({})", labels.join(", "))
}

fn slots_or_none(count: usize) -> String {
    if count == 0 {
        "none".into()
    } else {
        count.to_string()
    }
}

pub(super) fn cmd_probe(opts: &GlobalOpts, json: bool) -> Result<()> {
    let session = Session::open(opts)?;
    let engine = &session.engine;
    let ctx = engine.context();
    let p = engine.profile();
    let master_range = engine.db_range(ControlId::MasterGain)?;

    if json {
        let output = ProbeOutput {
            card_name: engine.endpoint().card_name().to_string(),
            device: device_label(opts),
            control_count: ctx.control_count,
            profile_source: ctx.source,
            candidate_missing: ctx.candidate_missing.clone(),
            master_db_range: master_range,
            profile: p.clone(),
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return Ok(());
    }

    let w = kv_width(
        &["Card:", "Device:", "Controls:", "Profile:", "Autodetect:"],
        &[
            "Matrix:",
            "Cells:",
            "Sources:",
            "Capture inputs:",
            "Output buses:",
            "Stereo buses:",
            "Aux buses:",
            "Master:",
            "Hi-Z:",
            "Pad:",
            "Air:",
        ],
    );

    kv("Card:", engine.endpoint().card_name(), w);
    kv("Device:", device_label(opts), w);
    kv("Controls:", ctx.control_count, w);
    kv("Profile:", ctx.source, w);
    if !ctx.candidate_missing.is_empty() {
        kv(
            "Autodetect:",
            format_args!("incomplete (missing {})", ctx.candidate_missing.join(", ")),
            w,
        );
    }
    println!();

    println!("Layout:");
    let order = match p.matrix_order {
        MatrixOrder::RowMajor => "row-major",
        MatrixOrder::ColumnMajor => "column-major",
    };
    kv_indent(
        "Matrix:",
        format_args!("{} x {} ({order})", p.matrix_inputs, p.matrix_outputs),
        w,
    );
    kv_indent(
        "Cells:",
        format_args!("from {}, stride {}", p.matrix_offset, p.matrix_stride),
        w,
    );
    kv_indent(
        "Sources:",
        format_args!("from {}, stride {}", p.matrix_in_offset, p.matrix_in_stride),
        w,
    );
    kv_indent(
        "Capture inputs:",
        format_args!("{} from {}", p.capture_inputs, p.capture_offset),
        w,
    );
    kv_indent("Output buses:", slots_or_none(p.output_buses), w);
    kv_indent("Stereo buses:", gain_slots(p, 0, p.stereo_buses), w);
    kv_indent(
        "Aux buses:",
        gain_slots(p, p.stereo_buses, p.aux_buses),
        w,
    );
    match (p.master, master_range) {
        (Some(idx), Some((min, max))) => {
            kv_indent("Master:", format_args!("{idx} ({min}..{max} dB)"), w)
        }
        (Some(idx), None) => kv_indent("Master:", idx, w),
        (None, _) => kv_indent("Master:", "none", w),
    }
    kv_indent("Hi-Z:", slots_or_none(p.hiz_count), w);
    let pad_kind = if p.pads_are_switches && p.pad_count > 0 {
        " (switches)"
    } else {
        ""
    };
    kv_indent(
        "Pad:",
        format_args!("{}{pad_kind}", slots_or_none(p.pad_count)),
        w,
    );
    kv_indent("Air:", slots_or_none(p.air_count), w);

    if opts.config.verbose >= 1 {
        println!();
        println!("Controls:");
        for (idx, ctrl) in engine.endpoint().controls().iter().enumerate() {
            println!("  {idx:>3}  {:<36}{}", ctrl.name, ctrl.caps);
        }
    }

    Ok(())
}
