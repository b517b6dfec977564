//! `dump` subcommand — print the control list or save it as a snapshot.

use std::path::Path;

use super::{ControlSnapshot, GlobalOpts, Result, open_endpoint};

pub(super) fn cmd_dump(opts: &GlobalOpts, output: Option<&Path>, json: bool) -> Result<()> {
    let endpoint = open_endpoint(opts)?;
    let snapshot = ControlSnapshot::capture(&endpoint)?;

    if let Some(path) = output {
        snapshot.save(path)?;
        println!(
            "Saved {} controls of {} to {}",
            snapshot.controls.len(),
            snapshot.card_name,
            path.display()
        );
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot).unwrap());
        return Ok(());
    }

    println!("{} ({} controls)", snapshot.card_name, snapshot.controls.len());
    println!();
    for (idx, ctrl) in snapshot.controls.iter().enumerate() {
        let info = ctrl.info();
        let value = if info.caps.enumerated {
            match ctrl.items.get(ctrl.item as usize) {
                Some(name) => format!("{} ({name})", ctrl.item),
                None => ctrl.item.to_string(),
            }
        } else if let Some(centi) = ctrl.playback_db.first() {
            format!("{:.2} dB", *centi as f64 / 100.0)
        } else if let Some(on) = ctrl.capture_switch.first() {
            if *on { "on" } else { "off" }.to_string()
        } else {
            String::new()
        };
        println!("  {idx:>3}  {:<36}{:<20}{value}", info.name, info.caps.to_string());
    }
    Ok(())
}
