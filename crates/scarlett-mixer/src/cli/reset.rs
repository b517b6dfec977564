//! `reset` subcommand — re-send every control value to the card.

use super::{GlobalOpts, Result, ResetOutput, Session, kv, kv_width};

pub(super) fn cmd_reset(opts: &GlobalOpts, json: bool) -> Result<()> {
    let mut session = Session::open(opts)?;
    let report = session.engine.force_update()?;
    session.persist()?;

    if json {
        let output = ResetOutput {
            card_name: session.engine.profile().name.clone(),
            total: report.total(),
            report,
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return Ok(());
    }

    let w = kv_width(&["Selectors:", "Gains:", "Mutes:", "Switches:"], &[]);
    println!("Re-sent {} value(s):", report.total());
    kv("Selectors:", report.selectors, w);
    kv("Gains:", report.gains, w);
    kv("Mutes:", report.mutes, w);
    kv("Switches:", report.switches, w);
    Ok(())
}
