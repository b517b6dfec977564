//! `defaults` subcommand — factory routing and unity gains.

use super::{GlobalOpts, Result, Session, WritesOutput};

pub(super) fn cmd_defaults(opts: &GlobalOpts, json: bool) -> Result<()> {
    let mut session = Session::open(opts)?;
    let writes = session.engine.apply_defaults()?;
    session.persist()?;

    if json {
        let output = WritesOutput {
            card_name: session.engine.profile().name.clone(),
            writes,
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return Ok(());
    }

    println!(
        "Restored defaults on {} ({writes} control(s) written)",
        session.engine.profile().name
    );
    Ok(())
}
