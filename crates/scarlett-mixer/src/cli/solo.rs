//! `solo` subcommand — route a single matrix cell within its row.

use super::{ControlId, GlobalOpts, MixerError, Result, Session, WritesOutput, describe_value};

pub(super) fn cmd_solo(opts: &GlobalOpts, row: usize, col: usize, json: bool) -> Result<()> {
    let mut session = Session::open(opts)?;
    let id = ControlId::MatrixGain { row, col };
    if session.engine.read(id)?.is_none() {
        let p = session.engine.profile();
        return Err(MixerError::InvalidValue(format!(
            "{id} is outside the {} x {} matrix",
            p.matrix_inputs, p.matrix_outputs
        )));
    }

    let writes = session.engine.solo_matrix_cell(row, col)?;
    session.persist()?;

    if json {
        let output = WritesOutput {
            card_name: session.engine.profile().name.clone(),
            writes,
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return Ok(());
    }

    let now = session
        .engine
        .read(id)?
        .map(|v| describe_value(v, &[]))
        .unwrap_or_default();
    println!("{id} = {now} ({writes} cell(s) changed)");
    Ok(())
}
