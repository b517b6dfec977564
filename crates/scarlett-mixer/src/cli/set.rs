//! `get` / `set` subcommands — read or change one control.

use super::{
    ControlId, ControlKind, GlobalOpts, MixerError, Result, Session, Value, WriteOutcome,
    describe_value, gain,
};

/// Parse a command-line value for a control of `id`'s kind.
///
/// Gains take whole dB (`-6`, `-6dB`, `off`), gains with a mute also take
/// `mute`/`unmute`. Selectors take an item index or an item name, switches
/// `on`/`off`.
pub(super) fn parse_value(id: ControlId, raw: &str, items: &[String]) -> Result<Value> {
    let raw = raw.trim();
    let lower = raw.to_ascii_lowercase();
    let invalid = |hint: &str| MixerError::InvalidValue(format!("'{raw}' for {id}: expected {hint}"));

    match id.kind() {
        ControlKind::Selector => {
            if let Ok(item) = raw.parse::<u32>() {
                return Ok(Value::Selector(item));
            }
            items
                .iter()
                .position(|name| name.eq_ignore_ascii_case(raw))
                .and_then(|pos| u32::try_from(pos).ok())
                .map(Value::Selector)
                .ok_or_else(|| invalid("an item index or name"))
        }
        ControlKind::Gain { mutable } => match lower.as_str() {
            "mute" if mutable => Ok(Value::Mute(true)),
            "unmute" if mutable => Ok(Value::Mute(false)),
            "off" => Ok(Value::Gain(0.0)),
            _ => {
                let number = lower.strip_suffix("db").unwrap_or(lower.as_str()).trim();
                let db: i32 = number.parse().map_err(|_| {
                    if mutable {
                        invalid("dB, off, mute or unmute")
                    } else {
                        invalid("dB or off")
                    }
                })?;
                let db = db.clamp(gain::MIN_DB, gain::MAX_DB);
                Ok(Value::Gain(gain::db_to_knob(db as f32)))
            }
        },
        ControlKind::Switch => match lower.as_str() {
            "on" | "true" | "1" => Ok(Value::Switch(true)),
            "off" | "false" | "0" => Ok(Value::Switch(false)),
            _ => Err(invalid("on or off")),
        },
    }
}

fn absent(session: &Session, id: ControlId) -> MixerError {
    MixerError::InvalidValue(format!(
        "{id} does not exist on {}",
        session.engine.profile().name
    ))
}

pub(super) fn cmd_get(opts: &GlobalOpts, id: ControlId) -> Result<()> {
    let session = Session::open(opts)?;
    let engine = &session.engine;
    let Some(value) = engine.read(id)? else {
        return Err(absent(&session, id));
    };
    let items = engine.selector_items(id)?;
    match engine.read_mute(id)? {
        Some(muted) => println!(
            "{id} = {} ({})",
            describe_value(value, &items),
            describe_value(Value::Mute(muted), &[])
        ),
        None => println!("{id} = {}", describe_value(value, &items)),
    }
    Ok(())
}

pub(super) fn cmd_set(opts: &GlobalOpts, id: ControlId, raw: &str) -> Result<()> {
    let mut session = Session::open(opts)?;
    let items = session.engine.selector_items(id)?;
    let value = parse_value(id, raw, &items)?;

    match session.engine.write(id, value)? {
        WriteOutcome::Written => {
            session.persist()?;
            println!("{id} = {}", describe_value(value, &items));
            Ok(())
        }
        WriteOutcome::Absent => Err(absent(&session, id)),
        WriteOutcome::Suppressed => {
            log::warn!("[cli] write to {id} suppressed during an update");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<String> {
        ["Off", "Analog 1", "Analog 2"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    // ── Selectors ──

    #[test]
    fn selector_by_index_or_name() {
        let id = ControlId::CaptureSource(0);
        assert_eq!(parse_value(id, "2", &items()).unwrap(), Value::Selector(2));
        assert_eq!(
            parse_value(id, "analog 1", &items()).unwrap(),
            Value::Selector(1)
        );
        assert!(parse_value(id, "ADAT 9", &items()).is_err());
    }

    // ── Gains ──

    #[test]
    fn gain_in_db() {
        let id = ControlId::MatrixGain { row: 0, col: 0 };
        let Value::Gain(k) = parse_value(id, "-6dB", &[]).unwrap() else {
            panic!("expected a gain");
        };
        assert_eq!(gain::knob_to_db(k), -6);
        assert_eq!(parse_value(id, "off", &[]).unwrap(), Value::Gain(0.0));
    }

    #[test]
    fn gain_is_clamped() {
        let id = ControlId::AuxGain(0);
        let Value::Gain(k) = parse_value(id, "40", &[]).unwrap() else {
            panic!("expected a gain");
        };
        assert_eq!(gain::knob_to_db(k), gain::MAX_DB);
    }

    #[test]
    fn mute_only_where_there_is_one() {
        assert_eq!(
            parse_value(ControlId::BusGain(1), "mute", &[]).unwrap(),
            Value::Mute(true)
        );
        assert_eq!(
            parse_value(ControlId::MasterGain, "UNMUTE", &[]).unwrap(),
            Value::Mute(false)
        );
        let err = parse_value(ControlId::AuxGain(0), "mute", &[]).unwrap_err();
        assert!(matches!(err, MixerError::InvalidValue(_)));
    }

    // ── Switches ──

    #[test]
    fn switch_words() {
        let id = ControlId::Air(1);
        assert_eq!(parse_value(id, "on", &[]).unwrap(), Value::Switch(true));
        assert_eq!(parse_value(id, "0", &[]).unwrap(), Value::Switch(false));
        assert!(parse_value(id, "maybe", &[]).is_err());
    }
}
