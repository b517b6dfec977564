//! `monitor` subcommand — follow the card and print value changes.

use std::collections::HashMap;
use std::sync::atomic::Ordering;

use super::{
    ControlEndpoint, ControlId, ControlKind, GlobalOpts, Interaction, MixerEngine, MixerError,
    Presenter, RUNNING, Result, Session, TickOutcome, Value, addressing, describe_value,
};

/// Prints each displayed value that differs from the last one shown.
///
/// Never echoes: the console is read-only.
pub(super) struct ConsolePresenter {
    last: HashMap<(ControlId, bool), Value>,
    items: HashMap<ControlId, Vec<String>>,
    /// Print changes; off while the initial state is collected.
    armed: bool,
    pub(super) changes: Vec<String>,
}

impl ConsolePresenter {
    pub(super) fn new(items: HashMap<ControlId, Vec<String>>) -> Self {
        ConsolePresenter {
            last: HashMap::new(),
            items,
            armed: false,
            changes: Vec::new(),
        }
    }

    pub(super) fn arm(&mut self) {
        self.armed = true;
    }

    pub(super) fn tracked(&self) -> usize {
        self.last.len()
    }
}

impl Presenter for ConsolePresenter {
    fn show(&mut self, id: ControlId, value: Value) -> Option<Interaction> {
        let key = (id, matches!(value, Value::Mute(_)));
        if self.last.insert(key, value) == Some(value) || !self.armed {
            return None;
        }
        let items = self.items.get(&id).map(Vec::as_slice).unwrap_or(&[]);
        let line = format!("{:<16}{}", id.to_string(), describe_value(value, items));
        println!("[mixer] {line}");
        self.changes.push(line);
        None
    }
}

/// Item names of every selector, fetched once.
fn selector_names<E: ControlEndpoint>(
    engine: &MixerEngine<E>,
) -> Result<HashMap<ControlId, Vec<String>>> {
    let mut names = HashMap::new();
    for id in addressing::all_controls(engine.profile()) {
        if id.kind() == ControlKind::Selector {
            names.insert(id, engine.selector_items(id)?);
        }
    }
    Ok(names)
}

pub(super) fn cmd_monitor(opts: &GlobalOpts, ticks: Option<u64>) -> Result<()> {
    let mut session = Session::open(opts)?;
    let engine = &mut session.engine;

    let mut console = ConsolePresenter::new(selector_names(&*engine)?);
    engine.refresh(&mut console)?;
    console.arm();

    println!(
        "Monitoring {} ({} profile, {} values). Press Ctrl+C to stop.",
        engine.profile().name,
        engine.profile_source(),
        console.tracked()
    );

    let interval = opts.poll_interval();
    let mut polls = 0u64;
    while RUNNING.load(Ordering::SeqCst) {
        if ticks.is_some_and(|max| polls >= max) {
            break;
        }
        if engine.tick(&mut console)? == TickOutcome::CloseRequested {
            eprintln!("[mixer] control endpoint failed, stopping");
            return Err(MixerError::Closed);
        }
        polls += 1;
        std::thread::sleep(interval);
    }

    engine.close();
    println!("Stopped ({} change(s) seen).", console.changes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scarlett_mixer_lib::config::HostConfig;
    use scarlett_mixer_lib::endpoint::mock;

    #[test]
    fn initial_refresh_is_silent_then_changes_print() {
        let mut engine = MixerEngine::open(mock::scarlett_18i6(), &HostConfig::default()).unwrap();
        let mut console = ConsolePresenter::new(selector_names(&engine).unwrap());
        engine.refresh(&mut console).unwrap();
        assert!(console.changes.is_empty());
        assert!(console.tracked() > 100);
        console.arm();

        // Unchanged hardware: nothing new.
        engine.refresh(&mut console).unwrap();
        assert!(console.changes.is_empty());

        engine.endpoint().with_control(13, |c| c.item = 2);
        engine.endpoint().with_control(1, |c| c.playback_switch = vec![false, false]);
        engine.refresh(&mut console).unwrap();
        assert_eq!(console.changes.len(), 2);
        assert!(console.changes[0].starts_with("capture:0"));
        assert!(console.changes[1].starts_with("bus:0"));
        assert!(console.changes[1].ends_with("muted"));
    }

    #[test]
    fn selector_names_cover_every_selector() {
        let engine = MixerEngine::open(mock::scarlett_18i6(), &HostConfig::default()).unwrap();
        let names = selector_names(&engine).unwrap();
        assert_eq!(names.len(), 18 + 18 + 6);
        assert_eq!(names[&ControlId::CaptureSource(0)].len(), 31);
    }
}
