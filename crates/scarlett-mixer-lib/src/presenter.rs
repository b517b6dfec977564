//! Presenter — the interface between the engine and whatever displays values.
//!
//! The engine pushes hardware values out through [`Presenter::show`]. Many
//! toolkits fire their change callback even for programmatic updates; a
//! presenter models that by returning the resulting [`Interaction`], which
//! the engine feeds back through its normal write path so the echo guard
//! can drop it.

use serde::Serialize;

use crate::addressing::ControlId;

/// A value as shown to (or entered by) the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum Value {
    /// Dial position in `[0, 1]`.
    Gain(f32),
    /// `true` = muted.
    Mute(bool),
    /// Enumerated item index.
    Selector(u32),
    Switch(bool),
}

/// A user (or echoed) change to one control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interaction {
    pub id: ControlId,
    pub value: Value,
}

impl Interaction {
    pub fn new(id: ControlId, value: Value) -> Self {
        Self { id, value }
    }
}

/// Receives values read from hardware.
pub trait Presenter {
    /// Display `value` for `id`. Returns the change notification the display
    /// raised in response, if any.
    fn show(&mut self, id: ControlId, value: Value) -> Option<Interaction>;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn show(&mut self, _id: ControlId, _value: Value) -> Option<Interaction> {
        None
    }
}

/// Keeps the most recent value of every control it was shown.
#[derive(Debug, Default, Clone)]
pub struct StatePresenter {
    values: Vec<(ControlId, Value)>,
    updates: usize,
}

impl StatePresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest value shown for `id`, preferring the non-mute value of gains.
    pub fn get(&self, id: ControlId) -> Option<Value> {
        self.values
            .iter()
            .find(|(i, v)| *i == id && !matches!(v, Value::Mute(_)))
            .or_else(|| self.values.iter().find(|(i, _)| *i == id))
            .map(|&(_, v)| v)
    }

    /// Latest mute state shown for `id`.
    pub fn muted(&self, id: ControlId) -> Option<bool> {
        self.values.iter().find_map(|&(i, v)| match v {
            Value::Mute(m) if i == id => Some(m),
            _ => None,
        })
    }

    /// Every shown `(id, value)` in first-seen order.
    pub fn values(&self) -> &[(ControlId, Value)] {
        &self.values
    }

    /// Total number of `show` calls.
    pub fn updates(&self) -> usize {
        self.updates
    }
}

impl Presenter for StatePresenter {
    fn show(&mut self, id: ControlId, value: Value) -> Option<Interaction> {
        self.updates += 1;
        let same_slot = |v: &Value| matches!(v, Value::Mute(_)) == matches!(value, Value::Mute(_));
        match self
            .values
            .iter_mut()
            .find(|(i, v)| *i == id && same_slot(v))
        {
            Some(slot) => slot.1 = value,
            None => self.values.push((id, value)),
        }
        None
    }
}

/// Presenter doubles for tests.
#[doc(hidden)]
pub mod mock {
    use super::*;

    /// Records every `show` call and, when `echo` is set, answers each one
    /// with the same value as an interaction.
    #[derive(Debug, Default)]
    pub struct EchoingPresenter {
        pub shown: Vec<Interaction>,
        pub echo: bool,
    }

    impl EchoingPresenter {
        pub fn echoing() -> Self {
            Self {
                shown: Vec::new(),
                echo: true,
            }
        }
    }

    impl Presenter for EchoingPresenter {
        fn show(&mut self, id: ControlId, value: Value) -> Option<Interaction> {
            let interaction = Interaction::new(id, value);
            self.shown.push(interaction);
            self.echo.then_some(interaction)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_presenter_never_echoes() {
        let mut p = NullPresenter;
        assert_eq!(p.show(ControlId::MasterGain, Value::Gain(0.5)), None);
    }

    #[test]
    fn state_presenter_keeps_latest() {
        let mut p = StatePresenter::new();
        p.show(ControlId::BusGain(0), Value::Gain(0.2));
        p.show(ControlId::BusGain(0), Value::Mute(true));
        p.show(ControlId::BusGain(0), Value::Gain(0.7));
        assert_eq!(p.get(ControlId::BusGain(0)), Some(Value::Gain(0.7)));
        assert_eq!(p.muted(ControlId::BusGain(0)), Some(true));
        assert_eq!(p.values().len(), 2);
        assert_eq!(p.updates(), 3);
    }

    #[test]
    fn state_presenter_unknown_control() {
        let p = StatePresenter::new();
        assert_eq!(p.get(ControlId::HiZ(0)), None);
        assert_eq!(p.muted(ControlId::HiZ(0)), None);
    }

    #[test]
    fn echoing_presenter_returns_same_value() {
        let mut p = mock::EchoingPresenter::echoing();
        let echo = p.show(ControlId::CaptureSource(3), Value::Selector(7));
        assert_eq!(
            echo,
            Some(Interaction::new(ControlId::CaptureSource(3), Value::Selector(7)))
        );
        assert_eq!(p.shown.len(), 1);
    }

    #[test]
    fn value_serializes_tagged() {
        let json = serde_json::to_string(&Value::Selector(4)).unwrap();
        assert_eq!(json, r#"{"type":"selector","value":4}"#);
    }
}
