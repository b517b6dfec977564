//! Synchronization engine — keeps hardware controls and the presenter in step.
//!
//! Hardware → presenter: [`MixerEngine::tick`] checks the endpoint without
//! blocking, drains pending events and pushes every control's current
//! value to the presenter. Presenter → hardware: [`MixerEngine::handle_interaction`]
//! resolves the logical control and writes it.
//!
//! While values are being pushed out the [`EchoGuard`] is engaged, and any
//! interaction arriving through the write path is dropped instead of being
//! written back.

use std::cell::Cell;
use std::rc::Rc;

use serde::Serialize;

use crate::addressing::{self, ControlId, ControlKind};
use crate::config::HostConfig;
use crate::context::{MixerContext, ProfileSource};
use crate::endpoint::{ControlEndpoint, MAX_CHANNELS, Readiness};
use crate::error::{MixerError, Result};
use crate::gain::{GainValue, MIN_DB, UNITY_DB, db_to_centi, db_to_knob, knob_to_db};
use crate::models;
use crate::presenter::{Interaction, Presenter, Value};
use crate::profile::DeviceProfile;

// ── Echo guard ──

/// Shared "programmatic update in progress" flag.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct EchoGuard {
    engaged: Rc<Cell<bool>>,
}

impl EchoGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.get()
    }

    /// Engage the guard. Returns `None` if it is already engaged.
    ///
    /// The guard is released when the returned [`Suppression`] is dropped.
    pub fn engage(&self) -> Option<Suppression> {
        if self.engaged.replace(true) {
            return None;
        }
        Some(Suppression {
            engaged: Rc::clone(&self.engaged),
        })
    }
}

/// Holds the echo guard engaged until dropped.
#[must_use = "the guard is released as soon as this is dropped"]
#[derive(Debug)]
pub struct Suppression {
    engaged: Rc<Cell<bool>>,
}

impl Drop for Suppression {
    fn drop(&mut self) {
        self.engaged.set(false);
    }
}

// ── States and outcomes ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineState {
    /// Opened, waiting for events or interactions.
    Ready,
    /// Draining events and pushing values to the presenter.
    Polling,
    /// Writing a user change to hardware.
    Writing,
    /// Endpoint released; no further reads or writes.
    Closed,
}

/// Counters from one refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshStats {
    /// Values pushed to the presenter.
    pub shown: usize,
    /// Presenter notifications dropped by the echo guard.
    pub echoes_dropped: usize,
}

/// Result of one [`MixerEngine::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No events pending.
    Idle,
    /// Events were drained and the presenter updated.
    Refreshed(RefreshStats),
    /// The endpoint failed; the engine is now closed.
    CloseRequested,
}

/// Result of a write request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteOutcome {
    Written,
    /// Dropped because the echo guard was engaged.
    Suppressed,
    /// The profile does not define this control; nothing was written.
    Absent,
}

/// How a switch-kind control is driven on this card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SwitchMode {
    Capture,
    Enumerated,
    Playback,
}

// ── Engine ──

/// Owns the endpoint and the active profile for one session.
pub struct MixerEngine<E: ControlEndpoint> {
    endpoint: E,
    context: MixerContext,
    state: EngineState,
    echo: EchoGuard,
}

impl<E: ControlEndpoint> MixerEngine<E> {
    /// Resolve the profile for `endpoint` and take ownership of it.
    pub fn open(endpoint: E, host: &HostConfig) -> Result<Self> {
        let context = MixerContext::from_endpoint(&endpoint, host.autodetect)?;
        log::info!(
            "[engine] {} — {} profile, {} controls",
            endpoint.card_name(),
            context.source,
            context.control_count
        );
        if host.verbose >= 2 {
            for (idx, ctrl) in endpoint.controls().iter().enumerate() {
                log::debug!("[engine] {idx:>3} {:<36} {}", ctrl.name, ctrl.caps);
            }
        }
        Ok(MixerEngine {
            endpoint,
            context,
            state: EngineState::Ready,
            echo: EchoGuard::new(),
        })
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.context.profile
    }

    pub fn profile_source(&self) -> ProfileSource {
        self.context.source
    }

    pub fn context(&self) -> &MixerContext {
        &self.context
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    /// A handle on the echo guard (shares state with the engine's).
    pub fn echo_guard(&self) -> EchoGuard {
        self.echo.clone()
    }

    /// Release the endpoint. Further reads and writes fail with [`MixerError::Closed`].
    pub fn close(&mut self) {
        if self.state != EngineState::Closed {
            log::info!("[engine] closing {}", self.endpoint.card_name());
        }
        self.state = EngineState::Closed;
    }

    /// Close and hand back the endpoint.
    pub fn into_endpoint(mut self) -> E {
        self.close();
        self.endpoint
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.state == EngineState::Closed {
            return Err(MixerError::Closed);
        }
        Ok(())
    }

    pub(crate) fn set_state(&mut self, state: EngineState) {
        if self.state != EngineState::Closed {
            self.state = state;
        }
    }

    /// Control index for `id`; `None` when the profile does not define it.
    pub(crate) fn index_of(&self, id: ControlId) -> Result<Option<usize>> {
        let count = self.endpoint.controls().len();
        match addressing::resolve(&self.context.profile, id) {
            Some(index) if index >= count => Err(MixerError::MissingControl { index, count }),
            other => Ok(other),
        }
    }

    // ── Reads ──

    /// Current value of `id` (gain controls report their dial position).
    pub fn read(&self, id: ControlId) -> Result<Option<Value>> {
        self.ensure_open()?;
        let Some(idx) = self.index_of(id)? else {
            return Ok(None);
        };
        let value = match id.kind() {
            ControlKind::Selector => Value::Selector(self.endpoint.enum_item(idx)?),
            ControlKind::Gain { .. } => Value::Gain(self.read_gain(idx)?.knob),
            ControlKind::Switch => Value::Switch(self.read_switch(id, idx)?),
        };
        Ok(Some(value))
    }

    /// Mute state of a gain with a mute; `None` for anything else.
    pub fn read_mute(&self, id: ControlId) -> Result<Option<bool>> {
        self.ensure_open()?;
        if id.kind() != (ControlKind::Gain { mutable: true }) {
            return Ok(None);
        }
        let Some(idx) = self.index_of(id)? else {
            return Ok(None);
        };
        Ok(Some(!self.endpoint.playback_switch(idx, 0)?))
    }

    /// Integer dB of a gain control.
    pub fn read_db(&self, id: ControlId) -> Result<Option<i32>> {
        self.ensure_open()?;
        if !matches!(id.kind(), ControlKind::Gain { .. }) {
            return Ok(None);
        }
        let Some(idx) = self.index_of(id)? else {
            return Ok(None);
        };
        Ok(Some(self.read_gain(idx)?.db))
    }

    /// Item names of a selector; empty for anything else.
    pub fn selector_items(&self, id: ControlId) -> Result<Vec<String>> {
        self.ensure_open()?;
        if id.kind() != ControlKind::Selector {
            return Ok(Vec::new());
        }
        match self.index_of(id)? {
            Some(idx) => Ok(self.endpoint.enum_items(idx)?),
            None => Ok(Vec::new()),
        }
    }

    /// Gain range of a control in integer dB.
    pub fn db_range(&self, id: ControlId) -> Result<Option<(i32, i32)>> {
        self.ensure_open()?;
        if !matches!(id.kind(), ControlKind::Gain { .. }) {
            return Ok(None);
        }
        let Some(idx) = self.index_of(id)? else {
            return Ok(None);
        };
        let (min, max) = self.endpoint.playback_db_range(idx)?;
        let to_db = |c: i64| i32::try_from(c / 100).unwrap_or(if c < 0 { i32::MIN } else { i32::MAX });
        Ok(Some((to_db(min), to_db(max))))
    }

    fn read_gain(&self, idx: usize) -> Result<GainValue> {
        Ok(GainValue::from_centi(self.endpoint.playback_db(idx, 0)?))
    }

    pub(crate) fn switch_mode(&self, id: ControlId, idx: usize) -> Result<SwitchMode> {
        let caps = self.endpoint.controls()[idx].caps;
        let pad_switch = matches!(id, ControlId::Pad(_)) && self.context.profile.pads_are_switches;
        if pad_switch || (caps.capture_switch && !caps.enumerated) {
            Ok(SwitchMode::Capture)
        } else if caps.enumerated {
            Ok(SwitchMode::Enumerated)
        } else if caps.playback_switch {
            Ok(SwitchMode::Playback)
        } else {
            Err(MixerError::InvalidValue(format!(
                "{id}: control {idx} has no switch"
            )))
        }
    }

    pub(crate) fn read_switch(&self, id: ControlId, idx: usize) -> Result<bool> {
        let on = match self.switch_mode(id, idx)? {
            SwitchMode::Capture => self.endpoint.capture_switch(idx, 0)?,
            SwitchMode::Enumerated => self.endpoint.enum_item(idx)? != 0,
            SwitchMode::Playback => self.endpoint.playback_switch(idx, 0)?,
        };
        Ok(on)
    }

    // ── Hardware → presenter ──

    /// Check for hardware events without blocking; on events, drain them and
    /// refresh the presenter.
    ///
    /// Endpoint failures close the engine and yield
    /// [`TickOutcome::CloseRequested`].
    pub fn tick(&mut self, presenter: &mut impl Presenter) -> Result<TickOutcome> {
        self.ensure_open()?;
        match self.endpoint.poll_ready() {
            Ok(Readiness::Idle) => return Ok(TickOutcome::Idle),
            Ok(Readiness::Pending) => {}
            Ok(Readiness::Faulted(reason)) => return Ok(self.fail(&reason)),
            Err(e) => return Ok(self.fail(&e.to_string())),
        }
        self.set_state(EngineState::Polling);
        match self.endpoint.handle_events() {
            Ok(n) => log::trace!("[engine] handled {n} event(s)"),
            Err(e) => return Ok(self.fail(&e.to_string())),
        }
        let stats = self.refresh(presenter)?;
        Ok(TickOutcome::Refreshed(stats))
    }

    fn fail(&mut self, reason: &str) -> TickOutcome {
        log::error!("[engine] endpoint failed: {reason}");
        self.close();
        TickOutcome::CloseRequested
    }

    /// Push every control's current value to `presenter`.
    ///
    /// Order: capture selectors, matrix rows, stereo buses (gain then mute),
    /// aux buses, master, switches, output bus selectors.
    pub fn refresh(&mut self, presenter: &mut impl Presenter) -> Result<RefreshStats> {
        self.ensure_open()?;
        let Some(_suppress) = self.echo.engage() else {
            log::debug!("[engine] refresh already in progress");
            return Ok(RefreshStats::default());
        };
        self.set_state(EngineState::Polling);
        let result = self.push_values(presenter);
        self.set_state(EngineState::Ready);
        result
    }

    fn push_values(&mut self, presenter: &mut impl Presenter) -> Result<RefreshStats> {
        let mut stats = RefreshStats::default();
        for id in addressing::all_controls(&self.context.profile) {
            let Some(value) = self.read(id)? else {
                continue;
            };
            let mut shown = vec![value];
            if let Some(muted) = self.read_mute(id)? {
                shown.push(Value::Mute(muted));
            }
            for value in shown {
                stats.shown += 1;
                if let Some(echo) = presenter.show(id, value)
                    && self.handle_interaction(echo)? == WriteOutcome::Suppressed
                {
                    stats.echoes_dropped += 1;
                }
            }
        }
        log::trace!(
            "[engine] refreshed {} value(s), dropped {} echo(es)",
            stats.shown,
            stats.echoes_dropped
        );
        Ok(stats)
    }

    // ── Presenter → hardware ──

    /// Write a user change to hardware.
    ///
    /// Dropped while the echo guard is engaged. A control the profile does
    /// not define is a no-op.
    pub fn handle_interaction(&mut self, interaction: Interaction) -> Result<WriteOutcome> {
        let Interaction { id, value } = interaction;
        if self.echo.is_engaged() {
            log::trace!("[engine] dropping echo {id} = {value:?}");
            return Ok(WriteOutcome::Suppressed);
        }
        self.ensure_open()?;
        let Some(idx) = self.index_of(id)? else {
            log::debug!("[engine] {id} not defined on this card");
            return Ok(WriteOutcome::Absent);
        };
        let previous = self.state;
        self.set_state(EngineState::Writing);
        let result = self.apply(id, idx, value);
        self.set_state(previous);
        result?;
        log::debug!("[engine] {id} ← {value:?}");
        Ok(WriteOutcome::Written)
    }

    /// Shorthand for [`handle_interaction`](Self::handle_interaction).
    pub fn write(&mut self, id: ControlId, value: Value) -> Result<WriteOutcome> {
        self.handle_interaction(Interaction::new(id, value))
    }

    fn apply(&self, id: ControlId, idx: usize, value: Value) -> Result<()> {
        match (id.kind(), value) {
            (ControlKind::Selector, Value::Selector(item)) => self.write_item(idx, item),
            (ControlKind::Gain { .. }, Value::Gain(knob)) => {
                self.write_db(idx, db_to_centi(knob_to_db(knob)))
            }
            (ControlKind::Gain { mutable: true }, Value::Mute(muted)) => {
                self.write_mute(idx, muted)
            }
            (ControlKind::Switch, Value::Switch(on)) => self.write_switch(id, idx, on),
            (_, value) => Err(MixerError::InvalidValue(format!(
                "{value:?} does not fit {id}"
            ))),
        }
    }

    pub(crate) fn write_item(&self, idx: usize, item: u32) -> Result<()> {
        let count = self.endpoint.enum_item_count(idx)?;
        if item >= count {
            return Err(MixerError::InvalidValue(format!(
                "item {item} out of range (control {idx} has {count})"
            )));
        }
        self.endpoint.set_enum_item(idx, item)?;
        Ok(())
    }

    /// Playback and (where present) capture sub-elements on channels `0..MAX_CHANNELS`.
    pub(crate) fn write_db(&self, idx: usize, centi_db: i64) -> Result<()> {
        for ch in 0..MAX_CHANNELS {
            if self.endpoint.has_playback_channel(idx, ch) {
                self.endpoint.set_playback_db(idx, ch, centi_db)?;
            }
            if self.endpoint.has_capture_channel(idx, ch) {
                self.endpoint.set_capture_db(idx, ch, centi_db)?;
            }
        }
        Ok(())
    }

    /// Mute is the inverted playback switch.
    pub(crate) fn write_mute(&self, idx: usize, muted: bool) -> Result<()> {
        for ch in 0..MAX_CHANNELS {
            if self.endpoint.has_playback_channel(idx, ch) {
                self.endpoint.set_playback_switch(idx, ch, !muted)?;
            }
        }
        Ok(())
    }

    pub(crate) fn write_switch(&self, id: ControlId, idx: usize, on: bool) -> Result<()> {
        match self.switch_mode(id, idx)? {
            SwitchMode::Enumerated => self.write_item(idx, u32::from(on)),
            SwitchMode::Capture => {
                let mut channels: Vec<usize> = (0..MAX_CHANNELS)
                    .filter(|&ch| self.endpoint.has_capture_channel(idx, ch))
                    .collect();
                if channels.is_empty() {
                    channels.push(0);
                }
                for ch in channels {
                    self.endpoint.set_capture_switch(idx, ch, on)?;
                }
                Ok(())
            }
            SwitchMode::Playback => {
                for ch in 0..MAX_CHANNELS {
                    if self.endpoint.has_playback_channel(idx, ch) {
                        self.endpoint.set_playback_switch(idx, ch, on)?;
                    }
                }
                Ok(())
            }
        }
    }

    // ── Convenience actions ──

    /// Solo one matrix cell within its row: a cell at unity goes off, any
    /// other level goes to unity, and every other cell in the row goes off.
    /// Returns the number of cells written.
    pub fn solo_matrix_cell(&mut self, row: usize, col: usize) -> Result<usize> {
        let Some(current) = self.read_db(ControlId::MatrixGain { row, col })? else {
            return Ok(0);
        };
        let target = if current == UNITY_DB { MIN_DB } else { UNITY_DB };
        let mut writes = 0;
        for c in 0..self.context.profile.matrix_outputs {
            let id = ControlId::MatrixGain { row, col: c };
            let want = if c == col { target } else { MIN_DB };
            if let Some(db) = self.read_db(id)?
                && db != want
                && self.write(id, Value::Gain(db_to_knob(want as f32)))? == WriteOutcome::Written
            {
                writes += 1;
            }
        }
        Ok(writes)
    }

    /// Put every selector on its factory default item and every gain at
    /// unity, unmuted. Switches are left alone. Returns the number of
    /// controls written.
    pub fn apply_defaults(&mut self) -> Result<usize> {
        let mut writes = 0;
        for id in addressing::all_controls(&self.context.profile) {
            let Some(idx) = self.index_of(id)? else {
                continue;
            };
            let outcome = match id.kind() {
                ControlKind::Selector => {
                    let count = self.endpoint.enum_item_count(idx)?;
                    match models::default_selector_item(id, count) {
                        Some(item) => self.write(id, Value::Selector(item))?,
                        None => continue,
                    }
                }
                ControlKind::Gain { mutable } => {
                    if mutable {
                        self.write(id, Value::Mute(false))?;
                    }
                    self.write(id, Value::Gain(db_to_knob(UNITY_DB as f32)))?
                }
                ControlKind::Switch => continue,
            };
            if outcome == WriteOutcome::Written {
                writes += 1;
            }
        }
        log::info!("[engine] applied defaults to {writes} control(s)");
        Ok(writes)
    }
}
