//! Force update — make the hardware re-announce every value.
//!
//! Writing a control's current value again is a no-op for the driver, so
//! each control is first moved somewhere else and then put back:
//!
//! - selectors go to `(x + 1) mod n`, then `x`
//! - gains go to the opposite end of the range (+127 dB when at −128 dB,
//!   −128 dB otherwise), then their real value
//! - mutes and switches are toggled, then restored
//!
//! The bounce is driven by channel 0; every channel is restored to its own
//! value.
//!
//! The echo guard stays engaged for the whole run.

use serde::Serialize;

use crate::addressing::{self, ControlId, ControlKind};
use crate::endpoint::{ControlEndpoint, MAX_CHANNELS};
use crate::engine::{EngineState, MixerEngine, SwitchMode};
use crate::error::Result;
use crate::gain::{MIN_DB, db_to_centi};

/// Gain written when a control currently sits at the floor.
const BOUNCE_HIGH_DB: i32 = 127;

/// What a force update touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResetReport {
    pub selectors: usize,
    pub gains: usize,
    pub mutes: usize,
    pub switches: usize,
}

impl ResetReport {
    pub fn total(&self) -> usize {
        self.selectors + self.gains + self.mutes + self.switches
    }
}

/// The temporary value a gain is moved to before being restored.
pub fn bounce_target(current_centi: i64) -> i64 {
    if current_centi <= db_to_centi(MIN_DB) {
        db_to_centi(BOUNCE_HIGH_DB)
    } else {
        db_to_centi(MIN_DB)
    }
}

impl<E: ControlEndpoint> MixerEngine<E> {
    /// Re-send every control's value so the hardware and other clients
    /// see the full state.
    pub fn force_update(&mut self) -> Result<ResetReport> {
        self.ensure_open()?;
        let guard = self.echo_guard();
        let Some(_suppress) = guard.engage() else {
            log::debug!("[reset] skipped, update already in progress");
            return Ok(ResetReport::default());
        };
        self.set_state(EngineState::Writing);
        let result = self.bounce_all();
        self.set_state(EngineState::Ready);
        if let Ok(report) = &result {
            log::info!("[reset] re-sent {} value(s)", report.total());
        }
        result
    }

    fn bounce_all(&mut self) -> Result<ResetReport> {
        let mut report = ResetReport::default();
        for id in addressing::all_controls(self.profile()) {
            let Some(idx) = self.index_of(id)? else {
                continue;
            };
            match id.kind() {
                ControlKind::Selector => {
                    self.bounce_item(idx)?;
                    report.selectors += 1;
                }
                ControlKind::Gain { mutable } => {
                    if mutable {
                        self.bounce_mute(idx)?;
                        report.mutes += 1;
                    }
                    self.bounce_db(idx)?;
                    report.gains += 1;
                }
                ControlKind::Switch => {
                    self.bounce_switch(id, idx)?;
                    report.switches += 1;
                }
            }
        }
        Ok(report)
    }

    /// Toggle by channel 0, then put every channel back as it was.
    fn bounce_mute(&self, idx: usize) -> Result<()> {
        let ep = self.endpoint();
        let switches = (0..MAX_CHANNELS)
            .filter(|&ch| ep.has_playback_channel(idx, ch))
            .map(|ch| ep.playback_switch(idx, ch).map(|on| (ch, on)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let Some(&(_, first_on)) = switches.first() else {
            return Ok(());
        };
        // Mute is the inverted switch: muting an "on" channel turns it off.
        self.write_mute(idx, first_on)?;
        for (ch, on) in switches {
            ep.set_playback_switch(idx, ch, on)?;
        }
        Ok(())
    }

    /// Bounce relative to channel 0, then restore each channel's own level.
    fn bounce_db(&self, idx: usize) -> Result<()> {
        let ep = self.endpoint();
        let playback = (0..MAX_CHANNELS)
            .filter(|&ch| ep.has_playback_channel(idx, ch))
            .map(|ch| ep.playback_db(idx, ch).map(|v| (ch, v)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let capture = (0..MAX_CHANNELS)
            .filter(|&ch| ep.has_capture_channel(idx, ch))
            .map(|ch| ep.capture_db(idx, ch).map(|v| (ch, v)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let reference = match playback.first() {
            Some(&(_, v)) => v,
            None => ep.playback_db(idx, 0)?,
        };
        self.write_db(idx, bounce_target(reference))?;
        for (ch, v) in playback {
            ep.set_playback_db(idx, ch, v)?;
        }
        for (ch, v) in capture {
            ep.set_capture_db(idx, ch, v)?;
        }
        Ok(())
    }

    fn bounce_item(&self, idx: usize) -> Result<()> {
        let count = self.endpoint().enum_item_count(idx)?;
        if count == 0 {
            return Ok(());
        }
        let current = self.endpoint().enum_item(idx)?;
        self.write_item(idx, (current + 1) % count)?;
        self.write_item(idx, current)
    }

    fn bounce_switch(&self, id: ControlId, idx: usize) -> Result<()> {
        if self.switch_mode(id, idx)? == SwitchMode::Enumerated {
            return self.bounce_item(idx);
        }
        let on = self.read_switch(id, idx)?;
        self.write_switch(id, idx, !on)?;
        self.write_switch(id, idx, on)
    }
}
