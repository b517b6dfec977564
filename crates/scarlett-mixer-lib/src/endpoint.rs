//! Control endpoint — trait over the sound card's mixer controls + backends.
//!
//! The control list is enumerated once when the endpoint is opened; its
//! order and indices stay fixed for the session and are what profile
//! offsets point into. dB values are in hundredths of a dB.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Error type ──

/// Endpoint errors.
///
/// String payloads follow the convention **"context: details"** where
/// *context* names the operation (e.g. `"poll"`, `"set_enum_item(14)"`).
#[derive(Debug)]
pub enum EndpointError {
    NotFound(String),
    OpenFailed(String),
    Io(String),
    Unsupported(String),
}

impl fmt::Display for EndpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointError::NotFound(dev) => write!(f, "Sound card not found: {dev}"),
            EndpointError::OpenFailed(e) => write!(f, "Failed to open mixer: {e}"),
            EndpointError::Io(e) => write!(f, "Mixer I/O failed: {e}"),
            EndpointError::Unsupported(e) => write!(f, "Not supported: {e}"),
        }
    }
}

impl std::error::Error for EndpointError {}

pub type Result<T> = std::result::Result<T, EndpointError>;

// ── Control description ──

/// Number of channels dB and mute writes fan out across.
pub const MAX_CHANNELS: usize = 3;

/// What a control can do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub enumerated: bool,
    #[serde(default)]
    pub playback_switch: bool,
    #[serde(default)]
    pub capture_switch: bool,
    /// Playback volume with a dB range.
    #[serde(default)]
    pub playback_db: bool,
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = [
            (self.enumerated, "ENUM"),
            (self.playback_switch, "PBS"),
            (self.capture_switch, "CPS"),
            (self.playback_db, "DB"),
        ];
        let names: Vec<&str> = flags.iter().filter(|(on, _)| *on).map(|&(_, n)| n).collect();
        if names.is_empty() {
            write!(f, "-")
        } else {
            write!(f, "{}", names.join(", "))
        }
    }
}

/// One enumerated control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlInfo {
    pub name: String,
    pub caps: Capabilities,
}

/// Result of a zero-timeout readiness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Nothing pending.
    Idle,
    /// Events are waiting to be drained.
    Pending,
    /// The descriptors reported an error condition.
    Faulted(String),
}

// ── Trait ──

/// Access to a sound card's mixer controls.
///
/// Indices refer to [`controls`](ControlEndpoint::controls). Channel
/// arguments are `0..MAX_CHANNELS`.
pub trait ControlEndpoint {
    /// Card name as reported by the driver.
    fn card_name(&self) -> &str;
    /// The control list, in hardware order.
    fn controls(&self) -> &[ControlInfo];

    fn enum_item(&self, index: usize) -> Result<u32>;
    fn set_enum_item(&self, index: usize, item: u32) -> Result<()>;
    /// Display names of an enumerated control's items.
    fn enum_items(&self, index: usize) -> Result<Vec<String>>;
    fn enum_item_count(&self, index: usize) -> Result<u32> {
        Ok(u32::try_from(self.enum_items(index)?.len()).unwrap_or(u32::MAX))
    }

    fn has_playback_channel(&self, index: usize, channel: usize) -> bool;
    fn has_capture_channel(&self, index: usize, channel: usize) -> bool;

    fn playback_switch(&self, index: usize, channel: usize) -> Result<bool>;
    fn set_playback_switch(&self, index: usize, channel: usize, on: bool) -> Result<()>;
    fn capture_switch(&self, index: usize, channel: usize) -> Result<bool>;
    fn set_capture_switch(&self, index: usize, channel: usize, on: bool) -> Result<()>;

    fn playback_db(&self, index: usize, channel: usize) -> Result<i64>;
    fn set_playback_db(&self, index: usize, channel: usize, centi_db: i64) -> Result<()>;
    fn capture_db(&self, index: usize, channel: usize) -> Result<i64>;
    fn set_capture_db(&self, index: usize, channel: usize, centi_db: i64) -> Result<()>;
    fn playback_db_range(&self, index: usize) -> Result<(i64, i64)>;

    /// Check the event descriptors without blocking.
    fn poll_ready(&self) -> Result<Readiness>;
    /// Drain pending control events. Returns how many were handled.
    fn handle_events(&self) -> Result<u32>;
}

impl<T: ControlEndpoint + ?Sized> ControlEndpoint for Box<T> {
    fn card_name(&self) -> &str {
        (**self).card_name()
    }
    fn controls(&self) -> &[ControlInfo] {
        (**self).controls()
    }
    fn enum_item(&self, index: usize) -> Result<u32> {
        (**self).enum_item(index)
    }
    fn set_enum_item(&self, index: usize, item: u32) -> Result<()> {
        (**self).set_enum_item(index, item)
    }
    fn enum_items(&self, index: usize) -> Result<Vec<String>> {
        (**self).enum_items(index)
    }
    fn enum_item_count(&self, index: usize) -> Result<u32> {
        (**self).enum_item_count(index)
    }
    fn has_playback_channel(&self, index: usize, channel: usize) -> bool {
        (**self).has_playback_channel(index, channel)
    }
    fn has_capture_channel(&self, index: usize, channel: usize) -> bool {
        (**self).has_capture_channel(index, channel)
    }
    fn playback_switch(&self, index: usize, channel: usize) -> Result<bool> {
        (**self).playback_switch(index, channel)
    }
    fn set_playback_switch(&self, index: usize, channel: usize, on: bool) -> Result<()> {
        (**self).set_playback_switch(index, channel, on)
    }
    fn capture_switch(&self, index: usize, channel: usize) -> Result<bool> {
        (**self).capture_switch(index, channel)
    }
    fn set_capture_switch(&self, index: usize, channel: usize, on: bool) -> Result<()> {
        (**self).set_capture_switch(index, channel, on)
    }
    fn playback_db(&self, index: usize, channel: usize) -> Result<i64> {
        (**self).playback_db(index, channel)
    }
    fn set_playback_db(&self, index: usize, channel: usize, centi_db: i64) -> Result<()> {
        (**self).set_playback_db(index, channel, centi_db)
    }
    fn capture_db(&self, index: usize, channel: usize) -> Result<i64> {
        (**self).capture_db(index, channel)
    }
    fn set_capture_db(&self, index: usize, channel: usize, centi_db: i64) -> Result<()> {
        (**self).set_capture_db(index, channel, centi_db)
    }
    fn playback_db_range(&self, index: usize) -> Result<(i64, i64)> {
        (**self).playback_db_range(index)
    }
    fn poll_ready(&self) -> Result<Readiness> {
        (**self).poll_ready()
    }
    fn handle_events(&self) -> Result<u32> {
        (**self).handle_events()
    }
}

// ── ALSA implementation ──

#[cfg(all(feature = "alsa", target_os = "linux"))]
mod alsa_impl {
    use super::*;
    use std::cell::RefCell;

    use alsa::mixer::{MilliBel, Mixer, Round, Selem, SelemChannelId, SelemId};
    use alsa::poll::{Descriptors, Flags, pollfd};

    pub struct AlsaEndpoint {
        mixer: Mixer,
        card_name: String,
        ids: Vec<SelemId>,
        controls: Vec<ControlInfo>,
        fds: RefCell<Vec<pollfd>>,
    }

    fn channel_id(channel: usize) -> SelemChannelId {
        match channel {
            0 => SelemChannelId::FrontLeft,
            1 => SelemChannelId::FrontRight,
            _ => SelemChannelId::RearLeft,
        }
    }

    fn io(context: &str, e: alsa::Error) -> EndpointError {
        EndpointError::Io(format!("{context}: {e}"))
    }

    impl AlsaEndpoint {
        /// Open the mixer of `device` (e.g. `"hw:2"`) and enumerate its controls.
        pub fn open(device: &str) -> Result<Self> {
            let ctl = alsa::Ctl::new(device, false)
                .map_err(|e| EndpointError::NotFound(format!("{device}: {e}")))?;
            let info = ctl
                .card_info()
                .map_err(|e| EndpointError::OpenFailed(format!("card info {device}: {e}")))?;
            let card_name = info
                .get_name()
                .map_err(|e| EndpointError::OpenFailed(format!("card name {device}: {e}")))?
                .to_string();
            drop(ctl);

            let mixer = Mixer::new(device, true)
                .map_err(|e| EndpointError::OpenFailed(format!("mixer {device}: {e}")))?;

            let mut ids = Vec::new();
            let mut controls = Vec::new();
            for elem in mixer.iter() {
                let Some(selem) = Selem::new(elem) else {
                    continue;
                };
                // Profile offsets count active elements only.
                if !selem.is_active() {
                    continue;
                }
                let id = selem.get_id();
                let name = id.get_name().unwrap_or("").to_string();
                controls.push(ControlInfo {
                    name,
                    caps: Capabilities {
                        enumerated: selem.is_enumerated(),
                        playback_switch: selem.has_playback_switch(),
                        capture_switch: selem.has_capture_switch(),
                        playback_db: selem.has_playback_volume(),
                    },
                });
                ids.push(id);
            }
            if controls.is_empty() {
                return Err(EndpointError::OpenFailed(format!(
                    "mixer {device}: no controls found"
                )));
            }

            Ok(AlsaEndpoint {
                mixer,
                card_name,
                ids,
                controls,
                fds: RefCell::new(Vec::new()),
            })
        }

        fn selem(&self, index: usize) -> Result<Selem<'_>> {
            let id = self
                .ids
                .get(index)
                .ok_or_else(|| EndpointError::Io(format!("control {index}: out of range")))?;
            self.mixer
                .find_selem(id)
                .ok_or_else(|| EndpointError::Io(format!("control {index}: element vanished")))
        }
    }

    impl ControlEndpoint for AlsaEndpoint {
        fn card_name(&self) -> &str {
            &self.card_name
        }

        fn controls(&self) -> &[ControlInfo] {
            &self.controls
        }

        fn enum_item(&self, index: usize) -> Result<u32> {
            self.selem(index)?
                .get_enum_item(SelemChannelId::mono())
                .map_err(|e| io(&format!("get_enum_item({index})"), e))
        }

        fn set_enum_item(&self, index: usize, item: u32) -> Result<()> {
            self.selem(index)?
                .set_enum_item(SelemChannelId::mono(), item)
                .map_err(|e| io(&format!("set_enum_item({index})"), e))
        }

        fn enum_items(&self, index: usize) -> Result<Vec<String>> {
            let selem = self.selem(index)?;
            let iter = selem
                .iter_enum()
                .map_err(|e| io(&format!("enum_items({index})"), e))?;
            iter.map(|item| item.map_err(|e| io(&format!("enum_items({index})"), e)))
                .collect()
        }

        fn has_playback_channel(&self, index: usize, channel: usize) -> bool {
            self.selem(index)
                .map(|s| s.has_playback_channel(channel_id(channel)))
                .unwrap_or(false)
        }

        fn has_capture_channel(&self, index: usize, channel: usize) -> bool {
            self.selem(index)
                .map(|s| s.has_capture_channel(channel_id(channel)))
                .unwrap_or(false)
        }

        fn playback_switch(&self, index: usize, channel: usize) -> Result<bool> {
            self.selem(index)?
                .get_playback_switch(channel_id(channel))
                .map(|v| v != 0)
                .map_err(|e| io(&format!("get_playback_switch({index})"), e))
        }

        fn set_playback_switch(&self, index: usize, channel: usize, on: bool) -> Result<()> {
            self.selem(index)?
                .set_playback_switch(channel_id(channel), i32::from(on))
                .map_err(|e| io(&format!("set_playback_switch({index})"), e))
        }

        fn capture_switch(&self, index: usize, channel: usize) -> Result<bool> {
            self.selem(index)?
                .get_capture_switch(channel_id(channel))
                .map(|v| v != 0)
                .map_err(|e| io(&format!("get_capture_switch({index})"), e))
        }

        fn set_capture_switch(&self, index: usize, channel: usize, on: bool) -> Result<()> {
            self.selem(index)?
                .set_capture_switch(channel_id(channel), i32::from(on))
                .map_err(|e| io(&format!("set_capture_switch({index})"), e))
        }

        fn playback_db(&self, index: usize, channel: usize) -> Result<i64> {
            self.selem(index)?
                .get_playback_vol_db(channel_id(channel))
                .map(|MilliBel(v)| v)
                .map_err(|e| io(&format!("get_playback_db({index})"), e))
        }

        fn set_playback_db(&self, index: usize, channel: usize, centi_db: i64) -> Result<()> {
            self.selem(index)?
                .set_playback_db(channel_id(channel), MilliBel(centi_db), Round::Floor)
                .map_err(|e| io(&format!("set_playback_db({index})"), e))
        }

        fn capture_db(&self, index: usize, channel: usize) -> Result<i64> {
            self.selem(index)?
                .get_capture_vol_db(channel_id(channel))
                .map(|MilliBel(v)| v)
                .map_err(|e| io(&format!("get_capture_db({index})"), e))
        }

        fn set_capture_db(&self, index: usize, channel: usize, centi_db: i64) -> Result<()> {
            self.selem(index)?
                .set_capture_db(channel_id(channel), MilliBel(centi_db), Round::Floor)
                .map_err(|e| io(&format!("set_capture_db({index})"), e))
        }

        fn playback_db_range(&self, index: usize) -> Result<(i64, i64)> {
            let (MilliBel(min), MilliBel(max)) = self.selem(index)?.get_playback_db_range();
            Ok((min, max))
        }

        fn poll_ready(&self) -> Result<Readiness> {
            let mut fds = self.fds.borrow_mut();
            let count = Descriptors::count(&self.mixer);
            if fds.len() != count {
                fds.resize(
                    count,
                    pollfd {
                        fd: 0,
                        events: 0,
                        revents: 0,
                    },
                );
            }
            Descriptors::fill(&self.mixer, &mut fds).map_err(|e| io("poll descriptors", e))?;
            let ready = alsa::poll::poll(&mut fds, 0).map_err(|e| io("poll", e))?;
            if ready == 0 {
                return Ok(Readiness::Idle);
            }
            let revents =
                Descriptors::revents(&self.mixer, &fds).map_err(|e| io("poll revents", e))?;
            if revents.intersects(Flags::ERR | Flags::NVAL) {
                return Ok(Readiness::Faulted(format!("poll: revents {revents:?}")));
            }
            Ok(Readiness::Pending)
        }

        fn handle_events(&self) -> Result<u32> {
            self.mixer.handle_events().map_err(|e| io("handle_events", e))
        }
    }

    /// Sound cards known to ALSA as `(device, card name)` pairs.
    pub fn list_cards() -> Vec<(String, String)> {
        alsa::card::Iter::new()
            .filter_map(|card| card.ok())
            .map(|card| {
                let name = card.get_name().unwrap_or_default();
                (format!("hw:{}", card.get_index()), name)
            })
            .collect()
    }
}

#[cfg(all(feature = "alsa", target_os = "linux"))]
pub use alsa_impl::{AlsaEndpoint, list_cards};

// ── Platform selection ──

#[cfg(all(feature = "alsa", target_os = "linux"))]
pub type PlatformEndpoint = AlsaEndpoint;

/// Placeholder endpoint for builds without hardware support; cannot be opened.
#[cfg(not(all(feature = "alsa", target_os = "linux")))]
pub enum PlatformEndpoint {}

#[cfg(not(all(feature = "alsa", target_os = "linux")))]
impl ControlEndpoint for PlatformEndpoint {
    fn card_name(&self) -> &str {
        match *self {}
    }
    fn controls(&self) -> &[ControlInfo] {
        match *self {}
    }
    fn enum_item(&self, _: usize) -> Result<u32> {
        match *self {}
    }
    fn set_enum_item(&self, _: usize, _: u32) -> Result<()> {
        match *self {}
    }
    fn enum_items(&self, _: usize) -> Result<Vec<String>> {
        match *self {}
    }
    fn has_playback_channel(&self, _: usize, _: usize) -> bool {
        match *self {}
    }
    fn has_capture_channel(&self, _: usize, _: usize) -> bool {
        match *self {}
    }
    fn playback_switch(&self, _: usize, _: usize) -> Result<bool> {
        match *self {}
    }
    fn set_playback_switch(&self, _: usize, _: usize, _: bool) -> Result<()> {
        match *self {}
    }
    fn capture_switch(&self, _: usize, _: usize) -> Result<bool> {
        match *self {}
    }
    fn set_capture_switch(&self, _: usize, _: usize, _: bool) -> Result<()> {
        match *self {}
    }
    fn playback_db(&self, _: usize, _: usize) -> Result<i64> {
        match *self {}
    }
    fn set_playback_db(&self, _: usize, _: usize, _: i64) -> Result<()> {
        match *self {}
    }
    fn capture_db(&self, _: usize, _: usize) -> Result<i64> {
        match *self {}
    }
    fn set_capture_db(&self, _: usize, _: usize, _: i64) -> Result<()> {
        match *self {}
    }
    fn playback_db_range(&self, _: usize) -> Result<(i64, i64)> {
        match *self {}
    }
    fn poll_ready(&self) -> Result<Readiness> {
        match *self {}
    }
    fn handle_events(&self) -> Result<u32> {
        match *self {}
    }
}

/// Open the hardware mixer for `device` (e.g. `"hw:2"`).
pub fn open_endpoint(device: &str) -> Result<PlatformEndpoint> {
    #[cfg(all(feature = "alsa", target_os = "linux"))]
    {
        AlsaEndpoint::open(device)
    }
    #[cfg(not(all(feature = "alsa", target_os = "linux")))]
    {
        Err(EndpointError::Unsupported(format!(
            "{device}: built without ALSA support (enable the `alsa` feature)"
        )))
    }
}

/// Sound cards known to the system as `(device, card name)` pairs.
///
/// Empty when built without hardware support.
pub fn enumerate_cards() -> Vec<(String, String)> {
    #[cfg(all(feature = "alsa", target_os = "linux"))]
    {
        list_cards()
    }
    #[cfg(not(all(feature = "alsa", target_os = "linux")))]
    {
        Vec::new()
    }
}

/// In-memory mock endpoint for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    use crate::snapshot::{ControlSnapshot, SnapshotControl};

    /// A recorded hardware write.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum WriteOp {
        EnumItem { index: usize, item: u32 },
        PlaybackSwitch { index: usize, channel: usize, on: bool },
        CaptureSwitch { index: usize, channel: usize, on: bool },
        PlaybackDb { index: usize, channel: usize, centi_db: i64 },
        CaptureDb { index: usize, channel: usize, centi_db: i64 },
    }

    impl WriteOp {
        pub fn index(&self) -> usize {
            match *self {
                WriteOp::EnumItem { index, .. }
                | WriteOp::PlaybackSwitch { index, .. }
                | WriteOp::CaptureSwitch { index, .. }
                | WriteOp::PlaybackDb { index, .. }
                | WriteOp::CaptureDb { index, .. } => index,
            }
        }
    }

    /// In-memory endpoint. Control state lives in `state`; every write is
    /// appended to `writes`. Readiness answers are popped from `readiness`
    /// (default [`Readiness::Pending`] when empty).
    pub struct MockEndpoint {
        card_name: String,
        controls: Vec<ControlInfo>,
        pub state: RefCell<Vec<SnapshotControl>>,
        pub writes: RefCell<Vec<WriteOp>>,
        pub readiness: RefCell<VecDeque<Result<Readiness>>>,
        /// Number of `handle_events` calls.
        pub events_handled: Cell<u32>,
        /// If true, `handle_events` fails.
        pub fail_handle_events: Cell<bool>,
        /// If set, reads of this control index fail.
        pub fail_read_index: Cell<Option<usize>>,
    }

    impl MockEndpoint {
        pub fn new(card_name: &str, controls: Vec<SnapshotControl>) -> Self {
            MockEndpoint {
                card_name: card_name.to_string(),
                controls: controls.iter().map(|c| c.info()).collect(),
                state: RefCell::new(controls),
                writes: RefCell::new(Vec::new()),
                readiness: RefCell::new(VecDeque::new()),
                events_handled: Cell::new(0),
                fail_handle_events: Cell::new(false),
                fail_read_index: Cell::new(None),
            }
        }

        pub fn from_snapshot(snapshot: ControlSnapshot) -> Self {
            Self::new(&snapshot.card_name, snapshot.controls)
        }

        /// Queue the answer for the next `poll_ready` call.
        pub fn push_readiness(&self, r: Result<Readiness>) {
            self.readiness.borrow_mut().push_back(r);
        }

        pub fn clear_writes(&self) {
            self.writes.borrow_mut().clear();
        }

        /// Change a control's state behind the engine's back (simulates the
        /// hardware or another client changing it).
        pub fn with_control<R>(&self, index: usize, f: impl FnOnce(&mut SnapshotControl) -> R) -> R {
            f(&mut self.state.borrow_mut()[index])
        }

        fn read<R>(&self, index: usize, f: impl FnOnce(&SnapshotControl) -> R) -> Result<R> {
            if self.fail_read_index.get() == Some(index) {
                return Err(EndpointError::Io(format!("mock: read {index} failure injected")));
            }
            let state = self.state.borrow();
            let ctrl = state
                .get(index)
                .ok_or_else(|| EndpointError::Io(format!("mock: no control {index}")))?;
            Ok(f(ctrl))
        }

        fn write(&self, index: usize, op: WriteOp, f: impl FnOnce(&mut SnapshotControl)) -> Result<()> {
            let mut state = self.state.borrow_mut();
            let ctrl = state
                .get_mut(index)
                .ok_or_else(|| EndpointError::Io(format!("mock: no control {index}")))?;
            f(ctrl);
            self.writes.borrow_mut().push(op);
            Ok(())
        }
    }

    fn set_channel<T: Copy>(values: &mut [T], channel: usize, v: T) {
        if let Some(slot) = values.get_mut(channel) {
            *slot = v;
        }
    }

    impl ControlEndpoint for MockEndpoint {
        fn card_name(&self) -> &str {
            &self.card_name
        }

        fn controls(&self) -> &[ControlInfo] {
            &self.controls
        }

        fn enum_item(&self, index: usize) -> Result<u32> {
            self.read(index, |c| c.item)
        }

        fn set_enum_item(&self, index: usize, item: u32) -> Result<()> {
            let count = self.enum_item_count(index)?;
            if item >= count {
                return Err(EndpointError::Io(format!(
                    "mock: set_enum_item({index}): item {item} >= {count}"
                )));
            }
            self.write(index, WriteOp::EnumItem { index, item }, |c| c.item = item)
        }

        fn enum_items(&self, index: usize) -> Result<Vec<String>> {
            self.read(index, |c| c.items.clone())
        }

        fn has_playback_channel(&self, index: usize, channel: usize) -> bool {
            self.read(index, |c| channel < c.playback_channels)
                .unwrap_or(false)
        }

        fn has_capture_channel(&self, index: usize, channel: usize) -> bool {
            self.read(index, |c| channel < c.capture_channels)
                .unwrap_or(false)
        }

        fn playback_switch(&self, index: usize, channel: usize) -> Result<bool> {
            self.read(index, |c| c.playback_switch.get(channel).copied().unwrap_or(false))
        }

        fn set_playback_switch(&self, index: usize, channel: usize, on: bool) -> Result<()> {
            let op = WriteOp::PlaybackSwitch { index, channel, on };
            self.write(index, op, |c| set_channel(&mut c.playback_switch, channel, on))
        }

        fn capture_switch(&self, index: usize, channel: usize) -> Result<bool> {
            self.read(index, |c| c.capture_switch.get(channel).copied().unwrap_or(false))
        }

        fn set_capture_switch(&self, index: usize, channel: usize, on: bool) -> Result<()> {
            let op = WriteOp::CaptureSwitch { index, channel, on };
            self.write(index, op, |c| set_channel(&mut c.capture_switch, channel, on))
        }

        fn playback_db(&self, index: usize, channel: usize) -> Result<i64> {
            self.read(index, |c| c.playback_db.get(channel).copied().unwrap_or(c.db_range.0))
        }

        fn set_playback_db(&self, index: usize, channel: usize, centi_db: i64) -> Result<()> {
            let op = WriteOp::PlaybackDb {
                index,
                channel,
                centi_db,
            };
            self.write(index, op, |c| {
                let v = centi_db.clamp(c.db_range.0, c.db_range.1);
                set_channel(&mut c.playback_db, channel, v)
            })
        }

        fn capture_db(&self, index: usize, channel: usize) -> Result<i64> {
            self.read(index, |c| c.capture_db.get(channel).copied().unwrap_or(c.db_range.0))
        }

        fn set_capture_db(&self, index: usize, channel: usize, centi_db: i64) -> Result<()> {
            let op = WriteOp::CaptureDb {
                index,
                channel,
                centi_db,
            };
            self.write(index, op, |c| {
                let v = centi_db.clamp(c.db_range.0, c.db_range.1);
                set_channel(&mut c.capture_db, channel, v)
            })
        }

        fn playback_db_range(&self, index: usize) -> Result<(i64, i64)> {
            self.read(index, |c| c.db_range)
        }

        fn poll_ready(&self) -> Result<Readiness> {
            self.readiness
                .borrow_mut()
                .pop_front()
                .unwrap_or(Ok(Readiness::Pending))
        }

        fn handle_events(&self) -> Result<u32> {
            if self.fail_handle_events.get() {
                return Err(EndpointError::Io("mock: handle_events failure injected".into()));
            }
            self.events_handled.set(self.events_handled.get() + 1);
            Ok(1)
        }
    }

    // ── Canned control lists ──

    fn numbered(prefix: &str, count: usize) -> Vec<String> {
        (1..=count).map(|n| format!("{prefix} {n}")).collect()
    }

    /// Routing choices of a first-generation capture selector.
    fn source_items(with_pcm: bool) -> Vec<String> {
        let mut items = vec!["Off".to_string()];
        if with_pcm {
            items.extend(numbered("PCM", 6));
        }
        items.extend(numbered("Analog", 8));
        items.extend(numbered("SPDIF", 2));
        items.extend(numbered("ADAT", 8));
        items
    }

    fn output_items() -> Vec<String> {
        let mut items = source_items(false);
        items.extend((0..6).map(|c| crate::profile::DeviceProfile::mix_label(c)));
        items.extend(numbered("PCM", 6));
        items
    }

    /// The control list of a Scarlett 18i6, in driver order.
    ///
    /// Matches the static "Scarlett 18i6 USB" profile: 158 controls,
    /// capture selectors at 13, matrix rows of seven from 32.
    pub fn scarlett_18i6_controls() -> Vec<SnapshotControl> {
        let mut c = vec![SnapshotControl::gain_with_mute("Master", 2)];
        for (n, label) in ["Monitor", "Phones", "ADAT"].iter().enumerate() {
            let bus = n + 1;
            c.push(SnapshotControl::gain_with_mute(&format!("Master {bus} ({label})"), 2));
            c.push(SnapshotControl::selector(
                &format!("Master {bus}L ({label}) Source"),
                output_items(),
            ));
            c.push(SnapshotControl::selector(
                &format!("Master {bus}R ({label}) Source"),
                output_items(),
            ));
        }
        c.push(SnapshotControl::selector(
            "Sample Clock Source",
            vec!["Internal".into(), "SPDIF".into(), "ADAT".into()],
        ));
        for n in 1..=2 {
            c.push(SnapshotControl::selector(
                &format!("Input {n} Impedance"),
                vec!["Line".into(), "Hi-Z".into()],
            ));
        }
        for n in 1..=18 {
            c.push(SnapshotControl::selector(
                &format!("Input Source {n:02}"),
                output_items(),
            ));
        }
        c.push(SnapshotControl::selector(
            "Sync Status",
            vec!["No Lock".into(), "Locked".into()],
        ));
        for row in 1..=18 {
            c.push(SnapshotControl::selector(
                &format!("Matrix {row:02} Input"),
                source_items(true),
            ));
            for col in 0..6 {
                let mix = (b'A' + col as u8) as char;
                c.push(SnapshotControl::gain(&format!("Matrix {row:02} Mix {mix}"), 1));
            }
        }
        c
    }

    /// A Scarlett 18i6 endpoint with every control at its power-on value.
    pub fn scarlett_18i6() -> MockEndpoint {
        MockEndpoint::new("Scarlett 18i6 USB", scarlett_18i6_controls())
    }

    /// A later-generation style control list: column-major matrix, pads and
    /// air as capture switches, mono aux outputs, no master. Not in the
    /// static registry.
    pub fn column_major_controls() -> Vec<SnapshotControl> {
        let mut c = vec![
            SnapshotControl::gain_with_mute("Monitor Output", 2),
            SnapshotControl::gain_with_mute("Headphones Output", 2),
            SnapshotControl::gain("Line 5 Output", 1),
            SnapshotControl::gain("Line 6 Output", 1),
        ];
        for n in 1..=6 {
            c.push(SnapshotControl::selector(
                &format!("Analogue Out {n:02} Source"),
                output_items(),
            ));
        }
        for n in 1..=2 {
            c.push(SnapshotControl::selector(
                &format!("Line In {n} Level"),
                vec!["Line".into(), "Inst".into()],
            ));
        }
        for n in 1..=2 {
            c.push(SnapshotControl::capture_switch(&format!("Line In {n} Pad")));
        }
        for n in 1..=2 {
            c.push(SnapshotControl::capture_switch(&format!("Line In {n} Air")));
        }
        for n in 1..=6 {
            c.push(SnapshotControl::selector(&format!("PCM {n:02}"), output_items()));
        }
        for n in 1..=10 {
            c.push(SnapshotControl::selector(
                &format!("Mixer {n:02} Input"),
                source_items(true),
            ));
        }
        for col in 0..4u8 {
            let mix = (b'A' + col) as char;
            for row in 1..=10 {
                c.push(SnapshotControl::gain(&format!("Mix {mix} Input {row:02}"), 1));
            }
        }
        c
    }

    pub fn column_major() -> MockEndpoint {
        MockEndpoint::new("Scarlett 6i6 USB Gen 2", column_major_controls())
    }
}

#[cfg(test)]
mod tests {
    use super::mock::*;
    use super::*;

    // ── Capabilities ──

    #[test]
    fn capabilities_display() {
        let caps = Capabilities {
            enumerated: true,
            capture_switch: true,
            ..Default::default()
        };
        assert_eq!(caps.to_string(), "ENUM, CPS");
        assert_eq!(Capabilities::default().to_string(), "-");
    }

    #[test]
    fn capabilities_deserialize_missing_fields_as_false() {
        let caps: Capabilities = serde_json::from_str(r#"{"enumerated":true}"#).unwrap();
        assert!(caps.enumerated);
        assert!(!caps.playback_switch);
    }

    // ── Errors ──

    #[test]
    fn error_display() {
        assert_eq!(
            EndpointError::NotFound("hw:9".into()).to_string(),
            "Sound card not found: hw:9"
        );
        assert_eq!(
            EndpointError::Io("poll: EBADF".into()).to_string(),
            "Mixer I/O failed: poll: EBADF"
        );
    }

    #[cfg(not(feature = "alsa"))]
    #[test]
    fn open_without_backend_is_unsupported() {
        let err = open_endpoint("hw:2").err().unwrap();
        assert!(matches!(err, EndpointError::Unsupported(_)));
        assert!(enumerate_cards().is_empty());
    }

    // ── MockEndpoint ──

    #[test]
    fn mock_18i6_has_expected_shape() {
        let ep = scarlett_18i6();
        let controls = ep.controls();
        assert_eq!(controls.len(), 158);
        assert_eq!(controls[0].name, "Master");
        assert_eq!(controls[13].name, "Input Source 01");
        assert_eq!(controls[32].name, "Matrix 01 Input");
        assert_eq!(controls[33].name, "Matrix 01 Mix A");
        assert_eq!(controls[157].name, "Matrix 18 Mix F");
    }

    #[test]
    fn mock_enum_write_is_recorded() {
        let ep = scarlett_18i6();
        ep.set_enum_item(13, 4).unwrap();
        assert_eq!(ep.enum_item(13).unwrap(), 4);
        assert_eq!(
            ep.writes.borrow().as_slice(),
            &[WriteOp::EnumItem { index: 13, item: 4 }]
        );
    }

    #[test]
    fn mock_rejects_item_out_of_range() {
        let ep = scarlett_18i6();
        assert!(ep.set_enum_item(11, 2).is_err());
        assert!(ep.writes.borrow().is_empty());
    }

    #[test]
    fn mock_db_is_clamped_to_range() {
        let ep = scarlett_18i6();
        ep.set_playback_db(33, 0, 12_700).unwrap();
        assert_eq!(ep.playback_db(33, 0).unwrap(), 600);
    }

    #[test]
    fn mock_channels() {
        let ep = scarlett_18i6();
        assert!(ep.has_playback_channel(1, 1));
        assert!(!ep.has_playback_channel(1, 2));
        assert!(ep.has_playback_channel(33, 0));
        assert!(!ep.has_playback_channel(33, 1));
        assert!(!ep.has_capture_channel(33, 0));
    }

    #[test]
    fn mock_readiness_queue() {
        let ep = scarlett_18i6();
        ep.push_readiness(Ok(Readiness::Idle));
        assert_eq!(ep.poll_ready().unwrap(), Readiness::Idle);
        assert_eq!(ep.poll_ready().unwrap(), Readiness::Pending);
    }

    #[test]
    fn mock_injected_read_failure() {
        let ep = scarlett_18i6();
        ep.fail_read_index.set(Some(13));
        assert!(ep.enum_item(13).is_err());
        assert!(ep.enum_item(14).is_ok());
    }

    #[test]
    fn column_major_shape() {
        let ep = column_major();
        assert_eq!(ep.controls().len(), 4 + 6 + 2 + 2 + 2 + 6 + 10 + 40);
        assert_eq!(ep.controls()[32].name, "Mix A Input 01");
        assert_eq!(ep.controls()[42].name, "Mix B Input 01");
    }
}
