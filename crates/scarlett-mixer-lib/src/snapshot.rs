//! Control snapshots — a JSON capture of a card's control list and values.
//!
//! Snapshots let detection and the engine run without hardware: capture
//! one from a live endpoint, then load it into a
//! [`MockEndpoint`](crate::endpoint::mock::MockEndpoint).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::endpoint::{Capabilities, ControlEndpoint, ControlInfo, MAX_CHANNELS};
use crate::error::{MixerError, Result};
use crate::gain::{MAX_DB, MIN_DB, db_to_centi};

/// Default dB range of a gain control, in hundredths of a dB.
pub const DEFAULT_DB_RANGE: (i64, i64) = (MIN_DB as i64 * 100, MAX_DB as i64 * 100);

fn default_db_range() -> (i64, i64) {
    DEFAULT_DB_RANGE
}

/// One control and its current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotControl {
    pub name: String,
    pub caps: Capabilities,
    /// Item names of an enumerated control.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
    /// Selected item of an enumerated control.
    #[serde(default)]
    pub item: u32,
    #[serde(default)]
    pub playback_channels: usize,
    #[serde(default)]
    pub capture_channels: usize,
    #[serde(default = "default_db_range")]
    pub db_range: (i64, i64),
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub playback_switch: Vec<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capture_switch: Vec<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub playback_db: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capture_db: Vec<i64>,
}

impl SnapshotControl {
    fn bare(name: &str, caps: Capabilities) -> Self {
        SnapshotControl {
            name: name.to_string(),
            caps,
            items: Vec::new(),
            item: 0,
            playback_channels: 0,
            capture_channels: 0,
            db_range: DEFAULT_DB_RANGE,
            playback_switch: Vec::new(),
            capture_switch: Vec::new(),
            playback_db: Vec::new(),
            capture_db: Vec::new(),
        }
    }

    /// Enumerated control, first item selected.
    pub fn selector(name: &str, items: Vec<String>) -> Self {
        let caps = Capabilities {
            enumerated: true,
            ..Default::default()
        };
        SnapshotControl {
            items,
            ..Self::bare(name, caps)
        }
    }

    /// Playback volume without a switch, at −128 dB.
    pub fn gain(name: &str, channels: usize) -> Self {
        let caps = Capabilities {
            playback_db: true,
            ..Default::default()
        };
        SnapshotControl {
            playback_channels: channels,
            playback_db: vec![db_to_centi(MIN_DB); channels],
            ..Self::bare(name, caps)
        }
    }

    /// Playback volume with a mute switch, at −128 dB and unmuted.
    pub fn gain_with_mute(name: &str, channels: usize) -> Self {
        let mut ctrl = Self::gain(name, channels);
        ctrl.caps.playback_switch = true;
        ctrl.playback_switch = vec![true; channels];
        ctrl
    }

    /// Single capture switch, off.
    pub fn capture_switch(name: &str) -> Self {
        let caps = Capabilities {
            capture_switch: true,
            ..Default::default()
        };
        SnapshotControl {
            capture_channels: 1,
            capture_switch: vec![false],
            ..Self::bare(name, caps)
        }
    }

    pub fn info(&self) -> ControlInfo {
        ControlInfo {
            name: self.name.clone(),
            caps: self.caps,
        }
    }
}

/// A card's full control list with values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSnapshot {
    pub card_name: String,
    pub controls: Vec<SnapshotControl>,
}

impl ControlSnapshot {
    /// Read every control of `endpoint`.
    pub fn capture<E: ControlEndpoint>(endpoint: &E) -> Result<Self> {
        let mut controls = Vec::with_capacity(endpoint.controls().len());
        for (index, info) in endpoint.controls().iter().enumerate() {
            let mut ctrl = SnapshotControl::bare(&info.name, info.caps);
            ctrl.playback_channels = (0..MAX_CHANNELS)
                .take_while(|&ch| endpoint.has_playback_channel(index, ch))
                .count();
            ctrl.capture_channels = (0..MAX_CHANNELS)
                .take_while(|&ch| endpoint.has_capture_channel(index, ch))
                .count();

            if info.caps.enumerated {
                ctrl.items = endpoint.enum_items(index)?;
                ctrl.item = endpoint.enum_item(index)?;
            }
            if info.caps.playback_switch {
                ctrl.playback_switch = (0..ctrl.playback_channels)
                    .map(|ch| endpoint.playback_switch(index, ch))
                    .collect::<std::result::Result<_, _>>()?;
            }
            if info.caps.capture_switch {
                ctrl.capture_switch = (0..ctrl.capture_channels)
                    .map(|ch| endpoint.capture_switch(index, ch))
                    .collect::<std::result::Result<_, _>>()?;
            }
            if info.caps.playback_db {
                ctrl.db_range = endpoint.playback_db_range(index)?;
                ctrl.playback_db = (0..ctrl.playback_channels)
                    .map(|ch| endpoint.playback_db(index, ch))
                    .collect::<std::result::Result<_, _>>()?;
                ctrl.capture_db = (0..ctrl.capture_channels)
                    .map(|ch| endpoint.capture_db(index, ch))
                    .collect::<std::result::Result<_, _>>()?;
            }
            controls.push(ctrl);
        }
        Ok(ControlSnapshot {
            card_name: endpoint.card_name().to_string(),
            controls,
        })
    }

    /// Just the control descriptions, in order.
    pub fn infos(&self) -> Vec<ControlInfo> {
        self.controls.iter().map(SnapshotControl::info).collect()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MixerError::Snapshot(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| MixerError::Snapshot(format!("{}: {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| MixerError::Snapshot(format!("serialize: {e}")))?;
        std::fs::write(path, json)
            .map_err(|e| MixerError::Snapshot(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::mock::{MockEndpoint, scarlett_18i6};

    #[test]
    fn capture_reproduces_mock_state() {
        let ep = scarlett_18i6();
        ep.set_enum_item(13, 3).unwrap();
        ep.set_playback_db(51, 0, -600).unwrap();
        let snap = ControlSnapshot::capture(&ep).unwrap();
        assert_eq!(snap.card_name, "Scarlett 18i6 USB");
        assert_eq!(snap.controls.len(), 158);
        assert_eq!(snap.controls[13].item, 3);
        assert_eq!(snap.controls[51].playback_db, vec![-600]);
        assert_eq!(snap.controls[1].playback_switch, vec![true, true]);
    }

    #[test]
    fn capture_records_capture_gain() {
        let mut line = SnapshotControl::gain("Line In 1 Level", 1);
        line.capture_channels = 1;
        line.capture_db = vec![-1200];
        let ep = MockEndpoint::new("Test", vec![line]);
        let snap = ControlSnapshot::capture(&ep).unwrap();
        assert_eq!(snap.controls[0].capture_db, vec![-1200]);

        ep.set_capture_db(0, 0, 300).unwrap();
        let snap = ControlSnapshot::capture(&ep).unwrap();
        assert_eq!(snap.controls[0].capture_db, vec![300]);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.json");
        let snap = ControlSnapshot::capture(&scarlett_18i6()).unwrap();
        snap.save(&path).unwrap();
        let loaded = ControlSnapshot::load(&path).unwrap();
        assert_eq!(loaded, snap);

        let ep = MockEndpoint::from_snapshot(loaded);
        assert_eq!(ep.card_name(), "Scarlett 18i6 USB");
        assert_eq!(ep.controls()[32].name, "Matrix 01 Input");
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let json = r#"{
            "card_name": "Test",
            "controls": [
                { "name": "Input Source 01", "caps": { "enumerated": true }, "items": ["Off", "Analog 1"] },
                { "name": "Matrix 01 Mix A", "caps": { "playback_db": true }, "playback_channels": 1 }
            ]
        }"#;
        let snap: ControlSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.controls[0].item, 0);
        assert_eq!(snap.controls[1].db_range, DEFAULT_DB_RANGE);
        assert_eq!(snap.infos()[0].name, "Input Source 01");
    }

    #[test]
    fn load_missing_file_is_snapshot_error() {
        let err = ControlSnapshot::load(Path::new("/nonexistent/card.json")).unwrap_err();
        assert!(matches!(err, MixerError::Snapshot(_)));
    }

    #[test]
    fn load_invalid_json_is_snapshot_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = ControlSnapshot::load(&path).unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }
}
