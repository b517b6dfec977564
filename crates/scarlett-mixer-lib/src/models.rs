//! Model registry — static control layouts for known Scarlett interfaces.
//!
//! Lookup is an exact match on the card name the driver reports. Devices
//! not listed here can still work through [`crate::detect`].
//!
//! The first-generation driver enumerates simple controls in a fixed
//! order: `Master`, then one gain + two source selectors per stereo bus,
//! the clock source, hi-z and pad switches, the capture routing
//! selectors, sync status, and finally the matrix rows (one input
//! selector followed by one gain per mix).

use crate::addressing::ControlId;
use crate::profile::{DeviceProfile, MatrixOrder, SlotMap};

/// Compile-time description of a model, expanded into a [`DeviceProfile`].
struct ProfileTemplate {
    name: &'static str,
    matrix_inputs: usize,
    matrix_outputs: usize,
    capture_inputs: usize,
    output_buses: usize,
    stereo_buses: usize,
    aux_buses: usize,
    matrix_order: MatrixOrder,
    matrix_offset: usize,
    matrix_stride: usize,
    matrix_in_offset: usize,
    matrix_in_stride: usize,
    capture_offset: usize,
    pads_are_switches: bool,
    master: Option<usize>,
    gains: &'static [usize],
    gain_labels: &'static [&'static str],
    buses: &'static [usize],
    hiz: &'static [usize],
    pads: &'static [usize],
    airs: &'static [usize],
}

impl ProfileTemplate {
    fn to_profile(&self) -> DeviceProfile {
        DeviceProfile {
            name: self.name.to_string(),
            matrix_inputs: self.matrix_inputs,
            matrix_outputs: self.matrix_outputs,
            capture_inputs: self.capture_inputs,
            output_buses: self.output_buses,
            stereo_buses: self.stereo_buses,
            aux_buses: self.aux_buses,
            hiz_count: self.hiz.len(),
            pad_count: self.pads.len(),
            air_count: self.airs.len(),
            matrix_order: self.matrix_order,
            matrix_offset: self.matrix_offset,
            matrix_stride: self.matrix_stride,
            matrix_in_offset: self.matrix_in_offset,
            matrix_in_stride: self.matrix_in_stride,
            capture_offset: self.capture_offset,
            pads_are_switches: self.pads_are_switches,
            master: self.master,
            gain_map: SlotMap::from_indices(self.gains),
            bus_map: SlotMap::from_indices(self.buses),
            hiz_map: SlotMap::from_indices(self.hiz),
            pad_map: SlotMap::from_indices(self.pads),
            air_map: SlotMap::from_indices(self.airs),
            gain_labels: self.gain_labels.iter().map(|s| s.to_string()).collect(),
        }
    }
}

// ── Scarlett 18i6 ──

static SCARLETT_18I6: ProfileTemplate = ProfileTemplate {
    name: "Scarlett 18i6 USB",
    matrix_inputs: 18,
    matrix_outputs: 6,
    capture_inputs: 18,
    output_buses: 6,
    stereo_buses: 3,
    aux_buses: 0,
    matrix_order: MatrixOrder::RowMajor,
    matrix_offset: 33,
    matrix_stride: 7,
    matrix_in_offset: 32,
    matrix_in_stride: 7,
    capture_offset: 13,
    pads_are_switches: false,
    master: Some(0),
    gains: &[1, 4, 7],
    gain_labels: &["Monitor", "Phones", "ADAT"],
    buses: &[2, 3, 5, 6, 8, 9],
    hiz: &[11, 12],
    pads: &[],
    airs: &[],
};

// ── Scarlett 18i8 ──

static SCARLETT_18I8: ProfileTemplate = ProfileTemplate {
    name: "Scarlett 18i8 USB",
    matrix_inputs: 18,
    matrix_outputs: 8,
    capture_inputs: 18,
    output_buses: 8,
    stereo_buses: 4,
    aux_buses: 0,
    matrix_order: MatrixOrder::RowMajor,
    matrix_offset: 40,
    matrix_stride: 9,
    matrix_in_offset: 39,
    matrix_in_stride: 9,
    capture_offset: 20,
    pads_are_switches: false,
    master: Some(0),
    gains: &[1, 4, 7, 10],
    gain_labels: &["Monitor", "Phones 1", "Phones 2", "SPDIF"],
    buses: &[2, 3, 5, 6, 8, 9, 11, 12],
    hiz: &[14, 15],
    pads: &[16, 17, 18, 19],
    airs: &[],
};

// ── Scarlett 6i6 ──

static SCARLETT_6I6: ProfileTemplate = ProfileTemplate {
    name: "Scarlett 6i6 USB",
    matrix_inputs: 18,
    matrix_outputs: 8,
    capture_inputs: 6,
    output_buses: 6,
    stereo_buses: 3,
    aux_buses: 0,
    matrix_order: MatrixOrder::RowMajor,
    matrix_offset: 25,
    matrix_stride: 9,
    matrix_in_offset: 24,
    matrix_in_stride: 9,
    capture_offset: 17,
    pads_are_switches: false,
    master: Some(0),
    gains: &[1, 4, 7],
    gain_labels: &["Monitor", "Phones", "SPDIF"],
    buses: &[2, 3, 5, 6, 8, 9],
    hiz: &[11, 12],
    pads: &[13, 14, 15, 16],
    airs: &[],
};

// ── Scarlett 18i20 ──

static SCARLETT_18I20: ProfileTemplate = ProfileTemplate {
    name: "Scarlett 18i20 USB",
    matrix_inputs: 18,
    matrix_outputs: 8,
    capture_inputs: 18,
    output_buses: 20,
    stereo_buses: 10,
    aux_buses: 0,
    matrix_order: MatrixOrder::RowMajor,
    matrix_offset: 52,
    matrix_stride: 9,
    matrix_in_offset: 51,
    matrix_in_stride: 9,
    capture_offset: 32,
    pads_are_switches: false,
    master: Some(0),
    gains: &[1, 4, 7, 10, 13, 16, 19, 22, 25, 28],
    gain_labels: &[
        "Monitor",
        "Line 3/4",
        "Line 5/6",
        "Line 7/8",
        "Line 9/10",
        "SPDIF",
        "ADAT 1/2",
        "ADAT 3/4",
        "ADAT 5/6",
        "ADAT 7/8",
    ],
    buses: &[
        2, 3, 5, 6, 8, 9, 11, 12, 14, 15, 17, 18, 20, 21, 23, 24, 26, 27, 29, 30,
    ],
    hiz: &[],
    pads: &[],
    airs: &[],
};

static MODELS: [&ProfileTemplate; 4] = [
    &SCARLETT_18I6,
    &SCARLETT_18I8,
    &SCARLETT_6I6,
    &SCARLETT_18I20,
];

/// Look up the static profile for a card name (exact match).
pub fn lookup(card_name: &str) -> Option<DeviceProfile> {
    MODELS
        .iter()
        .find(|t| t.name == card_name)
        .map(|t| t.to_profile())
}

/// Names of all models with a static profile.
pub fn known_models() -> impl Iterator<Item = &'static str> {
    MODELS.iter().map(|t| t.name)
}

/// Factory default item for a selector, given how many items it has.
///
/// Capture input `r` defaults to item `(r + 7) mod items`, matrix input `r`
/// to item `1 + r`, and output bus `n` to item `25 + n`; the last two are
/// clamped to the final item. Returns `None` for non-selector banks or
/// selectors without items.
pub fn default_selector_item(id: ControlId, item_count: u32) -> Option<u32> {
    if item_count == 0 {
        return None;
    }
    let last = item_count - 1;
    let slot = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
    match id {
        ControlId::CaptureSource(r) => Some(slot(r).saturating_add(7) % item_count),
        ControlId::MatrixSource(r) => Some(slot(r).saturating_add(1).min(last)),
        ControlId::OutputSource(n) => Some(slot(n).saturating_add(25).min(last)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing;

    // ── lookup ──

    #[test]
    fn lookup_18i6() {
        let p = lookup("Scarlett 18i6 USB").unwrap();
        assert_eq!(p.matrix_inputs, 18);
        assert_eq!(p.matrix_outputs, 6);
        assert_eq!(p.capture_inputs, 18);
        assert_eq!(p.output_buses, 6);
        assert_eq!(p.stereo_buses, 3);
        assert_eq!(p.master, Some(0));
        assert_eq!(p.gain_map.get(1), Some(4));
        assert_eq!(p.hiz_map.get(1), Some(12));
    }

    #[test]
    fn lookup_is_exact() {
        assert!(lookup("scarlett 18i6 usb").is_none());
        assert!(lookup("Scarlett 18i6").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn known_models_are_all_found() {
        for name in known_models() {
            assert!(lookup(name).is_some(), "{name}");
        }
    }

    // ── table consistency ──

    #[test]
    fn every_profile_is_complete() {
        for name in known_models() {
            let p = lookup(name).unwrap();
            assert!(p.is_complete(), "{name}: {:?}", p.missing_fields());
        }
    }

    #[test]
    fn map_sizes_match_counts() {
        for name in known_models() {
            let p = lookup(name).unwrap();
            assert_eq!(p.gain_map.len(), p.stereo_buses + p.aux_buses, "{name}");
            assert_eq!(p.bus_map.len(), p.output_buses, "{name}");
            assert_eq!(p.hiz_map.len(), p.hiz_count, "{name}");
            assert_eq!(p.pad_map.len(), p.pad_count, "{name}");
            assert_eq!(p.gain_labels.len(), p.gain_map.len(), "{name}");
        }
    }

    #[test]
    fn matrix_selector_precedes_its_row() {
        for name in known_models() {
            let p = lookup(name).unwrap();
            for r in 0..p.matrix_inputs {
                let sel = addressing::matrix_source(&p, r).unwrap();
                let first = addressing::matrix_cell(&p, r, 0).unwrap();
                assert_eq!(sel + 1, first, "{name} row {r}");
            }
        }
    }

    #[test]
    fn no_two_controls_share_an_index() {
        for name in known_models() {
            let p = lookup(name).unwrap();
            let mut seen = std::collections::HashSet::new();
            for id in addressing::all_controls(&p) {
                let idx = addressing::resolve(&p, id).unwrap();
                assert!(seen.insert(idx), "{name}: {id} collides at {idx}");
            }
        }
    }

    // ── defaults ──

    #[test]
    fn capture_default_wraps() {
        assert_eq!(default_selector_item(ControlId::CaptureSource(0), 25), Some(7));
        assert_eq!(default_selector_item(ControlId::CaptureSource(18), 25), Some(0));
    }

    #[test]
    fn matrix_source_default_skips_off() {
        assert_eq!(default_selector_item(ControlId::MatrixSource(0), 25), Some(1));
        assert_eq!(default_selector_item(ControlId::MatrixSource(30), 25), Some(24));
    }

    #[test]
    fn output_default_clamps() {
        assert_eq!(default_selector_item(ControlId::OutputSource(0), 31), Some(25));
        assert_eq!(default_selector_item(ControlId::OutputSource(5), 28), Some(27));
    }

    #[test]
    fn non_selector_has_no_default() {
        assert_eq!(default_selector_item(ControlId::MasterGain, 10), None);
        assert_eq!(default_selector_item(ControlId::CaptureSource(0), 0), None);
    }
}
