//! Device profiles — the control layout of one Scarlett model.
//!
//! A [`DeviceProfile`] says how many matrix rows/columns, capture inputs and
//! output buses a model has, and where in the enumerated control list each
//! of them lives. Profiles come from the static registry ([`crate::models`])
//! or from autodetection ([`crate::detect`]); once the engine adopts one it
//! is never mutated.

use serde::Serialize;

/// Capacity of the stereo + mono gain bank.
pub const MAX_GAINS: usize = 12;
/// Capacity of the output-bus source map.
pub const MAX_BUSES: usize = 24;
/// Capacity of the hi-z switch map.
pub const MAX_HIZ: usize = 4;
/// Capacity of the pad switch map.
pub const MAX_PADS: usize = 8;
/// Capacity of the air switch map.
pub const MAX_AIRS: usize = 8;

/// Fixed-capacity map from a logical slot to an optional control index.
///
/// Unused slots are `None`; there is no sentinel index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SlotMap<const N: usize> {
    #[serde(with = "slots_as_seq")]
    slots: [Option<usize>; N],
}

impl<const N: usize> Default for SlotMap<N> {
    fn default() -> Self {
        Self { slots: [None; N] }
    }
}

impl<const N: usize> SlotMap<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill slots `0..indices.len()` in order. Entries past the capacity are dropped.
    pub fn from_indices(indices: &[usize]) -> Self {
        let mut map = Self::new();
        for (slot, &index) in indices.iter().take(N).enumerate() {
            map.slots[slot] = Some(index);
        }
        map
    }

    /// Control index for `slot`, or `None` if the slot is unused or out of range.
    pub fn get(&self, slot: usize) -> Option<usize> {
        self.slots.get(slot).copied().flatten()
    }

    /// Append to the first free slot. Returns `false` when full.
    pub fn push(&mut self, index: usize) -> bool {
        match self.slots.iter_mut().find(|s| s.is_none()) {
            Some(slot) => {
                *slot = Some(index);
                true
            }
            None => false,
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Occupied `(slot, index)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, idx)| idx.map(|i| (slot, i)))
    }
}

mod slots_as_seq {
    use serde::Serializer;
    use serde::ser::SerializeSeq;

    pub fn serialize<S: Serializer, const N: usize>(
        slots: &[Option<usize>; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(N))?;
        for slot in slots {
            seq.serialize_element(slot)?;
        }
        seq.end()
    }
}

/// How matrix cells are laid out in the control list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatrixOrder {
    /// `offset + row * stride + col` — all mixes of one input are adjacent.
    RowMajor,
    /// `offset + col * stride + row` — all inputs of one mix are adjacent.
    ColumnMajor,
}

/// Layout of one hardware model's mixer controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceProfile {
    /// Card name as reported by the driver, e.g. "Scarlett 18i6 USB".
    pub name: String,
    /// Matrix rows (mixer inputs).
    pub matrix_inputs: usize,
    /// Matrix columns (mixes A, B, ...).
    pub matrix_outputs: usize,
    /// Capture routing selectors.
    pub capture_inputs: usize,
    /// Output bus source selectors.
    pub output_buses: usize,
    /// Stereo buses with gain + mute.
    pub stereo_buses: usize,
    /// Mono aux outputs with gain only.
    pub aux_buses: usize,
    pub hiz_count: usize,
    pub pad_count: usize,
    pub air_count: usize,

    pub matrix_order: MatrixOrder,
    pub matrix_offset: usize,
    pub matrix_stride: usize,
    pub matrix_in_offset: usize,
    pub matrix_in_stride: usize,
    pub capture_offset: usize,

    /// Pads are capture switches rather than enumerated controls.
    pub pads_are_switches: bool,

    /// Master gain + mute, if the model has one.
    pub master: Option<usize>,
    /// Stereo bus gains in slots `0..stereo_buses`, aux gains after them.
    pub gain_map: SlotMap<MAX_GAINS>,
    pub bus_map: SlotMap<MAX_BUSES>,
    pub hiz_map: SlotMap<MAX_HIZ>,
    pub pad_map: SlotMap<MAX_PADS>,
    pub air_map: SlotMap<MAX_AIRS>,
    /// Display label per gain slot ("Monitor", "Phones", ...).
    pub gain_labels: Vec<String>,
}

impl DeviceProfile {
    /// An empty profile to be filled in by autodetection.
    pub fn blank(name: &str) -> Self {
        Self {
            name: name.to_string(),
            matrix_inputs: 0,
            matrix_outputs: 0,
            capture_inputs: 0,
            output_buses: 0,
            stereo_buses: 0,
            aux_buses: 0,
            hiz_count: 0,
            pad_count: 0,
            air_count: 0,
            matrix_order: MatrixOrder::RowMajor,
            matrix_offset: 0,
            matrix_stride: 0,
            matrix_in_offset: 0,
            matrix_in_stride: 0,
            capture_offset: 0,
            pads_are_switches: false,
            master: None,
            gain_map: SlotMap::new(),
            bus_map: SlotMap::new(),
            hiz_map: SlotMap::new(),
            pad_map: SlotMap::new(),
            air_map: SlotMap::new(),
            gain_labels: Vec::new(),
        }
    }

    /// Whether every field the engine needs is populated.
    ///
    /// Autodetected candidates are only adopted when this holds.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Names of required fields that are still zero.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let required = [
            ("matrix_inputs", self.matrix_inputs),
            ("matrix_outputs", self.matrix_outputs),
            ("capture_inputs", self.capture_inputs),
            ("output_buses", self.output_buses),
            ("stereo_buses", self.stereo_buses),
            ("matrix_offset", self.matrix_offset),
            ("matrix_in_offset", self.matrix_in_offset),
            ("capture_offset", self.capture_offset),
        ];
        required
            .into_iter()
            .filter(|&(_, v)| v == 0)
            .map(|(name, _)| name)
            .collect()
    }

    /// Label for gain slot `n`, falling back to "Out N".
    pub fn gain_label(&self, n: usize) -> String {
        match self.gain_labels.get(n) {
            Some(label) if !label.is_empty() => label.clone(),
            _ => format!("Out {}", n + 1),
        }
    }

    /// Matrix column label: "Mix A", "Mix B", ...
    pub fn mix_label(col: usize) -> String {
        match u8::try_from(col).ok().filter(|&c| c < 26) {
            Some(c) => format!("Mix {}", (b'A' + c) as char),
            None => format!("Mix {}", col + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── SlotMap ──

    #[test]
    fn empty_slot_is_none() {
        let map: SlotMap<4> = SlotMap::new();
        assert_eq!(map.get(0), None);
        assert!(map.is_empty());
    }

    #[test]
    fn slot_zero_is_not_confused_with_absent() {
        let map: SlotMap<4> = SlotMap::from_indices(&[0]);
        assert_eq!(map.get(0), Some(0));
        assert_eq!(map.get(1), None);
    }

    #[test]
    fn out_of_capacity_slot_is_none() {
        let map: SlotMap<2> = SlotMap::from_indices(&[5, 6]);
        assert_eq!(map.get(2), None);
        assert_eq!(map.get(usize::MAX), None);
    }

    #[test]
    fn from_indices_truncates_to_capacity() {
        let map: SlotMap<2> = SlotMap::from_indices(&[1, 2, 3]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.capacity(), 2);
    }

    #[test]
    fn push_fills_then_refuses() {
        let mut map: SlotMap<2> = SlotMap::new();
        assert!(map.push(10));
        assert!(map.push(11));
        assert!(!map.push(12));
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![(0, 10), (1, 11)]);
    }

    #[test]
    fn slot_map_serializes_as_sequence() {
        let map: SlotMap<3> = SlotMap::from_indices(&[4]);
        assert_eq!(serde_json::to_string(&map).unwrap(), "[4,null,null]");
    }

    // ── DeviceProfile ──

    #[test]
    fn blank_profile_is_incomplete() {
        let p = DeviceProfile::blank("x");
        assert!(!p.is_complete());
        assert_eq!(p.missing_fields().len(), 8);
    }

    #[test]
    fn single_missing_offset_is_reported() {
        let mut p = DeviceProfile::blank("x");
        p.matrix_inputs = 18;
        p.matrix_outputs = 6;
        p.capture_inputs = 18;
        p.output_buses = 6;
        p.stereo_buses = 3;
        p.matrix_offset = 33;
        p.matrix_in_offset = 32;
        assert_eq!(p.missing_fields(), vec!["capture_offset"]);
        p.capture_offset = 13;
        assert!(p.is_complete());
    }

    #[test]
    fn gain_label_fallback() {
        let mut p = DeviceProfile::blank("x");
        p.gain_labels = vec!["Monitor".into(), String::new()];
        assert_eq!(p.gain_label(0), "Monitor");
        assert_eq!(p.gain_label(1), "Out 2");
        assert_eq!(p.gain_label(5), "Out 6");
    }

    #[test]
    fn mix_labels() {
        assert_eq!(DeviceProfile::mix_label(0), "Mix A");
        assert_eq!(DeviceProfile::mix_label(5), "Mix F");
        assert_eq!(DeviceProfile::mix_label(30), "Mix 31");
    }
}
