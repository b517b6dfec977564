//! Control addressing — logical mixer controls to control-list indices.
//!
//! Everything here is index arithmetic over a [`DeviceProfile`]; nothing
//! touches hardware. Every function returns `None` for a control the
//! profile does not have, and callers must treat that as "nothing to do".

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::profile::{DeviceProfile, MatrixOrder};

/// A logical mixer control, independent of hardware addressing.
///
/// This is the identifier carried between the engine and the
/// presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlId {
    /// Capture routing selector for PCM input `r`.
    CaptureSource(usize),
    /// Source selector feeding matrix row `r`.
    MatrixSource(usize),
    /// Gain at matrix row `row`, mix `col`.
    MatrixGain { row: usize, col: usize },
    /// Stereo bus gain + mute.
    BusGain(usize),
    /// Mono aux gain.
    AuxGain(usize),
    /// Master gain + mute.
    MasterGain,
    /// Source selector for output bus `n`.
    OutputSource(usize),
    HiZ(usize),
    Pad(usize),
    Air(usize),
}

/// What kind of value a control carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    /// Enumerated item index.
    Selector,
    /// dB gain; `mutable` when it also has a mute.
    Gain { mutable: bool },
    /// On/off.
    Switch,
}

impl ControlId {
    pub fn kind(&self) -> ControlKind {
        match self {
            ControlId::CaptureSource(_) | ControlId::MatrixSource(_) | ControlId::OutputSource(_) => {
                ControlKind::Selector
            }
            ControlId::MatrixGain { .. } | ControlId::AuxGain(_) => {
                ControlKind::Gain { mutable: false }
            }
            ControlId::BusGain(_) | ControlId::MasterGain => ControlKind::Gain { mutable: true },
            ControlId::HiZ(_) | ControlId::Pad(_) | ControlId::Air(_) => ControlKind::Switch,
        }
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlId::CaptureSource(r) => write!(f, "capture:{r}"),
            ControlId::MatrixSource(r) => write!(f, "matrix-source:{r}"),
            ControlId::MatrixGain { row, col } => write!(f, "matrix:{row}:{col}"),
            ControlId::BusGain(n) => write!(f, "bus:{n}"),
            ControlId::AuxGain(n) => write!(f, "aux:{n}"),
            ControlId::MasterGain => write!(f, "master"),
            ControlId::OutputSource(n) => write!(f, "output:{n}"),
            ControlId::HiZ(n) => write!(f, "hiz:{n}"),
            ControlId::Pad(n) => write!(f, "pad:{n}"),
            ControlId::Air(n) => write!(f, "air:{n}"),
        }
    }
}

/// Error for a malformed control identifier string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseControlIdError(String);

impl fmt::Display for ParseControlIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid control '{}'", self.0)
    }
}

impl std::error::Error for ParseControlIdError {}

impl FromStr for ControlId {
    type Err = ParseControlIdError;

    /// Parses the `Display` form: `matrix:2:4`, `bus:0`, `master`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseControlIdError(s.to_string());
        let mut parts = s.trim().split(':');
        let bank = parts.next().ok_or_else(err)?.to_ascii_lowercase();
        let nums = parts
            .map(|p| p.trim().parse::<usize>().map_err(|_| err()))
            .collect::<Result<Vec<_>, _>>()?;
        let id = match (bank.as_str(), nums.as_slice()) {
            ("capture", &[r]) => ControlId::CaptureSource(r),
            ("matrix-source", &[r]) => ControlId::MatrixSource(r),
            ("matrix", &[row, col]) => ControlId::MatrixGain { row, col },
            ("bus", &[n]) => ControlId::BusGain(n),
            ("aux", &[n]) => ControlId::AuxGain(n),
            ("master", &[]) => ControlId::MasterGain,
            ("output", &[n]) => ControlId::OutputSource(n),
            ("hiz", &[n]) => ControlId::HiZ(n),
            ("pad", &[n]) => ControlId::Pad(n),
            ("air", &[n]) => ControlId::Air(n),
            _ => return Err(err()),
        };
        Ok(id)
    }
}

// ── Resolver ──

/// Matrix gain at (`row`, `col`).
pub fn matrix_cell(p: &DeviceProfile, row: usize, col: usize) -> Option<usize> {
    if row >= p.matrix_inputs || col >= p.matrix_outputs {
        return None;
    }
    match p.matrix_order {
        MatrixOrder::RowMajor => Some(p.matrix_offset + row * p.matrix_stride + col),
        MatrixOrder::ColumnMajor => Some(p.matrix_offset + col * p.matrix_stride + row),
    }
}

/// Source selector of matrix row `row`.
pub fn matrix_source(p: &DeviceProfile, row: usize) -> Option<usize> {
    (row < p.matrix_inputs).then(|| p.matrix_in_offset + row * p.matrix_in_stride)
}

/// Capture routing selector `row`.
pub fn capture_source(p: &DeviceProfile, row: usize) -> Option<usize> {
    (row < p.capture_inputs).then(|| p.capture_offset + row)
}

/// Stereo bus gain `n`.
pub fn bus_gain(p: &DeviceProfile, n: usize) -> Option<usize> {
    if n >= p.stereo_buses {
        return None;
    }
    p.gain_map.get(n)
}

/// Aux gain `n` (stored after the stereo buses in the gain bank).
pub fn aux_gain(p: &DeviceProfile, n: usize) -> Option<usize> {
    if n >= p.aux_buses {
        return None;
    }
    p.gain_map.get(p.stereo_buses + n)
}

/// Output bus source selector `n`.
pub fn output_source(p: &DeviceProfile, n: usize) -> Option<usize> {
    if n >= p.output_buses {
        return None;
    }
    p.bus_map.get(n)
}

pub fn hiz(p: &DeviceProfile, n: usize) -> Option<usize> {
    p.hiz_map.get(n)
}

pub fn pad(p: &DeviceProfile, n: usize) -> Option<usize> {
    p.pad_map.get(n)
}

pub fn air(p: &DeviceProfile, n: usize) -> Option<usize> {
    p.air_map.get(n)
}

pub fn master(p: &DeviceProfile) -> Option<usize> {
    p.master
}

/// Resolve any logical control.
pub fn resolve(p: &DeviceProfile, id: ControlId) -> Option<usize> {
    match id {
        ControlId::CaptureSource(r) => capture_source(p, r),
        ControlId::MatrixSource(r) => matrix_source(p, r),
        ControlId::MatrixGain { row, col } => matrix_cell(p, row, col),
        ControlId::BusGain(n) => bus_gain(p, n),
        ControlId::AuxGain(n) => aux_gain(p, n),
        ControlId::MasterGain => master(p),
        ControlId::OutputSource(n) => output_source(p, n),
        ControlId::HiZ(n) => hiz(p, n),
        ControlId::Pad(n) => pad(p, n),
        ControlId::Air(n) => air(p, n),
    }
}

/// Every logical control the profile defines, in refresh order.
///
/// Capture selectors, matrix rows (selector then gains), stereo buses, aux
/// buses, master, hi-z/pad/air switches, output bus selectors.
pub fn all_controls(p: &DeviceProfile) -> Vec<ControlId> {
    let mut ids = Vec::new();
    ids.extend((0..p.capture_inputs).map(ControlId::CaptureSource));
    for row in 0..p.matrix_inputs {
        ids.push(ControlId::MatrixSource(row));
        ids.extend((0..p.matrix_outputs).map(|col| ControlId::MatrixGain { row, col }));
    }
    ids.extend((0..p.stereo_buses).map(ControlId::BusGain));
    ids.extend((0..p.aux_buses).map(ControlId::AuxGain));
    if p.master.is_some() {
        ids.push(ControlId::MasterGain);
    }
    ids.extend(p.hiz_map.iter().map(|(n, _)| ControlId::HiZ(n)));
    ids.extend(p.pad_map.iter().map(|(n, _)| ControlId::Pad(n)));
    ids.extend(p.air_map.iter().map(|(n, _)| ControlId::Air(n)));
    ids.extend((0..p.output_buses).map(ControlId::OutputSource));
    // Drop declared-but-unmapped slots so every entry resolves.
    ids.retain(|&id| resolve(p, id).is_some());
    ids
}

/// Smallest control-list length that can hold every index the profile resolves.
pub fn required_len(p: &DeviceProfile) -> usize {
    all_controls(p)
        .into_iter()
        .filter_map(|id| resolve(p, id))
        .max()
        .map_or(0, |max| max + 1)
}
