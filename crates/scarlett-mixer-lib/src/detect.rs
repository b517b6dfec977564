//! Autodetection — derive a candidate [`DeviceProfile`] from control names.
//!
//! Each control is classified by its name and capabilities; the positions
//! of the matches give the profile's offsets and strides. The result may
//! be incomplete (see [`DeviceProfile::is_complete`]); whether to adopt it
//! is decided in [`crate::context`].

use crate::endpoint::{Capabilities, ControlInfo};
use crate::profile::{DeviceProfile, MAX_GAINS, MatrixOrder};

/// What a single control was recognised as.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Role {
    Master,
    StereoGain(String),
    AuxGain(String),
    OutputSource,
    HiZ,
    Pad { switch: bool },
    Air,
    CaptureSource,
    MatrixSource,
    MatrixCell { order: MatrixOrder, row: usize, col: usize },
}

/// Text inside the first pair of parentheses, if any.
fn parenthesized(name: &str) -> Option<&str> {
    let open = name.find('(')?;
    let close = name[open..].find(')')? + open;
    let inner = name[open + 1..close].trim();
    (!inner.is_empty()).then_some(inner)
}

fn gain_label(name: &str) -> String {
    parenthesized(name)
        .or_else(|| name.strip_suffix(" Output"))
        .unwrap_or(name)
        .to_string()
}

fn mix_column(letter: &str) -> Option<usize> {
    match letter.as_bytes() {
        &[c] if c.is_ascii_uppercase() => Some(usize::from(c - b'A')),
        _ => None,
    }
}

fn row_number(digits: &str) -> Option<usize> {
    digits.parse::<usize>().ok()?.checked_sub(1)
}

/// `Matrix NN Mix X` (row-major) or `Mix X Input NN` (column-major).
fn parse_matrix_cell(name: &str) -> Option<(MatrixOrder, usize, usize)> {
    if let Some(rest) = name.strip_prefix("Matrix ") {
        let parts: Vec<&str> = rest.split_whitespace().collect();
        if let [row, "Mix", mix] = parts.as_slice() {
            return Some((MatrixOrder::RowMajor, row_number(row)?, mix_column(mix)?));
        }
    }
    if let Some(rest) = name.strip_prefix("Mix ") {
        let parts: Vec<&str> = rest.split_whitespace().collect();
        if let [mix, "Input", row] = parts.as_slice() {
            return Some((MatrixOrder::ColumnMajor, row_number(row)?, mix_column(mix)?));
        }
    }
    None
}

fn classify(name: &str, caps: Capabilities) -> Option<Role> {
    if caps.playback_db {
        if name == "Master" {
            return Some(Role::Master);
        }
        let is_output = name.starts_with("Master ") || name.ends_with(" Output");
        if is_output && caps.playback_switch {
            return Some(Role::StereoGain(gain_label(name)));
        }
        if name.ends_with(" Output") {
            return Some(Role::AuxGain(gain_label(name)));
        }
        if let Some((order, row, col)) = parse_matrix_cell(name) {
            return Some(Role::MatrixCell { order, row, col });
        }
        return None;
    }

    if name.contains("Impedance") || name.ends_with(" Level") {
        return Some(Role::HiZ);
    }
    if name.ends_with(" Pad") {
        return Some(Role::Pad {
            switch: caps.capture_switch,
        });
    }
    if name.ends_with(" Air") {
        return Some(Role::Air);
    }
    if !caps.enumerated {
        return None;
    }
    if name.ends_with(" Source") && (name.starts_with("Master ") || name.contains(" Out")) {
        return Some(Role::OutputSource);
    }
    if name.starts_with("Input Source") || name.starts_with("PCM ") {
        return Some(Role::CaptureSource);
    }
    if (name.starts_with("Matrix ") || name.starts_with("Mixer ")) && name.ends_with(" Input") {
        return Some(Role::MatrixSource);
    }
    None
}

/// Length of the run `first, first + stride, first + 2 * stride, ...` in `indices`.
fn run_length(indices: &[usize], stride: usize) -> usize {
    let Some(&first) = indices.first() else {
        return 0;
    };
    indices
        .iter()
        .enumerate()
        .take_while(|&(k, &idx)| idx == first + k * stride)
        .count()
}

/// Derive a candidate profile for `card_name` from its control list.
pub fn detect(card_name: &str, controls: &[ControlInfo]) -> DeviceProfile {
    let mut p = DeviceProfile::blank(card_name);
    let mut stereo: Vec<(usize, String)> = Vec::new();
    let mut aux: Vec<(usize, String)> = Vec::new();
    let mut captures = Vec::new();
    let mut sources = Vec::new();
    let mut cells: Vec<(usize, MatrixOrder, usize, usize)> = Vec::new();

    for (idx, ctrl) in controls.iter().enumerate() {
        let Some(role) = classify(&ctrl.name, ctrl.caps) else {
            continue;
        };
        log::trace!("[detect] {idx:>3} {:<32} → {role:?}", ctrl.name);
        match role {
            Role::Master => p.master = Some(idx),
            Role::StereoGain(label) => stereo.push((idx, label)),
            Role::AuxGain(label) => aux.push((idx, label)),
            Role::OutputSource => {
                if !p.bus_map.push(idx) {
                    log::debug!("[detect] output bus map full, ignoring {}", ctrl.name);
                }
            }
            Role::HiZ => {
                if p.hiz_map.push(idx) {
                    p.hiz_count += 1;
                }
            }
            Role::Pad { switch } => {
                if p.pad_map.push(idx) {
                    p.pad_count += 1;
                    p.pads_are_switches |= switch;
                }
            }
            Role::Air => {
                if p.air_map.push(idx) {
                    p.air_count += 1;
                }
            }
            Role::CaptureSource => captures.push(idx),
            Role::MatrixSource => sources.push(idx),
            Role::MatrixCell { order, row, col } => cells.push((idx, order, row, col)),
        }
    }

    p.output_buses = p.bus_map.len();

    // Gain bank: stereo buses first, aux after them.
    for (idx, label) in stereo.into_iter().take(MAX_GAINS) {
        p.gain_map.push(idx);
        p.gain_labels.push(label);
        p.stereo_buses += 1;
    }
    for (idx, label) in aux {
        if !p.gain_map.push(idx) {
            log::debug!("[detect] gain bank full, ignoring aux {label}");
            break;
        }
        p.gain_labels.push(label);
        p.aux_buses += 1;
    }

    // Capture selectors must be contiguous.
    if let Some(&first) = captures.first() {
        p.capture_offset = first;
        p.capture_inputs = run_length(&captures, 1);
        if p.capture_inputs < captures.len() {
            log::debug!(
                "[detect] capture selectors not contiguous; using first {}",
                p.capture_inputs
            );
        }
    }

    // Matrix source selectors: stride from the first two.
    if let Some(&first) = sources.first() {
        let stride = sources.get(1).map_or(1, |&second| second - first);
        p.matrix_in_offset = first;
        p.matrix_in_stride = stride;
        p.matrix_inputs = run_length(&sources, stride);
    }

    detect_matrix(&mut p, &cells);

    log::debug!(
        "[detect] {card_name}: {} missing field(s) {:?}",
        p.missing_fields().len(),
        p.missing_fields()
    );
    p
}

fn detect_matrix(p: &mut DeviceProfile, cells: &[(usize, MatrixOrder, usize, usize)]) {
    let Some(&(_, order, _, _)) = cells.first() else {
        return;
    };
    let cells: Vec<_> = cells.iter().filter(|c| c.1 == order).collect();
    let Some(origin) = cells.iter().find(|c| c.2 == 0 && c.3 == 0) else {
        log::debug!("[detect] matrix has no first cell");
        return;
    };
    let offset = origin.0;
    let outputs = cells.iter().map(|c| c.3 + 1).max().unwrap_or(0);
    let rows = cells.iter().map(|c| c.2 + 1).max().unwrap_or(0);

    let (next, fallback) = match order {
        MatrixOrder::RowMajor => (cells.iter().find(|c| c.2 == 1 && c.3 == 0), outputs),
        MatrixOrder::ColumnMajor => (cells.iter().find(|c| c.2 == 0 && c.3 == 1), rows),
    };
    // A second row (or column) listed before the first cell cannot be
    // addressed; the matrix stays undetected.
    let stride = match next {
        None => fallback,
        Some(c) => match c.0.checked_sub(offset) {
            Some(stride) if stride > 0 => stride,
            _ => {
                log::debug!("[detect] matrix cell {} precedes the first cell at {offset}", c.0);
                return;
            }
        },
    };

    p.matrix_order = order;
    p.matrix_offset = offset;
    p.matrix_stride = stride;
    p.matrix_outputs = outputs;
    // Rows need both a selector and a full set of cells.
    p.matrix_inputs = match p.matrix_inputs {
        0 => rows,
        n => n.min(rows),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::ControlEndpoint;
    use crate::endpoint::mock;
    use crate::models;

    fn infos(controls: &[crate::snapshot::SnapshotControl]) -> Vec<ControlInfo> {
        controls.iter().map(|c| c.info()).collect()
    }

    // ── name parsing ──

    #[test]
    fn parse_row_major_cell() {
        assert_eq!(
            parse_matrix_cell("Matrix 03 Mix E"),
            Some((MatrixOrder::RowMajor, 2, 4))
        );
    }

    #[test]
    fn parse_column_major_cell() {
        assert_eq!(
            parse_matrix_cell("Mix B Input 10"),
            Some((MatrixOrder::ColumnMajor, 9, 1))
        );
    }

    #[test]
    fn parse_rejects_other_names() {
        assert_eq!(parse_matrix_cell("Matrix 01 Input"), None);
        assert_eq!(parse_matrix_cell("Matrix 00 Mix A"), None);
        assert_eq!(parse_matrix_cell("Mix AB Input 01"), None);
    }

    #[test]
    fn label_from_parentheses_or_suffix() {
        assert_eq!(gain_label("Master 2 (Phones)"), "Phones");
        assert_eq!(gain_label("Headphones Output"), "Headphones");
        assert_eq!(gain_label("Master 4"), "Master 4");
    }

    #[test]
    fn clock_source_is_not_an_output_bus() {
        let caps = Capabilities {
            enumerated: true,
            ..Default::default()
        };
        assert_eq!(classify("Sample Clock Source", caps), None);
        assert_eq!(
            classify("Master 1L (Monitor) Source", caps),
            Some(Role::OutputSource)
        );
    }

    // ── full lists ──

    #[test]
    fn detects_18i6_exactly_like_the_registry() {
        let ep = mock::scarlett_18i6();
        let detected = detect(ep.card_name(), ep.controls());
        let registered = models::lookup("Scarlett 18i6 USB").unwrap();
        assert_eq!(detected, registered);
    }

    #[test]
    fn detects_column_major_layout() {
        let ep = mock::column_major();
        let p = detect(ep.card_name(), ep.controls());
        assert!(p.is_complete(), "missing {:?}", p.missing_fields());
        assert_eq!(p.matrix_order, MatrixOrder::ColumnMajor);
        assert_eq!(p.matrix_offset, 32);
        assert_eq!(p.matrix_stride, 10);
        assert_eq!(p.matrix_inputs, 10);
        assert_eq!(p.matrix_outputs, 4);
        assert_eq!(p.matrix_in_offset, 22);
        assert_eq!(p.matrix_in_stride, 1);
        assert_eq!(p.capture_offset, 16);
        assert_eq!(p.capture_inputs, 6);
        assert_eq!(p.stereo_buses, 2);
        assert_eq!(p.aux_buses, 2);
        assert_eq!(p.output_buses, 6);
        assert_eq!(p.master, None);
        assert!(p.pads_are_switches);
        assert_eq!(p.pad_map.iter().map(|(_, i)| i).collect::<Vec<_>>(), vec![12, 13]);
        assert_eq!(p.air_map.iter().map(|(_, i)| i).collect::<Vec<_>>(), vec![14, 15]);
        assert_eq!(p.gain_labels, vec!["Monitor", "Headphones", "Line 5", "Line 6"]);
    }

    #[test]
    fn missing_capture_selectors_leave_candidate_incomplete() {
        let controls: Vec<_> = mock::scarlett_18i6_controls()
            .into_iter()
            .filter(|c| !c.name.starts_with("Input Source"))
            .collect();
        let p = detect("Scarlett 18i6 USB", &infos(&controls));
        assert!(!p.is_complete());
        assert_eq!(p.missing_fields(), vec!["capture_inputs", "capture_offset"]);
    }

    #[test]
    fn reordered_matrix_rows_leave_candidate_incomplete() {
        let mut controls = mock::scarlett_18i6_controls();
        // "Matrix 01 Mix A" and "Matrix 02 Mix A"
        controls.swap(33, 40);
        let p = detect("Scarlett 18i6 USB", &infos(&controls));
        assert!(!p.is_complete());
        assert!(p.missing_fields().contains(&"matrix_offset"));
        assert_eq!(p.matrix_stride, 0);
    }

    #[test]
    fn reordered_matrix_keeps_static_profile() {
        let mut controls = mock::scarlett_18i6_controls();
        controls.swap(33, 40);
        let ctx = crate::context::MixerContext::resolve("Scarlett 18i6 USB", &infos(&controls), true)
            .unwrap();
        assert_eq!(ctx.source, crate::context::ProfileSource::Static);
        assert_eq!(ctx.profile.matrix_stride, 7);
    }

    #[test]
    fn empty_list_detects_nothing() {
        let p = detect("Nothing", &[]);
        assert_eq!(p, DeviceProfile::blank("Nothing"));
    }

    #[test]
    fn non_contiguous_capture_run_is_truncated() {
        let mut controls = mock::scarlett_18i6_controls();
        // Break the run after the fourth selector.
        controls[17].caps.enumerated = false;
        let p = detect("x", &infos(&controls));
        assert_eq!(p.capture_offset, 13);
        assert_eq!(p.capture_inputs, 4);
    }
}
