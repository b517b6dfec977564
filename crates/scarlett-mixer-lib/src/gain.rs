//! Gain curve — maps dial positions (0..1) to hardware decibels and back.
//!
//! The curve is `sqrt(v) / (sqrt(0.5) + sqrt(v))` scaled to a 228.75 dB
//! span starting at −128 dB. It reaches +6 dB at `v = 1.0` and would keep
//! climbing towards an asymptote at +100.75 dB, so both directions clamp:
//! [`knob_to_db`] never reports more than [`MAX_DB`], and [`db_to_knob`]
//! never returns more than [`MAX_KNOB`].

/// Lowest hardware gain ("off").
pub const MIN_DB: i32 = -128;

/// Highest gain a dial can produce.
pub const MAX_DB: i32 = 6;

/// Unity gain.
pub const UNITY_DB: i32 = 0;

/// Full dial travel.
pub const MAX_KNOB: f32 = 1.0;

/// Width of the curve in dB (from −128 dB to the asymptote).
const CURVE_SPAN_DB: f64 = 228.75;

/// Offset of the curve: dial position 0 maps here.
const CURVE_FLOOR_DB: f64 = -128.0;

/// `1 - k` below this is treated as the asymptote.
const ASYMPTOTE_EPSILON: f64 = 1e-9;

/// Convert a dial position to an integer dB value.
///
/// Positions outside `[0, 1]` are clamped first; NaN is treated as 0.
/// The result is rounded half-to-even and never exceeds [`MAX_DB`].
pub fn knob_to_db(v: f32) -> i32 {
    let v = if v.is_nan() { 0.0 } else { f64::from(v).clamp(0.0, 1.0) };
    let s = v.sqrt();
    let db = s / (0.5f64.sqrt() + s) * CURVE_SPAN_DB + CURVE_FLOOR_DB;
    if db > f64::from(MAX_DB) {
        return MAX_DB;
    }
    db.round_ties_even() as i32
}

/// Convert a dB value to a dial position.
///
/// Accepts fractional dB (hardware reports hundredths). Values at or below
/// −128 dB map to 0; values at or beyond the asymptote map to [`MAX_KNOB`].
pub fn db_to_knob(db: f32) -> f32 {
    let k = (f64::from(db) - CURVE_FLOOR_DB) / CURVE_SPAN_DB;
    if k.is_nan() || k <= 0.0 {
        return 0.0;
    }
    let divisor = 1.0 - k;
    if divisor <= ASYMPTOTE_EPSILON {
        return MAX_KNOB;
    }
    let s = k * 0.5f64.sqrt() / divisor;
    ((s * s) as f32).min(MAX_KNOB)
}

/// Hardware dB value expressed in the endpoint's unit (hundredths of a dB).
pub fn db_to_centi(db: i32) -> i64 {
    i64::from(db) * 100
}

/// Endpoint hundredths of a dB as fractional dB.
pub fn centi_to_db(centi: i64) -> f32 {
    centi as f32 / 100.0
}

/// A gain setting seen from both sides of the curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainValue {
    /// Dial position in `[0, 1]`.
    pub knob: f32,
    /// Integer hardware gain in dB.
    pub db: i32,
}

impl GainValue {
    /// From a dial position (user interaction).
    pub fn from_knob(knob: f32) -> Self {
        let db = knob_to_db(knob);
        Self {
            knob: if knob.is_nan() { 0.0 } else { knob.clamp(0.0, MAX_KNOB) },
            db,
        }
    }

    /// From a hardware reading in hundredths of a dB.
    pub fn from_centi(centi: i64) -> Self {
        let knob = db_to_knob(centi_to_db(centi));
        Self {
            knob,
            db: knob_to_db(knob),
        }
    }

    /// From an integer dB value.
    pub fn from_db(db: i32) -> Self {
        let knob = db_to_knob(db as f32);
        Self {
            knob,
            db: knob_to_db(knob),
        }
    }

    pub fn mark(&self) -> GainMark {
        GainMark::classify(self.db)
    }
}

/// Highlight state for a matrix dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainMark {
    /// At −128 dB: the cell contributes nothing.
    Off,
    /// At 0 dB.
    Unity,
    /// Anything else.
    Level,
}

impl GainMark {
    pub fn classify(db: i32) -> Self {
        match db {
            MIN_DB => GainMark::Off,
            UNITY_DB => GainMark::Unity,
            _ => GainMark::Level,
        }
    }
}

/// Dial annotation, e.g. `" -6dB"`, `" +0dB"`, `"-128dB"`.
pub fn format_db(db: i32) -> String {
    format!("{:>+3}dB", db)
}
