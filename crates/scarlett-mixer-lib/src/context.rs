//! Mixer context — picks the profile the engine runs with.
//!
//! Resolution: look the card name up in the static registry, then (if
//! enabled) run autodetection. A complete candidate replaces the static
//! profile wholesale; an incomplete one is discarded. With neither, the
//! device is unsupported.

use serde::Serialize;

use crate::addressing;
use crate::detect;
use crate::endpoint::{ControlEndpoint, ControlInfo};
use crate::error::{MixerError, Result};
use crate::models;
use crate::profile::DeviceProfile;

/// Where the active profile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileSource {
    Static,
    Detected,
}

impl std::fmt::Display for ProfileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileSource::Static => write!(f, "static"),
            ProfileSource::Detected => write!(f, "autodetected"),
        }
    }
}

/// Resolved profile plus how it was chosen.
#[derive(Debug, Clone)]
pub struct MixerContext {
    pub profile: DeviceProfile,
    pub source: ProfileSource,
    /// Fields autodetection could not fill (empty if it was not run or succeeded).
    pub candidate_missing: Vec<&'static str>,
    /// Length of the card's control list.
    pub control_count: usize,
}

impl MixerContext {
    /// Resolve the profile for `card_name` given its control list.
    ///
    /// Returns `Err(UnsupportedDevice)` when there is no static profile and
    /// autodetection is off or incomplete, and `Err(MissingControl)` when the
    /// chosen profile addresses past the end of `controls`.
    pub fn resolve(card_name: &str, controls: &[ControlInfo], autodetect: bool) -> Result<Self> {
        let static_profile = models::lookup(card_name);
        let mut candidate_missing = Vec::new();

        let mut chosen = None;
        if autodetect {
            let candidate = detect::detect(card_name, controls);
            if candidate.is_complete() {
                log::info!("[context] using autodetected layout for {card_name}");
                chosen = Some((candidate, ProfileSource::Detected));
            } else {
                candidate_missing = candidate.missing_fields();
                log::info!(
                    "[context] autodetection incomplete for {card_name} (missing {})",
                    candidate_missing.join(", ")
                );
            }
        }

        let (profile, source) = match (chosen, static_profile) {
            (Some(detected), _) => detected,
            (None, Some(p)) => (p, ProfileSource::Static),
            (None, None) => return Err(MixerError::UnsupportedDevice(card_name.to_string())),
        };

        let required = addressing::required_len(&profile);
        if required > controls.len() {
            return Err(MixerError::MissingControl {
                index: required - 1,
                count: controls.len(),
            });
        }

        Ok(MixerContext {
            profile,
            source,
            candidate_missing,
            control_count: controls.len(),
        })
    }

    /// Resolve from an opened endpoint.
    pub fn from_endpoint(endpoint: &impl ControlEndpoint, autodetect: bool) -> Result<Self> {
        Self::resolve(endpoint.card_name(), endpoint.controls(), autodetect)
    }
}
