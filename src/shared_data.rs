// src/shared_data.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::global_variables::{
    FALLBACK_DENSITY, FALLBACK_GREEN_SECONDS, FALLBACK_YELLOW_SECONDS, JUNCTION1_KEY,
    JUNCTION2_KEY,
};

/// Identifies one of the two simulated junctions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JunctionId {
    Junction1,
    Junction2,
}

impl JunctionId {
    pub const ALL: [JunctionId; 2] = [JunctionId::Junction1, JunctionId::Junction2];

    /// Key used for this junction in the analysis document and in uploads.
    pub fn key(self) -> &'static str {
        match self {
            JunctionId::Junction1 => JUNCTION1_KEY,
            JunctionId::Junction2 => JUNCTION2_KEY,
        }
    }
}

impl fmt::Display for JunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The color currently shown by a junction's signal head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalPhase {
    Green,
    Yellow,
    Red,
}

impl SignalPhase {
    /// Upper-cased label shown next to the signal head.
    pub fn label(self) -> &'static str {
        match self {
            SignalPhase::Green => "GREEN",
            SignalPhase::Yellow => "YELLOW",
            SignalPhase::Red => "RED",
        }
    }
}

impl fmt::Display for SignalPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Green/yellow durations and the measured density for one junction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JunctionTiming {
    pub green_seconds: u32,
    pub yellow_seconds: u32,
    pub density_vehicles_per_minute: f64,
}

impl JunctionTiming {
    pub fn new(green_seconds: u32, yellow_seconds: u32, density_vehicles_per_minute: f64) -> Self {
        Self {
            green_seconds,
            yellow_seconds,
            density_vehicles_per_minute,
        }
    }

    pub fn fallback() -> Self {
        Self::new(
            FALLBACK_GREEN_SECONDS,
            FALLBACK_YELLOW_SECONDS,
            FALLBACK_DENSITY,
        )
    }
}

/// Resolved timings for both junctions, either from an analysis result or the fallback.
///
/// A plan is never mutated once built; the coordinator only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingPlan {
    junction1: JunctionTiming,
    junction2: JunctionTiming,
}

impl TimingPlan {
    pub fn new(junction1: JunctionTiming, junction2: JunctionTiming) -> Self {
        Self {
            junction1,
            junction2,
        }
    }

    /// Plan substituted whenever acquiring an analysis result fails.
    pub fn fallback() -> Self {
        Self::new(JunctionTiming::fallback(), JunctionTiming::fallback())
    }

    pub fn junction(&self, id: JunctionId) -> &JunctionTiming {
        match id {
            JunctionId::Junction1 => &self.junction1,
            JunctionId::Junction2 => &self.junction2,
        }
    }

    pub fn junctions(&self) -> impl Iterator<Item = (JunctionId, &JunctionTiming)> {
        JunctionId::ALL
            .into_iter()
            .map(move |id| (id, self.junction(id)))
    }

    pub fn density_label(&self, id: JunctionId) -> String {
        format!(
            "Traffic Density: {} vehicles/min",
            self.junction(id).density_vehicles_per_minute
        )
    }
}

/// What a junction displays during one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JunctionObservation {
    pub junction: JunctionId,
    pub phase: SignalPhase,
    pub remaining_seconds: u32,
    pub label: String,
}

impl JunctionObservation {
    pub fn new(junction: JunctionId, phase: SignalPhase, remaining_seconds: u32) -> Self {
        Self {
            junction,
            phase,
            remaining_seconds,
            label: phase.label().to_string(),
        }
    }

    pub fn countdown(&self) -> String {
        format_countdown(self.remaining_seconds)
    }
}

/// Formats a countdown as zero-padded `MM:SS`.
pub fn format_countdown(remaining_seconds: u32) -> String {
    format!("{:02}:{:02}", remaining_seconds / 60, remaining_seconds % 60)
}

pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
