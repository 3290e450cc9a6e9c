// signal_timing.rs

use crate::flow_analyzer::analysis_document::{
    AnalysisDocument, JunctionReport, JunctionTimings, PhaseStep,
};
use crate::global_variables::{
    BASE_GREEN_SECONDS, MAX_GREEN_SECONDS, MIN_GREEN_SECONDS, PROPORTIONAL_GREEN_BUDGET,
    STANDARD_YELLOW_SECONDS,
};
use crate::shared_data::SignalPhase;

/// Green/yellow split derived from the two measured densities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalTimings {
    pub junction1_green: u32,
    pub junction2_green: u32,
    pub yellow: u32,
}

impl SignalTimings {
    pub fn cycle_time(&self) -> u32 {
        self.junction1_green + self.junction2_green + 2 * self.yellow
    }

    // Junction1 waits while junction2 runs, then goes green and yellow.
    pub fn junction1_sequence(&self) -> Vec<PhaseStep> {
        vec![
            PhaseStep {
                state: SignalPhase::Red,
                duration: self.junction2_green + self.yellow,
            },
            PhaseStep {
                state: SignalPhase::Green,
                duration: self.junction1_green,
            },
            PhaseStep {
                state: SignalPhase::Yellow,
                duration: self.yellow,
            },
        ]
    }

    pub fn junction2_sequence(&self) -> Vec<PhaseStep> {
        vec![
            PhaseStep {
                state: SignalPhase::Green,
                duration: self.junction2_green,
            },
            PhaseStep {
                state: SignalPhase::Yellow,
                duration: self.yellow,
            },
            PhaseStep {
                state: SignalPhase::Red,
                duration: self.junction1_green + self.yellow,
            },
        ]
    }
}

/// Splits green time between the junctions in proportion to their densities.
///
/// With no traffic at all both junctions get the base green time. Otherwise each green is its
/// share of a 45 second budget, clamped to 15..=60 seconds.
pub fn determine_signal_timings(density1: f64, density2: f64) -> SignalTimings {
    let density1 = sanitize(density1);
    let density2 = sanitize(density2);
    let total = density1 + density2;

    let (junction1_green, junction2_green) = if total == 0.0 {
        (BASE_GREEN_SECONDS, BASE_GREEN_SECONDS)
    } else {
        (
            proportional_green(density1, total),
            proportional_green(density2, total),
        )
    };

    SignalTimings {
        junction1_green,
        junction2_green,
        yellow: STANDARD_YELLOW_SECONDS,
    }
}

fn sanitize(density: f64) -> f64 {
    if density.is_finite() && density > 0.0 {
        density
    } else {
        0.0
    }
}

fn proportional_green(density: f64, total: f64) -> u32 {
    let share = (PROPORTIONAL_GREEN_BUDGET * (density / total)).trunc() as u32;
    share.clamp(MIN_GREEN_SECONDS, MAX_GREEN_SECONDS)
}

fn round_density(density: f64) -> f64 {
    (sanitize(density) * 100.0).round() / 100.0
}

/// Builds the analysis result document for two measured densities.
pub fn build_analysis_document(density1: f64, density2: f64) -> AnalysisDocument {
    let timings = determine_signal_timings(density1, density2);
    log::info!(
        "Densities {:.2} / {:.2} vehicles/min -> green {}s / {}s, yellow {}s",
        density1,
        density2,
        timings.junction1_green,
        timings.junction2_green,
        timings.yellow
    );

    AnalysisDocument {
        junction1: JunctionReport {
            density: round_density(density1),
            timings: JunctionTimings {
                green_time: timings.junction1_green,
                yellow_time: timings.yellow,
                sequence: timings.junction1_sequence(),
            },
        },
        junction2: JunctionReport {
            density: round_density(density2),
            timings: JunctionTimings {
                green_time: timings.junction2_green,
                yellow_time: timings.yellow,
                sequence: timings.junction2_sequence(),
            },
        },
        total_cycle_time: Some(timings.cycle_time()),
    }
}
