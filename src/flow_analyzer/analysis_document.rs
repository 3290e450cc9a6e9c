// analysis_document.rs
//
// Shape of the `analysis_result.json` document exchanged between the traffic analyzer
// and the signal controller.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::MalformedPlanError;
use crate::shared_data::{JunctionId, JunctionTiming, SignalPhase, TimingPlan};

/// One step of a junction's phase sequence, e.g. `{"state": "red", "duration": 33}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseStep {
    pub state: SignalPhase,
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JunctionTimings {
    pub green_time: u32,
    pub yellow_time: u32,
    #[serde(default)]
    pub sequence: Vec<PhaseStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JunctionReport {
    pub density: f64,
    pub timings: JunctionTimings,
}

/// The analysis result for both junctions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDocument {
    pub junction1: JunctionReport,
    pub junction2: JunctionReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cycle_time: Option<u32>,
}

impl AnalysisDocument {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn report(&self, id: JunctionId) -> &JunctionReport {
        match id {
            JunctionId::Junction1 => &self.junction1,
            JunctionId::Junction2 => &self.junction2,
        }
    }

    /// Maps the `green_time`, `yellow_time` and `density` fields of both junctions into a plan.
    pub fn to_timing_plan(&self) -> Result<TimingPlan, MalformedPlanError> {
        let timing = |id: JunctionId| -> Result<JunctionTiming, MalformedPlanError> {
            let report = self.report(id);
            if !report.density.is_finite() || report.density < 0.0 {
                return Err(MalformedPlanError::InvalidDensity(id, report.density));
            }
            Ok(JunctionTiming::new(
                report.timings.green_time,
                report.timings.yellow_time,
                report.density,
            ))
        };

        Ok(TimingPlan::new(
            timing(JunctionId::Junction1)?,
            timing(JunctionId::Junction2)?,
        ))
    }
}

/// Writes the document as JSON, replacing any previous result.
///
/// The document is written to a sibling temporary file first and then renamed so that a
/// polling reader never observes a half-written result.
pub async fn write_analysis_document(
    path: &Path,
    document: &AnalysisDocument,
) -> std::io::Result<()> {
    let json = serde_json::to_vec_pretty(document)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    log::info!("Analysis result written to {}", path.display());
    Ok(())
}
