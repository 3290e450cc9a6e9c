// orchestrator.rs
//
// Upload -> persist -> await analysis -> run the signal cycle.

use crate::communication::analysis_source::{AnalysisSource, FileAnalysisSource};
use crate::communication::result_awaiter::ResultAwaiter;
use crate::config::ControllerConfig;
use crate::control_system::signal_coordinator::{CoordinatorHandle, SignalCoordinator};
use crate::error::{AcquisitionError, Result};
use crate::monitoring::observation_recorder::CsvObservationRecorder;
use crate::monitoring::observation_sink::{FanOutSink, LogObservationSink, ObservationSink};
use crate::shared_data::{JunctionId, TimingPlan};
use crate::storage::video_store::{DirectoryVideoStore, VideoStore};

/// Raw video bytes for both junctions.
#[derive(Debug, Clone, Default)]
pub struct JunctionUploads {
    pub junction1: Vec<u8>,
    pub junction2: Vec<u8>,
}

impl JunctionUploads {
    pub fn new(junction1: Vec<u8>, junction2: Vec<u8>) -> Self {
        Self {
            junction1,
            junction2,
        }
    }

    pub fn bytes(&self, id: JunctionId) -> &[u8] {
        match id {
            JunctionId::Junction1 => &self.junction1,
            JunctionId::Junction2 => &self.junction2,
        }
    }
}

/// File name the analyzer expects for a junction's video.
pub fn upload_file_name(id: JunctionId) -> String {
    format!("{}.mp4", id.key())
}

/// Persists both videos, then waits for the analysis result.
pub async fn try_acquire_timing_plan(
    store: &dyn VideoStore,
    source: &dyn AnalysisSource,
    awaiter: &ResultAwaiter,
    uploads: &JunctionUploads,
) -> std::result::Result<TimingPlan, AcquisitionError> {
    for id in JunctionId::ALL {
        store.store(&upload_file_name(id), uploads.bytes(id)).await?;
    }
    Ok(awaiter.await_plan(source).await?)
}

/// Like [`try_acquire_timing_plan`], but any failure yields [`TimingPlan::fallback`].
pub async fn acquire_timing_plan(
    store: &dyn VideoStore,
    source: &dyn AnalysisSource,
    awaiter: &ResultAwaiter,
    uploads: &JunctionUploads,
) -> TimingPlan {
    match try_acquire_timing_plan(store, source, awaiter, uploads).await {
        Ok(plan) => plan,
        Err(e) => {
            log::warn!("Error processing videos: {}. Using fallback timings", e);
            TimingPlan::fallback()
        }
    }
}

/// Acquires a plan for `uploads` and starts the signal cycle.
///
/// Ticks go to the log, to the configured CSV file if any, and to every sink in `observers`.
/// Once every observer has closed the cycle stops; without observers it runs until shut down.
/// Returns the plan in use together with the handle of the running cycle.
pub async fn start_signal_controller(
    config: &ControllerConfig,
    uploads: &JunctionUploads,
    observers: Vec<Box<dyn ObservationSink>>,
) -> Result<(TimingPlan, CoordinatorHandle)> {
    let store = DirectoryVideoStore::new(config.videos_dir());
    let source = FileAnalysisSource::new(config.result_path());
    let awaiter = ResultAwaiter::from_config(config);

    let plan = acquire_timing_plan(&store, &source, &awaiter, uploads).await;
    let coordinator = SignalCoordinator::new(plan.clone())?;

    LogObservationSink::announce(&plan);
    let mut recorders: Vec<Box<dyn ObservationSink>> = vec![Box::new(LogObservationSink)];
    if let Some(path) = config.observation_csv() {
        recorders.push(Box::new(CsvObservationRecorder::open(path)?));
    }

    let sink = FanOutSink::new(observers, recorders);
    let handle = coordinator.spawn(config.tick_interval(), Box::new(sink));
    Ok((plan, handle))
}
