pub mod communication;
pub mod config;
pub mod control_system;
pub mod engine;
pub mod error;
pub mod flow_analyzer;
pub mod global_variables;
pub mod monitoring;
pub mod shared_data;
pub mod storage;

pub use communication::{AnalysisSource, FileAnalysisSource, ResultAwaiter};
pub use config::ControllerConfig;
pub use control_system::{CoordinatorHandle, CycleStage, CycleState, CycleTick, SignalCoordinator};
pub use engine::{acquire_timing_plan, start_signal_controller, JunctionUploads};
pub use shared_data::{JunctionId, JunctionObservation, JunctionTiming, SignalPhase, TimingPlan};
