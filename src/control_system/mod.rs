// control_system/mod.rs
pub mod signal_coordinator;

pub use signal_coordinator::{
    CoordinatorHandle, CycleStage, CycleState, CycleTick, SignalCoordinator,
};
