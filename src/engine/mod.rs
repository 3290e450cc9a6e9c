// engine/mod.rs
pub mod orchestrator;

pub use orchestrator::{
    acquire_timing_plan, start_signal_controller, try_acquire_timing_plan, JunctionUploads,
};
