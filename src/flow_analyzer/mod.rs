// flow_analyzer/mod.rs
pub mod analysis_document;
pub mod signal_timing;

pub use analysis_document::{write_analysis_document, AnalysisDocument};
pub use signal_timing::{build_analysis_document, determine_signal_timings, SignalTimings};
