// communication/mod.rs
pub mod analysis_source;
pub mod result_awaiter;

pub use analysis_source::{AnalysisSource, FileAnalysisSource};
pub use result_awaiter::ResultAwaiter;
