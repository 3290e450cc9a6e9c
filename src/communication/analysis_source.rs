// analysis_source.rs

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::SourceError;

/// Somewhere the analysis result document can be read from.
///
/// A missing document is the normal state until the analyzer has finished, so implementations
/// report it as [`SourceError::NotFound`] rather than as a hard failure.
#[async_trait]
pub trait AnalysisSource: Send + Sync {
    /// Performs a single read of the document.
    async fn fetch(&self) -> Result<Vec<u8>, SourceError>;

    fn describe(&self) -> String;
}

/// Reads the document from a well-known file path.
#[derive(Debug, Clone)]
pub struct FileAnalysisSource {
    path: PathBuf,
}

impl FileAnalysisSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AnalysisSource for FileAnalysisSource {
    async fn fetch(&self) -> Result<Vec<u8>, SourceError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SourceError::NotFound),
            Err(e) => Err(SourceError::Io(e)),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
