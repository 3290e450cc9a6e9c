use std::{io, path::PathBuf, result};

use thiserror::Error;

use crate::shared_data::JunctionId;

/// Failure to read the analysis result source. Both variants are retried by the awaiter.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Analysis result not available yet")]
    NotFound,

    #[error("Transient read failure: {0}")]
    Io(#[from] io::Error),

    #[error("Analysis result is incomplete: {0}")]
    Incomplete(String),
}

/// The analysis document exists but does not carry the expected per-junction shape.
#[derive(Error, Debug)]
pub enum MalformedPlanError {
    #[error("Analysis document has an unexpected shape: {0}")]
    Shape(serde_json::Error),

    #[error("Density for {0} must be a finite, non-negative number, got {1}")]
    InvalidDensity(JunctionId, f64),
}

#[derive(Error, Debug)]
pub enum AwaitError {
    #[error("Analysis timeout after {attempts} attempts")]
    AnalysisTimeout { attempts: u32 },

    #[error(transparent)]
    MalformedPlan(#[from] MalformedPlanError),
}

pub type AwaitResult<T> = result::Result<T, AwaitError>;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Invalid video file name `{0}`")]
    InvalidFileName(String),

    #[error("Unsupported video format `{0}`, expected one of mp4, avi, mov")]
    UnsupportedExtension(String),

    #[error("Failed to store video at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Any failure while obtaining a plan. Callers substitute the fallback plan for all of them.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Await(#[from] AwaitError),
}

/// Coordinator precondition violations. These abort startup.
#[derive(Error, Debug, PartialEq)]
pub enum PlanError {
    #[error("Density for {0} must be a finite, non-negative number, got {1}")]
    InvalidDensity(JunctionId, f64),

    #[error("Every stage of the signal cycle has zero duration")]
    EmptyCycle,
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Observation receiver closed")]
    Closed,

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Observation I/O failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("`{name}` must be a positive integer, got `{value}`")]
    InvalidPositiveInteger { name: &'static str, value: String },

    #[error("Maximum attempts must be greater than zero")]
    ZeroMaxAttempts,

    #[error("Interval `{0}` must be greater than zero")]
    ZeroInterval(&'static str),
}

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("Coordinator task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = result::Result<T, ControllerError>;
