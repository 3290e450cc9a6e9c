use std::{
    env,
    num::NonZeroU32,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    error::ConfigError,
    global_variables::{
        DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL_MS, RESULT_FILE_NAME, TICK_INTERVAL_MS,
        VIDEOS_DIR,
    },
};

pub const ENV_MAX_ATTEMPTS: &str = "SIGNAL_MAX_ATTEMPTS";
pub const ENV_POLL_INTERVAL_MS: &str = "SIGNAL_POLL_INTERVAL_MS";
pub const ENV_TICK_INTERVAL_MS: &str = "SIGNAL_TICK_INTERVAL_MS";
pub const ENV_RESULT_PATH: &str = "SIGNAL_RESULT_PATH";
pub const ENV_VIDEOS_DIR: &str = "SIGNAL_VIDEOS_DIR";
pub const ENV_OBSERVATION_CSV: &str = "SIGNAL_OBSERVATION_CSV";

/// Configuration for acquiring a timing plan and running the signal cycle.
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    max_attempts: NonZeroU32,
    poll_interval: Duration,
    tick_interval: Duration,
    result_path: PathBuf,
    videos_dir: PathBuf,
    observation_csv: Option<PathBuf>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_attempts: NonZeroU32::new(DEFAULT_MAX_ATTEMPTS).unwrap_or(NonZeroU32::MIN),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            tick_interval: Duration::from_millis(TICK_INTERVAL_MS),
            result_path: PathBuf::from(RESULT_FILE_NAME),
            videos_dir: PathBuf::from(VIDEOS_DIR),
            observation_csv: None,
        }
    }
}

impl ControllerConfig {
    /// Builds a configuration from the defaults, overridden by any `SIGNAL_*` environment
    /// variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_MAX_ATTEMPTS) {
            config = config.with_max_attempts(parse_positive(ENV_MAX_ATTEMPTS, &value)? as u32)?;
        }
        if let Some(value) = lookup(ENV_POLL_INTERVAL_MS) {
            let millis = parse_positive(ENV_POLL_INTERVAL_MS, &value)?;
            config = config.with_poll_interval(Duration::from_millis(millis))?;
        }
        if let Some(value) = lookup(ENV_TICK_INTERVAL_MS) {
            let millis = parse_positive(ENV_TICK_INTERVAL_MS, &value)?;
            config = config.with_tick_interval(Duration::from_millis(millis))?;
        }
        if let Some(value) = lookup(ENV_RESULT_PATH) {
            config = config.with_result_path(value);
        }
        if let Some(value) = lookup(ENV_VIDEOS_DIR) {
            config = config.with_videos_dir(value);
        }
        if let Some(value) = lookup(ENV_OBSERVATION_CSV) {
            config = config.with_observation_csv(value);
        }

        Ok(config)
    }

    /// Returns the number of times the analysis source is read before giving up.
    pub fn max_attempts(&self) -> NonZeroU32 {
        self.max_attempts
    }

    /// Returns the pause between two reads of the analysis source.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the period of the signal cycle tick.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn result_path(&self) -> &Path {
        &self.result_path
    }

    pub fn videos_dir(&self) -> &Path {
        &self.videos_dir
    }

    /// Returns the CSV file observations are recorded to, if any.
    pub fn observation_csv(&self) -> Option<&Path> {
        self.observation_csv.as_deref()
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Result<Self, ConfigError> {
        self.max_attempts = NonZeroU32::new(max_attempts).ok_or(ConfigError::ZeroMaxAttempts)?;
        Ok(self)
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Result<Self, ConfigError> {
        if poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("poll_interval"));
        }
        self.poll_interval = poll_interval;
        Ok(self)
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Result<Self, ConfigError> {
        if tick_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("tick_interval"));
        }
        self.tick_interval = tick_interval;
        Ok(self)
    }

    pub fn with_result_path(mut self, result_path: impl Into<PathBuf>) -> Self {
        self.result_path = result_path.into();
        self
    }

    pub fn with_videos_dir(mut self, videos_dir: impl Into<PathBuf>) -> Self {
        self.videos_dir = videos_dir.into();
        self
    }

    pub fn with_observation_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.observation_csv = Some(path.into());
        self
    }
}

fn parse_positive(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 && parsed <= u32::MAX as u64 => Ok(parsed),
        _ => Err(ConfigError::InvalidPositiveInteger {
            name,
            value: value.to_string(),
        }),
    }
}
