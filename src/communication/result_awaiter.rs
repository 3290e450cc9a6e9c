// result_awaiter.rs

use std::num::NonZeroU32;
use tokio::time::{sleep, Duration};

use crate::communication::analysis_source::AnalysisSource;
use crate::config::ControllerConfig;
use crate::error::{AwaitError, AwaitResult, MalformedPlanError, SourceError};
use crate::flow_analyzer::analysis_document::AnalysisDocument;
use crate::shared_data::TimingPlan;

/// Outcome of one read that did not produce a plan.
enum AttemptFailure {
    Retry(SourceError),
    Fatal(MalformedPlanError),
}

/// Polls an [`AnalysisSource`] until a result appears or the attempt budget runs out.
///
/// Holds no state between calls, so one awaiter can be reused for any number of uploads.
#[derive(Debug, Clone)]
pub struct ResultAwaiter {
    max_attempts: NonZeroU32,
    poll_interval: Duration,
}

impl Default for ResultAwaiter {
    fn default() -> Self {
        Self::from_config(&ControllerConfig::default())
    }
}

impl ResultAwaiter {
    pub fn new(max_attempts: NonZeroU32, poll_interval: Duration) -> Self {
        Self {
            max_attempts,
            poll_interval,
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(config.max_attempts(), config.poll_interval())
    }

    pub fn max_attempts(&self) -> NonZeroU32 {
        self.max_attempts
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Reads the source once per attempt and returns the first well-formed plan.
    ///
    /// Absent documents and transient read errors are retried after `poll_interval`. A document
    /// that parses but lacks the expected junction fields fails immediately with
    /// [`AwaitError::MalformedPlan`]. Once every attempt is used up the call fails with
    /// [`AwaitError::AnalysisTimeout`].
    pub async fn await_plan(&self, source: &dyn AnalysisSource) -> AwaitResult<TimingPlan> {
        let max_attempts = self.max_attempts.get();

        for attempt in 1..=max_attempts {
            match attempt_once(source).await {
                Ok(plan) => {
                    log::info!(
                        "Analysis result from {} available after {} attempt(s)",
                        source.describe(),
                        attempt
                    );
                    return Ok(plan);
                }
                Err(AttemptFailure::Retry(e)) => {
                    log::debug!(
                        "Attempt {}/{} on {}: {}",
                        attempt,
                        max_attempts,
                        source.describe(),
                        e
                    );
                }
                Err(AttemptFailure::Fatal(e)) => {
                    log::warn!("Analysis result from {} is malformed: {}", source.describe(), e);
                    return Err(e.into());
                }
            }

            if attempt < max_attempts {
                sleep(self.poll_interval).await;
            }
        }

        log::warn!(
            "No analysis result from {} after {} attempts",
            source.describe(),
            max_attempts
        );
        Err(AwaitError::AnalysisTimeout {
            attempts: max_attempts,
        })
    }
}

async fn attempt_once(source: &dyn AnalysisSource) -> Result<TimingPlan, AttemptFailure> {
    let bytes = source.fetch().await.map_err(AttemptFailure::Retry)?;

    let document = match AnalysisDocument::from_slice(&bytes) {
        Ok(document) => document,
        // Syntax and EOF errors mean the writer has not finished yet.
        Err(e) if !e.is_data() => {
            return Err(AttemptFailure::Retry(SourceError::Incomplete(e.to_string())))
        }
        Err(e) => return Err(AttemptFailure::Fatal(MalformedPlanError::Shape(e))),
    };

    document.to_timing_plan().map_err(AttemptFailure::Fatal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    use crate::shared_data::{JunctionId, JunctionTiming};

    const VALID: &str = r#"{
        "junction1": {"density": 3.5, "timings": {"green_time": 20, "yellow_time": 3}},
        "junction2": {"density": 1.0, "timings": {"green_time": 15, "yellow_time": 3}}
    }"#;

    enum Response {
        Missing,
        Broken,
        Body(&'static str),
    }

    struct ScriptedSource {
        responses: Mutex<VecDeque<Response>>,
        attempts: AtomicU32,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Response>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                attempts: AtomicU32::new(0),
            }
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisSource for ScriptedSource {
        async fn fetch(&self) -> Result<Vec<u8>, SourceError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let next = self.responses.lock().unwrap().pop_front();
            match next.unwrap_or(Response::Missing) {
                Response::Missing => Err(SourceError::NotFound),
                Response::Broken => Err(SourceError::Io(io::Error::other("connection reset"))),
                Response::Body(body) => Ok(body.as_bytes().to_vec()),
            }
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn awaiter(max_attempts: u32, poll_ms: u64) -> ResultAwaiter {
        ResultAwaiter::new(
            NonZeroU32::new(max_attempts).unwrap(),
            Duration::from_millis(poll_ms),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn returns_plan_after_absent_responses() {
        let source = ScriptedSource::new(vec![
            Response::Missing,
            Response::Broken,
            Response::Missing,
            Response::Body(VALID),
        ]);
        let start = Instant::now();

        let plan = awaiter(30, 1000).await_plan(&source).await.unwrap();

        assert_eq!(source.attempts(), 4);
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
        assert_eq!(
            plan.junction(JunctionId::Junction1),
            &JunctionTiming::new(20, 3, 3.5)
        );
        assert_eq!(
            plan.junction(JunctionId::Junction2),
            &JunctionTiming::new(15, 3, 1.0)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_result_needs_no_wait() {
        let source = ScriptedSource::new(vec![Response::Body(VALID)]);
        let start = Instant::now();

        awaiter(30, 1000).await_plan(&source).await.unwrap();

        assert_eq!(source.attempts(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_exactly_max_attempts() {
        let source = ScriptedSource::new(Vec::new());
        let start = Instant::now();

        let err = awaiter(30, 1000).await_plan(&source).await.unwrap_err();

        assert!(matches!(err, AwaitError::AnalysisTimeout { attempts: 30 }));
        assert_eq!(source.attempts(), 30);
        // No sleep after the final attempt.
        assert_eq!(start.elapsed(), Duration::from_millis(29 * 1000));
    }

    #[tokio::test(start_paused = true)]
    async fn result_arriving_on_last_attempt_is_accepted() {
        let mut responses: Vec<Response> = (0..4).map(|_| Response::Missing).collect();
        responses.push(Response::Body(VALID));
        let source = ScriptedSource::new(responses);

        assert!(awaiter(5, 10).await_plan(&source).await.is_ok());
        assert_eq!(source.attempts(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_document_fails_without_retrying() {
        let source = ScriptedSource::new(vec![
            Response::Missing,
            Response::Body(r#"{"junction1": {"density": 1.0}, "junction2": {}}"#),
            Response::Body(VALID),
        ]);

        let err = awaiter(30, 1000).await_plan(&source).await.unwrap_err();

        assert!(matches!(
            err,
            AwaitError::MalformedPlan(MalformedPlanError::Shape(_))
        ));
        assert_eq!(source.attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn negative_density_is_fatal() {
        let source = ScriptedSource::new(vec![Response::Body(
            r#"{
                "junction1": {"density": -4, "timings": {"green_time": 20, "yellow_time": 3}},
                "junction2": {"density": 1, "timings": {"green_time": 20, "yellow_time": 3}}
            }"#,
        )]);

        let err = awaiter(30, 1000).await_plan(&source).await.unwrap_err();

        assert!(matches!(
            err,
            AwaitError::MalformedPlan(MalformedPlanError::InvalidDensity(JunctionId::Junction1, _))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn half_written_document_is_retried() {
        let source = ScriptedSource::new(vec![
            Response::Body(r#"{"junction1": {"density": 3.5, "tim"#),
            Response::Body(VALID),
        ]);

        assert!(awaiter(30, 1000).await_plan(&source).await.is_ok());
        assert_eq!(source.attempts(), 2);
    }
}
