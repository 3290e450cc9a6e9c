// observation_sink.rs

use tokio::sync::mpsc;

use crate::control_system::signal_coordinator::CycleTick;
use crate::error::SinkError;
use crate::shared_data::TimingPlan;

/// Receives the observation pair produced by every tick of the signal cycle.
///
/// Returning [`SinkError::Closed`] tells the coordinator that nobody is watching any more and
/// the cycle should stop. Any other error is logged and the cycle carries on.
pub trait ObservationSink: Send {
    fn observe(&mut self, tick: &CycleTick) -> Result<(), SinkError>;
}

/// Writes each tick as a log line, e.g. `junction1 GREEN 00:12 | junction2 RED 00:12`.
#[derive(Debug, Default)]
pub struct LogObservationSink;

impl LogObservationSink {
    /// Logs the density readings once, before the first tick.
    pub fn announce(plan: &TimingPlan) {
        for (id, _) in plan.junctions() {
            log::info!("{}: {}", id, plan.density_label(id));
        }
    }
}

impl ObservationSink for LogObservationSink {
    fn observe(&mut self, tick: &CycleTick) -> Result<(), SinkError> {
        let [first, second] = &tick.observations;
        log::info!(
            "{} {} {} | {} {} {}",
            first.junction,
            first.label,
            first.countdown(),
            second.junction,
            second.label,
            second.countdown()
        );
        Ok(())
    }
}

/// Queue length used by [`ChannelObservationSink::new`].
pub const DEFAULT_OBSERVATION_CAPACITY: usize = 64;

/// Forwards ticks to a host UI over a bounded channel.
///
/// When the host falls behind and the queue is full, the tick is dropped rather than queued.
#[derive(Debug)]
pub struct ChannelObservationSink {
    tx: mpsc::Sender<CycleTick>,
    dropped: u64,
}

impl ChannelObservationSink {
    pub fn new() -> (Self, mpsc::Receiver<CycleTick>) {
        Self::with_capacity(DEFAULT_OBSERVATION_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<CycleTick>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, dropped: 0 }, rx)
    }

    /// Number of ticks discarded because the host was not reading.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl ObservationSink for ChannelObservationSink {
    fn observe(&mut self, tick: &CycleTick) -> Result<(), SinkError> {
        match self.tx.try_send(tick.clone()) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped += 1;
                log::debug!("Observer queue full, dropped tick ({} so far)", self.dropped);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SinkError::Closed),
        }
    }
}

/// Delivers every tick to each inner sink in turn.
///
/// Observers are the sinks someone is actually watching; auxiliary sinks (log, CSV) only
/// record. The fan-out reports `Closed` once every observer has closed, or, when it was built
/// without observers, once every auxiliary sink has closed.
pub struct FanOutSink {
    observers: Vec<Box<dyn ObservationSink>>,
    auxiliary: Vec<Box<dyn ObservationSink>>,
    watched: bool,
}

impl FanOutSink {
    pub fn new(
        observers: Vec<Box<dyn ObservationSink>>,
        auxiliary: Vec<Box<dyn ObservationSink>>,
    ) -> Self {
        let watched = !observers.is_empty();
        Self {
            observers,
            auxiliary,
            watched,
        }
    }
}

// Delivers `tick` to every sink, dropping the ones that closed. Returns the first other error.
fn deliver(
    sinks: &mut Vec<Box<dyn ObservationSink>>,
    tick: &CycleTick,
    first_error: &mut Option<SinkError>,
) {
    sinks.retain_mut(|sink| match sink.observe(tick) {
        Ok(()) => true,
        Err(SinkError::Closed) => false,
        Err(e) => {
            first_error.get_or_insert(e);
            true
        }
    });
}

impl ObservationSink for FanOutSink {
    fn observe(&mut self, tick: &CycleTick) -> Result<(), SinkError> {
        let mut first_error = None;
        deliver(&mut self.auxiliary, tick, &mut first_error);
        deliver(&mut self.observers, tick, &mut first_error);

        let closed = if self.watched {
            self.observers.is_empty()
        } else {
            self.auxiliary.is_empty()
        };
        if closed {
            return Err(SinkError::Closed);
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
