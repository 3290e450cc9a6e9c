// signal_coordinator.rs
//
// Two-junction signal cycle. Each junction's light, label and countdown are derived from a
// single shared `CycleState` which advances once per tick.

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use crate::error::{PlanError, SinkError};
use crate::monitoring::observation_sink::ObservationSink;
use crate::shared_data::{JunctionId, JunctionObservation, SignalPhase, TimingPlan};

/// The four stages of the coordinated cycle, visited in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CycleStage {
    Junction1Green,
    BothYellowA,
    Junction2Green,
    BothYellowB,
}

impl CycleStage {
    pub const ALL: [CycleStage; 4] = [
        CycleStage::Junction1Green,
        CycleStage::BothYellowA,
        CycleStage::Junction2Green,
        CycleStage::BothYellowB,
    ];

    pub fn next(self) -> Self {
        match self {
            CycleStage::Junction1Green => CycleStage::BothYellowA,
            CycleStage::BothYellowA => CycleStage::Junction2Green,
            CycleStage::Junction2Green => CycleStage::BothYellowB,
            CycleStage::BothYellowB => CycleStage::Junction1Green,
        }
    }

    /// Junction whose timings drive the countdown during this stage.
    pub fn active_junction(self) -> JunctionId {
        match self {
            CycleStage::Junction1Green | CycleStage::BothYellowA => JunctionId::Junction1,
            CycleStage::Junction2Green | CycleStage::BothYellowB => JunctionId::Junction2,
        }
    }

    pub fn phase_of(self, junction: JunctionId) -> SignalPhase {
        match (self, junction) {
            (CycleStage::BothYellowA | CycleStage::BothYellowB, _) => SignalPhase::Yellow,
            (CycleStage::Junction1Green, JunctionId::Junction1)
            | (CycleStage::Junction2Green, JunctionId::Junction2) => SignalPhase::Green,
            (CycleStage::Junction1Green, JunctionId::Junction2)
            | (CycleStage::Junction2Green, JunctionId::Junction1) => SignalPhase::Red,
        }
    }

    /// Configured length of this stage in seconds.
    ///
    /// Both junctions count down from the active junction's timing, never their own.
    pub fn duration(self, plan: &TimingPlan) -> u32 {
        let timing = plan.junction(self.active_junction());
        match self {
            CycleStage::Junction1Green | CycleStage::Junction2Green => timing.green_seconds,
            CycleStage::BothYellowA | CycleStage::BothYellowB => timing.yellow_seconds,
        }
    }
}

/// Internal state of the cycle: the current stage and its shared countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleState {
    stage: CycleStage,
    remaining_seconds: u32,
}

impl CycleState {
    /// State right after entering `stage`, before any of its ticks.
    pub fn enter(stage: CycleStage, plan: &TimingPlan) -> Self {
        Self {
            stage,
            remaining_seconds: stage.duration(plan),
        }
    }

    pub fn stage(&self) -> CycleStage {
        self.stage
    }

    pub fn active_junction(&self) -> JunctionId {
        self.stage.active_junction()
    }

    pub fn phase_of(&self, junction: JunctionId) -> SignalPhase {
        self.stage.phase_of(junction)
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }
}

/// Everything produced by one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleTick {
    pub state: CycleState,
    /// Stages entered during this tick, in order. Zero-length stages show up here even though
    /// nothing is emitted for them.
    pub entered: Vec<CycleStage>,
    pub observations: [JunctionObservation; 2],
}

impl CycleTick {
    pub fn observation(&self, junction: JunctionId) -> &JunctionObservation {
        match junction {
            JunctionId::Junction1 => &self.observations[0],
            JunctionId::Junction2 => &self.observations[1],
        }
    }
}

/// Advances `state` by one tick.
///
/// A countdown that would drop below zero moves the cycle into the next stage, whose first
/// second is then consumed by the same tick. Stages of zero length are passed through without
/// emitting anything for them.
///
/// Only plans accepted by [`SignalCoordinator::new`] are valid here; an all-zero plan would
/// otherwise stay on a zero countdown forever.
pub(crate) fn advance(plan: &TimingPlan, state: CycleState) -> CycleTick {
    let mut state = state;
    let mut entered = Vec::new();

    while state.remaining_seconds == 0 && entered.len() < CycleStage::ALL.len() {
        state = CycleState::enter(state.stage.next(), plan);
        entered.push(state.stage);
    }
    state.remaining_seconds = state.remaining_seconds.saturating_sub(1);

    let observations = JunctionId::ALL
        .map(|id| JunctionObservation::new(id, state.phase_of(id), state.remaining_seconds));

    CycleTick {
        state,
        entered,
        observations,
    }
}

/// Runs the coordinated signal cycle for a fixed [`TimingPlan`].
#[derive(Debug, Clone)]
pub struct SignalCoordinator {
    plan: TimingPlan,
    state: CycleState,
}

impl SignalCoordinator {
    /// Validates the plan and positions the cycle at the start of junction1's green.
    pub fn new(plan: TimingPlan) -> Result<Self, PlanError> {
        for (id, timing) in plan.junctions() {
            let density = timing.density_vehicles_per_minute;
            if !density.is_finite() || density < 0.0 {
                return Err(PlanError::InvalidDensity(id, density));
            }
        }
        if CycleStage::ALL.iter().all(|stage| stage.duration(&plan) == 0) {
            return Err(PlanError::EmptyCycle);
        }

        let state = CycleState::enter(CycleStage::Junction1Green, &plan);
        Ok(Self { plan, state })
    }

    pub fn plan(&self) -> &TimingPlan {
        &self.plan
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn tick(&mut self) -> CycleTick {
        let tick = advance(&self.plan, self.state);
        for stage in &tick.entered {
            log::info!(
                "Entering {:?}: junction1 {}, junction2 {} for {}s",
                stage,
                stage.phase_of(JunctionId::Junction1),
                stage.phase_of(JunctionId::Junction2),
                stage.duration(&self.plan)
            );
        }
        self.state = tick.state;
        tick
    }

    /// Ticks every `tick_interval` and hands each tick to `sink` until shut down.
    ///
    /// The loop also ends once the sink reports that nobody is observing any more.
    pub fn spawn(
        self,
        tick_interval: Duration,
        sink: Box<dyn ObservationSink>,
    ) -> CoordinatorHandle {
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        let handle = tokio::spawn(self.run(tick_interval, sink, shutdown_rx));
        CoordinatorHandle {
            shutdown_tx,
            handle,
        }
    }

    async fn run(
        mut self,
        tick_interval: Duration,
        mut sink: Box<dyn ObservationSink>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> CycleState {
        let mut ticker = interval_at(Instant::now() + tick_interval, tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        log::info!(
            "Signal cycle started with junction1 green for {}s",
            self.state.remaining_seconds
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    log::info!("Signal cycle shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    let tick = self.tick();
                    match sink.observe(&tick) {
                        Ok(()) => {}
                        Err(SinkError::Closed) => {
                            log::info!("Observer went away, stopping signal cycle");
                            break;
                        }
                        Err(e) => log::warn!("Failed to deliver observation: {}", e),
                    }
                }
            }
        }

        self.state
    }
}

/// Handle to a running coordinator task.
#[derive(Debug)]
pub struct CoordinatorHandle {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<CycleState>,
}

impl CoordinatorHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops scheduling ticks and returns the last state reached.
    pub async fn shutdown(self) -> Result<CycleState, JoinError> {
        // A send error means the loop already ended on its own.
        let _ = self.shutdown_tx.send(());
        self.handle.await
    }

    /// Waits for the loop to end without requesting it.
    pub async fn join(self) -> Result<CycleState, JoinError> {
        self.handle.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::observation_sink::ChannelObservationSink;
    use crate::shared_data::JunctionTiming;

    fn plan(g1: u32, y1: u32, g2: u32, y2: u32) -> TimingPlan {
        TimingPlan::new(
            JunctionTiming::new(g1, y1, 0.0),
            JunctionTiming::new(g2, y2, 0.0),
        )
    }

    fn emitted(
        coordinator: &mut SignalCoordinator,
        junction: JunctionId,
        ticks: usize,
    ) -> Vec<(SignalPhase, u32)> {
        (0..ticks)
            .map(|_| {
                let tick = coordinator.tick();
                let obs = tick.observation(junction);
                (obs.phase, obs.remaining_seconds)
            })
            .collect()
    }

    #[test]
    fn junction1_follows_documented_example() {
        let mut coordinator = SignalCoordinator::new(plan(2, 1, 3, 1)).unwrap();
        let one_cycle = vec![
            (SignalPhase::Green, 1),
            (SignalPhase::Green, 0),
            (SignalPhase::Yellow, 0),
            (SignalPhase::Red, 2),
            (SignalPhase::Red, 1),
            (SignalPhase::Red, 0),
            (SignalPhase::Yellow, 0),
        ];
        let mut expected = one_cycle.clone();
        expected.extend(one_cycle);

        assert_eq!(emitted(&mut coordinator, JunctionId::Junction1, 14), expected);
    }

    #[test]
    fn junction2_mirrors_junction1_with_shared_countdown() {
        let mut coordinator = SignalCoordinator::new(plan(2, 1, 3, 1)).unwrap();
        assert_eq!(
            emitted(&mut coordinator, JunctionId::Junction2, 7),
            vec![
                (SignalPhase::Red, 1),
                (SignalPhase::Red, 0),
                (SignalPhase::Yellow, 0),
                (SignalPhase::Green, 2),
                (SignalPhase::Green, 1),
                (SignalPhase::Green, 0),
                (SignalPhase::Yellow, 0),
            ]
        );
    }

    #[test]
    fn countdown_comes_from_the_active_junction_only() {
        // junction2's own green (40) is never shown while junction1 is green.
        let mut coordinator = SignalCoordinator::new(plan(5, 2, 40, 4)).unwrap();
        for _ in 0..200 {
            let tick = coordinator.tick();
            let [first, second] = &tick.observations;
            assert_eq!(first.remaining_seconds, second.remaining_seconds);
            let stage = tick.state.stage();
            assert!(first.remaining_seconds < stage.duration(coordinator.plan()));
        }
    }

    #[test]
    fn stages_are_visited_in_order_for_many_cycles() {
        for p in [plan(3, 1, 2, 2), plan(0, 2, 1, 0), plan(1, 0, 0, 0), plan(30, 5, 30, 5)] {
            let mut coordinator = SignalCoordinator::new(p).unwrap();
            let mut visited = vec![coordinator.state().stage()];
            for _ in 0..500 {
                visited.extend(coordinator.tick().entered);
            }

            assert!(visited.len() > 8);
            for pair in visited.windows(2) {
                assert_eq!(pair[1], pair[0].next());
            }
        }
    }

    #[test]
    fn countdown_strictly_decreases_within_a_stage() {
        let mut coordinator = SignalCoordinator::new(plan(4, 2, 3, 1)).unwrap();
        let mut previous: Option<u32> = None;
        for _ in 0..100 {
            let tick = coordinator.tick();
            let remaining = tick.observations[0].remaining_seconds;
            if tick.entered.is_empty() {
                if let Some(prev) = previous {
                    assert_eq!(remaining + 1, prev);
                }
            } else {
                assert_eq!(remaining + 1, tick.state.stage().duration(coordinator.plan()));
            }
            previous = Some(remaining);
        }
    }

    #[test]
    fn zero_length_stage_emits_nothing_and_is_passed_through() {
        let mut coordinator = SignalCoordinator::new(plan(2, 0, 1, 1)).unwrap();
        let ticks: Vec<CycleTick> = (0..4).map(|_| coordinator.tick()).collect();

        assert_eq!(ticks[1].state.stage(), CycleStage::Junction1Green);
        assert_eq!(
            ticks[2].entered,
            vec![CycleStage::BothYellowA, CycleStage::Junction2Green]
        );
        assert_eq!(ticks[2].observation(JunctionId::Junction1).phase, SignalPhase::Red);
        assert!(ticks
            .iter()
            .all(|t| t.state.stage() != CycleStage::BothYellowA));
        assert_eq!(ticks[3].state.stage(), CycleStage::BothYellowB);
    }

    #[test]
    fn zero_green_at_start_transitions_on_first_tick() {
        let mut coordinator = SignalCoordinator::new(plan(0, 1, 1, 1)).unwrap();
        let tick = coordinator.tick();
        assert_eq!(tick.entered, vec![CycleStage::BothYellowA]);
        assert_eq!(tick.observation(JunctionId::Junction1).label, "YELLOW");
        assert_eq!(tick.observation(JunctionId::Junction2).label, "YELLOW");
    }

    #[test]
    fn rejects_invalid_plans() {
        assert_eq!(
            SignalCoordinator::new(plan(0, 0, 0, 0)).unwrap_err(),
            PlanError::EmptyCycle
        );

        let bad_density = TimingPlan::new(
            JunctionTiming::new(10, 3, 0.0),
            JunctionTiming::new(10, 3, -1.0),
        );
        assert!(matches!(
            SignalCoordinator::new(bad_density),
            Err(PlanError::InvalidDensity(JunctionId::Junction2, _))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_cycle_ticks_once_per_interval_until_shutdown() {
        let coordinator = SignalCoordinator::new(plan(2, 1, 3, 1)).unwrap();
        let (sink, mut rx) = ChannelObservationSink::new();
        let handle = coordinator.spawn(Duration::from_secs(1), Box::new(sink));

        let start = Instant::now();
        let mut received = Vec::new();
        for _ in 0..5 {
            received.push(rx.recv().await.unwrap());
        }
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        assert_eq!(received[4].observation(JunctionId::Junction1).phase, SignalPhase::Red);

        let state = handle.shutdown().await.unwrap();
        assert_eq!(state, received[4].state);

        // Nothing is scheduled after shutdown.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_observer_stops_the_cycle() {
        let coordinator = SignalCoordinator::new(plan(2, 1, 3, 1)).unwrap();
        let (sink, rx) = ChannelObservationSink::new();
        drop(rx);

        let handle = coordinator.spawn(Duration::from_secs(1), Box::new(sink));
        let state = handle.join().await.unwrap();

        assert_eq!(state.stage(), CycleStage::Junction1Green);
        assert_eq!(state.remaining_seconds(), 1);
    }
}
