//! The running click-assist engine.
//!
//! Each button owns a lane: its click logs, scheduler state, target range and
//! RNG behind one mutex. Three paths touch a lane concurrently:
//!
//! - ingestion, fed by the listener channel, appends user clicks
//! - the per-button scheduler task ticks, injects and records assist clicks
//! - the presentation layer polls readouts
//!
//! A synthetic click is injected and recorded while the lane lock is held,
//! so its timestamp is in the combined log before anyone else can read it.
//!
//! Self-observed clicks are filtered twice. The primary guard is the
//! `injected` mark the platform listeners put on synthetic events. The
//! secondary guard is a per-button `synthesizing` flag raised around the
//! OS call: a click for that button taken off the channel while the flag is
//! up is dropped. The flag is checked at dequeue time, not when the listener
//! saw the event, so a real click already queued before the injection can be
//! dropped with it, and a late echo dequeued after it can slip through.

use crate::collector::types::{ClickOrigin, MouseButton, RawButton, RawClick};
use crate::config::{AssistConfig, Config, GlobalAssistState};
use crate::core::clock::{Clock, SystemClock};
use crate::core::readout::ButtonReadout;
use crate::core::recorder::ClickEventRecorder;
use crate::core::scheduler::{AssistPhase, AssistScheduler, SkipReason, TickDecision};
use crate::stats::{create_shared_stats, SharedAssistStats};
use crate::synthesizer::InputSynthesizer;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// How long the ingestion loop waits before rechecking the running flag.
const INGEST_POLL: Duration = Duration::from_millis(100);

/// What happened to a listener event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Counted as a user click.
    Recorded(MouseButton),
    /// Button release; only presses count.
    Released,
    /// Dropped as our own synthetic click.
    Discarded,
    /// A side button flipped a button's assist switch.
    Toggled { button: MouseButton, enabled: bool },
    /// Not a button we track.
    Ignored,
}

/// What a scheduler tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Skipped(SkipReason),
    Waiting,
    Emitted,
    SynthesisFailed,
}

struct LaneState {
    recorder: ClickEventRecorder,
    scheduler: AssistScheduler,
    config: AssistConfig,
    rng: StdRng,
    failure_streak: u64,
}

struct ButtonLane {
    state: Mutex<LaneState>,
}

impl ButtonLane {
    fn new(button: MouseButton, config: AssistConfig, now: Instant, mut rng: StdRng) -> Self {
        let scheduler = AssistScheduler::new(button, &config, now, &mut rng);
        Self {
            state: Mutex::new(LaneState {
                recorder: ClickEventRecorder::new(button),
                scheduler,
                config,
                rng,
                failure_streak: 0,
            }),
        }
    }
}

/// Shared click-assist engine. Wrap in an `Arc` to share between paths.
pub struct AssistEngine {
    global: RwLock<GlobalAssistState>,
    lanes: [ButtonLane; 2],
    synthesizer: Arc<dyn InputSynthesizer>,
    clock: Arc<dyn Clock>,
    stats: SharedAssistStats,
    synthesizing: [AtomicBool; 2],
    running: AtomicBool,
    side_button_toggle: AtomicBool,
    tick_interval: Duration,
}

impl AssistEngine {
    /// Engine on the system clock with an entropy-seeded RNG.
    pub fn new(config: &Config, synthesizer: Arc<dyn InputSynthesizer>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let now = clock.now();
        Self::build(
            config,
            synthesizer,
            clock,
            StdRng::from_entropy(),
            StdRng::from_entropy(),
            now,
        )
    }

    /// Engine on an explicit clock with a deterministic RNG.
    pub fn with_clock(
        config: &Config,
        synthesizer: Arc<dyn InputSynthesizer>,
        clock: Arc<dyn Clock>,
        seed: u64,
    ) -> Self {
        let now = clock.now();
        Self::build(
            config,
            synthesizer,
            clock,
            StdRng::seed_from_u64(seed),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
            now,
        )
    }

    fn build(
        config: &Config,
        synthesizer: Arc<dyn InputSynthesizer>,
        clock: Arc<dyn Clock>,
        left_rng: StdRng,
        right_rng: StdRng,
        now: Instant,
    ) -> Self {
        Self {
            global: RwLock::new(config.global.clone()),
            lanes: [
                ButtonLane::new(MouseButton::Left, config.left.clone(), now, left_rng),
                ButtonLane::new(MouseButton::Right, config.right.clone(), now, right_rng),
            ],
            synthesizer,
            clock,
            stats: create_shared_stats(),
            synthesizing: [AtomicBool::new(false), AtomicBool::new(false)],
            running: AtomicBool::new(true),
            side_button_toggle: AtomicBool::new(config.side_button_toggle),
            tick_interval: config.tick_interval,
        }
    }

    fn lane(&self, button: MouseButton) -> &ButtonLane {
        &self.lanes[button.index()]
    }

    /// Current time on the engine clock.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn stats(&self) -> SharedAssistStats {
        Arc::clone(&self.stats)
    }

    pub fn synthesizer_name(&self) -> &'static str {
        self.synthesizer.name()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    // --- ingestion -------------------------------------------------------

    /// Handle one listener event.
    pub fn ingest(&self, raw: RawClick) -> IngestOutcome {
        if !raw.pressed {
            return IngestOutcome::Released;
        }

        if raw.button.is_side_button() {
            return self.toggle_from_side_button(raw);
        }

        let Some(button) = raw.button.assistable() else {
            return IngestOutcome::Ignored;
        };

        if raw.injected || self.synthesizing[button.index()].load(Ordering::SeqCst) {
            self.stats.record_discarded_click();
            debug!(%button, injected = raw.injected, "discarding self-observed click");
            return IngestOutcome::Discarded;
        }

        self.record(button, ClickOrigin::User, raw.timestamp);
        self.stats.record_user_click(button);
        IngestOutcome::Recorded(button)
    }

    fn toggle_from_side_button(&self, raw: RawClick) -> IngestOutcome {
        if !self.side_button_toggle.load(Ordering::SeqCst) {
            return IngestOutcome::Ignored;
        }

        // Back drives the left button, Forward the right one
        let button = match raw.button {
            RawButton::Back => MouseButton::Left,
            RawButton::Forward => MouseButton::Right,
            _ => return IngestOutcome::Ignored,
        };

        let enabled = {
            let mut state = self.lane(button).state.lock();
            let enabled = !state.config.enabled();
            state.config.set_enabled(enabled);
            enabled
        };
        self.stats.record_toggle();
        info!(%button, enabled, "assist toggled from side button");
        IngestOutcome::Toggled { button, enabled }
    }

    /// Append a click to a button's logs.
    pub fn record(&self, button: MouseButton, origin: ClickOrigin, timestamp: Instant) {
        self.lane(button).state.lock().recorder.record(origin, timestamp);
    }

    /// Consume listener events until the engine stops or the channel closes.
    pub fn run_ingestion(&self, receiver: &Receiver<RawClick>) {
        while self.is_running() {
            match receiver.recv_timeout(INGEST_POLL) {
                Ok(click) => {
                    self.ingest(click);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("click listener disconnected");
                    break;
                }
            }
        }
        debug!("ingestion stopped");
    }

    /// Run ingestion on a dedicated thread.
    pub fn spawn_ingestion(self: &Arc<Self>, receiver: Receiver<RawClick>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        thread::spawn(move || engine.run_ingestion(&receiver))
    }

    // --- scheduling ------------------------------------------------------

    /// Run one scheduler tick for `button` at `now`.
    pub fn tick(&self, button: MouseButton, now: Instant) -> TickOutcome {
        let global = self.global.read().clone();
        let mut guard = self.lane(button).state.lock();
        let lane = &mut *guard;

        lane.recorder.prune(now);
        let decision = lane
            .scheduler
            .tick(&lane.recorder, &global, &lane.config, now, &mut lane.rng);

        match decision {
            TickDecision::Idle => TickOutcome::Idle,
            TickDecision::Skip(reason) => TickOutcome::Skipped(reason),
            TickDecision::Wait => TickOutcome::Waiting,
            TickDecision::Emit { assist_cps } => {
                self.synthesizing[button.index()].store(true, Ordering::SeqCst);
                let result = self.synthesizer.click(button);
                let outcome = match result {
                    Ok(()) => {
                        lane.recorder.record(ClickOrigin::Assist, now);
                        lane.scheduler.record_emission(now);
                        lane.failure_streak = 0;
                        self.stats.record_assist_click(button);
                        debug!(%button, assist_cps, "assist click");
                        TickOutcome::Emitted
                    }
                    Err(e) => {
                        lane.failure_streak += 1;
                        self.stats.record_synthesis_failure(button);
                        if lane.failure_streak == 1 {
                            warn!(%button, "assist click failed: {e}");
                        } else {
                            debug!(%button, streak = lane.failure_streak, "assist click failed: {e}");
                        }
                        TickOutcome::SynthesisFailed
                    }
                };
                self.synthesizing[button.index()].store(false, Ordering::SeqCst);
                outcome
            }
        }
    }

    /// Tick both buttons against the same instant.
    pub fn tick_all(&self, now: Instant) -> [TickOutcome; 2] {
        MouseButton::ALL.map(|button| self.tick(button, now))
    }

    /// Tick `button` on the engine's interval until shutdown.
    pub async fn run_scheduler(&self, button: MouseButton) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while self.is_running() {
            interval.tick().await;
            if !self.is_running() {
                break;
            }
            self.tick(button, self.clock.now());
        }
        debug!(%button, "scheduler stopped");
    }

    /// Spawn one scheduler task per button on the current tokio runtime.
    pub fn spawn_schedulers(self: &Arc<Self>) -> Vec<tokio::task::JoinHandle<()>> {
        MouseButton::ALL
            .iter()
            .map(|&button| {
                let engine = Arc::clone(self);
                tokio::spawn(async move { engine.run_scheduler(button).await })
            })
            .collect()
    }

    pub fn phase(&self, button: MouseButton) -> AssistPhase {
        self.lane(button).state.lock().scheduler.phase()
    }

    // --- presentation ----------------------------------------------------

    /// Display values for one button at `now`.
    pub fn readout(&self, button: MouseButton, now: Instant) -> ButtonReadout {
        let global = self.global.read().clone();
        let mut guard = self.lane(button).state.lock();
        let lane = &mut *guard;
        lane.recorder.prune(now);
        ButtonReadout::compute(
            &lane.recorder,
            &global,
            &lane.config,
            lane.scheduler.target_cps(),
            now,
        )
    }

    /// Display values for both buttons against one `now`.
    pub fn readouts(&self, now: Instant) -> [ButtonReadout; 2] {
        MouseButton::ALL.map(|button| self.readout(button, now))
    }

    // --- configuration ---------------------------------------------------

    pub fn global(&self) -> GlobalAssistState {
        self.global.read().clone()
    }

    pub fn button_config(&self, button: MouseButton) -> AssistConfig {
        self.lane(button).state.lock().config.clone()
    }

    pub fn set_active(&self, active: bool) {
        self.global.write().set_active(active);
        info!(active, "master switch changed");
    }

    pub fn set_threshold_cps(&self, value: f64) {
        self.global.write().set_threshold_cps(value);
    }

    pub fn set_idle_timeout(&self, value: Duration) {
        self.global.write().set_idle_timeout(value);
    }

    pub fn set_min_cps(&self, button: MouseButton, value: f64) {
        self.lane(button).state.lock().config.set_min_cps(value);
    }

    pub fn set_max_cps(&self, button: MouseButton, value: f64) {
        self.lane(button).state.lock().config.set_max_cps(value);
    }

    pub fn set_enabled(&self, button: MouseButton, enabled: bool) {
        self.lane(button).state.lock().config.set_enabled(enabled);
    }

    pub fn set_side_button_toggle(&self, enabled: bool) {
        self.side_button_toggle.store(enabled, Ordering::SeqCst);
    }

    // --- lifecycle -------------------------------------------------------

    /// Clear the master switch and stop background loops.
    pub fn shutdown(&self) {
        self.global.write().set_active(false);
        self.running.store(false, Ordering::SeqCst);
        for lane in &self.lanes {
            lane.state.lock().scheduler.halt();
        }
        info!("engine stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::readout::AssistStatus;
    use crate::synthesizer::{RecordingSynthesizer, SynthError};

    struct FailingSynthesizer;

    impl InputSynthesizer for FailingSynthesizer {
        fn click(&self, _button: MouseButton) -> Result<(), SynthError> {
            Err(SynthError::Injection("denied".to_string()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn engine_with(
        synth: Arc<dyn InputSynthesizer>,
    ) -> (Arc<AssistEngine>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let mut config = Config::default();
        config.left = AssistConfig::new(10.0, 12.0, true);
        let engine = AssistEngine::with_clock(&config, synth, clock.clone(), 42);
        (Arc::new(engine), clock)
    }

    /// Six user clicks on the left button between 0 and 830 ms.
    fn six_cps(engine: &AssistEngine, clock: &ManualClock) {
        for i in 0..6u64 {
            let t = clock.set_offset(Duration::from_millis(i * 166));
            engine.ingest(RawClick::at(RawButton::Left, true, t));
            engine.ingest(RawClick::at(RawButton::Left, false, t));
        }
    }

    #[test]
    fn test_ingest_records_presses_only() {
        let (engine, clock) = engine_with(Arc::new(RecordingSynthesizer::new()));
        let t = clock.now();

        assert_eq!(
            engine.ingest(RawClick::at(RawButton::Left, true, t)),
            IngestOutcome::Recorded(MouseButton::Left)
        );
        assert_eq!(
            engine.ingest(RawClick::at(RawButton::Left, false, t)),
            IngestOutcome::Released
        );
        assert_eq!(
            engine.ingest(RawClick::at(RawButton::Other, true, t)),
            IngestOutcome::Ignored
        );
        assert_eq!(engine.stats().stats().left.user_clicks, 1);
    }

    #[test]
    fn test_injected_clicks_are_discarded() {
        let (engine, clock) = engine_with(Arc::new(RecordingSynthesizer::new()));
        let click = RawClick::at(RawButton::Right, true, clock.now()).with_injected(true);

        assert_eq!(engine.ingest(click), IngestOutcome::Discarded);
        assert_eq!(engine.stats().stats().discarded_clicks, 1);
        assert_eq!(engine.readout(MouseButton::Right, clock.now()).user_cps, 0.0);
    }

    #[test]
    fn test_clicks_during_synthesis_are_discarded() {
        let (engine, clock) = engine_with(Arc::new(RecordingSynthesizer::new()));
        engine.synthesizing[MouseButton::Left.index()].store(true, Ordering::SeqCst);
        let outcome = engine.ingest(RawClick::at(RawButton::Left, true, clock.now()));
        assert_eq!(outcome, IngestOutcome::Discarded);
    }

    #[test]
    fn test_synthesis_on_one_button_keeps_the_other() {
        let (engine, clock) = engine_with(Arc::new(RecordingSynthesizer::new()));
        engine.synthesizing[MouseButton::Left.index()].store(true, Ordering::SeqCst);

        let right = engine.ingest(RawClick::at(RawButton::Right, true, clock.now()));
        assert_eq!(right, IngestOutcome::Recorded(MouseButton::Right));
        assert_eq!(engine.stats().stats().right.user_clicks, 1);
        assert_eq!(engine.stats().stats().discarded_clicks, 0);
    }

    #[test]
    fn test_side_buttons_toggle_lanes() {
        let (engine, clock) = engine_with(Arc::new(RecordingSynthesizer::new()));
        let t = clock.now();

        assert_eq!(
            engine.ingest(RawClick::at(RawButton::Back, true, t)),
            IngestOutcome::Toggled {
                button: MouseButton::Left,
                enabled: false
            }
        );
        assert!(!engine.button_config(MouseButton::Left).enabled());
        assert!(engine.button_config(MouseButton::Right).enabled());

        engine.set_side_button_toggle(false);
        assert_eq!(
            engine.ingest(RawClick::at(RawButton::Forward, true, t)),
            IngestOutcome::Ignored
        );
    }

    #[test]
    fn test_tick_emits_and_records_assist_click() {
        let synth = Arc::new(RecordingSynthesizer::new());
        let (engine, clock) = engine_with(synth.clone());
        six_cps(&engine, &clock);

        let now = clock.set_offset(Duration::from_millis(900));
        assert_eq!(engine.tick(MouseButton::Left, now), TickOutcome::Emitted);
        assert_eq!(engine.tick(MouseButton::Left, now), TickOutcome::Waiting);
        assert_eq!(engine.tick(MouseButton::Right, now), TickOutcome::Idle);

        assert_eq!(synth.clicks(), vec![MouseButton::Left]);
        let readout = engine.readout(MouseButton::Left, now);
        assert_eq!(readout.user_cps, 6.0);
        assert_eq!(readout.total_cps, 7.0);
        assert_eq!(readout.assist_cps, 1.0);
        assert_eq!(readout.status, AssistStatus::Assisting);
        assert_eq!(engine.phase(MouseButton::Left), AssistPhase::Assisting);
    }

    #[test]
    fn test_failed_synthesis_is_retried() {
        let (engine, clock) = engine_with(Arc::new(FailingSynthesizer));
        six_cps(&engine, &clock);

        let now = clock.set_offset(Duration::from_millis(900));
        assert_eq!(engine.tick(MouseButton::Left, now), TickOutcome::SynthesisFailed);
        // nothing recorded, so the click is due again on the next tick
        let next = clock.advance(Duration::from_millis(5));
        assert_eq!(engine.tick(MouseButton::Left, next), TickOutcome::SynthesisFailed);

        let stats = engine.stats().stats();
        assert_eq!(stats.left.synthesis_failures, 2);
        assert_eq!(stats.left.assist_clicks, 0);
        assert_eq!(engine.readout(MouseButton::Left, next).assist_cps, 0.0);
        assert!(!engine.synthesizing[MouseButton::Left.index()].load(Ordering::SeqCst));
    }

    #[test]
    fn test_config_changes_apply_live() {
        let (engine, _clock) = engine_with(Arc::new(RecordingSynthesizer::new()));

        engine.set_min_cps(MouseButton::Right, 30.0);
        engine.set_max_cps(MouseButton::Right, 20.0);
        let config = engine.button_config(MouseButton::Right);
        assert_eq!(config.min_cps(), 20.0);
        assert_eq!(config.max_cps(), 20.0);

        engine.set_threshold_cps(5.0);
        engine.set_idle_timeout(Duration::from_millis(300));
        let global = engine.global();
        assert_eq!(global.threshold_cps(), 5.0);
        assert_eq!(global.idle_timeout(), Duration::from_millis(300));
    }

    #[test]
    fn test_shutdown_stops_emission() {
        let synth = Arc::new(RecordingSynthesizer::new());
        let (engine, clock) = engine_with(synth.clone());
        six_cps(&engine, &clock);

        engine.shutdown();
        let now = clock.set_offset(Duration::from_millis(900));
        assert_eq!(engine.tick(MouseButton::Left, now), TickOutcome::Idle);
        assert!(synth.clicks().is_empty());
        assert!(!engine.is_running());
        assert_eq!(
            engine.readout(MouseButton::Left, now).status,
            AssistStatus::Disabled
        );
    }

    #[test]
    fn test_ingestion_thread_drains_channel() {
        let (engine, clock) = engine_with(Arc::new(RecordingSynthesizer::new()));
        let (sender, receiver) = crossbeam_channel::bounded(16);
        let handle = engine.spawn_ingestion(receiver);

        let t = clock.now();
        sender.send(RawClick::at(RawButton::Left, true, t)).unwrap();
        sender.send(RawClick::at(RawButton::Right, true, t)).unwrap();
        drop(sender);
        handle.join().unwrap();

        let stats = engine.stats().stats();
        assert_eq!(stats.left.user_clicks, 1);
        assert_eq!(stats.right.user_clicks, 1);
    }

    #[tokio::test]
    async fn test_scheduler_tasks_run_until_shutdown() {
        let synth = Arc::new(RecordingSynthesizer::new());
        let (engine, clock) = engine_with(synth.clone());
        six_cps(&engine, &clock);
        clock.set_offset(Duration::from_millis(900));

        let handles = engine.spawn_schedulers();
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.shutdown();
        for handle in handles {
            handle.await.unwrap();
        }

        // the clock is frozen, so only the first due click goes out
        assert_eq!(synth.count(MouseButton::Left), 1);
        assert_eq!(synth.count(MouseButton::Right), 0);
    }
}
