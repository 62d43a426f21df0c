//! The per-button assist state machine.
//!
//! Each tick re-randomizes the target CPS when its validity window runs out,
//! measures the user rate from the user-only log and decides whether a
//! synthetic click is due. Entering `Assisting` requires the master switch,
//! the button switch, a user rate strictly above the threshold and an open
//! activity gate. Losing any of them drops back to `Idle` on the same tick.
//!
//! The scheduler never performs input itself; it returns a [`TickDecision`]
//! and the caller reports a successful emission through
//! [`AssistScheduler::record_emission`].

use crate::collector::types::MouseButton;
use crate::config::{AssistConfig, GlobalAssistState};
use crate::core::activity::ActivityGate;
use crate::core::rate::RateEstimator;
use crate::core::recorder::ClickEventRecorder;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Assist rates above this are treated as runaway and skipped.
pub const MAX_ASSIST_CPS: f64 = 40.0;

/// Target validity window bounds, drawn from `[MIN, MAX)`.
pub const MIN_TARGET_VALIDITY: Duration = Duration::from_millis(500);
pub const MAX_TARGET_VALIDITY: Duration = Duration::from_millis(2000);

/// Whether the scheduler is currently emitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistPhase {
    Idle,
    Assisting,
}

/// Why an assisting tick emitted nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The user alone already reaches the target.
    TargetMet,
    /// The required assist rate is above [`MAX_ASSIST_CPS`].
    RunawayGuard,
}

/// What a tick asks the caller to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickDecision {
    /// Not assisting this tick.
    Idle,
    /// Assisting, but no click this tick.
    Skip(SkipReason),
    /// Assisting, next click not due yet.
    Wait,
    /// Emit one synthetic click now.
    Emit { assist_cps: f64 },
}

/// Randomized target and emission bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerState {
    pub target_cps: f64,
    pub target_set_at: Instant,
    pub target_validity: Duration,
    pub last_assist_emit: Option<Instant>,
}

/// Values the assist condition is evaluated on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssistConditions {
    pub master_active: bool,
    pub button_enabled: bool,
    pub user_cps: f64,
    pub threshold_cps: f64,
    pub user_active: bool,
}

impl AssistConditions {
    /// Evaluate every condition at `now` for one button.
    pub fn evaluate(
        recorder: &ClickEventRecorder,
        global: &GlobalAssistState,
        config: &AssistConfig,
        now: Instant,
    ) -> Self {
        let user_cps = RateEstimator::estimate(recorder.user_log(), now);
        let user_active = ActivityGate::new(global.idle_timeout()).is_active(recorder, now);
        Self {
            master_active: global.active(),
            button_enabled: config.enabled(),
            user_cps,
            threshold_cps: global.threshold_cps(),
            user_active,
        }
    }

    pub fn above_threshold(&self) -> bool {
        self.user_cps > self.threshold_cps
    }

    /// All conditions for `Assisting` hold.
    pub fn should_assist(&self) -> bool {
        self.master_active && self.button_enabled && self.above_threshold() && self.user_active
    }
}

/// Assist scheduler for a single button.
#[derive(Debug, Clone)]
pub struct AssistScheduler {
    button: MouseButton,
    phase: AssistPhase,
    state: SchedulerState,
}

impl AssistScheduler {
    /// Start with the target at the bottom of the range.
    pub fn new<R: Rng + ?Sized>(
        button: MouseButton,
        config: &AssistConfig,
        now: Instant,
        rng: &mut R,
    ) -> Self {
        Self {
            button,
            phase: AssistPhase::Idle,
            state: SchedulerState {
                target_cps: config.min_cps(),
                target_set_at: now,
                target_validity: draw_validity(rng),
                last_assist_emit: None,
            },
        }
    }

    pub fn button(&self) -> MouseButton {
        self.button
    }

    pub fn phase(&self) -> AssistPhase {
        self.phase
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn target_cps(&self) -> f64 {
        self.state.target_cps
    }

    /// Run one tick at `now`.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        recorder: &ClickEventRecorder,
        global: &GlobalAssistState,
        config: &AssistConfig,
        now: Instant,
        rng: &mut R,
    ) -> TickDecision {
        self.refresh_target(config, now, rng);

        let conditions = AssistConditions::evaluate(recorder, global, config, now);
        self.set_phase(conditions);
        if self.phase == AssistPhase::Idle {
            return TickDecision::Idle;
        }

        let assist_cps = self.state.target_cps - conditions.user_cps;
        if assist_cps <= 0.0 {
            return TickDecision::Skip(SkipReason::TargetMet);
        }
        if assist_cps > MAX_ASSIST_CPS {
            debug!(button = %self.button, assist_cps, "assist rate above guard, skipping");
            return TickDecision::Skip(SkipReason::RunawayGuard);
        }

        let interval = Duration::from_secs_f64(1.0 / assist_cps);
        let due = match self.state.last_assist_emit {
            Some(last) => now.saturating_duration_since(last) >= interval,
            None => true,
        };

        if due {
            TickDecision::Emit { assist_cps }
        } else {
            TickDecision::Wait
        }
    }

    /// Note that a synthetic click went out at `now`.
    pub fn record_emission(&mut self, now: Instant) {
        self.state.last_assist_emit = Some(now);
    }

    /// Force `Idle`, e.g. when the master switch is cleared on shutdown.
    pub fn halt(&mut self) {
        if self.phase == AssistPhase::Assisting {
            info!(button = %self.button, "assist halted");
        }
        self.phase = AssistPhase::Idle;
    }

    fn refresh_target<R: Rng + ?Sized>(&mut self, config: &AssistConfig, now: Instant, rng: &mut R) {
        let age = now.saturating_duration_since(self.state.target_set_at);
        if age < self.state.target_validity {
            return;
        }

        self.state.target_cps = if config.max_cps() > config.min_cps() {
            rng.gen_range(config.min_cps()..=config.max_cps())
        } else {
            config.min_cps()
        };
        self.state.target_set_at = now;
        self.state.target_validity = draw_validity(rng);
    }

    fn set_phase(&mut self, conditions: AssistConditions) {
        let next = if conditions.should_assist() {
            AssistPhase::Assisting
        } else {
            AssistPhase::Idle
        };

        if next != self.phase {
            match next {
                AssistPhase::Assisting => info!(
                    button = %self.button,
                    user_cps = conditions.user_cps,
                    target_cps = self.state.target_cps,
                    "assist engaged"
                ),
                AssistPhase::Idle => info!(
                    button = %self.button,
                    user_cps = conditions.user_cps,
                    user_active = conditions.user_active,
                    "assist released"
                ),
            }
            self.phase = next;
        }
    }
}

fn draw_validity<R: Rng + ?Sized>(rng: &mut R) -> Duration {
    let secs = rng.gen_range(MIN_TARGET_VALIDITY.as_secs_f64()..MAX_TARGET_VALIDITY.as_secs_f64());
    Duration::from_secs_f64(secs)
}
