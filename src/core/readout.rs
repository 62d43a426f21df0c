//! Display values pulled by the presentation layer.

use crate::collector::types::MouseButton;
use crate::config::{AssistConfig, GlobalAssistState};
use crate::core::rate::RateEstimator;
use crate::core::recorder::ClickEventRecorder;
use crate::core::scheduler::AssistConditions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Per-button status shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistStatus {
    /// Master switch or this button's switch is off.
    Disabled,
    /// Waiting for the user rate to cross the threshold.
    Standby,
    /// Synthetic clicks are being added.
    Assisting,
    /// Rate is still above threshold but the user has stopped clicking.
    UserStoppedAboveThreshold,
}

impl AssistStatus {
    /// Derived from the same conditions as the scheduler transition.
    pub fn from_conditions(conditions: &AssistConditions) -> Self {
        if !conditions.master_active || !conditions.button_enabled {
            AssistStatus::Disabled
        } else if conditions.above_threshold() && conditions.user_active {
            AssistStatus::Assisting
        } else if conditions.above_threshold() {
            AssistStatus::UserStoppedAboveThreshold
        } else {
            AssistStatus::Standby
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AssistStatus::Disabled => "disabled",
            AssistStatus::Standby => "standby",
            AssistStatus::Assisting => "assisting",
            AssistStatus::UserStoppedAboveThreshold => "user stopped",
        }
    }
}

impl fmt::Display for AssistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rates and status for one button at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ButtonReadout {
    pub button: MouseButton,
    /// User plus assist clicks
    pub total_cps: f64,
    /// User clicks only
    pub user_cps: f64,
    /// `total - user`, floored at zero
    pub assist_cps: f64,
    /// Current randomized goal
    pub target_cps: f64,
    pub status: AssistStatus,
}

impl ButtonReadout {
    /// Compute every value against the same `now`.
    pub fn compute(
        recorder: &ClickEventRecorder,
        global: &GlobalAssistState,
        config: &AssistConfig,
        target_cps: f64,
        now: Instant,
    ) -> Self {
        let conditions = AssistConditions::evaluate(recorder, global, config, now);
        let total_cps = RateEstimator::estimate(recorder.combined_log(), now);
        let user_cps = conditions.user_cps;

        Self {
            button: recorder.button(),
            total_cps,
            user_cps,
            assist_cps: (total_cps - user_cps).max(0.0),
            target_cps,
            status: AssistStatus::from_conditions(&conditions),
        }
    }

    /// One-line rendering for terminal meters.
    pub fn summary(&self) -> String {
        format!(
            "{:<5} {:>5.1} CPS (user {:>4.1} + assist {:>4.1}) [{}]",
            self.button.as_str(),
            self.total_cps,
            self.user_cps,
            self.assist_cps,
            self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::ClickOrigin;
    use std::time::Duration;

    fn conditions(master: bool, enabled: bool, user_cps: f64, active: bool) -> AssistConditions {
        AssistConditions {
            master_active: master,
            button_enabled: enabled,
            user_cps,
            threshold_cps: 3.0,
            user_active: active,
        }
    }

    #[test]
    fn test_status_derivation() {
        assert_eq!(
            AssistStatus::from_conditions(&conditions(false, true, 8.0, true)),
            AssistStatus::Disabled
        );
        assert_eq!(
            AssistStatus::from_conditions(&conditions(true, false, 8.0, true)),
            AssistStatus::Disabled
        );
        assert_eq!(
            AssistStatus::from_conditions(&conditions(true, true, 8.0, true)),
            AssistStatus::Assisting
        );
        assert_eq!(
            AssistStatus::from_conditions(&conditions(true, true, 8.0, false)),
            AssistStatus::UserStoppedAboveThreshold
        );
        assert_eq!(
            AssistStatus::from_conditions(&conditions(true, true, 2.0, true)),
            AssistStatus::Standby
        );
    }

    #[test]
    fn test_readout_splits_user_and_assist() {
        let t0 = Instant::now();
        let mut recorder = ClickEventRecorder::new(MouseButton::Left);
        for i in 0..5u64 {
            recorder.record(ClickOrigin::User, t0 + Duration::from_millis(i * 100));
            recorder.record(ClickOrigin::Assist, t0 + Duration::from_millis(i * 100 + 50));
        }

        let readout = ButtonReadout::compute(
            &recorder,
            &GlobalAssistState::default(),
            &AssistConfig::default_for(MouseButton::Left),
            22.0,
            t0 + Duration::from_millis(500),
        );

        assert_eq!(readout.total_cps, 10.0);
        assert_eq!(readout.user_cps, 5.0);
        assert_eq!(readout.assist_cps, 5.0);
        assert_eq!(readout.status, AssistStatus::Assisting);
        assert!(readout.summary().contains("assisting"));
    }
}
