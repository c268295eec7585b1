//! Tour state: the persisted progress record and its lifecycle phase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle phase of a tour.
///
/// NotStarted → Active ⇄ Paused → Finished. `NotStarted` is a mounted widget
/// with no running session; the other phases are derived from [`TourState`].
/// Finished is terminal until a restart replaces the state wholesale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourPhase {
    #[default]
    NotStarted,
    Active,
    Paused,
    Finished,
}

impl TourPhase {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: TourPhase) -> bool {
        use TourPhase::*;
        matches!(
            (self, target),
            (NotStarted, Active)
                | (Active, Paused)
                | (Paused, Active)
                | (Active, Finished)
                | (Paused, Finished)
        )
    }

    /// Whether the tour has ended (completed or skipped).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl std::fmt::Display for TourPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Finished => "finished",
        };
        write!(f, "{s}")
    }
}

/// Persisted tour progress.
///
/// Stored as JSON under `onboarding_tour_<tourId>`. Field names are
/// camelCase and `startedAt` is epoch milliseconds so records written by the
/// browser widget stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourState {
    pub current_step_index: usize,
    /// Append-only, no duplicates.
    pub completed_steps: Vec<String>,
    pub is_active: bool,
    pub is_paused: bool,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub started_at: Option<DateTime<Utc>>,
}

impl TourState {
    /// A fresh state positioned on the first step.
    pub fn initial() -> Self {
        Self {
            current_step_index: 0,
            completed_steps: Vec::new(),
            is_active: true,
            is_paused: false,
            started_at: Some(Utc::now()),
        }
    }

    pub fn phase(&self) -> TourPhase {
        match (self.is_active, self.is_paused) {
            (true, false) => TourPhase::Active,
            (true, true) => TourPhase::Paused,
            (false, _) => TourPhase::Finished,
        }
    }

    /// Record a step as completed. Returns false if it already was.
    pub fn mark_step_completed(&mut self, step_id: &str) -> bool {
        if self.completed_steps.iter().any(|s| s == step_id) {
            return false;
        }
        self.completed_steps.push(step_id.to_string());
        true
    }

    /// End the tour, clearing the pause flag so `is_paused ⇒ is_active` holds.
    pub fn finish(&mut self) {
        self.is_active = false;
        self.is_paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use TourPhase::*;
        let transitions = [
            (NotStarted, Active),
            (Active, Paused),
            (Paused, Active),
            (Active, Finished),
            (Paused, Finished),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use TourPhase::*;
        assert!(!Finished.can_transition_to(Active));
        assert!(!NotStarted.can_transition_to(Finished));
        assert!(!NotStarted.can_transition_to(Paused));
        assert!(!Active.can_transition_to(Active));
    }

    #[test]
    fn display_matches_serde() {
        use TourPhase::*;
        for phase in [NotStarted, Active, Paused, Finished] {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(format!("\"{phase}\""), json);
        }
    }

    #[test]
    fn initial_state() {
        let state = TourState::initial();
        assert_eq!(state.current_step_index, 0);
        assert!(state.completed_steps.is_empty());
        assert!(state.is_active);
        assert!(!state.is_paused);
        assert!(state.started_at.is_some());
        assert_eq!(state.phase(), TourPhase::Active);
    }

    #[test]
    fn phase_from_flags() {
        let mut state = TourState::initial();
        state.is_paused = true;
        assert_eq!(state.phase(), TourPhase::Paused);
        state.finish();
        assert_eq!(state.phase(), TourPhase::Finished);
        assert!(!state.is_paused);
    }

    #[test]
    fn completed_steps_deduplicate() {
        let mut state = TourState::initial();
        assert!(state.mark_step_completed("a"));
        assert!(!state.mark_step_completed("a"));
        assert!(state.mark_step_completed("b"));
        assert_eq!(state.completed_steps, vec!["a", "b"]);
    }

    #[test]
    fn serializes_camel_case_millis() {
        let state = TourState {
            current_step_index: 2,
            completed_steps: vec!["a".into(), "b".into()],
            is_active: true,
            is_paused: false,
            started_at: DateTime::from_timestamp_millis(1_700_000_000_123),
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["currentStepIndex"], 2);
        assert_eq!(json["isActive"], true);
        assert_eq!(json["startedAt"], 1_700_000_000_123_i64);

        let parsed: TourState = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn null_started_at_parses() {
        let json = r#"{"currentStepIndex":0,"completedSteps":[],"isActive":false,"isPaused":false,"startedAt":null}"#;
        let parsed: TourState = serde_json::from_str(json).unwrap();
        assert!(parsed.started_at.is_none());
        assert_eq!(parsed.phase(), TourPhase::Finished);
    }
}
