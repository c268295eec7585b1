//! TourMachine: owns the authoritative [`TourState`] of one mounted tour and
//! applies transitions to it.
//!
//! Every transition is synchronous. A transition that changes state persists
//! it to the [`TourStore`], records an analytics event and notifies the
//! config's listeners. Transitions that are not valid in the current phase
//! are no-ops and return `false`.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analytics::{AnalyticsEmitter, AnalyticsEventType, NewEvent};
use crate::store::TourStore;

use super::model::{Step, TourConfig, TourConfigView};
use super::state::{TourPhase, TourState};

/// State machine for one tour session.
pub struct TourMachine {
    config: TourConfig,
    state: TourState,
    store: TourStore,
    analytics: Arc<AnalyticsEmitter>,
}

impl TourMachine {
    /// Start a session: restore the saved state if it is still active,
    /// otherwise begin a fresh one.
    ///
    /// Finished saved states are discarded, so a completed or skipped tour
    /// starts over from the first step.
    pub fn open(config: TourConfig, store: TourStore, analytics: Arc<AnalyticsEmitter>) -> Self {
        let tour_id = config.tour_id().to_string();
        let restored = match store.get(&tour_id) {
            Some(saved) if saved.is_active && saved.current_step_index < config.step_count() => {
                info!(
                    tour_id = %tour_id,
                    step_index = saved.current_step_index,
                    "Restored active tour"
                );
                Some(saved)
            }
            Some(saved) if saved.is_active => {
                warn!(
                    tour_id = %tour_id,
                    step_index = saved.current_step_index,
                    step_count = config.step_count(),
                    "Saved step index out of range; starting fresh"
                );
                None
            }
            _ => None,
        };

        let is_restored = restored.is_some();
        let machine = Self {
            state: restored.unwrap_or_else(TourState::initial),
            config,
            store,
            analytics,
        };

        if !is_restored {
            info!(tour_id = %tour_id, "Tour started");
            machine.persist();
        }
        machine.analytics.track(
            NewEvent::new(AnalyticsEventType::TourStarted)
                .with_metadata(serde_json::json!({ "restored": is_restored })),
        );
        machine.track_current(AnalyticsEventType::StepViewed);
        machine
    }

    pub fn config(&self) -> &TourConfig {
        &self.config
    }

    pub fn state(&self) -> &TourState {
        &self.state
    }

    pub fn phase(&self) -> TourPhase {
        self.state.phase()
    }

    pub fn analytics(&self) -> &Arc<AnalyticsEmitter> {
        &self.analytics
    }

    // ── Derived values ──────────────────────────────────────────────

    pub fn current_step(&self) -> Option<&Step> {
        self.config.step(self.state.current_step_index)
    }

    pub fn is_first_step(&self) -> bool {
        self.state.current_step_index == 0
    }

    pub fn is_last_step(&self) -> bool {
        self.state.current_step_index + 1 == self.config.step_count()
    }

    /// Percentage through the tour, in `(0, 100]`.
    pub fn progress(&self) -> f64 {
        (self.state.current_step_index + 1) as f64 / self.config.step_count() as f64 * 100.0
    }

    // ── Transitions ─────────────────────────────────────────────────

    /// Move to the next step, or finish the tour from the last one.
    pub fn advance(&mut self) -> bool {
        if !self.require(TourPhase::Active, "advance") {
            return false;
        }
        if self.is_last_step() {
            self.finish_completed();
            return true;
        }

        let index = self.state.current_step_index;
        let step_id = self.config.steps()[index].id.clone();
        self.state.mark_step_completed(&step_id);
        self.state.current_step_index = index + 1;
        self.persist();

        self.analytics
            .track(NewEvent::new(AnalyticsEventType::StepCompleted).with_step(&step_id, index));
        self.step_changed();
        true
    }

    /// Move back one step. No-op on the first step.
    pub fn retreat(&mut self) -> bool {
        if !self.require(TourPhase::Active, "retreat") {
            return false;
        }
        if self.is_first_step() {
            debug!(tour_id = %self.config.tour_id(), "retreat on first step ignored");
            return false;
        }
        self.state.current_step_index -= 1;
        self.persist();
        self.step_changed();
        true
    }

    /// Jump to `index`. Out-of-range indices are ignored.
    pub fn go_to(&mut self, index: usize) -> bool {
        if !self.require(TourPhase::Active, "go_to") {
            return false;
        }
        if index >= self.config.step_count() {
            debug!(
                tour_id = %self.config.tour_id(),
                index,
                "go_to index out of range ignored"
            );
            return false;
        }
        self.state.current_step_index = index;
        self.persist();
        self.step_changed();
        true
    }

    /// Dismiss the tour without marking it completed.
    pub fn skip(&mut self) -> bool {
        if !self.require_transition(TourPhase::Finished, "skip") {
            return false;
        }
        self.state.finish();
        self.persist();
        info!(
            tour_id = %self.config.tour_id(),
            step_index = self.state.current_step_index,
            "Tour skipped"
        );

        self.track_current(AnalyticsEventType::TourSkipped);
        for listener in self.config.listeners() {
            listener.on_skip();
        }
        true
    }

    /// Finish the tour from whichever step is current.
    pub fn complete(&mut self) -> bool {
        if !self.require_transition(TourPhase::Finished, "complete") {
            return false;
        }
        self.finish_completed();
        true
    }

    /// Suspend the tour without losing its position.
    pub fn pause(&mut self) -> bool {
        if !self.require_transition(TourPhase::Paused, "pause") {
            return false;
        }
        self.state.is_paused = true;
        self.persist();
        true
    }

    pub fn resume(&mut self) -> bool {
        if !self.require_transition(TourPhase::Active, "resume") {
            return false;
        }
        self.state.is_paused = false;
        self.persist();
        true
    }

    /// Replace the state with a fresh one and start a new analytics session.
    ///
    /// Valid from any phase.
    pub fn restart(&mut self) -> bool {
        self.state = TourState::initial();
        self.analytics.reset();
        self.persist();
        info!(tour_id = %self.config.tour_id(), "Tour restarted");

        self.analytics.track(NewEvent::new(AnalyticsEventType::TourStarted));
        self.track_current(AnalyticsEventType::StepViewed);
        true
    }

    /// Press the current step's action button.
    pub fn trigger_action(&mut self) -> bool {
        if !self.require(TourPhase::Active, "trigger_action") {
            return false;
        }
        let Some(step) = self.current_step() else {
            return false;
        };
        let Some(action) = &step.action else {
            debug!(step_id = %step.id, "Step has no action");
            return false;
        };
        for listener in self.config.listeners() {
            listener.on_action(&step.id, &action.label);
        }
        true
    }

    /// Serializable view of config, state and derived values.
    pub fn snapshot(&self) -> TourSnapshot {
        TourSnapshot {
            config: TourConfigView::from(&self.config),
            phase: self.phase(),
            current_step: self.current_step().cloned(),
            is_first_step: self.is_first_step(),
            is_last_step: self.is_last_step(),
            progress: self.progress(),
            is_tour_completed: self.store.is_completed(self.config.tour_id()),
            completed_tours: self.store.completed_tour_ids(),
            state: self.state.clone(),
        }
    }

    // ── Internals ───────────────────────────────────────────────────

    /// Step navigation: only while in `phase`, which it leaves unchanged.
    fn require(&self, phase: TourPhase, op: &str) -> bool {
        let current = self.phase();
        if current != phase {
            debug!(
                tour_id = %self.config.tour_id(),
                phase = %current,
                "{op} ignored"
            );
            return false;
        }
        true
    }

    /// Gate a phase change through [`TourPhase::can_transition_to`].
    fn require_transition(&self, target: TourPhase, op: &str) -> bool {
        let current = self.phase();
        if !current.can_transition_to(target) {
            debug!(
                tour_id = %self.config.tour_id(),
                phase = %current,
                target = %target,
                "{op} ignored"
            );
            return false;
        }
        true
    }

    fn finish_completed(&mut self) {
        if let Some(step_id) = self.current_step().map(|s| s.id.clone()) {
            self.state.mark_step_completed(&step_id);
        }
        self.state.finish();
        self.persist();
        self.store.mark_completed(self.config.tour_id());
        info!(
            tour_id = %self.config.tour_id(),
            completed_steps = self.state.completed_steps.len(),
            "Tour completed"
        );

        self.track_current(AnalyticsEventType::TourCompleted);
        for listener in self.config.listeners() {
            listener.on_complete();
        }
    }

    fn step_changed(&self) {
        let index = self.state.current_step_index;
        let step_id = &self.config.steps()[index].id;
        for listener in self.config.listeners() {
            listener.on_step_change(step_id, index);
        }
        self.track_current(AnalyticsEventType::StepViewed);
    }

    fn track_current(&self, event_type: AnalyticsEventType) {
        let index = self.state.current_step_index;
        let event = match self.config.step(index) {
            Some(step) => NewEvent::new(event_type).with_step(&step.id, index),
            None => NewEvent::new(event_type),
        };
        self.analytics.track(event);
    }

    fn persist(&self) {
        self.store.set(self.config.tour_id(), &self.state);
    }
}

/// Everything a presentation layer needs to render one frame.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourSnapshot {
    pub config: TourConfigView,
    pub state: TourState,
    pub phase: TourPhase,
    pub current_step: Option<Step>,
    pub is_first_step: bool,
    pub is_last_step: bool,
    pub progress: f64,
    /// Whether this tour is in the completed ledger.
    pub is_tour_completed: bool,
    pub completed_tours: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::store::MemoryStore;
    use crate::tour::TourListener;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        StepChange(String, usize),
        Complete,
        Skip,
        Action(String, String),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Call>>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl TourListener for Recorder {
        fn on_step_change(&self, step_id: &str, step_index: usize) {
            self.calls
                .lock()
                .unwrap()
                .push(Call::StepChange(step_id.to_string(), step_index));
        }
        fn on_complete(&self) {
            self.calls.lock().unwrap().push(Call::Complete);
        }
        fn on_skip(&self) {
            self.calls.lock().unwrap().push(Call::Skip);
        }
        fn on_action(&self, step_id: &str, label: &str) {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Action(step_id.to_string(), label.to_string()));
        }
    }

    struct Harness {
        machine: TourMachine,
        store: TourStore,
        recorder: Arc<Recorder>,
    }

    fn config(n: usize) -> TourConfig {
        let steps = (0..n)
            .map(|i| Step::new(&format!("s{i}"), &format!("Step {i}"), "desc"))
            .collect();
        TourConfig::new("tour", "Tour", steps).unwrap()
    }

    fn harness_with(config: TourConfig, store: TourStore) -> Harness {
        let recorder = Arc::new(Recorder::default());
        let config = config.with_listener(recorder.clone());
        let machine = TourMachine::open(config, store.clone(), Arc::new(AnalyticsEmitter::new()));
        Harness {
            machine,
            store,
            recorder,
        }
    }

    fn harness(n: usize) -> Harness {
        harness_with(config(n), TourStore::new(Arc::new(MemoryStore::new())))
    }

    fn event_types(machine: &TourMachine) -> Vec<AnalyticsEventType> {
        machine
            .analytics()
            .events()
            .iter()
            .map(|e| e.event_type)
            .collect()
    }

    #[test]
    fn open_fresh_state() {
        let h = harness(3);
        let s = h.machine.state();
        assert_eq!(s.current_step_index, 0);
        assert!(s.completed_steps.is_empty());
        assert!(s.is_active);
        assert!(!s.is_paused);
        assert_eq!(h.machine.phase(), TourPhase::Active);
        // Persisted on open
        assert_eq!(h.store.get("tour").as_ref(), Some(s));
        assert_eq!(
            event_types(&h.machine),
            vec![AnalyticsEventType::TourStarted, AnalyticsEventType::StepViewed]
        );
    }

    #[test]
    fn advance_n_times_finishes_with_all_steps_once() {
        for n in 1..=6 {
            let mut h = harness(n);
            for _ in 0..n {
                assert!(h.machine.advance());
            }
            let s = h.machine.state();
            assert!(!s.is_active, "n={n}");
            let expected: Vec<String> = (0..n).map(|i| format!("s{i}")).collect();
            assert_eq!(s.completed_steps, expected, "n={n}");
            assert!(h.store.is_completed("tour"));
            // Further advances are no-ops
            assert!(!h.machine.advance());
        }
    }

    #[test]
    fn advance_notifies_and_tracks() {
        let mut h = harness(3);
        h.machine.advance();
        assert_eq!(h.recorder.calls(), vec![Call::StepChange("s1".into(), 1)]);

        let events = h.machine.analytics().events();
        let completed = &events[2];
        assert_eq!(completed.event_type, AnalyticsEventType::StepCompleted);
        assert_eq!(completed.step_id.as_deref(), Some("s0"));
        let viewed = &events[3];
        assert_eq!(viewed.event_type, AnalyticsEventType::StepViewed);
        assert_eq!(viewed.step_index, Some(1));
    }

    #[test]
    fn retreat_on_first_step_is_noop() {
        let mut h = harness(3);
        let before = h.machine.state().clone();
        let events_before = h.machine.analytics().events().len();

        assert!(!h.machine.retreat());
        assert_eq!(h.machine.state(), &before);
        assert_eq!(h.machine.analytics().events().len(), events_before);
        assert!(h.recorder.calls().is_empty());
    }

    #[test]
    fn retreat_moves_back_without_touching_completed() {
        let mut h = harness(3);
        h.machine.advance();
        h.machine.advance();
        assert!(h.machine.retreat());
        assert_eq!(h.machine.state().current_step_index, 1);
        assert_eq!(h.machine.state().completed_steps, vec!["s0", "s1"]);
        assert_eq!(h.recorder.calls().last(), Some(&Call::StepChange("s1".into(), 1)));
    }

    #[test]
    fn go_to_out_of_range_is_noop() {
        let mut h = harness(3);
        let before = h.machine.state().clone();
        assert!(!h.machine.go_to(3));
        assert!(!h.machine.go_to(usize::MAX));
        assert_eq!(h.machine.state(), &before);
    }

    #[test]
    fn go_to_sets_index_without_completing() {
        let mut h = harness(4);
        assert!(h.machine.go_to(3));
        assert_eq!(h.machine.state().current_step_index, 3);
        assert!(h.machine.state().completed_steps.is_empty());
        assert!(h.machine.go_to(1));
        assert_eq!(h.machine.state().current_step_index, 1);
        assert_eq!(
            h.recorder.calls(),
            vec![Call::StepChange("s3".into(), 3), Call::StepChange("s1".into(), 1)]
        );
    }

    #[test]
    fn progress_and_boundaries() {
        let mut h = harness(4);
        assert_eq!(h.machine.progress(), 25.0);
        assert!(h.machine.is_first_step());
        assert!(!h.machine.is_last_step());

        h.machine.go_to(2);
        assert!(h.machine.progress() < 100.0);

        h.machine.go_to(3);
        assert_eq!(h.machine.progress(), 100.0);
        assert!(h.machine.is_last_step());
        assert_eq!(h.machine.current_step().unwrap().id, "s3");
    }

    #[test]
    fn single_step_tour_is_first_and_last() {
        let h = harness(1);
        assert!(h.machine.is_first_step());
        assert!(h.machine.is_last_step());
        assert_eq!(h.machine.progress(), 100.0);
    }

    #[test]
    fn skip_does_not_mark_completed() {
        let mut h = harness(3);
        h.machine.advance();
        assert!(h.machine.skip());

        let s = h.machine.state();
        assert!(!s.is_active);
        assert_eq!(s.completed_steps, vec!["s0"]);
        assert!(!h.store.is_completed("tour"));
        assert_eq!(h.recorder.calls().last(), Some(&Call::Skip));
        assert_eq!(
            event_types(&h.machine).last(),
            Some(&AnalyticsEventType::TourSkipped)
        );
        // Finished: no more transitions
        assert!(!h.machine.skip());
        assert!(!h.machine.complete());
        assert!(!h.machine.go_to(0));
    }

    #[test]
    fn complete_from_middle_step() {
        let mut h = harness(4);
        h.machine.go_to(1);
        assert!(h.machine.complete());

        let s = h.machine.state();
        assert!(!s.is_active);
        assert_eq!(s.completed_steps, vec!["s1"]);
        assert!(h.store.is_completed("tour"));
        assert_eq!(h.recorder.calls().last(), Some(&Call::Complete));
        assert_eq!(
            event_types(&h.machine).last(),
            Some(&AnalyticsEventType::TourCompleted)
        );
    }

    #[test]
    fn pause_and_resume_keep_position() {
        let mut h = harness(3);
        h.machine.advance();
        assert!(h.machine.pause());
        assert_eq!(h.machine.phase(), TourPhase::Paused);
        assert!(h.store.get("tour").unwrap().is_paused);

        // Navigation is suspended while paused
        assert!(!h.machine.advance());
        assert!(!h.machine.pause());
        assert_eq!(h.machine.state().current_step_index, 1);

        assert!(h.machine.resume());
        assert!(!h.machine.resume());
        assert_eq!(h.machine.phase(), TourPhase::Active);
        assert_eq!(h.machine.state().current_step_index, 1);
        assert_eq!(h.machine.state().completed_steps, vec!["s0"]);
    }

    #[test]
    fn skip_while_paused_clears_pause() {
        let mut h = harness(2);
        h.machine.pause();
        assert!(h.machine.skip());
        assert!(!h.machine.state().is_paused);
        assert_eq!(h.machine.phase(), TourPhase::Finished);
    }

    #[test]
    fn phase_changes_follow_transition_table() {
        use TourPhase::*;
        let mut h = harness(3);
        let ops: [(fn(&mut TourMachine) -> bool, TourPhase); 4] = [
            (TourMachine::pause, Paused),
            (TourMachine::resume, Active),
            (TourMachine::skip, Finished),
            (TourMachine::complete, Finished),
        ];
        for start in [Active, Paused, Finished] {
            for (op, target) in ops {
                h.machine.restart();
                match start {
                    Paused => {
                        h.machine.pause();
                    }
                    Finished => {
                        h.machine.skip();
                    }
                    _ => {}
                }
                assert_eq!(h.machine.phase(), start);
                let expected = start.can_transition_to(target);
                assert_eq!(op(&mut h.machine), expected, "{start} -> {target}");
                let after = if expected { target } else { start };
                assert_eq!(h.machine.phase(), after);
            }
        }
    }

    #[test]
    fn restart_always_yields_initial_state() {
        let mut h = harness(3);
        h.machine.advance();
        h.machine.pause();
        h.machine.restart();
        assert_initial(h.machine.state());

        h.machine.complete();
        h.machine.restart();
        assert_initial(h.machine.state());
        assert_eq!(
            event_types(&h.machine),
            vec![AnalyticsEventType::TourStarted, AnalyticsEventType::StepViewed]
        );
    }

    fn assert_initial(s: &TourState) {
        assert_eq!(s.current_step_index, 0);
        assert!(s.completed_steps.is_empty());
        assert!(s.is_active);
        assert!(!s.is_paused);
    }

    #[test]
    fn reopen_restores_active_state() {
        let store = TourStore::new(Arc::new(MemoryStore::new()));
        let mut h = harness_with(config(3), store.clone());
        h.machine.advance();
        drop(h);

        let h = harness_with(config(3), store);
        assert_eq!(h.machine.state().current_step_index, 1);
        assert_eq!(h.machine.state().completed_steps, vec!["s0"]);
    }

    #[test]
    fn reopen_discards_finished_state() {
        let store = TourStore::new(Arc::new(MemoryStore::new()));
        let mut h = harness_with(config(2), store.clone());
        h.machine.advance();
        h.machine.advance();
        assert!(!h.machine.state().is_active);
        drop(h);

        let h = harness_with(config(2), store);
        assert_initial(h.machine.state());
    }

    #[test]
    fn reopen_discards_out_of_range_index() {
        let store = TourStore::new(Arc::new(MemoryStore::new()));
        let mut saved = TourState::initial();
        saved.current_step_index = 7;
        store.set("tour", &saved);

        let h = harness_with(config(3), store);
        assert_eq!(h.machine.state().current_step_index, 0);
    }

    #[test]
    fn trigger_action_reports_label() {
        let steps = vec![
            Step::new("a", "A", "first"),
            Step::new("b", "B", "last").with_action("Get Started"),
        ];
        let config = TourConfig::new("tour", "Tour", steps).unwrap();
        let mut h = harness_with(config, TourStore::new(Arc::new(MemoryStore::new())));

        assert!(!h.machine.trigger_action());
        h.machine.advance();
        assert!(h.machine.trigger_action());
        assert_eq!(
            h.recorder.calls().last(),
            Some(&Call::Action("b".into(), "Get Started".into()))
        );
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut h = harness(2);
        h.machine.advance();
        let snap = h.machine.snapshot();
        assert_eq!(snap.phase, TourPhase::Active);
        assert_eq!(snap.current_step.unwrap().id, "s1");
        assert!(snap.is_last_step);
        assert_eq!(snap.progress, 100.0);
        assert!(!snap.is_tour_completed);

        h.machine.advance();
        let snap = h.machine.snapshot();
        assert!(snap.is_tour_completed);
        assert!(snap.completed_tours.contains("tour"));

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["phase"], "finished");
        assert_eq!(json["state"]["isActive"], false);
        assert_eq!(json["config"]["tourId"], "tour");
    }
}
