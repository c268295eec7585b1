//! Observer interface for tour lifecycle notifications.

/// Receives notifications from a [`TourMachine`](super::TourMachine).
///
/// All methods default to no-ops so implementors only override what they
/// care about. Calls happen synchronously inside the transition.
pub trait TourListener: Send + Sync {
    /// The current step changed to `step_id` at `step_index`.
    fn on_step_change(&self, _step_id: &str, _step_index: usize) {}

    /// The tour was finished (last step advanced or completed directly).
    fn on_complete(&self) {}

    /// The tour was dismissed before finishing.
    fn on_skip(&self) {}

    /// The action button of `step_id` was pressed.
    fn on_action(&self, _step_id: &str, _label: &str) {}
}

type StepChangeFn = Box<dyn Fn(&str, usize) + Send + Sync>;
type NotifyFn = Box<dyn Fn() + Send + Sync>;

/// Listener assembled from closures.
#[derive(Default)]
pub struct CallbackListener {
    on_step_change: Option<StepChangeFn>,
    on_complete: Option<NotifyFn>,
    on_skip: Option<NotifyFn>,
}

impl CallbackListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_step_change(mut self, f: impl Fn(&str, usize) + Send + Sync + 'static) -> Self {
        self.on_step_change = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    pub fn on_skip(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_skip = Some(Box::new(f));
        self
    }
}

impl TourListener for CallbackListener {
    fn on_step_change(&self, step_id: &str, step_index: usize) {
        if let Some(f) = &self.on_step_change {
            f(step_id, step_index);
        }
    }

    fn on_complete(&self) {
        if let Some(f) = &self.on_complete {
            f();
        }
    }

    fn on_skip(&self) {
        if let Some(f) = &self.on_skip {
            f();
        }
    }
}
