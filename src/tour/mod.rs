//! Tour engine: step definitions, the progress state machine, and the
//! resolver that decides which steps a session runs.
//!
//! A session resolves its [`TourConfig`] once, then a [`TourMachine`] owns
//! the [`TourState`] for as long as the tour is mounted. The presentation
//! layer reads a [`TourSnapshot`] and calls transitions back into the machine.

pub mod defaults;
pub mod listener;
pub mod machine;
pub mod model;
pub mod resolver;
pub mod state;

pub use defaults::default_steps;
pub use listener::{CallbackListener, TourListener};
pub use machine::{TourMachine, TourSnapshot};
pub use model::{AvatarPosition, Placement, Step, StepAction, Theme, TourConfig, TourConfigView};
pub use resolver::{DEFAULT_FETCH_TIMEOUT, PartialTourConfig, fetch_remote, resolve};
pub use state::{TourPhase, TourState};
