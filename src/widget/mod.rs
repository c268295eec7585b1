//! Embedding surface: the `TourGuide` namespace, mounted widget handles and
//! the HTTP control routes.

pub mod guide;
pub mod handle;
pub mod routes;

pub use guide::TourGuide;
pub use handle::{WidgetDeps, WidgetHandle, mount};
pub use routes::{TourRouteState, TourStatus, tour_routes};
