//! Built-in tour used when neither the backend nor the caller supplies steps.

use super::model::{Placement, Step};

/// Fallback tour id.
pub const DEFAULT_TOUR_ID: &str = "default-tour";
/// Fallback tour name.
pub const DEFAULT_TOUR_NAME: &str = "Getting Started";

/// The built-in five-step welcome tour.
pub fn default_steps() -> Vec<Step> {
    [
        (
            "welcome",
            "Welcome to Your Journey!",
            "We're excited to have you here. This quick tour will help you discover the features waiting for you.",
        ),
        (
            "dashboard-overview",
            "Your Personal Dashboard",
            "This is your command center. Here you can view your progress, access quick actions, and see personalized recommendations.",
        ),
        (
            "navigation",
            "Easy Navigation",
            "Use the sidebar to navigate between different sections. Everything is just one click away.",
        ),
        (
            "features",
            "Powerful Features",
            "Explore features designed to boost your productivity, from analytics to automation.",
        ),
        (
            "support",
            "We're Here to Help",
            "Need assistance? Our support team is available around the clock. Click the help icon anytime to reach us.",
        ),
    ]
    .into_iter()
    .map(|(id, title, description)| {
        Step::new(id, title, description).with_placement(Placement::Center)
    })
    .collect()
}
