//! REST endpoints that drive a [`TourGuide`] from outside the process.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::analytics::AnalyticsEvent;
use crate::error::TourError;
use crate::tour::{TourMachine, TourPhase, TourSnapshot};

use super::guide::TourGuide;

/// Shared state for tour routes.
#[derive(Clone)]
pub struct TourRouteState {
    pub guide: Arc<Mutex<TourGuide>>,
}

/// Body of every tour route response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourStatus {
    pub initialized: bool,
    pub started: bool,
    pub phase: TourPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<TourSnapshot>,
    pub events: Vec<AnalyticsEvent>,
    /// Whether the requested action changed anything (absent for GET).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,
}

fn status_of(guide: &TourGuide, changed: Option<bool>) -> TourStatus {
    match guide.app() {
        Ok(app) => TourStatus {
            initialized: true,
            started: app.is_started(),
            phase: app.phase(),
            snapshot: app.snapshot().ok(),
            events: app.analytics().events(),
            changed,
        },
        Err(_) => TourStatus {
            initialized: false,
            started: false,
            phase: TourPhase::NotStarted,
            snapshot: None,
            events: Vec::new(),
            changed,
        },
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// GET /api/tour/status
async fn get_status(State(state): State<TourRouteState>) -> impl IntoResponse {
    let guide = state.guide.lock().await;
    Json(status_of(&guide, None))
}

/// POST /api/tour/{action}
///
/// `start` and `stop` act on the widget; the rest are transitions of the
/// running tour. Returns 409 if the widget is not in a usable state.
async fn post_action(
    State(state): State<TourRouteState>,
    Path(action): Path<String>,
) -> Response {
    let mut guide = state.guide.lock().await;
    let result = match action.as_str() {
        "start" => guide.start().map_err(ActionError::from),
        "stop" => guide.stop().map_err(ActionError::from),
        other => apply_transition(&mut guide, other),
    };
    match result {
        Ok(changed) => Json(status_of(&guide, Some(changed))).into_response(),
        Err(ActionError::Unknown(name)) => {
            error_response(StatusCode::NOT_FOUND, format!("Unknown action: {name}"))
        }
        Err(ActionError::Tour(e)) => error_response(StatusCode::CONFLICT, e.to_string()),
    }
}

/// POST /api/tour/goto/{index}
async fn post_goto(
    State(state): State<TourRouteState>,
    Path(index): Path<usize>,
) -> Response {
    let mut guide = state.guide.lock().await;
    let result = guide
        .app_mut()
        .and_then(|app| app.machine_mut())
        .map(|machine| machine.go_to(index));
    match result {
        Ok(changed) => Json(status_of(&guide, Some(changed))).into_response(),
        Err(e) => error_response(StatusCode::CONFLICT, e.to_string()),
    }
}

enum ActionError {
    Unknown(String),
    Tour(TourError),
}

impl From<TourError> for ActionError {
    fn from(e: TourError) -> Self {
        Self::Tour(e)
    }
}

/// Machine transition named by a route action.
fn transition(action: &str) -> Option<fn(&mut TourMachine) -> bool> {
    let op: fn(&mut TourMachine) -> bool = match action {
        "next" => TourMachine::advance,
        "back" => TourMachine::retreat,
        "skip" => TourMachine::skip,
        "complete" => TourMachine::complete,
        "pause" => TourMachine::pause,
        "resume" => TourMachine::resume,
        "restart" => TourMachine::restart,
        "action" => TourMachine::trigger_action,
        _ => return None,
    };
    Some(op)
}

fn apply_transition(guide: &mut TourGuide, action: &str) -> Result<bool, ActionError> {
    let op = transition(action).ok_or_else(|| ActionError::Unknown(action.to_string()))?;
    let machine = guide.app_mut()?.machine_mut()?;
    Ok(op(machine))
}

/// Build the tour REST routes.
///
/// CORS is open so a page on any origin can drive its own widget.
pub fn tour_routes(state: TourRouteState) -> Router {
    Router::new()
        .route("/api/tour/status", get(get_status))
        .route("/api/tour/goto/{index}", post(post_goto))
        .route("/api/tour/{action}", post(post_action))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::WidgetConfig;
    use crate::widget::WidgetDeps;

    async fn router(tour_id: Option<&str>) -> Router {
        let mut guide = TourGuide::new(WidgetDeps::in_memory());
        if let Some(tour_id) = tour_id {
            guide.init(WidgetConfig::new(tour_id)).await.unwrap();
        }
        tour_routes(TourRouteState {
            guide: Arc::new(Mutex::new(guide)),
        })
    }

    async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn status_reports_snapshot() {
        let (status, body) = call(router(Some("t")).await, "GET", "/api/tour/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["initialized"], true);
        assert_eq!(body["snapshot"]["config"]["tourId"], "t");
        assert!(body.get("changed").is_none());
    }

    #[tokio::test]
    async fn next_reports_change() {
        let (status, body) = call(router(Some("t")).await, "POST", "/api/tour/next").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["changed"], true);
        assert_eq!(body["snapshot"]["state"]["currentStepIndex"], 1);
    }

    #[tokio::test]
    async fn uninitialized_is_conflict() {
        let (status, body) = call(router(None).await, "POST", "/api/tour/goto/1").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn unknown_action_is_not_found_before_init() {
        let (status, body) = call(router(None).await, "POST", "/api/tour/jump").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Unknown action: jump");
    }

    #[tokio::test]
    async fn stopped_widget_reports_not_started() {
        let app = router(Some("t")).await;
        let (_, body) = call(app.clone(), "POST", "/api/tour/stop").await;
        assert_eq!(body["phase"], "not_started");
        let (status, _) = call(app.clone(), "POST", "/api/tour/fly").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(app, "POST", "/api/tour/next").await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_action_is_not_found() {
        let (status, _) = call(router(Some("t")).await, "POST", "/api/tour/jump").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
