//! HTTP tour backend: JSON query/mutation calls against the tour service.

use async_trait::async_trait;

use crate::error::RemoteError;

use super::{RemoteTour, TourBackend, TrackEventRequest};

/// Function path of the tour lookup query.
pub const GET_TOUR_PATH: &str = "publicTours:getTourById";
/// Function path of the event tracking mutation.
pub const TRACK_EVENT_PATH: &str = "publicTours:trackWidgetEvent";

/// Talks to the tour service over `POST /api/query` and `POST /api/mutation`.
pub struct HttpBackend {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST a `{path, args, format}` envelope and return the decoded body.
    async fn call(
        &self,
        kind: &str,
        path: &str,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, RemoteError> {
        let body = serde_json::json!({
            "path": path,
            "args": args,
            "format": "json",
        });

        let resp = self
            .client
            .post(format!("{}/api/{kind}", self.endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::RequestFailed {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<serde_json::Value>()
            .await
            .map_err(|e| RemoteError::InvalidResponse {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl TourBackend for HttpBackend {
    async fn fetch_tour(&self, tour_id: &str) -> Result<Option<RemoteTour>, RemoteError> {
        let data = self
            .call("query", GET_TOUR_PATH, serde_json::json!({ "tourId": tour_id }))
            .await?;

        match data.get("value") {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| RemoteError::InvalidResponse {
                    path: GET_TOUR_PATH.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    async fn track_event(&self, request: &TrackEventRequest) -> Result<(), RemoteError> {
        let args = serde_json::to_value(request).map_err(|e| RemoteError::RequestFailed {
            path: TRACK_EVENT_PATH.to_string(),
            reason: e.to_string(),
        })?;
        self.call("mutation", TRACK_EVENT_PATH, args).await?;
        tracing::debug!(
            tour_id = %request.tour_id,
            event_type = %request.event_type,
            "Widget event delivered"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash() {
        let backend = HttpBackend::new("http://localhost:3210/");
        assert_eq!(backend.endpoint(), "http://localhost:3210");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_request_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let backend = HttpBackend::new(&format!("http://127.0.0.1:{port}"));
        let err = backend.fetch_tour("t").await.unwrap_err();
        assert!(matches!(err, RemoteError::RequestFailed { .. }));
    }
}
