//! HTTP routes for the docchat liveness probe.
//!
//! The HTTP surface exists only to satisfy an external health check; it
//! shares no mutable state with the bot logic.

use axum::{response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

/// Liveness probe, fixed body.
async fn root() -> impl IntoResponse {
    Json(StatusResponse {
        status: "Bot is running",
        version: "1.0",
    })
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        service: "docchat-bot",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the HTTP router.
pub fn build_router() -> Router {
    Router::new().route("/", get(root)).route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn root_reports_bot_running() {
        let router = build_router();
        let response = router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "Bot is running");
        assert_eq!(json["version"], "1.0");
    }

    #[tokio::test]
    async fn health_reports_service() {
        let router = build_router();
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "docchat-bot");
    }
}
