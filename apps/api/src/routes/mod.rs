pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::artifacts::handlers;
use crate::state::AppState;
use crate::view_state::handlers as view_state;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.request_body_limit();
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/artifacts/generate", post(handlers::handle_generate))
        .route("/api/v1/artifacts/detect", post(handlers::handle_detect))
        .route("/api/v1/artifacts/clean", post(handlers::handle_clean))
        .route(
            "/api/v1/artifacts/:id/state",
            get(view_state::handle_get_state).patch(view_state::handle_toggle_state),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::Config;

    #[tokio::test]
    async fn test_health() {
        let app = build_router(AppState::new(Config::default()));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "artifacts-api");
    }
}
