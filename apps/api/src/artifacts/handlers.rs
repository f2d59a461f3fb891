use std::time::Duration;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::artifacts::engine::AnalysisOutput;
use crate::artifacts::models::{Artifact, RawContent, ServiceId};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub content: String,
    #[serde(default)]
    pub service_id: Option<ServiceId>,
    #[serde(default)]
    pub user_context: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectRequest {
    pub content: String,
    #[serde(default)]
    pub service_id: Option<ServiceId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanRequest {
    pub content: String,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanResponse {
    pub display_text: String,
}

/// POST /api/v1/artifacts/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<AnalysisOutput>, AppError> {
    validate_content(&state, &req.content)?;
    let engine = state.engine.clone();
    let raw = RawContent::new(req.content)
        .with_service(req.service_id)
        .with_user_context(req.user_context);
    let output = run_bounded(&state, move || engine.analyze(&raw)).await?;
    Ok(Json(output))
}

/// POST /api/v1/artifacts/detect
pub async fn handle_detect(
    State(state): State<AppState>,
    Json(req): Json<DetectRequest>,
) -> Result<Json<DetectResponse>, AppError> {
    validate_content(&state, &req.content)?;
    let engine = state.engine.clone();
    let artifacts =
        run_bounded(&state, move || engine.detect_artifacts(&req.content, req.service_id)).await?;
    Ok(Json(DetectResponse { artifacts }))
}

/// POST /api/v1/artifacts/clean
pub async fn handle_clean(
    State(state): State<AppState>,
    Json(req): Json<CleanRequest>,
) -> Result<Json<CleanResponse>, AppError> {
    validate_content(&state, &req.content)?;
    let engine = state.engine.clone();
    let display_text = run_bounded(&state, move || {
        engine.clean_content_for_display(&req.content, &req.artifacts)
    })
    .await?;
    Ok(Json(CleanResponse { display_text }))
}

fn validate_content(state: &AppState, content: &str) -> Result<(), AppError> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("content must not be empty".to_string()));
    }
    let limit = state.config.max_content_bytes;
    if content.len() > limit {
        return Err(AppError::PayloadTooLarge(format!(
            "content is {} bytes; the limit is {limit}",
            content.len()
        )));
    }
    Ok(())
}

/// Runs CPU-bound analysis on the blocking pool under the configured
/// wall-clock budget.
async fn run_bounded<T, F>(state: &AppState, work: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let budget = Duration::from_millis(state.config.analysis_timeout_ms);
    match tokio::time::timeout(budget, tokio::task::spawn_blocking(work)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(AppError::Internal(anyhow::anyhow!(
            "spawn_blocking failed in artifact analysis: {e}"
        ))),
        Err(_) => {
            warn!(budget_ms = state.config.analysis_timeout_ms, "artifact analysis timed out");
            Err(AppError::Timeout(budget.as_millis() as u64))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::routes::build_router;
    use crate::state::AppState;

    async fn call(config: Config, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let app = build_router(AppState::new(config));
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_generate_returns_artifacts_and_display_text() {
        let body = json!({
            "content": "| Critère | Score |\n|---|---|\n| Structure | 85/100 |\n| Contenu | 72/100 |\n\nMerci.",
            "serviceId": "resume-review"
        });
        let (status, value) = call(Config::default(), "POST", "/api/v1/artifacts/generate", body).await;
        assert_eq!(status, StatusCode::OK);

        let artifacts = value["artifacts"].as_array().unwrap();
        let types: Vec<&str> = artifacts.iter().filter_map(|a| a["type"].as_str()).collect();
        assert!(types.contains(&"table"));
        assert_eq!(types.iter().filter(|t| **t == "cv-analysis").count(), 1);
        assert_eq!(value["displayText"], "Merci.");

        let table = artifacts.iter().find(|a| a["type"] == "table").unwrap();
        assert_eq!(table["data"]["headers"], json!(["Critère", "Score"]));
        assert_eq!(table["metadata"]["serviceId"], "resume-review");
        assert_eq!(table["metadata"]["aiGenerated"], true);
    }

    #[tokio::test]
    async fn test_detect_has_no_composites() {
        let body = json!({ "content": "35k€ → 42k€", "serviceId": "salary-negotiation" });
        let (status, value) = call(Config::default(), "POST", "/api/v1/artifacts/detect", body).await;
        assert_eq!(status, StatusCode::OK);
        let artifacts = value["artifacts"].as_array().unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0]["type"], "chart");
        assert_eq!(artifacts[0]["data"]["type"], "line");
        assert_eq!(artifacts[0]["data"]["data"][0]["from"], 35000.0);
        assert_eq!(artifacts[0]["data"]["data"][0]["to"], 42000.0);
    }

    #[tokio::test]
    async fn test_clean_round_trips_artifacts() {
        let content = "Intro\n\n☐ Relire le CV\n☐ Ajouter un lien GitHub\n\nFin";
        let (_, detected) = call(
            Config::default(),
            "POST",
            "/api/v1/artifacts/detect",
            json!({ "content": content }),
        )
        .await;
        let (status, value) = call(
            Config::default(),
            "POST",
            "/api/v1/artifacts/clean",
            json!({ "content": content, "artifacts": detected["artifacts"] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["displayText"], "Intro\n\nFin");
    }

    #[tokio::test]
    async fn test_empty_content_rejected() {
        let (status, value) = call(
            Config::default(),
            "POST",
            "/api/v1/artifacts/generate",
            json!({ "content": "   " }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_oversized_content_rejected() {
        let config = Config {
            max_content_bytes: 16,
            ..Config::default()
        };
        let (status, value) = call(
            config,
            "POST",
            "/api/v1/artifacts/detect",
            json!({ "content": "x".repeat(64) }),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(value["error"]["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_unknown_service_rejected() {
        let (status, _) = call(
            Config::default(),
            "POST",
            "/api/v1/artifacts/generate",
            json!({ "content": "Bonjour", "serviceId": "tarot-reading" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
