//! Recommendation API.
//!
//! JSON Endpoints:
//! - `POST /api/v1/recommendations` — run the full pipeline for one
//!   preference payload and return the canonical envelope
//!
//! Every response is one of the two wire envelopes: the pipeline's
//! `{ success: true, data, tasteAnalysis, conversationInsights }` on
//! success, or `{ error, details, timestamp }` with a mapped status code.

use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use dramwise_agent::{CompletionTransport, RecommendationPipeline};
use dramwise_core::{PipelineError, PreferenceInput};

pub struct ApiState<T> {
    pipeline: Arc<RecommendationPipeline<T>>,
}

impl<T> ApiState<T> {
    pub fn new(pipeline: RecommendationPipeline<T>) -> Self {
        Self { pipeline: Arc::new(pipeline) }
    }
}

impl<T> Clone for ApiState<T> {
    fn clone(&self) -> Self {
        Self { pipeline: self.pipeline.clone() }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: String,
}

impl ErrorBody {
    fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self { error: error.into(), details, timestamp: Utc::now().to_rfc3339() }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router<T: CompletionTransport + 'static>(state: ApiState<T>) -> Router {
    Router::new()
        .route("/api/v1/recommendations", post(create_recommendation::<T>))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn create_recommendation<T: CompletionTransport + 'static>(
    State(state): State<ApiState<T>>,
    payload: Result<Json<PreferenceInput>, JsonRejection>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorBody>)> {
    let correlation_id = Uuid::new_v4().to_string();

    let Json(input) = payload.map_err(|rejection| {
        warn!(
            event_name = "api.recommendations.rejected",
            correlation_id = %correlation_id,
            rejection = %rejection,
            "request body rejected"
        );
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new(
                "The request body must be a valid JSON preference payload.",
                Some(rejection.to_string()),
            )),
        )
    })?;

    let span = tracing::info_span!("recommendation", correlation_id = %correlation_id);
    let outcome = state
        .pipeline
        .run(&input)
        .instrument(span)
        .await
        .map_err(|error| pipeline_error_response(error, &correlation_id))?;

    info!(
        event_name = "api.recommendations.complete",
        correlation_id = %correlation_id,
        shape = ?outcome.shape,
        structured = outcome.structured.is_some(),
        "recommendation served"
    );

    Ok(Json(outcome.envelope))
}

fn pipeline_error_response(
    error: PipelineError,
    correlation_id: &str,
) -> (StatusCode, Json<ErrorBody>) {
    let status = match &error {
        PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
        PipelineError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        PipelineError::UpstreamExhausted(_) => StatusCode::BAD_GATEWAY,
    };

    warn!(
        event_name = "api.recommendations.failed",
        correlation_id = %correlation_id,
        status = status.as_u16(),
        error = %error,
        "pipeline run failed"
    );

    let interface = error.into_interface(correlation_id);
    (status, Json(ErrorBody::new(interface.user_message(), Some(interface.to_string()))))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use dramwise_agent::dispatch::{CompletionTransport, TransportFailure};
    use dramwise_agent::{CompletionRequest, RecommendationPipeline};
    use dramwise_core::config::CompletionConfig;
    use dramwise_core::Catalog;

    use super::{router, ApiState};

    struct StaticTransport(Value);

    #[async_trait]
    impl CompletionTransport for StaticTransport {
        async fn send(
            &self,
            _endpoint: &str,
            _request: &CompletionRequest,
        ) -> Result<Value, TransportFailure> {
            Ok(self.0.clone())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl CompletionTransport for FailingTransport {
        async fn send(
            &self,
            _endpoint: &str,
            _request: &CompletionRequest,
        ) -> Result<Value, TransportFailure> {
            Err(TransportFailure::Status { status: 503, detail: "down".to_string() })
        }
    }

    fn completion_config() -> CompletionConfig {
        CompletionConfig {
            endpoints: vec!["https://proxy.example/api/v1/messages".to_string()],
            api_key: "test-key".to_string().into(),
            model: "sommelier-large".to_string(),
            max_tokens: 2000,
            temperature: 0.7,
            timeout_secs: 30,
        }
    }

    fn app_with<T: CompletionTransport + 'static>(transport: T) -> axum::Router {
        let pipeline =
            RecommendationPipeline::new(&completion_config(), Catalog::builtin(), transport);
        router(ApiState::new(pipeline))
    }

    fn post_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/recommendations")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body reads");
        serde_json::from_slice(&bytes).expect("body is json")
    }

    #[tokio::test]
    async fn valid_payload_returns_the_success_envelope() {
        let app = app_with(StaticTransport(
            json!({"content": [{"type": "text", "text": "a fine dram awaits"}]}),
        ));

        let response = app
            .oneshot(post_request(
                r#"{"minPrice": 3000, "maxPrice": 12000, "tasteX": 0.8, "tasteY": 0.7,
                   "additionalPreferences": "after dinner"}"#,
            ))
            .await
            .expect("request handled");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["content"][0]["text"], "a fine dram awaits");
        assert_eq!(body["tasteAnalysis"]["quadrant"], "heavy & smoky");
        assert!(body["conversationInsights"]["experienceLevel"].is_string());
    }

    #[tokio::test]
    async fn malformed_json_body_maps_to_bad_request_envelope() {
        let app = app_with(StaticTransport(json!({})));

        let response =
            app.oneshot(post_request("{not json")).await.expect("request handled");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().expect("error message").contains("valid JSON"));
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn inverted_price_bounds_map_to_bad_request() {
        let app = app_with(StaticTransport(json!({})));

        let response = app
            .oneshot(post_request(r#"{"minPrice": 20000, "maxPrice": 500}"#))
            .await
            .expect("request handled");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upstream_exhaustion_maps_to_bad_gateway() {
        let app = app_with(FailingTransport);

        let response = app
            .oneshot(post_request(r#"{"tasteX": 0.5, "tasteY": 0.5}"#))
            .await
            .expect("request handled");

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(body["details"]
            .as_str()
            .expect("details present")
            .contains("proxy.example"));
    }
}
