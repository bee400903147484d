use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use dramwise_core::config::AppConfig;
use dramwise_core::Catalog;
use serde::Serialize;
use tracing::{error, info};

#[derive(Clone)]
pub struct HealthState {
    config: Arc<AppConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub configuration: HealthCheck,
    pub catalog: HealthCheck,
    pub checked_at: String,
}

pub fn router(config: Arc<AppConfig>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { config })
}

pub async fn spawn(bind_address: &str, port: u16, config: Arc<AppConfig>) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(config)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let configuration = configuration_check(&state.config);
    let catalog = catalog_check();
    let ready = configuration.status == "ready" && catalog.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "dramwise-server runtime initialized".to_string(),
        },
        configuration,
        catalog,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn configuration_check(config: &AppConfig) -> HealthCheck {
    match config.validate() {
        Ok(()) => HealthCheck {
            status: "ready",
            detail: format!(
                "{} completion endpoint(s) configured",
                config.completion.endpoints.len()
            ),
        },
        Err(error) => HealthCheck { status: "degraded", detail: error.to_string() },
    }
}

fn catalog_check() -> HealthCheck {
    let catalog = Catalog::builtin();
    if catalog.is_empty() {
        return HealthCheck {
            status: "degraded",
            detail: "reference catalog is empty".to_string(),
        };
    }
    HealthCheck {
        status: "ready",
        detail: format!("{} reference entries loaded", catalog.entries().len()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    use dramwise_core::config::AppConfig;

    use super::router;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.completion.endpoints = vec!["https://proxy.example/api/v1/messages".to_string()];
        config.completion.api_key = "test-key".to_string().into();
        config.completion.model = "sommelier-large".to_string();
        config
    }

    #[tokio::test]
    async fn healthy_configuration_reports_ready() {
        let app = router(Arc::new(valid_config()));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("request handled");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body reads");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("body is json");
        assert_eq!(body["status"], "ready");
        assert_eq!(body["catalog"]["status"], "ready");
    }

    #[tokio::test]
    async fn missing_credentials_degrade_health() {
        let app = router(Arc::new(AppConfig::default()));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("request handled");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
