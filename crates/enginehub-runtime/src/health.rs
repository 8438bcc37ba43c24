//! Readiness probe for OpenAI-compatible engine servers.
//!
//! Both engines expose `GET /v1/models` once weights are loaded. The probe
//! is advisory: a transport error only means "not ready yet".

use enginehub_core::EngineError;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Per-request bound for a single readiness probe.
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Readiness URL for an engine whose base URL is `http://host:port/v1`.
pub fn models_url(base_url: &str) -> String {
    format!("{}/models", base_url.trim_end_matches('/'))
}

/// Build the HTTP client used for probing.
///
/// Falls back to the default client if the builder fails, so a probe can
/// always be attempted.
pub(crate) fn probe_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            debug!("Failed to build probe client ({e}), using defaults");
            Client::new()
        })
}

/// Issue one `GET {base_url}/models`.
///
/// `Ok(())` only on HTTP 200. A non-200 answer and a transport failure are
/// both reported as [`EngineError::HealthCheckTransport`].
pub async fn check_models_endpoint(client: &Client, base_url: &str) -> Result<(), EngineError> {
    let url = models_url(base_url);

    match client.get(&url).send().await {
        Ok(response) if response.status() == reqwest::StatusCode::OK => Ok(()),
        Ok(response) => Err(EngineError::HealthCheckTransport(format!(
            "{url} returned {}",
            response.status()
        ))),
        Err(e) if e.is_timeout() => Err(EngineError::HealthCheckTransport(format!(
            "{url} timed out"
        ))),
        Err(e) if e.is_connect() => Err(EngineError::HealthCheckTransport(format!(
            "{url}: connection refused"
        ))),
        Err(e) => Err(EngineError::HealthCheckTransport(format!("{url}: {e}"))),
    }
}

/// Boolean form of [`check_models_endpoint`]; never fails.
pub async fn is_ready(client: &Client, base_url: &str) -> bool {
    match check_models_endpoint(client, base_url).await {
        Ok(()) => true,
        Err(e) => {
            debug!("{e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    #[test]
    fn test_models_url() {
        assert_eq!(
            models_url("http://127.0.0.1:8080/v1"),
            "http://127.0.0.1:8080/v1/models"
        );
        assert_eq!(
            models_url("http://127.0.0.1:8080/v1/"),
            "http://127.0.0.1:8080/v1/models"
        );
    }

    #[tokio::test]
    async fn test_ready_on_200() {
        let base = serve(Router::new().route(
            "/v1/models",
            get(|| async { r#"{"object":"list","data":[]}"# }),
        ))
        .await;
        let client = probe_client(HEALTH_CHECK_TIMEOUT);
        assert!(check_models_endpoint(&client, &base).await.is_ok());
        assert!(is_ready(&client, &base).await);
    }

    #[tokio::test]
    async fn test_non_200_is_not_ready() {
        let base = serve(Router::new().route(
            "/v1/models",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        ))
        .await;
        let client = probe_client(HEALTH_CHECK_TIMEOUT);
        let err = check_models_endpoint(&client, &base).await.unwrap_err();
        assert!(err.to_string().contains("503"));
        assert!(!is_ready(&client, &base).await);
    }

    #[tokio::test]
    async fn test_connection_refused_is_not_ready() {
        // Bind then drop to get a port nobody listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = probe_client(HEALTH_CHECK_TIMEOUT);
        let base = format!("http://127.0.0.1:{port}/v1");
        assert!(matches!(
            check_models_endpoint(&client, &base).await,
            Err(EngineError::HealthCheckTransport(_))
        ));
    }

    #[tokio::test]
    async fn test_probe_times_out() {
        let base = serve(Router::new().route(
            "/v1/models",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        ))
        .await;
        let client = probe_client(Duration::from_millis(200));
        let started = std::time::Instant::now();
        assert!(!is_ready(&client, &base).await);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
