//! Remote exporter: a thin HTTP client for the render service.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use url::Url;

use crate::config::ExportConfig;
use crate::error::{ConfigError, ExportError};
use crate::exporter::Exporter;
use crate::request::{remote_filename, ExportArtifact, ExportPayload, ExportRequest, ExportStrategy};

/// True for the render service's "too many requests" rejection. This is the
/// only place the status convention is encoded.
pub fn is_rate_limited(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
}

/// `Retry-After` in delta-seconds form.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// The `detail` message of a JSON error body, or the body itself.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[derive(Debug, Clone)]
pub struct RemoteExporter {
    client: reqwest::Client,
    endpoint: Url,
    cooldown: Duration,
}

impl RemoteExporter {
    pub fn new(config: &ExportConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint()?,
            cooldown: config.rate_limit_cooldown,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Exporter for RemoteExporter {
    async fn export(&self, request: &ExportRequest) -> Result<ExportArtifact, ExportError> {
        if request.is_blank() {
            return Err(ExportError::EmptyFragment);
        }
        log::info!(
            "remote export started: {} ({})",
            self.endpoint,
            request.orientation
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&ExportPayload::from_request(request))
            .send()
            .await
            .map_err(|e| {
                log::error!("render service unreachable: {e}");
                ExportError::ExportFailure(e.to_string())
            })?;

        let status = response.status();
        if is_rate_limited(status) {
            let retry_after = retry_after(response.headers()).unwrap_or(self.cooldown);
            log::warn!("render service rate limit hit; retry in {}s", retry_after.as_secs());
            return Err(ExportError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = error_detail(&body);
            log::error!("render service returned {status}: {detail}");
            return Err(ExportError::ExportFailure(format!("render service returned {status}: {detail}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExportError::ExportFailure(e.to_string()))?;
        if bytes.is_empty() {
            log::error!("render service returned an empty body");
            return Err(ExportError::ExportFailure("render service returned an empty body".to_string()));
        }

        log::info!("remote export finished ({} bytes)", bytes.len());
        Ok(ExportArtifact {
            filename: remote_filename(request.orientation),
            bytes: bytes.to_vec(),
            orientation: request.orientation,
            strategy: ExportStrategy::Remote,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn only_429_is_rate_limited() {
        assert!(is_rate_limited(StatusCode::TOO_MANY_REQUESTS));
        for status in [StatusCode::OK, StatusCode::SERVICE_UNAVAILABLE, StatusCode::FORBIDDEN] {
            assert!(!is_rate_limited(status));
        }
    }

    #[test]
    fn retry_after_seconds() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("42"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(42)));
        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2026 07:28:00 GMT"));
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn error_detail_prefers_json_detail() {
        assert_eq!(error_detail(r#"{"detail":"browser crashed"}"#), "browser crashed");
        assert_eq!(error_detail("Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn blank_fragment_is_rejected_before_io() {
        // Nothing listens on port 9; dialing it would yield ExportFailure.
        let config = ExportConfig {
            origin: "http://127.0.0.1:9".to_string(),
            ..ExportConfig::default()
        };
        let exporter = RemoteExporter::new(&config).unwrap();
        let err = exporter
            .export(&ExportRequest::remote(" \n ", crate::request::Orientation::Portrait))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::EmptyFragment));
    }
}
