//! Typed access to the Zenduty REST API.
//!
//! [`ZendutyClient`] is built once from configuration and handed explicitly to
//! every lifecycle operation. Requests go through a [`Transport`], which is
//! reqwest in production and [`InMemoryApi`] in tests.

mod error;
mod http;
mod memory;

pub use error::ClientError;
pub use http::{HttpSettings, HttpTransport};
pub use memory::InMemoryApi;

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::config::Config;
use crate::observability::Metrics;
use crate::retry::RetryPolicy;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes one authenticated request against the API.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse>;
}

#[derive(Clone)]
pub struct ZendutyClient {
    transport: Arc<dyn Transport>,
    metrics: Arc<Metrics>,
    retry_policy: RetryPolicy,
}

impl ZendutyClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            metrics: Arc::new(Metrics::new()),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Build an HTTP-backed client from validated configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let token = config
            .provider
            .token
            .clone()
            .ok_or_else(|| ClientError::Transport("no API token configured".to_string()))?;

        let settings = HttpSettings::builder()
            .base_url(config.provider.base_url.clone())
            .token(token)
            .connect_timeout(config.http.connect_timeout.as_duration())
            .request_timeout(config.http.request_timeout.as_duration())
            .user_agent(config.http.user_agent.clone())
            .build();

        let transport = HttpTransport::new(settings)?;
        Ok(Self::new(Arc::new(transport)).with_retry_policy(config.retry.policy()))
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.send(Method::GET, path, None).await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let body = self.send(Method::POST, path, Some(body)).await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let body = self.send(Method::PUT, path, Some(body)).await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let body = self.send(Method::PATCH, path, Some(body)).await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, None).await?;
        Ok(())
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        self.metrics.api_request();
        debug!(%method, path, "Sending API request");

        let request = ApiRequest {
            method: method.clone(),
            path: path.to_string(),
            body,
        };

        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                self.metrics.api_failure();
                return Err(err);
            }
        };

        if !response.is_success() {
            self.metrics.api_failure();
            let message = error_message(&response);
            debug!(%method, path, status = response.status, %message, "API request failed");
            return Err(ClientError::Api {
                status: response.status,
                message,
            });
        }

        debug!(%method, path, status = response.status, "API request succeeded");
        Ok(response.body)
    }
}

/// Prefer the API's own explanation, fall back to the reason phrase.
fn error_message(response: &ApiResponse) -> String {
    let from_body = match &response.body {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Object(map) => ["detail", "message", "error"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .or_else(|| Some(Value::Object(map.clone()).to_string())),
        _ => None,
    };

    let reason = reqwest::StatusCode::from_u16(response.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");

    match from_body {
        Some(detail) => format!("{} {}: {}", response.status, reason, detail),
        None => format!("{} {}", response.status, reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_prefers_detail() {
        let response = ApiResponse {
            status: 404,
            body: json!({"detail": "Not found."}),
        };
        assert_eq!(error_message(&response), "404 Not Found: Not found.");
    }

    #[test]
    fn test_error_message_without_body() {
        let response = ApiResponse {
            status: 503,
            body: Value::Null,
        };
        assert_eq!(error_message(&response), "503 Service Unavailable");
    }

    #[tokio::test]
    async fn test_non_success_maps_to_api_error() {
        let api = InMemoryApi::new();
        let client = ZendutyClient::new(Arc::new(api.clone()));

        let err = client
            .get::<Value>("/api/account/teams/11111111-1111-4111-8111-111111111111/")
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert_eq!(client.metrics().snapshot().api_failures, 1);
    }

    #[tokio::test]
    async fn test_post_then_get() {
        let api = InMemoryApi::new();
        let client = ZendutyClient::new(Arc::new(api.clone()));

        let created: Value = client
            .post("/api/account/teams/", &json!({"name": "SRE"}))
            .await
            .unwrap();
        let id = created["unique_id"].as_str().unwrap().to_string();

        let fetched: Value = client
            .get(&format!("/api/account/teams/{}/", id))
            .await
            .unwrap();
        assert_eq!(fetched["name"], "SRE");
        assert_eq!(client.metrics().snapshot().api_requests, 2);
    }
}
