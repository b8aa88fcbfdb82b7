//! reqwest transport

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{ApiRequest, ApiResponse, ClientError, Result, Transport};

#[derive(Debug, Clone, bon::Builder)]
pub struct HttpSettings {
    #[builder(into)]
    pub base_url: String,
    #[builder(into)]
    pub token: String,
    #[builder(default = Duration::from_secs(10))]
    pub connect_timeout: Duration,
    #[builder(default = Duration::from_secs(60))]
    pub request_timeout: Duration,
    #[builder(into, default = format!("zenduty-provider/{}", env!("CARGO_PKG_VERSION")))]
    pub user_agent: String,
}

pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpTransport {
    pub fn new(settings: HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(&settings.user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut builder = self
            .client
            .request(request.method, self.url(&request.path))
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(ACCEPT, "application/json");

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(value) => value,
                // Error pages are not always JSON; keep the text for the message.
                Err(_) if !(200..300).contains(&status) => {
                    Value::String(String::from_utf8_lossy(&bytes).into_owned())
                }
                Err(err) => return Err(ClientError::Json(err)),
            }
        };

        debug!(status, "Received response");
        Ok(ApiResponse { status, body })
    }
}
