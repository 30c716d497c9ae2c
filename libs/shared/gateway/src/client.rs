use std::sync::Arc;

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, Response,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use shared_config::PortalConfig;

use crate::error::ApiError;

/// Where the gateway gets the bearer token from. Read once per request, at
/// request-construction time.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;

    /// Called when the API rejects the token with a 401.
    fn revoke(&self);
}

/// Token source for calls made before any session exists.
pub struct NoToken;

impl TokenSource for NoToken {
    fn token(&self) -> Option<String> {
        None
    }

    fn revoke(&self) {}
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl ApiClient {
    pub fn new(config: &PortalConfig, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = self.tokens.token() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Stored token is not a valid header value, sending request without it"),
            }
        }

        headers
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url).headers(self.get_headers());

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);

            if status.as_u16() == 401 {
                warn!("Token rejected by the API, clearing session");
                self.tokens.revoke();
            }

            return Err(ApiError::from_response(status.as_u16(), &error_text));
        }

        Ok(response)
    }

    /// Sends a request and decodes the JSON response body.
    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body).await?;
        let text = response.text().await?;
        let data = serde_json::from_str::<T>(&text)?;
        Ok(data)
    }

    /// For endpoints that answer with plain text (OTP flow, password change).
    pub async fn request_text(&self, method: Method, path: &str, body: Option<Value>) -> Result<String, ApiError> {
        let response = self.send(method, path, body).await?;
        Ok(response.text().await?)
    }

    /// For endpoints whose body, if any, is ignored (DELETE, status toggles).
    pub async fn execute(&self, method: Method, path: &str, body: Option<Value>) -> Result<(), ApiError> {
        self.send(method, path, body).await?;
        Ok(())
    }
}
