//! HTTP client shared by the registry adapters
//!
//! One GET-and-decode loop with:
//! - Request timeout and a `deplift/<version>` User-Agent
//! - Optional bearer token per request (private npm registries)
//! - Exponential backoff on 429, transport errors and undecodable bodies
//! - Status codes mapped to `RegistryError` variants

use crate::error::RegistryError;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_USER_AGENT: &str = concat!("deplift/", env!("CARGO_PKG_VERSION"));

/// Retries after the first attempt
const MAX_RETRIES: u32 = 3;

/// First backoff delay; doubled after every failed attempt
const BASE_DELAY: Duration = Duration::from_millis(100);

/// Package and registry a request is made for, used in error messages
#[derive(Debug, Clone, Copy)]
struct Target<'a> {
    package: &'a str,
    registry: &'a str,
}

impl Target<'_> {
    fn network(&self, message: impl Into<String>) -> RegistryError {
        RegistryError::network_error(self.package, self.registry, message)
    }

    fn transport(&self, error: reqwest::Error) -> RegistryError {
        if error.is_timeout() {
            RegistryError::timeout(self.package, self.registry)
        } else {
            self.network(error.to_string())
        }
    }

    fn undecodable(&self, error: reqwest::Error) -> RegistryError {
        RegistryError::InvalidResponse {
            package: self.package.to_string(),
            registry: self.registry.to_string(),
            message: format!("failed to parse JSON: {}", error),
        }
    }

    /// Maps a non-success status to an error; `None` for 2xx
    fn status_error(&self, status: StatusCode) -> Option<RegistryError> {
        if status.is_success() {
            return None;
        }
        Some(match status {
            StatusCode::TOO_MANY_REQUESTS => RegistryError::rate_limit_exceeded(self.registry),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                RegistryError::AuthenticationError {
                    registry: self.registry.to_string(),
                    message: format!("HTTP {}", status),
                }
            }
            StatusCode::NOT_FOUND => RegistryError::package_not_found(self.package, self.registry),
            _ => self.network(format!("HTTP {}", status)),
        })
    }
}

/// Returns true for failures worth another attempt
fn is_retryable(error: &RegistryError) -> bool {
    matches!(
        error,
        RegistryError::RateLimitExceeded { .. }
            | RegistryError::Timeout { .. }
            | RegistryError::InvalidResponse { .. }
    ) || matches!(error, RegistryError::NetworkError { message, .. } if !message.starts_with("HTTP "))
}

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with a custom timeout and User-Agent
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                Target {
                    package: "",
                    registry: "HTTP client",
                }
                .network(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// GET `url` and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        package: &str,
        registry: &str,
    ) -> Result<T, RegistryError> {
        self.get_json_authorized(url, package, registry, None).await
    }

    /// Like [`HttpClient::get_json`], sending `token` as a bearer token
    pub async fn get_json_authorized<T: DeserializeOwned>(
        &self,
        url: &str,
        package: &str,
        registry: &str,
        token: Option<&str>,
    ) -> Result<T, RegistryError> {
        let target = Target { package, registry };
        let mut delay = BASE_DELAY;
        let mut attempt = 0;

        loop {
            let error = match self.attempt(url, token, target).await {
                Ok(parsed) => return Ok(parsed),
                Err(error) => error,
            };

            if attempt >= self.max_retries || !is_retryable(&error) {
                return Err(error);
            }
            tracing::debug!("{} (attempt {}), retrying in {:?}", error, attempt + 1, delay);
            tokio::time::sleep(delay).await;
            delay *= 2;
            attempt += 1;
        }
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        url: &str,
        token: Option<&str>,
        target: Target<'_>,
    ) -> Result<T, RegistryError> {
        let mut request = self.client.get(url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| target.transport(e))?;
        if let Some(error) = target.status_error(response.status()) {
            return Err(error);
        }
        response.json::<T>().await.map_err(|e| target.undecodable(e))
    }
}
