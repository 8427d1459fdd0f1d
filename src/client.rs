use std::fmt;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::{Serialize, de::DeserializeOwned};
use url::Url;

use crate::{
    error::{AppError, AppResult},
    response::{ApiResponse, ErrorBody},
    session::TokenStore,
};

const SESSION_EXPIRED: &str = "Session expired, please log in again";

/// HTTP access to the canteen REST backend.
///
/// Attaches the bearer token to every request and treats any 401 as session loss:
/// the stored token is cleared before the error reaches the caller.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    tokens: TokenStore,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: Url, tokens: TokenStore) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("canteen-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    /// Resolves `path` against the base URL, keeping its path prefix.
    pub fn url(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid endpoint '{path}': {e}")))
    }

    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> AppResult<ApiResponse<T>> {
        self.send(self.http.get(url)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> AppResult<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> AppResult<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, path, body).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> AppResult<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PATCH, path, body).await
    }

    pub async fn delete(&self, path: &str) -> AppResult<ApiResponse<serde_json::Value>> {
        let url = self.url(path)?;
        self.send(self.http.delete(url)).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> AppResult<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        self.send(self.http.request(method, url).json(body)).await
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> AppResult<ApiResponse<T>> {
        let builder = match self.tokens.get() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.bytes().await?;

        if status == StatusCode::UNAUTHORIZED {
            let message = error_message(&body).unwrap_or_else(|| SESSION_EXPIRED.to_string());
            if self.tokens.is_present() {
                tracing::warn!(path = %url, "received 401, clearing session token");
            }
            self.tokens.clear();
            return Err(AppError::Unauthorized(message));
        }

        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
            tracing::debug!(path = %url, status = %status, message = %message, "request rejected");
            return Err(AppError::Api { status, message });
        }

        let envelope: ApiResponse<T> = serde_json::from_slice(&body)?;
        if !envelope.success {
            return Err(AppError::Api {
                status,
                message: envelope.message,
            });
        }
        tracing::debug!(path = %url, status = %status, "request finished");
        Ok(envelope)
    }
}

fn error_message(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    let message = parsed.message.filter(|m| !m.is_empty())?;
    match parsed.errors {
        Some(errors) if !errors.is_null() => Some(format!("{message}: {errors}")),
        _ => Some(message),
    }
}
