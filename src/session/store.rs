use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;

use super::{claims::Session, token::TokenStore};
use crate::{
    client::ApiClient,
    dto::auth::{OtpSent, RegisterRequest},
    error::AppResult,
    models::User,
    response::ApiResponse,
    services::auth_service,
};

/// Owns the authentication token and the identity derived from it.
#[derive(Debug, Clone)]
pub struct SessionStore {
    api: ApiClient,
    tokens: TokenStore,
    current: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    pub fn new(api: ApiClient, tokens: TokenStore) -> Self {
        Self {
            api,
            tokens,
            current: Arc::new(RwLock::new(None)),
        }
    }

    pub fn restore(&self) -> Option<Session> {
        self.restore_at(Utc::now())
    }

    /// Restores the persisted session as of `now`.
    ///
    /// Expired or undecodable tokens are discarded; nothing here is fatal.
    pub fn restore_at(&self, now: DateTime<Utc>) -> Option<Session> {
        let token = match self.tokens.load() {
            Ok(Some(token)) => token,
            Ok(None) => {
                self.set_current(None);
                return None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not read persisted token");
                self.set_current(None);
                return None;
            }
        };

        match Session::from_token(token.expose_secret()) {
            Ok(session) if session.is_valid_at(now) => {
                tracing::debug!(user_id = %session.user_id, role = session.role.as_str(), "session restored");
                self.set_current(Some(session.clone()));
                Some(session)
            }
            Ok(session) => {
                tracing::info!(expired_at = %session.token_expiry, "stored token expired, discarding");
                self.discard();
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "discarding malformed token");
                self.discard();
                None
            }
        }
    }

    pub async fn register(&self, payload: RegisterRequest) -> AppResult<ApiResponse<User>> {
        auth_service::register_user(&self.api, payload).await
    }

    /// Requests a login code for a customer account.
    pub async fn login(&self, email: &str) -> AppResult<ApiResponse<OtpSent>> {
        auth_service::send_otp(&self.api, email).await
    }

    /// Requests a login code through the admin endpoint.
    pub async fn admin_login(&self, email: &str) -> AppResult<ApiResponse<OtpSent>> {
        auth_service::send_admin_otp(&self.api, email).await
    }

    /// Exchanges a one-time code for a token. The session is only set on success.
    pub async fn verify_otp(&self, email: &str, code: &str) -> AppResult<Session> {
        let token = auth_service::verify_otp(&self.api, email, code)
            .await?
            .into_data()?
            .access_token;
        let session = Session::from_token(&token)?;

        self.tokens.set(&token)?;
        self.set_current(Some(session.clone()));
        tracing::info!(user_id = %session.user_id, role = session.role.as_str(), "logged in");
        Ok(session)
    }

    pub fn logout(&self) {
        if self.current().is_some() {
            tracing::info!("logged out");
        }
        self.discard();
    }

    pub fn current(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Session present and token still persisted; a torn state counts as logged out.
    pub fn is_authenticated(&self) -> bool {
        self.current().is_some() && self.tokens.is_present()
    }

    pub fn is_admin(&self) -> bool {
        self.current().is_some_and(|s| s.is_admin())
    }

    pub fn has_token(&self) -> bool {
        self.tokens.is_present()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn discard(&self) {
        self.tokens.clear();
        self.set_current(None);
    }

    fn set_current(&self, session: Option<Session>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = session;
    }
}
