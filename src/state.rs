use std::sync::Arc;

use url::Url;

use crate::{
    client::ApiClient,
    config::AppConfig,
    error::AppResult,
    session::{FileTokenStorage, SessionStore, TokenStorage, TokenStore},
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub api: ApiClient,
    pub session: SessionStore,
}

impl AppState {
    /// Wires the API client and session store around one shared token store.
    pub fn new(api_url: Url, storage: Arc<dyn TokenStorage>) -> AppResult<Self> {
        let tokens = TokenStore::new(storage);
        let api = ApiClient::new(api_url, tokens.clone())?;
        let session = SessionStore::new(api.clone(), tokens);
        Ok(Self { api, session })
    }

    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let storage = Arc::new(FileTokenStorage::new(&config.token_path));
        Self::new(config.api_url.clone(), storage)
    }
}
