use std::{env, path::PathBuf, time::Duration};

use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const TOKEN_FILE_NAME: &str = ".smartserve_token";
pub const DEFAULT_OTP_COOLDOWN_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: Url,
    pub token_path: PathBuf,
    pub otp_cooldown: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_url = env::var("CANTEEN_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let token_path = env::var("CANTEEN_TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_token_path());
        let cooldown = env::var("CANTEEN_OTP_COOLDOWN_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_OTP_COOLDOWN_SECS);
        Ok(Self {
            api_url: parse_base_url(&api_url)?,
            token_path,
            otp_cooldown: Duration::from_secs(cooldown),
        })
    }

    pub fn with_api_url(mut self, api_url: &str) -> anyhow::Result<Self> {
        self.api_url = parse_base_url(api_url)?;
        Ok(self)
    }
}

/// Base URLs always end with `/` so relative joins keep the `/api` prefix.
pub fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let trimmed = raw.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Ok(Url::parse(&normalized)?)
}

fn default_token_path() -> PathBuf {
    env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(TOKEN_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_keeps_path_prefix() {
        let url = parse_base_url("http://localhost:5000/api").unwrap();
        assert_eq!(url.join("foods").unwrap().as_str(), "http://localhost:5000/api/foods");
    }

    #[test]
    fn rejects_garbage_urls() {
        assert!(parse_base_url("not a url").is_err());
    }
}
