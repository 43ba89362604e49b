use std::{fs, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const SETTINGS_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Layers `dashboard.toml` and the process environment over the defaults.
pub fn load_settings() -> Settings {
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    load_settings_from(file.as_deref(), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file_contents {
        match toml::from_str::<FileSettings>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.api_url {
                    settings.api_url = v;
                }
                if let Some(secs) = file_cfg.request_timeout_secs {
                    settings.request_timeout = Duration::from_secs(secs);
                }
            }
            Err(error) => {
                tracing::warn!(file = SETTINGS_FILE, %error, "ignoring unreadable settings file");
            }
        }
    }

    if let Some(v) = env("SPY_CATS_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout = Duration::from_secs(parsed);
        }
    }

    settings
}

/// Validates the API origin and strips any trailing slash so routes can be
/// appended directly.
pub fn normalize_api_url(raw_api_url: &str) -> anyhow::Result<String> {
    let raw_api_url = raw_api_url.trim();
    if raw_api_url.is_empty() {
        return Ok(DEFAULT_API_URL.to_string());
    }

    let parsed =
        Url::parse(raw_api_url).with_context(|| format!("invalid api url '{raw_api_url}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!(
            "unsupported api url scheme '{}' in '{raw_api_url}'",
            parsed.scheme()
        );
    }

    Ok(raw_api_url.trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
