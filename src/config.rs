// src/config.rs
use anyhow::{bail, Result};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Everything the app needs to talk to Gemini, resolved once at startup.
#[derive(Clone)]
pub struct Settings {
    pub api_key: String,
    pub model: String,
    pub api_base_url: String,
    pub request_timeout: Duration,
}

// Hand-written so the key never ends up in a log line.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Overrides coming from the command line. Anything left as `None` falls
/// back to the environment and then to the built-in default.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Settings {
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        Self::resolve_with(overrides, |name| std::env::var(name).ok())
    }

    /// Same as [`Settings::resolve`] with the environment lookup injected.
    pub fn resolve_with<F>(overrides: Overrides, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = overrides
            .api_key
            .or_else(|| API_KEY_VARS.iter().find_map(|name| env(name)))
            .map(|key| key.trim().to_string())
            .unwrap_or_default();

        if api_key.is_empty() {
            bail!(
                "No Gemini API key configured. Set GEMINI_API_KEY (or API_KEY) or pass --api-key."
            );
        }

        let model = overrides
            .model
            .or_else(|| env("GEMINI_MODEL"))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_base_url = overrides
            .api_url
            .or_else(|| env("GEMINI_API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs = overrides.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            bail!("--timeout-secs must be greater than zero");
        }

        Ok(Self {
            api_key,
            model,
            api_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
