// src/config.rs
use std::env;

use anyhow::Context;

const DEFAULT_API_BASE_URL: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation";
const DEFAULT_MODEL: &str = "qwen-vl-plus";
const DEFAULT_PORT: u16 = 3000;

/// Read-only process configuration, resolved once at startup and handed to
/// the handlers through the application state.
#[derive(Clone)]
pub struct Config {
    pub api_base_url: String,
    pub api_key: String,
    pub model: String,
    pub port: u16,
}

impl Config {
    /// Build the config from environment variables. `API_KEY` is the only
    /// required one; everything else falls back to a default.
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = env::var("API_KEY")
            .context("API_KEY must be set (e.g. in a .env file)")?;

        let api_base_url =
            env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let model = env::var("MODEL_NAME").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {raw}"))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            api_base_url,
            api_key,
            model,
            port,
        })
    }
}
