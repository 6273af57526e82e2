// src/state.rs
use std::sync::Arc;

use crate::config::Config;
use crate::services::upstream::UpstreamClient;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub upstream: UpstreamClient,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            upstream: UpstreamClient::new(config),
        }
    }
}
