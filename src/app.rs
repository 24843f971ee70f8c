use std::sync::Arc;

use anyhow::{Context, Result};
use url::Url;

use crate::api::config::ClientConfig;
use crate::api::http::HttpNewsApi;
use crate::api::NewsApi;
use crate::session::{SessionGate, TokenSession};

/// Shared handles every subcommand runs against.
pub struct App {
    pub cfg: ClientConfig,
    pub session: Arc<TokenSession>,
    pub api: Arc<dyn NewsApi>,
}

impl App {
    pub fn new(cfg: ClientConfig) -> Result<Self> {
        let base = Url::parse(&cfg.base_url).with_context(|| format!("invalid API url {:?}", cfg.base_url))?;
        if !matches!(base.scheme(), "http" | "https") {
            anyhow::bail!("API url must be http(s), got {}", base.scheme());
        }
        let session = Arc::new(TokenSession::new(cfg.token.clone()));
        let gate: Arc<dyn SessionGate> = session.clone();
        let api: Arc<dyn NewsApi> = Arc::new(HttpNewsApi::new(cfg.clone(), gate)?);
        Ok(Self { cfg, session, api })
    }
}
