use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use taskflow_app::{
    AccountService, ApiClient, BoardService, ClientConfig, FileStore, HttpTaskApi, SessionContext,
};

use crate::Command;

mod handlers;

/// Everything a command needs, wired once per invocation.
pub struct AppContext {
    pub config: ClientConfig,
    pub account: AccountService,
    pub board: BoardService<HttpTaskApi>,
}

impl AppContext {
    fn build(config_path: Option<&Path>, api_url: Option<String>) -> Result<Self> {
        let config = ClientConfig::load(config_path)?.with_api_url(api_url)?;
        let storage_path = config.storage_path()?;
        let session = Arc::new(SessionContext::new(Arc::new(FileStore::new(storage_path))));
        let client = ApiClient::new(&config.api, session)
            .context("failed to initialise the HTTP client")?;
        Ok(Self {
            account: AccountService::new(client.clone()),
            board: BoardService::new(HttpTaskApi::new(client)),
            config,
        })
    }
}

pub async fn run(config_path: Option<&Path>, api_url: Option<String>, command: Command) -> Result<()> {
    let ctx = AppContext::build(config_path, api_url)?;
    handlers::run(command, &ctx).await
}
