//! `safeguard console` (the default command): the interactive approval panel.

use crate::api::SafeguardApi;
use crate::cli::connect;
use crate::config::Config;
use crate::console::{self, Page, PageOptions};
use crate::store::Store;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Build the page for a configuration. Non-admin sessions are refused here,
/// before any request is made.
pub fn build_page(config: &Config, force_demo: bool) -> Result<Page> {
    let client: Arc<dyn SafeguardApi> = Arc::new(connect(config)?);
    let store = Store::new(client).with_deferred_limit(config.limits.deferred);
    let page = Page::new(
        store,
        config.session.clone(),
        PageOptions::from_config(config, force_demo),
    )?;
    Ok(page)
}

pub async fn run_console(config: &Config, force_demo: bool) -> Result<()> {
    let page = build_page(config, force_demo)?;
    page.store()
        .set_polling_enabled(config.polling.enabled)
        .await;
    page.store()
        .set_polling_interval(config.polling.interval())
        .await;

    info!(
        server = %config.server.base_url,
        user = config.session.actor(),
        "Opening Safeguard console"
    );
    console::run(page).await
}
