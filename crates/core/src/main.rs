use std::sync::Arc;

use anyhow::Context;
use pedant_core::config::BotCfg;
use pedant_core::pipeline::Pipeline;
use pedant_core::pipeline::filter::Blacklist;
use pedant_core::pipeline::selector::CorrectionSelector;
use pedant_core::runtime::Runtime;
use pedant_core::state::{JsonFileStore, StateStore};
use pedant_platform::client::Platform;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cfg = Arc::new(BotCfg::from_env());
    tracing::info!(?cfg, "configuration loaded");

    let platform: Arc<dyn Platform> = match pedant_platform::http::from_env(cfg.request_timeout()) {
        Some(client) => Arc::new(client.context("failed to build platform client")?),
        None => anyhow::bail!("no platform credentials: set PEDANT_CONSUMER_* and PEDANT_ACCESS_*"),
    };

    let blacklist = Blacklist::load(cfg.blacklist_path.as_deref())
        .context("failed to load blacklist")?;
    let selector = CorrectionSelector::from_seed(cfg.confirm_probability, cfg.rng_seed);
    let pipeline = Pipeline::new(selector, blacklist);

    let file_store = JsonFileStore::new(cfg.state_path.clone());
    tracing::info!(path = %file_store.path().display(), "restoring state");
    let store: Arc<dyn StateStore> = Arc::new(file_store);
    let mut runtime = match Runtime::boot(Arc::clone(&cfg), platform, store, pipeline).await {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "FATAL: could not restore state");
            return Err(e).context("failed to restore state");
        }
    };

    runtime.run().await;
    Ok(())
}

/// JSON lines when `PEDANT_LOG_JSON` is set, human-readable otherwise.
/// Filter via `RUST_LOG`, defaulting to `info`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var_os("PEDANT_LOG_JSON").is_some() {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}
