//! Keep the audience manager informed of our identities, and expose a trigger for hosts.
use std::sync::Arc;

use axum::Router;
use envconfig::Envconfig;
use eyre::Result;
use tokio::signal;

use identity_sync::api::add_routes;
use identity_sync::client::IdentitySyncClient;
use identity_sync::config::Config;
use kit_common::attributes::JsonFileAttributeStore;
use kit_common::metrics::{serve, setup_metrics_routes};

async fn shutdown() {
    let mut term = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            tracing::error!("failed to register SIGTERM handler: {}", e);
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!("failed to listen for ctrl-c: {}", e);
            }
            return;
        }
    };

    tokio::select! {
        _ = term.recv() => {},
        _ = signal::ctrl_c() => {},
    };

    tracing::info!("shutting down identity-sync");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::init_from_env()?;

    let store = JsonFileAttributeStore::open(&config.attribute_store_path)?;
    let client = IdentitySyncClient::new(config.sync_settings(), Arc::new(store))?;

    // Pick up a cloud id as soon as we start, like a host does on kit creation.
    client.request_sync();

    let app = add_routes(Router::new(), client);
    let app = setup_metrics_routes(app, "identity-sync")
        .map_err(|e| eyre::eyre!("failed to install metrics recorder: {}", e))?;

    if let Err(e) = serve(app, &config.bind(), shutdown()).await {
        tracing::error!("failed to start identity-sync http server, {}", e);
        return Err(e.into());
    }

    Ok(())
}
