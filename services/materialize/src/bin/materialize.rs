//! Materialize Service Main Entry Point
//!
//! Consumes encoded snapshots from the feed log and writes them into the
//! time-series store until interrupted.

use anyhow::{Context, Result};
use feedlog::{LogAdmin, MemoryLog, TopicConfig};
use materialize::{Consumer, MaterializeConfig};
use std::sync::Arc;
use store::{SnapshotStore, StoreClient, StoreConfig};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = MaterializeConfig::from_env();
    info!(
        topic = %config.topic,
        group = %config.group,
        store = %config.store_addr,
        "starting materialize"
    );

    let client = StoreClient::connect(StoreConfig {
        addr: config.store_addr.clone(),
        ..StoreConfig::default()
    })
    .await
    .with_context(|| format!("connect to store at {}", config.store_addr))?;
    let store = SnapshotStore::new(Arc::new(client), &config.key_prefix);

    let log = MemoryLog::new();
    if let Err(err) = log
        .create_topic(&TopicConfig::new(&config.topic, 1, 1))
        .await
    {
        if !err.is_already_exists() {
            return Err(err).context("topic provisioning failed");
        }
    }
    let reader = log
        .reader(&config.topic, &config.group)
        .context("open topic reader")?;
    let mut consumer = Consumer::new(Box::new(reader), store);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    if let Err(err) = consumer.run(shutdown_rx).await {
        error!(%err, "consume loop failed");
        return Err(err.into());
    }
    Ok(())
}
