//! Ingest Service Main Entry Point
//!
//! Streams a feed file into the log: parse, validate, encode, append.

use anyhow::{Context, Result};
use chrono::FixedOffset;
use feedlog::{MemoryLog, TopicConfig, TopicWriter};
use ingest::{ensure_topic, map_snapshot, IngestConfig, LadderParser, Publisher, WriterFactory};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = IngestConfig::from_env();
    info!(
        data_file = %config.data_file,
        topic = %config.topic,
        partitions = config.partitions,
        "starting ingest"
    );

    let offset = FixedOffset::east_opt(config.feed_utc_offset_hours * 3600)
        .context("feed UTC offset out of range")?;

    let log = MemoryLog::new();
    ensure_topic(
        &log,
        &TopicConfig::new(&config.topic, config.partitions, config.replication),
    )
    .await
    .context("topic provisioning failed")?;

    let factory: WriterFactory = {
        let log = log.clone();
        Arc::new(move |topic| Ok(Arc::new(log.writer(topic)?) as Arc<dyn TopicWriter>))
    };
    let publisher = Publisher::new(factory, &config.topic);
    let parser = LadderParser::new(offset);

    let file = File::open(&config.data_file)
        .await
        .with_context(|| format!("open feed file {}", config.data_file))?;
    let mut lines = BufReader::new(file).lines();

    let mut produced: u64 = 0;
    let mut skipped: u64 = 0;
    let mut line_no: u64 = 0;
    while let Some(line) = lines.next_line().await.context("read feed file")? {
        line_no += 1;

        let record = match parser.parse(&line) {
            Ok(Some(record)) => record,
            Ok(None) => continue,
            Err(err) => {
                warn!(line = line_no, %err, "skipping malformed line");
                skipped += 1;
                continue;
            }
        };
        let snapshot = match map_snapshot(&record) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(line = line_no, %err, "dropping unmappable record");
                skipped += 1;
                continue;
            }
        };
        match publisher.publish(&snapshot).await {
            Ok(()) => produced += 1,
            Err(err @ ingest::PublishError::Encode(_)) => {
                warn!(line = line_no, %err, "skipping unencodable snapshot");
                skipped += 1;
            }
            Err(err) => {
                // An append failure breaks the ordering contract; stop here.
                error!(line = line_no, %err, "publish failed");
                publisher.close().await.ok();
                return Err(err.into());
            }
        }
    }

    publisher.close().await.context("close writers")?;
    info!(produced, skipped, "ingest finished");
    Ok(())
}
