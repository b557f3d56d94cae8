//! Snapshot publisher: validated snapshots in, keyed log appends out.

use crate::error::PublishError;
use codec::encode_snapshot;
use feedlog::{LogAdmin, LogError, Record, TopicConfig, TopicWriter};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use types::Snapshot;

/// Produces a writer for a topic. Implementations wrap whatever log backend
/// the process runs against.
pub type WriterFactory =
    Arc<dyn Fn(&str) -> Result<Arc<dyn TopicWriter>, LogError> + Send + Sync>;

/// Ensure the destination topic exists. Provisioning is idempotent: a topic
/// that is already present is success.
pub async fn ensure_topic(admin: &dyn LogAdmin, config: &TopicConfig) -> Result<(), PublishError> {
    if config.name.is_empty() {
        return Err(PublishError::TopicRequired);
    }
    match admin.create_topic(config).await {
        Ok(()) => {
            info!(topic = %config.name, partitions = config.partitions, "topic created");
            Ok(())
        }
        Err(err) if err.is_already_exists() => {
            debug!(topic = %config.name, "topic already exists");
            Ok(())
        }
        Err(source) => Err(PublishError::Provisioning {
            topic: config.name.clone(),
            source,
        }),
    }
}

/// Appends encoded snapshots to per-topic writers, creating each writer
/// lazily on first use and reusing it afterwards.
pub struct Publisher {
    factory: WriterFactory,
    default_topic: String,
    writers: Mutex<HashMap<String, Arc<dyn TopicWriter>>>,
}

impl Publisher {
    pub fn new(factory: WriterFactory, default_topic: impl Into<String>) -> Self {
        Self {
            factory,
            default_topic: default_topic.into(),
            writers: Mutex::new(HashMap::new()),
        }
    }

    /// Encode and append one snapshot, keyed by instrument code so all
    /// updates for one instrument stay ordered. The record's event time is
    /// the snapshot's own timestamp, not publish time.
    pub async fn publish(&self, snapshot: &Snapshot) -> Result<(), PublishError> {
        self.publish_to(&self.default_topic, snapshot).await
    }

    /// Like [`publish`](Self::publish) but to an explicit topic. An empty
    /// topic fails before any writer or network interaction.
    pub async fn publish_to(&self, topic: &str, snapshot: &Snapshot) -> Result<(), PublishError> {
        if topic.is_empty() {
            return Err(PublishError::TopicRequired);
        }
        if !snapshot.is_valid() {
            return Err(PublishError::InvalidSnapshot {
                code: snapshot.code.clone(),
            });
        }

        let payload = encode_snapshot(snapshot)?;
        let writer = self.writer_for(topic)?;
        writer
            .append(Record {
                key: snapshot.code.clone().into_bytes(),
                payload,
                timestamp_ms: snapshot.timestamp_ms,
            })
            .await
            .map_err(|source| PublishError::Append {
                topic: topic.to_string(),
                source,
            })
    }

    /// Check-create-insert under one lock so concurrent first use of a topic
    /// builds exactly one writer.
    fn writer_for(&self, topic: &str) -> Result<Arc<dyn TopicWriter>, PublishError> {
        let mut writers = self.writers.lock();
        if let Some(writer) = writers.get(topic) {
            return Ok(writer.clone());
        }
        let writer = (self.factory)(topic).map_err(|source| PublishError::Writer {
            topic: topic.to_string(),
            source,
        })?;
        writers.insert(topic.to_string(), writer.clone());
        debug!(topic, "writer created");
        Ok(writer)
    }

    /// Close all cached writers. Every writer is attempted even after a
    /// failure; the first error is returned.
    pub async fn close(&self) -> Result<(), PublishError> {
        let writers: Vec<(String, Arc<dyn TopicWriter>)> =
            self.writers.lock().drain().collect();

        let mut first_error = None;
        for (topic, writer) in writers {
            if let Err(source) = writer.close().await {
                if first_error.is_none() {
                    first_error = Some(PublishError::Close { topic, source });
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedlog::{MemoryLog, TopicReader};

    async fn provisioned(log: &MemoryLog, topic: &str) {
        log.create_topic(&TopicConfig::new(topic, 1, 1)).await.unwrap();
    }

    fn memory_factory(log: &MemoryLog) -> WriterFactory {
        let log = log.clone();
        Arc::new(move |topic| Ok(Arc::new(log.writer(topic)?) as Arc<dyn TopicWriter>))
    }

    fn valid_snapshot(code: &str, timestamp_ms: i64) -> Snapshot {
        Snapshot {
            code: code.to_string(),
            board: "MAIN".to_string(),
            timestamp_ms,
            ..Snapshot::default()
        }
    }

    #[tokio::test]
    async fn empty_topic_fails_before_any_writer_is_created() {
        let log = MemoryLog::new();
        let publisher = Publisher::new(memory_factory(&log), "");

        let err = publisher
            .publish(&valid_snapshot("41I1F8000", 1_000))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::TopicRequired));
        assert!(publisher.writers.lock().is_empty());
    }

    #[tokio::test]
    async fn invalid_snapshot_is_rejected() {
        let log = MemoryLog::new();
        provisioned(&log, "ticks").await;
        let publisher = Publisher::new(memory_factory(&log), "ticks");

        let err = publisher
            .publish(&valid_snapshot("", 1_000))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::InvalidSnapshot { .. }));
    }

    #[tokio::test]
    async fn publish_appends_keyed_record_with_event_time() {
        let log = MemoryLog::new();
        provisioned(&log, "ticks").await;
        let publisher = Publisher::new(memory_factory(&log), "ticks");

        publisher
            .publish(&valid_snapshot("41I1F8000", 1_754_535_567_282))
            .await
            .unwrap();

        let mut reader = log.reader("ticks", "test").unwrap();
        let delivery = reader.fetch().await.unwrap();
        assert_eq!(delivery.record.key, b"41I1F8000".to_vec());
        assert_eq!(delivery.record.timestamp_ms, 1_754_535_567_282);
        let decoded = codec::decode_snapshot(&delivery.record.payload).unwrap();
        assert_eq!(decoded.code, "41I1F8000");
    }

    #[tokio::test]
    async fn writers_are_cached_per_topic() {
        let log = MemoryLog::new();
        provisioned(&log, "ticks").await;
        let publisher = Publisher::new(memory_factory(&log), "ticks");

        publisher.publish(&valid_snapshot("A1", 1)).await.unwrap();
        publisher.publish(&valid_snapshot("B2", 2)).await.unwrap();
        assert_eq!(publisher.writers.lock().len(), 1);
    }

    #[tokio::test]
    async fn ensure_topic_treats_existing_as_success() {
        let log = MemoryLog::new();
        let config = TopicConfig::new("ticks", 4, 1);
        ensure_topic(&log, &config).await.unwrap();
        // Second call hits TopicExists and still succeeds.
        ensure_topic(&log, &config).await.unwrap();
    }

    #[tokio::test]
    async fn ensure_topic_requires_a_name() {
        let log = MemoryLog::new();
        let err = ensure_topic(&log, &TopicConfig::new("", 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::TopicRequired));
    }

    #[tokio::test]
    async fn close_drains_the_cache() {
        let log = MemoryLog::new();
        provisioned(&log, "ticks").await;
        let publisher = Publisher::new(memory_factory(&log), "ticks");

        publisher.publish(&valid_snapshot("A1", 1)).await.unwrap();
        publisher.close().await.unwrap();
        assert!(publisher.writers.lock().is_empty());
    }
}
