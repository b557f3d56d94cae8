//! In-process log implementation.
//!
//! Backs tests and single-node deployments with the same ordering and
//! delivery semantics the pipeline expects from a broker: per-partition
//! append order, key-hash partition assignment, committed offsets per
//! consumer group, and redelivery of uncommitted records after a reader is
//! reopened.

use crate::{
    partition_for_key, Delivery, LogAdmin, LogError, Record, TopicConfig, TopicReader, TopicWriter,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::trace;

struct Topic {
    name: String,
    partitions: Vec<Mutex<Vec<Record>>>,
    /// Committed next-read offset per partition, keyed by consumer group.
    groups: Mutex<HashMap<String, Vec<u64>>>,
    /// Wakes a blocked reader after an append. A single permit is enough:
    /// the fetch loop re-scans every partition each time it wakes.
    appended: Notify,
}

impl Topic {
    fn new(config: &TopicConfig) -> Self {
        let partitions = (0..config.partitions.max(1))
            .map(|_| Mutex::new(Vec::new()))
            .collect();
        Self {
            name: config.name.clone(),
            partitions,
            groups: Mutex::new(HashMap::new()),
            appended: Notify::new(),
        }
    }
}

/// An in-memory, partitioned, at-least-once log.
///
/// Cheap to clone; clones share the same topics.
#[derive(Clone, Default)]
pub struct MemoryLog {
    topics: Arc<Mutex<HashMap<String, Arc<Topic>>>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a writer for a provisioned topic.
    pub fn writer(&self, topic: &str) -> Result<MemoryWriter, LogError> {
        if topic.is_empty() {
            return Err(LogError::TopicRequired);
        }
        let topics = self.topics.lock();
        let inner = topics.get(topic).ok_or_else(|| LogError::UnknownTopic {
            topic: topic.to_string(),
        })?;
        Ok(MemoryWriter {
            topic: Arc::clone(inner),
            closed: AtomicBool::new(false),
        })
    }

    /// Open a reader for a provisioned topic, resuming from the group's
    /// committed offsets.
    pub fn reader(&self, topic: &str, group: &str) -> Result<MemoryReader, LogError> {
        if topic.is_empty() {
            return Err(LogError::TopicRequired);
        }
        let topics = self.topics.lock();
        let inner = topics.get(topic).ok_or_else(|| LogError::UnknownTopic {
            topic: topic.to_string(),
        })?;
        let positions = {
            let groups = inner.groups.lock();
            groups
                .get(group)
                .cloned()
                .unwrap_or_else(|| vec![0; inner.partitions.len()])
        };
        Ok(MemoryReader {
            topic: Arc::clone(inner),
            group: group.to_string(),
            positions,
            cursor: 0,
        })
    }
}

#[async_trait]
impl LogAdmin for MemoryLog {
    async fn create_topic(&self, config: &TopicConfig) -> Result<(), LogError> {
        if config.name.is_empty() {
            return Err(LogError::TopicRequired);
        }
        let mut topics = self.topics.lock();
        if topics.contains_key(&config.name) {
            return Err(LogError::TopicExists {
                topic: config.name.clone(),
            });
        }
        topics.insert(config.name.clone(), Arc::new(Topic::new(config)));
        Ok(())
    }
}

/// Writer handle onto one [`MemoryLog`] topic.
pub struct MemoryWriter {
    topic: Arc<Topic>,
    closed: AtomicBool,
}

#[async_trait]
impl TopicWriter for MemoryWriter {
    async fn append(&self, mut record: Record) -> Result<(), LogError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LogError::WriterClosed {
                topic: self.topic.name.clone(),
            });
        }
        if record.timestamp_ms == 0 {
            record.timestamp_ms = chrono::Utc::now().timestamp_millis();
        }
        let partition = partition_for_key(&record.key, self.topic.partitions.len() as u32);
        {
            let mut entries = self.topic.partitions[partition as usize].lock();
            entries.push(record);
            trace!(
                topic = %self.topic.name,
                partition,
                offset = entries.len() as u64 - 1,
                "appended record"
            );
        }
        self.topic.appended.notify_one();
        Ok(())
    }

    async fn close(&self) -> Result<(), LogError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// Reader handle onto one [`MemoryLog`] topic for a single consumer group.
pub struct MemoryReader {
    topic: Arc<Topic>,
    group: String,
    /// Next offset to read per partition. Starts from the group's committed
    /// offsets; advances on fetch, not on commit.
    positions: Vec<u64>,
    /// Round-robin cursor so no partition starves another.
    cursor: usize,
}

impl MemoryReader {
    fn try_next(&mut self) -> Option<Delivery> {
        let partitions = self.topic.partitions.len();
        for step in 0..partitions {
            let partition = (self.cursor + step) % partitions;
            let offset = self.positions[partition];
            let entries = self.topic.partitions[partition].lock();
            if (offset as usize) < entries.len() {
                let record = entries[offset as usize].clone();
                drop(entries);
                self.positions[partition] = offset + 1;
                self.cursor = (partition + 1) % partitions;
                return Some(Delivery {
                    topic: self.topic.name.clone(),
                    partition: partition as u32,
                    offset,
                    record,
                });
            }
        }
        None
    }
}

#[async_trait]
impl TopicReader for MemoryReader {
    async fn fetch(&mut self) -> Result<Delivery, LogError> {
        loop {
            if let Some(delivery) = self.try_next() {
                return Ok(delivery);
            }
            self.topic.appended.notified().await;
        }
    }

    async fn commit(&mut self, delivery: &Delivery) -> Result<(), LogError> {
        let partition = delivery.partition as usize;
        if partition >= self.topic.partitions.len() {
            return Err(LogError::UnknownPartition {
                topic: self.topic.name.clone(),
                partition: delivery.partition,
            });
        }
        let mut groups = self.topic.groups.lock();
        let offsets = groups
            .entry(self.group.clone())
            .or_insert_with(|| vec![0; self.topic.partitions.len()]);
        // Offsets only ever move forward.
        offsets[partition] = offsets[partition].max(delivery.offset + 1);
        trace!(
            topic = %self.topic.name,
            group = %self.group,
            partition,
            committed = offsets[partition],
            "committed offset"
        );
        Ok(())
    }
}
