//! The consume loop: fetch, decode, materialize, commit.

use crate::error::ConsumeError;
use codec::decode_snapshot;
use feedlog::TopicReader;
use store::SnapshotStore;
use tokio::sync::watch;
use tracing::{debug, info};

/// Drains one topic reader into the snapshot store.
pub struct Consumer {
    reader: Box<dyn TopicReader>,
    store: SnapshotStore,
}

impl Consumer {
    pub fn new(reader: Box<dyn TopicReader>, store: SnapshotStore) -> Self {
        Self { reader, store }
    }

    /// Run until the shutdown signal flips or an error occurs.
    ///
    /// The signal interrupts only the fetch wait; a record that has already
    /// been fetched is materialized and committed before the loop observes
    /// shutdown on its next iteration. Shutdown is a clean `Ok(())`.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), ConsumeError> {
        let mut consumed: u64 = 0;
        loop {
            if *shutdown.borrow() {
                info!(consumed, "consumer shut down");
                return Ok(());
            }

            let delivery = tokio::select! {
                fetched = self.reader.fetch() => fetched.map_err(ConsumeError::Fetch)?,
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // Sender dropped: nothing will ever flip the flag.
                        info!(consumed, "consumer shut down");
                        return Ok(());
                    }
                    continue;
                }
            };

            let snapshot = decode_snapshot(&delivery.record.payload)?;
            self.store.record(&snapshot).await?;
            self.reader
                .commit(&delivery)
                .await
                .map_err(ConsumeError::Commit)?;

            consumed += 1;
            debug!(
                code = %snapshot.code,
                partition = delivery.partition,
                offset = delivery.offset,
                "materialized snapshot"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use feedlog::{LogAdmin, MemoryLog, Record, TopicConfig, TopicWriter};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use store::{Command, CommandRunner, Reply, StoreError};
    use types::Snapshot;

    /// Records issued store commands and plays back scripted replies.
    struct RecordingRunner {
        commands: Mutex<Vec<Command>>,
        replies: Mutex<VecDeque<Result<Reply, StoreError>>>,
    }

    impl RecordingRunner {
        fn new() -> Self {
            Self {
                commands: Mutex::new(Vec::new()),
                replies: Mutex::new(VecDeque::new()),
            }
        }

        fn push_reply(&self, reply: Result<Reply, StoreError>) {
            self.replies.lock().unwrap().push_back(reply);
        }

        fn command_count(&self) -> usize {
            self.commands.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, command: Command) -> Result<Reply, StoreError> {
            self.commands.lock().unwrap().push(command);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Reply::Simple("OK".to_string())))
        }
    }

    async fn provisioned(log: &MemoryLog) {
        log.create_topic(&TopicConfig::new("ticks", 1, 1))
            .await
            .unwrap();
    }

    fn snapshot(code: &str, timestamp_ms: i64) -> Snapshot {
        Snapshot {
            code: code.to_string(),
            board: "MAIN".to_string(),
            timestamp_ms,
            ..Snapshot::default()
        }
    }

    async fn append(log: &MemoryLog, snapshot: &Snapshot) {
        let writer = log.writer("ticks").unwrap();
        writer
            .append(Record {
                key: snapshot.code.clone().into_bytes(),
                payload: codec::encode_snapshot(snapshot).unwrap(),
                timestamp_ms: snapshot.timestamp_ms,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn consumes_writes_and_commits() {
        let log = MemoryLog::new();
        provisioned(&log).await;
        append(&log, &snapshot("41I1F8000", 1_000)).await;

        let runner = Arc::new(RecordingRunner::new());
        let reader = Box::new(log.reader("ticks", "mat").unwrap());
        let mut consumer = Consumer::new(reader, SnapshotStore::new(runner.clone(), "ticks"));

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { consumer.run(rx).await });

        // Two commands per snapshot: dedup-set insert then stream append.
        tokio::time::timeout(std::time::Duration::from_secs(1), async {
            while runner.command_count() < 2 {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        tx.send(true).unwrap();
        handle.await.unwrap().unwrap();

        // The offset was committed: a reopened reader sees nothing.
        let mut reopened = log.reader("ticks", "mat").unwrap();
        let pending = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            reopened.fetch(),
        )
        .await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn undecodable_payload_is_fatal() {
        let log = MemoryLog::new();
        provisioned(&log).await;
        let writer = log.writer("ticks").unwrap();
        writer
            .append(Record {
                key: b"AAA".to_vec(),
                payload: b"\x01".to_vec(),
                timestamp_ms: 1,
            })
            .await
            .unwrap();

        let runner = Arc::new(RecordingRunner::new());
        let reader = Box::new(log.reader("ticks", "mat").unwrap());
        let mut consumer = Consumer::new(reader, SnapshotStore::new(runner.clone(), "ticks"));

        let (_tx, rx) = watch::channel(false);
        let err = consumer.run(rx).await.unwrap_err();
        assert!(matches!(err, ConsumeError::Decode(_)));
        // Nothing was written, and the offset stayed put: the record is
        // redelivered to a fresh reader of the same group.
        assert_eq!(runner.command_count(), 0);
        let mut reopened = log.reader("ticks", "mat").unwrap();
        let delivery = reopened.fetch().await.unwrap();
        assert_eq!(delivery.record.key, b"AAA".to_vec());
    }

    #[tokio::test]
    async fn store_failure_leaves_offset_uncommitted() {
        let log = MemoryLog::new();
        provisioned(&log).await;
        append(&log, &snapshot("41I1F8000", 1_000)).await;

        let runner = Arc::new(RecordingRunner::new());
        runner.push_reply(Err(store::StoreError::Command {
            command: "ZADD".to_string(),
            message: "ERR read only".to_string(),
        }));
        let reader = Box::new(log.reader("ticks", "mat").unwrap());
        let mut consumer = Consumer::new(reader, SnapshotStore::new(runner, "ticks"));

        let (_tx, rx) = watch::channel(false);
        let err = consumer.run(rx).await.unwrap_err();
        assert!(matches!(err, ConsumeError::StoreWrite(_)));

        // The record is redelivered to a fresh reader of the same group.
        let mut reopened = log.reader("ticks", "mat").unwrap();
        let delivery = reopened.fetch().await.unwrap();
        assert_eq!(delivery.record.key, b"41I1F8000".to_vec());
    }

    #[tokio::test]
    async fn shutdown_interrupts_an_idle_fetch() {
        let log = MemoryLog::new();
        provisioned(&log).await;

        let runner = Arc::new(RecordingRunner::new());
        let reader = Box::new(log.reader("ticks", "mat").unwrap());
        let mut consumer = Consumer::new(reader, SnapshotStore::new(runner, "ticks"));

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { consumer.run(rx).await });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("shutdown should unblock the fetch")
            .unwrap()
            .unwrap();
    }
}
