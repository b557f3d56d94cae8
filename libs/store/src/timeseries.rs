//! Series lifecycle and point/range access.
//!
//! Thin command construction over the [`CommandRunner`] seam. Creation is
//! declare-or-noop: the engine's "key already exists" error is success, and
//! because labels are kept in a `BTreeMap` every (re-)declaration emits them
//! in ascending key order, so repeated declarations are byte-identical.

use crate::{Command, CommandRunner, Reply, StoreError};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Metadata for a series declaration.
#[derive(Debug, Clone, Default)]
pub struct SeriesOptions {
    /// Sample retention window; zero means engine default.
    pub retention: Duration,
    /// Engine duplicate policy (e.g. "last", "block"); uppercased on the wire.
    pub duplicate_policy: Option<String>,
    /// Engine chunk size hint in bytes.
    pub chunk_size: Option<usize>,
    /// Label set; emitted sorted by key.
    pub labels: BTreeMap<String, String>,
}

/// Options narrowing a range query.
#[derive(Debug, Clone, Default)]
pub struct RangeOptions {
    /// Maximum number of samples to return.
    pub count: Option<u64>,
}

/// One data point returned from a range query, normalized to UTC
/// millisecond precision.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Series create/append/range operations.
#[derive(Clone)]
pub struct TimeSeries {
    runner: Arc<dyn CommandRunner>,
}

impl TimeSeries {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Declare a series. If it already exists this is a success, not an
    /// error; existing data is never mutated.
    pub async fn create(&self, key: &str, opts: &SeriesOptions) -> Result<(), StoreError> {
        let mut cmd = Command::new("TS.CREATE").arg(key);
        if !opts.retention.is_zero() {
            cmd = cmd.arg("RETENTION").arg_int(opts.retention.as_millis() as i64);
        }
        if let Some(policy) = &opts.duplicate_policy {
            cmd = cmd.arg("DUPLICATE_POLICY").arg(policy.to_uppercase());
        }
        if let Some(chunk) = opts.chunk_size {
            cmd = cmd.arg("CHUNK_SIZE").arg_int(chunk as i64);
        }
        cmd = append_labels(cmd, &opts.labels);

        match self.runner.run(cmd).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_series_exists() => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Append one sample. `None` timestamp lets the engine assign the
    /// current time.
    pub async fn add(
        &self,
        key: &str,
        at: Option<DateTime<Utc>>,
        value: f64,
        labels: &BTreeMap<String, String>,
    ) -> Result<(), StoreError> {
        let mut cmd = Command::new("TS.ADD").arg(key);
        cmd = match at {
            Some(ts) => cmd.arg_int(ts.timestamp_millis()),
            None => cmd.arg("*"),
        };
        cmd = cmd.arg_float(value);
        cmd = append_labels(cmd, labels);
        self.runner.run(cmd).await?;
        Ok(())
    }

    /// Relative update, used by counters outside the ingestion path.
    pub async fn incr_by(
        &self,
        key: &str,
        delta: f64,
        at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let mut cmd = Command::new("TS.INCRBY").arg(key).arg_float(delta);
        if let Some(ts) = at {
            cmd = cmd.arg("TIMESTAMP").arg_int(ts.timestamp_millis());
        }
        self.runner.run(cmd).await?;
        Ok(())
    }

    /// Retrieve samples between the bounds, inclusive. `None` bounds mean
    /// earliest/latest available.
    pub async fn range(
        &self,
        key: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        opts: &RangeOptions,
    ) -> Result<Vec<Sample>, StoreError> {
        let mut cmd = Command::new("TS.RANGE")
            .arg(key)
            .arg(bound(from, "-"))
            .arg(bound(to, "+"));
        if let Some(count) = opts.count {
            cmd = cmd.arg("COUNT").arg_int(count as i64);
        }
        let name = cmd.name();

        let reply = self.runner.run(cmd).await?;
        let items = match reply {
            Reply::Array(items) => items,
            other => {
                return Err(StoreError::UnexpectedReply {
                    command: name,
                    reply: other.describe(),
                })
            }
        };

        let mut samples = Vec::with_capacity(items.len());
        for item in items {
            let entry = match &item {
                Reply::Array(entry) if entry.len() == 2 => entry,
                other => {
                    return Err(StoreError::UnexpectedReply {
                        command: name.clone(),
                        reply: other.describe(),
                    })
                }
            };
            let millis = entry[0].as_i64().ok_or_else(|| StoreError::UnexpectedReply {
                command: name.clone(),
                reply: entry[0].describe(),
            })?;
            let value = entry[1].as_f64().ok_or_else(|| StoreError::UnexpectedReply {
                command: name.clone(),
                reply: entry[1].describe(),
            })?;
            samples.push(Sample {
                timestamp: Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
                    StoreError::UnexpectedReply {
                        command: name.clone(),
                        reply: format!("timestamp {millis} out of range"),
                    }
                })?,
                value,
            });
        }
        Ok(samples)
    }
}

fn bound(at: Option<DateTime<Utc>>, open: &'static str) -> String {
    match at {
        Some(ts) => ts.timestamp_millis().to_string(),
        None => open.to_string(),
    }
}

fn append_labels(mut cmd: Command, labels: &BTreeMap<String, String>) -> Command {
    if labels.is_empty() {
        return cmd;
    }
    cmd = cmd.arg("LABELS");
    for (key, value) in labels {
        cmd = cmd.arg(key).arg(value);
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::RecordingRunner;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn create_emits_sorted_labels() {
        let runner = Arc::new(RecordingRunner::new());
        let series = TimeSeries::new(runner.clone());
        let opts = SeriesOptions {
            retention: Duration::from_secs(60),
            duplicate_policy: Some("last".to_string()),
            labels: labels(&[("metric", "price"), ("board", "MAIN"), ("code", "VN30F1M")]),
            ..SeriesOptions::default()
        };
        series.create("markets:vn30f1m:price", &opts).await.unwrap();

        assert_eq!(
            runner.command_lines(),
            vec![
                "TS.CREATE markets:vn30f1m:price RETENTION 60000 DUPLICATE_POLICY LAST \
                 LABELS board MAIN code VN30F1M metric price"
            ]
        );
    }

    #[tokio::test]
    async fn create_twice_with_identical_options_is_idempotent() {
        let runner = Arc::new(RecordingRunner::new());
        runner.push_reply(Ok(Reply::Simple("OK".to_string())));
        runner.push_reply(Err(StoreError::Command {
            command: "TS.CREATE".to_string(),
            message: "TSDB: key already exists".to_string(),
        }));

        let series = TimeSeries::new(runner.clone());
        let opts = SeriesOptions {
            labels: labels(&[("metric", "price")]),
            ..SeriesOptions::default()
        };
        series.create("k", &opts).await.unwrap();
        series.create("k", &opts).await.unwrap();

        // Both declarations are byte-identical on the wire.
        let lines = runner.command_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], lines[1]);
    }

    #[tokio::test]
    async fn create_propagates_other_errors() {
        let runner = Arc::new(RecordingRunner::new());
        runner.push_reply(Err(StoreError::Command {
            command: "TS.CREATE".to_string(),
            message: "ERR wrong number of arguments".to_string(),
        }));
        let series = TimeSeries::new(runner);
        let err = series
            .create("k", &SeriesOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Command { .. }));
    }

    #[tokio::test]
    async fn add_uses_star_for_unset_timestamp() {
        let runner = Arc::new(RecordingRunner::new());
        let series = TimeSeries::new(runner.clone());
        series
            .add("k", None, 1.5, &BTreeMap::new())
            .await
            .unwrap();
        series
            .add(
                "k",
                Some(Utc.timestamp_millis_opt(1_000).unwrap()),
                2.0,
                &BTreeMap::new(),
            )
            .await
            .unwrap();
        assert_eq!(
            runner.command_lines(),
            vec!["TS.ADD k * 1.5", "TS.ADD k 1000 2"]
        );
    }

    #[tokio::test]
    async fn incr_by_appends_optional_timestamp() {
        let runner = Arc::new(RecordingRunner::new());
        let series = TimeSeries::new(runner.clone());
        series.incr_by("counter", 3.0, None).await.unwrap();
        series
            .incr_by("counter", 1.0, Some(Utc.timestamp_millis_opt(2_000).unwrap()))
            .await
            .unwrap();
        assert_eq!(
            runner.command_lines(),
            vec!["TS.INCRBY counter 3", "TS.INCRBY counter 1 TIMESTAMP 2000"]
        );
    }

    #[tokio::test]
    async fn range_decodes_samples_in_utc() {
        let runner = Arc::new(RecordingRunner::new());
        runner.push_reply(Ok(Reply::Array(vec![
            Reply::Array(vec![Reply::Integer(1_000), Reply::Bulk(b"1.5".to_vec())]),
            Reply::Array(vec![Reply::Integer(2_000), Reply::Bulk(b"2".to_vec())]),
        ])));
        let series = TimeSeries::new(runner.clone());

        let samples = series
            .range("k", None, None, &RangeOptions { count: Some(10) })
            .await
            .unwrap();
        assert_eq!(
            samples,
            vec![
                Sample {
                    timestamp: Utc.timestamp_millis_opt(1_000).unwrap(),
                    value: 1.5,
                },
                Sample {
                    timestamp: Utc.timestamp_millis_opt(2_000).unwrap(),
                    value: 2.0,
                },
            ]
        );
        assert_eq!(runner.command_lines(), vec!["TS.RANGE k - + COUNT 10"]);
    }

    #[tokio::test]
    async fn range_bounds_use_millis_when_set() {
        let runner = Arc::new(RecordingRunner::new());
        runner.push_reply(Ok(Reply::Array(vec![])));
        let series = TimeSeries::new(runner.clone());
        series
            .range(
                "k",
                Some(Utc.timestamp_millis_opt(5).unwrap()),
                Some(Utc.timestamp_millis_opt(9).unwrap()),
                &RangeOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(runner.command_lines(), vec!["TS.RANGE k 5 9"]);
    }

    #[tokio::test]
    async fn range_rejects_malformed_entries() {
        let runner = Arc::new(RecordingRunner::new());
        runner.push_reply(Ok(Reply::Array(vec![Reply::Integer(1)])));
        let series = TimeSeries::new(runner);
        let err = series
            .range("k", None, None, &RangeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnexpectedReply { .. }));
    }
}
