//! Scalar telemetry series, independent of the ingestion path.
//!
//! Telemetry producers share the store wrapper with the snapshot pipeline
//! but write to their own namespace. Series are declared lazily before each
//! append; declaration is idempotent so this is safe to repeat.

use crate::{series_key, SeriesOptions, StoreError, TimeSeries};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

const DEFAULT_RETENTION: Duration = Duration::from_secs(90 * 24 * 60 * 60);

/// Records retention-bounded scalar metrics under
/// `<namespace>:<sanitized id>:<metric>` keys.
#[derive(Clone)]
pub struct Telemetry {
    series: TimeSeries,
    namespace: String,
    retention: Duration,
}

impl Telemetry {
    /// Zero retention applies the 90 day default window.
    pub fn new(series: TimeSeries, namespace: impl Into<String>, retention: Duration) -> Self {
        Self {
            series,
            namespace: namespace.into(),
            retention: if retention.is_zero() {
                DEFAULT_RETENTION
            } else {
                retention
            },
        }
    }

    /// Append an absolute sample, declaring the series first.
    pub async fn record_gauge(
        &self,
        id: &str,
        metric: &str,
        at: Option<DateTime<Utc>>,
        value: f64,
        labels: BTreeMap<String, String>,
    ) -> Result<(), StoreError> {
        let key = series_key(&self.namespace, id, metric);
        let mut labels = labels;
        labels.insert("metric".to_string(), metric.to_string());
        self.series
            .create(
                &key,
                &SeriesOptions {
                    retention: self.retention,
                    labels,
                    ..SeriesOptions::default()
                },
            )
            .await?;
        self.series.add(&key, at, value, &BTreeMap::new()).await
    }

    /// Bump a counter by `delta`, declaring the series first.
    pub async fn incr_counter(&self, id: &str, metric: &str, delta: f64) -> Result<(), StoreError> {
        let key = series_key(&self.namespace, id, metric);
        let mut labels = BTreeMap::new();
        labels.insert("metric".to_string(), metric.to_string());
        self.series
            .create(
                &key,
                &SeriesOptions {
                    retention: self.retention,
                    labels,
                    ..SeriesOptions::default()
                },
            )
            .await?;
        self.series.incr_by(&key, delta, None).await
    }
}
