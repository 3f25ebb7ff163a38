use crate::error::HorizonResult;
use crate::generator::{SampleSource, SyntheticSource};
use crate::query::aggregation::{aggregate_points, sample_hourly, Bucket};
use crate::query::QueryWindow;
use crate::time::{format::serialize_iso, Resolution, Timestamp};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationMetadata {
    #[serde(serialize_with = "serialize_iso")]
    pub start_date: Timestamp,
    #[serde(serialize_with = "serialize_iso")]
    pub end_date: Timestamp,
    pub resolution: Resolution,
    pub total_buckets: usize,
    pub total_hourly_points: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregationResult {
    pub buckets: Vec<Bucket>,
    pub metadata: AggregationMetadata,
}

impl AggregationResult {
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Runs windows through hourly sampling and bucketing. Holds no mutable
/// state, so one engine can serve concurrent requests.
pub struct AggregationEngine<S = SyntheticSource> {
    source: S,
}

impl Default for AggregationEngine<SyntheticSource> {
    fn default() -> Self {
        Self::new(SyntheticSource)
    }
}

impl<S: SampleSource> AggregationEngine<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn execute(&self, window: &QueryWindow) -> HorizonResult<AggregationResult> {
        let points = sample_hourly(&self.source, &window.start_date, &window.end_date)?;
        let buckets = aggregate_points(&points, window.resolution);

        debug!(
            "Aggregated {} hourly points into {} {} buckets",
            points.len(),
            buckets.len(),
            window.resolution
        );

        Ok(AggregationResult {
            metadata: AggregationMetadata {
                start_date: window.start_date,
                end_date: window.end_date,
                resolution: window.resolution,
                total_buckets: buckets.len(),
                total_hourly_points: points.len(),
            },
            buckets,
        })
    }
}

/// Buckets for `[start, end]` at `resolution` from the synthetic series.
pub fn aggregate(
    start: &Timestamp,
    end: &Timestamp,
    resolution: Resolution,
) -> HorizonResult<Vec<Bucket>> {
    let points = sample_hourly(&SyntheticSource, start, end)?;
    Ok(aggregate_points(&points, resolution))
}
