pub mod aggregation;
pub mod engine;

pub use aggregation::{aggregate_points, bucket_label, sample_hourly, Bucket, TimePoint};
pub use engine::{aggregate, AggregationEngine, AggregationMetadata, AggregationResult};

use crate::error::{HorizonError, HorizonResult};
use crate::time::format::present;
use crate::time::{ceil, floor, parse_field, parse_timezone, Resolution, Timestamp};
use chrono_tz::Tz;
use serde::Deserialize;

/// The resolved input of one aggregation: `start_date < end_date`, both in
/// the same zone.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryWindow {
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub resolution: Resolution,
}

impl QueryWindow {
    pub fn new(start_date: Timestamp, end_date: Timestamp, resolution: Resolution) -> HorizonResult<Self> {
        if start_date >= end_date {
            return Err(HorizonError::invalid_range("startDate must be before endDate"));
        }
        Ok(Self {
            start_date,
            end_date,
            resolution,
        })
    }

    /// Builds a window with both bounds snapped outward to `resolution`.
    pub fn aligned(start_date: &Timestamp, end_date: &Timestamp, resolution: Resolution) -> HorizonResult<Self> {
        Self::new(floor(start_date, resolution), ceil(end_date, resolution), resolution)
    }

    pub fn timezone(&self) -> Tz {
        self.start_date.timezone()
    }

    pub fn is_aligned(&self) -> bool {
        floor(&self.start_date, self.resolution) == self.start_date
            && ceil(&self.end_date, self.resolution) == self.end_date
    }
}

/// Raw aggregation parameters as they arrive from a caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub resolution: Option<String>,
    pub timezone: Option<String>,
}

impl AggregationRequest {
    pub fn new(start_date: &str, end_date: &str, resolution: &str) -> Self {
        Self {
            start_date: Some(start_date.to_string()),
            end_date: Some(end_date.to_string()),
            resolution: Some(resolution.to_string()),
            timezone: None,
        }
    }

    pub fn with_timezone(mut self, timezone: &str) -> Self {
        self.timezone = Some(timezone.to_string());
        self
    }

    /// Checks the request and resolves it into a window. Dates without an
    /// offset are read in the request's timezone, or `default_tz`.
    pub fn validate(&self, default_tz: Tz) -> HorizonResult<QueryWindow> {
        let (start, end, resolution) = match (
            present(&self.start_date),
            present(&self.end_date),
            present(&self.resolution),
        ) {
            (Some(start), Some(end), Some(resolution)) => (start, end, resolution),
            (start, end, resolution) => {
                let missing: Vec<&str> = [
                    ("startDate", start.is_none()),
                    ("endDate", end.is_none()),
                    ("resolution", resolution.is_none()),
                ]
                .iter()
                .filter(|(_, absent)| *absent)
                .map(|(name, _)| *name)
                .collect();
                return Err(HorizonError::MissingParameter(missing.join(", ")));
            }
        };

        let tz = match present(&self.timezone) {
            Some(name) => parse_timezone(name)?,
            None => default_tz,
        };

        let start_date = parse_field("startDate", start, tz)?;
        let end_date = parse_field("endDate", end, tz)?;

        if start_date >= end_date {
            return Err(HorizonError::invalid_range("startDate must be before endDate"));
        }

        let resolution: Resolution = resolution.parse()?;

        QueryWindow::new(start_date, end_date, resolution)
    }
}
