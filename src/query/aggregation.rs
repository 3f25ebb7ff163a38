use crate::error::{HorizonError, HorizonResult};
use crate::generator::SampleSource;
use crate::time::{floor, format::serialize_iso, Resolution, Timestamp};
use chrono::{Datelike, Duration, LocalResult, TimeZone};
use serde::Serialize;
use std::collections::HashMap;

/// One hourly sample.
#[derive(Debug, Clone, PartialEq)]
pub struct TimePoint {
    pub timestamp: Timestamp,
    pub value: i64,
}

impl TimePoint {
    pub fn new(timestamp: Timestamp, value: i64) -> Self {
        Self { timestamp, value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    #[serde(serialize_with = "serialize_iso")]
    pub timestamp: Timestamp,
    pub value: i64,
    pub label: String,
    #[serde(skip_serializing)]
    pub samples: usize,
}

/// Grouping key of the bucket containing `ts`. Week labels use the ISO
/// week-based year so that a label never spans two different weeks, and
/// the two passes of a repeated DST hour carry their offsets.
pub fn bucket_label(ts: &Timestamp, resolution: Resolution) -> String {
    match resolution {
        Resolution::Hour => match ts.timezone().from_local_datetime(&ts.naive_local()) {
            LocalResult::Ambiguous(..) => ts.format("%Y-%m-%d %H:00 %:z").to_string(),
            _ => ts.format("%Y-%m-%d %H:00").to_string(),
        },
        Resolution::Day => ts.format("%Y-%m-%d").to_string(),
        Resolution::Week => {
            let week = ts.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        Resolution::Month => ts.format("%Y-%m").to_string(),
        Resolution::Year => ts.format("%Y").to_string(),
    }
}

/// Samples `source` once per hour from the hour containing `start` through
/// `end` inclusive.
pub fn sample_hourly<S: SampleSource>(
    source: &S,
    start: &Timestamp,
    end: &Timestamp,
) -> HorizonResult<Vec<TimePoint>> {
    if start >= end {
        return Err(HorizonError::invalid_range("startDate must be before endDate"));
    }

    let mut current = floor(start, Resolution::Hour);
    let hours = (*end - current).num_hours().max(0) as usize + 1;
    let mut points = Vec::with_capacity(hours);

    while current <= *end {
        points.push(TimePoint::new(current, source.sample(&current)));
        current = current + Duration::hours(1);
    }

    Ok(points)
}

struct Accumulator {
    start: Timestamp,
    sum: i64,
    count: usize,
}

/// Folds hourly points into `resolution` buckets, each valued at the
/// rounded mean of its samples, in ascending start order.
pub fn aggregate_points(points: &[TimePoint], resolution: Resolution) -> Vec<Bucket> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Accumulator)> = Vec::new();

    for point in points {
        let label = bucket_label(&point.timestamp, resolution);
        match index.get(&label) {
            Some(&i) => {
                let acc = &mut groups[i].1;
                acc.sum += point.value;
                acc.count += 1;
            }
            None => {
                index.insert(label.clone(), groups.len());
                groups.push((
                    label,
                    Accumulator {
                        start: floor(&point.timestamp, resolution),
                        sum: point.value,
                        count: 1,
                    },
                ));
            }
        }
    }

    let mut buckets: Vec<Bucket> = groups
        .into_iter()
        .map(|(label, acc)| Bucket {
            timestamp: acc.start,
            value: (acc.sum as f64 / acc.count as f64).round() as i64,
            label,
            samples: acc.count,
        })
        .collect();

    buckets.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    buckets
}
