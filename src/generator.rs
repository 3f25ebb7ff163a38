use crate::time::Timestamp;
use chrono::{Timelike, Utc};
use std::f64::consts::PI;

/// Produces one sample per hourly instant. Implementations must be pure:
/// the same instant always yields the same value.
pub trait SampleSource {
    fn sample(&self, at: &Timestamp) -> i64;
}

/// Deterministic stand-in for a real backing store.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticSource;

impl SampleSource for SyntheticSource {
    fn sample(&self, at: &Timestamp) -> i64 {
        value(at)
    }
}

/// Synthetic value for `timestamp`: a sine-hashed base in roughly
/// `[50, 1000]` plus a diurnal swing of ±20.
///
/// The hour of day is read in UTC, so the same instant yields the same
/// value whichever zone it is expressed in.
pub fn value(timestamp: &Timestamp) -> i64 {
    let seed = timestamp.timestamp_millis() as f64;

    let mut x = (seed * 0.0001).sin() * 10000.0;
    x -= x.floor();
    let base = 50.0 + x * 950.0;

    let hour_of_day = f64::from(timestamp.with_timezone(&Utc).hour());
    let day_trend = (hour_of_day / 24.0 * PI * 2.0).sin() * 20.0;

    (base + day_trend).round() as i64
}
