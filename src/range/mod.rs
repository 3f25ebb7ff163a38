pub mod navigation;
pub mod presets;
pub mod resolver;

pub use navigation::{NavigationAction, NavigationParams, NavigationState, Selection};
pub use presets::{
    available_resolutions, default_resolution, lookup, registry, PresetDefinition, PresetKey,
    RegistryEntry, CUSTOM_KEY, DEFAULT_PRESET, PRESETS,
};
pub use resolver::{
    compute_range_from_custom, compute_range_from_preset, custom_window, preset_window,
    shift_custom, step_anchor,
};

use crate::error::{HorizonError, HorizonResult};
use crate::query::QueryWindow;
use crate::time::{format::serialize_iso, Resolution, Timestamp};
use serde::Serialize;

/// A computed `[start_date, end_date]` window with `start_date < end_date`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(serialize_with = "serialize_iso")]
    pub start_date: Timestamp,
    #[serde(serialize_with = "serialize_iso")]
    pub end_date: Timestamp,
}

impl DateRange {
    pub fn new(start_date: Timestamp, end_date: Timestamp) -> HorizonResult<Self> {
        if start_date >= end_date {
            return Err(HorizonError::invalid_range("startDate must be before endDate"));
        }
        Ok(Self { start_date, end_date })
    }

    pub fn hours(&self) -> f64 {
        (self.end_date - self.start_date).num_milliseconds() as f64 / 3_600_000.0
    }

    pub fn to_query_window(&self, resolution: Resolution) -> HorizonResult<QueryWindow> {
        QueryWindow::new(self.start_date, self.end_date, resolution)
    }
}
