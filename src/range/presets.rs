use crate::error::{HorizonError, HorizonResult};
use crate::range::DateRange;
use crate::time::{CalendarDuration, Resolution, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reserved selection key for explicit ranges. Not a registry entry.
pub const CUSTOM_KEY: &str = "custom";

pub const DEFAULT_PRESET: PresetKey = PresetKey::OneWeek;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PresetKey {
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
}

impl PresetKey {
    pub const ALL: [PresetKey; 5] = [
        PresetKey::OneWeek,
        PresetKey::OneMonth,
        PresetKey::ThreeMonths,
        PresetKey::SixMonths,
        PresetKey::OneYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PresetKey::OneWeek => "1w",
            PresetKey::OneMonth => "1m",
            PresetKey::ThreeMonths => "3m",
            PresetKey::SixMonths => "6m",
            PresetKey::OneYear => "1y",
        }
    }

    pub fn definition(&self) -> &'static PresetDefinition {
        match self {
            PresetKey::OneWeek => &PRESETS[0],
            PresetKey::OneMonth => &PRESETS[1],
            PresetKey::ThreeMonths => &PRESETS[2],
            PresetKey::SixMonths => &PRESETS[3],
            PresetKey::OneYear => &PRESETS[4],
        }
    }
}

impl fmt::Display for PresetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for PresetKey {
    type Err = HorizonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| HorizonError::UnknownPreset(s.to_string()))
    }
}

pub struct PresetDefinition {
    pub key: PresetKey,
    pub label: &'static str,
    pub description: &'static str,
    /// Distance between the start and end of the window, and the size of
    /// one prev/next step.
    pub duration: CalendarDuration,
    pub default_resolution: Resolution,
    pub allowed_resolutions: &'static [Resolution],
    /// Unsnapped window around `now` applied when nothing is selected yet.
    pub default_range: fn(&Timestamp) -> HorizonResult<DateRange>,
}

impl PresetDefinition {
    pub fn allows(&self, resolution: Resolution) -> bool {
        self.allowed_resolutions.contains(&resolution)
    }
}

impl fmt::Debug for PresetDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresetDefinition")
            .field("key", &self.key)
            .field("duration", &self.duration)
            .field("default_resolution", &self.default_resolution)
            .finish()
    }
}

fn around(now: &Timestamp, past: CalendarDuration, future: CalendarDuration) -> HorizonResult<DateRange> {
    DateRange::new(past.subtract_from(now)?, future.add_to(now)?)
}

fn one_week_default(now: &Timestamp) -> HorizonResult<DateRange> {
    around(now, CalendarDuration::days(2), CalendarDuration::days(5))
}

fn one_month_default(now: &Timestamp) -> HorizonResult<DateRange> {
    around(now, CalendarDuration::days(6), CalendarDuration::days(24))
}

fn three_months_default(now: &Timestamp) -> HorizonResult<DateRange> {
    around(now, CalendarDuration::weeks(2), CalendarDuration::weeks(10))
}

fn six_months_default(now: &Timestamp) -> HorizonResult<DateRange> {
    around(now, CalendarDuration::months(2), CalendarDuration::months(4))
}

fn one_year_default(now: &Timestamp) -> HorizonResult<DateRange> {
    around(now, CalendarDuration::months(2), CalendarDuration::months(10))
}

pub static PRESETS: [PresetDefinition; 5] = [
    PresetDefinition {
        key: PresetKey::OneWeek,
        label: "1 Week",
        description: "2 days past, 5 days future",
        duration: CalendarDuration::weeks(1),
        default_resolution: Resolution::Day,
        allowed_resolutions: &[Resolution::Day, Resolution::Hour],
        default_range: one_week_default,
    },
    PresetDefinition {
        key: PresetKey::OneMonth,
        label: "1 Month",
        description: "6 days past, 24 days future",
        duration: CalendarDuration::months(1),
        default_resolution: Resolution::Day,
        allowed_resolutions: &[Resolution::Day, Resolution::Week, Resolution::Hour],
        default_range: one_month_default,
    },
    PresetDefinition {
        key: PresetKey::ThreeMonths,
        label: "3 Months",
        description: "18 days past, 72 days future",
        duration: CalendarDuration::months(3),
        default_resolution: Resolution::Week,
        allowed_resolutions: &[Resolution::Week, Resolution::Day, Resolution::Month],
        default_range: three_months_default,
    },
    PresetDefinition {
        key: PresetKey::SixMonths,
        label: "6 Months",
        description: "36 days past, 144 days future",
        duration: CalendarDuration::months(6),
        default_resolution: Resolution::Month,
        allowed_resolutions: &[Resolution::Week, Resolution::Month, Resolution::Day],
        default_range: six_months_default,
    },
    PresetDefinition {
        key: PresetKey::OneYear,
        label: "1 Year",
        description: "73 days past, 292 days future",
        duration: CalendarDuration::months(12),
        default_resolution: Resolution::Month,
        allowed_resolutions: &[Resolution::Month, Resolution::Week, Resolution::Day],
        default_range: one_year_default,
    },
];

pub fn lookup(key: &str) -> HorizonResult<&'static PresetDefinition> {
    key.parse::<PresetKey>().map(|key| key.definition())
}

/// Resolutions selectable under `preset`; every unit when there is none.
pub fn available_resolutions(preset: Option<PresetKey>) -> &'static [Resolution] {
    match preset {
        Some(key) => key.definition().allowed_resolutions,
        None => &Resolution::ALL,
    }
}

pub fn default_resolution(preset: Option<PresetKey>) -> Resolution {
    preset
        .map(|key| key.definition().default_resolution)
        .unwrap_or(Resolution::Day)
}

/// Registry listing for outer surfaces, including the `custom` entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub duration: Option<CalendarDuration>,
    pub default_resolution: Resolution,
    pub allowed_resolutions: Vec<Resolution>,
}

pub fn registry() -> Vec<RegistryEntry> {
    let mut entries: Vec<RegistryEntry> = PRESETS
        .iter()
        .map(|preset| RegistryEntry {
            key: preset.key.as_str(),
            label: preset.label,
            description: preset.description,
            duration: Some(preset.duration),
            default_resolution: preset.default_resolution,
            allowed_resolutions: preset.allowed_resolutions.to_vec(),
        })
        .collect();

    entries.push(RegistryEntry {
        key: CUSTOM_KEY,
        label: "Custom",
        description: "Explicit date range",
        duration: None,
        default_resolution: default_resolution(None),
        allowed_resolutions: Resolution::ALL.to_vec(),
    });

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use chrono_tz::UTC;

    #[test]
    fn test_registry_table_is_consistent() {
        for key in PresetKey::ALL {
            let preset = key.definition();
            assert_eq!(preset.key, key);
            assert!(preset.allows(preset.default_resolution));
            assert_eq!(key.as_str().parse::<PresetKey>().unwrap(), key);
        }
    }

    #[test]
    fn test_lookup_unknown_and_custom() {
        assert_eq!(lookup("2w").unwrap_err(), HorizonError::UnknownPreset("2w".to_string()));
        assert!(matches!(lookup(CUSTOM_KEY), Err(HorizonError::UnknownPreset(_))));
        assert_eq!(lookup("3m").unwrap().default_resolution, Resolution::Week);
    }

    #[test]
    fn test_available_and_default_resolutions() {
        assert_eq!(
            available_resolutions(Some(PresetKey::OneWeek)),
            &[Resolution::Day, Resolution::Hour]
        );
        assert_eq!(available_resolutions(None).len(), 5);
        assert_eq!(default_resolution(Some(PresetKey::SixMonths)), Resolution::Month);
        assert_eq!(default_resolution(None), Resolution::Day);
    }

    #[test]
    fn test_default_ranges() {
        let now = UTC.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let range = (PresetKey::OneWeek.definition().default_range)(&now).unwrap();
        assert_eq!(range.start_date, now - Duration::days(2));
        assert_eq!(range.end_date, now + Duration::days(5));

        let range = (PresetKey::OneYear.definition().default_range)(&now).unwrap();
        assert_eq!(range.start_date, UTC.with_ymd_and_hms(2024, 4, 15, 12, 0, 0).unwrap());
        assert_eq!(range.end_date, UTC.with_ymd_and_hms(2025, 4, 15, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_registry_listing_includes_custom() {
        let entries = registry();
        assert_eq!(entries.len(), 6);
        let custom = entries.last().unwrap();
        assert_eq!(custom.key, "custom");
        assert!(custom.duration.is_none());

        let json = serde_json::to_value(&entries[1]).unwrap();
        assert_eq!(json["key"], "1m");
        assert_eq!(json["duration"]["months"], 1);
        assert_eq!(json["defaultResolution"], "day");
    }
}
