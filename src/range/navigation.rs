//! The explorer's navigation state: which preset or custom range is
//! active, the anchor it is computed around, and the resulting window.
//!
//! Every transition takes the current time as an argument, so replaying the
//! same inputs always reproduces the same window.

use crate::error::{HorizonError, HorizonResult};
use crate::range::presets::{
    available_resolutions, default_resolution, PresetKey, CUSTOM_KEY, DEFAULT_PRESET, PRESETS,
};
use crate::range::resolver::{custom_window, preset_window, shift_custom, step_anchor};
use crate::range::DateRange;
use crate::time::format::present;
use crate::time::{ceil, floor, format_iso, parse_field, Direction, Resolution, Timestamp};
use chrono::SubsecRound;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    None,
    Preset(PresetKey),
    Custom { from: Timestamp, to: Timestamp },
}

impl Selection {
    pub fn key(&self) -> Option<&'static str> {
        match self {
            Selection::None => None,
            Selection::Preset(key) => Some(key.as_str()),
            Selection::Custom { .. } => Some(CUSTOM_KEY),
        }
    }

    pub fn preset(&self) -> Option<PresetKey> {
        match self {
            Selection::Preset(key) => Some(*key),
            _ => None,
        }
    }
}

/// Shareable form of the state, e.g. for URL query strings. Every field is
/// optional so partially filled state can still be restored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_anchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NavigationAction {
    Default,
    SelectPreset { preset: String },
    ApplyCustom { from: String, to: String },
    Prev,
    Next,
    Today,
    SetResolution { resolution: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationState {
    selection: Selection,
    anchor: Timestamp,
    resolution: Resolution,
    timezone: Tz,
    window: Option<DateRange>,
}

impl NavigationState {
    /// Fresh state with nothing selected.
    pub fn new(now: &Timestamp, timezone: Tz) -> Self {
        Self {
            selection: Selection::None,
            anchor: Self::normalize(now, timezone),
            resolution: default_resolution(Some(DEFAULT_PRESET)),
            timezone,
            window: None,
        }
    }

    // Instants are held at millisecond precision so they survive a trip
    // through `NavigationParams`.
    fn normalize(ts: &Timestamp, timezone: Tz) -> Timestamp {
        ts.with_timezone(&timezone).trunc_subsecs(3)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn anchor(&self) -> &Timestamp {
        &self.anchor
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn window(&self) -> Option<&DateRange> {
        self.window.as_ref()
    }

    pub fn available_resolutions(&self) -> &'static [Resolution] {
        available_resolutions(self.selection.preset())
    }

    /// Applies the default preset's default window if no window exists yet.
    /// Returns whether anything changed.
    pub fn ensure_default(&mut self, now: &Timestamp) -> HorizonResult<bool> {
        if self.window.is_some() {
            return Ok(false);
        }

        let preset = DEFAULT_PRESET.definition();
        let now = Self::normalize(now, self.timezone);
        let range = (preset.default_range)(&now)?;
        let window = DateRange::new(
            floor(&range.start_date, preset.default_resolution),
            ceil(&range.end_date, preset.default_resolution),
        )?;

        info!("Applying default preset {}", preset.key);
        self.selection = Selection::Preset(preset.key);
        self.resolution = preset.default_resolution;
        self.anchor = now;
        self.window = Some(window);
        Ok(true)
    }

    /// Selects `key` at its default resolution, anchored at the end of the
    /// preset's default range around `now`.
    pub fn select_preset(&mut self, key: PresetKey, now: &Timestamp) -> HorizonResult<()> {
        let preset = key.definition();
        let now = Self::normalize(now, self.timezone);
        let anchor = (preset.default_range)(&now)?.end_date;
        let window = preset_window(preset, &anchor, preset.default_resolution)?;

        debug!("Selected preset {} anchored at {}", key, format_iso(&anchor));
        self.selection = Selection::Preset(key);
        self.resolution = preset.default_resolution;
        self.anchor = anchor;
        self.window = Some(window);
        Ok(())
    }

    pub fn apply_custom(&mut self, from: &Timestamp, to: &Timestamp) -> HorizonResult<()> {
        let from = Self::normalize(from, self.timezone);
        let to = Self::normalize(to, self.timezone);
        if from >= to {
            return Err(HorizonError::invalid_range("custom range must start before it ends"));
        }

        self.set_custom(from, to)
    }

    fn set_custom(&mut self, from: Timestamp, to: Timestamp) -> HorizonResult<()> {
        let window = custom_window(&from, &to, self.resolution)?;
        self.selection = Selection::Custom { from, to };
        self.anchor = to;
        self.window = Some(window);
        Ok(())
    }

    /// Moves the window one increment back or forward. Does nothing when
    /// nothing is selected.
    pub fn step(&mut self, direction: Direction) -> HorizonResult<()> {
        match self.selection {
            Selection::None => {
                debug!("Ignoring step with no selection");
                Ok(())
            }
            Selection::Preset(key) => {
                let preset = key.definition();
                let anchor = step_anchor(preset, &self.anchor, direction)?;
                self.window = Some(preset_window(preset, &anchor, self.resolution)?);
                self.anchor = anchor;
                Ok(())
            }
            Selection::Custom { from, to } => {
                let (from, to) = shift_custom(&from, &to, direction)?;
                self.set_custom(from, to)
            }
        }
    }

    pub fn prev(&mut self) -> HorizonResult<()> {
        self.step(Direction::Backward)
    }

    pub fn next(&mut self) -> HorizonResult<()> {
        self.step(Direction::Forward)
    }

    /// Re-anchors the window at `now`. A custom range keeps its length and
    /// ends at `now`; with nothing selected the default preset is selected.
    pub fn today(&mut self, now: &Timestamp) -> HorizonResult<()> {
        let now = Self::normalize(now, self.timezone);
        match self.selection {
            Selection::Custom { from, to } => {
                let from = now
                    .checked_sub_signed(to - from)
                    .ok_or_else(|| HorizonError::invalid_range("shifted range is out of bounds"))?;
                self.set_custom(from, now)
            }
            Selection::Preset(key) => {
                self.window = Some(preset_window(key.definition(), &now, self.resolution)?);
                self.anchor = now;
                Ok(())
            }
            Selection::None => {
                let preset = DEFAULT_PRESET.definition();
                let resolution = if preset.allows(self.resolution) {
                    self.resolution
                } else {
                    preset.default_resolution
                };
                self.window = Some(preset_window(preset, &now, resolution)?);
                self.selection = Selection::Preset(preset.key);
                self.resolution = resolution;
                self.anchor = now;
                Ok(())
            }
        }
    }

    /// Changes the resolution and recomputes the window under the same
    /// anchor or range.
    pub fn set_resolution(&mut self, resolution: Resolution) -> HorizonResult<()> {
        let window = match self.selection {
            Selection::Preset(key) => {
                check_allowed(key, resolution)?;
                Some(preset_window(key.definition(), &self.anchor, resolution)?)
            }
            Selection::Custom { from, to } => Some(custom_window(&from, &to, resolution)?),
            Selection::None => match self.window {
                Some(current) => Some(DateRange::new(
                    floor(&current.start_date, resolution),
                    ceil(&current.end_date, resolution),
                )?),
                None => None,
            },
        };

        self.resolution = resolution;
        self.window = window;
        Ok(())
    }

    /// Applies an action expressed in wire form.
    pub fn apply(&mut self, action: &NavigationAction, now: &Timestamp) -> HorizonResult<()> {
        match action {
            NavigationAction::Default => self.ensure_default(now).map(|_| ()),
            NavigationAction::SelectPreset { preset } => self.select_preset(preset.parse()?, now),
            NavigationAction::ApplyCustom { from, to } => {
                let from = parse_field("from", from, self.timezone)?;
                let to = parse_field("to", to, self.timezone)?;
                self.apply_custom(&from, &to)
            }
            NavigationAction::Prev => self.prev(),
            NavigationAction::Next => self.next(),
            NavigationAction::Today => self.today(now),
            NavigationAction::SetResolution { resolution } => self.set_resolution(resolution.parse()?),
        }
    }

    pub fn to_params(&self) -> NavigationParams {
        let (from, to) = match &self.selection {
            Selection::Custom { from, to } => (Some(format_iso(from)), Some(format_iso(to))),
            _ => (None, None),
        };

        NavigationParams {
            start_date: self.window.map(|w| format_iso(&w.start_date)),
            end_date: self.window.map(|w| format_iso(&w.end_date)),
            resolution: Some(self.resolution.to_string()),
            preset: self.selection.key().map(str::to_string),
            end_anchor: Some(format_iso(&self.anchor)),
            from,
            to,
        }
    }

    /// Rebuilds state from persisted params. A missing or unknown preset is
    /// inferred from the stored window length.
    pub fn restore(params: &NavigationParams, now: &Timestamp, timezone: Tz) -> HorizonResult<Self> {
        let now = Self::normalize(now, timezone);

        let resolution = present(&params.resolution)
            .map(str::parse::<Resolution>)
            .transpose()?;

        let anchor = match present(&params.end_anchor) {
            Some(value) => Self::normalize(&parse_field("endAnchor", value, timezone)?, timezone),
            None => now,
        };

        let window = match (present(&params.start_date), present(&params.end_date)) {
            (Some(start), Some(end)) => Some(DateRange::new(
                Self::normalize(&parse_field("startDate", start, timezone)?, timezone),
                Self::normalize(&parse_field("endDate", end, timezone)?, timezone),
            )?),
            _ => None,
        };

        let selection = match present(&params.preset) {
            Some(CUSTOM_KEY) => {
                let bounds = match (present(&params.from), present(&params.to)) {
                    (Some(from), Some(to)) => Some((
                        Self::normalize(&parse_field("from", from, timezone)?, timezone),
                        Self::normalize(&parse_field("to", to, timezone)?, timezone),
                    )),
                    _ => window.map(|w| (w.start_date, w.end_date)),
                };
                match bounds {
                    Some((from, to)) => Selection::Custom { from, to },
                    None => return Err(HorizonError::MissingParameter("from, to".to_string())),
                }
            }
            Some(value) => match value.parse::<PresetKey>() {
                Ok(key) => {
                    if let Some(resolution) = resolution {
                        check_allowed(key, resolution)?;
                    }
                    Selection::Preset(key)
                }
                Err(_) => Self::infer_selection(window.as_ref(), &now, resolution)?,
            },
            None => Self::infer_selection(window.as_ref(), &now, resolution)?,
        };
        let resolution = resolution.unwrap_or_else(|| default_resolution(selection.preset()));

        Ok(Self {
            selection,
            anchor,
            resolution,
            timezone,
            window,
        })
    }

    /// An inferred preset that does not allow the stored resolution is
    /// dropped rather than rejected.
    fn infer_selection(
        window: Option<&DateRange>,
        now: &Timestamp,
        resolution: Option<Resolution>,
    ) -> HorizonResult<Selection> {
        let inferred = match window {
            Some(window) => infer_preset(window, now)?,
            None => None,
        };

        Ok(match inferred {
            Some(key) if resolution.map_or(true, |r| key.definition().allows(r)) => Selection::Preset(key),
            _ => Selection::None,
        })
    }
}

fn check_allowed(key: PresetKey, resolution: Resolution) -> HorizonResult<()> {
    if key.definition().allows(resolution) {
        Ok(())
    } else {
        Err(HorizonError::ResolutionNotAllowed {
            resolution: resolution.to_string(),
            preset: key.to_string(),
        })
    }
}

/// The preset whose default window around `now` has the same length as
/// `window`, within one hour.
pub fn infer_preset(window: &DateRange, now: &Timestamp) -> HorizonResult<Option<PresetKey>> {
    let hours = window.hours();
    for preset in PRESETS.iter() {
        let candidate = (preset.default_range)(now)?;
        if (candidate.hours() - hours).abs() < 1.0 {
            return Ok(Some(preset.key));
        }
    }
    Ok(None)
}
