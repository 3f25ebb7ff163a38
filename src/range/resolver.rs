//! Window derivation from a preset plus anchor, or from an explicit range.

use crate::error::{HorizonError, HorizonResult};
use crate::range::presets::{lookup, PresetDefinition};
use crate::range::DateRange;
use crate::time::{ceil, floor, parse_field, CalendarDuration, Direction, Resolution, Timestamp};
use chrono_tz::Tz;

/// Window for `preset` ending at `anchor`, snapped outward to `resolution`.
///
/// Week-denominated presets at day resolution yield exactly `7 * weeks`
/// day buckets, the last one containing the anchor.
pub fn preset_window(
    preset: &PresetDefinition,
    anchor: &Timestamp,
    resolution: Resolution,
) -> HorizonResult<DateRange> {
    if preset.duration.is_weeks_only() && resolution == Resolution::Day {
        let days = 7 * preset.duration.weeks;
        let end_bucket = floor(anchor, Resolution::Day);
        let first_bucket = CalendarDuration::days(days - 1).subtract_from(&end_bucket)?;
        return DateRange::new(
            floor(&first_bucket, Resolution::Day),
            ceil(&end_bucket, Resolution::Day),
        );
    }

    let semantic_start = preset.duration.subtract_from(anchor)?;
    DateRange::new(floor(&semantic_start, resolution), ceil(anchor, resolution))
}

pub fn compute_range_from_preset(
    preset_key: &str,
    end_anchor: &str,
    resolution: Resolution,
    tz: Tz,
) -> HorizonResult<DateRange> {
    let preset = lookup(preset_key)?;
    let anchor = parse_field("endAnchor", end_anchor, tz)?;
    preset_window(preset, &anchor, resolution)
}

/// Snaps `from` down and `to` up to `resolution`.
pub fn custom_window(from: &Timestamp, to: &Timestamp, resolution: Resolution) -> HorizonResult<DateRange> {
    let start = floor(from, resolution);
    let end = ceil(to, resolution);
    if start >= end {
        return Err(HorizonError::invalid_range("custom range must end after it starts"));
    }
    DateRange::new(start, end)
}

pub fn compute_range_from_custom(
    from: &str,
    to: &str,
    resolution: Resolution,
    tz: Tz,
) -> HorizonResult<DateRange> {
    let from = parse_field("from", from, tz)?;
    let to = parse_field("to", to, tz)?;
    custom_window(&from, &to, resolution)
}

/// Moves a preset anchor by one preset duration.
pub fn step_anchor(
    preset: &PresetDefinition,
    anchor: &Timestamp,
    direction: Direction,
) -> HorizonResult<Timestamp> {
    preset.duration.apply(anchor, direction)
}

/// Shifts an explicit range by its own length. The shift is elapsed time,
/// not calendar fields.
pub fn shift_custom(
    from: &Timestamp,
    to: &Timestamp,
    direction: Direction,
) -> HorizonResult<(Timestamp, Timestamp)> {
    let span = *to - *from;
    let shift = |ts: &Timestamp| match direction {
        Direction::Forward => ts.checked_add_signed(span),
        Direction::Backward => ts.checked_sub_signed(span),
    };

    match (shift(from), shift(to)) {
        (Some(from), Some(to)) => Ok((from, to)),
        _ => Err(HorizonError::invalid_range("shifted range is out of bounds")),
    }
}
