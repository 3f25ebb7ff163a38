pub mod calendar;
pub mod format;
pub mod resolution;

pub use calendar::{ceil, floor, CalendarDuration, Direction};
pub use format::{format_for_display, format_iso, parse_field, parse_instant, parse_timezone};
pub use resolution::Resolution;

/// A timezone-aware instant.
pub type Timestamp = chrono::DateTime<chrono_tz::Tz>;
