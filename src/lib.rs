pub mod error;
pub mod generator;
pub mod query;
pub mod range;
pub mod server;
pub mod time;

pub use error::{HorizonError, HorizonResult};
pub use generator::{SampleSource, SyntheticSource};
pub use query::{AggregationEngine, AggregationRequest, AggregationResult, Bucket, QueryWindow};
pub use range::{DateRange, NavigationState, PresetKey, Selection};
pub use time::{Resolution, Timestamp};

use range::DEFAULT_PRESET;

#[derive(Debug, Clone)]
pub struct HorizonConfig {
    pub bind_address: String,
    /// IANA zone used when a request names none.
    pub default_timezone: String,
    pub default_preset: String,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            default_timezone: "UTC".to_string(),
            default_preset: DEFAULT_PRESET.to_string(),
        }
    }
}

impl HorizonConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(bind_addr) = std::env::var("BIND_ADDRESS") {
            config.bind_address = bind_addr;
        }

        if let Ok(timezone) = std::env::var("HORIZON_TIMEZONE") {
            config.default_timezone = timezone;
        }

        if let Ok(preset) = std::env::var("HORIZON_DEFAULT_PRESET") {
            config.default_preset = preset;
        }

        config
    }

    /// Checks that the configured zone and preset exist.
    pub fn validate(&self) -> HorizonResult<()> {
        time::parse_timezone(&self.default_timezone)?;
        range::lookup(&self.default_preset)?;
        Ok(())
    }

    pub fn timezone(&self) -> HorizonResult<chrono_tz::Tz> {
        time::parse_timezone(&self.default_timezone)
    }
}
