//! TOML configuration, parsed with `serde`/`toml` the way `phosphor-frontend`
//! loads its machine configuration. Absent a config file, built-in defaults
//! matching the firmware's documented values apply.

use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Default nominal scan period; the scheduler's prescribed cadence.
pub const DEFAULT_SCAN_PERIOD_MS: u32 = 200;
pub const DEFAULT_STATION_ID: u16 = 1;
pub const DEFAULT_ADC_REGISTERS: [u16; 3] = [110, 111, 112];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan_period_ms: u32,
    pub station_id: u16,
    pub adc_registers: [u16; 3],
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scan_period_ms: DEFAULT_SCAN_PERIOD_MS,
            station_id: DEFAULT_STATION_ID,
            adc_registers: DEFAULT_ADC_REGISTERS,
        }
    }
}

impl Config {
    /// Loads and parses a TOML config file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        toml::from_str(&text).map_err(ConfigError::Parse)
    }
}

/// The one place in this binary worth a hand-written `std::error::Error`
/// impl: config loading is the only fallible startup path, everything else
/// in the core is total.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "failed to read config file: {err}"),
            ConfigError::Parse(err) => write!(f, "failed to parse config file: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_firmware_values() {
        let config = Config::default();
        assert_eq!(config.scan_period_ms, 200);
        assert_eq!(config.station_id, 1);
        assert_eq!(config.adc_registers, [110, 111, 112]);
    }

    #[test]
    fn a_missing_config_file_is_an_io_error() {
        let err = Config::load(Path::new("/nonexistent/plc-sim.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
