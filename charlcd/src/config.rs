use charlcd_gpio::lcd::hd44780::PinAssignment;
use dotenv::var;
use serde::{Deserialize, Serialize};
use std::env::var_os;
use std::ffi::OsStr;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid number: {value:?}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("{name} must list exactly {expected} pins: {value:?}")]
    InvalidPins { name: &'static str, expected: usize, value: String },
    #[error("unknown GPIO backend {0:?}, expected gpiomem, mem, gpiod or sim")]
    UnknownBackend(String),
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the GPIO pins are accessed through.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Memory-mapped registers through `/dev/gpiomem`.
    #[default]
    Gpiomem,
    /// Memory-mapped registers through `/dev/mem`, needs root.
    Mem,
    /// Linux GPIO character device.
    Gpiod,
    /// No hardware, prints what the display would have received.
    Sim,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gpiomem" => Ok(Backend::Gpiomem),
            "mem" => Ok(Backend::Mem),
            "gpiod" => Ok(Backend::Gpiod),
            "sim" => Ok(Backend::Sim),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,
    pub gpiochip: String,
    pub pins: PinAssignment,
    pub startup_delay_ms: u64,
    /// Interval of the display scroll heartbeat, `0` to disable it.
    pub heartbeat_ms: u64,
    pub two_lines: bool,
    pub large_font: bool,
    pub cursor: bool,
    pub blink: bool,
    pub text: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: Backend::default(),
            gpiochip: "/dev/gpiochip0".to_string(),
            pins: PinAssignment::new(14, 15, [16, 17, 18, 19, 20, 21, 22, 26]),
            startup_delay_ms: 5000,
            heartbeat_ms: 500,
            two_lines: true,
            large_font: false,
            cursor: true,
            blink: true,
            text: "ABCDEFGHIJKLMNOP\nQRSTUVWXYZ".to_string(),
        }
    }
}

impl Config {
    /// Loads the JSON config file if there is one, then applies the `CHARLCD_*` environment variables
    /// on top of it.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::try_load_file()?.unwrap_or_default();
        config.apply_vars(|name| var(name).ok())?;
        Ok(config)
    }

    fn try_load_file() -> Result<Option<Self>, ConfigError> {
        let config_str = var_os("CHARLCD_CONFIG");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("charlcd.json"));
        let config_path = Path::new(config_str);
        if !config_path.exists() {
            return Ok(None);
        }
        let file = std::fs::File::open(config_path)?;
        let reader = std::io::BufReader::new(file);
        Ok(Some(serde_json::from_reader(reader)?))
    }

    /// Overrides fields with the variables `lookup` knows about.
    pub fn apply_vars(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("CHARLCD_BACKEND") {
            self.backend = value.parse()?;
        }
        if let Some(value) = lookup("CHARLCD_GPIOCHIP") {
            self.gpiochip = value;
        }
        if let Some(value) = lookup("CHARLCD_PIN_RS") {
            self.pins.register_select = parse_number("CHARLCD_PIN_RS", &value)?;
        }
        if let Some(value) = lookup("CHARLCD_PIN_EN") {
            self.pins.enable = parse_number("CHARLCD_PIN_EN", &value)?;
        }
        if let Some(value) = lookup("CHARLCD_PINS_DATA") {
            self.pins.data = parse_pin_bus("CHARLCD_PINS_DATA", &value)?;
        }
        if let Some(value) = lookup("CHARLCD_STARTUP_DELAY_MS") {
            self.startup_delay_ms = parse_number("CHARLCD_STARTUP_DELAY_MS", &value)?;
        }
        if let Some(value) = lookup("CHARLCD_HEARTBEAT_MS") {
            self.heartbeat_ms = parse_number("CHARLCD_HEARTBEAT_MS", &value)?;
        }
        if let Some(value) = lookup("CHARLCD_TEXT") {
            // .env files can't hold a literal newline comfortably
            self.text = value.replace("\\n", "\n");
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        name,
        value: value.to_string(),
    })
}

fn parse_pin_bus<const N: usize>(
    name: &'static str,
    pin_str: &str,
) -> Result<[usize; N], ConfigError> {
    let invalid = || ConfigError::InvalidPins {
        name,
        expected: N,
        value: pin_str.to_string(),
    };
    pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?
        .try_into()
        .map_err(|_| invalid())
}
