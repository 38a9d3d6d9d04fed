//! Station configuration loading.
//!
//! The configuration file is a flat list of `key = value` settings (TOML
//! syntax) plus an optional `[logger]` table. Every recognized key is looked
//! up individually: a present key overrides the built-in default, an absent
//! key is reported and the default is kept. The resulting `Settings` value is
//! built once at startup and handed to each component; nothing mutates it
//! afterwards.

use std::{
    fs,
    path::{Path, PathBuf},
};

use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use validator::Validate;

use self::{
    logger::LoggerConfig,
    station::{BusDevice, ChannelConfig, SamplingConfig, SensorsConfig},
};

pub mod logger;
pub mod station;

/// Environment variable that overrides the configuration file location.
pub const CONFIG_ENV: &str = "WEATHERSTATION_CONFIG";

/// Fixed configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/weatherstation.cfg";

pub type BrokerConfig = weatherstation_mqtt::Config;

/// Timestamp used by the `print_*` macros.
pub fn console_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

/// Timestamped console output for use before the tracing subscriber is
/// installed (configuration loading happens before logging is configured).
#[macro_export]
macro_rules! print_info {
    ($($arg:tt)*) => {
        println!("{}  {} {}",
            console::style($crate::config::console_timestamp()).dim(),
            console::style("INFO").green(),
            format_args!($($arg)*)
        );
    };
}

#[macro_export]
macro_rules! print_warn {
    ($($arg:tt)*) => {
        println!("{}  {} {}",
            console::style($crate::config::console_timestamp()).dim(),
            console::style("WARN").yellow(),
            format_args!($($arg)*)
        );
    };
}

#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        eprintln!("{}  {} {}",
            console::style($crate::config::console_timestamp()).dim(),
            console::style("ERROR").red(),
            format_args!($($arg)*)
        );
    };
}

/// Errors raised while reading or validating the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error while reading configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The file is not valid TOML. The message carries line and column.
    #[error("Parse error while reading configuration: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Complete, immutable station settings.
#[derive(Debug, Clone, Default, Validate)]
pub struct Settings {
    /// Broker connection (`host`, `port`, `username`, `password`, `identity`).
    #[validate(nested)]
    pub broker: BrokerConfig,

    /// Telemetry addressing (`channel`, `writeapikey`).
    #[validate(nested)]
    pub channel: ChannelConfig,

    /// Bus and address per sensor.
    #[validate(nested)]
    pub sensors: SensorsConfig,

    /// Loop timing.
    #[validate(nested)]
    pub sampling: SamplingConfig,

    #[validate(nested)]
    pub logger: LoggerConfig,
}

impl Settings {
    /// Configuration path: `WEATHERSTATION_CONFIG` if set, otherwise
    /// `/etc/weatherstation.cfg`.
    pub fn config_path() -> PathBuf {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Reads and validates the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// `IoError` if the file cannot be read, `ParseError` if it is not valid
    /// TOML. Missing, mistyped and out-of-range keys are not errors: they
    /// are reported and keep their defaults.
    pub fn load(path: &Path) -> Result<Settings, ConfigError> {
        print_info!("Loading configuration from: {}", path.display());

        let text = fs::read_to_string(path)?;
        let settings = Self::from_toml(&text)?;

        print_info!("Successfully loaded config from: {}", path.display());
        Ok(settings)
    }

    /// Builds settings from the text of a configuration file.
    ///
    /// Only a file that is not valid TOML is rejected as a whole. A key with
    /// the wrong type or an out-of-range value is reported and keeps its
    /// default; every other key still applies.
    pub fn from_toml(text: &str) -> Result<Settings, ConfigError> {
        let table: toml::Table = text
            .parse()
            .map_err(|e: toml::de::Error| ConfigError::ParseError(e.to_string()))?;

        let (settings, _) = Self::from_table(&table);

        settings
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        Ok(settings)
    }

    fn from_table(table: &toml::Table) -> (Settings, Lookup<'_>) {
        let mut settings = Settings::default();
        let mut keys = Lookup::new(table);

        let broker = &mut settings.broker;
        keys.checked("host", "host", broker, |k, b| k.string("host", &mut b.host));
        keys.checked("port", "port", broker, |k, b| k.integer("port", &mut b.port));
        keys.string("username", &mut broker.username);
        keys.string("password", &mut broker.password);
        keys.checked("identity", "client_id", broker, |k, b| {
            k.string("identity", &mut b.client_id)
        });
        keys.checked("keep_alive", "keep_alive", broker, |k, b| {
            k.optional_integer("keep_alive", &mut b.keep_alive)
        });
        keys.optional_bool("clean_session", &mut broker.clean_session);
        keys.checked("connection_timeout", "connection_timeout", broker, |k, b| {
            k.optional_integer("connection_timeout", &mut b.connection_timeout)
        });
        keys.checked("reconnect_delay", "reconnect_delay", broker, |k, b| {
            k.optional_integer("reconnect_delay", &mut b.reconnect_delay)
        });
        keys.checked(
            "request_channel_capacity",
            "request_channel_capacity",
            broker,
            |k, b| k.optional_integer("request_channel_capacity", &mut b.request_channel_capacity),
        );

        keys.string("channel", &mut settings.channel.channel);
        keys.string("writeapikey", &mut settings.channel.write_key);

        let sensors = &mut settings.sensors;
        keys.device("illuminance", &mut sensors.illuminance);
        keys.device("climate", &mut sensors.climate);
        keys.device("air_quality", &mut sensors.air_quality);
        keys.optional_bool("counter_mode", &mut sensors.counter_mode);

        let sampling = &mut settings.sampling;
        keys.checked("sampling_interval", "interval", sampling, |k, s| {
            k.integer("sampling_interval", &mut s.interval)
        });
        keys.optional_integer("field_pause", &mut sampling.field_pause);

        if let Some(value) = table.get("logger") {
            let parsed: Result<LoggerConfig, toml::de::Error> = value.clone().try_into();
            match parsed {
                Ok(logger) => match logger.validate() {
                    Ok(()) => settings.logger = logger,
                    Err(e) => keys.reject("[logger]", &e.to_string()),
                },
                Err(e) => keys.reject("[logger]", e.message()),
            }
        }

        (settings, keys)
    }
}

/// Key-by-key reader over a parsed configuration table.
///
/// A successful lookup overwrites the target once. A missing, mistyped or
/// out-of-range key leaves the target untouched and is remembered.
struct Lookup<'a> {
    table: &'a toml::Table,
    missing: Vec<String>,
    rejected: Vec<String>,
}

impl<'a> Lookup<'a> {
    fn new(table: &'a toml::Table) -> Self {
        Self {
            table,
            missing: Vec::new(),
            rejected: Vec::new(),
        }
    }

    fn value(&mut self, key: &str, required: bool) -> Option<&'a toml::Value> {
        let value = self.table.get(key);
        if value.is_none() && required {
            print_warn!("No {} setting in configuration file.", key);
            self.missing.push(key.to_string());
        }
        value
    }

    fn reject(&mut self, key: &str, reason: &str) {
        print_warn!(
            "Invalid {} setting in configuration file ({}), keeping default.",
            key,
            reason
        );
        self.rejected.push(key.to_string());
    }

    /// Runs `read` against `section`, then re-validates the section. If the
    /// new value breaks a rule on `field`, the previous value is restored.
    fn checked<S: Validate + Clone>(
        &mut self,
        key: &str,
        field: &str,
        section: &mut S,
        read: impl FnOnce(&mut Self, &mut S) -> bool,
    ) {
        let previous = section.clone();
        if !read(self, section) {
            return;
        }

        let Err(errors) = section.validate() else {
            return;
        };
        let reason = errors
            .field_errors()
            .get(field)
            .and_then(|errs| errs.first())
            .map(|e| match &e.message {
                Some(message) => message.to_string(),
                None => e.code.to_string(),
            });

        if let Some(reason) = reason {
            self.reject(key, &reason);
            *section = previous;
        }
    }

    /// Strings also accept integers, so `channel = 123` works as expected.
    fn string(&mut self, key: &str, target: &mut String) -> bool {
        match self.value(key, true) {
            Some(toml::Value::String(s)) => {
                *target = s.clone();
                true
            }
            Some(toml::Value::Integer(i)) => {
                *target = i.to_string();
                true
            }
            Some(_) => {
                self.reject(key, "expected a string");
                false
            }
            None => false,
        }
    }

    fn integer<T: TryFrom<i64>>(&mut self, key: &str, target: &mut T) -> bool {
        let value = self.value(key, true);
        self.assign_integer(key, value, target)
    }

    fn optional_integer<T: TryFrom<i64>>(&mut self, key: &str, target: &mut T) -> bool {
        let value = self.value(key, false);
        self.assign_integer(key, value, target)
    }

    fn assign_integer<T: TryFrom<i64>>(
        &mut self,
        key: &str,
        value: Option<&toml::Value>,
        target: &mut T,
    ) -> bool {
        match value {
            Some(toml::Value::Integer(i)) => match T::try_from(*i) {
                Ok(v) => {
                    *target = v;
                    true
                }
                Err(_) => {
                    self.reject(key, "integer out of range");
                    false
                }
            },
            Some(_) => {
                self.reject(key, "expected an integer");
                false
            }
            None => false,
        }
    }

    fn optional_bool(&mut self, key: &str, target: &mut bool) -> bool {
        match self.value(key, false) {
            Some(toml::Value::Boolean(b)) => {
                *target = *b;
                true
            }
            Some(_) => {
                self.reject(key, "expected true or false");
                false
            }
            None => false,
        }
    }

    /// Reads `<prefix>_bus` and `<prefix>_addr`.
    fn device(&mut self, prefix: &str, target: &mut BusDevice) {
        self.integer(&format!("{}_bus", prefix), &mut target.bus);

        let key = format!("{}_addr", prefix);
        self.checked(&key, "address", target, |k, d| k.address(&key, &mut d.address));
    }

    /// The address may be written as an integer (`0x23`) or as a hex
    /// string (`"0x23"`).
    fn address(&mut self, key: &str, target: &mut u8) -> bool {
        match self.value(key, true) {
            Some(toml::Value::String(s)) => match parse_hex_address(s) {
                Some(address) => {
                    *target = address;
                    true
                }
                None => {
                    self.reject(key, "expected a hex address");
                    false
                }
            },
            value => self.assign_integer(key, value, target),
        }
    }
}

/// Parses `"0x5A"`, `"0X5a"` or `"5a"` into a 7-bit bus address.
fn parse_hex_address(s: &str) -> Option<u8> {
    let digits = s
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    u8::from_str_radix(digits, 16).ok()
}
