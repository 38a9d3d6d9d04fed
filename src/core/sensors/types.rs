//! Values produced by sensors and their mapping to telemetry fields.

use std::fmt;

/// Sensor families the station knows about, in sampling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Illuminance,
    Climate,
    AirQuality,
    Counter,
}

impl SensorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Illuminance => "illuminance",
            SensorKind::Climate => "temperature/humidity",
            SensorKind::AirQuality => "air quality",
            SensorKind::Counter => "counter",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A telemetry field of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Illuminance,
    Temperature,
    Humidity,
    Eco2,
    Tvoc,
    Counter,
}

impl Field {
    /// Field number in the topic (`.../fields/field{N}/...`).
    pub fn number(&self) -> u8 {
        match self {
            Field::Illuminance => 1,
            Field::Temperature => 2,
            Field::Humidity => 3,
            Field::Eco2 => 4,
            Field::Tvoc => 5,
            Field::Counter => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Field::Illuminance => "illuminance",
            Field::Temperature => "temperature",
            Field::Humidity => "humidity",
            Field::Eco2 => "eCO2",
            Field::Tvoc => "TVOC",
            Field::Counter => "counter",
        }
    }
}

/// One measurement, as returned by a successful read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    /// Ambient light in lux.
    Illuminance { lux: f32 },
    /// Degrees Celsius and percent relative humidity.
    Climate { temperature: f32, humidity: f32 },
    /// Equivalent CO2 in ppm and total VOC in ppb.
    AirQuality { eco2: u16, tvoc: u16 },
    Counter(u64),
}

impl Reading {
    /// Payloads to publish, in publishing order.
    pub fn fields(&self) -> Vec<(Field, String)> {
        match *self {
            Reading::Illuminance { lux } => vec![(Field::Illuminance, format!("{:.4}", lux))],
            Reading::Climate {
                temperature,
                humidity,
            } => vec![
                (Field::Temperature, format!("{:.1}", temperature)),
                (Field::Humidity, format!("{:.1}", humidity)),
            ],
            Reading::AirQuality { eco2, tvoc } => vec![
                (Field::Eco2, eco2.to_string()),
                (Field::Tvoc, tvoc.to_string()),
            ],
            Reading::Counter(value) => vec![(Field::Counter, value.to_string())],
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Illuminance { lux } => write!(f, "{:.4} lx", lux),
            Reading::Climate {
                temperature,
                humidity,
            } => write!(f, "{:.1} °C, {:.1} %RH", temperature, humidity),
            Reading::AirQuality { eco2, tvoc } => {
                write!(f, "{} ppm eCO2, {} ppb TVOC", eco2, tvoc)
            }
            Reading::Counter(value) => write!(f, "{}", value),
        }
    }
}

/// Outcome of a read that did not fail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Ready(Reading),
    /// The device has no new measurement yet. Nothing to publish.
    Pending,
}
