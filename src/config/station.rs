//! Station-specific settings: telemetry channel, sensor wiring, loop timing.

use std::{path::PathBuf, time::Duration};

use validator::Validate;

/// Bus used when a `*_bus` key is absent (the header bus on most boards).
pub const DEFAULT_BUS: u8 = 1;

pub const ILLUMINANCE_ADDR: u8 = 0x23;
pub const CLIMATE_ADDR: u8 = 0x44;
pub const AIR_QUALITY_ADDR: u8 = 0x5A;

/// ThingSpeak-style channel addressing. Neither value has a usable default.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct ChannelConfig {
    pub channel: String,
    pub write_key: String,
}

/// Location of one sensor: `/dev/i2c-{bus}` plus its 7-bit address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Validate)]
pub struct BusDevice {
    pub bus: u8,

    #[validate(range(
        min = 0x03,
        max = 0x77,
        message = "I2C address must be between 0x03 and 0x77"
    ))]
    pub address: u8,
}

impl BusDevice {
    pub const fn new(bus: u8, address: u8) -> Self {
        Self { bus, address }
    }

    pub fn path(&self) -> PathBuf {
        PathBuf::from(format!("/dev/i2c-{}", self.bus))
    }
}

#[derive(Debug, Clone, PartialEq, Validate)]
pub struct SensorsConfig {
    #[validate(nested)]
    pub illuminance: BusDevice,

    #[validate(nested)]
    pub climate: BusDevice,

    #[validate(nested)]
    pub air_quality: BusDevice,

    /// Skip hardware entirely and publish a synthetic counter on field 3.
    pub counter_mode: bool,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            illuminance: BusDevice::new(DEFAULT_BUS, ILLUMINANCE_ADDR),
            climate: BusDevice::new(DEFAULT_BUS, CLIMATE_ADDR),
            air_quality: BusDevice::new(DEFAULT_BUS, AIR_QUALITY_ADDR),
            counter_mode: false,
        }
    }
}

/// Timing of the sampling loop, in seconds.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct SamplingConfig {
    /// Sleep after each full pass over the sensors.
    #[validate(range(min = 1, message = "Sampling interval must be at least 1 second"))]
    pub interval: u64,

    /// Pause between two fields of the same sensor. ThingSpeak's free tier
    /// drops updates that arrive closer than 15 s apart.
    pub field_pause: u64,
}

impl SamplingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn field_pause(&self) -> Duration {
        Duration::from_secs(self.field_pause)
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval: 30,
            field_pause: 15,
        }
    }
}
