//! Sensor drivers and startup detection.
//!
//! Detection runs once. A sensor that fails to initialize is logged and left
//! out of the returned list, so the sampling loop never reads it.

pub mod bh1750;
pub mod ccs811;
pub mod counter;
pub mod error;
pub mod sht3x;
pub mod traits;
pub mod types;

use embedded_hal::i2c::I2c;
use linux_embedded_hal::I2cdev;
use tracing::{info, warn};

pub use self::{
    bh1750::Bh1750,
    ccs811::Ccs811,
    counter::Counter,
    error::{SensorError, SensorResult},
    sht3x::Sht3x,
    traits::SensorAdapter,
    types::{Field, Reading, Sample, SensorKind},
};
use crate::config::station::{BusDevice, SensorsConfig};

/// Outcome of detecting one sensor at startup.
#[derive(Debug, Clone)]
pub struct Detection {
    pub kind: SensorKind,
    /// `None` for sensors that live off the bus.
    pub device: Option<BusDevice>,
    pub error: Option<SensorError>,
}

impl Detection {
    pub fn is_detected(&self) -> bool {
        self.error.is_none()
    }
}

/// Sensors that initialized, in sampling order, plus the outcome for every
/// sensor that was tried.
pub struct Detected {
    pub sensors: Vec<Box<dyn SensorAdapter>>,
    pub report: Vec<Detection>,
}

/// Initializes the configured sensors on their `/dev/i2c-N` buses, or sets up
/// the counter alone when `counter_mode` is on.
pub async fn detect(config: &SensorsConfig) -> Detected {
    detect_with(config, |device| {
        let path = device.path();
        I2cdev::new(&path).map_err(|e| SensorError::Bus(format!("{}: {}", path.display(), e)))
    })
    .await
}

/// Same as [`detect`] with a caller-supplied way of opening a bus.
pub async fn detect_with<I2C, F>(config: &SensorsConfig, mut open: F) -> Detected
where
    I2C: I2c + Send + 'static,
    F: FnMut(&BusDevice) -> SensorResult<I2C>,
{
    let mut detected = Detected {
        sensors: Vec::new(),
        report: Vec::new(),
    };

    if config.counter_mode {
        info!("Counter mode: I2C sensors are skipped");
        let counter: Box<dyn SensorAdapter> = Box::new(Counter::new());
        detected.push(SensorKind::Counter, None, Ok(counter));
        return detected;
    }

    let device = config.illuminance;
    let result = match open(&device) {
        Ok(i2c) => Bh1750::initialize(i2c, device.address)
            .await
            .map(|s| Box::new(s) as Box<dyn SensorAdapter>),
        Err(e) => Err(e),
    };
    detected.push(SensorKind::Illuminance, Some(device), result);

    let device = config.climate;
    let result = match open(&device) {
        Ok(i2c) => Sht3x::initialize(i2c, device.address)
            .await
            .map(|s| Box::new(s) as Box<dyn SensorAdapter>),
        Err(e) => Err(e),
    };
    detected.push(SensorKind::Climate, Some(device), result);

    let device = config.air_quality;
    let result = match open(&device) {
        Ok(i2c) => Ccs811::initialize(i2c, device.address)
            .await
            .map(|s| Box::new(s) as Box<dyn SensorAdapter>),
        Err(e) => Err(e),
    };
    detected.push(SensorKind::AirQuality, Some(device), result);

    detected
}

impl Detected {
    fn push(
        &mut self,
        kind: SensorKind,
        device: Option<BusDevice>,
        result: SensorResult<Box<dyn SensorAdapter>>,
    ) {
        let location = device
            .map(|d| format!("{} 0x{:02X}", d.path().display(), d.address))
            .unwrap_or_else(|| "virtual".to_string());

        let error = match result {
            Ok(sensor) => {
                info!("{} sensor detected ({})", kind, location);
                self.sensors.push(sensor);
                None
            }
            Err(e) => {
                warn!("{} sensor not detected ({}): {}", kind, location, e);
                Some(e)
            }
        };

        self.report.push(Detection {
            kind,
            device,
            error,
        });
    }

    #[cfg(test)]
    pub fn kinds(&self) -> Vec<SensorKind> {
        self.sensors.iter().map(|s| s.kind()).collect()
    }
}
