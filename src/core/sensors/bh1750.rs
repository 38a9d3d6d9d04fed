//! BH1750 ambient light sensor.

use embedded_hal::i2c::I2c;
use tokio::time::{sleep, Duration};
use tracing::debug;

use super::{
    error::{SensorError, SensorResult},
    traits::SensorAdapter,
    types::{Reading, Sample, SensorKind},
};

const POWER_ON: u8 = 0x01;
const CONTINUOUS_HIGH_RES: u8 = 0x10;

/// Worst-case first conversion time in high resolution mode.
const MEASUREMENT_TIME: Duration = Duration::from_millis(180);

/// Counts per lux at the default measurement time.
const COUNTS_PER_LUX: f32 = 1.2;

pub struct Bh1750<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Bh1750<I2C> {
    /// Powers the device on and starts continuous high resolution
    /// measurement. Returns once the first conversion is available.
    pub async fn initialize(mut i2c: I2C, address: u8) -> SensorResult<Self> {
        i2c.write(address, &[POWER_ON]).map_err(SensorError::bus)?;
        i2c.write(address, &[CONTINUOUS_HIGH_RES])
            .map_err(SensorError::bus)?;
        sleep(MEASUREMENT_TIME).await;

        debug!("BH1750 at 0x{:02X} in continuous high resolution mode", address);
        Ok(Self { i2c, address })
    }

    #[cfg(test)]
    pub(crate) fn release(self) -> I2C {
        self.i2c
    }
}

#[async_trait::async_trait]
impl<I2C: I2c + Send> SensorAdapter for Bh1750<I2C> {
    fn kind(&self) -> SensorKind {
        SensorKind::Illuminance
    }

    async fn read(&mut self) -> SensorResult<Sample> {
        let mut buf = [0u8; 2];
        self.i2c
            .read(self.address, &mut buf)
            .map_err(SensorError::bus)?;

        let lux = f32::from(u16::from_be_bytes(buf)) / COUNTS_PER_LUX;
        Ok(Sample::Ready(Reading::Illuminance { lux }))
    }
}
