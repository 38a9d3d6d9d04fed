//! SHT3x temperature and humidity sensor.
//!
//! Every 16-bit word the device sends is followed by a CRC-8 byte. A word
//! whose CRC does not match decodes to [`NOT_AVAILABLE`]; a measurement with
//! the sentinel in either field is reported as an error and nothing from it
//! is published.

use embedded_hal::i2c::I2c;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use super::{
    error::{SensorError, SensorResult},
    traits::SensorAdapter,
    types::{Reading, Sample, SensorKind},
};

/// Value of a field whose word failed its CRC.
pub const NOT_AVAILABLE: f32 = -999.0;

const SOFT_RESET: [u8; 2] = [0x30, 0xA2];
const READ_STATUS: [u8; 2] = [0xF3, 0x2D];
/// Single shot, high repeatability, no clock stretching.
const MEASURE_HIGH_REP: [u8; 2] = [0x24, 0x00];

const RESET_TIME: Duration = Duration::from_millis(2);
const MEASUREMENT_TIME: Duration = Duration::from_millis(16);

const CRC_POLYNOMIAL: u8 = 0x31;
const CRC_INIT: u8 = 0xFF;

/// CRC-8 as used by Sensirion: polynomial 0x31, init 0xFF, no reflection.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = CRC_INIT;
    for byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC_POLYNOMIAL
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Returns the word in `chunk` (two data bytes plus CRC) if the CRC matches.
fn checked_word(chunk: &[u8]) -> Option<u16> {
    match chunk {
        [msb, lsb, crc] if crc8(&[*msb, *lsb]) == *crc => Some(u16::from_be_bytes([*msb, *lsb])),
        _ => None,
    }
}

fn temperature(raw: Option<u16>) -> f32 {
    raw.map_or(NOT_AVAILABLE, |raw| {
        -45.0 + 175.0 * f32::from(raw) / 65535.0
    })
}

fn humidity(raw: Option<u16>) -> f32 {
    raw.map_or(NOT_AVAILABLE, |raw| 100.0 * f32::from(raw) / 65535.0)
}

/// Decodes a 6-byte measurement frame into (temperature, humidity).
pub fn decode_measurement(frame: &[u8; 6]) -> (f32, f32) {
    (
        temperature(checked_word(&frame[0..3])),
        humidity(checked_word(&frame[3..6])),
    )
}

pub struct Sht3x<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Sht3x<I2C> {
    /// Soft-resets the device, then reads its status register to make sure
    /// an SHT3x is actually answering on `address`.
    pub async fn initialize(mut i2c: I2C, address: u8) -> SensorResult<Self> {
        i2c.write(address, &SOFT_RESET).map_err(SensorError::bus)?;
        sleep(RESET_TIME).await;

        let mut status = [0u8; 3];
        i2c.write_read(address, &READ_STATUS, &mut status)
            .map_err(SensorError::bus)?;

        let expected = crc8(&status[..2]);
        if expected != status[2] {
            return Err(SensorError::Checksum {
                expected,
                actual: status[2],
            });
        }

        debug!(
            "SHT3x at 0x{:02X} status 0x{:04X}",
            address,
            u16::from_be_bytes([status[0], status[1]])
        );
        Ok(Self { i2c, address })
    }

    #[cfg(test)]
    pub(crate) fn release(self) -> I2C {
        self.i2c
    }
}

#[async_trait::async_trait]
impl<I2C: I2c + Send> SensorAdapter for Sht3x<I2C> {
    fn kind(&self) -> SensorKind {
        SensorKind::Climate
    }

    async fn read(&mut self) -> SensorResult<Sample> {
        self.i2c
            .write(self.address, &MEASURE_HIGH_REP)
            .map_err(SensorError::bus)?;
        sleep(MEASUREMENT_TIME).await;

        let mut frame = [0u8; 6];
        self.i2c
            .read(self.address, &mut frame)
            .map_err(SensorError::bus)?;

        let (temperature, humidity) = decode_measurement(&frame);
        if temperature == NOT_AVAILABLE || humidity == NOT_AVAILABLE {
            warn!(
                "SHT3x CRC failure (temperature {}, humidity {})",
                temperature, humidity
            );
            return Err(SensorError::NotAvailable(
                "temperature/humidity word failed CRC".into(),
            ));
        }

        Ok(Sample::Ready(Reading::Climate {
            temperature,
            humidity,
        }))
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock, Transaction};

    use super::*;

    const ADDR: u8 = 0x44;

    fn word(raw: u16) -> Vec<u8> {
        let [msb, lsb] = raw.to_be_bytes();
        vec![msb, lsb, crc8(&[msb, lsb])]
    }

    fn init_transactions() -> Vec<Transaction> {
        vec![
            Transaction::write(ADDR, SOFT_RESET.to_vec()),
            Transaction::write_read(ADDR, READ_STATUS.to_vec(), word(0x8010)),
        ]
    }

    fn measurement(frame: Vec<u8>) -> Vec<Transaction> {
        vec![
            Transaction::write(ADDR, MEASURE_HIGH_REP.to_vec()),
            Transaction::read(ADDR, frame),
        ]
    }

    #[test]
    fn test_crc8_reference_vector() {
        assert_eq!(crc8(&[0xBE, 0xEF]), 0x92);
        assert_eq!(crc8(&[0x00, 0x00]), 0x81);
    }

    #[test]
    fn test_decode_extremes() {
        let mut frame = [0u8; 6];
        frame[..3].copy_from_slice(&word(0xFFFF));
        frame[3..].copy_from_slice(&word(0x0000));

        let (t, rh) = decode_measurement(&frame);
        assert!((t - 130.0).abs() < 0.01);
        assert!(rh.abs() < 0.01);
    }

    #[test]
    fn test_bad_crc_yields_sentinel() {
        let mut frame = [0u8; 6];
        frame[..3].copy_from_slice(&word(0x6666));
        frame[3..].copy_from_slice(&word(0x8000));
        frame[5] ^= 0xFF;

        let (t, rh) = decode_measurement(&frame);
        assert_ne!(t, NOT_AVAILABLE);
        assert_eq!(rh, NOT_AVAILABLE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_converts_raw_words() {
        let mut frame = word(0x6666);
        frame.extend(word(0x8000));

        let mut expectations = init_transactions();
        expectations.extend(measurement(frame));
        let mock = Mock::new(&expectations);

        let mut sensor = Sht3x::initialize(mock, ADDR).await.unwrap();
        match sensor.read().await.unwrap() {
            Sample::Ready(Reading::Climate {
                temperature,
                humidity,
            }) => {
                assert!((temperature - 25.0).abs() < 0.01);
                assert!((humidity - 50.0).abs() < 0.01);
            }
            other => panic!("unexpected sample: {other:?}"),
        }

        sensor.release().done();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sentinel_on_humidity_fails_read() {
        let mut frame = word(0x6666);
        let mut bad = word(0x8000);
        bad[2] ^= 0x01;
        frame.extend(bad);

        let mut expectations = init_transactions();
        expectations.extend(measurement(frame));
        let mock = Mock::new(&expectations);

        let mut sensor = Sht3x::initialize(mock, ADDR).await.unwrap();
        assert!(matches!(
            sensor.read().await,
            Err(SensorError::NotAvailable(_))
        ));

        sensor.release().done();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sentinel_on_temperature_fails_read() {
        let mut frame = word(0x6666);
        frame[0] ^= 0x10;
        frame.extend(word(0x8000));

        let mut expectations = init_transactions();
        expectations.extend(measurement(frame));
        let mock = Mock::new(&expectations);

        let mut sensor = Sht3x::initialize(mock, ADDR).await.unwrap();
        assert!(matches!(
            sensor.read().await,
            Err(SensorError::NotAvailable(_))
        ));

        sensor.release().done();
    }

    #[tokio::test(start_paused = true)]
    async fn test_corrupt_status_fails_init() {
        let mut status = word(0x8010);
        status[2] ^= 0xFF;
        let expectations = [
            Transaction::write(ADDR, SOFT_RESET.to_vec()),
            Transaction::write_read(ADDR, READ_STATUS.to_vec(), status),
        ];
        let mut mock = Mock::new(&expectations);

        let result = Sht3x::initialize(mock.clone(), ADDR).await;
        assert!(matches!(result, Err(SensorError::Checksum { .. })));

        mock.done();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_device_fails_init() {
        let expectations =
            [Transaction::write(ADDR, SOFT_RESET.to_vec()).with_error(ErrorKind::Other)];
        let mut mock = Mock::new(&expectations);

        let result = Sht3x::initialize(mock.clone(), ADDR).await;
        assert!(matches!(result, Err(SensorError::Bus(_))));

        mock.done();
    }
}
