//! CCS811 air quality sensor (eCO2 and TVOC).
//!
//! The device boots into its bootloader; `initialize` checks the hardware id,
//! starts the application firmware and selects drive mode 1 (one
//! measurement per second). Reads that find no new data return
//! `Sample::Pending`.

use embedded_hal::i2c::I2c;
use tokio::time::{sleep, Duration};
use tracing::debug;

use super::{
    error::{SensorError, SensorResult},
    traits::SensorAdapter,
    types::{Reading, Sample, SensorKind},
};

const REG_STATUS: u8 = 0x00;
const REG_MEAS_MODE: u8 = 0x01;
const REG_ALG_RESULT_DATA: u8 = 0x02;
const REG_HW_ID: u8 = 0x20;
const REG_ERROR_ID: u8 = 0xE0;
const APP_START: u8 = 0xF4;

const HW_ID: u8 = 0x81;

const STATUS_ERROR: u8 = 0x01;
const STATUS_DATA_READY: u8 = 0x08;
const STATUS_APP_VALID: u8 = 0x10;
const STATUS_FW_MODE: u8 = 0x80;

/// Drive mode 1, interrupts off.
const DRIVE_MODE_1S: u8 = 0x10;

const APP_START_TIME: Duration = Duration::from_millis(2);

pub struct Ccs811<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Ccs811<I2C> {
    pub async fn initialize(mut i2c: I2C, address: u8) -> SensorResult<Self> {
        let hw_id = read_register(&mut i2c, address, REG_HW_ID)?;
        if hw_id != HW_ID {
            return Err(SensorError::Unsupported(format!(
                "hardware id 0x{:02X} at 0x{:02X}, expected 0x{:02X}",
                hw_id, address, HW_ID
            )));
        }

        let status = read_register(&mut i2c, address, REG_STATUS)?;
        if status & STATUS_APP_VALID == 0 {
            return Err(SensorError::Device(
                "no valid application firmware".into(),
            ));
        }

        i2c.write(address, &[APP_START]).map_err(SensorError::bus)?;
        sleep(APP_START_TIME).await;

        i2c.write(address, &[REG_MEAS_MODE, DRIVE_MODE_1S])
            .map_err(SensorError::bus)?;

        let status = read_register(&mut i2c, address, REG_STATUS)?;
        if status & STATUS_ERROR != 0 {
            let code = read_register(&mut i2c, address, REG_ERROR_ID)?;
            return Err(SensorError::Device(format!(
                "error 0x{:02X} after application start",
                code
            )));
        }
        if status & STATUS_FW_MODE == 0 {
            return Err(SensorError::Device(
                "still in boot mode after application start".into(),
            ));
        }

        debug!("CCS811 at 0x{:02X} measuring in 1s drive mode", address);
        Ok(Self { i2c, address })
    }

    #[cfg(test)]
    pub(crate) fn release(self) -> I2C {
        self.i2c
    }
}

fn read_register<I2C: I2c>(i2c: &mut I2C, address: u8, register: u8) -> SensorResult<u8> {
    let mut buf = [0u8; 1];
    i2c.write_read(address, &[register], &mut buf)
        .map_err(SensorError::bus)?;
    Ok(buf[0])
}

#[async_trait::async_trait]
impl<I2C: I2c + Send> SensorAdapter for Ccs811<I2C> {
    fn kind(&self) -> SensorKind {
        SensorKind::AirQuality
    }

    async fn read(&mut self) -> SensorResult<Sample> {
        let status = read_register(&mut self.i2c, self.address, REG_STATUS)?;

        if status & STATUS_ERROR != 0 {
            let code = read_register(&mut self.i2c, self.address, REG_ERROR_ID)?;
            return Err(SensorError::Device(format!("error id 0x{:02X}", code)));
        }
        if status & STATUS_DATA_READY == 0 {
            return Ok(Sample::Pending);
        }

        let mut data = [0u8; 4];
        self.i2c
            .write_read(self.address, &[REG_ALG_RESULT_DATA], &mut data)
            .map_err(SensorError::bus)?;

        Ok(Sample::Ready(Reading::AirQuality {
            eco2: u16::from_be_bytes([data[0], data[1]]),
            tvoc: u16::from_be_bytes([data[2], data[3]]),
        }))
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock, Transaction};

    use super::*;

    const ADDR: u8 = 0x5A;

    fn register(reg: u8, value: u8) -> Transaction {
        Transaction::write_read(ADDR, vec![reg], vec![value])
    }

    fn init_transactions() -> Vec<Transaction> {
        vec![
            register(REG_HW_ID, HW_ID),
            register(REG_STATUS, STATUS_APP_VALID),
            Transaction::write(ADDR, vec![APP_START]),
            Transaction::write(ADDR, vec![REG_MEAS_MODE, DRIVE_MODE_1S]),
            register(REG_STATUS, STATUS_FW_MODE | STATUS_APP_VALID),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_decodes_big_endian_values() {
        let mut expectations = init_transactions();
        expectations.push(register(
            REG_STATUS,
            STATUS_FW_MODE | STATUS_APP_VALID | STATUS_DATA_READY,
        ));
        // 412 ppm eCO2, 87 ppb TVOC
        expectations.push(Transaction::write_read(
            ADDR,
            vec![REG_ALG_RESULT_DATA],
            vec![0x01, 0x9C, 0x00, 0x57],
        ));
        let mock = Mock::new(&expectations);

        let mut sensor = Ccs811::initialize(mock, ADDR).await.unwrap();
        assert_eq!(
            sensor.read().await.unwrap(),
            Sample::Ready(Reading::AirQuality { eco2: 412, tvoc: 87 })
        );

        sensor.release().done();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_new_data_is_pending() {
        let mut expectations = init_transactions();
        expectations.push(register(REG_STATUS, STATUS_FW_MODE | STATUS_APP_VALID));
        let mock = Mock::new(&expectations);

        let mut sensor = Ccs811::initialize(mock, ADDR).await.unwrap();
        assert_eq!(sensor.read().await.unwrap(), Sample::Pending);

        sensor.release().done();
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_reads_error_id() {
        let mut expectations = init_transactions();
        expectations.push(register(REG_STATUS, STATUS_FW_MODE | STATUS_ERROR));
        expectations.push(register(REG_ERROR_ID, 0x04));
        let mock = Mock::new(&expectations);

        let mut sensor = Ccs811::initialize(mock, ADDR).await.unwrap();
        match sensor.read().await {
            Err(SensorError::Device(msg)) => assert!(msg.contains("0x04")),
            other => panic!("unexpected result: {other:?}"),
        }

        sensor.release().done();
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_hardware_id_is_unsupported() {
        let expectations = [register(REG_HW_ID, 0x55)];
        let mut mock = Mock::new(&expectations);

        let result = Ccs811::initialize(mock.clone(), ADDR).await;
        assert!(matches!(result, Err(SensorError::Unsupported(_))));

        mock.done();
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_firmware_fails_init() {
        let expectations = [register(REG_HW_ID, HW_ID), register(REG_STATUS, 0x00)];
        let mut mock = Mock::new(&expectations);

        let result = Ccs811::initialize(mock.clone(), ADDR).await;
        assert!(matches!(result, Err(SensorError::Device(_))));

        mock.done();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_in_boot_mode_fails_init() {
        let mut expectations = init_transactions();
        expectations.pop();
        expectations.push(register(REG_STATUS, STATUS_APP_VALID));
        let mut mock = Mock::new(&expectations);

        let result = Ccs811::initialize(mock.clone(), ADDR).await;
        assert!(matches!(result, Err(SensorError::Device(_))));

        mock.done();
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_device_fails_init() {
        let expectations =
            [Transaction::write_read(ADDR, vec![REG_HW_ID], vec![0]).with_error(ErrorKind::Other)];
        let mut mock = Mock::new(&expectations);

        let result = Ccs811::initialize(mock.clone(), ADDR).await;
        assert!(matches!(result, Err(SensorError::Bus(_))));

        mock.done();
    }
}
