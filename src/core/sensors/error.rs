use thiserror::Error;

/// Errors raised while initializing or reading a sensor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    /// The bus device could not be opened or an I2C transfer failed.
    #[error("I2C bus error: {0}")]
    Bus(String),

    /// The device answered but reported a fault or an unexpected state.
    #[error("Device error: {0}")]
    Device(String),

    /// The measurement is unusable (e.g. a field carried the
    /// not-available sentinel).
    #[error("Measurement not available: {0}")]
    NotAvailable(String),

    #[error("CRC mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    Checksum { expected: u8, actual: u8 },

    /// Something else is listening on the configured address.
    #[error("Unsupported device: {0}")]
    Unsupported(String),
}

impl SensorError {
    /// Wraps any `embedded-hal` I2C error.
    pub fn bus<E: embedded_hal::i2c::Error>(err: E) -> Self {
        SensorError::Bus(format!("{:?}", err.kind()))
    }
}

pub type SensorResult<T> = Result<T, SensorError>;
