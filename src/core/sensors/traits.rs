use super::{
    error::SensorResult,
    types::{Sample, SensorKind},
};

/// A detected, initialized sensor.
///
/// Values of this trait only exist for sensors whose initialization
/// succeeded; `read` is the sole operation the sampling loop needs.
/// Implementations talk to the bus synchronously (transfers are a few bytes)
/// and await only for measurement delays.
#[async_trait::async_trait]
pub trait SensorAdapter: Send {
    fn kind(&self) -> SensorKind;

    /// Takes one measurement. `Ok(Sample::Pending)` means the device is fine
    /// but has nothing new; an error means this cycle's value is lost.
    async fn read(&mut self) -> SensorResult<Sample>;
}
