//! The sampling loop.
//!
//! Each cycle walks the detected sensors in order, publishes every field of
//! a successful reading and then sleeps for the sampling interval. Nothing
//! is retried: a failed read or publish is logged and that value is lost.

use tokio::{sync::watch, time::sleep};
use tracing::{debug, error, info, warn};
use weatherstation_mqtt::ConnectionState;

use super::{
    sensors::{Sample, SensorAdapter},
    telemetry::TelemetryPublisher,
};
use crate::config::station::SamplingConfig;

/// What happened during one pass over the sensors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Field values handed to the transport.
    pub published: usize,
    pub failed_publishes: usize,
    pub failed_reads: usize,
    /// Sensors that had no new data.
    pub skipped: usize,
}

pub struct Sampler {
    sensors: Vec<Box<dyn SensorAdapter>>,
    publisher: TelemetryPublisher,
    config: SamplingConfig,
    connection: Option<watch::Receiver<ConnectionState>>,
}

impl Sampler {
    pub fn new(
        sensors: Vec<Box<dyn SensorAdapter>>,
        publisher: TelemetryPublisher,
        config: SamplingConfig,
    ) -> Self {
        Self {
            sensors,
            publisher,
            config,
            connection: None,
        }
    }

    /// Follows the broker session so each cycle can say up front when its
    /// publishes are going nowhere.
    pub fn with_connection_state(mut self, state: watch::Receiver<ConnectionState>) -> Self {
        self.connection = Some(state);
        self
    }

    fn check_connection(&self) {
        let Some(connection) = &self.connection else {
            return;
        };

        let state = connection.borrow().clone();
        if state.is_terminal() {
            error!(
                "Broker connection {}; readings this cycle will be dropped",
                state
            );
        } else if !state.is_connected() {
            warn!("Broker connection {}; publishes may be lost", state);
        }
    }

    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    /// Reads every sensor once and publishes what it got.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();
        let field_pause = self.config.field_pause();
        self.check_connection();

        for sensor in self.sensors.iter_mut() {
            let kind = sensor.kind();

            let reading = match sensor.read().await {
                Ok(Sample::Ready(reading)) => reading,
                Ok(Sample::Pending) => {
                    info!("Read {}: no new data", kind);
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!("Failed to read {} sensor: {}", kind, e);
                    report.failed_reads += 1;
                    continue;
                }
            };

            info!("Read {}: {}", kind, reading);

            for (i, (field, payload)) in reading.fields().into_iter().enumerate() {
                if i > 0 {
                    sleep(field_pause).await;
                }

                let number = field.number();
                match self.publisher.publish(number, payload.clone()).await {
                    Ok(()) => {
                        info!("Sent {} {} on field{}", field.name(), payload, number);
                        report.published += 1;
                    }
                    Err(e) => {
                        error!(
                            "Failed to send {} on field{}: {}",
                            field.name(),
                            number,
                            e
                        );
                        report.failed_publishes += 1;
                    }
                }
            }
        }

        report
    }

    /// Samples forever.
    pub async fn run(mut self) -> ! {
        let interval = self.config.interval();
        info!(
            "Sampling {} sensor(s) every {}s",
            self.sensors.len(),
            self.config.interval
        );

        loop {
            let report = self.run_cycle().await;
            debug!("Cycle finished: {:?}", report);
            sleep(interval).await;
        }
    }
}
