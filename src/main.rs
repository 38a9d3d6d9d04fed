use std::{process, sync::Arc};

use tracing::{debug, error, info};
use weatherstation::{
    config::Settings,
    core::{
        sampler::Sampler,
        sensors,
        telemetry::{TelemetryPublisher, Transport},
    },
    logger::LoggerManager,
    print_error, print_warn,
};
use weatherstation_mqtt::{MqttManager, Publisher};

fn load_settings() -> Settings {
    let path = Settings::config_path();
    Settings::load(&path).unwrap_or_else(|e| {
        print_error!("{}: {}", path.display(), e);
        print_warn!("Continuing with default settings");
        Settings::default()
    })
}

#[tokio::main]
async fn main() {
    let settings = load_settings();

    let logger_manager = LoggerManager::new(settings.logger.clone()).unwrap_or_else(|e| {
        print_error!("Failed to setup Log Manager: {}", e);
        process::exit(1);
    });
    logger_manager.init().unwrap_or_else(|e| {
        print_error!("Failed to init Log Manager: {}", e);
        process::exit(1);
    });

    info!("Starting weatherstation version {}...", env!("CARGO_PKG_VERSION"));
    info!("Log level: {}", settings.logger.level);

    let broker = &settings.broker;
    info!("{}@{}:{}", broker.username, broker.host, broker.port);
    info!("Identity {}", broker.client_id);
    info!("Channel {}", settings.channel.channel);
    debug!("Write API key {}", settings.channel.write_key);
    debug!("{:#?}", broker);

    let manager = MqttManager::from_config(settings.broker.clone()).unwrap_or_else(|e| {
        error!("Invalid broker configuration: {}", e);
        process::exit(1);
    });
    let instance = manager.connect().await.unwrap_or_else(|e| {
        error!("Unable to connect: {}", e);
        process::exit(1);
    });
    info!("Broker session established as '{}'", instance.client_id());

    let detected = sensors::detect(&settings.sensors).await;
    let found = detected.report.iter().filter(|d| d.is_detected()).count();
    info!("{} of {} sensor(s) detected", found, detected.report.len());

    let transport: Arc<dyn Transport> = Arc::new(Publisher::new(&instance));
    let publisher = TelemetryPublisher::new(transport, &settings.channel);
    let sampler = Sampler::new(detected.sensors, publisher, settings.sampling.clone())
        .with_connection_state(instance.state_receiver());

    if sampler.sensor_count() == 0 {
        error!("No sensors detected; nothing will be published");
    }

    sampler.run().await
}
