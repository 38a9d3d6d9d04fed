//! weatherstation: environmental sensor poller and MQTT telemetry forwarder
//!
//! Reads ambient light (BH1750), temperature and humidity (SHT3x) and
//! eCO2/TVOC (CCS811) from local I2C buses and publishes every value to a
//! ThingSpeak-style broker on `channels/{channel}/publish/fields/field{N}/{key}`.
//!
//! ## Modules
//!
//! * `config`: the station configuration file (`/etc/weatherstation.cfg`,
//!   or `$WEATHERSTATION_CONFIG`), loaded key by key with defaults and
//!   validated with `validator`.
//!
//! * `core`: sensor drivers and startup detection, channel-addressed
//!   publishing, and the sampling loop.
//!
//! * `logger`: `tracing` subscriber setup with console (compact, pretty,
//!   JSON) and optional systemd journald output.
//!
//! The broker transport itself lives in the `weatherstation-mqtt` crate.

pub mod config;
pub mod core;
pub mod logger;
