//! Runtime: sensors, telemetry publishing and the sampling loop.

pub mod sampler;
pub mod sensors;
pub mod telemetry;
