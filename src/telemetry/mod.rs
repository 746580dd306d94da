//! Synthetic medical telemetry
//!
//! [`generator`] produces vital-sign records whose severity distribution is
//! caller-controlled while the emitted values always agree with the emitted
//! severity label under the thresholds in [`record`].

pub mod generator;
pub mod record;

pub use generator::{
    generate, generate_with, DEFAULT_CRITICAL_RATE_PERCENT, DEFAULT_WARNING_RATE_PERCENT,
};
pub use record::{classify, Severity, TelemetryRecord, VitalSigns};
