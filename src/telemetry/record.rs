//! Vital-sign records and severity classification
//!
//! The thresholds here are the single source of truth for what counts as a
//! warning or critical reading. Generation samples toward a target severity,
//! but the stored `patient_status` is always re-derived from the final
//! numeric values via [`classify`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Clinical urgency classification of a telemetry record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heart rate above this is warning-triggering (bpm).
pub const WARNING_HEART_RATE: u32 = 100;
/// Heart rate above this is critical-triggering (bpm).
pub const CRITICAL_HEART_RATE: u32 = 120;
/// Body temperature above this is warning-triggering (°C).
pub const WARNING_BODY_TEMPERATURE: f64 = 37.5;
/// Body temperature above this is critical-triggering (°C).
pub const CRITICAL_BODY_TEMPERATURE: f64 = 38.5;
/// SpO2 below this is warning-triggering (%).
pub const WARNING_SPO2: u32 = 95;
/// SpO2 below this is critical-triggering (%).
pub const CRITICAL_SPO2: u32 = 90;

/// The three vitals that drive severity classification.
///
/// Blood pressure and respiratory rate are cosmetic correlates and never
/// affect classification, so they are kept out of this type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VitalSigns {
    /// Beats per minute
    pub heart_rate: u32,
    /// °C, one decimal place
    pub body_temperature: f64,
    /// Oxygen saturation, percent
    pub spo2: u32,
}

impl VitalSigns {
    pub fn is_critical_triggering(&self) -> bool {
        self.heart_rate > CRITICAL_HEART_RATE
            || self.body_temperature > CRITICAL_BODY_TEMPERATURE
            || self.spo2 < CRITICAL_SPO2
    }

    pub fn is_warning_triggering(&self) -> bool {
        self.heart_rate > WARNING_HEART_RATE
            || self.body_temperature > WARNING_BODY_TEMPERATURE
            || self.spo2 < WARNING_SPO2
    }
}

/// Derive the authoritative severity from sampled vitals.
///
/// Starts at normal, escalates to warning, then to critical. The critical
/// conditions are a strict superset trigger of the warning conditions, so
/// escalation is monotonic.
pub fn classify(vitals: &VitalSigns) -> Severity {
    if vitals.is_critical_triggering() {
        Severity::Critical
    } else if vitals.is_warning_triggering() {
        Severity::Warning
    } else {
        Severity::Normal
    }
}

/// One telemetry message as sent to the hub.
///
/// Field declaration order is the wire order; serde emits keys in this order
/// and renames them to camelCase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord {
    pub device_id: String,
    /// UTC, ISO-8601, second precision, `Z` suffix
    pub timestamp: String,
    /// 60-180 bpm
    pub heart_rate: u32,
    /// 110-180 mmHg
    pub blood_pressure_systolic: u32,
    /// 70-110 mmHg
    pub blood_pressure_diastolic: u32,
    /// 36.0-40.0 °C, one decimal place
    pub body_temperature: f64,
    /// 80-100 %
    pub spo2: u32,
    /// 12.0-30.0 breaths/min, one decimal place
    pub respiratory_rate: f64,
    /// Always equals `classify` applied to this record's own vitals
    pub patient_status: Severity,
}

impl TelemetryRecord {
    /// The classification-relevant subset of this record.
    pub fn vital_signs(&self) -> VitalSigns {
        VitalSigns {
            heart_rate: self.heart_rate,
            body_temperature: self.body_temperature,
            spo2: self.spo2,
        }
    }
}
