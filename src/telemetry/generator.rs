//! Synthetic vital-sign generation
//!
//! Generation is a pipeline of pure functions over a caller-provided random
//! source: roll a target severity, sample vitals toward it, force consistency
//! if the dice missed, then re-derive the stored severity from the final
//! values with [`classify`]. The target severity is advisory; the derived one
//! is authoritative.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::telemetry::record::{classify, Severity, TelemetryRecord, VitalSigns};

/// Default probability of a warning-severity record, percent.
pub const DEFAULT_WARNING_RATE_PERCENT: f64 = 10.0;
/// Default probability of a critical-severity record, percent.
pub const DEFAULT_CRITICAL_RATE_PERCENT: f64 = 1.0;

/// Timestamp format for telemetry records: UTC, second precision.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Map a uniform roll in [0,1) to a target severity.
///
/// The unit interval is partitioned `[0, cr)` critical, `[cr, cr+wr)`
/// warning, remainder normal. Rates are not validated: if they sum past 100
/// the critical band is checked first and silently wins, shrinking the
/// effective warning and normal probabilities. This mirrors the behavior the
/// simulator has always had and is deliberately not "fixed".
pub fn severity_for_roll(roll: f64, warning_rate_percent: f64, critical_rate_percent: f64) -> Severity {
    let cr = critical_rate_percent / 100.0;
    let wr = warning_rate_percent / 100.0;
    if roll < cr {
        Severity::Critical
    } else if roll < cr + wr {
        Severity::Warning
    } else {
        Severity::Normal
    }
}

/// Roll a target severity from the configured rates.
pub fn target_severity<R: Rng + ?Sized>(
    rng: &mut R,
    warning_rate_percent: f64,
    critical_rate_percent: f64,
) -> Severity {
    severity_for_roll(rng.gen::<f64>(), warning_rate_percent, critical_rate_percent)
}

/// Sample the classification-relevant vitals toward a target severity.
///
/// In the warning and critical branches each vital independently lands in its
/// abnormal sub-range or its normal sub-range with equal probability, so a
/// record can carry one, two, or three abnormal vitals. Nothing here
/// guarantees the target is actually reached; that is [`ensure_consistent`]'s
/// job.
pub fn sample<R: Rng + ?Sized>(rng: &mut R, target: Severity) -> VitalSigns {
    match target {
        Severity::Critical => VitalSigns {
            heart_rate: if rng.gen_bool(0.5) {
                rng.gen_range(121..=160) // tachycardia
            } else {
                rng.gen_range(60..=99)
            },
            body_temperature: round1(if rng.gen_bool(0.5) {
                rng.gen_range(38.6..=40.0) // high fever
            } else {
                rng.gen_range(36.0..=37.4)
            }),
            spo2: if rng.gen_bool(0.5) {
                rng.gen_range(80..=89) // hypoxemia
            } else {
                rng.gen_range(95..=100)
            },
        },
        Severity::Warning => VitalSigns {
            heart_rate: if rng.gen_bool(0.5) {
                rng.gen_range(101..=120)
            } else {
                rng.gen_range(60..=99)
            },
            body_temperature: round1(if rng.gen_bool(0.5) {
                rng.gen_range(37.6..=38.5) // low-grade fever
            } else {
                rng.gen_range(36.0..=37.4)
            }),
            spo2: if rng.gen_bool(0.5) {
                rng.gen_range(91..=94)
            } else {
                rng.gen_range(95..=100)
            },
        },
        Severity::Normal => VitalSigns {
            heart_rate: rng.gen_range(60..=99),
            body_temperature: round1(rng.gen_range(36.0..=37.4)),
            spo2: rng.gen_range(95..=100),
        },
    }
}

/// Force the sampled vitals to actually trigger the target severity.
///
/// If every coin flip in [`sample`] came up normal, one vital chosen
/// uniformly among the three is pushed into the target's abnormal sub-range.
/// The warning sub-ranges never reach critical-triggering values, so a
/// warning correction cannot escalate the record. No-op for a normal target.
pub fn ensure_consistent<R: Rng + ?Sized>(
    rng: &mut R,
    target: Severity,
    mut vitals: VitalSigns,
) -> VitalSigns {
    match target {
        Severity::Critical if !vitals.is_critical_triggering() => match rng.gen_range(0..3) {
            0 => vitals.heart_rate = rng.gen_range(121..=160),
            1 => vitals.body_temperature = round1(rng.gen_range(38.6..=40.0)),
            _ => vitals.spo2 = rng.gen_range(80..=89),
        },
        Severity::Warning if !vitals.is_warning_triggering() => match rng.gen_range(0..3) {
            0 => vitals.heart_rate = rng.gen_range(101..=120),
            1 => vitals.body_temperature = round1(rng.gen_range(37.6..=38.5)),
            _ => vitals.spo2 = rng.gen_range(91..=94),
        },
        _ => {}
    }
    vitals
}

/// Blood pressure and respiratory rate, banded by target severity.
///
/// These are cosmetic correlates: they move monotonically with severity but
/// never influence classification and are exempt from the consistency
/// guarantee.
struct Correlates {
    systolic: u32,
    diastolic: u32,
    respiratory_rate: f64,
}

fn sample_correlates<R: Rng + ?Sized>(rng: &mut R, target: Severity) -> Correlates {
    match target {
        Severity::Critical => Correlates {
            systolic: rng.gen_range(140..=180),
            diastolic: rng.gen_range(90..=110),
            respiratory_rate: round1(rng.gen_range(22.0..=30.0)),
        },
        Severity::Warning => Correlates {
            systolic: rng.gen_range(130..=150),
            diastolic: rng.gen_range(80..=95),
            respiratory_rate: round1(rng.gen_range(18.0..=24.0)),
        },
        Severity::Normal => Correlates {
            systolic: rng.gen_range(110..=139),
            diastolic: rng.gen_range(70..=89),
            respiratory_rate: round1(rng.gen_range(12.0..=17.9)),
        },
    }
}

/// Generate one telemetry record from an explicit random source and clock.
///
/// This is the deterministic entry point: tests inject a seeded rng and a
/// fixed timestamp. `patient_status` is re-derived from the final vitals, not
/// taken from the sampling branch.
pub fn generate_with<R: Rng + ?Sized>(
    rng: &mut R,
    now: DateTime<Utc>,
    device_id: &str,
    warning_rate_percent: f64,
    critical_rate_percent: f64,
) -> TelemetryRecord {
    let target = target_severity(rng, warning_rate_percent, critical_rate_percent);
    let sampled = sample(rng, target);
    let vitals = ensure_consistent(rng, target, sampled);
    let correlates = sample_correlates(rng, target);

    TelemetryRecord {
        device_id: device_id.to_string(),
        timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
        heart_rate: vitals.heart_rate,
        blood_pressure_systolic: correlates.systolic,
        blood_pressure_diastolic: correlates.diastolic,
        body_temperature: vitals.body_temperature,
        spo2: vitals.spo2,
        respiratory_rate: correlates.respiratory_rate,
        patient_status: classify(&vitals),
    }
}

/// Generate one telemetry record using the thread-local rng and wall clock.
pub fn generate(
    device_id: &str,
    warning_rate_percent: f64,
    critical_rate_percent: f64,
) -> TelemetryRecord {
    generate_with(
        &mut rand::thread_rng(),
        Utc::now(),
        device_id,
        warning_rate_percent,
        critical_rate_percent,
    )
}
