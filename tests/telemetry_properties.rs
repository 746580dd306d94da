//! Telemetry generator property suite
//!
//! Exercises the generator's public contract over large seeded runs: the
//! emitted severity label always agrees with the emitted values, every field
//! stays in its clinical domain, the severity mix converges to the requested
//! rates at the extremes, and serialization is lossless.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use vitalink::telemetry::{classify, generate_with, Severity, TelemetryRecord};

fn fixed_now() -> DateTime<Utc> {
    "2024-05-01T12:00:00Z".parse().unwrap()
}

// ---------------------------------------------------------------------------
// Consistency and escalation
// ---------------------------------------------------------------------------

#[test]
fn status_always_matches_threshold_derivation() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..10_000 {
        let record = generate_with(&mut rng, fixed_now(), "dev1", 10.0, 1.0);
        assert_eq!(
            record.patient_status,
            classify(&record.vital_signs()),
            "label drifted from values in {record:?}"
        );
    }
}

#[test]
fn escalation_is_monotonic() {
    let mut rng = StdRng::seed_from_u64(43);
    for _ in 0..10_000 {
        let record = generate_with(&mut rng, fixed_now(), "dev1", 30.0, 10.0);
        let critical_trigger = record.heart_rate > 120
            || record.body_temperature > 38.5
            || record.spo2 < 90;
        let warning_trigger = record.heart_rate > 100
            || record.body_temperature > 37.5
            || record.spo2 < 95;

        match record.patient_status {
            Severity::Critical => assert!(critical_trigger, "critical without trigger: {record:?}"),
            Severity::Warning => {
                assert!(!critical_trigger, "warning with critical values: {record:?}");
                assert!(warning_trigger, "warning without trigger: {record:?}");
            }
            Severity::Normal => assert!(!warning_trigger, "normal with abnormal values: {record:?}"),
        }
    }
}

#[test]
fn all_fields_stay_in_domain() {
    let mut rng = StdRng::seed_from_u64(44);
    for _ in 0..10_000 {
        let record = generate_with(&mut rng, fixed_now(), "dev1", 50.0, 25.0);
        assert!((60..=180).contains(&record.heart_rate), "{record:?}");
        assert!(
            (110..=180).contains(&record.blood_pressure_systolic),
            "{record:?}"
        );
        assert!(
            (70..=110).contains(&record.blood_pressure_diastolic),
            "{record:?}"
        );
        assert!(
            (36.0..=40.0).contains(&record.body_temperature),
            "{record:?}"
        );
        assert!((80..=100).contains(&record.spo2), "{record:?}");
        assert!(
            (12.0..=30.0).contains(&record.respiratory_rate),
            "{record:?}"
        );
    }
}

// ---------------------------------------------------------------------------
// Distribution convergence
// ---------------------------------------------------------------------------

#[test]
fn full_critical_rate_yields_only_critical() {
    let mut rng = StdRng::seed_from_u64(45);
    for _ in 0..10_000 {
        let record = generate_with(&mut rng, fixed_now(), "dev1", 0.0, 100.0);
        assert_eq!(record.patient_status, Severity::Critical);
    }
}

#[test]
fn zero_rates_yield_only_normal() {
    // Forced escalation must never fire when the target is normal
    let mut rng = StdRng::seed_from_u64(46);
    for _ in 0..10_000 {
        let record = generate_with(&mut rng, fixed_now(), "dev1", 0.0, 0.0);
        assert_eq!(record.patient_status, Severity::Normal);
    }
}

#[test]
fn scenario_hundred_normal_records() {
    let mut rng = StdRng::seed_from_u64(47);
    for _ in 0..100 {
        let record = generate_with(&mut rng, fixed_now(), "dev1", 0.0, 0.0);
        assert_eq!(record.patient_status, Severity::Normal);
    }
}

#[test]
fn scenario_fifty_critical_records_with_triggering_vital() {
    let mut rng = StdRng::seed_from_u64(48);
    for _ in 0..50 {
        let record = generate_with(&mut rng, fixed_now(), "dev1", 0.0, 100.0);
        assert_eq!(record.patient_status, Severity::Critical);
        assert!(
            record.heart_rate > 120 || record.body_temperature > 38.5 || record.spo2 < 90,
            "no critical-triggering vital in {record:?}"
        );
    }
}

#[test]
fn moderate_rates_produce_a_mixed_stream() {
    let mut rng = StdRng::seed_from_u64(49);
    let mut counts = [0usize; 3];
    for _ in 0..10_000 {
        let record = generate_with(&mut rng, fixed_now(), "dev1", 20.0, 10.0);
        counts[match record.patient_status {
            Severity::Normal => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
        }] += 1;
    }
    // Loose bounds; exact fractions are 70/20/10 percent
    assert!(counts[0] > 6_000 && counts[0] < 8_000, "normal: {counts:?}");
    assert!(counts[1] > 1_400 && counts[1] < 2_600, "warning: {counts:?}");
    assert!(counts[2] > 600 && counts[2] < 1_400, "critical: {counts:?}");
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

#[test]
fn serialization_round_trips_field_for_field() {
    let mut rng = StdRng::seed_from_u64(50);
    for _ in 0..1_000 {
        let record = generate_with(&mut rng, fixed_now(), "dev1", 30.0, 10.0);
        let json = serde_json::to_string(&record).unwrap();
        let parsed: TelemetryRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}

#[test]
fn serialized_records_use_canonical_key_order() {
    let mut rng = StdRng::seed_from_u64(51);
    let record = generate_with(&mut rng, fixed_now(), "icu-device01", 10.0, 1.0);
    let json = serde_json::to_string(&record).unwrap();

    let keys = [
        "\"deviceId\"",
        "\"timestamp\"",
        "\"heartRate\"",
        "\"bloodPressureSystolic\"",
        "\"bloodPressureDiastolic\"",
        "\"bodyTemperature\"",
        "\"spo2\"",
        "\"respiratoryRate\"",
        "\"patientStatus\"",
    ];
    let mut last = 0;
    for key in keys {
        let pos = json.find(key).unwrap_or_else(|| panic!("missing {key}"));
        assert!(pos >= last, "{key} out of order in {json}");
        last = pos;
    }
    assert!(json.starts_with("{\"deviceId\":\"icu-device01\""));
    assert!(json.contains("\"timestamp\":\"2024-05-01T12:00:00Z\""));
}
