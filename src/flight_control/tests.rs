use super::beacon::LivenessBeacon;
use super::flight_recorder::{CommandError, FlightRecorder, LoggerEvent};
use super::flight_state::FlightState;
use super::supervisor::{GroundCommand, Supervisor};
use super::time_sync::{parse_client_time, DeviceClock, TimeSyncError};
use crate::acquisition::{AccelSource, SensorSuite};
use crate::config::LoggerConfig;
use crate::sim::{BenchBaro, BenchBattery};
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};

/// Deterministic accelerometer that sweeps through a known raw range.
struct SweepAccel {
    next: u16,
    lo: u16,
    hi: u16,
}

impl SweepAccel {
    fn new(lo: u16, hi: u16) -> Self {
        Self { next: lo, lo, hi }
    }
}

impl AccelSource for SweepAccel {
    fn read_axes(&mut self) -> [u16; 3] {
        let v = self.next;
        self.next = if v >= self.hi { self.lo } else { v + 1 };
        [v, v, v]
    }
}

fn test_recorder() -> FlightRecorder {
    let cfg = LoggerConfig::flight_defaults();
    let sensors = SensorSuite {
        accel: Box::new(SweepAccel::new(1975, 1992)),
        baro: Box::new(BenchBaro::default()),
        battery: Box::new(BenchBattery::default()),
    };
    FlightRecorder::new(&cfg, sensors).expect("bench sensors must init")
}

const CLIENT_TIME: &str = "01/05/2024 22:00:38 GMT-0500 (Eastern Standard Time)";

#[test]
fn parses_the_client_time_layout() {
    let result = parse_client_time("01/05/2024 22:00:38 GMT-0500").unwrap();
    assert_eq!(result.month, 1);
    assert_eq!(result.day, 5);
    assert_eq!(result.year, 2024);
    assert_eq!(result.hour, 22);
    assert_eq!(result.minute, 0);
    assert_eq!(result.second, 38);
    assert_eq!(result.zone, "GMT-0500");
}

#[test]
fn rejects_malformed_time_strings() {
    // Missing leading zeros shifts every offset.
    assert!(matches!(
        parse_client_time("1/5/2024 22:00:38 GMT-0500"),
        Err(TimeSyncError::Malformed(_))
    ));
    assert!(matches!(
        parse_client_time("13/40/2024 22:00:38 GMT-0500"),
        Err(TimeSyncError::Malformed(_))
    ));
    assert!(matches!(parse_client_time(""), Err(TimeSyncError::Malformed(_))));
}

#[test]
fn device_clock_advances_with_tick_time() {
    let mut clock = DeviceClock::default();
    assert_eq!(clock.time_string(0), "--:--:--.---");
    let result = parse_client_time(CLIENT_TIME).unwrap();
    clock.set(1000, &result).unwrap();
    assert_eq!(clock.time_string(1000), "22:00:38.000");
    assert_eq!(clock.time_string(3500), "22:00:40.500");
    assert_eq!(clock.date_string(1000), "01/05/2024");
}

#[test]
fn arm_requires_time_sync() {
    let mut rec = test_recorder();
    let err = rec.arm().unwrap_err();
    assert_eq!(err, CommandError::PreconditionFailed("time not synced"));
    assert_eq!(err.to_string(), "time not synced");
    assert_eq!(rec.state(), FlightState::Idle);

    rec.sync_time(CLIENT_TIME).unwrap();
    assert!(rec.time_synced());
    rec.arm().unwrap();
    assert_eq!(rec.state(), FlightState::Armed);
}

#[test]
fn double_arm_is_rejected() {
    let mut rec = test_recorder();
    rec.sync_time(CLIENT_TIME).unwrap();
    rec.arm().unwrap();
    let err = rec.arm().unwrap_err();
    assert_eq!(err.to_string(), "already armed");
}

#[test]
fn disarm_only_from_armed() {
    let mut rec = test_recorder();
    assert_eq!(rec.disarm().unwrap_err().to_string(), "not armed");

    rec.sync_time(CLIENT_TIME).unwrap();
    rec.arm().unwrap();
    rec.disarm().unwrap();
    assert_eq!(rec.state(), FlightState::Idle);
}

#[test]
fn arming_switches_aggregation_cadence() {
    let mut rec = test_recorder();
    let cfg = LoggerConfig::flight_defaults();
    assert_eq!(rec.aggregation_cadence_ms(), cfg.slow_aggregate_ms);
    rec.sync_time(CLIENT_TIME).unwrap();
    rec.arm().unwrap();
    assert_eq!(rec.aggregation_cadence_ms(), cfg.fast_aggregate_ms);
    rec.disarm().unwrap();
    assert_eq!(rec.aggregation_cadence_ms(), cfg.slow_aggregate_ms);
}

#[test]
fn arm_and_disarm_raise_the_storage_hooks() {
    let mut rec = test_recorder();
    rec.sync_time(CLIENT_TIME).unwrap();
    rec.arm().unwrap();
    rec.disarm().unwrap();
    let events = rec.drain_events();
    assert!(events.contains(&LoggerEvent::LogOpen));
    assert!(events.contains(&LoggerEvent::LogClose));
    // A drain consumes: nothing left behind.
    assert!(rec.drain_events().is_empty());
}

#[test]
fn state_skips_are_illegal() {
    let mut rec = test_recorder();
    let err = rec.record_transition(FlightState::Launched).unwrap_err();
    assert_eq!(err.to_string(), "illegal transition: idle -> launched");
    assert!(rec.record_transition(FlightState::Apogee).is_err());
    assert!(rec.record_transition(FlightState::Landed).is_err());
}

#[test]
fn landed_is_terminal() {
    let mut rec = test_recorder();
    rec.sync_time(CLIENT_TIME).unwrap();
    rec.arm().unwrap();
    rec.record_transition(FlightState::Launched).unwrap();
    rec.record_transition(FlightState::Apogee).unwrap();
    rec.record_transition(FlightState::Landed).unwrap();
    for target in [
        FlightState::Idle,
        FlightState::Armed,
        FlightState::Launched,
        FlightState::Apogee,
        FlightState::Landed,
    ] {
        assert!(rec.record_transition(target).is_err());
    }
    assert!(rec.disarm().is_err());
    assert_eq!(rec.state(), FlightState::Landed);
}

#[test]
fn time_sync_refused_while_armed() {
    let mut rec = test_recorder();
    rec.sync_time(CLIENT_TIME).unwrap();
    rec.arm().unwrap();
    let err = rec.sync_time(CLIENT_TIME).unwrap_err();
    assert_eq!(err.to_string(), "armed");
}

#[test]
fn malformed_sync_leaves_clock_untouched() {
    let mut rec = test_recorder();
    assert!(rec.sync_time("garbage").is_err());
    assert!(!rec.time_synced());
    assert!(rec.arm().is_err());
}

#[test]
fn snapshot_is_idempotent_between_ticks() {
    let mut rec = test_recorder();
    rec.sync_time(CLIENT_TIME).unwrap();
    for now in 1..=500_u64 {
        rec.tick(now);
    }
    let first = rec.status_snapshot();
    let second = rec.status_snapshot();
    assert_eq!(first, second);
    assert!(first.time_synced);
    assert_eq!(first.date, "01/05/2024");
}

#[test]
fn snapshot_serializes_the_ground_payload_fields() {
    let mut rec = test_recorder();
    for now in 1..=200_u64 {
        rec.tick(now);
    }
    let json = serde_json::to_string(&rec.status_snapshot()).unwrap();
    for field in ["\"time\"", "\"date\"", "\"xAccel\"", "\"yAccel\"", "\"zAccel\"", "\"pressPa\"", "\"tempC\"", "\"tempF\"", "\"altM\"", "\"altFt\"", "\"battV\"", "\"state\"", "\"timeSynced\""] {
        assert!(json.contains(field), "missing {field} in {json}");
    }
    // The raw averages own the bare axis names, as the ground client
    // expects them.
    assert!(!json.contains("\"xAccelRaw\""));
}

#[test]
fn calibration_through_the_recorder() {
    let mut rec = test_recorder();
    rec.start_calibration().unwrap();
    assert!(rec.calibration_active());
    // Sweep source walks 1975..=1992 while the window is open.
    for now in 1..=200_u64 {
        rec.tick(now);
    }
    rec.stop_calibration().unwrap();
    assert!(!rec.calibration_active());

    let cal = rec.calibration();
    assert_eq!(cal.x.zero_raw, 1992 - (1992 - 1975) / 2);
    assert!((cal.x.scale_coef - 2.0 / 17.0).abs() < f64::EPSILON);
    assert!(rec
        .drain_events()
        .iter()
        .any(|e| matches!(e, LoggerEvent::CalibrationComputed(_))));
}

#[test]
fn rejected_calibration_keeps_previous_coefficients() {
    let cfg = LoggerConfig::flight_defaults();
    let sensors = SensorSuite {
        accel: Box::new(SweepAccel::new(2000, 2000)),
        baro: Box::new(BenchBaro::default()),
        battery: Box::new(BenchBattery::default()),
    };
    let mut rec = FlightRecorder::new(&cfg, sensors).unwrap();
    let before = rec.calibration();

    rec.start_calibration().unwrap();
    for now in 1..=100_u64 {
        rec.tick(now);
    }
    assert!(rec.stop_calibration().is_err());
    assert_eq!(rec.calibration(), before);
    assert!(rec
        .drain_events()
        .iter()
        .any(|e| matches!(e, LoggerEvent::CalibrationRejected(_))));
}

#[test]
fn calibration_refused_while_armed() {
    let mut rec = test_recorder();
    rec.sync_time(CLIENT_TIME).unwrap();
    rec.arm().unwrap();
    assert_eq!(rec.start_calibration().unwrap_err().to_string(), "armed");
}

#[tokio::test]
async fn supervisor_applies_ground_commands_between_ticks() {
    let rec = test_recorder();
    let initial = rec.status_snapshot();
    let rec_lock = Arc::new(RwLock::new(rec));
    let (supervisor, cmd_tx, mut snapshot_rx) = Supervisor::new(Arc::clone(&rec_lock), initial);
    let supervisor = Arc::new(supervisor);
    let supervisor_clone = Arc::clone(&supervisor);
    tokio::spawn(async move {
        supervisor_clone.run().await;
    });

    let (reply_tx, reply_rx) = oneshot::channel();
    cmd_tx.send(GroundCommand::Arm(reply_tx)).await.unwrap();
    let rejected = reply_rx.await.unwrap().unwrap_err();
    assert_eq!(rejected.to_string(), "time not synced");

    let (reply_tx, reply_rx) = oneshot::channel();
    cmd_tx
        .send(GroundCommand::SyncTime(String::from(CLIENT_TIME), reply_tx))
        .await
        .unwrap();
    reply_rx.await.unwrap().unwrap();

    let (reply_tx, reply_rx) = oneshot::channel();
    cmd_tx.send(GroundCommand::Arm(reply_tx)).await.unwrap();
    reply_rx.await.unwrap().unwrap();

    // The published snapshot catches up within a tick or two.
    let armed = snapshot_rx
        .wait_for(|snap| snap.state == FlightState::Armed)
        .await
        .unwrap();
    assert!(armed.time_synced);
}

#[test]
fn beacon_toggles_on_period_and_reports_overruns() {
    let mut beacon = LivenessBeacon::new(1000, 3);
    assert!(beacon.tick(999).is_none());
    let toggle = beacon.tick(1000).unwrap();
    assert_eq!(toggle.overrun_ms, None);
    assert!(!toggle.lit);

    // The loop stalls: next toggle lands 500ms late.
    let late = beacon.tick(2500).unwrap();
    assert_eq!(late.overrun_ms, Some(500));
    assert!(late.lit);

    // Back on schedule, within tolerance.
    let on_time = beacon.tick(3502).unwrap();
    assert_eq!(on_time.overrun_ms, None);
}
