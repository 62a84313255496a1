use super::beacon::LivenessBeacon;
use super::flight_state::FlightState;
use super::time_sync::{parse_client_time, DeviceClock, TimeSyncError, TimeSyncResult};
use crate::acquisition::{
    init_baro, AccelSampler, BaroSampler, BatterySampler, CalibrationEngine, CalibrationError,
    InitError, PhysicalReading, SensorSuite, TelemetryAggregator,
};
use crate::config::{AccelCalibration, LoggerConfig};
use crate::{event, info};
use serde::Serialize;
use std::collections::VecDeque;
use strum_macros::Display;

/// Rejected-operation result for the command entry points. The Display
/// form is the machine-readable reason surfaced to the ground client.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum CommandError {
    #[strum(to_string = "{0}")]
    PreconditionFailed(&'static str),
    #[strum(to_string = "illegal transition: {from} -> {to}")]
    IllegalTransition { from: FlightState, to: FlightState },
    #[strum(to_string = "{0}")]
    TimeSync(TimeSyncError),
    #[strum(to_string = "{0}")]
    Calibration(CalibrationError),
}

impl std::error::Error for CommandError {}

impl From<TimeSyncError> for CommandError {
    fn from(value: TimeSyncError) -> Self { CommandError::TimeSync(value) }
}

impl From<CalibrationError> for CommandError {
    fn from(value: CalibrationError) -> Self { CommandError::Calibration(value) }
}

/// Hook signals raised by the core for external collaborators (log
/// storage, calibration persistence, ground reporting). The core itself
/// performs no storage I/O.
#[derive(Debug, Clone, PartialEq)]
pub enum LoggerEvent {
    /// Armed: storage should open a flight log.
    LogOpen,
    /// Disarmed: storage should close the open log.
    LogClose,
    TimeSynced(TimeSyncResult),
    StateChanged { from: FlightState, to: FlightState },
    CalibrationComputed(AccelCalibration),
    CalibrationRejected(CalibrationError),
    /// The tick loop fell behind its beacon schedule by `behind_ms`.
    BeaconOverrun { behind_ms: u64 },
}

/// Everything a status payload needs, captured from one instant of the
/// tick timeline. Field names match the ground client's XML/JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub time: String,
    pub date: String,
    #[serde(flatten)]
    pub reading: PhysicalReading,
    pub state: FlightState,
    pub time_synced: bool,
}

/// The logger core: samplers, calibration, aggregation, flight state,
/// device clock and beacon behind one cooperative `tick`.
///
/// All mutation happens inside `tick` or the command entry points, which
/// the caller must invoke from the same context between ticks. Flight
/// flags are never written from outside.
pub struct FlightRecorder {
    sensors: SensorSuite,
    accel: AccelSampler,
    baro: BaroSampler,
    battery: BatterySampler,
    cal_engine: CalibrationEngine,
    calibration: AccelCalibration,
    aggregator: TelemetryAggregator,
    state: FlightState,
    time_synced: bool,
    clock: DeviceClock,
    beacon: LivenessBeacon,
    fast_aggregate_ms: u64,
    slow_aggregate_ms: u64,
    last_tick_ms: u64,
    events: VecDeque<LoggerEvent>,
}

impl FlightRecorder {
    /// Brings up the sensor suite and assembles the pipeline. Barometer
    /// init retries a bounded number of times; exhaustion is fatal for
    /// the caller.
    pub fn new(cfg: &LoggerConfig, mut sensors: SensorSuite) -> Result<Self, InitError> {
        init_baro(sensors.baro.as_mut())?;
        Ok(Self {
            sensors,
            accel: AccelSampler::new(&cfg.accel),
            baro: BaroSampler::new(&cfg.baro),
            battery: BatterySampler::new(&cfg.battery),
            cal_engine: CalibrationEngine::new(cfg.calibration_timeout_ms),
            calibration: cfg.accel_calibration,
            aggregator: TelemetryAggregator::new(cfg),
            state: FlightState::Idle,
            time_synced: false,
            clock: DeviceClock::default(),
            beacon: LivenessBeacon::new(cfg.beacon_period_ms, cfg.beacon_tolerance_ms),
            fast_aggregate_ms: cfg.fast_aggregate_ms,
            slow_aggregate_ms: cfg.slow_aggregate_ms,
            last_tick_ms: 0,
            events: VecDeque::new(),
        })
    }

    pub fn state(&self) -> FlightState { self.state }

    pub fn time_synced(&self) -> bool { self.time_synced }

    pub fn calibration(&self) -> AccelCalibration { self.calibration }

    pub fn calibration_active(&self) -> bool { self.cal_engine.is_active() }

    pub fn beacon_lit(&self) -> bool { self.beacon.is_lit() }

    pub fn aggregation_cadence_ms(&self) -> u64 { self.aggregator.cadence_ms() }

    /// Advances every due pipeline stage for the instant `now_ms`.
    pub fn tick(&mut self, now_ms: u64) {
        self.last_tick_ms = now_ms;

        if let Some(raw) = self.accel.tick(now_ms, self.sensors.accel.as_mut()) {
            self.cal_engine.observe(raw);
        }
        if let Some(outcome) = self.cal_engine.tick(now_ms) {
            self.apply_calibration(outcome);
        }

        self.baro.tick(now_ms, self.sensors.baro.as_mut());
        self.battery.tick(now_ms, self.sensors.battery.as_mut());

        // Aggregation pauses while a calibration window is open; the
        // stale cadence anchor makes it fire right after the window ends.
        if !self.cal_engine.is_active() {
            self.aggregator.tick(now_ms, &self.accel, &self.baro, &self.battery, &self.calibration);
        }

        if let Some(toggle) = self.beacon.tick(now_ms) {
            event!("status beacon {}", if toggle.lit { "on" } else { "off" });
            if let Some(behind_ms) = toggle.overrun_ms {
                self.events.push_back(LoggerEvent::BeaconOverrun { behind_ms });
            }
        }
    }

    /// Drains the hook events raised since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<LoggerEvent> {
        self.events.drain(..).collect()
    }

    /// Current status for serialization. Pure with respect to the stored
    /// state: repeated calls without an intervening tick are identical.
    pub fn status_snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            time: self.clock.time_string(self.last_tick_ms),
            date: self.clock.date_string(self.last_tick_ms),
            reading: self.aggregator.latest(),
            state: self.state,
            time_synced: self.time_synced,
        }
    }

    /// Arms the logger for launch. Requires a synced clock; arming twice
    /// is rejected.
    pub fn arm(&mut self) -> Result<(), CommandError> {
        if self.state == FlightState::Armed {
            return Err(CommandError::PreconditionFailed("already armed"));
        }
        if !self.time_synced {
            return Err(CommandError::PreconditionFailed("time not synced"));
        }
        self.transition_to(FlightState::Armed)?;
        self.events.push_back(LoggerEvent::LogOpen);
        info!("logger is armed for launch");
        Ok(())
    }

    /// Disarms from Armed back to Idle. Deliberately unconditional beyond
    /// the state check: nothing stops a pad abort.
    pub fn disarm(&mut self) -> Result<(), CommandError> {
        if self.state != FlightState::Armed {
            return Err(CommandError::PreconditionFailed("not armed"));
        }
        self.transition_to(FlightState::Idle)?;
        self.events.push_back(LoggerEvent::LogClose);
        info!("logger has been disarmed");
        Ok(())
    }

    /// Transition entry point for the external launch/apogee/landing
    /// detectors. Skipping states or leaving Landed is rejected.
    pub fn record_transition(&mut self, target: FlightState) -> Result<(), CommandError> {
        self.transition_to(target)
    }

    fn transition_to(&mut self, target: FlightState) -> Result<(), CommandError> {
        if !self.state.can_transition_to(target) {
            return Err(CommandError::IllegalTransition { from: self.state, to: target });
        }
        let from = self.state;
        self.state = target;
        self.aggregator.set_cadence(if target.is_flight_active() {
            self.fast_aggregate_ms
        } else {
            self.slow_aggregate_ms
        });
        self.events.push_back(LoggerEvent::StateChanged { from, to: target });
        Ok(())
    }

    /// Syncs the device clock from the client's local-time string.
    /// Refused while armed or in flight: a clock jump mid-flight would
    /// corrupt the log timeline.
    pub fn sync_time(&mut self, raw: &str) -> Result<TimeSyncResult, CommandError> {
        if self.state.is_flight_active() {
            return Err(CommandError::PreconditionFailed("armed"));
        }
        let result = parse_client_time(raw)?;
        self.clock.set(self.last_tick_ms, &result)?;
        self.time_synced = true;
        self.events.push_back(LoggerEvent::TimeSynced(result.clone()));
        info!(
            "device clock set to {} {} ({})",
            self.clock.date_string(self.last_tick_ms),
            self.clock.time_string(self.last_tick_ms),
            result.zone
        );
        Ok(result)
    }

    /// Opens a calibration window. Refused while armed: the aggregation
    /// pause would starve the flight log.
    pub fn start_calibration(&mut self) -> Result<(), CommandError> {
        if self.state.is_flight_active() {
            return Err(CommandError::PreconditionFailed("armed"));
        }
        self.cal_engine.start(self.last_tick_ms)?;
        info!("accelerometer calibration window opened");
        Ok(())
    }

    /// External stop signal for an open calibration window.
    pub fn stop_calibration(&mut self) -> Result<(), CommandError> {
        let outcome = match self.cal_engine.stop() {
            Err(CalibrationError::NotActive) => {
                return Err(CommandError::Calibration(CalibrationError::NotActive));
            }
            other => other,
        };
        self.apply_calibration(outcome.clone());
        outcome.map(|_| ()).map_err(CommandError::Calibration)
    }

    /// A computed calibration replaces the working coefficients and is
    /// raised for external persistence; a rejected window leaves the
    /// previous coefficients untouched.
    fn apply_calibration(&mut self, outcome: Result<AccelCalibration, CalibrationError>) {
        match outcome {
            Ok(cal) => {
                self.calibration = cal;
                self.events.push_back(LoggerEvent::CalibrationComputed(cal));
                info!("calibration computed: {cal:?}");
            }
            Err(e) => {
                self.events.push_back(LoggerEvent::CalibrationRejected(e));
                info!("calibration rejected: {e}");
            }
        }
    }
}
