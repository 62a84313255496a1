use super::flight_recorder::{CommandError, FlightRecorder, LoggerEvent, StatusSnapshot};
use super::time_sync::TimeSyncResult;
use crate::{event, info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, watch, Mutex, RwLock};

/// One ground-side request, paired with its reply channel. The network
/// layer stays outside the core; it only gets this handle.
pub enum GroundCommand {
    Arm(oneshot::Sender<Result<(), CommandError>>),
    Disarm(oneshot::Sender<Result<(), CommandError>>),
    SyncTime(String, oneshot::Sender<Result<TimeSyncResult, CommandError>>),
    StartCalibration(oneshot::Sender<Result<(), CommandError>>),
    StopCalibration(oneshot::Sender<Result<(), CommandError>>),
}

/// Drives the recorder's cooperative tick loop and brokers everything
/// that crosses the tick boundary: queued ground commands are applied
/// between ticks, hook events are forwarded after the lock is released,
/// and the latest snapshot is published on a watch channel so readers
/// never block the loop.
pub struct Supervisor {
    rec_lock: Arc<RwLock<FlightRecorder>>,
    cmd_rx: Mutex<mpsc::Receiver<GroundCommand>>,
    snapshot_tx: watch::Sender<StatusSnapshot>,
}

impl Supervisor {
    /// Tick interval of the cooperative loop.
    const TICK_INTERVAL: std::time::Duration = std::time::Duration::from_millis(1);
    /// Toggle period of the repeating init-failure pattern.
    const HALT_BLINK: std::time::Duration = std::time::Duration::from_millis(100);

    pub fn new(
        rec_lock: Arc<RwLock<FlightRecorder>>,
        initial: StatusSnapshot,
    ) -> (Supervisor, mpsc::Sender<GroundCommand>, watch::Receiver<StatusSnapshot>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        (
            Self {
                rec_lock,
                cmd_rx: Mutex::new(cmd_rx),
                snapshot_tx,
            },
            cmd_tx,
            snapshot_rx,
        )
    }

    pub async fn run(&self) {
        let start = Instant::now();
        let mut cmd_rx = self.cmd_rx.lock().await;
        loop {
            let now_ms = start.elapsed().as_millis() as u64;
            let mut rec = self.rec_lock.write().await;
            while let Ok(cmd) = cmd_rx.try_recv() {
                Self::apply(&mut rec, cmd);
            }
            rec.tick(now_ms);
            let events = rec.drain_events();
            let snapshot = rec.status_snapshot();
            drop(rec); // Release the lock before forwarding and sleeping.

            for ev in events {
                Self::forward(&ev);
            }
            self.snapshot_tx.send_replace(snapshot);

            tokio::time::sleep(Self::TICK_INTERVAL).await;
        }
    }

    /// Commands run between ticks, inside the same lock as the tick, so
    /// no request ever observes a half-updated pipeline.
    fn apply(rec: &mut FlightRecorder, cmd: GroundCommand) {
        match cmd {
            GroundCommand::Arm(reply) => {
                let _ = reply.send(rec.arm());
            }
            GroundCommand::Disarm(reply) => {
                let _ = reply.send(rec.disarm());
            }
            GroundCommand::SyncTime(raw, reply) => {
                let _ = reply.send(rec.sync_time(&raw));
            }
            GroundCommand::StartCalibration(reply) => {
                let _ = reply.send(rec.start_calibration());
            }
            GroundCommand::StopCalibration(reply) => {
                let _ = reply.send(rec.stop_calibration());
            }
        }
    }

    fn forward(ev: &LoggerEvent) {
        match ev {
            LoggerEvent::LogOpen => info!("storage hook: open a new flight log"),
            LoggerEvent::LogClose => info!("storage hook: close the flight log"),
            LoggerEvent::TimeSynced(result) => event!("time synced, zone {}", result.zone),
            LoggerEvent::StateChanged { from, to } => info!("flight state {from} -> {to}"),
            LoggerEvent::CalibrationComputed(cal) => {
                info!("persistence hook: store calibration {cal:?}");
            }
            LoggerEvent::CalibrationRejected(e) => warn!("calibration window rejected: {e}"),
            LoggerEvent::BeaconOverrun { behind_ms } => {
                warn!("tick loop behind schedule: beacon toggled {behind_ms}ms late");
            }
        }
    }

    /// Repeating failure pattern after an unrecoverable init error.
    /// Never returns; continuing with a dead sensor would log corrupt
    /// flight data.
    pub async fn run_halt_beacon() -> ! {
        let mut lit = false;
        loop {
            lit = !lit;
            event!("halt beacon {}", if lit { "on" } else { "off" });
            tokio::time::sleep(Self::HALT_BLINK).await;
        }
    }
}
