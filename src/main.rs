#![allow(dead_code, clippy::similar_names)]
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
mod acquisition;
mod config;
mod flight_control;
mod logger;
mod sim;

use crate::acquisition::SensorSuite;
use crate::config::{DebugConfig, LoggerConfig};
use crate::flight_control::{FlightRecorder, Supervisor};
use crate::sim::{BenchAccel, BenchBaro, BenchBattery};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() {
    let cfg = LoggerConfig::load().unwrap_or_else(|e| fatal!("{e}"));
    info!("starting logger, aggregation {}ms/{}ms", cfg.fast_aggregate_ms, cfg.slow_aggregate_ms);

    debug_console_wait(&cfg.debug).await;

    let sensors = SensorSuite {
        accel: Box::new(BenchAccel::default()),
        baro: Box::new(BenchBaro::default()),
        battery: Box::new(BenchBattery::default()),
    };
    let recorder = match FlightRecorder::new(&cfg, sensors) {
        Ok(rec) => rec,
        Err(e) => {
            error!("{e}");
            Supervisor::run_halt_beacon().await;
        }
    };
    info!("sensors initialized, startup finished");

    let initial = recorder.status_snapshot();
    let rec_lock = Arc::new(RwLock::new(recorder));
    let (supervisor, _cmd_tx, mut snapshot_rx) = Supervisor::new(Arc::clone(&rec_lock), initial);
    let supervisor = Arc::new(supervisor);

    let supervisor_clone = Arc::clone(&supervisor);
    tokio::spawn(async move {
        supervisor_clone.run().await;
    });

    // Ground-side status chatter until the transport layer hooks in.
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            let snap = snapshot_rx.borrow_and_update().clone();
            event!(
                ">altM: {:.1}\n>battV: {:.2}\n>state: {}",
                snap.reading.alt_m,
                snap.reading.batt_v,
                snap.state
            );
        }
    });

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("signal handler failed: {e}");
    }
    info!("shutting down");
}

/// Bounded diagnostic startup phase: blink while waiting for a console,
/// but never past the configured cap and never in a flight build.
async fn debug_console_wait(debug: &DebugConfig) {
    if !debug.enabled {
        return;
    }
    info!("debug build: waiting up to {}ms for a console", debug.console_wait_ms);
    let deadline = tokio::time::Instant::now() + Duration::from_millis(debug.console_wait_ms);
    while tokio::time::Instant::now() < deadline {
        event!("startup blink");
        tokio::time::sleep(Duration::from_millis(150)).await;
    }
}
