//! Sortbay - Pick-and-place sorter supervisor
//!
//! Host binary for a six-slot storage rack fed by a jointed arm. Runs the
//! fixed-tick supervisory loop on the embassy executor, hands arm work to
//! short-lived motion worker threads, and takes operator commands as JSON
//! lines on stdin. Status lines go to stdout, logs to stderr.
//!
//! With no hardware attached the cell is simulated end to end.

mod channels;
mod config;
mod error;
mod hardware;
mod tasks;

use embassy_executor::Spawner;
use log::{error, info};
use static_cell::StaticCell;

use sortbay_drivers::sim::SimCell;

use crate::config::AppConfig;
use crate::hardware::Hardware;

// Static cells for state shared with worker threads (must live forever)
static APP_CONFIG: StaticCell<AppConfig> = StaticCell::new();
static HARDWARE: StaticCell<Hardware> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Sortbay supervisor v{} starting...", env!("CARGO_PKG_VERSION"));

    let path = config::parse_config_path();
    let app = match config::load(path.as_deref()) {
        Ok(app) => app,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    let app: &'static AppConfig = APP_CONFIG.init(app);
    info!("Configuration loaded");

    let cell = SimCell::new(&app.sim, &app.cell);
    let hardware: &'static Hardware = HARDWARE.init(Hardware::new(&cell));
    info!("Simulated cell initialized");

    if let Err(e) = tasks::spawn_command_reader(cell.clone()) {
        error!("{}", e);
        std::process::exit(1);
    }

    tasks::supervise(app, hardware, cell.vision()).await;
}
