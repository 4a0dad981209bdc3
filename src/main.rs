//! # Evwrap
//!
//! Wrap a physical input device in a remapping virtual device.
//!
//! This application grabs an evdev device exclusively and re-emits its
//! events through a uinput virtual device with translated event codes,
//! restoring the physical device's axis calibration on exit.

use clap::Parser;
use tracing::{error, info};

use evwrap::calibration::CalibrationLedger;
use evwrap::cli::Cli;
use evwrap::device::{build_virtual_device, PhysicalDevice};
use evwrap::error::Result;
use evwrap::forward;
use evwrap::mapping::MappingTable;
use evwrap::shutdown::ShutdownController;

/// Main entry point for evwrap
///
/// Initializes the application and runs the forward loop that carries
/// events from the grabbed physical device to the virtual one until a
/// termination signal arrives.
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Install SIGINT/SIGTERM/SIGHUP streams (before any device state
///      is touched, so a signal during startup cannot skip cleanup)
///    - Parse the `SYMBOL=CODE` mapping arguments
///    - Open and exclusively grab the physical device
///    - Record original axis calibration, zero fuzz/flat on mapped axes,
///      and create the virtual device
///
/// 2. **Forward Loop**
///    - Wait for physical events, translate them through the mapping
///      table, and write them to the virtual device
///    - Drop unmapped events; pass EV_SYN through unchanged
///
/// 3. **Shutdown**
///    - Restore the recorded axis calibration (exactly once, on every
///      exit path, including creation failures mid-startup)
///    - Exit 0 on a termination signal, or with the originating OS error
///      code on a fatal failure
#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("evwrap v{} starting...", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        error!("{err}");
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Signal streams go in first. Anything delivered after this point is
    // latched by the runtime and handled by the forward loop, so the
    // calibration ledger always gets its restore pass.
    let mut shutdown = ShutdownController::install()?;

    let table = MappingTable::parse(&cli.mappings)?;
    for entry in table.entries() {
        info!("mapping {}", entry.describe());
    }

    let mut physical = PhysicalDevice::open(&cli.device)?;
    physical.grab()?;
    info!(
        "grabbed physical device {} ({})",
        physical.path().display(),
        physical.name().unwrap_or("unnamed")
    );

    let mut ledger = CalibrationLedger::with_capacity(table.axis_count());
    let mut output = match build_virtual_device(&cli.name, &physical, &table, &mut ledger) {
        Ok(output) => output,
        Err(err) => {
            // Some axes may already carry the fuzz/flat override.
            ledger.restore_all(&physical);
            return Err(err);
        }
    };

    let result = forward::run(&mut physical, &mut output, &table, &mut shutdown).await;

    ledger.restore_all(&physical);

    match result {
        Ok(signal) => {
            info!("received {}, shutting down...", signal);
            Ok(())
        }
        Err(err) => Err(err),
    }
}
