// Copyright (c) 2026 gripflow contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/gripflow/gripflow-rs

//! GripFlow - Pressure Biofeedback Acquisition & Experiment Engine
//!
//! Headless session runner: acquires pressure at a fixed rate from a USB HID
//! converter (or a simulated source), drives a block-design experiment, and
//! persists the session artifacts as JSON.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use parking_lot::RwLock;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use gripflow::calibration::CalibrationPoint;
use gripflow::device::{FakePressure, PressureSource, SimulatedSource};
use gripflow::{
    BlockName, BlockOutcome, Calibration, Config, ProtocolLibrary, RealTimeReader,
    SessionController, SessionStatus, SubjectInfo, TwoStepScorer, VERSION,
};

/// GripFlow - Pressure Biofeedback Acquisition & Experiment Engine
#[derive(Parser, Debug)]
#[command(name = "gripflow")]
#[command(author = "GripFlow Project")]
#[command(version = VERSION)]
#[command(about = "Pressure biofeedback acquisition and block-design experiments")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Demo mode with a simulated pressure source
    #[arg(long)]
    demo: bool,

    /// Data output directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Protocol key to run (e.g. "Protocol 0")
    #[arg(short, long)]
    protocol: Option<String>,

    /// Subject identifier stamped into the session artifacts
    #[arg(short, long, default_value = "anonymous")]
    subject: String,

    /// List the saved protocols and exit
    #[arg(long)]
    list_protocols: bool,

    /// Recalibrate one constant (g0, g200 or offset_g0) from live data, then exit
    #[arg(long)]
    recalibrate: Option<String>,

    /// Fake-pressure trace file for fake-feedback blocks
    #[arg(long)]
    fake_trace: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("GripFlow v{} - pressure biofeedback engine", VERSION);

    // Load or create configuration
    let config_path = args.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    info!("Configuration loaded from {:?}", config_path);

    let protocols = ProtocolLibrary::open(&config.experiment.protocols_dir)?;
    if args.list_protocols {
        if protocols.is_empty() {
            println!("No saved protocols in {:?}", config.experiment.protocols_dir);
        }
        for key in protocols.keys() {
            let p = protocols.get(key)?;
            println!("{key}: {} ({} blocks, by {})", p.name, p.buffer.len(), p.maker);
        }
        return Ok(());
    }

    let calibration = Arc::new(RwLock::new(Calibration::load(
        &config.experiment.correction_dir,
        &config.device,
    )?));

    let source = open_source(&config, args.demo);
    info!("Pressure source: {}", source.describe());

    let mut fake = FakePressure::default();
    if let Some(path) = &args.fake_trace {
        if !fake.load_file(path) {
            warn!("Continuing with the default fake trace");
        }
    }

    let mut reader = RealTimeReader::new(
        source,
        fake,
        Arc::clone(&calibration),
        config.device.sample_rate,
        config.display.delay_seconds,
    );

    if let Some(point) = args.recalibrate {
        return recalibrate(&mut reader, &calibration, &point);
    }

    let design = match &args.protocol {
        Some(key) => protocols.get_buffer(key)?.to_vec(),
        None => {
            info!("No protocol given, running the built-in baseline design");
            vec![
                (BlockName::Real, 60.0),
                (BlockName::Hide, 30.0),
                (BlockName::Fake, 60.0),
            ]
        }
    };

    let scorer = TwoStepScorer::new(
        config.display.ref_value,
        config.display.two_step_mean_threshold,
        config.display.two_step_std_threshold,
    );

    let mut controller = SessionController::new(
        reader,
        scorer,
        config.display.two_step_window_seconds,
        &config.data_dir,
    );

    let subject = SubjectInfo {
        name: args.subject,
        ..SubjectInfo::default()
    };
    if !controller.start_block_design(&design, subject) {
        bail!("The block design was rejected");
    }

    run_session(&mut controller)
}

fn open_source(config: &Config, demo: bool) -> Box<dyn PressureSource> {
    #[cfg(feature = "hardware")]
    if !demo {
        match gripflow::device::HidSource::detect(&config.device.product_string) {
            Ok(source) => return Box::new(source),
            Err(e) => warn!("No pressure device found ({}), simulating instead", e),
        }
    }
    if demo {
        info!("Demo mode: simulated pressure source");
    }
    Box::new(SimulatedSource::new(
        config.device.g0,
        config.device.g200,
        config.device.sample_rate,
    ))
}

/// Collect one second of live raw counts and fold them into the calibration.
fn recalibrate(
    reader: &mut RealTimeReader,
    calibration: &RwLock<Calibration>,
    point: &str,
) -> Result<()> {
    let point = match point {
        "g0" => CalibrationPoint::G0,
        "g200" => CalibrationPoint::G200,
        "offset_g0" => CalibrationPoint::OffsetG0,
        other => bail!("Unknown calibration point {:?} (expected g0, g200 or offset_g0)", other),
    };

    reader.start();
    std::thread::sleep(Duration::from_secs(1));
    let window: Vec<i64> = reader.stop().iter().map(|s| s.raw).collect();

    let avg = calibration
        .write()
        .recalibrate(point, &window)
        .context("Recalibration failed")?;
    info!("Recalibrated {:?} to {}", point, avg);
    Ok(())
}

/// Drive the block state machine from the wall clock until the design runs out.
fn run_session(controller: &mut SessionController) -> Result<()> {
    let started = Instant::now();
    let mut live: Option<usize> = None;

    loop {
        std::thread::sleep(Duration::from_millis(100));
        let t = started.elapsed().as_secs_f64();

        controller.update_score();

        match controller.advance(t) {
            BlockOutcome::Current(block) => {
                if live != Some(block.index) {
                    live = Some(block.index);
                    info!(
                        "Block {}/{}: {} for {:.0}s ({:.0}s-{:.0}s)",
                        block.index + 1,
                        block.block_count,
                        block.name,
                        block.duration,
                        block.start,
                        block.stop
                    );
                }
            }
            BlockOutcome::Finished => {
                let folder = controller.finish(SessionStatus::Finished)?;
                info!("Design complete, session saved to {:?}", folder);
                return Ok(());
            }
            BlockOutcome::Empty => {
                warn!("No blocks pending, terminating");
                let folder = controller.finish(SessionStatus::Terminated)?;
                info!("Session saved to {:?}", folder);
                return Ok(());
            }
        }
    }
}
