// Copyright (c) 2026 gripflow contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/gripflow/gripflow-rs

//! Real-time acquisition loop
//!
//! One producer thread samples the pressure source at a fixed cadence and
//! appends to two shared logs: the raw sample log and the delayed aggregate
//! log (window mean/std, timestamps shifted back by the delay). Consumers
//! take suffix snapshots through `peek*`; the logs are append-only while the
//! loop runs and are cleared on the next `start`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::fake::FakePressure;
use super::traits::{DelayedAggregate, PressureSource, Sample};
use crate::analysis::{mean, population_std};
use crate::calibration::Calibration;

/// Catnap between cadence checks when the next tick has not arrived yet
const TICK_SLEEP: Duration = Duration::from_millis(1);

struct Buffers {
    raw: RwLock<Vec<Sample>>,
    delayed: RwLock<Vec<DelayedAggregate>>,
    running: AtomicBool,
}

/// The source and playback trace travel into the sampling thread on start
/// and come back out on join, so a reader can be restarted.
struct Producer {
    source: Box<dyn PressureSource>,
    fake: FakePressure,
}

/// Fixed-rate pressure reader with a delayed aggregate stream.
pub struct RealTimeReader {
    sample_rate: u32,
    delay_seconds: f64,
    delay_points: usize,
    calibration: Arc<RwLock<Calibration>>,
    shared: Arc<Buffers>,
    idle: Option<Producer>,
    handle: Option<JoinHandle<Producer>>,
}

impl RealTimeReader {
    /// Build a reader around a pressure source.
    pub fn new(
        source: Box<dyn PressureSource>,
        fake: FakePressure,
        calibration: Arc<RwLock<Calibration>>,
        sample_rate: u32,
        delay_seconds: f64,
    ) -> Self {
        let delay_points = (delay_seconds * sample_rate as f64) as usize;
        debug!(
            "Reader over {} at {} Hz, delay {}s ({} points)",
            source.describe(),
            sample_rate,
            delay_seconds,
            delay_points
        );

        Self {
            sample_rate,
            delay_seconds,
            delay_points,
            calibration,
            shared: Arc::new(Buffers {
                raw: RwLock::new(Vec::new()),
                delayed: RwLock::new(Vec::new()),
                running: AtomicBool::new(false),
            }),
            idle: Some(Producer { source, fake }),
            handle: None,
        }
    }

    /// Configured sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Configured delay in seconds
    pub fn delay_seconds(&self) -> f64 {
        self.delay_seconds
    }

    /// True while the sampling thread is live
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Start the sampling loop on a fresh thread, clearing both logs.
    ///
    /// Starting an already-running reader is a guarded no-op: a second
    /// producer would corrupt the cadence of both logs.
    pub fn start(&mut self) {
        if self.is_running() {
            warn!("Reader already running, ignoring start request");
            return;
        }

        let Some(mut producer) = self.idle.take() else {
            warn!("Reader has no producer parts, ignoring start request");
            return;
        };

        self.shared.raw.write().clear();
        self.shared.delayed.write().clear();
        self.shared.running.store(true, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let calibration = Arc::clone(&self.calibration);
        let period = 1.0 / self.sample_rate as f64;
        let delay_points = self.delay_points;
        let delay_seconds = self.delay_seconds;

        self.handle = Some(std::thread::spawn(move || {
            sampling_loop(
                &mut producer,
                &shared,
                &calibration,
                period,
                delay_points,
                delay_seconds,
            );
            producer
        }));

        info!("Reader started");
    }

    /// Stop the sampling loop, join the thread, and return the full raw log.
    ///
    /// Joining before returning means a subsequent `start` can never race an
    /// old producer still finishing its last tick.
    pub fn stop(&mut self) -> Vec<Sample> {
        self.shared.running.store(false, Ordering::Release);

        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(producer) => self.idle = Some(producer),
                Err(_) => warn!("Sampling thread panicked"),
            }
        }

        let collected = self.shared.raw.read().clone();
        debug!("Reader stopped, session collected {} time points", collected.len());
        collected
    }

    /// Last `n` raw samples (fewer when the log is shorter), in order.
    pub fn peek(&self, n: usize) -> Vec<Sample> {
        let raw = self.shared.raw.read();
        let start = raw.len().saturating_sub(n);
        raw[start..].to_vec()
    }

    /// Last `n` delayed aggregates (fewer when the log is shorter), in order.
    pub fn peek_delayed(&self, n: usize) -> Vec<DelayedAggregate> {
        let delayed = self.shared.delayed.read();
        let start = delayed.len().saturating_sub(n);
        delayed[start..].to_vec()
    }

    /// Last `seconds` worth of raw samples at the configured rate.
    pub fn peek_by_seconds(&self, seconds: f64) -> Vec<Sample> {
        self.peek((seconds * self.sample_rate as f64) as usize)
    }

    /// Last `seconds` worth of delayed aggregates at the configured rate.
    pub fn peek_delayed_by_seconds(&self, seconds: f64) -> Vec<DelayedAggregate> {
        self.peek_delayed((seconds * self.sample_rate as f64) as usize)
    }
}

impl Drop for RealTimeReader {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
    }
}

fn sampling_loop(
    producer: &mut Producer,
    shared: &Buffers,
    calibration: &RwLock<Calibration>,
    period: f64,
    delay_points: usize,
    delay_seconds: f64,
) {
    let started = Instant::now();
    let mut tick: u64 = 0;

    debug!("Sampling loop running");

    while shared.running.load(Ordering::Acquire) {
        let elapsed = started.elapsed().as_secs_f64();

        // Cadence anchored at loop start: no drift accumulation from jitter
        if elapsed < tick as f64 * period {
            std::thread::sleep(TICK_SLEEP);
            continue;
        }

        let raw = match producer.source.read_raw() {
            Ok(v) => v,
            Err(e) => {
                warn!("Dropped sample at tick {}: {}", tick, e);
                tick += 1;
                continue;
            }
        };

        let pressure = calibration.read().to_grams(raw);
        let (fake_pressure, fake_raw) = producer.fake.next_pair();

        let window_len = {
            let mut log = shared.raw.write();
            log.push(Sample {
                pressure,
                raw,
                fake_pressure,
                fake_raw,
                elapsed_secs: elapsed,
            });
            log.len()
        };
        tick += 1;

        if window_len > delay_points {
            let window = {
                let log = shared.raw.read();
                log[log.len() - delay_points..].to_vec()
            };
            let reals: Vec<f64> = window.iter().map(|s| s.pressure).collect();
            let fakes: Vec<f64> = window.iter().map(|s| s.fake_pressure).collect();

            shared.delayed.write().push(DelayedAggregate {
                mean_pressure: mean(&reals),
                mean_fake: mean(&fakes),
                std_pressure: population_std(&reals),
                std_fake: population_std(&fakes),
                elapsed_secs: elapsed - delay_seconds,
            });
        }
    }

    debug!(
        "Sampling loop exited after {:.3}s, {} ticks",
        started.elapsed().as_secs_f64(),
        tick
    );
}
