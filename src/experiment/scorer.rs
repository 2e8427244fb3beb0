// Copyright (c) 2026 gripflow contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/gripflow/gripflow-rs

//! Two-step gamified scorer
//!
//! Phase 1 tracks how close the subject's mean pressure sits to the reference
//! value; once the mean is within threshold the scorer levels up to phase 2,
//! which rewards stability: low window std gains points, high std loses them.
//! Drifting away from the reference drops the scorer back to phase 1.
//!
//! Score recomputation is driven from [`ScoreWorker`], a single worker thread
//! with a one-slot inbox where the latest request wins, so a burst of updates
//! can never interleave.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, info, warn};

/// Which step of the scorer is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Tracking mean proximity to the reference
    Phase1,
    /// Tracking stability of the signal
    Phase2,
}

/// Immutable view of the scorer state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSnapshot {
    /// Active step
    pub phase: Phase,
    /// Signed distance from the reference in phase 1 (positive means above)
    pub score_phase1: f64,
    /// Stability score in phase 2, clamped to `[0, 100]`
    pub score_phase2: f64,
}

impl Default for ScoreSnapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Phase1,
            score_phase1: 0.0,
            score_phase2: 0.0,
        }
    }
}

/// Two-step scoring state machine.
#[derive(Debug, Clone)]
pub struct TwoStepScorer {
    ref_value: f64,
    mean_threshold: f64,
    std_threshold: f64,
    snapshot: ScoreSnapshot,
}

impl TwoStepScorer {
    /// Build a scorer from the display thresholds.
    pub fn new(ref_value: f64, mean_threshold: f64, std_threshold: f64) -> Self {
        info!(
            "Scorer configured: ref={} mean_threshold={} std_threshold={}",
            ref_value, mean_threshold, std_threshold
        );
        Self {
            ref_value,
            mean_threshold,
            std_threshold,
            snapshot: ScoreSnapshot::default(),
        }
    }

    /// Drop back to phase 1 with zeroed scores.
    pub fn reset(&mut self) {
        self.snapshot = ScoreSnapshot::default();
        debug!("Scorer reset");
    }

    /// Current state without advancing it
    pub fn snapshot(&self) -> ScoreSnapshot {
        self.snapshot
    }

    /// Feed one `(window mean, window std)` aggregate.
    ///
    /// `None` is a redraw request: the state is returned unchanged. The
    /// phase-1 score is signed and unclamped so the caller can tell which
    /// direction the subject needs to move; the phase-2 score moves in steps
    /// of 10 and is clamped to `[0, 100]`.
    pub fn update(&mut self, aggregate: Option<(f64, f64)>) -> ScoreSnapshot {
        let Some((mean, std)) = aggregate else {
            return self.snapshot;
        };

        match self.snapshot.phase {
            Phase::Phase1 => {
                self.snapshot.score_phase1 = mean - self.ref_value;
                if self.snapshot.score_phase1.abs() < self.mean_threshold {
                    self.snapshot.phase = Phase::Phase2;
                    self.snapshot.score_phase2 = 0.0;
                    debug!("Scorer leveled up to phase 2");
                }
            }
            Phase::Phase2 => {
                let diff = (mean - self.ref_value).abs();
                if diff > self.mean_threshold {
                    self.snapshot.phase = Phase::Phase1;
                    self.snapshot.score_phase1 = mean - self.ref_value;
                    self.snapshot.score_phase2 = 0.0;
                    debug!(
                        "Scorer dropped to phase 1, score {:.1}",
                        self.snapshot.score_phase1
                    );
                } else {
                    let step = if std < self.std_threshold { 10.0 } else { -10.0 };
                    self.snapshot.score_phase2 =
                        (self.snapshot.score_phase2 + step).clamp(0.0, 100.0);
                }
            }
        }

        self.snapshot
    }
}

enum Request {
    Update(Option<(f64, f64)>),
    Reset,
}

struct Inbox {
    slot: Mutex<Option<Request>>,
    ready: Condvar,
}

/// Single worker thread driving a [`TwoStepScorer`].
///
/// The inbox holds at most one pending request; submitting while one is
/// pending replaces it, so the latest request always wins and two updates can
/// never run concurrently.
pub struct ScoreWorker {
    inbox: Arc<Inbox>,
    latest: Arc<RwLock<ScoreSnapshot>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ScoreWorker {
    /// Spawn the worker around a scorer.
    pub fn spawn(mut scorer: TwoStepScorer) -> Self {
        let inbox = Arc::new(Inbox {
            slot: Mutex::new(None),
            ready: Condvar::new(),
        });
        let latest = Arc::new(RwLock::new(scorer.snapshot()));
        let shutdown = Arc::new(AtomicBool::new(false));

        let handle = {
            let inbox = Arc::clone(&inbox);
            let latest = Arc::clone(&latest);
            let shutdown = Arc::clone(&shutdown);
            std::thread::spawn(move || {
                loop {
                    let request = {
                        let mut slot = inbox.slot.lock();
                        while slot.is_none() && !shutdown.load(Ordering::Acquire) {
                            inbox.ready.wait(&mut slot);
                        }
                        match slot.take() {
                            Some(r) => r,
                            None => break,
                        }
                    };

                    let snapshot = match request {
                        Request::Update(aggregate) => scorer.update(aggregate),
                        Request::Reset => {
                            scorer.reset();
                            scorer.snapshot()
                        }
                    };
                    *latest.write() = snapshot;
                }
                debug!("Score worker exited");
            })
        };

        Self {
            inbox,
            latest,
            shutdown: Arc::clone(&shutdown),
            handle: Some(handle),
        }
    }

    /// Queue an update, replacing any still-pending one.
    pub fn submit(&self, aggregate: Option<(f64, f64)>) {
        let mut slot = self.inbox.slot.lock();
        if slot.replace(Request::Update(aggregate)).is_some() {
            debug!("Score request superseded before it ran");
        }
        self.inbox.ready.notify_one();
    }

    /// Queue a reset, replacing any still-pending update.
    pub fn reset(&self) {
        *self.inbox.slot.lock() = Some(Request::Reset);
        self.inbox.ready.notify_one();
    }

    /// Most recently computed snapshot
    pub fn latest(&self) -> ScoreSnapshot {
        *self.latest.read()
    }
}

impl Drop for ScoreWorker {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.inbox.ready.notify_one();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Score worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn scorer() -> TwoStepScorer {
        TwoStepScorer::new(500.0, 50.0, 10.0)
    }

    #[test]
    fn test_phase1_score_is_signed_and_unclamped() {
        let mut s = scorer();
        let snap = s.update(Some((300.0, 0.0)));
        assert_eq!(snap.phase, Phase::Phase1);
        assert_eq!(snap.score_phase1, -200.0);

        let snap = s.update(Some((700.0, 0.0)));
        assert_eq!(snap.score_phase1, 200.0);
        assert_eq!(snap.phase, Phase::Phase1);
    }

    #[test]
    fn test_level_up_then_stability_steps() {
        let mut s = scorer();

        // Mean on the reference levels up and zeroes the stability score
        let snap = s.update(Some((500.0, 0.0)));
        assert_eq!(snap.phase, Phase::Phase2);
        assert_eq!(snap.score_phase2, 0.0);

        // Low std gains 10
        let snap = s.update(Some((500.0, 5.0)));
        assert_eq!(snap.score_phase2, 10.0);

        // High std loses 10, clamped at 0
        let snap = s.update(Some((500.0, 20.0)));
        assert_eq!(snap.score_phase2, 0.0);
        let snap = s.update(Some((500.0, 20.0)));
        assert_eq!(snap.score_phase2, 0.0);
    }

    #[test]
    fn test_stability_score_caps_at_100() {
        let mut s = scorer();
        s.update(Some((500.0, 0.0)));
        for _ in 0..15 {
            s.update(Some((500.0, 1.0)));
        }
        assert_eq!(s.snapshot().score_phase2, 100.0);
    }

    #[test]
    fn test_drift_reverts_to_phase1() {
        let mut s = scorer();
        s.update(Some((500.0, 0.0)));
        s.update(Some((500.0, 1.0)));
        assert_eq!(s.snapshot().phase, Phase::Phase2);

        let snap = s.update(Some((600.0, 0.0)));
        assert_eq!(snap.phase, Phase::Phase1);
        assert_eq!(snap.score_phase1, 100.0);
        assert_eq!(snap.score_phase2, 0.0);
    }

    #[test]
    fn test_update_without_data_is_a_noop() {
        let mut s = scorer();
        s.update(Some((500.0, 0.0)));
        let before = s.snapshot();
        let snap = s.update(None);
        assert_eq!(snap, before);
        assert_eq!(s.snapshot(), before);
    }

    #[test]
    fn test_reset_returns_to_phase1() {
        let mut s = scorer();
        s.update(Some((500.0, 0.0)));
        s.update(Some((500.0, 1.0)));
        s.reset();
        assert_eq!(s.snapshot(), ScoreSnapshot::default());
    }

    #[test]
    fn test_worker_processes_latest_request() {
        let worker = ScoreWorker::spawn(scorer());
        worker.submit(Some((500.0, 0.0)));

        // Wait for the worker to catch up
        let mut snap = worker.latest();
        for _ in 0..100 {
            if snap.phase == Phase::Phase2 {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
            snap = worker.latest();
        }
        assert_eq!(snap.phase, Phase::Phase2);

        worker.submit(Some((500.0, 1.0)));
        for _ in 0..100 {
            if worker.latest().score_phase2 == 10.0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(worker.latest().score_phase2, 10.0);
    }

    #[test]
    fn test_worker_reset() {
        let worker = ScoreWorker::spawn(scorer());
        worker.submit(Some((500.0, 0.0)));
        std::thread::sleep(Duration::from_millis(20));
        worker.reset();
        for _ in 0..100 {
            if worker.latest() == ScoreSnapshot::default() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(worker.latest(), ScoreSnapshot::default());
    }
}
