// Copyright (c) 2026 gripflow contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/gripflow/gripflow-rs

//! Session orchestration
//!
//! The controller glues the reader, the block design, and the scorer
//! together: it snapshots subject and experiment metadata when a design
//! starts, drives the block state machine from the session clock, and on
//! finish or terminate re-aligns the raw log and persists four JSON files
//! into a timestamped folder before restarting the reader for the next
//! session.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::{mean, population_std, resample_to_grid};
use crate::device::RealTimeReader;
use crate::error::GripflowError;
use crate::experiment::{
    Block, BlockManager, BlockName, BlockOutcome, ScoreWorker, TwoStepScorer,
};
/// How a session ended; becomes the folder name prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// The block design ran to completion
    Finished,
    /// The operator stopped the session early
    Terminated,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Finished => write!(f, "Finished"),
            SessionStatus::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Subject metadata captured at session start
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectInfo {
    /// Subject identifier or name
    pub name: String,
    /// Age in years
    pub age: u32,
    /// Free-form gender field
    pub gender: String,
    /// Operator notes
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StatusRecord {
    status: SessionStatus,
    timestamp: String,
}

/// Orchestrates one session at a time over a shared reader.
pub struct SessionController {
    reader: RealTimeReader,
    scorer: ScoreWorker,
    score_window_seconds: f64,
    data_dir: PathBuf,
    blocks: BlockManager,
    design_snapshot: Vec<Block>,
    subject: SubjectInfo,
}

impl SessionController {
    /// Build a controller. The reader is started so the live view has data
    /// before any design runs.
    pub fn new(
        mut reader: RealTimeReader,
        scorer: TwoStepScorer,
        score_window_seconds: f64,
        data_dir: &Path,
    ) -> Self {
        reader.start();
        Self {
            reader,
            scorer: ScoreWorker::spawn(scorer),
            score_window_seconds,
            data_dir: data_dir.to_path_buf(),
            blocks: BlockManager::new(&[]),
            design_snapshot: Vec::new(),
            subject: SubjectInfo::default(),
        }
    }

    /// The shared reader, for live peeks
    pub fn reader(&self) -> &RealTimeReader {
        &self.reader
    }

    /// The score worker, for the latest gamified snapshot
    pub fn scorer(&self) -> &ScoreWorker {
        &self.scorer
    }

    /// Begin a block design. An empty design is refused with a warning and
    /// nothing changes. Otherwise the subject metadata is snapshotted, the
    /// reader restarts with a fresh log, and the block and score state
    /// machines reset. Returns whether the design was accepted.
    pub fn start_block_design(&mut self, design: &[(BlockName, f64)], subject: SubjectInfo) -> bool {
        if design.is_empty() {
            warn!("Refusing to start an empty block design");
            return false;
        }

        self.subject = subject;
        self.blocks = BlockManager::new(design);
        self.design_snapshot = self.blocks.blocks();
        self.scorer.reset();

        // stop() joins the old producer, so the restart cannot race it
        self.reader.stop();
        self.reader.start();

        info!(
            "Session started for {:?}: {} blocks",
            self.subject.name,
            self.design_snapshot.len()
        );
        true
    }

    /// Advance the block state machine to session time `t`.
    pub fn advance(&mut self, t: f64) -> BlockOutcome {
        self.blocks.consume(t)
    }

    /// Feed the scorer the latest window statistics from the live log.
    pub fn update_score(&self) {
        let window = self.reader.peek_by_seconds(self.score_window_seconds);
        if window.is_empty() {
            self.scorer.submit(None);
            return;
        }
        let pressures: Vec<f64> = window.iter().map(|s| s.pressure).collect();
        self.scorer
            .submit(Some((mean(&pressures), population_std(&pressures))));
    }

    /// End the session: stop the reader, re-align the collected log onto the
    /// uniform grid, persist the four session files, and restart the reader.
    /// Returns the session folder.
    pub fn finish(&mut self, status: SessionStatus) -> Result<PathBuf, GripflowError> {
        let raw = self.reader.stop();
        let result = self.persist(status, &raw);
        self.reader.start();

        match &result {
            Ok(folder) => info!("Session saved to {:?}", folder),
            Err(e) => warn!("Session persist failed: {}", e),
        }
        result
    }

    fn persist(&self, status: SessionStatus, raw: &[crate::device::Sample]) -> Result<PathBuf, GripflowError> {
        let data = resample_to_grid(raw)?;

        let timestamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
        let folder = self.data_dir.join(format!("{status}-{timestamp}"));
        fs::create_dir_all(&folder)?;

        fs::write(folder.join("data.json"), serde_json::to_string(&data)?)?;
        fs::write(
            folder.join("subject.json"),
            serde_json::to_string_pretty(&self.subject)?,
        )?;
        fs::write(
            folder.join("experiment.json"),
            serde_json::to_string_pretty(&self.design_snapshot)?,
        )?;
        fs::write(
            folder.join("status.json"),
            serde_json::to_string_pretty(&StatusRecord { status, timestamp })?,
        )?;

        Ok(folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ResampledData;
    use crate::calibration::Calibration;
    use crate::device::{FakePressure, SimulatedSource};
    use parking_lot::RwLock;
    use std::sync::Arc;
    use std::time::Duration;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gripflow-session-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn controller(data_dir: &Path) -> SessionController {
        let calibration = Arc::new(RwLock::new(
            Calibration::new(44000, 46000, 0, data_dir).unwrap(),
        ));
        let reader = RealTimeReader::new(
            Box::new(SimulatedSource::new(44000, 46000, 500)),
            FakePressure::default(),
            calibration,
            500,
            0.02,
        );
        SessionController::new(reader, TwoStepScorer::new(500.0, 50.0, 10.0), 0.1, data_dir)
    }

    #[test]
    fn test_empty_design_is_refused() {
        let dir = scratch_dir("empty");
        let mut ctl = controller(&dir);
        assert!(!ctl.start_block_design(&[], SubjectInfo::default()));
    }

    #[test]
    fn test_session_round_trip() {
        let dir = scratch_dir("roundtrip");
        let mut ctl = controller(&dir);

        let subject = SubjectInfo {
            name: "S01".to_string(),
            age: 30,
            gender: "f".to_string(),
            note: "pilot".to_string(),
        };
        let design = [(BlockName::Real, 60.0), (BlockName::Fake, 30.0)];
        assert!(ctl.start_block_design(&design, subject.clone()));

        assert!(matches!(ctl.advance(0.0), BlockOutcome::Current(b) if b.name == BlockName::Real));
        assert!(matches!(ctl.advance(61.0), BlockOutcome::Current(b) if b.name == BlockName::Fake));

        // Collect enough samples for the spline
        std::thread::sleep(Duration::from_millis(200));
        let folder = ctl.finish(SessionStatus::Terminated).unwrap();

        let name = folder.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("Terminated-"));

        let subject_back: SubjectInfo =
            serde_json::from_str(&fs::read_to_string(folder.join("subject.json")).unwrap()).unwrap();
        assert_eq!(subject_back, subject);

        let blocks_back: Vec<Block> =
            serde_json::from_str(&fs::read_to_string(folder.join("experiment.json")).unwrap())
                .unwrap();
        assert_eq!(blocks_back.len(), 2);
        assert_eq!(blocks_back[0].name, BlockName::Real);
        assert_eq!(blocks_back[1].stop, 90.0);

        let status: StatusRecord =
            serde_json::from_str(&fs::read_to_string(folder.join("status.json")).unwrap()).unwrap();
        assert_eq!(status.status, SessionStatus::Terminated);

        let data: ResampledData =
            serde_json::from_str(&fs::read_to_string(folder.join("data.json")).unwrap()).unwrap();
        assert!(!data.is_empty());
        assert_eq!(data.pressure.len(), data.elapsed_secs.len());

        // The reader came back up for the next session
        assert!(ctl.reader().is_running());
    }

    #[test]
    fn test_finish_with_short_log_reports_degenerate_input() {
        let dir = scratch_dir("short");
        let mut ctl = controller(&dir);
        ctl.start_block_design(&[(BlockName::Real, 10.0)], SubjectInfo::default());

        // Stop almost immediately so the spline has too few points
        let err = ctl.finish(SessionStatus::Terminated);
        if let Err(e) = err {
            assert!(matches!(e, GripflowError::DegenerateResampleInput(_)));
        }
        // Either way the reader must be running again
        assert!(ctl.reader().is_running());
    }
}
