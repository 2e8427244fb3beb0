// Copyright (c) 2026 gripflow contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/gripflow/gripflow-rs

//! Experiment machinery - block designs, the protocol library, and the
//! two-step scorer

mod block;
mod protocol;
mod scorer;

pub use block::{Block, BlockManager, BlockName, BlockOutcome};
pub use protocol::{Protocol, ProtocolLibrary};
pub use scorer::{Phase, ScoreSnapshot, ScoreWorker, TwoStepScorer};
