// Copyright (c) 2026 gripflow contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/gripflow/gripflow-rs

//! Block-design sequence and its consuming state machine
//!
//! An experiment is a flat list of `(block name, duration)` pairs. At build
//! time the pairs become absolute time intervals by cumulative sum, and the
//! session loop consumes them against the wall clock: a block stays live on
//! the closed interval `[start, stop]`, and the end of the whole sequence is
//! reported exactly once.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use tracing::{debug, info};

/// Feedback mode of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockName {
    /// Live pressure feedback
    Real,
    /// Replayed fake-pressure feedback
    Fake,
    /// Feedback hidden
    Hide,
}

impl std::fmt::Display for BlockName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockName::Real => write!(f, "Real"),
            BlockName::Fake => write!(f, "Fake"),
            BlockName::Hide => write!(f, "Hide"),
        }
    }
}

/// One timed segment of the experiment, with its absolute offsets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the design, starting at 0
    pub index: usize,
    /// Feedback mode
    pub name: BlockName,
    /// Length of this block, seconds
    pub duration: f64,
    /// Absolute start offset, seconds
    pub start: f64,
    /// Absolute stop offset, seconds
    pub stop: f64,
    /// Grand duration of the whole design, seconds
    pub total: f64,
    /// Number of blocks in the whole design
    pub block_count: usize,
}

/// Outcome of consuming the design at a point in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockOutcome {
    /// A block is live at this time
    Current(Block),
    /// The design just ran out; reported exactly once
    Finished,
    /// Nothing pending (empty design, or already finished)
    Empty,
}

/// Ordered queue of blocks consumed by wall-clock-relative time.
#[derive(Debug, Clone)]
pub struct BlockManager {
    pending: VecDeque<Block>,
}

impl BlockManager {
    /// Build the sequence from `(name, duration)` pairs, computing absolute
    /// offsets by cumulative sum from zero.
    pub fn new(design: &[(BlockName, f64)]) -> Self {
        let total: f64 = design.iter().map(|(_, d)| d).sum();
        let block_count = design.len();

        let mut pending = VecDeque::with_capacity(block_count);
        let mut cursor = 0.0;
        for (index, &(name, duration)) in design.iter().enumerate() {
            pending.push_back(Block {
                index,
                name,
                duration,
                start: cursor,
                stop: cursor + duration,
                total,
                block_count,
            });
            cursor += duration;
        }

        info!("Block design built: {} blocks, {:.1}s total", block_count, total);
        Self { pending }
    }

    /// Consume the design at relative time `t`.
    ///
    /// The head block stays live while `t <= stop`; the first call with
    /// `t > stop` pops it. Popping the last block yields [`BlockOutcome::Finished`]
    /// exactly once; every later call yields [`BlockOutcome::Empty`], so the
    /// caller can use `Finished` as its one-shot completion trigger.
    pub fn consume(&mut self, t: f64) -> BlockOutcome {
        let Some(head) = self.pending.front() else {
            return BlockOutcome::Empty;
        };

        if t > head.stop {
            let done = self.pending.pop_front();
            debug!("Block passed at t={:.2}: {:?}", t, done);
            if self.pending.is_empty() {
                return BlockOutcome::Finished;
            }
        }

        match self.pending.front() {
            Some(block) => BlockOutcome::Current(*block),
            None => BlockOutcome::Empty,
        }
    }

    /// Blocks still pending
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Snapshot of the pending blocks, in order
    pub fn blocks(&self) -> Vec<Block> {
        self.pending.iter().copied().collect()
    }
}
