//! Playback Timeline: keyframed scrubbing over recorded rounds.
//!
//! Rounds are recorded once, in order, through [`Timeline::push`]. Every
//! `keyframe_interval` rounds a deep copy of the snapshot is kept so that
//! seeking backwards only replays from the nearest keyframe.
//!
//! # Invariants
//! - The snapshot at any recorded round is identical whichever path reached it.
//! - A failed push records nothing.
//! - Keyframes are never mutated after capture.

use std::collections::BTreeMap;

use playback_kernel::{RoundDelta, WorldError, WorldSnapshot};
use serde::{Deserialize, Serialize};

/// Scrubbing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Rounds between stored keyframes. 0 keeps only the starting snapshot.
    pub keyframe_interval: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            keyframe_interval: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimelineError {
    #[error("round {requested} is not recorded (recorded rounds {first}..={farthest})")]
    RoundNotRecorded {
        requested: u32,
        first: u32,
        farthest: u32,
    },
    #[error(transparent)]
    World(#[from] WorldError),
}

/// A recorded match that can be scrubbed to any round.
#[derive(Debug)]
pub struct Timeline {
    config: TimelineConfig,
    first: u32,
    deltas: Vec<RoundDelta>,
    keyframes: BTreeMap<u32, WorldSnapshot>,
    head: WorldSnapshot,
    current: WorldSnapshot,
}

impl Timeline {
    /// Start a timeline at `initial`, which becomes the first keyframe.
    pub fn new(initial: WorldSnapshot, config: TimelineConfig) -> Self {
        let first = initial.round();
        let mut keyframes = BTreeMap::new();
        keyframes.insert(first, initial.clone());
        Self {
            config,
            first,
            deltas: Vec::new(),
            keyframes,
            head: initial.clone(),
            current: initial,
        }
    }

    pub fn config(&self) -> TimelineConfig {
        self.config
    }

    /// Apply the next round to the farthest snapshot and record it.
    ///
    /// The current (scrubbed) snapshot does not move.
    pub fn push(&mut self, delta: RoundDelta) -> Result<(), TimelineError> {
        self.head.apply(&delta)?;
        self.deltas.push(delta);
        let round = self.head.round();
        let interval = self.config.keyframe_interval;
        if interval > 0 && round % interval == 0 {
            self.keyframes.insert(round, self.head.clone());
            tracing::debug!(round, keyframes = self.keyframes.len(), "keyframe stored");
        }
        Ok(())
    }

    /// Move the current snapshot to `round`.
    pub fn seek(&mut self, round: u32) -> Result<(), TimelineError> {
        if round < self.first || round > self.farthest() {
            return Err(TimelineError::RoundNotRecorded {
                requested: round,
                first: self.first,
                farthest: self.farthest(),
            });
        }
        let from = self.current.round();
        if round == from {
            return Ok(());
        }

        if round == self.farthest() {
            self.current.clone_from(&self.head);
        } else {
            let (&keyframe_round, keyframe) = self
                .keyframes
                .range(..=round)
                .next_back()
                .ok_or(TimelineError::RoundNotRecorded {
                    requested: round,
                    first: self.first,
                    farthest: self.farthest(),
                })?;
            // Replaying from the current snapshot is only possible going forward,
            // and only worth it when no keyframe is closer.
            if from > round || from < keyframe_round {
                self.current.clone_from(keyframe);
            }
            while self.current.round() < round {
                let next = self.current.round() + 1;
                let index = (next - self.first - 1) as usize;
                self.current.apply(&self.deltas[index])?;
            }
        }
        tracing::debug!(from, to = round, "seek");
        Ok(())
    }

    /// Advance one round. Returns `false` at the farthest round.
    pub fn step_forward(&mut self) -> Result<bool, TimelineError> {
        if self.current.round() >= self.farthest() {
            return Ok(false);
        }
        self.seek(self.current.round() + 1)?;
        Ok(true)
    }

    /// Go back one round. Returns `false` at the first round.
    pub fn step_back(&mut self) -> Result<bool, TimelineError> {
        if self.current.round() <= self.first {
            return Ok(false);
        }
        self.seek(self.current.round() - 1)?;
        Ok(true)
    }

    pub fn current(&self) -> &WorldSnapshot {
        &self.current
    }

    /// The snapshot at the farthest recorded round.
    pub fn head(&self) -> &WorldSnapshot {
        &self.head
    }

    pub fn first(&self) -> u32 {
        self.first
    }

    pub fn farthest(&self) -> u32 {
        self.head.round()
    }

    pub fn rounds_recorded(&self) -> usize {
        self.deltas.len()
    }

    pub fn keyframe_count(&self) -> usize {
        self.keyframes.len()
    }
}

pub fn crate_info() -> &'static str {
    "playback-timeline v0.1.0"
}
