//! Playback Kernel: the world snapshot and the round-by-round delta applier.
//!
//! A [`WorldSnapshot`] is built from a [`MatchHeader`] at round 0 and then
//! advanced one [`RoundDelta`] at a time through [`DeltaApplier`].
//!
//! # Invariants
//! - A snapshot at round `R` only accepts the delta for round `R + 1`.
//! - Team robot and hp buckets always equal a recount over live bodies.
//! - A failed apply leaves the snapshot exactly as it was.
//! - Cloning a snapshot shares no mutable storage with the source.

mod apply;
mod error;
mod fork;
pub mod records;
pub mod schema;
mod stats;
mod world;

#[cfg(test)]
mod fixtures;

pub use apply::DeltaApplier;
pub use error::WorldError;
pub use records::{GameMap, MatchHeader, RgbTable, RoundDelta, SpawnedBodyTable, VecTable};
pub use schema::{Body, DeadBody, IndicatorDot, IndicatorLine};
pub use stats::{MapStats, TeamStats, MINED_HISTORY_LEN};
pub use world::{AggregateMismatch, WorldSnapshot};

pub fn crate_info() -> &'static str {
    "playback-kernel v0.1.0"
}
