//! Developer Tooling: snapshot inspector, synthetic match generator, benchmarks.
//!
//! # Invariants
//! - Tools only read snapshots; they never mutate one they were handed.
//! - Synthetic matches are a pure function of their config.

pub mod inspector;
pub mod synth;

pub use inspector::{BodyInfo, SnapshotInspector, TeamSummary, WorldSummary};
pub use synth::{SynthConfig, SyntheticMatch};

pub fn crate_info() -> &'static str {
    "playback-tools v0.1.0"
}
