//! Shared vocabulary for the playback engine: ids, action kinds, map symmetry,
//! and per-game metadata.

mod meta;
mod types;

pub use meta::{GameConstants, Metadata, TeamMeta};
pub use types::{
    ActionKind, BodyId, BodyType, Symmetry, TeamId, UnknownActionKind, UnknownSymmetry,
    ACTION_NONE, NO_TARGET, NO_TARGET_LOC,
};

pub fn crate_info() -> &'static str {
    "playback-common v0.1.0"
}
