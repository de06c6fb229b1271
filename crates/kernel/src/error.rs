use glam::IVec2;
use playback_common::{BodyId, BodyType, TeamId, UnknownSymmetry};
use playback_soa::StoreError;

/// Errors from building a snapshot or applying a round to it.
///
/// Every variant leaves the snapshot exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The delta is not the next round. The caller has to reload the replay.
    #[error("out-of-order round: snapshot is at round {current}, delta is round {received}")]
    OutOfOrderRound { current: u32, received: u32 },
    #[error("malformed delta: `{field}` has {actual} entries, expected {expected}")]
    MalformedDelta {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("malformed header: `{field}` has {actual} entries, expected {expected}")]
    MalformedHeader {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("map corners {min_corner} and {max_corner} do not span a valid grid")]
    InvalidMapSize { min_corner: IVec2, max_corner: IVec2 },
    /// A value from the replay would push a counter past `i32` range.
    /// `owner` is the body id, team id or cell index holding the counter.
    #[error("`{field}` of {owner} would overflow")]
    Overflow { field: &'static str, owner: i64 },
    #[error(transparent)]
    UnknownSymmetry(#[from] UnknownSymmetry),
    #[error("team {team} is not part of this match")]
    UnknownTeam { team: TeamId },
    #[error("body {id} has invalid type {body_type}")]
    InvalidBodyType { id: BodyId, body_type: BodyType },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Check one parallel array against the length of its group.
pub(crate) fn expect_len(
    field: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), WorldError> {
    if expected == actual {
        Ok(())
    } else {
        Err(WorldError::MalformedDelta {
            field,
            expected,
            actual,
        })
    }
}
