use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Id of a body (robot or other map entity) as assigned by the engine.
pub type BodyId = i32;

/// Team id. Bodies of teams missing from the match metadata have no team stats.
pub type TeamId = i8;

/// Index into the match's body-type table.
pub type BodyType = i8;

/// Action column value for a body that did nothing this round.
pub const ACTION_NONE: i8 = -1;

/// Target column value when there is no target body.
pub const NO_TARGET: i32 = -1;

/// Target location column value when there is no target location.
pub const NO_TARGET_LOC: i32 = -1;

/// The closed set of per-round actions a body can report.
///
/// Codes outside this set come from newer engines and are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum ActionKind {
    /// Body self-destructs. Target unused.
    Explode = 0,
    /// Body mines a resource cell. Target is the cell index.
    MineResource = 1,
    /// Body builds a new unit. Target is the child's id.
    SpawnUnit = 2,
    /// Body's hp changes. Target is the signed delta.
    ChangeHealth = 3,
    /// Body's player code threw. Target unused.
    DieException = 4,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Explode,
        ActionKind::MineResource,
        ActionKind::SpawnUnit,
        ActionKind::ChangeHealth,
        ActionKind::DieException,
    ];

    pub fn code(self) -> i8 {
        self as i8
    }

    /// Whether the action marks its actor for one round.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ActionKind::Explode | ActionKind::MineResource | ActionKind::SpawnUnit
        )
    }
}

/// An action code this build does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown action kind {0}")]
pub struct UnknownActionKind(pub i8);

impl TryFrom<i8> for ActionKind {
    type Error = UnknownActionKind;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.code() == code)
            .ok_or(UnknownActionKind(code))
    }
}

/// Map symmetry as encoded in the match header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Symmetry {
    #[default]
    Rotational,
    Horizontal,
    Vertical,
}

/// A symmetry code outside 0..=2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown symmetry code {0}")]
pub struct UnknownSymmetry(pub i32);

impl Symmetry {
    pub fn from_code(code: i32) -> Result<Self, UnknownSymmetry> {
        match code {
            0 => Ok(Symmetry::Rotational),
            1 => Ok(Symmetry::Horizontal),
            2 => Ok(Symmetry::Vertical),
            other => Err(UnknownSymmetry(other)),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Symmetry::Rotational => 0,
            Symmetry::Horizontal => 1,
            Symmetry::Vertical => 2,
        }
    }

    /// Mirror of `loc` on a `width` x `height` map.
    ///
    /// Horizontal symmetry mirrors across the horizontal axis (x kept),
    /// vertical across the vertical axis (y kept), rotational flips both.
    pub fn mirror(self, loc: IVec2, width: i32, height: i32) -> IVec2 {
        let x = match self {
            Symmetry::Horizontal => loc.x,
            Symmetry::Vertical | Symmetry::Rotational => width - 1 - loc.x,
        };
        let y = match self {
            Symmetry::Vertical => loc.y,
            Symmetry::Horizontal | Symmetry::Rotational => height - 1 - loc.y,
        };
        IVec2::new(x, y)
    }
}
