//! Table schemas for every entity category held by a snapshot.

use playback_common::{BodyId, BodyType, TeamId};
use playback_soa::columnar_schema;

columnar_schema! {
    /// A live body.
    pub struct Body in BodyColumns, BodyPatch, BodyBulk {
        team: TeamId,
        body_type: BodyType,
        /// Always 1 for now; buckets in team stats are keyed by it.
        level: i8,
        x: i32,
        y: i32,
        bytecodes_used: i32,
        /// `ActionKind` code, or `ACTION_NONE`.
        action: i8,
        target: i32,
        target_x: i32,
        target_y: i32,
        /// Id of the body that spawned this one, 0 if none.
        parent: BodyId,
        hp: i32,
    }
}

columnar_schema! {
    /// A body removed this round, at its last location.
    pub struct DeadBody in DeadBodyColumns, DeadBodyPatch, DeadBodyBulk {
        x: i32,
        y: i32,
    }
}

columnar_schema! {
    /// A debug dot drawn by `owner` this round. `id` is the dot's position in
    /// the round's dot list.
    pub struct IndicatorDot in IndicatorDotColumns, IndicatorDotPatch, IndicatorDotBulk {
        owner: BodyId,
        x: i32,
        y: i32,
        red: i32,
        green: i32,
        blue: i32,
    }
}

columnar_schema! {
    /// A debug line drawn by `owner` this round. `id` is the line's position in
    /// the round's line list.
    pub struct IndicatorLine in IndicatorLineColumns, IndicatorLinePatch, IndicatorLineBulk {
        owner: BodyId,
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
        red: i32,
        green: i32,
        blue: i32,
    }
}
