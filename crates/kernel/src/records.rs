//! Decoded wire records: the match header and per-round deltas.
//!
//! These mirror the tabular wire layout (parallel arrays per field). Decoding
//! the binary envelope happens upstream; the records only need to arrive with
//! matching lengths, which [`RoundDelta::validate_lengths`] checks.

use glam::IVec2;
use playback_common::{ActionKind, BodyId, BodyType, TeamId};
use serde::{Deserialize, Serialize};

use crate::error::{expect_len, WorldError};

/// Parallel x/y coordinate arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VecTable {
    pub xs: Vec<i32>,
    pub ys: Vec<i32>,
}

impl VecTable {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn push(&mut self, loc: IVec2) {
        self.xs.push(loc.x);
        self.ys.push(loc.y);
    }

    pub fn get(&self, index: usize) -> Option<IVec2> {
        Some(IVec2::new(*self.xs.get(index)?, *self.ys.get(index)?))
    }

    fn validate(
        &self,
        xs: &'static str,
        ys: &'static str,
        expected: usize,
    ) -> Result<(), WorldError> {
        expect_len(xs, expected, self.xs.len())?;
        expect_len(ys, expected, self.ys.len())
    }
}

/// Parallel colour channel arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RgbTable {
    pub red: Vec<i32>,
    pub green: Vec<i32>,
    pub blue: Vec<i32>,
}

impl RgbTable {
    pub fn push(&mut self, [red, green, blue]: [i32; 3]) {
        self.red.push(red);
        self.green.push(green);
        self.blue.push(blue);
    }

    fn validate(&self, prefix: [&'static str; 3], expected: usize) -> Result<(), WorldError> {
        expect_len(prefix[0], expected, self.red.len())?;
        expect_len(prefix[1], expected, self.green.len())?;
        expect_len(prefix[2], expected, self.blue.len())
    }
}

/// Bodies entering the world, either in the header or during a round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnedBodyTable {
    pub robot_ids: Vec<BodyId>,
    pub team_ids: Vec<TeamId>,
    pub types: Vec<BodyType>,
    pub locs: VecTable,
    pub healths: Vec<i32>,
}

impl SpawnedBodyTable {
    pub fn len(&self) -> usize {
        self.robot_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.robot_ids.is_empty()
    }

    pub fn push(&mut self, id: BodyId, team: TeamId, body_type: BodyType, loc: IVec2, hp: i32) {
        self.robot_ids.push(id);
        self.team_ids.push(team);
        self.types.push(body_type);
        self.locs.push(loc);
        self.healths.push(hp);
    }

    /// Check the parallel arrays and reject negative body types.
    pub fn validate(&self) -> Result<(), WorldError> {
        let n = self.robot_ids.len();
        expect_len("spawned.team_ids", n, self.team_ids.len())?;
        expect_len("spawned.types", n, self.types.len())?;
        self.locs.validate("spawned.locs.xs", "spawned.locs.ys", n)?;
        expect_len("spawned.healths", n, self.healths.len())?;
        for (&id, &body_type) in self.robot_ids.iter().zip(&self.types) {
            if body_type < 0 {
                return Err(WorldError::InvalidBodyType { id, body_type });
            }
        }
        Ok(())
    }
}

/// Static map description carried by the match header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameMap {
    pub name: String,
    pub min_corner: IVec2,
    pub max_corner: IVec2,
    /// 0 rotational, 1 horizontal, 2 vertical.
    pub symmetry: i32,
    pub bodies: SpawnedBodyTable,
    pub random_seed: i32,
    /// One flag per cell, row-major from `min_corner`.
    pub walls: Vec<bool>,
    /// Resource amount per cell, same layout as `walls`.
    pub resources: Vec<i32>,
}

/// Start-of-match record. Establishes round 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchHeader {
    pub map: GameMap,
}

/// Everything that changed during one round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundDelta {
    pub round_id: u32,

    pub team_ids: Vec<TeamId>,
    pub team_resource_changes: Vec<i32>,

    pub moved_ids: Vec<BodyId>,
    pub moved_locs: VecTable,

    pub spawned_bodies: SpawnedBodyTable,

    pub died_ids: Vec<BodyId>,

    pub action_ids: Vec<BodyId>,
    /// Raw action codes; see `ActionKind`.
    pub actions: Vec<i8>,
    pub action_targets: Vec<i32>,

    pub bytecode_ids: Vec<BodyId>,
    pub bytecodes_used: Vec<i32>,

    pub indicator_string_ids: Vec<BodyId>,
    pub indicator_strings: Vec<String>,

    pub indicator_dot_ids: Vec<BodyId>,
    pub indicator_dot_locs: VecTable,
    pub indicator_dot_rgbs: RgbTable,

    pub indicator_line_ids: Vec<BodyId>,
    pub indicator_line_start_locs: VecTable,
    pub indicator_line_end_locs: VecTable,
    pub indicator_line_rgbs: RgbTable,
}

impl RoundDelta {
    pub fn new(round_id: u32) -> Self {
        Self {
            round_id,
            ..Default::default()
        }
    }

    pub fn push_team_change(&mut self, team: TeamId, change: i32) {
        self.team_ids.push(team);
        self.team_resource_changes.push(change);
    }

    pub fn push_move(&mut self, id: BodyId, loc: IVec2) {
        self.moved_ids.push(id);
        self.moved_locs.push(loc);
    }

    pub fn push_spawn(
        &mut self,
        id: BodyId,
        team: TeamId,
        body_type: BodyType,
        loc: IVec2,
        hp: i32,
    ) {
        self.spawned_bodies.push(id, team, body_type, loc, hp);
    }

    pub fn push_death(&mut self, id: BodyId) {
        self.died_ids.push(id);
    }

    pub fn push_action(&mut self, id: BodyId, kind: ActionKind, target: i32) {
        self.push_raw_action(id, kind.code(), target);
    }

    /// Record an action by raw code, including codes this build does not know.
    pub fn push_raw_action(&mut self, id: BodyId, code: i8, target: i32) {
        self.action_ids.push(id);
        self.actions.push(code);
        self.action_targets.push(target);
    }

    pub fn push_bytecodes(&mut self, id: BodyId, used: i32) {
        self.bytecode_ids.push(id);
        self.bytecodes_used.push(used);
    }

    pub fn push_indicator_string(&mut self, id: BodyId, text: impl Into<String>) {
        self.indicator_string_ids.push(id);
        self.indicator_strings.push(text.into());
    }

    pub fn push_dot(&mut self, owner: BodyId, loc: IVec2, rgb: [i32; 3]) {
        self.indicator_dot_ids.push(owner);
        self.indicator_dot_locs.push(loc);
        self.indicator_dot_rgbs.push(rgb);
    }

    pub fn push_line(&mut self, owner: BodyId, start: IVec2, end: IVec2, rgb: [i32; 3]) {
        self.indicator_line_ids.push(owner);
        self.indicator_line_start_locs.push(start);
        self.indicator_line_end_locs.push(end);
        self.indicator_line_rgbs.push(rgb);
    }

    /// Check that every group of parallel arrays agrees on its length.
    pub fn validate_lengths(&self) -> Result<(), WorldError> {
        expect_len(
            "team_resource_changes",
            self.team_ids.len(),
            self.team_resource_changes.len(),
        )?;

        self.moved_locs
            .validate("moved_locs.xs", "moved_locs.ys", self.moved_ids.len())?;

        self.spawned_bodies.validate()?;

        let actions = self.action_ids.len();
        expect_len("actions", actions, self.actions.len())?;
        expect_len("action_targets", actions, self.action_targets.len())?;

        expect_len("bytecodes_used", self.bytecode_ids.len(), self.bytecodes_used.len())?;

        expect_len(
            "indicator_strings",
            self.indicator_string_ids.len(),
            self.indicator_strings.len(),
        )?;

        let dots = self.indicator_dot_ids.len();
        self.indicator_dot_locs
            .validate("indicator_dot_locs.xs", "indicator_dot_locs.ys", dots)?;
        self.indicator_dot_rgbs.validate(
            [
                "indicator_dot_rgbs.red",
                "indicator_dot_rgbs.green",
                "indicator_dot_rgbs.blue",
            ],
            dots,
        )?;

        let lines = self.indicator_line_ids.len();
        self.indicator_line_start_locs.validate(
            "indicator_line_start_locs.xs",
            "indicator_line_start_locs.ys",
            lines,
        )?;
        self.indicator_line_end_locs.validate(
            "indicator_line_end_locs.xs",
            "indicator_line_end_locs.ys",
            lines,
        )?;
        self.indicator_line_rgbs.validate(
            [
                "indicator_line_rgbs.red",
                "indicator_line_rgbs.green",
                "indicator_line_rgbs.blue",
            ],
            lines,
        )
    }
}
