use std::fmt;

use glam::IVec2;
use playback_common::{ActionKind, BodyId, BodyType, TeamId};
use playback_kernel::WorldSnapshot;

/// Snapshot inspector for developer tooling.
///
/// Read-only queries used by the CLI and by tests to describe a snapshot.
pub struct SnapshotInspector;

impl SnapshotInspector {
    pub fn summary(world: &WorldSnapshot) -> WorldSummary {
        let teams = world
            .team_stats()
            .iter()
            .map(|(&team, stats)| TeamSummary {
                team,
                robots: stats.robot_total(),
                resources: stats.resources(),
                resource_change: stats.resource_change(),
                mined: stats.resource_mined(),
            })
            .collect();
        WorldSummary {
            round: world.round(),
            map: world.map().name().to_owned(),
            bodies: world.bodies().len(),
            dead_bodies: world.dead_bodies().len(),
            dots: world.indicator_dots().len(),
            lines: world.indicator_lines().len(),
            strings: world.indicator_strings().len(),
            teams,
        }
    }

    pub fn inspect_body(world: &WorldSnapshot, id: BodyId) -> Option<BodyInfo> {
        world.body(id).map(|body| BodyInfo {
            id,
            team: body.team,
            body_type: body.body_type,
            level: body.level,
            location: IVec2::new(body.x, body.y),
            hp: body.hp,
            action: ActionKind::try_from(body.action).ok(),
            target: body.target,
            parent: body.parent,
            bytecodes_used: body.bytecodes_used,
            indicator: world.indicator_string(id).map(str::to_owned),
        })
    }

    /// Ids of every live body, ascending.
    pub fn list_bodies(world: &WorldSnapshot) -> Vec<BodyId> {
        let mut ids = world.bodies().ids().to_vec();
        ids.sort_unstable();
        ids
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSummary {
    pub team: TeamId,
    pub robots: i32,
    pub resources: i32,
    pub resource_change: i32,
    pub mined: i32,
}

/// Summary of a snapshot for the inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldSummary {
    pub round: u32,
    pub map: String,
    pub bodies: usize,
    pub dead_bodies: usize,
    pub dots: usize,
    pub lines: usize,
    pub strings: usize,
    pub teams: Vec<TeamSummary>,
}

impl fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Snapshot: map={} round={} bodies={} dead={} dots={} lines={} strings={}",
            self.map, self.round, self.bodies, self.dead_bodies, self.dots, self.lines, self.strings
        )?;
        for team in &self.teams {
            write!(
                f,
                "\n  team {}: robots={} resources={} ({:+}) mined={}",
                team.team, team.robots, team.resources, team.resource_change, team.mined
            )?;
        }
        Ok(())
    }
}

/// Detailed info about a single body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyInfo {
    pub id: BodyId,
    pub team: TeamId,
    pub body_type: BodyType,
    pub level: i8,
    pub location: IVec2,
    pub hp: i32,
    /// `None` when the body did not act this round.
    pub action: Option<ActionKind>,
    pub target: i32,
    pub parent: BodyId,
    pub bytecodes_used: i32,
    pub indicator: Option<String>,
}

impl fmt::Display for BodyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Body {} team={} type={} level={} at ({}, {}) hp={} bytecodes={}",
            self.id,
            self.team,
            self.body_type,
            self.level,
            self.location.x,
            self.location.y,
            self.hp,
            self.bytecodes_used,
        )?;
        if let Some(action) = self.action {
            write!(f, " action={action:?}->{}", self.target)?;
        }
        if let Some(text) = &self.indicator {
            write!(f, " \"{text}\"")?;
        }
        Ok(())
    }
}
