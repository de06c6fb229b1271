use std::collections::BTreeMap;

use glam::IVec2;

use playback_common::{
    BodyId, BodyType, GameConstants, Metadata, Symmetry, TeamId, ACTION_NONE, NO_TARGET,
    NO_TARGET_LOC,
};
use playback_soa::{Columns, Table};

use crate::error::WorldError;
use crate::records::{MatchHeader, SpawnedBodyTable};
use crate::schema::{
    Body, BodyColumns, DeadBodyColumns, IndicatorDotColumns, IndicatorLineColumns,
};
use crate::stats::{HpProjection, MapStats, TeamStats};

/// The complete world state at one round.
///
/// Built from a match header at round 0 and then advanced only through
/// [`DeltaApplier`](crate::DeltaApplier). Cloning yields a fully independent
/// snapshot (see `fork.rs`), which is how timelines branch.
#[derive(Debug, PartialEq)]
pub struct WorldSnapshot {
    pub(crate) bodies: Table<BodyColumns>,
    pub(crate) dead_bodies: Table<DeadBodyColumns>,
    pub(crate) indicator_dots: Table<IndicatorDotColumns>,
    pub(crate) indicator_lines: Table<IndicatorLineColumns>,
    /// BTreeMap for deterministic iteration.
    pub(crate) team_stats: BTreeMap<TeamId, TeamStats>,
    pub(crate) map: MapStats,
    pub(crate) indicator_strings: BTreeMap<BodyId, String>,
    pub(crate) round: u32,
    pub(crate) constants: GameConstants,
    /// Bodies whose action flags must be cleared at the start of next round.
    pub(crate) acted_last_round: Vec<BodyId>,
}

/// A team bucket whose stored aggregate disagrees with the live bodies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "team {team} bucket (type {body_type}, level {level}): stored {stored_robots} robots / {stored_hp} hp, live bodies give {live_robots} / {live_hp}"
)]
pub struct AggregateMismatch {
    pub team: TeamId,
    pub body_type: BodyType,
    pub level: i8,
    pub stored_robots: i32,
    pub stored_hp: i32,
    pub live_robots: i32,
    pub live_hp: i32,
}

/// Corners must span a grid whose cells are addressable with `i32` indices.
fn check_map_size(min_corner: IVec2, max_corner: IVec2) -> Result<(), WorldError> {
    let width = i64::from(max_corner.x) - i64::from(min_corner.x);
    let height = i64::from(max_corner.y) - i64::from(min_corner.y);
    let limit = i64::from(i32::MAX);
    let in_range = |v: i64| (0..=limit).contains(&v);
    if !in_range(width) || !in_range(height) || width * height > limit {
        return Err(WorldError::InvalidMapSize {
            min_corner,
            max_corner,
        });
    }
    Ok(())
}

/// Row written for a body entering the world.
pub(crate) fn fresh_body(spawned: &SpawnedBodyTable, i: usize) -> Body {
    Body {
        id: spawned.robot_ids[i],
        team: spawned.team_ids[i],
        body_type: spawned.types[i],
        level: 1,
        x: spawned.locs.xs[i],
        y: spawned.locs.ys[i],
        bytecodes_used: 0,
        action: ACTION_NONE,
        target: NO_TARGET,
        target_x: NO_TARGET_LOC,
        target_y: NO_TARGET_LOC,
        parent: 0,
        hp: spawned.healths[i],
    }
}

impl WorldSnapshot {
    /// Build the round-0 snapshot for a match.
    ///
    /// Every team in `metadata` gets an empty stats entry; bodies of other
    /// teams are treated as neutral and never counted.
    pub fn from_header(metadata: &Metadata, header: &MatchHeader) -> Result<Self, WorldError> {
        let map = &header.map;
        let symmetry = Symmetry::from_code(map.symmetry)?;
        check_map_size(map.min_corner, map.max_corner)?;
        let mut stats = MapStats {
            name: map.name.clone(),
            min_corner: map.min_corner,
            max_corner: map.max_corner,
            random_seed: map.random_seed,
            symmetry,
            walls: Vec::new(),
            resources: Vec::new(),
        };
        let cells = stats.cell_count();
        if map.walls.len() != cells {
            return Err(WorldError::MalformedHeader {
                field: "walls",
                expected: cells,
                actual: map.walls.len(),
            });
        }
        if map.resources.len() != cells {
            return Err(WorldError::MalformedHeader {
                field: "resources",
                expected: cells,
                actual: map.resources.len(),
            });
        }
        stats.walls = map.walls.clone();
        stats.resources = map.resources.clone();

        let mut world = Self {
            bodies: Table::new(),
            dead_bodies: Table::new(),
            indicator_dots: Table::new(),
            indicator_lines: Table::new(),
            team_stats: metadata
                .teams
                .iter()
                .map(|team| (team.id, TeamStats::new()))
                .collect(),
            map: stats,
            indicator_strings: BTreeMap::new(),
            round: 0,
            constants: metadata.constants,
            acted_last_round: Vec::new(),
        };

        map.bodies.validate()?;
        let mut projection = HpProjection::default();
        for i in 0..map.bodies.len() {
            projection.add(
                &world.team_stats,
                map.bodies.team_ids[i],
                map.bodies.types[i],
                1,
                map.bodies.healths[i],
            )?;
        }
        world.insert_spawned(&map.bodies)?;

        tracing::debug!(
            map = %world.map.name,
            width = world.map.width(),
            height = world.map.height(),
            bodies = world.bodies.len(),
            "snapshot built from header"
        );
        Ok(world)
    }

    /// Insert bodies and count them into their team's buckets.
    pub(crate) fn insert_spawned(&mut self, spawned: &SpawnedBodyTable) -> Result<(), WorldError> {
        self.bodies
            .insert_bulk((0..spawned.len()).map(|i| fresh_body(spawned, i)))?;
        for i in 0..spawned.len() {
            if let Some(stats) = self.team_stats.get_mut(&spawned.team_ids[i]) {
                stats.add_body(spawned.types[i], 1, spawned.healths[i]);
            }
        }
        Ok(())
    }

    /// Latest applied round; 0 right after the header.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Game constants the snapshot was built with.
    pub fn constants(&self) -> GameConstants {
        self.constants
    }

    /// Live bodies, one row each.
    pub fn bodies(&self) -> &Table<BodyColumns> {
        &self.bodies
    }

    /// Bodies removed during the latest round.
    pub fn dead_bodies(&self) -> &Table<DeadBodyColumns> {
        &self.dead_bodies
    }

    /// Debug dots drawn during the latest round.
    pub fn indicator_dots(&self) -> &Table<IndicatorDotColumns> {
        &self.indicator_dots
    }

    /// Debug lines drawn during the latest round.
    pub fn indicator_lines(&self) -> &Table<IndicatorLineColumns> {
        &self.indicator_lines
    }

    pub fn team_stats(&self) -> &BTreeMap<TeamId, TeamStats> {
        &self.team_stats
    }

    /// Stats for `team`, if it is part of the match.
    pub fn team(&self, team: TeamId) -> Option<&TeamStats> {
        self.team_stats.get(&team)
    }

    /// Map layout and live resource grid.
    pub fn map(&self) -> &MapStats {
        &self.map
    }

    pub fn indicator_strings(&self) -> &BTreeMap<BodyId, String> {
        &self.indicator_strings
    }

    pub fn indicator_string(&self, id: BodyId) -> Option<&str> {
        self.indicator_strings.get(&id).map(String::as_str)
    }

    /// Copy of the row for body `id`.
    pub fn body(&self, id: BodyId) -> Option<Body> {
        self.bodies.get(id)
    }

    /// Recompute per-team robot/hp buckets from the live bodies.
    ///
    /// Resource counters are left at zero; only the buckets are meaningful.
    pub fn recount_team_stats(&self) -> BTreeMap<TeamId, TeamStats> {
        let mut recount: BTreeMap<TeamId, TeamStats> = self
            .team_stats
            .keys()
            .map(|&team| (team, TeamStats::new()))
            .collect();
        for body in self.bodies.iter() {
            if let Some(stats) = recount.get_mut(&body.team) {
                stats.add_body(body.body_type, body.level, body.hp);
            }
        }
        recount
    }

    /// Check the stored team buckets against a fresh recount.
    pub fn verify_aggregates(&self) -> Result<(), AggregateMismatch> {
        let recount = self.recount_team_stats();
        for (&team, stored) in &self.team_stats {
            let Some(live) = recount.get(&team) else {
                continue;
            };
            for (body_type, level) in stored.buckets().chain(live.buckets()) {
                let mismatch = AggregateMismatch {
                    team,
                    body_type,
                    level,
                    stored_robots: stored.robots(body_type, level),
                    stored_hp: stored.total_hp(body_type, level),
                    live_robots: live.robots(body_type, level),
                    live_hp: live.total_hp(body_type, level),
                };
                if mismatch.stored_robots != mismatch.live_robots
                    || mismatch.stored_hp != mismatch.live_hp
                {
                    return Err(mismatch);
                }
            }
        }
        Ok(())
    }

    /// Deterministic hash of the whole snapshot.
    ///
    /// Rows are hashed in id order, so two snapshots with the same contents
    /// hash equal even if deletions left their rows in different slots.
    pub fn state_hash(&self) -> u64 {
        let mut h = Fnv::new();
        h.u32(self.round);

        let mut bodies: Vec<Body> = self.bodies.iter().collect();
        bodies.sort_unstable_by_key(|b| b.id);
        for b in &bodies {
            for v in [
                b.id,
                i32::from(b.team),
                i32::from(b.body_type),
                i32::from(b.level),
                b.x,
                b.y,
                b.bytecodes_used,
                i32::from(b.action),
                b.target,
                b.target_x,
                b.target_y,
                b.parent,
                b.hp,
            ] {
                h.i32(v);
            }
        }

        hash_sorted(&mut h, &self.dead_bodies);
        hash_sorted(&mut h, &self.indicator_dots);
        hash_sorted(&mut h, &self.indicator_lines);

        for (team, stats) in &self.team_stats {
            h.i32(i32::from(*team));
            for (body_type, level) in stats.buckets() {
                h.i32(i32::from(body_type));
                h.i32(i32::from(level));
                h.i32(stats.robots(body_type, level));
                h.i32(stats.total_hp(body_type, level));
            }
            h.i32(stats.resources());
            h.i32(stats.resource_change());
            h.i32(stats.resource_mined());
            for mined in stats.mined_history() {
                h.i32(*mined);
            }
        }

        for value in self.map.resources() {
            h.i32(*value);
        }
        for (id, text) in &self.indicator_strings {
            h.i32(*id);
            h.bytes(text.as_bytes());
        }
        let mut acted = self.acted_last_round.clone();
        acted.sort_unstable();
        for id in acted {
            h.i32(id);
        }
        h.finish()
    }
}

fn hash_sorted<C: Columns>(h: &mut Fnv, table: &Table<C>) {
    let mut rows: Vec<C::Row> = table.iter().collect();
    rows.sort_unstable_by_key(|row| C::row_key(row));
    for row in rows {
        h.bytes(format!("{row:?}").as_bytes());
    }
}

/// FNV-1a accumulator.
struct Fnv(u64);

impl Fnv {
    fn new() -> Self {
        Fnv(0xcbf2_9ce4_8422_2325)
    }

    fn bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= u64::from(b);
            self.0 = self.0.wrapping_mul(0x0100_0000_01b3);
        }
    }

    fn i32(&mut self, v: i32) {
        self.bytes(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.bytes(&v.to_le_bytes());
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::header_with;

    #[test]
    fn header_builds_round_zero() {
        let mut bodies = SpawnedBodyTable::default();
        bodies.push(1, 1, 0, IVec2::new(1, 1), 100);
        bodies.push(2, 2, 0, IVec2::new(8, 8), 100);
        bodies.push(3, 0, 1, IVec2::new(5, 5), 30);
        let world = WorldSnapshot::from_header(&Metadata::default(), &header_with(bodies)).unwrap();

        assert_eq!(world.round(), 0);
        assert_eq!(world.bodies().len(), 3);
        assert_eq!(world.map().name(), "test-map");
        assert_eq!(world.map().width(), 10);
        assert_eq!(world.team(1).unwrap().robots(0, 1), 1);
        assert_eq!(world.team(2).unwrap().total_hp(0, 1), 100);
        // Neutral body: stored, but not counted anywhere.
        assert!(world.team(0).is_none());
        let neutral = world.body(3).unwrap();
        assert_eq!(neutral.level, 1);
        assert_eq!(neutral.action, ACTION_NONE);
        world.verify_aggregates().unwrap();
    }

    #[test]
    fn header_rejects_short_wall_bitmap() {
        let mut header = header_with(SpawnedBodyTable::default());
        header.map.walls.pop();
        assert_eq!(
            WorldSnapshot::from_header(&Metadata::default(), &header),
            Err(WorldError::MalformedHeader {
                field: "walls",
                expected: 100,
                actual: 99
            })
        );
    }

    #[test]
    fn header_rejects_oversized_map() {
        let mut header = header_with(SpawnedBodyTable::default());
        header.map.max_corner = IVec2::new(70_000, 70_000);
        assert_eq!(
            WorldSnapshot::from_header(&Metadata::default(), &header),
            Err(WorldError::InvalidMapSize {
                min_corner: IVec2::ZERO,
                max_corner: IVec2::new(70_000, 70_000)
            })
        );

        header.map.min_corner = IVec2::new(i32::MIN, 0);
        header.map.max_corner = IVec2::new(i32::MAX, 0);
        assert!(matches!(
            WorldSnapshot::from_header(&Metadata::default(), &header),
            Err(WorldError::InvalidMapSize { .. })
        ));
    }

    #[test]
    fn header_rejects_inverted_corners() {
        let mut header = header_with(SpawnedBodyTable::default());
        header.map.min_corner = IVec2::new(10, 0);
        header.map.max_corner = IVec2::new(0, 10);
        assert!(matches!(
            WorldSnapshot::from_header(&Metadata::default(), &header),
            Err(WorldError::InvalidMapSize { .. })
        ));
    }

    #[test]
    fn header_rejects_hp_bucket_overflow() {
        let mut bodies = SpawnedBodyTable::default();
        bodies.push(1, 1, 0, IVec2::new(1, 1), i32::MAX);
        bodies.push(2, 1, 0, IVec2::new(2, 1), 1);
        assert_eq!(
            WorldSnapshot::from_header(&Metadata::default(), &header_with(bodies)),
            Err(WorldError::Overflow {
                field: "total_hp",
                owner: 1
            })
        );
    }

    #[test]
    fn header_rejects_unknown_symmetry() {
        let mut header = header_with(SpawnedBodyTable::default());
        header.map.symmetry = 9;
        assert!(matches!(
            WorldSnapshot::from_header(&Metadata::default(), &header),
            Err(WorldError::UnknownSymmetry(_))
        ));
    }

    #[test]
    fn header_rejects_duplicate_initial_bodies() {
        let mut bodies = SpawnedBodyTable::default();
        bodies.push(1, 1, 0, IVec2::new(1, 1), 100);
        bodies.push(1, 2, 0, IVec2::new(2, 2), 100);
        assert!(matches!(
            WorldSnapshot::from_header(&Metadata::default(), &header_with(bodies)),
            Err(WorldError::Store(playback_soa::StoreError::DuplicateKey { id: 1 }))
        ));
    }

    #[test]
    fn verify_aggregates_detects_drift() {
        let mut bodies = SpawnedBodyTable::default();
        bodies.push(1, 1, 0, IVec2::new(1, 1), 100);
        let mut world =
            WorldSnapshot::from_header(&Metadata::default(), &header_with(bodies)).unwrap();
        world
            .team_stats
            .get_mut(&1)
            .unwrap()
            .add_hp(0, 1, 5);
        let err = world.verify_aggregates().unwrap_err();
        assert_eq!(err.team, 1);
        assert_eq!(err.stored_hp, 105);
        assert_eq!(err.live_hp, 100);
    }

    #[test]
    fn state_hash_ignores_row_order() {
        let mut a = SpawnedBodyTable::default();
        a.push(1, 1, 0, IVec2::new(1, 1), 100);
        a.push(2, 2, 0, IVec2::new(2, 2), 90);
        let mut b = SpawnedBodyTable::default();
        b.push(2, 2, 0, IVec2::new(2, 2), 90);
        b.push(1, 1, 0, IVec2::new(1, 1), 100);
        let meta = Metadata::default();
        let wa = WorldSnapshot::from_header(&meta, &header_with(a)).unwrap();
        let wb = WorldSnapshot::from_header(&meta, &header_with(b)).unwrap();
        assert_ne!(wa, wb);
        assert_eq!(wa.state_hash(), wb.state_hash());
    }
}
