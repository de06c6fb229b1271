//! Advancing a snapshot by one round.
//!
//! # Invariants
//! - A delta is checked in full before the first write; a rejected delta
//!   leaves the snapshot untouched.
//! - A value that would overflow an hp, resource or bucket counter rejects
//!   the delta.
//! - Within a round, effects land in a fixed order: resources, moves, spawns,
//!   action reset, regeneration, actions, history, deaths, indicators,
//!   round number, bytecodes.

use std::collections::{HashMap, HashSet};

use playback_common::{ActionKind, BodyId, TeamId, ACTION_NONE, NO_TARGET, NO_TARGET_LOC};
use playback_soa::StoreError;

use crate::error::WorldError;
use crate::records::RoundDelta;
use crate::schema::{BodyBulk, BodyPatch, DeadBody, IndicatorDot, IndicatorLine};
use crate::stats::{HpProjection, TeamStats};
use crate::world::{fresh_body, WorldSnapshot};

/// Applies round deltas to a [`WorldSnapshot`].
pub struct DeltaApplier;

impl DeltaApplier {
    /// Advance `world` from round `R` to `R + 1` using `delta`.
    pub fn apply(world: &mut WorldSnapshot, delta: &RoundDelta) -> Result<(), WorldError> {
        let _span = tracing::debug_span!("apply_delta", round = delta.round_id).entered();

        if world.round.checked_add(1) != Some(delta.round_id) {
            return Err(WorldError::OutOfOrderRound {
                current: world.round,
                received: delta.round_id,
            });
        }
        Self::check(world, delta)?;

        Self::apply_resources(world, delta);
        Self::apply_moves(world, delta)?;
        Self::apply_spawns(world, delta)?;
        Self::reset_actions(world)?;
        Self::regenerate(world, delta.round_id);
        Self::apply_actions(world, delta)?;
        for stats in world.team_stats.values_mut() {
            stats.push_mined_history();
        }
        Self::apply_deaths(world, delta)?;
        Self::apply_indicators(world, delta)?;
        world.round = delta.round_id;
        world.bodies.alter_bulk(
            &delta.bytecode_ids,
            &BodyBulk {
                bytecodes_used: Some(&delta.bytecodes_used),
                ..Default::default()
            },
        )?;

        tracing::debug!(
            moved = delta.moved_ids.len(),
            spawned = delta.spawned_bodies.len(),
            died = delta.died_ids.len(),
            actions = delta.action_ids.len(),
            bodies = world.bodies.len(),
            "round applied"
        );
        Ok(())
    }

    /// Reject anything that would fail part-way through the round.
    fn check(world: &WorldSnapshot, delta: &RoundDelta) -> Result<(), WorldError> {
        delta.validate_lengths()?;

        for &team in &delta.team_ids {
            if !world.team_stats.contains_key(&team) {
                return Err(WorldError::UnknownTeam { team });
            }
        }

        for &id in &delta.moved_ids {
            if !world.bodies.contains(id) {
                return Err(StoreError::NotFound { id }.into());
            }
        }

        let mut spawned = HashSet::with_capacity(delta.spawned_bodies.len());
        for &id in &delta.spawned_bodies.robot_ids {
            if world.bodies.contains(id) || !spawned.insert(id) {
                return Err(StoreError::DuplicateKey { id }.into());
            }
        }
        let live = |id: BodyId| world.bodies.contains(id) || spawned.contains(&id);
        let require = |id: BodyId| {
            if live(id) {
                Ok(())
            } else {
                Err(WorldError::Store(StoreError::NotFound { id }))
            }
        };

        for ((&id, &code), &target) in delta
            .action_ids
            .iter()
            .zip(&delta.actions)
            .zip(&delta.action_targets)
        {
            match ActionKind::try_from(code) {
                Ok(ActionKind::Explode | ActionKind::MineResource | ActionKind::ChangeHealth) => {
                    require(id)?;
                }
                Ok(ActionKind::SpawnUnit) => {
                    require(id)?;
                    require(target)?;
                }
                Ok(ActionKind::DieException) | Err(_) => {}
            }
        }

        let mut died = HashSet::with_capacity(delta.died_ids.len());
        for &id in &delta.died_ids {
            require(id)?;
            if !died.insert(id) {
                return Err(StoreError::NotFound { id }.into());
            }
        }

        for &id in &delta.bytecode_ids {
            if died.contains(&id) {
                return Err(StoreError::NotFound { id }.into());
            }
            require(id)?;
        }
        Self::check_overflow(world, delta)
    }

    /// Run every counter the round touches through checked arithmetic, in
    /// the order the steps below write them.
    fn check_overflow(world: &WorldSnapshot, delta: &RoundDelta) -> Result<(), WorldError> {
        let mut resources: HashMap<TeamId, i32> = HashMap::new();
        for (&team, &change) in delta.team_ids.iter().zip(&delta.team_resource_changes) {
            let total = resources
                .entry(team)
                .or_insert_with(|| world.team_stats.get(&team).map_or(0, TeamStats::resources));
            *total = total.checked_add(change).ok_or(WorldError::Overflow {
                field: "resources",
                owner: i64::from(team),
            })?;
        }

        let spawned = &delta.spawned_bodies;
        let mut buckets = HpProjection::default();
        for i in 0..spawned.len() {
            buckets.add(
                &world.team_stats,
                spawned.team_ids[i],
                spawned.types[i],
                1,
                spawned.healths[i],
            )?;
        }

        if let Some(increase) = Self::regeneration(world, delta.round_id) {
            if let Some(cell) = world.map.regeneration_overflow(increase) {
                return Err(WorldError::Overflow {
                    field: "map resources",
                    owner: cell as i64,
                });
            }
        }

        let spawn_index: HashMap<BodyId, usize> = spawned
            .robot_ids
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();
        let body_of = |id: BodyId| {
            world
                .bodies
                .get(id)
                .or_else(|| spawn_index.get(&id).map(|&i| fresh_body(spawned, i)))
        };

        let mut hps: HashMap<BodyId, i32> = HashMap::new();
        for ((&id, &code), &target) in delta
            .action_ids
            .iter()
            .zip(&delta.actions)
            .zip(&delta.action_targets)
        {
            if ActionKind::try_from(code) != Ok(ActionKind::ChangeHealth) {
                continue;
            }
            let Some(body) = body_of(id) else {
                continue;
            };
            let hp = hps.entry(id).or_insert(body.hp);
            *hp = hp.checked_add(target).ok_or(WorldError::Overflow {
                field: "hp",
                owner: i64::from(id),
            })?;
            buckets.add(&world.team_stats, body.team, body.body_type, body.level, target)?;
        }

        for &id in &delta.died_ids {
            let Some(body) = body_of(id) else {
                continue;
            };
            let hp = hps.get(&id).copied().unwrap_or(body.hp);
            buckets.remove(&world.team_stats, body.team, body.body_type, body.level, hp)?;
        }
        Ok(())
    }

    fn apply_resources(world: &mut WorldSnapshot, delta: &RoundDelta) {
        for stats in world.team_stats.values_mut() {
            stats.begin_round();
        }
        for (team, &change) in delta.team_ids.iter().zip(&delta.team_resource_changes) {
            if let Some(stats) = world.team_stats.get_mut(team) {
                stats.apply_resource_change(change);
            }
        }
    }

    fn apply_moves(world: &mut WorldSnapshot, delta: &RoundDelta) -> Result<(), WorldError> {
        world.bodies.alter_bulk(
            &delta.moved_ids,
            &BodyBulk {
                x: Some(&delta.moved_locs.xs),
                y: Some(&delta.moved_locs.ys),
                ..Default::default()
            },
        )?;
        Ok(())
    }

    fn apply_spawns(world: &mut WorldSnapshot, delta: &RoundDelta) -> Result<(), WorldError> {
        if delta.spawned_bodies.is_empty() {
            return Ok(());
        }
        world.insert_spawned(&delta.spawned_bodies)
    }

    /// Clear the transient action of every body that acted last round.
    fn reset_actions(world: &mut WorldSnapshot) -> Result<(), WorldError> {
        let mut acted = std::mem::take(&mut world.acted_last_round);
        acted.retain(|&id| world.bodies.contains(id));
        let cleared = BodyPatch {
            action: Some(ACTION_NONE),
            target: Some(NO_TARGET),
            target_x: Some(NO_TARGET_LOC),
            target_y: Some(NO_TARGET_LOC),
            ..Default::default()
        };
        for &id in &acted {
            world.bodies.alter(id, &cleared)?;
        }
        acted.clear();
        world.acted_last_round = acted;
        Ok(())
    }

    /// Resource increase due at `round`, if this is a regeneration round.
    fn regeneration(world: &WorldSnapshot, round: u32) -> Option<i32> {
        let period = world.constants.increase_period;
        (period > 0 && round % period == 0).then_some(world.constants.resource_increase)
    }

    fn regenerate(world: &mut WorldSnapshot, round: u32) {
        if let Some(increase) = Self::regeneration(world, round) {
            world.map.regenerate(increase);
            tracing::trace!(round, "resources regenerated");
        }
    }

    fn apply_actions(world: &mut WorldSnapshot, delta: &RoundDelta) -> Result<(), WorldError> {
        for ((&id, &code), &target) in delta
            .action_ids
            .iter()
            .zip(&delta.actions)
            .zip(&delta.action_targets)
        {
            let Ok(kind) = ActionKind::try_from(code) else {
                tracing::trace!(id, code, "skipping unknown action");
                continue;
            };
            match kind {
                ActionKind::Explode => {
                    Self::mark_action(world, id, kind, target, NO_TARGET_LOC, NO_TARGET_LOC)?;
                }
                ActionKind::MineResource => {
                    let cell = usize::try_from(target)
                        .ok()
                        .and_then(|index| world.map.location_of(index));
                    let (tx, ty) = cell.map_or((NO_TARGET_LOC, NO_TARGET_LOC), |c| (c.x, c.y));
                    Self::mark_action(world, id, kind, target, tx, ty)?;
                    let team = world.bodies.lookup(id)?.team;
                    if let Some(stats) = world.team_stats.get_mut(&team) {
                        stats.record_mine();
                    }
                }
                ActionKind::SpawnUnit => {
                    let child = world.bodies.lookup(target)?;
                    Self::mark_action(world, id, kind, target, child.x, child.y)?;
                    world.bodies.alter(
                        target,
                        &BodyPatch {
                            parent: Some(id),
                            ..Default::default()
                        },
                    )?;
                }
                ActionKind::ChangeHealth => {
                    let body = world.bodies.lookup(id)?;
                    world.bodies.alter(
                        id,
                        &BodyPatch {
                            hp: Some(body.hp + target),
                            ..Default::default()
                        },
                    )?;
                    if let Some(stats) = world.team_stats.get_mut(&body.team) {
                        stats.add_hp(body.body_type, body.level, target);
                    }
                }
                ActionKind::DieException => {
                    tracing::warn!(
                        round = delta.round_id,
                        id,
                        "body reported an exception in player code"
                    );
                }
            }
        }
        Ok(())
    }

    fn mark_action(
        world: &mut WorldSnapshot,
        id: BodyId,
        kind: ActionKind,
        target: i32,
        target_x: i32,
        target_y: i32,
    ) -> Result<(), WorldError> {
        debug_assert!(kind.is_transient(), "{kind:?} does not mark its actor");
        world.bodies.alter(
            id,
            &BodyPatch {
                action: Some(kind.code()),
                target: Some(target),
                target_x: Some(target_x),
                target_y: Some(target_y),
                ..Default::default()
            },
        )?;
        world.acted_last_round.push(id);
        Ok(())
    }

    /// Remove dead bodies and keep their last location for this round.
    fn apply_deaths(world: &mut WorldSnapshot, delta: &RoundDelta) -> Result<(), WorldError> {
        world.dead_bodies.clear();
        if delta.died_ids.is_empty() {
            return Ok(());
        }
        let removed = world.bodies.delete_bulk(&delta.died_ids)?;
        for body in &removed {
            if let Some(stats) = world.team_stats.get_mut(&body.team) {
                stats.remove_body(body.body_type, body.level, body.hp);
            }
        }
        world.dead_bodies.insert_bulk(removed.iter().map(|body| DeadBody {
            id: body.id,
            x: body.x,
            y: body.y,
        }))?;
        Ok(())
    }

    fn apply_indicators(world: &mut WorldSnapshot, delta: &RoundDelta) -> Result<(), WorldError> {
        // Keyed by position within the round.
        let dots = (0..).zip(0..delta.indicator_dot_ids.len());
        world.indicator_dots.clear();
        world
            .indicator_dots
            .insert_bulk(dots.map(|(id, i)| IndicatorDot {
                id,
                owner: delta.indicator_dot_ids[i],
                x: delta.indicator_dot_locs.xs[i],
                y: delta.indicator_dot_locs.ys[i],
                red: delta.indicator_dot_rgbs.red[i],
                green: delta.indicator_dot_rgbs.green[i],
                blue: delta.indicator_dot_rgbs.blue[i],
            }))?;

        let lines = (0..).zip(0..delta.indicator_line_ids.len());
        world.indicator_lines.clear();
        world
            .indicator_lines
            .insert_bulk(lines.map(|(id, i)| IndicatorLine {
                id,
                owner: delta.indicator_line_ids[i],
                start_x: delta.indicator_line_start_locs.xs[i],
                start_y: delta.indicator_line_start_locs.ys[i],
                end_x: delta.indicator_line_end_locs.xs[i],
                end_y: delta.indicator_line_end_locs.ys[i],
                red: delta.indicator_line_rgbs.red[i],
                green: delta.indicator_line_rgbs.green[i],
                blue: delta.indicator_line_rgbs.blue[i],
            }))?;

        for (&id, text) in delta
            .indicator_string_ids
            .iter()
            .zip(&delta.indicator_strings)
        {
            world.indicator_strings.insert(id, text.clone());
        }
        Ok(())
    }
}

impl WorldSnapshot {
    /// Shorthand for [`DeltaApplier::apply`].
    pub fn apply(&mut self, delta: &RoundDelta) -> Result<(), WorldError> {
        DeltaApplier::apply(self, delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{two_body_world, two_body_world_with};
    use glam::IVec2;
    use playback_common::{GameConstants, Metadata};

    fn applied(world: &mut WorldSnapshot, delta: RoundDelta) {
        world.apply(&delta).unwrap();
        world.verify_aggregates().unwrap();
    }

    fn assert_rejected(world: &mut WorldSnapshot, delta: RoundDelta) -> WorldError {
        let before = world.state_hash();
        let round = world.round();
        let err = world.apply(&delta).unwrap_err();
        assert_eq!(world.state_hash(), before);
        assert_eq!(world.round(), round);
        err
    }

    #[test]
    fn rounds_must_be_consecutive() {
        let mut world = two_body_world();
        let err = assert_rejected(&mut world, RoundDelta::new(2));
        assert_eq!(
            err,
            WorldError::OutOfOrderRound {
                current: 0,
                received: 2
            }
        );
        let err = assert_rejected(&mut world, RoundDelta::new(0));
        assert!(matches!(err, WorldError::OutOfOrderRound { .. }));

        applied(&mut world, RoundDelta::new(1));
        assert_eq!(world.round(), 1);
        let err = assert_rejected(&mut world, RoundDelta::new(1));
        assert!(matches!(err, WorldError::OutOfOrderRound { current: 1, .. }));
    }

    #[test]
    fn moves_update_locations() {
        let mut world = two_body_world();
        let mut delta = RoundDelta::new(1);
        delta.push_move(1, IVec2::new(2, 1));
        delta.push_move(2, IVec2::new(7, 8));
        applied(&mut world, delta);
        let one = world.body(1).unwrap();
        assert_eq!((one.x, one.y), (2, 1));
        let two = world.body(2).unwrap();
        assert_eq!((two.x, two.y), (7, 8));
    }

    #[test]
    fn resource_changes_replace_the_round_delta() {
        let mut world = two_body_world();
        let mut delta = RoundDelta::new(1);
        delta.push_team_change(1, 5);
        applied(&mut world, delta);
        let mut delta = RoundDelta::new(2);
        delta.push_team_change(1, -2);
        applied(&mut world, delta);
        let team = world.team(1).unwrap();
        assert_eq!(team.resources(), 3);
        assert_eq!(team.resource_change(), -2);

        applied(&mut world, RoundDelta::new(3));
        assert_eq!(world.team(1).unwrap().resource_change(), 0);
        assert_eq!(world.team(1).unwrap().resources(), 3);
    }

    #[test]
    fn spawns_enter_with_defaults_and_count() {
        let mut world = two_body_world();
        let mut delta = RoundDelta::new(1);
        delta.push_spawn(10, 1, 3, IVec2::new(4, 4), 30);
        applied(&mut world, delta);

        let body = world.body(10).unwrap();
        assert_eq!(body.level, 1);
        assert_eq!(body.action, ACTION_NONE);
        assert_eq!(body.parent, 0);
        assert_eq!(body.hp, 30);
        let team = world.team(1).unwrap();
        assert_eq!(team.robots(3, 1), 1);
        assert_eq!(team.total_hp(3, 1), 30);
    }

    #[test]
    fn death_moves_body_to_dead_table_and_updates_stats() {
        let mut world = two_body_world();
        let mut delta = RoundDelta::new(1);
        delta.push_move(1, IVec2::new(3, 1));
        delta.push_death(1);
        applied(&mut world, delta);

        assert!(world.body(1).is_none());
        let dead = world.dead_bodies().lookup(1).unwrap();
        assert_eq!((dead.x, dead.y), (3, 1));
        let team = world.team(1).unwrap();
        assert_eq!(team.robots(0, 1), 0);
        assert_eq!(team.total_hp(0, 1), 0);
        assert_eq!(world.team(2).unwrap().robots(0, 1), 1);

        applied(&mut world, RoundDelta::new(2));
        assert!(world.dead_bodies().is_empty());
    }

    #[test]
    fn actions_last_exactly_one_round() {
        let mut world = two_body_world();
        let mut delta = RoundDelta::new(1);
        delta.push_action(1, ActionKind::Explode, 2);
        delta.push_action(2, ActionKind::Explode, 1);
        applied(&mut world, delta);
        assert_eq!(world.body(1).unwrap().action, ActionKind::Explode.code());
        assert_eq!(world.body(1).unwrap().target, 2);

        // Body 2 acts again in round 2; body 1 does not.
        let mut delta = RoundDelta::new(2);
        delta.push_action(2, ActionKind::Explode, 1);
        applied(&mut world, delta);
        let one = world.body(1).unwrap();
        assert_eq!(one.action, ACTION_NONE);
        assert_eq!(one.target, NO_TARGET);
        assert_eq!(world.body(2).unwrap().action, ActionKind::Explode.code());

        applied(&mut world, RoundDelta::new(3));
        assert_eq!(world.body(2).unwrap().action, ACTION_NONE);
    }

    #[test]
    fn body_that_acted_and_died_is_skipped_on_reset() {
        let mut world = two_body_world();
        let mut delta = RoundDelta::new(1);
        delta.push_action(1, ActionKind::Explode, -1);
        delta.push_death(1);
        applied(&mut world, delta);
        applied(&mut world, RoundDelta::new(2));
        assert!(world.body(1).is_none());
    }

    #[test]
    fn mining_targets_a_cell_and_counts_per_round() {
        let mut world = two_body_world();
        let mut delta = RoundDelta::new(1);
        delta.push_action(1, ActionKind::MineResource, 55);
        delta.push_action(1, ActionKind::MineResource, 55);
        applied(&mut world, delta);

        let one = world.body(1).unwrap();
        assert_eq!(one.target, 55);
        assert_eq!((one.target_x, one.target_y), (5, 5));
        let team = world.team(1).unwrap();
        assert_eq!(team.resource_mined(), 2);
        assert_eq!(team.mined_history().iter().copied().collect::<Vec<_>>(), vec![2]);
        assert_eq!(world.team(2).unwrap().mined_history().back(), Some(&0));

        applied(&mut world, RoundDelta::new(2));
        let team = world.team(1).unwrap();
        assert_eq!(team.resource_mined(), 0);
        assert_eq!(team.mined_history().iter().copied().collect::<Vec<_>>(), vec![2, 0]);
    }

    #[test]
    fn spawn_action_links_parent_and_child() {
        let mut world = two_body_world();
        let mut delta = RoundDelta::new(1);
        delta.push_spawn(10, 1, 1, IVec2::new(2, 2), 20);
        delta.push_action(1, ActionKind::SpawnUnit, 10);
        applied(&mut world, delta);

        let parent = world.body(1).unwrap();
        assert_eq!(parent.action, ActionKind::SpawnUnit.code());
        assert_eq!(parent.target, 10);
        assert_eq!((parent.target_x, parent.target_y), (2, 2));
        assert_eq!(world.body(10).unwrap().parent, 1);
    }

    #[test]
    fn health_changes_persist_and_track_totals() {
        let mut world = two_body_world();
        let mut delta = RoundDelta::new(1);
        delta.push_action(1, ActionKind::ChangeHealth, -20);
        applied(&mut world, delta);
        assert_eq!(world.body(1).unwrap().hp, 30);
        assert_eq!(world.team(1).unwrap().total_hp(0, 1), 30);
        assert_eq!(world.body(1).unwrap().action, ACTION_NONE);

        applied(&mut world, RoundDelta::new(2));
        assert_eq!(world.body(1).unwrap().hp, 30);

        let mut delta = RoundDelta::new(3);
        delta.push_death(1);
        applied(&mut world, delta);
        assert_eq!(world.team(1).unwrap().total_hp(0, 1), 0);
    }

    #[test]
    fn unknown_and_exception_actions_change_nothing() {
        let mut control = two_body_world();
        let mut world = two_body_world();
        applied(&mut control, RoundDelta::new(1));

        let mut delta = RoundDelta::new(1);
        delta.push_raw_action(1, 42, 7);
        delta.push_raw_action(99, -7, 0);
        delta.push_action(2, ActionKind::DieException, 0);
        applied(&mut world, delta);
        assert_eq!(world.state_hash(), control.state_hash());
    }

    #[test]
    fn resources_regenerate_on_period() {
        let meta = Metadata {
            constants: GameConstants {
                increase_period: 2,
                resource_increase: 5,
            },
            ..Metadata::default()
        };
        let mut world = two_body_world_with(&meta);
        applied(&mut world, RoundDelta::new(1));
        assert_eq!(world.map().resources()[0], 4);

        applied(&mut world, RoundDelta::new(2));
        assert_eq!(world.map().resources()[0], 9);
        assert_eq!(world.map().resources()[55], 15);
        assert_eq!(world.map().resources()[1], 0);
    }

    #[test]
    fn indicators_are_replaced_each_round() {
        let mut world = two_body_world();
        let mut delta = RoundDelta::new(1);
        delta.push_dot(1, IVec2::new(0, 0), [255, 0, 0]);
        delta.push_dot(1, IVec2::new(1, 0), [0, 255, 0]);
        delta.push_line(2, IVec2::new(0, 0), IVec2::new(9, 9), [0, 0, 255]);
        applied(&mut world, delta);

        assert_eq!(world.indicator_dots().len(), 2);
        let second = world.indicator_dots().lookup(1).unwrap();
        assert_eq!((second.owner, second.x, second.green), (1, 1, 255));
        assert_eq!(world.indicator_lines().lookup(0).unwrap().end_x, 9);

        applied(&mut world, RoundDelta::new(2));
        assert!(world.indicator_dots().is_empty());
        assert!(world.indicator_lines().is_empty());
    }

    #[test]
    fn indicator_strings_persist_until_overwritten() {
        let mut world = two_body_world();
        let mut delta = RoundDelta::new(1);
        delta.push_indicator_string(1, "scouting");
        applied(&mut world, delta);
        applied(&mut world, RoundDelta::new(2));
        assert_eq!(world.indicator_string(1), Some("scouting"));

        let mut delta = RoundDelta::new(3);
        delta.push_indicator_string(1, "retreat");
        applied(&mut world, delta);
        assert_eq!(world.indicator_string(1), Some("retreat"));
    }

    #[test]
    fn bytecodes_land_on_spawned_and_surviving_bodies() {
        let mut world = two_body_world();
        let mut delta = RoundDelta::new(1);
        delta.push_spawn(10, 2, 0, IVec2::new(6, 6), 50);
        delta.push_bytecodes(10, 700);
        delta.push_bytecodes(1, 1200);
        applied(&mut world, delta);
        assert_eq!(world.body(10).unwrap().bytecodes_used, 700);
        assert_eq!(world.body(1).unwrap().bytecodes_used, 1200);
    }

    #[test]
    fn bytecodes_for_a_body_dying_this_round_are_rejected() {
        let mut world = two_body_world();
        let mut delta = RoundDelta::new(1);
        delta.push_death(1);
        delta.push_bytecodes(1, 500);
        let err = assert_rejected(&mut world, delta);
        assert_eq!(err, WorldError::Store(StoreError::NotFound { id: 1 }));
    }

    #[test]
    fn invalid_deltas_leave_snapshot_untouched() {
        let mut world = two_body_world();

        let mut delta = RoundDelta::new(1);
        delta.push_move(1, IVec2::new(2, 2));
        delta.push_move(77, IVec2::new(2, 2));
        let err = assert_rejected(&mut world, delta);
        assert_eq!(err, WorldError::Store(StoreError::NotFound { id: 77 }));

        let mut delta = RoundDelta::new(1);
        delta.push_team_change(9, 1);
        let err = assert_rejected(&mut world, delta);
        assert_eq!(err, WorldError::UnknownTeam { team: 9 });

        let mut delta = RoundDelta::new(1);
        delta.push_spawn(2, 2, 0, IVec2::ZERO, 10);
        let err = assert_rejected(&mut world, delta);
        assert_eq!(err, WorldError::Store(StoreError::DuplicateKey { id: 2 }));

        let mut delta = RoundDelta::new(1);
        delta.push_death(1);
        delta.push_death(1);
        let err = assert_rejected(&mut world, delta);
        assert_eq!(err, WorldError::Store(StoreError::NotFound { id: 1 }));

        let mut delta = RoundDelta::new(1);
        delta.push_action(1, ActionKind::SpawnUnit, 50);
        let err = assert_rejected(&mut world, delta);
        assert_eq!(err, WorldError::Store(StoreError::NotFound { id: 50 }));

        let mut delta = RoundDelta::new(1);
        delta.push_move(1, IVec2::new(2, 2));
        delta.moved_locs.ys.pop();
        let err = assert_rejected(&mut world, delta);
        assert!(matches!(err, WorldError::MalformedDelta { .. }));

        applied(&mut world, RoundDelta::new(1));
    }

    #[test]
    fn health_overflow_is_rejected_before_any_write() {
        let mut world = two_body_world();
        let mut delta = RoundDelta::new(1);
        delta.push_team_change(1, 3);
        delta.push_move(1, IVec2::new(2, 2));
        delta.push_action(1, ActionKind::ChangeHealth, i32::MAX);
        let err = assert_rejected(&mut world, delta);
        assert_eq!(
            err,
            WorldError::Overflow {
                field: "hp",
                owner: 1
            }
        );

        // Body hp fits, but the team's hp bucket does not.
        let mut delta = RoundDelta::new(1);
        delta.push_spawn(10, 1, 0, IVec2::new(3, 3), i32::MAX - 100);
        delta.push_action(1, ActionKind::ChangeHealth, 60);
        let err = assert_rejected(&mut world, delta);
        assert_eq!(
            err,
            WorldError::Overflow {
                field: "total_hp",
                owner: 1
            }
        );

        let mut delta = RoundDelta::new(1);
        delta.push_action(1, ActionKind::ChangeHealth, -60);
        delta.push_action(1, ActionKind::ChangeHealth, i32::MIN);
        let err = assert_rejected(&mut world, delta);
        assert!(matches!(err, WorldError::Overflow { field: "hp", .. }));
    }

    #[test]
    fn resource_overflow_is_rejected() {
        let mut world = two_body_world();
        let mut delta = RoundDelta::new(1);
        delta.push_team_change(1, i32::MAX);
        applied(&mut world, delta);

        let mut delta = RoundDelta::new(2);
        delta.push_move(2, IVec2::new(7, 7));
        delta.push_team_change(1, 1);
        let err = assert_rejected(&mut world, delta);
        assert_eq!(
            err,
            WorldError::Overflow {
                field: "resources",
                owner: 1
            }
        );

        let mut delta = RoundDelta::new(2);
        delta.push_team_change(2, i32::MIN);
        delta.push_team_change(2, -1);
        let err = assert_rejected(&mut world, delta);
        assert_eq!(
            err,
            WorldError::Overflow {
                field: "resources",
                owner: 2
            }
        );
    }

    #[test]
    fn regeneration_overflow_is_rejected() {
        let meta = Metadata {
            constants: GameConstants {
                increase_period: 1,
                resource_increase: i32::MAX,
            },
            ..Metadata::default()
        };
        let mut world = two_body_world_with(&meta);
        let err = assert_rejected(&mut world, RoundDelta::new(1));
        assert_eq!(
            err,
            WorldError::Overflow {
                field: "map resources",
                owner: 0
            }
        );
    }

    #[test]
    fn aggregates_hold_across_a_busy_match() {
        let mut world = two_body_world();
        let mut next_id = 100;
        for round in 1..=40u32 {
            let mut delta = RoundDelta::new(round);
            let team = if round % 2 == 0 { 1 } else { 2 };
            delta.push_spawn(next_id, team, (round % 3) as i8, IVec2::new(5, 5), 40);
            delta.push_action(next_id, ActionKind::ChangeHealth, -(round as i32 % 7));
            if round > 5 && round % 4 == 0 {
                delta.push_death(next_id - 3);
            }
            next_id += 1;
            applied(&mut world, delta);
        }
        assert_eq!(world.round(), 40);
        assert_eq!(world.team(1).unwrap().mined_history().len(), 40);
    }
}
