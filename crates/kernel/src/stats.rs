//! Per-team aggregates and map state.

use std::collections::{BTreeMap, HashMap, VecDeque};

use glam::IVec2;
use playback_common::{BodyType, Symmetry, TeamId};

use crate::error::WorldError;

/// Number of rounds of mined history kept per team.
pub const MINED_HISTORY_LEN: usize = 100;

/// Running statistics for one team.
///
/// Robot counts and hp totals are bucketed by `[type][level - 1]` and always
/// equal the count/sum over the team's live bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamStats {
    robots: Vec<Vec<i32>>,
    total_hp: Vec<Vec<i32>>,
    resources: i32,
    resource_change: i32,
    resource_mined: i32,
    mined_history: VecDeque<i32>,
}

fn slot(body_type: BodyType, level: i8) -> Option<(usize, usize)> {
    let t = usize::try_from(body_type).ok()?;
    let l = usize::try_from(level).ok()?.checked_sub(1)?;
    Some((t, l))
}

fn grow(buckets: &mut Vec<Vec<i32>>, t: usize, l: usize) -> &mut i32 {
    if buckets.len() <= t {
        buckets.resize_with(t + 1, Vec::new);
    }
    let levels = &mut buckets[t];
    if levels.len() <= l {
        levels.resize(l + 1, 0);
    }
    &mut levels[l]
}

fn read(buckets: &[Vec<i32>], body_type: BodyType, level: i8) -> i32 {
    slot(body_type, level)
        .and_then(|(t, l)| buckets.get(t)?.get(l).copied())
        .unwrap_or(0)
}

impl TeamStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live robots of `body_type` at `level` (levels start at 1).
    pub fn robots(&self, body_type: BodyType, level: i8) -> i32 {
        read(&self.robots, body_type, level)
    }

    /// Summed hp of live robots of `body_type` at `level`.
    pub fn total_hp(&self, body_type: BodyType, level: i8) -> i32 {
        read(&self.total_hp, body_type, level)
    }

    /// All robot-count buckets, `[type][level - 1]`.
    pub fn robot_counts(&self) -> &[Vec<i32>] {
        &self.robots
    }

    /// All hp buckets, `[type][level - 1]`.
    pub fn hp_totals(&self) -> &[Vec<i32>] {
        &self.total_hp
    }

    pub fn robot_total(&self) -> i32 {
        self.robots.iter().flatten().sum()
    }

    pub fn resources(&self) -> i32 {
        self.resources
    }

    /// Resource change reported for the latest round.
    pub fn resource_change(&self) -> i32 {
        self.resource_change
    }

    /// Mine actions by this team during the latest round.
    pub fn resource_mined(&self) -> i32 {
        self.resource_mined
    }

    /// Mined amount per round, oldest first, at most `MINED_HISTORY_LEN` long.
    pub fn mined_history(&self) -> &VecDeque<i32> {
        &self.mined_history
    }

    /// Every non-empty bucket as `(type, level)`.
    pub fn buckets(&self) -> impl Iterator<Item = (BodyType, i8)> + '_ {
        let rows = self.robots.len().max(self.total_hp.len());
        (0..rows).flat_map(move |t| {
            let levels = self
                .robots
                .get(t)
                .map_or(0, Vec::len)
                .max(self.total_hp.get(t).map_or(0, Vec::len));
            (0..levels).filter_map(move |l| {
                let body_type = BodyType::try_from(t).ok()?;
                let level = i8::try_from(l + 1).ok()?;
                let occupied = self.robots(body_type, level) != 0
                    || self.total_hp(body_type, level) != 0;
                occupied.then_some((body_type, level))
            })
        })
    }

    pub(crate) fn add_body(&mut self, body_type: BodyType, level: i8, hp: i32) {
        if let Some((t, l)) = slot(body_type, level) {
            *grow(&mut self.robots, t, l) += 1;
            *grow(&mut self.total_hp, t, l) += hp;
        }
    }

    pub(crate) fn remove_body(&mut self, body_type: BodyType, level: i8, hp: i32) {
        if let Some((t, l)) = slot(body_type, level) {
            *grow(&mut self.robots, t, l) -= 1;
            *grow(&mut self.total_hp, t, l) -= hp;
        }
    }

    pub(crate) fn add_hp(&mut self, body_type: BodyType, level: i8, delta: i32) {
        if let Some((t, l)) = slot(body_type, level) {
            *grow(&mut self.total_hp, t, l) += delta;
        }
    }

    /// Start-of-round reset of the per-round counters.
    pub(crate) fn begin_round(&mut self) {
        self.resource_change = 0;
        self.resource_mined = 0;
    }

    pub(crate) fn apply_resource_change(&mut self, change: i32) {
        self.resources += change;
        self.resource_change = change;
    }

    pub(crate) fn record_mine(&mut self) {
        self.resource_mined += 1;
    }

    pub(crate) fn push_mined_history(&mut self) {
        self.mined_history.push_back(self.resource_mined);
        while self.mined_history.len() > MINED_HISTORY_LEN {
            self.mined_history.pop_front();
        }
    }
}

/// Hp bucket totals a batch of changes would produce, computed with checked
/// arithmetic before any of them is written.
#[derive(Debug, Default)]
pub(crate) struct HpProjection {
    totals: HashMap<(TeamId, BodyType, i8), i32>,
}

impl HpProjection {
    pub(crate) fn add(
        &mut self,
        teams: &BTreeMap<TeamId, TeamStats>,
        team: TeamId,
        body_type: BodyType,
        level: i8,
        hp: i32,
    ) -> Result<(), WorldError> {
        self.update(teams, team, body_type, level, |total| total.checked_add(hp))
    }

    pub(crate) fn remove(
        &mut self,
        teams: &BTreeMap<TeamId, TeamStats>,
        team: TeamId,
        body_type: BodyType,
        level: i8,
        hp: i32,
    ) -> Result<(), WorldError> {
        self.update(teams, team, body_type, level, |total| total.checked_sub(hp))
    }

    fn update(
        &mut self,
        teams: &BTreeMap<TeamId, TeamStats>,
        team: TeamId,
        body_type: BodyType,
        level: i8,
        op: impl FnOnce(i32) -> Option<i32>,
    ) -> Result<(), WorldError> {
        // Uncounted bodies never touch a bucket.
        let Some(stats) = teams.get(&team) else {
            return Ok(());
        };
        if slot(body_type, level).is_none() {
            return Ok(());
        }
        let total = self
            .totals
            .entry((team, body_type, level))
            .or_insert_with(|| stats.total_hp(body_type, level));
        *total = op(*total).ok_or(WorldError::Overflow {
            field: "total_hp",
            owner: i64::from(team),
        })?;
        Ok(())
    }
}

/// Map data: static layout from the header plus the live resource grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapStats {
    pub(crate) name: String,
    pub(crate) min_corner: IVec2,
    pub(crate) max_corner: IVec2,
    pub(crate) random_seed: i32,
    pub(crate) symmetry: Symmetry,
    pub(crate) walls: Vec<bool>,
    pub(crate) resources: Vec<i32>,
}

impl MapStats {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_corner(&self) -> IVec2 {
        self.min_corner
    }

    pub fn max_corner(&self) -> IVec2 {
        self.max_corner
    }

    pub fn random_seed(&self) -> i32 {
        self.random_seed
    }

    pub fn symmetry(&self) -> Symmetry {
        self.symmetry
    }

    pub fn width(&self) -> i32 {
        self.max_corner.x.saturating_sub(self.min_corner.x)
    }

    pub fn height(&self) -> i32 {
        self.max_corner.y.saturating_sub(self.min_corner.y)
    }

    pub fn cell_count(&self) -> usize {
        let cells = i64::from(self.width().max(0)) * i64::from(self.height().max(0));
        usize::try_from(cells).unwrap_or(0)
    }

    pub fn walls(&self) -> &[bool] {
        &self.walls
    }

    /// Current resource amount per cell.
    pub fn resources(&self) -> &[i32] {
        &self.resources
    }

    /// Row-major cell index of `loc`, or `None` off the map.
    pub fn index_of(&self, loc: IVec2) -> Option<usize> {
        let rel = IVec2::new(
            loc.x.checked_sub(self.min_corner.x)?,
            loc.y.checked_sub(self.min_corner.y)?,
        );
        if rel.x < 0 || rel.y < 0 || rel.x >= self.width() || rel.y >= self.height() {
            return None;
        }
        usize::try_from(i64::from(rel.y) * i64::from(self.width()) + i64::from(rel.x)).ok()
    }

    /// Location of cell `index`, or `None` past the last cell.
    pub fn location_of(&self, index: usize) -> Option<IVec2> {
        if index >= self.cell_count() {
            return None;
        }
        let index = i32::try_from(index).ok()?;
        let width = self.width();
        Some(self.min_corner + IVec2::new(index % width, index / width))
    }

    pub fn is_wall(&self, loc: IVec2) -> bool {
        self.index_of(loc)
            .and_then(|i| self.walls.get(i).copied())
            .unwrap_or(false)
    }

    pub fn resource_at(&self, loc: IVec2) -> Option<i32> {
        self.index_of(loc).and_then(|i| self.resources.get(i).copied())
    }

    /// The cell matching `loc` under the map's symmetry.
    pub fn symmetric(&self, loc: IVec2) -> IVec2 {
        self.min_corner
            + self
                .symmetry
                .mirror(loc - self.min_corner, self.width(), self.height())
    }

    /// First non-empty cell that `increase` would push out of range.
    pub(crate) fn regeneration_overflow(&self, increase: i32) -> Option<usize> {
        self.resources
            .iter()
            .position(|&v| v > 0 && v.checked_add(increase).is_none())
    }

    /// Add `increase` to every non-empty cell. Empty cells stay empty.
    pub(crate) fn regenerate(&mut self, increase: i32) {
        for value in self.resources.iter_mut().filter(|v| **v > 0) {
            *value += increase;
        }
    }
}
