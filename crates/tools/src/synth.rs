//! Deterministic synthetic matches for tests, benchmarks and demos.
//!
//! The generator runs a tiny model of the match alongside the deltas it
//! writes, so every produced round is valid against the previous one.

use glam::IVec2;
use playback_common::{ActionKind, BodyId, BodyType, Metadata, Symmetry, TeamId};
use playback_kernel::{
    GameMap, MatchHeader, RoundDelta, SpawnedBodyTable, WorldError, WorldSnapshot,
};
use serde::{Deserialize, Serialize};

/// Generator knobs. Same config, same match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub seed: u64,
    pub rounds: u32,
    pub width: i32,
    pub height: i32,
    pub bodies_per_team: u32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            rounds: 200,
            width: 32,
            height: 32,
            bodies_per_team: 8,
        }
    }
}

/// A generated header plus its round deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticMatch {
    pub metadata: Metadata,
    pub header: MatchHeader,
    pub rounds: Vec<RoundDelta>,
}

const TEAMS: [TeamId; 2] = [1, 2];
const STEPS: [IVec2; 4] = [IVec2::X, IVec2::NEG_X, IVec2::Y, IVec2::NEG_Y];
/// Action code no build knows about; exercises the skip path.
const UNKNOWN_ACTION: i8 = 17;
const OPEN_CELL_ATTEMPTS: usize = 64;

struct Rng(u64);

impl Rng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    fn range(&mut self, n: i32) -> i32 {
        if n <= 0 {
            return 0;
        }
        (self.next_u64() % n as u64) as i32
    }

    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.next_u64() % len as u64) as usize
    }

    fn chance(&mut self, one_in: u64) -> bool {
        self.next_u64() % one_in.max(1) == 0
    }
}

#[derive(Debug, Clone, Copy)]
struct Live {
    id: BodyId,
    team: TeamId,
    body_type: BodyType,
    loc: IVec2,
    hp: i32,
}

struct Generator {
    rng: Rng,
    width: i32,
    height: i32,
    walls: Vec<bool>,
    resource_cells: Vec<i32>,
    live: Vec<Live>,
    next_id: BodyId,
}

impl Generator {
    fn cell(&self, loc: IVec2) -> usize {
        (loc.y * self.width + loc.x) as usize
    }

    /// A random non-wall cell, or `None` when the whole map is walled.
    fn random_open_cell(&mut self) -> Option<IVec2> {
        for _ in 0..OPEN_CELL_ATTEMPTS {
            let loc = IVec2::new(self.rng.range(self.width), self.rng.range(self.height));
            if !self.walls[self.cell(loc)] {
                return Some(loc);
            }
        }
        let index = self.walls.iter().position(|&wall| !wall)? as i32;
        Some(IVec2::new(index % self.width, index / self.width))
    }

    fn header(&mut self, bodies_per_team: u32) -> MatchHeader {
        let cells = (self.width * self.height) as usize;
        let mut resources = vec![0; cells];
        for index in 0..cells {
            let loc = IVec2::new(index as i32 % self.width, index as i32 / self.width);
            let mirror = self.cell(Symmetry::Rotational.mirror(loc, self.width, self.height));
            if mirror < index {
                continue;
            }
            if self.rng.chance(12) {
                self.walls[index] = true;
                self.walls[mirror] = true;
            } else if self.rng.chance(15) {
                let amount = 5 + self.rng.range(16);
                resources[index] = amount;
                resources[mirror] = amount;
            }
        }
        self.resource_cells = (0..cells)
            .filter(|&i| resources[i] > 0)
            .map(|i| i as i32)
            .collect();

        let mut bodies = SpawnedBodyTable::default();
        for n in 0..bodies_per_team {
            let Some(loc) = self.random_open_cell() else {
                tracing::debug!("no open cell left; map has no bodies");
                break;
            };
            let mirror = Symmetry::Rotational.mirror(loc, self.width, self.height);
            let body_type: BodyType = if n == 0 {
                0
            } else {
                1 + self.rng.range(3) as BodyType
            };
            let hp = if body_type == 0 { 500 } else { 50 };
            for (team, at) in [(TEAMS[0], loc), (TEAMS[1], mirror)] {
                let id = self.next_id;
                self.next_id += 1;
                bodies.push(id, team, body_type, at, hp);
                self.live.push(Live {
                    id,
                    team,
                    body_type,
                    loc: at,
                    hp,
                });
            }
        }

        MatchHeader {
            map: GameMap {
                name: format!("synth-{}x{}", self.width, self.height),
                min_corner: IVec2::ZERO,
                max_corner: IVec2::new(self.width, self.height),
                symmetry: Symmetry::Rotational.code(),
                bodies,
                random_seed: (self.rng.next_u64() >> 33) as i32,
                walls: self.walls.clone(),
                resources,
            },
        }
    }

    fn round(&mut self, round: u32) -> RoundDelta {
        let mut delta = RoundDelta::new(round);
        for team in TEAMS {
            delta.push_team_change(team, self.rng.range(7) - 1);
        }

        let bounds = IVec2::new(self.width - 1, self.height - 1);
        for i in 0..self.live.len() {
            if !self.rng.chance(2) {
                continue;
            }
            let step = STEPS[self.rng.pick(STEPS.len())];
            let next = (self.live[i].loc + step).clamp(IVec2::ZERO, bounds);
            if next != self.live[i].loc && !self.walls[self.cell(next)] {
                self.live[i].loc = next;
                delta.push_move(self.live[i].id, next);
            }
        }

        for team in TEAMS {
            let parents: Vec<Live> = self
                .live
                .iter()
                .filter(|b| b.team == team)
                .copied()
                .collect();
            if parents.is_empty() || !self.rng.chance(3) {
                continue;
            }
            let parent = parents[self.rng.pick(parents.len())];
            let child = Live {
                id: self.next_id,
                team,
                body_type: 1 + self.rng.range(3) as BodyType,
                loc: parent.loc,
                hp: 50,
            };
            self.next_id += 1;
            delta.push_spawn(child.id, team, child.body_type, child.loc, child.hp);
            delta.push_action(parent.id, ActionKind::SpawnUnit, child.id);
            self.live.push(child);
        }

        let mut dying = Vec::new();
        for i in 0..self.live.len() {
            let body = self.live[i];
            if self.rng.chance(6) && !self.resource_cells.is_empty() {
                let cell = self.resource_cells[self.rng.pick(self.resource_cells.len())];
                delta.push_action(body.id, ActionKind::MineResource, cell);
            } else if self.rng.chance(8) {
                let damage = 1 + self.rng.range(15);
                self.live[i].hp -= damage;
                delta.push_action(body.id, ActionKind::ChangeHealth, -damage);
                if self.live[i].hp <= 0 {
                    dying.push(body.id);
                }
            } else if body.body_type != 0 && self.rng.chance(60) {
                delta.push_action(body.id, ActionKind::Explode, -1);
                dying.push(body.id);
            } else if self.rng.chance(200) {
                delta.push_raw_action(body.id, UNKNOWN_ACTION, 0);
            } else if self.rng.chance(300) {
                delta.push_action(body.id, ActionKind::DieException, 0);
            }
        }
        for &id in &dying {
            delta.push_death(id);
        }
        self.live.retain(|b| !dying.contains(&b.id));

        for body in &self.live {
            delta.push_bytecodes(body.id, self.rng.range(15_000));
        }

        if !self.live.is_empty() {
            if self.rng.chance(4) {
                let body = self.live[self.rng.pick(self.live.len())];
                delta.push_indicator_string(body.id, format!("r{round} hp={}", body.hp));
            }
            for _ in 0..self.rng.range(3) {
                let body = self.live[self.rng.pick(self.live.len())];
                let rgb = [self.rng.range(256), self.rng.range(256), self.rng.range(256)];
                delta.push_dot(body.id, body.loc, rgb);
            }
            if self.rng.chance(5) {
                let body = self.live[self.rng.pick(self.live.len())];
                let end = IVec2::new(self.rng.range(self.width), self.rng.range(self.height));
                delta.push_line(body.id, body.loc, end, [0, 128, 255]);
            }
        }
        delta
    }
}

impl SyntheticMatch {
    pub fn generate(config: &SynthConfig) -> Self {
        let width = config.width.max(2);
        let height = config.height.max(2);
        let mut generator = Generator {
            rng: Rng(config.seed),
            width,
            height,
            walls: vec![false; (width * height) as usize],
            resource_cells: Vec::new(),
            live: Vec::new(),
            next_id: 1,
        };
        let header = generator.header(config.bodies_per_team);
        let rounds = (1..=config.rounds).map(|r| generator.round(r)).collect();
        tracing::debug!(
            seed = config.seed,
            rounds = config.rounds,
            bodies = header.map.bodies.len(),
            "synthetic match generated"
        );
        Self {
            metadata: Metadata::default(),
            header,
            rounds,
        }
    }

    pub fn initial_snapshot(&self) -> Result<WorldSnapshot, WorldError> {
        WorldSnapshot::from_header(&self.metadata, &self.header)
    }

    /// Apply every round and return the final snapshot.
    pub fn replay(&self) -> Result<WorldSnapshot, WorldError> {
        let mut world = self.initial_snapshot()?;
        for delta in &self.rounds {
            world.apply(delta)?;
        }
        Ok(world)
    }
}
