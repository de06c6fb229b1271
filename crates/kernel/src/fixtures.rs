//! Test fixtures shared by the kernel's unit tests.

use glam::IVec2;
use playback_common::Metadata;

use crate::records::{GameMap, MatchHeader, SpawnedBodyTable};
use crate::WorldSnapshot;

/// 10x10 map with resources in cell 0 (4) and cell 55 (10).
pub(crate) fn header_with(bodies: SpawnedBodyTable) -> MatchHeader {
    let cells = 10 * 10;
    let mut resources = vec![0; cells];
    resources[0] = 4;
    resources[55] = 10;
    MatchHeader {
        map: GameMap {
            name: "test-map".into(),
            min_corner: IVec2::ZERO,
            max_corner: IVec2::new(10, 10),
            symmetry: 0,
            bodies,
            random_seed: 6370,
            walls: vec![false; cells],
            resources,
        },
    }
}

/// Body 1 (team 1) at (1, 1) and body 2 (team 2) at (8, 8); both type 0, hp 50.
pub(crate) fn two_body_world_with(meta: &Metadata) -> WorldSnapshot {
    let mut bodies = SpawnedBodyTable::default();
    bodies.push(1, 1, 0, IVec2::new(1, 1), 50);
    bodies.push(2, 2, 0, IVec2::new(8, 8), 50);
    WorldSnapshot::from_header(meta, &header_with(bodies)).expect("fixture header is valid")
}

pub(crate) fn two_body_world() -> WorldSnapshot {
    two_body_world_with(&Metadata::default())
}
