//! Deep copies of snapshots.
//!
//! Timelines keep keyframes and branch from them, so a copy must share no
//! storage with its source. `clone_from` reuses the destination's buffers,
//! which makes repeated seeks into the same scratch snapshot cheap.

use crate::world::WorldSnapshot;

impl Clone for WorldSnapshot {
    fn clone(&self) -> Self {
        Self {
            bodies: self.bodies.clone(),
            dead_bodies: self.dead_bodies.clone(),
            indicator_dots: self.indicator_dots.clone(),
            indicator_lines: self.indicator_lines.clone(),
            team_stats: self.team_stats.clone(),
            map: self.map.clone(),
            indicator_strings: self.indicator_strings.clone(),
            round: self.round,
            constants: self.constants,
            acted_last_round: self.acted_last_round.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.bodies.copy_from(&source.bodies);
        self.dead_bodies.copy_from(&source.dead_bodies);
        self.indicator_dots.copy_from(&source.indicator_dots);
        self.indicator_lines.copy_from(&source.indicator_lines);
        self.team_stats.clone_from(&source.team_stats);
        self.map.clone_from(&source.map);
        self.indicator_strings.clone_from(&source.indicator_strings);
        self.round = source.round;
        self.constants = source.constants;
        self.acted_last_round.clone_from(&source.acted_last_round);
    }
}

#[cfg(test)]
mod tests {
    use crate::fixtures::two_body_world;
    use crate::records::RoundDelta;
    use crate::WorldSnapshot;
    use glam::IVec2;
    use playback_common::ActionKind;

    fn round_one() -> RoundDelta {
        let mut delta = RoundDelta::new(1);
        delta.push_team_change(1, 7);
        delta.push_move(1, IVec2::new(2, 2));
        delta.push_spawn(10, 2, 1, IVec2::new(7, 7), 25);
        delta.push_action(2, ActionKind::MineResource, 0);
        delta.push_indicator_string(1, "hi");
        delta
    }

    #[test]
    fn clone_is_independent_of_source() {
        let original = two_body_world();
        let before = original.state_hash();

        let mut copy = original.clone();
        assert_eq!(copy, original);
        copy.apply(&round_one()).unwrap();

        assert_eq!(original.round(), 0);
        assert_eq!(original.state_hash(), before);
        assert!(original.body(10).is_none());
        assert_eq!(original.body(1).unwrap().x, 1);
        assert!(original.team(2).unwrap().mined_history().is_empty());
        assert!(original.indicator_string(1).is_none());
        assert_ne!(copy.state_hash(), before);
    }

    #[test]
    fn source_advancing_does_not_touch_clone() {
        let mut original = two_body_world();
        let copy = original.clone();
        original.apply(&round_one()).unwrap();
        assert_eq!(copy.round(), 0);
        assert_eq!(copy.bodies().len(), 2);
        assert_eq!(copy.team(1).unwrap().resources(), 0);
    }

    #[test]
    fn clone_from_overwrites_scratch_state() {
        let base = two_body_world();
        let mut advanced = base.clone();
        advanced.apply(&round_one()).unwrap();

        let mut scratch: WorldSnapshot = advanced.clone();
        scratch.clone_from(&base);
        assert_eq!(scratch, base);
        assert_eq!(scratch.state_hash(), base.state_hash());

        scratch.apply(&round_one()).unwrap();
        assert_eq!(scratch.state_hash(), advanced.state_hash());
    }
}
