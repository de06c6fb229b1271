use serde::{Deserialize, Serialize};

use crate::types::TeamId;

/// Engine constants that affect playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConstants {
    /// Rounds between resource regeneration passes.
    pub increase_period: u32,
    /// Amount added to every non-empty resource cell on a regeneration round.
    pub resource_increase: i32,
}

impl Default for GameConstants {
    fn default() -> Self {
        Self {
            increase_period: 20,
            resource_increase: 5,
        }
    }
}

/// A team taking part in the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMeta {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub package_name: String,
}

/// Per-game metadata delivered before any match header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub teams: Vec<TeamMeta>,
    pub constants: GameConstants,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            teams: vec![
                TeamMeta {
                    id: 1,
                    name: "A".into(),
                    package_name: String::new(),
                },
                TeamMeta {
                    id: 2,
                    name: "B".into(),
                    package_name: String::new(),
                },
            ],
            constants: GameConstants::default(),
        }
    }
}

impl Metadata {
    pub fn team(&self, id: TeamId) -> Option<&TeamMeta> {
        self.teams.iter().find(|team| team.id == id)
    }
}
