use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Passage difficulty. Each tier scales the XP earned for a session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
        Difficulty::Expert,
    ];

    pub fn xp_multiplier(self) -> f64 {
        match self {
            Difficulty::Beginner => 1.0,
            Difficulty::Intermediate => 1.25,
            Difficulty::Advanced => 1.5,
            Difficulty::Expert => 2.0,
        }
    }

    /// Cycles to the next tier, wrapping from Expert back to Beginner.
    pub fn next(self) -> Self {
        match self {
            Difficulty::Beginner => Difficulty::Intermediate,
            Difficulty::Intermediate => Difficulty::Advanced,
            Difficulty::Advanced => Difficulty::Expert,
            Difficulty::Expert => Difficulty::Beginner,
        }
    }
}

/// Pro sessions count towards the pro achievements.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    #[default]
    Standard,
    Pro,
}
