//! Achievement catalog
//!
//! A fixed set of monotonic milestones. Each id carries a threshold
//! predicate; labels and icons are presentation and looked up by id.

use crate::difficulty::Mode;
use crate::metrics::GameStats;
use crate::progression::UserProfile;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Unique identifier for each achievement, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AchievementId {
    #[serde(rename = "test1")]
    Test1,
    #[serde(rename = "test10")]
    Test10,
    #[serde(rename = "test50")]
    Test50,
    #[serde(rename = "wpm80")]
    Wpm80,
    #[serde(rename = "wpm100")]
    Wpm100,
    #[serde(rename = "wpm120")]
    Wpm120,
    #[serde(rename = "accuracy99")]
    Accuracy99,
    #[serde(rename = "noErrors")]
    NoErrors,
    #[serde(rename = "pro1")]
    Pro1,
    #[serde(rename = "pro5")]
    Pro5,
}

impl AchievementId {
    pub const ALL: [AchievementId; 10] = [
        AchievementId::Test1,
        AchievementId::Test10,
        AchievementId::Test50,
        AchievementId::Wpm80,
        AchievementId::Wpm100,
        AchievementId::Wpm120,
        AchievementId::Accuracy99,
        AchievementId::NoErrors,
        AchievementId::Pro1,
        AchievementId::Pro5,
    ];

    /// The string id used in stored profiles.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Test1 => "test1",
            Self::Test10 => "test10",
            Self::Test50 => "test50",
            Self::Wpm80 => "wpm80",
            Self::Wpm100 => "wpm100",
            Self::Wpm120 => "wpm120",
            Self::Accuracy99 => "accuracy99",
            Self::NoErrors => "noErrors",
            Self::Pro1 => "pro1",
            Self::Pro5 => "pro5",
        }
    }

    pub fn from_str_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == id)
    }

    /// Whether the achievement is earned by a profile (counters already
    /// updated for this session) together with the session's stats.
    pub fn is_satisfied(&self, profile: &UserProfile, stats: &GameStats, _mode: Mode) -> bool {
        match self {
            Self::Test1 => profile.tests_completed >= 1,
            Self::Test10 => profile.tests_completed >= 10,
            Self::Test50 => profile.tests_completed >= 50,
            Self::Wpm80 => stats.wpm >= 80,
            Self::Wpm100 => stats.wpm >= 100,
            Self::Wpm120 => stats.wpm >= 120,
            Self::Accuracy99 => stats.accuracy >= 99,
            Self::NoErrors => stats.errors == 0,
            Self::Pro1 => profile.pro_tests_completed >= 1,
            Self::Pro5 => profile.pro_tests_completed >= 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Test1 => "First Contact",
            Self::Test10 => "Regular Operator",
            Self::Test50 => "Veteran Netrunner",
            Self::Wpm80 => "Overclocked",
            Self::Wpm100 => "Triple Digits",
            Self::Wpm120 => "Light Speed",
            Self::Accuracy99 => "Precision Protocol",
            Self::NoErrors => "Zero Defects",
            Self::Pro1 => "Going Pro",
            Self::Pro5 => "Pro Circuit",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Test1 => "Complete your first typing test",
            Self::Test10 => "Complete 10 typing tests",
            Self::Test50 => "Complete 50 typing tests",
            Self::Wpm80 => "Reach 80 WPM in a test",
            Self::Wpm100 => "Reach 100 WPM in a test",
            Self::Wpm120 => "Reach 120 WPM in a test",
            Self::Accuracy99 => "Finish a test with at least 99% accuracy",
            Self::NoErrors => "Finish a test without a single error",
            Self::Pro1 => "Complete a pro challenge",
            Self::Pro5 => "Complete 5 pro challenges",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Test1 | Self::Test10 | Self::Test50 => "◆",
            Self::Wpm80 | Self::Wpm100 | Self::Wpm120 => "»",
            Self::Accuracy99 => "◎",
            Self::NoErrors => "✓",
            Self::Pro1 | Self::Pro5 => "★",
        }
    }
}

/// Reads a list of string ids, skipping ids this build does not know.
pub(crate) fn deserialize_known_ids<'de, D>(deserializer: D) -> Result<BTreeSet<AchievementId>, D::Error>
where
    D: Deserializer<'de>,
{
    let ids: Vec<String> = Vec::deserialize(deserializer)?;
    Ok(ids
        .iter()
        .filter_map(|id| AchievementId::from_str_id(id))
        .collect())
}
