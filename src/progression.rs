//! XP and level progression
//!
//! Turns a finished session into XP, level-ups and achievement unlocks.
//! Profiles are values: `apply_result` takes the current profile and
//! returns the next one together with the events it produced.

use crate::achievements::{deserialize_known_ids, AchievementId};
use crate::difficulty::{Difficulty, Mode};
use crate::metrics::GameStats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_USERNAME: &str = "Operator-01";
pub const INITIAL_XP_TO_NEXT_LEVEL: u32 = 100;
pub const LEVEL_XP_GROWTH: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: String,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    pub tests_completed: u32,
    pub pro_tests_completed: u32,
    #[serde(deserialize_with = "deserialize_known_ids")]
    pub unlocked_achievements: BTreeSet<AchievementId>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            level: 1,
            xp: 0,
            xp_to_next_level: INITIAL_XP_TO_NEXT_LEVEL,
            tests_completed: 0,
            pro_tests_completed: 0,
            unlocked_achievements: BTreeSet::new(),
        }
    }
}

impl UserProfile {
    pub fn with_username(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    pub fn has_unlocked(&self, id: AchievementId) -> bool {
        self.unlocked_achievements.contains(&id)
    }

    /// Repairs values a hand-edited or older profile may carry so the
    /// level invariant can be upheld.
    pub fn normalized(mut self) -> Self {
        if self.level == 0 {
            self.level = 1;
        }
        if self.xp_to_next_level == 0 {
            self.xp_to_next_level = INITIAL_XP_TO_NEXT_LEVEL;
        }
        let mut events = Vec::new();
        self.roll_levels(&mut events);
        self
    }

    /// Fraction of the way to the next level, in [0, 1).
    pub fn level_progress(&self) -> f64 {
        if self.xp_to_next_level == 0 {
            return 0.0;
        }
        (self.xp as f64 / self.xp_to_next_level as f64).min(1.0)
    }

    fn roll_levels(&mut self, events: &mut Vec<ProgressEvent>) {
        while self.xp >= self.xp_to_next_level {
            self.level += 1;
            self.xp -= self.xp_to_next_level;
            self.xp_to_next_level = next_threshold(self.xp_to_next_level);
            events.push(ProgressEvent::LevelUp { level: self.level });
        }
    }
}

fn next_threshold(current: u32) -> u32 {
    ((current as f64 * LEVEL_XP_GROWTH).round() as u32).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    XpEarned { amount: u32 },
    LevelUp { level: u32 },
    AchievementUnlocked(AchievementId),
}

impl ProgressEvent {
    /// Message shown to the user when the event is announced.
    pub fn message(&self) -> String {
        match self {
            ProgressEvent::XpEarned { amount } => format!("+{amount} XP"),
            ProgressEvent::LevelUp { level } => format!("Level Up! Reached Level {level}"),
            ProgressEvent::AchievementUnlocked(id) => {
                format!("Achievement Unlocked: {}", id.name())
            }
        }
    }
}

pub fn base_xp(stats: &GameStats) -> u32 {
    (stats.wpm as f64 / 5.0 + stats.accuracy as f64 / 10.0).round() as u32
}

pub fn earned_xp(stats: &GameStats, difficulty: Difficulty) -> u32 {
    (base_xp(stats) as f64 * difficulty.xp_multiplier()).round() as u32
}

pub fn apply_result(
    profile: &UserProfile,
    stats: &GameStats,
    difficulty: Difficulty,
    mode: Mode,
) -> (UserProfile, Vec<ProgressEvent>) {
    let mut next = profile.clone().normalized();
    let mut events = Vec::new();

    let earned = earned_xp(stats, difficulty);
    events.push(ProgressEvent::XpEarned { amount: earned });
    next.xp = next.xp.saturating_add(earned);
    next.roll_levels(&mut events);

    next.tests_completed = next.tests_completed.saturating_add(1);
    if mode == Mode::Pro {
        next.pro_tests_completed = next.pro_tests_completed.saturating_add(1);
    }

    for id in AchievementId::ALL {
        if !next.has_unlocked(id) && id.is_satisfied(&next, stats, mode) {
            next.unlocked_achievements.insert(id);
            events.push(ProgressEvent::AchievementUnlocked(id));
        }
    }

    (next, events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn stats(wpm: u32, accuracy: u32, errors: u32) -> GameStats {
        GameStats {
            wpm,
            accuracy,
            time: 60,
            errors,
        }
    }

    #[test]
    fn test_base_and_earned_xp() {
        assert_eq!(base_xp(&stats(50, 100, 0)), 20);
        assert_eq!(base_xp(&stats(42, 93, 3)), 18); // 8.4 + 9.3 = 17.7
        assert_eq!(earned_xp(&stats(50, 100, 0), Difficulty::Expert), 40);
        assert_eq!(earned_xp(&stats(50, 100, 0), Difficulty::Intermediate), 25);
    }

    #[test]
    fn test_single_level_up() {
        let profile = UserProfile {
            xp: 90,
            ..UserProfile::default()
        };
        let (next, events) =
            apply_result(&profile, &stats(50, 100, 0), Difficulty::Beginner, Mode::Standard);

        assert_eq!(next.level, 2);
        assert_eq!(next.xp, 10);
        assert_eq!(next.xp_to_next_level, 150);
        assert_eq!(events[0], ProgressEvent::XpEarned { amount: 20 });
        assert_eq!(events[1], ProgressEvent::LevelUp { level: 2 });
    }

    #[test]
    fn test_multi_level_jump() {
        let profile = UserProfile {
            xp_to_next_level: 10,
            ..UserProfile::default()
        };
        // 40 xp: 10 -> level 2, 15 -> level 3, 15 left below 23
        let (next, events) =
            apply_result(&profile, &stats(50, 100, 0), Difficulty::Expert, Mode::Standard);

        assert_eq!(next.level, 3);
        assert_eq!(next.xp, 15);
        assert_eq!(next.xp_to_next_level, 23);
        let level_ups: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::LevelUp { .. }))
            .collect();
        assert_eq!(level_ups.len(), 2);
    }

    #[test]
    fn test_counters() {
        let profile = UserProfile::default();
        let (next, _) = apply_result(&profile, &stats(30, 90, 5), Difficulty::Beginner, Mode::Pro);
        assert_eq!(next.tests_completed, 1);
        assert_eq!(next.pro_tests_completed, 1);

        let (next, _) = apply_result(&next, &stats(30, 90, 5), Difficulty::Beginner, Mode::Standard);
        assert_eq!(next.tests_completed, 2);
        assert_eq!(next.pro_tests_completed, 1);
    }

    #[test]
    fn test_fresh_profile_unlocks() {
        let (next, events) = apply_result(
            &UserProfile::default(),
            &stats(40, 100, 0),
            Difficulty::Beginner,
            Mode::Standard,
        );

        let unlocked: Vec<AchievementId> = next.unlocked_achievements.iter().copied().collect();
        assert_eq!(
            unlocked,
            vec![
                AchievementId::Test1,
                AchievementId::Accuracy99,
                AchievementId::NoErrors
            ]
        );
        assert_matches!(
            events.last(),
            Some(ProgressEvent::AchievementUnlocked(AchievementId::NoErrors))
        );
    }

    #[test]
    fn test_unlocks_are_not_repeated() {
        let s = stats(125, 100, 0);
        let (once, first) = apply_result(&UserProfile::default(), &s, Difficulty::Advanced, Mode::Pro);
        let (twice, second) = apply_result(&once, &s, Difficulty::Advanced, Mode::Pro);

        assert!(first
            .iter()
            .any(|e| *e == ProgressEvent::AchievementUnlocked(AchievementId::Wpm120)));
        assert!(second
            .iter()
            .all(|e| !matches!(e, ProgressEvent::AchievementUnlocked(_))));
        assert!(once.unlocked_achievements.is_subset(&twice.unlocked_achievements));
    }

    #[test]
    fn test_test10_unlocks_on_tenth_session() {
        let s = stats(10, 50, 20);
        let mut profile = UserProfile::default();
        for _ in 0..9 {
            profile = apply_result(&profile, &s, Difficulty::Beginner, Mode::Standard).0;
        }
        assert!(!profile.has_unlocked(AchievementId::Test10));

        let (profile, events) = apply_result(&profile, &s, Difficulty::Beginner, Mode::Standard);
        assert!(profile.has_unlocked(AchievementId::Test10));
        assert!(events.contains(&ProgressEvent::AchievementUnlocked(AchievementId::Test10)));
    }

    #[test]
    fn test_invariant_holds_over_many_sessions() {
        let mut profile = UserProfile::default();
        for wpm in (0..200).step_by(7) {
            for difficulty in Difficulty::ALL {
                profile = apply_result(&profile, &stats(wpm, 97, 1), difficulty, Mode::Standard).0;
                assert!(profile.xp < profile.xp_to_next_level);
            }
        }
    }

    #[test]
    fn test_normalized_repairs_broken_profile() {
        let profile = UserProfile {
            level: 0,
            xp: 250,
            xp_to_next_level: 0,
            ..UserProfile::default()
        }
        .normalized();

        assert_eq!(profile.level, 3);
        assert_eq!(profile.xp, 0);
        assert_eq!(profile.xp_to_next_level, 225);
    }

    #[test]
    fn test_profile_json_uses_camel_case_and_skips_unknown_ids() {
        let json = r#"{
            "username": "neo",
            "level": 4,
            "xp": 12,
            "xpToNextLevel": 338,
            "testsCompleted": 12,
            "proTestsCompleted": 2,
            "unlockedAchievements": ["test1", "retired", "noErrors"]
        }"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.xp_to_next_level, 338);
        assert_eq!(profile.unlocked_achievements.len(), 2);

        let out = serde_json::to_string(&profile).unwrap();
        assert!(out.contains("\"xpToNextLevel\":338"));
        assert!(out.contains("\"noErrors\""));
    }

    #[test]
    fn test_event_messages() {
        assert_eq!(
            ProgressEvent::LevelUp { level: 7 }.message(),
            "Level Up! Reached Level 7"
        );
        assert_eq!(
            ProgressEvent::AchievementUnlocked(AchievementId::Pro1).message(),
            "Achievement Unlocked: Going Pro"
        );
    }
}
