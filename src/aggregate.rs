use crate::metrics::GameStats;
use serde::{Deserialize, Serialize};

/// Running averages over every session ever scored on this device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldwideStats {
    pub total_users: u32,
    pub total_tests: u64,
    pub average_wpm: u32,
    pub average_accuracy: u32,
}

impl WorldwideStats {
    /// State written on first launch.
    pub fn first_run() -> Self {
        Self {
            total_users: 1,
            ..Self::default()
        }
    }
}

fn running_mean(average: u32, samples: u64, next: u32, new_samples: u64) -> u32 {
    ((average as f64 * samples as f64 + next as f64) / new_samples as f64).round() as u32
}

pub fn apply_result(world: &WorldwideStats, stats: &GameStats) -> WorldwideStats {
    let total_tests = world.total_tests.saturating_add(1);
    WorldwideStats {
        total_users: world.total_users,
        total_tests,
        average_wpm: running_mean(world.average_wpm, world.total_tests, stats.wpm, total_tests),
        average_accuracy: running_mean(
            world.average_accuracy.min(100),
            world.total_tests,
            stats.accuracy.min(100),
            total_tests,
        ),
    }
}
