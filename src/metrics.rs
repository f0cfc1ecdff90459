use crate::session::SessionResult;
use serde::{Deserialize, Serialize};

/// Characters per word under the standard WPM convention.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Derived statistics of one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    pub wpm: u32,
    pub accuracy: u32,
    pub time: u32,
    pub errors: u32,
}

pub fn wpm(correct_characters: u32, elapsed_seconds: f64) -> u32 {
    if !elapsed_seconds.is_finite() || elapsed_seconds <= 0.0 {
        return 0;
    }
    let minutes = elapsed_seconds / 60.0;
    ((correct_characters as f64 / CHARS_PER_WORD) / minutes).round() as u32
}

pub fn accuracy(correct_characters: u32, characters_typed: u32) -> u32 {
    if characters_typed == 0 {
        return 100;
    }
    (100.0 * correct_characters as f64 / characters_typed as f64)
        .round()
        .clamp(0.0, 100.0) as u32
}

pub fn compute(result: &SessionResult) -> GameStats {
    let time = if result.elapsed_seconds.is_finite() {
        result.elapsed_seconds.max(0.0).round() as u32
    } else {
        0
    };

    GameStats {
        wpm: wpm(result.correct_characters, result.elapsed_seconds),
        accuracy: accuracy(result.correct_characters, result.characters_typed),
        time,
        errors: result.error_count,
    }
}
