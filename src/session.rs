use crate::difficulty::{Difficulty, Mode};
use crate::levels::TEXT_LEVELS;

/// Lifecycle of one typing test.
///
/// `Idle -> Running -> {Completed | TimedOut} -> Scored -> Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SessionPhase {
    Idle,
    Running,
    Completed,
    TimedOut,
    Scored,
}

impl SessionPhase {
    pub fn has_ended(self) -> bool {
        matches!(self, SessionPhase::Completed | SessionPhase::TimedOut)
    }

    /// Whether `self -> next` is one of the permitted lifecycle edges.
    pub fn can_transition_to(self, next: SessionPhase) -> bool {
        use SessionPhase::*;
        matches!(
            (self, next),
            (Idle, Running)
                | (Running, Completed)
                | (Running, TimedOut)
                | (Completed, Scored)
                | (TimedOut, Scored)
                | (Scored, Idle)
        )
    }
}

/// Immutable record of one completed or timed-out attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionResult {
    pub characters_typed: u32,
    pub correct_characters: u32,
    pub elapsed_seconds: f64,
    pub error_count: u32,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub text: String,
    pub duration_secs: f64,
}

/// Difficulty and mode a finished session is scored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionContext {
    pub difficulty: Difficulty,
    pub mode: Mode,
}

pub const LEVEL_DURATION_SECS: u64 = 60;
/// Longest session a user can ask for.
pub const MAX_DURATION_SECS: u64 = 3600;

/// Keeps a requested duration within `1..=MAX_DURATION_SECS`.
pub fn clamp_duration_secs(secs: u64) -> u64 {
    secs.clamp(1, MAX_DURATION_SECS)
}

/// Where the passage of a session came from.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionSource {
    CatalogLevel(usize),
    Challenge {
        difficulty: Difficulty,
        duration_secs: u64,
    },
    Custom {
        text: String,
        duration_secs: u64,
    },
}

impl SessionSource {
    pub fn context(&self) -> SessionContext {
        match self {
            SessionSource::CatalogLevel(idx) => TEXT_LEVELS
                .get(*idx)
                .map(|level| SessionContext {
                    difficulty: level.difficulty,
                    mode: level.mode,
                })
                .unwrap_or(SessionContext {
                    difficulty: Difficulty::Beginner,
                    mode: Mode::Standard,
                }),
            SessionSource::Challenge { difficulty, .. } => SessionContext {
                difficulty: *difficulty,
                mode: Mode::Pro,
            },
            // custom passages are scored as intermediate practice
            SessionSource::Custom { .. } => SessionContext {
                difficulty: Difficulty::Intermediate,
                mode: Mode::Standard,
            },
        }
    }

    pub fn duration_secs(&self) -> u64 {
        match self {
            SessionSource::CatalogLevel(_) => LEVEL_DURATION_SECS,
            SessionSource::Challenge { duration_secs, .. }
            | SessionSource::Custom { duration_secs, .. } => clamp_duration_secs(*duration_secs),
        }
    }
}
