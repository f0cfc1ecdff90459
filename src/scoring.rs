use crate::aggregate::{self, WorldwideStats};
use crate::metrics::{self, GameStats};
use crate::progression::{self, ProgressEvent, UserProfile};
use crate::session::{SessionContext, SessionResult};

/// Everything a scored session changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Scorecard {
    pub stats: GameStats,
    pub earned_xp: u32,
    pub profile: UserProfile,
    pub world: WorldwideStats,
    pub events: Vec<ProgressEvent>,
}

/// Metrics run first; progression and the global averages then consume the
/// same stats independently.
pub fn score(
    result: SessionResult,
    context: SessionContext,
    profile: &UserProfile,
    world: &WorldwideStats,
) -> Scorecard {
    let stats = metrics::compute(&result);
    let (profile, events) =
        progression::apply_result(profile, &stats, context.difficulty, context.mode);
    let world = aggregate::apply_result(world, &stats);

    Scorecard {
        stats,
        earned_xp: progression::earned_xp(&stats, context.difficulty),
        profile,
        world,
        events,
    }
}
