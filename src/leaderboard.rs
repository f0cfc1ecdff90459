use crate::progression::UserProfile;
use itertools::Itertools;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub rank: usize,
    pub name: String,
    pub level: u32,
    pub xp: u32,
    pub is_current_user: bool,
}

/// Rival operators the player is ranked against.
pub static RIVALS: &[(&str, u32, u32)] = &[
    ("Ghost-7", 14, 320),
    ("NeonViper", 11, 90),
    ("ByteRunner", 9, 410),
    ("Kestrel", 7, 55),
    ("Glitch", 5, 120),
    ("Cipher", 4, 300),
    ("Static", 3, 60),
    ("Nova", 2, 110),
    ("Rookie-42", 1, 40),
];

/// Ranks the rivals together with `user` by level, then XP, both descending.
/// The user wins ties.
pub fn standings(user: &UserProfile) -> Vec<Entry> {
    let me = (user.username.as_str(), user.level, user.xp, true);

    RIVALS
        .iter()
        .map(|&(name, level, xp)| (name, level, xp, false))
        .chain(std::iter::once(me))
        .sorted_by(|a, b| (b.1, b.2, b.3).cmp(&(a.1, a.2, a.3)))
        .enumerate()
        .map(|(i, (name, level, xp, is_current_user))| Entry {
            rank: i + 1,
            name: name.to_string(),
            level,
            xp,
            is_current_user,
        })
        .collect()
}

pub fn user_rank(user: &UserProfile) -> usize {
    standings(user)
        .iter()
        .find(|e| e.is_current_user)
        .map(|e| e.rank)
        .unwrap_or(RIVALS.len() + 1)
}
