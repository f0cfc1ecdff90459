//! Built-in practice passages shown on the level selector.

use crate::difficulty::{Difficulty, Mode};

#[derive(Debug, Clone)]
pub struct Level {
    pub name: &'static str,
    pub text: &'static str,
    pub difficulty: Difficulty,
    pub mode: Mode,
}

pub static TEXT_LEVELS: &[Level] = &[
    Level {
        name: "Boot Sequence",
        text: "The quick brown fox jumps over the lazy dog. A small cat sat on the warm mat and watched the rain fall outside the window.",
        difficulty: Difficulty::Beginner,
        mode: Mode::Standard,
    },
    Level {
        name: "Home Row",
        text: "All good things take time. Keep your hands light, look at the screen, and let each key fall into place one letter at a time.",
        difficulty: Difficulty::Beginner,
        mode: Mode::Standard,
    },
    Level {
        name: "Night Market",
        text: "Neon signs flickered above the crowded street, where vendors sold noodles, batteries, and secondhand circuit boards to anyone who asked.",
        difficulty: Difficulty::Intermediate,
        mode: Mode::Standard,
    },
    Level {
        name: "Signal Check",
        text: "\"Can you hear me?\" she asked, tapping the receiver twice. The static cleared, replaced by a calm voice reading out a list of coordinates.",
        difficulty: Difficulty::Intermediate,
        mode: Mode::Pro,
    },
    Level {
        name: "Data Archive",
        text: "Archivists catalogued the fragmented records meticulously; each manuscript, however damaged, contained irreplaceable testimony: dates, names, and transactions.",
        difficulty: Difficulty::Advanced,
        mode: Mode::Standard,
    },
    Level {
        name: "Deep Protocol",
        text: "Asynchronous handshakes notwithstanding, the orchestration layer guaranteed idempotent delivery; retransmissions were acknowledged, deduplicated, and discarded.",
        difficulty: Difficulty::Advanced,
        mode: Mode::Pro,
    },
    Level {
        name: "Kernel Panic",
        text: "fn main() { let xs: Vec<u32> = (0..10).map(|x| x * 2).collect(); if xs[3] >= 6 && !xs.is_empty() { println!(\"{:?}\", xs); } }",
        difficulty: Difficulty::Expert,
        mode: Mode::Standard,
    },
    Level {
        name: "Black ICE",
        text: "Six sick hicks nick six slick bricks with picks and sticks; {key: [0x1F, 0x2E]} => /srv/ice/*.cfg && echo $? | tee -a ~/trace.log",
        difficulty: Difficulty::Expert,
        mode: Mode::Pro,
    },
];

/// Fixed paragraph used when a generated challenge is unavailable.
pub fn fallback_passage(difficulty: Difficulty) -> &'static str {
    TEXT_LEVELS
        .iter()
        .find(|level| level.difficulty == difficulty)
        .map(|level| level.text)
        .unwrap_or(TEXT_LEVELS[0].text)
}
