//! Challenge passages and coaching feedback.
//!
//! Generation is best effort. Callers go through [`spawn_challenge`] and
//! [`spawn_feedback`], which run the generator off the UI thread and always
//! produce text: a failed or empty generation is replaced by a fixed
//! fallback.

use crate::difficulty::Difficulty;
use crate::error::GenerationError;
use crate::levels::fallback_passage;
use crate::metrics::GameStats;
use crate::runtime::Waker;
use crate::session::clamp_duration_secs;
use cgisf_lib::cgisf;
use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use tracing::warn;

static WORDS_DIR: Dir = include_dir!("src/words");

/// Typing pace the challenge length is sized for.
pub const PLANNED_WPM: f64 = 40.0;

pub const FALLBACK_FEEDBACK: &str = "Comms link with the coach disrupted. Analysis failed. \
Your core stats are solid, operator. Keep practicing and push through the static.";

pub fn target_word_count(duration_secs: u64) -> usize {
    let duration_secs = clamp_duration_secs(duration_secs);
    ((duration_secs as f64 / 60.0) * PLANNED_WPM).round().max(1.0) as usize
}

/// Flattens generated text to a single line with single spaces.
pub fn clean_text(text: &str) -> String {
    text.replace("\\n", " ").split_whitespace().join(" ")
}

pub trait TextGenerator: Send + Sync {
    /// A single paragraph sized for `duration_secs` of typing.
    fn challenge(&self, difficulty: Difficulty, duration_secs: u64)
        -> Result<String, GenerationError>;

    /// A short coaching message about a finished session.
    fn feedback(&self, stats: &GameStats) -> Result<String, GenerationError>;
}

#[derive(Deserialize, Clone, Debug)]
pub struct WordBank {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl WordBank {
    pub fn load(difficulty: Difficulty) -> Result<Self, GenerationError> {
        let file_name = format!("{}.json", difficulty.to_string().to_lowercase());
        let file = WORDS_DIR
            .get_file(&file_name)
            .ok_or_else(|| GenerationError::Unavailable(format!("missing word bank {file_name}")))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| GenerationError::Unavailable(format!("{file_name} is not utf-8")))?;
        serde_json::from_str(contents)
            .map_err(|e| GenerationError::Unavailable(format!("{file_name}: {e}")))
    }

    fn pick<R: Rng>(&self, rng: &mut R) -> Option<&str> {
        self.words.choose(rng).map(String::as_str)
    }
}

/// Offline generator backed by the embedded word banks.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalGenerator;

impl LocalGenerator {
    fn sentence_end(difficulty: Difficulty, rng: &mut impl Rng) -> &'static str {
        match difficulty {
            Difficulty::Beginner => ".",
            Difficulty::Intermediate => *[".", ".", "?", "!"].choose(rng).unwrap_or(&"."),
            Difficulty::Advanced => *[".", ";", ":", "."].choose(rng).unwrap_or(&"."),
            Difficulty::Expert => "",
        }
    }

    /// Words of one generated English sentence, when it fits in `room`.
    fn generated_sentence(room: usize, rng: &mut impl Rng) -> Option<Vec<String>> {
        let sentence = cgisf(
            rng.gen_range(1..3),
            rng.gen_range(1..3),
            rng.gen_range(1..5),
            rng.gen_bool(0.5),
            rng.gen_range(1..3),
            rng.gen_bool(0.5),
        );
        let words: Vec<String> = sentence
            .split_whitespace()
            .map(|w| w.trim_end_matches('.').to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        (!words.is_empty() && words.len() <= room).then_some(words)
    }

    fn compose(bank: &WordBank, difficulty: Difficulty, word_count: usize) -> String {
        let mut rng = rand::thread_rng();
        let mut sentences: Vec<Vec<String>> = Vec::new();
        let mut total = 0;

        while total < word_count {
            let room = word_count - total;
            let sentence = if difficulty == Difficulty::Intermediate && rng.gen_bool(0.5) {
                Self::generated_sentence(room, &mut rng)
            } else {
                None
            };
            let sentence = sentence.unwrap_or_else(|| {
                let len = rng.gen_range(4..10).min(room);
                (0..len)
                    .filter_map(|_| bank.pick(&mut rng).map(str::to_string))
                    .collect()
            });
            if sentence.is_empty() {
                break;
            }
            total += sentence.len();
            sentences.push(sentence);
        }

        sentences
            .into_iter()
            .map(|mut words| {
                if difficulty != Difficulty::Expert {
                    if let Some(first) = words.first_mut() {
                        *first = capitalize(first);
                    }
                    if difficulty != Difficulty::Beginner && words.len() > 5 {
                        let mid = words.len() / 2;
                        words[mid].push(',');
                    }
                }
                let end = Self::sentence_end(difficulty, &mut rng);
                format!("{}{}", words.join(" "), end)
            })
            .join(" ")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl TextGenerator for LocalGenerator {
    fn challenge(
        &self,
        difficulty: Difficulty,
        duration_secs: u64,
    ) -> Result<String, GenerationError> {
        let bank = WordBank::load(difficulty)?;
        if bank.words.is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(Self::compose(&bank, difficulty, target_word_count(duration_secs)))
    }

    fn feedback(&self, stats: &GameStats) -> Result<String, GenerationError> {
        Ok(coach(stats))
    }
}

pub const FAST_WPM: u32 = 60;
pub const PRECISE_ACCURACY: u32 = 95;

/// Rule-based coaching keyed on speed and precision.
pub fn coach(stats: &GameStats) -> String {
    let GameStats {
        wpm,
        accuracy,
        errors,
        ..
    } = *stats;
    let fast = wpm >= FAST_WPM;
    let precise = accuracy >= PRECISE_ACCURACY;

    match (fast, precise) {
        (true, false) => format!(
            "Raw speed detected: {wpm} WPM. But {accuracy}% accuracy and {errors} errors mean the \
             signal is leaking. Ease off the throttle by ten percent and let every keystroke land \
             clean; speed built on precision is speed that lasts."
        ),
        (false, true) => format!(
            "Precision locked at {accuracy}% with only {errors} errors. Now push the clock: {wpm} \
             WPM has room to climb. Run short finger drills on common word pairs and type to a \
             steady rhythm instead of bursts."
        ),
        (false, false) => format!(
            "Baseline recorded: {wpm} WPM at {accuracy}% accuracy, {errors} errors. Rebuild from \
             the home row: keep your fingers anchored, eyes on the screen, and favor accuracy \
             before speed. Consistent daily sessions will recalibrate your reflexes."
        ),
        (true, true) => format!(
            "Elite run, operator: {wpm} WPM at {accuracy}% accuracy with {errors} errors. Next \
             upgrade: read one word ahead of your fingers so the next keystroke is already \
             queued while the current one lands."
        ),
    }
}

/// Text being produced on a background thread.
#[derive(Debug)]
pub struct PendingText {
    rx: Receiver<String>,
    fallback: String,
}

impl PendingText {
    /// Non-blocking poll. A generator thread that died yields the fallback.
    pub fn try_take(&self) -> Option<String> {
        match self.rx.try_recv() {
            Ok(text) => Some(text),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                warn!(error = %GenerationError::Disconnected, "using fallback text");
                Some(self.fallback.clone())
            }
        }
    }

    /// Blocks up to `timeout`, falling back when nothing arrives in time.
    #[cfg(test)]
    fn wait(self, timeout: std::time::Duration) -> String {
        use std::sync::mpsc::RecvTimeoutError;

        match self.rx.recv_timeout(timeout) {
            Ok(text) => text,
            Err(RecvTimeoutError::Timeout) => {
                warn!("text generation timed out, using fallback text");
                self.fallback
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!(error = %GenerationError::Disconnected, "using fallback text");
                self.fallback
            }
        }
    }
}

fn spawn_with_fallback<F>(
    fallback: String,
    what: &'static str,
    waker: Option<Waker>,
    produce: F,
) -> PendingText
where
    F: FnOnce() -> Result<String, GenerationError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let thread_fallback = fallback.clone();

    thread::spawn(move || {
        let text = produce()
            .map(|text| clean_text(&text))
            .and_then(|text| {
                if text.is_empty() {
                    Err(GenerationError::Empty)
                } else {
                    Ok(text)
                }
            })
            .unwrap_or_else(|e| {
                warn!(error = %e, what, "generation failed, using fallback");
                thread_fallback
            });
        if tx.send(text).is_ok() {
            if let Some(waker) = waker {
                waker.wake();
            }
        }
    });

    PendingText { rx, fallback }
}

pub fn spawn_challenge(
    generator: Arc<dyn TextGenerator>,
    difficulty: Difficulty,
    duration_secs: u64,
    waker: Option<Waker>,
) -> PendingText {
    spawn_with_fallback(
        fallback_passage(difficulty).to_string(),
        "challenge",
        waker,
        move || generator.challenge(difficulty, duration_secs),
    )
}

pub fn spawn_feedback(
    generator: Arc<dyn TextGenerator>,
    stats: GameStats,
    waker: Option<Waker>,
) -> PendingText {
    spawn_with_fallback(FALLBACK_FEEDBACK.to_string(), "feedback", waker, move || {
        generator.feedback(&stats)
    })
}
