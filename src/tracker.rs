use crate::session::{SessionConfig, SessionPhase, SessionResult, MAX_DURATION_SECS};
use std::time::{Duration, Instant};

const DEFAULT_DURATION_SECS: f64 = 60.0;

#[derive(Clone, Debug, Copy, PartialEq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Input {
    pub char: char,
    pub outcome: Outcome,
    pub timestamp: Instant,
}

/// A single keystroke event fed into the tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
    /// User asked to finish before reaching the end of the text.
    Complete,
}

/// Display state of one position of the target text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionState {
    Untyped,
    Correct,
    /// Correct now, but mistyped at least once before.
    Corrected,
    Incorrect,
}

/// Tracks keystrokes against a target text for one timed session.
#[derive(Debug)]
pub struct Tracker {
    prompt: String,
    expected: Vec<char>,
    input: Vec<Input>,
    ever_wrong: Vec<bool>,
    duration: Duration,
    phase: SessionPhase,
    started_at: Option<Instant>,
    ended_at: Option<Instant>,
    characters_typed: u32,
    error_count: u32,
}

impl Tracker {
    pub fn new(config: SessionConfig) -> Self {
        let prompt = if config.text.is_empty() {
            " ".to_string()
        } else {
            config.text
        };
        let duration_secs = if config.duration_secs.is_finite() && config.duration_secs > 0.0 {
            config.duration_secs.min(MAX_DURATION_SECS as f64)
        } else {
            DEFAULT_DURATION_SECS
        };
        let expected: Vec<char> = prompt.chars().collect();

        Self {
            ever_wrong: vec![false; expected.len()],
            prompt,
            expected,
            input: vec![],
            duration: Duration::from_secs_f64(duration_secs),
            phase: SessionPhase::Idle,
            started_at: None,
            ended_at: None,
            characters_typed: 0,
            error_count: 0,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn input(&self) -> &[Input] {
        &self.input
    }

    pub fn cursor_pos(&self) -> usize {
        self.input.len()
    }

    pub fn len(&self) -> usize {
        self.expected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expected.is_empty()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn expected_char(&self, idx: usize) -> Option<char> {
        self.expected.get(idx).copied()
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn has_finished(&self) -> bool {
        !matches!(self.phase, SessionPhase::Idle | SessionPhase::Running)
    }

    /// When the session will time out, once it has started.
    pub fn deadline(&self) -> Option<Instant> {
        self.started_at.and_then(|start| start.checked_add(self.duration))
    }

    pub fn position_state(&self, idx: usize) -> PositionState {
        match self.input.get(idx) {
            None => PositionState::Untyped,
            Some(i) if i.outcome == Outcome::Incorrect => PositionState::Incorrect,
            Some(_) if self.ever_wrong[idx] => PositionState::Corrected,
            Some(_) => PositionState::Correct,
        }
    }

    pub fn was_ever_wrong(&self, idx: usize) -> bool {
        self.ever_wrong.get(idx).copied().unwrap_or(false)
    }

    pub fn apply(&mut self, key: KeyInput, at: Instant) -> bool {
        match key {
            KeyInput::Char(c) => self.write_at(c, at),
            KeyInput::Backspace => self.backspace_at(at),
            KeyInput::Complete => self.complete_at(at),
        }
    }

    pub fn write(&mut self, c: char) -> bool {
        self.write_at(c, Instant::now())
    }

    pub fn write_at(&mut self, c: char, at: Instant) -> bool {
        match self.phase {
            SessionPhase::Idle => self.start(at),
            SessionPhase::Running => {
                if self.past_deadline(at) {
                    self.time_out();
                    return false;
                }
            }
            _ => return false,
        }

        let idx = self.input.len();
        let Some(expected) = self.expected_char(idx) else {
            return false;
        };

        let outcome = if c == expected {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        };

        self.characters_typed += 1;
        if outcome == Outcome::Incorrect {
            self.error_count += 1;
            self.ever_wrong[idx] = true;
        }

        self.input.push(Input {
            char: c,
            outcome,
            timestamp: at,
        });

        if self.input.len() == self.expected.len() {
            self.end(SessionPhase::Completed, at);
        }
        true
    }

    pub fn backspace(&mut self) -> bool {
        self.backspace_at(Instant::now())
    }

    pub fn backspace_at(&mut self, at: Instant) -> bool {
        if self.phase != SessionPhase::Running {
            return false;
        }
        if self.past_deadline(at) {
            self.time_out();
            return false;
        }
        self.input.pop().is_some()
    }

    /// Ends a running session early. Ignored before the first keystroke.
    pub fn complete_at(&mut self, at: Instant) -> bool {
        if self.phase != SessionPhase::Running {
            return false;
        }
        if self.past_deadline(at) {
            self.time_out();
        } else {
            self.end(SessionPhase::Completed, at);
        }
        true
    }

    /// Ends a running session at its deadline.
    fn time_out(&mut self) -> bool {
        if self.phase != SessionPhase::Running {
            return false;
        }
        let Some(deadline) = self.deadline() else {
            return false;
        };
        self.end(SessionPhase::TimedOut, deadline);
        true
    }

    /// Checks the deadline against `now`, for callers driving the clock by ticks.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        self.phase == SessionPhase::Running && self.past_deadline(now) && self.time_out()
    }

    pub fn seconds_remaining(&self, now: Instant) -> f64 {
        (self.duration.as_secs_f64() - self.elapsed_seconds(now)).max(0.0)
    }

    /// Seconds spent so far, capped at the configured duration.
    pub fn elapsed_seconds(&self, now: Instant) -> f64 {
        let Some(start) = self.started_at else {
            return 0.0;
        };
        let end = self.ended_at.unwrap_or(now);
        end.saturating_duration_since(start)
            .min(self.duration)
            .as_secs_f64()
    }

    pub fn correct_characters(&self) -> u32 {
        self.input
            .iter()
            .filter(|i| i.outcome == Outcome::Correct)
            .count() as u32
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn characters_typed(&self) -> u32 {
        self.characters_typed
    }

    /// Snapshot of the running tally, usable for live metrics.
    pub fn snapshot(&self, now: Instant) -> SessionResult {
        SessionResult {
            characters_typed: self.characters_typed,
            correct_characters: self.correct_characters(),
            elapsed_seconds: self.elapsed_seconds(now),
            error_count: self.error_count,
        }
    }

    /// Hands out the final result exactly once and moves the session to `Scored`.
    pub fn take_result(&mut self) -> Option<SessionResult> {
        if !self.phase.has_ended() {
            return None;
        }
        let end = self.ended_at?;
        let result = self.snapshot(end);
        self.transition(SessionPhase::Scored);
        Some(result)
    }

    /// Returns a scored session to `Idle` with the same text, ready for a retry.
    pub fn reset(&mut self) -> bool {
        if self.phase != SessionPhase::Scored {
            return false;
        }
        self.input.clear();
        self.ever_wrong.iter_mut().for_each(|w| *w = false);
        self.started_at = None;
        self.ended_at = None;
        self.characters_typed = 0;
        self.error_count = 0;
        self.transition(SessionPhase::Idle);
        true
    }

    fn start(&mut self, at: Instant) {
        self.started_at = Some(at);
        self.transition(SessionPhase::Running);
    }

    fn end(&mut self, phase: SessionPhase, at: Instant) {
        self.ended_at = Some(at);
        self.transition(phase);
    }

    fn past_deadline(&self, at: Instant) -> bool {
        self.deadline().is_some_and(|deadline| at >= deadline)
    }

    fn transition(&mut self, next: SessionPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal session transition {} -> {}",
            self.phase,
            next
        );
        self.phase = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(text: &str, secs: f64) -> Tracker {
        Tracker::new(SessionConfig {
            text: text.to_string(),
            duration_secs: secs,
        })
    }

    fn ms(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    #[test]
    fn test_tracker_new() {
        let tracker = tracker("hello world", 30.0);

        assert_eq!(tracker.prompt(), "hello world");
        assert_eq!(tracker.len(), 11);
        assert_eq!(tracker.phase(), SessionPhase::Idle);
        assert_eq!(tracker.cursor_pos(), 0);
        assert!(!tracker.has_started());
        assert!(!tracker.has_finished());
        assert!(tracker.deadline().is_none());
    }

    #[test]
    fn test_empty_text_and_bad_duration_are_defaulted() {
        let tracker = tracker("", -5.0);
        assert_eq!(tracker.prompt(), " ");
        assert_eq!(tracker.duration(), Duration::from_secs(60));
    }

    #[test]
    fn test_huge_duration_is_capped() {
        let mut tracker = tracker("abc", u64::MAX as f64);
        assert_eq!(tracker.duration(), Duration::from_secs(3600));

        let now = Instant::now();
        tracker.write_at('a', now);
        assert_eq!(tracker.deadline(), Some(now + Duration::from_secs(3600)));
        assert!(!tracker.on_tick(now + Duration::from_secs(60)));
    }

    #[test]
    fn test_first_keystroke_starts_session() {
        let t0 = Instant::now();
        let mut tracker = tracker("test", 30.0);

        assert!(tracker.write_at('t', t0));
        assert_eq!(tracker.phase(), SessionPhase::Running);
        assert_eq!(tracker.deadline(), Some(t0 + Duration::from_secs(30)));
    }

    #[test]
    fn test_write_incorrect_char_marks_position() {
        let t0 = Instant::now();
        let mut tracker = tracker("test", 30.0);

        tracker.write_at('x', t0);

        assert_eq!(tracker.input()[0].outcome, Outcome::Incorrect);
        assert_eq!(tracker.position_state(0), PositionState::Incorrect);
        assert!(tracker.was_ever_wrong(0));
        assert_eq!(tracker.error_count(), 1);
    }

    #[test]
    fn test_corrected_position_keeps_history() {
        let t0 = Instant::now();
        let mut tracker = tracker("test", 30.0);

        tracker.write_at('x', t0);
        tracker.backspace_at(ms(t0, 100));
        assert_eq!(tracker.position_state(0), PositionState::Untyped);
        tracker.write_at('t', ms(t0, 200));

        assert_eq!(tracker.position_state(0), PositionState::Corrected);
        assert_eq!(tracker.error_count(), 1);
        assert_eq!(tracker.characters_typed(), 2);
        assert_eq!(tracker.correct_characters(), 1);
    }

    #[test]
    fn test_backspace_before_start_is_ignored() {
        let mut tracker = tracker("test", 30.0);
        assert!(!tracker.backspace());
        assert_eq!(tracker.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_completing_text_ends_session() {
        let t0 = Instant::now();
        let mut tracker = tracker("hi", 30.0);

        tracker.write_at('h', t0);
        assert!(!tracker.has_finished());
        tracker.write_at('i', ms(t0, 1500));

        assert_eq!(tracker.phase(), SessionPhase::Completed);
        assert_eq!(tracker.elapsed_seconds(ms(t0, 9000)), 1.5);
    }

    #[test]
    fn test_input_after_end_is_ignored() {
        let t0 = Instant::now();
        let mut tracker = tracker("hi", 30.0);
        tracker.write_at('h', t0);
        tracker.write_at('i', ms(t0, 100));

        assert!(!tracker.write_at('!', ms(t0, 200)));
        assert!(!tracker.backspace_at(ms(t0, 300)));
        assert_eq!(tracker.characters_typed(), 2);
    }

    #[test]
    fn test_timeout_is_hard_cutoff() {
        let t0 = Instant::now();
        let mut tracker = tracker("hello", 1.0);

        tracker.write_at('h', t0);
        assert!(!tracker.write_at('e', ms(t0, 1200)));

        assert_eq!(tracker.phase(), SessionPhase::TimedOut);
        assert_eq!(tracker.characters_typed(), 1);
        assert_eq!(tracker.elapsed_seconds(ms(t0, 5000)), 1.0);
    }

    #[test]
    fn test_on_tick_times_out_at_deadline() {
        let t0 = Instant::now();
        let mut tracker = tracker("hello", 2.0);
        tracker.write_at('h', t0);

        assert!(!tracker.on_tick(ms(t0, 1900)));
        assert_eq!(tracker.seconds_remaining(ms(t0, 1500)), 0.5);
        assert!(tracker.on_tick(ms(t0, 2000)));
        assert_eq!(tracker.phase(), SessionPhase::TimedOut);
    }

    #[test]
    fn test_complete_ends_early() {
        let t0 = Instant::now();
        let mut tracker = tracker("hello", 60.0);
        tracker.apply(KeyInput::Char('h'), t0);
        tracker.apply(KeyInput::Char('e'), ms(t0, 500));

        assert!(tracker.apply(KeyInput::Complete, ms(t0, 3000)));
        assert_eq!(tracker.phase(), SessionPhase::Completed);
        assert_eq!(tracker.elapsed_seconds(ms(t0, 9000)), 3.0);
    }

    #[test]
    fn test_complete_before_start_is_ignored() {
        let mut tracker = tracker("hello", 60.0);
        assert!(!tracker.apply(KeyInput::Complete, Instant::now()));
        assert_eq!(tracker.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_take_result_once() {
        let t0 = Instant::now();
        let mut tracker = tracker("ab", 60.0);
        tracker.write_at('x', t0);
        tracker.backspace_at(ms(t0, 100));
        tracker.write_at('a', ms(t0, 200));
        tracker.write_at('b', ms(t0, 6000));

        let result = tracker.take_result().unwrap();
        assert_eq!(
            result,
            SessionResult {
                characters_typed: 3,
                correct_characters: 2,
                elapsed_seconds: 6.0,
                error_count: 1,
            }
        );
        assert_eq!(tracker.phase(), SessionPhase::Scored);
        assert!(tracker.take_result().is_none());
    }

    #[test]
    fn test_take_result_requires_end() {
        let mut tracker = tracker("ab", 60.0);
        assert!(tracker.take_result().is_none());
        tracker.write('a');
        assert!(tracker.take_result().is_none());
    }

    #[test]
    fn test_reset_only_after_scoring() {
        let t0 = Instant::now();
        let mut tracker = tracker("a", 60.0);
        assert!(!tracker.reset());

        tracker.write_at('a', t0);
        assert!(!tracker.reset());
        tracker.take_result();
        assert!(tracker.reset());

        assert_eq!(tracker.phase(), SessionPhase::Idle);
        assert_eq!(tracker.cursor_pos(), 0);
        assert!(!tracker.was_ever_wrong(0));
    }
}
