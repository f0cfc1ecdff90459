use crate::aggregate::WorldwideStats;
use crate::config::{Config, ConfigStore, FileConfigStore, Theme};
use crate::difficulty::Difficulty;
use crate::generator::{spawn_challenge, spawn_feedback, PendingText, TextGenerator};
use crate::levels::TEXT_LEVELS;
use crate::persistence::ProgressStore;
use crate::progression::{ProgressEvent, UserProfile};
use crate::runtime::Waker;
use crate::scoring::{self, Scorecard};
use crate::session::{
    clamp_duration_secs, SessionConfig, SessionContext, SessionPhase, SessionSource,
};
use crate::storage::{SessionRecord, SqliteStore};
use crate::timer::{Scheduler, TimerId};
use crate::toast::Toasts;
use crate::tracker::{KeyInput, Tracker};
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub const CHALLENGE_DURATIONS: [u64; 4] = [15, 30, 60, 120];
const RECENT_SESSIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum View {
    Menu,
    Typing,
    Results,
    Profile,
    Leaderboard,
    WorldStats,
    Tutorial,
}

/// Effective settings after merging config file and CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub username: String,
    pub difficulty: Difficulty,
    pub duration_secs: u64,
    pub theme: Theme,
    pub custom_prompt: Option<String>,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            username: config.username.clone(),
            difficulty: config.difficulty,
            duration_secs: clamp_duration_secs(config.duration_secs),
            theme: config.theme,
            custom_prompt: None,
        }
    }

    pub fn to_config(&self) -> Config {
        Config {
            username: self.username.clone(),
            difficulty: self.difficulty,
            duration_secs: self.duration_secs,
            theme: self.theme,
        }
    }
}

/// Entries of the level selector, in display order.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuEntry {
    Level(usize),
    Challenge,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppTimer {
    SessionDeadline,
}

#[derive(Debug)]
pub struct ActiveSession {
    pub source: SessionSource,
    pub tracker: Tracker,
    deadline: Option<TimerId>,
}

#[derive(Debug)]
pub struct LastResult {
    pub source: SessionSource,
    pub context: SessionContext,
    pub scorecard: Scorecard,
    pub feedback: Option<String>,
    pending_feedback: Option<PendingText>,
}

#[derive(Debug)]
pub struct PendingChallenge {
    pub difficulty: Difficulty,
    pub duration_secs: u64,
    text: PendingText,
}

pub struct App {
    pub settings: Settings,
    pub view: View,
    pub menu_index: usize,
    pub show_about: bool,
    pub profile: UserProfile,
    pub world: WorldwideStats,
    pub session: Option<ActiveSession>,
    pub last: Option<LastResult>,
    pub challenge: Option<PendingChallenge>,
    pub toasts: Toasts,
    pub recent: Vec<SessionRecord>,
    timers: Scheduler<AppTimer>,
    store: ProgressStore<SqliteStore>,
    config_store: Option<FileConfigStore>,
    generator: Arc<dyn TextGenerator>,
    waker: Option<Waker>,
    should_quit: bool,
}

impl App {
    pub fn new(
        settings: Settings,
        store: SqliteStore,
        generator: Arc<dyn TextGenerator>,
        config_store: Option<FileConfigStore>,
    ) -> Self {
        let store = ProgressStore::new(store);
        let mut profile = store.load_profile_or_default(&settings.username);
        if profile.username != settings.username {
            profile.username = settings.username.clone();
            store.save_profile(&profile);
        }
        let world = store.load_world_or_init();
        info!(
            level = profile.level,
            tests = profile.tests_completed,
            "profile loaded"
        );

        let mut app = Self {
            settings,
            view: View::Menu,
            menu_index: 0,
            show_about: false,
            profile,
            world,
            session: None,
            last: None,
            challenge: None,
            toasts: Toasts::new(),
            recent: Vec::new(),
            timers: Scheduler::new(),
            store,
            config_store,
            generator,
            waker: None,
            should_quit: false,
        };
        app.refresh_recent();

        if let Some(text) = app.settings.custom_prompt.clone() {
            let duration_secs = app.settings.duration_secs;
            app.start_session(SessionSource::Custom {
                text,
                duration_secs,
            });
        }
        app
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Background text generation pings this once its result is ready.
    pub fn set_waker(&mut self, waker: Option<Waker>) {
        self.waker = waker;
    }

    pub fn store(&self) -> &ProgressStore<SqliteStore> {
        &self.store
    }

    pub fn menu_entries(&self) -> Vec<MenuEntry> {
        let mut entries: Vec<MenuEntry> = (0..TEXT_LEVELS.len()).map(MenuEntry::Level).collect();
        entries.push(MenuEntry::Challenge);
        if self.settings.custom_prompt.is_some() {
            entries.push(MenuEntry::Custom);
        }
        entries
    }

    fn refresh_recent(&mut self) {
        match self.store.inner().recent_sessions(RECENT_SESSIONS) {
            Ok(recent) => self.recent = recent,
            Err(e) => warn!(error = %e, "failed to read session history"),
        }
    }

    fn save_config(&self) {
        if let Some(ref config_store) = self.config_store {
            if let Err(e) = config_store.save(&self.settings.to_config()) {
                warn!(error = %e, "failed to save config");
            }
        }
    }

    pub fn start_session(&mut self, source: SessionSource) {
        let text = match &source {
            SessionSource::CatalogLevel(idx) => TEXT_LEVELS
                .get(*idx)
                .map(|l| l.text.to_string())
                .unwrap_or_default(),
            SessionSource::Custom { text, .. } => text.clone(),
            SessionSource::Challenge { .. } => {
                warn!("challenge sessions start from generated text");
                return;
            }
        };
        self.begin(source, text);
    }

    fn begin(&mut self, source: SessionSource, text: String) {
        self.abandon_session();
        let tracker = Tracker::new(SessionConfig {
            text,
            duration_secs: source.duration_secs() as f64,
        });
        self.session = Some(ActiveSession {
            source,
            tracker,
            deadline: None,
        });
        self.view = View::Typing;
    }

    /// Requests a generated pro challenge; typing starts once text arrives.
    pub fn start_challenge(&mut self) {
        self.abandon_session();
        let difficulty = self.settings.difficulty;
        let duration_secs = self.settings.duration_secs;
        self.challenge = Some(PendingChallenge {
            difficulty,
            duration_secs,
            text: spawn_challenge(
                self.generator.clone(),
                difficulty,
                duration_secs,
                self.waker.clone(),
            ),
        });
        self.view = View::Typing;
    }

    /// Drops a running session without scoring it.
    pub fn abandon_session(&mut self) {
        self.challenge = None;
        if let Some(session) = self.session.take() {
            if let Some(id) = session.deadline {
                self.timers.cancel(id);
            }
        }
    }

    pub fn retry(&mut self) {
        let Some(last) = self.last.as_ref() else {
            return;
        };
        let source = last.source.clone();
        match &source {
            SessionSource::Challenge { difficulty, .. } => {
                let text = self
                    .session
                    .as_ref()
                    .map(|s| s.tracker.prompt().to_string())
                    .unwrap_or_else(|| crate::levels::fallback_passage(*difficulty).to_string());
                self.begin(source, text);
            }
            _ => self.start_session(source),
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.show_about {
            self.show_about = false;
            return;
        }

        match self.view {
            View::Typing => self.on_typing_key(key, now),
            _ if key.code == KeyCode::Char('x') => self.dismiss_toast(),
            View::Menu => self.on_menu_key(key),
            View::Results => self.on_results_key(key),
            View::Profile | View::Leaderboard | View::WorldStats | View::Tutorial => {
                if matches!(
                    key.code,
                    KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') | KeyCode::Char('q')
                ) {
                    self.view = View::Menu;
                }
            }
        }
    }

    /// Clears the oldest toast ahead of its timeout.
    fn dismiss_toast(&mut self) {
        if let Some(id) = self.toasts.visible().first().map(|t| t.id) {
            self.toasts.dismiss(id);
        }
    }

    fn on_menu_key(&mut self, key: KeyEvent) {
        let entries = self.menu_entries();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.menu_index = self.menu_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.menu_index + 1 < entries.len() {
                    self.menu_index += 1;
                }
            }
            KeyCode::Enter => match entries.get(self.menu_index) {
                Some(MenuEntry::Level(idx)) => self.start_session(SessionSource::CatalogLevel(*idx)),
                Some(MenuEntry::Challenge) => self.start_challenge(),
                Some(MenuEntry::Custom) => {
                    if let Some(text) = self.settings.custom_prompt.clone() {
                        let duration_secs = self.settings.duration_secs;
                        self.start_session(SessionSource::Custom {
                            text,
                            duration_secs,
                        });
                    }
                }
                None => {}
            },
            KeyCode::Char('d') => {
                self.settings.difficulty = self.settings.difficulty.next();
                self.save_config();
            }
            KeyCode::Char('s') => {
                let pos = CHALLENGE_DURATIONS
                    .iter()
                    .position(|&d| d == self.settings.duration_secs)
                    .map(|p| (p + 1) % CHALLENGE_DURATIONS.len())
                    .unwrap_or(0);
                self.settings.duration_secs = CHALLENGE_DURATIONS[pos];
                self.save_config();
            }
            KeyCode::Char('t') => {
                self.settings.theme = self.settings.theme.toggled();
                self.save_config();
            }
            KeyCode::Char('p') => self.view = View::Profile,
            KeyCode::Char('l') => self.view = View::Leaderboard,
            KeyCode::Char('g') => self.view = View::WorldStats,
            KeyCode::Char('h') | KeyCode::Char('?') => self.view = View::Tutorial,
            KeyCode::Char('a') => self.show_about = true,
            _ => {}
        }
    }

    fn on_typing_key(&mut self, key: KeyEvent, now: Instant) {
        if key.code == KeyCode::Esc {
            self.abandon_session();
            self.view = View::Menu;
            return;
        }

        let input = match key.code {
            KeyCode::Char(c) => KeyInput::Char(c),
            KeyCode::Backspace => KeyInput::Backspace,
            KeyCode::Enter => KeyInput::Complete,
            _ => return,
        };

        let Some(session) = self.session.as_mut() else {
            return;
        };
        let was_idle = session.tracker.phase() == SessionPhase::Idle;
        session.tracker.apply(input, now);

        if was_idle && session.tracker.phase() == SessionPhase::Running {
            if let Some(deadline) = session.tracker.deadline() {
                session.deadline = Some(self.timers.schedule(deadline, AppTimer::SessionDeadline));
            }
        }

        if session.tracker.has_finished() {
            self.finish_session(now);
        }
    }

    fn on_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') => self.retry(),
            KeyCode::Char('n') | KeyCode::Enter | KeyCode::Esc => self.view = View::Menu,
            KeyCode::Char('p') => self.view = View::Profile,
            KeyCode::Char('s') => self.share(),
            _ => {}
        }
    }

    fn share(&self) {
        let Some(last) = self.last.as_ref() else {
            return;
        };
        if webbrowser::Browser::is_available() {
            let stats = &last.scorecard.stats;
            let url = format!(
                "https://twitter.com/intent/tweet?text={}%20wpm%20%2F%20{}%25%20acc%20%2F%20level%20{}%20on%20typex",
                stats.wpm, stats.accuracy, self.profile.level
            );
            if let Err(e) = webbrowser::open(&url) {
                warn!(error = %e, "failed to open browser");
            }
        }
    }

    pub fn on_tick(&mut self, now: Instant) {
        for timer in self.timers.poll(now) {
            match timer {
                AppTimer::SessionDeadline => {
                    if let Some(session) = self.session.as_mut() {
                        session.deadline = None;
                        if session.tracker.on_tick(now) {
                            self.finish_session(now);
                        }
                    }
                }
            }
        }

        let arrived = self.challenge.as_ref().and_then(|c| c.text.try_take());
        if let Some(text) = arrived {
            if let Some(challenge) = self.challenge.take() {
                let source = SessionSource::Challenge {
                    difficulty: challenge.difficulty,
                    duration_secs: challenge.duration_secs,
                };
                self.begin(source, text);
            }
        }

        if let Some(last) = self.last.as_mut() {
            let arrived = last.pending_feedback.as_ref().and_then(|p| p.try_take());
            if let Some(text) = arrived {
                last.feedback = Some(text);
                last.pending_feedback = None;
            }
        }

        self.toasts.tick(now);
    }

    /// Scores the ended session exactly once and persists the outcome.
    fn finish_session(&mut self, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(id) = session.deadline.take() {
            self.timers.cancel(id);
        }
        let Some(result) = session.tracker.take_result() else {
            return;
        };
        let source = session.source.clone();
        let context = source.context();

        let card = scoring::score(result, context, &self.profile, &self.world);
        info!(
            wpm = card.stats.wpm,
            accuracy = card.stats.accuracy,
            errors = card.stats.errors,
            xp = card.earned_xp,
            "session scored"
        );

        self.profile = card.profile.clone();
        self.world = card.world;
        self.store.save_profile(&self.profile);
        self.store.save_world(&self.world);

        let record = SessionRecord {
            finished_at: Local::now(),
            wpm: card.stats.wpm,
            accuracy: card.stats.accuracy,
            errors: card.stats.errors,
            elapsed_secs: card.stats.time,
            difficulty: context.difficulty,
            mode: context.mode,
            earned_xp: card.earned_xp,
        };
        if let Err(e) = self.store.inner().record_session(&record) {
            warn!(error = %e, "failed to record session history");
        }
        self.refresh_recent();

        for event in &card.events {
            if matches!(
                event,
                ProgressEvent::LevelUp { .. } | ProgressEvent::AchievementUnlocked(_)
            ) {
                self.toasts.push(event.message(), now);
            }
        }

        let pending_feedback = Some(spawn_feedback(
            self.generator.clone(),
            card.stats,
            self.waker.clone(),
        ));
        self.last = Some(LastResult {
            source,
            context,
            scorecard: card,
            feedback: None,
            pending_feedback,
        });
        self.view = View::Results;
    }
}
