use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    io::{self, stdin},
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{error, info, warn};
use typex::{
    aggregate::WorldwideStats,
    app::{App, Settings},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    difficulty::Difficulty,
    generator::LocalGenerator,
    leaderboard,
    logging,
    persistence::ProgressStore,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    session::clamp_duration_secs,
    storage::SqliteStore,
};

const TICK_RATE_MS: u64 = 100;

/// terminal typing trainer with xp, levels and achievements
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Timed typing drills in the terminal. Earn XP, climb levels, unlock achievements and see how you compare."
)]
pub struct Cli {
    /// seconds per generated challenge or custom test
    #[clap(short = 's', long)]
    duration: Option<u64>,

    /// difficulty used for generated challenges
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// custom text to type
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// name shown on your profile and the leaderboard
    #[clap(short = 'u', long)]
    username: Option<String>,

    /// keep all progress in memory; nothing is written to disk
    #[clap(long)]
    ephemeral: bool,

    /// print your profile and global stats, then exit
    #[clap(long)]
    summary: bool,

    /// write the session history as CSV to PATH, then exit
    #[clap(long, value_name = "PATH")]
    export_history: Option<PathBuf>,
}

impl Cli {
    /// CLI flags win over the config file.
    fn settings(&self, config: &Config) -> Settings {
        let mut settings = Settings::from_config(config);
        if let Some(duration) = self.duration {
            settings.duration_secs = clamp_duration_secs(duration);
        }
        if let Some(difficulty) = self.difficulty {
            settings.difficulty = difficulty;
        }
        if let Some(ref username) = self.username {
            settings.username = username.clone();
        }
        settings.custom_prompt = self
            .prompt
            .as_ref()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        settings
    }

    fn is_headless(&self) -> bool {
        self.summary || self.export_history.is_some()
    }
}

fn open_store(ephemeral: bool) -> Result<SqliteStore> {
    if ephemeral {
        return SqliteStore::in_memory().context("failed to open in-memory database");
    }
    let path = AppDirs::db_path().context("could not resolve the state directory")?;
    SqliteStore::open(&path).with_context(|| format!("failed to open {}", path.display()))
}

fn summary_text(store: &ProgressStore<SqliteStore>, username: &str) -> String {
    let profile = store.load_profile_or_default(username);
    let world = store.load_world().unwrap_or_else(WorldwideStats::first_run);
    let history = store.inner().session_count().unwrap_or_else(|e| {
        warn!(error = %e, "failed to count session history");
        0
    });

    format!(
        "{} · Level {} · {}/{} XP\n\
         Tests: {} (pro {}) · Achievements: {} · History: {} sessions\n\
         Rank: #{} of {}\n\
         Global: {} operators · {} tests · avg {} wpm · avg {}% acc",
        profile.username,
        profile.level,
        profile.xp,
        profile.xp_to_next_level,
        profile.tests_completed,
        profile.pro_tests_completed,
        profile.unlocked_achievements.len(),
        history,
        leaderboard::user_rank(&profile),
        leaderboard::RIVALS.len() + 1,
        world.total_users,
        world.total_tests,
        world.average_wpm,
        world.average_accuracy,
    )
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if !cli.ephemeral {
        if let Some(log_path) = AppDirs::log_path() {
            // logging is best effort, the app works without it
            if let Err(e) = logging::init(&log_path) {
                eprintln!("warning: {e:#}");
            }
        }
    }

    let config_store = FileConfigStore::new();
    let config = config_store.load();
    let settings = cli.settings(&config);
    if !cli.ephemeral && settings.username != config.username {
        // the profile follows the configured name, so a new name sticks
        let renamed = Config {
            username: settings.username.clone(),
            ..config
        };
        if let Err(e) = config_store.save(&renamed) {
            warn!(error = %e, "failed to save username");
        }
    }
    let store = open_store(cli.ephemeral)?;

    if cli.is_headless() {
        if let Some(ref path) = cli.export_history {
            let rows = store
                .export_csv(path)
                .with_context(|| format!("failed to export history to {}", path.display()))?;
            println!("exported {rows} sessions to {}", path.display());
        }
        if cli.summary {
            println!("{}", summary_text(&ProgressStore::new(store), &settings.username));
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    info!(ephemeral = cli.ephemeral, "starting");
    let config_store = (!cli.ephemeral).then_some(config_store);
    let mut app = App::new(settings, store, Arc::new(LocalGenerator), config_store);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        error!(error = %e, "terminal loop failed");
    }
    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    app.set_waker(runner.waker());

    while !app.should_quit() {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let now = Instant::now();
        match runner.step() {
            AppEvent::Key(key) => app.on_key(key, now),
            AppEvent::Resize | AppEvent::TextReady | AppEvent::Tick => {}
        }
        // keystrokes can starve the tick timeout, so timers are polled every pass
        app.on_tick(Instant::now());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use typex::config::Theme;
    use typex::storage::SessionRecord;
    use typex::Mode;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["typex"]);

        assert_eq!(cli.duration, None);
        assert_eq!(cli.difficulty, None);
        assert_eq!(cli.prompt, None);
        assert!(!cli.ephemeral);
        assert!(!cli.is_headless());
    }

    #[test]
    fn test_cli_duration_and_difficulty() {
        let cli = Cli::parse_from(["typex", "-s", "30", "--difficulty", "expert"]);
        assert_eq!(cli.duration, Some(30));
        assert_eq!(cli.difficulty, Some(Difficulty::Expert));

        let cli = Cli::parse_from(["typex", "--duration", "120", "-d", "advanced"]);
        assert_eq!(cli.duration, Some(120));
        assert_eq!(cli.difficulty, Some(Difficulty::Advanced));
    }

    #[test]
    fn test_cli_rejects_unknown_difficulty() {
        assert!(Cli::try_parse_from(["typex", "--difficulty", "legendary"]).is_err());
    }

    #[test]
    fn test_cli_headless_flags() {
        let cli = Cli::parse_from(["typex", "--summary"]);
        assert!(cli.is_headless());

        let cli = Cli::parse_from(["typex", "--export-history", "out.csv"]);
        assert_eq!(cli.export_history, Some(PathBuf::from("out.csv")));
        assert!(cli.is_headless());
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = Config {
            username: "from-config".into(),
            difficulty: Difficulty::Beginner,
            duration_secs: 60,
            theme: Theme::Light,
        };
        let cli = Cli::parse_from([
            "typex", "-u", "neo", "-s", "15", "-d", "expert", "-p", "  hello  ",
        ]);
        let settings = cli.settings(&config);

        assert_eq!(settings.username, "neo");
        assert_eq!(settings.duration_secs, 15);
        assert_eq!(settings.difficulty, Difficulty::Expert);
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.custom_prompt.as_deref(), Some("hello"));
    }

    #[test]
    fn test_cli_zero_duration_and_blank_prompt() {
        let cli = Cli::parse_from(["typex", "-s", "0", "-p", "   "]);
        let settings = cli.settings(&Config::default());
        assert_eq!(settings.duration_secs, 1);
        assert_eq!(settings.custom_prompt, None);
        assert_eq!(settings.username, "Operator-01");
    }

    #[test]
    fn test_cli_huge_duration_is_capped() {
        let cli = Cli::parse_from(["typex", "-s", "18446744073709551615"]);
        let settings = cli.settings(&Config::default());
        assert_eq!(settings.duration_secs, 3600);
    }

    #[test]
    fn test_summary_fresh_store() {
        let store = ProgressStore::new(SqliteStore::in_memory().unwrap());
        let text = summary_text(&store, "neo");

        assert!(text.starts_with("neo · Level 1 · 0/100 XP"));
        assert!(text.contains("History: 0 sessions"));
        assert!(text.contains("Global: 1 operators · 0 tests"));
        // printing a summary never writes state
        assert_eq!(store.load_world(), None);
    }

    fn record() -> SessionRecord {
        SessionRecord {
            finished_at: chrono::Local::now(),
            wpm: 50,
            accuracy: 98,
            errors: 1,
            elapsed_secs: 60,
            difficulty: Difficulty::Advanced,
            mode: Mode::Pro,
            earned_xp: 29,
        }
    }

    #[test]
    fn test_summary_counts_history() {
        let store = open_store(true).unwrap();
        store.record_session(&record()).unwrap();
        store.record_session(&record()).unwrap();

        let text = summary_text(&ProgressStore::new(store), "neo");
        assert!(text.contains("History: 2 sessions"));
    }

    #[test]
    fn test_export_history_in_memory() {
        let store = open_store(true).unwrap();
        store.record_session(&record()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        assert_eq!(store.export_csv(&path).unwrap(), 1);
        let csv = std::fs::read_to_string(&path).unwrap();
        assert!(csv.lines().next().unwrap().contains("wpm"));
    }
}
