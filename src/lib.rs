// Library surface shared by the binary and the integration tests.
pub mod achievements;
pub mod aggregate;
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod generator;
pub mod leaderboard;
pub mod levels;
pub mod logging;
pub mod metrics;
pub mod persistence;
pub mod progression;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod storage;
pub mod timer;
pub mod toast;
pub mod tracker;
pub mod ui;

pub use app::{App, Settings, View};
pub use difficulty::{Difficulty, Mode};
