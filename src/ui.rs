pub mod charting;
pub mod menu;
pub mod panels;
pub mod results;

use std::time::Instant;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, View};
use crate::config::Theme;
use crate::levels::TEXT_LEVELS;
use crate::metrics;
use crate::session::SessionSource;
use crate::tracker::{PositionState, Tracker};

pub(crate) const HORIZONTAL_MARGIN: u16 = 5;
pub(crate) const VERTICAL_MARGIN: u16 = 2;
const TOAST_WIDTH: u16 = 44;

/// Colors for one theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub text: Color,
    pub accent: Color,
    pub correct: Color,
    pub incorrect: Color,
    pub corrected: Color,
    pub highlight: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                text: Color::White,
                accent: Color::Cyan,
                correct: Color::Green,
                incorrect: Color::Red,
                corrected: Color::Rgb(255, 165, 0),
                highlight: Color::Magenta,
            },
            Theme::Light => Self {
                text: Color::Black,
                accent: Color::Blue,
                correct: Color::Green,
                incorrect: Color::Red,
                corrected: Color::Rgb(204, 102, 0),
                highlight: Color::Magenta,
            },
        }
    }

    pub fn bold(&self) -> Style {
        Style::default().fg(self.text).add_modifier(Modifier::BOLD)
    }

    pub fn dim(&self) -> Style {
        self.bold().add_modifier(Modifier::DIM)
    }

    pub fn accent(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn italic(&self) -> Style {
        Style::default().fg(self.text).add_modifier(Modifier::ITALIC)
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let palette = Palette::for_theme(self.settings.theme);

        match self.view {
            View::Menu => menu::render(self, &palette, area, buf),
            View::Typing => render_typing(self, &palette, area, buf),
            View::Results => results::render(self, &palette, area, buf),
            View::Profile => panels::render_profile(self, &palette, area, buf),
            View::Leaderboard => panels::render_leaderboard(self, &palette, area, buf),
            View::WorldStats => panels::render_world(self, &palette, area, buf),
            View::Tutorial => panels::render_tutorial(&palette, area, buf),
        }

        render_toasts(self, &palette, area, buf);
        if self.show_about {
            render_about(&palette, area, buf);
        }
    }
}

fn session_title(source: &SessionSource) -> String {
    match source {
        SessionSource::CatalogLevel(idx) => TEXT_LEVELS
            .get(*idx)
            .map(|l| format!("{} · {}", l.name, l.difficulty))
            .unwrap_or_default(),
        SessionSource::Challenge { difficulty, .. } => format!("Pro Challenge · {difficulty}"),
        SessionSource::Custom { .. } => "Custom Text".to_string(),
    }
}

fn render_typing(app: &App, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let Some(session) = app.session.as_ref() else {
        if app.challenge.is_some() {
            Paragraph::new(Span::styled(
                "Generating challenge...",
                palette.accent().add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .render(centered_line(area), buf);
        }
        return;
    };
    let tracker = &session.tracker;

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_width = tracker.prompt().width();
    let prompt_occupied_lines = if prompt_width <= max_chars_per_line as usize {
        1
    } else {
        ((prompt_width as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16
    };
    let padding = (area.height.saturating_sub(prompt_occupied_lines + 4)) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(padding),
            Constraint::Length(1), // title
            Constraint::Length(2), // timer
            Constraint::Length(prompt_occupied_lines),
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(session_title(&session.source), palette.accent()))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let now = Instant::now();
    let remaining = tracker.seconds_remaining(now);
    let timer = if tracker.has_started() {
        let live = metrics::compute(&tracker.snapshot(now));
        format!("{remaining:.1}   {} wpm   {}%", live.wpm, live.accuracy)
    } else {
        format!("{remaining:.0}s · start typing")
    };
    Paragraph::new(Span::styled(timer, palette.dim()))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    Paragraph::new(Line::from(prompt_spans(tracker, palette)))
        .alignment(if prompt_occupied_lines == 1 {
            // a prompt that fits on one line reads best centered
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true })
        .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        "(enter) finish / (esc) abandon",
        palette.italic(),
    ))
    .render(chunks[5], buf);
}

fn prompt_spans(tracker: &Tracker, palette: &Palette) -> Vec<Span<'static>> {
    let bold = palette.bold();
    let mut spans = tracker
        .input()
        .iter()
        .enumerate()
        .map(|(idx, input)| {
            let expected = tracker.expected_char(idx).unwrap_or(' ').to_string();
            match tracker.position_state(idx) {
                PositionState::Incorrect => Span::styled(
                    match input.char {
                        ' ' => "·".to_owned(),
                        c => c.to_string(),
                    },
                    bold.fg(palette.incorrect),
                ),
                PositionState::Corrected => Span::styled(expected, bold.fg(palette.corrected)),
                _ => Span::styled(expected, bold.fg(palette.correct)),
            }
        })
        .collect::<Vec<Span>>();

    let cursor = tracker.cursor_pos();
    if let Some(c) = tracker.expected_char(cursor) {
        spans.push(Span::styled(
            c.to_string(),
            palette.dim().add_modifier(Modifier::UNDERLINED),
        ));
        let rest: String = tracker.prompt().chars().skip(cursor + 1).collect();
        spans.push(Span::styled(rest, palette.dim()));
    }
    spans
}

pub(crate) fn centered_line(area: Rect) -> Rect {
    Rect {
        y: area.y + area.height / 2,
        height: area.height.min(1),
        ..area
    }
}

pub(crate) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_toasts(app: &App, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let width = TOAST_WIDTH.min(area.width);
    let x = area.x + area.width - width;

    for (i, toast) in app.toasts.visible().iter().enumerate() {
        let y = area.y + (i as u16) * 3;
        if y + 3 > area.y + area.height {
            break;
        }
        let rect = Rect::new(x, y, width, 3);
        Clear.render(rect, buf);
        Paragraph::new(Span::styled(toast.message.as_str(), palette.bold()))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.highlight)),
            )
            .render(rect, buf);
    }
}

fn render_about(palette: &Palette, area: Rect, buf: &mut Buffer) {
    let rect = centered_rect(50, 9, area);
    Clear.render(rect, buf);
    let lines = vec![
        Line::from(Span::styled("typex", palette.accent())),
        Line::from(format!("version {}", env!("CARGO_PKG_VERSION"))),
        Line::from(""),
        Line::from("Timed typing drills with levels, XP"),
        Line::from("and achievements."),
        Line::from(""),
        Line::from(Span::styled("press any key to close", palette.italic())),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" About "))
        .render(rect, buf);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::app::Settings;
    use crate::difficulty::Difficulty;
    use crate::generator::LocalGenerator;
    use crate::storage::SqliteStore;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::sync::Arc;

    pub(crate) fn test_app(prompt: Option<&str>) -> App {
        let settings = Settings {
            username: "tester".into(),
            difficulty: Difficulty::Beginner,
            duration_secs: 30,
            theme: Theme::Dark,
            custom_prompt: prompt.map(str::to_string),
        };
        App::new(
            settings,
            SqliteStore::in_memory().unwrap(),
            Arc::new(LocalGenerator),
            None,
        )
    }

    pub(crate) fn render_to_string(app: &App, area: Rect) -> String {
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    pub(crate) fn press(app: &mut App, code: KeyCode) {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE), Instant::now());
    }

    #[test]
    fn test_typing_view_shows_prompt() {
        let app = test_app(Some("hello world"));
        let rendered = render_to_string(&app, Rect::new(0, 0, 80, 24));
        assert!(rendered.contains("hello world"));
        assert!(rendered.contains("Custom Text"));
        assert!(rendered.contains("start typing"));
    }

    #[test]
    fn test_typing_view_marks_errors() {
        let mut app = test_app(Some("test"));
        press(&mut app, KeyCode::Char('t'));
        press(&mut app, KeyCode::Char(' '));

        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        (&app).render(area, &mut buffer);

        let cell = buffer
            .content()
            .iter()
            .find(|c| c.symbol() == "·")
            .expect("a mistyped space is drawn as a dot");
        assert_eq!(cell.fg, Color::Red);
    }

    #[test]
    fn test_small_and_large_areas_render() {
        let long = "This is a very long prompt that should wrap across multiple lines when rendered in the terminal";
        let app = test_app(Some(long));
        for area in [
            Rect::new(0, 0, 1, 1),
            Rect::new(0, 0, 20, 5),
            Rect::new(0, 0, 40, 20),
            Rect::new(0, 0, 200, 60),
        ] {
            let mut buffer = Buffer::empty(area);
            (&app).render(area, &mut buffer);
            assert_eq!(*buffer.area(), area);
        }
    }

    #[test]
    fn test_multibyte_prompt_renders() {
        let mut app = test_app(Some("café über"));
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Char('f'));
        let rendered = render_to_string(&app, Rect::new(0, 0, 80, 24));
        assert!(rendered.contains("über"));
    }

    #[test]
    fn test_pending_challenge_shows_loading() {
        let mut app = test_app(None);
        app.start_challenge();
        if app.session.is_none() {
            let rendered = render_to_string(&app, Rect::new(0, 0, 80, 24));
            assert!(rendered.contains("Generating challenge"));
        }
    }

    #[test]
    fn test_toast_overlay() {
        let mut app = test_app(None);
        app.toasts.push("Level Up! Reached Level 2", Instant::now());
        let rendered = render_to_string(&app, Rect::new(0, 0, 80, 24));
        assert!(rendered.contains("Level Up! Reached Level 2"));
    }

    #[test]
    fn test_about_overlay() {
        let mut app = test_app(None);
        press(&mut app, KeyCode::Char('a'));
        let rendered = render_to_string(&app, Rect::new(0, 0, 80, 24));
        assert!(rendered.contains("About"));
        assert!(rendered.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_centered_rect_clamps() {
        let area = Rect::new(0, 0, 10, 4);
        let rect = centered_rect(50, 9, area);
        assert_eq!(rect, area);
    }
}
