use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use super::{Palette, HORIZONTAL_MARGIN, VERTICAL_MARGIN};
use crate::app::{App, MenuEntry};
use crate::difficulty::Mode;
use crate::levels::TEXT_LEVELS;

fn entry_label(app: &App, entry: &MenuEntry) -> String {
    match entry {
        MenuEntry::Level(idx) => match TEXT_LEVELS.get(*idx) {
            Some(level) => {
                let pro = if level.mode == Mode::Pro { "  [PRO]" } else { "" };
                format!("{:<22}{}{}", level.name, level.difficulty, pro)
            }
            None => String::new(),
        },
        MenuEntry::Challenge => format!(
            "{:<22}{} · {}s  [PRO]",
            "Generated Challenge", app.settings.difficulty, app.settings.duration_secs
        ),
        MenuEntry::Custom => format!("{:<22}{}s", "Custom Text", app.settings.duration_secs),
    }
}

pub fn render(app: &App, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let entries = app.menu_entries();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),                    // title
            Constraint::Length(2),                    // profile summary
            Constraint::Length(entries.len() as u16), // level selector
            Constraint::Length(1),                    // padding
            Constraint::Length(1),                    // settings
            Constraint::Min(0),
            Constraint::Length(2), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled("T Y P E X", palette.accent()))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let profile = &app.profile;
    Paragraph::new(Span::styled(
        format!(
            "{} · Level {} · {}/{} XP · {} tests",
            profile.username,
            profile.level,
            profile.xp,
            profile.xp_to_next_level,
            profile.tests_completed
        ),
        palette.bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let lines = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let label = entry_label(app, entry);
            if i == app.menu_index {
                Line::from(Span::styled(
                    format!("> {label}"),
                    palette.accent().add_modifier(Modifier::REVERSED),
                ))
            } else {
                Line::from(Span::styled(format!("  {label}"), palette.bold()))
            }
        })
        .collect::<Vec<Line>>();
    Paragraph::new(lines).render(chunks[2], buf);

    Paragraph::new(Span::styled(
        format!(
            "Difficulty: {} | Duration: {}s | Theme: {:?}",
            app.settings.difficulty, app.settings.duration_secs, app.settings.theme
        ),
        palette.italic(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[4], buf);

    Paragraph::new(Span::styled(
        "(enter) start / (d)ifficulty / (s) duration / (t)heme / (p)rofile / (l)eaderboard / (g)lobal / (h)elp / (a)bout / (x) dismiss / (q)uit",
        palette.italic(),
    ))
    .wrap(Wrap { trim: true })
    .render(chunks[6], buf);
}
