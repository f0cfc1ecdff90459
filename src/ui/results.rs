use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Axis, Chart, Dataset, Gauge, GraphType, Paragraph, Widget, Wrap},
};
use webbrowser::Browser;

use super::charting::{compute_chart_params, format_label, history_points};
use super::{Palette, HORIZONTAL_MARGIN, VERTICAL_MARGIN};
use crate::app::App;
use crate::difficulty::Mode;

pub fn render(app: &App, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let Some(last) = app.last.as_ref() else {
        return;
    };
    let stats = &last.scorecard.stats;
    let bold = palette.bold();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // history chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // xp earned
            Constraint::Length(1), // level gauge
            Constraint::Length(1), // padding
            Constraint::Length(3), // coach feedback
            Constraint::Length(1), // legend
        ])
        .split(area);

    let points = history_points(&app.recent);
    let (sessions, highest_wpm) = compute_chart_params(&points);
    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(Style::default().fg(palette.highlight))
        .graph_type(GraphType::Line)
        .data(&points)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("session")
                .bounds([1.0, sessions])
                .labels(vec![
                    Span::styled("1", bold),
                    Span::styled(format_label(sessions), bold),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold),
                    Span::styled(format_label(highest_wpm), bold),
                ]),
        )
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} wpm   {}% acc   {} errors   {}s",
            stats.wpm, stats.accuracy, stats.errors, stats.time
        ),
        bold,
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let mode = if last.context.mode == Mode::Pro {
        " · pro"
    } else {
        ""
    };
    Paragraph::new(Span::styled(
        format!(
            "+{} XP ({}{})",
            last.scorecard.earned_xp, last.context.difficulty, mode
        ),
        palette.accent(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    let profile = &app.profile;
    Gauge::default()
        .gauge_style(Style::default().fg(palette.correct))
        .ratio(profile.level_progress().clamp(0.0, 1.0))
        .label(format!(
            "Level {} · {}/{} XP",
            profile.level, profile.xp, profile.xp_to_next_level
        ))
        .render(chunks[3], buf);

    let feedback = match last.feedback.as_deref() {
        Some(text) => Span::styled(text, palette.italic()),
        None => Span::styled(
            "Analyzing performance...",
            palette.dim().add_modifier(Modifier::ITALIC),
        ),
    };
    Paragraph::new(feedback)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[5], buf);

    Paragraph::new(Span::styled(
        if Browser::is_available() {
            "(r)etry / (n)ew / (p)rofile / (s)hare / (esc)ape"
        } else {
            "(r)etry / (n)ew / (p)rofile / (esc)ape"
        },
        palette.italic(),
    ))
    .render(chunks[6], buf);
}

#[cfg(test)]
mod tests {
    use crate::ui::tests::{render_to_string, test_app};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::layout::Rect;
    use std::time::{Duration, Instant};

    #[test]
    fn test_results_show_stats_and_xp() {
        let t0 = Instant::now();
        let mut app = test_app(Some("abcde"));
        for (i, c) in "abcde".chars().enumerate() {
            app.on_key(
                KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE),
                t0 + Duration::from_secs(i as u64),
            );
        }
        // 5 correct characters over 4 seconds
        let rendered = render_to_string(&app, Rect::new(0, 0, 80, 30));
        assert!(rendered.contains("15 wpm   100% acc   0 errors   4s"));
        assert!(rendered.contains("(Intermediate)"));
        assert!(rendered.contains("(r)etry"));
    }

    #[test]
    fn test_results_without_session_render_nothing() {
        let mut app = test_app(None);
        app.view = crate::app::View::Results;
        let rendered = render_to_string(&app, Rect::new(0, 0, 80, 24));
        assert!(rendered.trim().is_empty());
    }
}
