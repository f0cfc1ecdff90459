use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, Widget, Wrap},
};

use super::{Palette, HORIZONTAL_MARGIN, VERTICAL_MARGIN};
use crate::achievements::AchievementId;
use crate::app::App;
use crate::leaderboard;

const BACK_LEGEND: &str = "(esc) back";

fn frame(title: &str, area: Rect) -> (Block<'_>, [Rect; 2]) {
    let inner = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {title} "));
    (block, [inner[0], inner[1]])
}

fn render_legend(palette: &Palette, area: Rect, buf: &mut Buffer) {
    Paragraph::new(Span::styled(BACK_LEGEND, palette.italic())).render(area, buf);
}

pub fn render_profile(app: &App, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let (block, [body, legend]) = frame("Profile", area);
    let profile = &app.profile;

    let mut lines = vec![
        Line::from(Span::styled(profile.username.as_str(), palette.accent())),
        Line::from(format!(
            "Level {}   {}/{} XP   {} tests   {} pro",
            profile.level,
            profile.xp,
            profile.xp_to_next_level,
            profile.tests_completed,
            profile.pro_tests_completed
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "Achievements {}/{}",
                profile.unlocked_achievements.len(),
                AchievementId::ALL.len()
            ),
            palette.bold(),
        )),
    ];

    for id in AchievementId::ALL {
        let unlocked = profile.has_unlocked(id);
        let style = if unlocked {
            Style::default().fg(palette.correct)
        } else {
            palette.dim()
        };
        lines.push(Line::from(vec![
            Span::styled(if unlocked { id.icon() } else { "·" }, style),
            Span::raw(" "),
            Span::styled(format!("{:<18}", id.name()), style),
            Span::styled(id.description(), palette.italic()),
        ]));
    }

    if !app.recent.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Recent sessions", palette.bold())));
        for r in &app.recent {
            lines.push(Line::from(format!(
                "{}  {:>3} wpm  {:>3}%  {:<12} +{} XP",
                r.finished_at.format("%Y-%m-%d %H:%M"),
                r.wpm,
                r.accuracy,
                r.difficulty,
                r.earned_xp
            )));
        }
    }

    block.render(area, buf);
    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .render(body, buf);
    render_legend(palette, legend, buf);
}

pub fn render_leaderboard(app: &App, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let (block, [body, legend]) = frame("Leaderboard", area);

    let rows = leaderboard::standings(&app.profile)
        .into_iter()
        .map(|entry| {
            let style = if entry.is_current_user {
                palette.accent().add_modifier(Modifier::REVERSED)
            } else {
                palette.bold()
            };
            Row::new(vec![
                format!("#{}", entry.rank),
                entry.name,
                format!("Lv {}", entry.level),
                format!("{} XP", entry.xp),
            ])
            .style(style)
        })
        .collect::<Vec<Row>>();

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Min(12),
            Constraint::Length(7),
            Constraint::Length(9),
        ],
    )
    .header(Row::new(vec!["Rank", "Operator", "Level", "XP"]).style(palette.dim()));

    block.render(area, buf);
    Widget::render(table, body, buf);
    render_legend(palette, legend, buf);
}

pub fn render_world(app: &App, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let (block, [body, legend]) = frame("Global Stats", area);
    let world = &app.world;

    let lines = vec![
        Line::from(format!("Operators      {}", world.total_users)),
        Line::from(format!("Tests taken    {}", world.total_tests)),
        Line::from(format!("Average WPM    {}", world.average_wpm)),
        Line::from(format!("Average acc.   {}%", world.average_accuracy)),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "Your rank: #{} of {}",
                leaderboard::user_rank(&app.profile),
                leaderboard::RIVALS.len() + 1
            ),
            palette.accent(),
        )),
    ];

    block.render(area, buf);
    Paragraph::new(lines).render(body, buf);
    render_legend(palette, legend, buf);
}

pub fn render_tutorial(palette: &Palette, area: Rect, buf: &mut Buffer) {
    let (block, [body, legend]) = frame("How to play", area);

    let lines = vec![
        Line::from(Span::styled("Pick a level and type the text shown.", palette.bold())),
        Line::from("The clock starts on your first keystroke."),
        Line::from("Correct characters turn green, mistakes red. Fixed mistakes stay orange."),
        Line::from("Backspace corrects, enter ends the run early, esc abandons it."),
        Line::from(""),
        Line::from(Span::styled("Scoring", palette.bold())),
        Line::from("WPM counts five correct characters as one word."),
        Line::from("Accuracy is correct keystrokes over all keystrokes."),
        Line::from("XP = WPM/5 + accuracy/10, scaled by difficulty."),
        Line::from("Generated challenges count as pro runs."),
    ];

    block.render(area, buf);
    Paragraph::new(lines)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true })
        .render(body, buf);
    render_legend(palette, legend, buf);
}
