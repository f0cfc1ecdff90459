use crate::storage::SessionRecord;

/// WPM of recent sessions as chart points, oldest first, x counting from 1.
pub fn history_points(recent: &[SessionRecord]) -> Vec<(f64, f64)> {
    recent
        .iter()
        .rev()
        .enumerate()
        .map(|(i, r)| ((i + 1) as f64, r.wpm as f64))
        .collect()
}

/// Compute X (session number) and Y (WPM) bounds for the history chart
pub fn compute_chart_params(points: &[(f64, f64)]) -> (f64, f64) {
    let highest_wpm = points.iter().map(|&(_, wpm)| wpm).fold(0.0, f64::max);
    let sessions = points.last().map(|p| p.0).unwrap_or(1.0).max(1.0);

    (sessions, highest_wpm.round().max(1.0))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
