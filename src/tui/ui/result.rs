//! Result view: score, band, contribution chart and advice.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::domain::{Assessment, Contribution};
use crate::tui::styles::MedicalTheme;

use super::feature_label;

/// Result state
#[derive(Debug, Clone, Default)]
pub enum ResultState {
    /// Nothing assessed yet
    #[default]
    Idle,
    /// Completed with result
    Complete { assessment: Box<Assessment> },
    /// The request failed; nothing else is shown
    Error { message: String },
}

/// Render the result view
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(2), // Footer
        ])
        .split(area);

    super::render_header(f, chunks[0], "Assessment Result", "Heart Disease Risk");

    match state {
        ResultState::Idle => render_idle(f, chunks[1]),
        ResultState::Complete { assessment } => render_assessment(f, chunks[1], assessment),
        ResultState::Error { message } => render_error(f, chunks[1], message),
    }

    let hints: &[(&str, &str)] = match state {
        ResultState::Error { .. } => &[("Enter", "Back to Survey"), ("Esc", "Home")],
        _ => &[("N", "New Assessment"), ("Esc", "Home")],
    };
    super::render_key_hints(f, chunks[2], hints);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(Line::from(Span::styled(
        "No assessment yet. Press [N] to start a survey.",
        MedicalTheme::text_muted(),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_assessment(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Band
            Constraint::Length(3), // Score gauge
            Constraint::Min(0),    // Contributions
        ])
        .split(columns[0]);

    let band_style = MedicalTheme::risk_band(assessment.band);

    let band = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            assessment.band.to_string(),
            band_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            assessment.band.description(),
            MedicalTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(band, left[0]);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(
                    " Estimated Risk ",
                    MedicalTheme::text_secondary(),
                ))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(band_style)
        .ratio(assessment.score.probability.clamp(0.0, 1.0))
        .label(format!("{:.1}%", assessment.risk_percent));
    f.render_widget(gauge, left[1]);

    render_contributions(f, left[2], &assessment.contributions.chart);
    render_recommendations(f, columns[1], assessment);
}

fn render_contributions(f: &mut Frame, area: Rect, chart: &[Contribution]) {
    let block = Block::default()
        .title(Span::styled(" What Influenced Your Score ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    let inner_width = block.inner(area).width as usize;

    let label_width = chart
        .iter()
        .map(|c| feature_label(&c.feature).chars().count())
        .max()
        .unwrap_or(0)
        .min(inner_width / 2);
    // label, two spaces, bar, " 100.0%"
    let bar_width = inner_width.saturating_sub(label_width + 10);

    let lines: Vec<Line> = chart
        .iter()
        .enumerate()
        .map(|(rank, c)| {
            let label: String = feature_label(&c.feature).chars().take(label_width).collect();
            let filled = bar_cells(c.percent, bar_width);
            Line::from(vec![
                Span::styled(format!(" {label:<label_width$} "), MedicalTheme::text()),
                Span::styled("█".repeat(filled), MedicalTheme::chart(rank)),
                Span::styled(
                    format!(" {:.1}%", c.percent),
                    MedicalTheme::text_secondary(),
                ),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// Cells of a `width`-wide bar filled by `percent`.
fn bar_cells(percent: f64, width: usize) -> usize {
    let cells = (percent.clamp(0.0, 100.0) / 100.0 * width as f64).round();
    (cells as usize).min(width)
}

fn render_recommendations(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let mut lines = Vec::new();

    for (i, rec) in assessment.recommendations.iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        let mut title = vec![Span::styled(rec.title.clone(), MedicalTheme::focused())];
        if let (Some(feature), Some(percent)) = (&rec.feature, rec.contribution) {
            title.push(Span::styled(
                format!("  {} · {percent:.1}%", feature_label(feature)),
                MedicalTheme::text_muted(),
            ));
        }
        lines.push(Line::from(title));
        lines.push(Line::from(Span::styled(
            rec.message.clone(),
            MedicalTheme::text(),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(
            "Assessed {}",
            assessment.created_at.format("%Y-%m-%d %H:%M UTC")
        ),
        MedicalTheme::text_muted(),
    )));

    let block = Block::default()
        .title(Span::styled(" Recommendations ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Error", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}
