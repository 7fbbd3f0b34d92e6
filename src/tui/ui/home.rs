//! Home view: model status and entry point to a new survey.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::domain::RiskBand;
use crate::tui::styles::{MedicalTheme, LOGO_SMALL};

/// Home state for rendering.
#[derive(Debug, Clone, Default)]
pub struct HomeState {
    pub model_path: String,
    pub feature_count: usize,
    pub member_count: usize,
    pub manifest_verified: bool,
    pub assessments_run: usize,

    /// Score and band of the most recent assessment in this session.
    pub last_result: Option<(f64, RiskBand)>,
}

/// Render the home view.
pub fn render_home(f: &mut Frame, area: Rect, state: &HomeState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
        ])
        .split(area);

    super::render_header(f, chunks[0], LOGO_SMALL, "Heart Disease Risk Assessment");
    render_main_content(f, chunks[1], state);
}

fn render_main_content(f: &mut Frame, area: Rect, state: &HomeState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .margin(1)
        .split(area);

    render_status(f, chunks[0], state);
    render_about(f, chunks[1]);
}

fn render_status(f: &mut Frame, area: Rect, state: &HomeState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // Model status
            Constraint::Min(0),    // Quick actions
        ])
        .split(area);

    let mut status_items = vec![
        format_status_item("Model Loaded", true),
        format_status_item("Manifest Verified", state.manifest_verified),
        Line::from(vec![
            Span::styled("  Path: ", MedicalTheme::text_secondary()),
            Span::styled(state.model_path.clone(), MedicalTheme::text_muted()),
        ]),
        Line::from(vec![
            Span::styled("  Features: ", MedicalTheme::text_secondary()),
            Span::styled(state.feature_count.to_string(), MedicalTheme::text()),
            Span::styled("  Ensemble: ", MedicalTheme::text_secondary()),
            Span::styled(state.member_count.to_string(), MedicalTheme::text()),
        ]),
        Line::from(vec![
            Span::styled("  Assessments: ", MedicalTheme::text_secondary()),
            Span::styled(state.assessments_run.to_string(), MedicalTheme::text()),
        ]),
    ];

    if let Some((percent, band)) = state.last_result {
        status_items.push(Line::from(vec![
            Span::styled("  Last: ", MedicalTheme::text_secondary()),
            Span::styled(
                format!("{percent:.1}% ({band})"),
                MedicalTheme::risk_band(band),
            ),
        ]));
    }

    let status_block = Block::default()
        .title(Span::styled(" System Status ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    f.render_widget(Paragraph::new(status_items).block(status_block), chunks[0]);

    let actions = vec![
        Line::from(vec![
            Span::styled("[N] ", MedicalTheme::key_hint()),
            Span::styled("New Assessment", MedicalTheme::key_desc()),
        ]),
        Line::from(vec![
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ]),
    ];

    let actions_block = Block::default()
        .title(Span::styled(" Quick Actions ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    f.render_widget(Paragraph::new(actions).block(actions_block), chunks[1]);
}

fn render_about(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "Answer 22 questions about your health and lifestyle.",
            MedicalTheme::text(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "You will get an estimated risk of heart disease, the answers that",
            MedicalTheme::text_secondary(),
        )),
        Line::from(Span::styled(
            "influenced it most, and suggestions for the factors you can change.",
            MedicalTheme::text_secondary(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Low ", MedicalTheme::risk_band(RiskBand::Low)),
            Span::styled("≤ 25%  ", MedicalTheme::text_muted()),
            Span::styled("Moderate ", MedicalTheme::risk_band(RiskBand::Moderate)),
            Span::styled("≤ 40%  ", MedicalTheme::text_muted()),
            Span::styled("High ", MedicalTheme::risk_band(RiskBand::High)),
            Span::styled("≤ 70%  ", MedicalTheme::text_muted()),
            Span::styled("Very High", MedicalTheme::risk_band(RiskBand::VeryHigh)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Nothing you enter is stored or sent anywhere.",
            MedicalTheme::text_muted(),
        )),
    ];

    let block = Block::default()
        .title(Span::styled(" About ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn format_status_item(label: &str, ok: bool) -> Line<'static> {
    let (icon, style) = if ok {
        ("OK", MedicalTheme::success())
    } else {
        ("NO", MedicalTheme::danger())
    };

    Line::from(vec![
        Span::styled(format!("  {icon:<4}"), style),
        Span::styled(label.to_string(), MedicalTheme::text()),
    ])
}
