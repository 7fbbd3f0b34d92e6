//! UI module: View components for the TUI.

pub mod home;
pub mod result;
pub mod survey;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::domain::SurveyField;
use crate::tui::styles::MedicalTheme;

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![Line::from(vec![
        Span::styled("DISCLAIMER: ", MedicalTheme::text_secondary()),
        Span::styled(
            "This AI-powered assessment is for educational purposes only and is not a substitute for professional medical advice, diagnosis, or treatment. Always consult with qualified healthcare providers regarding your health concerns.",
            MedicalTheme::text_muted(),
        ),
    ])];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}

/// Screen header with a title and a muted subtitle.
fn render_header(f: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled(title.to_string(), MedicalTheme::title()),
        Span::styled(" │ ", MedicalTheme::text_muted()),
        Span::styled(subtitle.to_string(), MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

/// Footer made of `[key] description` pairs.
fn render_key_hints(f: &mut Frame, area: Rect, hints: &[(&str, &str)]) {
    let spans: Vec<Span> = hints
        .iter()
        .flat_map(|(key, desc)| {
            [
                Span::styled(format!("[{key}] "), MedicalTheme::key_hint()),
                Span::styled(format!("{desc} "), MedicalTheme::key_desc()),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}

/// Human-readable form of a wire value: `current_smoker_every_day` → `Current smoker every day`.
pub fn display_value(value: &str) -> String {
    let spaced = value.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Display label for a contribution entry; "Other Factors" passes through.
pub fn feature_label(feature: &str) -> &str {
    SurveyField::from_key(feature).map_or(feature, |f| f.label())
}
