//! Survey form: one choice control per question, grouped by section.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::domain::{FormSection, SurveyAnswers, SurveyField};
use crate::tui::styles::MedicalTheme;

use super::display_value;

/// Survey form state
#[derive(Debug, Clone, Default)]
pub struct SurveyFormState {
    pub answers: SurveyAnswers,

    /// Index into `SurveyField::FORM_ORDER`.
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl SurveyFormState {
    #[must_use]
    pub fn current_field(&self) -> SurveyField {
        SurveyField::FORM_ORDER[self.selected_field]
    }

    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % SurveyField::FORM_ORDER.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = SurveyField::FORM_ORDER.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Step the current answer forwards or backwards through its options.
    pub fn change(&mut self, step: isize) {
        let field = self.current_field();
        self.answers.cycle(field, step);
        self.error_message = None;
    }

    /// Restore every answer to its default, keeping the cursor.
    pub fn reset(&mut self) {
        self.answers = SurveyAnswers::default();
        self.error_message = None;
    }
}

/// Render the survey form
pub fn render_survey_form(f: &mut Frame, area: Rect, state: &SurveyFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(2), // Footer/error
        ])
        .split(area);

    super::render_header(
        f,
        chunks[0],
        "Heart Health Survey",
        &format!(
            "Question {} of {}",
            state.selected_field + 1,
            SurveyField::FORM_ORDER.len()
        ),
    );

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(chunks[1]);

    render_question_list(f, body[0], state);
    render_question_detail(f, body[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_question_list(f: &mut Frame, area: Rect, state: &SurveyFormState) {
    let block = Block::default()
        .title(Span::styled(" Questions ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());
    let inner_height = block.inner(area).height as usize;

    let label_width = SurveyField::FORM_ORDER
        .iter()
        .map(|f| f.label().chars().count())
        .max()
        .unwrap_or(0);

    let mut lines = Vec::new();
    let mut selected_line = 0;
    let mut section: Option<FormSection> = None;

    for (i, field) in SurveyField::FORM_ORDER.iter().enumerate() {
        if section != Some(field.section()) {
            if section.is_some() {
                lines.push(Line::from(""));
            }
            section = Some(field.section());
            lines.push(Line::from(Span::styled(
                format!(" {}", field.section().title()),
                MedicalTheme::subtitle(),
            )));
        }

        let is_selected = i == state.selected_field;
        if is_selected {
            selected_line = lines.len();
        }

        let value = display_value(state.answers.get(*field));
        let row = if is_selected {
            Line::from(vec![
                Span::styled(
                    format!("  {:<label_width$} ", field.label()),
                    MedicalTheme::focused(),
                ),
                Span::styled(format!("◀ {value} ▶"), MedicalTheme::selected()),
            ])
        } else {
            Line::from(vec![
                Span::styled(
                    format!("  {:<label_width$} ", field.label()),
                    MedicalTheme::text_secondary(),
                ),
                Span::styled(format!("  {value}"), MedicalTheme::text()),
            ])
        };
        lines.push(row);
    }

    // Keep the selected row in view.
    let scroll = selected_line.saturating_sub(inner_height / 2);
    let scroll = u16::try_from(scroll).unwrap_or(u16::MAX);

    f.render_widget(Paragraph::new(lines).block(block).scroll((scroll, 0)), area);
}

fn render_question_detail(f: &mut Frame, area: Rect, state: &SurveyFormState) {
    let field = state.current_field();
    let current = state.answers.get(field);

    let mut lines = vec![
        Line::from(Span::styled(field.label(), MedicalTheme::title())),
        Line::from(Span::styled(
            field.section().title(),
            MedicalTheme::text_muted(),
        )),
        Line::from(""),
    ];

    for option in field.options() {
        let line = if *option == current {
            Line::from(Span::styled(
                format!(" ● {}", display_value(option)),
                MedicalTheme::focused(),
            ))
        } else {
            Line::from(Span::styled(
                format!(" ○ {}", display_value(option)),
                MedicalTheme::text_secondary(),
            ))
        };
        lines.push(line);
    }

    if let Some(help) = field.help() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(help, MedicalTheme::text_muted())));
    }

    let block = Block::default()
        .title(Span::styled(" Answer ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &SurveyFormState) {
    if let Some(err) = &state.error_message {
        let content = Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ]);
        let footer = Paragraph::new(content).block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(MedicalTheme::border()),
        );
        f.render_widget(footer, area);
        return;
    }

    super::render_key_hints(
        f,
        area,
        &[
            ("↑↓", "Navigate"),
            ("←→", "Change"),
            ("D", "Defaults"),
            ("Enter", "Assess"),
            ("Esc", "Back"),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_wraps() {
        let mut state = SurveyFormState::default();
        assert_eq!(state.current_field(), SurveyField::Gender);

        state.prev_field();
        assert_eq!(state.current_field(), SurveyField::Exercise);

        state.next_field();
        state.next_field();
        assert_eq!(state.current_field(), SurveyField::Race);
    }

    #[test]
    fn test_change_and_reset() {
        let mut state = SurveyFormState {
            error_message: Some("stale".into()),
            ..SurveyFormState::default()
        };
        state.selected_field = SurveyField::FORM_ORDER
            .iter()
            .position(|f| *f == SurveyField::HeartAttack)
            .unwrap();

        let before = state.answers.get(SurveyField::HeartAttack);
        state.change(1);
        assert_ne!(state.answers.get(SurveyField::HeartAttack), before);
        assert!(state.error_message.is_none());

        state.change(-1);
        assert_eq!(state.answers.get(SurveyField::HeartAttack), before);

        state.change(1);
        state.reset();
        assert_eq!(state.answers, SurveyAnswers::default());
        assert_eq!(state.current_field(), SurveyField::HeartAttack);
    }
}
