//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Service integration

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::encoding::TargetEncoder;
use crate::adapters::gbdt::BalancedEnsemble;
use crate::adapters::load_artifacts;
use crate::application::AssessmentService;
use crate::config::Settings;
use crate::ports::RiskClassifier;

use super::ui::{
    home::{render_home, HomeState},
    render_disclaimer,
    result::{render_result, ResultState},
    survey::{render_survey_form, SurveyFormState},
};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Survey,
    Result,
}

/// Main application state
pub struct App {
    /// Current screen
    screen: Screen,

    /// Whether the app should quit
    should_quit: bool,

    service: AssessmentService<TargetEncoder, BalancedEnsemble>,

    home_state: HomeState,
    survey_state: SurveyFormState,
    result_state: ResultState,
}

impl App {
    /// Load the artifacts named by `settings` and build the application.
    ///
    /// # Errors
    /// Returns error if the artifacts cannot be loaded or verified. The
    /// application refuses to start without a working model.
    pub fn new(settings: &Settings) -> Result<Self> {
        let loaded = load_artifacts(&settings.model_path, settings.require_manifest)
            .with_context(|| {
                format!(
                    "Failed to load model from {:?}. Set HOLOMED_MODEL_PATH to a directory containing encoder.json and model.json.",
                    settings.model_path
                )
            })?;

        let home_state = HomeState {
            model_path: settings.model_path.display().to_string(),
            feature_count: loaded.classifier.feature_names().len(),
            member_count: loaded.classifier.members().len(),
            manifest_verified: loaded.verified,
            ..HomeState::default()
        };

        let service = AssessmentService::new(Arc::new(loaded.encoder), Arc::new(loaded.classifier));
        Ok(Self::with_service(service, home_state))
    }

    /// Create application with an injected service (Composition Root pattern).
    #[must_use]
    pub fn with_service(
        service: AssessmentService<TargetEncoder, BalancedEnsemble>,
        home_state: HomeState,
    ) -> Self {
        Self {
            screen: Screen::Home,
            should_quit: false,
            service,
            home_state,
            survey_state: SurveyFormState::default(),
            result_state: ResultState::default(),
        }
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Main loop
        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let area = f.area();
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(area);

                let content_area = chunks[0];
                let disclaimer_area = chunks[1];

                match self.screen {
                    Screen::Home => render_home(f, content_area, &self.home_state),
                    Screen::Survey => render_survey_form(f, content_area, &self.survey_state),
                    Screen::Result => render_result(f, content_area, &self.result_state),
                }

                render_disclaimer(f, disclaimer_area);
            })?;

            // Handle input (short poll to stay responsive)
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Home => self.handle_home_key(key),
            Screen::Survey => self.handle_survey_key(key),
            Screen::Result => self.handle_result_key(key),
        }
    }

    fn handle_home_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('n') | KeyCode::Char('N') => self.start_survey(),
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn handle_survey_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.screen = Screen::Home;
            }
            KeyCode::Up | KeyCode::BackTab => {
                self.survey_state.prev_field();
            }
            KeyCode::Down | KeyCode::Tab => {
                self.survey_state.next_field();
            }
            KeyCode::Left => {
                self.survey_state.change(-1);
            }
            KeyCode::Right | KeyCode::Char(' ') => {
                self.survey_state.change(1);
            }
            KeyCode::Char('d') | KeyCode::Char('D') => {
                self.survey_state.reset();
            }
            KeyCode::Enter => {
                self.submit_survey();
            }
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        match &self.result_state {
            ResultState::Error { .. } => match key {
                KeyCode::Enter => {
                    self.screen = Screen::Survey;
                }
                KeyCode::Esc => {
                    self.screen = Screen::Home;
                }
                _ => {}
            },
            _ => match key {
                KeyCode::Char('n') | KeyCode::Char('N') => self.start_survey(),
                KeyCode::Esc | KeyCode::Enter => {
                    self.screen = Screen::Home;
                }
                _ => {}
            },
        }
    }

    fn start_survey(&mut self) {
        self.survey_state = SurveyFormState::default();
        self.screen = Screen::Survey;
    }

    /// Assess the current answers and show the outcome.
    ///
    /// A failed request replaces any previous result with the error message.
    fn submit_survey(&mut self) {
        match self.service.assess(&self.survey_state.answers) {
            Ok(assessment) => {
                self.home_state.assessments_run += 1;
                self.home_state.last_result = Some((assessment.risk_percent, assessment.band));
                self.result_state = ResultState::Complete {
                    assessment: Box::new(assessment),
                };
            }
            Err(e) => {
                tracing::error!("Assessment failed: {}", e);
                self.result_state = ResultState::Error {
                    message: e.to_string(),
                };
            }
        }
        self.screen = Screen::Result;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdviceTopic, SurveyField};
    use std::path::Path;

    fn create_test_app() -> App {
        let loaded = load_artifacts(Path::new("models"), true).expect("bundled artifacts load");
        let service = AssessmentService::new(Arc::new(loaded.encoder), Arc::new(loaded.classifier));
        App::with_service(service, HomeState::default())
    }

    fn press(app: &mut App, key: KeyCode) {
        app.handle_key(key, KeyModifiers::NONE);
    }

    #[test]
    fn test_new_loads_bundled_artifacts() {
        let settings = Settings {
            require_manifest: true,
            ..Settings::default()
        };
        let app = App::new(&settings).expect("app");
        assert_eq!(app.screen(), Screen::Home);
        assert!(app.home_state.manifest_verified);
        assert_eq!(app.home_state.feature_count, 22);
        assert_eq!(app.home_state.member_count, 2);
    }

    #[test]
    fn test_new_fails_without_artifacts() {
        let temp = tempfile::tempdir().expect("tempdir");
        let settings = Settings {
            model_path: temp.path().join("missing"),
            ..Settings::default()
        };
        assert!(App::new(&settings).is_err());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = create_test_app();
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.screen(), Screen::Survey);

        // Plain 'q' is not a quit inside the form.
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit());

        app.handle_key(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.should_quit());

        let mut app = create_test_app();
        press(&mut app, KeyCode::Char('Q'));
        assert!(app.should_quit());
    }

    #[test]
    fn test_survey_submission_shows_result() {
        let mut app = create_test_app();
        press(&mut app, KeyCode::Char('n'));

        // Gender is the first question.
        press(&mut app, KeyCode::Right);
        assert_ne!(
            app.survey_state.answers.get(SurveyField::Gender),
            crate::SurveyAnswers::default().get(SurveyField::Gender)
        );
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.survey_state.answers, crate::SurveyAnswers::default());

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen(), Screen::Result);
        match &app.result_state {
            ResultState::Complete { assessment } => {
                assert_eq!(assessment.recommendations[0].topic, AdviceTopic::KeepItUp);
            }
            other => panic!("expected a result, got {other:?}"),
        }
        assert_eq!(app.home_state.assessments_run, 1);
        assert!(app.home_state.last_result.is_some());

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen(), Screen::Home);
    }

    #[test]
    fn test_new_survey_from_result_starts_from_defaults() {
        let mut app = create_test_app();
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen(), Screen::Result);

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.screen(), Screen::Survey);
        assert_eq!(app.survey_state.answers, crate::SurveyAnswers::default());
        assert_eq!(app.survey_state.selected_field, 0);
    }

    #[test]
    fn test_error_screen_navigation() {
        let mut app = create_test_app();
        app.result_state = ResultState::Error {
            message: "model evaluation failed".into(),
        };
        app.screen = Screen::Result;

        // N does nothing on the error screen.
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.screen(), Screen::Result);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen(), Screen::Survey);

        app.screen = Screen::Result;
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen(), Screen::Home);
    }
}
