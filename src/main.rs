//! HoloMed: heart-disease risk survey.
//!
//! Main entry point for the terminal application.

use anyhow::Result;
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use holomed::adapters::sanitize::SanitizingMakeWriter;
use holomed::config::Settings;
use holomed::tui::App;

fn main() -> Result<()> {
    let settings = Settings::from_env();

    // Initialize logging.
    //
    // Writing logs to the terminal corrupts the TUI (alternate screen), so an
    // interactive session logs to a file unless told otherwise.
    let interactive = std::io::stdout().is_terminal();

    let (writer, _guard) = if settings.log_mode.use_file(interactive) {
        if let Some(parent) = settings.log_file.parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&settings.log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(
            SanitizingMakeWriter::new(writer).with_limit(settings.sanitize_max_bytes),
        ))
        .init();
    settings.report_ignored();

    tracing::info!("Starting HoloMed...");

    // Refuses to start if the model cannot be loaded or verified.
    let mut app = App::new(&settings)?;
    app.run()?;

    tracing::info!("HoloMed shutdown complete.");
    Ok(())
}
