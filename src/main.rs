//! Media Organizer - sort photos, RAW files and videos by capture date
//!
//! Scans a source tree, skips exact duplicates and copies (or moves) every
//! media file into `destination/YYYY/MM/DD`.

use anyhow::{Context, Result};
use clap::Parser;
use media_organizer::{Cli, Config, Error, Notifier, Organizer, RunStatistics};
use std::path::Path;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// CLI Output Module
mod cli_output {
    //! Styled end-of-run summary for the terminal

    use crossterm::{
        ExecutableCommand,
        style::{Color, Print, Stylize, style},
    };
    use std::io::stdout;

    /// CLI theme colors
    pub struct CliTheme;

    impl CliTheme {
        pub const SUCCESS: Color = Color::Green;
        pub const WARNING: Color = Color::Yellow;
        pub const ERROR: Color = Color::Red;
        pub const HINT: Color = Color::DarkGrey;
        pub const ACCENT: Color = Color::Cyan;
    }

    /// Print a separator line
    pub fn print_separator() {
        let _ = stdout().execute(Print(format!("{}\n", "─".repeat(60))));
    }

    /// Print a centered title
    pub fn print_title(title: &str) {
        let padding = 60usize.saturating_sub(title.len()) / 2;
        let _ = stdout().execute(Print(" ".repeat(padding)));
        let _ = stdout().execute(Print(style(title).bold()));
        let _ = stdout().execute(Print("\n"));
    }

    /// Print one statistic
    pub fn print_stat(key: &str, value: &str, color: Color) {
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style(key).with(CliTheme::HINT)));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(style(value).with(color).bold()));
        let _ = stdout().execute(Print("\n"));
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Media Organizer starting"
    );

    match run(&cli) {
        Ok(stats) if stats.errors == 0 => ExitCode::SUCCESS,
        Ok(stats) => {
            warn!(errors = stats.errors, "Run completed with errors");
            ExitCode::FAILURE
        }
        Err(e) => {
            match e.downcast_ref::<Error>() {
                Some(Error::InvalidSource(path)) => {
                    error!(source = %path.display(), "Invalid source directory");
                }
                _ => error!(error = %format!("{:#}", e), "Critical error"),
            }
            ExitCode::FAILURE
        }
    }
}

/// Organize, report and notify
fn run(cli: &Cli) -> Result<RunStatistics> {
    let config = load_config(cli)?;
    let ntfy = config.ntfy.clone();

    let report = Organizer::new(config).run()?;
    print_summary(&report.stats);

    if let Some(ntfy) = ntfy {
        Notifier::new(ntfy).notify_completion(&report.stats);
    }

    Ok(report.stats)
}

/// Load configuration from file or CLI arguments
fn load_config(cli: &Cli) -> Result<Config> {
    let config = match cli.config {
        Some(ref config_path) => {
            info!(config_file = %config_path.display(), "Loading configuration from file");
            let file_config = Config::load_from_file(config_path)
                .with_context(|| format!("loading {}", config_path.display()))?;
            cli.merge_with_config(file_config)
        }
        None => cli.to_config(),
    };

    if cli.verbose {
        info!(?config, "Configuration loaded");
    }

    Ok(config)
}

/// Console logging always; with `--log-file`, a second layer at DEBUG
fn setup_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let console_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let (writer, guard) = match cli.log_file {
        Some(ref log_path) => {
            let (writer, guard) = open_log_file(log_path)?;
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let json_layer = writer.clone().filter(|_| cli.json_log).map(|w| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(w)
            .with_filter(LevelFilter::DEBUG)
    });
    let text_layer = writer.filter(|_| !cli.json_log).map(|w| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(w)
            .with_filter(LevelFilter::DEBUG)
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stdout).with_filter(console_filter))
        .with(text_layer)
        .with(json_layer)
        .init();

    Ok(guard)
}

fn open_log_file(
    log_path: &Path,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    if let Some(parent) = log_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;

    Ok(tracing_appender::non_blocking(file))
}

fn print_summary(stats: &RunStatistics) {
    use cli_output::*;

    print_separator();
    print_title("Media organization complete");
    print_separator();
    print_stat("Total files", &stats.total_files.to_string(), CliTheme::ACCENT);
    print_stat("RAW files", &stats.raw_files.to_string(), CliTheme::ACCENT);
    print_stat("Video files", &stats.video_files.to_string(), CliTheme::ACCENT);
    print_stat("Image files", &stats.image_files.to_string(), CliTheme::ACCENT);
    print_stat("Duplicates", &stats.duplicates.to_string(), CliTheme::WARNING);
    print_stat(
        "Space saved",
        &format!("{:.2} MB", stats.space_saved_mb()),
        CliTheme::SUCCESS,
    );
    let error_color = if stats.errors == 0 {
        CliTheme::SUCCESS
    } else {
        CliTheme::ERROR
    };
    print_stat("Errors", &stats.errors.to_string(), error_color);
    print_separator();
}
