//! Media Organiser - copy photos and videos into a dated library
//!
//! A CLI tool for organising media files by capture time, taken from EXIF
//! data, filename patterns, or file system timestamps.

use anyhow::Result;
use clap::Parser;
use media_organiser::process::{DestinationOutcome, FileResult, FileStatus};
use media_organiser::{Cli, Config, Processor};
use std::path::Path;
use tracing::{Level, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// CLI Output Module
mod cli_output {
    //! Colours and layout for the end-of-run summary

    use crossterm::{
        ExecutableCommand,
        style::{Color, Print, Stylize, style},
    };
    use std::io::stdout;

    /// CLI theme colours
    pub struct CliTheme;

    impl CliTheme {
        pub const SUCCESS: Color = Color::Green;
        pub const WARNING: Color = Color::Yellow;
        pub const ERROR: Color = Color::Red;
        pub const HINT: Color = Color::DarkGrey;
        pub const ACCENT: Color = Color::Cyan;
    }

    pub fn print_separator() {
        let _ = stdout().execute(Print(format!("{}\n", "─".repeat(60))));
    }

    pub fn print_title(title: &str) {
        let _ = stdout().execute(Print(format!("  {}\n", title.bold())));
    }

    pub fn print_warning(msg: &str) {
        let _ = stdout().execute(Print(style("⚠ ").with(CliTheme::WARNING).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_stat(key: &str, value: usize, color: Color) {
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style(key).with(CliTheme::HINT)));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(style(value.to_string()).with(color).bold()));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_failure(source: &str, msg: &str) {
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style("✗ ").with(CliTheme::ERROR).bold()));
        let _ = stdout().execute(Print(style(source).italic()));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(style(msg).with(CliTheme::HINT)));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_log_path(path: &str) {
        let _ = stdout().execute(Print(style("  Log file: ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{}\n", path)));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.sample_config {
        print!("{}", Config::sample_config());
        return Ok(());
    }

    let config = load_config(&cli)?;
    let log_path = config.log_file_path();
    let _guard = setup_logging(&cli, &log_path)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Media Organiser starting");
    if cli.verbose {
        info!(?config, "Configuration loaded");
    }

    let mut processor = Processor::new(config);
    match processor.run() {
        Ok(results) => {
            print_summary(&processor, &results, &log_path);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Processing aborted");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Load configuration from file and/or CLI arguments
fn load_config(cli: &Cli) -> Result<Config> {
    let config = match cli.config {
        Some(ref path) => cli.merge_with_config(Config::load_from_file(path)?),
        None => cli.to_config(),
    };
    config.validate()?;
    Ok(config)
}

/// Setup logging: appended log file plus stderr
fn setup_logging(cli: &Cli, log_path: &Path) -> Result<WorkerGuard> {
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if cli.json_log {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(guard)
}

fn print_summary(processor: &Processor, results: &[FileResult], log_path: &Path) {
    use cli_output::*;

    let stats = processor.stats();

    print_separator();
    print_title("Processing complete");
    print_separator();
    print_stat("Processed", stats.processed, CliTheme::SUCCESS);
    print_stat("Copied", stats.copied, CliTheme::SUCCESS);
    print_stat("Already present", stats.identical, CliTheme::ACCENT);
    print_stat("Archived", stats.archived, CliTheme::ACCENT);
    print_stat("Unsupported", stats.unsupported, CliTheme::WARNING);
    print_stat("Unresolved", stats.unresolved, CliTheme::ERROR);
    print_stat("Failed", stats.failed, CliTheme::ERROR);

    let failures: Vec<_> = results
        .iter()
        .filter(|r| matches!(r.status, FileStatus::Failed | FileStatus::Unresolved))
        .collect();
    if !failures.is_empty() {
        print_separator();
        for result in failures {
            let message = result.error.clone().unwrap_or_else(|| {
                result
                    .destinations
                    .iter()
                    .filter_map(|d| match &d.outcome {
                        DestinationOutcome::Failed { message, .. } => Some(message.as_str()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("; ")
            });
            print_failure(&result.source.display().to_string(), &message);
        }
    }

    if processor.config().dry_run {
        print_separator();
        print_warning("Dry run: no files were copied or moved");
    }

    print_separator();
    print_log_path(&log_path.display().to_string());
}
