//! Dozen CLI - binary entry point.
//!
//! # Lifecycle
//!
//! ```text
//! main() -> init_tracing() -> load_settings() -> StateVector::random()
//!        -> Stabilizer::run(TerminalSink, ctrl_c) -> summary
//! ```
//!
//! Logs go to a file so they never interleave with the status line.

mod terminal;

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::stdout,
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use dozen_config::DozenConfig;
use dozen_core::{Stabilizer, StateVector};
use dozen_types::Settings;

use terminal::TerminalSink;

const LOG_FILE_NAME: &str = "dozen.log";

/// Log file chosen at startup plus the failures hit on the way to it.
struct LogTarget {
    file: Option<(PathBuf, fs::File)>,
    skipped: Vec<String>,
}

/// `RUST_LOG` if set and valid, else `info`.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_tracing() {
    let LogTarget { file, skipped } = LogTarget::open(&log_dirs());
    let registry = tracing_subscriber::registry().with(log_filter());

    let Some((path, file)) = file else {
        // Stdout belongs to the status line.
        registry.init();
        return;
    };

    registry
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();
    tracing::info!(path = %path.display(), "Logging to file");
    for reason in skipped {
        tracing::warn!(%reason, "Skipped log location");
    }
}

impl LogTarget {
    /// Append to `dozen.log` in the first directory that can be created and
    /// opened.
    fn open(dirs: &[PathBuf]) -> Self {
        let mut skipped = Vec::new();
        for dir in dirs {
            let path = dir.join(LOG_FILE_NAME);
            let opened = fs::create_dir_all(dir)
                .and_then(|()| OpenOptions::new().create(true).append(true).open(&path));
            match opened {
                Ok(file) => {
                    return Self {
                        file: Some((path, file)),
                        skipped,
                    };
                }
                Err(e) => skipped.push(format!("{}: {e}", path.display())),
            }
        }
        Self {
            file: None,
            skipped,
        }
    }
}

/// `logs/` beside the config file, then `./.dozen/logs`.
fn log_dirs() -> Vec<PathBuf> {
    DozenConfig::path()
        .and_then(|config| config.parent().map(|dir| dir.join("logs")))
        .into_iter()
        .chain([PathBuf::from(".dozen").join("logs")])
        .collect()
}

/// Resolved settings, falling back to defaults when the config is missing
/// or unusable.
fn load_settings() -> Settings {
    let config = match DozenConfig::load() {
        Ok(Some(config)) => config,
        Ok(None) => return Settings::default(),
        Err(e) => {
            tracing::warn!(%e, "Ignoring config file");
            eprintln!("Ignoring config file: {e}");
            return Settings::default();
        }
    };

    match config.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(%e, "Ignoring invalid config");
            eprintln!("Ignoring invalid config: {e}");
            Settings::default()
        }
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a handler SIGINT keeps its default action and ends the process.
        tracing::warn!(%e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let settings = load_settings();
    let state = Arc::new(StateVector::random(
        settings.state.dimensions(),
        settings.state.target_sum(),
        settings.state.initial_range(),
    ));

    println!(
        "{}D state vector | target {} | protocol {} | Ctrl-C to stop",
        settings.state.dimensions(),
        settings.state.target_sum(),
        settings.stabilizer.protocol()
    );

    let mut stabilizer = Stabilizer::new(state, &settings);
    let mut sink = TerminalSink::new(stdout());
    let report = stabilizer.run(&mut sink, ctrl_c()).await;
    sink.finish()?;

    println!(
        "Stopped after {} cycles ({} backoffs, {} degenerate). Drivers stopped: {}/{}",
        report.stats.completed,
        report.stats.backoffs,
        report.stats.degenerate,
        report.drivers.stopped,
        settings.state.dimensions()
    );
    if !report.drivers.is_clean() {
        eprintln!(
            "{} drivers did not stop cleanly ({} timed out, {} failed)",
            report.drivers.timed_out + report.drivers.panicked,
            report.drivers.timed_out,
            report.drivers.panicked
        );
    }

    Ok(())
}
