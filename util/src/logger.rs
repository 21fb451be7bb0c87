//! # Logging backend
//!
//! Installs the `log` backend for an executable. Every record goes to the
//! console with coloured level tags and to the session log file as plain
//! text. Lines are stamped with the session's monotonic time so they line up
//! with the control loop's timestamps.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::Colorize;
use log::{info, Level, Record};
use std::fmt;
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise logging for this execution.
///
/// `min_level` must be `INFO` or more verbose so that mode changes and
/// faults always reach the log.
///
/// Only the first call in a process can succeed.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file =
        fern::log_file(&session.log_file_path).map_err(LoggerInitError::LogFileInitError)?;

    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            let tag = match record.level() {
                Level::Trace => level_tag(Level::Trace).dimmed().italic(),
                Level::Debug => level_tag(Level::Debug).dimmed(),
                Level::Info => level_tag(Level::Info).normal(),
                Level::Warn => level_tag(Level::Warn).yellow(),
                Level::Error => level_tag(Level::Error).red().bold(),
            };
            out.finish(format_args!("{}", Line::new(record, message, tag)))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                Line::new(record, message, level_tag(record.level()))
            ))
        })
        .chain(log_file);

    fern::Dispatch::new()
        .level(min_level)
        .level_for("serialport", LevelFilter::Info)
        .chain(console)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE ITEMS
// ---------------------------------------------------------------------------

/// One formatted log line.
struct Line<'a, T> {
    stamp_s: f64,
    tag: T,
    target: Option<&'a str>,
    message: &'a fmt::Arguments<'a>,
}

impl<'a, T: fmt::Display> Line<'a, T> {
    fn new(record: &'a Record, message: &'a fmt::Arguments<'a>, tag: T) -> Self {
        Self {
            stamp_s: session::try_get_monotonic_seconds().unwrap_or(0.0),
            tag,
            // Debug and trace lines name the module that raised them
            target: if record.level() > Level::Info {
                Some(record.target())
            } else {
                None
            },
            message,
        }
    }
}

impl<'a, T: fmt::Display> fmt::Display for Line<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{:10.6} {}] ", self.stamp_s, self.tag)?;
        if let Some(target) = self.target {
            write!(f, "{}: ", target)?;
        }
        write!(f, "{}", self.message)
    }
}

/// Three letter tag for a level.
fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info => "INF",
        Level::Warn => "WRN",
        Level::Error => "ERR",
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
