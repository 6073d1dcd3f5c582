//! Tagged logging with colored console output and plain-text file persistence.
//!
//! Every module logs through a `LogTag` so output can be scanned by
//! subsystem. Debug lines are only emitted when the process was started
//! with `--debug`. File logging is best effort: a failed append never
//! interrupts the bot.

use crate::paths;
use chrono::Local;
use colored::*;
use once_cell::sync::OnceCell;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTag {
    System,
    Config,
    Engine,
    Indicator,
    Ledger,
    Executor,
    Exchange,
    Notify,
    Scheduler,
}

impl LogTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Config => "CONFIG",
            LogTag::Engine => "ENGINE",
            LogTag::Indicator => "INDICATOR",
            LogTag::Ledger => "LEDGER",
            LogTag::Executor => "EXECUTOR",
            LogTag::Exchange => "EXCHANGE",
            LogTag::Notify => "NOTIFY",
            LogTag::Scheduler => "SCHEDULER",
        }
    }

    fn colored(&self) -> ColoredString {
        match self {
            LogTag::System => self.as_str().green().bold(),
            LogTag::Config => self.as_str().cyan().bold(),
            LogTag::Engine => self.as_str().yellow().bold(),
            LogTag::Indicator => self.as_str().magenta().bold(),
            LogTag::Ledger => self.as_str().bright_blue().bold(),
            LogTag::Executor => self.as_str().bright_yellow().bold(),
            LogTag::Exchange => self.as_str().bright_green().bold(),
            LogTag::Notify => self.as_str().purple().bold(),
            LogTag::Scheduler => self.as_str().blue().bold(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    fn colored(&self) -> ColoredString {
        match self {
            LogLevel::Error => self.as_str().red().bold(),
            LogLevel::Warning => self.as_str().yellow(),
            LogLevel::Info => self.as_str().normal(),
            LogLevel::Debug => self.as_str().dimmed(),
        }
    }
}

struct LoggerState {
    debug_enabled: bool,
    file: Option<Mutex<std::fs::File>>,
}

static LOGGER: OnceCell<LoggerState> = OnceCell::new();

/// Initialize the logger. Call once at startup, after the directories
/// exist and before any other logging.
pub fn init(debug_enabled: bool) {
    let file = open_log_file(paths::get_log_path());
    let _ = LOGGER.set(LoggerState {
        debug_enabled,
        file: file.map(Mutex::new),
    });
}

fn open_log_file(path: PathBuf) -> Option<std::fs::File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| {
            eprintln!("failed to open log file {}: {}", path.display(), e);
            e
        })
        .ok()
}

fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    let state = LOGGER.get();

    if level == LogLevel::Debug && !state.map(|s| s.debug_enabled).unwrap_or(false) {
        return;
    }

    let now = Local::now();
    let time = now.format("%H:%M:%S").to_string();

    println!(
        "{} [{:>9}] [{:>5}] {}",
        time.dimmed(),
        tag.colored(),
        level.colored(),
        message
    );

    if let Some(file) = state.and_then(|s| s.file.as_ref()) {
        if let Ok(mut file) = file.lock() {
            let _ = writeln!(
                file,
                "{} [{}] [{}] {}",
                now.format("%Y-%m-%d %H:%M:%S"),
                tag.as_str(),
                level.as_str(),
                message
            );
        }
    }
}

pub fn error(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Error, message);
}

pub fn warning(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Warning, message);
}

pub fn info(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Info, message);
}

pub fn debug(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Debug, message);
}
