//! Progress lines for long-running commands.
//!
//! Everything goes to stderr so stdout stays clean for results. The output
//! shape depends on where stderr points: a terminal gets colored marks and an
//! animated spinner, a pipe gets `[skillhub]`-prefixed lines, robot mode gets
//! one JSON event per line, and quiet mode gets nothing.

use std::io::IsTerminal;
use std::time::Duration;

use chrono::Utc;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Tty,
    NonTty,
    Robot,
    Quiet,
}

impl ProgressMode {
    /// Quiet wins over robot, robot wins over terminal detection.
    #[must_use]
    pub fn detect(robot_mode: bool, quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if robot_mode {
            Self::Robot
        } else if std::io::stderr().is_terminal() {
            Self::Tty
        } else {
            Self::NonTty
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Step,
    Info,
    Warning,
}

impl Kind {
    const fn event(self) -> &'static str {
        match self {
            Self::Step => "step",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

/// One robot-mode line on stderr.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub event: &'static str,
    pub message: String,
    pub timestamp: String,
}

impl ProgressEvent {
    fn new(event: &'static str, message: impl Into<String>) -> Self {
        Self {
            event_type: "progress",
            event,
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            eprintln!("{json}");
        }
    }
}

pub struct ProgressReporter {
    mode: ProgressMode,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(robot_mode: bool, quiet: bool) -> Self {
        Self::with_mode(ProgressMode::detect(robot_mode, quiet))
    }

    #[must_use]
    pub const fn with_mode(mode: ProgressMode) -> Self {
        Self { mode }
    }

    /// Prints nothing. Used by tests and library callers.
    #[must_use]
    pub const fn silent() -> Self {
        Self::with_mode(ProgressMode::Quiet)
    }

    #[must_use]
    pub const fn mode(&self) -> ProgressMode {
        self.mode
    }

    /// A finished check, e.g. "handler.js is valid."
    pub fn step(&self, msg: &str) {
        self.line(Kind::Step, msg);
    }

    pub fn log(&self, msg: &str) {
        self.line(Kind::Info, msg);
    }

    /// Something was skipped but the run goes on.
    pub fn warn(&self, msg: &str) {
        self.line(Kind::Warning, msg);
    }

    fn line(&self, kind: Kind, msg: &str) {
        match (self.mode, kind) {
            (ProgressMode::Quiet, _) => {}
            (ProgressMode::Robot, kind) => ProgressEvent::new(kind.event(), msg).emit(),
            (ProgressMode::Tty, Kind::Step) => eprintln!("{} {msg}", "✓".green()),
            (ProgressMode::Tty, Kind::Warning) => eprintln!("{} {msg}", "⚠".yellow()),
            (ProgressMode::Tty, Kind::Info) => eprintln!("{msg}"),
            (ProgressMode::NonTty, Kind::Step) => eprintln!("[skillhub] ✓ {msg}"),
            (ProgressMode::NonTty, Kind::Warning) => eprintln!("[skillhub] WARN: {msg}"),
            (ProgressMode::NonTty, Kind::Info) => eprintln!("[skillhub] {msg}"),
        }
    }

    /// Spinner for a phase of unknown length, such as the archive upload.
    pub fn spinner(&self, msg: &str) -> ProgressHandle {
        match self.mode {
            ProgressMode::Quiet => ProgressHandle::Noop,
            ProgressMode::Robot => {
                ProgressEvent::new("spinner_start", msg).emit();
                ProgressHandle::Robot {
                    operation: msg.to_string(),
                }
            }
            ProgressMode::NonTty => {
                eprintln!("[skillhub] {msg}...");
                ProgressHandle::NonTty
            }
            ProgressMode::Tty => {
                let style = ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner());
                let bar = ProgressBar::new_spinner()
                    .with_style(style)
                    .with_message(msg.to_string());
                bar.enable_steady_tick(Duration::from_millis(100));
                ProgressHandle::Tty(bar)
            }
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(false, false)
    }
}

pub enum ProgressHandle {
    Tty(ProgressBar),
    NonTty,
    Robot { operation: String },
    Noop,
}

impl ProgressHandle {
    pub fn finish_with_message(&self, msg: &str) {
        match self {
            Self::Tty(bar) => bar.finish_with_message(format!("✓ {msg}")),
            Self::Robot { operation } => {
                ProgressEvent::new("spinner_complete", format!("{operation}: {msg}")).emit();
            }
            Self::NonTty => eprintln!("[skillhub] ✓ {msg}"),
            Self::Noop => {}
        }
    }

    pub fn abandon_with_message(&self, msg: &str) {
        match self {
            Self::Tty(bar) => bar.abandon_with_message(format!("✗ {msg}")),
            Self::Robot { operation } => {
                ProgressEvent::new("spinner_error", format!("{operation}: {msg}")).emit();
            }
            Self::NonTty => eprintln!("[skillhub] ✗ ERROR: {msg}"),
            Self::Noop => {}
        }
    }

    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self, Self::Noop)
    }
}
