//! Pipeline progress logging.
//!
//! Progress messages go through `tracing` so the CLI decides how (and
//! whether) they are shown. The helpers keep the call sites short and give
//! "success" messages their own marker on top of the `info` level.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter, e.g. `ENROLCLEAN_LOG=debug`.
pub const LOG_ENV: &str = "ENROLCLEAN_LOG";

static INIT: Once = Once::new();

/// Log level for progress messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Optional indentation level (for nested logs)
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Message with its indentation and level marker applied.
    pub fn display_message(&self) -> String {
        let marker = match self.level {
            LogLevel::Success => "✓ ",
            _ => "",
        };
        format!("{}{}{}", "   ".repeat(self.indent as usize), marker, self.message)
    }

    /// Emit this entry as a tracing event.
    pub fn emit(&self) {
        let message = self.display_message();
        match self.level {
            LogLevel::Info | LogLevel::Success => tracing::info!("{}", message),
            LogLevel::Warning => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }
    }
}

/// Install the global fmt subscriber.
///
/// Reads the filter from [`LOG_ENV`], falling back to `default_filter`.
/// Safe to call more than once; only the first call installs anything.
pub fn init_tracing(default_filter: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(filter)
            .try_init();
    });
}

/// Convenient logging functions
pub fn log_info(msg: impl Into<String>) {
    LogEntry::info(msg).emit();
}

pub fn log_success(msg: impl Into<String>) {
    LogEntry::success(msg).emit();
}

pub fn log_warning(msg: impl Into<String>) {
    LogEntry::warning(msg).emit();
}

pub fn log_error(msg: impl Into<String>) {
    LogEntry::error(msg).emit();
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LogEntry::info(msg).with_indent(indent).emit();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_message_marks_success_and_indents() {
        assert_eq!(LogEntry::success("done").display_message(), "✓ done");
        assert_eq!(LogEntry::info("rows").with_indent(1).display_message(), "   rows");
    }

    #[test]
    fn test_log_helpers_without_subscriber() {
        // No subscriber installed: events are dropped, nothing panics.
        log_info("info");
        log_warning("warning");
        log_error("error");
        log_success("success");
        log_info_indent("nested", 2);
    }
}
