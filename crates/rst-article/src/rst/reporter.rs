//! System messages and the halt-level reporter.

use crate::{ArticleError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a system message, ordered from least to most serious.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Severe,
}

impl Severity {
    /// Numeric level (0 = debug .. 4 = severe).
    pub const fn level(self) -> u8 {
        match self {
            Severity::Debug => 0,
            Severity::Info => 1,
            Severity::Warning => 2,
            Severity::Error => 3,
            Severity::Severe => 4,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Severe => "SEVERE",
        }
    }
}

/// A diagnostic produced while parsing a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMessage {
    pub severity: Severity,
    /// 1-based source line the message refers to.
    pub line: usize,
    pub message: String,
}

impl SystemMessage {
    pub fn new(severity: Severity, line: usize, message: impl Into<String>) -> Self {
        Self {
            severity,
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for SystemMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: ({}/{}) {}",
            self.line,
            self.severity.as_str(),
            self.severity.level(),
            self.message
        )
    }
}

/// Collects system messages and decides whether the document survives.
#[derive(Debug)]
pub(crate) struct Reporter {
    halt_level: Severity,
    messages: Vec<SystemMessage>,
}

impl Reporter {
    pub(crate) fn new(halt_level: Severity) -> Self {
        Self {
            halt_level,
            messages: Vec::new(),
        }
    }

    pub(crate) fn report(&mut self, severity: Severity, line: usize, message: impl Into<String>) {
        let message = SystemMessage::new(severity, line, message);
        tracing::trace!(%message, "system message");
        self.messages.push(message);
    }

    pub(crate) fn warning(&mut self, line: usize, message: impl Into<String>) {
        self.report(Severity::Warning, line, message);
    }

    pub(crate) fn error(&mut self, line: usize, message: impl Into<String>) {
        self.report(Severity::Error, line, message);
    }

    pub(crate) fn severe(&mut self, line: usize, message: impl Into<String>) {
        self.report(Severity::Severe, line, message);
    }

    /// Fail with every message at or above the halt level; swallow the rest.
    pub(crate) fn finish(self) -> Result<()> {
        let (fatal, tolerated): (Vec<_>, Vec<_>) = self
            .messages
            .into_iter()
            .partition(|message| message.severity >= self.halt_level);

        for message in &tolerated {
            tracing::debug!(%message, "ignoring system message below halt level");
        }

        if fatal.is_empty() {
            Ok(())
        } else {
            Err(ArticleError::from_messages(fatal))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Severe > Severity::Error);
        assert_eq!(Severity::Error.level(), 3);
    }

    #[test]
    fn test_message_display() {
        let message = SystemMessage::new(Severity::Warning, 4, "Title underline too short.");
        assert_eq!(message.to_string(), "line 4: (WARNING/2) Title underline too short.");
    }

    #[test]
    fn test_finish_tolerates_warnings() {
        let mut reporter = Reporter::new(Severity::Error);
        reporter.warning(1, "Inline emphasis start-string without end-string.");
        reporter.report(Severity::Info, 2, "informational");
        assert!(reporter.finish().is_ok());
    }

    #[test]
    fn test_finish_fails_at_halt_level() {
        let mut reporter = Reporter::new(Severity::Error);
        reporter.warning(1, "tolerated");
        reporter.error(5, "Unknown directive type \"foo\".");
        reporter.severe(9, "Title level inconsistent.");

        let err = reporter.finish().unwrap_err();
        let messages = err.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].line, 5);
        assert_eq!(messages[1].severity, Severity::Severe);
    }

    #[test]
    fn test_severe_halt_level_tolerates_errors() {
        let mut reporter = Reporter::new(Severity::Severe);
        reporter.error(5, "Unknown directive type \"foo\".");
        assert!(reporter.finish().is_ok());
    }

    #[test]
    fn test_severity_deserializes_lowercase() {
        let severity: Severity = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(severity, Severity::Warning);
    }
}
