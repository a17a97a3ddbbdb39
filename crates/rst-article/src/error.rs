//! Error types for rst-article.
//!
//! Every failure in a transformation aborts the whole document: callers get a
//! typed `ArticleError`, never a partially populated `Article`.
//!
//! # Error Handling Philosophy
//!
//! **System errors MUST always bubble up unchanged:**
//! - `ArticleError::Io` (from `std::io::Error`) - permission errors, unreadable directories
//! - Never wrap or suppress these
//!
//! **Application errors carry context:**
//! - `Parsing` - structural problems at or above the halt level, bad encoding, missing title
//! - `MetadataFormat` - a date/time header field that cannot be parsed
//! - `ResourceDecode` - an image that cannot be decoded or re-encoded
//! - `NotFound` - the document path does not exist
//!
//! # Example
//!
//! ```rust
//! use rst_article::{ArticleError, Result};
//!
//! fn load(path: &str) -> Result<String> {
//!     let content = std::fs::read_to_string(path)?;
//!
//!     if content.trim().is_empty() {
//!         return Err(ArticleError::validation(format!("Document is empty: {}", path)));
//!     }
//!
//!     Ok(content)
//! }
//! ```
use crate::rst::SystemMessage;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ArticleError`.
pub type Result<T> = std::result::Result<T, ArticleError>;

/// Main error type for all rst-article operations.
#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document does not exist. Raised before any parsing happens.
    #[error("Document not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The document is structurally invalid at or above the configured halt level.
    ///
    /// `messages` holds every system message that reached the halt level.
    #[error("Parsing error: {message}")]
    Parsing {
        message: String,
        messages: Vec<SystemMessage>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid date in field '{field}': {value:?}")]
    MetadataFormat { field: String, value: String },

    #[error("Resource decode error: {message}")]
    ResourceDecode {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Plugin error in '{plugin_name}': {message}")]
    Plugin { message: String, plugin_name: String },

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<serde_json::Error> for ArticleError {
    fn from(err: serde_json::Error) -> Self {
        ArticleError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<image::ImageError> for ArticleError {
    fn from(err: image::ImageError) -> Self {
        ArticleError::ResourceDecode {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl ArticleError {
    error_constructor!(resource_decode, ResourceDecode);
    error_constructor!(validation, Validation);
    error_constructor!(serialization, Serialization);

    /// Create a Parsing error without system messages (encoding problems, missing title).
    pub fn parsing<S: Into<String>>(message: S) -> Self {
        Self::Parsing {
            message: message.into(),
            messages: Vec::new(),
            source: None,
        }
    }

    /// Create a Parsing error with source
    pub fn parsing_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Parsing {
            message: message.into(),
            messages: Vec::new(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a Parsing error from the system messages that reached the halt level.
    pub fn from_messages(messages: Vec<SystemMessage>) -> Self {
        let message = match messages.as_slice() {
            [] => "document rejected".to_string(),
            [only] => only.to_string(),
            [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
        };
        Self::Parsing {
            message,
            messages,
            source: None,
        }
    }

    /// Create a MetadataFormat error for a header field.
    pub fn metadata_format(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::MetadataFormat {
            field: field.into(),
            value: value.into(),
        }
    }

    /// System messages attached to a Parsing error; empty for every other variant.
    pub fn messages(&self) -> &[SystemMessage] {
        match self {
            Self::Parsing { messages, .. } => messages,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rst::Severity;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ArticleError = io_err.into();
        assert!(matches!(err, ArticleError::Io(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_not_found_display() {
        let err = ArticleError::NotFound(PathBuf::from("/posts/missing.rst"));
        assert_eq!(err.to_string(), "Document not found: /posts/missing.rst");
    }

    #[test]
    fn test_parsing_error() {
        let err = ArticleError::parsing("document has no title");
        assert_eq!(err.to_string(), "Parsing error: document has no title");
        assert!(err.messages().is_empty());
    }

    #[test]
    fn test_parsing_error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad utf-8");
        let err = ArticleError::parsing_with_source("invalid encoding", source);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_from_messages_summarises_first() {
        let messages = vec![
            SystemMessage::new(Severity::Error, 3, "Unknown directive type \"foo\"."),
            SystemMessage::new(Severity::Severe, 9, "Title level inconsistent."),
        ];
        let err = ArticleError::from_messages(messages);
        assert_eq!(
            err.to_string(),
            "Parsing error: line 3: (ERROR/3) Unknown directive type \"foo\". (and 1 more)"
        );
        assert_eq!(err.messages().len(), 2);
    }

    #[test]
    fn test_metadata_format_error() {
        let err = ArticleError::metadata_format("date", "not a date");
        assert_eq!(err.to_string(), "Invalid date in field 'date': \"not a date\"");
    }

    #[test]
    fn test_resource_decode_error_with_source() {
        let source = std::io::Error::other("truncated");
        let err = ArticleError::resource_decode_with_source("images/a.png", source);
        assert_eq!(err.to_string(), "Resource decode error: images/a.png");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ArticleError = json_err.into();
        assert!(matches!(err, ArticleError::Serialization { .. }));
    }

    #[test]
    fn test_plugin_error() {
        let err = ArticleError::Plugin {
            message: "name cannot be empty".to_string(),
            plugin_name: String::new(),
        };
        assert_eq!(err.to_string(), "Plugin error in '': name cannot be empty");
    }

    #[test]
    fn test_lock_poisoned_error() {
        let err = ArticleError::LockPoisoned("directive registry".to_string());
        assert_eq!(err.to_string(), "Lock poisoned: directive registry");
    }
}
