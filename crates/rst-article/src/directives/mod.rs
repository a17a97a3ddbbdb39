//! Block directive plugins.
//!
//! A directive is the `.. name:: arguments` construct of reStructuredText. The
//! parser splits the directive block into arguments, options and content
//! according to the directive's declared shape, then hands an
//! [`DirectiveInvocation`] to the registered [`Directive`] which returns the
//! body elements to insert.
//!
//! Built-in directives (`image`, `code`, `raw`, admonitions) are always
//! available. The extension directives (`youtube`, `sourcecode`/`code-block`)
//! are registered by [`initialize`], which is idempotent and safe to call from
//! several threads at once.
//!
//! # Example
//!
//! ```rust
//! use rst_article::directives::{get_directive_registry, initialize};
//!
//! # fn main() -> rst_article::Result<()> {
//! initialize()?;
//! initialize()?;
//!
//! let registry = get_directive_registry();
//! let registry = registry.read().unwrap();
//! assert!(registry.get("youtube").is_some());
//! # Ok(())
//! # }
//! ```

mod builtin;
pub(crate) mod highlight;
pub mod registry;
mod sourcecode;
mod youtube;

use crate::Result;
use crate::core::config::ParserConfig;
use crate::rst::{Block, Severity};
use indexmap::IndexMap;

pub use builtin::{AdmonitionDirective, CodeDirective, GenericAdmonitionDirective, ImageDirective, RawDirective};
pub use registry::{DirectiveRegistry, get_directive_registry, initialize, is_initialized};
pub use sourcecode::SourceCodeDirective;
pub use youtube::YoutubeDirective;

/// Lifecycle and identity shared by every plugin.
pub trait Plugin: Send + Sync {
    /// Unique plugin name, used as the registry key.
    fn name(&self) -> &str;

    fn version(&self) -> String;

    /// Called once when the plugin is registered.
    fn initialize(&self) -> Result<()>;

    /// Called when the plugin is removed from the registry.
    fn shutdown(&self) -> Result<()>;
}

/// Positional arguments a directive accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArgumentSpec {
    pub required: usize,
    pub optional: usize,
    /// Whether the last argument may contain whitespace.
    pub final_whitespace: bool,
}

impl ArgumentSpec {
    pub const NONE: ArgumentSpec = ArgumentSpec {
        required: 0,
        optional: 0,
        final_whitespace: false,
    };

    pub const fn takes_arguments(&self) -> bool {
        self.required + self.optional > 0
    }
}

/// A parsed directive block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveInvocation {
    /// Directive name as written, lower-cased.
    pub name: String,
    pub arguments: Vec<String>,
    /// Options in source order; flag options map to an empty string.
    pub options: IndexMap<String, String>,
    pub content: Vec<String>,
    /// Line of the `.. name::` marker.
    pub line: usize,
    /// Line of the first content line.
    pub content_line: usize,
}

impl DirectiveInvocation {
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    /// Content lines joined with newlines.
    pub fn content_text(&self) -> String {
        self.content.join("\n")
    }
}

/// Failure of a single directive. Becomes a system message at `severity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveError {
    pub severity: Severity,
    pub message: String,
}

impl DirectiveError {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Parser services available to a running directive.
pub trait DirectiveContext {
    fn config(&self) -> &ParserConfig;

    /// Parse `lines` as nested body elements. `first_line` numbers the first line.
    fn parse_nested(&mut self, lines: &[String], first_line: usize) -> Vec<Block>;

    fn report(&mut self, severity: Severity, line: usize, message: String);
}

/// A block directive.
pub trait Directive: Plugin {
    /// Every name the directive answers to. The first is the canonical one.
    fn names(&self) -> &[&'static str];

    fn arguments(&self) -> ArgumentSpec {
        ArgumentSpec::NONE
    }

    /// Accepted option names.
    fn option_names(&self) -> &[&'static str] {
        &[]
    }

    fn has_content(&self) -> bool {
        false
    }

    fn run(
        &self,
        invocation: &DirectiveInvocation,
        context: &mut dyn DirectiveContext,
    ) -> std::result::Result<Vec<Block>, DirectiveError>;
}

/// Parse a non-negative integer option such as `width`.
pub(crate) fn nonnegative_int(invocation: &DirectiveInvocation, name: &str) -> std::result::Result<Option<u32>, DirectiveError> {
    match invocation.option(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<u32>().map(Some).map_err(|_| {
            DirectiveError::error(format!(
                "invalid option value: (option: \"{}\"; value: {:?})\nnegative or non-integer value",
                name, raw
            ))
        }),
    }
}

/// Check an option against a fixed set of choices.
pub(crate) fn choice<'a>(
    invocation: &'a DirectiveInvocation,
    name: &str,
    choices: &[&str],
) -> std::result::Result<Option<&'a str>, DirectiveError> {
    match invocation.option(name) {
        None => Ok(None),
        Some(raw) => {
            let value = raw.trim();
            if choices.contains(&value.to_lowercase().as_str()) {
                Ok(Some(value))
            } else {
                Err(DirectiveError::error(format!(
                    "invalid option value: (option: \"{}\"; value: {:?})\n\"{}\" unknown; choose from {}",
                    name,
                    raw,
                    value,
                    choices.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ")
                )))
            }
        }
    }
}

/// Reject a flag option that was given a value.
pub(crate) fn flag(invocation: &DirectiveInvocation, name: &str) -> std::result::Result<bool, DirectiveError> {
    match invocation.option(name) {
        None => Ok(false),
        Some(value) if value.trim().is_empty() => Ok(true),
        Some(value) => Err(DirectiveError::error(format!(
            "invalid option value: (option: \"{}\"; value: {:?})\nno argument is allowed",
            name, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(options: &[(&str, &str)]) -> DirectiveInvocation {
        DirectiveInvocation {
            name: "youtube".to_string(),
            arguments: vec!["abc".to_string()],
            options: options.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            content: Vec::new(),
            line: 1,
            content_line: 2,
        }
    }

    #[test]
    fn test_nonnegative_int() {
        let inv = invocation(&[("width", "320")]);
        assert_eq!(nonnegative_int(&inv, "width").unwrap(), Some(320));
        assert_eq!(nonnegative_int(&inv, "height").unwrap(), None);

        let bad = invocation(&[("width", "-5")]);
        let err = nonnegative_int(&bad, "width").unwrap_err();
        assert_eq!(err.severity, Severity::Error);
        assert!(err.message.contains("non-integer"));
    }

    #[test]
    fn test_choice() {
        let inv = invocation(&[("align", "Center")]);
        assert_eq!(choice(&inv, "align", &["left", "center", "right"]).unwrap(), Some("Center"));

        let bad = invocation(&[("align", "middle")]);
        assert!(choice(&bad, "align", &["left", "center", "right"]).is_err());
    }

    #[test]
    fn test_flag() {
        assert!(flag(&invocation(&[("linenos", "")]), "linenos").unwrap());
        assert!(!flag(&invocation(&[]), "linenos").unwrap());
        assert!(flag(&invocation(&[("linenos", "yes")]), "linenos").is_err());
    }

    #[test]
    fn test_argument_spec() {
        assert!(!ArgumentSpec::NONE.takes_arguments());
        let shape = ArgumentSpec {
            required: 1,
            ..ArgumentSpec::default()
        };
        assert!(shape.takes_arguments());
    }
}
