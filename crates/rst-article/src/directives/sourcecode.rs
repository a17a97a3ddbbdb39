//! `.. sourcecode:: language` / `.. code-block:: language`.
//!
//! Renders a `<div class="highlight">` block with short token classes,
//! independent of the parser's `syntax_highlight` setting.

use super::highlight::{highlight, is_supported};
use super::{ArgumentSpec, Directive, DirectiveContext, DirectiveError, DirectiveInvocation, Plugin, flag};
use crate::Result;
use crate::core::config::SyntaxHighlight;
use crate::rst::{Block, Severity};

pub struct SourceCodeDirective;

impl Plugin for SourceCodeDirective {
    fn name(&self) -> &str {
        "sourcecode"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

impl Directive for SourceCodeDirective {
    fn names(&self) -> &[&'static str] {
        &["sourcecode", "code-block"]
    }

    fn arguments(&self) -> ArgumentSpec {
        ArgumentSpec {
            required: 0,
            optional: 1,
            final_whitespace: false,
        }
    }

    fn option_names(&self) -> &[&'static str] {
        &["linenos"]
    }

    fn has_content(&self) -> bool {
        true
    }

    fn run(
        &self,
        invocation: &DirectiveInvocation,
        context: &mut dyn DirectiveContext,
    ) -> std::result::Result<Vec<Block>, DirectiveError> {
        if invocation.content.is_empty() {
            return Err(DirectiveError::warning(format!(
                "Content block expected for the \"{}\" directive; none found.",
                invocation.name
            )));
        }
        let linenos = flag(invocation, "linenos")?;
        let language = invocation.arguments.first().map(String::as_str);
        if let Some(name) = language
            && !is_supported(name)
        {
            context.report(
                Severity::Info,
                invocation.line,
                format!("No lexer for language \"{}\"; rendering as plain text.", name),
            );
        }

        let code = highlight(&invocation.content_text(), language, SyntaxHighlight::Short);
        let body = if linenos {
            code.split('\n')
                .enumerate()
                .map(|(index, line)| format!("<span class=\"lineno\">{:>3} </span>{}", index + 1, line))
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            code
        };

        Ok(vec![Block::Raw(format!("<div class=\"highlight\"><pre>{}\n</pre></div>", body))])
    }
}
