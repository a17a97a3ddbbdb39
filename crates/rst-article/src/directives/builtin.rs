//! Directives that are always available.

use super::{ArgumentSpec, Directive, DirectiveContext, DirectiveError, DirectiveInvocation, Plugin, choice, nonnegative_int};
use crate::Result;
use crate::rst::{Block, CodeBlock, Image, make_id};

macro_rules! builtin_plugin {
    ($type:ty, $name:literal) => {
        impl Plugin for $type {
            fn name(&self) -> &str {
                $name
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
    };
}

const ALIGN_VALUES: &[&str] = &["top", "middle", "bottom", "left", "center", "right"];

/// `.. image:: uri`
pub struct ImageDirective;

builtin_plugin!(ImageDirective, "image");

impl Directive for ImageDirective {
    fn names(&self) -> &[&'static str] {
        &["image"]
    }

    fn arguments(&self) -> ArgumentSpec {
        ArgumentSpec {
            required: 1,
            optional: 0,
            final_whitespace: true,
        }
    }

    fn option_names(&self) -> &[&'static str] {
        &["alt", "height", "width", "scale", "align", "target", "class", "name"]
    }

    fn run(
        &self,
        invocation: &DirectiveInvocation,
        _context: &mut dyn DirectiveContext,
    ) -> std::result::Result<Vec<Block>, DirectiveError> {
        // Whitespace inside a URI argument is dropped.
        let uri: String = invocation.arguments.concat().split_whitespace().collect();
        let align = choice(invocation, "align", ALIGN_VALUES)?.map(str::to_lowercase);
        Ok(vec![Block::Image(Image {
            uri,
            alt: invocation.option("alt").map(str::to_string),
            width: invocation.option("width").map(|w| w.trim().to_string()),
            height: invocation.option("height").map(|h| h.trim().to_string()),
            align,
            target: invocation
                .option("target")
                .map(|t| t.split_whitespace().collect()),
        })])
    }
}

/// `.. code:: [language]` with optional `:number-lines: [start]`.
pub struct CodeDirective;

builtin_plugin!(CodeDirective, "code");

impl Directive for CodeDirective {
    fn names(&self) -> &[&'static str] {
        &["code"]
    }

    fn arguments(&self) -> ArgumentSpec {
        ArgumentSpec {
            required: 0,
            optional: 1,
            final_whitespace: false,
        }
    }

    fn option_names(&self) -> &[&'static str] {
        &["number-lines", "class", "name"]
    }

    fn has_content(&self) -> bool {
        true
    }

    fn run(
        &self,
        invocation: &DirectiveInvocation,
        _context: &mut dyn DirectiveContext,
    ) -> std::result::Result<Vec<Block>, DirectiveError> {
        if invocation.content.is_empty() {
            return Err(DirectiveError::warning(format!(
                "Content block expected for the \"{}\" directive; none found.",
                invocation.name
            )));
        }

        let number_lines = match invocation.option("number-lines") {
            None => None,
            Some(value) if value.trim().is_empty() => Some(1),
            Some(_) => nonnegative_int(invocation, "number-lines")?.map(|start| start as usize),
        };

        Ok(vec![Block::CodeBlock(CodeBlock {
            language: invocation.arguments.first().cloned(),
            code: invocation.content_text(),
            number_lines,
        })])
    }
}

/// `.. raw:: html` passes its content through untouched when the format is HTML.
pub struct RawDirective;

builtin_plugin!(RawDirective, "raw");

impl Directive for RawDirective {
    fn names(&self) -> &[&'static str] {
        &["raw"]
    }

    fn arguments(&self) -> ArgumentSpec {
        ArgumentSpec {
            required: 1,
            optional: 0,
            final_whitespace: true,
        }
    }

    fn option_names(&self) -> &[&'static str] {
        &["class"]
    }

    fn has_content(&self) -> bool {
        true
    }

    fn run(
        &self,
        invocation: &DirectiveInvocation,
        _context: &mut dyn DirectiveContext,
    ) -> std::result::Result<Vec<Block>, DirectiveError> {
        if invocation.content.is_empty() {
            return Err(DirectiveError::error(
                "The \"raw\" directive requires content; none supplied.",
            ));
        }
        let formats = invocation.arguments.join(" ").to_lowercase();
        if formats.split_whitespace().any(|format| format == "html") {
            Ok(vec![Block::Raw(invocation.content_text())])
        } else {
            Ok(Vec::new())
        }
    }
}

const ADMONITIONS: &[&str] = &[
    "attention", "caution", "danger", "error", "hint", "important", "note", "tip", "warning",
];

/// Specific admonitions: `.. note::`, `.. warning::` and friends.
pub struct AdmonitionDirective;

builtin_plugin!(AdmonitionDirective, "note");

fn admonition_body(
    invocation: &DirectiveInvocation,
    context: &mut dyn DirectiveContext,
) -> std::result::Result<Vec<Block>, DirectiveError> {
    if invocation.content.is_empty() {
        return Err(DirectiveError::error(format!(
            "The \"{}\" admonition is empty; content required.",
            invocation.name
        )));
    }
    Ok(context.parse_nested(&invocation.content, invocation.content_line))
}

impl Directive for AdmonitionDirective {
    fn names(&self) -> &[&'static str] {
        ADMONITIONS
    }

    fn option_names(&self) -> &[&'static str] {
        &["class", "name"]
    }

    fn has_content(&self) -> bool {
        true
    }

    fn run(
        &self,
        invocation: &DirectiveInvocation,
        context: &mut dyn DirectiveContext,
    ) -> std::result::Result<Vec<Block>, DirectiveError> {
        let children = admonition_body(invocation, context)?;
        let mut title = invocation.name.clone();
        if let Some(first) = title.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        Ok(vec![Block::Admonition {
            class: invocation.name.clone(),
            title,
            children,
        }])
    }
}

/// `.. admonition:: Custom title`
pub struct GenericAdmonitionDirective;

builtin_plugin!(GenericAdmonitionDirective, "admonition");

impl Directive for GenericAdmonitionDirective {
    fn names(&self) -> &[&'static str] {
        &["admonition"]
    }

    fn arguments(&self) -> ArgumentSpec {
        ArgumentSpec {
            required: 1,
            optional: 0,
            final_whitespace: true,
        }
    }

    fn option_names(&self) -> &[&'static str] {
        &["class", "name"]
    }

    fn has_content(&self) -> bool {
        true
    }

    fn run(
        &self,
        invocation: &DirectiveInvocation,
        context: &mut dyn DirectiveContext,
    ) -> std::result::Result<Vec<Block>, DirectiveError> {
        let children = admonition_body(invocation, context)?;
        let title = invocation.arguments.join(" ");
        Ok(vec![Block::Admonition {
            class: format!("admonition-{}", make_id(&title)),
            title,
            children,
        }])
    }
}
