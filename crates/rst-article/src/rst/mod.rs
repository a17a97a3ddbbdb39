//! reStructuredText markup parser and HTML writer.
//!
//! [`parse_document`] turns source text into a [`Document`]: the promoted
//! title and subtitle, the bibliographic header region, and the body. Any
//! system message at or above the configured halt level fails the parse with
//! a Parsing error carrying every fatal message.
//!
//! # Example
//!
//! ```rust
//! use rst_article::core::config::ParserConfig;
//! use rst_article::rst::{parse_document, render_body};
//!
//! # fn main() -> rst_article::Result<()> {
//! let source = "Hello\n=====\n\n:date: 2020-01-01\n\nSome *text*.\n";
//! let config = ParserConfig::default();
//! let document = parse_document(source, &config)?;
//!
//! assert_eq!(document.title_text().as_deref(), Some("Hello"));
//! assert_eq!(render_body(&document, &config), "<p>Some <em>text</em>.</p>\n");
//! # Ok(())
//! # }
//! ```

pub mod html;
mod inline;
mod nodes;
mod parser;
mod reporter;
mod table;
mod transforms;

pub use html::render_body;
pub use nodes::{
    Bibliographic, Block, CodeBlock, DefinitionItem, Document, EnumType, Field, FieldBody, FieldName, Header,
    HeaderEntry, Image, Inline, RefTarget, Section, Table, TableCell, blocks_text, inlines_text,
};
pub use parser::{make_id, parse_document, parse_document_with_registry};
pub use reporter::{Severity, SystemMessage};
