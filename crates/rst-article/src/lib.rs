//! rst-article - reStructuredText to Article Transformation
//!
//! Turns a reStructuredText document with a bibliographic header into an
//! [`Article`]: a plain-text title, typed tags (`date`, `modified_date`,
//! `categories`, `series`), an HTML body fragment, and the images and files
//! found in the `images/` and `files/` directories next to the document.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rst_article::transform_file;
//!
//! # fn main() -> rst_article::Result<()> {
//! let article = transform_file("posts/hello/hello.rst")?;
//! println!("{} - {}", article.title(), article.date());
//! println!("{}", article.content());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Markup Parser** (`rst`): document tree, title and header promotion, HTML writer
//! - **Directives** (`directives`): block directive plugins and their registry
//! - **Metadata** (`metadata`): the tag schema read from the header
//! - **Resources** (`resources`): image re-encoding and file pass-through
//! - **Core** (`core`): configuration, I/O, clock and the [`ArticleTransformer`]
//!
//! Every failure aborts the document with an [`ArticleError`]; there are no
//! partial articles.

#![deny(unsafe_code)]

pub mod core;
pub mod directives;
pub mod error;
pub mod metadata;
pub mod resources;
pub mod rst;
pub mod types;

pub use error::{ArticleError, Result};
pub use types::*;

pub use core::clock::{Clock, FixedClock, SystemClock};
pub use core::config::{ImageConfig, ParserConfig, SyntaxHighlight, TransformConfig};
pub use core::io::{FsResourceSource, MemoryResourceSource, ResourceSource, find_article_path};
pub use core::transformer::{ArticleTransformer, transform_file};

pub use metadata::{extract_tags, parse_datetime};
pub use rst::{Severity, SystemMessage};
pub use resources::{collect_files, collect_images};

pub use directives::{get_directive_registry, initialize};
