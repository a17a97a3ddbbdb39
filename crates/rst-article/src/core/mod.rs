//! Core transformation orchestration.
//!
//! - **Entry points**: [`ArticleTransformer`] and the [`transform_file`] shortcut
//! - **Configuration**: parser and image settings, loadable from TOML/YAML/JSON
//! - **I/O**: document decoding, article lookup, resource sources
//! - **Clock**: the time source used when a document has no date
//!
//! # Example
//!
//! ```rust
//! use rst_article::core::io::MemoryResourceSource;
//! use rst_article::core::transformer::ArticleTransformer;
//!
//! # fn main() -> rst_article::Result<()> {
//! let source = MemoryResourceSource::new().with_entry("files", "notes.txt", b"hi".to_vec());
//! let article = ArticleTransformer::default().transform_source("Hi\n==\n\nThere.\n", &source)?;
//! assert_eq!(article.item_files()[0].original_url(), "files/notes.txt");
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod io;
pub mod transformer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ImageConfig, ParserConfig, SyntaxHighlight, TransformConfig};
pub use io::{FsResourceSource, MemoryResourceSource, ResourceSource, find_article_path, read_document};
pub use transformer::{ArticleTransformer, transform_file};
