//! Article assembly.
//!
//! Parses the document once, then derives the title, tags and content from
//! the same tree and collects the sibling resources.

use crate::core::clock::{Clock, SystemClock};
use crate::core::config::TransformConfig;
use crate::core::io::{FsResourceSource, ResourceSource, read_document};
use crate::metadata::extract_tags;
use crate::resources::{collect_files, collect_images};
use crate::rst::{parse_document, render_body};
use crate::types::Article;
use crate::{ArticleError, Result, directives};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Turns documents into [`Article`]s.
///
/// # Example
///
/// ```rust,no_run
/// use rst_article::ArticleTransformer;
///
/// # fn main() -> rst_article::Result<()> {
/// let transformer = ArticleTransformer::default();
/// let article = transformer.transform_file("posts/hello/hello.rst")?;
/// println!("{} ({} images)", article.title(), article.item_images().len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ArticleTransformer {
    config: TransformConfig,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ArticleTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArticleTransformer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for ArticleTransformer {
    fn default() -> Self {
        Self::new(TransformConfig::default())
    }
}

impl ArticleTransformer {
    pub fn new(config: TransformConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `clock` for documents without a `date`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Transform the document at `path`, collecting resources from its directory.
    ///
    /// # Errors
    ///
    /// - `ArticleError::NotFound` if `path` does not exist (checked before parsing)
    /// - `ArticleError::Parsing` for fatal markup problems or a missing title
    /// - `ArticleError::MetadataFormat` for unparsable header dates
    /// - `ArticleError::ResourceDecode` for images that cannot be re-encoded
    /// - `ArticleError::Io` for other I/O failures
    pub fn transform_file(&self, path: impl AsRef<Path>) -> Result<Article> {
        let path = path.as_ref();
        let text = read_document(path)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        tracing::debug!(path = %path.display(), "transforming document");
        self.transform_source(&text, &FsResourceSource::new(dir))
    }

    /// Transform already-decoded text, collecting resources from `resources`.
    ///
    /// The configuration is validated first, so hand-built configs get the
    /// same range checks as loaded ones (`ArticleError::Validation`).
    pub fn transform_source(&self, text: &str, resources: &dyn ResourceSource) -> Result<Article> {
        self.config.validate()?;
        directives::initialize()?;

        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let document = parse_document(text, &self.config.parser)?;
        let title = document
            .title_text()
            .ok_or_else(|| ArticleError::parsing("document has no title"))?;
        let tags = extract_tags(&document, self.clock.as_ref())?;
        let content = render_body(&document, &self.config.parser);

        let item_images = collect_images(resources, &self.config.images)?;
        let item_files = collect_files(resources)?;

        tracing::debug!(
            title = %title,
            images = item_images.len(),
            files = item_files.len(),
            "article assembled"
        );
        Ok(Article::new(title, tags, content, item_images, item_files))
    }
}

/// Transform `path` with the default configuration and the system clock.
pub fn transform_file(path: impl AsRef<Path>) -> Result<Article> {
    ArticleTransformer::default().transform_file(path)
}
