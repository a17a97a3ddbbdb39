use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Which sibling directory a resource was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Image,
    File,
}

impl ResourceKind {
    /// Directory name next to the document: `images` or `files`.
    pub const fn dir_name(self) -> &'static str {
        match self {
            ResourceKind::Image => "images",
            ResourceKind::File => "files",
        }
    }
}

/// A binary asset referenced by an article.
///
/// `original_url` is always `"<kind dir>/<basename>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    kind: ResourceKind,
    original_url: String,
    basename: String,
    #[serde(skip)]
    data: Vec<u8>,
}

impl Resource {
    pub fn new(kind: ResourceKind, basename: impl Into<String>, data: Vec<u8>) -> Self {
        let basename = basename.into();
        Self {
            kind,
            original_url: format!("{}/{}", kind.dir_name(), basename),
            basename,
            data,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// The fixed metadata schema read from a document header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleTags {
    /// Header `date`, or the clock's "now" when absent.
    pub date: NaiveDateTime,
    pub modified_date: Option<NaiveDateTime>,
    /// Split on `;` without trimming.
    pub categories: Vec<String>,
    pub series: Option<String>,
}

/// A transformed document, ready for a downstream sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    title: String,
    tags: ArticleTags,
    content: String,
    item_images: Vec<Resource>,
    item_files: Vec<Resource>,
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        tags: ArticleTags,
        content: impl Into<String>,
        item_images: Vec<Resource>,
        item_files: Vec<Resource>,
    ) -> Self {
        Self {
            title: title.into(),
            tags,
            content: content.into(),
            item_images,
            item_files,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn tags(&self) -> &ArticleTags {
        &self.tags
    }

    /// HTML body fragment, without title and header.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn item_images(&self) -> &[Resource] {
        &self.item_images
    }

    pub fn item_files(&self) -> &[Resource] {
        &self.item_files
    }

    pub fn date(&self) -> NaiveDateTime {
        self.tags.date
    }

    pub fn modified_date(&self) -> Option<NaiveDateTime> {
        self.tags.modified_date
    }

    pub fn categories(&self) -> &[String] {
        &self.tags.categories
    }

    pub fn series(&self) -> Option<&str> {
        self.tags.series.as_deref()
    }

    /// JSON record for a downstream sink. Resource bytes are left out.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
