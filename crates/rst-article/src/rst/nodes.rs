//! Document tree.
//!
//! The tree is a closed set of variants. Header entries distinguish built-in
//! bibliographic fields from generic `:name: value` fields at the type level, so
//! metadata lookups match exhaustively instead of comparing tag strings.

/// Inline content of paragraphs, titles and field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Emphasis(String),
    Strong(String),
    Literal(String),
    /// Default interpreted text (`` `title` ``), rendered as `<cite>`.
    TitleReference(String),
    Subscript(String),
    Superscript(String),
    Reference { text: String, target: RefTarget },
}

/// Where a reference points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    /// Resolved URI (external) or `#id` (internal).
    Uri(String),
    /// Named reference waiting for target resolution.
    Named { name: String, line: usize },
    /// Named reference whose target does not exist.
    Unresolved(String),
}

impl Inline {
    pub fn astext(&self) -> &str {
        match self {
            Inline::Text(text)
            | Inline::Emphasis(text)
            | Inline::Strong(text)
            | Inline::Literal(text)
            | Inline::TitleReference(text)
            | Inline::Subscript(text)
            | Inline::Superscript(text) => text,
            Inline::Reference { text, .. } => text,
        }
    }
}

/// Plain text of a run of inline nodes.
pub fn inlines_text(inlines: &[Inline]) -> String {
    inlines.iter().map(Inline::astext).collect()
}

/// Numbering style of an enumerated list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumType {
    Arabic,
    LowerAlpha,
    UpperAlpha,
    LowerRoman,
    UpperRoman,
}

impl EnumType {
    pub const fn class(self) -> &'static str {
        match self {
            EnumType::Arabic => "arabic",
            EnumType::LowerAlpha => "loweralpha",
            EnumType::UpperAlpha => "upperalpha",
            EnumType::LowerRoman => "lowerroman",
            EnumType::UpperRoman => "upperroman",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: String,
    pub title: Vec<Inline>,
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionItem {
    pub term: Vec<Inline>,
    pub definition: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub uri: String,
    pub alt: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub align: Option<String>,
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub code: String,
    pub number_lines: Option<usize>,
}

/// Grid table entry. `morerows`/`morecols` count the extra rows and columns it spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    pub morerows: usize,
    pub morecols: usize,
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Column widths in characters, as drawn in the source.
    pub colwidths: Vec<usize>,
    pub head: Vec<Vec<TableCell>>,
    pub body: Vec<Vec<TableCell>>,
}

/// Body element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Section(Section),
    Paragraph(Vec<Inline>),
    LiteralBlock(String),
    CodeBlock(CodeBlock),
    BlockQuote(Vec<Block>),
    BulletList(Vec<Vec<Block>>),
    EnumeratedList {
        enumtype: EnumType,
        start: usize,
        items: Vec<Vec<Block>>,
    },
    DefinitionList(Vec<DefinitionItem>),
    FieldList(Vec<Field>),
    Table(Table),
    Admonition {
        class: String,
        title: String,
        children: Vec<Block>,
    },
    Topic {
        class: String,
        title: String,
        children: Vec<Block>,
    },
    Image(Image),
    /// Pre-rendered HTML from a directive.
    Raw(String),
    Comment(String),
    Transition,
}

impl Block {
    /// Plain text of the element, paragraphs separated by blank lines.
    pub fn astext(&self) -> String {
        match self {
            Block::Paragraph(inlines) => inlines_text(inlines),
            Block::LiteralBlock(text) | Block::Comment(text) | Block::Raw(text) => text.clone(),
            Block::CodeBlock(code) => code.code.clone(),
            Block::Section(section) => {
                let mut parts = vec![inlines_text(&section.title)];
                parts.extend(section.children.iter().map(Block::astext));
                parts.join("\n\n")
            }
            Block::BlockQuote(children)
            | Block::Admonition { children, .. }
            | Block::Topic { children, .. } => blocks_text(children),
            Block::BulletList(items) | Block::EnumeratedList { items, .. } => items
                .iter()
                .map(|item| blocks_text(item))
                .collect::<Vec<_>>()
                .join("\n\n"),
            Block::DefinitionList(items) => items
                .iter()
                .map(|item| format!("{}\n\n{}", inlines_text(&item.term), blocks_text(&item.definition)))
                .collect::<Vec<_>>()
                .join("\n\n"),
            Block::FieldList(fields) => fields
                .iter()
                .map(|field| format!("{}\n\n{}", field.name.astext(), field.body.astext()))
                .collect::<Vec<_>>()
                .join("\n\n"),
            Block::Table(table) => table
                .head
                .iter()
                .chain(&table.body)
                .flatten()
                .map(|cell| blocks_text(&cell.children))
                .collect::<Vec<_>>()
                .join("\n\n"),
            Block::Image(image) => image.alt.clone().unwrap_or_default(),
            Block::Transition => String::new(),
        }
    }
}

pub fn blocks_text(blocks: &[Block]) -> String {
    blocks.iter().map(Block::astext).collect::<Vec<_>>().join("\n\n")
}

/// Name half of a generic field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldName(pub Vec<Inline>);

impl FieldName {
    pub fn astext(&self) -> String {
        inlines_text(&self.0)
    }
}

/// Body half of a generic field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldBody(pub Vec<Block>);

impl FieldBody {
    pub fn astext(&self) -> String {
        blocks_text(&self.0)
    }
}

/// A `:name: body` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: FieldName,
    pub body: FieldBody,
    /// Source line of the field marker.
    pub line: usize,
}

/// Bibliographic fields the header recognises natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bibliographic {
    Author,
    Authors,
    Organization,
    Address,
    Contact,
    Version,
    Revision,
    Status,
    Date,
    Copyright,
}

impl Bibliographic {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_lowercase().as_str() {
            "author" => Bibliographic::Author,
            "authors" => Bibliographic::Authors,
            "organization" => Bibliographic::Organization,
            "address" => Bibliographic::Address,
            "contact" => Bibliographic::Contact,
            "version" => Bibliographic::Version,
            "revision" => Bibliographic::Revision,
            "status" => Bibliographic::Status,
            "date" => Bibliographic::Date,
            "copyright" => Bibliographic::Copyright,
            _ => return None,
        })
    }

    pub const fn tag_name(self) -> &'static str {
        match self {
            Bibliographic::Author => "author",
            Bibliographic::Authors => "authors",
            Bibliographic::Organization => "organization",
            Bibliographic::Address => "address",
            Bibliographic::Contact => "contact",
            Bibliographic::Version => "version",
            Bibliographic::Revision => "revision",
            Bibliographic::Status => "status",
            Bibliographic::Date => "date",
            Bibliographic::Copyright => "copyright",
        }
    }

    /// Human label used when rendering.
    pub const fn label(self) -> &'static str {
        match self {
            Bibliographic::Author => "Author",
            Bibliographic::Authors => "Authors",
            Bibliographic::Organization => "Organization",
            Bibliographic::Address => "Address",
            Bibliographic::Contact => "Contact",
            Bibliographic::Version => "Version",
            Bibliographic::Revision => "Revision",
            Bibliographic::Status => "Status",
            Bibliographic::Date => "Date",
            Bibliographic::Copyright => "Copyright",
        }
    }
}

/// One child of the bibliographic header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderEntry {
    Builtin { kind: Bibliographic, body: Vec<Inline> },
    Field(Field),
}

impl HeaderEntry {
    /// Structural tag name: the bibliographic name, or `"field"`.
    pub fn tag_name(&self) -> &'static str {
        match self {
            HeaderEntry::Builtin { kind, .. } => kind.tag_name(),
            HeaderEntry::Field(_) => "field",
        }
    }

    pub fn astext(&self) -> String {
        match self {
            HeaderEntry::Builtin { body, .. } => inlines_text(body),
            HeaderEntry::Field(field) => format!("{}\n\n{}", field.name.astext(), field.body.astext()),
        }
    }
}

/// The bibliographic header region.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub entries: Vec<HeaderEntry>,
}

/// A parsed document with its title, header and body separated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub title: Option<Vec<Inline>>,
    pub subtitle: Option<Vec<Inline>>,
    pub docinfo: Option<Header>,
    pub body: Vec<Block>,
}

impl Document {
    /// Plain-text document title, if one was promoted.
    pub fn title_text(&self) -> Option<String> {
        self.title.as_deref().map(inlines_text)
    }

    pub fn subtitle_text(&self) -> Option<String> {
        self.subtitle.as_deref().map(inlines_text)
    }

    /// Every header region in document order.
    pub fn headers(&self) -> impl Iterator<Item = &Header> {
        self.docinfo.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(text: &str) -> Block {
        Block::Paragraph(vec![Inline::Text(text.to_string())])
    }

    #[test]
    fn test_header_entry_tag_names() {
        let date = HeaderEntry::Builtin {
            kind: Bibliographic::Date,
            body: vec![Inline::Text("2020-01-01".to_string())],
        };
        let field = HeaderEntry::Field(Field {
            name: FieldName(vec![Inline::Text("series".to_string())]),
            body: FieldBody(vec![para("rust")]),
            line: 3,
        });
        assert_eq!(date.tag_name(), "date");
        assert_eq!(field.tag_name(), "field");
        assert_eq!(date.astext(), "2020-01-01");
    }

    #[test]
    fn test_bibliographic_from_name_is_case_insensitive() {
        assert_eq!(Bibliographic::from_name("Date"), Some(Bibliographic::Date));
        assert_eq!(Bibliographic::from_name("modified_date"), None);
    }

    #[test]
    fn test_field_body_text_joins_paragraphs() {
        let body = FieldBody(vec![para("one"), para("two")]);
        assert_eq!(body.astext(), "one\n\ntwo");
    }

    #[test]
    fn test_inline_text_flattens_markup() {
        let inlines = vec![
            Inline::Text("a ".to_string()),
            Inline::Emphasis("b".to_string()),
            Inline::Reference {
                text: " c".to_string(),
                target: RefTarget::Uri("http://example.com".to_string()),
            },
        ];
        assert_eq!(inlines_text(&inlines), "a b c");
    }
}
