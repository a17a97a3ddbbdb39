//! HTML body writer.
//!
//! Emits an html4css1-style fragment for the document body only: the title,
//! subtitle and bibliographic header are never part of the output, and no
//! stylesheet is embedded.

use super::nodes::{
    Block, CodeBlock, DefinitionItem, Document, Field, Image, Inline, RefTarget, Section, Table, TableCell,
};
use crate::core::config::ParserConfig;
use crate::directives::highlight::highlight;

/// Escape text for element content and double-quoted attributes.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the body of `document` as an HTML fragment.
///
/// Top-level sections of the body are rendered with
/// `config.initial_header_level`, deeper sections one level further each,
/// capped at `<h6>`.
pub fn render_body(document: &Document, config: &ParserConfig) -> String {
    let mut writer = HtmlWriter {
        config,
        out: String::new(),
    };
    writer.blocks(&document.body, 1);
    writer.out
}

struct HtmlWriter<'a> {
    config: &'a ParserConfig,
    out: String,
}

impl HtmlWriter<'_> {
    fn blocks(&mut self, blocks: &[Block], depth: usize) {
        for block in blocks {
            self.block(block, depth);
        }
    }

    fn block(&mut self, block: &Block, depth: usize) {
        match block {
            Block::Section(section) => self.section(section, depth),
            Block::Paragraph(inlines) => {
                self.out.push_str("<p>");
                self.inlines(inlines);
                self.out.push_str("</p>\n");
            }
            Block::LiteralBlock(text) => {
                self.out.push_str("<pre class=\"literal-block\">\n");
                self.out.push_str(&escape(text));
                self.out.push_str("\n</pre>\n");
            }
            Block::CodeBlock(code) => self.code_block(code),
            Block::BlockQuote(children) => {
                self.out.push_str("<blockquote>\n");
                self.blocks(children, depth);
                self.out.push_str("</blockquote>\n");
            }
            Block::BulletList(items) => self.list("ul", None, items, depth),
            Block::EnumeratedList { enumtype, start, items } => {
                let start = (*start != 1).then_some(*start);
                self.list("ol", Some((enumtype.class(), start)), items, depth)
            }
            Block::DefinitionList(items) => self.definition_list(items, depth),
            Block::FieldList(fields) => self.field_list(fields, depth),
            Block::Table(table) => self.table(table, depth),
            Block::Admonition { class, title, children } => {
                let class = if class.starts_with("admonition-") {
                    format!("admonition {}", class)
                } else {
                    class.clone()
                };
                self.out.push_str(&format!(
                    "<div class=\"{}\">\n<p class=\"first admonition-title\">{}</p>\n",
                    escape(&class),
                    escape(title)
                ));
                self.blocks(children, depth);
                self.out.push_str("</div>\n");
            }
            Block::Topic { class, title, children } => {
                self.out.push_str(&format!(
                    "<div class=\"{} topic\">\n<p class=\"topic-title first\">{}</p>\n",
                    escape(class),
                    escape(title)
                ));
                self.blocks(children, depth);
                self.out.push_str("</div>\n");
            }
            Block::Image(image) => self.image(image),
            Block::Raw(html) => {
                self.out.push_str(html);
                self.out.push('\n');
            }
            Block::Comment(text) => {
                if !text.is_empty() {
                    self.out
                        .push_str(&format!("<!-- {} -->\n", escape(text).replace("--", "- -")));
                }
            }
            Block::Transition => self.out.push_str("<hr class=\"docutils\" />\n"),
        }
    }

    fn heading_level(&self, depth: usize) -> usize {
        (usize::from(self.config.initial_header_level) + depth - 1).min(6)
    }

    fn section(&mut self, section: &Section, depth: usize) {
        let level = self.heading_level(depth);
        self.out.push_str(&format!(
            "<div class=\"section\" id=\"{}\">\n<h{}>",
            escape(&section.id),
            level
        ));
        self.inlines(&section.title);
        self.out.push_str(&format!("</h{}>\n", level));
        self.blocks(&section.children, depth + 1);
        self.out.push_str("</div>\n");
    }

    fn code_block(&mut self, code: &CodeBlock) {
        let class = match &code.language {
            Some(language) => format!("code {} literal-block", escape(language)),
            None => "code literal-block".to_string(),
        };
        let highlighted = highlight(&code.code, code.language.as_deref(), self.config.syntax_highlight);
        let body = match code.number_lines {
            Some(start) => {
                let lines: Vec<&str> = highlighted.split('\n').collect();
                let width = (start + lines.len().saturating_sub(1)).to_string().len();
                lines
                    .iter()
                    .enumerate()
                    .map(|(offset, line)| format!("<span class=\"ln\">{:>width$} </span>{}", start + offset, line))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            None => highlighted,
        };
        self.out
            .push_str(&format!("<pre class=\"{}\">\n{}\n</pre>\n", class, body));
    }

    /// A list is simple when every item is at most one paragraph; simple
    /// items are rendered without `<p>` wrappers.
    fn list(&mut self, tag: &str, enumeration: Option<(&str, Option<usize>)>, items: &[Vec<Block>], depth: usize) {
        let simple = items
            .iter()
            .all(|item| matches!(item.as_slice(), [] | [Block::Paragraph(_)]));

        let mut classes = Vec::new();
        let mut start_attr = String::new();
        if let Some((enum_class, start)) = enumeration {
            classes.push(enum_class);
            if let Some(start) = start {
                start_attr = format!(" start=\"{}\"", start);
            }
        }
        if simple {
            classes.push("simple");
        }
        let class_attr = if classes.is_empty() {
            String::new()
        } else {
            format!(" class=\"{}\"", classes.join(" "))
        };

        self.out
            .push_str(&format!("<{}{}{}>\n", tag, class_attr, start_attr));
        for item in items {
            self.out.push_str("<li>");
            match item.as_slice() {
                [Block::Paragraph(inlines)] if simple => self.inlines(inlines),
                _ => {
                    self.blocks(item, depth);
                }
            }
            self.out.push_str("</li>\n");
        }
        self.out.push_str(&format!("</{}>\n", tag));
    }

    fn definition_list(&mut self, items: &[DefinitionItem], depth: usize) {
        self.out.push_str("<dl class=\"docutils\">\n");
        for item in items {
            self.out.push_str("<dt>");
            self.inlines(&item.term);
            self.out.push_str("</dt>\n<dd>");
            self.blocks(&item.definition, depth);
            self.out.push_str("</dd>\n");
        }
        self.out.push_str("</dl>\n");
    }

    fn field_list(&mut self, fields: &[Field], depth: usize) {
        self.out.push_str("<dl class=\"field-list\">\n");
        for field in fields {
            self.out.push_str("<dt>");
            self.inlines(&field.name.0);
            self.out.push_str("</dt>\n<dd>");
            self.blocks(&field.body.0, depth);
            self.out.push_str("</dd>\n");
        }
        self.out.push_str("</dl>\n");
    }

    fn table(&mut self, table: &Table, depth: usize) {
        self.out
            .push_str("<table border=\"1\" class=\"docutils\">\n<colgroup>\n");
        let total: usize = table.colwidths.iter().sum::<usize>().max(1);
        for width in &table.colwidths {
            let percent = (*width as f64 * 100.0 / total as f64 + 0.5) as usize;
            self.out.push_str(&format!("<col width=\"{}%\" />\n", percent));
        }
        self.out.push_str("</colgroup>\n");
        if !table.head.is_empty() {
            self.out.push_str("<thead valign=\"bottom\">\n");
            self.table_rows(&table.head, "th class=\"head\"", "th", depth);
            self.out.push_str("</thead>\n");
        }
        self.out.push_str("<tbody valign=\"top\">\n");
        self.table_rows(&table.body, "td", "td", depth);
        self.out.push_str("</tbody>\n</table>\n");
    }

    fn table_rows(&mut self, rows: &[Vec<TableCell>], open: &str, close: &str, depth: usize) {
        for row in rows {
            self.out.push_str("<tr>");
            for cell in row {
                let mut tag = open.to_string();
                if cell.morecols > 0 {
                    tag.push_str(&format!(" colspan=\"{}\"", cell.morecols + 1));
                }
                if cell.morerows > 0 {
                    tag.push_str(&format!(" rowspan=\"{}\"", cell.morerows + 1));
                }
                self.out.push_str(&format!("<{}>", tag));
                match cell.children.as_slice() {
                    [] => self.out.push_str("&nbsp;"),
                    [Block::Paragraph(inlines)] => self.inlines(inlines),
                    children => self.blocks(children, depth),
                }
                self.out.push_str(&format!("</{}>\n", close));
            }
            self.out.push_str("</tr>\n");
        }
    }

    fn image(&mut self, image: &Image) {
        let mut tag = format!(
            "<img alt=\"{}\"",
            escape(image.alt.as_deref().unwrap_or(&image.uri))
        );
        if let Some(align) = &image.align {
            tag.push_str(&format!(" class=\"align-{}\"", escape(align)));
        }
        if let Some(height) = &image.height {
            tag.push_str(&format!(" height=\"{}\"", escape(height)));
        }
        tag.push_str(&format!(" src=\"{}\"", escape(&image.uri)));
        if let Some(width) = &image.width {
            tag.push_str(&format!(" width=\"{}\"", escape(width)));
        }
        tag.push_str(" />");

        match &image.target {
            Some(target) => self.out.push_str(&format!(
                "<a class=\"reference external image-reference\" href=\"{}\">{}</a>\n",
                escape(target),
                tag
            )),
            None => {
                self.out.push_str(&tag);
                self.out.push('\n');
            }
        }
    }

    fn inlines(&mut self, inlines: &[Inline]) {
        for inline in inlines {
            self.inline(inline);
        }
    }

    fn inline(&mut self, inline: &Inline) {
        let html = match inline {
            Inline::Text(text) => escape(text),
            Inline::Emphasis(text) => format!("<em>{}</em>", escape(text)),
            Inline::Strong(text) => format!("<strong>{}</strong>", escape(text)),
            Inline::Literal(text) => format!("<code class=\"docutils literal\">{}</code>", escape(text)),
            Inline::TitleReference(text) => format!("<cite>{}</cite>", escape(text)),
            Inline::Subscript(text) => format!("<sub>{}</sub>", escape(text)),
            Inline::Superscript(text) => format!("<sup>{}</sup>", escape(text)),
            Inline::Reference { text, target } => match target {
                RefTarget::Uri(uri) => {
                    let kind = if uri.starts_with('#') { "internal" } else { "external" };
                    format!(
                        "<a class=\"reference {}\" href=\"{}\">{}</a>",
                        kind,
                        escape(uri),
                        escape(text)
                    )
                }
                RefTarget::Named { .. } | RefTarget::Unresolved(_) => {
                    format!("<span class=\"problematic\">{}</span>", escape(text))
                }
            },
        };
        self.out.push_str(&html);
    }
}
