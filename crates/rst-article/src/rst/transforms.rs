//! Tree rewrites applied once the body is parsed and references resolved.
//!
//! 1. A lone top-level section becomes the document title.
//! 2. Repeated once more for the subtitle.
//! 3. A leading field list becomes the bibliographic header.

use super::nodes::{Bibliographic, Block, Document, Header, HeaderEntry, Inline};
use super::reporter::Reporter;

pub(crate) fn apply(body: Vec<Block>, reporter: &mut Reporter) -> Document {
    let (title, body) = promote_section(body);
    let (subtitle, body) = if title.is_some() {
        promote_section(body)
    } else {
        (None, body)
    };
    let (docinfo, body) = extract_docinfo(body, reporter);
    Document {
        title,
        subtitle,
        docinfo,
        body,
    }
}

fn first_visible(body: &[Block]) -> Option<usize> {
    body.iter().position(|block| !matches!(block, Block::Comment(_)))
}

/// Lift the only visible top-level section into a title.
fn promote_section(mut body: Vec<Block>) -> (Option<Vec<Inline>>, Vec<Block>) {
    let Some(index) = first_visible(&body) else {
        return (None, body);
    };
    if index + 1 != body.len() || !matches!(body[index], Block::Section(_)) {
        return (None, body);
    }
    match body.pop() {
        Some(Block::Section(section)) => {
            body.extend(section.children);
            (Some(section.title), body)
        }
        Some(other) => {
            body.push(other);
            (None, body)
        }
        None => (None, body),
    }
}

fn extract_docinfo(mut body: Vec<Block>, reporter: &mut Reporter) -> (Option<Header>, Vec<Block>) {
    let Some(index) = first_visible(&body) else {
        return (None, body);
    };
    let fields = match body.remove(index) {
        Block::FieldList(fields) => fields,
        other => {
            body.insert(index, other);
            return (None, body);
        }
    };

    let mut entries = Vec::new();
    let mut topics = Vec::new();
    for field in fields {
        let name = field.name.astext();
        let normalized = name.trim().to_lowercase();

        if normalized == "abstract" || normalized == "dedication" {
            let mut title = normalized.clone();
            title[..1].make_ascii_uppercase();
            topics.push(Block::Topic {
                class: normalized,
                title,
                children: field.body.0,
            });
            continue;
        }

        let Some(kind) = Bibliographic::from_name(&normalized) else {
            entries.push(HeaderEntry::Field(field));
            continue;
        };

        let single_paragraph = match field.body.0.as_slice() {
            [Block::Paragraph(inlines)] => Some(inlines.clone()),
            _ => None,
        };
        match single_paragraph {
            Some(body) => entries.push(HeaderEntry::Builtin { kind, body }),
            None => {
                reporter.warning(
                    field.line,
                    format!(
                        "Cannot extract bibliographic field \"{}\" containing anything other than a single paragraph.",
                        name
                    ),
                );
                entries.push(HeaderEntry::Field(field));
            }
        }
    }

    body.splice(index..index, topics);
    let docinfo = (!entries.is_empty()).then_some(Header { entries });
    (docinfo, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rst::nodes::{Field, FieldBody, FieldName, Section};
    use crate::rst::reporter::Severity;

    fn para(s: &str) -> Block {
        Block::Paragraph(vec![Inline::Text(s.to_string())])
    }

    fn section(title: &str, children: Vec<Block>) -> Block {
        Block::Section(Section {
            id: title.to_lowercase(),
            title: vec![Inline::Text(title.to_string())],
            children,
        })
    }

    fn field(name: &str, body: Vec<Block>) -> Field {
        Field {
            name: FieldName(vec![Inline::Text(name.to_string())]),
            body: FieldBody(body),
            line: 1,
        }
    }

    #[test]
    fn test_title_skips_leading_comments() {
        let body = vec![Block::Comment("x".to_string()), section("Title", vec![para("a")])];
        let mut reporter = Reporter::new(Severity::Error);
        let doc = apply(body, &mut reporter);
        assert_eq!(doc.title_text().as_deref(), Some("Title"));
        assert_eq!(doc.body, vec![Block::Comment("x".to_string()), para("a")]);
    }

    #[test]
    fn test_no_title_with_sibling_blocks() {
        let body = vec![section("One", vec![]), section("Two", vec![])];
        let mut reporter = Reporter::new(Severity::Error);
        let doc = apply(body.clone(), &mut reporter);
        assert!(doc.title.is_none());
        assert_eq!(doc.body, body);
    }

    #[test]
    fn test_docinfo_builtin_generic_and_topics() {
        let body = vec![
            Block::FieldList(vec![
                field("Date", vec![para("2020-01-01")]),
                field("abstract", vec![para("short")]),
                field("series", vec![para("rust")]),
                field("author", vec![para("a"), para("b")]),
            ]),
            para("text"),
        ];
        let mut reporter = Reporter::new(Severity::Error);
        let doc = apply(body, &mut reporter);

        let header = doc.docinfo.unwrap();
        let tags: Vec<_> = header.entries.iter().map(HeaderEntry::tag_name).collect();
        assert_eq!(tags, vec!["date", "field", "field"]);
        assert_eq!(
            doc.body,
            vec![
                Block::Topic {
                    class: "abstract".to_string(),
                    title: "Abstract".to_string(),
                    children: vec![para("short")],
                },
                para("text"),
            ]
        );
        assert!(reporter.finish().is_ok());
    }

    #[test]
    fn test_field_list_after_paragraph_is_not_docinfo() {
        let body = vec![para("intro"), Block::FieldList(vec![field("date", vec![para("x")])])];
        let mut reporter = Reporter::new(Severity::Error);
        let doc = apply(body, &mut reporter);
        assert!(doc.docinfo.is_none());
        assert_eq!(doc.body.len(), 2);
    }
}
