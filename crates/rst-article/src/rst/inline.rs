//! Inline markup recognition.
//!
//! Follows the reStructuredText inline markup recognition rules: a start-string
//! must begin the text or follow whitespace or opening punctuation and must be
//! followed by non-whitespace; an end-string must follow non-whitespace and be
//! followed by whitespace, closing punctuation or the end of the text.

use super::nodes::{Inline, RefTarget};
use super::reporter::Reporter;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// Normalized reference name -> URI (or `#id`).
pub(crate) type Targets = IndexMap<String, String>;

static ROLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^:([A-Za-z0-9](?:[-_.+]?[A-Za-z0-9])*):`").expect("Role regex pattern is valid and should compile")
});

static STANDALONE_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:https?://|ftp://|mailto:)[^\s<>"]+"#).expect("URI regex pattern is valid and should compile")
});

static SIMPLE_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9](?:[-_.+:]?[A-Za-z0-9])*)(__?)")
        .expect("Simple reference regex pattern is valid and should compile")
});

static EMBEDDED_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(.*?)\s*<([^<>]+)>$").expect("Embedded URI regex pattern is valid and should compile")
});

const START_PRECEDERS: &[char] = &['-', ':', '/', '\'', '"', '<', '(', '[', '{'];
const END_FOLLOWERS: &[char] = &['-', '.', ',', ':', ';', '!', '?', '\\', '/', '\'', '"', ')', ']', '}', '>'];

/// Lower-case a reference name and collapse internal whitespace.
pub(crate) fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn start_boundary(prev: Option<char>) -> bool {
    match prev {
        None => true,
        Some(c) => c.is_whitespace() || START_PRECEDERS.contains(&c),
    }
}

fn end_boundary(next: Option<char>) -> bool {
    match next {
        None => true,
        Some(c) => c.is_whitespace() || END_FOLLOWERS.contains(&c),
    }
}

struct InlineScanner<'a> {
    text: &'a str,
    chars: Vec<char>,
    /// Byte offset of each char, plus the text length.
    offsets: Vec<usize>,
    line: usize,
    nodes: Vec<Inline>,
    pending: String,
}

impl<'a> InlineScanner<'a> {
    fn new(text: &'a str, line: usize) -> Self {
        let mut chars = Vec::new();
        let mut offsets = Vec::new();
        for (offset, c) in text.char_indices() {
            chars.push(c);
            offsets.push(offset);
        }
        offsets.push(text.len());
        Self {
            text,
            chars,
            offsets,
            line,
            nodes: Vec::new(),
            pending: String::new(),
        }
    }

    fn at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    fn rest(&self, index: usize) -> &'a str {
        &self.text[self.offsets[index]..]
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.text[self.offsets[start]..self.offsets[end]].to_string()
    }

    fn starts_with(&self, index: usize, pattern: &str) -> bool {
        self.rest(index).starts_with(pattern)
    }

    fn push_node(&mut self, node: Inline) {
        self.flush();
        self.nodes.push(node);
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            self.nodes.push(Inline::Text(std::mem::take(&mut self.pending)));
        }
    }

    /// Find `end` starting at `from`, honoring end-string rules.
    fn find_end(&self, from: usize, end: &str, escapes: bool) -> Option<usize> {
        let width = end.chars().count();
        let mut k = from + 1;
        while k + width <= self.chars.len() {
            if self.starts_with(k, end) {
                let before = self.chars[k - 1];
                let escaped = escapes && before == '\\';
                if !before.is_whitespace() && !escaped && end_boundary(self.at(k + width)) {
                    return Some(k);
                }
            }
            k += 1;
        }
        None
    }

    fn unescape(raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some(next) if next.is_whitespace() => {}
                    Some(next) => out.push(next),
                    None => {}
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Try a `start`..`end` construct at `i`; returns the index after it.
    fn delimited(&mut self, i: usize, delimiter: &str, kind: &str, reporter: &mut Reporter) -> usize {
        let width = delimiter.chars().count();
        if self.at(i + width).is_none_or(char::is_whitespace) {
            self.pending.push_str(delimiter);
            return i + width;
        }
        let literal = delimiter == "``";
        match self.find_end(i + width, delimiter, !literal) {
            Some(end) => {
                let raw = self.slice(i + width, end);
                let node = match delimiter {
                    "``" => Inline::Literal(raw),
                    "**" => Inline::Strong(Self::unescape(&raw)),
                    _ => Inline::Emphasis(Self::unescape(&raw)),
                };
                self.push_node(node);
                end + width
            }
            None => {
                reporter.warning(self.line, format!("Inline {} start-string without end-string.", kind));
                self.pending.push_str(delimiter);
                i + width
            }
        }
    }

    /// Interpreted text or phrase reference starting at the backtick `i`.
    fn interpreted(&mut self, i: usize, role: Option<&str>, role_raw: &str, reporter: &mut Reporter, targets: &mut Targets) -> usize {
        if self.at(i + 1).is_none_or(char::is_whitespace) {
            self.pending.push_str(role_raw);
            self.pending.push('`');
            return i + 1;
        }

        let mut k = i + 2;
        let mut found = None;
        while k < self.chars.len() {
            if self.chars[k] == '`' && !self.chars[k - 1].is_whitespace() && self.chars[k - 1] != '\\' {
                let suffix = match (self.at(k + 1), self.at(k + 2)) {
                    (Some('_'), Some('_')) => 2,
                    (Some('_'), _) => 1,
                    _ => 0,
                };
                if end_boundary(self.at(k + 1 + suffix)) {
                    found = Some((k, suffix));
                    break;
                }
            }
            k += 1;
        }

        let Some((end, suffix)) = found else {
            reporter.warning(
                self.line,
                "Inline interpreted text or phrase reference start-string without end-string.",
            );
            self.pending.push_str(role_raw);
            self.pending.push('`');
            return i + 1;
        };

        let content = self.slice(i + 1, end);
        let next = end + 1 + suffix;

        if suffix > 0 {
            let node = self.phrase_reference(&content, suffix == 1, targets);
            self.push_node(node);
            return next;
        }

        let text = Self::unescape(&content);
        let node = match role.unwrap_or("title-reference") {
            "emphasis" => Inline::Emphasis(text),
            "strong" => Inline::Strong(text),
            "literal" | "code" => Inline::Literal(content),
            "title-reference" | "title" | "t" => Inline::TitleReference(text),
            "sub" | "subscript" => Inline::Subscript(text),
            "sup" | "superscript" => Inline::Superscript(text),
            unknown => {
                reporter.error(self.line, format!("Unknown interpreted text role \"{}\".", unknown));
                Inline::Text(format!("{}`{}`", role_raw, content))
            }
        };
        self.push_node(node);
        next
    }

    fn phrase_reference(&self, content: &str, named: bool, targets: &mut Targets) -> Inline {
        if let Some(captures) = EMBEDDED_URI.captures(content) {
            let label = captures.get(1).map_or("", |m| m.as_str()).trim();
            let uri: String = captures[2].split_whitespace().collect();
            let text = if label.is_empty() { uri.clone() } else { Self::unescape(label) };
            if named && !label.is_empty() {
                targets.entry(normalize_name(label)).or_insert_with(|| uri.clone());
            }
            return Inline::Reference {
                text,
                target: RefTarget::Uri(uri),
            };
        }

        let text = Self::unescape(content);
        Inline::Reference {
            target: RefTarget::Named {
                name: normalize_name(&text),
                line: self.line,
            },
            text,
        }
    }

    fn run(mut self, reporter: &mut Reporter, targets: &mut Targets) -> Vec<Inline> {
        let mut i = 0;
        while i < self.chars.len() {
            let c = self.chars[i];
            let prev = if i == 0 { None } else { Some(self.chars[i - 1]) };

            if c == '\\' {
                match self.at(i + 1) {
                    Some(next) if !next.is_whitespace() => self.pending.push(next),
                    _ => {}
                }
                i += 2;
                continue;
            }

            if start_boundary(prev) {
                if self.starts_with(i, "``") {
                    i = self.delimited(i, "``", "literal", reporter);
                    continue;
                }
                if self.starts_with(i, "**") {
                    i = self.delimited(i, "**", "strong", reporter);
                    continue;
                }
                if c == '*' {
                    i = self.delimited(i, "*", "emphasis", reporter);
                    continue;
                }
                if c == '`' {
                    i = self.interpreted(i, None, "", reporter, targets);
                    continue;
                }
                if c == ':'
                    && let Some(captures) = ROLE.captures(self.rest(i))
                {
                    let role_raw = captures[0].trim_end_matches('`').to_string();
                    let role = captures[1].to_lowercase();
                    let backtick = i + role_raw.chars().count();
                    i = self.interpreted(backtick, Some(role.as_str()), &role_raw, reporter, targets);
                    continue;
                }
                if let Some(found) = STANDALONE_URI.find(self.rest(i)) {
                    let uri = found.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?', ')', '\'', '"']);
                    let width = uri.chars().count();
                    let uri = uri.to_string();
                    self.push_node(Inline::Reference {
                        text: uri.clone(),
                        target: RefTarget::Uri(uri),
                    });
                    i += width;
                    continue;
                }
                if c.is_alphanumeric()
                    && let Some(captures) = SIMPLE_REFERENCE.captures(self.rest(i))
                {
                    let width = captures[0].chars().count();
                    if end_boundary(self.at(i + width)) {
                        let name = captures[1].to_string();
                        self.push_node(Inline::Reference {
                            target: RefTarget::Named {
                                name: normalize_name(&name),
                                line: self.line,
                            },
                            text: name,
                        });
                        i += width;
                        continue;
                    }
                }
            }

            self.pending.push(c);
            i += 1;
        }

        self.flush();
        self.nodes
    }
}

/// Parse the inline markup of one text block (paragraph, title, field name).
pub(crate) fn parse_inline(text: &str, line: usize, reporter: &mut Reporter, targets: &mut Targets) -> Vec<Inline> {
    InlineScanner::new(text, line).run(reporter, targets)
}
