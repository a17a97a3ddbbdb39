//! Block-level parser.
//!
//! Input is split into tab-expanded, right-trimmed lines. Each body element is
//! recognised from the first line of a block; indentation delimits nested
//! content. Sections are only recognised at the top level and are assembled
//! into a tree once the flat sequence of titles and blocks is known.

use super::inline::{Targets, normalize_name, parse_inline};
use super::nodes::{
    Block, DefinitionItem, Document, EnumType, Field, FieldBody, FieldName, Inline, RefTarget, Section, Table,
    TableCell, inlines_text,
};
use super::reporter::{Reporter, Severity};
use super::table::{self, GridLayout};
use super::transforms;
use crate::core::config::ParserConfig;
use crate::directives::{ArgumentSpec, Directive, DirectiveContext, DirectiveInvocation, DirectiveRegistry, get_directive_registry};
use crate::{ArticleError, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static ENUMERATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\(([0-9]+|[A-Za-z]|[ivxlcdmIVXLCDM]+|#)\)|([0-9]+|[A-Za-z]|[ivxlcdmIVXLCDM]+|#)([.)]))(?: +|$)")
        .expect("Enumerator regex pattern is valid and should compile")
});

static FIELD_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^:([^:\s](?:[^:]*[^:\s])?):(?: +(.*))?$").expect("Field marker regex pattern is valid and should compile")
});

static TARGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^_(`[^`]+`|[^:`]+):(?: +(.*))?$").expect("Target regex pattern is valid and should compile")
});

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9](?:[-_.+:]?[A-Za-z0-9])*) ?::(?: +(.*))?$")
        .expect("Directive regex pattern is valid and should compile")
});

const ADORNMENT_CHARS: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";
const BULLETS: &[char] = &['*', '+', '-', '\u{2022}', '\u{2023}', '\u{2043}'];
const MAX_INDIRECTION: usize = 8;

/// One physical source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceLine {
    pub(crate) number: usize,
    pub(crate) text: String,
}

fn expand_tabs(line: &str, width: usize) -> String {
    let width = width.max(1);
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let spaces = width - column % width;
            out.extend(std::iter::repeat_n(' ', spaces));
            column += spaces;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}

pub(crate) fn split_lines(source: &str, tab_width: usize) -> Vec<SourceLine> {
    source
        .lines()
        .enumerate()
        .map(|(index, line)| SourceLine {
            number: index + 1,
            text: expand_tabs(line, tab_width).trim_end().to_string(),
        })
        .collect()
}

fn indent_of(text: &str) -> usize {
    text.len() - text.trim_start_matches(' ').len()
}

/// Index of the first non-blank line after `start` indented less than `min_indent`.
fn block_end(lines: &[SourceLine], start: usize, min_indent: usize) -> usize {
    let mut end = start + 1;
    while end < lines.len() {
        let text = &lines[end].text;
        if !text.is_empty() && indent_of(text) < min_indent {
            break;
        }
        end += 1;
    }
    end
}

fn min_indent(lines: &[SourceLine]) -> usize {
    lines
        .iter()
        .filter(|line| !line.text.is_empty())
        .map(|line| indent_of(&line.text))
        .min()
        .unwrap_or(0)
}

fn strip_indent(lines: &[SourceLine], amount: usize) -> Vec<SourceLine> {
    lines
        .iter()
        .map(|line| {
            let cut = indent_of(&line.text).min(amount);
            SourceLine {
                number: line.number,
                text: line.text[cut..].to_string(),
            }
        })
        .collect()
}

fn trim_blank_edges(mut lines: Vec<SourceLine>) -> Vec<SourceLine> {
    while lines.last().is_some_and(|line| line.text.is_empty()) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|line| line.text.is_empty()).count();
    lines.drain(..leading);
    lines
}

fn dedent(lines: &[SourceLine]) -> Vec<SourceLine> {
    trim_blank_edges(strip_indent(lines, min_indent(lines)))
}

fn joined(lines: &[SourceLine]) -> String {
    lines.iter().map(|line| line.text.as_str()).collect::<Vec<_>>().join("\n")
}

/// The repeated punctuation character of an adornment line.
fn adornment(text: &str) -> Option<char> {
    let mut chars = text.chars();
    let first = chars.next()?;
    if !ADORNMENT_CHARS.contains(first) {
        return None;
    }
    chars.all(|c| c == first).then_some(first)
}

fn is_explicit_start(text: &str) -> bool {
    text == ".." || text.starts_with(".. ")
}

/// Bullet character, content column and first-line text of a bullet item.
fn bullet_marker(text: &str) -> Option<(char, usize, &str)> {
    let marker = text.chars().next()?;
    if !BULLETS.contains(&marker) {
        return None;
    }
    let rest = &text[marker.len_utf8()..];
    if rest.is_empty() {
        return Some((marker, 2, ""));
    }
    if !rest.starts_with(' ') {
        return None;
    }
    let content = rest.trim_start_matches(' ');
    Some((marker, 1 + rest.len() - content.len(), content))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumFormat {
    Period,
    Paren,
    Parens,
}

/// Format, ordinal token and marker width of an enumerated item.
fn enumerator(text: &str) -> Option<(EnumFormat, &str, usize)> {
    let captures = ENUMERATOR.captures(text)?;
    let width = captures.get(0)?.end();
    if let Some(token) = captures.get(1) {
        return Some((EnumFormat::Parens, token.as_str(), width));
    }
    let token = captures.get(2)?.as_str();
    let format = if captures.get(3)?.as_str() == "." {
        EnumFormat::Period
    } else {
        EnumFormat::Paren
    };
    Some((format, token, width))
}

fn is_roman(token: &str) -> bool {
    !token.is_empty()
        && (token.chars().all(|c| "ivxlcdm".contains(c)) || token.chars().all(|c| "IVXLCDM".contains(c)))
}

fn roman_value(token: &str) -> Option<usize> {
    const NUMERALS: &[(usize, &str)] = &[
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let upper = token.to_uppercase();
    let mut rest = upper.as_str();
    let mut value = 0;
    for (amount, numeral) in NUMERALS {
        while let Some(tail) = rest.strip_prefix(numeral) {
            value += amount;
            rest = tail;
        }
    }
    (rest.is_empty() && value > 0 && value < 4000).then_some(value)
}

fn enum_type(token: &str, previous: Option<EnumType>) -> Option<EnumType> {
    if token == "#" {
        return Some(previous.unwrap_or(EnumType::Arabic));
    }
    if token.chars().all(|c| c.is_ascii_digit()) {
        return Some(EnumType::Arabic);
    }
    let lower = token.chars().all(|c| c.is_ascii_lowercase());
    match previous {
        Some(EnumType::LowerRoman) | Some(EnumType::UpperRoman) if is_roman(token) => previous,
        Some(EnumType::LowerAlpha) | Some(EnumType::UpperAlpha) if token.len() == 1 => previous,
        Some(_) => None,
        None if token == "i" => Some(EnumType::LowerRoman),
        None if token == "I" => Some(EnumType::UpperRoman),
        None if token.len() == 1 => Some(if lower { EnumType::LowerAlpha } else { EnumType::UpperAlpha }),
        None if is_roman(token) => Some(if lower { EnumType::LowerRoman } else { EnumType::UpperRoman }),
        None => None,
    }
}

fn ordinal(token: &str, enumtype: EnumType) -> Option<usize> {
    match enumtype {
        EnumType::Arabic => token.parse().ok(),
        EnumType::LowerAlpha | EnumType::UpperAlpha => {
            let c = token.chars().next()?.to_ascii_lowercase();
            Some(c as usize - 'a' as usize + 1)
        }
        EnumType::LowerRoman | EnumType::UpperRoman => roman_value(token),
    }
}

fn starts_construct(text: &str) -> bool {
    is_explicit_start(text) || bullet_marker(text).is_some() || enumerator(text).is_some() || FIELD_MARKER.is_match(text)
}

/// Identifier for `text`: lower-case ASCII alphanumerics joined by hyphens,
/// starting with a letter. Empty when nothing usable remains.
///
/// ```rust
/// use rst_article::rst::make_id;
///
/// assert_eq!(make_id("Read This!"), "read-this");
/// assert_eq!(make_id("2020 Review"), "review");
/// ```
pub fn make_id(text: &str) -> String {
    let mut id = String::new();
    let mut pending_dash = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if id.is_empty() && c.is_ascii_digit() {
                continue;
            }
            if pending_dash && !id.is_empty() {
                id.push('-');
            }
            pending_dash = false;
            id.push(c);
        } else {
            pending_dash = true;
        }
    }
    id
}

/// Adornment character plus whether an overline is present.
type Style = (char, bool);

enum Item {
    Block(Block),
    Title { level: usize, section: Section },
}

fn build_sections(items: Vec<Item>) -> Vec<Block> {
    fn close(stack: &mut Vec<Section>, root: &mut Vec<Block>) {
        if let Some(section) = stack.pop() {
            match stack.last_mut() {
                Some(parent) => parent.children.push(Block::Section(section)),
                None => root.push(Block::Section(section)),
            }
        }
    }

    let mut root = Vec::new();
    let mut stack: Vec<Section> = Vec::new();
    for item in items {
        match item {
            Item::Block(block) => match stack.last_mut() {
                Some(section) => section.children.push(block),
                None => root.push(block),
            },
            Item::Title { level, section } => {
                while stack.len() >= level {
                    close(&mut stack, &mut root);
                }
                stack.push(section);
            }
        }
    }
    while !stack.is_empty() {
        close(&mut stack, &mut root);
    }
    root
}

fn indirect_name(value: &str) -> Option<&str> {
    let stripped = value.strip_suffix('_')?;
    if stripped.is_empty() || stripped.contains("://") || stripped.starts_with("mailto:") || stripped.starts_with('#') {
        return None;
    }
    Some(stripped.trim_matches('`'))
}

struct Parser<'a> {
    config: &'a ParserConfig,
    registry: &'a DirectiveRegistry,
    reporter: Reporter,
    targets: Targets,
    explicit_targets: HashSet<String>,
    ids: HashSet<String>,
    id_counter: usize,
    styles: Vec<Style>,
    section_depth: usize,
}

impl<'a> Parser<'a> {
    fn new(config: &'a ParserConfig, registry: &'a DirectiveRegistry) -> Self {
        Self {
            config,
            registry,
            reporter: Reporter::new(config.halt_level),
            targets: Targets::new(),
            explicit_targets: HashSet::new(),
            ids: HashSet::new(),
            id_counter: 0,
            styles: Vec::new(),
            section_depth: 0,
        }
    }

    fn inline(&mut self, text: &str, line: usize) -> Vec<Inline> {
        parse_inline(text, line, &mut self.reporter, &mut self.targets)
    }

    fn unique_id(&mut self, base: &str) -> String {
        let id = if base.is_empty() || self.ids.contains(base) {
            loop {
                self.id_counter += 1;
                let candidate = format!("id{}", self.id_counter);
                if !self.ids.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            base.to_string()
        };
        self.ids.insert(id.clone());
        id
    }

    fn parse_blocks(&mut self, lines: &[SourceLine]) -> Vec<Block> {
        self.parse_items(lines, false)
            .into_iter()
            .filter_map(|item| match item {
                Item::Block(block) => Some(block),
                Item::Title { .. } => None,
            })
            .collect()
    }

    fn parse_items(&mut self, lines: &[SourceLine], top_level: bool) -> Vec<Item> {
        let mut items = Vec::new();
        let mut i = 0;
        while i < lines.len() {
            let text = lines[i].text.as_str();
            if text.is_empty() {
                i += 1;
                continue;
            }
            if indent_of(text) > 0 {
                let end = block_end(lines, i, 1);
                let quoted = dedent(&lines[i..end]);
                let children = self.parse_blocks(&quoted);
                items.push(Item::Block(Block::BlockQuote(children)));
                i = end;
                continue;
            }

            i = if is_explicit_start(text) {
                self.explicit_markup(lines, i, &mut items)
            } else if let Some(next) = self.grid_table(lines, i, &mut items) {
                next
            } else if let Some(next) = self.adornment_line(lines, i, top_level, &mut items) {
                next
            } else if let Some(next) = self.bullet_list(lines, i, &mut items) {
                next
            } else if let Some(next) = self.enumerated_list(lines, i, &mut items) {
                next
            } else if let Some(next) = self.field_list(lines, i, &mut items) {
                next
            } else if let Some(next) = self.underlined_title(lines, i, top_level, &mut items) {
                next
            } else if let Some(next) = self.definition_list(lines, i, &mut items) {
                next
            } else {
                self.paragraph(lines, i, &mut items)
            };
        }
        items
    }

    /// Grid table; the block runs to the next blank line.
    fn grid_table(&mut self, lines: &[SourceLine], i: usize, items: &mut Vec<Item>) -> Option<usize> {
        if !table::is_grid_border(&lines[i].text) {
            return None;
        }
        let end = lines[i..]
            .iter()
            .position(|line| line.text.is_empty())
            .map_or(lines.len(), |offset| i + offset);
        let block = &lines[i..end];
        let texts: Vec<&str> = block.iter().map(|line| line.text.as_str()).collect();

        match table::parse_grid(&texts) {
            Ok(layout) => {
                let table = self.build_table(block[0].number, layout);
                items.push(Item::Block(Block::Table(table)));
            }
            Err(detail) => {
                self.reporter
                    .error(lines[i].number, format!("Malformed table.\n{}", detail));
                items.push(Item::Block(Block::LiteralBlock(joined(block))));
            }
        }
        Some(end)
    }

    fn build_table(&mut self, first_line: usize, layout: GridLayout) -> Table {
        let mut rows = Vec::with_capacity(layout.rows.len());
        for row in layout.rows {
            let mut cells = Vec::with_capacity(row.len());
            for cell in row {
                let lines: Vec<SourceLine> = cell
                    .lines
                    .into_iter()
                    .enumerate()
                    .map(|(offset, text)| SourceLine {
                        number: first_line + cell.first_line + offset,
                        text,
                    })
                    .collect();
                cells.push(TableCell {
                    morerows: cell.morerows,
                    morecols: cell.morecols,
                    children: self.parse_blocks(&dedent(&lines)),
                });
            }
            rows.push(cells);
        }
        let body = rows.split_off(layout.head_rows.min(rows.len()));
        Table {
            colwidths: layout.colwidths,
            head: rows,
            body,
        }
    }

    fn section_level(&mut self, style: Style, line: usize) -> usize {
        let mut level = match self.styles.iter().position(|known| *known == style) {
            Some(position) => position + 1,
            None => {
                self.styles.push(style);
                self.styles.len()
            }
        };
        if level > self.section_depth + 1 {
            self.reporter.severe(line, "Title level inconsistent.");
            level = self.section_depth + 1;
        }
        self.section_depth = level;
        level
    }

    fn push_title(&mut self, title: &str, style: Style, line: usize, top_level: bool, items: &mut Vec<Item>) {
        let inlines = self.inline(title, line);
        if !top_level {
            self.reporter.severe(line, "Unexpected section title.");
            items.push(Item::Block(Block::Paragraph(inlines)));
            return;
        }

        let level = self.section_level(style, line);
        let text = inlines_text(&inlines);
        let id = self.unique_id(&make_id(&text));
        self.targets
            .entry(normalize_name(&text))
            .or_insert_with(|| format!("#{}", id));
        items.push(Item::Title {
            level,
            section: Section {
                id,
                title: inlines,
                children: Vec::new(),
            },
        });
    }

    /// Overlined section title or transition.
    fn adornment_line(&mut self, lines: &[SourceLine], i: usize, top_level: bool, items: &mut Vec<Item>) -> Option<usize> {
        let overline = &lines[i];
        let c = adornment(&overline.text)?;
        let width = overline.text.chars().count();
        if width < 4 {
            return None;
        }

        let Some(title_line) = lines.get(i + 1).filter(|line| !line.text.is_empty()) else {
            items.push(Item::Block(Block::Transition));
            return Some(i + 1);
        };

        let Some(underline) = lines.get(i + 2).filter(|line| adornment(&line.text).is_some()) else {
            self.reporter
                .severe(overline.number, "Missing matching underline for section title overline.");
            return Some(block_end(lines, i, 1).max(i + 2));
        };
        if underline.text != overline.text {
            self.reporter.severe(overline.number, "Title overline & underline mismatch.");
            return Some(i + 3);
        }

        let title = title_line.text.trim();
        if title.chars().count() > width {
            self.reporter.warning(overline.number, "Title overline too short.");
        }
        self.push_title(title, (c, true), title_line.number, top_level, items);
        Some(i + 3)
    }

    fn underlined_title(&mut self, lines: &[SourceLine], i: usize, top_level: bool, items: &mut Vec<Item>) -> Option<usize> {
        let underline = lines.get(i + 1)?;
        let c = adornment(&underline.text)?;
        let title = lines[i].text.as_str();
        let title_width = title.chars().count();
        let underline_width = underline.text.chars().count();
        if underline_width < title_width {
            if underline_width < 4 {
                return None;
            }
            self.reporter.warning(underline.number, "Title underline too short.");
        }
        self.push_title(title, (c, false), lines[i].number, top_level, items);
        Some(i + 2)
    }

    fn list_end(&mut self, lines: &[SourceLine], end: usize, kind: &str) {
        if end < lines.len() && end > 0 && !lines[end - 1].text.is_empty() {
            self.reporter.warning(
                lines[end].number,
                format!("{} ends without a blank line; unexpected unindent.", kind),
            );
        }
    }

    fn item_body(&mut self, lines: &[SourceLine], start: usize, end: usize, first: &str, column: usize) -> Vec<Block> {
        let rest = &lines[start + 1..end];
        let amount = if first.is_empty() { min_indent(rest) } else { column };
        let mut body = vec![SourceLine {
            number: lines[start].number,
            text: first.to_string(),
        }];
        body.extend(strip_indent(rest, amount));
        let body = trim_blank_edges(body);
        self.parse_blocks(&body)
    }

    fn bullet_list(&mut self, lines: &[SourceLine], start: usize, items: &mut Vec<Item>) -> Option<usize> {
        let (bullet, _, _) = bullet_marker(&lines[start].text)?;
        let mut entries = Vec::new();
        let mut i = start;
        while i < lines.len() {
            let Some((marker, column, first)) = bullet_marker(&lines[i].text) else {
                break;
            };
            if marker != bullet {
                break;
            }
            let end = block_end(lines, i, 1);
            entries.push(self.item_body(lines, i, end, first, column));
            i = end;
        }
        self.list_end(lines, i, "Bullet list");
        items.push(Item::Block(Block::BulletList(entries)));
        Some(i)
    }

    fn enumerated_list(&mut self, lines: &[SourceLine], start: usize, items: &mut Vec<Item>) -> Option<usize> {
        let (format, token, _) = enumerator(&lines[start].text)?;
        let enumtype = enum_type(token, None)?;
        let first_value = if token == "#" { 1 } else { ordinal(token, enumtype)? };

        if let Some(next) = lines.get(start + 1)
            && !next.text.is_empty()
            && indent_of(&next.text) == 0
            && !enumerator(&next.text).is_some_and(|(next_format, _, _)| next_format == format)
        {
            return None;
        }

        let mut entries = Vec::new();
        let mut expected = first_value;
        let mut i = start;
        while i < lines.len() {
            let Some((item_format, item_token, width)) = enumerator(&lines[i].text) else {
                break;
            };
            if item_format != format {
                break;
            }
            if i != start {
                if enum_type(item_token, Some(enumtype)) != Some(enumtype) {
                    break;
                }
                if item_token != "#" && ordinal(item_token, enumtype) != Some(expected) {
                    break;
                }
            }
            let first = &lines[i].text[width..];
            let end = block_end(lines, i, 1);
            entries.push(self.item_body(lines, i, end, first, width));
            expected += 1;
            i = end;
        }
        self.list_end(lines, i, "Enumerated list");
        items.push(Item::Block(Block::EnumeratedList {
            enumtype,
            start: first_value,
            items: entries,
        }));
        Some(i)
    }

    fn field_list(&mut self, lines: &[SourceLine], start: usize, items: &mut Vec<Item>) -> Option<usize> {
        if !FIELD_MARKER.is_match(&lines[start].text) {
            return None;
        }
        let mut fields = Vec::new();
        let mut i = start;
        while i < lines.len() {
            let Some(captures) = FIELD_MARKER.captures(&lines[i].text) else {
                break;
            };
            let raw_name = captures[1].to_string();
            let first = captures.get(2).map_or("", |m| m.as_str()).to_string();
            let number = lines[i].number;
            let end = block_end(lines, i, 1);

            let rest = &lines[i + 1..end];
            let mut body = vec![SourceLine { number, text: first }];
            body.extend(strip_indent(rest, min_indent(rest)));
            let body = trim_blank_edges(body);

            let name = self.inline(&raw_name, number);
            let body = self.parse_blocks(&body);
            fields.push(Field {
                name: FieldName(name),
                body: FieldBody(body),
                line: number,
            });
            i = end;
        }
        self.list_end(lines, i, "Field list");
        items.push(Item::Block(Block::FieldList(fields)));
        Some(i)
    }

    fn is_definition_item(lines: &[SourceLine], i: usize) -> bool {
        let text = &lines[i].text;
        !text.is_empty()
            && indent_of(text) == 0
            && lines
                .get(i + 1)
                .is_some_and(|next| !next.text.is_empty() && indent_of(&next.text) > 0)
    }

    fn definition_list(&mut self, lines: &[SourceLine], start: usize, items: &mut Vec<Item>) -> Option<usize> {
        if !Self::is_definition_item(lines, start) {
            return None;
        }
        let mut entries = Vec::new();
        let mut i = start;
        while i < lines.len() && Self::is_definition_item(lines, i) {
            if i != start && starts_construct(&lines[i].text) {
                break;
            }
            let term = self.inline(&lines[i].text, lines[i].number);
            let end = block_end(lines, i, 1);
            let definition = dedent(&lines[i + 1..end]);
            let definition = self.parse_blocks(&definition);
            entries.push(DefinitionItem { term, definition });
            i = end;
        }
        self.list_end(lines, i, "Definition list");
        items.push(Item::Block(Block::DefinitionList(entries)));
        Some(i)
    }

    fn paragraph(&mut self, lines: &[SourceLine], start: usize, items: &mut Vec<Item>) -> usize {
        let mut end = start;
        while end < lines.len() && !lines[end].text.is_empty() && indent_of(&lines[end].text) == 0 {
            end += 1;
        }

        let mut text = joined(&lines[start..end]);
        let literal_next = text.ends_with("::");
        if literal_next {
            let head = &text[..text.len() - 2];
            if head.is_empty() {
                text.clear();
            } else if head.ends_with(char::is_whitespace) {
                text = head.trim_end().to_string();
            } else {
                text.pop();
            }
        }

        if !text.is_empty() {
            let inlines = self.inline(&text, lines[start].number);
            items.push(Item::Block(Block::Paragraph(inlines)));
        }

        if literal_next {
            return self.literal_block(lines, end, items);
        }
        if end < lines.len() && !lines[end].text.is_empty() {
            self.reporter.error(lines[end].number, "Unexpected indentation.");
        }
        end
    }

    fn literal_block(&mut self, lines: &[SourceLine], after: usize, items: &mut Vec<Item>) -> usize {
        let mut i = after;
        while i < lines.len() && lines[i].text.is_empty() {
            i += 1;
        }
        if i < lines.len() && indent_of(&lines[i].text) > 0 {
            let end = block_end(lines, i, 1);
            let block = dedent(&lines[i..end]);
            items.push(Item::Block(Block::LiteralBlock(joined(&block))));
            return end;
        }
        let line = lines[after.saturating_sub(1)].number;
        self.reporter.warning(line, "Literal block expected; none found.");
        after
    }

    fn explicit_markup(&mut self, lines: &[SourceLine], start: usize, items: &mut Vec<Item>) -> usize {
        let number = lines[start].number;
        let first = lines[start].text.get(3..).unwrap_or("").to_string();

        if first.is_empty() && lines.get(start + 1).is_none_or(|line| line.text.is_empty()) {
            items.push(Item::Block(Block::Comment(String::new())));
            return start + 1;
        }

        let end = block_end(lines, start, 1);
        let rest = &lines[start + 1..end];

        if let Some(captures) = TARGET.captures(&first) {
            let name = captures[1].trim_matches('`').to_string();
            let mut uri = captures.get(2).map_or("", |m| m.as_str()).to_string();
            for line in rest {
                uri.push_str(line.text.trim());
            }
            let uri: String = uri.split_whitespace().collect();
            self.define_target(&name, uri, number, items);
            return end;
        }

        if first.starts_with('[') {
            self.reporter
                .warning(number, "Footnotes and citations are not supported; definition ignored.");
            return end;
        }

        if first.starts_with('|') {
            self.reporter
                .warning(number, "Substitution definitions are not supported; definition ignored.");
            return end;
        }

        if let Some(captures) = DIRECTIVE.captures(&first) {
            let name = captures[1].to_lowercase();
            let argument = captures.get(2).map_or("", |m| m.as_str()).to_string();
            self.directive(&name, argument, number, rest, items);
            return end;
        }

        let mut comment = vec![first];
        comment.extend(dedent(rest).into_iter().map(|line| line.text));
        items.push(Item::Block(Block::Comment(comment.join("\n").trim().to_string())));
        end
    }

    fn define_target(&mut self, name: &str, uri: String, line: usize, items: &mut Vec<Item>) {
        if name == "_" {
            self.reporter
                .warning(line, "Anonymous hyperlink targets are not supported; target ignored.");
            return;
        }

        let key = normalize_name(name);
        if !self.explicit_targets.insert(key.clone()) {
            self.reporter
                .warning(line, format!("Duplicate explicit target name: \"{}\".", key));
        }

        if uri.is_empty() {
            let id = self.unique_id(&make_id(name));
            self.targets.insert(key, format!("#{}", id));
            items.push(Item::Block(Block::Raw(format!("<span class=\"target\" id=\"{}\"></span>", id))));
        } else {
            self.targets.insert(key, uri);
        }
    }

    fn directive(&mut self, name: &str, argument: String, line: usize, rest: &[SourceLine], items: &mut Vec<Item>) {
        let Some(directive) = self.registry.get(name) else {
            self.reporter.error(line, format!("Unknown directive type \"{}\".", name));
            return;
        };

        let invocation = match invocation(directive.as_ref(), name, argument, line, rest) {
            Ok(invocation) => invocation,
            Err(message) => {
                self.reporter
                    .error(line, format!("Error in \"{}\" directive:\n{}", name, message));
                return;
            }
        };

        tracing::trace!(directive = name, line, "running directive");
        match directive.run(&invocation, self) {
            Ok(blocks) => items.extend(blocks.into_iter().map(Item::Block)),
            Err(err) => self.reporter.report(
                err.severity,
                line,
                format!("Error in \"{}\" directive:\n{}", name, err.message),
            ),
        }
    }

    fn lookup(&self, name: &str) -> Option<String> {
        let mut key = name.to_string();
        for _ in 0..MAX_INDIRECTION {
            let value = self.targets.get(&key)?;
            match indirect_name(value) {
                Some(next) => key = normalize_name(next),
                None => return Some(value.clone()),
            }
        }
        None
    }

    fn resolve_inlines(&mut self, inlines: &mut [Inline]) {
        for inline in inlines {
            let Inline::Reference { target, .. } = inline else {
                continue;
            };
            let RefTarget::Named { name, line } = target else {
                continue;
            };
            let (name, line) = (name.clone(), *line);
            *target = match self.lookup(&name) {
                Some(uri) => RefTarget::Uri(uri),
                None => {
                    self.reporter
                        .error(line, format!("Unknown target name: \"{}\".", name));
                    RefTarget::Unresolved(name)
                }
            };
        }
    }

    fn resolve_blocks(&mut self, blocks: &mut [Block]) {
        for block in blocks {
            match block {
                Block::Section(section) => {
                    self.resolve_inlines(&mut section.title);
                    self.resolve_blocks(&mut section.children);
                }
                Block::Paragraph(inlines) => self.resolve_inlines(inlines),
                Block::BlockQuote(children) | Block::Admonition { children, .. } | Block::Topic { children, .. } => {
                    self.resolve_blocks(children)
                }
                Block::BulletList(entries) | Block::EnumeratedList { items: entries, .. } => {
                    for entry in entries {
                        self.resolve_blocks(entry);
                    }
                }
                Block::DefinitionList(entries) => {
                    for entry in entries {
                        self.resolve_inlines(&mut entry.term);
                        self.resolve_blocks(&mut entry.definition);
                    }
                }
                Block::FieldList(fields) => {
                    for field in fields {
                        self.resolve_inlines(&mut field.name.0);
                        self.resolve_blocks(&mut field.body.0);
                    }
                }
                Block::Table(table) => {
                    for cell in table.head.iter_mut().chain(table.body.iter_mut()).flatten() {
                        self.resolve_blocks(&mut cell.children);
                    }
                }
                Block::LiteralBlock(_)
                | Block::CodeBlock(_)
                | Block::Image(_)
                | Block::Raw(_)
                | Block::Comment(_)
                | Block::Transition => {}
            }
        }
    }
}

impl DirectiveContext for Parser<'_> {
    fn config(&self) -> &ParserConfig {
        self.config
    }

    fn parse_nested(&mut self, lines: &[String], first_line: usize) -> Vec<Block> {
        let lines: Vec<SourceLine> = lines
            .iter()
            .enumerate()
            .map(|(offset, text)| SourceLine {
                number: first_line + offset,
                text: expand_tabs(text, self.config.tab_width).trim_end().to_string(),
            })
            .collect();
        self.parse_blocks(&lines)
    }

    fn report(&mut self, severity: Severity, line: usize, message: String) {
        self.reporter.report(severity, line, message);
    }
}

fn parse_options(lines: &[SourceLine], allowed: &[&str]) -> std::result::Result<IndexMap<String, String>, String> {
    let mut options: IndexMap<String, String> = IndexMap::new();
    let mut current: Option<String> = None;
    for line in lines {
        if let Some(captures) = FIELD_MARKER.captures(&line.text) {
            let name = captures[1].to_lowercase();
            if !allowed.contains(&name.as_str()) {
                return Err(format!("unknown option: \"{}\"", name));
            }
            if options.contains_key(&name) {
                return Err(format!("duplicate option \"{}\"", name));
            }
            let value = captures.get(2).map_or("", |m| m.as_str()).trim().to_string();
            options.insert(name.clone(), value);
            current = Some(name);
        } else if let Some(name) = &current
            && indent_of(&line.text) > 0
            && let Some(value) = options.get_mut(name)
        {
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(line.text.trim());
        } else {
            return Err(format!("invalid option block: {:?}", line.text));
        }
    }
    Ok(options)
}

fn parse_arguments(block: &[SourceLine], shape: ArgumentSpec) -> std::result::Result<Vec<String>, String> {
    let text = joined(block);
    let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
    if words.len() < shape.required {
        return Err(format!(
            "{} argument(s) required, {} supplied",
            shape.required,
            words.len()
        ));
    }
    let max = shape.required + shape.optional;
    if words.len() <= max {
        return Ok(words);
    }
    if !shape.final_whitespace {
        return Err(format!("maximum {} argument(s) allowed, {} supplied", max, words.len()));
    }

    let mut arguments = Vec::with_capacity(max);
    let mut rest = text.trim();
    while arguments.len() + 1 < max {
        match rest.split_once(char::is_whitespace) {
            Some((head, tail)) => {
                arguments.push(head.to_string());
                rest = tail.trim_start();
            }
            None => break,
        }
    }
    arguments.push(rest.to_string());
    Ok(arguments)
}

/// Split a directive block into arguments, options and content.
fn invocation(
    directive: &dyn Directive,
    name: &str,
    argument: String,
    line: usize,
    rest: &[SourceLine],
) -> std::result::Result<DirectiveInvocation, String> {
    let mut block = vec![SourceLine { number: line, text: argument }];
    block.extend(strip_indent(rest, min_indent(rest)));
    while block.last().is_some_and(|l| l.text.is_empty()) {
        block.pop();
    }
    let leading = block.iter().take_while(|l| l.text.is_empty()).count();
    block.drain(..leading);

    let shape = directive.arguments();
    let option_names = directive.option_names();
    let (mut arg_block, mut content, separated) = if !block.is_empty() && (shape.takes_arguments() || !option_names.is_empty()) {
        match block.iter().position(|l| l.text.is_empty()) {
            Some(split) => (block[..split].to_vec(), block[split + 1..].to_vec(), true),
            None => (block, Vec::new(), false),
        }
    } else {
        (Vec::new(), block, false)
    };

    let mut options = IndexMap::new();
    if !option_names.is_empty()
        && let Some(position) = arg_block.iter().position(|l| l.text.starts_with(':'))
    {
        let option_lines = arg_block.split_off(position);
        options = parse_options(&option_lines, option_names)?;
    }

    if !arg_block.is_empty() && !shape.takes_arguments() {
        if separated {
            arg_block.push(SourceLine {
                number: 0,
                text: String::new(),
            });
        }
        arg_block.append(&mut content);
        content = std::mem::take(&mut arg_block);
    }

    let content = trim_blank_edges(content);
    let arguments = if shape.takes_arguments() {
        parse_arguments(&arg_block, shape)?
    } else {
        Vec::new()
    };
    if !content.is_empty() && !directive.has_content() {
        return Err(format!("no content permitted:\n{}", joined(&content)));
    }

    Ok(DirectiveInvocation {
        name: name.to_string(),
        arguments,
        options,
        content_line: content.first().map_or(line + 1, |l| l.number),
        content: content.into_iter().map(|l| l.text).collect(),
        line,
    })
}

/// Parse `source` using the global directive registry.
///
/// Fails with a Parsing error when any system message reaches
/// `config.halt_level`.
pub fn parse_document(source: &str, config: &ParserConfig) -> Result<Document> {
    let registry = get_directive_registry();
    let registry = registry
        .read()
        .map_err(|e| ArticleError::LockPoisoned(format!("directive registry: {}", e)))?;
    parse_document_with_registry(source, config, &registry)
}

/// Parse `source` against an explicit directive registry.
pub fn parse_document_with_registry(source: &str, config: &ParserConfig, registry: &DirectiveRegistry) -> Result<Document> {
    let lines = split_lines(source, config.tab_width);
    let mut parser = Parser::new(config, registry);
    let items = parser.parse_items(&lines, true);
    let mut body = build_sections(items);
    parser.resolve_blocks(&mut body);

    let mut reporter = parser.reporter;
    let document = transforms::apply(body, &mut reporter);
    reporter.finish()?;

    tracing::debug!(
        lines = lines.len(),
        blocks = document.body.len(),
        title = ?document.title_text(),
        "parsed document"
    );
    Ok(document)
}
