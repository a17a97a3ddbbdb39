//! Metadata extraction from the bibliographic header.
//!
//! Two lookups feed the tag schema. The built-in `date` entry is matched by its
//! structural tag name. `modified_date`, `categories` and `series` are generic
//! `:name: value` fields matched by lower-cased name. Every lookup scans the
//! header regions from the start and the first match in document order wins.

use crate::core::clock::Clock;
use crate::rst::{Document, HeaderEntry, inlines_text};
use crate::types::ArticleTags;
use crate::{ArticleError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%B %d %Y %H:%M:%S",
    "%B %d %Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y-%m-%d %I:%M %p",
    "%Y/%m/%d %I:%M:%S %p",
    "%Y/%m/%d %I:%M %p",
    "%B %d, %Y %I:%M:%S %p",
    "%B %d, %Y %I:%M %p",
    "%d %B %Y %I:%M %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M",
];

/// Time written before the date, as in `12:00 2016-03-12`.
const TIME_FIRST_FORMATS: &[&str] = &[
    "%H:%M:%S %Y-%m-%d",
    "%H:%M %Y-%m-%d",
    "%I:%M:%S %p %Y-%m-%d",
    "%I:%M %p %Y-%m-%d",
    "%H:%M %B %d, %Y",
    "%H:%M %d %B %Y",
    "%I:%M %p %B %d, %Y",
];

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M%:z",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%m/%d/%Y",
    "%d.%m.%Y",
];

static YEAR_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})(?:[-/.](\d{1,2}))?$").expect("Year-month regex pattern is valid and should compile")
});

/// `2016`, `2016-03` and `March 2016`. Missing parts are the first month or day.
fn parse_partial_date(value: &str) -> Option<NaiveDate> {
    if let Some(caps) = YEAR_MONTH.captures(value) {
        let year = caps[1].parse().ok()?;
        let month = caps.get(2).map_or(Some(1), |m| m.as_str().parse().ok())?;
        return NaiveDate::from_ymd_opt(year, month, 1);
    }
    NaiveDate::parse_from_str(&format!("1 {}", value), "%d %B %Y").ok()
}

fn parse_compact_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = value[..4].parse().ok()?;
    let month = value[4..6].parse().ok()?;
    let day = value[6..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_flexible(value: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.naive_local());
    }
    if let Some(parsed) = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    {
        return Some(parsed);
    }
    if let Some(parsed) = TIME_FIRST_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    {
        return Some(parsed);
    }
    if let Some(parsed) = OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(value, format).ok())
    {
        return Some(parsed.naive_local());
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| parse_compact_date(value))
        .or_else(|| parse_partial_date(value))
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Parse a header date/time value.
///
/// Accepts RFC 3339, RFC 2822, ISO-like forms with `T` or a space, slashed
/// and dotted dates, `YYYYMMDD`, month-name forms, 12-hour clocks, a time
/// written before the date, and bare years or year-months (taken as the first
/// day). Date-only values mean midnight. An explicit UTC offset is dropped after parsing, keeping the
/// written wall-clock time.
///
/// ```rust
/// use rst_article::metadata::parse_datetime;
///
/// let parsed = parse_datetime("date", "January 2, 2020").unwrap();
/// assert_eq!(parsed.to_string(), "2020-01-02 00:00:00");
/// assert!(parse_datetime("date", "someday").is_err());
/// ```
pub fn parse_datetime(field: &str, text: &str) -> Result<NaiveDateTime> {
    parse_flexible(text.trim()).ok_or_else(|| ArticleError::metadata_format(field, text))
}

/// Text of the first built-in header entry named `tag_name`.
pub fn builtin_text(document: &Document, tag_name: &str) -> Option<String> {
    document
        .headers()
        .flat_map(|header| header.entries.iter())
        .find_map(|entry| match entry {
            HeaderEntry::Builtin { kind, body } if kind.tag_name().eq_ignore_ascii_case(tag_name) => {
                Some(inlines_text(body))
            }
            _ => None,
        })
}

/// Body text of the first generic header field whose lower-cased name is `name`.
pub fn custom_text(document: &Document, name: &str) -> Option<String> {
    document
        .headers()
        .flat_map(|header| header.entries.iter())
        .find_map(|entry| match entry {
            HeaderEntry::Field(field) if field.name.astext().to_lowercase() == name => Some(field.body.astext()),
            _ => None,
        })
}

/// Read the tag schema from a parsed document.
///
/// # Errors
///
/// `ArticleError::MetadataFormat` when `date` or `modified_date` is present
/// but cannot be parsed.
pub fn extract_tags(document: &Document, clock: &dyn Clock) -> Result<ArticleTags> {
    let date = match builtin_text(document, "date").filter(|text| !text.is_empty()) {
        Some(text) => parse_datetime("date", &text)?,
        None => {
            let now = clock.now();
            tracing::debug!(%now, "document has no date, using current time");
            now
        }
    };

    let modified_date = custom_text(document, "modified_date")
        .filter(|text| !text.is_empty())
        .map(|text| parse_datetime("modified_date", &text))
        .transpose()?;

    let categories = custom_text(document, "categories")
        .filter(|text| !text.is_empty())
        .map(|text| text.split(';').map(str::to_string).collect())
        .unwrap_or_default();

    let series = custom_text(document, "series");

    Ok(ArticleTags {
        date,
        modified_date,
        categories,
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::rst::{Bibliographic, Block, Field, FieldBody, FieldName, Header, Inline};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap()
    }

    fn builtin(kind: Bibliographic, text: &str) -> HeaderEntry {
        HeaderEntry::Builtin {
            kind,
            body: vec![Inline::Text(text.to_string())],
        }
    }

    fn field(name: &str, text: &str) -> HeaderEntry {
        HeaderEntry::Field(Field {
            name: FieldName(vec![Inline::Text(name.to_string())]),
            body: FieldBody(vec![Block::Paragraph(vec![Inline::Text(text.to_string())])]),
            line: 1,
        })
    }

    fn document(entries: Vec<HeaderEntry>) -> Document {
        Document {
            title: Some(vec![Inline::Text("T".to_string())]),
            docinfo: Some(Header { entries }),
            ..Document::default()
        }
    }

    fn clock() -> FixedClock {
        FixedClock(at(2024, 5, 6, 7, 8, 9))
    }

    #[test]
    fn test_all_tags() {
        let doc = document(vec![
            builtin(Bibliographic::Date, "2020-01-02 10:30"),
            field("modified_date", "2020-02-03"),
            field("Categories", "a; b"),
            field("series", "Rust Notes"),
        ]);
        let tags = extract_tags(&doc, &clock()).unwrap();
        assert_eq!(tags.date, at(2020, 1, 2, 10, 30, 0));
        assert_eq!(tags.modified_date, Some(at(2020, 2, 3, 0, 0, 0)));
        assert_eq!(tags.categories, vec!["a".to_string(), " b".to_string()]);
        assert_eq!(tags.series.as_deref(), Some("Rust Notes"));
    }

    #[test]
    fn test_defaults_without_header() {
        let doc = Document::default();
        let tags = extract_tags(&doc, &clock()).unwrap();
        assert_eq!(tags.date, clock().0);
        assert_eq!(tags.modified_date, None);
        assert!(tags.categories.is_empty());
        assert_eq!(tags.series, None);
    }

    #[test]
    fn test_first_match_wins() {
        let doc = document(vec![field("series", "first"), field("series", "second")]);
        assert_eq!(custom_text(&doc, "series").as_deref(), Some("first"));
    }

    #[test]
    fn test_date_as_generic_field_is_ignored() {
        let doc = document(vec![field("date", "2020-01-02")]);
        let tags = extract_tags(&doc, &clock()).unwrap();
        assert_eq!(tags.date, clock().0);
    }

    #[test]
    fn test_single_category_and_trailing_separator() {
        let doc = document(vec![field("categories", "rust;")]);
        let tags = extract_tags(&doc, &clock()).unwrap();
        assert_eq!(tags.categories, vec!["rust".to_string(), String::new()]);
    }

    #[test]
    fn test_bad_dates_name_the_field() {
        let doc = document(vec![builtin(Bibliographic::Date, "not a date")]);
        let err = extract_tags(&doc, &clock()).unwrap_err();
        assert!(matches!(err, ArticleError::MetadataFormat { ref field, .. } if field == "date"));

        let doc = document(vec![field("modified_date", "yesterday")]);
        let err = extract_tags(&doc, &clock()).unwrap_err();
        assert!(matches!(
            err,
            ArticleError::MetadataFormat { ref field, ref value } if field == "modified_date" && value == "yesterday"
        ));
    }

    #[test]
    fn test_impossible_partial_dates_are_rejected() {
        for input in ["2016-13", "13:00 PM 2016-03-12", "Smarch 2016"] {
            assert!(parse_datetime("date", input).is_err(), "input {:?}", input);
        }
    }

    #[test]
    fn test_flexible_formats() {
        let cases = [
            ("2020-01-02", at(2020, 1, 2, 0, 0, 0)),
            ("2020-01-02T03:04:05", at(2020, 1, 2, 3, 4, 5)),
            ("2020-01-02 03:04:05.250", at(2020, 1, 2, 3, 4, 5) + chrono::Duration::milliseconds(250)),
            ("2020-01-02T03:04:05+02:00", at(2020, 1, 2, 3, 4, 5)),
            ("Thu, 02 Jan 2020 03:04:05 +0000", at(2020, 1, 2, 3, 4, 5)),
            ("2020/01/02", at(2020, 1, 2, 0, 0, 0)),
            ("2020.01.02", at(2020, 1, 2, 0, 0, 0)),
            ("20200102", at(2020, 1, 2, 0, 0, 0)),
            ("January 2, 2020", at(2020, 1, 2, 0, 0, 0)),
            ("2 Jan 2020", at(2020, 1, 2, 0, 0, 0)),
            ("Jan 2 2020 10:00", at(2020, 1, 2, 10, 0, 0)),
            ("  2020-01-02  ", at(2020, 1, 2, 0, 0, 0)),
            ("2016-03-12 12:00 PM", at(2016, 3, 12, 12, 0, 0)),
            ("2016-03-12 07:30:15 pm", at(2016, 3, 12, 19, 30, 15)),
            ("2016-03-12 12:05 AM", at(2016, 3, 12, 0, 5, 0)),
            ("March 12, 2016 9:15 PM", at(2016, 3, 12, 21, 15, 0)),
            ("12:00 2016-03-12", at(2016, 3, 12, 12, 0, 0)),
            ("9:15 PM 2016-03-12", at(2016, 3, 12, 21, 15, 0)),
            ("2016", at(2016, 1, 1, 0, 0, 0)),
            ("2016-03", at(2016, 3, 1, 0, 0, 0)),
            ("March 2016", at(2016, 3, 1, 0, 0, 0)),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_datetime("date", input).unwrap(), expected, "input {:?}", input);
        }
    }
}
