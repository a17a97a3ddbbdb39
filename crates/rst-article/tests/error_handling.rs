//! Failure modes: every error aborts the article, nothing partial comes back.

use rst_article::core::io::MemoryResourceSource;
use rst_article::{ArticleError, ParserConfig, Severity, TransformConfig};

mod helpers;

use helpers::transformer;

fn transform(source: &str) -> rst_article::Result<rst_article::Article> {
    transformer().transform_source(source, &MemoryResourceSource::new())
}

#[test]
fn test_unresolved_reference_is_parsing_error() {
    let err = transform("Post\n====\n\nSee missing_ for details.\n").unwrap_err();
    assert!(matches!(err, ArticleError::Parsing { .. }));
    let messages = err.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].severity, Severity::Error);
    assert_eq!(messages[0].line, 4);
    assert!(messages[0].message.contains("Unknown target name: \"missing\""));
}

#[test]
fn test_warnings_do_not_abort() {
    let article = transform("Post\n====\n\nText::\n\nno indent here\n").unwrap();
    assert_eq!(article.title(), "Post");
    assert!(article.content().contains("no indent here"));
}

#[test]
fn test_inconsistent_title_levels_are_severe() {
    let source = "Post\n====\n\nA\n-\n\nB\n~\n\nC\n-\n\nD\n^\n";
    let err = transform(source).unwrap_err();
    assert!(err.messages().iter().any(|m| m.severity == Severity::Severe), "{:?}", err.messages());
}

#[test]
fn test_bad_date_is_metadata_error() {
    let err = transform("Post\n====\n\n:date: sometime next week\n").unwrap_err();
    match err {
        ArticleError::MetadataFormat { field, value } => {
            assert_eq!(field, "date");
            assert_eq!(value, "sometime next week");
        }
        other => panic!("expected MetadataFormat, got {:?}", other),
    }
}

#[test]
fn test_bad_modified_date_names_its_field() {
    let err = transform("Post\n====\n\n:date: 2020-01-01\n:modified_date: 31/31/2020\n").unwrap_err();
    assert!(matches!(err, ArticleError::MetadataFormat { ref field, .. } if field == "modified_date"));
}

#[test]
fn test_document_without_title_is_rejected() {
    let err = transform(":date: 2020-01-01\n\nOnly a body.\n").unwrap_err();
    assert!(matches!(err, ArticleError::Parsing { .. }));
}

#[test]
fn test_invalid_utf8_is_parsing_error() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("latin");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("latin.rst");
    std::fs::write(&path, b"Caf\xe9\n====\n").unwrap();

    let err = transformer().transform_file(&path).unwrap_err();
    assert!(matches!(err, ArticleError::Parsing { .. }), "got {:?}", err);
}

#[test]
fn test_lower_halt_level_turns_warnings_fatal() {
    let config = TransformConfig {
        parser: ParserConfig {
            halt_level: Severity::Warning,
            ..ParserConfig::default()
        },
        ..TransformConfig::default()
    };
    let transformer = rst_article::ArticleTransformer::new(config);
    let err = transformer
        .transform_source("Post\n====\n\nText::\n\nno indent here\n", &MemoryResourceSource::new())
        .unwrap_err();
    assert_eq!(err.messages()[0].severity, Severity::Warning);
    assert!(err.messages()[0].message.contains("Literal block expected"));
}
