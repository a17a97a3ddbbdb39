//! End-to-end transformation of on-disk article items.
//!
//! Each test lays out an item directory in a tempdir (document plus optional
//! `images/` and `files/`) and checks the assembled article.

use chrono::{Local, NaiveDate, TimeDelta};
use image::ImageFormat;
use rst_article::{ArticleError, ResourceKind, find_article_path, transform_file};
use tempfile::tempdir;

mod helpers;

use helpers::{fixed_now, init_tracing, gif_bytes, jpeg_bytes, png_bytes, decoded_shape, transformer, write_item, write_resource};

const FULL_ARTICLE: &str = "\
=================
 Release Notes
=================

:date: 2021-06-01 08:15
:modified_date: 2021-06-03
:categories: news; releases
:series: changelog

Intro paragraph with *emphasis* and a link_.

.. _link: https://example.com/

What changed
============

- faster parser
- fewer bugs

.. youtube:: abc123
";

#[test]
fn test_full_article_from_disk() {
    init_tracing();
    let root = tempdir().unwrap();
    let path = write_item(root.path(), "release", FULL_ARTICLE);
    let item_dir = path.parent().unwrap();
    write_resource(item_dir, "images", "diagram.png", &png_bytes(16, 8));
    write_resource(item_dir, "files", "notes.txt", b"plain notes");

    let article = transformer().transform_file(&path).unwrap();

    assert_eq!(article.title(), "Release Notes");
    assert_eq!(
        article.date(),
        NaiveDate::from_ymd_opt(2021, 6, 1).unwrap().and_hms_opt(8, 15, 0).unwrap()
    );
    assert_eq!(
        article.modified_date(),
        Some(NaiveDate::from_ymd_opt(2021, 6, 3).unwrap().and_hms_opt(0, 0, 0).unwrap())
    );
    assert_eq!(article.categories(), &["news".to_string(), " releases".to_string()]);
    assert_eq!(article.series(), Some("changelog"));

    let content = article.content();
    assert!(!content.contains("Release Notes"), "title must not be rendered: {}", content);
    assert!(!content.contains("2021-06-01"), "header must not be rendered: {}", content);
    assert!(content.contains("<em>emphasis</em>"));
    assert!(content.contains("<a class=\"reference external\" href=\"https://example.com/\">link</a>"));
    assert!(content.contains("<div class=\"section\" id=\"what-changed\">\n<h2>What changed</h2>"));
    assert!(content.contains("<li>faster parser</li>"));
    assert!(content.contains("https://www.youtube.com/embed/abc123"));

    assert_eq!(article.item_images().len(), 1);
    let image = &article.item_images()[0];
    assert_eq!(image.kind(), ResourceKind::Image);
    assert_eq!(image.original_url(), "images/diagram.png");
    assert_eq!(decoded_shape(image.data()), (ImageFormat::Png, 16, 8));

    assert_eq!(article.item_files().len(), 1);
    let file = &article.item_files()[0];
    assert_eq!(file.original_url(), "files/notes.txt");
    assert_eq!(file.data(), b"plain notes");
}

#[test]
fn test_missing_date_uses_injected_clock() {
    let root = tempdir().unwrap();
    let path = write_item(root.path(), "undated", "Undated\n=======\n\nNo header here.\n");

    let article = transformer().transform_file(&path).unwrap();

    assert_eq!(article.date(), fixed_now());
    assert_eq!(article.modified_date(), None);
    assert!(article.categories().is_empty());
    assert_eq!(article.series(), None);
    assert_eq!(article.content(), "<p>No header here.</p>\n");
}

#[test]
fn test_missing_date_defaults_to_now_with_system_clock() {
    let root = tempdir().unwrap();
    let path = write_item(root.path(), "now", "Now\n===\n");

    let before = Local::now().naive_local();
    let article = transform_file(&path).unwrap();
    let after = Local::now().naive_local();

    assert!(article.date() >= before - TimeDelta::seconds(1));
    assert!(article.date() <= after + TimeDelta::seconds(1));
}

#[test]
fn test_category_lists() {
    let root = tempdir().unwrap();
    let path = write_item(root.path(), "cats", "Cats\n====\n\n:categories: cat1;cat2;cat3\n");
    let article = transformer().transform_file(&path).unwrap();
    assert_eq!(article.categories(), &["cat1", "cat2", "cat3"]);

    let path = write_item(root.path(), "spaced", "Spaced\n======\n\n:categories: a; b\n");
    let article = transformer().transform_file(&path).unwrap();
    assert_eq!(article.categories(), &["a", " b"]);
}

#[test]
fn test_grid_table_renders_as_table() {
    let root = tempdir().unwrap();
    let source = "Post\n====\n\n+---+---+\n| a | b |\n+---+---+\n";
    let path = write_item(root.path(), "tabled", source);

    let article = transformer().transform_file(&path).unwrap();

    let content = article.content();
    assert!(content.starts_with("<table border=\"1\" class=\"docutils\">"));
    assert!(content.contains("<tr><td>a</td>\n<td>b</td>\n</tr>"));
    assert!(!content.contains("<p>+---"));
}

#[test]
fn test_malformed_grid_table_fails_the_article() {
    let root = tempdir().unwrap();
    let source = "Post\n====\n\n+---+---+\n| a | b |\n+---+\n";
    let path = write_item(root.path(), "broken", source);

    let err = transformer().transform_file(&path).unwrap_err();

    assert!(matches!(err, ArticleError::Parsing { .. }));
    assert!(err.messages().iter().any(|m| m.message.starts_with("Malformed table.")));
}

#[test]
fn test_subtitle_is_promoted_and_not_rendered() {
    let root = tempdir().unwrap();
    let source = "Main\n====\n\nSecond line\n-----------\n\nBody text.\n\nPart\n~~~~\n\nMore.\n";
    let path = write_item(root.path(), "subtitled", source);

    let article = transformer().transform_file(&path).unwrap();

    assert_eq!(article.title(), "Main");
    let content = article.content();
    assert!(!content.contains("Second line"), "subtitle leaked into body: {}", content);
    assert!(content.starts_with("<p>Body text.</p>\n"));
    assert!(content.contains("<div class=\"section\" id=\"part\">\n<h2>Part</h2>"));
}

#[test]
fn test_gif_passes_through_and_others_are_reencoded() {
    let root = tempdir().unwrap();
    let path = write_item(root.path(), "gallery", "Gallery\n=======\n");
    let item_dir = path.parent().unwrap();

    let gif = gif_bytes(6, 6);
    let jpeg = jpeg_bytes(20, 10);
    write_resource(item_dir, "images", "anim.gif", &gif);
    write_resource(item_dir, "images", "photo.jpg", &jpeg);
    let png = png_bytes(32, 32);
    write_resource(item_dir, "images", "shot.png", &png);

    let article = transformer().transform_file(&path).unwrap();
    let images = article.item_images();
    let names: Vec<_> = images.iter().map(|r| r.basename()).collect();
    assert_eq!(names, vec!["anim.gif", "photo.jpg", "shot.png"]);

    assert_eq!(images[0].data(), gif.as_slice());
    assert_eq!(decoded_shape(images[1].data()), (ImageFormat::Jpeg, 20, 10));
    assert_eq!(decoded_shape(images[2].data()), (ImageFormat::Png, 32, 32));
    assert_ne!(images[2].data(), png.as_slice(), "png should have been re-encoded");
}

#[test]
fn test_undecodable_image_aborts_article() {
    let root = tempdir().unwrap();
    let path = write_item(root.path(), "broken", "Broken\n======\n");
    write_resource(path.parent().unwrap(), "images", "bad.png", b"definitely not a png");

    let err = transformer().transform_file(&path).unwrap_err();
    assert!(matches!(err, ArticleError::ResourceDecode { .. }), "got {:?}", err);
    assert!(err.to_string().contains("bad.png"));
}

#[test]
fn test_missing_document_is_not_found() {
    let root = tempdir().unwrap();
    let err = transformer()
        .transform_file(root.path().join("ghost").join("ghost.rst"))
        .unwrap_err();
    assert!(matches!(err, ArticleError::NotFound(_)));
}

#[test]
fn test_find_article_path_then_transform() {
    let root = tempdir().unwrap();
    let path = write_item(root.path(), "hello", "Hello\n=====\n\n:date: 2020-01-02\n");
    let item_dir = path.parent().unwrap();
    std::fs::write(item_dir.join("README"), "not the article").unwrap();

    let found = find_article_path(item_dir).unwrap();
    assert_eq!(found, path);

    let article = transformer().transform_file(found).unwrap();
    assert_eq!(article.title(), "Hello");
    assert_eq!(article.date().date(), NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
}

#[test]
fn test_utf8_bom_document() {
    let root = tempdir().unwrap();
    let path = write_item(root.path(), "bom", "\u{feff}Caf\u{e9}\n====\n\n\u{fc}ber\n");

    let article = transformer().transform_file(&path).unwrap();
    assert_eq!(article.title(), "Caf\u{e9}");
    assert_eq!(article.content(), "<p>\u{fc}ber</p>\n");
}

#[test]
fn test_article_serializes_without_resource_bytes() {
    let root = tempdir().unwrap();
    let path = write_item(root.path(), "json", "Json\n====\n\n:categories: a;b\n");
    write_resource(path.parent().unwrap(), "files", "blob.bin", &[0u8, 1, 2, 3]);

    let article = transformer().transform_file(&path).unwrap();
    let value = serde_json::to_value(&article).unwrap();

    assert_eq!(value["title"], "Json");
    assert_eq!(value["item_files"][0]["original_url"], "files/blob.bin");
    assert!(value["item_files"][0].get("data").is_none());
}
