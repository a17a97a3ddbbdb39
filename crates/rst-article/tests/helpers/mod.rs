//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageFormat, Rgb, RgbImage};
use rst_article::{ArticleTransformer, FixedClock};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Route crate logs to the test harness; `RUST_LOG=rst_article=debug` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The instant every transformer built by [`transformer`] reports as "now".
pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

pub fn transformer() -> ArticleTransformer {
    ArticleTransformer::default().with_clock(Arc::new(FixedClock(fixed_now())))
}

/// Create `<root>/<name>/<name>.rst` and return the document path.
pub fn write_item(root: &Path, name: &str, source: &str) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{}.rst", name));
    fs::write(&path, source).unwrap();
    path
}

/// Write `data` to `<item_dir>/<subdir>/<name>`.
pub fn write_resource(item_dir: &Path, subdir: &str, name: &str, data: &[u8]) {
    let dir = item_dir.join(subdir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), data).unwrap();
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, 128]))
}

pub fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    gradient(width, height)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

/// PNG written with fast compression and no filtering, so a re-encode changes the bytes.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut bytes, CompressionType::Fast, FilterType::NoFilter);
    gradient(width, height).write_with_encoder(encoder).unwrap();
    bytes
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

pub fn gif_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(gradient(width, height))
        .to_rgba8()
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Gif)
        .unwrap();
    bytes
}

/// Decode `data` and return its detected format and dimensions.
pub fn decoded_shape(data: &[u8]) -> (ImageFormat, u32, u32) {
    let reader = image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .unwrap();
    let format = reader.format().unwrap();
    let decoded = reader.decode().unwrap();
    (format, decoded.width(), decoded.height())
}
