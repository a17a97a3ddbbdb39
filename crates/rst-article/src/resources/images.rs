//! Image collection and re-encoding.
//!
//! Every file in the `images` directory is decoded (format guessed from the
//! content) and written back out in the format named by its extension. GIFs
//! are the exception and pass through byte for byte.

use crate::core::config::ImageConfig;
use crate::core::io::ResourceSource;
use crate::types::{Resource, ResourceKind};
use crate::{ArticleError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

fn extension(name: &str) -> &str {
    Path::new(name).extension().and_then(|ext| ext.to_str()).unwrap_or("")
}

fn is_passthrough(name: &str) -> bool {
    extension(name).eq_ignore_ascii_case("gif")
}

/// Output format identifier for a file name.
///
/// `.jpg` maps to `JPEG`; any other extension is upper-cased as is, so
/// `.tif` yields `TIF`, which has no encoder.
///
/// ```rust
/// use rst_article::resources::format_identifier;
///
/// assert_eq!(format_identifier("photo.JPG"), "JPEG");
/// assert_eq!(format_identifier("diagram.png"), "PNG");
/// assert_eq!(format_identifier("README"), "");
/// ```
pub fn format_identifier(name: &str) -> String {
    let ext = extension(name);
    if ext.eq_ignore_ascii_case("jpg") {
        "JPEG".to_string()
    } else {
        ext.to_uppercase()
    }
}

/// Encoder for a format identifier, if one exists.
pub fn encoder_format(identifier: &str) -> Option<ImageFormat> {
    Some(match identifier {
        "JPEG" => ImageFormat::Jpeg,
        "PNG" => ImageFormat::Png,
        "GIF" => ImageFormat::Gif,
        "BMP" => ImageFormat::Bmp,
        "TIFF" => ImageFormat::Tiff,
        "WEBP" => ImageFormat::WebP,
        "ICO" => ImageFormat::Ico,
        "TGA" => ImageFormat::Tga,
        "PNM" | "PPM" | "PGM" | "PBM" => ImageFormat::Pnm,
        "QOI" => ImageFormat::Qoi,
        _ => return None,
    })
}

/// Decode `data` and re-encode it as `identifier`.
///
/// JPEG output is RGB at `config.jpeg_quality`. With `config.optimize`, PNG
/// output uses the best compression level.
///
/// # Errors
///
/// `ArticleError::ResourceDecode` for undecodable input, an identifier with
/// no encoder, or an encoder failure.
pub fn transcode_image(data: &[u8], identifier: &str, config: &ImageConfig) -> Result<Vec<u8>> {
    let format = encoder_format(identifier)
        .ok_or_else(|| ArticleError::resource_decode(format!("No encoder for image format {:?}", identifier)))?;

    let image = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ArticleError::resource_decode_with_source(format!("Failed to read image format: {}", e), e))?
        .decode()
        .map_err(|e| ArticleError::resource_decode_with_source(format!("Failed to decode image: {}", e), e))?;

    let mut buffer = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buffer, config.jpeg_quality);
            DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
        }
        ImageFormat::Png => {
            let compression = if config.optimize {
                CompressionType::Best
            } else {
                CompressionType::Default
            };
            let encoder = PngEncoder::new_with_quality(&mut buffer, compression, FilterType::Adaptive);
            image.write_with_encoder(encoder)?;
        }
        other => image.write_to(&mut buffer, other)?,
    }
    Ok(buffer.into_inner())
}

fn with_name(err: ArticleError, name: &str) -> ArticleError {
    match err {
        ArticleError::ResourceDecode { message, source } => ArticleError::ResourceDecode {
            message: format!("{}: {}", name, message),
            source,
        },
        other => other,
    }
}

/// Collect the `images` directory of `source`.
///
/// A missing directory yields no resources. Any image that fails to transcode
/// aborts the whole collection.
pub fn collect_images(source: &dyn ResourceSource, config: &ImageConfig) -> Result<Vec<Resource>> {
    let dir = ResourceKind::Image.dir_name();
    let Some(names) = source.list_entries(dir)? else {
        return Ok(Vec::new());
    };

    let mut images = Vec::with_capacity(names.len());
    for name in names {
        let raw = source.read_entry(dir, &name)?;
        let data = if is_passthrough(&name) {
            raw
        } else {
            transcode_image(&raw, &format_identifier(&name), config).map_err(|e| with_name(e, &name))?
        };
        tracing::trace!(name = %name, bytes = data.len(), "collected image");
        images.push(Resource::new(ResourceKind::Image, name, data));
    }
    tracing::debug!(count = images.len(), "collected images");
    Ok(images)
}
