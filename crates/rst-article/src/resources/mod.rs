//! Resource collectors for the `images` and `files` directories beside a document.

mod files;
mod images;

pub use files::collect_files;
pub use images::{collect_images, encoder_format, format_identifier, transcode_image};
