use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::error::{BlobError, BlobResult};

/// Default bounding box edge for thumbnails, in pixels.
pub const DEFAULT_THUMBNAIL_EDGE: u32 = 200;

/// Opaque `resize(image) -> thumbnail` capability.
///
/// Implementations take the original bytes and return encoded thumbnail
/// bytes; where those bytes land is the blob store's concern.
pub trait Thumbnailer: Send + Sync {
    fn render(&self, name: &str, original: &[u8]) -> BlobResult<Vec<u8>>;
}

/// Thumbnailer backed by the `image` crate.
///
/// Fits the image inside a `max_edge` x `max_edge` box, preserving aspect
/// ratio. Images already inside the box are re-encoded at their own size.
/// The output format follows the name's extension, falling back to PNG.
#[derive(Clone, Debug)]
pub struct ImageThumbnailer {
    max_edge: u32,
}

impl ImageThumbnailer {
    pub fn new(max_edge: u32) -> Self {
        Self {
            max_edge: max_edge.max(1),
        }
    }

    pub fn max_edge(&self) -> u32 {
        self.max_edge
    }
}

impl Default for ImageThumbnailer {
    fn default() -> Self {
        Self::new(DEFAULT_THUMBNAIL_EDGE)
    }
}

impl Thumbnailer for ImageThumbnailer {
    fn render(&self, name: &str, original: &[u8]) -> BlobResult<Vec<u8>> {
        let render_err = |e: image::ImageError| BlobError::Render {
            name: name.to_string(),
            reason: e.to_string(),
        };

        let img = image::load_from_memory(original).map_err(render_err)?;
        let (width, height) = GenericImageView::dimensions(&img);
        let fitted = if width > self.max_edge || height > self.max_edge {
            img.thumbnail(self.max_edge, self.max_edge)
        } else {
            img
        };

        let format = output_format(name);
        let encoded = match format {
            // JPEG has no alpha channel.
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(fitted.to_rgb8()),
            _ => fitted,
        };

        let mut buf = Cursor::new(Vec::new());
        encoded.write_to(&mut buf, format).map_err(render_err)?;
        Ok(buf.into_inner())
    }
}

fn output_format(name: &str) -> ImageFormat {
    ImageFormat::from_path(Path::new(name))
        .ok()
        .filter(|f| f.can_write())
        .unwrap_or(ImageFormat::Png)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    /// Encode a solid-colour PNG of the given size.
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgba([200u8, 30, 30, 255]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn decoded_dimensions(bytes: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(bytes).unwrap();
        GenericImageView::dimensions(&img)
    }

    #[test]
    fn wide_image_fits_box_preserving_ratio() {
        let thumb = ImageThumbnailer::default()
            .render("wide.png", &png_bytes(800, 200))
            .unwrap();
        assert_eq!(decoded_dimensions(&thumb), (200, 50));
    }

    #[test]
    fn tall_image_fits_box_preserving_ratio() {
        let thumb = ImageThumbnailer::new(100)
            .render("tall.png", &png_bytes(50, 400))
            .unwrap();
        let (w, h) = decoded_dimensions(&thumb);
        assert_eq!(h, 100);
        assert!(w <= 13 && w >= 12, "width {w}");
    }

    #[test]
    fn small_image_is_not_enlarged() {
        let thumb = ImageThumbnailer::default()
            .render("small.png", &png_bytes(40, 30))
            .unwrap();
        assert_eq!(decoded_dimensions(&thumb), (40, 30));
    }

    #[test]
    fn jpeg_name_encodes_jpeg() {
        let thumb = ImageThumbnailer::default()
            .render("photo.jpg", &png_bytes(300, 300))
            .unwrap();
        assert_eq!(image::guess_format(&thumb).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn unknown_extension_falls_back_to_png() {
        let thumb = ImageThumbnailer::default()
            .render("picture", &png_bytes(10, 10))
            .unwrap();
        assert_eq!(image::guess_format(&thumb).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn garbage_input_is_a_render_error() {
        let err = ImageThumbnailer::default()
            .render("junk.png", b"not an image")
            .unwrap_err();
        assert!(matches!(err, BlobError::Render { .. }));
    }
}
