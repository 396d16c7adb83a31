//! Rendered label bitmaps.

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageEncoder};
use std::sync::Arc;

use crate::barcode::BarcodeValue;
use crate::error::EtiquetaError;

/// Pixel value for bars and text
pub const BLACK: u8 = 0;
/// Pixel value for background and quiet zones
pub const WHITE: u8 = 255;

/// # Rendered Label
///
/// An 8-bit grayscale label canvas plus the value it shows.
///
/// The pixel buffer lives behind an `Arc`: cloning is cheap and every clone
/// is a read-only view of the same pixels. Nothing hands out `&mut` access,
/// so scaling for print or preview always works on a derived copy and the
/// cached bitmap stays exactly as the renderer produced it.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    value: BarcodeValue,
    bitmap: Arc<GrayImage>,
}

impl RenderedImage {
    pub fn new(value: BarcodeValue, bitmap: GrayImage) -> Self {
        Self {
            value,
            bitmap: Arc::new(bitmap),
        }
    }

    pub fn value(&self) -> &BarcodeValue {
        &self.value
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    pub fn bitmap(&self) -> &GrayImage {
        &self.bitmap
    }

    /// Row-major pixel bytes, one byte per pixel.
    pub fn pixels(&self) -> &[u8] {
        self.bitmap.as_raw()
    }

    pub fn is_black(&self, x: u32, y: u32) -> bool {
        self.bitmap.get_pixel(x, y).0[0] == BLACK
    }

    /// Whether two images are views of the same underlying buffer.
    pub fn shares_pixels_with(&self, other: &RenderedImage) -> bool {
        Arc::ptr_eq(&self.bitmap, &other.bitmap)
    }

    /// Downscaled copy for on-screen preview.
    pub fn thumbnail(&self, width: u32, height: u32) -> GrayImage {
        imageops::resize(self.bitmap.as_ref(), width, height, FilterType::Lanczos3)
    }

    /// Encode the label as PNG bytes.
    pub fn to_png(&self) -> Result<Vec<u8>, EtiquetaError> {
        encode_png(&self.bitmap)
    }
}

impl PartialEq for RenderedImage {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
            && self.bitmap.dimensions() == other.bitmap.dimensions()
            && self.bitmap.as_raw() == other.bitmap.as_raw()
    }
}

impl Eq for RenderedImage {}

/// Encode any grayscale bitmap as PNG bytes.
pub fn encode_png(img: &GrayImage) -> Result<Vec<u8>, EtiquetaError> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::L8,
        )
        .map_err(|e: image::ImageError| EtiquetaError::Image(e.to_string()))?;

    Ok(png_bytes)
}
