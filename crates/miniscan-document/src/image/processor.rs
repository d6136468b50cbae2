// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image codec: decode uploaded photos (JPEG, PNG, ...) into RGB rasters and
// encode scan results as lossless PNG. Uses the `image` crate.

use std::io::Cursor;

use image::{DynamicImage, ImageDecoder, ImageError, ImageFormat, ImageReader, RgbImage};
use miniscan_core::error::ScanError;
use tracing::{debug, info, instrument};

/// Smallest width or height the scan pipeline accepts.
pub const MIN_DIMENSION: u32 = 3;

/// A single decoded image on its way into or out of the scan pipeline.
///
/// ```ignore
/// let photo = ImageProcessor::from_bytes(&upload)?.to_rgb8();
/// let scan = scan_document(&photo, &ScanOptions::default());
/// let png = ImageProcessor::from_dynamic(scan.result.into_dynamic()).to_png_bytes()?;
/// ```
pub struct ImageProcessor {
    /// The current image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, ScanError> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(&data)
    }

    /// Decode raw encoded bytes (JPEG, PNG, etc.).
    ///
    /// The EXIF orientation tag is applied, so a portrait phone photo stored
    /// sideways comes out upright.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ScanError> {
        let decode_err = |err: ImageError| ScanError::Decode(err.to_string());

        let mut decoder = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|err| ScanError::Decode(err.to_string()))?
            .into_decoder()
            .map_err(decode_err)?;
        let orientation = decoder.orientation().map_err(decode_err)?;
        let mut img = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
        img.apply_orientation(orientation);

        info!(
            width = img.width(),
            height = img.height(),
            ?orientation,
            "Image decoded"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Three-channel copy for the scan pipeline. Alpha is dropped and gray
    /// images are expanded.
    pub fn to_rgb8(&self) -> RgbImage {
        self.image.to_rgb8()
    }

    /// Reject images too small to carry a document.
    pub fn ensure_scannable(&self) -> Result<(), ScanError> {
        let (w, h) = (self.width(), self.height());
        if w < MIN_DIMENSION || h < MIN_DIMENSION {
            return Err(ScanError::InvalidImage(format!(
                "{w}x{h} is below the {MIN_DIMENSION}x{MIN_DIMENSION} minimum"
            )));
        }
        Ok(())
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, ScanError> {
        encode_png(&self.image)
    }

    /// Write the image to a file as PNG, whatever the extension.
    pub fn save_png(&self, path: impl AsRef<std::path::Path>) -> Result<(), ScanError> {
        let bytes = self.to_png_bytes()?;
        std::fs::write(path.as_ref(), &bytes)?;
        debug!(path = %path.as_ref().display(), bytes = bytes.len(), "PNG written");
        Ok(())
    }
}

/// Encode a `DynamicImage` as PNG, returning the raw bytes.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, ScanError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|err| ScanError::Encode(err.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, GrayImage, ImageEncoder, Luma, Rgb};

    /// Little-endian TIFF block holding only an Orientation (0x0112) tag.
    fn exif_orientation(value: u8) -> Vec<u8> {
        let mut exif = vec![b'I', b'I', 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
        exif.extend_from_slice(&[0x01, 0x00]);
        exif.extend_from_slice(&[0x12, 0x01, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00]);
        exif.extend_from_slice(&[value, 0x00, 0x00, 0x00]);
        exif.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        exif
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let err = ImageProcessor::from_bytes(b"definitely not a png").err().unwrap();
        assert!(matches!(err, ScanError::Decode(_)));
    }

    #[test]
    fn png_round_trip_is_lossless_for_color() {
        let img = RgbImage::from_fn(17, 9, |x, y| Rgb([x as u8 * 13, y as u8 * 27, (x * y) as u8]));
        let bytes = encode_png(&DynamicImage::ImageRgb8(img.clone())).unwrap();
        let decoded = ImageProcessor::from_bytes(&bytes).unwrap().into_dynamic();
        assert_eq!(decoded.as_rgb8(), Some(&img));
    }

    #[test]
    fn png_round_trip_is_lossless_for_gray() {
        let img = GrayImage::from_fn(8, 8, |x, y| Luma([(x * 31 + y) as u8]));
        let bytes = encode_png(&DynamicImage::ImageLuma8(img.clone())).unwrap();
        let decoded = ImageProcessor::from_bytes(&bytes).unwrap().into_dynamic();
        assert_eq!(decoded.as_luma8(), Some(&img));
    }

    #[test]
    fn exif_orientation_is_applied() {
        // Stored landscape, tagged "rotate 90 clockwise" like a portrait phone shot.
        let mut img = RgbImage::from_pixel(40, 20, Rgb([200, 200, 200]));
        img.put_pixel(0, 0, Rgb([255, 0, 0]));

        let mut png = Vec::new();
        let mut encoder = PngEncoder::new(&mut png);
        encoder.set_exif_metadata(exif_orientation(6)).unwrap();
        encoder
            .write_image(img.as_raw(), 40, 20, ExtendedColorType::Rgb8)
            .unwrap();

        let decoded = ImageProcessor::from_bytes(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 40));
        let upright = decoded.to_rgb8();
        assert_eq!(*upright.get_pixel(19, 0), Rgb([255, 0, 0]));
    }

    #[test]
    fn untagged_images_keep_their_layout() {
        let bytes = encode_png(&DynamicImage::ImageRgb8(RgbImage::new(40, 20))).unwrap();
        let decoded = ImageProcessor::from_bytes(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 20));
    }

    #[test]
    fn tiny_images_are_not_scannable() {
        let tiny = ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(RgbImage::new(2, 5)));
        assert!(matches!(tiny.ensure_scannable(), Err(ScanError::InvalidImage(_))));
        let ok = ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(RgbImage::new(3, 3)));
        assert!(ok.ensure_scannable().is_ok());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ImageProcessor::open("/nonexistent/miniscan/photo.jpg").err().unwrap();
        assert!(matches!(err, ScanError::Io(_)));
    }
}
