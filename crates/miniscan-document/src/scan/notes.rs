// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coloured-note removal: find vivid pen and highlighter ink and inpaint it
// from the surrounding paper.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;
use tracing::{debug, info, instrument};

use crate::image::color::rgb_to_hsv;
use crate::image::filters::median_blur;
use crate::image::inpaint::inpaint_telea;

/// Minimum HSV saturation (0..255) for a pixel to count as coloured ink.
///
/// Informally tuned; kept as-is until calibrated against real scans.
pub const SATURATION_MIN: u8 = 60;
/// HSV value (0..255) at or above which a pixel is treated as paper.
///
/// Very bright highlighter and very dark coloured ink are missed.
pub const VALUE_MAX: u8 = 230;

/// Median aperture that removes speckle from the mask.
const MASK_SMOOTH_APERTURE: u32 = 5;
/// Neighbourhood radius for inpainting.
const INPAINT_RADIUS: u32 = 3;

/// Mask of pixels that look like coloured ink: saturation above
/// [`SATURATION_MIN`] and value below [`VALUE_MAX`]. 255 = ink, 0 = keep.
pub fn colored_ink_mask(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgb([r, g, b]) = *image.get_pixel(x, y);
        let [_, s, v] = rgb_to_hsv(r, g, b);
        Luma([if s > SATURATION_MIN && v < VALUE_MAX { 255 } else { 0 }])
    })
}

/// Remove coloured writing and return `(cleaned, mask)`.
///
/// The raw ink mask is dilated by one pixel (3x3) to cover anti-aliased
/// stroke edges, median filtered (5) to drop speckle, then every masked
/// pixel is inpainted (radius 3). An image without coloured ink comes back
/// unchanged with an all-zero mask.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn remove_colored_writing(image: &RgbImage) -> (RgbImage, GrayImage) {
    let raw = colored_ink_mask(image);
    let grown = dilate(&raw, Norm::LInf, 1);
    let mask = median_blur(&grown, MASK_SMOOTH_APERTURE);

    let coverage = mask_coverage(&mask);
    debug!(coverage, "Coloured ink mask built");

    if coverage == 0.0 {
        return (image.clone(), mask);
    }

    let cleaned = inpaint_telea(image, &mask, INPAINT_RADIUS);
    info!(coverage, "Coloured notes inpainted");
    (cleaned, mask)
}

/// Fraction of mask pixels that are set, 0.0..=1.0.
pub fn mask_coverage(mask: &GrayImage) -> f64 {
    let total = mask.width() as u64 * mask.height() as u64;
    if total == 0 {
        return 0.0;
    }
    let set = mask.pixels().filter(|p| p.0[0] != 0).count() as u64;
    set as f64 / total as f64
}
