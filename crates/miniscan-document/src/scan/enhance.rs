// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tone modes: the final look of a scan (onix, color, gray, bw).

use image::{GrayImage, Luma, Rgb, RgbImage};
use miniscan_core::ScanMode;
use tracing::{debug, info, instrument, warn};

use crate::image::color::{lab_to_rgb, rgb_to_lab, to_gray};
use crate::image::filters::{Clahe, adaptive_threshold_gaussian, convolve_3x3};
use crate::scan::output::ScanImage;
use crate::scan::shadow::remove_shadow_color;

/// Window of the local mean used for black-and-white thresholding.
const BW_BLOCK_SIZE: u32 = 25;
/// How far below the local mean a pixel must fall to turn black.
const BW_OFFSET: i32 = 15;

/// Unsharp kernel applied by the onix mode.
const SHARPEN_KERNEL: [[i32; 3]; 3] = [[0, -1, 0], [-1, 5, -1], [0, -1, 0]];

/// Apply a tone mode.
///
/// Shadows are always flattened first (colour variant). Then:
///
/// - `Color`: CLAHE on the Lab lightness only, hue and chroma untouched.
/// - `Gray`: luma of the shadow-free image.
/// - `Bw`: Gaussian adaptive threshold (block 25, offset 15); only 0 and 255.
/// - `Onix`: luma, CLAHE, then a 3x3 sharpen.
/// - anything else: the shadow-free colour image as-is.
#[instrument(skip(image), fields(width = image.width(), height = image.height(), mode = %mode))]
pub fn enhance_document(image: &RgbImage, mode: &ScanMode) -> ScanImage {
    info!("Enhancing document");
    let shadow_free = remove_shadow_color(image);

    let result = match mode {
        ScanMode::Color => ScanImage::Color(equalize_lightness(&shadow_free)),
        ScanMode::Gray => ScanImage::Gray(to_gray(&shadow_free)),
        ScanMode::Bw => {
            let gray = to_gray(&shadow_free);
            ScanImage::Gray(adaptive_threshold_gaussian(&gray, BW_BLOCK_SIZE, BW_OFFSET))
        }
        ScanMode::Onix => {
            let equalized = Clahe::default().apply(&to_gray(&shadow_free));
            ScanImage::Gray(convolve_3x3(&equalized, &SHARPEN_KERNEL))
        }
        ScanMode::Other(name) => {
            warn!(mode = %name, "Unrecognised scan mode; returning shadow-free image");
            ScanImage::Color(shadow_free)
        }
    };

    debug!(channels = result.channels(), "Enhancement complete");
    result
}

/// CLAHE on the L channel of Lab; a and b pass through.
fn equalize_lightness(image: &RgbImage) -> RgbImage {
    let lab: Vec<[u8; 3]> = image
        .pixels()
        .map(|&Rgb([r, g, b])| rgb_to_lab(r, g, b))
        .collect();

    let lightness = GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([lab[(y * image.width() + x) as usize][0]])
    });
    let equalized = Clahe::default().apply(&lightness);

    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [_, a, b] = lab[(y * image.width() + x) as usize];
        let l = equalized.get_pixel(x, y).0[0];
        Rgb(lab_to_rgb(l, a, b))
    })
}
