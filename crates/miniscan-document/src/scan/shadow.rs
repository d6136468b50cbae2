// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shadow and illumination normalization: estimate the paper background
// and flatten it away, leaving ink detail.

use image::{GrayImage, Luma, RgbImage};
use imageproc::map::{blue_channel, green_channel, red_channel};
use imageproc::morphology::{Mask, grayscale_dilate};
use tracing::{debug, instrument};

use crate::image::color::to_gray;
use crate::image::filters::{Clahe, median_blur, merge_channels};

/// Radius of the square dilation that erases thin ink before background estimation (7x7).
const DILATE_RADIUS: u8 = 3;
/// Median aperture for the background estimate.
const BACKGROUND_APERTURE: u32 = 21;

/// Flatten lighting per colour channel.
///
/// For each channel: dilate (7x7) to erase text, median blur (21) to get the
/// background, then `255 - |plane - background|`. Paper becomes near white;
/// ink keeps its contrast against the local background.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn remove_shadow_color(image: &RgbImage) -> RgbImage {
    let dilation = Mask::square(DILATE_RADIUS);
    let planes = [red_channel(image), green_channel(image), blue_channel(image)].map(|plane| {
        let background = median_blur(&grayscale_dilate(&plane, &dilation), BACKGROUND_APERTURE);
        GrayImage::from_fn(plane.width(), plane.height(), |x, y| {
            let v = plane.get_pixel(x, y).0[0];
            let bg = background.get_pixel(x, y).0[0];
            Luma([255 - v.abs_diff(bg)])
        })
    });

    debug!("Colour shadow removal complete");
    merge_channels(&planes)
}

/// Flatten lighting on a grayscale copy and equalize local contrast.
///
/// Divides the image by its median-blurred (21) background, scaled to
/// 0..255, then applies CLAHE (clip 2.0, 8x8 tiles).
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn remove_shadow_gray(image: &RgbImage) -> GrayImage {
    let gray = to_gray(image);
    let background = median_blur(&gray, BACKGROUND_APERTURE);

    let corrected = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y).0[0] as f32;
        let bg = background.get_pixel(x, y).0[0] as f32;
        let scaled = if bg == 0.0 { 0.0 } else { v * 255.0 / bg };
        Luma([scaled.round().clamp(0.0, 255.0) as u8])
    });

    debug!("Grayscale shadow removal complete");
    Clahe::default().apply(&corrected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Paper lit from the left, with a dark text bar in the middle.
    fn shaded_page() -> RgbImage {
        let mut img = RgbImage::from_fn(120, 80, |x, _| {
            let level = (240 - x) as u8;
            Rgb([level, level, level.saturating_sub(5)])
        });
        for y in 38..42 {
            for x in 20..100 {
                img.put_pixel(x, y, Rgb([20, 20, 20]));
            }
        }
        img
    }

    #[test]
    fn color_variant_whitens_uneven_paper() {
        let out = remove_shadow_color(&shaded_page());
        assert_eq!(out.dimensions(), (120, 80));
        // Paper on both the bright and the shaded side ends up near white.
        for x in [5u32, 60, 115] {
            let Rgb([r, g, b]) = *out.get_pixel(x, 10);
            assert!(r >= 245 && g >= 245 && b >= 245, "({r},{g},{b}) at x={x}");
        }
    }

    #[test]
    fn color_variant_keeps_ink_dark() {
        let out = remove_shadow_color(&shaded_page());
        let ink = out.get_pixel(60, 40).0[0];
        let paper = out.get_pixel(60, 10).0[0];
        assert!(paper as i32 - ink as i32 > 100, "ink {ink}, paper {paper}");
    }

    #[test]
    fn ink_thinner_than_the_dilation_window_stays_dark() {
        // A 6-row bar fits inside the 7x7 window, so the background estimate
        // sees only paper and the bar keeps its full contrast.
        let mut img = RgbImage::from_pixel(60, 60, Rgb([230, 230, 230]));
        for y in 27..33 {
            for x in 10..50 {
                img.put_pixel(x, y, Rgb([30, 30, 30]));
            }
        }
        let out = remove_shadow_color(&img);
        for y in 27..33 {
            assert_eq!(*out.get_pixel(30, y), Rgb([55, 55, 55]), "row {y}");
        }
        assert_eq!(*out.get_pixel(30, 10), Rgb([255, 255, 255]));
    }

    #[test]
    fn color_variant_of_flat_image_is_white() {
        let img = RgbImage::from_pixel(30, 30, Rgb([90, 140, 60]));
        let out = remove_shadow_color(&img);
        assert!(out.pixels().all(|p| *p == Rgb([255, 255, 255])));
    }

    #[test]
    fn gray_variant_is_single_channel_and_keeps_size() {
        let out = remove_shadow_gray(&shaded_page());
        assert_eq!(out.dimensions(), (120, 80));
        let ink = out.get_pixel(60, 40).0[0];
        let paper = out.get_pixel(60, 10).0[0];
        assert!(paper > ink, "ink {ink}, paper {paper}");
    }

    #[test]
    fn gray_variant_handles_black_background() {
        let img = RgbImage::from_pixel(25, 25, Rgb([0, 0, 0]));
        let out = remove_shadow_gray(&img);
        let first = out.get_pixel(0, 0).0[0];
        assert!(out.pixels().all(|p| p.0[0] == first));
    }
}
