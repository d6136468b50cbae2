// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Colour-space conversions on 8-bit RGB buffers: luma, HSV, and CIE L*a*b*.
//
// All conversions use the 8-bit scaling conventions common to document
// scanners: hue in 0..180, saturation/value in 0..255, and Lab with L scaled
// to 0..255 and a/b offset by 128.

use image::{GrayImage, Luma, Rgb, RgbImage};

/// D65 reference white, X component.
const WHITE_X: f32 = 0.950_456;
/// D65 reference white, Z component.
const WHITE_Z: f32 = 1.088_754;

/// Threshold between the linear and cube-root segments of the Lab curve.
const LAB_EPSILON: f32 = 0.008_856;
const LAB_KAPPA: f32 = 903.3;

/// Convert RGB to 8-bit luma with BT.601 weights (0.299, 0.587, 0.114).
///
/// Fixed-point with 14 fractional bits, rounded to nearest.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    ((r as u32 * R + g as u32 * G + b as u32 * B + (1 << 13)) >> 14) as u8
}

/// Grayscale a whole image.
pub fn to_gray(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgb([r, g, b]) = *image.get_pixel(x, y);
        Luma([luma(r, g, b)])
    })
}

/// Convert one RGB pixel to 8-bit HSV `[h, s, v]`.
///
/// `h` is degrees halved (0..180); `s` and `v` span 0..255.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let v = max;
    let delta = (max - min) as f32;

    let s = if max == 0 {
        0
    } else {
        (255.0 * delta / max as f32).round() as u8
    };

    let h = if delta == 0.0 {
        0.0
    } else {
        let (rf, gf, bf) = (r as f32, g as f32, b as f32);
        let degrees = if max == r {
            60.0 * (gf - bf) / delta
        } else if max == g {
            120.0 + 60.0 * (bf - rf) / delta
        } else {
            240.0 + 60.0 * (rf - gf) / delta
        };
        if degrees < 0.0 { degrees + 360.0 } else { degrees }
    };

    [((h / 2.0).round() as u32 % 180) as u8, s, v]
}

/// sRGB transfer function, 0..1 encoded to 0..1 linear.
#[inline]
fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Inverse sRGB transfer function.
#[inline]
fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[inline]
fn lab_f(t: f32) -> f32 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

#[inline]
fn lab_f_inv(f: f32) -> f32 {
    let cube = f * f * f;
    if cube > LAB_EPSILON {
        cube
    } else {
        (f - 16.0 / 116.0) / 7.787
    }
}

#[inline]
fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Convert one RGB pixel to 8-bit Lab `[l, a, b]`.
pub fn rgb_to_lab(r: u8, g: u8, b: u8) -> [u8; 3] {
    let rl = srgb_to_linear(r as f32 / 255.0);
    let gl = srgb_to_linear(g as f32 / 255.0);
    let bl = srgb_to_linear(b as f32 / 255.0);

    let x = (0.412_453 * rl + 0.357_580 * gl + 0.180_423 * bl) / WHITE_X;
    let y = 0.212_671 * rl + 0.715_160 * gl + 0.072_169 * bl;
    let z = (0.019_334 * rl + 0.119_193 * gl + 0.950_227 * bl) / WHITE_Z;

    let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));
    let l = if y > LAB_EPSILON {
        116.0 * fy - 16.0
    } else {
        LAB_KAPPA * y
    };
    let a = 500.0 * (fx - fy);
    let b = 200.0 * (fy - fz);

    [to_u8(l * 255.0 / 100.0), to_u8(a + 128.0), to_u8(b + 128.0)]
}

/// Convert one 8-bit Lab pixel back to RGB.
pub fn lab_to_rgb(l: u8, a: u8, b: u8) -> [u8; 3] {
    let l = l as f32 * 100.0 / 255.0;
    let a = a as f32 - 128.0;
    let b = b as f32 - 128.0;

    let fy = (l + 16.0) / 116.0;
    let y = if l > LAB_KAPPA * LAB_EPSILON {
        fy * fy * fy
    } else {
        l / LAB_KAPPA
    };
    let x = lab_f_inv(fy + a / 500.0) * WHITE_X;
    let z = lab_f_inv(fy - b / 200.0) * WHITE_Z;

    let rl = 3.240_479 * x - 1.537_150 * y - 0.498_535 * z;
    let gl = -0.969_256 * x + 1.875_991 * y + 0.041_556 * z;
    let bl = 0.055_648 * x - 0.204_043 * y + 1.057_311 * z;

    let encode = |c: f32| to_u8(linear_to_srgb(c.clamp(0.0, 1.0)) * 255.0);
    [encode(rl), encode(gl), encode(bl)]
}
