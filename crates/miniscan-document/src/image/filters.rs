// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-plane raster filters used by the scan stages: channel merge, median
// blur, contrast-limited adaptive histogram equalization (CLAHE), Gaussian
// adaptive thresholding, and 3x3 convolution.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::filter::median_filter;

/// Merge three equally sized planes back into an RGB image.
pub fn merge_channels(planes: &[GrayImage; 3]) -> RgbImage {
    let (w, h) = planes[0].dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        Rgb([
            planes[0].get_pixel(x, y).0[0],
            planes[1].get_pixel(x, y).0[0],
            planes[2].get_pixel(x, y).0[0],
        ])
    })
}

/// Mirror an out-of-range index back into `0..len` without repeating the
/// edge sample (`gfedcb|abcdefgh|gfedcba`).
#[inline]
pub(crate) fn reflect_101(mut i: i64, len: i64) -> i64 {
    if len == 1 {
        return 0;
    }
    loop {
        if i < 0 {
            i = -i;
        } else if i >= len {
            i = 2 * len - 2 - i;
        } else {
            return i;
        }
    }
}

/// Median blur over a square `aperture` (odd, e.g. 5 or 21). Edges replicate.
pub fn median_blur(plane: &GrayImage, aperture: u32) -> GrayImage {
    let radius = aperture / 2;
    median_filter(plane, radius, radius)
}

/// Standard deviation implied by a Gaussian kernel size when none is given.
pub fn gaussian_sigma_for_kernel(ksize: u32) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalised 1-D Gaussian kernel of odd length `ksize`.
fn gaussian_kernel(ksize: u32) -> Vec<f32> {
    let sigma = gaussian_sigma_for_kernel(ksize);
    let half = (ksize / 2) as f32;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let raw: Vec<f32> = (0..ksize)
        .map(|i| {
            let d = i as f32 - half;
            (-(d * d) / two_sigma_sq).exp()
        })
        .collect();
    let sum: f32 = raw.iter().sum();
    raw.into_iter().map(|v| v / sum).collect()
}

/// Separable Gaussian blur with an exact `ksize` kernel and replicated edges.
pub fn gaussian_blur_exact(plane: &GrayImage, ksize: u32) -> GrayImage {
    let (w, h) = plane.dimensions();
    let kernel = gaussian_kernel(ksize);
    let half = (ksize / 2) as i64;

    let mut rows = vec![0f32; (w * h) as usize];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = (x as i64 + k as i64 - half).clamp(0, w as i64 - 1) as u32;
                acc += weight * plane.get_pixel(sx, y).0[0] as f32;
            }
            rows[(y * w + x) as usize] = acc;
        }
    }

    GrayImage::from_fn(w, h, |x, y| {
        let mut acc = 0.0;
        for (k, weight) in kernel.iter().enumerate() {
            let sy = (y as i64 + k as i64 - half).clamp(0, h as i64 - 1) as u32;
            acc += weight * rows[(sy * w + x) as usize];
        }
        Luma([acc.round().clamp(0.0, 255.0) as u8])
    })
}

/// Binarize against a Gaussian-weighted local mean.
///
/// A pixel becomes 255 when it is brighter than `mean - offset`, where the
/// mean is taken over a `block_size` window; otherwise 0.
pub fn adaptive_threshold_gaussian(plane: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let mean = gaussian_blur_exact(plane, block_size);
    GrayImage::from_fn(plane.width(), plane.height(), |x, y| {
        let px = plane.get_pixel(x, y).0[0] as i32;
        let m = mean.get_pixel(x, y).0[0] as i32;
        Luma([if px - m > -offset { 255 } else { 0 }])
    })
}

/// Convolve with a 3x3 integer kernel. Borders reflect (101); results saturate.
pub fn convolve_3x3(plane: &GrayImage, kernel: &[[i32; 3]; 3]) -> GrayImage {
    let (w, h) = plane.dimensions();
    GrayImage::from_fn(w, h, |x, y| {
        let mut acc = 0i32;
        for (ky, row) in kernel.iter().enumerate() {
            for (kx, weight) in row.iter().enumerate() {
                if *weight == 0 {
                    continue;
                }
                let sx = reflect_101(x as i64 + kx as i64 - 1, w as i64) as u32;
                let sy = reflect_101(y as i64 + ky as i64 - 1, h as i64) as u32;
                acc += weight * plane.get_pixel(sx, sy).0[0] as i32;
            }
        }
        Luma([acc.clamp(0, 255) as u8])
    })
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is divided into a `tiles_x` x `tiles_y` grid. Each tile gets a
/// clipped, equalised histogram; pixels are mapped by bilinear interpolation
/// between the lookup tables of the four nearest tile centres. Tiles that
/// overhang the image are filled by reflection.
#[derive(Debug, Clone, Copy)]
pub struct Clahe {
    clip_limit: f32,
    tiles_x: u32,
    tiles_y: u32,
}

impl Default for Clahe {
    /// Clip limit 2.0 on an 8x8 grid.
    fn default() -> Self {
        Self::new(2.0, 8, 8)
    }
}

impl Clahe {
    pub fn new(clip_limit: f32, tiles_x: u32, tiles_y: u32) -> Self {
        Self {
            clip_limit,
            tiles_x: tiles_x.max(1),
            tiles_y: tiles_y.max(1),
        }
    }

    pub fn apply(&self, plane: &GrayImage) -> GrayImage {
        let (w, h) = plane.dimensions();
        if w == 0 || h == 0 {
            return plane.clone();
        }

        let tile_w = w.div_ceil(self.tiles_x);
        let tile_h = h.div_ceil(self.tiles_y);
        let luts = self.tile_luts(plane, tile_w, tile_h);

        let (tx_max, ty_max) = (self.tiles_x as i64 - 1, self.tiles_y as i64 - 1);
        let inv_tw = 1.0 / tile_w as f32;
        let inv_th = 1.0 / tile_h as f32;

        GrayImage::from_fn(w, h, |x, y| {
            let v = plane.get_pixel(x, y).0[0] as usize;

            let tyf = y as f32 * inv_th - 0.5;
            let ty1 = tyf.floor() as i64;
            let ya = tyf - ty1 as f32;
            let (ty2, ty1) = ((ty1 + 1).min(ty_max), ty1.max(0));

            let txf = x as f32 * inv_tw - 0.5;
            let tx1 = txf.floor() as i64;
            let xa = txf - tx1 as f32;
            let (tx2, tx1) = ((tx1 + 1).min(tx_max), tx1.max(0));

            let lut = |tx: i64, ty: i64| luts[(ty * self.tiles_x as i64 + tx) as usize][v] as f32;
            let top = lut(tx1, ty1) * (1.0 - xa) + lut(tx2, ty1) * xa;
            let bottom = lut(tx1, ty2) * (1.0 - xa) + lut(tx2, ty2) * xa;
            let value = top * (1.0 - ya) + bottom * ya;
            Luma([value.round().clamp(0.0, 255.0) as u8])
        })
    }

    fn tile_luts(&self, plane: &GrayImage, tile_w: u32, tile_h: u32) -> Vec<[u8; 256]> {
        let (w, h) = plane.dimensions();
        let tile_area = (tile_w * tile_h) as f32;
        let clip = if self.clip_limit > 0.0 {
            ((self.clip_limit * tile_area / 256.0) as u32).max(1)
        } else {
            u32::MAX
        };
        let lut_scale = 255.0 / tile_area;

        let mut luts = Vec::with_capacity((self.tiles_x * self.tiles_y) as usize);
        for ty in 0..self.tiles_y {
            for tx in 0..self.tiles_x {
                let mut hist = [0u32; 256];
                for y in ty * tile_h..(ty + 1) * tile_h {
                    let sy = reflect_101(y as i64, h as i64) as u32;
                    for x in tx * tile_w..(tx + 1) * tile_w {
                        let sx = reflect_101(x as i64, w as i64) as u32;
                        hist[plane.get_pixel(sx, sy).0[0] as usize] += 1;
                    }
                }

                clip_histogram(&mut hist, clip);

                let mut lut = [0u8; 256];
                let mut sum = 0u32;
                for (bin, slot) in hist.iter().zip(lut.iter_mut()) {
                    sum += bin;
                    *slot = (sum as f32 * lut_scale).round().clamp(0.0, 255.0) as u8;
                }
                luts.push(lut);
            }
        }
        luts
    }
}

/// Cap every bin at `clip` and spread the excess evenly over all bins.
fn clip_histogram(hist: &mut [u32; 256], clip: u32) {
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }
    if excess == 0 {
        return;
    }

    let batch = excess / 256;
    let mut residual = excess - batch * 256;
    for bin in hist.iter_mut() {
        *bin += batch;
    }
    if residual > 0 {
        let step = (256 / residual as usize).max(1);
        let mut i = 0;
        while i < 256 && residual > 0 {
            hist[i] += 1;
            i += step;
            residual -= 1;
        }
    }
}
