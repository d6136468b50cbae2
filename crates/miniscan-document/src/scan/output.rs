// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline outputs.

use image::{DynamicImage, GrayImage, RgbImage};

/// A tone-mapped result: single-channel for onix/gray/bw, colour otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanImage {
    Gray(GrayImage),
    Color(RgbImage),
}

impl ScanImage {
    pub fn width(&self) -> u32 {
        match self {
            Self::Gray(img) => img.width(),
            Self::Color(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Self::Gray(img) => img.height(),
            Self::Color(img) => img.height(),
        }
    }

    /// Number of samples per pixel (1 or 3).
    pub fn channels(&self) -> u8 {
        match self {
            Self::Gray(_) => 1,
            Self::Color(_) => 3,
        }
    }

    pub fn as_gray(&self) -> Option<&GrayImage> {
        match self {
            Self::Gray(img) => Some(img),
            Self::Color(_) => None,
        }
    }

    pub fn as_color(&self) -> Option<&RgbImage> {
        match self {
            Self::Color(img) => Some(img),
            Self::Gray(_) => None,
        }
    }

    pub fn into_dynamic(self) -> DynamicImage {
        match self {
            Self::Gray(img) => DynamicImage::ImageLuma8(img),
            Self::Color(img) => DynamicImage::ImageRgb8(img),
        }
    }
}

/// Everything a scan produces.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// The enhanced, tone-mapped page.
    pub result: ScanImage,
    /// The page after cropping/rectification and note removal, before
    /// enhancement. The untouched input when no boundary was found.
    pub document: RgbImage,
    /// Cleanup mask, present only when note removal was requested.
    pub mask: Option<GrayImage>,
}
