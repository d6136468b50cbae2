// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: decode/encode, colour conversions, raster filters, and inpainting.

pub mod color;
pub mod filters;
pub mod inpaint;
pub mod processor;

pub use processor::ImageProcessor;
