// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// miniscan-document: Image processing for the Mini Scanner.
//
// Provides image decode/encode, raster filters (CLAHE, adaptive threshold,
// inpainting), and the scanning pipeline (page detection, perspective
// rectification, shadow removal, note removal, tone modes).

pub mod image;
pub mod scan;

// Re-export the primary entry points so callers can use `miniscan_document::scan_document` etc.
pub use crate::image::processor::{ImageProcessor, encode_png};
pub use scan::{ScanImage, ScanResult, scan_bytes, scan_document};
