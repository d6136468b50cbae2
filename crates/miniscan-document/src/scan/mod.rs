// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline: boundary detection, rectification, shadow removal,
// coloured-note inpainting, and tone modes.

pub mod contour;
pub mod enhance;
pub mod geometry;
pub mod notes;
pub mod output;
pub mod pipeline;
pub mod shadow;

pub use contour::detect_document_contour;
pub use enhance::enhance_document;
pub use geometry::{Point, Quad, four_point_transform, order_points};
pub use notes::{mask_coverage, remove_colored_writing};
pub use output::{ScanImage, ScanResult};
pub use pipeline::{scan_bytes, scan_document};
pub use shadow::{remove_shadow_color, remove_shadow_gray};
