// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan orchestrator: crop, note removal, and tone mapping in one call.

use image::RgbImage;
use miniscan_core::error::ScanError;
use miniscan_core::ScanOptions;
use tracing::{debug, info, instrument, warn};

use crate::image::processor::ImageProcessor;
use crate::scan::contour::detect_document_contour;
use crate::scan::enhance::enhance_document;
use crate::scan::geometry::four_point_transform;
use crate::scan::notes::{mask_coverage, remove_colored_writing};
use crate::scan::output::ScanResult;

/// Run the full pipeline on a decoded photo.
///
/// ## Stages
///
/// 1. Boundary detection and perspective rectification (when `auto_crop`)
/// 2. Coloured-note inpainting (when `remove_colored_notes`)
/// 3. Tone mapping with `options.mode`
///
/// A photo without a detectable page is scanned whole. A boundary that
/// cannot be warped is treated the same way.
#[instrument(skip(image, options), fields(
    width = image.width(),
    height = image.height(),
    mode = %options.mode,
    auto_crop = options.auto_crop,
    remove_notes = options.remove_colored_notes,
))]
pub fn scan_document(image: &RgbImage, options: &ScanOptions) -> ScanResult {
    info!("Scanning document");
    let mut document = image.clone();

    if options.auto_crop {
        match detect_document_contour(&document) {
            Some(quad) => match four_point_transform(&document, quad) {
                Ok(rectified) => {
                    info!(
                        out_w = rectified.width(),
                        out_h = rectified.height(),
                        "Document cropped"
                    );
                    document = rectified;
                }
                Err(e) => warn!(error = %e, "Boundary could not be rectified; keeping full frame"),
            },
            None => debug!("No boundary; keeping full frame"),
        }
    }

    let mut mask = None;
    if options.remove_colored_notes {
        let (cleaned, note_mask) = remove_colored_writing(&document);
        info!(coverage = mask_coverage(&note_mask), "Coloured notes processed");
        document = cleaned;
        mask = Some(note_mask);
    }

    let result = enhance_document(&document, &options.mode);
    info!(
        out_w = result.width(),
        out_h = result.height(),
        channels = result.channels(),
        "Scan complete"
    );

    ScanResult {
        result,
        document,
        mask,
    }
}

/// Decode an uploaded image and scan it.
///
/// Fails with [`ScanError::Decode`] for unreadable data and
/// [`ScanError::InvalidImage`] for images too small to process.
pub fn scan_bytes(data: &[u8], options: &ScanOptions) -> Result<ScanResult, ScanError> {
    let processor = ImageProcessor::from_bytes(data)?;
    processor.ensure_scannable()?;
    Ok(scan_document(&processor.to_rgb8(), options))
}
