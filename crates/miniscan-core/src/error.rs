// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Mini Scanner.

use thiserror::Error;

/// Top-level error type for all scanning operations.
///
/// There is no variant for a missing document boundary: detection returns
/// `None` and the scan continues uncropped.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Codec errors --
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    // -- Pipeline errors --
    #[error("invalid rectification geometry: {0}")]
    InvalidGeometry(String),

    #[error("image too small to process: {0}")]
    InvalidImage(String),

    #[error("unknown scan mode: {0}")]
    UnknownMode(String),

    // -- Storage / configuration --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;
