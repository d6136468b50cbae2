// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people scanning documents.
//
// Every technical error is mapped to plain English with a clear suggestion.

use crate::error::ScanError;
use crate::types::ScanMode;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user can fix it (different photo, different option).
    ActionRequired,
    /// Retrying the same input will fail the same way.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Severity level.
    pub severity: Severity,
}

/// The preset mode names, comma separated.
fn preset_names() -> String {
    ScanMode::PRESETS
        .iter()
        .map(ScanMode::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convert a `ScanError` into a `HumanError`.
pub fn humanize_error(err: &ScanError) -> HumanError {
    match err {
        ScanError::Decode(_) => HumanError {
            message: "Unable to read the image file.".into(),
            suggestion: "Upload a JPEG or PNG photo of your document.".into(),
            severity: Severity::ActionRequired,
        },

        ScanError::Encode(detail) => HumanError {
            message: "Unable to encode the image for download.".into(),
            suggestion: format!("Try a different scan mode. ({detail})"),
            severity: Severity::Permanent,
        },

        ScanError::InvalidGeometry(_) => HumanError {
            message: "The document outline could not be straightened.".into(),
            suggestion: "Turn off auto crop, or take the photo straight on with the whole page visible.".into(),
            severity: Severity::ActionRequired,
        },

        ScanError::InvalidImage(detail) => HumanError {
            message: "The image is too small to scan.".into(),
            suggestion: format!("Use a larger photo of the document. ({detail})"),
            severity: Severity::ActionRequired,
        },

        ScanError::UnknownMode(name) => HumanError {
            message: format!("\"{name}\" is not a scan mode."),
            suggestion: format!("Choose one of: {}.", preset_names()),
            severity: Severity::ActionRequired,
        },

        ScanError::Io(io_err) => HumanError {
            message: "A file could not be read or written.".into(),
            suggestion: format!("Check the file path and permissions. ({io_err})"),
            severity: Severity::ActionRequired,
        },

        ScanError::Config(_) => HumanError {
            message: "The saved settings could not be stored.".into(),
            suggestion: "Check that the settings folder is writable.".into(),
            severity: Severity::Permanent,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_reads_like_upload_failure() {
        let human = humanize_error(&ScanError::Decode("bad magic".into()));
        assert_eq!(human.message, "Unable to read the image file.");
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn encode_error_is_permanent() {
        let human = humanize_error(&ScanError::Encode("png writer".into()));
        assert_eq!(human.severity, Severity::Permanent);
        assert!(human.suggestion.contains("png writer"));
    }

    #[test]
    fn unknown_mode_lists_presets() {
        let human = humanize_error(&ScanError::UnknownMode("sepia".into()));
        assert!(human.message.contains("sepia"));
        assert_eq!(human.suggestion, "Choose one of: onix, color, gray, bw.");
    }

    #[test]
    fn io_error_carries_detail() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.png");
        let human = humanize_error(&ScanError::from(io));
        assert!(human.suggestion.contains("missing.png"));
    }
}
