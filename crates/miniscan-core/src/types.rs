// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the scanning pipeline.

use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Tone-mapping preset applied as the last pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Sharpened, contrast-equalised grayscale.
    #[default]
    Onix,
    /// Shadow-free colour with equalised lightness.
    Color,
    /// Plain grayscale.
    Gray,
    /// Adaptive black-and-white, for printed text.
    Bw,
    /// Any other name. The enhancer passes the shadow-free image through.
    #[serde(untagged)]
    Other(String),
}

impl ScanMode {
    /// The presets offered to users, in menu order.
    pub const PRESETS: [ScanMode; 4] = [ScanMode::Onix, ScanMode::Color, ScanMode::Gray, ScanMode::Bw];

    /// Lenient parse: unknown names become [`ScanMode::Other`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "onix" => Self::Onix,
            "color" | "colour" => Self::Color,
            "gray" | "grey" => Self::Gray,
            "bw" => Self::Bw,
            _ => Self::Other(name.to_owned()),
        }
    }

    /// Short lowercase name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Onix => "onix",
            Self::Color => "color",
            Self::Gray => "gray",
            Self::Bw => "bw",
            Self::Other(name) => name,
        }
    }
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse, used where the user picks from the preset list.
impl std::str::FromStr for ScanMode {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::parse(s) {
            Self::Other(name) => Err(ScanError::UnknownMode(name)),
            mode => Ok(mode),
        }
    }
}

/// Per-request parameters for the scan orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Tone mode applied to the final result.
    pub mode: ScanMode,
    /// Detect the page outline and rectify its perspective.
    pub auto_crop: bool,
    /// Inpaint saturated pen and highlighter marks before enhancement.
    pub remove_colored_notes: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            mode: ScanMode::Onix,
            auto_crop: true,
            remove_colored_notes: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_presets_case_insensitively() {
        assert_eq!(ScanMode::parse("ONIX"), ScanMode::Onix);
        assert_eq!(ScanMode::parse(" color "), ScanMode::Color);
        assert_eq!(ScanMode::parse("grey"), ScanMode::Gray);
        assert_eq!(ScanMode::parse("bw"), ScanMode::Bw);
    }

    #[test]
    fn lenient_parse_keeps_unknown_names() {
        assert_eq!(ScanMode::parse("xyz"), ScanMode::Other("xyz".into()));
        assert_eq!(ScanMode::parse("xyz").as_str(), "xyz");
    }

    #[test]
    fn strict_parse_rejects_unknown_names() {
        assert_eq!("gray".parse::<ScanMode>().unwrap(), ScanMode::Gray);
        let err = "sepia".parse::<ScanMode>().unwrap_err();
        assert!(matches!(err, ScanError::UnknownMode(ref name) if name == "sepia"));
    }

    #[test]
    fn mode_serializes_lowercase() {
        let json = serde_json::to_string(&ScanMode::Bw).unwrap();
        assert_eq!(json, "\"bw\"");
        let back: ScanMode = serde_json::from_str("\"onix\"").unwrap();
        assert_eq!(back, ScanMode::Onix);
        let other: ScanMode = serde_json::from_str("\"sepia\"").unwrap();
        assert_eq!(other, ScanMode::Other("sepia".into()));
    }

    #[test]
    fn default_options() {
        let opts = ScanOptions::default();
        assert_eq!(opts.mode, ScanMode::Onix);
        assert!(opts.auto_crop);
        assert!(!opts.remove_colored_notes);
    }
}
