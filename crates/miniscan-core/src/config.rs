// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{ScanMode, ScanOptions};

/// File name of the persisted configuration inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Persistent application settings.
///
/// Every field has a default, so a partial `config.json` still loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Tone mode used when none is given on the command line.
    pub default_mode: ScanMode,
    /// Detect and rectify the document outline.
    pub auto_crop: bool,
    /// Inpaint coloured pen and highlighter marks.
    pub remove_colored_notes: bool,
    /// Also write the rectified (unenhanced) document next to the result.
    pub save_rectified: bool,
    /// Also write the cleanup mask when note removal produced one.
    pub save_mask: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_mode: ScanMode::Onix,
            auto_crop: true,
            remove_colored_notes: false,
            save_rectified: false,
            save_mask: true,
        }
    }
}

impl AppConfig {
    /// Pipeline options implied by this configuration.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            mode: self.default_mode.clone(),
            auto_crop: self.auto_crop,
            remove_colored_notes: self.remove_colored_notes,
        }
    }

    /// Load the config from `data_dir`, or `None` if it is missing or unreadable.
    pub fn load(data_dir: &Path) -> Option<Self> {
        let data = std::fs::read_to_string(data_dir.join(CONFIG_FILE)).ok()?;
        serde_json::from_str(&data).ok()
    }

    /// Write the config to `data_dir` as pretty-printed JSON.
    pub fn persist(&self, data_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(data_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(data_dir.join(CONFIG_FILE), json)?;
        Ok(())
    }
}
