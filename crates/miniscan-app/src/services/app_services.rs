// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: owns the persisted configuration and turns a photo
// on disk into scan results on disk.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use miniscan_core::error::Result;
use miniscan_core::{AppConfig, ScanOptions};
use miniscan_document::scan::mask_coverage;
use miniscan_document::{ImageProcessor, ScanResult, scan_document};
use tracing::{info, warn};

use super::data_dir;

/// Where each artefact of a scan should be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// The enhanced page.
    pub result: PathBuf,
    /// The rectified page before enhancement, if wanted.
    pub rectified: Option<PathBuf>,
    /// The note-removal mask, if wanted (only written when one exists).
    pub mask: Option<PathBuf>,
}

/// What a finished scan left on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    /// Fraction of the page that was inpainted, when note removal ran.
    pub mask_coverage: Option<f64>,
    pub written: Vec<PathBuf>,
}

/// Configuration plus the directory it lives in.
pub struct AppServices {
    data_dir: PathBuf,
    config: AppConfig,
}

impl AppServices {
    /// Use the platform data directory. Call once at startup.
    pub fn init() -> Self {
        Self::with_data_dir(data_dir::data_dir())
    }

    /// Use an explicit data directory; a missing or unreadable config falls
    /// back to defaults.
    pub fn with_data_dir(dir: PathBuf) -> Self {
        let config = match AppConfig::load(&dir) {
            Some(config) => config,
            None => {
                info!(path = %dir.display(), "no saved config; using defaults");
                AppConfig::default()
            }
        };
        Self {
            data_dir: dir,
            config,
        }
    }

    // -- Config --------------------------------------------------------------

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Replace the configuration and write it to disk.
    pub fn update_config(&mut self, config: AppConfig) -> Result<()> {
        config.persist(&self.data_dir)?;
        info!(path = %self.data_dir.display(), "config saved");
        self.config = config;
        Ok(())
    }

    // -- Scanning ------------------------------------------------------------

    /// Scan the photo at `input` and write the requested outputs.
    pub fn scan_file(
        &self,
        input: &Path,
        options: &ScanOptions,
        outputs: &OutputPaths,
    ) -> Result<ScanReport> {
        let photo = ImageProcessor::open(input)?;
        photo.ensure_scannable()?;
        let scan = scan_document(&photo.to_rgb8(), options);
        write_outputs(scan, outputs)
    }
}

fn write_outputs(scan: ScanResult, outputs: &OutputPaths) -> Result<ScanReport> {
    let ScanResult {
        result,
        document,
        mask,
    } = scan;

    let mut report = ScanReport {
        width: result.width(),
        height: result.height(),
        channels: result.channels(),
        mask_coverage: mask.as_ref().map(mask_coverage),
        written: Vec::new(),
    };

    ImageProcessor::from_dynamic(result.into_dynamic()).save_png(&outputs.result)?;
    report.written.push(outputs.result.clone());

    if let Some(path) = &outputs.rectified {
        ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(document)).save_png(path)?;
        report.written.push(path.clone());
    }

    match (&outputs.mask, mask) {
        (Some(path), Some(mask)) => {
            ImageProcessor::from_dynamic(DynamicImage::ImageLuma8(mask)).save_png(path)?;
            report.written.push(path.clone());
        }
        (Some(path), None) => {
            warn!(path = %path.display(), "mask requested but note removal is off; not written");
        }
        _ => {}
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use miniscan_core::error::ScanError;
    use miniscan_core::ScanMode;

    fn write_photo(dir: &Path) -> PathBuf {
        let mut img = RgbImage::from_pixel(120, 100, Rgb([30, 30, 30]));
        for y in 20..80 {
            for x in 20..100 {
                img.put_pixel(x, y, Rgb([240, 240, 235]));
            }
        }
        for y in 45..50 {
            for x in 35..85 {
                img.put_pixel(x, y, Rgb([40, 60, 200]));
            }
        }
        let path = dir.join("photo.png");
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let services = AppServices::with_data_dir(dir.path().to_path_buf());
        assert_eq!(services.config(), &AppConfig::default());
    }

    #[test]
    fn updated_config_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let mut services = AppServices::with_data_dir(dir.path().to_path_buf());
        let config = AppConfig {
            default_mode: ScanMode::Bw,
            remove_colored_notes: true,
            ..AppConfig::default()
        };
        services.update_config(config.clone()).unwrap();

        let reloaded = AppServices::with_data_dir(dir.path().to_path_buf());
        assert_eq!(reloaded.config(), &config);
    }

    #[test]
    fn scan_file_writes_every_requested_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_photo(dir.path());
        let outputs = OutputPaths {
            result: dir.path().join("scan.png"),
            rectified: Some(dir.path().join("rectified.png")),
            mask: Some(dir.path().join("mask.png")),
        };
        let options = ScanOptions {
            remove_colored_notes: true,
            ..ScanOptions::default()
        };

        let services = AppServices::with_data_dir(dir.path().to_path_buf());
        let report = services.scan_file(&input, &options, &outputs).unwrap();

        assert_eq!(report.written.len(), 3);
        assert_eq!(report.channels, 1);
        assert!(report.mask_coverage.is_some_and(|c| c > 0.0));
        let saved = image::open(&outputs.result).unwrap();
        assert_eq!((saved.width(), saved.height()), (report.width, report.height));
        assert!(outputs.mask.as_ref().unwrap().exists());
    }

    #[test]
    fn mask_is_skipped_without_note_removal() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_photo(dir.path());
        let outputs = OutputPaths {
            result: dir.path().join("scan.png"),
            rectified: None,
            mask: Some(dir.path().join("mask.png")),
        };

        let services = AppServices::with_data_dir(dir.path().to_path_buf());
        let report = services
            .scan_file(&input, &ScanOptions::default(), &outputs)
            .unwrap();

        assert_eq!(report.written, vec![outputs.result.clone()]);
        assert!(report.mask_coverage.is_none());
        assert!(!dir.path().join("mask.png").exists());
    }

    #[test]
    fn unreadable_input_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, "not a photo").unwrap();
        let outputs = OutputPaths {
            result: dir.path().join("scan.png"),
            rectified: None,
            mask: None,
        };

        let services = AppServices::with_data_dir(dir.path().to_path_buf());
        let err = services
            .scan_file(&input, &ScanOptions::default(), &outputs)
            .unwrap_err();
        assert!(matches!(err, ScanError::Decode(_)));
    }
}
