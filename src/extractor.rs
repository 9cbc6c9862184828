//! The extraction pipeline: detect, resolve geometry, crop, persist.

use std::path::{Path, PathBuf};

use anyhow::Result;
use image::{DynamicImage, ImageReader};

use crate::crop::CropChain;
use crate::detection::{DetectionOutcome, DetectorChain};
use crate::geometry;
use crate::models::CropResult;
use crate::persist;

/// Options for one extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Save the cropped image into the barcode directory.
    pub persist: bool,
    /// File name for the saved crop; generated from the barcode when absent.
    pub file_name: Option<String>,
    /// Directory to save into; the default home-relative directory when absent.
    pub output_dir: Option<PathBuf>,
}

/// The pipeline entry point.
///
/// Holds no state across invocations; concurrent extractions are independent.
/// Detection failure is the only non-success outcome — once a barcode is
/// decoded, cropping degrades through the strategy chain but never fails the
/// extraction.
pub struct BarcodeExtractor {
    pub detectors: DetectorChain,
    pub crops: CropChain,
    pub verbose: bool,
}

impl BarcodeExtractor {
    pub fn new() -> Self {
        Self {
            detectors: DetectorChain::new(),
            crops: CropChain::new(),
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self.detectors.verbose = verbose;
        self.crops.verbose = verbose;
        self
    }

    /// Run detection only.
    pub async fn detect(&self, image: &DynamicImage) -> DetectionOutcome {
        self.detectors.detect(image).await
    }

    /// Load an image from disk and extract. Errors only when the file cannot
    /// be read or decoded.
    pub async fn extract(&self, image_path: &Path, options: &ExtractOptions) -> Result<CropResult> {
        if self.verbose {
            println!("[extract] loading image: {}", image_path.display());
        }
        let image = ImageReader::open(image_path)?
            .decode()
            .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
        self.extract_image(&image, options).await
    }

    /// Extract from an already-decoded image.
    pub async fn extract_image(
        &self,
        image: &DynamicImage,
        options: &ExtractOptions,
    ) -> Result<CropResult> {
        let barcodes = match self.detectors.detect(image).await {
            DetectionOutcome::Found(barcodes) => barcodes,
            DetectionOutcome::NotFound(message) => {
                if self.verbose {
                    println!("[extract] detection failed: {message}");
                }
                return Ok(CropResult::not_found(message));
            }
        };

        // Only the first detected barcode is used when several are found.
        let Some(barcode) = barcodes.into_iter().next() else {
            return Ok(CropResult::not_found("no barcode found in the image"));
        };
        if self.verbose {
            println!(
                "[extract] detected barcode: {} ({})",
                barcode.value, barcode.format
            );
        }

        let region = geometry::resolve_region(&barcode);
        if self.verbose {
            match region {
                Some(r) => println!(
                    "[extract] resolved crop region: x={} y={} {}x{}",
                    r.x, r.y, r.width, r.height
                ),
                None => println!("[extract] barcode carries no geometry"),
            }
        }

        let (output, diagnostic) = self.crops.run(image, &barcode, region);

        let mut persisted_path = None;
        let mut persist_error = None;
        if options.persist {
            match persist::save_barcode_image(
                &output.image,
                options.file_name.as_deref(),
                &barcode,
                options.output_dir.as_deref(),
                self.verbose,
            ) {
                Ok(path) => persisted_path = Some(path),
                Err(e) => {
                    if self.verbose {
                        println!("[persist] failed: {e:#}");
                    }
                    persist_error = Some(format!("{e:#}"));
                }
            }
        }

        Ok(CropResult {
            success: true,
            cropped_image: Some(output.image),
            barcode: Some(barcode),
            crop_region: output.region,
            persisted_path,
            persist_error,
            diagnostic,
        })
    }
}

impl Default for BarcodeExtractor {
    fn default() -> Self {
        Self::new()
    }
}
