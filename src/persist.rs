//! Saving cropped barcode images to a stable on-device location.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use time::OffsetDateTime;

use crate::models::DetectedBarcode;

/// Directory under the user's home that barcode images land in by default.
pub const DEFAULT_DIR: &str = ".barcrop/barcodes";

/// Resolve the directory barcode images are saved into.
/// An explicit directory wins; otherwise the default under the home directory.
pub fn resolve_dir(output_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = output_dir {
        return Ok(dir.to_path_buf());
    }
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("no home directory to place barcode images in")?;
    Ok(Path::new(&home).join(DEFAULT_DIR))
}

/// File name for a saved crop: the suggestion when given, otherwise
/// `barcode_{value}_{format}_{timestamp}`. The extension is forced to
/// .jpg/.png either way.
pub fn build_file_name(suggested: Option<&str>, barcode: &DetectedBarcode) -> String {
    let mut name = match suggested {
        Some(name) => name.to_string(),
        None => {
            let timestamp = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
            format!(
                "barcode_{}_{}_{}",
                sanitize(&barcode.value),
                barcode.format.code(),
                timestamp
            )
        }
    };
    if !name.ends_with(".jpg") && !name.ends_with(".png") {
        name.push_str(".jpg");
    }
    name
}

/// Keep file names portable; barcode payloads can contain anything.
fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Write the image into the barcode directory, creating the directory if it
/// does not exist yet. Returns the path of the saved file.
pub fn save_barcode_image(
    image: &DynamicImage,
    suggested_name: Option<&str>,
    barcode: &DetectedBarcode,
    output_dir: Option<&Path>,
    verbose: bool,
) -> Result<PathBuf> {
    let dir = resolve_dir(output_dir)?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create barcode directory {}", dir.display()))?;

    let path = dir.join(build_file_name(suggested_name, barcode));

    // JPEG carries no alpha channel; flatten before encoding.
    if path.extension().is_some_and(|ext| ext == "jpg") {
        DynamicImage::ImageRgb8(image.to_rgb8())
            .save(&path)
            .map_err(|e| anyhow!("failed to save barcode image: {e}"))?;
    } else {
        image
            .save(&path)
            .map_err(|e| anyhow!("failed to save barcode image: {e}"))?;
    }

    if verbose {
        println!("[persist] saved barcode image to {}", path.display());
    }
    Ok(path)
}
