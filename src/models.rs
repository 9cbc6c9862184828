use std::fmt;
use std::path::PathBuf;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Barcode symbology as reported by a detection provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbology {
    Code128,
    Code39,
    Code93,
    Codabar,
    Ean13,
    Ean8,
    Itf,
    UpcA,
    UpcE,
    QrCode,
    DataMatrix,
    Pdf417,
    Aztec,
    Unknown,
}

impl Symbology {
    /// True for linear (1-D) symbologies, false for matrix codes and Unknown.
    pub fn is_linear(&self) -> bool {
        matches!(
            self,
            Symbology::Code128
                | Symbology::Code39
                | Symbology::Code93
                | Symbology::Codabar
                | Symbology::Ean13
                | Symbology::Ean8
                | Symbology::Itf
                | Symbology::UpcA
                | Symbology::UpcE
        )
    }

    /// Stable identifier used in generated file names.
    pub fn code(&self) -> &'static str {
        match self {
            Symbology::Code128 => "CODE_128",
            Symbology::Code39 => "CODE_39",
            Symbology::Code93 => "CODE_93",
            Symbology::Codabar => "CODABAR",
            Symbology::Ean13 => "EAN_13",
            Symbology::Ean8 => "EAN_8",
            Symbology::Itf => "ITF",
            Symbology::UpcA => "UPC_A",
            Symbology::UpcE => "UPC_E",
            Symbology::QrCode => "QR_CODE",
            Symbology::DataMatrix => "DATA_MATRIX",
            Symbology::Pdf417 => "PDF417",
            Symbology::Aztec => "AZTEC",
            Symbology::Unknown => "UNKNOWN",
        }
    }

    /// Human-readable name, e.g. "CODE 128" or "EAN-13".
    pub fn display_name(&self) -> &'static str {
        match self {
            Symbology::Code128 => "CODE 128",
            Symbology::Code39 => "CODE 39",
            Symbology::Code93 => "CODE 93",
            Symbology::Codabar => "CODABAR",
            Symbology::Ean13 => "EAN-13",
            Symbology::Ean8 => "EAN-8",
            Symbology::Itf => "ITF",
            Symbology::UpcA => "UPC-A",
            Symbology::UpcE => "UPC-E",
            Symbology::QrCode => "QR CODE",
            Symbology::DataMatrix => "DATA MATRIX",
            Symbology::Pdf417 => "PDF417",
            Symbology::Aztec => "AZTEC",
            Symbology::Unknown => "UNKNOWN",
        }
    }

    /// Every symbology this crate models, Unknown included.
    pub fn all() -> &'static [Symbology] {
        &[
            Symbology::Code128,
            Symbology::Code39,
            Symbology::Code93,
            Symbology::Codabar,
            Symbology::Ean13,
            Symbology::Ean8,
            Symbology::Itf,
            Symbology::UpcA,
            Symbology::UpcE,
            Symbology::QrCode,
            Symbology::DataMatrix,
            Symbology::Pdf417,
            Symbology::Aztec,
            Symbology::Unknown,
        ]
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A corner of a detected symbol, in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box around a detected symbol, in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One located symbol.
///
/// `value` and `format` are always populated when detection succeeds. The
/// geometry fields are independently optional: a provider may report a
/// bounding box without corner points and vice versa, and neither may be
/// assumed present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedBarcode {
    pub value: String,
    pub format: Symbology,
    pub bounding_box: Option<BoundingBox>,
    pub corner_points: Option<Vec<Point>>,
}

/// Rectangle applied to the source image to produce the cropped output.
/// Coordinates are non-negative by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Intersect with an image of the given dimensions.
    /// Returns None when nothing of the region lies inside the image.
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Option<CropRegion> {
        if self.x >= image_width || self.y >= image_height {
            return None;
        }
        let width = self.width.min(image_width - self.x);
        let height = self.height.min(image_height - self.y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(CropRegion {
            x: self.x,
            y: self.y,
            width,
            height,
        })
    }
}

/// Outcome of one extraction. Created fresh per invocation, never cached.
#[derive(Debug, Clone)]
pub struct CropResult {
    /// False only when no provider found a barcode at all.
    pub success: bool,
    /// Absent only when detection itself failed.
    pub cropped_image: Option<DynamicImage>,
    pub barcode: Option<DetectedBarcode>,
    /// None when the original image was returned unmodified.
    pub crop_region: Option<CropRegion>,
    /// Present only when persistence was requested and succeeded.
    pub persisted_path: Option<PathBuf>,
    /// Present only when persistence was requested and failed; the crop
    /// fields above stay valid in that case.
    pub persist_error: Option<String>,
    /// Human-readable note when a fallback was used.
    pub diagnostic: Option<String>,
}

impl CropResult {
    /// Result for total detection failure, the only non-success outcome.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            success: false,
            cropped_image: None,
            barcode: None,
            crop_region: None,
            persisted_path: None,
            persist_error: None,
            diagnostic: Some(message.into()),
        }
    }

    /// Serializable view without the image payload.
    pub fn summary(&self) -> CropSummary {
        CropSummary {
            success: self.success,
            value: self.barcode.as_ref().map(|b| b.value.clone()),
            format: self.barcode.as_ref().map(|b| b.format),
            crop_region: self.crop_region,
            persisted_path: self.persisted_path.clone(),
            persist_error: self.persist_error.clone(),
            diagnostic: self.diagnostic.clone(),
        }
    }
}

/// Machine-readable summary of a [`CropResult`].
#[derive(Debug, Clone, Serialize)]
pub struct CropSummary {
    pub success: bool,
    pub value: Option<String>,
    pub format: Option<Symbology>,
    pub crop_region: Option<CropRegion>,
    pub persisted_path: Option<PathBuf>,
    pub persist_error: Option<String>,
    pub diagnostic: Option<String>,
}
