use anyhow::Result;
use async_trait::async_trait;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb};
use rxing::common::BitMatrix;
use rxing::{BarcodeFormat, MultiFormatWriter, Writer};
use tempfile::NamedTempFile;

use barcrop::crop::{CropOutput, CropRequest, CropStrategy};
use barcrop::{
    BarcodeDetector, BarcodeExtractor, BoundingBox, DetectedBarcode, DetectorChain, Point,
    Symbology,
};

/// Module size in pixels when rendering synthetic barcodes.
const MODULE_SCALE: u32 = 6;
/// White border around rendered barcodes; decoders need a quiet zone.
const QUIET_ZONE: u32 = 48;
/// Rendered height of 1-D barcodes, whose matrices are a single row.
const LINEAR_HEIGHT: u32 = 120;

/// Render a barcode of the given format into a grayscale image.
pub fn encode_barcode(value: &str, format: &BarcodeFormat) -> GrayImage {
    let writer = MultiFormatWriter::default();
    let matrix = writer
        .encode(value, format, 0, 0)
        .expect("failed to encode test barcode");
    render_matrix(&matrix)
}

fn render_matrix(matrix: &BitMatrix) -> GrayImage {
    let content_w = matrix.width() * MODULE_SCALE;
    let content_h = if matrix.height() == 1 {
        LINEAR_HEIGHT
    } else {
        matrix.height() * MODULE_SCALE
    };
    let width = content_w + 2 * QUIET_ZONE;
    let height = content_h + 2 * QUIET_ZONE;

    let mut img = GrayImage::from_pixel(width, height, Luma([255u8]));
    for y in 0..content_h {
        let src_y = if matrix.height() == 1 { 0 } else { y / MODULE_SCALE };
        for x in 0..content_w {
            if matrix.get(x / MODULE_SCALE, src_y) {
                img.put_pixel(x + QUIET_ZONE, y + QUIET_ZONE, Luma([0u8]));
            }
        }
    }
    img
}

/// Write a synthetic QR photo to a temp PNG file.
pub fn create_qr_image(value: &str) -> NamedTempFile {
    save_temp(encode_barcode(value, &BarcodeFormat::QR_CODE))
}

/// Write a synthetic CODE 128 photo to a temp PNG file.
pub fn create_code128_image(value: &str) -> NamedTempFile {
    save_temp(encode_barcode(value, &BarcodeFormat::CODE_128))
}

/// A plain white image with no barcode in it.
pub fn create_blank_image() -> NamedTempFile {
    save_temp(GrayImage::from_pixel(400, 300, Luma([255u8])))
}

fn save_temp(img: GrayImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("failed to save test image");
    file
}

/// A plain white photo of the given size.
pub fn white_photo(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb([255u8, 255, 255])))
}

pub fn barcode_with_bbox(format: Symbology, bbox: BoundingBox) -> DetectedBarcode {
    DetectedBarcode {
        value: "TEST-0001".to_string(),
        format,
        bounding_box: Some(bbox),
        corner_points: None,
    }
}

pub fn barcode_with_corners(format: Symbology, corners: Vec<Point>) -> DetectedBarcode {
    DetectedBarcode {
        value: "TEST-0001".to_string(),
        format,
        bounding_box: None,
        corner_points: Some(corners),
    }
}

/// A decoded barcode with no geometry at all.
pub fn bare_barcode(format: Symbology) -> DetectedBarcode {
    DetectedBarcode {
        value: "TEST-0001".to_string(),
        format,
        bounding_box: None,
        corner_points: None,
    }
}

/// Detector that always reports the configured barcode.
pub struct StubDetector {
    pub barcode: DetectedBarcode,
}

#[async_trait]
impl BarcodeDetector for StubDetector {
    async fn detect(&self, _image: &DynamicImage) -> Result<Vec<DetectedBarcode>> {
        Ok(vec![self.barcode.clone()])
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Detector that always errors, for exercising the provider fallback.
pub struct ErrDetector;

#[async_trait]
impl BarcodeDetector for ErrDetector {
    async fn detect(&self, _image: &DynamicImage) -> Result<Vec<DetectedBarcode>> {
        anyhow::bail!("simulated provider failure")
    }

    fn name(&self) -> &str {
        "err"
    }
}

/// Crop strategy that always errors, for exercising the crop fallback.
pub struct FailingStrategy;

impl CropStrategy for FailingStrategy {
    fn crop(&self, _request: &CropRequest<'_>) -> Result<CropOutput> {
        anyhow::bail!("simulated crop failure")
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Extractor whose only detection provider is a stub for the given barcode.
pub fn stub_extractor(barcode: DetectedBarcode) -> BarcodeExtractor {
    let mut extractor = BarcodeExtractor::new();
    extractor.detectors = DetectorChain::from_detectors(vec![Box::new(StubDetector { barcode })]);
    extractor
}
