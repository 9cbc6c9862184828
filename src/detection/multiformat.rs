use anyhow::{Result, anyhow};
use async_trait::async_trait;
use image::{DynamicImage, GrayImage};
use rxing::common::HybridBinarizer;
use rxing::multi::{GenericMultipleBarcodeReader, MultipleBarcodeReader};
use rxing::{
    BinaryBitmap, DecodeHintValue, DecodeHints, Exceptions, Luma8LuminanceSource, MultiFormatReader,
};

use super::{BarcodeDetector, normalize_result, preprocessing};
use crate::models::DetectedBarcode;

/// Decode scales tried in order; the reduced pass rescues very large photos.
const DETECT_SCALES: [f32; 2] = [1.0, 0.5];

/// High-accuracy provider: histogram equalization, TryHarder and inverted
/// passes through the multi-symbol reader, retried at reduced scales.
/// Result coordinates are mapped back into source-image pixels.
pub struct MultiFormatDetector {
    pub scales: Vec<f32>,
}

impl MultiFormatDetector {
    pub fn new() -> Self {
        Self {
            scales: DETECT_SCALES.to_vec(),
        }
    }
}

impl Default for MultiFormatDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BarcodeDetector for MultiFormatDetector {
    async fn detect(&self, image: &DynamicImage) -> Result<Vec<DetectedBarcode>> {
        let (source_width, source_height) = (image.width(), image.height());
        let gray = preprocessing::to_grayscale(image);
        let equalized = preprocessing::equalize(&gray);

        let hints = DecodeHints::default()
            .with(DecodeHintValue::TryHarder(true))
            .with(DecodeHintValue::AlsoInverted(true));

        for &scale in &self.scales {
            let scaled = if (scale - 1.0).abs() < f32::EPSILON {
                equalized.clone()
            } else {
                preprocessing::downscale(&equalized, scale)
            };
            let barcodes = decode_all(&scaled, scale, &hints, source_width, source_height)?;
            if !barcodes.is_empty() {
                return Ok(barcodes);
            }
        }
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "multi-format"
    }
}

fn decode_all(
    gray: &GrayImage,
    scale: f32,
    hints: &DecodeHints,
    source_width: u32,
    source_height: u32,
) -> Result<Vec<DetectedBarcode>> {
    let (width, height) = gray.dimensions();
    let source = Luma8LuminanceSource::new(gray.as_raw().clone(), width, height);
    let mut bitmap = BinaryBitmap::new(HybridBinarizer::new(source));
    let mut reader = GenericMultipleBarcodeReader::new(MultiFormatReader::default());

    match reader.decode_multiple_with_hints(&mut bitmap, hints) {
        Ok(results) => Ok(results
            .iter()
            .map(|r| normalize_result(r, scale, source_width, source_height))
            .collect()),
        Err(Exceptions::NotFoundException(_)) => Ok(Vec::new()),
        Err(e) => Err(anyhow!("multi-format decode failed: {e}")),
    }
}
