use anyhow::{Result, anyhow};
use async_trait::async_trait;
use image::DynamicImage;
use rxing::common::HybridBinarizer;
use rxing::{BinaryBitmap, Exceptions, Luma8LuminanceSource, MultiFormatReader, Reader};

use super::{BarcodeDetector, normalize_result, preprocessing};
use crate::models::DetectedBarcode;

/// Baseline provider: a single decode pass over the raw grayscale image,
/// no hints and no preprocessing. Always present in the chain.
pub struct QuickDetector;

#[async_trait]
impl BarcodeDetector for QuickDetector {
    async fn detect(&self, image: &DynamicImage) -> Result<Vec<DetectedBarcode>> {
        let gray = preprocessing::to_grayscale(image);
        let (width, height) = gray.dimensions();

        let source = Luma8LuminanceSource::new(gray.into_raw(), width, height);
        let mut bitmap = BinaryBitmap::new(HybridBinarizer::new(source));
        let mut reader = MultiFormatReader::default();

        match reader.decode(&mut bitmap) {
            Ok(result) => Ok(vec![normalize_result(&result, 1.0, width, height)]),
            Err(Exceptions::NotFoundException(_)) => Ok(Vec::new()),
            Err(e) => Err(anyhow!("quick detector failed: {e}")),
        }
    }

    fn name(&self) -> &str {
        "quick"
    }
}
