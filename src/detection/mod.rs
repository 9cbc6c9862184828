pub mod preprocessing;
pub mod quick;

#[cfg(feature = "enhanced")]
pub mod multiformat;

use anyhow::Result;
use async_trait::async_trait;
use image::DynamicImage;
use rxing::{BarcodeFormat, RXingResult};

use crate::geometry;
use crate::models::{BoundingBox, DetectedBarcode, Point, Symbology};

/// Linear results whose point envelope is flatter than this fraction of its
/// width are widened into a band; decoders report 1-D symbols as a scanline.
const FLAT_ENVELOPE_RATIO: f32 = 0.12;
/// Band height as a fraction of the envelope width.
const LINEAR_BAND_RATIO: f32 = 0.35;
/// Floor for the synthesized band height, in pixels.
const MIN_BAND_HEIGHT: f32 = 24.0;

/// A barcode detection provider.
///
/// Implementations return every symbol they located, or an empty vector when
/// the image simply contains none. An `Err` means the provider itself failed;
/// the chain catches it and moves on to the next provider.
#[async_trait]
pub trait BarcodeDetector: Send + Sync {
    async fn detect(&self, image: &DynamicImage) -> Result<Vec<DetectedBarcode>>;

    /// Human-readable name for this provider (used in verbose output)
    fn name(&self) -> &str;
}

/// Result of running the detector chain.
#[derive(Debug, Clone)]
pub enum DetectionOutcome {
    /// At least one barcode was located; never empty.
    Found(Vec<DetectedBarcode>),
    NotFound(String),
}

/// Ordered list of providers, tried in sequence.
///
/// A provider error or empty result moves on to the next provider; only when
/// every provider comes up empty does the chain report `NotFound`.
pub struct DetectorChain {
    detectors: Vec<Box<dyn BarcodeDetector>>,
    pub verbose: bool,
}

impl DetectorChain {
    pub fn new() -> Self {
        Self::from_detectors(default_detectors())
    }

    pub fn from_detectors(detectors: Vec<Box<dyn BarcodeDetector>>) -> Self {
        Self {
            detectors,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Append a provider to the end of the chain.
    pub fn push(&mut self, detector: Box<dyn BarcodeDetector>) {
        self.detectors.push(detector);
    }

    pub async fn detect(&self, image: &DynamicImage) -> DetectionOutcome {
        for detector in &self.detectors {
            if self.verbose {
                println!("[detect] trying {} detector", detector.name());
            }
            match detector.detect(image).await {
                Ok(barcodes) if !barcodes.is_empty() => {
                    if self.verbose {
                        println!(
                            "[detect] {} detector found {} barcode(s)",
                            detector.name(),
                            barcodes.len()
                        );
                    }
                    return DetectionOutcome::Found(barcodes);
                }
                Ok(_) => {
                    if self.verbose {
                        println!("[detect] {} detector found nothing", detector.name());
                    }
                }
                Err(e) => {
                    if self.verbose {
                        println!("[detect] {} detector failed: {e}", detector.name());
                    }
                }
            }
        }
        DetectionOutcome::NotFound("no barcode found in the image".to_string())
    }
}

impl Default for DetectorChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Providers available in this build, preferred first.
pub fn default_detectors() -> Vec<Box<dyn BarcodeDetector>> {
    let mut detectors: Vec<Box<dyn BarcodeDetector>> = Vec::new();
    #[cfg(feature = "enhanced")]
    detectors.push(Box::new(multiformat::MultiFormatDetector::new()));
    detectors.push(Box::new(quick::QuickDetector));
    detectors
}

pub(crate) fn symbology_from_format(format: &BarcodeFormat) -> Symbology {
    match format {
        BarcodeFormat::CODE_128 => Symbology::Code128,
        BarcodeFormat::CODE_39 => Symbology::Code39,
        BarcodeFormat::CODE_93 => Symbology::Code93,
        BarcodeFormat::CODABAR => Symbology::Codabar,
        BarcodeFormat::EAN_13 => Symbology::Ean13,
        BarcodeFormat::EAN_8 => Symbology::Ean8,
        BarcodeFormat::ITF => Symbology::Itf,
        BarcodeFormat::UPC_A => Symbology::UpcA,
        BarcodeFormat::UPC_E => Symbology::UpcE,
        BarcodeFormat::QR_CODE => Symbology::QrCode,
        BarcodeFormat::DATA_MATRIX => Symbology::DataMatrix,
        BarcodeFormat::PDF_417 => Symbology::Pdf417,
        BarcodeFormat::AZTEC => Symbology::Aztec,
        _ => Symbology::Unknown,
    }
}

/// Map one decoder result into the uniform barcode shape.
///
/// Result coordinates are divided by `scale` to land back in source-image
/// pixels. Corner points are only reported when the decoder gave at least
/// four of them; the bounding box is the point envelope, widened into a band
/// for flat linear results and dropped entirely when degenerate. Either
/// geometry field may therefore be absent independently of the other.
pub(crate) fn normalize_result(
    result: &RXingResult,
    scale: f32,
    image_width: u32,
    image_height: u32,
) -> DetectedBarcode {
    let format = symbology_from_format(result.getBarcodeFormat());
    let points: Vec<Point> = result
        .getPoints()
        .iter()
        .map(|p| Point::new(p.x / scale, p.y / scale))
        .collect();

    let corner_points = (points.len() >= geometry::MIN_CORNER_POINTS).then(|| points.clone());
    let bounding_box = geometry::envelope(&points)
        .and_then(|env| normalize_envelope(env, format, image_width as f32, image_height as f32));

    DetectedBarcode {
        value: result.getText().to_string(),
        format,
        bounding_box,
        corner_points,
    }
}

fn normalize_envelope(
    env: BoundingBox,
    format: Symbology,
    max_width: f32,
    max_height: f32,
) -> Option<BoundingBox> {
    if env.width <= 0.0 {
        return None;
    }

    if format.is_linear() && env.height < env.width * FLAT_ENVELOPE_RATIO {
        let target = (env.width * LINEAR_BAND_RATIO)
            .max(MIN_BAND_HEIGHT)
            .min(max_height);
        let center_y = env.y + env.height / 2.0;
        let mut min_y = center_y - target / 2.0;
        let mut max_y = center_y + target / 2.0;
        if min_y < 0.0 {
            max_y -= min_y;
            min_y = 0.0;
        }
        if max_y > max_height {
            min_y = (min_y - (max_y - max_height)).max(0.0);
            max_y = max_height;
        }
        let x = env.x.max(0.0);
        return Some(BoundingBox {
            x,
            y: min_y,
            width: env.width.min(max_width - x),
            height: max_y - min_y,
        });
    }

    if env.height <= 0.0 {
        return None;
    }
    Some(env)
}
