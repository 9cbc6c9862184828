pub mod crop;
pub mod detection;
pub mod extractor;
pub mod geometry;
pub mod models;
pub mod persist;

pub use crop::{CropChain, CropOutput, CropRequest, CropStrategy};
pub use detection::{BarcodeDetector, DetectionOutcome, DetectorChain};
pub use extractor::{BarcodeExtractor, ExtractOptions};
pub use models::{
    BoundingBox, CropRegion, CropResult, CropSummary, DetectedBarcode, Point, Symbology,
};
