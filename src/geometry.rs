//! Crop-region derivation from detected barcode geometry.
//!
//! Detectors report vertically loose and horizontally tight regions relative
//! to the printed symbol, so padding is asymmetric: the region is widened
//! horizontally and tightened vertically. All ratios and default rectangles
//! are tuning constants, tuned for typical photographed-gifticon resolutions.

use crate::models::{BoundingBox, CropRegion, DetectedBarcode, Point, Symbology};

/// Horizontal padding ratio for linear (1-D) symbols.
pub const LINEAR_PADDING_RATIO_X: f32 = 0.20;
/// Horizontal padding ratio for matrix (2-D) symbols.
pub const MATRIX_PADDING_RATIO_X: f32 = 0.15;
/// Vertical padding ratio. Negative: the region is tightened by 5%.
pub const PADDING_RATIO_Y: f32 = -0.05;

/// Minimum corner points for the corner-envelope path.
pub const MIN_CORNER_POINTS: usize = 4;

/// Default crop rectangle when detection reports no geometry, linear symbols.
pub const DEFAULT_LINEAR_REGION: CropRegion = CropRegion {
    x: 50,
    y: 100,
    width: 1000,
    height: 300,
};

/// Default crop rectangle when detection reports no geometry, matrix symbols.
pub const DEFAULT_MATRIX_REGION: CropRegion = CropRegion {
    x: 100,
    y: 100,
    width: 600,
    height: 600,
};

/// Axis-aligned envelope of a point set. None for an empty set.
pub fn envelope(points: &[Point]) -> Option<BoundingBox> {
    let first = points.first()?;
    let mut min_x = first.x;
    let mut min_y = first.y;
    let mut max_x = first.x;
    let mut max_y = first.y;
    for point in &points[1..] {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }
    Some(BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    })
}

/// Derive the crop region for a barcode that carries geometry.
///
/// Corner points win over the bounding box when at least
/// [`MIN_CORNER_POINTS`] of them are present. Returns None when the barcode
/// carries no geometry at all; callers then fall back to [`default_region`].
pub fn resolve_region(barcode: &DetectedBarcode) -> Option<CropRegion> {
    let linear = barcode.format.is_linear();

    if let Some(points) = &barcode.corner_points {
        if points.len() >= MIN_CORNER_POINTS {
            if let Some(env) = envelope(points) {
                return Some(padded_region(&env, linear));
            }
        }
    }

    barcode
        .bounding_box
        .as_ref()
        .map(|bbox| padded_region(bbox, linear))
}

/// Symbology-appropriate fixed rectangle for the no-geometry case.
pub fn default_region(format: Symbology) -> CropRegion {
    if format.is_linear() {
        DEFAULT_LINEAR_REGION
    } else {
        DEFAULT_MATRIX_REGION
    }
}

/// Apply the asymmetric padding to a box and clamp the origin at zero.
pub fn padded_region(bbox: &BoundingBox, linear: bool) -> CropRegion {
    let ratio_x = if linear {
        LINEAR_PADDING_RATIO_X
    } else {
        MATRIX_PADDING_RATIO_X
    };
    let padding_x = bbox.width * ratio_x;
    let padding_y = bbox.height * PADDING_RATIO_Y;

    CropRegion {
        x: (bbox.x - padding_x).floor().max(0.0) as u32,
        y: (bbox.y - padding_y).floor().max(0.0) as u32,
        width: (bbox.width + 2.0 * padding_x).ceil() as u32,
        height: (bbox.height + 2.0 * padding_y).ceil() as u32,
    }
}
