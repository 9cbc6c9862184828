//! Crop strategies and the fallback chain.
//!
//! Cropping is best-effort: the chain tries each strategy in order and ends
//! in the original image when everything fails, so a successful decode is
//! never lost to a crop problem.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use anyhow::{Result, anyhow};
use image::{DynamicImage, Rgb};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};

use crate::geometry;
use crate::models::{CropRegion, DetectedBarcode, Point};

/// Rotations below this many degrees are treated as already axis-aligned.
pub const MIN_DESKEW_ANGLE_DEGREES: f32 = 1.0;

/// Input to a crop strategy.
pub struct CropRequest<'a> {
    pub image: &'a DynamicImage,
    pub barcode: &'a DetectedBarcode,
    /// Region estimate derived from the barcode geometry, when there was any.
    pub region: Option<CropRegion>,
}

/// A cropped image plus the region that was actually applied.
pub struct CropOutput {
    pub image: DynamicImage,
    pub region: Option<CropRegion>,
}

/// One way of producing a cropped barcode image.
///
/// Strategies return `Err` to hand over to the next one in the chain.
pub trait CropStrategy: Send + Sync {
    /// Whether this strategy has the inputs it needs. Inapplicable strategies
    /// are skipped without counting as failures.
    fn applies(&self, _request: &CropRequest<'_>) -> bool {
        true
    }

    fn crop(&self, request: &CropRequest<'_>) -> Result<CropOutput>;

    /// Human-readable name for this strategy (used in verbose output)
    fn name(&self) -> &str;
}

/// Rotation-aware crop from corner points.
///
/// Estimates the symbol's rotation from its corner points, rotates the image
/// about its center to square the symbol up, and crops the padded envelope of
/// the corner points mapped through the same rotation. The region it reports
/// is the one it applied, which supersedes the caller's estimate.
pub struct DeskewCrop {
    pub min_angle_degrees: f32,
}

impl DeskewCrop {
    pub fn new() -> Self {
        Self {
            min_angle_degrees: MIN_DESKEW_ANGLE_DEGREES,
        }
    }
}

impl Default for DeskewCrop {
    fn default() -> Self {
        Self::new()
    }
}

impl CropStrategy for DeskewCrop {
    fn applies(&self, request: &CropRequest<'_>) -> bool {
        request
            .barcode
            .corner_points
            .as_ref()
            .is_some_and(|p| p.len() >= geometry::MIN_CORNER_POINTS)
    }

    fn crop(&self, request: &CropRequest<'_>) -> Result<CropOutput> {
        let points = request
            .barcode
            .corner_points
            .as_deref()
            .filter(|p| p.len() >= geometry::MIN_CORNER_POINTS)
            .ok_or_else(|| anyhow!("no corner points to deskew from"))?;
        let linear = request.barcode.format.is_linear();

        let angle = rotation_angle(points);
        if angle.abs() < self.min_angle_degrees.to_radians() {
            // Already square; crop the padded corner envelope directly.
            let env =
                geometry::envelope(points).ok_or_else(|| anyhow!("empty corner envelope"))?;
            let region = geometry::padded_region(&env, linear);
            let clamped = region
                .clamp_to(request.image.width(), request.image.height())
                .ok_or_else(|| anyhow!("corner envelope lies outside the image"))?;
            let image = request
                .image
                .crop_imm(clamped.x, clamped.y, clamped.width, clamped.height);
            return Ok(CropOutput {
                image,
                region: Some(clamped),
            });
        }

        let rgb = request.image.to_rgb8();
        let rotated = rotate_about_center(&rgb, -angle, Interpolation::Bilinear, Rgb([255, 255, 255]));
        let rotated = DynamicImage::ImageRgb8(rotated);

        let center = Point::new(rgb.width() as f32 / 2.0, rgb.height() as f32 / 2.0);
        let mapped: Vec<Point> = points
            .iter()
            .map(|p| rotate_point(*p, center, -angle))
            .collect();
        let env = geometry::envelope(&mapped).ok_or_else(|| anyhow!("empty corner envelope"))?;
        let region = geometry::padded_region(&env, linear);
        let clamped = region
            .clamp_to(rotated.width(), rotated.height())
            .ok_or_else(|| anyhow!("deskewed region lies outside the image"))?;
        let image = rotated.crop_imm(clamped.x, clamped.y, clamped.width, clamped.height);
        Ok(CropOutput {
            image,
            region: Some(clamped),
        })
    }

    fn name(&self) -> &str {
        "deskew"
    }
}

/// Plain axis-aligned crop with the resolver's region.
pub struct RegionCrop;

impl CropStrategy for RegionCrop {
    fn applies(&self, request: &CropRequest<'_>) -> bool {
        request.region.is_some()
    }

    fn crop(&self, request: &CropRequest<'_>) -> Result<CropOutput> {
        let region = request
            .region
            .ok_or_else(|| anyhow!("no crop region was resolved"))?;
        let clamped = region
            .clamp_to(request.image.width(), request.image.height())
            .ok_or_else(|| anyhow!("crop region lies outside the image"))?;
        let image = request
            .image
            .crop_imm(clamped.x, clamped.y, clamped.width, clamped.height);
        Ok(CropOutput {
            image,
            region: Some(clamped),
        })
    }

    fn name(&self) -> &str {
        "region"
    }
}

/// Fixed fallback rectangle selected by symbology class, for detections that
/// carry no geometry at all.
pub struct DefaultRegionCrop;

impl CropStrategy for DefaultRegionCrop {
    fn crop(&self, request: &CropRequest<'_>) -> Result<CropOutput> {
        let region = geometry::default_region(request.barcode.format);
        let clamped = region
            .clamp_to(request.image.width(), request.image.height())
            .ok_or_else(|| anyhow!("default region lies outside the image"))?;
        let image = request
            .image
            .crop_imm(clamped.x, clamped.y, clamped.width, clamped.height);
        Ok(CropOutput {
            image,
            region: Some(clamped),
        })
    }

    fn name(&self) -> &str {
        "default-region"
    }
}

/// Ordered crop strategies, tried in sequence.
pub struct CropChain {
    strategies: Vec<Box<dyn CropStrategy>>,
    pub verbose: bool,
}

impl CropChain {
    pub fn new() -> Self {
        Self::from_strategies(vec![
            Box::new(DeskewCrop::new()),
            Box::new(RegionCrop),
            Box::new(DefaultRegionCrop),
        ])
    }

    pub fn from_strategies(strategies: Vec<Box<dyn CropStrategy>>) -> Self {
        Self {
            strategies,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Run the chain. Never fails: when every strategy fails, the original
    /// image comes back unmodified with no region and a diagnostic note.
    /// The second element is a diagnostic whenever a fallback was used.
    pub fn run(
        &self,
        image: &DynamicImage,
        barcode: &DetectedBarcode,
        region: Option<CropRegion>,
    ) -> (CropOutput, Option<String>) {
        let request = CropRequest {
            image,
            barcode,
            region,
        };
        let mut failures: Vec<String> = Vec::new();

        for strategy in &self.strategies {
            if !strategy.applies(&request) {
                if self.verbose {
                    println!("[crop] {} crop not applicable", strategy.name());
                }
                continue;
            }
            if self.verbose {
                println!("[crop] trying {} crop", strategy.name());
            }
            match strategy.crop(&request) {
                Ok(output) => {
                    if self.verbose {
                        println!("[crop] {} crop succeeded", strategy.name());
                    }
                    let diagnostic = (!failures.is_empty())
                        .then(|| format!("fell back to {} crop: {}", strategy.name(), failures.join("; ")));
                    return (output, diagnostic);
                }
                Err(e) => {
                    if self.verbose {
                        println!("[crop] {} crop failed: {e}", strategy.name());
                    }
                    failures.push(format!("{} crop failed: {e}", strategy.name()));
                }
            }
        }

        let diagnostic = format!(
            "failed to crop the barcode area, returning the original image; \
             the barcode value was still recognized ({})",
            failures.join("; ")
        );
        (
            CropOutput {
                image: image.clone(),
                region: None,
            },
            Some(diagnostic),
        )
    }
}

impl Default for CropChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Rotation of the symbol's first edge, folded to the nearest axis so tall
/// edges do not read as quarter-turn rotations.
fn rotation_angle(points: &[Point]) -> f32 {
    let dx = points[1].x - points[0].x;
    let dy = points[1].y - points[0].y;
    let mut angle = dy.atan2(dx);
    while angle >= FRAC_PI_4 {
        angle -= FRAC_PI_2;
    }
    while angle < -FRAC_PI_4 {
        angle += FRAC_PI_2;
    }
    angle
}

fn rotate_point(p: Point, center: Point, theta: f32) -> Point {
    let (sin, cos) = theta.sin_cos();
    let dx = p.x - center.x;
    let dy = p.y - center.y;
    Point::new(center.x + dx * cos - dy * sin, center.y + dx * sin + dy * cos)
}
