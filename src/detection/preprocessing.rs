use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use imageproc::contrast::equalize_histogram;

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Flatten uneven lighting before decoding
pub fn equalize(img: &GrayImage) -> GrayImage {
    equalize_histogram(img)
}

/// Downscale for a retry pass at reduced resolution
pub fn downscale(img: &GrayImage, scale: f32) -> GrayImage {
    let width = (img.width() as f32 * scale).round().max(1.0) as u32;
    let height = (img.height() as f32 * scale).round().max(1.0) as u32;
    image::imageops::resize(img, width, height, FilterType::Triangle)
}
