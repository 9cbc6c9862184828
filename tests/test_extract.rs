mod common;

use barcrop::geometry::{DEFAULT_LINEAR_REGION, DEFAULT_MATRIX_REGION};
use barcrop::{BarcodeExtractor, ExtractOptions, Symbology};
use common::{
    bare_barcode, create_blank_image, create_code128_image, create_qr_image, stub_extractor,
    white_photo,
};

const QR_PAYLOAD: &str = "https://example.com/gifticon/9911223344";
const CODE128_PAYLOAD: &str = "GIFT-1234-5678";

#[tokio::test]
async fn extracts_a_qr_code_end_to_end() -> anyhow::Result<()> {
    let file = create_qr_image(QR_PAYLOAD);
    let extractor = BarcodeExtractor::new();

    let result = extractor
        .extract(file.path(), &ExtractOptions::default())
        .await?;

    assert!(result.success);
    let barcode = result.barcode.expect("barcode present on success");
    assert_eq!(barcode.value, QR_PAYLOAD);
    assert_eq!(barcode.format, Symbology::QrCode);

    let cropped = result.cropped_image.expect("cropped image present");
    let region = result.crop_region.expect("crop region present");
    assert_eq!(cropped.width(), region.width);
    assert_eq!(cropped.height(), region.height);
    Ok(())
}

#[tokio::test]
async fn extracts_a_code128_end_to_end() -> anyhow::Result<()> {
    let file = create_code128_image(CODE128_PAYLOAD);
    let extractor = BarcodeExtractor::new();

    let result = extractor
        .extract(file.path(), &ExtractOptions::default())
        .await?;

    assert!(result.success);
    let barcode = result.barcode.expect("barcode present on success");
    assert_eq!(barcode.value, CODE128_PAYLOAD);
    assert_eq!(barcode.format, Symbology::Code128);
    assert!(result.cropped_image.is_some());
    Ok(())
}

#[tokio::test]
async fn extraction_is_idempotent_for_value_and_format() -> anyhow::Result<()> {
    let file = create_qr_image(QR_PAYLOAD);
    let extractor = BarcodeExtractor::new();

    let first = extractor
        .extract(file.path(), &ExtractOptions::default())
        .await?;
    let second = extractor
        .extract(file.path(), &ExtractOptions::default())
        .await?;

    let first = first.barcode.expect("barcode present");
    let second = second.barcode.expect("barcode present");
    assert_eq!(first.value, second.value);
    assert_eq!(first.format, second.format);
    Ok(())
}

#[tokio::test]
async fn blank_image_reports_detection_failure() -> anyhow::Result<()> {
    let file = create_blank_image();
    let extractor = BarcodeExtractor::new();

    let result = extractor
        .extract(file.path(), &ExtractOptions::default())
        .await?;

    assert!(!result.success);
    assert!(result.cropped_image.is_none());
    assert!(result.barcode.is_none());
    assert!(result.crop_region.is_none());
    Ok(())
}

#[tokio::test]
async fn missing_geometry_uses_the_matrix_default_region() -> anyhow::Result<()> {
    let extractor = stub_extractor(bare_barcode(Symbology::QrCode));
    let image = white_photo(800, 800);

    let result = extractor
        .extract_image(&image, &ExtractOptions::default())
        .await?;

    assert!(result.success);
    assert_eq!(result.crop_region, Some(DEFAULT_MATRIX_REGION));
    let cropped = result.cropped_image.expect("cropped image present");
    assert_eq!(cropped.width(), DEFAULT_MATRIX_REGION.width);
    assert_eq!(cropped.height(), DEFAULT_MATRIX_REGION.height);
    Ok(())
}

#[tokio::test]
async fn missing_geometry_uses_the_linear_default_region() -> anyhow::Result<()> {
    let extractor = stub_extractor(bare_barcode(Symbology::Code128));
    let image = white_photo(1200, 500);

    let result = extractor
        .extract_image(&image, &ExtractOptions::default())
        .await?;

    assert!(result.success);
    assert_eq!(result.crop_region, Some(DEFAULT_LINEAR_REGION));
    Ok(())
}

#[tokio::test]
async fn every_crop_failing_still_returns_the_original() -> anyhow::Result<()> {
    // Too small for even the default regions; the chain runs out and the
    // original image comes back untouched.
    let extractor = stub_extractor(bare_barcode(Symbology::QrCode));
    let image = white_photo(80, 60);

    let result = extractor
        .extract_image(&image, &ExtractOptions::default())
        .await?;

    assert!(result.success);
    assert!(result.crop_region.is_none());
    assert!(result.diagnostic.is_some());
    let cropped = result.cropped_image.expect("original image is returned");
    assert_eq!(cropped.width(), 80);
    assert_eq!(cropped.height(), 60);
    Ok(())
}
