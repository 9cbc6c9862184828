use clap::Parser;
use image::ImageReader;
use std::path::PathBuf;

use barcrop::{BarcodeExtractor, DetectionOutcome, ExtractOptions};

#[derive(Parser)]
#[command(name = "barcrop")]
#[command(about = "Detect a barcode in a photo and crop it out")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Save the cropped barcode image to the barcode directory
    #[arg(short, long)]
    save: bool,

    /// File name for the saved crop (generated from the barcode when omitted)
    #[arg(long, value_name = "NAME")]
    file_name: Option<String>,

    /// Directory to save into (defaults to ~/.barcrop/barcodes)
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Detect and print the barcode without cropping
    #[arg(long)]
    detect_only: bool,

    /// Print a JSON summary instead of text
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let extractor = BarcodeExtractor::new().with_verbose(args.verbose);

    if args.detect_only {
        let image = ImageReader::open(&args.image_path)?
            .decode()
            .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;

        match extractor.detect(&image).await {
            DetectionOutcome::Found(barcodes) => {
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&barcodes)?);
                } else {
                    for barcode in &barcodes {
                        println!("{} ({})", barcode.value, barcode.format);
                    }
                }
            }
            DetectionOutcome::NotFound(message) => {
                eprintln!("{message}");
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let options = ExtractOptions {
        persist: args.save,
        file_name: args.file_name,
        output_dir: args.out_dir,
    };

    let result = extractor.extract(&args.image_path, &options).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.summary())?);
    } else if result.success {
        if let Some(barcode) = &result.barcode {
            println!("Barcode: {} ({})", barcode.value, barcode.format);
        }
        match result.crop_region {
            Some(r) => println!("Cropped region: x={} y={} {}x{}", r.x, r.y, r.width, r.height),
            None => println!("Cropping failed; the original image was kept"),
        }
        if let Some(path) = &result.persisted_path {
            println!("Saved to: {}", path.display());
        }
        if let Some(note) = &result.diagnostic {
            println!("Note: {note}");
        }
    } else {
        eprintln!(
            "{}",
            result
                .diagnostic
                .unwrap_or_else(|| "no barcode found in the image".to_string())
        );
        std::process::exit(1);
    }

    if let Some(error) = &result.persist_error {
        eprintln!("Failed to save the cropped image: {error}");
        std::process::exit(1);
    }

    Ok(())
}
