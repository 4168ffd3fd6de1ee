use clap::Parser;
use std::path::PathBuf;

use glucoscan::detection::ocr::default_model_dir;
use glucoscan::detection::{OcrsEngine, RtenClassifier, annotate};
use glucoscan::{ExtractionConfig, ExtractionStatus, FileImageSource, ImageSource, Pipeline};

#[derive(Parser)]
#[command(name = "glucoscan")]
#[command(about = "Read the declared sugar content from a nutrition-facts label photo")]
struct Cli {
    /// Path to input image file (png, jpg, jpeg)
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Panel classifier model (.rten)
    #[arg(long, value_name = "FILE")]
    classifier_model: Option<PathBuf>,

    /// Directory holding text-detection.rten and text-recognition.rten
    #[arg(long, value_name = "DIR")]
    ocr_models: Option<PathBuf>,

    /// JSON configuration overriding the default parameters
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Save the photo with the detected label outlined
    #[arg(long, value_name = "FILE")]
    annotate: Option<PathBuf>,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = match &args.config {
        Some(path) => ExtractionConfig::from_json_file(path)?,
        None => ExtractionConfig::default(),
    };

    let ocr_dir = match args.ocr_models {
        Some(dir) => dir,
        None => default_model_dir()?,
    };
    let classifier_path = match args.classifier_model {
        Some(path) => path,
        None => ocr_dir.join("nutrition-classifier.rten"),
    };

    log::info!("Loading models");
    let classifier = RtenClassifier::load(&classifier_path)?;
    let ocr = OcrsEngine::from_dir(&ocr_dir)?;

    let mut pipeline = Pipeline::new(&classifier, &ocr).with_config(config)?;
    if let Some(debug_dir) = args.debug_out {
        pipeline = pipeline.with_debug(debug_dir)?;
    }

    let source = FileImageSource::new();
    let reference = args.image_path.to_string_lossy();
    let image = source.load(&reference)?;
    log::info!("Image loaded: {}x{}", image.width(), image.height());

    let result = pipeline.run(&image)?;

    if let (Some(path), Some(candidate)) = (&args.annotate, &result.candidate) {
        annotate(&image, candidate)
            .save(path)
            .map_err(|e| anyhow::anyhow!("Failed to save annotated image: {}", e))?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("\n=== Sugar Content Detection Results ===");
    println!("Status: {:?}", result.status);
    println!(
        "Classification: {:?} (confidence: {:.2})",
        result.classification.predicted_label, result.classification.confidence
    );

    if let Some(candidate) = &result.candidate {
        let b = candidate.bounds;
        println!("Label box at ({}, {}) {}x{}", b.x, b.y, b.width, b.height);
    }
    if result.crop_clamped {
        println!("Crop was clamped to the image bounds");
    }

    if result.status == ExtractionStatus::Success && !result.readings.is_empty() {
        println!("\nReadings:");
        for reading in &result.readings {
            println!(
                "  {} g (line {})",
                reading.value_grams, reading.source_line_index
            );
        }
    }

    match result.representative_grams() {
        Some(grams) => println!("\nSugar content: {} g", grams),
        None => println!("\nSugar content: Not detected"),
    }

    Ok(())
}
