use image::{DynamicImage, GenericImageView};
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::config::ExtractionConfig;
use crate::detection::classifier::{ClassifierModel, PanelClassifier};
use crate::detection::contours::LabelBoxDetector;
use crate::detection::ocr::{OcrEngine, OcrTextExtractor};
use crate::detection::sugar::SugarValueParser;
use crate::detection::{annotate, crop, preprocessing};
use crate::error::{ExtractionError, Result};
use crate::models::{ExtractionResult, ExtractionStatus};
use crate::source::ImageSource;

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

/// Sugar extraction pipeline: mask, detect, classify, crop, OCR, parse.
///
/// Holds borrowed collaborators only, so one loaded model and OCR engine can
/// serve any number of independent runs.
pub struct Pipeline<'a> {
    config: ExtractionConfig,
    classifier: &'a dyn ClassifierModel,
    ocr: &'a dyn OcrEngine,
    debug: Option<DebugConfig>,
}

impl<'a> Pipeline<'a> {
    pub fn new(classifier: &'a dyn ClassifierModel, ocr: &'a dyn OcrEngine) -> Self {
        Self {
            config: ExtractionConfig::default(),
            classifier,
            ocr,
            debug: None,
        }
    }

    pub fn with_config(mut self, config: ExtractionConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)
                .map_err(|e| ExtractionError::debug_output(&output_dir, e))?;
            if entries.count() > 0 {
                return Err(ExtractionError::debug_output(
                    &output_dir,
                    "debug directory is not empty",
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)
                .map_err(|e| ExtractionError::debug_output(&output_dir, e))?;
        }

        self.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Where stage images go, if debug output is on
    pub fn debug_dir(&self) -> Option<&Path> {
        self.debug.as_ref().map(|d| d.output_dir.as_path())
    }

    /// Load an image from `source` and run on it
    pub fn run_from_source(
        &self,
        source: &dyn ImageSource,
        reference: &str,
    ) -> Result<ExtractionResult> {
        let image = source.load(reference)?;
        self.run(&image)
    }

    /// Run every stage on one image. Only an unusable image is an error;
    /// every other outcome is reported through the result's status.
    pub fn run(&self, image: &DynamicImage) -> Result<ExtractionResult> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ExtractionError::invalid_image("image has zero width or height"));
        }
        self.save_debug("00_input", || image.clone())?;

        debug!("Preprocessing {}x{} image", width, height);
        let mask = preprocessing::prepare(image, &self.config.preprocess);
        self.save_debug("01_mask", || DynamicImage::ImageLuma8(mask.clone()))?;

        let detector = LabelBoxDetector::new(self.config.detector.clone());
        let Some(candidate) = detector.detect(&mask, (width, height)) else {
            info!("No label box found");
            return Ok(ExtractionResult::no_box());
        };
        self.save_debug("02_annotated", || DynamicImage::ImageRgb8(annotate(image, &candidate)))?;

        let classifier = PanelClassifier::new(self.classifier, self.config.classifier.patch_size);
        let patch = classifier.patch_for(image, &candidate);
        self.save_debug("03_patch", || DynamicImage::ImageRgb8(patch.to_image()))?;
        let classification = classifier.classify(&patch);
        debug!(
            "Classification: {:?} ({:.3})",
            classification.predicted_label, classification.confidence
        );

        let cropped = crop::crop(image, &candidate);
        let mut result = ExtractionResult {
            candidate: Some(candidate),
            classification,
            readings: Vec::new(),
            status: ExtractionStatus::Success,
            crop_region: None,
            crop_clamped: false,
            skipped: Vec::new(),
        };

        if self.config.classifier.gate_extraction && !classification.is_nutrition_fact() {
            info!("Classifier rejected the panel, skipping OCR");
            result.status = ExtractionStatus::NotANutritionLabel;
            return Ok(result);
        }

        let Some(cropped) = cropped else {
            result.status = ExtractionStatus::NoBoxFound;
            return Ok(result);
        };
        result.crop_region = Some(cropped.applied);
        result.crop_clamped = cropped.was_clamped();
        self.save_debug("04_crop", || cropped.image.clone())?;

        let lines = OcrTextExtractor::new(self.ocr).recognize(&cropped.image);
        if lines.is_empty() {
            info!("OCR found no text");
            result.status = ExtractionStatus::OcrEmpty;
            return Ok(result);
        }

        let parsed = SugarValueParser::new(&self.config.parser).parse_detailed(&lines);
        result.readings = parsed.readings;
        result.skipped = parsed.skipped;

        info!(
            "Extracted {} sugar reading(s) from {} lines",
            result.readings.len(),
            lines.len()
        );
        Ok(result)
    }

    /// Images are only rendered when debug output is on
    fn save_debug(&self, name: &str, render: impl FnOnce() -> DynamicImage) -> Result<()> {
        let Some(debug_config) = &self.debug else {
            return Ok(());
        };

        let output_path = debug_config.output_dir.join(format!("{}.png", name));
        render()
            .save(&output_path)
            .map_err(|e| ExtractionError::debug_output(&output_path, e))?;
        debug!("Debug: saved {}", output_path.display());
        Ok(())
    }
}

