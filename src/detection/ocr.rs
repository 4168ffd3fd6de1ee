use image::DynamicImage;
use log::{debug, warn};
use ocrs::{ImageSource as OcrImage, OcrEngineParams};
use rten::Model;
use std::path::{Path, PathBuf};

use crate::models::TextLine;

/// `ocrs` does not report per-line confidence
pub const DEFAULT_CONFIDENCE: f32 = 0.9;

/// Text plus engine confidence, before line indices are assigned
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    pub text: String,
    pub confidence: f32,
}

impl RecognizedText {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// An OCR engine returning lines in reading order (top to bottom)
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> anyhow::Result<Vec<RecognizedText>>;
}

/// Assigns document-order indices to engine output without reordering it
pub struct OcrTextExtractor<'a> {
    engine: &'a dyn OcrEngine,
}

impl<'a> OcrTextExtractor<'a> {
    pub fn new(engine: &'a dyn OcrEngine) -> Self {
        Self { engine }
    }

    /// Empty when the engine fails or every line it returns is blank.
    /// Blank lines between readable ones are kept in place.
    pub fn recognize(&self, image: &DynamicImage) -> Vec<TextLine> {
        let recognized = match self.engine.recognize(image) {
            Ok(lines) => lines,
            Err(e) => {
                warn!("OCR engine failed, treating as no text: {}", e);
                return Vec::new();
            }
        };
        if recognized.iter().all(|r| r.text.trim().is_empty()) {
            return Vec::new();
        }

        let lines: Vec<TextLine> = recognized
            .into_iter()
            .enumerate()
            .map(|(line_index, r)| TextLine {
                text: r.text,
                confidence: r.confidence,
                line_index,
            })
            .collect();

        debug!("OCR produced {} lines", lines.len());
        lines
    }
}

/// One entry per detected line. Lines the recogniser could not read become
/// empty placeholders so later lines keep their position.
pub fn placeholder_unreadable(
    lines: impl IntoIterator<Item = Option<String>>,
) -> Vec<RecognizedText> {
    lines
        .into_iter()
        .map(|line| match line {
            Some(text) => RecognizedText::new(text.trim(), DEFAULT_CONFIDENCE),
            None => RecognizedText::new("", 0.0),
        })
        .collect()
}

/// Default model directory used by `ocrs-cli`
pub fn default_model_dir() -> anyhow::Result<PathBuf> {
    let home_dir = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
    Ok(Path::new(&home_dir).join(".cache/ocrs"))
}

/// `ocrs`-backed engine: word detection, line grouping, then recognition
pub struct OcrsEngine {
    engine: ocrs::OcrEngine,
}

impl OcrsEngine {
    /// Load `text-detection.rten` and `text-recognition.rten` from `model_dir`
    pub fn from_dir(model_dir: &Path) -> anyhow::Result<Self> {
        let detection_model_path = model_dir.join("text-detection.rten");
        let recognition_model_path = model_dir.join("text-recognition.rten");

        if !detection_model_path.exists() || !recognition_model_path.exists() {
            anyhow::bail!(
                "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
                 Expected locations:\n  - {}\n  - {}",
                detection_model_path.display(),
                recognition_model_path.display()
            );
        }

        let detection_model = Model::load_file(&detection_model_path)?;
        let recognition_model = Model::load_file(&recognition_model_path)?;

        let engine = ocrs::OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })?;

        Ok(Self { engine })
    }
}

impl OcrEngine for OcrsEngine {
    fn recognize(&self, image: &DynamicImage) -> anyhow::Result<Vec<RecognizedText>> {
        let rgb = image.to_rgb8();
        let source = OcrImage::from_bytes(rgb.as_raw(), rgb.dimensions())
            .map_err(|e| anyhow::anyhow!("Failed to create OCR image source: {}", e))?;
        let input = self.engine.prepare_input(source)?;

        let word_rects = self.engine.detect_words(&input)?;
        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        let lines = self.engine.recognize_text(&input, &line_rects)?;

        Ok(placeholder_unreadable(
            lines.iter().map(|line| line.as_ref().map(|l| l.to_string())),
        ))
    }
}
