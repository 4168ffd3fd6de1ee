use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ExtractionError, Result};

/// Parameters for turning a photo into a binary mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub clahe_clip_limit: f32,
    /// Tiles per axis for local contrast enhancement
    pub clahe_tiles: u32,
    pub bilateral_diameter: u32,
    pub bilateral_sigma_color: f32,
    pub bilateral_sigma_space: f32,
    /// Odd neighbourhood size for adaptive binarisation
    pub threshold_block_size: u32,
    pub threshold_offset: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            clahe_clip_limit: 3.0,
            clahe_tiles: 8,
            bilateral_diameter: 9,
            bilateral_sigma_color: 75.0,
            bilateral_sigma_space: 75.0,
            threshold_block_size: 15,
            threshold_offset: 2.0,
        }
    }
}

/// Geometric acceptance rules for the label quadrilateral
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Polygon approximation tolerance as a fraction of contour perimeter
    pub epsilon_fraction: f64,
    pub min_aspect: f64,
    pub max_aspect: f64,
    pub min_area_fraction: f64,
    pub max_area_fraction: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            epsilon_fraction: 0.02,
            min_aspect: 0.4,
            max_aspect: 2.5,
            min_area_fraction: 0.05,
            max_area_fraction: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Side length of the square patch fed to the model
    pub patch_size: u32,
    /// Skip OCR when the classifier rejects the panel. Off by default: the
    /// decision is recorded but extraction proceeds regardless.
    pub gate_extraction: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            patch_size: 224,
            gate_extraction: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Case-insensitive label keywords ("gula" is Indonesian for sugar)
    pub keywords: Vec<String>,
    pub unit_marker: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            keywords: vec!["gula".to_string()],
            unit_marker: "g".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub preprocess: PreprocessConfig,
    pub detector: DetectorConfig,
    pub classifier: ClassifierConfig,
    pub parser: ParserConfig,
}

impl ExtractionConfig {
    /// Load from a JSON file; missing fields fall back to defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ExtractionError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(contents)
            .map_err(|e| ExtractionError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.preprocess;
        if p.clahe_tiles == 0 {
            return Err(ExtractionError::Config("clahe_tiles must be positive".into()));
        }
        if p.clahe_clip_limit <= 0.0 {
            return Err(ExtractionError::Config("clahe_clip_limit must be positive".into()));
        }
        if p.bilateral_diameter == 0 {
            return Err(ExtractionError::Config("bilateral_diameter must be positive".into()));
        }
        if !(p.bilateral_sigma_color > 0.0 && p.bilateral_sigma_space > 0.0) {
            return Err(ExtractionError::Config("bilateral sigmas must be positive".into()));
        }
        if p.threshold_block_size < 3 || p.threshold_block_size % 2 == 0 {
            return Err(ExtractionError::Config(format!(
                "threshold_block_size must be odd and >= 3, got {}",
                p.threshold_block_size
            )));
        }

        let d = &self.detector;
        if d.epsilon_fraction <= 0.0 {
            return Err(ExtractionError::Config("epsilon_fraction must be positive".into()));
        }
        if d.min_aspect > d.max_aspect {
            return Err(ExtractionError::Config("min_aspect exceeds max_aspect".into()));
        }
        if d.min_area_fraction > d.max_area_fraction {
            return Err(ExtractionError::Config(
                "min_area_fraction exceeds max_area_fraction".into(),
            ));
        }

        if self.classifier.patch_size == 0 {
            return Err(ExtractionError::Config("patch_size must be positive".into()));
        }

        if self.parser.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ExtractionError::Config("at least one keyword is required".into()));
        }
        if self.parser.unit_marker.is_empty() {
            return Err(ExtractionError::Config("unit_marker must not be empty".into()));
        }

        Ok(())
    }
}
