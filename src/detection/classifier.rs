use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use log::{debug, warn};
use rten::Model;
use rten_tensor::NdTensor;
use rten_tensor::prelude::*;
use std::path::Path;

use crate::models::{CandidateBox, ClassificationResult, PredictedLabel};

/// Output class index that means "nutrition fact". Index 0 is "non nutrition
/// fact"; the model was trained with this two-class ordering.
pub const NUTRITION_FACT_CLASS: usize = 1;

/// Square RGB patch with intensities scaled to [0, 1], stored row-major HWC
#[derive(Debug, Clone, PartialEq)]
pub struct PanelPatch {
    pub size: u32,
    pub data: Vec<f32>,
}

impl PanelPatch {
    pub const CHANNELS: usize = 3;

    pub fn pixel(&self, x: u32, y: u32) -> [f32; 3] {
        let base = (y as usize * self.size as usize + x as usize) * Self::CHANNELS;
        [self.data[base], self.data[base + 1], self.data[base + 2]]
    }

    /// Back to 8-bit for inspection
    pub fn to_image(&self) -> RgbImage {
        RgbImage::from_fn(self.size, self.size, |x, y| {
            let [r, g, b] = self.pixel(x, y);
            Rgb([
                (r * 255.0).round() as u8,
                (g * 255.0).round() as u8,
                (b * 255.0).round() as u8,
            ])
        })
    }
}

/// A learned two-class model. Implementations must be stateless per call.
pub trait ClassifierModel: Send + Sync {
    /// One score per class, in class-index order
    fn scores(&self, patch: &PanelPatch) -> anyhow::Result<Vec<f32>>;
}

/// Render the candidate region for classification: zero everything outside
/// the polygon, resize to `size` x `size`, scale to [0, 1].
pub fn build_patch(img: &DynamicImage, candidate: &CandidateBox, size: u32) -> PanelPatch {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut region = GrayImage::new(width, height);
    let polygon = polygon_points(candidate);
    if !polygon.is_empty() {
        draw_polygon_mut(&mut region, &polygon, Luma([255u8]));
    }

    let masked = RgbImage::from_fn(width, height, |x, y| {
        if region.get_pixel(x, y)[0] > 0 {
            *rgb.get_pixel(x, y)
        } else {
            Rgb([0, 0, 0])
        }
    });

    let resized = imageops::resize(&masked, size, size, FilterType::Triangle);
    let data = resized
        .as_raw()
        .iter()
        .map(|&v| v as f32 / 255.0)
        .collect();

    PanelPatch { size, data }
}

/// Corner list usable by the polygon rasteriser (which rejects a closing
/// vertex equal to the first one)
fn polygon_points(candidate: &CandidateBox) -> Vec<Point<i32>> {
    let mut points: Vec<Point<i32>> = Vec::with_capacity(4);
    for corner in &candidate.corners {
        let p = Point::new(corner.x, corner.y);
        if points.last() != Some(&p) {
            points.push(p);
        }
    }
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

/// Interprets raw model scores as a [`ClassificationResult`]
pub struct PanelClassifier<'a> {
    model: &'a dyn ClassifierModel,
    patch_size: u32,
}

impl<'a> PanelClassifier<'a> {
    pub fn new(model: &'a dyn ClassifierModel, patch_size: u32) -> Self {
        Self { model, patch_size }
    }

    pub fn patch_for(&self, img: &DynamicImage, candidate: &CandidateBox) -> PanelPatch {
        build_patch(img, candidate, self.patch_size)
    }

    /// Classify a prepared patch. Model failures degrade to "no label".
    pub fn classify(&self, patch: &PanelPatch) -> ClassificationResult {
        match self.model.scores(patch) {
            Ok(scores) => interpret_scores(&scores),
            Err(e) => {
                warn!("Classifier failed, recording no label: {}", e);
                ClassificationResult::none()
            }
        }
    }
}

/// Argmax over the scores; ties go to the lower index
pub fn interpret_scores(scores: &[f32]) -> ClassificationResult {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((i, score));
        }
    }

    let Some((index, score)) = best else {
        return ClassificationResult::none();
    };

    let predicted_label = if index == NUTRITION_FACT_CLASS {
        PredictedLabel::NutritionFact
    } else {
        PredictedLabel::NonNutritionFact
    };
    debug!("Classifier picked class {} with score {:.3}", index, score);

    ClassificationResult {
        predicted_label,
        confidence: score.clamp(0.0, 1.0),
    }
}

/// Panel classifier backed by an `.rten` model taking `[1, H, W, 3]` input
pub struct RtenClassifier {
    model: Model,
}

impl RtenClassifier {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            anyhow::bail!("Classifier model not found at {}", path.display());
        }
        let model = Model::load_file(path)?;
        Ok(Self { model })
    }
}

impl ClassifierModel for RtenClassifier {
    fn scores(&self, patch: &PanelPatch) -> anyhow::Result<Vec<f32>> {
        let side = patch.size as usize;
        let input = NdTensor::from_data([1, side, side, PanelPatch::CHANNELS], patch.data.clone());
        let output: NdTensor<f32, 2> = self.model.run_one(input.view().into(), None)?.try_into()?;
        Ok(output.iter().copied().collect())
    }
}
