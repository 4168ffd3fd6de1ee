mod common;

use common::{FailingClassifier, StubClassifier, rect_candidate};
use glucoscan::detection::PanelClassifier;
use glucoscan::detection::classifier::{NUTRITION_FACT_CLASS, build_patch, interpret_scores};
use glucoscan::{ClassificationResult, PredictedLabel};
use image::{DynamicImage, Rgb, RgbImage};

fn white_photo(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])))
}

#[test]
fn test_second_class_means_nutrition_fact() {
    assert_eq!(NUTRITION_FACT_CLASS, 1);

    let result = interpret_scores(&[0.2, 0.8]);
    assert_eq!(result.predicted_label, PredictedLabel::NutritionFact);
    assert!((result.confidence - 0.8).abs() < 1e-6);
}

#[test]
fn test_first_class_means_non_nutrition_fact() {
    let result = interpret_scores(&[0.7, 0.3]);
    assert_eq!(result.predicted_label, PredictedLabel::NonNutritionFact);
    assert!((result.confidence - 0.7).abs() < 1e-6);
}

#[test]
fn test_tie_goes_to_lower_index() {
    let result = interpret_scores(&[0.5, 0.5]);
    assert_eq!(result.predicted_label, PredictedLabel::NonNutritionFact);
}

#[test]
fn test_no_scores_means_no_label() {
    assert_eq!(interpret_scores(&[]), ClassificationResult::none());
    assert_eq!(interpret_scores(&[f32::NAN, f32::NAN]), ClassificationResult::none());
}

#[test]
fn test_confidence_is_clamped() {
    let result = interpret_scores(&[-3.0, 7.5]);
    assert_eq!(result.predicted_label, PredictedLabel::NutritionFact);
    assert_eq!(result.confidence, 1.0);
}

#[test]
fn test_patch_is_fixed_size_and_normalised() {
    let photo = white_photo(200, 150);
    let candidate = rect_candidate(40, 30, 100, 80, 200, 150);
    let patch = build_patch(&photo, &candidate, 224);

    assert_eq!(patch.size, 224);
    assert_eq!(patch.data.len(), 224 * 224 * 3);
    assert!(patch.data.iter().all(|v| (0.0..=1.0).contains(v)));
}

#[test]
fn test_patch_zeroes_pixels_outside_polygon() {
    let photo = white_photo(200, 200);
    let candidate = rect_candidate(50, 50, 100, 100, 200, 200);
    let patch = build_patch(&photo, &candidate, 224);

    assert_eq!(patch.pixel(0, 0), [0.0, 0.0, 0.0]);
    assert_eq!(patch.pixel(223, 223), [0.0, 0.0, 0.0]);
    assert_eq!(patch.pixel(112, 112), [1.0, 1.0, 1.0]);
}

#[test]
fn test_classifier_uses_model_scores() {
    let model = StubClassifier::nutrition_fact();
    let classifier = PanelClassifier::new(&model, 224);
    let photo = white_photo(100, 100);
    let patch = classifier.patch_for(&photo, &rect_candidate(10, 10, 50, 50, 100, 100));

    let result = classifier.classify(&patch);
    assert!(result.is_nutrition_fact());
    assert_eq!(model.calls(), 1);
}

#[test]
fn test_model_failure_degrades_to_no_label() {
    let classifier = PanelClassifier::new(&FailingClassifier, 32);
    let photo = white_photo(64, 64);
    let patch = classifier.patch_for(&photo, &rect_candidate(8, 8, 40, 40, 64, 64));

    assert_eq!(patch.size, 32);
    assert_eq!(classifier.classify(&patch), ClassificationResult::none());
}
