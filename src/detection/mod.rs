pub mod preprocessing;
pub mod contours;
pub mod classifier;
pub mod crop;
pub mod ocr;
pub mod sugar;

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

use crate::models::CandidateBox;

pub use classifier::{ClassifierModel, PanelClassifier, PanelPatch, RtenClassifier};
pub use contours::LabelBoxDetector;
pub use ocr::{OcrEngine, OcrTextExtractor, OcrsEngine, RecognizedText};
pub use sugar::SugarValueParser;

const OUTLINE: Rgb<u8> = Rgb([0, 255, 0]);

/// Copy of the photo with the candidate quadrilateral outlined in green
pub fn annotate(img: &DynamicImage, candidate: &CandidateBox) -> RgbImage {
    let mut canvas = img.to_rgb8();
    let corners = &candidate.corners;

    for i in 0..corners.len() {
        let a = corners[i];
        let b = corners[(i + 1) % corners.len()];
        // Two passes one pixel apart for a 2px outline
        for offset in [0.0f32, 1.0] {
            draw_line_segment_mut(
                &mut canvas,
                (a.x as f32 + offset, a.y as f32 + offset),
                (b.x as f32 + offset, b.y as f32 + offset),
                OUTLINE,
            );
        }
    }

    canvas
}
