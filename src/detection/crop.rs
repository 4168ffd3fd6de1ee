use image::DynamicImage;
use log::warn;

use crate::models::{BoundingRect, CandidateBox};

/// Result of cropping the original photo to a candidate's bounding rectangle
#[derive(Debug, Clone)]
pub struct CropOutcome {
    pub image: DynamicImage,
    pub requested: BoundingRect,
    /// Geometry actually cropped; differs from `requested` when clamped
    pub applied: BoundingRect,
}

impl CropOutcome {
    pub fn was_clamped(&self) -> bool {
        self.requested != self.applied
    }
}

/// Crop the unmasked original to the candidate's axis-aligned bounds.
///
/// A rectangle extending past the image is clamped to the image rather than
/// failing. Returns `None` only when nothing of the rectangle is inside.
pub fn crop(original: &DynamicImage, candidate: &CandidateBox) -> Option<CropOutcome> {
    let requested = candidate.bounds;
    let applied = requested.clamp_to(original.width(), original.height())?;

    if applied != requested {
        warn!(
            "Crop clamped from ({}, {}) {}x{} to {}x{}",
            requested.x,
            requested.y,
            requested.width,
            requested.height,
            applied.width,
            applied.height
        );
    }

    let image = original.crop_imm(applied.x, applied.y, applied.width, applied.height);
    Some(CropOutcome {
        image,
        requested,
        applied,
    })
}
