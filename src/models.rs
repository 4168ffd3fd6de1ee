use serde::{Deserialize, Serialize};

/// Integer pixel coordinate of a polygon vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: i32,
    pub y: i32,
}

impl Vertex {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingRect {
    /// Tight bounding rectangle of a vertex set (inclusive of edge pixels)
    pub fn enclosing(vertices: &[Vertex]) -> Option<Self> {
        let min_x = vertices.iter().map(|v| v.x).min()?;
        let min_y = vertices.iter().map(|v| v.y).min()?;
        let max_x = vertices.iter().map(|v| v.x).max()?;
        let max_y = vertices.iter().map(|v| v.y).max()?;

        if min_x < 0 || min_y < 0 {
            return None;
        }

        Some(Self {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }

    /// Intersect with an image of the given dimensions
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let clamped_w = self.width.min(width - self.x);
        let clamped_h = self.height.min(height - self.y);
        if clamped_w == 0 || clamped_h == 0 {
            return None;
        }
        Some(Self {
            x: self.x,
            y: self.y,
            width: clamped_w,
            height: clamped_h,
        })
    }
}

/// Quadrilateral hypothesised to be the label panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateBox {
    pub corners: [Vertex; 4],
    pub bounds: BoundingRect,
}

impl CandidateBox {
    /// Build from four corners, rejecting degenerate or out-of-image geometry
    pub fn new(corners: [Vertex; 4], image_width: u32, image_height: u32) -> Option<Self> {
        let bounds = BoundingRect::enclosing(&corners)?;
        if bounds.width == 0 || bounds.height == 0 {
            return None;
        }
        if bounds.x + bounds.width > image_width || bounds.y + bounds.height > image_height {
            return None;
        }
        Some(Self { corners, bounds })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictedLabel {
    NutritionFact,
    NonNutritionFact,
    /// No classification was performed (or the model failed)
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub predicted_label: PredictedLabel,
    /// Score of the winning class, in [0, 1]
    pub confidence: f32,
}

impl ClassificationResult {
    pub fn none() -> Self {
        Self {
            predicted_label: PredictedLabel::None,
            confidence: 0.0,
        }
    }

    pub fn is_nutrition_fact(&self) -> bool {
        self.predicted_label == PredictedLabel::NutritionFact
    }
}

/// One line of recognised text, in document order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    pub confidence: f32,
    pub line_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SugarReading {
    pub value_grams: f64,
    pub source_line_index: usize,
}

/// A value line that looked like a measurement but did not parse as a number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedValue {
    pub line_index: usize,
    pub text: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionStatus {
    Success,
    NoBoxFound,
    NotANutritionLabel,
    OcrEmpty,
}

/// Outcome of one run over one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub candidate: Option<CandidateBox>,
    pub classification: ClassificationResult,
    pub readings: Vec<SugarReading>,
    pub status: ExtractionStatus,
    /// Geometry actually cropped, after clamping to the image
    pub crop_region: Option<BoundingRect>,
    pub crop_clamped: bool,
    pub skipped: Vec<SkippedValue>,
}

impl ExtractionResult {
    pub fn no_box() -> Self {
        Self {
            candidate: None,
            classification: ClassificationResult::none(),
            readings: Vec::new(),
            status: ExtractionStatus::NoBoxFound,
            crop_region: None,
            crop_clamped: false,
            skipped: Vec::new(),
        }
    }

    /// First reading, which consumers treat as the label's sugar content
    pub fn representative_grams(&self) -> Option<f64> {
        self.readings.first().map(|r| r.value_grams)
    }
}
