use glucoscan::detection::{ClassifierModel, OcrEngine, PanelPatch, RecognizedText};
use glucoscan::{BoundingRect, CandidateBox, TextLine, Vertex};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Photo dimensions and frame geometry of [`framed_label_photo`]
pub const PHOTO_SIZE: u32 = 160;
pub const FRAME: BoundingRect = BoundingRect {
    x: 30,
    y: 40,
    width: 90,
    height: 70,
};
pub const FRAME_THICKNESS: u32 = 6;

/// A black mask with the given filled rectangles set to 255
pub fn mask_with_rects(width: u32, height: u32, rects: &[(i32, i32, u32, u32)]) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    for &(x, y, w, h) in rects {
        draw_filled_rect_mut(&mut mask, Rect::at(x, y).of_size(w, h), Luma([255u8]));
    }
    mask
}

pub fn mask_with_circle(width: u32, height: u32, center: (i32, i32), radius: i32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    draw_filled_circle_mut(&mut mask, center, radius, Luma([255u8]));
    mask
}

/// White photo with a thick black rectangular border standing in for a label panel
pub fn framed_label_photo() -> DynamicImage {
    let mut img = RgbImage::from_pixel(PHOTO_SIZE, PHOTO_SIZE, Rgb([255, 255, 255]));
    let black = Rgb([0u8, 0, 0]);
    let (x, y) = (FRAME.x as i32, FRAME.y as i32);
    let (w, h, t) = (FRAME.width, FRAME.height, FRAME_THICKNESS);

    draw_filled_rect_mut(&mut img, Rect::at(x, y).of_size(w, t), black);
    draw_filled_rect_mut(&mut img, Rect::at(x, y + (h - t) as i32).of_size(w, t), black);
    draw_filled_rect_mut(&mut img, Rect::at(x, y).of_size(t, h), black);
    draw_filled_rect_mut(&mut img, Rect::at(x + (w - t) as i32, y).of_size(t, h), black);

    DynamicImage::ImageRgb8(img)
}

pub fn blank_photo() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(PHOTO_SIZE, PHOTO_SIZE, Rgb([255, 255, 255])))
}

/// Axis-aligned candidate with corners in clockwise order
pub fn rect_candidate(x: i32, y: i32, w: i32, h: i32, img_w: u32, img_h: u32) -> CandidateBox {
    CandidateBox::new(
        [
            Vertex::new(x, y),
            Vertex::new(x + w - 1, y),
            Vertex::new(x + w - 1, y + h - 1),
            Vertex::new(x, y + h - 1),
        ],
        img_w,
        img_h,
    )
    .expect("candidate inside image")
}

/// Text lines numbered in the given order
pub fn lines(texts: &[&str]) -> Vec<TextLine> {
    texts
        .iter()
        .enumerate()
        .map(|(line_index, text)| TextLine {
            text: text.to_string(),
            confidence: 0.9,
            line_index,
        })
        .collect()
}

/// Classifier returning fixed scores and counting calls
pub struct StubClassifier {
    scores: Vec<f32>,
    calls: AtomicUsize,
}

impl StubClassifier {
    pub fn new(scores: &[f32]) -> Self {
        Self {
            scores: scores.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn nutrition_fact() -> Self {
        Self::new(&[0.1, 0.9])
    }

    pub fn non_nutrition_fact() -> Self {
        Self::new(&[0.8, 0.2])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ClassifierModel for StubClassifier {
    fn scores(&self, _patch: &PanelPatch) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.scores.clone())
    }
}

pub struct FailingClassifier;

impl ClassifierModel for FailingClassifier {
    fn scores(&self, _patch: &PanelPatch) -> anyhow::Result<Vec<f32>> {
        anyhow::bail!("model unavailable")
    }
}

/// OCR engine replaying a fixed script and remembering the image sizes it saw
pub struct ScriptedOcr {
    script: Vec<String>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(u32, u32)>>,
}

impl ScriptedOcr {
    pub fn new(script: &[&str]) -> Self {
        Self {
            script: script.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_sizes(&self) -> Vec<(u32, u32)> {
        self.seen.lock().unwrap().clone()
    }
}

impl OcrEngine for ScriptedOcr {
    fn recognize(&self, image: &DynamicImage) -> anyhow::Result<Vec<RecognizedText>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((image.width(), image.height()));
        Ok(self
            .script
            .iter()
            .map(|text| RecognizedText::new(text.clone(), 0.95))
            .collect())
    }
}

pub struct FailingOcr;

impl OcrEngine for FailingOcr {
    fn recognize(&self, _image: &DynamicImage) -> anyhow::Result<Vec<RecognizedText>> {
        anyhow::bail!("engine crashed")
    }
}
