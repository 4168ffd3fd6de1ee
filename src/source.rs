use image::{DynamicImage, ImageReader};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{ExtractionError, Result};

/// File extensions accepted for uploaded label photos
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Supplies a decoded image for a storage reference
pub trait ImageSource {
    fn load(&self, reference: &str) -> Result<DynamicImage>;
}

pub fn has_allowed_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Reads images from the filesystem, optionally relative to a root directory
#[derive(Debug, Clone, Default)]
pub struct FileImageSource {
    root: Option<PathBuf>,
}

impl FileImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, reference: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(reference),
            None => PathBuf::from(reference),
        }
    }
}

impl ImageSource for FileImageSource {
    fn load(&self, reference: &str) -> Result<DynamicImage> {
        let path = self.resolve(reference);
        if !has_allowed_extension(&path) {
            return Err(ExtractionError::invalid_image(format!(
                "unsupported file type: {}",
                path.display()
            )));
        }

        ImageReader::open(&path)
            .map_err(|e| {
                ExtractionError::invalid_image(format!("cannot open {}: {}", path.display(), e))
            })?
            .decode()
            .map_err(|e| {
                let reason = format!("failed to decode {}: {}", path.display(), e);
                ExtractionError::invalid_image(reason)
            })
    }
}

/// Encoded images held in memory, keyed by reference
#[derive(Debug, Clone, Default)]
pub struct MemoryImageSource {
    images: HashMap<String, Vec<u8>>,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<String>, bytes: Vec<u8>) {
        self.images.insert(reference.into(), bytes);
    }
}

impl ImageSource for MemoryImageSource {
    fn load(&self, reference: &str) -> Result<DynamicImage> {
        let bytes = self
            .images
            .get(reference)
            .ok_or_else(|| ExtractionError::invalid_image(format!("no image for {}", reference)))?;

        image::load_from_memory(bytes).map_err(|e| {
            ExtractionError::invalid_image(format!("failed to decode {}: {}", reference, e))
        })
    }
}
