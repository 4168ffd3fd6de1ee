pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod source;

pub use config::ExtractionConfig;
pub use error::ExtractionError;
pub use models::{
    BoundingRect, CandidateBox, ClassificationResult, ExtractionResult, ExtractionStatus,
    PredictedLabel, SkippedValue, SugarReading, TextLine, Vertex,
};
pub use pipeline::{DebugConfig, Pipeline};
pub use source::{FileImageSource, ImageSource, MemoryImageSource};
