//! # segeval - Temporal Detection Evaluation
//!
//! Evaluates predicted time segments against ground truth segments across a
//! collection of videos.
//!
//! ## Features
//!
//! - One-to-one segment matching with an inclusive IoU threshold
//! - Class-restricted or class-agnostic matching
//! - Per-video TP/FP/FN tallies and per-segment annotations
//! - Confusion matrices, per-class reports and aggregate metrics
//! - Lossless results serialization
//!
//! ## Example
//!
//! ```rust,ignore
//! use segeval_rs::{evaluate_temporal_detections, EvaluationOptions};
//! use segeval_rs::collection::InMemoryDataset;
//! use segeval_rs::runs::InMemoryRunRegistry;
//!
//! let mut dataset = InMemoryDataset::with_label_fields("ground_truth", "predictions");
//! let mut runs = InMemoryRunRegistry::new();
//!
//! let options = EvaluationOptions {
//!     eval_key: Some("eval".to_string()),
//!     ..Default::default()
//! };
//!
//! let results = evaluate_temporal_detections(&mut dataset, &mut runs, "predictions", &options)?;
//! println!("{}", results.report(None));
//! ```

// Public modules
pub mod segment;
pub mod iou;
pub mod matching;
pub mod method;
pub mod collection;
pub mod runs;
pub mod results;
pub mod evaluation;

// Re-exports for convenience
pub use segment::Segment;
pub use method::{
    parse_config, EvaluationMethod, EvaluationMethodConfig, TemporalDetectionEvaluation,
};
pub use results::{Match, ResultsDict, TemporalDetectionResults};
pub use collection::{InMemoryDataset, SampleCollection};
pub use runs::{InMemoryRunRegistry, RunRegistry};
pub use evaluation::{
    cleanup, delete_evaluation, evaluate_temporal_detections, evaluation_fields,
    load_evaluation_results, tally_matches, EvaluationOptions,
};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur while evaluating temporal detections
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Collection must contain videos, found media type '{0}'")]
        NotVideoCollection(String),

        #[error("Field '{0}' does not exist")]
        FieldNotFound(String),

        #[error("Field '{field}' has type {got}, expected {expected}")]
        InvalidFieldType {
            field: String,
            expected: String,
            got: String,
        },

        #[error("Unsupported evaluation method '{0}'")]
        UnsupportedMethod(String),

        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),

        #[error(
            "Evaluation key '{key}' has {field}='{existing}', requested {field}='{requested}'"
        )]
        FieldMismatch {
            key: String,
            field: String,
            existing: String,
            requested: String,
        },

        #[error("Invalid segment: {0}")]
        InvalidSegment(String),

        #[error("Malformed match: {0}")]
        MalformedMatch(String),

        #[error("Invalid results: {0}")]
        InvalidResults(String),

        #[error("Video '{0}' not found")]
        VideoNotFound(String),

        #[error("Evaluation run '{0}' not found")]
        RunNotFound(String),

        #[error("JSON error: {0}")]
        Json(#[from] serde_json::Error),

        #[error("IO error: {0}")]
        IoError(#[from] std::io::Error),
    }

    /// Result type for evaluation operations
    pub type Result<T> = std::result::Result<T, Error>;
}
