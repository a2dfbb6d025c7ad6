//! Temporal detection evaluation methods.
//!
//! This module provides:
//! - `TemporalDetectionEvaluation` trait implemented by every method
//! - `ActivityNetEvaluation` - confidence-ordered greedy matching
//! - `EvaluationMethodConfig` / `EvaluationMethod` - enum-based selection by name
//! - `parse_config` - resolve a method name and options into a config

mod traits;
mod activitynet;
mod dispatch;

pub use traits::TemporalDetectionEvaluation;
pub use activitynet::{ActivityNetEvaluation, ActivityNetEvaluationConfig, DEFAULT_IOU};
pub use dispatch::{
    parse_config, EvaluationMethod, EvaluationMethodConfig, DEFAULT_METHOD, SUPPORTED_METHODS,
};
