//! Enum-based dispatch over the supported evaluation methods.
//!
//! `EvaluationMethodConfig` and `EvaluationMethod` wrap every supported
//! method so the method can be selected by name at runtime without trait
//! objects, and the config can be stored alongside a run.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::activitynet::{ActivityNetEvaluation, ActivityNetEvaluationConfig};
use super::traits::TemporalDetectionEvaluation;
use crate::{Error, Match, Result, Segment};

/// Name of the method used when none is requested.
pub const DEFAULT_METHOD: &str = "activitynet";

/// Names accepted by [`parse_config`].
pub const SUPPORTED_METHODS: &[&str] = &["activitynet"];

/// Options set explicitly by [`parse_config`] and therefore not allowed in
/// the extra options.
const RESERVED_OPTIONS: &[&str] = &["pred_field", "gt_field", "iou", "classwise"];

/// Configuration of one evaluation method, tagged by method name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "config")]
pub enum EvaluationMethodConfig {
    #[serde(rename = "activitynet")]
    ActivityNet(ActivityNetEvaluationConfig),
}

impl EvaluationMethodConfig {
    /// Method name, as accepted by [`parse_config`].
    pub fn method(&self) -> &'static str {
        match self {
            EvaluationMethodConfig::ActivityNet(_) => "activitynet",
        }
    }

    pub fn pred_field(&self) -> &str {
        match self {
            EvaluationMethodConfig::ActivityNet(c) => &c.pred_field,
        }
    }

    pub fn gt_field(&self) -> &str {
        match self {
            EvaluationMethodConfig::ActivityNet(c) => &c.gt_field,
        }
    }

    pub fn iou(&self) -> f64 {
        match self {
            EvaluationMethodConfig::ActivityNet(c) => c.iou,
        }
    }

    pub fn classwise(&self) -> bool {
        match self {
            EvaluationMethodConfig::ActivityNet(c) => c.classwise,
        }
    }

    /// Whether the method needs fields besides the two label fields.
    pub fn requires_additional_fields(&self) -> bool {
        self.build().requires_additional_fields()
    }

    /// Instantiate the configured method.
    pub fn build(&self) -> EvaluationMethod {
        match self {
            EvaluationMethodConfig::ActivityNet(c) => {
                EvaluationMethod::ActivityNet(ActivityNetEvaluation::new(c.clone()))
            }
        }
    }
}

/// An instantiated evaluation method.
#[derive(Debug, Clone)]
pub enum EvaluationMethod {
    ActivityNet(ActivityNetEvaluation),
}

impl TemporalDetectionEvaluation for EvaluationMethod {
    #[inline]
    fn evaluate_video(
        &self,
        ground_truth: &[Segment],
        predictions: &[Segment],
    ) -> Result<Vec<Match>> {
        match self {
            EvaluationMethod::ActivityNet(m) => m.evaluate_video(ground_truth, predictions),
        }
    }

    #[inline]
    fn requires_additional_fields(&self) -> bool {
        match self {
            EvaluationMethod::ActivityNet(m) => m.requires_additional_fields(),
        }
    }
}

/// Resolve a method name and options into a method configuration.
///
/// # Arguments
/// * `pred_field` - Field holding the predicted segments
/// * `gt_field` - Field holding the ground truth segments
/// * `method` - Method name; `None` selects [`DEFAULT_METHOD`]
/// * `iou` - IoU threshold, in `[0, 1]`
/// * `classwise` - Only match segments with equal labels
/// * `options` - Extra method-specific options
///
/// # Errors
/// `Error::UnsupportedMethod` for an unknown method name and
/// `Error::InvalidConfig` for bad or unknown options.
pub fn parse_config(
    pred_field: &str,
    gt_field: &str,
    method: Option<&str>,
    iou: f64,
    classwise: bool,
    options: &Map<String, Value>,
) -> Result<EvaluationMethodConfig> {
    if !(0.0..=1.0).contains(&iou) {
        return Err(Error::InvalidConfig(format!(
            "iou threshold must be in [0, 1], got {}",
            iou
        )));
    }

    if let Some(key) = RESERVED_OPTIONS.iter().find(|k| options.contains_key(**k)) {
        return Err(Error::InvalidConfig(format!(
            "option '{}' cannot be passed as an extra option",
            key
        )));
    }

    let mut merged = options.clone();
    merged.insert("pred_field".to_string(), Value::from(pred_field));
    merged.insert("gt_field".to_string(), Value::from(gt_field));
    merged.insert("iou".to_string(), Value::from(iou));
    merged.insert("classwise".to_string(), Value::from(classwise));

    match method.unwrap_or(DEFAULT_METHOD) {
        "activitynet" => {
            let config: ActivityNetEvaluationConfig = serde_json::from_value(Value::Object(merged))
                .map_err(|e| Error::InvalidConfig(format!("activitynet: {}", e)))?;
            Ok(EvaluationMethodConfig::ActivityNet(config))
        }
        other => Err(Error::UnsupportedMethod(other.to_string())),
    }
}
