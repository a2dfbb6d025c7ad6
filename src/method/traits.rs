//! Evaluation method trait definition.

use crate::{Match, Result, Segment};

/// Trait for temporal detection matching strategies.
///
/// A strategy decides, for one video, which predictions match which ground
/// truth segments. It borrows its inputs immutably and persists nothing;
/// annotating segments and writing tallies is left to the caller.
pub trait TemporalDetectionEvaluation {
    /// Match the segments of one video.
    ///
    /// # Arguments
    /// * `ground_truth` - Ground truth segments of the video
    /// * `predictions` - Predicted segments of the video
    ///
    /// # Returns
    /// One record per matched pair, per unmatched ground truth segment and per
    /// unmatched prediction. Every input segment appears in exactly one record.
    fn evaluate_video(
        &self,
        ground_truth: &[Segment],
        predictions: &[Segment],
    ) -> Result<Vec<Match>>;

    /// Whether fields besides the two label fields are needed per video.
    ///
    /// When false, videos are loaded with only the label fields selected.
    fn requires_additional_fields(&self) -> bool {
        false
    }
}
