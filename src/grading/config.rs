use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Grading configuration.
///
/// Every field is optional; anything left out keeps the calculator default.
///
/// Example YAML:
/// ```yaml
/// grading:
///   case_sensitive: false
///   points_per_question: 1.0
///   question_points: { 11: 2.0 }
///   partial_credit: true
///   partial_credit_threshold: 0.7
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GradingConfig {
    /// Compare fill-in-blank text case-sensitively (default: false)
    #[serde(default)]
    pub case_sensitive: Option<bool>,

    /// Weight of every question without an override (default: 1.0)
    #[serde(default)]
    pub points_per_question: Option<f64>,

    /// Per-question weight overrides, keyed by question number
    #[serde(default)]
    pub question_points: Option<BTreeMap<i32, f64>>,

    /// Award similarity-based credit on near-miss fill-in-blank answers (default: true)
    #[serde(default)]
    pub partial_credit: Option<bool>,

    /// Minimum similarity that earns partial credit (default: 0.7)
    #[serde(default)]
    pub partial_credit_threshold: Option<f64>,
}

/// Detection configuration for the bubble and handwriting decision policies.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DetectionConfig {
    /// Fill ratio at or above which a bubble counts as marked (default: 0.6)
    #[serde(default)]
    pub fill_threshold: Option<f64>,

    /// Ink density below which a region has no handwriting (default: 0.05)
    #[serde(default)]
    pub min_density: Option<f64>,

    /// Leave blank or ambiguous regions unanswered instead of recording an
    /// empty answer (default: false)
    #[serde(default)]
    pub blank_as_unanswered: Option<bool>,
}
