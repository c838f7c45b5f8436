use crate::answer_key::QuestionKind;
use crate::detection::HandwritingSignals;
use serde::{Deserialize, Serialize};

/// Everything the image and OCR stages measured on one exam sheet.
///
/// Example YAML:
/// ```yaml
/// regions:
///   - type: multiple_choice
///     question: 1
///     fills: [0.1, 0.8, 0.2, 0.1, 0.0]
///   - type: fill_in_blank
///     question: 2
///     text: "ankar"
///     signals: { pixel_density: 0.12, edge_density: 0.08, component_areas: [45, 60] }
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SheetMeasurements {
    /// Optional label shown in reports (defaults to the file name)
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub regions: Vec<RegionMeasurement>,
}

/// Measurements for one question region.
///
/// Bubble questions carry `fills`; fill-in-blank questions carry `text` plus
/// either an explicit `has_handwriting` verdict or raw `signals`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RegionMeasurement {
    pub question: i32,

    #[serde(rename = "type")]
    pub kind: QuestionKind,

    /// Fill ratio per option, 0.0 to 1.0
    #[serde(default)]
    pub fills: Option<Vec<f64>>,

    /// Recognized text from OCR
    #[serde(default)]
    pub text: Option<String>,

    /// Presence verdict made upstream; takes precedence over `signals`
    #[serde(default)]
    pub has_handwriting: Option<bool>,

    #[serde(default)]
    pub signals: Option<HandwritingSignals>,
}
