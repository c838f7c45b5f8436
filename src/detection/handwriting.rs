use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_MIN_DENSITY: f64 = 0.05;

/// Smallest connected component, in pixels, that counts as a stroke.
pub const MIN_COMPONENT_AREA: u32 = 20;

/// Number of significant components needed to call a region handwriting.
pub const MIN_SIGNIFICANT_COMPONENTS: usize = 2;

// Signal levels at which each confidence term saturates
const DENSITY_SATURATION: f64 = 0.2;
const EDGE_DENSITY_SATURATION: f64 = 0.15;

const DENSITY_WEIGHT: f64 = 0.4;
const EDGE_WEIGHT: f64 = 0.3;
const COMPONENT_WEIGHT: f64 = 0.3;

/// Measurements taken from one fill-in-blank region.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandwritingSignals {
    /// Fraction of ink pixels after binarization, 0.0 to 1.0
    pub pixel_density: f64,
    /// Fraction of stroke-edge pixels, 0.0 to 1.0
    #[serde(default)]
    pub edge_density: f64,
    /// Pixel area of each connected ink component
    #[serde(default)]
    pub component_areas: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HandwritingVerdict {
    pub present: bool,
    pub confidence: f64,
}

/// Fuses ink density, edge density and stroke components into a presence
/// decision and a confidence score.
#[derive(Debug, Clone)]
pub struct HandwritingConfidenceFuser {
    min_density: f64,
}

impl Default for HandwritingConfidenceFuser {
    fn default() -> Self {
        Self {
            min_density: DEFAULT_MIN_DENSITY,
        }
    }
}

impl HandwritingConfidenceFuser {
    /// A density outside [0, 1] falls back to the default.
    pub fn new(min_density: f64) -> Self {
        if !(0.0..=1.0).contains(&min_density) {
            warn!(
                "minimum density must be between 0.0 and 1.0, got {}; using {}",
                min_density, DEFAULT_MIN_DENSITY
            );
            return Self::default();
        }
        Self { min_density }
    }

    pub fn min_density(&self) -> f64 {
        self.min_density
    }

    /// Ignored unless `density` is within [0, 1].
    pub fn set_min_density(&mut self, density: f64) {
        if (0.0..=1.0).contains(&density) {
            self.min_density = density;
        }
    }

    /// Weighted confidence in [0, 1]. Each term is clamped to [0, 1] before
    /// weighting, so a single saturated signal contributes at most its own
    /// weight and a negative or NaN signal contributes nothing.
    pub fn confidence(&self, pixel_density: f64, edge_density: f64, has_components: bool) -> f64 {
        let density_score = unit_term(pixel_density / DENSITY_SATURATION) * DENSITY_WEIGHT;
        let edge_score = unit_term(edge_density / EDGE_DENSITY_SATURATION) * EDGE_WEIGHT;
        let component_score = if has_components { COMPONENT_WEIGHT } else { 0.0 };

        (density_score + edge_score + component_score).min(1.0)
    }

    /// Presence decision. `has_components` is only evaluated when the density
    /// check passes, so callers can hand in an expensive component analysis.
    pub fn is_present<F>(&self, pixel_density: f64, has_components: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        if pixel_density < self.min_density {
            return false;
        }
        has_components()
    }

    /// Full verdict for a set of region measurements. Components are only
    /// counted when the density check passes; below it the component term
    /// of the confidence stays at zero.
    pub fn evaluate(&self, signals: &HandwritingSignals) -> HandwritingVerdict {
        let mut has_components = false;
        let present = self.is_present(signals.pixel_density, || {
            has_components = has_significant_components(&signals.component_areas);
            has_components
        });

        HandwritingVerdict {
            present,
            confidence: self.confidence(signals.pixel_density, signals.edge_density, has_components),
        }
    }
}

// f64::max drops NaN, so NaN maps to 0.0
fn unit_term(value: f64) -> f64 {
    value.max(0.0).min(1.0)
}

/// At least two components large enough to be strokes rather than specks.
pub fn has_significant_components(component_areas: &[u32]) -> bool {
    component_areas
        .iter()
        .filter(|area| **area >= MIN_COMPONENT_AREA)
        .count()
        >= MIN_SIGNIFICANT_COMPONENTS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_confidence_weights() {
        let fuser = HandwritingConfidenceFuser::default();
        assert!((fuser.confidence(0.1, 0.075, true) - 0.65).abs() < 1e-9);
        assert!((fuser.confidence(0.1, 0.075, false) - 0.35).abs() < 1e-9);
        assert_eq!(fuser.confidence(0.0, 0.0, false), 0.0);
    }

    #[test]
    fn test_confidence_terms_capped() {
        let fuser = HandwritingConfidenceFuser::default();
        // Saturated density alone never exceeds its weight
        assert!((fuser.confidence(1.0, 0.0, false) - 0.4).abs() < 1e-9);
        assert!((fuser.confidence(0.0, 1.0, false) - 0.3).abs() < 1e-9);
        assert!((fuser.confidence(1.0, 1.0, true) - 1.0).abs() < 1e-9);
        assert!(fuser.confidence(1.0, 1.0, true) <= 1.0);
    }

    #[test]
    fn test_confidence_ignores_invalid_signals() {
        let fuser = HandwritingConfidenceFuser::default();
        assert_eq!(fuser.confidence(-0.5, -1.0, false), 0.0);
        assert_eq!(fuser.confidence(f64::NAN, f64::NAN, false), 0.0);
        assert!((fuser.confidence(-0.5, f64::NAN, true) - 0.3).abs() < 1e-9);
        assert!((fuser.confidence(f64::NAN, 0.075, false) - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_significant_components() {
        assert!(!has_significant_components(&[]));
        assert!(!has_significant_components(&[500]));
        assert!(!has_significant_components(&[19, 19, 19, 40]));
        assert!(has_significant_components(&[20, 20]));
        assert!(has_significant_components(&[5, 45, 60, 3]));
    }

    #[test]
    fn test_low_density_skips_component_check() {
        let fuser = HandwritingConfidenceFuser::default();
        let called = Cell::new(false);

        let present = fuser.is_present(0.01, || {
            called.set(true);
            true
        });

        assert!(!present);
        assert!(!called.get());
    }

    #[test]
    fn test_presence_requires_components() {
        let fuser = HandwritingConfidenceFuser::default();
        assert!(fuser.is_present(0.05, || true));
        assert!(!fuser.is_present(0.3, || false));
    }

    #[test]
    fn test_evaluate() {
        let fuser = HandwritingConfidenceFuser::default();

        let writing = HandwritingSignals {
            pixel_density: 0.2,
            edge_density: 0.15,
            component_areas: vec![35, 80, 4],
        };
        let verdict = fuser.evaluate(&writing);
        assert!(verdict.present);
        assert!((verdict.confidence - 1.0).abs() < 1e-9);

        let smudge = HandwritingSignals {
            pixel_density: 0.08,
            edge_density: 0.0,
            component_areas: vec![300],
        };
        let verdict = fuser.evaluate(&smudge);
        assert!(!verdict.present);
        assert!((verdict.confidence - 0.16).abs() < 1e-9);
    }

    #[test]
    fn test_evaluate_below_density_skips_components() {
        let fuser = HandwritingConfidenceFuser::default();
        let faint = HandwritingSignals {
            pixel_density: 0.01,
            edge_density: 0.0,
            component_areas: vec![50, 60, 70],
        };

        let verdict = fuser.evaluate(&faint);
        assert!(!verdict.present);
        // Only the density term: 0.01 / 0.2 * 0.4
        assert!((verdict.confidence - 0.02).abs() < 1e-9);
    }

    #[test]
    fn test_min_density_configuration() {
        assert_eq!(HandwritingConfidenceFuser::new(2.0).min_density(), DEFAULT_MIN_DENSITY);

        let mut fuser = HandwritingConfidenceFuser::new(0.1);
        fuser.set_min_density(-0.5);
        assert_eq!(fuser.min_density(), 0.1);
        fuser.set_min_density(0.02);
        assert_eq!(fuser.min_density(), 0.02);
        assert!(fuser.is_present(0.03, || true));
    }

    #[test]
    fn test_signals_parse_with_defaults() {
        let yaml = "pixel_density: 0.12\n";
        let signals: HandwritingSignals = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(signals.pixel_density, 0.12);
        assert_eq!(signals.edge_density, 0.0);
        assert!(signals.component_areas.is_empty());
    }
}
