use tracing::warn;

pub const DEFAULT_FILL_THRESHOLD: f64 = 0.6;

/// Turns per-option fill ratios for one question into a single answer.
///
/// Precision over recall: a question resolves only when exactly one option
/// is marked. No marks, or more than one, means no decision; relative fill
/// levels are never used to pick a winner.
#[derive(Debug, Clone)]
pub struct BubbleMarkResolver {
    fill_threshold: f64,
}

impl Default for BubbleMarkResolver {
    fn default() -> Self {
        Self {
            fill_threshold: DEFAULT_FILL_THRESHOLD,
        }
    }
}

impl BubbleMarkResolver {
    /// A threshold outside [0, 1] falls back to the default.
    pub fn new(fill_threshold: f64) -> Self {
        if !(0.0..=1.0).contains(&fill_threshold) {
            warn!(
                "fill threshold must be between 0.0 and 1.0, got {}; using {}",
                fill_threshold, DEFAULT_FILL_THRESHOLD
            );
            return Self::default();
        }
        Self { fill_threshold }
    }

    pub fn fill_threshold(&self) -> f64 {
        self.fill_threshold
    }

    /// Ignored unless `threshold` is within [0, 1].
    pub fn set_fill_threshold(&mut self, threshold: f64) {
        if (0.0..=1.0).contains(&threshold) {
            self.fill_threshold = threshold;
        }
    }

    pub fn is_marked(&self, fill_ratio: f64) -> bool {
        fill_ratio >= self.fill_threshold
    }

    /// Indices of every marked option, in option order.
    pub fn marked_options(&self, fills: &[f64]) -> Vec<usize> {
        fills
            .iter()
            .enumerate()
            .filter(|(_, fill)| self.is_marked(**fill))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// The marked option if exactly one is marked.
    pub fn resolve(&self, fills: &[f64]) -> Option<usize> {
        match self.marked_options(fills).as_slice() {
            [single] => Some(*single),
            _ => None,
        }
    }
}
