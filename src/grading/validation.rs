use super::config::{DetectionConfig, GradingConfig};

fn check_unit_interval(errors: &mut Vec<String>, field: &str, value: Option<f64>) {
    if let Some(v) = value {
        if !(0.0..=1.0).contains(&v) {
            errors.push(format!("{}: must be between 0.0 and 1.0, got {}", field, v));
        }
    }
}

/// Validate grading configuration at startup.
/// Returns all validation errors at once (not just the first).
///
/// The calculator setters ignore bad values silently; this is the strict
/// counterpart for configuration read from disk.
pub fn validate_grading(config: &GradingConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(points) = config.points_per_question {
        if points <= 0.0 || points.is_nan() {
            errors.push(format!("grading.points_per_question: must be positive, got {}", points));
        }
    }

    if let Some(ref overrides) = config.question_points {
        for (question_number, &points) in overrides {
            if points <= 0.0 || points.is_nan() {
                errors.push(format!(
                    "grading.question_points.{}: must be positive, got {}",
                    question_number, points
                ));
            }
        }
    }

    check_unit_interval(
        &mut errors,
        "grading.partial_credit_threshold",
        config.partial_credit_threshold,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate detection configuration. Same contract as [`validate_grading`].
pub fn validate_detection(config: &DetectionConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    check_unit_interval(&mut errors, "detection.fill_threshold", config.fill_threshold);
    check_unit_interval(&mut errors, "detection.min_density", config.min_density);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
