use crate::grading::{DetectionConfig, GradingConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Answer key file, relative paths resolved against the working directory
    #[serde(default)]
    pub answer_key: Option<PathBuf>,

    #[serde(default)]
    pub grading: Option<GradingConfig>,

    #[serde(default)]
    pub detection: Option<DetectionConfig>,
}
