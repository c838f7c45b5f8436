use super::types::{RegionMeasurement, SheetMeasurements};
use crate::answer_key::{Answer, QuestionKind};
use crate::detection::bubble::DEFAULT_FILL_THRESHOLD;
use crate::detection::handwriting::DEFAULT_MIN_DENSITY;
use crate::detection::{BubbleMarkResolver, HandwritingConfidenceFuser};
use crate::grading::DetectionConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load a sheet's measurements from a YAML file.
pub fn load_sheet(path: &Path) -> Result<SheetMeasurements> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read sheet measurements at {}", path.display()))?;

    let sheet: SheetMeasurements = serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse sheet: invalid YAML in {}", path.display()))?;

    Ok(sheet)
}

/// Runs the bubble and handwriting policies over a sheet's regions.
#[derive(Debug, Clone, Default)]
pub struct AnswerExtractor {
    resolver: BubbleMarkResolver,
    fuser: HandwritingConfidenceFuser,
    blank_as_unanswered: bool,
}

impl AnswerExtractor {
    pub fn new(resolver: BubbleMarkResolver, fuser: HandwritingConfidenceFuser) -> Self {
        Self {
            resolver,
            fuser,
            blank_as_unanswered: false,
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        let resolver =
            BubbleMarkResolver::new(config.fill_threshold.unwrap_or(DEFAULT_FILL_THRESHOLD));
        let fuser = HandwritingConfidenceFuser::new(config.min_density.unwrap_or(DEFAULT_MIN_DENSITY));

        Self::new(resolver, fuser)
            .with_blank_as_unanswered(config.blank_as_unanswered.unwrap_or(false))
    }

    /// When set, regions with no usable mark or no handwriting produce no
    /// answer at all and grade as unanswered. Otherwise they produce an empty
    /// answer and grade as incorrect.
    pub fn with_blank_as_unanswered(mut self, blank_as_unanswered: bool) -> Self {
        self.blank_as_unanswered = blank_as_unanswered;
        self
    }

    pub fn resolver(&self) -> &BubbleMarkResolver {
        &self.resolver
    }

    pub fn fuser(&self) -> &HandwritingConfidenceFuser {
        &self.fuser
    }

    pub fn extract(&self, sheet: &SheetMeasurements) -> Vec<Answer> {
        sheet
            .regions
            .iter()
            .filter_map(|region| self.extract_region(region))
            .collect()
    }

    pub fn extract_region(&self, region: &RegionMeasurement) -> Option<Answer> {
        let answer = match region.kind {
            QuestionKind::MultipleChoice | QuestionKind::TrueFalse => {
                let fills = region.fills.as_deref().unwrap_or_default();
                let selected = self.resolver.resolve(fills);

                match selected {
                    Some(option) => debug!(question = region.question, "option {} marked", option),
                    None => debug!(
                        question = region.question,
                        "no single option marked ({} marked)",
                        self.resolver.marked_options(fills).len()
                    ),
                }

                if region.kind == QuestionKind::TrueFalse {
                    Answer::true_false(region.question, selected)
                } else {
                    Answer::multiple_choice(region.question, selected)
                }
            }
            QuestionKind::FillInBlank => {
                let text = if self.has_handwriting(region) {
                    region.text.clone().unwrap_or_default()
                } else {
                    String::new()
                };
                debug!(question = region.question, "read \"{}\"", text);
                Answer::fill_in_blank(region.question, text)
            }
        };

        if self.blank_as_unanswered && is_blank(&answer) {
            return None;
        }
        Some(answer)
    }

    fn has_handwriting(&self, region: &RegionMeasurement) -> bool {
        if let Some(present) = region.has_handwriting {
            return present;
        }

        if let Some(ref signals) = region.signals {
            let verdict = self.fuser.evaluate(signals);
            debug!(
                question = region.question,
                confidence = verdict.confidence,
                "handwriting present: {}",
                verdict.present
            );
            return verdict.present;
        }

        region
            .text
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
    }
}

fn is_blank(answer: &Answer) -> bool {
    match answer.kind {
        QuestionKind::MultipleChoice | QuestionKind::TrueFalse => answer.selected_option.is_none(),
        QuestionKind::FillInBlank => answer.text_answer.trim().is_empty(),
    }
}
