//! Decision policies that turn scalar measurements from the image and OCR
//! stages into discrete answers.

pub mod bubble;
pub mod handwriting;

pub use bubble::BubbleMarkResolver;
pub use handwriting::{
    has_significant_components, HandwritingConfidenceFuser, HandwritingSignals, HandwritingVerdict,
};
