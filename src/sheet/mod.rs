pub mod extract;
pub mod types;

pub use extract::{load_sheet, AnswerExtractor};
pub use types::{RegionMeasurement, SheetMeasurements};
