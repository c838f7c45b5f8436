pub mod storage;
pub mod types;

pub use storage::parse_key_line;
pub use types::{Answer, AnswerKey, QuestionKind};
