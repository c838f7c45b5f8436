use super::types::{Answer, AnswerKey, QuestionKind};
use anyhow::{bail, Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

const KEY_FILE_HEADER: &str = "# Answer Key\n# Format: questionNum,type,answer\n\n";

/// Parse one line of a key file.
///
/// Returns `Ok(None)` for blank lines and `#` comments, `Err` for lines that
/// cannot be turned into an answer.
pub fn parse_key_line(line: &str) -> Result<Option<Answer>> {
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    // Format: "questionNum,type,answer". The answer part keeps any further commas.
    let Some((number_part, rest)) = line.split_once(',') else {
        bail!("expected 'questionNum,type,answer'");
    };
    let Some((type_part, value)) = rest.split_once(',') else {
        bail!("expected 'questionNum,type,answer'");
    };

    let question_number: i32 = number_part
        .trim()
        .parse()
        .with_context(|| format!("invalid question number '{}'", number_part))?;

    let Some(kind) = QuestionKind::from_key_token(type_part) else {
        bail!("unknown question type '{}'", type_part);
    };

    let answer = match kind {
        QuestionKind::MultipleChoice => {
            let option: i64 = value
                .trim()
                .parse()
                .with_context(|| format!("invalid option index '{}'", value))?;
            Answer::multiple_choice(question_number, usize::try_from(option).ok())
        }
        QuestionKind::FillInBlank => Answer::fill_in_blank(question_number, value),
        QuestionKind::TrueFalse => {
            let is_true = value == "T" || value == "1";
            Answer::true_false(question_number, Some(if is_true { 0 } else { 1 }))
        }
    };

    Ok(Some(answer))
}

impl AnswerKey {
    /// Build a key from its text form, skipping malformed lines.
    pub fn parse_str(content: &str) -> Self {
        let mut key = Self::new();
        for (idx, line) in content.lines().enumerate() {
            key.insert_line(idx + 1, line);
        }
        key
    }

    /// Build a key from raw file bytes. Lines that are not valid UTF-8 are
    /// skipped like any other malformed line.
    pub fn parse_bytes(content: &[u8]) -> Self {
        let mut key = Self::new();
        for (idx, raw) in content.split(|b| *b == b'\n').enumerate() {
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            match std::str::from_utf8(raw) {
                Ok(line) => key.insert_line(idx + 1, line),
                Err(e) => debug!(line = idx + 1, "skipping answer key line: {}", e),
            }
        }
        key
    }

    fn insert_line(&mut self, line_number: usize, line: &str) {
        match parse_key_line(line) {
            Ok(Some(answer)) => self.insert(answer),
            Ok(None) => {}
            Err(e) => debug!(line = line_number, "skipping answer key line: {:#}", e),
        }
    }

    /// Build a key from its text form, reporting every malformed line.
    pub fn parse_strict(content: &str) -> Result<Self, Vec<String>> {
        let mut key = Self::new();
        let mut errors = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            match parse_key_line(line) {
                Ok(Some(answer)) => key.insert(answer),
                Ok(None) => {}
                Err(e) => errors.push(format!("line {}: {:#} ('{}')", idx + 1, e, line)),
            }
        }

        if errors.is_empty() {
            Ok(key)
        } else {
            Err(errors)
        }
    }

    /// Render the key in the file format, header included.
    pub fn to_key_string(&self) -> String {
        let mut out = String::from(KEY_FILE_HEADER);
        for (question_number, answer) in self.iter() {
            let value = match answer.kind {
                QuestionKind::MultipleChoice => answer.option_sentinel().to_string(),
                QuestionKind::FillInBlank => answer.text_answer.clone(),
                QuestionKind::TrueFalse => {
                    let token = if answer.selected_option == Some(0) { "T" } else { "F" };
                    token.to_string()
                }
            };
            let _ = writeln!(out, "{},{},{}", question_number, answer.kind.key_token(), value);
        }
        out
    }

    /// Replace the contents of this key with the answers in `path`.
    ///
    /// Fails only if the file cannot be read; malformed lines, including
    /// ones in another encoding, are skipped. On failure the current contents
    /// are left untouched.
    pub fn load_from_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read(path)
            .with_context(|| format!("Failed to read answer key at {}", path.display()))?;

        *self = Self::parse_bytes(&content);
        info!(path = %path.display(), "{} answers loaded", self.total_questions());
        Ok(())
    }

    /// Write the key to `path` atomically.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let mut file = AtomicWriteFile::open(path)
            .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

        file.write_all(self.to_key_string().as_bytes())
            .with_context(|| format!("Failed to write answer key to {}", path.display()))?;

        file.commit().context("Failed to save answer key")?;

        debug!(path = %path.display(), "{} answers saved", self.total_questions());
        Ok(())
    }
}
