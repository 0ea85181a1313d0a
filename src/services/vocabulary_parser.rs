use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::feedback_parser::starts_with_numbered_item;

const WORD_PREFIX: &str = "Word:";
const DEFINITION_PREFIX: &str = "Definition:";
const EXAMPLE_PREFIX: &str = "Example:";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub word: String,
    pub definition: String,
    pub example: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VocabularyParseError {
    #[error("no vocabulary entries with a word could be parsed")]
    NoEntries,
}

impl VocabularyEntry {
    /// Fills the field named by `line`'s prefix. Unknown lines are ignored.
    fn apply_field(&mut self, line: &str) {
        if let Some(value) = line.strip_prefix(WORD_PREFIX) {
            self.word = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix(DEFINITION_PREFIX) {
            self.definition = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix(EXAMPLE_PREFIX) {
            self.example = value.trim().to_string();
        }
    }
}

/// Scans numbered records (`1. ...`) and collects the ones that name a word.
pub fn parse_vocabulary(raw: &str) -> Result<Vec<VocabularyEntry>, VocabularyParseError> {
    let mut entries = Vec::new();
    let mut current: Option<VocabularyEntry> = None;

    for line in raw.split('\n').map(|l| l.trim_end_matches('\r').trim()) {
        if line.is_empty() {
            continue;
        }

        if starts_with_numbered_item(line) {
            entries.extend(current.take());
            let mut entry = VocabularyEntry::default();
            if let Some((_, rest)) = line.split_once(". ") {
                entry.apply_field(rest.trim());
            }
            current = Some(entry);
        } else if let Some(entry) = current.as_mut() {
            entry.apply_field(line);
        }
    }
    entries.extend(current);

    entries.retain(|entry| !entry.word.is_empty());
    if entries.is_empty() {
        return Err(VocabularyParseError::NoEntries);
    }
    Ok(entries)
}
