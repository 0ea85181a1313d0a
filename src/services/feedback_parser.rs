//! Line-oriented state machine that turns a raw feedback reply into a
//! [`FeedbackResult`].
//!
//! Parsing never fails: when the reply does not follow the marker contract the
//! caller still receives a well-shaped result carrying the raw text and a
//! diagnostic entry.

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const START_MARKER: &str = "---START_RESPONSE---";
pub const END_MARKER: &str = "---END_RESPONSE---";
pub const CORRECTED_TEXT_PREFIX: &str = "CORRECTED_TEXT:";
pub const CHANGES_LIST_PREFIX: &str = "CHANGES_LIST:";
pub const NO_CHANGES_SENTINEL: &str = "No changes needed.";

const EXCERPT_CHARS: usize = 150;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResult {
    pub corrected_text: String,
    #[serde(rename = "changes_list")]
    pub changes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Initial,
    InResponseBlock,
    InCorrectedText,
    InChangesList,
}

/// Outcome of feeding one line to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue(ParserState),
    Finished { successful: bool },
}

#[derive(Debug, Default)]
struct Accumulator {
    corrected_text: String,
    changes: Vec<String>,
}

impl Accumulator {
    fn append_corrected(&mut self, fragment: &str) {
        if fragment.is_empty() {
            return;
        }
        if !self.corrected_text.is_empty() {
            self.corrected_text.push(' ');
        }
        self.corrected_text.push_str(fragment);
    }

    fn push_change(&mut self, entry: &str) {
        let entry = entry.trim();
        if !entry.is_empty() {
            self.changes.push(entry.to_string());
        }
    }
}

/// Transition function. `line` is already trimmed and non-empty.
fn step(state: ParserState, line: &str, acc: &mut Accumulator) -> Step {
    if line == START_MARKER {
        return Step::Continue(ParserState::InResponseBlock);
    }

    if line == END_MARKER {
        let successful = matches!(
            state,
            ParserState::InChangesList | ParserState::InCorrectedText
        ) || !acc.corrected_text.is_empty();
        return Step::Finished { successful };
    }

    let next = match state {
        ParserState::Initial => ParserState::Initial,
        ParserState::InResponseBlock => {
            if let Some(rest) = line.strip_prefix(CORRECTED_TEXT_PREFIX) {
                acc.corrected_text = rest.trim().to_string();
                ParserState::InCorrectedText
            } else if line.starts_with(CHANGES_LIST_PREFIX) {
                ParserState::InChangesList
            } else {
                ParserState::InResponseBlock
            }
        }
        ParserState::InCorrectedText => {
            if line.starts_with(CHANGES_LIST_PREFIX) {
                ParserState::InChangesList
            } else {
                acc.append_corrected(line);
                ParserState::InCorrectedText
            }
        }
        ParserState::InChangesList => {
            acc.push_change(change_entry(line));
            ParserState::InChangesList
        }
    };

    Step::Continue(next)
}

/// Strips a bullet or numbered-list prefix; any other line is kept verbatim.
fn change_entry(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return rest;
    }
    if starts_with_numbered_item(line) {
        if let Some((_, rest)) = line.split_once(". ") {
            return rest;
        }
    }
    line
}

/// True for lines of the form `<digits>. ...`.
pub(crate) fn starts_with_numbered_item(line: &str) -> bool {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    digits > 0 && line[digits..].starts_with(". ")
}

fn normalized_lines(raw: &str) -> impl Iterator<Item = &str> {
    raw.split('\n')
        .map(|line| line.trim_end_matches('\r').trim())
        .filter(|line| !line.is_empty())
}

/// The sentinel wins over any other entry it appears with.
fn collapse_sentinel(changes: Vec<String>) -> Vec<String> {
    if changes.len() > 1 && changes.iter().any(|c| c == NO_CHANGES_SENTINEL) {
        vec![NO_CHANGES_SENTINEL.to_string()]
    } else {
        changes
    }
}

fn excerpt(raw: &str) -> String {
    raw.chars().take(EXCERPT_CHARS).collect()
}

fn fallback(raw: &str) -> FeedbackResult {
    let excerpt = excerpt(raw);
    warn!(excerpt = %excerpt, "LLM reply did not follow the feedback format");
    FeedbackResult {
        corrected_text: raw.to_string(),
        changes: vec![format!(
            "Parsing failed: the AI response did not follow the expected format. Raw output: {excerpt}"
        )],
    }
}

pub fn parse_feedback(raw: &str) -> FeedbackResult {
    let mut acc = Accumulator::default();
    let mut state = ParserState::Initial;
    let mut successful = false;

    for line in normalized_lines(raw) {
        match step(state, line, &mut acc) {
            Step::Continue(next) => state = next,
            Step::Finished { successful: ok } => {
                successful = ok;
                break;
            }
        }
    }

    if !successful || acc.corrected_text.is_empty() {
        return fallback(raw);
    }

    FeedbackResult {
        corrected_text: acc.corrected_text,
        changes: collapse_sentinel(acc.changes),
    }
}
