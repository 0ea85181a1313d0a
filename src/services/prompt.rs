//! Instruction rendering for every generation feature.
//!
//! All builders are pure apart from the uniform random picks in
//! [`build_daily_task_prompt`], which callers must treat as nondeterministic.

use rand::seq::IndexedRandom;

use super::feedback_parser::{CHANGES_LIST_PREFIX, CORRECTED_TEXT_PREFIX, END_MARKER, START_MARKER};

pub const DEFAULT_VOCABULARY_COUNT: usize = 5;
pub const MAX_VOCABULARY_COUNT: usize = 15;

/// Coarse CEFR proficiency tag. Only changes prompt phrasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    B1,
    B2,
    #[default]
    C1,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
        }
    }

    /// Lenient parse: absent or unrecognized input falls back to [`Level::C1`].
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
            Some("B1") => Self::B1,
            Some("B2") => Self::B2,
            _ => Self::C1,
        }
    }

    fn audience(&self) -> &'static str {
        match self {
            Self::B1 => "an intermediate (B1) learner who needs clear, simple explanations",
            Self::B2 => {
                "an upper-intermediate (B2) learner working towards fluent professional writing"
            }
            Self::C1 => "an advanced (C1) professional who expects polished, natural business English",
        }
    }

    fn vocabulary_band(&self) -> &'static str {
        match self {
            Self::B1 => "common but useful words a B1 learner is ready to acquire",
            Self::B2 => "precise, less frequent words suited to B2 learners",
            Self::C1 => "sophisticated, idiomatic vocabulary for C1 professional communication",
        }
    }
}

pub const DAILY_TASK_TYPES: [&str; 6] = [
    "formal email",
    "short report summary",
    "opinion paragraph",
    "meeting follow-up message",
    "project proposal outline",
    "customer complaint response",
];

pub const DAILY_TASK_EXAMPLES: [&str; 4] = [
    "Write an email to your manager asking to move next week's deadline by two days and explain why.",
    "Summarize the main outcomes of a quarterly team meeting for colleagues who could not attend.",
    "Argue for or against a four-day working week in a short paragraph.",
    "Reply to a customer whose delivery arrived damaged, apologizing and offering a solution.",
];

/// System instruction shared by all requests of a given level.
pub fn system_instruction(level: Level) -> String {
    format!(
        "You are an English writing assistant that provides clear, concise and structured feedback for {}.",
        level.audience()
    )
}

pub fn build_feedback_prompt(text: &str, level: Level, context: Option<&str>) -> String {
    let mut prompt = format!(
        "You are an English writing assistant reviewing text written by {}.\n\
         Review the following text for grammatical errors, spelling mistakes and awkward phrasing that a non-native speaker might make.\n\
         Provide the corrected text and then list the specific changes you made, with a brief explanation for each change.\n\
         Focus on clarity, naturalness and grammatical accuracy.\n",
        level.audience()
    );

    if let Some(context) = non_blank(context) {
        prompt.push_str(&format!("The text is intended for this context: {context}\n"));
    }

    prompt.push_str(&format!(
        "If the text needs no corrections, repeat it unchanged and write a single change entry: \"No changes needed.\"\n\n\
         Format your response strictly as follows:\n\
         {START_MARKER}\n\
         {CORRECTED_TEXT_PREFIX} [The corrected version of the input text goes here.]\n\
         {CHANGES_LIST_PREFIX}\n\
         - [Change 1 with brief explanation.]\n\
         - [Change 2 with brief explanation.]\n\
         {END_MARKER}\n\n\
         Original Text:\n\
         \"{text}\"\n"
    ));

    prompt
}

/// Picks a task type and an example uniformly at random from the fixed sets.
pub fn build_daily_task_prompt(level: Level, context: Option<&str>) -> String {
    let mut rng = rand::rng();
    let task_type = DAILY_TASK_TYPES
        .choose(&mut rng)
        .copied()
        .unwrap_or(DAILY_TASK_TYPES[0]);
    let example = DAILY_TASK_EXAMPLES
        .choose(&mut rng)
        .copied()
        .unwrap_or(DAILY_TASK_EXAMPLES[0]);

    render_daily_task_prompt(level, context, task_type, example)
}

fn render_daily_task_prompt(
    level: Level,
    context: Option<&str>,
    task_type: &str,
    example: &str,
) -> String {
    let setting = non_blank(context).unwrap_or("general professional life");
    format!(
        "You are an English writing coach creating a daily writing exercise for {}.\n\
         Create one writing task of this type: {task_type}.\n\
         The task should relate to: {setting}.\n\
         Keep it to two or three sentences and state the expected length in words.\n\
         Here is an example of the style of task expected: \"{example}\"\n\
         Reply with the task text only, without a title or any extra commentary.\n",
        level.audience()
    )
}

pub fn build_vocabulary_prompt(level: Level, topic: Option<&str>, count: usize) -> String {
    let topic = non_blank(topic).unwrap_or("everyday professional communication");
    format!(
        "You are an English vocabulary coach. List {count} words on the topic \"{topic}\" using {}.\n\
         Format every entry strictly as follows, numbering entries from 1:\n\
         1. Word: [the word]\n\
         Definition: [a short definition in plain English]\n\
         Example: [one natural example sentence]\n\
         Do not add any introduction or closing remarks.\n",
        level.vocabulary_band()
    )
}

pub fn clamp_vocabulary_count(count: Option<usize>) -> usize {
    count
        .unwrap_or(DEFAULT_VOCABULARY_COUNT)
        .clamp(1, MAX_VOCABULARY_COUNT)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
