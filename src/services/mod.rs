pub mod coach;
pub mod feedback_parser;
pub mod llm_provider;
pub mod prompt;
pub mod vocabulary_parser;
