pub mod sections;
pub mod vocabulary;

// Re-export the main parsing functions for convenience
pub use sections::{contains_passage_marker, partition, ParsedResult};
pub use vocabulary::{parse_vocabulary_entries, VocabularyEntry};
