//! Splits generated markdown into the passage and vocabulary panes using the
//! literal section headers the model is asked to emit.

pub const PASSAGE_MARKER: &str = "**Passage:**";
pub const VOCABULARY_MARKER: &str = "**Vocabulary Words:**";
pub const VOCABULARY_MARKER_LOWER: &str = "**Vocabulary words:**";
pub const NOTE_MARKER: &str = "Note:";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResult {
    pub passage: String,
    /// `None` when the vocabulary header never appeared.
    pub vocabulary: Option<String>,
}

pub fn contains_passage_marker(text: &str) -> bool {
    text.contains(PASSAGE_MARKER)
}

/// Text after the last passage header, or the whole input when there is none.
fn after_last_passage(text: &str) -> &str {
    match text.rfind(PASSAGE_MARKER) {
        Some(idx) => &text[idx + PASSAGE_MARKER.len()..],
        None => text,
    }
}

pub fn partition(text: &str) -> ParsedResult {
    // Only the first lower-case header is rewritten.
    let rest = after_last_passage(text).replacen(VOCABULARY_MARKER_LOWER, VOCABULARY_MARKER, 1);

    let mut segments = rest.split(VOCABULARY_MARKER);
    let passage = segments.next().unwrap_or_default().to_string();
    let vocabulary = segments.next().map(|block| {
        block
            .split(NOTE_MARKER)
            .next()
            .unwrap_or_default()
            .to_string()
    });

    ParsedResult { passage, vocabulary }
}
