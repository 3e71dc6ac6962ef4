use regex::Regex;
use std::sync::OnceLock;

/// One line of the vocabulary pane, e.g. `1. **sleep** (verb): to rest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyEntry {
    pub word: String,
    pub word_type: Option<String>,
    pub definition: String,
}

fn entry_regex() -> &'static Regex {
    static ENTRY_RE: OnceLock<Regex> = OnceLock::new();
    ENTRY_RE.get_or_init(|| {
        Regex::new(
            r"^\s*(?:[-*+]|\d+[.)])?\s*(?:\*\*)?\s*(?P<word>[^*:()]+?)\s*(?:\*\*)?\s*(?:\((?P<kind>[^)]+)\))?\s*(?:\*\*)?(?::\s*|\s+[–-]\s+)(?P<def>\S.*)$",
        )
        .expect("vocabulary entry pattern is valid")
    })
}

/// Best-effort extraction of `word (type): definition` lines. A dash only
/// separates word and definition when surrounded by spaces, so hyphenated
/// words stay whole. Lines that do not look like an entry are skipped.
pub fn parse_vocabulary_entries(block: &str) -> Vec<VocabularyEntry> {
    let re = entry_regex();
    block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let caps = re.captures(line)?;
            let word = caps.name("word")?.as_str().trim().to_string();
            let definition = caps.name("def")?.as_str().trim().to_string();
            if word.is_empty() || definition.is_empty() {
                return None;
            }
            let word_type = caps
                .name("kind")
                .map(|m| m.as_str().trim().to_string())
                .filter(|k| !k.is_empty());
            Some(VocabularyEntry { word, word_type, definition })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_bold_entries_with_type() {
        let entries = parse_vocabulary_entries(
            "\n1. **Sleep** (verb): to rest with your eyes closed\n2. **Eat** (verb): to put food in your mouth\n",
        );
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].word, "Sleep");
        assert_eq!(entries[0].word_type.as_deref(), Some("verb"));
        assert_eq!(entries[0].definition, "to rest with your eyes closed");
        assert_eq!(entries[1].word, "Eat");
    }

    #[test]
    fn bullet_with_dash_separator() {
        let entries = parse_vocabulary_entries("* **eat** (v.) - to have a meal");
        assert_eq!(
            entries,
            vec![VocabularyEntry {
                word: "eat".to_string(),
                word_type: Some("v.".to_string()),
                definition: "to have a meal".to_string(),
            }]
        );
    }

    #[test]
    fn type_inside_bold_and_no_type() {
        let entries = parse_vocabulary_entries("**ngủ (động từ)**: nghỉ ngơi\nsleep: to rest");
        assert_eq!(entries[0].word, "ngủ");
        assert_eq!(entries[0].word_type.as_deref(), Some("động từ"));
        assert_eq!(entries[1].word, "sleep");
        assert_eq!(entries[1].word_type, None);
        assert_eq!(entries[1].definition, "to rest");
    }

    #[test]
    fn hyphenated_words_stay_whole() {
        let entries = parse_vocabulary_entries(
            "1. **ice-cream** (noun): a cold sweet food
- well-known - famous
T-shirt: a top",
        );
        assert_eq!(
            entries[0],
            VocabularyEntry {
                word: "ice-cream".to_string(),
                word_type: Some("noun".to_string()),
                definition: "a cold sweet food".to_string(),
            }
        );
        assert_eq!(entries[1].word, "well-known");
        assert_eq!(entries[1].definition, "famous");
        assert_eq!(entries[2].word, "T-shirt");
        assert_eq!(entries[2].definition, "a top");
    }

    #[test]
    fn prose_lines_are_skipped() {
        assert!(parse_vocabulary_entries("Here are the words used above").is_empty());
        assert!(parse_vocabulary_entries("").is_empty());
    }
}
