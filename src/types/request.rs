use std::fmt;

pub const DEFAULT_VOCAB: &str = "sleep, eat";
pub const DEFAULT_INSTRUCTION: &str =
    "Create one short reading passage with two paragraphs for primary 1 students";

/// Output language chosen on the form. The two presets are what the picker
/// offers; anything else typed by the user travels as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Vietnamese,
    Other(String),
}

impl Language {
    pub const PRESETS: [Language; 2] = [Language::English, Language::Vietnamese];

    /// Maps a submitted value onto a preset when it names one exactly.
    pub fn from_value(value: &str) -> Self {
        match value {
            "english" => Language::English,
            "vietnamese" => Language::Vietnamese,
            other => Language::Other(other.to_string()),
        }
    }

    /// The identifier sent upstream: lowercase for presets, verbatim otherwise.
    pub fn as_value(&self) -> &str {
        match self {
            Language::English => "english",
            Language::Vietnamese => "vietnamese",
            Language::Other(text) => text,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Language::English => "English",
            Language::Vietnamese => "Vietnamese",
            Language::Other(text) => text,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_value())
    }
}

/// Raw, still-editable form values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInput {
    pub vocab: String,
    pub instruction: String,
    pub language: Language,
}

impl Default for FormInput {
    fn default() -> Self {
        Self {
            vocab: DEFAULT_VOCAB.to_string(),
            instruction: DEFAULT_INSTRUCTION.to_string(),
            language: Language::English,
        }
    }
}

/// A submission that passed validation. Fields are private so the only way
/// to obtain one is `validation::validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    vocabulary: String,
    instruction: String,
    language: Language,
}

impl GenerationRequest {
    pub(crate) fn new_unchecked(vocabulary: String, instruction: String, language: Language) -> Self {
        Self { vocabulary, instruction, language }
    }

    pub fn vocabulary(&self) -> &str {
        &self.vocabulary
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub(crate) fn to_form_input(&self) -> FormInput {
        FormInput {
            vocab: self.vocabulary.clone(),
            instruction: self.instruction.clone(),
            language: self.language.clone(),
        }
    }
}
