//! Minimum-length rules for the three form fields.
//!
//! The same rules run twice: once when the user presses Generate, and again
//! inside the relay before a prompt is composed.

use crate::types::{FormInput, GenerationRequest};

pub const MIN_VOCAB_CHARS: usize = 2;
pub const MIN_INSTRUCTION_CHARS: usize = 10;
pub const MIN_LANGUAGE_CHARS: usize = 2;

pub const VOCAB_MESSAGE: &str = "Vocabulary must be at least 2 characters.";
pub const INSTRUCTION_MESSAGE: &str = "Instruction must be at least 10 characters.";
pub const LANGUAGE_MESSAGE: &str = "Language must be at least 2 characters.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Vocab,
    Instruction,
    Language,
}

/// Per-field messages. An empty value means the form is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub vocab: Option<&'static str>,
    pub instruction: Option<&'static str>,
    pub language: Option<&'static str>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.vocab.is_none() && self.instruction.is_none() && self.language.is_none()
    }

    pub fn get(&self, field: Field) -> Option<&'static str> {
        match field {
            Field::Vocab => self.vocab,
            Field::Instruction => self.instruction,
            Field::Language => self.language,
        }
    }

    pub fn failed_fields(&self) -> Vec<Field> {
        [Field::Vocab, Field::Instruction, Field::Language]
            .into_iter()
            .filter(|f| self.get(*f).is_some())
            .collect()
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = [self.vocab, self.instruction, self.language]
            .into_iter()
            .flatten()
            .collect();
        f.write_str(&messages.join(" "))
    }
}

// Lengths are counted in chars, untrimmed.
fn too_short(value: &str, min: usize) -> bool {
    value.chars().count() < min
}

pub fn check(input: &FormInput) -> FieldErrors {
    FieldErrors {
        vocab: too_short(&input.vocab, MIN_VOCAB_CHARS).then_some(VOCAB_MESSAGE),
        instruction: too_short(&input.instruction, MIN_INSTRUCTION_CHARS)
            .then_some(INSTRUCTION_MESSAGE),
        language: too_short(input.language.as_value(), MIN_LANGUAGE_CHARS)
            .then_some(LANGUAGE_MESSAGE),
    }
}

pub fn validate(input: &FormInput) -> Result<GenerationRequest, FieldErrors> {
    let errors = check(input);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(GenerationRequest::new_unchecked(
        input.vocab.clone(),
        input.instruction.clone(),
        input.language.clone(),
    ))
}

/// Boundary re-check for a request that may have been built elsewhere.
pub fn revalidate(request: &GenerationRequest) -> Result<(), FieldErrors> {
    let errors = check(&request.to_form_input());
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
