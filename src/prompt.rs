use crate::types::GenerationRequest;

/// Builds the single user prompt sent upstream. Input is passed through
/// untouched, markdown characters included.
pub fn compose_prompt(request: &GenerationRequest) -> String {
    format!(
        "{}, including vocabulary words: {} and the definitions and type in {}",
        request.instruction(),
        request.vocabulary(),
        request.language()
    )
}
