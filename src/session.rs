//! View state for one window: the form, the generation in flight and the
//! accumulated response text.

use crate::parsing::sections::PASSAGE_MARKER;
use crate::parsing::{parse_vocabulary_entries, partition, ParsedResult, VocabularyEntry};
use crate::relay::{GenerationHandle, RelayError, StreamEvent};
use crate::store::SaveRecord;
use crate::types::{FormInput, GenerationRequest};
use crate::validation::{self, FieldErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Editing the form.
    Form,
    /// Request sent; the form stays visible with a spinner until the
    /// passage header shows up.
    Streaming,
    /// Passage header seen; two-pane view.
    Results,
}

#[derive(Debug, Clone)]
pub enum Notice {
    /// The response ended without a `**Passage:**` header.
    MissingSections,
    UpstreamFailed(RelayError),
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::MissingSections => {
                f.write_str("The response did not contain a passage section.")
            }
            Notice::UpstreamFailed(e) => write!(f, "Generation failed: {}", e),
        }
    }
}

/// Response text in arrival order, with the passage-header check, the
/// partition and the parsed word list kept up to date on every append.
#[derive(Debug, Default)]
pub struct AccumulatedText {
    text: String,
    passage_detected: bool,
    parsed: ParsedResult,
    entries: Vec<VocabularyEntry>,
}

impl AccumulatedText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn passage_detected(&self) -> bool {
        self.passage_detected
    }

    pub fn parsed(&self) -> &ParsedResult {
        &self.parsed
    }

    pub fn vocabulary_entries(&self) -> &[VocabularyEntry] {
        &self.entries
    }

    /// Appends `delta`. Returns true when this append completed the first
    /// passage header.
    pub fn push(&mut self, delta: &str) -> bool {
        if delta.is_empty() {
            return false;
        }
        // The header may straddle the previous tail and this delta.
        let mut window_start = self.text.len().saturating_sub(PASSAGE_MARKER.len() - 1);
        while !self.text.is_char_boundary(window_start) {
            window_start -= 1;
        }
        self.text.push_str(delta);
        let parsed = partition(&self.text);
        if parsed.vocabulary != self.parsed.vocabulary {
            self.entries = parsed
                .vocabulary
                .as_deref()
                .map(parse_vocabulary_entries)
                .unwrap_or_default();
        }
        self.parsed = parsed;

        if self.passage_detected {
            return false;
        }
        self.passage_detected = self.text[window_start..].contains(PASSAGE_MARKER);
        self.passage_detected
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

pub struct Session {
    pub form: FormInput,
    field_errors: FieldErrors,
    state: ViewState,
    buffer: AccumulatedText,
    handle: Option<GenerationHandle>,
    notice: Option<Notice>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(FormInput::default())
    }
}

impl Session {
    pub fn new(form: FormInput) -> Self {
        Self {
            form,
            field_errors: FieldErrors::default(),
            state: ViewState::Form,
            buffer: AccumulatedText::default(),
            handle: None,
            notice: None,
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn buffer(&self) -> &AccumulatedText {
        &self.buffer
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_generating(&self) -> bool {
        self.handle.is_some()
    }

    pub fn can_save(&self) -> bool {
        self.state == ViewState::Results && !self.is_generating()
    }

    /// Validates the form. On failure the field messages are kept for
    /// display and nothing else changes.
    pub fn submit(&mut self) -> Result<GenerationRequest, FieldErrors> {
        match validation::validate(&self.form) {
            Ok(request) => {
                self.field_errors = FieldErrors::default();
                Ok(request)
            }
            Err(errors) => {
                self.field_errors = errors.clone();
                Err(errors)
            }
        }
    }

    /// `Form → Streaming` with a fresh buffer.
    pub fn begin(&mut self, handle: GenerationHandle) {
        self.buffer.clear();
        self.notice = None;
        self.handle = Some(handle);
        self.state = ViewState::Streaming;
    }

    pub fn apply(&mut self, event: StreamEvent) {
        if self.state == ViewState::Form {
            return;
        }
        match event {
            StreamEvent::Delta(delta) => {
                self.buffer.push(&delta);
                if self.state == ViewState::Streaming && self.buffer.passage_detected() {
                    log::debug!("Passage section detected, switching to results");
                    self.state = ViewState::Results;
                }
            }
            StreamEvent::Done => {
                self.handle = None;
                if self.state == ViewState::Streaming {
                    log::warn!("Response finished without a passage section");
                    self.notice = Some(Notice::MissingSections);
                    self.state = ViewState::Form;
                }
            }
            StreamEvent::Failed(e) => {
                self.handle = None;
                self.notice = Some(Notice::UpstreamFailed(e));
                if self.state == ViewState::Streaming {
                    self.state = ViewState::Form;
                }
            }
        }
    }

    /// Drains every event that is ready without blocking. Returns how many
    /// were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.handle.as_mut().and_then(GenerationHandle::try_next) {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Back to an empty form view. Drops the generation handle and all
    /// accumulated text.
    pub fn back(&mut self) {
        self.handle = None;
        self.buffer.clear();
        self.notice = None;
        self.field_errors = FieldErrors::default();
        self.state = ViewState::Form;
    }

    pub fn save_record(&self, user_id: u64) -> SaveRecord {
        SaveRecord::from_buffer(self.buffer.as_str(), user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Language;
    use tokio::sync::mpsc;

    fn streaming_session() -> (Session, mpsc::UnboundedSender<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut session = Session::default();
        session.submit().unwrap();
        session.begin(GenerationHandle::from_receiver(rx));
        (session, tx)
    }

    fn delta(text: &str) -> StreamEvent {
        StreamEvent::Delta(text.to_string())
    }

    #[test]
    fn accumulation_preserves_order() {
        let mut text = AccumulatedText::default();
        text.push("Hel");
        text.push("lo");
        assert_eq!(text.as_str(), "Hello");
    }

    #[test]
    fn marker_split_across_deltas_is_detected() {
        let mut text = AccumulatedText::default();
        assert!(!text.push("intro **Pass"));
        assert!(text.push("age:** body"));
        assert!(text.passage_detected());
        assert!(!text.push(" more"));
    }

    #[test]
    fn marker_after_multibyte_tail_is_detected() {
        let mut text = AccumulatedText::default();
        text.push("Bài đọc ngủ ");
        text.push("**Passage");
        assert!(!text.passage_detected());
        text.push(":** Một ngày");
        assert!(text.passage_detected());
        assert_eq!(text.parsed().passage, " Một ngày");
    }

    #[test]
    fn word_list_follows_the_vocabulary_pane() {
        let mut text = AccumulatedText::default();
        text.push("**Passage:** Tom sleeps.");
        assert!(text.vocabulary_entries().is_empty());
        text.push("\n**Vocabulary Words:**\n1. **sleep** (verb): to r");
        text.push("est\n2. **ice-cream** (noun): a cold food");
        let entries = text.vocabulary_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].definition, "to rest");
        assert_eq!(entries[1].word, "ice-cream");
        text.push("\nNote: short");
        assert_eq!(text.vocabulary_entries().len(), 2);
        text.clear();
        assert!(text.vocabulary_entries().is_empty());
    }

    #[test]
    fn invalid_form_blocks_submission() {
        let mut session = Session::new(FormInput {
            vocab: "a".to_string(),
            instruction: "0123456789".to_string(),
            language: Language::English,
        });
        let errors = session.submit().unwrap_err();
        assert!(errors.vocab.is_some());
        assert_eq!(session.field_errors(), &errors);
        assert_eq!(session.state(), ViewState::Form);
    }

    #[test]
    fn results_only_after_passage_marker() {
        let (mut session, _tx) = streaming_session();
        assert_eq!(session.state(), ViewState::Streaming);

        session.apply(delta("Here is your reading. "));
        assert_eq!(session.state(), ViewState::Streaming);

        session.apply(delta("**Passage:** Tom likes to sleep."));
        assert_eq!(session.state(), ViewState::Results);
        assert!(session.is_generating());
        assert!(!session.can_save());

        session.apply(delta(" **Vocabulary Words:** sleep: to rest"));
        session.apply(StreamEvent::Done);
        assert_eq!(session.state(), ViewState::Results);
        assert!(session.can_save());
        assert_eq!(session.buffer().parsed().passage, " Tom likes to sleep. ");
        assert_eq!(session.buffer().parsed().vocabulary.as_deref(), Some(" sleep: to rest"));
    }

    #[test]
    fn done_without_marker_returns_to_form_with_notice() {
        let (mut session, _tx) = streaming_session();
        session.apply(delta("I cannot help with that."));
        session.apply(StreamEvent::Done);
        assert_eq!(session.state(), ViewState::Form);
        assert!(matches!(session.notice(), Some(Notice::MissingSections)));
        assert_eq!(session.buffer().as_str(), "I cannot help with that.");
    }

    #[test]
    fn failure_before_marker_returns_to_form() {
        let (mut session, _tx) = streaming_session();
        session.apply(StreamEvent::Failed(RelayError::Unauthorized));
        assert_eq!(session.state(), ViewState::Form);
        assert!(!session.is_generating());
        assert!(matches!(
            session.notice(),
            Some(Notice::UpstreamFailed(RelayError::Unauthorized))
        ));
    }

    #[test]
    fn failure_after_marker_keeps_partial_results() {
        let (mut session, _tx) = streaming_session();
        session.apply(delta("**Passage:** half"));
        session.apply(StreamEvent::Failed(RelayError::Timeout));
        assert_eq!(session.state(), ViewState::Results);
        assert_eq!(session.buffer().parsed().passage, " half");
        assert!(session.notice().is_some());
    }

    #[test]
    fn pump_drains_ready_events_in_order() {
        let (mut session, tx) = streaming_session();
        tx.send(delta("**Passage:** He")).unwrap();
        tx.send(delta("llo")).unwrap();
        assert_eq!(session.pump(), 2);
        assert_eq!(session.buffer().as_str(), "**Passage:** Hello");
        assert_eq!(session.pump(), 0);

        tx.send(StreamEvent::Done).unwrap();
        tx.send(delta("ignored")).unwrap();
        assert_eq!(session.pump(), 1);
        assert!(!session.is_generating());
        assert_eq!(session.buffer().as_str(), "**Passage:** Hello");
    }

    #[test]
    fn back_resets_everything_and_is_idempotent() {
        let (mut session, tx) = streaming_session();
        session.apply(delta("**Passage:** text"));
        session.back();
        assert_eq!(session.state(), ViewState::Form);
        assert!(session.buffer().is_empty());
        assert!(!session.buffer().passage_detected());
        assert!(!session.is_generating());
        assert!(session.notice().is_none());
        // The relay sees a closed channel once the handle is gone.
        assert!(tx.send(delta("late")).is_err());

        session.back();
        assert_eq!(session.state(), ViewState::Form);
        assert!(session.buffer().is_empty());
    }

    #[test]
    fn events_after_back_are_ignored() {
        let (mut session, _tx) = streaming_session();
        session.back();
        session.apply(delta("**Passage:** stale"));
        assert_eq!(session.state(), ViewState::Form);
        assert!(session.buffer().is_empty());
    }

    #[test]
    fn new_submission_clears_previous_raw_text() {
        let (mut session, _tx) = streaming_session();
        session.apply(delta("no sections"));
        session.apply(StreamEvent::Done);
        assert!(!session.buffer().is_empty());

        let (_tx2, rx2) = mpsc::unbounded_channel();
        session.submit().unwrap();
        session.begin(GenerationHandle::from_receiver(rx2));
        assert!(session.buffer().is_empty());
        assert!(session.notice().is_none());
    }

    #[test]
    fn save_record_matches_results_panes() {
        let (mut session, _tx) = streaming_session();
        session.apply(delta(
            "intro **Passage:** P1 text **Vocabulary Words:** sleep: to rest Note: extra",
        ));
        session.apply(StreamEvent::Done);
        let record = session.save_record(1);
        assert_eq!(record.passage, " P1 text ");
        assert_eq!(record.definitions.as_deref(), Some(" sleep: to rest "));
    }
}
