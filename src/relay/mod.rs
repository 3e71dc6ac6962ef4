//! Streaming relay: one managed background task per submission that calls
//! the completion backend and republishes every delta on a
//! [`GenerationHandle`].
//!
//! ```text
//! GenerationRequest ─► revalidate ─► compose_prompt ─► backend stream
//!                                                        │
//!        GenerationHandle ◄── Delta* ── (Done | Failed) ◄┘
//! ```
//!
//! Every handle sees exactly one terminal event. A failing upstream call,
//! or a panic inside the task, arrives as `StreamEvent::Failed`.

pub mod backend;
pub mod sse;

pub use backend::{CompletionBackend, DeltaStream, OpenAiCompatibleBackend};

use futures_util::StreamExt;
use log::{debug, error, info, trace};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use crate::config::LlmConfig;
use crate::prompt::compose_prompt;
use crate::types::GenerationRequest;
use crate::validation::{self, FieldErrors};

#[derive(Debug, Clone, Error)]
pub enum RelayError {
    #[error("Invalid request: {0}")]
    InvalidRequest(FieldErrors),

    #[error("No API key: set the {0} environment variable or llm.api_key")]
    MissingApiKey(String),

    #[error("Authentication failed - check your API key")]
    Unauthorized,

    #[error("Rate limit exceeded - too many requests")]
    RateLimited,

    #[error("API request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request timeout - the API took too long to respond")]
    Timeout,

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Malformed stream chunk: {0}")]
    MalformedStream(String),

    #[error("Stream ended before the completion finished")]
    UnexpectedEof,

    #[error("{0}")]
    Client(String),

    #[error("Generation task stopped unexpectedly: {0}")]
    TaskFailed(String),
}

impl RelayError {
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => RelayError::Unauthorized,
            429 => RelayError::RateLimited,
            _ => RelayError::Status { status, body },
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RelayError::Timeout
        } else if e.is_connect() {
            RelayError::Transport(format!("Connection error - unable to reach the API: {}", e))
        } else {
            RelayError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub enum StreamEvent {
    Delta(String),
    Done,
    Failed(RelayError),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Delta(_))
    }
}

/// Consumer side of one generation. Yields deltas in arrival order, then one
/// terminal event, then nothing.
pub struct GenerationHandle {
    rx: UnboundedReceiver<StreamEvent>,
    finished: bool,
}

impl GenerationHandle {
    pub(crate) fn from_receiver(rx: UnboundedReceiver<StreamEvent>) -> Self {
        Self { rx, finished: false }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn observe(&mut self, event: Option<StreamEvent>) -> Option<StreamEvent> {
        if self.finished {
            return None;
        }
        let event = event.unwrap_or_else(|| {
            StreamEvent::Failed(RelayError::TaskFailed("event channel closed".to_string()))
        });
        if event.is_terminal() {
            self.finished = true;
            self.rx.close();
        }
        Some(event)
    }

    /// Waits for the next event.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        if self.finished {
            return None;
        }
        let event = self.rx.recv().await;
        self.observe(event)
    }

    /// Non-blocking poll for the UI frame loop.
    pub fn try_next(&mut self) -> Option<StreamEvent> {
        if self.finished {
            return None;
        }
        match self.rx.try_recv() {
            Ok(event) => self.observe(Some(event)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => self.observe(None),
        }
    }
}

type Notify = Arc<dyn Fn() + Send + Sync>;

/// Starts generations against a configured backend.
#[derive(Clone)]
pub struct StreamingRelay {
    backend: Arc<dyn CompletionBackend>,
}

impl StreamingRelay {
    pub fn new(config: LlmConfig) -> Result<Self, RelayError> {
        Ok(Self::with_backend(Arc::new(OpenAiCompatibleBackend::new(config)?)))
    }

    pub fn with_backend(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    /// Returns at once; the upstream call runs on `runtime`. `notify` is
    /// called after every event is queued.
    pub fn start<F>(&self, request: GenerationRequest, runtime: &Handle, notify: F) -> GenerationHandle
    where
        F: Fn() + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let notify: Notify = Arc::new(notify);

        let worker = runtime.spawn(run_generation(
            Arc::clone(&self.backend),
            request,
            tx.clone(),
            Arc::clone(&notify),
        ));

        runtime.spawn(async move {
            if let Err(join_err) = worker.await {
                error!("Generation task failed: {}", join_err);
                let _ = tx.send(StreamEvent::Failed(RelayError::TaskFailed(join_err.to_string())));
                notify();
            }
        });

        GenerationHandle::from_receiver(rx)
    }
}

async fn run_generation(
    backend: Arc<dyn CompletionBackend>,
    request: GenerationRequest,
    tx: UnboundedSender<StreamEvent>,
    notify: Notify,
) {
    let publish = |event: StreamEvent| -> bool {
        let delivered = tx.send(event).is_ok();
        notify();
        delivered
    };

    if let Err(errors) = validation::revalidate(&request) {
        error!("Rejected request at relay boundary: {}", errors);
        publish(StreamEvent::Failed(RelayError::InvalidRequest(errors)));
        return;
    }

    let prompt = compose_prompt(&request);
    info!("Starting generation with {}", backend.describe());
    debug!("Prompt: {}", prompt);

    let mut deltas = backend.stream_completion(prompt);
    let mut delta_count = 0usize;

    while let Some(item) = deltas.next().await {
        match item {
            Ok(delta) => {
                delta_count += 1;
                trace!("delta #{}: {:?}", delta_count, delta);
                if !publish(StreamEvent::Delta(delta)) {
                    debug!("Receiver dropped after {} deltas, stopping relay", delta_count);
                    return;
                }
            }
            Err(e) => {
                error!("Generation failed after {} deltas: {}", delta_count, e);
                publish(StreamEvent::Failed(e));
                return;
            }
        }
    }

    info!("Generation finished ({} deltas)", delta_count);
    publish(StreamEvent::Done);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Language;
    use futures_util::stream;

    struct Scripted(Vec<Result<String, RelayError>>);

    impl CompletionBackend for Scripted {
        fn stream_completion(&self, _prompt: String) -> DeltaStream {
            stream::iter(self.0.clone()).boxed()
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_backend() {
        let relay = StreamingRelay::with_backend(Arc::new(Scripted(vec![Ok("nope".into())])));
        let request = GenerationRequest::new_unchecked("a".to_string(), "short".to_string(), Language::English);
        let mut handle = relay.start(request, &Handle::current(), || {});

        match handle.next().await {
            Some(StreamEvent::Failed(RelayError::InvalidRequest(errors))) => {
                assert!(errors.vocab.is_some());
                assert!(errors.instruction.is_some());
                assert!(errors.language.is_none());
            }
            other => panic!("expected InvalidRequest, got {:?}", other),
        }
        assert!(handle.next().await.is_none());
    }

    #[tokio::test]
    async fn closed_channel_reads_as_task_failure() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(StreamEvent::Delta("a".into())).unwrap();
        drop(tx);
        let mut handle = GenerationHandle::from_receiver(rx);

        assert!(matches!(handle.try_next(), Some(StreamEvent::Delta(_))));
        assert!(matches!(
            handle.try_next(),
            Some(StreamEvent::Failed(RelayError::TaskFailed(_)))
        ));
        assert!(handle.is_finished());
        assert!(handle.try_next().is_none());
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(RelayError::from_status(401, String::new()), RelayError::Unauthorized));
        assert!(matches!(RelayError::from_status(429, String::new()), RelayError::RateLimited));
        assert!(matches!(
            RelayError::from_status(500, "boom".into()),
            RelayError::Status { status: 500, .. }
        ));
    }
}
