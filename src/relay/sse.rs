//! Line decoder for OpenAI-style `text/event-stream` chat completions.

use futures_util::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use std::collections::VecDeque;
use std::pin::Pin;

use super::RelayError;

#[derive(Debug, Deserialize)]
struct ChunkResponse {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseItem {
    Delta(String),
    Done,
}

/// Buffers raw bytes and yields complete `data:` payloads. Partial lines and
/// split UTF-8 sequences stay buffered until the next push.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    finished: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Decodes every complete line in the buffer. Items decoded before a bad
    /// line are returned together with its error; nothing after it is read.
    pub fn push(&mut self, bytes: &[u8]) -> (Vec<SseItem>, Option<RelayError>) {
        self.buffer.extend_from_slice(bytes);
        let mut items = Vec::new();

        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            if self.finished {
                continue;
            }
            let line = String::from_utf8_lossy(&line_bytes);
            match decode_line(line.trim()) {
                Ok(Some(item)) => {
                    if item == SseItem::Done {
                        self.finished = true;
                    }
                    items.push(item);
                }
                Ok(None) => {}
                Err(e) => {
                    self.finished = true;
                    self.buffer.clear();
                    return (items, Some(e));
                }
            }
        }
        (items, None)
    }

    /// Flushes a trailing line that had no newline before the body ended.
    pub fn finish(&mut self) -> (Vec<SseItem>, Option<RelayError>) {
        if self.buffer.is_empty() || self.finished {
            self.buffer.clear();
            return (Vec::new(), None);
        }
        self.push(b"\n")
    }
}

fn decode_line(line: &str) -> Result<Option<SseItem>, RelayError> {
    // Blank separators, comments and non-data fields carry nothing for us.
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let payload = payload.trim_start();
    if payload == "[DONE]" {
        return Ok(Some(SseItem::Done));
    }
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(payload) {
        return Err(RelayError::Upstream(envelope.error.message));
    }
    let chunk: ChunkResponse = serde_json::from_str(payload)
        .map_err(|e| RelayError::MalformedStream(format!("{}: {}", e, payload)))?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
        .map(SseItem::Delta))
}

struct DecodeState<S> {
    body: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, RelayError>>,
    exhausted: bool,
}

/// Turns an HTTP body into a stream of text deltas that ends at `[DONE]`.
/// A body that closes without `[DONE]` yields `RelayError::UnexpectedEof`.
pub fn delta_stream<S, B, E>(body: S) -> impl Stream<Item = Result<String, RelayError>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<RelayError>,
{
    let state = DecodeState {
        body: Box::pin(body),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        exhausted: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                if item.is_err() {
                    state.exhausted = true;
                    state.pending.clear();
                }
                return Some((item, state));
            }
            if state.exhausted || state.decoder.is_finished() {
                return None;
            }
            let (items, error) = match state.body.next().await {
                Some(Ok(bytes)) => state.decoder.push(bytes.as_ref()),
                Some(Err(e)) => (Vec::new(), Some(e.into())),
                None => {
                    state.exhausted = true;
                    let (items, error) = state.decoder.finish();
                    let error = match error {
                        None if !items.contains(&SseItem::Done) => Some(RelayError::UnexpectedEof),
                        other => other,
                    };
                    (items, error)
                }
            };
            enqueue(&mut state.pending, items);
            if let Some(e) = error {
                state.pending.push_back(Err(e));
            }
        }
    })
}

fn enqueue(pending: &mut VecDeque<Result<String, RelayError>>, items: Vec<SseItem>) {
    for item in items {
        if let SseItem::Delta(text) = item {
            pending.push_back(Ok(text));
        }
    }
}
