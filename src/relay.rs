//! Stream relay: provider events to client frames
//!
//! One relay per turn. The relay is a lazy stream: it only reads from the
//! provider when the client side asks for the next frame, so a slow client
//! slows the provider read, and dropping the relay (client gone) drops the
//! provider connection with it.

use crate::llm::{LlmError, ProviderStream, StreamEvent};
use futures::{Stream, StreamExt};
use std::collections::VecDeque;

/// One line of the client wire protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    Delta(String),
    Error(String),
}

impl StreamFrame {
    /// Wire form: `0:<json string>\n` or `error:{"message":...}\n`
    pub fn encode(&self) -> String {
        match self {
            StreamFrame::Delta(text) => {
                format!("0:{}\n", serde_json::Value::String(text.clone()))
            }
            StreamFrame::Error(message) => {
                format!("error:{}\n", serde_json::json!({ "message": message }))
            }
        }
    }
}

/// Relay a provider stream (or the failure to open one) as client frames.
///
/// Exactly one terminal condition ends the stream: the vendor's done
/// sentinel or end of body, a vendor error, or a transport error. Only the
/// error cases emit a final `Error` frame. Nothing is retried.
pub fn relay(opened: Result<ProviderStream, LlmError>) -> impl Stream<Item = StreamFrame> + Send {
    let state = match opened {
        Ok(source) => Relay {
            source: Some(source),
            pending: VecDeque::new(),
            frames: 0,
        },
        Err(error) => {
            tracing::info!(outcome = "open failed", error = %error, "Relay finished");
            Relay {
                source: None,
                pending: VecDeque::from([StreamFrame::Error(error.message)]),
                frames: 0,
            }
        }
    };
    futures::stream::unfold(state, next_frame)
}

struct Relay {
    /// Present while the provider connection is open
    source: Option<ProviderStream>,
    pending: VecDeque<StreamFrame>,
    frames: usize,
}

enum Read {
    Events(Vec<StreamEvent>),
    Eof(Vec<StreamEvent>),
    Failed(LlmError),
}

impl Relay {
    fn absorb(&mut self, events: Vec<StreamEvent>) {
        for event in events {
            match event {
                StreamEvent::Delta(text) => self.pending.push_back(StreamFrame::Delta(text)),
                StreamEvent::Done => self.close("done"),
                StreamEvent::Error(message) => {
                    tracing::warn!(error = %message, "Provider reported an error mid-stream");
                    self.pending.push_back(StreamFrame::Error(message));
                    self.close("provider error");
                }
            }
        }
    }

    fn close(&mut self, outcome: &'static str) {
        if self.source.take().is_some() {
            tracing::info!(
                outcome,
                frames = self.frames + self.pending.len(),
                "Relay finished"
            );
        }
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        if self.source.is_some() {
            tracing::info!(
                frames = self.frames,
                "Client disconnected; closing provider stream"
            );
        }
    }
}

async fn next_frame(mut relay: Relay) -> Option<(StreamFrame, Relay)> {
    loop {
        if let Some(frame) = relay.pending.pop_front() {
            relay.frames += 1;
            return Some((frame, relay));
        }

        let source = relay.source.as_mut()?;
        let read = match source.bytes.next().await {
            Some(Ok(chunk)) => Read::Events(source.decoder.feed(&chunk)),
            Some(Err(error)) => Read::Failed(error),
            None => Read::Eof(source.decoder.finish()),
        };

        match read {
            Read::Events(events) => relay.absorb(events),
            Read::Eof(events) => {
                relay.absorb(events);
                // A body that ends without the sentinel still counts as complete
                relay.close("end of body");
            }
            Read::Failed(error) => {
                tracing::warn!(error = %error, "Provider stream interrupted");
                relay.pending.push_back(StreamFrame::Error(error.message));
                relay.close("transport error");
            }
        }
    }
}

/// Drain a relay into the full assistant text, or the first error message
pub async fn collect_text<S>(frames: S) -> Result<String, String>
where
    S: Stream<Item = StreamFrame>,
{
    futures::pin_mut!(frames);
    let mut text = String::new();
    while let Some(frame) = frames.next().await {
        match frame {
            StreamFrame::Delta(delta) => text.push_str(&delta),
            StreamFrame::Error(message) => return Err(message),
        }
    }
    Ok(text)
}
