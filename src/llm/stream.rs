//! Provider stream decoding
//!
//! Vendors stream server-sent events over a chunked HTTP body. Chunks split
//! at arbitrary byte positions, including inside a line or inside a
//! multi-byte character, so bytes are held in a residual buffer until a full
//! line is confirmed. Each complete line goes to the vendor adapter, which
//! turns it into at most one provider-agnostic event.

use super::LlmError;
use bytes::Bytes;
use futures::stream::BoxStream;

/// Provider-agnostic stream event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Delta(String),
    Done,
    Error(String),
}

/// Vendor-specific line interpretation.
///
/// Lines arrive without their terminator. Unrecognized lines and non-JSON
/// payloads yield `None`.
pub trait StreamAdapter: Send {
    fn on_line(&mut self, line: &str) -> Option<StreamEvent>;
}

/// Residual buffer that only releases complete lines
#[derive(Debug, Default)]
pub struct LineBuffer {
    residual: Vec<u8>,
    /// Bytes of `residual` already known to hold no newline
    scanned: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every line it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.residual.extend_from_slice(chunk);
        let mut lines = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(offset) = self.residual[from..].iter().position(|&b| b == b'\n') {
            let end = from + offset;
            let mut line = &self.residual[start..end];
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            lines.push(String::from_utf8_lossy(line).into_owned());
            start = end + 1;
            from = start;
        }
        self.residual.drain(..start);
        self.scanned = self.residual.len();
        lines
    }

    /// Whatever is left once the body has ended
    pub fn finish(&mut self) -> Option<String> {
        if self.residual.is_empty() {
            return None;
        }
        self.scanned = 0;
        let rest = std::mem::take(&mut self.residual);
        Some(String::from_utf8_lossy(&rest).trim_end_matches('\r').to_string())
    }
}

/// Line buffer plus adapter for one provider call.
///
/// Once a terminal event (`Done` or `Error`) has been produced, further
/// input is ignored.
pub struct StreamDecoder {
    lines: LineBuffer,
    adapter: Box<dyn StreamAdapter>,
    finished: bool,
}

impl StreamDecoder {
    pub fn new(adapter: Box<dyn StreamAdapter>) -> Self {
        Self {
            lines: LineBuffer::new(),
            adapter,
            finished: false,
        }
    }

    /// Decode one body chunk
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        let lines = self.lines.push(chunk);
        self.decode(lines)
    }

    /// Flush a trailing unterminated line at end of body
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        let rest = self.lines.finish();
        let events = self.decode(rest);
        self.finished = true;
        events
    }

    fn decode(&mut self, lines: impl IntoIterator<Item = String>) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        for line in lines {
            let line = line.trim();
            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            match self.adapter.on_line(line) {
                Some(StreamEvent::Delta(text)) if text.is_empty() => {}
                Some(event) => {
                    let terminal = !matches!(event, StreamEvent::Delta(_));
                    events.push(event);
                    if terminal {
                        self.finished = true;
                        break;
                    }
                }
                None => {}
            }
        }
        events
    }
}

/// Raw response body; transport failures are already classified
pub type ByteStream = BoxStream<'static, Result<Bytes, LlmError>>;

/// An open provider response ready to be relayed
pub struct ProviderStream {
    pub bytes: ByteStream,
    pub decoder: StreamDecoder,
}

impl ProviderStream {
    pub fn new(bytes: ByteStream, adapter: Box<dyn StreamAdapter>) -> Self {
        Self {
            bytes,
            decoder: StreamDecoder::new(adapter),
        }
    }
}

/// Payload of an SSE `data:` line, if this is one
pub fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}
