//! Live (server-push) timeseries endpoint.
//!
//! The live endpoint is a server-sent-events stream: events are separated
//! by blank lines, and each event's `data:` field lines carry a JSONAPI
//! document with one reading under `data`. [`LiveStream`] parses the byte
//! stream incrementally and yields [`DataPoint`]s as they arrive.

use futures::StreamExt;

use crate::adapter::ByteStream;
use crate::error::Result;
use crate::jsonapi::ResourceData;
use crate::resource::{Resource, ResourceObject};
use crate::session::Session;
use crate::timeseries::DataPoint;

const FIELD_SEPARATOR: char = ':';

/// Length of the line terminator starting at `i`: CRLF, LF, or lone CR.
fn terminator_len(bytes: &[u8], i: usize) -> usize {
    match bytes.get(i) {
        Some(b'\r') if bytes.get(i + 1) == Some(&b'\n') => 2,
        Some(b'\r') | Some(b'\n') => 1,
        _ => 0,
    }
}

/// Split one complete event off the front of the buffer, if any.
///
/// Events end at a blank line; lines may end with any of the SSE line
/// endings, mixed freely. A terminator at the very end of the buffer is
/// left in place until the following bytes disambiguate it.
fn take_event(buffer: &mut String) -> Option<String> {
    let bytes = buffer.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let first = terminator_len(bytes, i);
        if first == 0 {
            i += 1;
            continue;
        }
        let second = terminator_len(bytes, i + first);
        if second == 0 {
            i += first;
            continue;
        }
        let event = buffer[..i].to_string();
        buffer.drain(..i + first + second);
        return Some(event);
    }
    None
}

/// Concatenate the payload of an event's `data` field lines.
///
/// Events with no data field yield `None` and are skipped.
fn event_data(event: &str) -> Option<String> {
    let mut payload = String::new();
    for line in event.split(['\r', '\n']) {
        if line.trim().is_empty() {
            continue;
        }
        if let Some((field, data)) = line.split_once(FIELD_SEPARATOR) {
            if field.trim() == "data" {
                payload.push_str(data.trim_start());
            }
        }
    }
    (!payload.is_empty()).then_some(payload)
}

/// A stream of readings pushed by the server.
///
/// The underlying connection stays open until the stream is closed or
/// dropped. Consume it in a scope that guarantees release: open, take what
/// you need, then [`LiveStream::close`] (or let it drop).
pub struct LiveStream {
    stream: Option<ByteStream>,
    session: Session,
    buffer: String,
}

impl LiveStream {
    pub(crate) fn new(stream: ByteStream, session: Session) -> Self {
        Self {
            stream: Some(stream),
            session,
            buffer: String::new(),
        }
    }

    /// Yield the next pushed reading, or `None` once the server closes the
    /// stream (or after [`LiveStream::close`]).
    pub async fn next(&mut self) -> Result<Option<DataPoint>> {
        loop {
            while let Some(event) = take_event(&mut self.buffer) {
                let Some(payload) = event_data(&event) else {
                    continue;
                };
                let document: serde_json::Value = serde_json::from_str(&payload)?;
                let Some(data) = document.get("data") else {
                    continue;
                };
                let data: ResourceData = serde_json::from_value(data.clone())?;
                return Ok(Some(DataPoint::from_object(ResourceObject::from_related(
                    data,
                    self.session.clone(),
                ))));
            }

            let Some(stream) = self.stream.as_mut() else {
                return Ok(None);
            };
            match stream.next().await {
                Some(chunk) => {
                    self.buffer.push_str(&String::from_utf8_lossy(&chunk?));
                }
                None => {
                    self.stream = None;
                    return Ok(None);
                }
            }
        }
    }

    /// Collect up to `n` pushed readings.
    pub async fn take(&mut self, n: usize) -> Result<Vec<DataPoint>> {
        let mut points = Vec::with_capacity(n);
        while points.len() < n {
            match self.next().await? {
                Some(point) => points.push(point),
                None => break,
            }
        }
        Ok(points)
    }

    /// Release the underlying connection and discard anything still
    /// buffered. Subsequent calls to [`LiveStream::next`] yield `None`.
    pub fn close(&mut self) {
        self.stream = None;
        self.buffer.clear();
    }
}

impl std::fmt::Debug for LiveStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveStream")
            .field("open", &self.stream.is_some())
            .finish_non_exhaustive()
    }
}
