//! Pure reconciliation state machines, independent of the HTTP transport.
//!
//! Two framings are supported for incrementally-delivered bodies:
//!
//! - [`ReconcileBuffer`] — framing unknown. After every chunk the entire
//!   accumulated buffer is re-tried as a complete [`QueryResponse`] document;
//!   until that succeeds the raw buffer is surfaced verbatim, which gives a
//!   "typing" reveal for plain-text streams.
//! - [`EventStreamBuffer`] — negotiated `application/x-ndjson` framing of
//!   [`StreamChunk`] events, one JSON document per line.

use tracing::warn;

use crate::types::{QueryResponse, StreamChunk};

/// What the caller-visible state should show after feeding one chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileUpdate {
    /// The buffer is not (yet) a complete document; show it as raw text.
    Partial(String),
    /// The buffer parsed as a complete document; show its answer and sources.
    Resolved(QueryResponse),
}

/// Accumulates byte-stream chunks of unknown framing.
///
/// Once a complete document has parsed, later chunks are ignored: trailing
/// bytes after the first successful parse carry no defined meaning.
#[derive(Debug, Default)]
pub struct ReconcileBuffer {
    buf: String,
    resolved: Option<QueryResponse>,
}

impl ReconcileBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one decoded chunk and reports what to display.
    pub fn push(&mut self, chunk: &str) -> ReconcileUpdate {
        if let Some(doc) = &self.resolved {
            return ReconcileUpdate::Resolved(doc.clone());
        }

        self.buf.push_str(chunk);

        match serde_json::from_str::<QueryResponse>(&self.buf) {
            Ok(doc) => {
                self.buf.clear();
                self.resolved = Some(doc.clone());
                ReconcileUpdate::Resolved(doc)
            }
            Err(_) => ReconcileUpdate::Partial(self.buf.clone()),
        }
    }

    /// True if at least one chunk has been fed.
    pub fn saw_data(&self) -> bool {
        self.resolved.is_some() || !self.buf.is_empty()
    }

    /// Stream ended. One last parse attempt over whatever remains unresolved;
    /// `None` means the accumulated text stays as the literal answer.
    pub fn finish(self) -> Option<QueryResponse> {
        if self.resolved.is_some() {
            return self.resolved;
        }
        if self.buf.trim().is_empty() {
            return None;
        }
        serde_json::from_str::<QueryResponse>(&self.buf).ok()
    }
}

/// Incremental UTF-8 decoder for byte streams whose chunk boundaries may
/// fall inside a multi-byte sequence.
///
/// An incomplete trailing sequence is held back until its continuation bytes
/// arrive in a later chunk; only bytes that can never complete decode to
/// U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Accumulator {
    pending: Vec<u8>,
}

impl Utf8Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds raw bytes and returns everything decodable so far.
    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return out;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match err.error_len() {
                        // Invalid sequence, not a chunk-boundary artifact.
                        Some(len) => {
                            out.push('\u{FFFD}');
                            self.pending.drain(..valid + len);
                        }
                        // Possibly-incomplete tail: wait for more bytes.
                        None => {
                            self.pending.drain(..valid);
                            return out;
                        }
                    }
                }
            }
        }
    }

    /// Stream ended. A held-back tail was never completed.
    pub fn finish(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }
}

/// Line-buffers an `application/x-ndjson` body into [`StreamChunk`] events.
///
/// Chunk boundaries need not align with line boundaries; a line is only
/// decoded once its terminating newline has arrived. Undecodable lines are
/// logged and skipped rather than failing the stream.
#[derive(Debug, Default)]
pub struct EventStreamBuffer {
    buf: String,
}

impl EventStreamBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one decoded chunk and returns all events completed by it.
    pub fn push(&mut self, chunk: &str) -> Vec<StreamChunk> {
        self.buf.push_str(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buf.find('\n') {
            let line: String = self.buf.drain(..=pos).collect();
            if let Some(event) = Self::decode_line(line.trim()) {
                events.push(event);
            }
        }
        events
    }

    /// Stream ended. Decodes a trailing line missing its newline, if any.
    pub fn finish(self) -> Option<StreamChunk> {
        Self::decode_line(self.buf.trim())
    }

    fn decode_line(line: &str) -> Option<StreamChunk> {
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<StreamChunk>(line) {
            Ok(event) => Some(event),
            Err(err) => {
                warn!(
                    target: "query_client::stream",
                    error = %err,
                    line_len = line.len(),
                    "skipping undecodable stream event"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SourceCitation, SourceType};

    fn doc_json() -> String {
        concat!(
            r#"{"answer":"final","sources":[{"title":"T","url":"u","source_type":"github","#,
            r#""relevance_score":0.5,"snippet":"s"}],"query":"q","timestamp":"t"}"#
        )
        .to_string()
    }

    #[test]
    fn plain_text_chunks_reveal_accumulated_buffer() {
        let mut buf = ReconcileBuffer::new();
        assert_eq!(buf.push("Hel"), ReconcileUpdate::Partial("Hel".into()));
        assert_eq!(
            buf.push("lo wor"),
            ReconcileUpdate::Partial("Hello wor".into())
        );
        assert_eq!(
            buf.push("ld"),
            ReconcileUpdate::Partial("Hello world".into())
        );
        // Never parsed as JSON: the text stays as the literal answer.
        assert!(buf.finish().is_none());
    }

    #[test]
    fn json_split_at_arbitrary_byte_boundaries_resolves() {
        let body = doc_json();
        // Every split point must yield the same resolved document.
        for split in 1..body.len() {
            if !body.is_char_boundary(split) {
                continue;
            }
            let mut buf = ReconcileBuffer::new();
            let first = buf.push(&body[..split]);
            assert!(
                matches!(first, ReconcileUpdate::Partial(_)),
                "prefix of len {split} must not parse"
            );
            match buf.push(&body[split..]) {
                ReconcileUpdate::Resolved(doc) => {
                    assert_eq!(doc.answer, "final");
                    assert_eq!(doc.sources.len(), 1);
                    assert_eq!(
                        doc.sources[0],
                        SourceCitation {
                            title: "T".into(),
                            url: "u".into(),
                            source_type: SourceType::GitHub,
                            relevance_score: 0.5,
                            snippet: "s".into(),
                        }
                    );
                }
                other => panic!("split at {split} did not resolve: {other:?}"),
            }
        }
    }

    #[test]
    fn trailing_bytes_after_resolve_are_ignored() {
        let mut buf = ReconcileBuffer::new();
        buf.push(&doc_json());
        let update = buf.push("garbage after the document");
        assert!(matches!(update, ReconcileUpdate::Resolved(d) if d.answer == "final"));
        assert_eq!(buf.finish().unwrap().answer, "final");
    }

    #[test]
    fn finish_parses_document_that_only_completed_at_stream_end() {
        // A document fed whole in one push resolves immediately; a buffer
        // still holding a complete document at end-of-stream resolves in
        // finish(). Simulate the latter via a pre-seeded partial.
        let body = doc_json();
        let mut buf = ReconcileBuffer::new();
        let (head, tail) = body.split_at(10);
        buf.push(head);
        buf.push(tail);
        assert_eq!(buf.finish().unwrap().answer, "final");
    }

    #[test]
    fn multibyte_character_split_across_chunks_decodes_whole() {
        let mut decoder = Utf8Accumulator::new();
        let bytes = "café".as_bytes();
        // 'é' is two bytes; split between them.
        assert_eq!(decoder.push(&bytes[..4]), "caf");
        assert_eq!(decoder.push(&bytes[4..]), "é");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn split_multibyte_text_still_resolves_as_json() {
        let body = r#"{"answer":"café","sources":[],"query":"q","timestamp":"t"}"#.as_bytes();
        let split = body.iter().position(|&b| b == 0xC3).map(|p| p + 1);
        let split = split.expect("body contains a multi-byte character");

        let mut decoder = Utf8Accumulator::new();
        let mut buf = ReconcileBuffer::new();
        buf.push(&decoder.push(&body[..split]));
        buf.push(&decoder.push(&body[split..]));
        assert_eq!(buf.finish().map(|d| d.answer).as_deref(), Some("café"));
    }

    #[test]
    fn dangling_partial_sequence_becomes_replacement_on_finish() {
        let mut decoder = Utf8Accumulator::new();
        assert_eq!(decoder.push(b"ok\xC3"), "ok");
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }

    #[test]
    fn truly_invalid_bytes_are_replaced_inline() {
        let mut decoder = Utf8Accumulator::new();
        assert_eq!(decoder.push(b"a\xFFb"), "a\u{FFFD}b");
    }

    #[test]
    fn ndjson_events_split_across_chunks() {
        let mut buf = EventStreamBuffer::new();
        assert!(buf.push(r#"{"type":"token","con"#).is_empty());
        let events = buf.push("tent\":\"Hel\"}\n{\"type\":\"token\",\"content\":\"lo\"}\n");
        assert_eq!(
            events,
            vec![
                StreamChunk::Token {
                    content: "Hel".into()
                },
                StreamChunk::Token {
                    content: "lo".into()
                },
            ]
        );
    }

    #[test]
    fn ndjson_trailing_line_without_newline_decodes_in_finish() {
        let mut buf = EventStreamBuffer::new();
        buf.push(r#"{"type":"error","message":"boom"}"#);
        assert_eq!(
            buf.finish(),
            Some(StreamChunk::Error {
                message: "boom".into()
            })
        );
    }

    #[test]
    fn ndjson_skips_undecodable_lines() {
        let mut buf = EventStreamBuffer::new();
        let events = buf.push("not json at all\n{\"type\":\"token\",\"content\":\"ok\"}\n");
        assert_eq!(
            events,
            vec![StreamChunk::Token {
                content: "ok".into()
            }]
        );
    }
}
