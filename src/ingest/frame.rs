//! Event-stream line framing
//!
//! The body of a push-event response is a sequence of `field:value` lines.
//! Network chunks do not line up with line boundaries, so bytes are buffered
//! until a full line is available. Only `data` fields are kept, one payload
//! per line; multi-line events are not coalesced.

use bytes::{Bytes, BytesMut};

/// Field name whose value is forwarded
pub const DATA_FIELD: &[u8] = b"data";

/// Splits a chunked byte stream into lines
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: BytesMut,
    /// Leading bytes of `buf` already known to hold no `\n`
    scanned: usize,
}

impl LineFramer {
    /// Create an empty framer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a network chunk
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Take the next complete line, without its `\n`
    pub fn next_line(&mut self) -> Option<Bytes> {
        let Some(offset) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') else {
            self.scanned = self.buf.len();
            return None;
        };
        let pos = self.scanned + offset;
        self.scanned = 0;

        let mut line = self.buf.split_to(pos + 1);
        line.truncate(pos);
        Some(line.freeze())
    }

    /// Take whatever is left once the stream has ended
    pub fn finish(&mut self) -> Option<Bytes> {
        self.scanned = 0;
        if self.buf.is_empty() {
            None
        } else {
            Some(self.buf.split().freeze())
        }
    }

    /// Bytes waiting for a line terminator
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Extract the payload of a `data:` line
///
/// The line is split at its first `:`. The field name must be exactly `data`;
/// the value is returned with surrounding whitespace (including a trailing
/// `\r`) trimmed. Returns `None` for every other field, comments and lines
/// without a colon.
pub fn data_payload(line: &Bytes) -> Option<Bytes> {
    let colon = line.iter().position(|b| *b == b':')?;
    if &line[..colon] != DATA_FIELD {
        return None;
    }

    let value = &line[colon + 1..];
    let start = value
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(value.len());
    let end = value
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);

    Some(line.slice(colon + 1 + start..colon + 1 + end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(line: &'static str) -> Option<Bytes> {
        data_payload(&Bytes::from_static(line.as_bytes()))
    }

    #[test]
    fn test_framer_splits_lines() {
        let mut framer = LineFramer::new();
        framer.push(b"data: a\nevent: b\n\ndata: c");

        assert_eq!(framer.next_line().unwrap(), "data: a");
        assert_eq!(framer.next_line().unwrap(), "event: b");
        assert_eq!(framer.next_line().unwrap(), "");
        assert!(framer.next_line().is_none());
        assert_eq!(framer.pending(), 7);

        assert_eq!(framer.finish().unwrap(), "data: c");
        assert!(framer.finish().is_none());
    }

    #[test]
    fn test_framer_joins_split_chunks() {
        let mut framer = LineFramer::new();
        framer.push(b"da");
        assert!(framer.next_line().is_none());
        framer.push(b"ta: {\"pin\"");
        assert!(framer.next_line().is_none());
        framer.push(b":{}}\n");

        assert_eq!(framer.next_line().unwrap(), "data: {\"pin\":{}}");
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_framer_scans_only_new_bytes() {
        let mut framer = LineFramer::new();
        let line = format!("data: {}", "x".repeat(4096));

        for b in line.as_bytes() {
            framer.push(std::slice::from_ref(b));
            assert!(framer.next_line().is_none());
            assert_eq!(framer.scanned, framer.pending());
        }

        framer.push(b"\ndata: y\n");
        assert_eq!(framer.next_line().unwrap(), line.as_str());
        assert_eq!(framer.scanned, 0);
        assert_eq!(framer.next_line().unwrap(), "data: y");
        assert!(framer.next_line().is_none());
    }

    #[test]
    fn test_data_payload_trimmed() {
        assert_eq!(payload("data: {}").unwrap(), "{}");
        assert_eq!(payload("data:{}").unwrap(), "{}");
        assert_eq!(payload("data:  x y \r").unwrap(), "x y");
    }

    #[test]
    fn test_data_payload_splits_at_first_colon() {
        assert_eq!(payload("data: 10000: {}").unwrap(), "10000: {}");
    }

    #[test]
    fn test_data_payload_empty_value_kept() {
        assert_eq!(payload("data:").unwrap(), "");
        assert_eq!(payload("data:   ").unwrap(), "");
    }

    #[test]
    fn test_other_fields_dropped() {
        assert!(payload("event: update").is_none());
        assert!(payload("id: 42").is_none());
        assert!(payload("retry: 1000").is_none());
        assert!(payload(": keep-alive").is_none());
        assert!(payload("").is_none());
        assert!(payload("data").is_none());
        assert!(payload(" data: x").is_none());
        assert!(payload("DATA: x").is_none());
    }
}
