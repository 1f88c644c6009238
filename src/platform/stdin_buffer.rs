//! Stdin byte buffering: splits raw reads into complete key sequences and bracketed
//! paste payloads.

use std::time::{Duration, Instant};

const ESC: char = '\x1b';
const PASTE_START: &str = "\x1b[200~";
const PASTE_END: &str = "\x1b[201~";

/// Window after which a lone or truncated escape is released as-is.
pub const DEFAULT_FLUSH_MS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdinEvent {
    /// One complete key sequence (a single char, or a whole escape sequence).
    Data(String),
    /// Bracketed paste payload, markers stripped.
    Paste(String),
}

#[derive(Debug, PartialEq, Eq)]
enum SequenceStatus {
    Complete,
    Incomplete,
}

/// Accumulates stdin chunks and hands back complete sequences.
#[derive(Debug)]
pub struct StdinBuffer {
    bytes: Vec<u8>,
    buffer: String,
    timeout_ms: u64,
    paste: Option<String>,
    flush_deadline: Option<Instant>,
}

impl Default for StdinBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_FLUSH_MS)
    }
}

impl StdinBuffer {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            bytes: Vec::new(),
            buffer: String::new(),
            timeout_ms,
            paste: None,
            flush_deadline: None,
        }
    }

    /// Feed one `read` worth of bytes.
    pub fn process(&mut self, data: &[u8]) -> Vec<StdinEvent> {
        self.flush_deadline = None;
        self.bytes.extend_from_slice(data);
        let text = self.take_utf8();
        self.process_str(&text)
    }

    /// Release a buffered partial escape once its deadline has passed.
    pub fn flush_due(&mut self, now: Instant) -> Vec<StdinEvent> {
        match self.flush_deadline {
            Some(deadline) if now >= deadline => self.flush(),
            Some(_) => Vec::new(),
            None => {
                if self.buffer.is_empty() {
                    Vec::new()
                } else {
                    self.flush()
                }
            }
        }
    }

    /// Poll timeout that honours a pending flush deadline. A negative `default_ms`
    /// means "block".
    pub fn next_timeout_ms(&self, now: Instant, default_ms: i32) -> i32 {
        let Some(deadline) = self.flush_deadline else {
            return default_ms;
        };
        let remaining = deadline.saturating_duration_since(now);
        let ms = remaining.as_millis().min(i32::MAX as u128) as i32;
        if default_ms < 0 {
            ms
        } else {
            ms.min(default_ms)
        }
    }

    pub fn flush(&mut self) -> Vec<StdinEvent> {
        self.flush_deadline = None;
        if self.buffer.is_empty() {
            return Vec::new();
        }
        vec![StdinEvent::Data(std::mem::take(&mut self.buffer))]
    }

    pub fn clear(&mut self) {
        self.flush_deadline = None;
        self.bytes.clear();
        self.buffer.clear();
        self.paste = None;
    }

    /// Text held back waiting for the rest of a sequence.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty() || self.paste.is_some() || !self.bytes.is_empty()
    }

    /// Decode the longest valid UTF-8 prefix, keeping a truncated trailing char for the
    /// next read. Invalid bytes become U+FFFD.
    fn take_utf8(&mut self) -> String {
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.bytes) {
                Ok(text) => {
                    out.push_str(text);
                    self.bytes.clear();
                    return out;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.bytes[..valid]));
                    match err.error_len() {
                        None => {
                            self.bytes.drain(..valid);
                            return out;
                        }
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.bytes.drain(..valid + bad);
                        }
                    }
                }
            }
        }
    }

    fn process_str(&mut self, data: &str) -> Vec<StdinEvent> {
        let mut events = Vec::new();

        if let Some(paste) = self.paste.as_mut() {
            paste.push_str(data);
            self.finish_paste(&mut events);
            return events;
        }

        self.buffer.push_str(data);
        if let Some(start) = self.buffer.find(PASTE_START) {
            let (sequences, _) = split_sequences(&self.buffer[..start]);
            events.extend(sequences.into_iter().map(StdinEvent::Data));
            self.paste = Some(self.buffer[start + PASTE_START.len()..].to_string());
            self.buffer.clear();
            self.finish_paste(&mut events);
            return events;
        }

        // Incomplete escape tails stay buffered until the deadline so bytes are never
        // dropped or reordered.
        let (sequences, remainder) = split_sequences(&self.buffer);
        self.buffer = remainder;
        events.extend(sequences.into_iter().map(StdinEvent::Data));
        if !self.buffer.is_empty() {
            self.flush_deadline = Some(Instant::now() + Duration::from_millis(self.timeout_ms));
        }
        events
    }

    fn finish_paste(&mut self, events: &mut Vec<StdinEvent>) {
        let Some(paste) = self.paste.as_ref() else {
            return;
        };
        let Some(end) = paste.find(PASTE_END) else {
            return;
        };
        let content = paste[..end].to_string();
        let rest = paste[end + PASTE_END.len()..].to_string();
        self.paste = None;
        events.push(StdinEvent::Paste(content));
        if !rest.is_empty() {
            events.extend(self.process_str(&rest));
        }
    }
}

/// Split `buffer` into complete sequences plus an incomplete escape tail.
fn split_sequences(buffer: &str) -> (Vec<String>, String) {
    let mut sequences = Vec::new();
    let mut pos = 0;

    while let Some(ch) = buffer[pos..].chars().next() {
        if ch != ESC {
            sequences.push(ch.to_string());
            pos += ch.len_utf8();
            continue;
        }
        let rest = &buffer[pos..];
        let complete = rest
            .char_indices()
            .skip(1)
            .map(|(idx, ch)| idx + ch.len_utf8())
            .find(|&end| sequence_status(&rest[..end]) == SequenceStatus::Complete);
        match complete {
            Some(end) => {
                sequences.push(rest[..end].to_string());
                pos += end;
            }
            None => return (sequences, rest.to_string()),
        }
    }

    (sequences, String::new())
}

fn sequence_status(data: &str) -> SequenceStatus {
    let after = &data[1..];
    if after.is_empty() {
        return SequenceStatus::Incomplete;
    }
    if let Some(payload) = after.strip_prefix('[') {
        return csi_status(payload);
    }
    if let Some(payload) = after.strip_prefix('O') {
        return if payload.is_empty() {
            SequenceStatus::Incomplete
        } else {
            SequenceStatus::Complete
        };
    }
    // ESC + char: Alt-modified key.
    SequenceStatus::Complete
}

fn csi_status(payload: &str) -> SequenceStatus {
    match payload.as_bytes().last() {
        Some(byte) if (0x40..=0x7e).contains(byte) => SequenceStatus::Complete,
        _ => SequenceStatus::Incomplete,
    }
}

#[cfg(test)]
mod tests {
    use super::{StdinBuffer, StdinEvent};
    use std::time::{Duration, Instant};

    fn data(text: &str) -> StdinEvent {
        StdinEvent::Data(text.to_string())
    }

    #[test]
    fn splits_partial_sequences() {
        let mut buffer = StdinBuffer::new(10);
        assert!(buffer.process(b"\x1b").is_empty());
        assert!(buffer.process(b"[1;").is_empty());
        assert_eq!(buffer.process(b"5D"), vec![data("\x1b[1;5D")]);
    }

    #[test]
    fn plain_chunk_becomes_one_event_per_char() {
        let mut buffer = StdinBuffer::new(10);
        assert_eq!(
            buffer.process("hé\r".as_bytes()),
            vec![data("h"), data("é"), data("\r")]
        );
    }

    #[test]
    fn utf8_split_across_reads_is_reassembled() {
        let mut buffer = StdinBuffer::new(10);
        let bytes = "é".as_bytes();
        assert!(buffer.process(&bytes[..1]).is_empty());
        assert_eq!(buffer.process(&bytes[1..]), vec![data("é")]);
    }

    #[test]
    fn lone_escape_flushes_after_timeout() {
        let mut buffer = StdinBuffer::new(10);
        assert!(buffer.process(b"\x1b").is_empty());
        assert!(buffer.flush_due(Instant::now()).is_empty());
        let events = buffer.flush_due(Instant::now() + Duration::from_millis(15));
        assert_eq!(events, vec![data("\x1b")]);
        assert!(buffer
            .flush_due(Instant::now() + Duration::from_millis(30))
            .is_empty());
    }

    #[test]
    fn cursor_report_is_one_sequence() {
        let mut buffer = StdinBuffer::new(10);
        assert_eq!(
            buffer.process(b"a\x1b[12;40Rb"),
            vec![data("a"), data("\x1b[12;40R"), data("b")]
        );
    }

    #[test]
    fn ss3_split_across_reads() {
        let mut buffer = StdinBuffer::new(10);
        assert!(buffer.process(b"\x1bO").is_empty());
        assert_eq!(buffer.process(b"H"), vec![data("\x1bOH")]);
    }

    #[test]
    fn emits_paste_event_across_chunks() {
        let mut buffer = StdinBuffer::new(10);
        let mut events = buffer.process(b"x\x1b[200~line one\r");
        assert_eq!(events, vec![data("x")]);
        assert!(buffer.has_pending());
        events = buffer.process(b"line two\x1b[201~y");
        assert_eq!(
            events,
            vec![
                StdinEvent::Paste("line one\rline two".to_string()),
                data("y")
            ]
        );
        assert!(!buffer.has_pending());
    }

    #[test]
    fn timeout_follows_deadline_and_blocks_without_one() {
        let mut buffer = StdinBuffer::new(25);
        let now = Instant::now();
        assert_eq!(buffer.next_timeout_ms(now, -1), -1);
        assert!(buffer.process(b"\x1b[").is_empty());
        assert!(buffer.next_timeout_ms(now, -1) <= 25);
        assert!(buffer.next_timeout_ms(now, 1000) <= 25);
        assert!(buffer.next_timeout_ms(now, -1) >= 0);

        buffer.clear();
        assert_eq!(buffer.next_timeout_ms(now, 77), 77);
        assert!(buffer.buffer().is_empty());
    }
}
