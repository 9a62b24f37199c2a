use anyhow::Result;
use std::collections::VecDeque;

/// Byte buffer for line-based parsing of a streamed body.
///
/// Lines are split on `\n` before UTF-8 decoding, so a multi-byte character
/// cut across two reads is reassembled before it is ever interpreted.
pub struct LineBuffer {
    buffer: VecDeque<u8>,
}

impl LineBuffer {
    /// Create a new buffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    /// Add bytes from one transport read
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract the next complete line without its terminator (`\n` or `\r\n`).
    /// Returns None while only a partial line is buffered.
    pub fn next_line(&mut self) -> Option<Result<String>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;

        let mut line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        line_bytes.pop();
        if line_bytes.last() == Some(&b'\r') {
            line_bytes.pop();
        }

        match String::from_utf8(line_bytes) {
            Ok(line) => Some(Ok(line)),
            Err(e) => Some(Err(anyhow::anyhow!("Invalid UTF-8: {}", e))),
        }
    }

    /// Drain whatever is left (an unterminated tail)
    pub fn take_remainder(&mut self) -> Vec<u8> {
        self.buffer.drain(..).collect()
    }

    /// Current buffer size
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_buffer_basic() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.extend(b"line1\nline2\r\n");

        assert_eq!(buffer.next_line().unwrap().unwrap(), "line1");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "line2");
        assert!(buffer.next_line().is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_partial_line() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.extend(b"partial");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.len(), 7);

        buffer.extend(b" line\n");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "partial line");
    }

    #[test]
    fn test_multibyte_split_across_reads() {
        let text = "caf\u{e9} \u{1f30d}\n";
        let bytes = text.as_bytes();
        let mut buffer = LineBuffer::with_capacity(64);

        // split inside the 4-byte emoji
        let cut = bytes.len() - 3;
        buffer.extend(&bytes[..cut]);
        assert!(buffer.next_line().is_none());
        buffer.extend(&bytes[cut..]);

        assert_eq!(buffer.next_line().unwrap().unwrap(), "caf\u{e9} \u{1f30d}");
    }

    #[test]
    fn test_invalid_utf8_line_is_reported_and_consumed() {
        let mut buffer = LineBuffer::with_capacity(64);
        buffer.extend(&[0xff, 0xfe, b'\n']);
        buffer.extend(b"ok\n");

        assert!(buffer.next_line().unwrap().is_err());
        assert_eq!(buffer.next_line().unwrap().unwrap(), "ok");
    }

    #[test]
    fn test_take_remainder() {
        let mut buffer = LineBuffer::with_capacity(64);
        buffer.extend(b"done\ndata: {\"type\"");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "done");
        assert_eq!(buffer.take_remainder(), b"data: {\"type\"".to_vec());
        assert!(buffer.is_empty());
    }
}
