use anyhow::Result;
use std::collections::VecDeque;

/// Byte ring for line-oriented SSE parsing
///
/// Network chunks split lines (and UTF-8 sequences) at arbitrary points, so
/// bytes are held until a full `\n`-terminated line is available.
pub struct CircularLineBuffer {
    buffer: VecDeque<u8>,
}

impl CircularLineBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Next complete line with its terminator (`\n` or `\r\n`) removed.
    /// Returns None while no complete line is buffered.
    pub fn next_line(&mut self) -> Option<Result<String>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        Some(decode_line(&line_bytes))
    }

    /// Unterminated bytes left once the upstream closed
    pub fn take_remainder(&mut self) -> Option<Result<String>> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest: Vec<u8> = self.buffer.drain(..).collect();
        Some(decode_line(&rest))
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

fn decode_line(bytes: &[u8]) -> Result<String> {
    let line = std::str::from_utf8(bytes)
        .map_err(|e| anyhow::anyhow!("Invalid UTF-8 in SSE line: {}", e))?;
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}
