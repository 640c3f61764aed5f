use serde_json::Value;

use crate::utf8::Utf8Carry;

/// Incremental decoder for a stream of concatenated JSON objects.
///
/// Input accumulates in a single buffer. Every complete object is parsed and
/// returned in the order its closing brace appears; everything up to and
/// including that brace is then discarded. Incomplete trailing data stays
/// buffered until more input arrives, and is dropped (never emitted) at the
/// end of the stream.
#[derive(Debug, Default)]
pub struct JsonObjectDecoder {
    buffer: String,
    utf8: Utf8Carry,
}

impl JsonObjectDecoder {
    /// Feed raw response bytes and drain complete objects.
    ///
    /// Decoding state is carried between calls, so a fragment may end in the
    /// middle of a multi-byte character.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Value> {
        let text = self.utf8.decode(bytes);
        self.feed_str(&text)
    }

    /// Feed already-decoded text and drain complete objects.
    pub fn feed_str(&mut self, fragment: &str) -> Vec<Value> {
        self.buffer.push_str(fragment);
        self.drain_objects()
    }

    /// Flush at end-of-stream.
    ///
    /// Returns any object completed by the final bytes. Whatever remains in
    /// [`JsonObjectDecoder::pending`] afterwards is garbage or an incomplete
    /// object and is not reported.
    pub fn finish(&mut self) -> Vec<Value> {
        let tail = self.utf8.finish();
        self.buffer.push_str(&tail);
        let messages = self.drain_objects();

        if !self.buffer.is_empty() {
            tracing::debug!(
                discarded_bytes = self.buffer.len(),
                "discarding incomplete trailing stream data"
            );
        }

        messages
    }

    /// Decode a complete body in one shot.
    pub fn decode_all(input: &str) -> Vec<Value> {
        let mut decoder = Self::default();
        let mut messages = decoder.feed_str(input);
        messages.extend(decoder.finish());
        messages
    }

    /// Text retained for the next fragment.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.trim().is_empty()
    }

    fn drain_objects(&mut self) -> Vec<Value> {
        let mut messages = Vec::new();

        loop {
            let Some(start) = self.buffer.find('{') else {
                break;
            };
            let Some(end) = find_object_end(self.buffer.as_bytes(), start) else {
                break;
            };

            match serde_json::from_str::<Value>(&self.buffer[start..=end]) {
                Ok(value) => {
                    messages.push(value);
                    self.buffer.drain(..=end);
                }
                Err(error) => {
                    // Resync one character past the opening brace; the next pass
                    // searches for the following `{`.
                    tracing::debug!(%error, offset = start, "skipping unparseable brace-balanced span");
                    self.buffer.drain(..=start);
                }
            }
        }

        messages
    }
}

/// Index of the brace closing the object opened at `start`, if the buffer holds it yet.
///
/// The bytes scanned (`{`, `}`, `"`, `\`) are ASCII, and UTF-8 continuation bytes
/// never collide with ASCII, so a byte scan over UTF-8 text is exact.
fn find_object_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;

    for (index, &byte) in bytes.iter().enumerate().skip(start) {
        if byte == b'"' && preceding_backslashes(bytes, index) % 2 == 0 {
            in_string = !in_string;
        }

        if !in_string {
            match byte {
                b'{' => depth += 1,
                b'}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }

        if depth == 0 {
            return Some(index);
        }
    }

    None
}

fn preceding_backslashes(bytes: &[u8], index: usize) -> usize {
    bytes[..index]
        .iter()
        .rev()
        .take_while(|byte| **byte == b'\\')
        .count()
}
