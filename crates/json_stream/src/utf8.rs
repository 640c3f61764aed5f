/// Streaming UTF-8 decoder that keeps decoding state across fragment boundaries.
///
/// A multi-byte sequence split between two fragments is held back until the
/// remaining bytes arrive. Invalid sequences decode to U+FFFD, and a partial
/// sequence still pending at [`Utf8Carry::finish`] flushes as a single U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    /// Decode as much of `bytes` (plus any carried prefix) as forms complete characters.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::with_capacity(self.pending.len());
        let mut offset = 0;

        while offset < self.pending.len() {
            match std::str::from_utf8(&self.pending[offset..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    offset = self.pending.len();
                }
                Err(error) => {
                    let valid_up_to = error.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(
                        &self.pending[offset..offset + valid_up_to],
                    ));
                    offset += valid_up_to;

                    match error.error_len() {
                        Some(invalid_len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            offset += invalid_len;
                        }
                        // Incomplete trailing sequence: wait for the next fragment.
                        None => break,
                    }
                }
            }
        }

        self.pending.drain(..offset);
        out
    }

    /// Flush at end-of-stream.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }

        self.pending.clear();
        char::REPLACEMENT_CHARACTER.to_string()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
