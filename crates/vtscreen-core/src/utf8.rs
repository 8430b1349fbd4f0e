//! Incremental UTF-8 decoding.
//!
//! Bjoern Hoehrmann's DFA decoder, driven one byte at a time so the parser
//! can interleave escape-sequence recognition with text decoding and resume
//! across `write` boundaries. Ill-formed input substitutes exactly one
//! U+FFFD per maximal ill-formed subsequence (Unicode 15 §3.9, "maximal
//! subpart" policy).

/// Accept state: a complete scalar value has been decoded.
const UTF8_ACCEPT: u8 = 0;
/// Reject state: the byte cannot continue any well-formed sequence.
const UTF8_REJECT: u8 = 12;

/// Character class table (bytes 0-255) followed by the state transition
/// table, exactly as published with the DFA.
#[rustfmt::skip]
static UTF8_TABLE: [u8; 364] = [
    // character classes
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,  0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,  0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,  0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,  0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,  9,9,9,9,9,9,9,9,9,9,9,9,9,9,9,9,
    7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,  7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,
    8,8,2,2,2,2,2,2,2,2,2,2,2,2,2,2,  2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,
    10,3,3,3,3,3,3,3,3,3,3,3,3,4,3,3, 11,6,6,6,5,8,8,8,8,8,8,8,8,8,8,8,
    // state transitions
     0,12,24,36,60,96,84,12,12,12,48,72, 12,12,12,12,12,12,12,12,12,12,12,12,
    12, 0,12,12,12,12,12, 0,12, 0,12,12, 12,24,12,12,12,12,12,24,12,24,12,12,
    12,12,12,12,12,12,12,24,12,12,12,12, 12,24,12,12,12,12,12,12,12,24,12,12,
    12,12,12,12,12,12,12,36,12,36,12,12, 12,36,12,12,12,12,12,36,12,36,12,12,
    12,36,12,12,12,12,12,12,12,12,12,12,
];

/// Outcome of feeding one byte to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utf8Step {
    /// Mid-sequence; feed more bytes.
    Pending,
    /// A scalar value completed.
    Decoded(char),
    /// The sequence including this byte was ill-formed; emit one U+FFFD.
    ///
    /// The offending byte is absorbed into the replaced subsequence. Control
    /// bytes must not be routed here; the parser cancels the decoder before
    /// executing them.
    Malformed,
}

/// Streaming UTF-8 decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Decoder {
    state: u8,
    codepoint: u32,
}

impl Utf8Decoder {
    /// Create a decoder in the accept state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: UTF8_ACCEPT,
            codepoint: 0,
        }
    }

    /// Check if the decoder is in the middle of a multi-byte sequence.
    #[must_use]
    #[inline]
    pub const fn in_progress(&self) -> bool {
        self.state != UTF8_ACCEPT
    }

    /// Abandon an in-flight sequence (e.g. when ESC interrupts text).
    ///
    /// Returns true if a partial sequence was dropped, in which case the
    /// caller owes the stream one U+FFFD.
    pub fn cancel(&mut self) -> bool {
        let was_pending = self.in_progress();
        self.state = UTF8_ACCEPT;
        self.codepoint = 0;
        was_pending
    }

    /// Feed one byte.
    #[inline]
    pub fn push(&mut self, byte: u8) -> Utf8Step {
        let class = UTF8_TABLE[byte as usize];
        self.codepoint = if self.state == UTF8_ACCEPT {
            (0xFFu32 >> class) & u32::from(byte)
        } else {
            u32::from(byte & 0x3F) | (self.codepoint << 6)
        };
        self.state = UTF8_TABLE[256 + usize::from(self.state) + usize::from(class)];

        match self.state {
            UTF8_ACCEPT => {
                // The DFA only reaches ACCEPT on valid scalar values.
                let ch = char::from_u32(self.codepoint).unwrap_or('\u{FFFD}');
                Utf8Step::Decoded(ch)
            }
            UTF8_REJECT => {
                self.state = UTF8_ACCEPT;
                self.codepoint = 0;
                Utf8Step::Malformed
            }
            _ => Utf8Step::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> String {
        let mut decoder = Utf8Decoder::new();
        let mut out = String::new();
        for &byte in bytes {
            match decoder.push(byte) {
                Utf8Step::Decoded(ch) => out.push(ch),
                Utf8Step::Malformed => out.push('\u{FFFD}'),
                Utf8Step::Pending => {}
            }
        }
        if decoder.cancel() {
            out.push('\u{FFFD}');
        }
        out
    }

    #[test]
    fn ascii_passthrough() {
        assert_eq!(decode(b"hello"), "hello");
    }

    #[test]
    fn multibyte_sequences() {
        assert_eq!(decode("中文é".as_bytes()), "中文é");
        assert_eq!(decode("👋".as_bytes()), "👋");
    }

    #[test]
    fn invalid_lead_byte() {
        assert_eq!(decode(b"\xFFA"), "\u{FFFD}A");
    }

    #[test]
    fn truncated_sequence_absorbs_breaking_byte() {
        // 0xC3 expects a continuation; '(' is not one. The pair is one
        // ill-formed subsequence and yields a single replacement.
        assert_eq!(decode(b"\xC3\x28"), "\u{FFFD}");
        assert_eq!(decode(b"\xC3\x28A"), "\u{FFFD}A");
    }

    #[test]
    fn overlong_form_rejected() {
        // 0xC0 0xAF is an overlong '/',
        assert_eq!(decode(b"\xC0\xAF"), "\u{FFFD}\u{FFFD}");
    }

    #[test]
    fn dangling_tail_yields_single_replacement() {
        assert_eq!(decode(b"\xE4\xB8"), "\u{FFFD}");
    }

    #[test]
    fn split_across_pushes() {
        let mut decoder = Utf8Decoder::new();
        let bytes = "中".as_bytes();
        assert_eq!(decoder.push(bytes[0]), Utf8Step::Pending);
        assert!(decoder.in_progress());
        assert_eq!(decoder.push(bytes[1]), Utf8Step::Pending);
        assert_eq!(decoder.push(bytes[2]), Utf8Step::Decoded('中'));
        assert!(!decoder.in_progress());
    }
}
