//! Wire framing for the Pulse Train Hat ASCII protocol.
//!
//! Every command and every reply is a run of ASCII characters terminated by
//! `*`. Replies arrive as an unbounded byte stream that a serial read may cut
//! at any point, so [`FrameDecoder`] accumulates raw bytes and hands back only
//! complete frames, keeping any trailing fragment for the next read.
//!
//! # Framing contract
//!
//! - The terminator is consumed. It never appears in a returned frame and is
//!   never left at the head of the pending buffer.
//! - Empty frames (two adjacent terminators, as in `RI00FW**1.0*`) are
//!   dropped, so splitting the stream differently can never produce a
//!   different frame list.
//! - Apart from terminators, no byte is dropped from the stream. The pending
//!   buffer is only cleared by [`FrameDecoder::reset`].
//! - Frames are decoded as lossy UTF-8: a byte that is not valid UTF-8 is
//!   replaced by U+FFFD in the returned frame. The board only sends ASCII.

use bytes::BytesMut;
use tracing::warn;

/// Command and reply terminator byte.
pub const TERMINATOR: u8 = b'*';

/// Pending-buffer size above which a warning is logged. A healthy stream
/// never holds more than one partial frame, which is a few dozen bytes.
pub const PENDING_WARN_THRESHOLD: usize = 8192;

/// Append the terminator to a command body.
///
/// ```
/// use pthat::protocol::encode_command;
///
/// assert_eq!(encode_command("I00D1"), "I00D1*");
/// ```
pub fn encode_command(body: &str) -> String {
    let mut wire = String::with_capacity(body.len() + 1);
    wire.push_str(body);
    wire.push(TERMINATOR as char);
    wire
}

/// Stateful accumulator that splits a chunked byte stream into frames.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    pending: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `raw` to the pending buffer and return every frame it completes.
    ///
    /// Returns an empty list when no terminator has arrived yet; that only
    /// means more bytes are needed. Frames are returned in stream order.
    pub fn feed(&mut self, raw: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(raw);

        let Some(last) = self.pending.iter().rposition(|&b| b == TERMINATOR) else {
            if self.pending.len() > PENDING_WARN_THRESHOLD {
                warn!(
                    len = self.pending.len(),
                    "pending buffer has grown without a terminator"
                );
            }
            return Vec::new();
        };

        let complete = self.pending.split_to(last + 1);
        complete[..last]
            .split(|&b| b == TERMINATOR)
            .filter(|frame| !frame.is_empty())
            .map(|frame| String::from_utf8_lossy(frame).into_owned())
            .collect()
    }

    /// Bytes received but not yet resolved into a complete frame.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Discard the pending fragment. Used only when the connection is reset.
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // encode_command
    // -----------------------------------------------------------------------

    #[test]
    fn encode_appends_terminator() {
        assert_eq!(encode_command("I00FW"), "I00FW*");
        assert_eq!(encode_command("N"), "N*");
        assert_eq!(encode_command(""), "*");
    }

    // -----------------------------------------------------------------------
    // FrameDecoder::feed
    // -----------------------------------------------------------------------

    #[test]
    fn feed_two_frames_in_one_chunk() {
        let mut dec = FrameDecoder::new();
        assert_eq!(dec.feed(b"I00D1*I00A11*"), vec!["I00D1", "I00A11"]);
        assert!(dec.pending().is_empty());
    }

    #[test]
    fn feed_split_across_chunks() {
        let mut dec = FrameDecoder::new();
        let mut frames = dec.feed(b"I00D1*I");
        assert_eq!(frames, vec!["I00D1"]);
        assert_eq!(dec.pending(), b"I");
        frames.extend(dec.feed(b"00A11*"));
        assert_eq!(frames, vec!["I00D1", "I00A11"]);
        assert!(dec.pending().is_empty());
    }

    #[test]
    fn feed_without_terminator_returns_nothing() {
        let mut dec = FrameDecoder::new();
        assert!(dec.feed(b"RI00C").is_empty());
        assert_eq!(dec.pending(), b"RI00C");
        assert!(dec.feed(b"X").is_empty());
        assert_eq!(dec.feed(b"*"), vec!["RI00CX"]);
    }

    #[test]
    fn feed_empty_chunk() {
        let mut dec = FrameDecoder::new();
        assert!(dec.feed(b"").is_empty());
        assert!(dec.pending().is_empty());
    }

    #[test]
    fn terminator_is_not_retained() {
        let mut dec = FrameDecoder::new();
        dec.feed(b"RI01SX*CI0");
        assert_eq!(dec.pending(), b"CI0");
        assert_eq!(dec.feed(b"1SX*"), vec!["CI01SX"]);
    }

    #[test]
    fn adjacent_terminators_yield_no_empty_frames() {
        let mut dec = FrameDecoder::new();
        assert_eq!(dec.feed(b"RI00FW**V1.2*"), vec!["RI00FW", "V1.2"]);
        assert!(dec.feed(b"*").is_empty());
        assert!(dec.pending().is_empty());
    }

    #[test]
    fn chunk_invariance_byte_by_byte() {
        let stream = b"RI01CX*CI01CX*RI01SX*XP00000001000*DI01JX*CI01SX*";

        let mut whole = FrameDecoder::new();
        let expected = whole.feed(stream);
        assert_eq!(expected.len(), 6);

        for chunk_size in 1..stream.len() {
            let mut dec = FrameDecoder::new();
            let mut frames = Vec::new();
            for chunk in stream.chunks(chunk_size) {
                frames.extend(dec.feed(chunk));
            }
            assert_eq!(frames, expected, "chunk size {chunk_size}");
        }
    }

    #[test]
    fn chunk_invariance_with_double_terminators() {
        let stream = b"RI00FW**PTHAT 5.3*CI00FW*";
        let mut whole = FrameDecoder::new();
        let expected = whole.feed(stream);
        assert_eq!(expected, vec!["RI00FW", "PTHAT 5.3", "CI00FW"]);

        for split in 0..=stream.len() {
            let mut dec = FrameDecoder::new();
            let mut frames = dec.feed(&stream[..split]);
            frames.extend(dec.feed(&stream[split..]));
            assert_eq!(frames, expected, "split at {split}");
        }
    }

    #[test]
    fn non_utf8_bytes_are_kept_lossily() {
        let mut dec = FrameDecoder::new();
        let frames = dec.feed(&[b'R', 0xFF, b'*']);
        assert_eq!(frames, ["R\u{FFFD}"]);
        assert!(dec.pending().is_empty());
    }

    #[test]
    fn large_pending_is_not_discarded() {
        let mut dec = FrameDecoder::new();
        let noise = vec![b'0'; PENDING_WARN_THRESHOLD + 10];
        assert!(dec.feed(&noise).is_empty());
        assert_eq!(dec.pending().len(), PENDING_WARN_THRESHOLD + 10);
        let frames = dec.feed(b"*");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), PENDING_WARN_THRESHOLD + 10);
    }

    // -----------------------------------------------------------------------
    // FrameDecoder::reset
    // -----------------------------------------------------------------------

    #[test]
    fn reset_clears_pending() {
        let mut dec = FrameDecoder::new();
        dec.feed(b"RI00");
        dec.reset();
        assert!(dec.pending().is_empty());
        assert_eq!(dec.feed(b"CI00SX*"), vec!["CI00SX"]);
    }
}
