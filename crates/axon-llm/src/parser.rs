//! Incremental framing of a response body into `data:` payloads
//!
//! Bytes are buffered until a newline arrives; each complete line starting
//! with `data: ` becomes a frame, everything else (blank keep-alives,
//! comments, `event:` lines, bare JSON) is discarded. Until the caller
//! releases it, the raw body is kept alongside so a response that ignored
//! the streaming flag can be parsed as one document once the stream ends.

use std::borrow::Cow;

/// Payload marking normal stream completion
pub const DONE_SENTINEL: &str = "[DONE]";

const DATA_PREFIX: &[u8] = b"data: ";

/// One delimited unit of the event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFrame {
    /// Payload of a `data: ` line
    Data(String),
    /// The `[DONE]` sentinel; nothing after it is framed
    Done,
}

/// Line-oriented framer over an append-only byte stream
#[derive(Debug, Default)]
pub struct FrameParser {
    /// Bytes not yet terminated by a newline
    buffer: Vec<u8>,
    /// Everything fed before the sentinel line, for whole-document fallback
    raw: Vec<u8>,
    raw_released: bool,
    done: bool,
}

impl FrameParser {
    /// Create an empty parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes and return every frame completed by them
    ///
    /// After the sentinel has been framed, further input is ignored.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<RawFrame> {
        if self.done {
            return Vec::new();
        }

        if !self.raw_released {
            self.raw.extend_from_slice(bytes);
        }
        self.buffer.extend_from_slice(bytes);

        let mut frames = Vec::new();
        let mut consumed = 0;

        while let Some(offset) = self.buffer[consumed..].iter().position(|&b| b == b'\n') {
            let line_start = consumed;
            let line = &self.buffer[line_start..line_start + offset];
            consumed += offset + 1;

            match frame_line(line) {
                Some(RawFrame::Done) => {
                    // the sentinel line and everything after it never count as body
                    self.truncate_raw_from(line_start);
                    self.terminate();
                    frames.push(RawFrame::Done);
                    return frames;
                }
                Some(frame) => frames.push(frame),
                None => {}
            }
        }

        self.buffer.drain(..consumed);
        frames
    }

    /// Frame the trailing segment that never received a newline
    ///
    /// Called once when the body ends.
    pub fn flush(&mut self) -> Vec<RawFrame> {
        if self.done {
            return Vec::new();
        }

        let frame = frame_line(&self.buffer);
        if frame == Some(RawFrame::Done) {
            self.truncate_raw_from(0);
            self.terminate();
        }
        self.buffer = Vec::new();

        frame.into_iter().collect()
    }

    /// Whether the sentinel has been seen
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Bytes buffered without a terminating newline
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// The body received so far, lossily decoded
    ///
    /// Empty once [`FrameParser::release_raw`] has been called.
    pub fn raw_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw)
    }

    /// Bytes held for whole-document fallback
    pub fn retained(&self) -> usize {
        self.raw.len()
    }

    /// Drop the raw body and stop recording it
    pub fn release_raw(&mut self) {
        self.raw_released = true;
        self.raw = Vec::new();
    }

    /// Cut `raw` back to where `buffer[offset..]` begins
    ///
    /// `buffer` is always a suffix of `raw` while `raw` is recorded.
    fn truncate_raw_from(&mut self, offset: usize) {
        if !self.raw_released {
            let dropped = self.buffer.len() - offset;
            self.raw.truncate(self.raw.len() - dropped);
        }
    }

    fn terminate(&mut self) {
        self.done = true;
        self.buffer = Vec::new();
    }
}

fn frame_line(line: &[u8]) -> Option<RawFrame> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let payload = line.strip_prefix(DATA_PREFIX)?;
    let payload = String::from_utf8_lossy(payload);

    if payload.trim_end() == DONE_SENTINEL {
        Some(RawFrame::Done)
    } else {
        Some(RawFrame::Data(payload.into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &str = concat!(
        ": keep-alive\n",
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n",
        "\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hél\"}}]}\n",
        "\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n",
        "\n",
        "data: [DONE]\n",
    );

    fn feed_all(parser: &mut FrameParser, chunks: &[&[u8]]) -> Vec<RawFrame> {
        let mut frames: Vec<_> = chunks.iter().flat_map(|chunk| parser.feed(chunk)).collect();
        frames.extend(parser.flush());
        frames
    }

    #[test]
    fn frames_data_lines_only() {
        let frames = feed_all(&mut FrameParser::new(), &[STREAM.as_bytes()]);
        assert_eq!(frames.len(), 4);
        assert_eq!(
            frames[1],
            RawFrame::Data("{\"choices\":[{\"delta\":{\"content\":\"Hél\"}}]}".to_owned())
        );
        assert_eq!(frames[3], RawFrame::Done);
    }

    #[test]
    fn framing_is_independent_of_chunk_boundaries() {
        let bytes = STREAM.as_bytes();
        let whole = feed_all(&mut FrameParser::new(), &[bytes]);

        for split in 0..=bytes.len() {
            let (head, tail) = bytes.split_at(split);
            let frames = feed_all(&mut FrameParser::new(), &[head, tail]);
            assert_eq!(frames, whole, "split at {split}");
        }

        let byte_chunks: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(feed_all(&mut FrameParser::new(), &byte_chunks), whole);
    }

    #[test]
    fn sentinel_ignores_everything_after_it() {
        let mut parser = FrameParser::new();
        let frames = parser.feed(b"data: {\"a\":1}\ndata: [DONE]\ndata: {\"b\":2}\n");
        assert_eq!(frames, [RawFrame::Data("{\"a\":1}".to_owned()), RawFrame::Done]);
        assert!(parser.is_done());

        assert!(parser.feed(b"data: {\"c\":3}\n").is_empty());
        assert!(parser.flush().is_empty());
        assert_eq!(parser.raw_text(), "data: {\"a\":1}\n");
        assert_eq!(parser.pending(), 0);
    }

    #[test]
    fn crlf_line_endings() {
        let frames = feed_all(&mut FrameParser::new(), &[b"data: {\"a\":1}\r\n\r\ndata: [DONE]\r\n"]);
        assert_eq!(frames, [RawFrame::Data("{\"a\":1}".to_owned()), RawFrame::Done]);
    }

    #[test]
    fn flush_emits_unterminated_trailing_frame() {
        let mut parser = FrameParser::new();
        assert!(parser.feed(b"data: {\"a\":1}").is_empty());
        assert_eq!(parser.pending(), 13);
        assert_eq!(parser.flush(), [RawFrame::Data("{\"a\":1}".to_owned())]);
        assert_eq!(parser.pending(), 0);
    }

    #[test]
    fn flush_of_non_data_tail_is_empty() {
        let mut parser = FrameParser::new();
        parser.feed(b"{\"choices\":[{\"message\":{\"content\":\"hi\"}}]}");
        assert!(parser.flush().is_empty());
        assert_eq!(parser.raw_text(), "{\"choices\":[{\"message\":{\"content\":\"hi\"}}]}");
    }

    #[test]
    fn raw_body_stops_before_sentinel_line() {
        let document = "{\"choices\":[{\"message\":{\"content\":\"hi\"}}]}\n\n";
        let body = format!("{document}data: [DONE]\ntrailing");
        let bytes = body.as_bytes();

        for split in 0..=bytes.len() {
            let (head, tail) = bytes.split_at(split);
            let mut parser = FrameParser::new();
            feed_all(&mut parser, &[head, tail]);
            assert_eq!(parser.raw_text(), document, "split at {split}");
        }

        let mut parser = FrameParser::new();
        parser.feed(document.as_bytes());
        assert!(parser.flush().is_empty());
        assert_eq!(parser.raw_text(), document);

        let mut parser = FrameParser::new();
        parser.feed(format!("{document}data: [DONE]").as_bytes());
        assert_eq!(parser.flush(), [RawFrame::Done]);
        assert_eq!(parser.raw_text(), document);
    }

    #[test]
    fn released_raw_body_is_not_recorded() {
        let mut parser = FrameParser::new();
        parser.feed(b"data: {\"a\":1}\n");
        assert_eq!(parser.retained(), 14);

        parser.release_raw();
        assert_eq!(parser.retained(), 0);

        let frames = feed_all(&mut parser, &[b"data: {\"b\":2}\ndata: [DONE]\n"]);
        assert_eq!(frames, [RawFrame::Data("{\"b\":2}".to_owned()), RawFrame::Done]);
        assert_eq!(parser.retained(), 0);
        assert_eq!(parser.raw_text(), "");
    }

    #[test]
    fn prefix_requires_space() {
        let frames = feed_all(&mut FrameParser::new(), &[b"data:{\"a\":1}\nevent: ping\n"]);
        assert!(frames.is_empty());
    }
}
