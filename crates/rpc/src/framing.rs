//! Bounded newline framing for the request stream.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// One unit read from the request stream.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Frame {
    /// A complete line, without its terminator. May not be UTF-8.
    Line(Vec<u8>),
    /// A line passed the size cap. Its remaining bytes are skipped up to the
    /// next newline and never buffered.
    TooLong,
}

/// Splits a byte stream into lines of at most `max` bytes.
///
/// `next_frame` only awaits on `fill_buf`, and all bookkeeping happens
/// between awaits, so dropping it inside `select!` loses no input.
pub(crate) struct LineReader<R> {
    reader: R,
    buf: Vec<u8>,
    max: usize,
    discarding: bool,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub(crate) fn new(reader: R, max: usize) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            max,
            discarding: false,
        }
    }

    /// Next frame, or `None` at end of stream.
    pub(crate) async fn next_frame(&mut self) -> std::io::Result<Option<Frame>> {
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                self.discarding = false;
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(Frame::Line(std::mem::take(&mut self.buf))));
            }

            let newline = available.iter().position(|&b| b == b'\n');
            let chunk = &available[..newline.unwrap_or(available.len())];
            let used = chunk.len() + usize::from(newline.is_some());

            let mut overflowed = false;
            if !self.discarding {
                if self.buf.len() + chunk.len() > self.max {
                    self.buf.clear();
                    self.discarding = true;
                    overflowed = true;
                } else {
                    self.buf.extend_from_slice(chunk);
                }
            }
            self.reader.consume(used);

            if newline.is_some() {
                let was_discarding = std::mem::replace(&mut self.discarding, false);
                if overflowed {
                    return Ok(Some(Frame::TooLong));
                }
                if !was_discarding {
                    return Ok(Some(Frame::Line(std::mem::take(&mut self.buf))));
                }
            } else if overflowed {
                return Ok(Some(Frame::TooLong));
            }
        }
    }
}
