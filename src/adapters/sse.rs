//! Incremental `text/event-stream` decoding.
//!
//! Only the parts of the format the order stream uses are interpreted:
//! `event:` and `data:` fields, comment lines and blank-line dispatch.
//! `id:` and `retry:` are accepted and discarded since the client never
//! reconnects on its own.

use crate::domain::model::EventFrame;
use crate::domain::ports::EventFrameStream;
use crate::utils::error::{OrderError, Result};
use futures::{future, stream, Stream, StreamExt};

const DEFAULT_EVENT: &str = "message";
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

#[derive(Debug, Default)]
pub struct SseDecoder {
    // Bytes of the current, unterminated line.
    buffer: Vec<u8>,
    // Previous chunk ended on `\r`; a leading `\n` belongs to that line end.
    skip_lf: bool,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of bytes and returns every frame it completed.
    ///
    /// Lines end in `\n`, `\r\n` or a bare `\r`, and may be split across
    /// chunks at any byte. A line longer than [`MAX_LINE_BYTES`] fails with
    /// [`OrderError::TransportError`].
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<EventFrame>> {
        let mut rest = chunk;
        if self.skip_lf && !rest.is_empty() {
            self.skip_lf = false;
            if rest[0] == b'\n' {
                rest = &rest[1..];
            }
        }

        let mut frames = Vec::new();
        while let Some(pos) = rest.iter().position(|&b| b == b'\n' || b == b'\r') {
            self.check_line_length(pos)?;
            self.buffer.extend_from_slice(&rest[..pos]);
            let ended_on_cr = rest[pos] == b'\r';
            rest = &rest[pos + 1..];
            if ended_on_cr {
                match rest.first() {
                    Some(b'\n') => rest = &rest[1..],
                    None => self.skip_lf = true,
                    Some(_) => {}
                }
            }

            let line = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&line);
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }

        self.check_line_length(rest.len())?;
        self.buffer.extend_from_slice(rest);
        Ok(frames)
    }

    fn check_line_length(&mut self, extra: usize) -> Result<()> {
        if self.buffer.len() + extra > MAX_LINE_BYTES {
            self.buffer.clear();
            return Err(OrderError::TransportError {
                message: format!("event stream line exceeds {} bytes", MAX_LINE_BYTES),
            });
        }
        Ok(())
    }

    fn process_line(&mut self, line: &str) -> Option<EventFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" | "retry" => {}
            other => tracing::trace!("Skipping unknown stream field '{}'", other),
        }
        None
    }

    fn dispatch(&mut self) -> Option<EventFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(EventFrame {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data,
        })
    }
}

/// Turns a byte stream into decoded frames. A byte-level or framing error is
/// passed through and ends the stream; a trailing frame without its blank line is
/// discarded.
pub fn decode_stream<S, B, E>(bytes: S) -> EventFrameStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]>,
    E: Into<OrderError>,
{
    Box::pin(
        bytes
            .scan((SseDecoder::new(), false), |(decoder, failed), chunk| {
                if *failed {
                    return future::ready(None);
                }
                let frames: Vec<Result<EventFrame>> = match chunk {
                    Ok(chunk) => match decoder.push(chunk.as_ref()) {
                        Ok(frames) => frames.into_iter().map(Ok).collect(),
                        Err(e) => {
                            *failed = true;
                            vec![Err(e)]
                        }
                    },
                    Err(e) => {
                        *failed = true;
                        vec![Err(e.into())]
                    }
                };
                future::ready(Some(frames))
            })
            .flat_map(stream::iter),
    )
}
