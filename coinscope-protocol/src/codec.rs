//! Server-Sent Events framing
//!
//! Encodes outbound session frames as `text/event-stream` blocks and decodes
//! them back (used by clients and tests reading the stream).

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Maximum size of a single frame (4 MB), in either direction
pub const MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

/// Event name announcing the per-session POST endpoint
pub const ENDPOINT_EVENT: &str = "endpoint";

/// Event name carrying a JSON-RPC message
pub const MESSAGE_EVENT: &str = "message";

/// SSE codec error
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid UTF-8 in event stream: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },
}

/// One block of an event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// A dispatched event with an optional name
    Event { name: Option<String>, data: String },
    /// A comment line, used for keep-alives
    Comment(String),
}

impl SseFrame {
    /// Named event
    pub fn event(name: impl Into<String>, data: impl Into<String>) -> Self {
        SseFrame::Event {
            name: Some(name.into()),
            data: data.into(),
        }
    }

    /// `event: endpoint` announcing where to POST frames
    pub fn endpoint(uri: impl Into<String>) -> Self {
        Self::event(ENDPOINT_EVENT, uri)
    }

    /// `event: message` carrying one JSON-RPC message
    pub fn message(json: impl Into<String>) -> Self {
        Self::event(MESSAGE_EVENT, json)
    }

    /// Keep-alive comment
    pub fn keep_alive() -> Self {
        SseFrame::Comment("keep-alive".into())
    }
}

/// Codec for `text/event-stream` blocks
#[derive(Debug, Default)]
pub struct SseCodec;

impl SseCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<SseFrame> for SseCodec {
    type Error = CodecError;

    fn encode(&mut self, item: SseFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            SseFrame::Event { name, data } => {
                let size = data.len() + name.as_ref().map_or(0, String::len);
                if size > MAX_FRAME_SIZE {
                    return Err(CodecError::FrameTooLarge {
                        size,
                        max: MAX_FRAME_SIZE,
                    });
                }

                if let Some(name) = name {
                    dst.put_slice(b"event: ");
                    dst.put_slice(name.as_bytes());
                    dst.put_u8(b'\n');
                }
                for line in data.split('\n') {
                    dst.put_slice(b"data: ");
                    dst.put_slice(line.trim_end_matches('\r').as_bytes());
                    dst.put_u8(b'\n');
                }
                dst.put_u8(b'\n');
            }
            SseFrame::Comment(text) => {
                dst.put_slice(b": ");
                dst.put_slice(text.replace('\n', " ").as_bytes());
                dst.put_slice(b"\n\n");
            }
        }
        Ok(())
    }
}

impl Decoder for SseCodec {
    type Item = SseFrame;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(end) = find_block_end(src) else {
                if src.len() > MAX_FRAME_SIZE {
                    return Err(CodecError::FrameTooLarge {
                        size: src.len(),
                        max: MAX_FRAME_SIZE,
                    });
                }
                return Ok(None);
            };

            let block = src.split_to(end + 2);
            let text = std::str::from_utf8(&block[..end])?;

            // Blocks with nothing in them are skipped, keep scanning
            if let Some(frame) = parse_block(text) {
                return Ok(Some(frame));
            }
        }
    }
}

fn find_block_end(src: &[u8]) -> Option<usize> {
    src.windows(2).position(|w| w == b"\n\n")
}

fn parse_block(text: &str) -> Option<SseFrame> {
    let mut name = None;
    let mut data: Option<String> = None;
    let mut comment = None;

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix(':') {
            comment = Some(rest.strip_prefix(' ').unwrap_or(rest).to_string());
            continue;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => name = Some(value.to_string()),
            "data" => match data.as_mut() {
                Some(buf) => {
                    buf.push('\n');
                    buf.push_str(value);
                }
                None => data = Some(value.to_string()),
            },
            _ => {}
        }
    }

    match (name, data, comment) {
        (name, Some(data), _) => Some(SseFrame::Event { name, data }),
        (Some(name), None, _) => Some(SseFrame::Event {
            name: Some(name),
            data: String::new(),
        }),
        (None, None, Some(text)) => Some(SseFrame::Comment(text)),
        (None, None, None) => None,
    }
}
