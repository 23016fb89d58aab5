use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::config::DEFAULT_MAX_FRAME_SIZE;
use crate::frame::{self, Frame};
use crate::Error;

/// Splits the inbound byte stream into messages, each one holding the raw bytes of a single
/// top-level frame. Turning a message into a command is left to the dispatcher.
pub struct MessageCodec {
    max_frame_size: usize,
}

impl MessageCodec {
    pub fn new(max_frame_size: usize) -> MessageCodec {
        MessageCodec { max_frame_size }
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl Decoder for MessageCodec {
    type Item = BytesMut;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        // Check if the frame size exceeds a certain limit to prevent DoS attacks
        if src.len() > self.max_frame_size {
            return Err("frame size exceeds limit".into());
        }

        match Frame::decode(&src[..], 0) {
            // Remove the message from the buffer.
            Ok((_, end)) => Ok(Some(src.split_to(end))),
            Err(frame::Error::Incomplete) => Ok(None), // Not enough data to parse a frame.
            Err(err) => {
                // There is no telling where a malformed frame ends, everything buffered goes to
                // the dispatcher which answers it with a single error.
                debug!("Malformed frame: {}", err);
                Ok(Some(src.split()))
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() => Ok(None),
            None => Ok(Some(src.split())),
        }
    }
}

impl Encoder<Vec<u8>> for MessageCodec {
    type Error = Error;

    fn encode(&mut self, reply: Vec<u8>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&reply);
        Ok(())
    }
}
