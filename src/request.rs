use bytes::Bytes;
use std::str::{self, FromStr};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error as ThisError;

use crate::frame::{self, Frame};

static CRLF: &[u8; 2] = b"\r\n";

/// Every command the server knows about. Names are matched case-insensitively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum CommandName {
    Command,
    Decr,
    Del,
    Echo,
    Exists,
    Get,
    Keys,
    Len,
    Lpush,
    Ping,
    Rpush,
    Sadd,
    Save,
    Set,
    Smembers,
}

/// A decoded client request: the command name and its arguments, still as raw bytes.
#[derive(Debug, PartialEq)]
pub struct Request {
    pub name: CommandName,
    pub args: Vec<Bytes>,
}

#[derive(Debug, ThisError, PartialEq)]
pub enum RequestError {
    #[error("protocol error; {0}")]
    Parse(#[from] frame::Error),
    #[error("Invalid command")]
    InvalidCommand,
}

/// Decodes a message holding exactly one command: an array of bulk strings whose first
/// element names a known command.
pub fn decode_command(src: &[u8]) -> Result<Request, RequestError> {
    // Clients send commands to the server as RESP arrays.
    if src.first() != Some(&b'*') || !src.ends_with(CRLF) {
        return Err(RequestError::InvalidCommand);
    }

    let (frame, end) = Frame::decode(src, 0)?;
    if end != src.len() {
        return Err(RequestError::InvalidCommand);
    }

    let Frame::Array(frames) = frame else {
        return Err(RequestError::InvalidCommand);
    };

    let mut parts = frames.into_iter().map(|frame| match frame {
        Frame::Bulk(bytes) => Ok(bytes),
        _ => Err(RequestError::InvalidCommand),
    });

    let name = parts.next().ok_or(RequestError::InvalidCommand)??;
    let name = str::from_utf8(&name)
        .ok()
        .and_then(|name| CommandName::from_str(name).ok())
        .ok_or(RequestError::InvalidCommand)?;
    let args = parts.collect::<Result<Vec<_>, _>>()?;

    Ok(Request { name, args })
}

/// Encodes a command the way clients send it, as an array of bulk strings.
pub fn encode_command<I, T>(parts: I) -> Vec<u8>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let frames = parts
        .into_iter()
        .map(|part| Frame::Bulk(Bytes::copy_from_slice(part.as_ref())))
        .collect();

    Frame::Array(frames).serialize()
}
