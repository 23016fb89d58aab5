pub mod command;
pub mod decr;
pub mod del;
pub mod echo;
pub mod executable;
pub mod exists;
pub mod get;
pub mod keys;
pub mod len;
pub mod lpush;
pub mod ping;
pub mod rpush;
pub mod sadd;
pub mod save;
pub mod set;
pub mod smembers;

use bytes::Bytes;
use std::{str, vec};
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::request::{CommandName, Request};
use crate::store::Store;
use crate::Error;

use command::Command as Command_;
use decr::Decr;
use del::Del;
use echo::Echo;
use exists::Exists;
use get::Get;
use keys::Keys;
use len::Len;
use lpush::Lpush;
use ping::Ping;
use rpush::Rpush;
use sadd::Sadd;
use save::Save;
use set::Set;
use smembers::Smembers;

#[derive(Debug, PartialEq)]
pub enum Command {
    Decr(Decr),
    Del(Del),
    Exists(Exists),
    Get(Get),
    Keys(Keys),
    Len(Len),
    Lpush(Lpush),
    Rpush(Rpush),
    Sadd(Sadd),
    Set(Set),
    Smembers(Smembers),

    Command(Command_),
    Echo(Echo),
    Ping(Ping),
    Save(Save),
}

impl Executable for Command {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        match self {
            Command::Command(cmd) => cmd.exec(store),
            Command::Decr(cmd) => cmd.exec(store),
            Command::Del(cmd) => cmd.exec(store),
            Command::Echo(cmd) => cmd.exec(store),
            Command::Exists(cmd) => cmd.exec(store),
            Command::Get(cmd) => cmd.exec(store),
            Command::Keys(cmd) => cmd.exec(store),
            Command::Len(cmd) => cmd.exec(store),
            Command::Lpush(cmd) => cmd.exec(store),
            Command::Ping(cmd) => cmd.exec(store),
            Command::Rpush(cmd) => cmd.exec(store),
            Command::Sadd(cmd) => cmd.exec(store),
            Command::Save(cmd) => cmd.exec(store),
            Command::Set(cmd) => cmd.exec(store),
            Command::Smembers(cmd) => cmd.exec(store),
        }
    }
}

impl TryFrom<Request> for Command {
    type Error = Error;

    fn try_from(request: Request) -> Result<Self, Self::Error> {
        let parser = &mut CommandParser {
            command: request.name,
            parts: request.args.into_iter(),
        };

        match request.name {
            CommandName::Command => Command_::try_from(parser).map(Command::Command),
            CommandName::Decr => Decr::try_from(parser).map(Command::Decr),
            CommandName::Del => Del::try_from(parser).map(Command::Del),
            CommandName::Echo => Echo::try_from(parser).map(Command::Echo),
            CommandName::Exists => Exists::try_from(parser).map(Command::Exists),
            CommandName::Get => Get::try_from(parser).map(Command::Get),
            CommandName::Keys => Keys::try_from(parser).map(Command::Keys),
            CommandName::Len => Len::try_from(parser).map(Command::Len),
            CommandName::Lpush => Lpush::try_from(parser).map(Command::Lpush),
            CommandName::Ping => Ping::try_from(parser).map(Command::Ping),
            CommandName::Rpush => Rpush::try_from(parser).map(Command::Rpush),
            CommandName::Sadd => Sadd::try_from(parser).map(Command::Sadd),
            CommandName::Save => Save::try_from(parser).map(Command::Save),
            CommandName::Set => Set::try_from(parser).map(Command::Set),
            CommandName::Smembers => Smembers::try_from(parser).map(Command::Smembers),
        }
    }
}

struct CommandParser {
    command: CommandName,
    parts: vec::IntoIter<Bytes>,
}

impl CommandParser {
    fn next_bytes(&mut self) -> Result<Bytes, CommandError> {
        self.parts.next().ok_or_else(|| CommandError::WrongArity {
            command: self.command.as_ref().to_lowercase(),
        })
    }

    fn next_string(&mut self) -> Result<String, CommandError> {
        let bytes = self.next_bytes()?;

        str::from_utf8(&bytes[..])
            .map(|s| s.to_string())
            .map_err(CommandError::InvalidUTF8String)
    }

    /// Consumes the remaining arguments, which must be at least one.
    fn next_strings(&mut self) -> Result<Vec<String>, CommandError> {
        let mut strings = vec![];

        loop {
            match self.next_string() {
                Ok(string) => strings.push(string),
                Err(CommandError::WrongArity { .. }) if !strings.is_empty() => {
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(strings)
    }

    fn remaining_bytes(&mut self) -> Vec<Bytes> {
        self.parts.by_ref().collect()
    }

    fn has_next(&self) -> bool {
        self.parts.len() > 0
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub enum CommandError {
    #[error("wrong number of arguments for '{command}' command")]
    WrongArity { command: String },
    #[error("key: {key} not found")]
    KeyNotFound { key: String },
    #[error("Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("protocol error; invalid UTF-8 string")]
    InvalidUTF8String(#[from] str::Utf8Error),
}

impl CommandError {
    /// The prefix of the error reply, telling clients which kind of failure happened.
    pub fn tag(&self) -> &'static str {
        match self {
            CommandError::KeyNotFound { .. } => "KEYERROR",
            CommandError::WrongType => "WRONGTYPE",
            CommandError::WrongArity { .. } | CommandError::InvalidUTF8String(_) => "ERR",
        }
    }
}

#[cfg(test)]
pub(crate) fn parse(parts: &[&str]) -> Result<Command, Error> {
    let message = crate::request::encode_command(parts);
    let request = crate::request::decode_command(&message)?;

    Command::try_from(request)
}
