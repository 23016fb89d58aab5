use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::{Entry, Store};
use crate::Error;

/// Decrements the number stored at key by one. The key must exist and hold a number.
///
/// Ref: <https://redis.io/docs/latest/commands/decr/>
#[derive(Debug, PartialEq)]
pub struct Decr {
    pub key: String,
}

impl Executable for Decr {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut store = store.lock();

        let number = match store.get_mut(&self.key) {
            Some(Entry::Number(number)) => number,
            Some(_) => return Err(CommandError::WrongType.into()),
            None => return Err(CommandError::KeyNotFound { key: self.key }.into()),
        };

        *number = number.decremented();

        Ok(Frame::from(*number))
    }
}

impl TryFrom<&mut CommandParser> for Decr {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;

        Ok(Self { key })
    }
}
