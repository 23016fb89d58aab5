use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::{Entry, Store};
use crate::Error;

/// Returns the members of the set stored at `key`.
///
/// Ref: <https://redis.io/docs/latest/commands/smembers>
#[derive(Debug, PartialEq)]
pub struct Smembers {
    pub key: String,
}

impl Executable for Smembers {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let store = store.lock();

        match store.get(&self.key) {
            Some(entry) if matches!(entry, Entry::Set(_)) => Ok(Frame::from(entry)),
            Some(_) => Err(CommandError::WrongType.into()),
            None => Err(CommandError::KeyNotFound { key: self.key }.into()),
        }
    }
}

impl TryFrom<&mut CommandParser> for Smembers {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}
