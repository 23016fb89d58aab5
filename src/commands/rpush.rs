use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::{Entry, Store};
use crate::Error;

/// Appends the values to the list stored at `key`, creating it when missing.
///
/// Ref: <https://redis.io/docs/latest/commands/rpush>
#[derive(Debug, PartialEq)]
pub struct Rpush {
    pub key: String,
    pub values: Vec<String>,
}

impl Executable for Rpush {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut store = store.lock();

        match store.get_mut(&self.key) {
            Some(Entry::List(list)) => list.extend(self.values),
            Some(_) => return Err(CommandError::WrongType.into()),
            None => store.set(self.key, Entry::List(self.values.into())),
        }

        Ok(Frame::Integer(1))
    }
}

impl TryFrom<&mut CommandParser> for Rpush {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let values = parser.next_strings()?;

        Ok(Self { key, values })
    }
}
