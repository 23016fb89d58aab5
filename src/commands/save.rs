use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Writes a snapshot of the store in the background. The reply doesn't wait for the write,
/// failures only show up in the server logs.
///
/// Ref: <https://redis.io/docs/latest/commands/bgsave>
#[derive(Debug, PartialEq)]
pub struct Save;

impl Executable for Save {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        store.save_in_background();
        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Save {
    type Error = Error;

    fn try_from(_parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self)
    }
}
