use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns all the arguments joined by a single space.
///
/// Ref: <https://redis.io/docs/latest/commands/echo>
#[derive(Debug, PartialEq)]
pub struct Echo {
    pub message: Vec<Bytes>,
}

impl Executable for Echo {
    fn exec(self, _store: Store) -> Result<Frame, Error> {
        let joined = self.message.join(&b" "[..]);
        Ok(Frame::Bulk(Bytes::from(joined)))
    }
}

impl TryFrom<&mut CommandParser> for Echo {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let message = parser.remaining_bytes();
        Ok(Self { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::parse;

    #[test]
    fn joins_arguments() {
        let result = parse(&["ECHO", "hello", "big", "world"])
            .unwrap()
            .exec(Store::new())
            .unwrap();

        assert_eq!(result, Frame::Bulk(Bytes::from("hello big world")));
    }

    #[test]
    fn no_arguments() {
        let result = parse(&["ECHO"]).unwrap().exec(Store::new()).unwrap();

        assert_eq!(result, Frame::Bulk(Bytes::new()));
    }
}
