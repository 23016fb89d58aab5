use bytes::Bytes;
use glob_match::glob_match;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns every key, in insertion order. When a glob style `pattern` is given only the
/// matching keys are returned.
///
/// Ref: <https://redis.io/commands/keys>
#[derive(Debug, PartialEq)]
pub struct Keys {
    pub pattern: Option<String>,
}

impl Executable for Keys {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let store = store.lock();

        let res = store
            .keys()
            .filter(|key| match &self.pattern {
                Some(pattern) => glob_match(pattern, key),
                None => true,
            })
            .map(|key| Frame::Bulk(Bytes::from(key.to_string())))
            .collect();

        Ok(Frame::Array(res))
    }
}

impl TryFrom<&mut CommandParser> for Keys {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let pattern = if parser.has_next() {
            Some(parser.next_string()?)
        } else {
            None
        };

        Ok(Self { pattern })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{parse, Command};
    use crate::store::Entry;

    fn store() -> Store {
        let store = Store::new();
        {
            let mut store = store.lock();
            store.set("user:2".to_string(), Entry::parse("b"));
            store.set("session".to_string(), Entry::parse("c"));
            store.set("user:1".to_string(), Entry::parse("a"));
        }
        store
    }

    fn bulk(key: &str) -> Frame {
        Frame::Bulk(Bytes::from(key.to_string()))
    }

    #[test]
    fn all_keys() {
        let cmd = parse(&["KEYS"]).unwrap();
        assert_eq!(cmd, Command::Keys(Keys { pattern: None }));

        let result = cmd.exec(store()).unwrap();

        assert_eq!(
            result,
            Frame::Array(vec![bulk("user:2"), bulk("session"), bulk("user:1")])
        );
    }

    #[test]
    fn with_wildcard_pattern() {
        let cmd = parse(&["KEYS", "user:*"]).unwrap();
        assert_eq!(
            cmd,
            Command::Keys(Keys {
                pattern: Some(String::from("user:*"))
            })
        );

        let result = cmd.exec(store()).unwrap();

        assert_eq!(result, Frame::Array(vec![bulk("user:2"), bulk("user:1")]));
    }

    #[test]
    fn empty_store() {
        let result = parse(&["KEYS"]).unwrap().exec(Store::new()).unwrap();

        assert_eq!(result, Frame::Array(vec![]));
    }
}
