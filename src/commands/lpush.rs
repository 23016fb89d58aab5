use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::{Entry, Store};
use crate::Error;

/// Inserts the values at the head of the list stored at `key`, creating it when missing. The
/// values keep the order they were given in, `LPUSH k a b` on `[x]` leaves `[a, b, x]`.
///
/// Ref: <https://redis.io/docs/latest/commands/lpush>
#[derive(Debug, PartialEq)]
pub struct Lpush {
    pub key: String,
    pub values: Vec<String>,
}

impl Executable for Lpush {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut store = store.lock();

        match store.get_mut(&self.key) {
            Some(Entry::List(list)) => {
                for value in self.values.into_iter().rev() {
                    list.push_front(value);
                }
            }
            Some(_) => return Err(CommandError::WrongType.into()),
            None => store.set(self.key, Entry::List(self.values.into())),
        }

        Ok(Frame::Integer(1))
    }
}

impl TryFrom<&mut CommandParser> for Lpush {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let values = parser.next_strings()?;

        Ok(Self { key, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::parse;
    use std::collections::VecDeque;

    fn list(values: &[&str]) -> Entry {
        Entry::List(values.iter().map(|v| v.to_string()).collect::<VecDeque<_>>())
    }

    #[test]
    fn new_key() {
        let store = Store::new();

        let result = parse(&["LPUSH", "queue", "a", "b"])
            .unwrap()
            .exec(store.clone())
            .unwrap();

        assert_eq!(result, Frame::Integer(1));
        assert_eq!(store.lock().get("queue"), Some(&list(&["a", "b"])));
    }

    #[test]
    fn prepends_in_argument_order() {
        let store = Store::new();
        store.lock().set("queue".to_string(), list(&["x"]));

        parse(&["LPUSH", "queue", "a", "b"])
            .unwrap()
            .exec(store.clone())
            .unwrap();

        assert_eq!(store.lock().get("queue"), Some(&list(&["a", "b", "x"])));
    }

    #[test]
    fn wrong_type() {
        let store = Store::new();
        store
            .lock()
            .set("queue".to_string(), Entry::Set(["x"].into_iter().collect()));

        let err = parse(&["LPUSH", "queue", "a"])
            .unwrap()
            .exec(store.clone())
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<CommandError>(),
            Some(&CommandError::WrongType)
        );
        assert_eq!(
            store.lock().get("queue"),
            Some(&Entry::Set(["x"].into_iter().collect()))
        );
    }
}
