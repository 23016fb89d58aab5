use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::{Entry, Store};
use crate::Error;

/// Adds the members to the set stored at `key`, creating it when missing.
///
/// Ref: <https://redis.io/docs/latest/commands/sadd>
#[derive(Debug, PartialEq)]
pub struct Sadd {
    pub key: String,
    pub members: Vec<String>,
}

impl Executable for Sadd {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut store = store.lock();

        match store.get_mut(&self.key) {
            Some(Entry::Set(set)) => set.extend(self.members),
            Some(_) => return Err(CommandError::WrongType.into()),
            None => store.set(self.key, Entry::Set(self.members.into_iter().collect())),
        }

        Ok(Frame::Integer(1))
    }
}

impl TryFrom<&mut CommandParser> for Sadd {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let members = parser.next_strings()?;

        Ok(Self { key, members })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{parse, Command};

    #[test]
    fn new_key() {
        let cmd = parse(&["SADD", "tags", "a", "b", "a"]).unwrap();
        assert_eq!(
            cmd,
            Command::Sadd(Sadd {
                key: "tags".to_string(),
                members: vec!["a".to_string(), "b".to_string(), "a".to_string()],
            })
        );

        let store = Store::new();
        assert_eq!(cmd.exec(store.clone()).unwrap(), Frame::Integer(1));

        assert_eq!(
            store.lock().get("tags"),
            Some(&Entry::Set(["a", "b"].into_iter().collect()))
        );
    }

    #[test]
    fn existing_set() {
        let store = Store::new();
        store
            .lock()
            .set("tags".to_string(), Entry::Set(["a"].into_iter().collect()));

        let result = parse(&["SADD", "tags", "b", "a"])
            .unwrap()
            .exec(store.clone())
            .unwrap();

        assert_eq!(result, Frame::Integer(1));
        assert_eq!(
            store.lock().get("tags"),
            Some(&Entry::Set(["a", "b"].into_iter().collect()))
        );
    }

    #[test]
    fn wrong_type() {
        let store = Store::new();
        store.lock().set("tags".to_string(), Entry::parse("text"));

        let err = parse(&["SADD", "tags", "a"])
            .unwrap()
            .exec(store.clone())
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<CommandError>(),
            Some(&CommandError::WrongType)
        );
        assert_eq!(
            store.lock().get("tags"),
            Some(&Entry::String("text".to_string()))
        );
    }

    #[test]
    fn missing_members() {
        let err = parse(&["SADD", "tags"]).unwrap_err();

        assert_eq!(
            err.downcast_ref::<CommandError>(),
            Some(&CommandError::WrongArity {
                command: "sadd".to_string()
            })
        );
    }
}
