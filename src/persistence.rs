use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;
use tokio::fs;
use uuid::Uuid;

use crate::store::{Entry, Members, Number};

/// Every key of the store with its entry, in store order.
pub type Snapshot = Vec<(String, Entry)>;

#[derive(Debug, ThisError)]
pub enum PersistenceError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// A JSON file holding the whole store. It is read once at startup and rewritten wholesale.
#[derive(Clone, Debug)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> SnapshotFile {
        SnapshotFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the snapshot. A file that doesn't exist yet is an empty snapshot.
    pub async fn load(&self) -> Result<Snapshot, PersistenceError> {
        let contents = match fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        decode_snapshot(&contents)
    }

    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let contents = encode_snapshot(snapshot)?;

        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }

        // Readers only ever see a complete file.
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(format!(".{}.tmp", Uuid::new_v4()));
        let tmp = PathBuf::from(tmp);

        if let Err(e) = replace(&tmp, &self.path, contents).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        Ok(())
    }
}

async fn replace(tmp: &Path, path: &Path, contents: Vec<u8>) -> io::Result<()> {
    fs::write(tmp, contents).await?;
    fs::rename(tmp, path).await
}

pub fn encode_snapshot(snapshot: &Snapshot) -> Result<Vec<u8>, PersistenceError> {
    let mut object = Map::with_capacity(snapshot.len());
    for (key, entry) in snapshot {
        object.insert(key.clone(), serde_json::to_value(StoredValue::from(entry))?);
    }

    Ok(serde_json::to_vec_pretty(&Value::Object(object))?)
}

pub fn decode_snapshot(contents: &[u8]) -> Result<Snapshot, PersistenceError> {
    let object: Map<String, Value> = serde_json::from_slice(contents)?;

    object
        .into_iter()
        .map(|(key, value)| -> Result<_, PersistenceError> {
            let value: StoredValue = serde_json::from_value(value)?;
            Ok((key, Entry::from(value)))
        })
        .collect()
}

// Sets and lists are both sequences in JSON, they are wrapped in an object naming the kind.
// A bare array is accepted too and read as a list.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum StoredValue {
    Number(Number),
    String(String),
    Set { set: Vec<String> },
    List { list: VecDeque<String> },
    Array(VecDeque<String>),
}

impl From<&Entry> for StoredValue {
    fn from(entry: &Entry) -> Self {
        match entry {
            Entry::String(s) => StoredValue::String(s.clone()),
            Entry::Number(number) => StoredValue::Number(*number),
            Entry::Set(members) => StoredValue::Set {
                set: members.iter().cloned().collect(),
            },
            Entry::List(values) => StoredValue::List {
                list: values.clone(),
            },
        }
    }
}

impl From<StoredValue> for Entry {
    fn from(value: StoredValue) -> Self {
        match value {
            StoredValue::String(s) => Entry::String(s),
            StoredValue::Number(number) => Entry::Number(number),
            StoredValue::Set { set } => Entry::Set(set.into_iter().collect::<Members>()),
            StoredValue::List { list } | StoredValue::Array(list) => Entry::List(list),
        }
    }
}
