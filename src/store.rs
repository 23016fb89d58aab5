use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::ops::Deref;
use std::slice;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::frame::Frame;
use crate::persistence::{PersistenceError, Snapshot, SnapshotFile};

/// The Store is responsible for managing key-value pairs. Keys are kept in the order they were
/// first inserted. The store is designed to be thread-safe, allowing it to be shared and cloned
/// cheaply using reference counting. Commands take the lock once and hold it for their whole
/// execution, so no two commands ever interleave.
#[derive(Clone)]
pub struct Store {
    inner: Arc<InnerStore>,
}

impl Store {
    pub fn new() -> Store {
        Self::from_snapshot(Vec::new(), None)
    }

    /// Builds a store holding the entries of `snapshot`. When a `snapshot_file` is given, SAVE
    /// and shutdown write to it.
    pub fn from_snapshot(snapshot: Snapshot, snapshot_file: Option<SnapshotFile>) -> Store {
        let mut state = State::default();
        for (key, entry) in snapshot {
            state.insert(key, entry);
        }

        let inner = Arc::new(InnerStore {
            state: Mutex::new(state),
            snapshot_file,
            snapshots_taken: AtomicU64::new(0),
            last_written: AsyncMutex::new(0),
        });

        Self { inner }
    }

    /// Spawns the snapshot write and returns right away. Updates acknowledged before the write
    /// lands are lost if the process dies in between.
    pub fn save_in_background(&self) -> Option<JoinHandle<()>> {
        if self.snapshot_file.is_none() {
            warn!("No snapshot file configured, nothing to save");
            return None;
        }

        let (generation, snapshot) = self.take_snapshot();
        let store = self.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = store.write_snapshot(generation, snapshot).await {
                error!("Failed to save snapshot: {}", e);
            }
        });

        Some(handle)
    }

    /// Writes the snapshot and waits for it to be on disk.
    pub async fn save(&self) -> Result<(), PersistenceError> {
        if self.snapshot_file.is_none() {
            return Ok(());
        }

        let (generation, snapshot) = self.take_snapshot();
        self.write_snapshot(generation, snapshot).await
    }

    fn take_snapshot(&self) -> (u64, Snapshot) {
        let state = self.lock();
        // Numbered while the lock is held, a higher number always holds newer data.
        let generation = self.snapshots_taken.fetch_add(1, Ordering::Relaxed) + 1;

        (generation, state.snapshot())
    }

    /// Writes are done one at a time, and a snapshot older than the one already on disk is
    /// dropped instead of written.
    async fn write_snapshot(
        &self,
        generation: u64,
        snapshot: Snapshot,
    ) -> Result<(), PersistenceError> {
        let Some(file) = &self.snapshot_file else {
            return Ok(());
        };

        let mut last_written = self.last_written.lock().await;
        if *last_written > generation {
            debug!(
                "Skipping snapshot {}, snapshot {} is already on disk",
                generation, *last_written
            );
            return Ok(());
        }

        file.save(&snapshot).await?;
        *last_written = generation;
        info!("Saved {} keys to {}", snapshot.len(), file.path().display());

        Ok(())
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

pub struct InnerStore {
    state: Mutex<State>,
    snapshot_file: Option<SnapshotFile>,
    snapshots_taken: AtomicU64,
    last_written: AsyncMutex<u64>,
}

pub struct InnerStoreLocked<'a> {
    state: MutexGuard<'a, State>,
}

impl<'a> InnerStoreLocked<'a> {
    pub fn set(&mut self, key: String, entry: Entry) {
        self.state.insert(key, entry);
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.state.keys.get(key).map(|(_, entry)| entry)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.state.keys.get_mut(key).map(|(_, entry)| entry)
    }

    pub fn remove(&mut self, key: &str) -> Option<Entry> {
        let (position, entry) = self.state.keys.remove(key)?;
        self.state.order.remove(&position);
        Some(entry)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.state.keys.contains_key(key)
    }

    pub fn size(&self) -> usize {
        self.state.keys.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.state.order.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entry)> {
        let keys = &self.state.keys;
        self.state
            .order
            .values()
            .filter_map(move |key| keys.get(key).map(|(_, entry)| (key, entry)))
    }

    pub fn snapshot(&self) -> Snapshot {
        self.iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }
}

impl Deref for Store {
    type Target = InnerStore;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl InnerStore {
    pub fn lock(&self) -> InnerStoreLocked<'_> {
        // A command that panicked mid-way never leaves a half-applied entry behind, so the data
        // behind a poisoned lock is still consistent.
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        InnerStoreLocked { state }
    }
}

type Key = String;

#[derive(Default)]
pub struct State {
    // Each key remembers its position in `order`.
    keys: HashMap<Key, (u64, Entry)>,
    order: BTreeMap<u64, Key>,
    next_position: u64,
}

impl State {
    fn insert(&mut self, key: Key, entry: Entry) {
        match self.keys.get_mut(&key) {
            // Overwriting a key keeps its original position.
            Some(slot) => slot.1 = entry,
            None => {
                let position = self.next_position;
                self.next_position += 1;
                self.order.insert(position, key.clone());
                self.keys.insert(key, (position, entry));
            }
        }
    }
}

/// A stored value. Once a key holds a set or a list, commands expecting another kind of value
/// fail on it instead of converting it.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    String(String),
    Number(Number),
    Set(Members),
    List(VecDeque<String>),
}

impl Entry {
    /// Interprets a value the way SET does: anything that reads as a number is stored as one.
    pub fn parse(value: &str) -> Entry {
        match Number::parse(value) {
            Some(number) => Entry::Number(number),
            None => Entry::String(value.to_string()),
        }
    }
}

/// Set members, in the order they were first added.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Members {
    order: Vec<String>,
    index: HashSet<String>,
}

impl Members {
    /// Adds `member` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, member: String) -> bool {
        if self.index.contains(&member) {
            return false;
        }

        self.index.insert(member.clone());
        self.order.push(member);
        true
    }

    pub fn contains(&self, member: &str) -> bool {
        self.index.contains(member)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, String> {
        self.order.iter()
    }
}

impl<S: Into<String>> Extend<S> for Members {
    fn extend<I: IntoIterator<Item = S>>(&mut self, members: I) {
        for member in members {
            self.insert(member.into());
        }
    }
}

impl<S: Into<String>> FromIterator<S> for Members {
    fn from_iter<I: IntoIterator<Item = S>>(members: I) -> Self {
        let mut set = Members::default();
        set.extend(members);
        set
    }
}

impl From<&Entry> for Frame {
    fn from(entry: &Entry) -> Self {
        let bulk = |s: &String| Frame::Bulk(Bytes::from(s.clone()));

        match entry {
            Entry::String(s) => bulk(s),
            Entry::Number(number) => Frame::from(*number),
            Entry::Set(members) => Frame::Set(members.iter().map(bulk).collect()),
            Entry::List(values) => Frame::Array(values.iter().map(bulk).collect()),
        }
    }
}

// 2^63, the smallest magnitude an i64 can't represent.
const INTEGER_LIMIT: f64 = 9_223_372_036_854_775_808.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Integer(i64),
    Double(f64),
}

impl Number {
    pub fn parse(text: &str) -> Option<Number> {
        if let Ok(integer) = text.parse::<i64>() {
            return Some(Number::Integer(integer));
        }

        let double = text.parse::<f64>().ok().filter(|d| d.is_finite())?;
        Some(Number::from_double(double))
    }

    /// Returns the number minus one. Integers that would overflow continue as doubles.
    pub fn decremented(self) -> Number {
        match self {
            Number::Integer(i) => i
                .checked_sub(1)
                .map(Number::Integer)
                .unwrap_or(Number::Double(i as f64 - 1.0)),
            Number::Double(d) => Number::from_double(d - 1.0),
        }
    }

    fn from_double(d: f64) -> Number {
        if d.fract() == 0.0 && d.abs() < INTEGER_LIMIT {
            Number::Integer(d as i64)
        } else {
            Number::Double(d)
        }
    }
}

impl From<Number> for Frame {
    fn from(number: Number) -> Self {
        match number {
            Number::Integer(i) => Frame::Integer(i),
            Number::Double(d) if d.fract() == 0.0 && d.abs() < INTEGER_LIMIT => {
                Frame::Integer(d as i64)
            }
            Number::Double(d) if d.fract() == 0.0 => Frame::BigNumber(format!("{:.0}", d)),
            Number::Double(d) => Frame::Double(d),
        }
    }
}
