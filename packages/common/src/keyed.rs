//! Set/unset diffing for flat string-keyed maps.
//!
//! Keys are aligned with [`diff_array`](crate::array::diff_array) using key
//! identity: equal key and value is `Equal`, equal key with a different value
//! is `Compatible`, anything else is `Incompatible`.

use crate::array::{diff_array, ArrayDiffVisitor, ArrayInsert, ArrayRemove, ArrayUpdate, Similarity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum KeyedChange<V> {
    /// Key only present on the new side
    Insert { key: String, value: V },
    /// Key present on both sides with a different value
    Update { key: String, old_value: V, new_value: V },
    /// Key only present on the old side
    Remove { key: String, old_value: V },
}

impl<V> KeyedChange<V> {
    pub fn key(&self) -> &str {
        match self {
            KeyedChange::Insert { key, .. }
            | KeyedChange::Update { key, .. }
            | KeyedChange::Remove { key, .. } => key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedDiff<V> {
    pub changes: Vec<KeyedChange<V>>,
}

impl<V> KeyedDiff<V> {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyedChange<V>> {
        self.changes.iter()
    }
}

impl<V: Clone> KeyedDiff<V> {
    pub fn apply(&self, target: &mut BTreeMap<String, V>) {
        for change in &self.changes {
            match change {
                KeyedChange::Insert { key, value } => {
                    target.insert(key.clone(), value.clone());
                }
                KeyedChange::Update { key, new_value, .. } => {
                    target.insert(key.clone(), new_value.clone());
                }
                KeyedChange::Remove { key, .. } => {
                    target.remove(key);
                }
            }
        }
    }
}

struct KeyedCollector<V> {
    changes: Vec<KeyedChange<V>>,
}

impl<'a, V: Clone + PartialEq> ArrayDiffVisitor<(&'a String, &'a V)> for KeyedCollector<V> {
    fn visit_insert(&mut self, insert: &ArrayInsert<(&'a String, &'a V)>) {
        let (key, value) = insert.value;
        self.changes.push(KeyedChange::Insert {
            key: key.clone(),
            value: value.clone(),
        });
    }

    fn visit_remove(&mut self, remove: &ArrayRemove<(&'a String, &'a V)>) {
        let (key, old_value) = remove.value;
        self.changes.push(KeyedChange::Remove {
            key: key.clone(),
            old_value: old_value.clone(),
        });
    }

    fn visit_update(&mut self, update: &ArrayUpdate<(&'a String, &'a V)>) {
        let (key, old_value) = update.old_value;
        let (_, new_value) = update.new_value;
        if old_value != new_value {
            self.changes.push(KeyedChange::Update {
                key: key.clone(),
                old_value: old_value.clone(),
                new_value: new_value.clone(),
            });
        }
    }
}

/// Compute the set/unset edits turning `old` into `new`
pub fn diff_keyed<V>(old: &BTreeMap<String, V>, new: &BTreeMap<String, V>) -> KeyedDiff<V>
where
    V: Clone + PartialEq,
{
    let old_entries: Vec<(&String, &V)> = old.iter().collect();
    let new_entries: Vec<(&String, &V)> = new.iter().collect();

    let diff = diff_array(&old_entries, &new_entries, |(old_key, old_value), (new_key, new_value)| {
        if old_key != new_key {
            Similarity::Incompatible
        } else if old_value == new_value {
            Similarity::Equal
        } else {
            Similarity::Compatible
        }
    });

    let mut collector = KeyedCollector {
        changes: Vec::new(),
    };
    diff.accept(&mut collector);

    KeyedDiff {
        changes: collector.changes,
    }
}
