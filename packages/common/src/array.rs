//! # Array Diffing
//!
//! Computes an ordered edit script that turns one sequence into another.
//!
//! ## Algorithm
//!
//! 1. **Alignment**: a longest-common-subsequence table driven by the caller's
//!    comparator. `Equal` and `Compatible` pairs are both alignable. Among
//!    alignments of the same length, the one with the smallest total index
//!    displacement wins, then the one with the most `Equal` pairs.
//!    Displacement is summed as `|old_index - new_index|` over matched pairs.
//!    This is not the same as counting pairs that keep their index: matches
//!    displaced by {0, 3} lose to matches displaced by {1, 1}, even though
//!    the first keeps one item in place.
//! 2. **Move detection**: old and new items left over after the alignment are
//!    paired greedily (`Equal` before `Compatible`, nearest index first) so a
//!    reordered item becomes a move instead of a remove + insert.
//! 3. **Emission**: removes in descending old index, then a single pass over the
//!    new sequence emitting inserts and updates in ascending new index.
//!
//! Indices in the script are relative to the sequence as it stands after the
//! previous operations, so a script must be replayed in order.
//!
//! ```rust,ignore
//! let diff = diff_array(&old, &new, |a, b| if a == b { Similarity::Equal } else { Similarity::Incompatible });
//! let mut target = old.clone();
//! diff.patch(&mut target);
//! assert_eq!(target, new);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::trace;

/// Outcome of comparing an old item with a new one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Similarity {
    /// Identical. Aligned without an update unless it has to move.
    Equal,
    /// Same identity, possibly different contents. Aligned and reported as an update.
    Compatible,
    /// Cannot be aligned.
    Incompatible,
}

impl Similarity {
    pub fn is_alignable(self) -> bool {
        !matches!(self, Similarity::Incompatible)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayInsert<T> {
    pub index: usize,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayRemove<T> {
    pub index: usize,
    pub value: T,
}

/// A matched pair of items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayUpdate<T> {
    /// Position of the old item in the input sequence
    pub original_old_index: usize,
    /// Position of the old item when this update is applied
    pub old_index: usize,
    pub new_index: usize,
    pub old_value: T,
    pub new_value: T,
}

impl<T> ArrayUpdate<T> {
    pub fn is_move(&self) -> bool {
        self.old_index != self.new_index
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ArrayChange<T> {
    Insert(ArrayInsert<T>),
    Remove(ArrayRemove<T>),
    Update(ArrayUpdate<T>),
}

/// Callbacks for walking an edit script in order
pub trait ArrayDiffVisitor<T> {
    fn visit_insert(&mut self, _insert: &ArrayInsert<T>) {}

    fn visit_remove(&mut self, _remove: &ArrayRemove<T>) {}

    fn visit_update(&mut self, _update: &ArrayUpdate<T>) {}
}

/// Ordered edit script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayDiff<T> {
    pub changes: Vec<ArrayChange<T>>,
}

impl<T> ArrayDiff<T> {
    pub fn new(changes: Vec<ArrayChange<T>>) -> Self {
        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArrayChange<T>> {
        self.changes.iter()
    }

    pub fn inserts(&self) -> impl Iterator<Item = &ArrayInsert<T>> {
        self.changes.iter().filter_map(|change| match change {
            ArrayChange::Insert(insert) => Some(insert),
            _ => None,
        })
    }

    pub fn removes(&self) -> impl Iterator<Item = &ArrayRemove<T>> {
        self.changes.iter().filter_map(|change| match change {
            ArrayChange::Remove(remove) => Some(remove),
            _ => None,
        })
    }

    pub fn updates(&self) -> impl Iterator<Item = &ArrayUpdate<T>> {
        self.changes.iter().filter_map(|change| match change {
            ArrayChange::Update(update) => Some(update),
            _ => None,
        })
    }

    /// Dispatch every change to `visitor` in script order
    pub fn accept<V: ArrayDiffVisitor<T> + ?Sized>(&self, visitor: &mut V) {
        for change in &self.changes {
            match change {
                ArrayChange::Insert(insert) => visitor.visit_insert(insert),
                ArrayChange::Remove(remove) => visitor.visit_remove(remove),
                ArrayChange::Update(update) => visitor.visit_update(update),
            }
        }
    }
}

impl<T: Clone> ArrayDiff<T> {
    /// Replay the script onto `target`, which must hold the old sequence
    pub fn patch(&self, target: &mut Vec<T>) {
        for change in &self.changes {
            match change {
                ArrayChange::Insert(insert) => {
                    let index = insert.index.min(target.len());
                    target.insert(index, insert.value.clone());
                }
                ArrayChange::Remove(remove) => {
                    if remove.index < target.len() {
                        target.remove(remove.index);
                    }
                }
                ArrayChange::Update(update) => {
                    if update.old_index < target.len() {
                        target.remove(update.old_index);
                    }
                    let index = update.new_index.min(target.len());
                    target.insert(index, update.new_value.clone());
                }
            }
        }
    }
}

impl<T> Default for ArrayDiff<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Alignment score of a suffix pair, compared lexicographically.
/// Lower summed displacement ranks higher; see the module docs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
struct Score {
    matched: usize,
    displacement: Reverse<usize>,
    equal: usize,
}

impl Score {
    fn extend(self, old_index: usize, new_index: usize, similarity: Similarity) -> Self {
        Score {
            matched: self.matched + 1,
            displacement: Reverse(self.displacement.0 + old_index.abs_diff(new_index)),
            equal: self.equal + usize::from(similarity == Similarity::Equal),
        }
    }
}

/// Compute the edit script turning `old` into `new`
pub fn diff_array<T, F>(old: &[T], new: &[T], mut compare: F) -> ArrayDiff<T>
where
    T: Clone,
    F: FnMut(&T, &T) -> Similarity,
{
    let (old_len, new_len) = (old.len(), new.len());

    let mut similarities = Vec::with_capacity(old_len * new_len);
    for old_value in old {
        for new_value in new {
            similarities.push(compare(old_value, new_value));
        }
    }
    let similarity = |i: usize, j: usize| similarities[i * new_len + j];

    // by_new[j] = index of the old item paired with new[j]
    let mut by_new: Vec<Option<usize>> = vec![None; new_len];
    let mut matched_old = vec![false; old_len];

    // 1. alignment over suffixes
    let width = new_len + 1;
    let mut table = vec![Score::default(); (old_len + 1) * width];
    for i in (0..old_len).rev() {
        for j in (0..new_len).rev() {
            let mut best = table[(i + 1) * width + j].max(table[i * width + j + 1]);
            let sim = similarity(i, j);
            if sim.is_alignable() {
                best = best.max(table[(i + 1) * width + j + 1].extend(i, j, sim));
            }
            table[i * width + j] = best;
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < old_len && j < new_len {
        let here = table[i * width + j];
        let sim = similarity(i, j);
        if sim.is_alignable() && table[(i + 1) * width + j + 1].extend(i, j, sim) == here {
            by_new[j] = Some(i);
            matched_old[i] = true;
            i += 1;
            j += 1;
        } else if table[(i + 1) * width + j] == here {
            i += 1;
        } else {
            j += 1;
        }
    }

    // 2. moves
    let mut free_new: Vec<usize> = (0..new_len).filter(|&j| by_new[j].is_none()).collect();
    let unmatched_old: Vec<usize> = (0..old_len).filter(|&i| !matched_old[i]).collect();
    for i in unmatched_old {
        let candidate = free_new
            .iter()
            .enumerate()
            .filter(|(_, &j)| similarity(i, j).is_alignable())
            .min_by_key(|(_, &j)| (similarity(i, j) != Similarity::Equal, i.abs_diff(j)))
            .map(|(slot, &j)| (slot, j));

        if let Some((slot, j)) = candidate {
            free_new.remove(slot);
            by_new[j] = Some(i);
            matched_old[i] = true;
        }
    }

    // 3. emission
    let mut changes = Vec::new();
    let mut model: Vec<Option<usize>> = (0..old_len).map(Some).collect();

    for i in (0..old_len).rev().filter(|&i| !matched_old[i]) {
        model.remove(i);
        changes.push(ArrayChange::Remove(ArrayRemove {
            index: i,
            value: old[i].clone(),
        }));
    }

    for (j, pair) in by_new.iter().enumerate() {
        match *pair {
            None => {
                model.insert(j, None);
                changes.push(ArrayChange::Insert(ArrayInsert {
                    index: j,
                    value: new[j].clone(),
                }));
            }
            Some(i) => {
                let k = model
                    .iter()
                    .position(|entry| *entry == Some(i))
                    .unwrap_or(j);
                if k != j {
                    let entry = model.remove(k);
                    model.insert(j, entry);
                }
                if k != j || similarity(i, j) != Similarity::Equal {
                    changes.push(ArrayChange::Update(ArrayUpdate {
                        original_old_index: i,
                        old_index: k,
                        new_index: j,
                        old_value: old[i].clone(),
                        new_value: new[j].clone(),
                    }));
                }
            }
        }
    }

    trace!(
        old_len,
        new_len,
        changes = changes.len(),
        "array diff computed"
    );

    ArrayDiff::new(changes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_name(a: &&str, b: &&str) -> Similarity {
        if a == b {
            Similarity::Compatible
        } else {
            Similarity::Incompatible
        }
    }

    fn exact(a: &&str, b: &&str) -> Similarity {
        if a == b {
            Similarity::Equal
        } else {
            Similarity::Incompatible
        }
    }

    #[test]
    fn test_remove_update_insert_order() {
        let old = vec!["div", "span", "p"];
        let new = vec!["span", "p", "a"];

        let diff = diff_array(&old, &new, by_name);
        assert_eq!(diff.len(), 4);

        match &diff.changes[0] {
            ArrayChange::Remove(remove) => {
                assert_eq!(remove.index, 0);
                assert_eq!(remove.value, "div");
            }
            other => panic!("Expected remove, got {:?}", other),
        }
        match &diff.changes[1] {
            ArrayChange::Update(update) => {
                assert_eq!(update.new_value, "span");
                assert_eq!(update.original_old_index, 1);
                assert_eq!(update.old_index, 0);
                assert_eq!(update.new_index, 0);
            }
            other => panic!("Expected update, got {:?}", other),
        }
        match &diff.changes[2] {
            ArrayChange::Update(update) => {
                assert_eq!(update.new_value, "p");
                assert_eq!(update.original_old_index, 2);
                assert_eq!(update.new_index, 1);
            }
            other => panic!("Expected update, got {:?}", other),
        }
        match &diff.changes[3] {
            ArrayChange::Insert(insert) => {
                assert_eq!(insert.index, 2);
                assert_eq!(insert.value, "a");
            }
            other => panic!("Expected insert, got {:?}", other),
        }

        let mut target = old.clone();
        diff.patch(&mut target);
        assert_eq!(target, new);
    }

    #[test]
    fn test_equal_items_in_place_are_omitted() {
        let old = vec!["a", "b", "c"];
        let new = vec!["a", "x", "b", "c"];

        let diff = diff_array(&old, &new, exact);
        assert_eq!(diff.len(), 1);
        assert!(matches!(&diff.changes[0], ArrayChange::Insert(insert) if insert.index == 1));
    }

    #[test]
    fn test_identical_sequences_produce_empty_script() {
        let items = vec!["a", "b", "c"];
        assert!(diff_array(&items, &items, exact).is_empty());
    }

    #[test]
    fn test_reorder_is_reported_as_move() {
        let old = vec!["a", "b", "c"];
        let new = vec!["c", "a", "b"];

        let diff = diff_array(&old, &new, by_name);
        assert_eq!(diff.removes().count(), 0);
        assert_eq!(diff.inserts().count(), 0);

        let moves: Vec<_> = diff.updates().filter(|u| u.is_move()).collect();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].new_value, "c");
        assert_eq!(moves[0].old_index, 2);
        assert_eq!(moves[0].new_index, 0);

        let mut target = old.clone();
        diff.patch(&mut target);
        assert_eq!(target, new);
    }

    #[test]
    fn test_equal_items_that_move_are_reported() {
        let old = vec!["a", "b"];
        let new = vec!["b", "a"];

        let diff = diff_array(&old, &new, exact);
        assert_eq!(diff.updates().count(), 1);

        let mut target = old.clone();
        diff.patch(&mut target);
        assert_eq!(target, new);
    }

    #[test]
    fn test_prefers_unmoved_alignment() {
        // Either old "a" could pair with new "a"; the one at the same index wins
        let old = vec!["a", "b", "a"];
        let new = vec!["a"];

        let diff = diff_array(&old, &new, by_name);
        let removed: Vec<usize> = diff.removes().map(|r| r.index).collect();
        assert_eq!(removed, vec![2, 1]);

        let update = diff.updates().next().expect("update");
        assert_eq!(update.original_old_index, 0);
        assert!(!update.is_move());
    }

    #[test]
    fn test_alignment_minimises_summed_displacement() {
        // Pairing the "c"s as 1->0, 2->1 moves both by one. Keeping 1->1 in
        // place would send the other to 5, a larger total.
        let old = vec!["a", "c", "c"];
        let new = vec!["c", "c", "b", "b", "b", "c"];

        let diff = diff_array(&old, &new, exact);
        assert_eq!(diff.updates().count(), 0);
        let removed: Vec<usize> = diff.removes().map(|r| r.index).collect();
        assert_eq!(removed, vec![0]);
        let inserted: Vec<(usize, &str)> = diff.inserts().map(|i| (i.index, i.value)).collect();
        assert_eq!(inserted, vec![(2, "b"), (3, "b"), (4, "b"), (5, "c")]);

        let mut target = old.clone();
        diff.patch(&mut target);
        assert_eq!(target, new);
    }

    #[test]
    fn test_removes_are_descending() {
        let old = vec!["a", "b", "c", "d"];
        let new = vec!["b"];

        let diff = diff_array(&old, &new, exact);
        let removed: Vec<usize> = diff.removes().map(|r| r.index).collect();
        assert_eq!(removed, vec![3, 2, 0]);
    }

    #[test]
    fn test_empty_inputs() {
        let empty: Vec<&str> = vec![];
        let items = vec!["a", "b"];

        let diff = diff_array(&empty, &items, exact);
        assert_eq!(diff.inserts().count(), 2);

        let diff = diff_array(&items, &empty, exact);
        assert_eq!(diff.removes().count(), 2);

        assert!(diff_array(&empty, &empty, exact).is_empty());
    }

    #[test]
    fn test_accept_dispatches_in_order() {
        #[derive(Default)]
        struct Recorder(Vec<String>);

        impl ArrayDiffVisitor<&'static str> for Recorder {
            fn visit_insert(&mut self, insert: &ArrayInsert<&'static str>) {
                self.0.push(format!("insert {} {}", insert.index, insert.value));
            }
            fn visit_remove(&mut self, remove: &ArrayRemove<&'static str>) {
                self.0.push(format!("remove {}", remove.index));
            }
            fn visit_update(&mut self, update: &ArrayUpdate<&'static str>) {
                self.0.push(format!("update {} {}", update.old_index, update.new_index));
            }
        }

        let old = vec!["div", "span", "p"];
        let new = vec!["span", "p", "a"];
        let mut recorder = Recorder::default();
        diff_array(&old, &new, by_name).accept(&mut recorder);

        assert_eq!(
            recorder.0,
            vec!["remove 0", "update 0 0", "update 1 1", "insert 2 a"]
        );
    }

    #[test]
    fn test_script_serializes_with_type_tag() {
        let diff = diff_array(&["a"], &["b"], exact);
        let json = serde_json::to_value(&diff).unwrap();
        assert_eq!(json["changes"][0]["type"], "Remove");
        assert_eq!(json["changes"][1]["type"], "Insert");
    }
}
