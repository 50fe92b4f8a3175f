// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Positional edits shared by array values and their metadata trees.
//!
//! Every edit is expressed against the indices of the original sequence, so
//! running the same plan over the values and over the tree children keeps the
//! two aligned.

use alloc::vec::Vec;

use crate::value::Value;

/// Values to insert before the item at `index` of the original array.
///
/// An index equal to the array length appends.
pub type InsertSpan = (usize, Vec<Value>);

/// Rebuilds `items`, keeping the original items whose `keep` flag is set and
/// inserting each span's items before the original item at its index.
///
/// Spans are ordered by index; spans sharing an index keep their given order.
///
/// # Panics
///
/// Panics if `keep` does not have one flag per item, or if a span index is
/// greater than `items.len()`.
pub(crate) fn splice<T: Clone>(items: &[T], spans: &[(usize, Vec<T>)], keep: &[bool]) -> Vec<T> {
    let len = items.len();
    assert_eq!(keep.len(), len, "keep mask must have one flag per item");

    let mut ordered: Vec<&(usize, Vec<T>)> = spans.iter().collect();
    ordered.sort_by_key(|span| span.0);
    if let Some(last) = ordered.last() {
        assert!(
            last.0 <= len,
            "insert index {} is out of bounds for an array of length {len}",
            last.0
        );
    }

    let inserted: usize = ordered.iter().map(|span| span.1.len()).sum();
    let mut out = Vec::with_capacity(len + inserted);
    let mut pending = ordered.into_iter().peekable();
    for (index, (item, kept)) in items.iter().zip(keep).enumerate() {
        while let Some(span) = pending.next_if(|span| span.0 == index) {
            out.extend_from_slice(&span.1);
        }
        if *kept {
            out.push(item.clone());
        }
    }
    for span in pending {
        out.extend_from_slice(&span.1);
    }
    out
}

/// Returns a keep mask with the given indices cleared.
///
/// # Panics
///
/// Panics if an index is out of bounds.
pub(crate) fn removal_mask(len: usize, indices: &[usize]) -> Vec<bool> {
    let mut keep = alloc::vec![true; len];
    for &index in indices {
        assert!(
            index < len,
            "remove index {index} is out of bounds for an array of length {len}"
        );
        keep[index] = false;
    }
    keep
}

/// Moves the item at `from` so that it ends up at `to`.
///
/// # Panics
///
/// Panics if either index is out of bounds.
pub(crate) fn move_index<T: Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    let len = items.len();
    assert!(
        from < len && to < len,
        "move from {from} to {to} is out of bounds for an array of length {len}"
    );
    let mut out = items.to_vec();
    let item = out.remove(from);
    out.insert(to, item);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn words(items: &[&'static str]) -> Vec<&'static str> {
        items.to_vec()
    }

    #[test]
    fn insert_at_original_indices() {
        let items = words(&["one", "two", "three"]);
        let spans = vec![
            (0, words(&["negative one", "zero"])),
            (3, words(&["four", "five"])),
        ];
        let out = splice(&items, &spans, &[true; 3]);
        assert_eq!(
            out,
            words(&["negative one", "zero", "one", "two", "three", "four", "five"])
        );
    }

    #[test]
    fn unsorted_spans_at_same_index_keep_order() {
        let items = words(&["a", "b"]);
        let spans = vec![(1, words(&["x"])), (0, words(&["p"])), (1, words(&["y"]))];
        let out = splice(&items, &spans, &[true; 2]);
        assert_eq!(out, words(&["p", "a", "x", "y", "b"]));
    }

    #[test]
    fn filter_applies_to_original_items_only() {
        let items = words(&["one", "two", "three"]);
        let spans = vec![(0, words(&["start"])), (2, words(&["middle", "content"]))];
        let keep = [false, true, true];
        let out = splice(&items, &spans, &keep);
        assert_eq!(out, words(&["start", "two", "middle", "content", "three"]));
    }

    #[test]
    fn remove_and_move() {
        let items = words(&["one", "two", "three"]);
        assert_eq!(
            splice(&items, &[], &removal_mask(3, &[1])),
            words(&["one", "three"])
        );
        assert_eq!(move_index(&items, 2, 1), words(&["one", "three", "two"]));
        assert_eq!(move_index(&items, 0, 2), words(&["two", "three", "one"]));
    }

    #[test]
    #[should_panic(expected = "insert index 4 is out of bounds")]
    fn insert_past_end_panics() {
        let items = words(&["one", "two", "three"]);
        let _ = splice(&items, &[(4, words(&["x"]))], &[true; 3]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn move_out_of_bounds_panics() {
        let _ = move_index(&words(&["one"]), 0, 1);
    }
}
