// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A value paired with its metadata tree.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::array::{self, InsertSpan};
use crate::error::{ShapeError, fatal};
use crate::extras::{ClientErrors, Extras, Meta};
use crate::path::ShapedPath;
use crate::shaped_tree::{Children, ShapedTree};
use crate::validation::Validation;
use crate::value::{Object, Value};

/// A value and a [`ShapedTree`] of [`Extras`] with exactly the value's shape.
///
/// Every operation returns a new state and leaves `self` untouched. Nodes
/// that an operation does not address are shared with the input.
///
/// Child and array operations panic when the state does not have the shape
/// they require. Those are caller bugs, not recoverable conditions; the
/// path-addressed operations ([`get`](Self::get) and the `*_at` setters)
/// return [`ShapeError`] instead.
///
/// # Example
///
/// ```rust
/// use understory_form::{FormState, Value};
///
/// let state = FormState::new(Value::array([Value::from("one"), Value::from("two")]));
/// let moved = state.move_index(1, 0);
///
/// assert_eq!(
///     moved.value(),
///     &Value::array([Value::from("two"), Value::from("one")])
/// );
/// // The metadata moved with its item.
/// assert!(moved
///     .tree()
///     .try_array_child(0)
///     .unwrap()
///     .ptr_eq(state.tree().try_array_child(1).unwrap()));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FormState {
    value: Value,
    tree: ShapedTree<Extras>,
}

/// Builds a metadata tree for `value` with fresh extras at every node.
pub(crate) fn fresh_tree(value: &Value) -> ShapedTree<Extras> {
    ShapedTree::from_value(value, Extras::default)
}

impl FormState {
    /// Creates a state with fresh metadata for `value`.
    #[must_use]
    pub fn new(value: Value) -> Self {
        let tree = fresh_tree(&value);
        Self { value, tree }
    }

    /// Pairs a value with an existing metadata tree.
    ///
    /// # Panics
    ///
    /// Panics if `tree` does not mirror the shape of `value`.
    #[must_use]
    pub fn from_parts(value: Value, tree: ShapedTree<Extras>) -> Self {
        assert!(
            tree.matches_shape(&value),
            "metadata tree does not mirror the shape of its value"
        );
        Self { value, tree }
    }

    /// Returns the value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns the metadata tree.
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &ShapedTree<Extras> {
        &self.tree
    }

    /// Returns the root metadata.
    #[inline]
    #[must_use]
    pub fn extras(&self) -> &Extras {
        self.tree.data()
    }

    /// Splits the state into its value and tree.
    #[must_use]
    pub fn into_parts(self) -> (Value, ShapedTree<Extras>) {
        (self.value, self.tree)
    }

    /// Returns the state of the child under `key`.
    pub fn try_object_child(&self, key: &str) -> Result<Self, ShapeError> {
        let object = self.object()?;
        let value = object
            .get(key)
            .ok_or_else(|| ShapeError::MissingKey { key: key.into() })?;
        let tree = self.tree.try_object_child(key)?;
        Ok(Self {
            value: value.clone(),
            tree: tree.clone(),
        })
    }

    /// Returns the state of the child under `key`.
    ///
    /// # Panics
    ///
    /// Panics if this is not an object state or `key` is absent.
    #[must_use]
    #[track_caller]
    pub fn object_child(&self, key: &str) -> Self {
        self.try_object_child(key).unwrap_or_else(fatal)
    }

    /// Returns a state with the child under `key` replaced.
    ///
    /// # Panics
    ///
    /// Panics if this is not an object state or `key` is absent.
    #[must_use]
    #[track_caller]
    pub fn replace_object_child(&self, key: &str, child: Self) -> Self {
        let object = self.object().unwrap_or_else(fatal);
        let value = object
            .replaced(key, child.value)
            .unwrap_or_else(|| fatal(ShapeError::MissingKey { key: key.into() }));
        let tree = self
            .tree
            .replace_object_child(key, child.tree)
            .unwrap_or_else(fatal);
        Self {
            value: Value::Object(Arc::new(value)),
            tree,
        }
    }

    /// Returns the state of the item at `index`.
    pub fn try_array_child(&self, index: usize) -> Result<Self, ShapeError> {
        let (values, trees) = self.array_parts()?;
        match (values.get(index), trees.get(index)) {
            (Some(value), Some(tree)) => Ok(Self {
                value: value.clone(),
                tree: tree.clone(),
            }),
            _ => Err(ShapeError::IndexOutOfBounds {
                index,
                len: values.len(),
            }),
        }
    }

    /// Returns the state of the item at `index`.
    ///
    /// # Panics
    ///
    /// Panics if this is not an array state or `index` is out of bounds.
    #[must_use]
    #[track_caller]
    pub fn array_child(&self, index: usize) -> Self {
        self.try_array_child(index).unwrap_or_else(fatal)
    }

    /// Returns a state with the item at `index` replaced.
    ///
    /// # Panics
    ///
    /// Panics if this is not an array state or `index` is out of bounds.
    #[must_use]
    #[track_caller]
    pub fn replace_array_child(&self, index: usize, child: Self) -> Self {
        let (values, _) = self.array_parts().unwrap_or_else(fatal);
        if index >= values.len() {
            return fatal(ShapeError::IndexOutOfBounds {
                index,
                len: values.len(),
            });
        }
        let mut values = values.to_vec();
        values[index] = child.value;
        let tree = self
            .tree
            .replace_array_child(index, child.tree)
            .unwrap_or_else(fatal);
        Self {
            value: Value::Array(values.into()),
            tree,
        }
    }

    /// Inserts each span's values before the item at the span's original
    /// index. Inserted items get fresh metadata.
    ///
    /// # Panics
    ///
    /// Panics if this is not an array state or a span index is greater than
    /// the array length.
    #[must_use]
    #[track_caller]
    pub fn insert_spans(&self, spans: &[InsertSpan]) -> Self {
        self.modify(spans, |_, _| true)
    }

    /// Removes the items at the given indices.
    ///
    /// # Panics
    ///
    /// Panics if this is not an array state or an index is out of bounds.
    #[must_use]
    #[track_caller]
    pub fn remove_indices(&self, indices: &[usize]) -> Self {
        let (values, trees) = self.array_parts().unwrap_or_else(fatal);
        let keep = array::removal_mask(values.len(), indices);
        self.with_array(
            array::splice(values, &[], &keep),
            array::splice(trees, &[], &keep),
        )
    }

    /// Moves the item at `from`, with its metadata, so it ends up at `to`.
    ///
    /// # Panics
    ///
    /// Panics if this is not an array state or either index is out of bounds.
    #[must_use]
    #[track_caller]
    pub fn move_index(&self, from: usize, to: usize) -> Self {
        let (values, trees) = self.array_parts().unwrap_or_else(fatal);
        self.with_array(
            array::move_index(values, from, to),
            array::move_index(trees, from, to),
        )
    }

    /// Keeps the items for which `predicate(value, index)` holds.
    ///
    /// # Panics
    ///
    /// Panics if this is not an array state.
    #[must_use]
    #[track_caller]
    pub fn filter(&self, predicate: impl FnMut(&Value, usize) -> bool) -> Self {
        self.modify(&[], predicate)
    }

    /// Applies insertions and a filter in one pass.
    ///
    /// Span indices and the predicate's index both refer to the original
    /// array; inserted values are never filtered.
    ///
    /// # Panics
    ///
    /// Panics if this is not an array state or a span index is greater than
    /// the array length.
    #[must_use]
    #[track_caller]
    pub fn modify(
        &self,
        spans: &[InsertSpan],
        mut predicate: impl FnMut(&Value, usize) -> bool,
    ) -> Self {
        let (values, trees) = self.array_parts().unwrap_or_else(fatal);
        let keep: Vec<bool> = values
            .iter()
            .enumerate()
            .map(|(index, value)| predicate(value, index))
            .collect();
        let tree_spans: Vec<(usize, Vec<ShapedTree<Extras>>)> = spans
            .iter()
            .map(|(index, inserted)| (*index, inserted.iter().map(fresh_tree).collect()))
            .collect();
        self.with_array(
            array::splice(values, spans, &keep),
            array::splice(trees, &tree_spans, &keep),
        )
    }

    /// Marks the root as changed.
    #[must_use]
    pub fn set_changed(&self) -> Self {
        self.with_root(|extras| Extras {
            meta: Meta {
                changed: true,
                ..extras.meta
            },
            ..extras.clone()
        })
    }

    /// Marks the root as touched.
    #[must_use]
    pub fn set_touched(&self) -> Self {
        self.with_root(crate::extras::set_extras_touched)
    }

    /// Runs `validation` on the value and records the result as the root's
    /// client errors.
    #[must_use]
    pub fn validate(&self, validation: &Validation) -> Self {
        let errors = validation.run(&self.value);
        self.with_root(|extras| with_client_errors(extras, errors))
    }

    /// Returns `true` if every node has been validated and no node has client
    /// or external errors.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.tree.all(&mut Extras::is_clean)
    }

    /// Returns the root's client errors followed by its external errors.
    #[must_use]
    pub fn flat_root_errors(&self) -> Vec<String> {
        let errors = &self.extras().errors;
        errors
            .client
            .errors()
            .iter()
            .chain(&errors.external)
            .cloned()
            .collect()
    }

    /// Returns the state of the descendant at `path`.
    pub fn get(&self, path: &ShapedPath) -> Result<Self, ShapeError> {
        let tree = self.tree.get(path)?;
        // The tree mirrors the value, so the value lookup succeeds whenever
        // the tree lookup did.
        let value = self.value.get_path(path).ok_or(ShapeError::ExpectedObject {
            found: self.value.shape(),
        })?;
        Ok(Self {
            value: value.clone(),
            tree: tree.clone(),
        })
    }

    /// Returns a state with the metadata at `path` replaced by `f` of it.
    pub fn update_extras_at(
        &self,
        path: &ShapedPath,
        f: impl FnOnce(&Extras) -> Extras,
    ) -> Result<Self, ShapeError> {
        let tree = self.tree.update_at(path, |node| node.map_root(f))?;
        Ok(Self {
            value: self.value.clone(),
            tree,
        })
    }

    /// Records client errors for the node at `path`.
    pub fn set_client_errors_at(
        &self,
        path: &ShapedPath,
        errors: Vec<String>,
    ) -> Result<Self, ShapeError> {
        self.update_extras_at(path, |extras| with_client_errors(extras, errors))
    }

    /// Replaces the external errors of the node at `path`.
    pub fn set_external_errors_at(
        &self,
        path: &ShapedPath,
        errors: Vec<String>,
    ) -> Result<Self, ShapeError> {
        self.update_extras_at(path, |extras| {
            let mut next = extras.clone();
            next.errors.external = errors;
            next
        })
    }

    /// Returns a state holding `value`, reconciling the metadata tree with it.
    ///
    /// Subtrees whose value is unchanged keep their metadata and identity.
    /// Nodes whose value changed keep their flags and external errors but go
    /// back to pending client validation. Keys and indices that did not exist
    /// before get fresh metadata, and a node whose shape changed gets fresh
    /// children. Object children follow the key order of `value`.
    ///
    /// Array metadata is matched by position, not by item: reordering items
    /// leaves each index's metadata where it was.
    #[must_use]
    pub fn substitute_value(&self, value: Value) -> Self {
        let tree = reconcile(&self.tree, &self.value, &value);
        Self { value, tree }
    }

    /// Replaces the metadata tree, keeping the value.
    ///
    /// # Panics
    ///
    /// Panics if `tree` does not mirror the shape of the value.
    #[must_use]
    pub fn with_tree(&self, tree: ShapedTree<Extras>) -> Self {
        Self::from_parts(self.value.clone(), tree)
    }

    fn with_root(&self, f: impl FnOnce(&Extras) -> Extras) -> Self {
        Self {
            value: self.value.clone(),
            tree: self.tree.map_root(f),
        }
    }

    fn object(&self) -> Result<&Object, ShapeError> {
        self.value.as_object().ok_or(ShapeError::ExpectedObject {
            found: self.value.shape(),
        })
    }

    fn array_parts(&self) -> Result<(&[Value], &[ShapedTree<Extras>]), ShapeError> {
        let values = self.value.as_array().ok_or(ShapeError::ExpectedArray {
            found: self.value.shape(),
        })?;
        Ok((values, self.tree.array_children()?))
    }

    fn with_array(&self, values: Vec<Value>, trees: Vec<ShapedTree<Extras>>) -> Self {
        debug_assert_eq!(
            values.len(),
            trees.len(),
            "array plan produced misaligned values and metadata"
        );
        Self {
            value: Value::Array(values.into()),
            tree: self.tree.with_children(Children::Array(trees)),
        }
    }
}

fn with_client_errors(extras: &Extras, errors: Vec<String>) -> Extras {
    let mut next = extras.clone();
    next.errors.client = ClientErrors::Checked(errors);
    next
}

fn reconcile(tree: &ShapedTree<Extras>, old: &Value, new: &Value) -> ShapedTree<Extras> {
    let unchanged = old == new;
    // Object equality ignores key order; the tree must follow `new`'s order.
    if unchanged && (old.same(new) || tree.matches_shape(new)) {
        return tree.clone();
    }
    let data = if unchanged {
        tree.data().clone()
    } else {
        tree.data().stale()
    };
    let children = match (old, new, tree.children()) {
        (Value::Object(old), Value::Object(new), Children::Object(kids)) => Children::Object(
            new.iter()
                .map(|(key, value)| {
                    let kid = kids.iter().find(|(k, _)| k == key).map(|(_, kid)| kid);
                    let child = match (kid, old.get(key)) {
                        (Some(kid), Some(old_value)) => reconcile(kid, old_value, value),
                        _ => fresh_tree(value),
                    };
                    (Arc::clone(key), child)
                })
                .collect(),
        ),
        (Value::Array(old), Value::Array(new), Children::Array(kids)) => Children::Array(
            new.iter()
                .enumerate()
                .map(|(index, value)| match (kids.get(index), old.get(index)) {
                    (Some(kid), Some(old_value)) => reconcile(kid, old_value, value),
                    _ => fresh_tree(value),
                })
                .collect(),
        ),
        _ => return fresh_tree(new).with_data(data),
    };
    ShapedTree::new(data, children)
}
