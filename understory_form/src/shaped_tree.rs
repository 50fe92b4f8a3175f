// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Persistent trees that mirror the shape of a [`Value`].

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::error::ShapeError;
use crate::path::{PathStep, ShapedPath};
use crate::value::{Shape, Value};

/// The children of a [`ShapedTree`] node.
pub enum Children<M> {
    /// No children; mirrors a scalar.
    Leaf,
    /// Keyed children, in the key order of the mirrored object.
    Object(Vec<(Arc<str>, ShapedTree<M>)>),
    /// Indexed children, one per mirrored array item.
    Array(Vec<ShapedTree<M>>),
}

impl<M> Children<M> {
    /// Returns the structural class of the node owning these children.
    #[must_use]
    pub fn shape(&self) -> Shape {
        match self {
            Self::Leaf => Shape::Leaf,
            Self::Object(_) => Shape::Object,
            Self::Array(_) => Shape::Array,
        }
    }
}

impl<M> Clone for Children<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Leaf => Self::Leaf,
            Self::Object(children) => Self::Object(children.clone()),
            Self::Array(children) => Self::Array(children.clone()),
        }
    }
}

impl<M: fmt::Debug> fmt::Debug for Children<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf => f.write_str("Leaf"),
            Self::Object(children) => f
                .debug_map()
                .entries(children.iter().map(|(k, v)| (k, v)))
                .finish(),
            Self::Array(children) => f.debug_list().entries(children).finish(),
        }
    }
}

impl<M: PartialEq> PartialEq for Children<M> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Leaf, Self::Leaf) => true,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            _ => false,
        }
    }
}

struct Node<M> {
    data: M,
    children: Children<M>,
}

/// An immutable tree carrying one `M` per node, shaped like a [`Value`].
///
/// Nodes are reference counted. Every update returns a new tree that shares
/// all untouched subtrees with the old one, which [`ptr_eq`](Self::ptr_eq)
/// observes.
///
/// # Example
///
/// ```rust
/// use understory_form::{ShapedTree, Value};
///
/// let value = Value::object([("a", Value::from(1)), ("b", Value::from(2))]);
/// let tree = ShapedTree::from_value(&value, || 0_u32);
///
/// let bumped = tree
///     .replace_object_child("a", ShapedTree::leaf(7))
///     .unwrap();
///
/// assert_eq!(*bumped.try_object_child("a").unwrap().data(), 7);
/// assert!(bumped
///     .try_object_child("b")
///     .unwrap()
///     .ptr_eq(tree.try_object_child("b").unwrap()));
/// ```
pub struct ShapedTree<M> {
    node: Arc<Node<M>>,
}

impl<M> Clone for ShapedTree<M> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
        }
    }
}

impl<M: fmt::Debug> fmt::Debug for ShapedTree<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapedTree")
            .field("data", &self.node.data)
            .field("children", &self.node.children)
            .finish()
    }
}

impl<M: PartialEq> PartialEq for ShapedTree<M> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.node.data == other.node.data && self.node.children == other.node.children)
    }
}

impl<M> ShapedTree<M> {
    /// Creates a node from its data and children.
    #[must_use]
    pub fn new(data: M, children: Children<M>) -> Self {
        Self {
            node: Arc::new(Node { data, children }),
        }
    }

    /// Creates a childless node.
    #[must_use]
    pub fn leaf(data: M) -> Self {
        Self::new(data, Children::Leaf)
    }

    /// Creates an object node.
    #[must_use]
    pub fn object(data: M, children: Vec<(Arc<str>, Self)>) -> Self {
        Self::new(data, Children::Object(children))
    }

    /// Creates an array node.
    #[must_use]
    pub fn array(data: M, children: Vec<Self>) -> Self {
        Self::new(data, Children::Array(children))
    }

    /// Builds a tree mirroring `value`, with `make` supplying each node's data.
    pub fn from_value(value: &Value, mut make: impl FnMut() -> M) -> Self {
        Self::build(value, &mut make)
    }

    fn build(value: &Value, make: &mut impl FnMut() -> M) -> Self {
        let data = make();
        let children = match value {
            Value::Object(object) => Children::Object(
                object
                    .iter()
                    .map(|(key, child)| (Arc::clone(key), Self::build(child, make)))
                    .collect(),
            ),
            Value::Array(items) => {
                Children::Array(items.iter().map(|item| Self::build(item, make)).collect())
            }
            _ => Children::Leaf,
        };
        Self::new(data, children)
    }

    /// Returns this node's data.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &M {
        &self.node.data
    }

    /// Returns this node's children.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &Children<M> {
        &self.node.children
    }

    /// Returns the structural class of this node.
    #[must_use]
    pub fn shape(&self) -> Shape {
        self.node.children.shape()
    }

    /// Returns `true` if both trees are the same allocation.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Returns the child under `key`.
    pub fn try_object_child(&self, key: &str) -> Result<&Self, ShapeError> {
        match &self.node.children {
            Children::Object(children) => children
                .iter()
                .find(|(k, _)| &**k == key)
                .map(|(_, child)| child)
                .ok_or_else(|| ShapeError::MissingKey { key: key.into() }),
            other => Err(ShapeError::ExpectedObject {
                found: other.shape(),
            }),
        }
    }

    /// Returns the child at `index`.
    pub fn try_array_child(&self, index: usize) -> Result<&Self, ShapeError> {
        let children = self.array_children()?;
        children.get(index).ok_or(ShapeError::IndexOutOfBounds {
            index,
            len: children.len(),
        })
    }

    /// Returns all children of an array node.
    pub fn array_children(&self) -> Result<&[Self], ShapeError> {
        match &self.node.children {
            Children::Array(children) => Ok(children),
            other => Err(ShapeError::ExpectedArray {
                found: other.shape(),
            }),
        }
    }

    /// Returns the child addressed by one step.
    pub fn child(&self, step: &PathStep) -> Result<&Self, ShapeError> {
        match step {
            PathStep::Object(key) => self.try_object_child(key),
            PathStep::Array(index) => self.try_array_child(*index),
        }
    }

    /// Returns the descendant addressed by `path`.
    pub fn get(&self, path: &ShapedPath) -> Result<&Self, ShapeError> {
        path.steps()
            .iter()
            .try_fold(self, |node, step| node.child(step))
    }

    /// Returns a node with this node's data and the given children.
    #[must_use]
    pub fn with_children(&self, children: Children<M>) -> Self
    where
        M: Clone,
    {
        Self::new(self.node.data.clone(), children)
    }

    /// Returns a node with new data and this node's children.
    #[must_use]
    pub fn with_data(&self, data: M) -> Self {
        Self::new(data, self.node.children.clone())
    }

    /// Returns a node whose data is `f` applied to this node's data.
    ///
    /// Children are shared.
    #[must_use]
    pub fn map_root(&self, f: impl FnOnce(&M) -> M) -> Self {
        self.with_data(f(&self.node.data))
    }

    /// Returns a tree with the child under `key` replaced.
    pub fn replace_object_child(&self, key: &str, child: Self) -> Result<Self, ShapeError>
    where
        M: Clone,
    {
        let Children::Object(children) = &self.node.children else {
            return Err(ShapeError::ExpectedObject {
                found: self.shape(),
            });
        };
        let idx = children
            .iter()
            .position(|(k, _)| &**k == key)
            .ok_or_else(|| ShapeError::MissingKey { key: key.into() })?;
        let mut children = children.clone();
        children[idx].1 = child;
        Ok(self.with_children(Children::Object(children)))
    }

    /// Returns a tree with the child at `index` replaced.
    pub fn replace_array_child(&self, index: usize, child: Self) -> Result<Self, ShapeError>
    where
        M: Clone,
    {
        let children = self.array_children()?;
        if index >= children.len() {
            return Err(ShapeError::IndexOutOfBounds {
                index,
                len: children.len(),
            });
        }
        let mut children = children.to_vec();
        children[index] = child;
        Ok(self.with_children(Children::Array(children)))
    }

    /// Returns a tree with the child addressed by one step replaced.
    pub fn replace_child(&self, step: &PathStep, child: Self) -> Result<Self, ShapeError>
    where
        M: Clone,
    {
        match step {
            PathStep::Object(key) => self.replace_object_child(key, child),
            PathStep::Array(index) => self.replace_array_child(*index, child),
        }
    }

    /// Returns a tree with the subtree at `path` replaced by `f` of it.
    ///
    /// Only the nodes along `path` are rebuilt.
    pub fn update_at(
        &self,
        path: &ShapedPath,
        f: impl FnOnce(&Self) -> Self,
    ) -> Result<Self, ShapeError>
    where
        M: Clone,
    {
        self.update_steps(path.steps(), f)
    }

    fn update_steps(
        &self,
        steps: &[PathStep],
        f: impl FnOnce(&Self) -> Self,
    ) -> Result<Self, ShapeError>
    where
        M: Clone,
    {
        match steps.split_first() {
            None => Ok(f(self)),
            Some((step, rest)) => {
                let child = self.child(step)?.update_steps(rest, f)?;
                self.replace_child(step, child)
            }
        }
    }

    /// Returns `true` if this tree has exactly the structure of `value`.
    ///
    /// Object keys must match as a set and in order; array lengths must match.
    #[must_use]
    pub fn matches_shape(&self, value: &Value) -> bool {
        match (&self.node.children, value) {
            (Children::Object(children), Value::Object(object)) => {
                children.len() == object.len()
                    && children
                        .iter()
                        .zip(object.iter())
                        .all(|((k, child), (key, v))| k == key && child.matches_shape(v))
            }
            (Children::Array(children), Value::Array(items)) => {
                children.len() == items.len()
                    && children
                        .iter()
                        .zip(items.iter())
                        .all(|(child, item)| child.matches_shape(item))
            }
            (Children::Leaf, v) => v.shape() == Shape::Leaf,
            _ => false,
        }
    }

    /// Returns `true` if `predicate` holds for every node's data.
    pub fn all(&self, predicate: &mut impl FnMut(&M) -> bool) -> bool {
        if !predicate(&self.node.data) {
            return false;
        }
        match &self.node.children {
            Children::Leaf => true,
            Children::Object(children) => children.iter().all(|(_, c)| c.all(predicate)),
            Children::Array(children) => children.iter().all(|c| c.all(predicate)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn sample() -> Value {
        Value::object([
            ("name", Value::from("Ada")),
            (
                "tags",
                Value::array([Value::from("a"), Value::from("b")]),
            ),
        ])
    }

    #[test]
    fn from_value_mirrors_structure() {
        let value = sample();
        let mut counter = 0;
        let tree = ShapedTree::from_value(&value, || {
            counter += 1;
            counter
        });

        assert!(tree.matches_shape(&value));
        assert_eq!(*tree.data(), 1);
        assert_eq!(tree.shape(), Shape::Object);
        let tags = tree.try_object_child("tags").unwrap();
        assert_eq!(tags.array_children().unwrap().len(), 2);
        assert_eq!(counter, 5);
    }

    #[test]
    fn shape_mismatch_is_detected() {
        let tree = ShapedTree::from_value(&sample(), || ());
        let shorter = Value::object([
            ("name", Value::from("Ada")),
            ("tags", Value::array([Value::from("a")])),
        ]);
        assert!(!tree.matches_shape(&shorter));
        assert!(!tree.matches_shape(&Value::Null));
    }

    #[test]
    fn replace_shares_siblings() {
        let tree = ShapedTree::from_value(&sample(), || 0);
        let next = tree.replace_object_child("name", ShapedTree::leaf(9)).unwrap();

        assert!(!next.ptr_eq(&tree));
        assert_eq!(*next.try_object_child("name").unwrap().data(), 9);
        assert!(next
            .try_object_child("tags")
            .unwrap()
            .ptr_eq(tree.try_object_child("tags").unwrap()));
    }

    #[test]
    fn addressing_errors() {
        let tree = ShapedTree::from_value(&sample(), || ());
        assert_eq!(
            tree.try_object_child("nope").unwrap_err(),
            ShapeError::MissingKey { key: "nope".into() }
        );
        assert_eq!(
            tree.try_array_child(0).unwrap_err(),
            ShapeError::ExpectedArray {
                found: Shape::Object
            }
        );
        let tags = tree.try_object_child("tags").unwrap();
        assert_eq!(
            tags.try_array_child(5).unwrap_err(),
            ShapeError::IndexOutOfBounds { index: 5, len: 2 }
        );
        assert!(tree.replace_array_child(0, ShapedTree::leaf(())).is_err());
    }

    #[test]
    fn update_at_rebuilds_only_the_spine() {
        let tree = ShapedTree::from_value(&sample(), || 0);
        let path: ShapedPath = [PathStep::key("tags"), PathStep::index(1)]
            .into_iter()
            .collect();

        let next = tree.update_at(&path, |node| node.map_root(|d| d + 1)).unwrap();
        assert_eq!(*next.get(&path).unwrap().data(), 1);

        let first: ShapedPath = [PathStep::key("tags"), PathStep::index(0)]
            .into_iter()
            .collect();
        assert!(next.get(&first).unwrap().ptr_eq(tree.get(&first).unwrap()));
        assert!(next
            .try_object_child("name")
            .unwrap()
            .ptr_eq(tree.try_object_child("name").unwrap()));

        let bad: ShapedPath = [PathStep::key("name"), PathStep::index(0)]
            .into_iter()
            .collect();
        assert!(tree.update_at(&bad, |n| n.clone()).is_err());
    }

    #[test]
    fn all_visits_every_node() {
        let tree = ShapedTree::array(1, vec![ShapedTree::leaf(2), ShapedTree::leaf(3)]);
        assert!(tree.all(&mut |d| *d > 0));
        assert!(!tree.all(&mut |d| *d != 3));
    }
}
