// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paths into shaped values.

use alloc::sync::Arc;
use core::fmt;

use smallvec::SmallVec;

/// Inline capacity for path steps; most forms nest only a few levels deep.
const INLINE_STEPS: usize = 4;

/// One step from a composite node to one of its children.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathStep {
    /// The child stored under an object key.
    Object(Arc<str>),
    /// The child stored at an array index.
    Array(usize),
}

impl PathStep {
    /// Creates an object step.
    #[must_use]
    pub fn key(key: impl Into<Arc<str>>) -> Self {
        Self::Object(key.into())
    }

    /// Creates an array step.
    #[must_use]
    pub const fn index(index: usize) -> Self {
        Self::Array(index)
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(key) => write!(f, ".{key}"),
            Self::Array(index) => write!(f, "[{index}]"),
        }
    }
}

/// A root-to-descendant route through a shaped value.
///
/// The empty path addresses the root itself. Paths reported upwards through
/// [`Link::on_validation`](crate::Link::on_validation) grow at the front: each
/// composite prepends the step that leads to the reporting child.
///
/// # Example
///
/// ```rust
/// use understory_form::{PathStep, ShapedPath};
///
/// let leaf = ShapedPath::root().child(PathStep::key("name"));
/// let reported = leaf.prepend(PathStep::index(2)).prepend(PathStep::key("people"));
///
/// assert_eq!(reported.len(), 3);
/// assert_eq!(format!("{reported}"), "$.people[2].name");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapedPath {
    steps: SmallVec<[PathStep; INLINE_STEPS]>,
}

impl ShapedPath {
    /// Returns the empty path.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns the steps in root-to-leaf order.
    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` for the root path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns this path extended by one step at the end.
    #[must_use]
    pub fn child(&self, step: PathStep) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }

    /// Returns this path with `step` inserted at the front.
    #[must_use]
    pub fn prepend(mut self, step: PathStep) -> Self {
        self.steps.insert(0, step);
        self
    }

    /// Returns this path followed by `other`.
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        let mut steps = self.steps.clone();
        steps.extend(other.steps.iter().cloned());
        Self { steps }
    }

    /// Returns `true` if `prefix` is a (not necessarily strict) prefix of this path.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.steps.starts_with(&prefix.steps)
    }

    /// Returns the remainder of this path after `prefix`.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &Self) -> Option<Self> {
        self.steps
            .strip_prefix(prefix.steps.as_slice())
            .map(|rest| rest.iter().cloned().collect())
    }
}

impl FromIterator<PathStep> for ShapedPath {
    fn from_iter<I: IntoIterator<Item = PathStep>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ShapedPath {
    type Item = &'a PathStep;
    type IntoIter = core::slice::Iter<'a, PathStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl fmt::Display for ShapedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for step in &self.steps {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}
