// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape-invariant violations.

use alloc::sync::Arc;
use core::fmt;

use crate::value::Shape;

/// A form state was addressed in a way its shape does not allow.
///
/// This always indicates a caller bug (a stale key or index, or a metadata
/// tree that no longer mirrors its value), never bad user input. Operations
/// that cannot fail under their contract panic with this error's message;
/// path-addressed and `try_*` operations return it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShapeError {
    /// An object node has no child under `key`.
    MissingKey {
        /// The requested key.
        key: Arc<str>,
    },
    /// An array node has no child at `index`.
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// The number of children.
        len: usize,
    },
    /// An object step was applied to a node of another shape.
    ExpectedObject {
        /// The shape that was found instead.
        found: Shape,
    },
    /// An array step was applied to a node of another shape.
    ExpectedArray {
        /// The shape that was found instead.
        found: Shape,
    },
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKey { key } => write!(f, "key {key:?} is missing from the form state"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} is out of bounds for an array of length {len}")
            }
            Self::ExpectedObject { found } => write!(f, "expected an object node, found {found}"),
            Self::ExpectedArray { found } => write!(f, "expected an array node, found {found}"),
        }
    }
}

impl core::error::Error for ShapeError {}

/// Aborts on a shape-invariant violation.
#[track_caller]
pub(crate) fn fatal<T>(err: ShapeError) -> T {
    panic!("form state shape violation: {err}")
}
