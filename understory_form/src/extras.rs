// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node form metadata.

use alloc::string::String;
use alloc::vec::Vec;

/// The outcome of a node's client-side validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ClientErrors {
    /// The node's validation has not run against its current value.
    #[default]
    Pending,
    /// The node's validation ran and produced these errors (possibly none).
    Checked(Vec<String>),
}

impl ClientErrors {
    /// Returns `true` while validation has not run.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns the checked errors; empty while pending.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        match self {
            Self::Pending => &[],
            Self::Checked(errors) => errors,
        }
    }
}

/// Client and external errors for one node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Errors {
    /// Errors from the node's own validation function.
    pub client: ClientErrors,
    /// Errors injected from outside the tree, such as a server response.
    ///
    /// Client revalidation never touches these.
    pub external: Vec<String>,
}

/// Interaction flags for one node.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Meta {
    /// The node, or a descendant, has been blurred.
    pub touched: bool,
    /// The node's value has been edited.
    pub changed: bool,
}

/// Everything a [`ShapedTree`](crate::ShapedTree) node records about its value.
///
/// The default is the metadata of a freshly created node: client validation
/// pending, no external errors, untouched, unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Extras {
    /// Validation state.
    pub errors: Errors,
    /// Interaction flags.
    pub meta: Meta,
}

impl Extras {
    /// Returns `true` if validation has run and nothing, client or external, failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        match &self.errors.client {
            ClientErrors::Pending => false,
            ClientErrors::Checked(errors) => errors.is_empty() && self.errors.external.is_empty(),
        }
    }

    /// Returns a copy whose client errors are `Pending` again.
    ///
    /// Flags and external errors are kept.
    #[must_use]
    pub(crate) fn stale(&self) -> Self {
        Self {
            errors: Errors {
                client: ClientErrors::Pending,
                external: self.errors.external.clone(),
            },
            meta: self.meta,
        }
    }
}

/// Returns `extras` with `meta.touched` set.
#[must_use]
pub fn set_extras_touched(extras: &Extras) -> Extras {
    Extras {
        meta: Meta {
            touched: true,
            ..extras.meta
        },
        ..extras.clone()
    }
}
