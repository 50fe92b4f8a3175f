// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The parent-to-child connection.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::extras::Extras;
use crate::form_state::FormState;
use crate::path::ShapedPath;
use crate::shaped_tree::ShapedTree;
use crate::value::Value;

type ChangeFn = dyn Fn(FormState);
type BlurFn = dyn Fn(ShapedTree<Extras>);
type ValidationFn = dyn Fn(ShapedPath, Vec<String>);

/// What a parent hands to one child: the child's slice of the form state, its
/// absolute path, and three callbacks that report back upwards.
///
/// - `on_change` receives the child's complete new form state.
/// - `on_blur` receives the child's new metadata tree.
/// - `on_validation` receives a path relative to the child and the client
///   errors computed for the node at that path.
///
/// Links are cheap to clone; the callbacks are shared.
#[derive(Clone)]
pub struct Link {
    form_state: FormState,
    path: ShapedPath,
    on_change: Rc<ChangeFn>,
    on_blur: Rc<BlurFn>,
    on_validation: Rc<ValidationFn>,
}

impl Link {
    /// Creates a root link over `form_state`.
    pub fn new(
        form_state: FormState,
        on_change: impl Fn(FormState) + 'static,
        on_blur: impl Fn(ShapedTree<Extras>) + 'static,
        on_validation: impl Fn(ShapedPath, Vec<String>) + 'static,
    ) -> Self {
        Self {
            form_state,
            path: ShapedPath::root(),
            on_change: Rc::new(on_change),
            on_blur: Rc::new(on_blur),
            on_validation: Rc::new(on_validation),
        }
    }

    /// Sets the absolute path of the node this link points at.
    #[must_use]
    pub fn at_path(mut self, path: ShapedPath) -> Self {
        self.path = path;
        self
    }

    /// Returns the child's form state.
    #[must_use]
    pub fn form_state(&self) -> &FormState {
        &self.form_state
    }

    /// Returns the child's value.
    #[must_use]
    pub fn value(&self) -> &Value {
        self.form_state.value()
    }

    /// Returns the child's metadata tree.
    #[must_use]
    pub fn tree(&self) -> &ShapedTree<Extras> {
        self.form_state.tree()
    }

    /// Returns the child's root metadata.
    #[must_use]
    pub fn extras(&self) -> &Extras {
        self.form_state.extras()
    }

    /// Returns the absolute path of the node this link points at.
    #[must_use]
    pub fn path(&self) -> &ShapedPath {
        &self.path
    }

    /// Reports a new form state for the child.
    pub fn on_change(&self, form_state: FormState) {
        (self.on_change)(form_state);
    }

    /// Reports a new metadata tree for the child.
    pub fn on_blur(&self, tree: ShapedTree<Extras>) {
        (self.on_blur)(tree);
    }

    /// Reports client errors for the node at `path`, relative to the child.
    pub fn on_validation(&self, path: ShapedPath, errors: Vec<String>) {
        (self.on_validation)(path, errors);
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("path", &self.path)
            .field("form_state", &self.form_state)
            .finish_non_exhaustive()
    }
}
