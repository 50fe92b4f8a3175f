// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The form-wide collaborator that fields consult.

use alloc::boxed::Box;

use crate::extras::Extras;
use crate::form_state::FormState;
use crate::path::ShapedPath;
use crate::validation::Validation;

/// A live registration of one field's validation with a [`FormContext`].
///
/// A field holds its registration from mount to unmount.
pub trait ValidationRegistration {
    /// Replaces the registered validation.
    fn replace(&mut self, validation: Validation);

    /// Ends the registration.
    fn unregister(self: Box<Self>);
}

/// Form-wide services shared by every field of a form.
///
/// [`Form`](crate::Form) provides the standard implementation;
/// [`DetachedContext`] is a stand-in for fields used without a form.
pub trait FormContext {
    /// Decides whether a node's errors should be shown.
    fn should_show_error(&self, extras: &Extras) -> bool;

    /// Registers `validation` for the node at the absolute `path`.
    fn register_validation(
        &self,
        path: &ShapedPath,
        validation: Validation,
    ) -> Box<dyn ValidationRegistration>;

    /// Post-processes a composite's committed form state before it is
    /// reported to the parent.
    ///
    /// `path` is the absolute path of the composite; `form_state` is rooted
    /// there.
    fn apply_change_to_node(&self, path: &ShapedPath, form_state: FormState) -> FormState;
}

/// A [`FormContext`] for fields that are not attached to a form.
///
/// Always shows errors, forgets registrations, and passes changes through.
#[derive(Copy, Clone, Debug, Default)]
pub struct DetachedContext;

#[derive(Debug)]
struct DetachedRegistration;

impl ValidationRegistration for DetachedRegistration {
    fn replace(&mut self, _validation: Validation) {}

    fn unregister(self: Box<Self>) {}
}

impl FormContext for DetachedContext {
    fn should_show_error(&self, _extras: &Extras) -> bool {
        true
    }

    fn register_validation(
        &self,
        _path: &ShapedPath,
        _validation: Validation,
    ) -> Box<dyn ValidationRegistration> {
        Box::new(DetachedRegistration)
    }

    fn apply_change_to_node(&self, _path: &ShapedPath, form_state: FormState) -> FormState {
        form_state
    }
}
