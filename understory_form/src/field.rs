// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Leaf fields.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::fmt;

use tracing::trace;

use crate::composite::RenderInfo;
use crate::context::{FormContext, ValidationRegistration};
use crate::extras::set_extras_touched;
use crate::link::Link;
use crate::path::ShapedPath;
use crate::validation::Validation;
use crate::value::Value;

/// A field editing a single value, usually a scalar.
///
/// A leaf field has no child links. Editing it replaces its value, validates,
/// marks it changed, and reports the new state to its link.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use understory_form::{DetachedContext, Field, FormState, Link, Validation, Value};
///
/// let link = Link::new(
///     FormState::new(Value::from("")),
///     |next| {
///         assert!(next.extras().meta.changed);
///         assert_eq!(next.flat_root_errors(), Vec::<String>::new());
///     },
///     |_| {},
///     |_, _| {},
/// );
///
/// let field = Field::new(Rc::new(DetachedContext)).validation(Validation::new(|v| {
///     if v.as_str().is_some_and(str::is_empty) {
///         vec!["required".into()]
///     } else {
///         vec![]
///     }
/// }));
/// field.change(&link, Value::from("filled"));
/// ```
pub struct Field {
    context: Rc<dyn FormContext>,
    validation: Validation,
    registration: Option<Box<dyn ValidationRegistration>>,
}

impl Field {
    /// Creates a field with no validation.
    pub fn new(context: Rc<dyn FormContext>) -> Self {
        Self {
            context,
            validation: Validation::none(),
            registration: None,
        }
    }

    /// Sets the validation.
    #[must_use]
    pub fn validation(mut self, validation: Validation) -> Self {
        self.set_validation(validation);
        self
    }

    /// Registers the validation with the context and runs it if the node's
    /// client errors are pending.
    pub fn mount(&mut self, link: &Link) {
        if self.registration.is_none() {
            trace!(path = %link.path(), "Registering field validation.");
            self.registration = Some(
                self.context
                    .register_validation(link.path(), self.validation.clone()),
            );
        }
        if link.extras().errors.client.is_pending() {
            let errors = self.validation.run(link.value());
            link.on_validation(ShapedPath::root(), errors);
        }
    }

    /// Replaces the validation.
    ///
    /// The registration is only updated if `validation` is a different
    /// function instance.
    pub fn set_validation(&mut self, validation: Validation) {
        if self.validation.same(&validation) {
            return;
        }
        if let Some(registration) = &mut self.registration {
            registration.replace(validation.clone());
        }
        self.validation = validation;
    }

    /// Unregisters the validation. Does nothing if not mounted.
    pub fn unmount(&mut self) {
        if let Some(registration) = self.registration.take() {
            trace!("Unregistering field validation.");
            registration.unregister();
        }
    }

    /// Replaces the linked value and reports the result.
    ///
    /// Metadata is kept where the new value's shape allows.
    pub fn change(&self, link: &Link, value: Value) {
        let state = link
            .form_state()
            .substitute_value(value)
            .validate(&self.validation)
            .set_changed();
        let state = self.context.apply_change_to_node(link.path(), state);
        trace!(path = %link.path(), "Committing field change.");
        link.on_change(state);
    }

    /// Marks the linked node touched and reports its tree.
    pub fn blur(&self, link: &Link) {
        link.on_blur(link.tree().map_root(set_extras_touched));
    }

    /// Returns the node's render info.
    #[must_use]
    pub fn render_info(&self, link: &Link) -> RenderInfo {
        RenderInfo::for_link(link, &*self.context)
    }
}

impl Drop for Field {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("validation", &self.validation)
            .field("mounted", &self.registration.is_some())
            .finish_non_exhaustive()
    }
}
