// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The change pipeline shared by [`ObjectField`](crate::ObjectField) and
//! [`ArrayField`](crate::ArrayField).

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use tracing::{debug, trace};

use crate::context::{FormContext, ValidationRegistration};
use crate::extras::{Extras, set_extras_touched};
use crate::form_state::FormState;
use crate::link::Link;
use crate::path::ShapedPath;
use crate::shaped_tree::ShapedTree;
use crate::validation::{CustomChange, Validation};
use crate::value::Value;

/// What a field hands to its renderer besides its links.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderInfo {
    /// The node has been touched.
    pub touched: bool,
    /// The node has been changed.
    pub changed: bool,
    /// The form context wants this node's errors shown.
    pub should_show_errors: bool,
    /// The node's client errors followed by its external errors.
    pub unfiltered_errors: Vec<String>,
    /// Always `false`; there is no asynchronous validation.
    pub async_validation_in_flight: bool,
    /// The whole subtree is validated and error-free.
    pub valid: bool,
    /// The node's value.
    pub value: Value,
}

impl RenderInfo {
    pub(crate) fn for_link(link: &Link, context: &dyn FormContext) -> Self {
        let state = link.form_state();
        let extras = state.extras();
        Self {
            touched: extras.meta.touched,
            changed: extras.meta.changed,
            should_show_errors: context.should_show_error(extras),
            unfiltered_errors: state.flat_root_errors(),
            async_validation_in_flight: false,
            valid: state.is_valid(),
            value: state.value().clone(),
        }
    }
}

/// Per-field state behind a composite field and the links it hands out.
///
/// Child links hold an `Rc` to this, so updating the validation or custom
/// change is seen by links created earlier.
pub(crate) struct Composite {
    context: Rc<dyn FormContext>,
    validation: RefCell<Validation>,
    custom_change: RefCell<Option<CustomChange>>,
    registration: RefCell<Option<Box<dyn ValidationRegistration>>>,
}

impl Composite {
    pub(crate) fn new(context: Rc<dyn FormContext>) -> Self {
        Self {
            context,
            validation: RefCell::new(Validation::none()),
            custom_change: RefCell::new(None),
            registration: RefCell::new(None),
        }
    }

    pub(crate) fn context(&self) -> &dyn FormContext {
        &*self.context
    }

    pub(crate) fn validation(&self) -> Validation {
        self.validation.borrow().clone()
    }

    pub(crate) fn set_validation(&self, validation: Validation) {
        if self.validation.borrow().same(&validation) {
            return;
        }
        if let Some(registration) = self.registration.borrow_mut().as_mut() {
            trace!("Replacing composite validation.");
            registration.replace(validation.clone());
        }
        *self.validation.borrow_mut() = validation;
    }

    pub(crate) fn set_custom_change(&self, custom_change: Option<CustomChange>) {
        *self.custom_change.borrow_mut() = custom_change;
    }

    pub(crate) fn is_mounted(&self) -> bool {
        self.registration.borrow().is_some()
    }

    /// Registers the validation at the link's path and runs it if the node
    /// is still pending.
    pub(crate) fn mount(&self, link: &Link) {
        if !self.is_mounted() {
            trace!(path = %link.path(), "Registering composite validation.");
            let registration = self
                .context
                .register_validation(link.path(), self.validation());
            *self.registration.borrow_mut() = Some(registration);
        }
        if link.extras().errors.client.is_pending() {
            let errors = self.validation().run(link.value());
            link.on_validation(ShapedPath::root(), errors);
        }
    }

    pub(crate) fn unmount(&self) {
        let registration = self.registration.borrow_mut().take();
        if let Some(registration) = registration {
            trace!("Unregistering composite validation.");
            registration.unregister();
        }
    }

    /// Runs a structurally computed state through the pipeline and reports
    /// the result upwards exactly once.
    pub(crate) fn commit(&self, link: &Link, computed: FormState) {
        let old = link.value();
        let custom_change = self.custom_change.borrow().clone();
        let state = match custom_change {
            Some(custom_change) if computed.value() != old => {
                match custom_change.apply(old, computed.value()) {
                    Some(value) if value != *computed.value() => {
                        debug!(
                            path = %link.path(),
                            "Custom change substituted the composite value."
                        );
                        computed.substitute_value(value)
                    }
                    _ => computed,
                }
            }
            _ => computed,
        };
        let state = state.validate(&self.validation()).set_changed();
        let state = self.context.apply_change_to_node(link.path(), state);
        trace!(path = %link.path(), "Committing composite change.");
        link.on_change(state);
    }

    /// Marks the composite touched and reports the blurred tree upwards.
    pub(crate) fn blur(&self, link: &Link, tree: ShapedTree<Extras>) {
        trace!(path = %link.path(), "Composite blurred.");
        link.on_blur(tree.map_root(set_extras_touched));
    }
}

impl fmt::Debug for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composite")
            .field("validation", &self.validation.borrow())
            .field("custom_change", &self.custom_change.borrow())
            .field("mounted", &self.is_mounted())
            .finish_non_exhaustive()
    }
}
