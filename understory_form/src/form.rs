// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The form coordinator: authoritative state, validation registry, feedback.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use tracing::{debug, trace, warn};

use crate::context::{FormContext, ValidationRegistration};
use crate::error::ShapeError;
use crate::extras::Extras;
use crate::feedback::FeedbackStrategy;
use crate::form_state::FormState;
use crate::link::Link;
use crate::path::ShapedPath;
use crate::registry::{RegistrationId, ValidationRegistry};
use crate::shaped_tree::ShapedTree;
use crate::validation::Validation;
use crate::value::Value;

/// Builder for a [`Form`].
#[derive(Clone, Debug)]
pub struct FormBuilder {
    initial: Value,
    feedback: FeedbackStrategy,
}

impl FormBuilder {
    /// Starts a form over `initial`.
    #[must_use]
    pub fn new(initial: Value) -> Self {
        Self {
            initial,
            feedback: FeedbackStrategy::default(),
        }
    }

    /// Sets when errors are shown. Defaults to [`FeedbackStrategy::Always`].
    #[must_use]
    pub fn feedback_strategy(mut self, strategy: FeedbackStrategy) -> Self {
        self.feedback = strategy;
        self
    }

    /// Builds the form.
    #[must_use]
    pub fn build(self) -> Form {
        Form {
            shared: Rc::new(FormShared {
                state: RefCell::new(FormState::new(self.initial)),
                registry: Rc::new(RefCell::new(ValidationRegistry::new())),
                feedback: self.feedback,
                submitted: Cell::new(false),
            }),
        }
    }
}

/// The root of a field tree.
///
/// A form owns the authoritative [`FormState`] and serves as the
/// [`FormContext`] of its fields: it records their validations by path,
/// revalidates stale descendants when a composite commits, and decides error
/// visibility with its [`FeedbackStrategy`].
///
/// Fields render from [`link`](Self::link). A link is a snapshot; after a
/// commit, take a fresh one.
///
/// # Example
///
/// ```rust
/// use understory_form::{Form, ObjectField, Validation, Value};
///
/// let form = Form::new(Value::object([("name", Value::from(""))]));
/// let mut person = ObjectField::new(form.context()).validation(Validation::new(|v| {
///     let name = v.as_object().and_then(|o| o.get("name")).and_then(Value::as_str);
///     if name.is_some_and(str::is_empty) {
///         vec!["name is required".into()]
///     } else {
///         vec![]
///     }
/// }));
///
/// person.mount(&form.link());
/// assert_eq!(form.form_state().flat_root_errors(), vec!["name is required".to_string()]);
///
/// let links = person.links(&form.link());
/// links["name"].on_change(understory_form::FormState::new(Value::from("Ada")));
/// assert!(form.form_state().flat_root_errors().is_empty());
/// ```
#[derive(Clone)]
pub struct Form {
    shared: Rc<FormShared>,
}

struct FormShared {
    state: RefCell<FormState>,
    registry: Rc<RefCell<ValidationRegistry>>,
    feedback: FeedbackStrategy,
    submitted: Cell<bool>,
}

impl Form {
    /// Creates a form over `initial` with the default feedback strategy.
    #[must_use]
    pub fn new(initial: Value) -> Self {
        FormBuilder::new(initial).build()
    }

    /// Returns a root link over the current state.
    #[must_use]
    pub fn link(&self) -> Link {
        let state = self.form_state();
        let on_change = {
            let shared = Rc::clone(&self.shared);
            move |next: FormState| shared.commit(next)
        };
        let on_blur = {
            let shared = Rc::clone(&self.shared);
            move |tree: ShapedTree<Extras>| shared.commit_tree(tree)
        };
        let on_validation = {
            let shared = Rc::clone(&self.shared);
            move |path: ShapedPath, errors: Vec<String>| shared.record_validation(&path, errors)
        };
        Link::new(state, on_change, on_blur, on_validation)
    }

    /// Returns this form as the context to hand to its fields.
    #[must_use]
    pub fn context(&self) -> Rc<dyn FormContext> {
        let shared: Rc<FormShared> = Rc::clone(&self.shared);
        shared
    }

    /// Returns the current state.
    #[must_use]
    pub fn form_state(&self) -> FormState {
        self.shared.state.borrow().clone()
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> Value {
        self.shared.state.borrow().value().clone()
    }

    /// Returns `true` if every node is validated and error-free.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.shared.state.borrow().is_valid()
    }

    /// Returns `true` once [`submit`](Self::submit) has been called.
    #[must_use]
    pub fn submitted(&self) -> bool {
        self.shared.submitted.get()
    }

    /// Marks the form submitted and returns whether it is valid.
    pub fn submit(&self) -> bool {
        self.shared.submitted.set(true);
        let valid = self.is_valid();
        debug!(valid, "Form submitted.");
        valid
    }

    /// Reruns every registered validation against the current state.
    ///
    /// Registrations whose path no longer exists are skipped.
    pub fn validate_all(&self) {
        let entries: Vec<(ShapedPath, Vec<Validation>)> = {
            let registry = self.shared.registry.borrow();
            registry
                .paths()
                .into_iter()
                .map(|path| {
                    let validations = registry.validations(&path);
                    (path, validations)
                })
                .collect()
        };
        let mut state = self.form_state();
        for (path, validations) in entries {
            match revalidate(&state, &path, &path, &validations) {
                Ok(next) => state = next,
                Err(err) => {
                    warn!(%path, %err, "Skipping validation of a path that no longer exists.");
                }
            }
        }
        *self.shared.state.borrow_mut() = state;
    }

    /// Replaces the external errors of the node at `path`.
    pub fn set_external_errors(
        &self,
        path: &ShapedPath,
        errors: Vec<String>,
    ) -> Result<(), ShapeError> {
        let next = self
            .shared
            .state
            .borrow()
            .set_external_errors_at(path, errors)?;
        *self.shared.state.borrow_mut() = next;
        Ok(())
    }

    /// Returns the number of live validation registrations.
    #[must_use]
    pub fn registration_count(&self) -> usize {
        self.shared.registry.borrow().len()
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("value", &self.value())
            .field("feedback", &self.shared.feedback)
            .field("submitted", &self.submitted())
            .finish_non_exhaustive()
    }
}

/// Runs `validations` against the node at `relative` and records the errors.
fn revalidate(
    state: &FormState,
    absolute: &ShapedPath,
    relative: &ShapedPath,
    validations: &[Validation],
) -> Result<FormState, ShapeError> {
    let node = state.get(relative)?;
    let errors: Vec<String> = validations
        .iter()
        .flat_map(|validation| validation.run(node.value()))
        .collect();
    trace!(path = %absolute, errors = errors.len(), "Revalidated node.");
    state.set_client_errors_at(relative, errors)
}

impl FormShared {
    fn commit(&self, next: FormState) {
        trace!("Form state committed.");
        *self.state.borrow_mut() = next;
    }

    fn commit_tree(&self, tree: ShapedTree<Extras>) {
        let mut state = self.state.borrow_mut();
        if tree.matches_shape(state.value()) {
            trace!("Form tree committed from blur.");
            *state = state.with_tree(tree);
        } else {
            warn!("Dropping blur for a tree that no longer matches the form value.");
        }
    }

    fn record_validation(&self, path: &ShapedPath, errors: Vec<String>) {
        let mut state = self.state.borrow_mut();
        match state.set_client_errors_at(path, errors) {
            Ok(next) => *state = next,
            Err(err) => {
                warn!(%path, %err, "Dropping validation result for a path that no longer exists.");
            }
        }
    }
}

impl FormContext for FormShared {
    fn should_show_error(&self, extras: &Extras) -> bool {
        self.feedback.should_show(extras, self.submitted.get())
    }

    fn register_validation(
        &self,
        path: &ShapedPath,
        validation: Validation,
    ) -> Box<dyn ValidationRegistration> {
        let id = self
            .registry
            .borrow_mut()
            .register(path.clone(), validation);
        trace!(%path, "Validation registered.");
        Box::new(RegistryHandle {
            registry: Rc::downgrade(&self.registry),
            path: path.clone(),
            id,
        })
    }

    fn apply_change_to_node(&self, path: &ShapedPath, form_state: FormState) -> FormState {
        let stale: Vec<(ShapedPath, Vec<Validation>)> = {
            let registry = self.registry.borrow();
            registry
                .descendants_of(path)
                .into_iter()
                .map(|descendant| {
                    let validations = registry.validations(&descendant);
                    (descendant, validations)
                })
                .collect()
        };
        let mut state = form_state;
        for (absolute, validations) in stale {
            let Some(relative) = absolute.strip_prefix(path) else {
                continue;
            };
            let pending = state
                .get(&relative)
                .is_ok_and(|node| node.extras().errors.client.is_pending());
            if !pending {
                continue;
            }
            if let Ok(next) = revalidate(&state, &absolute, &relative, &validations) {
                debug!(path = %absolute, "Revalidated stale descendant.");
                state = next;
            }
        }
        state
    }
}

/// A registration with a [`Form`]'s registry.
struct RegistryHandle {
    registry: Weak<RefCell<ValidationRegistry>>,
    path: ShapedPath,
    id: RegistrationId,
}

impl ValidationRegistration for RegistryHandle {
    fn replace(&mut self, validation: Validation) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().replace(&self.path, self.id, validation);
        }
    }

    fn unregister(self: Box<Self>) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().unregister(&self.path, self.id);
            trace!(path = %self.path, "Validation unregistered.");
        }
    }
}
