// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures for the field and form integration tests.

#![allow(
    dead_code,
    reason = "Each integration test binary uses a different subset of the fixtures."
)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use understory_form::{
    Extras, FormContext, FormState, Link, PathStep, ShapedPath, ShapedTree, Validation,
    ValidationRegistration, Value,
};

/// Everything a root link received.
#[derive(Default)]
pub(crate) struct Recorder {
    pub(crate) changes: RefCell<Vec<FormState>>,
    pub(crate) blurs: RefCell<Vec<ShapedTree<Extras>>>,
    pub(crate) validations: RefCell<Vec<(ShapedPath, Vec<String>)>>,
}

impl Recorder {
    pub(crate) fn change_count(&self) -> usize {
        self.changes.borrow().len()
    }

    pub(crate) fn last_change(&self) -> FormState {
        self.changes
            .borrow()
            .last()
            .cloned()
            .expect("no change was reported")
    }

    pub(crate) fn last_blur(&self) -> ShapedTree<Extras> {
        self.blurs
            .borrow()
            .last()
            .cloned()
            .expect("no blur was reported")
    }
}

/// A root link over `state` that records every upward call.
pub(crate) fn recording_link(state: FormState) -> (Link, Rc<Recorder>) {
    let recorder = Rc::new(Recorder::default());
    let on_change = {
        let recorder = Rc::clone(&recorder);
        move |next: FormState| recorder.changes.borrow_mut().push(next)
    };
    let on_blur = {
        let recorder = Rc::clone(&recorder);
        move |tree: ShapedTree<Extras>| recorder.blurs.borrow_mut().push(tree)
    };
    let on_validation = {
        let recorder = Rc::clone(&recorder);
        move |path: ShapedPath, errors: Vec<String>| {
            recorder.validations.borrow_mut().push((path, errors));
        }
    };
    (Link::new(state, on_change, on_blur, on_validation), recorder)
}

/// Counters shared between a [`CountingContext`] and the test.
#[derive(Default)]
pub(crate) struct Counts {
    pub(crate) registered: Cell<usize>,
    pub(crate) replaced: Cell<usize>,
    pub(crate) unregistered: Cell<usize>,
    pub(crate) registered_paths: RefCell<Vec<ShapedPath>>,
    pub(crate) applied_paths: RefCell<Vec<ShapedPath>>,
}

/// A context that counts registrations and passes changes through.
pub(crate) struct CountingContext {
    pub(crate) counts: Rc<Counts>,
    pub(crate) show_errors: bool,
}

impl CountingContext {
    pub(crate) fn new() -> (Rc<Self>, Rc<Counts>) {
        let counts = Rc::new(Counts::default());
        let context = Rc::new(Self {
            counts: Rc::clone(&counts),
            show_errors: true,
        });
        (context, counts)
    }
}

struct CountingRegistration {
    counts: Rc<Counts>,
}

impl ValidationRegistration for CountingRegistration {
    fn replace(&mut self, _validation: Validation) {
        self.counts.replaced.set(self.counts.replaced.get() + 1);
    }

    fn unregister(self: Box<Self>) {
        self.counts
            .unregistered
            .set(self.counts.unregistered.get() + 1);
    }
}

impl FormContext for CountingContext {
    fn should_show_error(&self, _extras: &Extras) -> bool {
        self.show_errors
    }

    fn register_validation(
        &self,
        path: &ShapedPath,
        _validation: Validation,
    ) -> Box<dyn ValidationRegistration> {
        self.counts.registered.set(self.counts.registered.get() + 1);
        self.counts.registered_paths.borrow_mut().push(path.clone());
        Box::new(CountingRegistration {
            counts: Rc::clone(&self.counts),
        })
    }

    fn apply_change_to_node(&self, path: &ShapedPath, form_state: FormState) -> FormState {
        self.counts.applied_paths.borrow_mut().push(path.clone());
        form_state
    }
}

/// A validation that counts its runs and fails with `message` when `fails`
/// holds for the value.
pub(crate) fn counted_validation(
    message: &'static str,
    fails: impl Fn(&Value) -> bool + 'static,
) -> (Validation, Rc<Cell<usize>>) {
    let runs = Rc::new(Cell::new(0));
    let counter = Rc::clone(&runs);
    let validation = Validation::new(move |value| {
        counter.set(counter.get() + 1);
        if fails(value) {
            vec![message.to_string()]
        } else {
            vec![]
        }
    });
    (validation, runs)
}

pub(crate) fn words(items: &[&str]) -> Value {
    Value::array(items.iter().map(|s| Value::from(*s)))
}

pub(crate) fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub(crate) fn path(steps: &[PathStep]) -> ShapedPath {
    steps.iter().cloned().collect()
}

pub(crate) fn get<'a>(value: &'a Value, key: &str) -> &'a Value {
    value
        .as_object()
        .and_then(|object| object.get(key))
        .expect("key is present")
}
