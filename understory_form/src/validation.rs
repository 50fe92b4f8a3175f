// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Validation and custom-change callbacks.
//!
//! Both are shared handles: cloning keeps the identity, and [`Validation::same`]
//! compares identities so a field can tell a replaced validation from an
//! unchanged one.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::value::Value;

type ValidationFn = dyn Fn(&Value) -> Vec<String>;
type CustomChangeFn = dyn Fn(&Value, &Value) -> Option<Value>;

/// A pure function from a node's value to its client errors.
///
/// An empty result means the value is valid.
#[derive(Clone)]
pub struct Validation(Rc<ValidationFn>);

impl Validation {
    /// Wraps a validation function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Vec<String> + 'static,
    {
        Self(Rc::new(f))
    }

    /// A validation that accepts every value.
    #[must_use]
    pub fn none() -> Self {
        Self::new(|_| Vec::new())
    }

    /// Runs the validation.
    #[must_use]
    pub fn run(&self, value: &Value) -> Vec<String> {
        (self.0)(value)
    }

    /// Returns `true` if both handles wrap the same function instance.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Validation {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Validation")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Rewrites a composite's proposed value after a child changed.
///
/// Called with the old value and the value computed from the child's change.
/// Returning `None` keeps the computed value.
#[derive(Clone)]
pub struct CustomChange(Rc<CustomChangeFn>);

impl CustomChange {
    /// Wraps a custom-change function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Option<Value> + 'static,
    {
        Self(Rc::new(f))
    }

    /// Runs the function.
    #[must_use]
    pub fn apply(&self, old: &Value, computed: &Value) -> Option<Value> {
        (self.0)(old, computed)
    }
}

impl fmt::Debug for CustomChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CustomChange")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}
