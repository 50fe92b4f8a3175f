// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path-keyed registry of mounted fields' validations.

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::path::ShapedPath;
use crate::validation::Validation;
use crate::value::Value;

/// Identifies one registration within a [`ValidationRegistry`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

/// Validations of mounted fields, keyed by the fields' absolute paths.
///
/// More than one field may be mounted at the same path; their errors are
/// concatenated in registration order.
///
/// # Example
///
/// ```rust
/// use understory_form::{PathStep, ShapedPath, Validation, ValidationRegistry, Value};
///
/// let mut registry = ValidationRegistry::new();
/// let path = ShapedPath::root().child(PathStep::key("email"));
/// let id = registry.register(path.clone(), Validation::new(|v| {
///     if v.as_str().is_some_and(|s| s.contains('@')) {
///         vec![]
///     } else {
///         vec!["not an email".into()]
///     }
/// }));
///
/// assert_eq!(
///     registry.run(&path, &Value::from("nope")),
///     Some(vec!["not an email".to_string()])
/// );
/// assert!(registry.unregister(&path, id));
/// assert!(registry.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct ValidationRegistry {
    by_path: HashMap<ShapedPath, SmallVec<[(RegistrationId, Validation); 1]>>,
    next_id: u64,
}

impl ValidationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_path.values().map(SmallVec::len).sum()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// Registers `validation` at `path`.
    pub fn register(&mut self, path: ShapedPath, validation: Validation) -> RegistrationId {
        let id = RegistrationId(self.next_id);
        self.next_id += 1;
        self.by_path.entry(path).or_default().push((id, validation));
        id
    }

    /// Replaces the validation of a live registration.
    ///
    /// Returns `false` if the registration is unknown.
    pub fn replace(
        &mut self,
        path: &ShapedPath,
        id: RegistrationId,
        validation: Validation,
    ) -> bool {
        let Some(slot) = self
            .by_path
            .get_mut(path)
            .and_then(|entries| entries.iter_mut().find(|(i, _)| *i == id))
        else {
            return false;
        };
        slot.1 = validation;
        true
    }

    /// Removes a registration.
    ///
    /// Returns `false` if the registration is unknown.
    pub fn unregister(&mut self, path: &ShapedPath, id: RegistrationId) -> bool {
        let Some(entries) = self.by_path.get_mut(path) else {
            return false;
        };
        let Some(idx) = entries.iter().position(|(i, _)| *i == id) else {
            return false;
        };
        entries.remove(idx);
        if entries.is_empty() {
            self.by_path.remove(path);
        }
        true
    }

    /// Returns `true` if any validation is registered at `path`.
    #[must_use]
    pub fn is_registered(&self, path: &ShapedPath) -> bool {
        self.by_path.contains_key(path)
    }

    /// Returns clones of the validations registered at `path`.
    ///
    /// Callers run the clones, so a validation that touches the registry does
    /// not find it borrowed.
    #[must_use]
    pub fn validations(&self, path: &ShapedPath) -> Vec<Validation> {
        self.by_path
            .get(path)
            .map(|entries| entries.iter().map(|(_, v)| v.clone()).collect())
            .unwrap_or_default()
    }

    /// Runs every validation registered at `path` and concatenates the errors.
    ///
    /// Returns `None` if nothing is registered there.
    #[must_use]
    pub fn run(&self, path: &ShapedPath, value: &Value) -> Option<Vec<String>> {
        let entries = self.by_path.get(path)?;
        Some(entries.iter().flat_map(|(_, v)| v.run(value)).collect())
    }

    /// Returns every registered path, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<ShapedPath> {
        let mut paths: Vec<ShapedPath> = self.by_path.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Returns the registered paths strictly below `prefix`, sorted.
    #[must_use]
    pub fn descendants_of(&self, prefix: &ShapedPath) -> Vec<ShapedPath> {
        let mut paths: Vec<ShapedPath> = self
            .by_path
            .keys()
            .filter(|p| p.len() > prefix.len() && p.starts_with(prefix))
            .cloned()
            .collect();
        paths.sort();
        paths
    }
}
