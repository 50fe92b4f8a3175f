// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composite fields over array values.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::array::InsertSpan;
use crate::composite::{Composite, RenderInfo};
use crate::context::FormContext;
use crate::error::{ShapeError, fatal};
use crate::extras::Extras;
use crate::form_state::FormState;
use crate::link::Link;
use crate::path::{PathStep, ShapedPath};
use crate::shaped_tree::ShapedTree;
use crate::validation::{CustomChange, Validation};
use crate::value::Value;

/// A composite field whose value is an array.
///
/// Works like [`ObjectField`](crate::ObjectField), keyed by index, and adds
/// structural operations through [`ArrayOps`].
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use understory_form::{ArrayField, DetachedContext, FormState, Link, Value};
///
/// let committed = Rc::new(RefCell::new(None));
/// let sink = Rc::clone(&committed);
/// let link = Link::new(
///     FormState::new(Value::array([Value::from("one"), Value::from("two")])),
///     move |next| *sink.borrow_mut() = Some(next),
///     |_| {},
///     |_, _| {},
/// );
///
/// let field = ArrayField::new(Rc::new(DetachedContext));
/// field.render(&link, |links, ops, _info| {
///     assert_eq!(links.len(), 2);
///     ops.add_field(2, Value::from("three"));
/// });
///
/// let next = committed.borrow_mut().take().unwrap();
/// assert_eq!(next.value().as_array().map(<[Value]>::len), Some(3));
/// ```
#[derive(Debug)]
pub struct ArrayField {
    core: Rc<Composite>,
}

impl ArrayField {
    /// Creates a field with no validation and no custom change.
    pub fn new(context: Rc<dyn FormContext>) -> Self {
        Self {
            core: Rc::new(Composite::new(context)),
        }
    }

    /// Sets the validation run against the whole array.
    #[must_use]
    pub fn validation(self, validation: Validation) -> Self {
        self.core.set_validation(validation);
        self
    }

    /// Sets the hook that may rewrite the array after a child or structural
    /// change.
    #[must_use]
    pub fn custom_change(self, custom_change: CustomChange) -> Self {
        self.core.set_custom_change(Some(custom_change));
        self
    }

    /// Registers the validation with the context and runs it if the node's
    /// client errors are pending.
    pub fn mount(&mut self, link: &Link) {
        self.core.mount(link);
    }

    /// Replaces the validation.
    ///
    /// The registration is only updated if `validation` is a different
    /// function instance.
    pub fn set_validation(&mut self, validation: Validation) {
        self.core.set_validation(validation);
    }

    /// Replaces or clears the custom-change hook.
    pub fn set_custom_change(&mut self, custom_change: Option<CustomChange>) {
        self.core.set_custom_change(custom_change);
    }

    /// Unregisters the validation. Does nothing if not mounted.
    pub fn unmount(&mut self) {
        self.core.unmount();
    }

    /// Returns one child link per item, in order.
    ///
    /// # Panics
    ///
    /// Panics if the linked value is not an array.
    #[must_use]
    pub fn links(&self, link: &Link) -> Vec<Link> {
        let Some(items) = link.value().as_array() else {
            return fatal(ShapeError::ExpectedArray {
                found: link.value().shape(),
            });
        };
        (0..items.len())
            .map(|index| child_link(&self.core, link, index))
            .collect()
    }

    /// Returns the structural operations bound to `link`.
    #[must_use]
    pub fn ops(&self, link: &Link) -> ArrayOps {
        ArrayOps {
            core: Rc::clone(&self.core),
            link: link.clone(),
        }
    }

    /// Returns the node's render info.
    #[must_use]
    pub fn render_info(&self, link: &Link) -> RenderInfo {
        RenderInfo::for_link(link, self.core.context())
    }

    /// Calls `f` with the child links, the structural operations, and the
    /// render info, and returns its output.
    pub fn render<R>(
        &self,
        link: &Link,
        f: impl FnOnce(Vec<Link>, ArrayOps, RenderInfo) -> R,
    ) -> R {
        f(self.links(link), self.ops(link), self.render_info(link))
    }
}

impl Drop for ArrayField {
    fn drop(&mut self) {
        self.core.unmount();
    }
}

fn child_link(core: &Rc<Composite>, parent: &Link, index: usize) -> Link {
    let on_change = {
        let core = Rc::clone(core);
        let parent = parent.clone();
        move |child: FormState| {
            let computed = parent.form_state().replace_array_child(index, child);
            core.commit(&parent, computed);
        }
    };
    let on_blur = {
        let core = Rc::clone(core);
        let parent = parent.clone();
        move |child: ShapedTree<Extras>| {
            let tree = parent
                .tree()
                .replace_array_child(index, child)
                .unwrap_or_else(fatal);
            core.blur(&parent, tree);
        }
    };
    let on_validation = {
        let parent = parent.clone();
        move |path: ShapedPath, errors| {
            parent.on_validation(path.prepend(PathStep::Array(index)), errors);
        }
    };
    Link::new(
        parent.form_state().array_child(index),
        on_change,
        on_blur,
        on_validation,
    )
    .at_path(parent.path().child(PathStep::Array(index)))
}

/// Structural operations on an [`ArrayField`]'s items.
///
/// Each operation rebuilds the array and its metadata from one positional
/// plan and commits the result through the field's pipeline exactly once.
/// Indices refer to the array the operations were created for.
#[derive(Clone)]
pub struct ArrayOps {
    core: Rc<Composite>,
    link: Link,
}

impl ArrayOps {
    /// Inserts `value` before the item at `index`; `index == len` appends.
    ///
    /// # Panics
    ///
    /// Panics if `index` is greater than the array length.
    pub fn add_field(&self, index: usize, value: Value) {
        self.add_fields(&[(index, vec![value])]);
    }

    /// Inserts every span at once, against the original indices.
    ///
    /// # Panics
    ///
    /// Panics if a span index is greater than the array length.
    pub fn add_fields(&self, spans: &[InsertSpan]) {
        self.commit(self.link.form_state().insert_spans(spans));
    }

    /// Removes the item at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove_field(&self, index: usize) {
        self.commit(self.link.form_state().remove_indices(&[index]));
    }

    /// Moves the item at `from` to `to`, shifting the items in between.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn move_field(&self, from: usize, to: usize) {
        self.commit(self.link.form_state().move_index(from, to));
    }

    /// Keeps the items for which `predicate(value, index)` holds.
    pub fn filter_fields(&self, predicate: impl FnMut(&Value, usize) -> bool) {
        self.commit(self.link.form_state().filter(predicate));
    }

    /// Applies insertions and a filter as one change.
    ///
    /// # Panics
    ///
    /// Panics if a span index is greater than the array length.
    pub fn modify_fields(&self, modification: ModifyFields) {
        let ModifyFields {
            insert_spans,
            filter_predicate,
        } = modification;
        let state = self.link.form_state();
        let computed = match filter_predicate {
            Some(mut predicate) => {
                state.modify(&insert_spans, |value, index| predicate(value, index))
            }
            None => state.insert_spans(&insert_spans),
        };
        self.commit(computed);
    }

    fn commit(&self, computed: FormState) {
        self.core.commit(&self.link, computed);
    }
}

impl fmt::Debug for ArrayOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayOps")
            .field("link", &self.link)
            .finish_non_exhaustive()
    }
}

type FilterFn = dyn FnMut(&Value, usize) -> bool;

/// A combined insert-and-filter change for [`ArrayOps::modify_fields`].
///
/// Span indices and the filter's index argument refer to the original array.
/// Inserted values are never filtered.
#[derive(Default)]
pub struct ModifyFields {
    insert_spans: Vec<InsertSpan>,
    filter_predicate: Option<Box<FilterFn>>,
}

impl ModifyFields {
    /// Creates a modification that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the values to insert.
    #[must_use]
    pub fn insert_spans(mut self, spans: Vec<InsertSpan>) -> Self {
        self.insert_spans = spans;
        self
    }

    /// Sets the predicate deciding which original items to keep.
    #[must_use]
    pub fn filter(mut self, predicate: impl FnMut(&Value, usize) -> bool + 'static) -> Self {
        self.filter_predicate = Some(Box::new(predicate));
        self
    }
}

impl fmt::Debug for ModifyFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModifyFields")
            .field("insert_spans", &self.insert_spans)
            .field("filter", &self.filter_predicate.is_some())
            .finish()
    }
}
