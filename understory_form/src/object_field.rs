// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composite fields over object values.

use alloc::rc::Rc;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ops::Index;

use crate::composite::{Composite, RenderInfo};
use crate::context::FormContext;
use crate::error::{ShapeError, fatal};
use crate::extras::Extras;
use crate::form_state::FormState;
use crate::link::Link;
use crate::path::{PathStep, ShapedPath};
use crate::shaped_tree::ShapedTree;
use crate::validation::{CustomChange, Validation};

/// A composite field whose value is an object.
///
/// The field hands out one child [`Link`] per key. A child's change is folded
/// back into the object, optionally rewritten by a [`CustomChange`], validated
/// with the field's own [`Validation`], marked changed, passed through the
/// [`FormContext`], and reported to the parent link.
///
/// Call [`mount`](Self::mount) once the field is attached to its link;
/// dropping the field unmounts it.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use understory_form::{DetachedContext, FormState, Link, ObjectField, Value};
///
/// let state = FormState::new(Value::object([("name", Value::from("Ada"))]));
/// let link = Link::new(
///     state,
///     |next| {
///         let name = next.value().as_object().and_then(|o| o.get("name"));
///         assert_eq!(name, Some(&Value::from("Grace")));
///     },
///     |_| {},
///     |_, _| {},
/// );
///
/// let field = ObjectField::new(Rc::new(DetachedContext));
/// let links = field.links(&link);
/// links["name"].on_change(FormState::new(Value::from("Grace")));
/// ```
#[derive(Debug)]
pub struct ObjectField {
    core: Rc<Composite>,
}

impl ObjectField {
    /// Creates a field with no validation and no custom change.
    pub fn new(context: Rc<dyn FormContext>) -> Self {
        Self {
            core: Rc::new(Composite::new(context)),
        }
    }

    /// Sets the validation run against the whole object.
    #[must_use]
    pub fn validation(self, validation: Validation) -> Self {
        self.core.set_validation(validation);
        self
    }

    /// Sets the hook that may rewrite the object after a child changes.
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

    /// Returns one child link per key of the linked object, in key order.
    ///
    /// # Panics
    ///
    /// Panics if the linked value is not an object.
    #[must_use]
    pub fn links(&self, link: &Link) -> ObjectLinks {
        let Some(object) = link.value().as_object() else {
            return fatal(ShapeError::ExpectedObject {
                found: link.value().shape(),
            });
        };
        let links = object
            .keys()
            .map(|key| (Arc::clone(key), child_link(&self.core, link, key)))
            .collect();
        ObjectLinks { links }
    }

    /// Returns the node's render info.
    #[must_use]
    pub fn render_info(&self, link: &Link) -> RenderInfo {
        RenderInfo::for_link(link, self.core.context())
    }

    /// Calls `f` with the child links and render info and returns its output.
    pub fn render<R>(&self, link: &Link, f: impl FnOnce(ObjectLinks, RenderInfo) -> R) -> R {
        f(self.links(link), self.render_info(link))
    }
}

impl Drop for ObjectField {
    fn drop(&mut self) {
        self.core.unmount();
    }
}

fn child_link(core: &Rc<Composite>, parent: &Link, key: &Arc<str>) -> Link {
    let step = PathStep::Object(Arc::clone(key));
    let on_change = {
        let core = Rc::clone(core);
        let parent = parent.clone();
        let key = Arc::clone(key);
        move |child: FormState| {
            let computed = parent.form_state().replace_object_child(&key, child);
            core.commit(&parent, computed);
        }
    };
    let on_blur = {
        let core = Rc::clone(core);
        let parent = parent.clone();
        let key = Arc::clone(key);
        move |child: ShapedTree<Extras>| {
            let tree = parent
                .tree()
                .replace_object_child(&key, child)
                .unwrap_or_else(fatal);
            core.blur(&parent, tree);
        }
    };
    let on_validation = {
        let parent = parent.clone();
        let step = step.clone();
        move |path: ShapedPath, errors| parent.on_validation(path.prepend(step.clone()), errors)
    };
    Link::new(
        parent.form_state().object_child(key),
        on_change,
        on_blur,
        on_validation,
    )
    .at_path(parent.path().child(step))
}

/// The child links of an [`ObjectField`], in key order.
#[derive(Clone, Debug, Default)]
pub struct ObjectLinks {
    links: Vec<(Arc<str>, Link)>,
}

impl ObjectLinks {
    /// Returns the link for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Link> {
        self.links
            .iter()
            .find(|(k, _)| &**k == key)
            .map(|(_, link)| link)
    }

    /// Returns the keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &Arc<str>> + '_ {
        self.links.iter().map(|(k, _)| k)
    }

    /// Returns `(key, link)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &Link)> + '_ {
        self.links.iter().map(|(k, link)| (k, link))
    }

    /// Returns the number of links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns `true` if the object has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl Index<&str> for ObjectLinks {
    type Output = Link;

    fn index(&self, key: &str) -> &Link {
        match self.get(key) {
            Some(link) => link,
            None => panic!("no child link for key {key:?}"),
        }
    }
}
