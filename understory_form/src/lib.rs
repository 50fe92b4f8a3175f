// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Form: shape-synchronized form state trees.
//!
//! A form's state is a [`Value`] paired with a [`ShapedTree`] of per-node
//! metadata ([`Extras`]) that mirrors the value's structure exactly. Fields
//! compose into a tree: each composite field receives a [`Link`] from its
//! parent and hands one link to each child, and every edit flows back up as a
//! complete new [`FormState`].
//!
//! ## Core Concepts
//!
//! ### Form State
//!
//! [`FormState`] operations are pure. Replacing one child shares every other
//! child with the previous state, and array operations move metadata together
//! with its item:
//!
//! - `replace_object_child(key, child)` / `replace_array_child(index, child)`
//! - `insert_spans`, `remove_indices`, `move_index`, `filter`, `modify`
//! - `validate(validation)`, `set_changed()`, `set_touched()`
//! - `substitute_value(value)` - swap the value, keeping metadata where the
//!   shape allows
//!
//! Client validation is [`ClientErrors::Pending`] until it has run against
//! the node's current value, which is distinct from having run with no errors.
//!
//! ### Fields
//!
//! - [`ObjectField`] - one child link per key
//! - [`ArrayField`] - one child link per item, plus [`ArrayOps`]
//! - [`Field`] - a leaf
//!
//! A composite commits a child's change through a fixed pipeline: optional
//! [`CustomChange`], its own [`Validation`], `set_changed`,
//! [`FormContext::apply_change_to_node`], then the parent link.
//!
//! ### Forms
//!
//! [`Form`] owns the authoritative state and is the [`FormContext`] for its
//! fields. It keeps mounted fields' validations in a [`ValidationRegistry`],
//! revalidates stale descendants after a composite commits, and decides error
//! visibility with a [`FeedbackStrategy`].
//!
//! ## Quick Start
//!
//! ```rust
//! use understory_form::{ArrayField, Form, FormState, ObjectField, Validation, Value};
//!
//! let form = Form::new(Value::object([(
//!     "tags",
//!     Value::array([Value::from("rust"), Value::from("forms")]),
//! )]));
//!
//! let mut root = ObjectField::new(form.context());
//! root.mount(&form.link());
//!
//! let mut tags = ArrayField::new(form.context()).validation(Validation::new(|v| {
//!     if v.as_array().is_some_and(|items| items.len() > 2) {
//!         vec!["at most two tags".into()]
//!     } else {
//!         vec![]
//!     }
//! }));
//! let tags_link = root.links(&form.link())["tags"].clone();
//! tags.mount(&tags_link);
//!
//! // Structural edits commit through the field's pipeline.
//! let tags_link = root.links(&form.link())["tags"].clone();
//! tags.ops(&tags_link).add_field(0, Value::from("no_std"));
//!
//! let state = form.form_state();
//! let tags_state = state.object_child("tags");
//! assert_eq!(tags_state.value().as_array().map(<[Value]>::len), Some(3));
//! assert_eq!(tags_state.flat_root_errors(), vec!["at most two tags".to_string()]);
//! assert!(state.extras().meta.changed);
//! assert!(!form.is_valid());
//!
//! // Edits to a leaf travel through both composites.
//! let tags_link = root.links(&form.link())["tags"].clone();
//! let first = tags.links(&tags_link)[0].clone();
//! first.on_change(FormState::new(Value::from("embedded")));
//! let value = form.value();
//! let tags = value.as_object().and_then(|o| o.get("tags")).and_then(Value::as_array);
//! assert_eq!(tags.map(|t| t[0].clone()), Some(Value::from("embedded")));
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. The default `std` feature only
//! forwards to `tracing/std`.

#![no_std]

extern crate alloc;

mod array;
mod array_field;
mod composite;
mod context;
mod error;
mod extras;
mod feedback;
mod field;
mod form;
mod form_state;
mod link;
mod object_field;
mod path;
mod registry;
mod shaped_tree;
mod validation;
mod value;

pub use array::InsertSpan;
pub use array_field::{ArrayField, ArrayOps, ModifyFields};
pub use composite::RenderInfo;
pub use context::{DetachedContext, FormContext, ValidationRegistration};
pub use error::ShapeError;
pub use extras::{ClientErrors, Errors, Extras, Meta, set_extras_touched};
pub use feedback::FeedbackStrategy;
pub use field::Field;
pub use form::{Form, FormBuilder};
pub use form_state::FormState;
pub use link::Link;
pub use object_field::{ObjectField, ObjectLinks};
pub use path::{PathStep, ShapedPath};
pub use registry::{RegistrationId, ValidationRegistry};
pub use shaped_tree::{Children, ShapedTree};
pub use validation::{CustomChange, Validation};
pub use value::{Object, Shape, Value};
