// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for `ArrayField` and its structural operations.
//!
//! Each structural operation must rebuild values and metadata from the same
//! plan, so metadata travels with its item, and must commit exactly once.

mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{CountingContext, counted_validation, recording_link, strings, words};
use understory_form::{
    ArrayField, ClientErrors, CustomChange, DetachedContext, Extras, FormContext, FormState,
    ModifyFields, PathStep, ShapedPath, ShapedTree, Validation, Value, set_extras_touched,
};

fn detached() -> Rc<dyn FormContext> {
    Rc::new(DetachedContext)
}

/// `["one", "two", "three"]` with a distinct marker in each item's metadata.
fn marked() -> FormState {
    let state = FormState::new(words(&["one", "two", "three"]));
    (0..3).fold(state, |state, index| {
        let marker = format!("item {index}");
        state
            .set_external_errors_at(
                &ShapedPath::root().child(PathStep::index(index)),
                vec![marker],
            )
            .unwrap()
    })
}

fn markers(state: &FormState) -> Vec<Vec<String>> {
    state
        .tree()
        .array_children()
        .unwrap()
        .iter()
        .map(|child| child.data().errors.external.clone())
        .collect()
}

fn children(state: &FormState) -> Vec<ShapedTree<Extras>> {
    state.tree().array_children().unwrap().to_vec()
}

#[test]
fn links_cover_every_item_with_index_paths() {
    let (link, _) = recording_link(marked());
    let field = ArrayField::new(detached());
    let links = field.links(&link);

    assert_eq!(links.len(), 3);
    assert_eq!(links[2].value(), &Value::from("three"));
    assert_eq!(
        links[1].path(),
        &ShapedPath::root().child(PathStep::index(1))
    );
    assert_eq!(links[1].extras().errors.external, strings(&["item 1"]));
}

#[test]
fn remove_field_drops_value_and_metadata_together() {
    let (validation, runs) = counted_validation("empty", |v| {
        v.as_array().is_some_and(<[Value]>::is_empty)
    });
    let state = marked();
    let (link, recorder) = recording_link(state.clone());
    let field = ArrayField::new(detached()).validation(validation);

    field.ops(&link).remove_field(1);

    assert_eq!(recorder.change_count(), 1);
    assert_eq!(runs.get(), 1);
    let next = recorder.last_change();
    assert_eq!(next.value(), &words(&["one", "three"]));
    assert_eq!(
        markers(&next),
        vec![strings(&["item 0"]), strings(&["item 2"])]
    );
    let before = children(&state);
    let after = children(&next);
    assert!(after[0].ptr_eq(&before[0]));
    assert!(after[1].ptr_eq(&before[2]));
    assert!(next.extras().meta.changed);
    assert_eq!(next.extras().errors.client, ClientErrors::Checked(vec![]));
}

#[test]
fn move_field_carries_metadata() {
    let state = marked();
    let (link, recorder) = recording_link(state.clone());
    let field = ArrayField::new(detached());

    field.ops(&link).move_field(2, 1);

    let next = recorder.last_change();
    assert_eq!(next.value(), &words(&["one", "three", "two"]));
    assert_eq!(
        markers(&next),
        vec![
            strings(&["item 0"]),
            strings(&["item 2"]),
            strings(&["item 1"])
        ]
    );
    assert!(children(&next)[1].ptr_eq(&children(&state)[2]));
}

#[test]
fn add_fields_is_one_atomic_change() {
    let (validation, runs) = counted_validation("too many", |v| {
        v.as_array().is_some_and(|items| items.len() > 5)
    });
    let custom_calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&custom_calls);
    let (context, counts) = CountingContext::new();
    let field = ArrayField::new(context)
        .validation(validation)
        .custom_change(CustomChange::new(move |_, _| {
            seen.set(seen.get() + 1);
            None
        }));
    let state = marked();
    let (link, recorder) = recording_link(state.clone());

    field.ops(&link).add_fields(&[
        (0, vec![Value::from("negative one"), Value::from("zero")]),
        (3, vec![Value::from("four"), Value::from("five")]),
    ]);

    assert_eq!(recorder.change_count(), 1);
    assert_eq!(runs.get(), 1);
    assert_eq!(custom_calls.get(), 1);
    assert_eq!(counts.applied_paths.borrow().len(), 1);

    let next = recorder.last_change();
    assert_eq!(
        next.value(),
        &words(&["negative one", "zero", "one", "two", "three", "four", "five"])
    );
    assert!(next.tree().matches_shape(next.value()));
    assert_eq!(
        next.extras().errors.client,
        ClientErrors::Checked(strings(&["too many"]))
    );
    let after = children(&next);
    assert_eq!(*after[0].data(), Extras::default());
    assert_eq!(*after[6].data(), Extras::default());
    assert!(after[2].ptr_eq(&children(&state)[0]));
    assert!(after[4].ptr_eq(&children(&state)[2]));
}

#[test]
fn add_field_appends_at_length() {
    let (link, recorder) = recording_link(marked());
    let field = ArrayField::new(detached());

    field.ops(&link).add_field(3, Value::from("four"));

    let next = recorder.last_change();
    assert_eq!(next.value(), &words(&["one", "two", "three", "four"]));
    assert_eq!(*next.array_child(3).extras(), Extras::default());
}

#[test]
fn filter_fields_keeps_matching_items_and_their_metadata() {
    let state = marked();
    let (link, recorder) = recording_link(state.clone());
    let field = ArrayField::new(detached());

    field
        .ops(&link)
        .filter_fields(|value, _| value.as_str() != Some("two"));

    let next = recorder.last_change();
    assert_eq!(next.value(), &words(&["one", "three"]));
    assert_eq!(
        markers(&next),
        vec![strings(&["item 0"]), strings(&["item 2"])]
    );
}

#[test]
fn modify_fields_filters_only_original_items() {
    let (link, recorder) = recording_link(marked());
    let field = ArrayField::new(detached());

    field.ops(&link).modify_fields(
        ModifyFields::new()
            .insert_spans(vec![
                (0, vec![Value::from("start")]),
                (2, vec![Value::from("middle"), Value::from("content")]),
            ])
            .filter(|value, _| value.as_str() != Some("one")),
    );

    assert_eq!(recorder.change_count(), 1);
    let next = recorder.last_change();
    assert_eq!(
        next.value(),
        &words(&["start", "two", "middle", "content", "three"])
    );
    assert_eq!(
        markers(&next),
        vec![
            vec![],
            strings(&["item 1"]),
            vec![],
            vec![],
            strings(&["item 2"])
        ]
    );
}

#[test]
fn modify_fields_filter_sees_original_indices() {
    let (link, recorder) = recording_link(marked());
    let field = ArrayField::new(detached());

    field.ops(&link).modify_fields(
        ModifyFields::new()
            .insert_spans(vec![(1, vec![Value::from("inserted")])])
            .filter(|_, index| index != 1),
    );

    let next = recorder.last_change();
    assert_eq!(next.value(), &words(&["one", "inserted", "three"]));
}

#[test]
#[should_panic(expected = "remove index 5 is out of bounds")]
fn remove_out_of_range_panics() {
    let (link, _) = recording_link(marked());
    let field = ArrayField::new(detached());
    field.ops(&link).remove_field(5);
}

#[test]
#[should_panic(expected = "insert index 4 is out of bounds")]
fn add_past_end_panics() {
    let (link, _) = recording_link(marked());
    let field = ArrayField::new(detached());
    field.ops(&link).add_field(4, Value::from("x"));
}

#[test]
fn child_change_replaces_one_item() {
    let state = marked();
    let (link, recorder) = recording_link(state.clone());
    let field = ArrayField::new(detached());

    field.links(&link)[1].on_change(FormState::new(Value::from("TWO")));

    let next = recorder.last_change();
    assert_eq!(next.value(), &words(&["one", "TWO", "three"]));
    let before = children(&state);
    let after = children(&next);
    assert!(after[0].ptr_eq(&before[0]));
    assert!(after[2].ptr_eq(&before[2]));
    assert!(next.extras().meta.changed);
}

#[test]
fn child_blur_touches_array_root() {
    let state = marked();
    let (link, recorder) = recording_link(state.clone());
    let field = ArrayField::new(detached());
    let links = field.links(&link);

    let blurred = links[0].tree().map_root(set_extras_touched);
    links[0].on_blur(blurred.clone());

    let tree = recorder.last_blur();
    assert!(tree.data().meta.touched);
    assert!(!tree.data().meta.changed);
    assert!(tree.try_array_child(0).unwrap().ptr_eq(&blurred));
    assert!(
        tree.try_array_child(1)
            .unwrap()
            .ptr_eq(&children(&state)[1])
    );
}

#[test]
fn child_validation_reports_prepend_index() {
    let (link, recorder) = recording_link(marked());
    let field = ArrayField::new(detached());

    field.links(&link)[2].on_validation(ShapedPath::root(), strings(&["bad"]));

    assert_eq!(
        *recorder.validations.borrow(),
        vec![(
            ShapedPath::root().child(PathStep::index(2)),
            strings(&["bad"])
        )]
    );
}

#[test]
fn custom_change_may_change_array_length() {
    let field = ArrayField::new(detached()).custom_change(CustomChange::new(|_, computed| {
        let mut items = computed.as_array().unwrap_or_default().to_vec();
        items.push(Value::from("appended"));
        Some(Value::from(items))
    }));
    let state = marked();
    let (link, recorder) = recording_link(state.clone());

    field.ops(&link).remove_field(0);

    let next = recorder.last_change();
    assert_eq!(next.value(), &words(&["two", "three", "appended"]));
    assert!(next.tree().matches_shape(next.value()));
    assert!(children(&next)[0].ptr_eq(&children(&state)[1]));
    assert_eq!(*next.array_child(2).extras(), Extras::default());
}

#[test]
fn render_hands_out_links_ops_and_info() {
    let (link, recorder) = recording_link(marked());
    let field = ArrayField::new(detached()).validation(Validation::none());

    let len = field.render(&link, |links, ops, info| {
        assert_eq!(info.value, words(&["one", "two", "three"]));
        assert!(!info.valid);
        assert!(!info.async_validation_in_flight);
        ops.move_field(0, 2);
        links.len()
    });

    assert_eq!(len, 3);
    assert_eq!(
        recorder.last_change().value(),
        &words(&["two", "three", "one"])
    );
}
