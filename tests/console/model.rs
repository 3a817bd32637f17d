//! Integration tests for the trace model
//!
//! Tests frame attachment, annotations, pausing, and clearing.

use calltrace_console::{Notification, NotifyOutcome, ROOT, TraceModel};

use crate::{ancestor, call};

fn model_with_depths(depths: &[u32]) -> TraceModel {
    let mut model = TraceModel::new();
    for (i, depth) in depths.iter().enumerate() {
        model.notify(call(&format!("f{}", i + 1), *depth));
    }
    model
}

#[test]
fn cursor_unwinds_to_the_right_parent() {
    let model = model_with_depths(&[1, 2, 3, 2, 1]);
    assert_eq!(model.children(ROOT), &[1, 5]);
    assert_eq!(model.children(1), &[2, 4]);
    assert_eq!(model.children(2), &[3]);
    assert!(model.children(3).is_empty());
    assert_eq!(model.get(5).unwrap().parent, Some(ROOT));
}

#[test]
fn annotation_attaches_without_a_frame() {
    let mut model = model_with_depths(&[1, 2, 3]);
    let before = model.len();
    let outcome = model.notify(Notification::Annotation("checkpoint".into()));

    assert_eq!(outcome, NotifyOutcome::Annotated);
    assert_eq!(model.len(), before);
    assert_eq!(model.get(3).unwrap().annotation.as_deref(), Some("checkpoint"));
    assert_eq!(model.get(1).unwrap().annotation.as_deref(), Some("checkpoint"));
    assert_eq!(model.get(2).unwrap().annotation, None);
    assert_eq!(model.cursor(), 3);
}

#[test]
fn pausing_freezes_ids() {
    let mut model = model_with_depths(&[1]);
    model.pause(true);
    assert_eq!(model.notify(call("dropped", 1)), NotifyOutcome::Dropped);
    assert_eq!(model.notify(Notification::Annotation("x".into())), NotifyOutcome::Dropped);
    model.pause(false);

    let outcome = model.notify(call("kept", 1));
    assert!(matches!(outcome, NotifyOutcome::Appended { id: 2, .. }));
    assert_eq!(model.get(1).unwrap().annotation, None);
}

#[test]
fn clear_restarts_numbering() {
    let mut model = model_with_depths(&[1, 2, 2]);
    model.clear();
    assert_eq!(model.frame_count(), 0);
    assert_eq!(model.cursor(), ROOT);
    assert!(matches!(
        model.notify(call("again", 1)),
        NotifyOutcome::Appended { id: 1, top_level: true, .. }
    ));
}

#[test]
fn reconstructed_frames_are_flagged() {
    let mut model = TraceModel::new();
    model.notify(ancestor("onClick", 1));
    model.notify(call("app.work", 2));
    assert!(model.get(1).unwrap().reconstructed);
    assert!(!model.get(2).unwrap().reconstructed);
    assert_eq!(model.get(2).unwrap().parent, Some(1));
    assert_eq!(model.hot_functions(10).len(), 1);
}
