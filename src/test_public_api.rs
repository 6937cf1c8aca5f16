use gpui::SharedString;

#[derive(Clone, crate::edit::EditableRecord)]
struct Note {
    title: SharedString,
}

#[test]
fn prelude_covers_a_host_edit_flow() {
    use crate::prelude::*;

    let store = RecordStore::new(Note {
        title: "Groceries".into(),
    });
    let session = EditSession::new(store.clone(), SessionOptions::default());
    session.toggle_edit().expect("enter edit mode");

    let title: FieldController = session
        .bind_text(Note::fields().title())
        .expect("bind title");
    title
        .apply_edit(&TextEdit::insert(0, "Weekly "))
        .expect("type title");
    let toolbar: ToolbarState = session.toolbar().expect("toolbar");
    assert!(toolbar.primary_enabled);

    session.toggle_edit().expect("save");
    assert_eq!(store.committed().title.to_string(), "Weekly Groceries");
    assert_eq!(title.state(), FieldState::Idle);
}

#[test]
fn edit_module_exports_leaf_components() {
    let registry = crate::edit::ValidityRegistry::new();
    let bus = crate::edit::EventBus::new();
    let queue = crate::edit::DeferredQueue::new();
    let buffer = crate::edit::TextBuffer::new("text");

    registry.set_valid("title".into(), true);
    assert!(registry.is_overall_valid());
    assert_eq!(bus.publish(crate::edit::EditEvent::CommitRequested).delivered, 0);
    assert_eq!(queue.run_pending(), 0);
    assert_eq!(buffer.len(), 4);
}
