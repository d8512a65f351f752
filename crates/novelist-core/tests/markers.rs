use novelist_core::{
    DocumentError, EditorConfig, MarkerAttachment, MarkerEvent, MarkerId, SceneDocument,
    TextFormatRegistry,
};
use novelist_core_lang::ProjectLanguage;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

const TEXT: &str = "This is a text. It isn't a long one, but it's something to work with.";

fn scene_with_marked_word() -> (SceneDocument, MarkerId, MarkerId) {
    let mut scene = SceneDocument::with_language(
        TextFormatRegistry::shared(),
        EditorConfig::default(),
        ProjectLanguage::default(),
    );
    scene.insert_text_at(0, TEXT).unwrap();
    let start = scene.add_marker(10, MarkerAttachment::Right).unwrap();
    let end = scene.add_marker(14, MarkerAttachment::Left).unwrap();
    (scene, start, end)
}

fn marked(scene: &SceneDocument, start: MarkerId, end: MarkerId) -> String {
    let start = scene.markers().get(start).unwrap().position();
    let end = scene.markers().get(end).unwrap().position();
    scene.document().text_in_range(start..end).unwrap()
}

#[test]
fn test_markers_survive_insertions() {
    let (mut scene, start, end) = scene_with_marked_word();
    assert_eq!(marked(&scene, start, end), "text");

    let edits: [(usize, &str); 5] = [
        (16, "Really. "),
        (10, "nice "),
        (0, "Whoa. "),
        (0, "This is a new block.\n"),
        (14, "!"),
    ];
    for (pos, text) in edits {
        let len = scene.len();
        scene.insert_text_at(pos.min(len), text).unwrap();
        assert_eq!(marked(&scene, start, end), "text", "after inserting {text:?} at {pos}");
    }

    let len = scene.len();
    scene.insert_text_at(len, "\nThe end.").unwrap();
    assert_eq!(marked(&scene, start, end), "text");
    assert_eq!(scene.marker_location(start), Some((1, 21)));
}

#[test]
fn test_markers_survive_removals_and_undo() {
    let (mut scene, start, end) = scene_with_marked_word();
    scene.delete_range(35..69).unwrap();
    assert_eq!(marked(&scene, start, end), "text");
    scene.delete_range(7..9).unwrap();
    assert_eq!(marked(&scene, start, end), "text");

    scene.undo();
    scene.undo();
    assert_eq!(scene.text(), TEXT);
    assert_eq!(marked(&scene, start, end), "text");
}

#[test]
fn test_erasing_marked_text_displaces_markers() {
    let (mut scene, start, end) = scene_with_marked_word();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    scene
        .markers_mut()
        .subscribe(move |event| sink.borrow_mut().push(event.clone()));

    scene.delete_range(8..15).unwrap();

    assert_eq!(marked(&scene, start, end), "");
    assert_eq!(
        *events.borrow(),
        vec![
            MarkerEvent::Displaced {
                id: start,
                old_position: 10,
                position: 8
            },
            MarkerEvent::Displaced {
                id: end,
                old_position: 14,
                position: 8
            },
        ]
    );
}

#[test]
fn test_marker_outside_document_is_rejected() {
    let (mut scene, _, _) = scene_with_marked_word();
    let len = scene.len();
    assert_eq!(
        scene.add_marker(len + 1, MarkerAttachment::Left),
        Err(DocumentError::OutOfRange {
            position: len + 1,
            length: len
        })
    );
    assert!(scene.add_marker(len, MarkerAttachment::Left).is_ok());
}
