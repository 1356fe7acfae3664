//! Loading stored content into fresh editor states

use penfeel_editor::config::EditorConfig;
use penfeel_editor::models::serde_helpers::{deserialize, serialize};
use penfeel_editor::models::ParseError;
use penfeel_editor::persistence::DocumentRecord;
use penfeel_editor::workspace::load_editor_state;
use penfeel_editor::{decorate, DocumentWorkspace, EditorCommand, MarkSet, MarkType, Node, Schema};

fn rich_document() -> Node {
    Node::doc(vec![
        Node::heading(1, vec![Node::text("Plan")]),
        Node::paragraph(vec![
            Node::text("ship "),
            Node::marked_text("soon", MarkSet::of(&[MarkType::Bold, MarkType::Italic])),
        ]),
        Node::bullet_list(vec![
            Node::list_item(vec![Node::paragraph(vec![Node::text("one")])]),
            Node::list_item(vec![Node::paragraph(vec![Node::text("two")])]),
        ]),
        Node::code_block(vec![Node::text("let x = 1;")]),
    ])
}

#[test]
fn test_stored_json_round_trips() {
    let doc = rich_document();
    let json = serialize(&doc);
    assert_eq!(deserialize(&Schema::new(), &json).unwrap(), doc);

    let loaded = load_editor_state(Some(json.as_str()), &EditorConfig::default());
    assert_eq!(loaded.state.doc, doc);
    assert!(decorate(&loaded.state.doc, "Write something...").is_empty());
}

#[test]
fn test_malformed_json_yields_empty_editor_and_signal() {
    let loaded = load_editor_state(Some("{\"type\": \"doc\", "), &EditorConfig::default());
    assert_eq!(loaded.state.doc, Schema::new().empty_document());
    assert!(matches!(loaded.parse_error, Some(ParseError::InvalidJson(_))));
    assert_eq!(decorate(&loaded.state.doc, "Write something...").len(), 1);
}

#[test]
fn test_schema_mismatch_yields_empty_editor() {
    // A heading may not open a list item
    let json = r#"{"type":"doc","content":[{"type":"bullet_list","content":[
        {"type":"list_item","content":[{"type":"heading","attrs":{"level":1}}]}]}]}"#;
    let loaded = load_editor_state(Some(json), &EditorConfig::default());
    assert_eq!(loaded.state.doc, Schema::new().empty_document());
    assert!(matches!(loaded.parse_error, Some(ParseError::Schema(_))));
}

#[test]
fn test_workspace_recovers_from_broken_record() {
    let mut workspace = DocumentWorkspace::new(EditorConfig::default());
    workspace.finish_load(Ok(vec![
        DocumentRecord::new("broken", "Broken", "not json"),
        DocumentRecord::new("fine", "Fine", serialize(&rich_document())),
    ]));

    assert_eq!(workspace.selected_id(), Some("broken"));
    assert!(workspace.last_parse_error().is_some());
    // The fallback document is fully editable
    assert!(workspace.execute(&EditorCommand::InsertText { text: "fresh".into() }, 0));
    assert!(workspace.execute(&EditorCommand::Undo, 10));

    assert!(workspace.select_document("fine"));
    assert!(workspace.last_parse_error().is_none());
    assert_eq!(workspace.editor().unwrap().doc, rich_document());
    assert!(!workspace.editor().unwrap().can_undo());
}

#[test]
fn test_reload_keeps_active_editor() {
    let mut workspace = DocumentWorkspace::new(EditorConfig::default());
    workspace.finish_load(Ok(vec![DocumentRecord::new("a", "A", "")]));
    workspace.execute(&EditorCommand::InsertText { text: "local".into() }, 0);

    // A refetch returning stale content must not replace the live tree
    workspace.finish_load(Ok(vec![DocumentRecord::new("a", "A", ""), DocumentRecord::new("b", "B", "")]));
    assert_eq!(workspace.selected_id(), Some("a"));
    assert_eq!(
        workspace.editor().unwrap().doc,
        Node::doc(vec![Node::paragraph(vec![Node::text("local")])])
    );

    // The active record disappearing clears the editor and picks the first remaining one
    workspace.finish_load(Ok(vec![DocumentRecord::new("b", "B", "")]));
    assert_eq!(workspace.selected_id(), Some("b"));
}
