//! Transaction pipeline and history, driven through the workspace the way the
//! host drives it

use penfeel_editor::commands::{self, KeyEvent, ToolbarAction};
use penfeel_editor::config::EditorConfig;
use penfeel_editor::models::serde_helpers::serialize;
use penfeel_editor::persistence::DocumentRecord;
use penfeel_editor::{DocumentWorkspace, EditorCommand, MarkSet, MarkType, Node, Selection};

fn p(text: &str) -> Node {
    Node::paragraph(vec![Node::text(text)])
}

fn open(content: Node) -> DocumentWorkspace {
    let mut workspace = DocumentWorkspace::new(EditorConfig::default());
    workspace.finish_load(Ok(vec![DocumentRecord::new("doc-1", "Notes", serialize(&content))]));
    workspace
}

fn doc(workspace: &DocumentWorkspace) -> Node {
    workspace.editor().unwrap().doc.clone()
}

fn type_text(workspace: &mut DocumentWorkspace, text: &str, start: u64, gap: u64) {
    for (i, ch) in text.chars().enumerate() {
        assert!(workspace.execute(&EditorCommand::InsertText { text: ch.to_string() }, start + gap * i as u64));
    }
}

#[test]
fn test_typing_undoes_word_by_word() {
    let mut workspace = open(Node::doc(vec![Node::paragraph(vec![])]));
    type_text(&mut workspace, "ab c", 0, 100);
    assert_eq!(doc(&workspace), Node::doc(vec![p("ab c")]));

    // " c" started with whitespace, so it is its own unit
    assert!(workspace.execute(&EditorCommand::Undo, 1000));
    assert_eq!(doc(&workspace), Node::doc(vec![p("ab")]));
    assert!(workspace.execute(&EditorCommand::Undo, 1100));
    assert_eq!(doc(&workspace), Node::doc(vec![Node::paragraph(vec![])]));
    assert!(!workspace.execute(&EditorCommand::Undo, 1200));

    assert!(workspace.execute(&EditorCommand::Redo, 1300));
    assert_eq!(doc(&workspace), Node::doc(vec![p("ab")]));
    assert_eq!(workspace.editor().unwrap().selection, Selection::cursor(3));
}

#[test]
fn test_pause_splits_typing_groups() {
    let mut workspace = open(Node::doc(vec![Node::paragraph(vec![])]));
    type_text(&mut workspace, "ab", 0, 100);
    type_text(&mut workspace, "cd", 5000, 100);

    assert!(workspace.execute(&EditorCommand::Undo, 6000));
    assert_eq!(doc(&workspace), Node::doc(vec![p("ab")]));
}

#[test]
fn test_new_edit_drops_redo_branch() {
    let mut workspace = open(Node::doc(vec![Node::paragraph(vec![])]));
    type_text(&mut workspace, "x", 0, 0);
    workspace.execute(&EditorCommand::Undo, 10);
    assert!(workspace.view_state().can_redo);

    type_text(&mut workspace, "y", 20, 0);
    let view = workspace.view_state();
    assert!(!view.can_redo);
    assert!(!workspace.execute(&EditorCommand::Redo, 30));
    assert_eq!(doc(&workspace), Node::doc(vec![p("y")]));
}

#[test]
fn test_undo_restores_previous_tree() {
    let original = Node::doc(vec![p("keep me")]);
    let mut workspace = open(original.clone());
    let before = doc(&workspace);

    workspace.set_selection(1, 8, 0);
    assert!(workspace.execute(&EditorCommand::DeleteBackward, 10));
    assert_eq!(doc(&workspace), Node::doc(vec![Node::paragraph(vec![])]));
    // The earlier tree value is untouched by the edit
    assert_eq!(before, original);

    workspace.execute(&EditorCommand::Undo, 20);
    assert_eq!(doc(&workspace), original);
}

#[test]
fn test_refused_command_leaves_state_alone() {
    let mut workspace = open(Node::doc(vec![Node::heading(1, vec![Node::text("Title")])]));
    let before = workspace.editor().unwrap().clone();

    assert!(!workspace.execute(&EditorCommand::LiftListItem, 0));
    assert!(!workspace.execute(&EditorCommand::heading(1), 0));
    assert_eq!(workspace.editor().unwrap(), &before);
    assert!(!workspace.has_pending_saves());
}

#[test]
fn test_keymap_and_toolbar_produce_the_same_transaction() {
    let workspace = open(Node::doc(vec![p("some words")]));
    let mut state = workspace.editor().unwrap().clone();
    state.selection = Selection::new(1, 5);

    let pairs = [
        (KeyEvent::new("b").ctrl(), ToolbarAction::Bold),
        (KeyEvent::new("i").ctrl(), ToolbarAction::Italic),
        (KeyEvent::new("*").ctrl().shift(), ToolbarAction::BulletList),
        (KeyEvent::new("(").ctrl().shift(), ToolbarAction::OrderedList),
        (KeyEvent::new("@").ctrl().shift(), ToolbarAction::Heading { level: 2 }),
        (KeyEvent::new("|").ctrl().shift(), ToolbarAction::CodeBlock),
    ];
    for (event, action) in pairs {
        let bound = workspace.keymap().lookup(&event).unwrap();
        let from_key = commands::run(bound, &state).unwrap();
        let from_toolbar = commands::run(&action.command(), &state).unwrap();
        assert_eq!(from_key, from_toolbar, "{:?} vs {:?}", event, action);
    }
}

#[test]
fn test_bold_toggle_round_trip() {
    let mut workspace = open(Node::doc(vec![p("some words")]));
    workspace.set_selection(1, 5, 0);

    assert!(workspace.handle_key(&KeyEvent::new("b").ctrl(), 10));
    assert_eq!(
        doc(&workspace),
        Node::doc(vec![Node::paragraph(vec![
            Node::marked_text("some", MarkSet::of(&[MarkType::Bold])),
            Node::text(" words"),
        ])])
    );
    assert_eq!(workspace.view_state().active_marks, vec![MarkType::Bold]);

    assert!(workspace.execute(&ToolbarAction::Bold.command(), 20));
    assert_eq!(doc(&workspace), Node::doc(vec![p("some words")]));
}

#[test]
fn test_placeholder_follows_emptiness() {
    let mut workspace = open(Node::doc(vec![Node::paragraph(vec![])]));
    assert_eq!(workspace.view_state().decorations.len(), 1);

    type_text(&mut workspace, "a", 0, 0);
    assert!(workspace.view_state().decorations.is_empty());

    workspace.execute(&EditorCommand::DeleteBackward, 10);
    let decorations = workspace.view_state().decorations;
    assert_eq!(decorations.len(), 1);
    assert_eq!(decorations[0].class, "is-editor-empty");
    assert_eq!(decorations[0].attrs["data-placeholder"], "Write something...");
}
