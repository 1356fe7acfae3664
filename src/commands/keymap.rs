//! Key bindings and toolbar actions
//!
//! Both resolve to an `EditorCommand`, so a toolbar button and its shortcut
//! always produce the same transaction.
//!
//! Binding strings use the usual `Mod-b` / `Shift-Ctrl-8` notation. `Mod` is
//! `Meta` on macOS and `Ctrl` elsewhere.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::EditorCommand;
use crate::models::marks::MarkType;
use crate::models::node::NodeAttrs;
use crate::models::schema::NodeType;

/// A key press as reported by the host (`KeyboardEvent` fields)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEvent {
    pub key: String,
    #[serde(default)]
    pub ctrl_key: bool,
    #[serde(default)]
    pub meta_key: bool,
    #[serde(default)]
    pub shift_key: bool,
    #[serde(default)]
    pub alt_key: bool,
}

impl KeyEvent {
    pub fn new(key: &str) -> Self {
        Self { key: key.to_string(), ..Self::default() }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl_key = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta_key = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift_key = true;
        self
    }

    /// Canonical binding name, e.g. `Ctrl-Shift-8`
    fn name(&self) -> String {
        compose(self.alt_key, self.ctrl_key, self.meta_key, self.shift_key, &base_key(&self.key, self.shift_key))
    }
}

fn compose(alt: bool, ctrl: bool, meta: bool, shift: bool, key: &str) -> String {
    let mut name = String::new();
    for (on, prefix) in [(alt, "Alt-"), (ctrl, "Ctrl-"), (meta, "Meta-"), (shift, "Shift-")] {
        if on {
            name.push_str(prefix);
        }
    }
    name.push_str(key);
    name
}

/// Undo the effect of Shift on single-character keys (US layout)
fn base_key(key: &str, shift: bool) -> String {
    let mut chars = key.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return key.to_string();
    };
    if !shift {
        return c.to_lowercase().collect();
    }
    let unshifted = match c {
        '!' => '1',
        '@' => '2',
        '#' => '3',
        '$' => '4',
        '%' => '5',
        '^' => '6',
        '&' => '7',
        '*' => '8',
        '(' => '9',
        ')' => '0',
        '|' => '\\',
        '{' => '[',
        '}' => ']',
        '~' => '`',
        other => other,
    };
    unshifted.to_lowercase().collect()
}

/// Canonicalize a binding string such as `Shift-Mod-z`
fn normalize_binding(binding: &str, mac: bool) -> String {
    let parts: Vec<&str> = binding.split('-').collect();
    // "Ctrl--" binds the minus key
    let (key, modifiers) = match parts.split_last() {
        Some((&"", rest)) if !rest.is_empty() => ("-", &rest[..rest.len() - 1]),
        Some((key, rest)) => (*key, rest),
        None => (binding, &[][..]),
    };

    let (mut alt, mut ctrl, mut meta, mut shift) = (false, false, false, false);
    for modifier in modifiers {
        match *modifier {
            "Mod" if mac => meta = true,
            "Mod" | "Ctrl" | "Control" => ctrl = true,
            "Meta" | "Cmd" => meta = true,
            "Shift" => shift = true,
            "Alt" => alt = true,
            other => log::warn!("unknown modifier {} in binding {}", other, binding),
        }
    }
    compose(alt, ctrl, meta, shift, &base_key(key, false))
}

/// Key binding table
#[derive(Clone, Debug)]
pub struct Keymap {
    bindings: HashMap<String, EditorCommand>,
    mac: bool,
}

impl Keymap {
    pub fn new(mac: bool) -> Self {
        Self { bindings: HashMap::new(), mac }
    }

    /// The editor's standard bindings
    pub fn default_bindings(mac: bool) -> Self {
        let mut keymap = Self::new(mac);
        keymap.bind("Mod-b", EditorCommand::ToggleMark { mark: MarkType::Bold });
        keymap.bind("Mod-i", EditorCommand::ToggleMark { mark: MarkType::Italic });
        keymap.bind("Mod-`", EditorCommand::ToggleMark { mark: MarkType::Code });
        keymap.bind("Mod-z", EditorCommand::Undo);
        keymap.bind("Shift-Mod-z", EditorCommand::Redo);
        keymap.bind("Mod-y", EditorCommand::Redo);
        keymap.bind("Enter", EditorCommand::SplitBlock);
        keymap.bind("Shift-Enter", EditorCommand::InsertHardBreak);
        keymap.bind("Mod-Enter", EditorCommand::InsertHardBreak);
        keymap.bind("Backspace", EditorCommand::DeleteBackward);
        keymap.bind("Delete", EditorCommand::DeleteForward);
        keymap.bind("Mod-a", EditorCommand::SelectAll);
        keymap.bind("Shift-Ctrl-8", EditorCommand::WrapInList { list_type: NodeType::BulletList });
        keymap.bind("Shift-Ctrl-9", EditorCommand::WrapInList { list_type: NodeType::OrderedList });
        keymap.bind("Shift-Ctrl-0", EditorCommand::paragraph());
        for level in 1..=6u8 {
            keymap.bind(&format!("Shift-Ctrl-{}", level), EditorCommand::heading(level));
        }
        keymap.bind(
            "Shift-Ctrl-\\",
            EditorCommand::SetBlockType { node_type: NodeType::CodeBlock, attrs: NodeAttrs::None },
        );
        keymap.bind("Mod-[", EditorCommand::LiftListItem);
        keymap
    }

    pub fn bind(&mut self, binding: &str, command: EditorCommand) {
        self.bindings.insert(normalize_binding(binding, self.mac), command);
    }

    pub fn lookup(&self, event: &KeyEvent) -> Option<&EditorCommand> {
        self.bindings.get(&event.name())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Toolbar buttons
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ToolbarAction {
    Bold,
    Italic,
    Code,
    BulletList,
    OrderedList,
    Paragraph,
    Heading { level: u8 },
    CodeBlock,
    LiftListItem,
    Undo,
    Redo,
}

impl ToolbarAction {
    pub fn command(self) -> EditorCommand {
        match self {
            ToolbarAction::Bold => EditorCommand::ToggleMark { mark: MarkType::Bold },
            ToolbarAction::Italic => EditorCommand::ToggleMark { mark: MarkType::Italic },
            ToolbarAction::Code => EditorCommand::ToggleMark { mark: MarkType::Code },
            ToolbarAction::BulletList => EditorCommand::WrapInList { list_type: NodeType::BulletList },
            ToolbarAction::OrderedList => EditorCommand::WrapInList { list_type: NodeType::OrderedList },
            ToolbarAction::Paragraph => EditorCommand::paragraph(),
            ToolbarAction::Heading { level } => EditorCommand::heading(level),
            ToolbarAction::CodeBlock => {
                EditorCommand::SetBlockType { node_type: NodeType::CodeBlock, attrs: NodeAttrs::None }
            }
            ToolbarAction::LiftListItem => EditorCommand::LiftListItem,
            ToolbarAction::Undo => EditorCommand::Undo,
            ToolbarAction::Redo => EditorCommand::Redo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mod_resolves_per_platform() {
        let pc = Keymap::default_bindings(false);
        let mac = Keymap::default_bindings(true);
        let bold = EditorCommand::ToggleMark { mark: MarkType::Bold };

        assert_eq!(pc.lookup(&KeyEvent::new("b").ctrl()), Some(&bold));
        assert_eq!(pc.lookup(&KeyEvent::new("b").meta()), None);
        assert_eq!(mac.lookup(&KeyEvent::new("b").meta()), Some(&bold));
    }

    #[test]
    fn test_shifted_keys() {
        let keymap = Keymap::default_bindings(false);
        assert_eq!(keymap.lookup(&KeyEvent::new("Z").ctrl().shift()), Some(&EditorCommand::Redo));
        assert_eq!(
            keymap.lookup(&KeyEvent::new("*").ctrl().shift()),
            Some(&EditorCommand::WrapInList { list_type: NodeType::BulletList })
        );
        assert_eq!(keymap.lookup(&KeyEvent::new("@").ctrl().shift()), Some(&EditorCommand::heading(2)));
        assert_eq!(keymap.lookup(&KeyEvent::new("Enter").shift()), Some(&EditorCommand::InsertHardBreak));
        assert_eq!(keymap.lookup(&KeyEvent::new("Enter")), Some(&EditorCommand::SplitBlock));
    }

    #[test]
    fn test_unbound_keys() {
        let keymap = Keymap::default_bindings(false);
        assert_eq!(keymap.lookup(&KeyEvent::new("q").ctrl()), None);
        assert_eq!(keymap.lookup(&KeyEvent::new("b")), None);
    }

    #[test]
    fn test_toolbar_matches_keymap() {
        let keymap = Keymap::default_bindings(false);
        assert_eq!(keymap.lookup(&KeyEvent::new("i").ctrl()), Some(&ToolbarAction::Italic.command()));
        assert_eq!(keymap.lookup(&KeyEvent::new("z").ctrl()), Some(&ToolbarAction::Undo.command()));

        let action: ToolbarAction = serde_json::from_str(r#"{"action":"heading","level":3}"#).unwrap();
        assert_eq!(action.command(), EditorCommand::heading(3));
    }
}
