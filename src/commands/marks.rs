//! Mark toggling

use crate::models::editor_state::EditorState;
use crate::models::marks::MarkType;
use crate::transform::{StoredMarks, Transaction};

use super::textblock_at;

/// Toggle `mark` over the selection
///
/// Only text inside textblocks that allow the mark is considered. When all of
/// that text already carries the mark it is removed, otherwise (absent or
/// mixed) it is added everywhere. An empty selection toggles the stored marks.
pub fn toggle_mark(state: &EditorState, mark: MarkType) -> Option<Transaction> {
    let selection = state.selection;

    if selection.is_empty() {
        let (rp, _) = textblock_at(&state.doc, selection.head)?;
        if !state.schema.allows_mark(rp.parent().node_type(), mark) {
            return None;
        }
        let active = state.active_marks();
        let next = if active.contains(mark) { active.without(mark) } else { active.with(mark) };
        return Some(Transaction::new().with_stored_marks(StoredMarks::Set(next)));
    }

    let (from, to) = (selection.from(), selection.to());
    let mut ranges = Vec::new();
    let mut seen_text = false;
    let mut all_marked = true;

    for (pos, block) in state.doc.textblocks_between(from, to) {
        if !state.schema.allows_mark(block.node_type(), mark) {
            continue;
        }
        let content_start = pos + 1;
        let range_from = from.max(content_start);
        let range_to = to.min(content_start + block.content_size());
        if range_from >= range_to {
            continue;
        }

        let mut offset = content_start;
        for child in block.children() {
            let end = offset + child.node_size();
            if child.is_text() && end > range_from && offset < range_to {
                seen_text = true;
                all_marked &= child.marks().contains(mark);
            }
            offset = end;
        }
        ranges.push((range_from, range_to));
    }

    if !seen_text {
        return None;
    }

    let mut tr = state.tr();
    for (range_from, range_to) in ranges {
        let result = if all_marked {
            tr.remove_mark(range_from, range_to, mark)
        } else {
            tr.add_mark(range_from, range_to, mark)
        };
        result.ok()?;
    }
    log::debug!("toggle {} over {}..{} (remove: {})", mark, from, to, all_marked);
    Some(Transaction::from_transform(tr).with_selection(selection))
}
