//! Character-offset helpers
//!
//! Document positions count Unicode scalar values, while Rust strings are
//! indexed by bytes. These helpers translate between the two.

/// Number of characters in `s`
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the character at `char_idx` (or `s.len()` past the end)
pub fn byte_offset(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map(|(i, _)| i).unwrap_or(s.len())
}

/// Substring between two character offsets
pub fn char_slice(s: &str, from: usize, to: usize) -> &str {
    let start = byte_offset(s, from);
    let end = byte_offset(s, to.max(from));
    &s[start..end]
}
