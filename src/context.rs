//! Local context windows around term occurrences.
//!
//! ```text
//!   ... the river │ runs through Paris before reaching the sea │ at Le Havre ...
//!                 ▲        ◄── 200 ──┤ term ├── 200 ──►         ▲
//!           widened left to a space            widened right to a space
//! ```

/// Bytes on each side of an occurrence before widening.
pub const WINDOW_RADIUS: usize = 200;

/// Windows of `text` around occurrences of `term`, case-insensitive.
///
/// Each window spans [`WINDOW_RADIUS`] bytes either side of the occurrence,
/// widened outward to the nearest space or to the text boundary. The next
/// occurrence is searched from `WINDOW_RADIUS + 1` bytes after the current
/// one, and at most `max_windows` windows are returned.
#[must_use]
pub fn local_windows(text: &str, term: &str, max_windows: usize) -> Vec<String> {
    let text = text.trim().to_lowercase();
    let term = term.trim().to_lowercase();
    if term.is_empty() || text.is_empty() {
        return Vec::new();
    }

    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut windows = Vec::new();
    let mut from = 0;

    while windows.len() < max_windows && from < len {
        let Some(offset) = text[from..].find(&term) else {
            break;
        };
        let pos = from + offset;

        let mut start = pos.saturating_sub(WINDOW_RADIUS);
        while start > 0 && bytes[start] != b' ' {
            start -= 1;
        }
        let mut end = (pos + WINDOW_RADIUS).min(len);
        while end < len && bytes[end] != b' ' {
            end += 1;
        }

        let window = text[start..end].trim();
        if !window.is_empty() {
            windows.push(window.to_string());
        }

        from = ceil_char_boundary(&text, pos + WINDOW_RADIUS + 1);
    }
    windows
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}
