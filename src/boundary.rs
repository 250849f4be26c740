use crate::script::{classify, ScriptClass};
use std::str::Chars;

/// Inserted into plain strings (e.g. the document title) where a marker
/// span cannot be used.
pub const THIN_SPACE: char = '\u{2009}';

/// True if a CJK character and a Latin-like character meet between
/// `before` and `after`, in either order. Neutral on either side never
/// yields a boundary.
pub fn is_boundary_at(before: char, after: char) -> bool {
    matches!(
        (classify(before), classify(after)),
        (ScriptClass::Cjk, ScriptClass::LatinLike) | (ScriptClass::LatinLike, ScriptClass::Cjk)
    )
}

/// Lazy iterator over the boundary offsets of a string.
///
/// An offset `i` is a character (not byte) index meaning "between char
/// `i - 1` and char `i`". A clone scans independently from the position it
/// was taken at.
#[derive(Debug, Clone)]
pub struct Boundaries<'a> {
    chars: Chars<'a>,
    prev: Option<char>,
    index: usize,
}

impl Iterator for Boundaries<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        // Advance one character per step so that overlapping transitions
        // like "A中A" report both sides of the ideograph.
        for ch in self.chars.by_ref() {
            let pos = self.index;
            self.index += 1;
            if let Some(prev) = self.prev.replace(ch) {
                if is_boundary_at(prev, ch) {
                    return Some(pos);
                }
            }
        }
        None
    }
}

/// Scan `text` for script boundaries, in ascending order.
///
/// ```
/// use cjk_spacing::find_boundaries;
/// assert_eq!(find_boundaries("A中B").collect::<Vec<_>>(), vec![1, 2]);
/// ```
pub fn find_boundaries(text: &str) -> Boundaries<'_> {
    Boundaries {
        chars: text.chars(),
        prev: None,
        index: 0,
    }
}

/// Boundaries of `text` when followed by `next`, the first character of
/// whatever is rendered after it. The lookahead only detects a trailing
/// boundary at `text`'s end and is never itself a cut point.
pub fn boundaries_with_lookahead(text: &str, next: Option<char>) -> Vec<usize> {
    let len = text.chars().count();
    let mut indexes: Vec<usize> = find_boundaries(text).collect();
    if let (Some(last), Some(next)) = (text.chars().last(), next) {
        if is_boundary_at(last, next) {
            indexes.push(len);
        }
    }
    indexes
}

/// Insert a thin space at every boundary of a plain string.
///
/// Used for text that is not rendered through the DOM, such as the page
/// title, where a marker span is not an option.
pub fn add_space_to_string(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    for ch in text.chars() {
        if let Some(p) = prev {
            if is_boundary_at(p, ch) {
                result.push(THIN_SPACE);
            }
        }
        result.push(ch);
        prev = Some(ch);
    }
    result
}
