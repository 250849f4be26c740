use std::iter;

/// Split a string before each of the given character offsets.
///
/// Offsets are de-duplicated and sorted, offsets past the end are ignored,
/// and the string length is always appended as the final cut. Empty
/// fragments are kept, so a cut at `0` or at the end yields `""`.
///
/// ```
/// use cjk_spacing::split_at_indexes;
/// assert_eq!(split_at_indexes("123456789", &[3, 5, 7]), ["123", "45", "67", "89"]);
/// assert_eq!(split_at_indexes("123456789", &[0, 9]), ["", "123456789", ""]);
/// ```
pub fn split_at_indexes<'a>(text: &'a str, indexes: &[usize]) -> Vec<&'a str> {
    // byte offset of every char position, including one-past-the-end
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(b, _)| b)
        .chain(iter::once(text.len()))
        .collect();
    let len = offsets.len() - 1;

    let mut cuts: Vec<usize> = indexes.iter().copied().filter(|&i| i <= len).collect();
    cuts.sort_unstable();
    cuts.dedup();
    cuts.push(len);

    let mut start = 0;
    cuts.into_iter()
        .map(|cut| {
            let fragment = &text[offsets[start]..offsets[cut]];
            start = cut;
            fragment
        })
        .collect()
}

/// Split off the last character: `"中文"` → `("中", "文")`.
pub fn split_last_char(text: &str) -> (&str, &str) {
    match text.char_indices().last() {
        Some((b, _)) => (&text[..b], &text[b..]),
        None => ("", ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_at_indexes() {
        let cases: Vec<(&str, Vec<usize>, Vec<&str>)> = vec![
            ("123456789", vec![3, 5, 7], vec!["123", "45", "67", "89"]),
            ("123456789", vec![0, 9], vec!["", "123456789", ""]),
            // --- unsorted, duplicated, out of range ---
            ("123456789", vec![7, 3, 3, 42], vec!["123", "4567", "89"]),
            ("123456789", vec![], vec!["123456789"]),
            ("", vec![0], vec!["", ""]),
            // --- character offsets over multi-byte text ---
            ("中文ABC", vec![2], vec!["中文", "ABC"]),
            ("A𠮩B", vec![1, 2], vec!["A", "𠮩", "B"]),
        ];

        for (input, indexes, expected) in &cases {
            assert_eq!(
                &split_at_indexes(input, indexes), expected,
                "split mismatch for {:?} at {:?}", input, indexes
            );
        }
    }

    #[test]
    fn test_split_last_char() {
        assert_eq!(split_last_char("中文"), ("中", "文"));
        assert_eq!(split_last_char("A"), ("", "A"));
        assert_eq!(split_last_char(""), ("", ""));
    }
}
