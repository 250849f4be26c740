use serde::Serialize;

/// Script class of a single character, as far as spacing is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptClass {
    Cjk,
    LatinLike,
    Neutral,
}

/// Classify one character. Unknown characters are `Neutral` and never
/// take part in a boundary.
pub fn classify(ch: char) -> ScriptClass {
    if is_cjk(ch) {
        ScriptClass::Cjk
    } else if is_latin_like(ch) {
        ScriptClass::LatinLike
    } else {
        ScriptClass::Neutral
    }
}

/// True for Chinese ideographs and the ideographic marks that behave like
/// them, including the supplementary-plane extensions needed for rare
/// characters like 𠮩 (U+20BA9) and 𰻞 (U+30EDE).
pub fn is_cjk(ch: char) -> bool {
    matches!(ch,
        '\u{2E80}'..='\u{2E99}'     // CJK Radicals Supplement
        | '\u{2E9B}'..='\u{2EF3}'
        | '\u{2F00}'..='\u{2FD5}'   // Kangxi Radicals
        | '\u{3005}'                // 々
        | '\u{3007}'                // 〇
        | '\u{3021}'..='\u{3029}'   // Hangzhou numerals
        | '\u{3038}'..='\u{303B}'
        | '\u{3400}'..='\u{4DBF}'   // CJK Extension A
        | '\u{4E00}'..='\u{9FFF}'   // CJK Unified Ideographs
        | '\u{F900}'..='\u{FA6D}'   // CJK Compatibility Ideographs
        | '\u{FA70}'..='\u{FAD9}'
        | '\u{16FE2}'..='\u{16FE3}' // ideographic iteration marks
        | '\u{16FF0}'..='\u{16FF1}'
        | '\u{20000}'..='\u{2A6DF}' // CJK Extension B
        | '\u{2A700}'..='\u{2B738}' // CJK Extension C
        | '\u{2B740}'..='\u{2B81D}' // CJK Extension D
        | '\u{2B820}'..='\u{2CEA1}' // CJK Extension E
        | '\u{2CEB0}'..='\u{2EBE0}' // CJK Extension F
        | '\u{2F800}'..='\u{2FA1D}' // CJK Compatibility Supplement
        | '\u{30000}'..='\u{3134A}' // CJK Extension G
    )
}

/// True for the characters that get spaced away from CJK text:
/// ASCII letters and digits plus a fixed set of symbols.
/// Hyphens, brackets, quotes and whitespace are not in the set.
pub fn is_latin_like(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(ch,
            '~' | '$' | '%' | '^' | '&' | '*' | '+' | '='
            | '|' | '!' | ';' | ',' | '.' | '?' | 'Â' | '±'
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let cases = [
            ('中', ScriptClass::Cjk),
            ('々', ScriptClass::Cjk),
            ('〇', ScriptClass::Cjk),
            ('⺀', ScriptClass::Cjk),
            ('\u{20BA9}', ScriptClass::Cjk), // 𠮩, outside the BMP
            ('\u{2B739}', ScriptClass::Neutral), // unassigned gap inside Extension C
            ('A', ScriptClass::LatinLike),
            ('z', ScriptClass::LatinLike),
            ('7', ScriptClass::LatinLike),
            ('%', ScriptClass::LatinLike),
            ('±', ScriptClass::LatinLike),
            ('Â', ScriptClass::LatinLike),
            ('*', ScriptClass::LatinLike),
            ('+', ScriptClass::LatinLike),
            ('-', ScriptClass::Neutral),
            ('\\', ScriptClass::Neutral),
            (' ', ScriptClass::Neutral),
            ('(', ScriptClass::Neutral),
            ('，', ScriptClass::Neutral), // fullwidth comma
            ('あ', ScriptClass::Neutral),
            ('é', ScriptClass::Neutral),
            ('\u{2009}', ScriptClass::Neutral),
        ];

        for (ch, expected) in cases {
            assert_eq!(classify(ch), expected, "class mismatch for {:?} (U+{:04X})", ch, ch as u32);
        }
    }
}
