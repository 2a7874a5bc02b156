//! String helpers for casing, quotes and emoji detection.

use unicode_normalization::UnicodeNormalization;

/// Normalize a word for identity comparisons (NFC, trimmed).
pub fn normalize(s: &str) -> String {
    s.nfc().collect::<String>().trim().to_string()
}

/// Number of single quotes at the end of the string.
pub fn trailing_single_quote_count(s: &str) -> usize {
    s.chars().rev().take_while(|&c| c == '\'').count()
}

/// Uppercase the first code point, leaving the rest unchanged.
pub fn capitalize_first_code_point(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lowercase the first code point, leaving the rest unchanged.
pub fn decapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Apply the capitalization transform implied by the shift state.
pub fn capitalize(word: &str, all_upper_case: bool, only_first_char_capitalized: bool) -> String {
    if all_upper_case {
        word.to_uppercase()
    } else if only_first_char_capitalized {
        capitalize_first_code_point(word)
    } else {
        word.to_string()
    }
}

/// True if the string is entirely lowercase ASCII letters.
pub fn is_lower_case_ascii(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_lowercase())
}

/// Whether the committed text spans more than one word.
pub fn contains_word_separator(s: &str) -> bool {
    s.chars().any(char::is_whitespace)
}

/// Cheap check for whether a code point could be part of an emoji.
pub fn char_might_be_emoji(c: char) -> bool {
    matches!(u32::from(c),
        0x1F000..=0x1FFFF  // emoji & pictograph blocks
        | 0x2600..=0x27BF  // misc symbols, dingbats
        | 0x2190..=0x21FF  // arrows
        | 0x2B00..=0x2BFF  // misc symbols and arrows
        | 0xFE0F           // variation selector
        | 0x200D           // zero-width joiner
        | 0x20E3           // combining keycap
        | 0x00A9 | 0x00AE  // copyright, registered
    )
}

/// Cheap check for whether a string is plausibly an emoji sequence.
pub fn might_be_emoji(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char_might_be_emoji)
}
