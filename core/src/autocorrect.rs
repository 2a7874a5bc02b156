//! Score gates for the autocorrection decision.
//!
//! Two independent checks live here: the normalized-score threshold that
//! weighs a suggestion's raw score against its edit distance from the
//! typed word, and the per-language "space filter" that blocks long
//! multi-word corrections in compounding languages.

use crate::candidate::Candidate;

/// Languages that cap the length of multi-word autocorrections, and the
/// cap. German compounds routinely miss from dictionaries, producing long
/// space-separated corrections that are nearly always wrong.
static MAX_AUTOCORRECT_LENGTH_WITH_SPACES: phf::Map<&'static str, usize> = phf::phf_map! {
    "de" => 12,
};

/// Whether the suggestion's score, weighed by its edit distance from the
/// considered word, clears the autocorrection threshold. Whitelisted
/// suggestions are shortlisted unconditionally.
pub fn suggestion_exceeds_threshold(
    suggestion: &Candidate,
    considered_word: &str,
    threshold: f32,
) -> bool {
    if suggestion.is_whitelisted() {
        return true;
    }
    calc_normalized_score(considered_word, &suggestion.word, suggestion.score) >= threshold
}

/// Normalized score in [0, ~2.1]: `(score / 1e6) · (1 − distance / len)`.
/// Zero when either string is empty, the suggestion is all spaces, the raw
/// score is non-positive, or the distance reaches the suggestion length.
pub fn calc_normalized_score(before: &str, after: &str, score: i32) -> f32 {
    let before_length = before.chars().count();
    let after_length = after.chars().count();
    if before_length == 0 || after_length == 0 {
        return 0.0;
    }
    if after.chars().all(|c| c == ' ') {
        return 0.0;
    }
    let distance = edit_distance(before, after);
    if score <= 0 || distance >= after_length {
        return 0.0;
    }
    let weight = 1.0 - distance as f32 / after_length as f32;
    (score as f32 / 1_000_000.0) * weight
}

/// Plain Levenshtein distance over code points.
pub fn edit_distance(x: &str, y: &str) -> usize {
    let xs: Vec<char> = x.chars().collect();
    let ys: Vec<char> = y.chars().collect();
    let mut prev: Vec<usize> = (0..=ys.len()).collect();
    let mut cur = vec![0usize; ys.len() + 1];
    for (i, &xc) in xs.iter().enumerate() {
        cur[0] = i + 1;
        for (j, &yc) in ys.iter().enumerate() {
            let substitution = prev[j] + usize::from(xc != yc);
            cur[j + 1] = substitution.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[ys.len()]
}

/// The space filter: whether this language allows autocorrecting to this
/// suggestion. Always true for languages without a cap, and for
/// suggestions without a space; otherwise the suggestion length must not
/// exceed the language's cap.
pub fn allowed_by_space_filter(suggestion: &Candidate) -> bool {
    if suggestion.source_locale.is_empty() {
        return true;
    }
    let Some(&max_length) = MAX_AUTOCORRECT_LENGTH_WITH_SPACES.get(suggestion.source_locale.language())
    else {
        return true;
    };
    suggestion.char_count() <= max_length || !suggestion.word.contains(' ')
}
