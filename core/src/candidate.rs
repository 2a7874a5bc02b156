//! Candidate types for suggestion fusion.
//!
//! This module provides:
//! - `Candidate`: a single scored word with its dictionary provenance
//! - `DictionaryKind` / `CandidateKind`: closed enumerations replacing
//!   stringly-typed dictionary tags
//! - `Locale`: a lightweight language tag
//! - `remove_dups_and_typed_word`: the word-identity dedup pass applied to
//!   display lists

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Score given to whitelisted candidates and to the injected typed word.
pub const MAX_SCORE: i32 = i32::MAX;

/// A language tag, e.g. `"en"`, `"de-DE"`. The empty tag marks the
/// placeholder dictionary group of an inactive facilitator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locale(String);

impl Locale {
    pub fn new<T: Into<String>>(tag: T) -> Self {
        Locale(tag.into())
    }

    /// The placeholder locale of an empty dictionary group.
    pub fn empty() -> Self {
        Locale(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tag(&self) -> &str {
        &self.0
    }

    /// Language part of the tag, e.g. `"de"` for `"de-DE"`.
    pub fn language(&self) -> &str {
        self.0.split(['-', '_']).next().unwrap_or("")
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locale {
    fn from(tag: &str) -> Self {
        Locale::new(tag)
    }
}

/// The kinds of dictionaries a group can hold, in query priority order.
///
/// `UserTyped` is a pseudo-source marking candidates fabricated from the
/// literal typed text; it never backs a real dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DictionaryKind {
    Main,
    User,
    UserHistory,
    Contacts,
    Apps,
    Emoji,
    UserTyped,
}

/// Query order for member dictionaries within a group.
pub const ALL_DICTIONARY_KINDS: [DictionaryKind; 6] = [
    DictionaryKind::Main,
    DictionaryKind::User,
    DictionaryKind::UserHistory,
    DictionaryKind::Contacts,
    DictionaryKind::Apps,
    DictionaryKind::Emoji,
];

/// Dictionary kinds with mutable entries (everything but main).
pub const DYNAMIC_DICTIONARY_KINDS: [DictionaryKind; 5] = [
    DictionaryKind::User,
    DictionaryKind::UserHistory,
    DictionaryKind::Contacts,
    DictionaryKind::Apps,
    DictionaryKind::Emoji,
];

impl DictionaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DictionaryKind::Main => "main",
            DictionaryKind::User => "user",
            DictionaryKind::UserHistory => "history",
            DictionaryKind::Contacts => "contacts",
            DictionaryKind::Apps => "apps",
            DictionaryKind::Emoji => "emoji",
            DictionaryKind::UserTyped => "user_typed",
        }
    }
}

impl fmt::Display for DictionaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a candidate is, from the producing dictionary's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateKind {
    /// The literal typed word, injected by the pipeline.
    Typed,
    /// A spelling correction of the typed word.
    Correction,
    /// A completion of the typed prefix.
    Completion,
    /// A dictionary-whitelisted replacement (e.g. "ill" -> "I'll").
    Whitelist,
    /// A next-word prediction for an empty typed word.
    Prediction,
    /// An emoji suggestion.
    Emoji,
    /// Restores the word an autocorrection replaced.
    Undo,
}

/// A single scored word candidate with dictionary provenance.
///
/// Scores are on the binary-dictionary scale: roughly 1.5M for an exact
/// match, 600k for a close match, `MAX_SCORE` for whitelisted entries, and
/// 0..=255 for context-only (empty typed word) lookups. Scales are
/// dictionary-specific; cross-dictionary blending happens via the locale
/// weight and the heuristics in `suggest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub word: String,
    pub score: i32,
    pub kind: CandidateKind,
    pub source: DictionaryKind,
    pub source_locale: Locale,
}

impl Candidate {
    pub fn new<T: Into<String>>(
        word: T,
        score: i32,
        kind: CandidateKind,
        source: DictionaryKind,
        source_locale: Locale,
    ) -> Self {
        Candidate {
            word: word.into(),
            score,
            kind,
            source,
            source_locale,
        }
    }

    /// A candidate fabricated from the literal typed text.
    pub fn typed_word<T: Into<String>>(word: T, score: i32) -> Self {
        Candidate::new(
            word,
            score,
            CandidateKind::Typed,
            DictionaryKind::UserTyped,
            Locale::empty(),
        )
    }

    pub fn is_emoji(&self) -> bool {
        self.kind == CandidateKind::Emoji || self.source == DictionaryKind::Emoji
    }

    pub fn is_whitelisted(&self) -> bool {
        self.kind == CandidateKind::Whitelist
    }

    pub fn char_count(&self) -> usize {
        self.word.chars().count()
    }

    /// Canonical ranking: higher score first, then fewer characters, then
    /// lexicographic word order.
    pub fn ranking_cmp(&self, other: &Candidate) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| self.char_count().cmp(&other.char_count()))
            .then_with(|| self.word.cmp(&other.word))
    }
}

/// Removes the typed word and all later duplicates of each word from a
/// display list, returning the position at which the typed word was first
/// found (if it was). Word identity is case-sensitive.
pub fn remove_dups_and_typed_word(typed_word: &str, list: &mut Vec<Candidate>) -> Option<usize> {
    if list.is_empty() {
        return None;
    }
    let first_occurrence = if typed_word.is_empty() {
        None
    } else {
        remove_word_starting_at(list, typed_word, 0)
    };
    let mut i = 0;
    while i < list.len() {
        let word = list[i].word.clone();
        remove_word_starting_at(list, &word, i + 1);
        i += 1;
    }
    first_occurrence
}

/// Removes every candidate with the given word at or after `start`,
/// returning the index of the first removal.
fn remove_word_starting_at(list: &mut Vec<Candidate>, word: &str, start: usize) -> Option<usize> {
    let mut first = None;
    let mut i = start;
    while i < list.len() {
        if list[i].word == word {
            if first.is_none() {
                first = Some(i);
            }
            list.remove(i);
        } else {
            i += 1;
        }
    }
    first
}
