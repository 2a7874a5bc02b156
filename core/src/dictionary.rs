//! Dictionary collaborator contracts.
//!
//! The actual lookup engines (binary tries, edit-distance expansion, neural
//! models) live behind these traits; this crate only fuses what they
//! return. A learnable dictionary additionally supports dynamic entry
//! mutation and is what user/history/contacts/apps dictionaries implement.

use crate::candidate::{Candidate, DictionaryKind, Locale};
use crate::composer::ComposedInput;
use crate::ngram::NgramContext;
use crate::settings::SettingsSnapshot;
use serde::Serialize;

/// Identifies a decoding session so an engine can keep per-session state.
/// Typing and gesture share an id to keep engine memory bounded.
pub type SessionId = i32;

/// Sentinel returned by `frequency` for words a dictionary does not know.
pub const NOT_A_PROBABILITY: i32 = -1;

/// A queryable word source for one locale.
///
/// Implementations must be cheap to query and must not block indefinitely;
/// queries run on the suggestion hot path. Scores reported by
/// `suggestions` must already be scaled by `locale_weight` (the weight is
/// how multilingual fusion discounts unlikely languages).
pub trait Dictionary: Send + Sync {
    fn kind(&self) -> DictionaryKind;

    fn locale(&self) -> &Locale;

    /// Scored candidates for the composed input in the given context.
    /// An empty typed word asks for next-word predictions.
    fn suggestions(
        &self,
        input: &ComposedInput,
        context: &NgramContext,
        settings: &SettingsSnapshot,
        session_id: SessionId,
        locale_weight: f32,
    ) -> Vec<Candidate>;

    /// Unigram probability (0..=255) of an exact word, or
    /// `NOT_A_PROBABILITY`.
    fn frequency(&self, word: &str) -> i32;

    /// Whether the word is suggestable from this dictionary.
    fn is_valid_word(&self, word: &str) -> bool;

    /// Whether the exact entry exists, ignoring suggestability filters.
    /// Used to tell real entries from decoder artifacts during gestures.
    fn is_in_dictionary(&self, word: &str) -> bool;

    /// False while the dictionary is still loading in the background.
    fn is_initialized(&self) -> bool {
        true
    }

    /// Flush hook called when an input session ends.
    fn on_finish_input(&self) {}

    /// Release resources. Called exactly once when the owning group is
    /// rebuilt without reusing this dictionary.
    fn close(&self) {}
}

/// A dictionary whose entries can be changed at runtime.
pub trait LearnableDictionary: Dictionary {
    /// Record a committed word in this context. `is_valid` distinguishes
    /// known words from unigrams learned on the fly.
    fn add_entry(&self, word: &str, context: &NgramContext, is_valid: bool, timestamp: i64);

    /// Dynamically remove a unigram entry. Returns whether it was present.
    fn remove_entry(&self, word: &str) -> bool;

    /// Remove all learned entries.
    fn clear(&self);

    fn entry_count(&self) -> usize;
}

/// Receives main-dictionary availability changes during rebuilds: once
/// synchronously at swap time and again when a background load finishes.
pub trait DictionaryInitializationListener: Send + Sync {
    fn on_main_dictionary_availability(&self, has_initialized_main: bool);
}

/// Size information for one dynamic dictionary, for debug surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct DictionaryStats {
    pub kind: DictionaryKind,
    pub locale: Locale,
    pub entry_count: usize,
}
