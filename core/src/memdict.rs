//! Thread-safe in-memory learnable dictionary.
//!
//! Backs the user/history/contacts/apps dictionary slots in tests and the
//! simulator. Keeps unigram use counts plus per-previous-word next-word
//! counts, which is what the next-word prediction path reads.

use crate::candidate::{Candidate, CandidateKind, DictionaryKind, Locale};
use crate::composer::ComposedInput;
use crate::dictionary::{
    Dictionary, LearnableDictionary, SessionId, NOT_A_PROBABILITY,
};
use crate::ngram::NgramContext;
use crate::settings::SettingsSnapshot;
use ahash::AHashMap;
use std::sync::RwLock;

/// Unigram probability added per recorded use, saturating at 255. Three
/// uses push a word past the auto-add threshold, mirroring how learned
/// frequencies behave in on-device history dictionaries.
const FREQUENCY_PER_USE: i32 = 48;

/// Score scale for exact matches, before the unigram frequency is added.
const EXACT_MATCH_SCORE: i32 = 1_400_000;
/// Score scale for prefix completions, before the unigram frequency is added.
const COMPLETION_SCORE: i32 = 500_000;

#[derive(Default)]
struct Entries {
    /// word -> (use count, valid flag)
    unigrams: AHashMap<String, (u32, bool)>,
    /// previous word -> following word -> use count
    next_words: AHashMap<String, AHashMap<String, u32>>,
}

/// An in-memory `LearnableDictionary`.
pub struct InMemoryLearnableDictionary {
    kind: DictionaryKind,
    locale: Locale,
    entries: RwLock<Entries>,
}

impl InMemoryLearnableDictionary {
    pub fn new(kind: DictionaryKind, locale: Locale) -> Self {
        InMemoryLearnableDictionary {
            kind,
            locale,
            entries: RwLock::new(Entries::default()),
        }
    }

    /// A dictionary pre-seeded with words, each counted as one valid use.
    /// Convenient for contacts/apps-style read-mostly content.
    pub fn with_words<'a, I: IntoIterator<Item = &'a str>>(
        kind: DictionaryKind,
        locale: Locale,
        words: I,
    ) -> Self {
        let dict = InMemoryLearnableDictionary::new(kind, locale);
        for word in words {
            dict.add_entry(word, &NgramContext::empty(), true, 0);
        }
        dict
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Entries> {
        match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Entries> {
        match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn scaled(score: i32, weight: f32) -> i32 {
        (score as f32 * weight) as i32
    }
}

impl Dictionary for InMemoryLearnableDictionary {
    fn kind(&self) -> DictionaryKind {
        self.kind
    }

    fn locale(&self) -> &Locale {
        &self.locale
    }

    fn suggestions(
        &self,
        input: &ComposedInput,
        context: &NgramContext,
        _settings: &SettingsSnapshot,
        _session_id: SessionId,
        locale_weight: f32,
    ) -> Vec<Candidate> {
        let entries = self.read();
        let mut out = Vec::new();
        if input.typed_word.is_empty() {
            // next-word predictions from the recorded bigrams
            let Some(prev) = context.prev_word(1) else {
                return out;
            };
            if let Some(followers) = entries.next_words.get(prev) {
                for (word, &count) in followers {
                    let score = (count as i32 * FREQUENCY_PER_USE).min(255);
                    out.push(Candidate::new(
                        word.clone(),
                        Self::scaled(score, locale_weight),
                        CandidateKind::Prediction,
                        self.kind,
                        self.locale.clone(),
                    ));
                }
            }
            return out;
        }

        let typed_lower = input.typed_word.to_lowercase();
        for (word, &(count, _valid)) in &entries.unigrams {
            let word_lower = word.to_lowercase();
            if !word_lower.starts_with(&typed_lower) {
                continue;
            }
            let frequency = (count as i32 * FREQUENCY_PER_USE).min(255);
            let (base, kind) = if word_lower == typed_lower {
                (EXACT_MATCH_SCORE, CandidateKind::Correction)
            } else {
                (COMPLETION_SCORE, CandidateKind::Completion)
            };
            out.push(Candidate::new(
                word.clone(),
                Self::scaled(base + frequency * 100, locale_weight),
                kind,
                self.kind,
                self.locale.clone(),
            ));
        }
        out
    }

    fn frequency(&self, word: &str) -> i32 {
        match self.read().unigrams.get(word) {
            Some(&(count, _)) => (count as i32 * FREQUENCY_PER_USE).min(255),
            None => NOT_A_PROBABILITY,
        }
    }

    fn is_valid_word(&self, word: &str) -> bool {
        self.read().unigrams.contains_key(word)
    }

    fn is_in_dictionary(&self, word: &str) -> bool {
        self.is_valid_word(word)
    }
}

impl LearnableDictionary for InMemoryLearnableDictionary {
    fn add_entry(&self, word: &str, context: &NgramContext, is_valid: bool, _timestamp: i64) {
        if word.is_empty() {
            return;
        }
        let mut entries = self.write();
        let entry = entries
            .unigrams
            .entry(word.to_string())
            .or_insert((0, is_valid));
        entry.0 = entry.0.saturating_add(1);
        entry.1 |= is_valid;
        if let Some(prev) = context.prev_word(1) {
            let followers = entries.next_words.entry(prev.to_string()).or_default();
            let count = followers.entry(word.to_string()).or_insert(0);
            *count = count.saturating_add(1);
        }
    }

    fn remove_entry(&self, word: &str) -> bool {
        let mut entries = self.write();
        let removed = entries.unigrams.remove(word).is_some();
        for followers in entries.next_words.values_mut() {
            followers.remove(word);
        }
        removed
    }

    fn clear(&self) {
        let mut entries = self.write();
        entries.unigrams.clear();
        entries.next_words.clear();
    }

    fn entry_count(&self) -> usize {
        self.read().unigrams.len()
    }
}
