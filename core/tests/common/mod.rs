//! Shared test doubles: scripted dictionaries and an instrumented factory.
#![allow(dead_code)]

use libsuggest_core::{
    Blacklist, Candidate, CandidateKind, ComposedInput, Dictionary, DictionaryError,
    DictionaryFactory, DictionaryKind, LearnableDictionary, Locale, NgramContext,
    SettingsSnapshot, SessionId, NOT_A_PROBABILITY,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A dictionary that returns a fixed candidate script for every non-empty
/// typed word, scaled by the locale weight: the shape of a fuzzy decoder
/// without the decoding. Validity is tracked separately so tests can model
/// decoder artifacts that are not real entries.
pub struct ScriptedDictionary {
    kind: DictionaryKind,
    locale: Locale,
    script: Vec<(String, i32, CandidateKind)>,
    valid_words: Vec<String>,
    pub close_count: AtomicUsize,
    pub panic_on_query: bool,
}

impl ScriptedDictionary {
    pub fn new(kind: DictionaryKind, locale: &str) -> Self {
        ScriptedDictionary {
            kind,
            locale: Locale::new(locale),
            script: Vec::new(),
            valid_words: Vec::new(),
            close_count: AtomicUsize::new(0),
            panic_on_query: false,
        }
    }

    /// Candidate returned by every query, also counted as a valid word.
    pub fn with_word(mut self, word: &str, score: i32) -> Self {
        self.script
            .push((word.to_string(), score, CandidateKind::Correction));
        self.valid_words.push(word.to_string());
        self
    }

    /// Candidate returned by every query but NOT a real entry (decoder
    /// garbage).
    pub fn with_garbage(mut self, word: &str, score: i32) -> Self {
        self.script
            .push((word.to_string(), score, CandidateKind::Correction));
        self
    }

    /// A word that validates but is never suggested.
    pub fn with_silent_word(mut self, word: &str) -> Self {
        self.valid_words.push(word.to_string());
        self
    }

    pub fn with_kind(mut self, word: &str, score: i32, kind: CandidateKind) -> Self {
        self.script.push((word.to_string(), score, kind));
        self.valid_words.push(word.to_string());
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_query = true;
        self
    }
}

impl Dictionary for ScriptedDictionary {
    fn kind(&self) -> DictionaryKind {
        self.kind
    }

    fn locale(&self) -> &Locale {
        &self.locale
    }

    fn suggestions(
        &self,
        input: &ComposedInput,
        _context: &NgramContext,
        _settings: &SettingsSnapshot,
        _session_id: SessionId,
        locale_weight: f32,
    ) -> Vec<Candidate> {
        if self.panic_on_query {
            panic!("scripted dictionary failure");
        }
        if input.typed_word.is_empty() {
            return Vec::new();
        }
        self.script
            .iter()
            .map(|(word, score, kind)| {
                Candidate::new(
                    word.clone(),
                    (*score as f32 * locale_weight) as i32,
                    *kind,
                    self.kind,
                    self.locale.clone(),
                )
            })
            .collect()
    }

    fn frequency(&self, word: &str) -> i32 {
        if self.valid_words.iter().any(|w| w == word) {
            128
        } else {
            NOT_A_PROBABILITY
        }
    }

    fn is_valid_word(&self, word: &str) -> bool {
        self.valid_words.iter().any(|w| w == word)
    }

    fn is_in_dictionary(&self, word: &str) -> bool {
        self.is_valid_word(word)
    }

    fn close(&self) {
        self.close_count.fetch_add(1, Ordering::SeqCst);
    }
}

/// A learnable dictionary whose entries cannot actually be removed, like a
/// contacts provider.
pub struct ReadOnlyWords {
    inner: ScriptedDictionary,
}

impl ReadOnlyWords {
    pub fn new(kind: DictionaryKind, locale: &str, words: &[(&str, i32)]) -> Self {
        let mut inner = ScriptedDictionary::new(kind, locale);
        for (word, score) in words {
            inner = inner.with_word(word, *score);
        }
        ReadOnlyWords { inner }
    }
}

impl Dictionary for ReadOnlyWords {
    fn kind(&self) -> DictionaryKind {
        self.inner.kind()
    }
    fn locale(&self) -> &Locale {
        self.inner.locale()
    }
    fn suggestions(
        &self,
        input: &ComposedInput,
        context: &NgramContext,
        settings: &SettingsSnapshot,
        session_id: SessionId,
        locale_weight: f32,
    ) -> Vec<Candidate> {
        self.inner
            .suggestions(input, context, settings, session_id, locale_weight)
    }
    fn frequency(&self, word: &str) -> i32 {
        self.inner.frequency(word)
    }
    fn is_valid_word(&self, word: &str) -> bool {
        self.inner.is_valid_word(word)
    }
    fn is_in_dictionary(&self, word: &str) -> bool {
        self.inner.is_in_dictionary(word)
    }
}

impl LearnableDictionary for ReadOnlyWords {
    fn add_entry(&self, _word: &str, _context: &NgramContext, _is_valid: bool, _timestamp: i64) {}

    fn remove_entry(&self, _word: &str) -> bool {
        false // the backing store cannot forget entries
    }

    fn clear(&self) {}

    fn entry_count(&self) -> usize {
        self.inner.valid_words.len()
    }
}

type SubKey = (DictionaryKind, String);

/// A factory serving pre-built dictionaries, counting main-dictionary
/// creations for reuse assertions.
#[derive(Default)]
pub struct StubFactory {
    mains: Mutex<HashMap<String, Arc<dyn Dictionary>>>,
    subs: Mutex<HashMap<SubKey, Arc<dyn LearnableDictionary>>>,
    secondary: Vec<Locale>,
    pub create_main_calls: AtomicUsize,
}

impl StubFactory {
    pub fn new() -> Self {
        StubFactory::default()
    }

    pub fn with_main(self, locale: &str, dict: Arc<dyn Dictionary>) -> Self {
        self.mains
            .lock()
            .unwrap()
            .insert(locale.to_string(), dict);
        self
    }

    pub fn with_sub(
        self,
        kind: DictionaryKind,
        locale: &str,
        dict: Arc<dyn LearnableDictionary>,
    ) -> Self {
        self.subs
            .lock()
            .unwrap()
            .insert((kind, locale.to_string()), dict);
        self
    }

    pub fn with_secondary(mut self, locale: &str) -> Self {
        self.secondary.push(Locale::new(locale));
        self
    }
}

impl DictionaryFactory for StubFactory {
    fn create_main(&self, locale: &Locale) -> Result<Arc<dyn Dictionary>, DictionaryError> {
        self.create_main_calls.fetch_add(1, Ordering::SeqCst);
        self.mains
            .lock()
            .unwrap()
            .get(locale.tag())
            .cloned()
            .ok_or_else(|| DictionaryError::NotAvailable(locale.clone()))
    }

    fn create_sub(
        &self,
        kind: DictionaryKind,
        locale: &Locale,
    ) -> Option<Arc<dyn LearnableDictionary>> {
        self.subs
            .lock()
            .unwrap()
            .get(&(kind, locale.tag().to_string()))
            .cloned()
    }

    fn secondary_locales(&self, _main: &Locale) -> Vec<Locale> {
        self.secondary.clone()
    }

    fn blacklist_for(&self, _locale: &Locale) -> Arc<Blacklist> {
        Arc::new(Blacklist::in_memory())
    }
}
