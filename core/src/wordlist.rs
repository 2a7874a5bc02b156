//! Read-only word-list dictionary backed by FST + bincode.
//!
//! A reference `Dictionary` implementation for main-dictionary slots: an
//! `fst::Map` indexes words to payload positions, and a bincode-serialized
//! entry vector carries frequency and whitelist metadata. The two-file
//! on-disk layout (`.fst` + `.bin`) matches how the lexicon artifacts of
//! the conversion tools are stored.
//!
//! Lookup is exact-match plus prefix completion; typo expansion belongs to
//! real decoder engines, not to this reference implementation.

use crate::candidate::{Candidate, CandidateKind, DictionaryKind, Locale, MAX_SCORE};
use crate::composer::ComposedInput;
use crate::dictionary::{Dictionary, SessionId, NOT_A_PROBABILITY};
use crate::error::DictionaryError;
use crate::ngram::NgramContext;
use crate::settings::SettingsSnapshot;
use fst::{IntoStreamer, Streamer};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;

/// Score scale for exact matches, before the frequency contribution.
const EXACT_MATCH_SCORE: i32 = 1_400_000;
/// Score scale for prefix completions, before the frequency contribution.
const COMPLETION_SCORE: i32 = 500_000;
/// Most completions a single query will emit.
const MAX_COMPLETIONS: usize = 32;

/// One word of the list: unigram probability (0..=255) plus whether the
/// word is a whitelisted replacement target (offered at maximum score for
/// near-identical typed words, like "ill" -> "I'll").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub freq: u8,
    pub whitelisted: bool,
}

impl WordEntry {
    pub fn new<T: Into<String>>(word: T, freq: u8) -> Self {
        WordEntry {
            word: word.into(),
            freq,
            whitelisted: false,
        }
    }

    pub fn whitelisted<T: Into<String>>(word: T, freq: u8) -> Self {
        WordEntry {
            word: word.into(),
            freq,
            whitelisted: true,
        }
    }
}

/// A read-only main dictionary over a fixed word list.
pub struct WordListDictionary {
    locale: Locale,
    index: fst::Map<Vec<u8>>,
    entries: Vec<WordEntry>,
}

impl WordListDictionary {
    /// Build from in-memory entries.
    pub fn from_entries(
        locale: Locale,
        mut entries: Vec<WordEntry>,
    ) -> Result<Self, DictionaryError> {
        entries.sort_by(|a, b| a.word.cmp(&b.word));
        entries.dedup_by(|a, b| a.word == b.word);
        let index = fst::Map::from_iter(
            entries
                .iter()
                .enumerate()
                .map(|(i, e)| (e.word.as_bytes(), i as u64)),
        )
        .map_err(|e| DictionaryError::Malformed {
            locale: locale.clone(),
            reason: format!("fst build: {e}"),
        })?;
        Ok(WordListDictionary {
            locale,
            index,
            entries,
        })
    }

    /// Load from the two-file artifact layout: an FST index file and a
    /// bincode payload file holding `Vec<WordEntry>`.
    pub fn load<P: AsRef<std::path::Path>>(
        locale: Locale,
        fst_path: P,
        payload_path: P,
    ) -> Result<Self, DictionaryError> {
        let mut buf = Vec::new();
        File::open(fst_path.as_ref())?.read_to_end(&mut buf)?;
        let index = fst::Map::new(buf).map_err(|e| DictionaryError::Malformed {
            locale: locale.clone(),
            reason: format!("fst index: {e}"),
        })?;

        let mut buf = Vec::new();
        File::open(payload_path.as_ref())?.read_to_end(&mut buf)?;
        let entries: Vec<WordEntry> =
            bincode::deserialize(&buf).map_err(|e| DictionaryError::Malformed {
                locale: locale.clone(),
                reason: format!("payload: {e}"),
            })?;

        Ok(WordListDictionary {
            locale,
            index,
            entries,
        })
    }

    /// Build from `word[\t freq]` lines, one entry per line. Lines starting
    /// with `#` are skipped. A missing frequency defaults to 128.
    pub fn from_word_list(locale: Locale, text: &str) -> Result<Self, DictionaryError> {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| {
                let mut parts = line.split_whitespace();
                let word = parts.next().unwrap_or_default();
                let freq = parts.next().and_then(|f| f.parse().ok()).unwrap_or(128u8);
                WordEntry::new(word, freq)
            })
            .collect();
        WordListDictionary::from_entries(locale, entries)
    }

    fn entry(&self, word: &str) -> Option<&WordEntry> {
        let idx = self.index.get(word.as_bytes())? as usize;
        self.entries.get(idx)
    }

    /// Entries whose word starts with `prefix`, excluding the exact match.
    fn completions(&self, prefix: &str) -> Vec<&WordEntry> {
        let mut out = Vec::new();
        let mut stream = self.index.range().ge(prefix.as_bytes()).into_stream();
        while let Some((key, idx)) = stream.next() {
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            if key == prefix.as_bytes() {
                continue;
            }
            if let Some(entry) = self.entries.get(idx as usize) {
                out.push(entry);
            }
            if out.len() >= MAX_COMPLETIONS {
                break;
            }
        }
        out
    }

    fn scaled(score: i32, weight: f32) -> i32 {
        (score as f32 * weight) as i32
    }

    /// Case- and apostrophe-insensitive equality, for whitelist matches.
    fn folded_eq(a: &str, b: &str) -> bool {
        fn fold(s: &str) -> impl Iterator<Item = char> + '_ {
            s.chars().filter(|&c| c != '\'').flat_map(char::to_lowercase)
        }
        fold(a).eq(fold(b))
    }
}

impl Dictionary for WordListDictionary {
    fn kind(&self) -> DictionaryKind {
        DictionaryKind::Main
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
        let typed = &input.typed_word;
        if typed.is_empty() {
            // a plain word list has no context model
            return Vec::new();
        }
        let mut out = Vec::new();

        // whitelist replacements for near-identical typed forms
        for entry in self.entries.iter().filter(|e| e.whitelisted) {
            if Self::folded_eq(&entry.word, typed) && entry.word != *typed {
                out.push(Candidate::new(
                    entry.word.clone(),
                    MAX_SCORE,
                    CandidateKind::Whitelist,
                    DictionaryKind::Main,
                    self.locale.clone(),
                ));
            }
        }

        for query in [typed.clone(), crate::text::decapitalize(typed)] {
            if let Some(entry) = self.entry(&query) {
                let score = EXACT_MATCH_SCORE + entry.freq as i32 * 400;
                out.push(Candidate::new(
                    entry.word.clone(),
                    Self::scaled(score, locale_weight),
                    CandidateKind::Correction,
                    DictionaryKind::Main,
                    self.locale.clone(),
                ));
            }
            for entry in self.completions(&query) {
                let score = COMPLETION_SCORE + entry.freq as i32 * 400;
                out.push(Candidate::new(
                    entry.word.clone(),
                    Self::scaled(score, locale_weight),
                    CandidateKind::Completion,
                    DictionaryKind::Main,
                    self.locale.clone(),
                ));
            }
            if query == *typed {
                // skip the decapitalized pass when it changes nothing
                if crate::text::decapitalize(typed) == *typed {
                    break;
                }
            }
        }
        out
    }

    fn frequency(&self, word: &str) -> i32 {
        match self.entry(word) {
            Some(entry) => entry.freq as i32,
            None => NOT_A_PROBABILITY,
        }
    }

    fn is_valid_word(&self, word: &str) -> bool {
        self.entry(word).is_some()
    }

    fn is_in_dictionary(&self, word: &str) -> bool {
        self.is_valid_word(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> WordListDictionary {
        WordListDictionary::from_entries(
            Locale::new("en"),
            vec![
                WordEntry::new("the", 255),
                WordEntry::new("then", 180),
                WordEntry::new("there", 200),
                WordEntry::new("world", 150),
                WordEntry::whitelisted("I'll", 120),
            ],
        )
        .unwrap()
    }

    fn query(d: &WordListDictionary, typed: &str) -> Vec<Candidate> {
        d.suggestions(
            &ComposedInput::typing(typed),
            &NgramContext::empty(),
            &SettingsSnapshot::default(),
            0,
            1.0,
        )
    }

    #[test]
    fn exact_match_outranks_completions() {
        let results = query(&dict(), "the");
        let exact = results.iter().find(|c| c.word == "the").unwrap();
        let completion = results.iter().find(|c| c.word == "there").unwrap();
        assert_eq!(exact.kind, CandidateKind::Correction);
        assert_eq!(completion.kind, CandidateKind::Completion);
        assert!(exact.score > completion.score);
    }

    #[test]
    fn whitelist_surfaces_at_max_score() {
        let results = query(&dict(), "ill");
        let wl = results.iter().find(|c| c.word == "I'll").unwrap();
        assert_eq!(wl.kind, CandidateKind::Whitelist);
        assert_eq!(wl.score, MAX_SCORE);
    }

    #[test]
    fn capitalized_typed_word_finds_lowercase_entry() {
        let results = query(&dict(), "World");
        assert!(results.iter().any(|c| c.word == "world"));
    }

    #[test]
    fn frequency_and_validity() {
        let d = dict();
        assert_eq!(d.frequency("the"), 255);
        assert_eq!(d.frequency("nope"), NOT_A_PROBABILITY);
        assert!(d.is_valid_word("then"));
        assert!(!d.is_valid_word("thenx"));
    }

    #[test]
    fn word_list_text_parsing() {
        let d = WordListDictionary::from_word_list(
            Locale::new("en"),
            "# comment\nthe 255\nworld\n\n",
        )
        .unwrap();
        assert_eq!(d.frequency("the"), 255);
        assert_eq!(d.frequency("world"), 128);
    }

    #[test]
    fn bincode_payload_round_trip() {
        let entries = vec![WordEntry::new("alpha", 10), WordEntry::whitelisted("Beta", 20)];
        let bytes = bincode::serialize(&entries).unwrap();
        let back: Vec<WordEntry> = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].word, "alpha");
        assert!(back[1].whitelisted);
    }
}
