//! One language's dictionaries, confidence and blacklist.
//!
//! A `DictionaryGroup` bundles the main dictionary and the mutable
//! sub-dictionaries for a single locale, together with:
//! - a `Confidence` counter driving multilingual score weighting
//! - a `Blacklist` of removed words, authoritative in memory with durable
//!   writes trailing in the background

use crate::candidate::{
    Candidate, DictionaryKind, Locale, ALL_DICTIONARY_KINDS,
};
use crate::composer::ComposedInput;
use crate::dictionary::{Dictionary, LearnableDictionary, SessionId};
use crate::ngram::NgramContext;
use crate::settings::SettingsSnapshot;
use crate::text;
use ahash::AHashSet;
use redb::ReadableTable;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock};
use tracing::{error, warn};

/// Ceiling the confidence counter snaps back to when decreasing.
pub const MAX_CONFIDENCE: i32 = 2;
/// Confidence a freshly built group starts with.
pub const INITIAL_CONFIDENCE: i32 = 1;
/// Weight discount step per missing confidence point while gesturing.
pub const WEIGHT_STEP_GESTURING: f32 = 0.05;
/// Weight discount step per missing confidence point while typing.
pub const WEIGHT_STEP_TYPING: f32 = 0.15;

/// How sure we are that the user is currently typing in this group's
/// language: the number of words from this language committed in a row.
///
/// Increasing is unbounded so a long monolingual streak takes several
/// words from the other language to break. Decreasing from above the
/// ceiling first snaps to `MAX_CONFIDENCE`, then steps down to zero.
#[derive(Debug)]
pub struct Confidence(AtomicI32);

impl Confidence {
    pub fn new(value: i32) -> Self {
        Confidence(AtomicI32::new(value.max(0)))
    }

    pub fn get(&self) -> i32 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn increase(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrease(&self) {
        let current = self.0.load(Ordering::Relaxed);
        let next = if current > MAX_CONFIDENCE {
            MAX_CONFIDENCE
        } else if current > 0 {
            current - 1
        } else {
            return;
        };
        self.0.store(next, Ordering::Relaxed);
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Confidence::new(INITIAL_CONFIDENCE)
    }
}

const BLACKLIST_TABLE: redb::TableDefinition<&str, ()> = redb::TableDefinition::new("blacklist");

/// Durable storage for one locale's blacklist.
struct BlacklistStore {
    db: redb::Database,
}

impl BlacklistStore {
    fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = redb::Database::create(path)?;
        // make sure the table exists so loading an empty store succeeds
        let txn = db.begin_write()?;
        txn.open_table(BLACKLIST_TABLE)?;
        txn.commit()?;
        Ok(BlacklistStore { db })
    }

    fn load(&self) -> anyhow::Result<Vec<String>> {
        let mut out = Vec::new();
        let txn = self.db.begin_read()?;
        let table = txn.open_table(BLACKLIST_TABLE)?;
        for item in table.iter()? {
            let (word, _) = item?;
            out.push(word.value().to_string());
        }
        Ok(out)
    }

    fn insert(&self, word: &str) -> anyhow::Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(BLACKLIST_TABLE)?;
            table.insert(word, ())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn remove(&self, word: &str) -> anyhow::Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(BLACKLIST_TABLE)?;
            table.remove(word)?;
        }
        txn.commit()?;
        Ok(())
    }
}

enum BlacklistOp {
    Insert(String),
    Remove(String),
}

/// FIFO queue of durable writes, drained by a short-lived background
/// thread. Keeps add/remove ordering while the caller never blocks.
#[derive(Default)]
struct WriteQueue {
    state: Mutex<(std::collections::VecDeque<BlacklistOp>, bool)>,
    drained: Condvar,
}

/// Words suppressed from suggestions even though a backing dictionary still
/// contains them (some member dictionaries cannot have entries removed).
///
/// The in-memory set is the source of truth for reads; disk writes are
/// fire-and-forget and only ever lag behind. A write failure is logged and
/// swallowed; it must never fail a suggestion query.
pub struct Blacklist {
    words: RwLock<AHashSet<String>>,
    store: Option<Arc<BlacklistStore>>,
    queue: Arc<WriteQueue>,
}

impl Blacklist {
    /// A volatile blacklist with no durable backing.
    pub fn in_memory() -> Self {
        Blacklist {
            words: RwLock::new(AHashSet::new()),
            store: None,
            queue: Arc::new(WriteQueue::default()),
        }
    }

    /// Open (or create) the durable store at `path` and load its words.
    /// Falls back to an in-memory blacklist if the store cannot be opened.
    pub fn persistent(path: &Path) -> Self {
        match BlacklistStore::open(path) {
            Ok(store) => {
                let words = match store.load() {
                    Ok(words) => words.into_iter().collect(),
                    Err(e) => {
                        error!("failed to read blacklist from {}: {e}", path.display());
                        AHashSet::new()
                    }
                };
                Blacklist {
                    words: RwLock::new(words),
                    store: Some(Arc::new(store)),
                    queue: Arc::new(WriteQueue::default()),
                }
            }
            Err(e) => {
                error!("failed to open blacklist store {}: {e}", path.display());
                Blacklist::in_memory()
            }
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        match self.words.read() {
            Ok(words) => words.contains(word),
            Err(poisoned) => poisoned.into_inner().contains(word),
        }
    }

    /// Add a word. Returns false if it was already blacklisted.
    pub fn add(&self, word: &str) -> bool {
        let word = text::normalize(word);
        if word.is_empty() {
            return false;
        }
        let inserted = match self.words.write() {
            Ok(mut words) => words.insert(word.clone()),
            Err(poisoned) => poisoned.into_inner().insert(word.clone()),
        };
        if inserted {
            self.enqueue(BlacklistOp::Insert(word));
        }
        inserted
    }

    /// Remove a word. Returns false if it was not blacklisted.
    pub fn remove(&self, word: &str) -> bool {
        let word = text::normalize(word);
        let removed = match self.words.write() {
            Ok(mut words) => words.remove(&word),
            Err(poisoned) => poisoned.into_inner().remove(&word),
        };
        if removed {
            self.enqueue(BlacklistOp::Remove(word));
        }
        removed
    }

    /// Fire-and-forget durable write. The in-memory set has already been
    /// updated; a write failure is logged and swallowed.
    fn enqueue(&self, op: BlacklistOp) {
        let Some(store) = &self.store else {
            return;
        };
        let spawn_drainer = {
            let mut state = self.queue.state.lock().unwrap_or_else(|p| p.into_inner());
            state.0.push_back(op);
            if state.1 {
                false
            } else {
                state.1 = true;
                true
            }
        };
        if !spawn_drainer {
            return;
        }
        let store = Arc::clone(store);
        let queue = Arc::clone(&self.queue);
        std::thread::spawn(move || loop {
            let op = {
                let mut state = queue.state.lock().unwrap_or_else(|p| p.into_inner());
                match state.0.pop_front() {
                    Some(op) => op,
                    None => {
                        // release our store handle before announcing
                        // drained, so a shutdown waiter can hand the file
                        // over immediately
                        drop(store);
                        state.1 = false;
                        queue.drained.notify_all();
                        break;
                    }
                }
            };
            let result = match &op {
                BlacklistOp::Insert(word) => store.insert(word),
                BlacklistOp::Remove(word) => store.remove(word),
            };
            if let Err(e) = result {
                let word = match &op {
                    BlacklistOp::Insert(word) | BlacklistOp::Remove(word) => word,
                };
                error!("failed to persist blacklist change for {word:?}: {e}");
            }
        });
    }

    /// Block until all queued durable writes have landed. Only needed when
    /// handing the store over (shutdown, tests); reads never wait.
    pub fn wait_for_pending_writes(&self, timeout: std::time::Duration) -> bool {
        let state = self.queue.state.lock().unwrap_or_else(|p| p.into_inner());
        let (_state, result) = self
            .queue
            .drained
            .wait_timeout_while(state, timeout, |state| !state.0.is_empty() || state.1)
            .unwrap_or_else(|p| p.into_inner());
        !result.timed_out()
    }

    pub fn len(&self) -> usize {
        match self.words.read() {
            Ok(words) => words.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A group of dictionaries that work together for a single language.
pub struct DictionaryGroup {
    locale: Locale,
    main: RwLock<Option<Arc<dyn Dictionary>>>,
    sub_dicts: HashMap<DictionaryKind, Arc<dyn LearnableDictionary>>,
    confidence: Confidence,
    blacklist: Arc<Blacklist>,
}

impl DictionaryGroup {
    pub fn new(
        locale: Locale,
        main: Option<Arc<dyn Dictionary>>,
        sub_dicts: HashMap<DictionaryKind, Arc<dyn LearnableDictionary>>,
        blacklist: Arc<Blacklist>,
    ) -> Self {
        DictionaryGroup {
            locale,
            main: RwLock::new(main),
            sub_dicts,
            confidence: Confidence::default(),
            blacklist,
        }
    }

    /// The placeholder group of a facilitator with no active language.
    pub fn empty() -> Self {
        DictionaryGroup::new(
            Locale::empty(),
            None,
            HashMap::new(),
            Arc::new(Blacklist::in_memory()),
        )
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn confidence(&self) -> i32 {
        self.confidence.get()
    }

    pub fn increase_confidence(&self) {
        self.confidence.increase();
    }

    pub fn decrease_confidence(&self) {
        self.confidence.decrease();
    }

    pub fn blacklist(&self) -> &Arc<Blacklist> {
        &self.blacklist
    }

    // --------------- dictionary handling -------------------

    pub fn main_dictionary(&self) -> Option<Arc<dyn Dictionary>> {
        match self.main.read() {
            Ok(main) => main.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Install a (re)loaded main dictionary, closing the previous one if it
    /// is being replaced.
    pub fn set_main_dictionary(&self, new_main: Option<Arc<dyn Dictionary>>) {
        let old = {
            let mut main = match self.main.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::replace(&mut *main, new_main.clone())
        };
        if let (Some(old), new) = (old, new_main) {
            let replaced = match new {
                Some(new) => !Arc::ptr_eq(&old, &new),
                None => true,
            };
            if replaced {
                old.close();
            }
        }
    }

    pub fn get_dict(&self, kind: DictionaryKind) -> Option<Arc<dyn Dictionary>> {
        if kind == DictionaryKind::Main {
            return self.main_dictionary();
        }
        self.sub_dicts.get(&kind).map(|d| {
            let dict: Arc<dyn Dictionary> = d.clone();
            dict
        })
    }

    pub fn sub_dict(&self, kind: DictionaryKind) -> Option<&Arc<dyn LearnableDictionary>> {
        self.sub_dicts.get(&kind)
    }

    pub fn has_dict(&self, kind: DictionaryKind) -> bool {
        if kind == DictionaryKind::Main {
            return self.main_dictionary().is_some();
        }
        self.sub_dicts.contains_key(&kind)
    }

    pub fn has_initialized_main(&self) -> bool {
        self.main_dictionary().is_some_and(|d| d.is_initialized())
    }

    pub fn close_dict(&self, kind: DictionaryKind) {
        if kind == DictionaryKind::Main {
            if let Some(main) = self.main_dictionary() {
                main.close();
            }
        } else if let Some(dict) = self.sub_dicts.get(&kind) {
            dict.close();
        }
    }

    // --------------- word state -------------------

    pub fn is_blacklisted(&self, word: &str) -> bool {
        self.blacklist.contains(word)
    }

    pub fn add_to_blacklist(&self, word: &str) {
        self.blacklist.add(word);
    }

    pub fn remove_from_blacklist(&self, word: &str) {
        self.blacklist.remove(word);
    }

    /// Whether any member dictionary validates the word. Blacklisted words
    /// are never valid, whatever the dictionaries say.
    pub fn is_valid_word(&self, word: &str) -> bool {
        if word.is_empty() || self.is_blacklisted(word) {
            return false;
        }
        ALL_DICTIONARY_KINDS
            .iter()
            .any(|&kind| self.get_dict(kind).is_some_and(|d| d.is_valid_word(word)))
    }

    /// Removes a word from all dictionaries in this group. If the word is
    /// in a read-only dictionary, it is blacklisted instead.
    pub fn remove_word(&self, word: &str) {
        if let Some(history) = self.sub_dict(DictionaryKind::UserHistory) {
            history.remove_entry(word);
        }
        if let Some(user) = self.sub_dict(DictionaryKind::User) {
            user.remove_entry(word);
        }

        for kind in [DictionaryKind::Contacts, DictionaryKind::Apps] {
            if let Some(dict) = self.sub_dict(kind) {
                if dict.is_in_dictionary(word) {
                    // gone until the next reload of the source data
                    dict.remove_entry(word);
                    self.add_to_blacklist(word);
                    return;
                }
            }
        }

        let Some(main) = self.main_dictionary() else {
            return;
        };
        if main.is_valid_word(word) {
            self.add_to_blacklist(word);
            return;
        }
        let lowercase = word.to_lowercase();
        if main.is_valid_word(&lowercase) {
            self.add_to_blacklist(&lowercase);
        }
    }

    // --------------- weighting & queries -------------------

    /// The score weight of this group given every active group's
    /// confidence. A single group always weighs 1. Low-confidence groups
    /// are discounted smoothly so a strong candidate from a secondary
    /// language can still surface; a group tied with or beaten by another
    /// takes a flat half-step discount.
    pub fn weight_for_locale(&self, groups: &[Arc<DictionaryGroup>], is_gesturing: bool) -> f32 {
        let step = if is_gesturing {
            WEIGHT_STEP_GESTURING
        } else {
            WEIGHT_STEP_TYPING
        };
        self.weight_for_locale_with_step(groups, step)
    }

    fn weight_for_locale_with_step(&self, groups: &[Arc<DictionaryGroup>], step: f32) -> f32 {
        if groups.len() == 1 {
            return 1.0;
        }
        let confidence = self.confidence.get();
        if confidence < MAX_CONFIDENCE {
            return 1.0 - step * (MAX_CONFIDENCE - confidence) as f32;
        }
        for group in groups {
            if !std::ptr::eq(group.as_ref(), self) && group.confidence() >= confidence {
                return 1.0 - step / 2.0;
            }
        }
        1.0
    }

    /// Query every member dictionary in priority order, applying the
    /// group's locale weight and filtering blacklisted words. During
    /// gesture decoding, candidates from the main and history dictionaries
    /// are additionally checked against the dictionary itself: fuzzy
    /// decoders can emit garbage that is not actually an entry.
    pub fn suggestions(
        &self,
        groups: &[Arc<DictionaryGroup>],
        input: &ComposedInput,
        context: &NgramContext,
        settings: &SettingsSnapshot,
        session_id: SessionId,
    ) -> Vec<Candidate> {
        let weight = self.weight_for_locale(groups, input.is_batch_mode);
        let mut suggestions = Vec::new();
        for kind in ALL_DICTIONARY_KINDS {
            if kind == DictionaryKind::Emoji && !settings.suggest_emojis {
                continue;
            }
            let Some(dictionary) = self.get_dict(kind) else {
                continue;
            };
            let check_for_garbage = input.is_batch_mode
                && matches!(kind, DictionaryKind::UserHistory | DictionaryKind::Main);
            for candidate in
                dictionary.suggestions(input, context, settings, session_id, weight)
            {
                if groups.iter().any(|g| g.is_blacklisted(&candidate.word)) {
                    continue;
                }
                if check_for_garbage
                    && candidate.char_count() > 2
                    && candidate.source == kind
                    && !text::might_be_emoji(&candidate.word)
                    && !dictionary.is_in_dictionary(&candidate.word)
                {
                    warn!(
                        "dropping unverifiable gesture candidate {:?} from {} dictionary",
                        candidate.word, kind
                    );
                    continue;
                }
                if candidate.char_count() == 1
                    && candidate.source == DictionaryKind::Emoji
                    && !text::might_be_emoji(&candidate.word)
                {
                    continue;
                }
                suggestions.push(candidate);
            }
        }
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_never_goes_below_zero() {
        let c = Confidence::new(1);
        c.decrease();
        c.decrease();
        c.decrease();
        assert_eq!(c.get(), 0);
    }

    #[test]
    fn confidence_snaps_to_max_from_above() {
        let c = Confidence::new(0);
        for _ in 0..7 {
            c.increase();
        }
        assert_eq!(c.get(), 7);
        c.decrease();
        assert_eq!(c.get(), MAX_CONFIDENCE);
        c.decrease();
        assert_eq!(c.get(), MAX_CONFIDENCE - 1);
        c.decrease();
        c.decrease();
        assert_eq!(c.get(), 0);
    }

    #[test]
    fn single_group_always_weighs_one() {
        let group = Arc::new(DictionaryGroup::empty());
        let groups = vec![group.clone()];
        for _ in 0..5 {
            assert_eq!(group.weight_for_locale(&groups, false), 1.0);
            assert_eq!(group.weight_for_locale(&groups, true), 1.0);
            group.decrease_confidence();
        }
    }

    #[test]
    fn low_confidence_group_is_discounted() {
        let a = Arc::new(DictionaryGroup::empty());
        let b = Arc::new(DictionaryGroup::empty());
        let groups = vec![a.clone(), b.clone()];

        // b at confidence 0: two full steps below the ceiling
        b.decrease_confidence();
        assert_eq!(b.confidence(), 0);
        let w = b.weight_for_locale(&groups, false);
        assert!((w - (1.0 - 2.0 * WEIGHT_STEP_TYPING)).abs() < 1e-6);
        let w = b.weight_for_locale(&groups, true);
        assert!((w - (1.0 - 2.0 * WEIGHT_STEP_GESTURING)).abs() < 1e-6);
    }

    #[test]
    fn confident_group_tied_with_other_takes_half_step() {
        let a = Arc::new(DictionaryGroup::empty());
        let b = Arc::new(DictionaryGroup::empty());
        let groups = vec![a.clone(), b.clone()];
        a.increase_confidence(); // 2
        b.increase_confidence(); // 2
        let w = a.weight_for_locale(&groups, false);
        assert!((w - (1.0 - WEIGHT_STEP_TYPING / 2.0)).abs() < 1e-6);
    }

    #[test]
    fn clearly_leading_group_keeps_full_weight() {
        let a = Arc::new(DictionaryGroup::empty());
        let b = Arc::new(DictionaryGroup::empty());
        let groups = vec![a.clone(), b.clone()];
        a.increase_confidence();
        a.increase_confidence(); // 3
        b.decrease_confidence(); // 0
        assert_eq!(a.weight_for_locale(&groups, false), 1.0);
    }

    #[test]
    fn blacklist_add_remove_in_memory() {
        let b = Blacklist::in_memory();
        assert!(b.add("word"));
        assert!(!b.add("word"));
        assert!(b.contains("word"));
        assert!(b.remove("word"));
        assert!(!b.remove("word"));
        assert!(!b.contains("word"));
    }

    #[test]
    fn blacklist_normalizes_words() {
        let b = Blacklist::in_memory();
        b.add("e\u{301}clair"); // NFD input
        assert!(b.contains("éclair"));
    }
}
