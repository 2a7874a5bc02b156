//! Multi-group dictionary ownership and fused suggestion queries.
//!
//! The `DictionaryFacilitator` owns one `DictionaryGroup` per active input
//! language. It rebuilds the group list when the language set or settings
//! change (reusing loaded dictionaries where possible), fans suggestion
//! queries out across all groups, merges the results, and runs the
//! confidence state machine that tracks which language the user is
//! currently typing in.
//!
//! The group list lives behind a single swapped `Arc`: a concurrent query
//! sees either the fully-old or the fully-new list, never a mix.

use crate::candidate::{
    Candidate, DictionaryKind, Locale, ALL_DICTIONARY_KINDS, DYNAMIC_DICTIONARY_KINDS,
};
use crate::composer::ComposedInput;
use crate::dictionary::{
    Dictionary, DictionaryInitializationListener, DictionaryStats, LearnableDictionary,
    SessionId, NOT_A_PROBABILITY,
};
use crate::error::DictionaryError;
use crate::group::{Blacklist, DictionaryGroup};
use crate::ngram::NgramContext;
use crate::results::SuggestionResults;
use crate::settings::SettingsSnapshot;
use crate::text;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::time::Duration;
use tracing::{info, warn};

/// Builds the dictionaries a facilitator asks for. Implementations decide
/// where dictionary data lives (asset files, content providers, test
/// stubs) and which secondary locales an input variant declares.
pub trait DictionaryFactory: Send + Sync {
    /// Create the main dictionary for a locale. Called from a background
    /// task; may block on I/O.
    fn create_main(&self, locale: &Locale) -> Result<Arc<dyn Dictionary>, DictionaryError>;

    /// Create a mutable sub-dictionary, or `None` if the kind is not
    /// available for this locale.
    fn create_sub(
        &self,
        kind: DictionaryKind,
        locale: &Locale,
    ) -> Option<Arc<dyn LearnableDictionary>>;

    /// Additional locales to serve alongside the main one.
    fn secondary_locales(&self, _main: &Locale) -> Vec<Locale> {
        Vec::new()
    }

    /// The blacklist for a locale. Defaults to a volatile one; persistent
    /// deployments return `Blacklist::persistent` stores.
    fn blacklist_for(&self, _locale: &Locale) -> Arc<Blacklist> {
        Arc::new(Blacklist::in_memory())
    }
}

/// History unlearning trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlearnEvent {
    /// The word was erased with backspace.
    Backspace,
    /// An autocorrection was reverted.
    Revert,
}

/// Lowercase main-dictionary probability above which the capitalized form
/// of a word is considered a distracter and stored lowercased.
const CAPITALIZED_FORM_MAX_PROBABILITY_FOR_INSERT: i32 = 140;
/// History frequency a not-in-any-dictionary word must exceed before it is
/// auto-added to the personal dictionary (roughly three uses).
const AUTO_ADD_MIN_HISTORY_FREQUENCY: i32 = 120;

/// A one-shot count-down gate for waiting on background dictionary loads.
struct Latch {
    remaining: Mutex<usize>,
    condvar: Condvar,
}

impl Latch {
    fn new(count: usize) -> Self {
        Latch {
            remaining: Mutex::new(count),
            condvar: Condvar::new(),
        }
    }

    fn count_down(&self) {
        let mut remaining = match self.remaining.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            self.condvar.notify_all();
        }
    }

    /// Returns true if the latch reached zero within the timeout.
    fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = match self.remaining.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let (guard, result) = self
            .condvar
            .wait_timeout_while(guard, timeout, |remaining| *remaining > 0)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        drop(guard);
        !result.timed_out()
    }
}

type Groups = Arc<Vec<Arc<DictionaryGroup>>>;

/// Facilitates interaction with all active dictionaries: instantiates and
/// selects them per language and settings, updates entries, and fuses
/// suggestion queries across languages.
pub struct DictionaryFacilitator {
    groups: RwLock<Groups>,
    factory: Arc<dyn DictionaryFactory>,
    load_latch: Mutex<Arc<Latch>>,
    /// Pending from→to substitution for auto-capitalized words whose
    /// decapitalized form was stored in history (applied retroactively to
    /// sentence-start n-gram contexts).
    pending_case_change: Mutex<Option<(String, String)>>,
}

impl DictionaryFacilitator {
    pub fn new(factory: Arc<dyn DictionaryFactory>) -> Self {
        DictionaryFacilitator {
            groups: RwLock::new(Arc::new(vec![Arc::new(DictionaryGroup::empty())])),
            factory,
            load_latch: Mutex::new(Arc::new(Latch::new(0))),
            pending_case_change: Mutex::new(None),
        }
    }

    fn groups_snapshot(&self) -> Groups {
        match self.groups.read() {
            Ok(groups) => groups.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn swap_groups(&self, new_groups: Groups) -> Groups {
        let mut guard = match self.groups.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, new_groups)
    }

    /// Whether any language is active.
    pub fn is_active(&self) -> bool {
        !self.groups_snapshot()[0].locale().is_empty()
    }

    /// The primary input locale.
    pub fn main_locale(&self) -> Locale {
        self.groups_snapshot()[0].locale().clone()
    }

    /// The locale of the currently preferred group: the language the user
    /// is most likely typing in right now.
    pub fn current_locale(&self) -> Locale {
        self.currently_preferred_group().locale().clone()
    }

    pub fn is_for_locale(&self, locale: &Locale) -> bool {
        self.groups_snapshot()[0].locale() == locale
    }

    /// Whether a rebuild with these inputs would produce the same group
    /// structure as the current one.
    pub fn uses_same_settings(&self, locales: &[Locale], settings: &SettingsSnapshot) -> bool {
        let groups = self.groups_snapshot();
        let first = &groups[0];
        settings.use_contacts == first.has_dict(DictionaryKind::Contacts)
            && settings.use_apps == first.has_dict(DictionaryKind::Apps)
            && settings.use_personalized_dicts == first.has_dict(DictionaryKind::UserHistory)
            && locales.len() == groups.len()
            && locales
                .iter()
                .all(|l| groups.iter().any(|g| g.locale() == l))
    }

    // -------------- managing (loading & closing) dictionaries ------------

    /// Rebuild the group list for a new primary locale, reusing loaded
    /// dictionaries where the (locale, kind) pair is unchanged. Main
    /// dictionaries that need (re)loading are loaded on a background task;
    /// `listener` is told about main-dictionary availability synchronously
    /// and again when the background load finishes.
    pub fn reset_dictionaries(
        self: &Arc<Self>,
        new_locale: &Locale,
        settings: &SettingsSnapshot,
        force_reload_main_dictionary: bool,
        listener: Option<Arc<dyn DictionaryInitializationListener>>,
    ) {
        info!(
            "resetting dictionaries for {new_locale}, force reloading main: {}",
            force_reload_main_dictionary
        );

        let mut locales = vec![new_locale.clone()];
        for secondary in self.factory.secondary_locales(new_locale) {
            if !locales.contains(&secondary) {
                locales.push(secondary);
            }
        }

        let mut sub_kinds = vec![DictionaryKind::User];
        if settings.use_apps {
            sub_kinds.push(DictionaryKind::Apps);
        }
        if settings.use_personalized_dicts {
            sub_kinds.push(DictionaryKind::UserHistory);
        }
        if settings.use_contacts {
            sub_kinds.push(DictionaryKind::Contacts);
        }
        if settings.suggest_emojis {
            sub_kinds.push(DictionaryKind::Emoji);
        }

        let old_groups = self.groups_snapshot();

        // Everything currently loaded is a cleanup candidate until a new
        // group claims it for reuse.
        let mut dicts_to_cleanup: HashMap<Locale, Vec<DictionaryKind>> = HashMap::new();
        for group in old_groups.iter() {
            let kinds = ALL_DICTIONARY_KINDS
                .into_iter()
                .filter(|&k| group.has_dict(k))
                .collect();
            dicts_to_cleanup.insert(group.locale().clone(), kinds);
        }

        let mut new_groups = Vec::with_capacity(locales.len());
        for locale in &locales {
            let old_group = old_groups.iter().find(|g| g.locale() == locale);
            let cleanup = dicts_to_cleanup.get_mut(locale);

            let main = match old_group {
                Some(old)
                    if !force_reload_main_dictionary && old.has_dict(DictionaryKind::Main) =>
                {
                    if let Some(cleanup) = cleanup {
                        cleanup.retain(|&k| k != DictionaryKind::Main);
                    }
                    old.main_dictionary()
                }
                // will be loaded later by the background task
                _ => None,
            };

            let mut sub_dicts: HashMap<DictionaryKind, Arc<dyn LearnableDictionary>> =
                HashMap::new();
            for &kind in &sub_kinds {
                let reusable = !force_reload_main_dictionary
                    && old_group.is_some_and(|old| old.has_dict(kind));
                let dict = if reusable {
                    let old = old_group.and_then(|g| g.sub_dict(kind).cloned());
                    if let Some(cleanup) = dicts_to_cleanup.get_mut(locale) {
                        cleanup.retain(|&k| k != kind);
                    }
                    old
                } else {
                    self.factory.create_sub(kind, locale)
                };
                if let Some(dict) = dict {
                    sub_dicts.insert(kind, dict);
                }
            }

            let blacklist = match old_groups.iter().find(|g| g.locale() == locale) {
                Some(old) => old.blacklist().clone(),
                None => self.factory.blacklist_for(locale),
            };

            new_groups.push(Arc::new(DictionaryGroup::new(
                locale.clone(),
                main,
                sub_dicts,
                blacklist,
            )));
        }

        let new_groups: Groups = Arc::new(new_groups);
        self.swap_groups(new_groups.clone());

        if new_groups.iter().any(|g| !g.has_initialized_main()) {
            self.async_reload_uninitialized_main_dictionaries(
                new_groups.clone(),
                locales,
                listener.clone(),
            );
        }
        if let Some(listener) = &listener {
            listener.on_main_dictionary_availability(self.has_at_least_one_initialized_main());
        }

        // Close everything the new groups did not claim, after the swap.
        for (locale, kinds) in dicts_to_cleanup {
            let Some(old_group) = old_groups.iter().find(|g| *g.locale() == locale) else {
                continue;
            };
            for kind in kinds {
                old_group.close_dict(kind);
            }
        }
    }

    fn async_reload_uninitialized_main_dictionaries(
        &self,
        groups: Groups,
        locales: Vec<Locale>,
        listener: Option<Arc<dyn DictionaryInitializationListener>>,
    ) {
        let latch = Arc::new(Latch::new(1));
        {
            let mut guard = match self.load_latch.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *guard = latch.clone();
        }
        let factory = self.factory.clone();
        std::thread::spawn(move || {
            for locale in &locales {
                let Some(group) = groups.iter().find(|g| g.locale() == locale) else {
                    warn!("expected a dictionary group for {locale} but none found");
                    continue;
                };
                if group.has_initialized_main() {
                    continue;
                }
                match factory.create_main(locale) {
                    Ok(main) => group.set_main_dictionary(Some(main)),
                    Err(e) => warn!("could not initialize main dictionary for {locale}: {e}"),
                }
            }
            if let Some(listener) = listener {
                listener.on_main_dictionary_availability(
                    groups.iter().any(|g| g.has_initialized_main()),
                );
            }
            latch.count_down();
        });
    }

    /// Close every dictionary and return to the inactive placeholder state.
    pub fn close_dictionaries(&self) {
        self.on_finish_input();
        let old_groups = self.swap_groups(Arc::new(vec![Arc::new(DictionaryGroup::empty())]));
        for group in old_groups.iter() {
            for kind in ALL_DICTIONARY_KINDS {
                group.close_dict(kind);
            }
        }
    }

    /// Main dictionaries load asynchronously; don't cache this.
    pub fn has_at_least_one_initialized_main(&self) -> bool {
        self.groups_snapshot().iter().any(|g| g.has_initialized_main())
    }

    pub fn has_at_least_one_uninitialized_main(&self) -> bool {
        self.groups_snapshot().iter().any(|g| !g.has_initialized_main())
    }

    /// Block until the pending main-dictionary load (if any) finishes.
    /// Returns false on timeout.
    pub fn wait_for_loading_main_dictionaries(&self, timeout: Duration) -> bool {
        let latch = {
            let guard = match self.load_latch.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.clone()
        };
        latch.wait_timeout(timeout)
    }

    /// Flush hook: forward the end of the input session to every
    /// dictionary so learnable ones can persist.
    pub fn on_finish_input(&self) {
        for group in self.groups_snapshot().iter() {
            for kind in ALL_DICTIONARY_KINDS {
                if let Some(dict) = group.get_dict(kind) {
                    dict.on_finish_input();
                }
            }
        }
    }

    // -------------- suggestions and word validity ------------

    /// Fused suggestions across all dictionary groups. The first group is
    /// queried on the calling thread while every other group is queried on
    /// its own scoped thread; all results are merged after the join.
    pub fn get_suggestion_results(
        &self,
        input: &ComposedInput,
        context: &NgramContext,
        settings: &SettingsSnapshot,
        session_id: SessionId,
    ) -> SuggestionResults {
        let groups = self.groups_snapshot();
        let mut slots: Vec<Option<Vec<Candidate>>> = vec![None; groups.len()];

        // one scoped thread per non-primary group; the primary group runs
        // on the calling thread; the scope joins everything before merging
        std::thread::scope(|scope| {
            let (first_slot, other_slots) = slots.split_at_mut(1);
            for (slot, group) in other_slots.iter_mut().zip(groups.iter().skip(1)) {
                let groups = &groups;
                scope.spawn(move || {
                    *slot = Some(query_group(group, groups, input, context, settings, session_id));
                });
            }
            first_slot[0] = Some(query_group(
                &groups[0], &groups, input, context, settings, session_id,
            ));
        });
        let per_group: Vec<Vec<Candidate>> =
            slots.into_iter().map(Option::unwrap_or_default).collect();

        let mut results = SuggestionResults::new(
            settings.max_suggestions,
            context.is_beginning_of_sentence_context(),
            false,
        );
        for list in &per_group {
            results.add_all(list.iter().cloned());
            results.add_raw(list.iter().cloned());
        }

        include_at_least_two_word_suggestions(&mut results, &per_group, &input.typed_word);

        results
    }

    /// Runs over all groups on every single-word commit: the group whose
    /// dictionaries know the word gains confidence, every other group
    /// loses some. Multi-word commits and single-language setups skip
    /// adjustment entirely.
    pub fn adjust_confidences(&self, word: &str, was_auto_capitalized: bool) {
        let groups = self.groups_snapshot();
        if groups.len() == 1 || text::contains_word_separator(word) {
            return;
        }
        let decapitalized = if was_auto_capitalized {
            text::decapitalize(word)
        } else {
            word.to_string()
        };
        for group in groups.iter() {
            if group.is_valid_word(word) {
                group.increase_confidence();
                continue;
            }
            // an auto-capitalized word also counts if its lowercase form is known
            if was_auto_capitalized && group.is_valid_word(&decapitalized) {
                group.increase_confidence();
            } else {
                group.decrease_confidence();
            }
        }
    }

    /// The group with the highest confidence; first group wins ties.
    pub fn currently_preferred_group(&self) -> Arc<DictionaryGroup> {
        let groups = self.groups_snapshot();
        let mut preferred = &groups[0];
        for group in groups.iter().skip(1) {
            if group.confidence() > preferred.confidence() {
                preferred = group;
            }
        }
        preferred.clone()
    }

    /// A group only when the preference is unambiguous: a single group, or
    /// one at max confidence while every other sits at zero.
    pub fn clearly_preferred_group(&self) -> Option<Arc<DictionaryGroup>> {
        let groups = self.groups_snapshot();
        if groups.len() == 1 {
            return Some(groups[0].clone());
        }
        let preferred = self.currently_preferred_group();
        if preferred.confidence() < crate::group::MAX_CONFIDENCE {
            return None;
        }
        if groups
            .iter()
            .any(|g| g.confidence() > 0 && !Arc::ptr_eq(g, &preferred))
        {
            return None;
        }
        Some(preferred)
    }

    /// True if any group validates the word. The spell checker has no
    /// notion of a preferred language, so every group counts.
    pub fn is_valid_spelling_word(&self, word: &str) -> bool {
        self.groups_snapshot().iter().any(|g| g.is_valid_word(word))
    }

    /// Validity against the primary language only.
    pub fn is_valid_suggestion_word(&self, word: &str) -> bool {
        self.groups_snapshot()[0].is_valid_word(word)
    }

    pub fn remove_word(&self, word: &str) {
        for group in self.groups_snapshot().iter() {
            group.remove_word(word);
        }
    }

    // -------------- learning ------------

    /// Record a committed suggestion in user history, adjusting language
    /// confidences and optionally auto-adding repeatedly typed unknown
    /// words to the personal dictionary.
    pub fn add_to_user_history(
        &self,
        suggestion: &str,
        was_auto_capitalized: bool,
        context: &NgramContext,
        timestamp: i64,
        settings: &SettingsSnapshot,
    ) {
        let words: Vec<&str> = suggestion.split_whitespace().collect();

        // confidence is only informative for single deliberate words
        if words.len() == 1 {
            self.adjust_confidences(suggestion, was_auto_capitalized);
        }

        let groups = self.groups_snapshot();
        if settings.add_to_personal_dictionary
            && groups[0].has_dict(DictionaryKind::UserHistory)
            && !was_auto_capitalized
            && words.len() == 1
        {
            self.add_to_personal_dictionary_if_invalid_but_in_history(suggestion);
        }

        let preferred = self.currently_preferred_group();
        let mut current_context = context.clone();
        for (i, word) in words.iter().enumerate() {
            let word_was_auto_capitalized = i == 0 && was_auto_capitalized;
            // learn into the preferred group only, to avoid mixing
            // languages in history
            self.add_word_to_user_history(
                &preferred,
                &mut current_context,
                word,
                word_was_auto_capitalized,
                timestamp,
                settings.block_potentially_offensive,
            );
            current_context = current_context.next(*word);

            // manually typing a blacklisted word un-blacklists it for the
            // likely matching languages
            for group in groups.iter() {
                if group.confidence() == preferred.confidence() {
                    group.remove_from_blacklist(word);
                }
            }
        }
    }

    fn add_word_to_user_history(
        &self,
        group: &Arc<DictionaryGroup>,
        context: &mut NgramContext,
        word: &str,
        was_auto_capitalized: bool,
        timestamp: i64,
        block_potentially_offensive: bool,
    ) {
        let Some(history) = group.sub_dict(DictionaryKind::UserHistory).cloned() else {
            return;
        };

        let main_frequency = group
            .main_dictionary()
            .map(|d| d.frequency(word))
            .unwrap_or(NOT_A_PROBABILITY);
        if main_frequency == 0 && block_potentially_offensive {
            return;
        }

        // retroactively apply a pending auto-capitalization substitution
        {
            let mut pending = match self.pending_case_change.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some((from, to)) = pending.clone() {
                if !context.change_word_if_after_beginning_of_sentence(&from, &to) {
                    *pending = None;
                }
            }
        }

        let word_to_use;
        if was_auto_capitalized || context.is_beginning_of_sentence_context() {
            let decapitalized = text::decapitalize(word);
            if group.is_valid_word(word) && !group.is_valid_word(&decapitalized) {
                // The word exists only in its capitalized form (say, a
                // contact name at sentence start): keep it as typed, or
                // we would learn a lowercase ghost of that name.
                word_to_use = word.to_string();
            } else {
                // Otherwise assume auto-capitalization and store the
                // lowercase form; remember the substitution for n-gram
                // contexts recorded before this decision.
                word_to_use = decapitalized.clone();
                let mut pending = match self.pending_case_change.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                *pending = Some((word.to_string(), decapitalized));
            }
        } else {
            // Avoid learning the capitalized form of common words: it
            // would shadow the lowercase one in suggestions.
            let lowercased = word.to_lowercase();
            let lowercase_frequency = group
                .main_dictionary()
                .map(|d| d.frequency(&lowercased))
                .unwrap_or(NOT_A_PROBABILITY);
            word_to_use = if main_frequency < lowercase_frequency
                && lowercase_frequency >= CAPITALIZED_FORM_MAX_PROBABILITY_FOR_INSERT
            {
                lowercased
            } else {
                word.to_string()
            };
        }

        // words the main dictionary does not know are learned as invalid
        let is_valid = main_frequency > 0;
        history.add_entry(&word_to_use, context, is_valid, timestamp);
    }

    fn add_to_personal_dictionary_if_invalid_but_in_history(&self, word: &str) {
        if word.chars().count() <= 1 {
            return;
        }
        // never auto-add while the active language is ambiguous
        let Some(group) = self.clearly_preferred_group() else {
            return;
        };
        let Some(user_dict) = group.sub_dict(DictionaryKind::User).cloned() else {
            return;
        };
        let Some(history) = group.sub_dict(DictionaryKind::UserHistory) else {
            return;
        };
        if group.is_valid_word(word) {
            return; // valid word, no reason to auto-add it
        }
        if user_dict.is_in_dictionary(word) {
            return;
        }
        if history.frequency(word) > AUTO_ADD_MIN_HISTORY_FREQUENCY {
            let word = word.to_string();
            std::thread::spawn(move || {
                user_dict.add_entry(&word, &NgramContext::empty(), true, 0);
            });
        }
    }

    /// Remove a word from the preferred group's history, unless it was
    /// merely backspaced.
    pub fn unlearn_from_user_history(&self, word: &str, event: UnlearnEvent) {
        if event != UnlearnEvent::Backspace {
            if let Some(history) = self
                .currently_preferred_group()
                .sub_dict(DictionaryKind::UserHistory)
            {
                history.remove_entry(word);
            }
        }
    }

    pub fn clear_user_history(&self) {
        for group in self.groups_snapshot().iter() {
            if let Some(history) = group.sub_dict(DictionaryKind::UserHistory) {
                history.clear();
            }
        }
    }

    // -------------- debug surfaces ------------

    /// `"en 2, fr 0"`-style dump, or `None` for a single group.
    pub fn locales_and_confidences(&self) -> Option<String> {
        let groups = self.groups_snapshot();
        if groups.len() < 2 {
            return None;
        }
        Some(
            groups
                .iter()
                .map(|g| format!("{} {}", g.locale(), g.confidence()))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }

    pub fn dictionary_stats(&self) -> Vec<DictionaryStats> {
        let groups = self.groups_snapshot();
        DYNAMIC_DICTIONARY_KINDS
            .into_iter()
            .flat_map(|kind| {
                groups.iter().filter_map(move |group| {
                    group.sub_dict(kind).map(|dict| DictionaryStats {
                        kind,
                        locale: group.locale().clone(),
                        entry_count: dict.entry_count(),
                    })
                })
            })
            .collect()
    }

    /// The stats dump as pretty JSON.
    pub fn dump_stats_json(&self) -> String {
        serde_json::to_string_pretty(&self.dictionary_stats()).unwrap_or_else(|_| "[]".into())
    }
}

/// Query one group, isolating panics: a broken dictionary must not abort
/// the fusion of the remaining groups.
fn query_group(
    group: &Arc<DictionaryGroup>,
    groups: &[Arc<DictionaryGroup>],
    input: &ComposedInput,
    context: &NgramContext,
    settings: &SettingsSnapshot,
    session_id: SessionId,
) -> Vec<Candidate> {
    match catch_unwind(AssertUnwindSafe(|| {
        group.suggestions(groups, input, context, settings, session_id)
    })) {
        Ok(candidates) => candidates,
        Err(_) => {
            warn!(
                "suggestion query panicked for locale {}; skipping group",
                group.locale()
            );
            Vec::new()
        }
    }
}

/// Post-merge fix-up: make sure at least two of the fused entries are
/// usable words (not emoji, not the typed word) whenever the full
/// unfiltered pool has such alternatives, so the first two visible
/// suggestions are tappable words.
fn include_at_least_two_word_suggestions(
    results: &mut SuggestionResults,
    per_group: &[Vec<Candidate>],
    typed_word: &str,
) {
    if results.len() <= 2 {
        return;
    }
    let typed_lower = typed_word.to_lowercase();
    let is_emoji_or_typed = |c: &Candidate| c.is_emoji() || c.word.to_lowercase() == typed_lower;

    let word_count = results.iter().filter(|c| !is_emoji_or_typed(c)).count();
    if word_count >= 2 {
        return;
    }

    let mut all_results = SuggestionResults::new(usize::MAX, false, false);
    for list in per_group {
        all_results.add_all(list.iter().cloned());
    }

    for _ in 0..(2 - word_count) {
        let Some(replacement) = all_results
            .iter()
            .find(|c| !results.contains_word(&c.word) && !is_emoji_or_typed(c))
            .cloned()
        else {
            continue;
        };
        let Some(last_filler) = results
            .iter()
            .rev()
            .find(|c| is_emoji_or_typed(c))
            .map(|c| c.word.clone())
        else {
            continue;
        };
        results.remove(&last_filler);
        results.add(replacement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_counts_down() {
        let latch = Arc::new(Latch::new(1));
        let worker = latch.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            worker.count_down();
        });
        assert!(latch.wait_timeout(Duration::from_secs(5)));
    }

    #[test]
    fn latch_times_out_when_not_counted() {
        let latch = Latch::new(1);
        assert!(!latch.wait_timeout(Duration::from_millis(20)));
    }

    #[test]
    fn zero_latch_returns_immediately() {
        let latch = Latch::new(0);
        assert!(latch.wait_timeout(Duration::from_millis(1)));
    }
}
