//! Final suggestion assembly and the autocorrection decision.
//!
//! `Suggest` consumes fused `SuggestionResults` plus the in-progress word
//! and produces the display list: capitalization transforms, typed-word
//! injection, emoji rebalancing, and, at the heart of it, the staged
//! decision of whether the top candidate should silently replace what the
//! user typed.

use crate::autocorrect;
use crate::candidate::{
    remove_dups_and_typed_word, Candidate, CandidateKind, DictionaryKind, Locale, MAX_SCORE,
};
use crate::composer::{ComposedInput, ShiftMode};
use crate::dictionary::SessionId;
use crate::facilitator::DictionaryFacilitator;
use crate::ngram::NgramContext;
use crate::results::SuggestionResults;
use crate::settings::SettingsSnapshot;
use crate::text;
use lru::LruCache;
use once_cell::unsync::OnceCell;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Typing and gesture decoding share a session id to bound engine memory.
pub const SESSION_ID_TYPING: SessionId = 0;
pub const SESSION_ID_GESTURE: SessionId = 0;

/// Batch candidates below this score are decoder noise; drop them.
pub const SUPPRESS_SUGGEST_THRESHOLD: i32 = -2_000_000_000;
/// A single-letter top batch candidate is demoted when the runner-up is
/// longer and scores above this fraction of it...
pub const SINGLE_LETTER_RUNNER_UP_BAND: f64 = 0.94;
/// ...by multiplying its score with this factor.
pub const SINGLE_LETTER_DEMOTION: f64 = 0.93;

/// Bound on the per-context next-word suggestion cache.
const NEXT_WORD_CACHE_CAPACITY: usize = 64;

/// How the current suggestions were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputStyle {
    None,
    Typing,
    UpdateBatch,
    TailBatch,
    ApplicationSpecified,
    Recorrection,
    Prediction,
    BeginningOfSentencePrediction,
}

/// The finished product of a suggestion query.
#[derive(Debug, Clone)]
pub struct SuggestedWords {
    /// Display-ordered candidates; index 0 is the typed word for non-batch
    /// input, the best decode for gestures.
    pub suggestions: Vec<Candidate>,
    /// The unfiltered fused pool, for diagnostics.
    pub raw_suggestions: Vec<Candidate>,
    /// The candidate standing in for what the user typed.
    pub typed_word: Option<Candidate>,
    /// Whether the typed word itself is a known word.
    pub is_typed_word_valid: bool,
    /// Whether committing should silently replace the typed word with the
    /// top suggestion.
    pub will_auto_correct: bool,
    pub input_style: InputStyle,
    pub sequence_number: i32,
}

impl SuggestedWords {
    /// The candidate an autocorrection would commit, when one will fire.
    /// It leads the display list, with the typed word right behind it.
    pub fn auto_correction(&self) -> Option<&Candidate> {
        if self.will_auto_correct {
            self.suggestions.first()
        } else {
            None
        }
    }
}

/// Memoized "what would be suggested for an empty word in this context"
/// lookup: `(suggestion for the top candidate's word, suggestion for the
/// typed word)`. The fetch runs at most once, however many gates consult
/// it.
pub struct EmptyWordOracle<'a> {
    fetch: &'a dyn Fn() -> (Option<Candidate>, Option<Candidate>),
    cell: OnceCell<(Option<Candidate>, Option<Candidate>)>,
}

impl<'a> EmptyWordOracle<'a> {
    pub fn new(fetch: &'a dyn Fn() -> (Option<Candidate>, Option<Candidate>)) -> Self {
        EmptyWordOracle {
            fetch,
            cell: OnceCell::new(),
        }
    }

    fn get(&self) -> &(Option<Candidate>, Option<Candidate>) {
        self.cell.get_or_init(|| (self.fetch)())
    }

    /// The empty-word suggestion matching the top candidate's word.
    pub fn for_first(&self) -> Option<&Candidate> {
        self.get().0.as_ref()
    }

    /// The empty-word suggestion matching the typed word.
    pub fn for_typed(&self) -> Option<&Candidate> {
        self.get().1.as_ref()
    }
}

/// Turns fused dictionary results into the final candidate list and
/// decides autocorrection.
pub struct Suggest {
    facilitator: Arc<DictionaryFacilitator>,
    next_word_cache: Mutex<LruCache<NgramContext, Arc<SuggestionResults>>>,
}

impl Suggest {
    pub fn new(facilitator: Arc<DictionaryFacilitator>) -> Self {
        let capacity = NonZeroUsize::new(NEXT_WORD_CACHE_CAPACITY)
            .unwrap_or(NonZeroUsize::MIN);
        Suggest {
            facilitator,
            next_word_cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn facilitator(&self) -> &Arc<DictionaryFacilitator> {
        &self.facilitator
    }

    /// Drop cached next-word lookups. Call whenever settings change or the
    /// input field switches.
    pub fn clear_next_word_suggestions_cache(&self) {
        match self.next_word_cache.lock() {
            Ok(mut cache) => cache.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    /// The full pipeline: fused lookup, transforms, autocorrect decision,
    /// typed-word injection, and the emoji rebalance of the first slots.
    pub fn get_suggested_words(
        &self,
        input: &ComposedInput,
        context: &NgramContext,
        settings: &SettingsSnapshot,
        is_correction_enabled: bool,
        input_style: InputStyle,
        sequence_number: i32,
    ) -> SuggestedWords {
        let mut words = if input.is_batch_mode {
            self.suggested_words_for_batch_input(input, context, settings, input_style, sequence_number)
        } else {
            self.suggested_words_for_non_batch_input(
                input, context, settings, is_correction_enabled, input_style, sequence_number,
            )
        };

        // Make the first two tappable suggestions non-emoji when a word
        // alternative exists further down.
        for i in 1..=2 {
            let list = &mut words.suggestions;
            if list.len() > 3 && list.get(i).is_some_and(Candidate::is_emoji) {
                let Some(relative) = list[3..].iter().position(|c| !c.is_emoji()) else {
                    break;
                };
                let first_non_emoji = relative + 3;
                if first_non_emoji > i {
                    let candidate = list.remove(first_non_emoji);
                    list.insert(i, candidate);
                }
            }
        }
        words
    }

    // ---------------- non-batch (typing, predictions, recorrection) ----------------

    fn suggested_words_for_non_batch_input(
        &self,
        input: &ComposedInput,
        context: &NgramContext,
        settings: &SettingsSnapshot,
        is_correction_enabled: bool,
        input_style: InputStyle,
        sequence_number: i32,
    ) -> SuggestedWords {
        let typed_word = input.typed_word.clone();
        let results_are_predictions = !input.is_composing;
        let results = if typed_word.is_empty() {
            self.next_word_suggestions(context, settings)
        } else {
            Arc::new(self.facilitator.get_suggestion_results(
                input,
                context,
                settings,
                SESSION_ID_TYPING,
            ))
        };
        let trailing_quotes = text::trailing_single_quote_count(&typed_word);
        let mut container = transformed_suggestions(input, &results, trailing_quotes);
        let capitalized_typed_word = text::capitalize(
            &typed_word,
            input.shift_mode == ShiftMode::ShiftLocked,
            input.shift_mode == ShiftMode::Shifted,
        );

        // Keep the dictionary-backed entry for the typed word before dedup
        // removes it; it is re-added if an autocorrection fires so the
        // original word stays selectable.
        let typed_word_info = container
            .iter()
            .find(|c| c.word == capitalized_typed_word)
            .cloned();
        let first_occurrence_of_typed_word =
            remove_dups_and_typed_word(&capitalized_typed_word, &mut container);

        let fetch = || {
            let first = container.first().or_else(|| results.first());
            let Some(first) = first else {
                return (None, None);
            };
            let empty_word_results = self.next_word_suggestions(context, settings);
            let for_first = empty_word_results
                .iter()
                .find(|c| c.word == first.word)
                .cloned();
            let for_typed = empty_word_results
                .iter()
                .find(|c| c.word == capitalized_typed_word)
                .cloned();
            (for_first, for_typed)
        };
        let oracle = EmptyWordOracle::new(&fetch);

        let (allows_to_be_auto_corrected, has_auto_correction) = self.should_be_auto_corrected(
            trailing_quotes,
            &capitalized_typed_word,
            container.first(),
            &oracle,
            is_correction_enabled,
            input,
            settings,
            &results,
            first_occurrence_of_typed_word,
            typed_word_info.as_ref(),
        );

        let typed_word_candidate = Candidate::new(
            capitalized_typed_word.clone(),
            MAX_SCORE,
            CandidateKind::Typed,
            typed_word_info
                .as_ref()
                .map(|c| c.source)
                .unwrap_or(DictionaryKind::UserTyped),
            typed_word_info
                .as_ref()
                .map(|c| c.source_locale.clone())
                .unwrap_or_else(Locale::empty),
        );
        // The typed word is always shown: leading normally, right after
        // the correction when one is incoming so the user can override it.
        if !capitalized_typed_word.is_empty() {
            let index = if has_auto_correction {
                1.min(container.len())
            } else {
                0
            };
            container.insert(index, typed_word_candidate.clone());
        }

        let input_style = if results_are_predictions {
            if results.is_beginning_of_sentence {
                InputStyle::BeginningOfSentencePrediction
            } else {
                InputStyle::Prediction
            }
        } else {
            input_style
        };

        let is_typed_word_valid = first_occurrence_of_typed_word.is_some()
            || (!results_are_predictions && !allows_to_be_auto_corrected);

        SuggestedWords {
            suggestions: container,
            raw_suggestions: results.raw_suggestions.clone(),
            typed_word: (!capitalized_typed_word.is_empty()).then_some(typed_word_candidate),
            is_typed_word_valid,
            will_auto_correct: has_auto_correction,
            input_style,
            sequence_number,
        }
    }

    /// The staged autocorrection gate. Returns
    /// `(allows_to_be_auto_corrected, has_auto_correction)`.
    #[allow(clippy::too_many_arguments)]
    pub fn should_be_auto_corrected(
        &self,
        trailing_single_quotes_count: usize,
        typed_word: &str,
        first_suggestion_in_container: Option<&Candidate>,
        empty_word_suggestions: &EmptyWordOracle<'_>,
        is_correction_enabled: bool,
        input: &ComposedInput,
        settings: &SettingsSnapshot,
        results: &SuggestionResults,
        first_occurrence_of_typed_word: Option<usize>,
        typed_word_info: Option<&Candidate>,
    ) -> (bool, bool) {
        let considered_word = if trailing_single_quotes_count > 0 {
            let end = typed_word
                .char_indices()
                .rev()
                .nth(trailing_single_quotes_count - 1)
                .map(|(i, _)| i)
                .unwrap_or(0);
            &typed_word[..end]
        } else {
            typed_word
        };

        let score_limit = settings.score_limit_for_autocorrect;

        // Stage 1: is this word even eligible for autocorrection?
        let allows_to_be_auto_corrected;
        if settings.allow_non_whitelisted_autocorrect
            || first_suggestion_in_container.is_some_and(Candidate::is_whitelisted)
            || (considered_word.chars().count() > 1 && typed_word_info.is_none())
        {
            // whitelisting not required or satisfied, or a longer word the
            // dictionaries don't know
            allows_to_be_auto_corrected = true;
        } else if let (Some(first), false) = (first_suggestion_in_container, typed_word.is_empty())
        {
            allows_to_be_auto_corrected = if first.score > score_limit {
                true // suggestion has a good score on its own
            } else if empty_word_suggestions.for_first().is_none() {
                false // top suggestion unknown in this context
            } else if empty_word_suggestions.for_typed().is_none() {
                true // typed word unknown in this context, treat as correctable
            } else {
                // correct only when the suggestion is contextually much
                // more likely than what was typed
                let first_score = empty_word_suggestions.for_first().map_or(0, |c| c.score);
                let typed_score = empty_word_suggestions.for_typed().map_or(0, |c| c.score);
                first_score - typed_score > settings.autocorrect_score_margin
            };
        } else {
            allows_to_be_auto_corrected = false;
        }

        // Stage 2: should the correction actually fire?
        if !is_correction_enabled
            || !allows_to_be_auto_corrected
            // predictions are never corrections
            || !input.is_composing
            || results.is_empty()
            // digits mean the word was typed with care
            || input.has_digits()
            // mostly-caps words are almost certainly intentional
            || input.is_mostly_caps()
            // autocorrecting during recorrection would be unexpected
            || input.is_resumed
            // without a main dictionary a contact name could shadow a
            // common word and autocorrect everything to it
            || !self.facilitator.has_at_least_one_initialized_main()
        {
            return (allows_to_be_auto_corrected, false);
        }

        let Some(first_suggestion) =
            first_suggestion_in_container.or_else(|| results.first())
        else {
            return (allows_to_be_auto_corrected, false);
        };

        if results.first_exceeds_confidence_threshold && first_occurrence_of_typed_word != Some(0)
        {
            // reserved: nothing sets the flag yet, kept for parity
            return (true, true);
        }

        if !autocorrect::suggestion_exceeds_threshold(
            first_suggestion,
            considered_word,
            settings.autocorrect_threshold,
        ) {
            // score too low for autocorrect
            return (true, false);
        }

        let allowed = autocorrect::allowed_by_space_filter(first_suggestion);
        if let (true, Some(typed_info)) =
            (allowed, typed_word_info.filter(|t| t.score > score_limit))
        {
            // The typed word is itself valid and well-scored: do not
            // blindly prefer the suggestion.
            if first_suggestion.score < score_limit {
                return (true, false);
            }
            if first_suggestion.source_locale != typed_info.source_locale {
                // different source languages: keep whichever matches the
                // language currently being typed
                let current = self.facilitator.current_locale();
                return (true, current == first_suggestion.source_locale);
            }
            let bonus = (if first_suggestion.is_whitelisted() { 20 } else { 0 })
                + (if text::is_lower_case_ascii(typed_word) { 5 } else { 0 })
                + (if first_suggestion.score > typed_info.score { 5 } else { 0 });
            let first_score_for_empty = empty_word_suggestions.for_first().map_or(0, |c| c.score);
            let typed_score_for_empty = empty_word_suggestions.for_typed().map_or(0, |c| c.score);
            if first_score_for_empty + bonus
                >= typed_score_for_empty + settings.autocorrect_score_margin
            {
                // clearly the better match for this context
                return (true, true);
            }
            return (true, false);
        }

        (allows_to_be_auto_corrected, allowed)
    }

    // ---------------- batch (gesture) input ----------------

    fn suggested_words_for_batch_input(
        &self,
        input: &ComposedInput,
        context: &NgramContext,
        settings: &SettingsSnapshot,
        input_style: InputStyle,
        sequence_number: i32,
    ) -> SuggestedWords {
        let mut results = self.facilitator.get_suggestion_results(
            input,
            context,
            settings,
            SESSION_ID_GESTURE,
        );
        replace_single_letter_first_suggestion(&mut results);

        let mut container = results.to_vec();
        let only_first_char_capitalized =
            input.was_shifted_no_lock || input.shift_mode == ShiftMode::Shifted;
        let all_upper_case =
            input.is_all_upper_case || input.shift_mode == ShiftMode::ShiftLocked;
        if only_first_char_capitalized || all_upper_case {
            for candidate in &mut container {
                *candidate = transformed_candidate(
                    candidate,
                    all_upper_case,
                    only_first_char_capitalized,
                    0,
                );
            }
        }

        let rejected = if settings.remove_rejected_batch_suggestion
            && container.len() > 1
            && input
                .rejected_batch_suggestion
                .as_deref()
                .is_some_and(|r| r == container[0].word)
        {
            let rejected = container.remove(0);
            container.insert(1, rejected.clone());
            Some(rejected)
        } else {
            None
        };
        remove_dups_and_typed_word("", &mut container);

        // decoder noise can carry absurd negative scores
        container.retain(|c| c.score >= SUPPRESS_SUGGEST_THRESHOLD);

        let capitalized_typed_word = text::capitalize(
            &input.typed_word,
            input.shift_mode == ShiftMode::ShiftLocked,
            input.shift_mode == ShiftMode::Shifted,
        );
        if capitalized_typed_word != input.typed_word
            && !container
                .iter()
                .skip(1)
                .any(|c| c.word == capitalized_typed_word)
        {
            let index = 1.min(container.len());
            container.insert(index, Candidate::typed_word(capitalized_typed_word, 0));
        }

        // The best decode acts as the "typed word" for gestures: valid,
        // never autocorrecting.
        let pseudo_typed_word = self.prefer_next_word_suggestion(
            container.first().cloned(),
            &mut container,
            context,
            settings,
            rejected.as_ref(),
        );

        SuggestedWords {
            suggestions: container,
            raw_suggestions: results.raw_suggestions.clone(),
            typed_word: pseudo_typed_word,
            is_typed_word_valid: true,
            will_auto_correct: false,
            input_style,
            sequence_number,
        }
    }

    /// If the user has previously typed one of the top-band candidates in
    /// this exact context, promote it to rank 0: they probably want the
    /// word they used here before.
    fn prefer_next_word_suggestion(
        &self,
        pseudo_typed_word: Option<Candidate>,
        container: &mut Vec<Candidate>,
        context: &NgramContext,
        settings: &SettingsSnapshot,
        rejected: Option<&Candidate>,
    ) -> Option<Candidate> {
        let pseudo = pseudo_typed_word?;
        if !settings.use_personalized_dicts
            || pseudo.source != DictionaryKind::Main
            || container.len() < 2
        {
            return Some(pseudo);
        }
        let next_words = self.next_word_suggestions(context, settings);
        // only reasonably often typed words count
        let known_next_words: Vec<&Candidate> = next_words
            .iter()
            .filter(|c| c.score >= settings.next_word_min_score)
            .collect();
        if known_next_words.is_empty() {
            return Some(pseudo);
        }

        let mut promote_index = None;
        for (index, suggestion) in container.iter().enumerate() {
            if (suggestion.score as f64) < pseudo.score as f64 * settings.batch_score_band {
                break; // only reasonably good suggestions qualify
            }
            if rejected.is_some_and(|r| r.word == suggestion.word) {
                continue;
            }
            if known_next_words.iter().any(|n| n.word == suggestion.word) {
                promote_index = Some(index);
                break;
            }
        }
        match promote_index {
            Some(index) => {
                let promoted = container.remove(index);
                container.insert(0, promoted.clone());
                debug!(
                    "promoted next-word suggestion {:?} over batch word {:?}",
                    promoted.word, pseudo.word
                );
                Some(promoted)
            }
            None => Some(pseudo),
        }
    }

    /// Suggestions for an empty typed word in this context: what the
    /// next-word prediction strip shows. Cached per context.
    fn next_word_suggestions(
        &self,
        context: &NgramContext,
        settings: &SettingsSnapshot,
    ) -> Arc<SuggestionResults> {
        {
            let mut cache = match self.next_word_cache.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(cached) = cache.get(context) {
                return cached.clone();
            }
        }
        let results = Arc::new(self.facilitator.get_suggestion_results(
            &ComposedInput::empty(),
            context,
            settings,
            SESSION_ID_TYPING,
        ));
        let mut cache = match self.next_word_cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cache.put(context.clone(), results.clone());
        results
    }
}

/// Reduces the score of a single-letter top suggestion when the runner-up
/// is longer and nearly as good: a lone letter is rarely what a gesture
/// meant.
fn replace_single_letter_first_suggestion(results: &mut SuggestionResults) {
    if results.len() < 2 {
        return;
    }
    let Some(first) = results.first().cloned() else {
        return;
    };
    if first.char_count() != 1 {
        return;
    }
    let Some(second) = results.iter().nth(1).cloned() else {
        return;
    };
    if second.char_count() > 1
        && second.score as f64 > SINGLE_LETTER_RUNNER_UP_BAND * first.score as f64
    {
        results.remove(&first.word);
        let demoted_score = (first.score as f64 * SINGLE_LETTER_DEMOTION) as i32;
        results.add(Candidate {
            score: demoted_score,
            ..first.clone()
        });
        debug!(
            "reduced score of {:?} from {}, new first: {:?}",
            first.word,
            first.score,
            results.first().map(|c| c.word.as_str())
        );
    }
}

/// Apply capitalization and trailing-quote transforms to the fused results.
fn transformed_suggestions(
    input: &ComposedInput,
    results: &SuggestionResults,
    trailing_quotes: usize,
) -> Vec<Candidate> {
    let all_upper_case = (input.is_all_upper_case && !input.is_resumed)
        || input.shift_mode == ShiftMode::ShiftLocked;
    let only_first_char_capitalized =
        input.is_only_first_char_capitalized || input.shift_mode == ShiftMode::Shifted;
    let mut container = results.to_vec();
    if only_first_char_capitalized || all_upper_case || trailing_quotes != 0 {
        for candidate in &mut container {
            *candidate = transformed_candidate(
                candidate,
                all_upper_case,
                only_first_char_capitalized,
                trailing_quotes,
            );
        }
    }
    container
}

/// Capitalize one candidate and re-append quotes the user already typed.
/// Quotes are not appended when the suggestion itself contains one ("it's",
/// "didn't"): there the user more likely missed the final letter.
fn transformed_candidate(
    candidate: &Candidate,
    all_upper_case: bool,
    only_first_char_capitalized: bool,
    trailing_quotes: usize,
) -> Candidate {
    let mut word = text::capitalize(&candidate.word, all_upper_case, only_first_char_capitalized);
    let quotes_to_append =
        trailing_quotes.saturating_sub(usize::from(candidate.word.contains('\'')));
    for _ in 0..quotes_to_append {
        word.push('\'');
    }
    Candidate {
        word,
        ..candidate.clone()
    }
}
