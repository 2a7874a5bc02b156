//! Scenario tests for the staged autocorrection decision.
//!
//! Each case feeds a typed word, a scored suggestion list and the
//! empty-word context oracle into `should_be_auto_corrected` and checks
//! whether a correction fires.

mod common;

use common::{ScriptedDictionary, StubFactory};
use libsuggest_core::text;
use libsuggest_core::{
    remove_dups_and_typed_word, Candidate, CandidateKind, ComposedInput, DictionaryFacilitator,
    DictionaryKind, EmptyWordOracle, Locale, SettingsSnapshot, Suggest, SuggestionResults,
};
use std::sync::Arc;
use std::time::Duration;

// values of the threshold setting's "modest" / "very aggressive" modes
const THRESHOLD_MODEST: f32 = 0.185;
const THRESHOLD_VERY_AGGRESSIVE: f32 = -1.0;

/// Whitelisted when scored at i32::MAX, like real decoders report them.
fn suggestion(word: &str, score: i32, locale: &str) -> Candidate {
    let kind = if score == i32::MAX {
        CandidateKind::Whitelist
    } else {
        CandidateKind::Correction
    };
    Candidate::new(word, score, kind, DictionaryKind::Main, Locale::new(locale))
}

/// Runs the decision with a single-group facilitator for `typing_locale`.
/// `first_empty` / `typed_empty` are what an empty-word query would return
/// for the top suggestion and the typed word respectively.
fn decide(
    typed: &str,
    suggestions: &[Candidate],
    first_empty: Option<Candidate>,
    typed_empty: Option<Candidate>,
    typing_locale: &str,
    threshold: f32,
) -> (bool, bool) {
    let factory = Arc::new(StubFactory::new().with_main(
        typing_locale,
        Arc::new(ScriptedDictionary::new(DictionaryKind::Main, typing_locale)),
    ));
    let facilitator = Arc::new(DictionaryFacilitator::new(factory));
    let mut settings = SettingsSnapshot::for_locale(typing_locale);
    settings.autocorrect_threshold = threshold;
    facilitator.reset_dictionaries(&Locale::new(typing_locale), &settings, false, None);
    assert!(facilitator.wait_for_loading_main_dictionaries(Duration::from_secs(5)));
    let suggest = Suggest::new(facilitator);

    let mut results = SuggestionResults::new(suggestions.len().max(1), false, false);
    results.add_all(suggestions.iter().cloned());
    let mut container: Vec<Candidate> = suggestions.to_vec();
    let typed_info = container.iter().find(|c| c.word == typed).cloned();
    let first_occurrence = remove_dups_and_typed_word(typed, &mut container);

    let fetch = move || (first_empty.clone(), typed_empty.clone());
    let oracle = EmptyWordOracle::new(&fetch);
    suggest.should_be_auto_corrected(
        text::trailing_single_quote_count(typed),
        typed,
        container.first(),
        &oracle,
        true,
        &ComposedInput::typing(typed),
        &settings,
        &results,
        first_occurrence,
        typed_info.as_ref(),
    )
}

#[test]
fn no_correction_when_top_suggestion_score_is_low() {
    // "on" -> "in" even though "in" was used in this context before: the
    // suggestion's raw score is below the well-scored limit.
    let (_, corrected) = decide(
        "on",
        &[suggestion("on", 1_800_000, "en"), suggestion("in", 600_000, "en")],
        Some(suggestion("in", 240, "en")),
        None,
        "en",
        THRESHOLD_MODEST,
    );
    assert!(!corrected);
}

#[test]
fn whitelisted_correction_fires_when_context_is_neutral() {
    // "ill" -> "I'll": both empty-word scores are absent, whitelist and
    // lowercase bonuses carry the decision.
    let (_, corrected) = decide(
        "ill",
        &[suggestion("I'll", i32::MAX, "en"), suggestion("ill", 1_500_000, "en")],
        None,
        None,
        "en",
        THRESHOLD_MODEST,
    );
    assert!(corrected);
}

#[test]
fn no_correction_when_only_typed_word_was_used_in_context() {
    let (_, corrected) = decide(
        "ill",
        &[suggestion("I'll", i32::MAX, "en"), suggestion("ill", 1_500_000, "en")],
        None,
        Some(suggestion("ill", 200, "en")),
        "en",
        THRESHOLD_MODEST,
    );
    assert!(!corrected);
}

#[test]
fn correction_fires_when_ngram_scores_tie() {
    let (_, corrected) = decide(
        "ill",
        &[suggestion("I'll", i32::MAX, "en"), suggestion("ill", 1_500_000, "en")],
        Some(suggestion("I'll", 200, "en")),
        Some(suggestion("ill", 200, "en")),
        "en",
        THRESHOLD_MODEST,
    );
    assert!(corrected);
}

#[test]
fn no_correction_when_typed_word_has_better_ngram_score() {
    let (_, corrected) = decide(
        "ill",
        &[suggestion("I'll", i32::MAX, "en"), suggestion("ill", 1_500_000, "en")],
        Some(suggestion("I'll", 200, "en")),
        Some(suggestion("ill", 211, "en")),
        "en",
        THRESHOLD_MODEST,
    );
    assert!(!corrected);
}

#[test]
fn no_english_i_for_polish_i_when_typing_polish() {
    // locale mismatch keeps the typed word, even at the most aggressive
    // threshold
    let (_, corrected) = decide(
        "i",
        &[suggestion("I", i32::MAX, "en"), suggestion("i", 1_500_000, "pl")],
        None,
        None,
        "pl",
        THRESHOLD_VERY_AGGRESSIVE,
    );
    assert!(!corrected);
}

#[test]
fn english_i_replaces_polish_i_when_typing_english() {
    let (_, corrected) = decide(
        "i",
        &[suggestion("I", i32::MAX, "en"), suggestion("i", 1_500_000, "pl")],
        None,
        None,
        "en",
        THRESHOLD_MODEST,
    );
    assert!(corrected);
}

#[test]
fn no_english_in_for_french_un_when_typing_french() {
    let (_, corrected) = decide(
        "un",
        &[suggestion("in", i32::MAX, "en"), suggestion("un", 1_500_000, "fr")],
        None,
        None,
        "fr",
        THRESHOLD_MODEST,
    );
    assert!(!corrected);
}

#[test]
fn no_accent_correction_when_suggestion_scores_lower() {
    let (_, corrected) = decide(
        "ne",
        &[suggestion("ne", 1_900_000, "fr"), suggestion("né", 1_899_999, "fr")],
        None,
        None,
        "fr",
        THRESHOLD_MODEST,
    );
    assert!(!corrected);
}

#[test]
fn accent_correction_fires_when_suggestion_known_in_context() {
    let (_, corrected) = decide(
        "ne",
        &[suggestion("ne", 1_900_000, "fr"), suggestion("né", 1_899_999, "fr")],
        Some(suggestion("né", 200, "fr")),
        None,
        "fr",
        THRESHOLD_MODEST,
    );
    assert!(corrected);
}

#[test]
fn accent_correction_fires_with_clearly_better_context_score() {
    let (_, corrected) = decide(
        "ne",
        &[suggestion("ne", 1_900_000, "fr"), suggestion("né", 1_899_999, "fr")],
        Some(suggestion("né", 215, "fr")),
        Some(suggestion("ne", 200, "fr")),
        "fr",
        THRESHOLD_MODEST,
    );
    assert!(corrected);
}

#[test]
fn no_accent_correction_when_context_scores_tie() {
    let (_, corrected) = decide(
        "ne",
        &[suggestion("ne", 1_900_000, "fr"), suggestion("né", 1_899_999, "fr")],
        Some(suggestion("né", 200, "fr")),
        Some(suggestion("ne", 200, "fr")),
        "fr",
        THRESHOLD_MODEST,
    );
    assert!(!corrected);
}

#[test]
fn no_deaccenting_of_a_valid_accented_word() {
    // typed "né" stays: the "ne" suggestion never reaches the comparison,
    // its score is below the well-scored limit
    let (_, corrected) = decide(
        "né",
        &[suggestion("ne", 600_000, "fr"), suggestion("né", 1_600_000, "fr")],
        Some(suggestion("né", 200, "fr")),
        Some(suggestion("ne", 200, "fr")),
        "fr",
        THRESHOLD_MODEST,
    );
    assert!(!corrected);
}

#[test]
fn unknown_longer_word_gets_corrected() {
    let (allows, corrected) = decide(
        "teh",
        &[suggestion("the", 1_500_000, "en")],
        None,
        None,
        "en",
        THRESHOLD_MODEST,
    );
    assert!(allows);
    assert!(corrected);
}

#[test]
fn raising_threshold_above_score_disables_correction() {
    // autocorrect monotonicity: same inputs, higher threshold can only
    // turn the decision off
    let (_, corrected_low) = decide(
        "teh",
        &[suggestion("the", 1_500_000, "en")],
        None,
        None,
        "en",
        THRESHOLD_MODEST,
    );
    let (_, corrected_high) = decide(
        "teh",
        &[suggestion("the", 1_500_000, "en")],
        None,
        None,
        "en",
        10.0,
    );
    assert!(corrected_low);
    assert!(!corrected_high);
}

#[test]
fn reserved_confidence_threshold_branch_force_allows() {
    // nothing in the crate sets the flag; when set externally and the
    // typed word is not rank 0, the decision short-circuits to corrected
    let factory = Arc::new(StubFactory::new().with_main(
        "en",
        Arc::new(ScriptedDictionary::new(DictionaryKind::Main, "en")),
    ));
    let facilitator = Arc::new(DictionaryFacilitator::new(factory));
    let settings = SettingsSnapshot::for_locale("en");
    facilitator.reset_dictionaries(&Locale::new("en"), &settings, false, None);
    assert!(facilitator.wait_for_loading_main_dictionaries(Duration::from_secs(5)));
    let suggest = Suggest::new(facilitator);

    let mut results = SuggestionResults::new(4, false, true);
    results.add(suggestion("the", 10, "en"));
    let container = vec![suggestion("the", 10, "en")];
    let fetch = || (None, None);
    let oracle = EmptyWordOracle::new(&fetch);
    let (allows, corrected) = suggest.should_be_auto_corrected(
        0,
        "teh",
        container.first(),
        &oracle,
        true,
        &ComposedInput::typing("teh"),
        &settings,
        &results,
        None,
        None,
    );
    assert!(allows);
    assert!(corrected);
}

#[test]
fn gate_conditions_disable_correction() {
    let suggestions = [suggestion("the", 1_500_000, "en")];

    // correction disabled by policy
    let factory = Arc::new(StubFactory::new().with_main(
        "en",
        Arc::new(ScriptedDictionary::new(DictionaryKind::Main, "en")),
    ));
    let facilitator = Arc::new(DictionaryFacilitator::new(factory));
    let settings = SettingsSnapshot::for_locale("en");
    facilitator.reset_dictionaries(&Locale::new("en"), &settings, false, None);
    assert!(facilitator.wait_for_loading_main_dictionaries(Duration::from_secs(5)));
    let suggest = Suggest::new(facilitator);

    let mut results = SuggestionResults::new(4, false, false);
    results.add_all(suggestions.iter().cloned());
    let container = suggestions.to_vec();
    let fetch = || (None, None);

    let run = |input: &ComposedInput, enabled: bool| {
        let oracle = EmptyWordOracle::new(&fetch);
        suggest
            .should_be_auto_corrected(
                0,
                &input.typed_word,
                container.first(),
                &oracle,
                enabled,
                input,
                &settings,
                &results,
                None,
                None,
            )
            .1
    };

    assert!(!run(&ComposedInput::typing("teh"), false)); // disabled
    assert!(!run(&ComposedInput::empty(), true)); // prediction, not composing
    assert!(!run(&ComposedInput::typing("teh1"), true)); // digits
    assert!(!run(&ComposedInput::typing("TEh"), true)); // mostly caps
    let mut resumed = ComposedInput::typing("teh");
    resumed.is_resumed = true;
    assert!(!run(&resumed, true)); // recorrection
    assert!(run(&ComposedInput::typing("teh"), true)); // control
}

#[test]
fn no_correction_without_an_initialized_main_dictionary() {
    // factory has no dictionary for this locale, so the main never loads
    let factory = Arc::new(StubFactory::new());
    let facilitator = Arc::new(DictionaryFacilitator::new(factory));
    let settings = SettingsSnapshot::for_locale("en");
    facilitator.reset_dictionaries(&Locale::new("en"), &settings, false, None);
    assert!(facilitator.wait_for_loading_main_dictionaries(Duration::from_secs(5)));
    assert!(!facilitator.has_at_least_one_initialized_main());
    let suggest = Suggest::new(facilitator);

    let suggestions = [suggestion("the", 1_500_000, "en")];
    let mut results = SuggestionResults::new(4, false, false);
    results.add_all(suggestions.iter().cloned());
    let fetch = || (None, None);
    let oracle = EmptyWordOracle::new(&fetch);
    let (_, corrected) = suggest.should_be_auto_corrected(
        0,
        "teh",
        suggestions.first(),
        &oracle,
        true,
        &ComposedInput::typing("teh"),
        &SettingsSnapshot::for_locale("en"),
        &results,
        None,
        None,
    );
    assert!(!corrected);
}
