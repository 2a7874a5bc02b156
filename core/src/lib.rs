//! libsuggest-core
//!
//! Suggestion fusion and autocorrection decisions for predictive-text
//! input methods: querying several language dictionaries concurrently,
//! blending their scores by per-language confidence, and deciding whether
//! the top candidate should silently replace the typed word.
//!
//! The dictionary lookup engines themselves are collaborators behind the
//! `Dictionary` / `LearnableDictionary` traits; this crate owns what
//! happens around them.
//!
//! Public API:
//! - `Candidate` - scored word candidate with dictionary provenance
//! - `SuggestionResults` - bounded, deduplicated fusion container
//! - `DictionaryGroup` - one language's dictionaries + confidence + blacklist
//! - `DictionaryFacilitator` - group lifecycle, fusion, learning
//! - `Suggest` - display ordering and the autocorrection decision
//! - `WordListDictionary` / `InMemoryLearnableDictionary` - reference
//!   dictionary implementations (FST + bincode, and in-memory learnable)

pub mod candidate;
pub use candidate::{
    remove_dups_and_typed_word, Candidate, CandidateKind, DictionaryKind, Locale,
    ALL_DICTIONARY_KINDS, DYNAMIC_DICTIONARY_KINDS, MAX_SCORE,
};

pub mod results;
pub use results::SuggestionResults;

pub mod error;
pub use error::DictionaryError;

pub mod dictionary;
pub use dictionary::{
    Dictionary, DictionaryInitializationListener, DictionaryStats, LearnableDictionary,
    SessionId, NOT_A_PROBABILITY,
};

pub mod ngram;
pub use ngram::{NgramContext, WordInfo};

pub mod composer;
pub use composer::{ComposedInput, ShiftMode};

pub mod settings;
pub use settings::SettingsSnapshot;

pub mod text;

pub mod autocorrect;

pub mod group;
pub use group::{Blacklist, Confidence, DictionaryGroup, MAX_CONFIDENCE};

pub mod facilitator;
pub use facilitator::{DictionaryFacilitator, DictionaryFactory, UnlearnEvent};

pub mod suggest;
pub use suggest::{EmptyWordOracle, InputStyle, Suggest, SuggestedWords};

pub mod memdict;
pub use memdict::InMemoryLearnableDictionary;

pub mod wordlist;
pub use wordlist::{WordEntry, WordListDictionary};
