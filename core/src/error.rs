//! Error type for dictionary creation and loading.
//!
//! Suggestion queries themselves never return errors: an unready or broken
//! dictionary is treated as absent and the query degrades (see the crate
//! docs). The only fallible surface this crate owns is building and loading
//! dictionaries.

use crate::candidate::Locale;

#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    /// No dictionary data exists for this locale.
    #[error("no dictionary available for locale {0}")]
    NotAvailable(Locale),

    /// The dictionary data exists but could not be decoded.
    #[error("dictionary data for locale {locale} is malformed: {reason}")]
    Malformed { locale: Locale, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
