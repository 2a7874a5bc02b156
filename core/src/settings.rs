//! Per-query settings snapshot.
//!
//! `SettingsSnapshot` is a read-only value object: the input logic builds
//! one when settings change and passes it into every query, so a single
//! suggestion computation never sees half-updated preferences. It can be
//! loaded from and saved to TOML.
//!
//! The numeric tuning values (score margin, next-word floor, batch band)
//! are empirically tuned constants carried over as-is; they are fields so
//! deployments can override them, with the observed values as defaults.

use crate::candidate::Locale;
use serde::{Deserialize, Serialize};

/// Default normalized-score threshold ("modest" autocorrection).
pub const DEFAULT_AUTOCORRECT_THRESHOLD: f32 = 0.185;
/// Raw score above which a suggestion or typed word counts as well-scored.
/// Sits between a close match (~600k) and an exact match (~1.5M).
pub const DEFAULT_SCORE_LIMIT_FOR_AUTOCORRECT: i32 = 1_000_000;
/// Margin by which contextual scores must differ to prefer the suggestion.
pub const DEFAULT_AUTOCORRECT_SCORE_MARGIN: i32 = 20;
/// Context-score floor for "the user typed this here before" promotions.
pub const DEFAULT_NEXT_WORD_MIN_SCORE: i32 = 170;
/// Fraction of the top batch score still eligible for next-word promotion.
pub const DEFAULT_BATCH_SCORE_BAND: f64 = 0.93;
/// Display list capacity.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 18;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    /// The currently selected input locale.
    pub locale: Locale,

    /// Master autocorrection toggle.
    pub auto_correction_enabled: bool,
    /// Normalized-score threshold a suggestion must clear to autocorrect.
    pub autocorrect_threshold: f32,
    /// Raw score above which a word counts as well-established.
    pub score_limit_for_autocorrect: i32,
    /// Allow autocorrecting to suggestions that are not whitelisted.
    pub allow_non_whitelisted_autocorrect: bool,

    /// Whether the contacts dictionary participates.
    pub use_contacts: bool,
    /// Whether the installed-apps dictionary participates.
    pub use_apps: bool,
    /// Whether personalized (user history) dictionaries participate.
    pub use_personalized_dicts: bool,
    /// Opt-in: auto-add repeatedly typed unknown words to the personal
    /// dictionary.
    pub add_to_personal_dictionary: bool,
    /// Refuse to learn words the main dictionary marks as 0-frequency.
    pub block_potentially_offensive: bool,
    /// Move a re-decoded gesture suggestion the user already rejected out
    /// of the top slot.
    pub remove_rejected_batch_suggestion: bool,
    /// Whether emoji dictionaries participate.
    pub suggest_emojis: bool,

    /// Contextual-score margin for autocorrect tie-breaks.
    pub autocorrect_score_margin: i32,
    /// Context-score floor for next-word promotion.
    pub next_word_min_score: i32,
    /// Score band (fraction of top) for next-word promotion.
    pub batch_score_band: f64,
    /// Display list capacity.
    pub max_suggestions: usize,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        SettingsSnapshot {
            locale: Locale::empty(),
            auto_correction_enabled: true,
            autocorrect_threshold: DEFAULT_AUTOCORRECT_THRESHOLD,
            score_limit_for_autocorrect: DEFAULT_SCORE_LIMIT_FOR_AUTOCORRECT,
            allow_non_whitelisted_autocorrect: true,
            use_contacts: false,
            use_apps: false,
            use_personalized_dicts: true,
            add_to_personal_dictionary: false,
            block_potentially_offensive: true,
            remove_rejected_batch_suggestion: true,
            suggest_emojis: true,
            autocorrect_score_margin: DEFAULT_AUTOCORRECT_SCORE_MARGIN,
            next_word_min_score: DEFAULT_NEXT_WORD_MIN_SCORE,
            batch_score_band: DEFAULT_BATCH_SCORE_BAND,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }
}

impl SettingsSnapshot {
    pub fn for_locale<T: Into<Locale>>(locale: T) -> Self {
        SettingsSnapshot {
            locale: locale.into(),
            ..SettingsSnapshot::default()
        }
    }

    /// Load settings from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save settings to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load settings from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize settings to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_tuned_values() {
        let s = SettingsSnapshot::default();
        assert_eq!(s.autocorrect_score_margin, 20);
        assert_eq!(s.next_word_min_score, 170);
        assert!((s.batch_score_band - 0.93).abs() < f64::EPSILON);
        assert_eq!(s.max_suggestions, 18);
        assert!(s.allow_non_whitelisted_autocorrect);
    }

    #[test]
    fn toml_round_trip() {
        let mut s = SettingsSnapshot::for_locale("de-DE");
        s.autocorrect_threshold = 0.067;
        s.use_contacts = true;
        let text = s.to_toml_string().unwrap();
        let back = SettingsSnapshot::from_toml_str(&text).unwrap();
        assert_eq!(back.locale, Locale::new("de-DE"));
        assert_eq!(back.autocorrect_threshold, 0.067);
        assert!(back.use_contacts);
        assert_eq!(back.autocorrect_score_margin, 20);
    }
}
