//! Preceding-word context for predictions and corrections.
//!
//! `NgramContext` is a plain value object: the committed words immediately
//! before the cursor, most recent first. It is used as a lookup/merge key
//! (equality + hash) by the next-word suggestion cache and carries the
//! beginning-of-sentence marker the autocorrect heuristic reads.

/// Maximum number of previous words kept in a context.
pub const MAX_PREV_WORD_COUNT: usize = 3;

/// One slot of preceding context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WordInfo {
    /// A committed word.
    Word(String),
    /// The boundary marker before the first word of a sentence.
    BeginningOfSentence,
}

/// The sequence of words preceding the cursor, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NgramContext {
    prev_words: Vec<WordInfo>,
}

impl NgramContext {
    /// A context with no usable history (e.g. cursor moved into unknown text).
    pub fn empty() -> Self {
        NgramContext::default()
    }

    /// The context at the start of a sentence.
    pub fn beginning_of_sentence() -> Self {
        NgramContext {
            prev_words: vec![WordInfo::BeginningOfSentence],
        }
    }

    /// A context with a single preceding word.
    pub fn with_prev_word<T: Into<String>>(word: T) -> Self {
        NgramContext {
            prev_words: vec![WordInfo::Word(word.into())],
        }
    }

    /// Build a context from preceding words, most recent first.
    pub fn from_prev_words<I, T>(words: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut prev_words: Vec<WordInfo> =
            words.into_iter().map(|w| WordInfo::Word(w.into())).collect();
        prev_words.truncate(MAX_PREV_WORD_COUNT);
        NgramContext { prev_words }
    }

    pub fn is_empty(&self) -> bool {
        self.prev_words.is_empty()
    }

    /// Whether the word being composed is the first of a sentence.
    pub fn is_beginning_of_sentence_context(&self) -> bool {
        matches!(self.prev_words.first(), Some(WordInfo::BeginningOfSentence))
    }

    /// The nth previous word (1 = the word right before the cursor).
    pub fn prev_word(&self, n: usize) -> Option<&str> {
        match self.prev_words.get(n.checked_sub(1)?) {
            Some(WordInfo::Word(w)) => Some(w),
            _ => None,
        }
    }

    /// The context after committing `word` at the current position.
    pub fn next<T: Into<String>>(&self, word: T) -> NgramContext {
        let mut prev_words = Vec::with_capacity(MAX_PREV_WORD_COUNT);
        prev_words.push(WordInfo::Word(word.into()));
        prev_words.extend(self.prev_words.iter().take(MAX_PREV_WORD_COUNT - 1).cloned());
        NgramContext { prev_words }
    }

    /// If the most recent word is `from` and sits right after a sentence
    /// start, replace it with `to`. Used to retroactively store the
    /// decapitalized form of auto-capitalized words in history n-grams.
    /// Returns whether a replacement was made.
    pub fn change_word_if_after_beginning_of_sentence(&mut self, from: &str, to: &str) -> bool {
        let after_bos = matches!(self.prev_words.get(1), Some(WordInfo::BeginningOfSentence));
        match self.prev_words.first_mut() {
            Some(WordInfo::Word(w)) if after_bos && w == from => {
                *w = to.to_string();
                true
            }
            _ => false,
        }
    }
}
