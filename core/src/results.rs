//! Bounded, score-ordered, word-deduplicating suggestion container.
//!
//! `SuggestionResults` is the merge target of multi-group fusion: inserts
//! keep the canonical ranking order, a capacity bound evicts the weakest
//! entries, and no two entries ever share the same word (the higher-scored
//! one wins on conflict).

use crate::candidate::Candidate;

/// The fused result set of one suggestion query.
///
/// The beginning-of-sentence and confidence-threshold flags are computed
/// once at construction from the query inputs and read by the autocorrect
/// heuristic. Nothing in this crate currently constructs the container with
/// `first_exceeds_confidence_threshold` set; the flag is reserved.
#[derive(Debug, Clone)]
pub struct SuggestionResults {
    entries: Vec<Candidate>,
    capacity: usize,
    /// Unfiltered pre-merge candidates, kept for diagnostics and the
    /// downstream heuristics that need to look past the display cap.
    pub raw_suggestions: Vec<Candidate>,
    pub is_beginning_of_sentence: bool,
    pub first_exceeds_confidence_threshold: bool,
}

impl SuggestionResults {
    pub fn new(
        capacity: usize,
        is_beginning_of_sentence: bool,
        first_exceeds_confidence_threshold: bool,
    ) -> Self {
        SuggestionResults {
            entries: Vec::new(),
            capacity,
            raw_suggestions: Vec::new(),
            is_beginning_of_sentence,
            first_exceeds_confidence_threshold,
        }
    }

    /// Insert a candidate, keeping ranking order, the per-word uniqueness
    /// invariant and the capacity bound. Returns whether the candidate made
    /// it into the set.
    pub fn add(&mut self, candidate: Candidate) -> bool {
        if let Some(pos) = self.entries.iter().position(|c| c.word == candidate.word) {
            // Same word already present: keep whichever ranks higher.
            if candidate.ranking_cmp(&self.entries[pos]).is_lt() {
                self.entries.remove(pos);
            } else {
                return false;
            }
        } else if self.entries.len() >= self.capacity {
            match self.entries.last() {
                Some(last) if candidate.ranking_cmp(last).is_lt() => {
                    self.entries.pop();
                }
                _ => return false,
            }
        }
        let pos = self
            .entries
            .binary_search_by(|c| c.ranking_cmp(&candidate))
            .unwrap_or_else(|p| p);
        self.entries.insert(pos, candidate);
        true
    }

    pub fn add_all<I: IntoIterator<Item = Candidate>>(&mut self, candidates: I) {
        for c in candidates {
            self.add(c);
        }
    }

    /// Record candidates in the unfiltered raw list (no dedup, no cap).
    pub fn add_raw<I: IntoIterator<Item = Candidate>>(&mut self, candidates: I) {
        self.raw_suggestions.extend(candidates);
    }

    pub fn first(&self) -> Option<&Candidate> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.entries.iter()
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.entries.iter().any(|c| c.word == word)
    }

    /// Remove the entry with the given word, if present.
    pub fn remove(&mut self, word: &str) -> Option<Candidate> {
        let pos = self.entries.iter().position(|c| c.word == word)?;
        Some(self.entries.remove(pos))
    }

    pub fn retain<F: FnMut(&Candidate) -> bool>(&mut self, pred: F) {
        self.entries.retain(pred);
    }

    pub fn to_vec(&self) -> Vec<Candidate> {
        self.entries.clone()
    }
}

impl<'a> IntoIterator for &'a SuggestionResults {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{CandidateKind, DictionaryKind, Locale};

    fn cand(word: &str, score: i32) -> Candidate {
        Candidate::new(
            word,
            score,
            CandidateKind::Correction,
            DictionaryKind::Main,
            Locale::new("en"),
        )
    }

    #[test]
    fn keeps_ranking_order() {
        let mut r = SuggestionResults::new(10, false, false);
        r.add(cand("b", 5));
        r.add(cand("a", 20));
        r.add(cand("c", 10));
        let words: Vec<_> = r.iter().map(|c| c.word.as_str()).collect();
        assert_eq!(words, ["a", "c", "b"]);
    }

    #[test]
    fn duplicate_word_keeps_higher_score() {
        let mut r = SuggestionResults::new(10, false, false);
        assert!(r.add(cand("hello", 5)));
        assert!(r.add(cand("hello", 50)));
        assert_eq!(r.len(), 1);
        assert_eq!(r.first().unwrap().score, 50);

        assert!(!r.add(cand("hello", 10)));
        assert_eq!(r.first().unwrap().score, 50);
    }

    #[test]
    fn capacity_evicts_lowest() {
        let mut r = SuggestionResults::new(2, false, false);
        r.add(cand("a", 10));
        r.add(cand("b", 20));
        // worse than everything at capacity: rejected
        assert!(!r.add(cand("c", 5)));
        assert_eq!(r.len(), 2);
        // better than the weakest: evicts it
        assert!(r.add(cand("d", 15)));
        assert_eq!(r.len(), 2);
        assert!(!r.contains_word("a"));
        assert!(r.contains_word("d"));
    }

    #[test]
    fn no_duplicate_words_after_merging_many() {
        let mut r = SuggestionResults::new(18, false, false);
        for score in [10, 40, 30, 40, 20] {
            r.add(cand("same", score));
        }
        assert_eq!(r.len(), 1);
        assert_eq!(r.first().unwrap().score, 40);
    }

    #[test]
    fn flags_are_preserved() {
        let r = SuggestionResults::new(1, true, false);
        assert!(r.is_beginning_of_sentence);
        assert!(!r.first_exceeds_confidence_threshold);
    }
}
