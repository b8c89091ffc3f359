//! Term matching primitives for the search engine.
//!
//! Exact matching is case-insensitive substring or word-boundary
//! containment, located with per-term compiled regexes so match spans
//! are byte offsets into the original field text. Fuzzy matching is a
//! bounded-edit-distance scan over whitespace tokens.

use regex::Regex;

use crate::error::{FeedscoutError, Result};

/// Tokens are only considered for a fuzzy match when their character
/// length is within this window of the term's length.
const FUZZY_LENGTH_WINDOW: usize = 2;

/// Compiled patterns for one search term.
#[derive(Debug)]
pub struct TermPattern {
    substring: Regex,
    boundary: Option<Regex>,
}

impl TermPattern {
    /// Compile the patterns for a term. The term text is escaped, so
    /// user input cannot inject pattern syntax.
    pub fn new(term: &str, use_word_boundary: bool) -> Result<Self> {
        let escaped = regex::escape(term);
        let substring = Regex::new(&format!("(?i){}", escaped))
            .map_err(|e| FeedscoutError::Search(format!("term pattern {:?}: {}", term, e)))?;
        let boundary = if use_word_boundary {
            Some(
                Regex::new(&format!(r"(?i)\b{}\b", escaped)).map_err(|e| {
                    FeedscoutError::Search(format!("term pattern {:?}: {}", term, e))
                })?,
            )
        } else {
            None
        };
        Ok(Self {
            substring,
            boundary,
        })
    }

    /// Find an exact occurrence of the term in `text`, returning its
    /// byte span. Substring containment is tried first; the boundary
    /// pattern also admits a match when enabled. Either one suffices.
    pub fn find_exact(&self, text: &str) -> Option<(usize, usize)> {
        if let Some(m) = self.substring.find(text) {
            return Some((m.start(), m.end()));
        }
        if let Some(re) = &self.boundary {
            if let Some(m) = re.find(text) {
                return Some((m.start(), m.end()));
            }
        }
        None
    }
}

/// Fuzzy token matching. A trait seam so the brute-force scan can be
/// swapped for an indexed structure (trie, BK-tree) if corpora grow.
pub trait FuzzyMatcher: Send + Sync {
    /// Find the first whitespace token of `text` within `tolerance`
    /// edits of `term` (case-insensitive), returning the token's byte
    /// span. `tolerance` 0 never matches.
    fn find_fuzzy(&self, term: &str, text: &str, tolerance: u8) -> Option<(usize, usize)>;
}

/// Brute-force Levenshtein scan over whitespace-split tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinMatcher;

impl FuzzyMatcher for LevenshteinMatcher {
    fn find_fuzzy(&self, term: &str, text: &str, tolerance: u8) -> Option<(usize, usize)> {
        if tolerance == 0 {
            return None;
        }
        let term_lower = term.to_lowercase();
        let term_len = term.chars().count();
        for (offset, token) in tokens_with_offsets(text) {
            if token.chars().count().abs_diff(term_len) > FUZZY_LENGTH_WINDOW {
                continue;
            }
            if levenshtein(&term_lower, &token.to_lowercase()) <= tolerance as usize {
                // First qualifying token wins
                return Some((offset, offset + token.len()));
            }
        }
        None
    }
}

/// Levenshtein edit distance over characters, two-row dynamic
/// programming.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = if ca == cb { prev[j] } else { prev[j] + 1 };
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Split on whitespace, keeping each token's byte offset.
fn tokens_with_offsets(text: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push((s, &text[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push((s, &text[s..]));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("kitten", "kitten"), 0);
        assert_eq!(levenshtein("", ""), 0);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_levenshtein_classic() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("flaw", "lawn"), 2);
        assert_eq!(levenshtein("gis", "gps"), 1);
    }

    #[test]
    fn test_levenshtein_single_edits() {
        // substitution, insertion, deletion
        assert_eq!(levenshtein("cat", "bat"), 1);
        assert_eq!(levenshtein("cat", "cart"), 1);
        assert_eq!(levenshtein("cart", "cat"), 1);
    }

    #[test]
    fn test_levenshtein_unicode() {
        assert_eq!(levenshtein("über", "uber"), 1);
        assert_eq!(levenshtein("日本語", "日本"), 1);
    }

    #[test]
    fn test_tokens_with_offsets() {
        let tokens = tokens_with_offsets("  one  two\tthree ");
        assert_eq!(tokens, vec![(2, "one"), (7, "two"), (11, "three")]);
        assert!(tokens_with_offsets("").is_empty());
        assert!(tokens_with_offsets("   ").is_empty());
    }

    #[test]
    fn test_find_exact_substring_case_insensitive() {
        let pattern = TermPattern::new("gis", false).unwrap();
        assert_eq!(pattern.find_exact("New GIS release"), Some((4, 7)));
        assert_eq!(pattern.find_exact("nothing here"), None);
    }

    #[test]
    fn test_find_exact_partial_word_still_matches_with_boundary() {
        // Substring containment admits the match even when the
        // boundary pattern would not.
        let pattern = TermPattern::new("art", true).unwrap();
        assert_eq!(pattern.find_exact("restart required"), Some((4, 7)));
    }

    #[test]
    fn test_find_exact_special_characters_escaped() {
        let pattern = TermPattern::new("c++", true).unwrap();
        assert_eq!(pattern.find_exact("learn c++ today"), Some((6, 9)));

        let pattern = TermPattern::new("what?", false).unwrap();
        assert_eq!(pattern.find_exact("so what? nothing"), Some((3, 8)));
    }

    #[test]
    fn test_find_exact_reports_first_occurrence() {
        let pattern = TermPattern::new("map", true).unwrap();
        assert_eq!(pattern.find_exact("map of mapping maps"), Some((0, 3)));
    }

    #[test]
    fn test_find_fuzzy_zero_tolerance_never_matches() {
        let matcher = LevenshteinMatcher;
        assert_eq!(matcher.find_fuzzy("gis", "gps data", 0), None);
        assert_eq!(matcher.find_fuzzy("gis", "gis data", 0), None);
    }

    #[test]
    fn test_find_fuzzy_within_tolerance() {
        let matcher = LevenshteinMatcher;
        // "gps" is one substitution from "gis"
        assert_eq!(matcher.find_fuzzy("gis", "new gps data", 1), Some((4, 7)));
        // "tolos" is two substitutions from "tools"
        assert_eq!(matcher.find_fuzzy("tools", "tolos here", 1), None);
        assert_eq!(matcher.find_fuzzy("tools", "tolos here", 2), Some((0, 5)));
    }

    #[test]
    fn test_find_fuzzy_length_window() {
        let matcher = LevenshteinMatcher;
        // |token| differs from |term| by more than 2: skipped without
        // computing a distance
        assert_eq!(matcher.find_fuzzy("gis", "geographic", 2), None);
        // within the window it is considered
        assert_eq!(matcher.find_fuzzy("gis", "gisxx", 2), Some((0, 5)));
    }

    #[test]
    fn test_find_fuzzy_first_qualifying_token() {
        let matcher = LevenshteinMatcher;
        // both "gps" and "gas" qualify; the first one is reported
        assert_eq!(matcher.find_fuzzy("gis", "gps and gas", 1), Some((0, 3)));
    }

    #[test]
    fn test_find_fuzzy_case_insensitive() {
        let matcher = LevenshteinMatcher;
        assert_eq!(matcher.find_fuzzy("qgis", "QGI tutorial", 1), Some((0, 3)));
    }
}
