//! Relevance scoring.
//!
//! One [`Scorer`] is compiled per search call from the parsed query
//! and the call's options; scoring an item is then pure CPU work with
//! no allocation beyond the result itself.
//!
//! Scoring rules:
//! - quoted phrases add a flat per-field bonus and stack on top of
//!   term matches;
//! - field-scoped terms count only in their named field and are
//!   required, so under AND logic a miss rejects the item;
//! - general terms count in every field they hit; under AND logic the
//!   first term that matches nowhere rejects the item, discarding all
//!   contributions accumulated up to that point; under OR everything
//!   is additive.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::error::{FeedscoutError, Result};
use crate::feed::types::FeedItem;
use crate::search::matching::{FuzzyMatcher, TermPattern};
use crate::search::types::{ParsedQuery, QueryLogic, SearchField};

/// Score and match detail for one item against one query.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemScore {
    /// Accumulated relevance. Zero means the item is not a match.
    pub score: f64,
    /// Fields in which something matched.
    pub matched_fields: BTreeSet<SearchField>,
    /// Byte spans of matches per field, in evaluation order.
    pub match_positions: BTreeMap<SearchField, Vec<(usize, usize)>>,
}

impl ItemScore {
    fn no_match() -> Self {
        Self {
            score: 0.0,
            matched_fields: BTreeSet::new(),
            match_positions: BTreeMap::new(),
        }
    }

    /// Whether the item passed the admission test.
    pub fn is_match(&self) -> bool {
        self.score > 0.0
    }

    fn record(&mut self, field: SearchField, span: (usize, usize), points: f64) {
        self.score += points;
        self.matched_fields.insert(field);
        self.match_positions.entry(field).or_default().push(span);
    }
}

#[derive(Debug, Clone, Copy)]
enum MatchKind {
    Exact,
    Fuzzy,
}

impl MatchKind {
    fn points(self, field: SearchField) -> f64 {
        match self {
            MatchKind::Exact => field.weight() * field.exact_multiplier(),
            MatchKind::Fuzzy => field.weight() * field.fuzzy_multiplier(),
        }
    }
}

/// A query compiled against fixed options, ready to score items.
pub struct Scorer<'a> {
    logic: QueryLogic,
    fuzzy_tolerance: u8,
    phrases: Vec<Regex>,
    field_terms: Vec<(SearchField, String, TermPattern)>,
    general_terms: Vec<(String, TermPattern)>,
    fuzzy: &'a dyn FuzzyMatcher,
}

impl<'a> Scorer<'a> {
    /// Compile all patterns for a query once. Pattern compilation
    /// failures indicate a defect and propagate.
    pub fn compile(
        query: &ParsedQuery,
        use_word_boundary: bool,
        fuzzy_tolerance: u8,
        fuzzy: &'a dyn FuzzyMatcher,
    ) -> Result<Self> {
        let mut phrases = Vec::with_capacity(query.quoted_phrases.len());
        for phrase in &query.quoted_phrases {
            let regex = Regex::new(&format!("(?i){}", regex::escape(phrase))).map_err(|e| {
                FeedscoutError::Search(format!("phrase pattern {:?}: {}", phrase, e))
            })?;
            phrases.push(regex);
        }

        let mut field_terms = Vec::new();
        for (field, terms) in &query.field_queries {
            for term in terms {
                field_terms.push((
                    *field,
                    term.clone(),
                    TermPattern::new(term, use_word_boundary)?,
                ));
            }
        }

        let mut general_terms = Vec::with_capacity(query.general.len());
        for term in &query.general {
            general_terms.push((term.clone(), TermPattern::new(term, use_word_boundary)?));
        }

        Ok(Self {
            logic: query.logic,
            fuzzy_tolerance,
            phrases,
            field_terms,
            general_terms,
            fuzzy,
        })
    }

    /// Score one item against the compiled query.
    ///
    /// Evaluation order is phrases, then field-scoped terms, then
    /// general terms; the AND rejections below depend on it.
    pub fn score(&self, item: &FeedItem) -> ItemScore {
        let mut out = ItemScore::no_match();

        // Quoted phrases: plain substring containment per field, flat
        // additive bonus, stacks with term matches on the same text.
        for regex in &self.phrases {
            for field in SearchField::ALL {
                if let Some(m) = regex.find(field.text_of(item)) {
                    out.record(field, (m.start(), m.end()), field.phrase_bonus());
                }
            }
        }

        // Field-scoped terms count only in their named field. They
        // are required matches: under AND a miss rejects the item.
        for (field, term, pattern) in &self.field_terms {
            match self.term_match(*field, term, pattern, item) {
                Some((span, kind)) => out.record(*field, span, kind.points(*field)),
                None => {
                    if self.logic == QueryLogic::And {
                        return ItemScore::no_match();
                    }
                }
            }
        }

        // General terms run against every field; each hit field
        // contributes. Under AND, a term that matches nowhere rejects
        // the item and discards everything accumulated above.
        for (term, pattern) in &self.general_terms {
            let mut matched_any = false;
            for field in SearchField::ALL {
                if let Some((span, kind)) = self.term_match(field, term, pattern, item) {
                    out.record(field, span, kind.points(field));
                    matched_any = true;
                }
            }
            if !matched_any && self.logic == QueryLogic::And {
                return ItemScore::no_match();
            }
        }

        out
    }

    /// Match one term in one field: exact first, then fuzzy when
    /// tolerance allows. One kind of match per term per field.
    fn term_match(
        &self,
        field: SearchField,
        term: &str,
        pattern: &TermPattern,
        item: &FeedItem,
    ) -> Option<((usize, usize), MatchKind)> {
        let text = field.text_of(item);
        if let Some(span) = pattern.find_exact(text) {
            return Some((span, MatchKind::Exact));
        }
        if self.fuzzy_tolerance > 0 {
            if let Some(span) = self.fuzzy.find_fuzzy(term, text, self.fuzzy_tolerance) {
                return Some((span, MatchKind::Fuzzy));
            }
        }
        None
    }
}
