//! Query string parsing.
//!
//! Turns a raw query like
//! `"GIS mapping" title:QGIS open AND data` into a [`ParsedQuery`].
//! Parsing never fails; anything that is not a quoted phrase or a
//! field-scoped term ends up as a general term.

use std::collections::{BTreeMap, BTreeSet};

use crate::search::types::{ParsedQuery, QueryLogic, SearchField};

/// Parse a raw query string.
///
/// Steps, each consuming the text it matched:
/// 1. quoted phrases (`"…"` pairs), in first-seen order;
/// 2. `field:term` tokens for the known fields, accumulated per
///    field;
/// 3. logic, `OR` if the remainder contains it as a whole word
///    (case-insensitive), `AND` otherwise;
/// 4. the remainder split on whole-word `AND`/`OR` into general
///    terms, which may contain spaces.
pub fn parse(query: &str) -> ParsedQuery {
    let (quoted_phrases, remainder) = extract_phrases(query);
    let (field_queries, tokens) = extract_field_terms(&remainder);

    let logic = if tokens.iter().any(|t| t.eq_ignore_ascii_case("OR")) {
        QueryLogic::Or
    } else {
        QueryLogic::And
    };

    let general = split_general_terms(&tokens);

    ParsedQuery {
        quoted_phrases,
        field_queries,
        general,
        logic,
    }
}

/// Pull out `"…"` phrases. Returns the phrases in order and the query
/// text with phrases and quote characters removed. An unterminated
/// quote is dropped and its trailing text kept as ordinary terms.
fn extract_phrases(query: &str) -> (Vec<String>, String) {
    let mut phrases = Vec::new();
    let mut remainder = String::with_capacity(query.len());

    let parts: Vec<&str> = query.split('"').collect();
    for (i, part) in parts.iter().enumerate() {
        let is_complete_phrase = i % 2 == 1 && i < parts.len() - 1;
        if is_complete_phrase && !part.trim().is_empty() {
            phrases.push((*part).to_string());
        } else if !is_complete_phrase {
            remainder.push(' ');
            remainder.push_str(part);
        }
    }

    (phrases, remainder)
}

/// Pull out `field:term` tokens for the known fields. Returns the
/// accumulated field queries and the leftover whitespace tokens.
fn extract_field_terms(remainder: &str) -> (BTreeMap<SearchField, BTreeSet<String>>, Vec<String>) {
    let mut field_queries: BTreeMap<SearchField, BTreeSet<String>> = BTreeMap::new();
    let mut tokens = Vec::new();

    for token in remainder.split_whitespace() {
        if let Some((name, term)) = token.split_once(':') {
            if let Some(field) = SearchField::from_name(name) {
                if !term.is_empty() {
                    field_queries
                        .entry(field)
                        .or_default()
                        .insert(term.to_string());
                    continue;
                }
            }
        }
        tokens.push(token.to_string());
    }

    (field_queries, tokens)
}

/// Split the leftover tokens on whole-word `AND`/`OR`. Runs of tokens
/// between connectives become one general term, so multi-word terms
/// survive.
fn split_general_terms(tokens: &[String]) -> Vec<String> {
    let mut general = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for token in tokens {
        if token.eq_ignore_ascii_case("AND") || token.eq_ignore_ascii_case("OR") {
            if !current.is_empty() {
                general.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(token);
        }
    }
    if !current.is_empty() {
        general.push(current.join(" "));
    }

    general
}
