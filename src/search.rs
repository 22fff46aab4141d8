//! Relevance ranking for the command palette and in-page filtering.
//!
//! Matching is case-insensitive and done on NFC-normalised text, so a name
//! typed with a precomposed accent still matches one stored decomposed.

use std::borrow::Cow;

use icu_normalizer::ComposingNormalizerBorrowed;

pub const SCORE_EXACT: u32 = 100;
pub const SCORE_PREFIX: u32 = 80;
pub const SCORE_WORD_BOUNDARY: u32 = 60;
pub const SCORE_SUBSTRING: u32 = 40;
pub const SCORE_SUBSEQUENCE: u32 = 20;

fn fold(text: &str) -> String {
    let nfc: Cow<'_, str> = ComposingNormalizerBorrowed::new_nfc().normalize(text);
    nfc.to_lowercase()
}

fn is_word_separator(ch: char) -> bool {
    ch == ' ' || ch == '-'
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut remaining = haystack.chars();
    needle
        .chars()
        .all(|wanted| remaining.by_ref().any(|ch| ch == wanted))
}

/// Score `name` against `query`. Zero means the name does not match.
pub fn score_match(name: &str, query: &str) -> u32 {
    let query = fold(query.trim());
    if query.is_empty() {
        return 0;
    }
    let name = fold(name);

    if name == query {
        return SCORE_EXACT;
    }
    if name.starts_with(&query) {
        return SCORE_PREFIX;
    }
    let mut found = false;
    for (offset, _) in name.match_indices(&query) {
        found = true;
        if name[..offset].chars().next_back().is_some_and(is_word_separator) {
            return SCORE_WORD_BOUNDARY;
        }
    }
    if found {
        return SCORE_SUBSTRING;
    }
    if is_subsequence(&query, &name) {
        return SCORE_SUBSEQUENCE;
    }
    0
}

/// Matching items, best first. Equal scores keep their input order; a blank
/// query returns every item in input order.
pub fn search_and_sort<'a, T, F>(items: &'a [T], query: &str, name_of: F) -> Vec<&'a T>
where
    F: Fn(&'a T) -> &'a str,
{
    if query.trim().is_empty() {
        return items.iter().collect();
    }
    let mut scored: Vec<(u32, &T)> = items
        .iter()
        .map(|item| (score_match(name_of(item), query), item))
        .filter(|(score, _)| *score > 0)
        .collect();
    // sort_by is stable
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, item)| item).collect()
}

/// Index form of [`search_and_sort`], for callers that keep positions.
pub fn rank_indices<'a, T, F>(items: &'a [T], query: &str, name_of: F) -> Vec<usize>
where
    F: Fn(&'a T) -> &'a str,
{
    let indexed: Vec<(usize, &'a T)> = items.iter().enumerate().collect();
    search_and_sort(&indexed, query, |&(_, item)| name_of(item))
        .into_iter()
        .map(|&(index, _)| index)
        .collect()
}
