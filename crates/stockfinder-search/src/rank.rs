//! Deterministic relevance ordering for joined results.
//!
//! Keys, most significant first:
//!
//! 1. verified before unverified
//! 2. fewer outstanding reports first
//! 3. exact name match, then prefix match, then anything else
//! 4. known distance (ascending) before unknown distance
//! 5. between two verified items, more recently verified first
//! 6. case-insensitive name, then item id

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::cache::normalize_query;
use crate::types::SearchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum NameMatch {
    Exact,
    Prefix,
    Other,
}

#[derive(Debug)]
struct RankKey {
    verified: bool,
    report_count: u32,
    name_match: NameMatch,
    distance_km: Option<f64>,
    verified_at: Option<DateTime<Utc>>,
    folded_name: String,
    id: String,
}

impl RankKey {
    fn new(result: &SearchResult, needle: &str) -> Self {
        let folded_name = result.item.name.trim().to_lowercase();
        let name_match = if folded_name == needle {
            NameMatch::Exact
        } else if !needle.is_empty() && folded_name.starts_with(needle) {
            NameMatch::Prefix
        } else {
            NameMatch::Other
        };
        Self {
            verified: result.item.verified,
            report_count: result.item.report_count,
            name_match,
            distance_km: result.distance_km,
            verified_at: result.item.verified_at,
            folded_name,
            id: result.item.id.clone(),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        other
            .verified
            .cmp(&self.verified)
            .then(self.report_count.cmp(&other.report_count))
            .then(self.name_match.cmp(&other.name_match))
            .then_with(|| compare_distance(self.distance_km, other.distance_km))
            .then_with(|| self.compare_recency(other))
            .then_with(|| self.folded_name.cmp(&other.folded_name))
            .then_with(|| self.id.cmp(&other.id))
    }

    fn compare_recency(&self, other: &Self) -> Ordering {
        if !(self.verified && other.verified) {
            return Ordering::Equal;
        }
        match (self.verified_at, other.verified_at) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compare two results for `query`. `Less` means `a` ranks higher.
#[must_use]
pub fn compare_results(a: &SearchResult, b: &SearchResult, query: &str) -> Ordering {
    let needle = normalize_query(query);
    RankKey::new(a, &needle).compare(&RankKey::new(b, &needle))
}

/// Return a ranked copy of `results`; the input slice is left untouched.
///
/// The sort is stable and the comparator is a total order, so ranking an
/// already ranked list returns it unchanged.
#[must_use]
pub fn rank_results(results: &[SearchResult], query: &str) -> Vec<SearchResult> {
    let needle = normalize_query(query);
    let mut keyed: Vec<(RankKey, &SearchResult)> = results
        .iter()
        .map(|result| (RankKey::new(result, &needle), result))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| a.compare(b));
    keyed.into_iter().map(|(_, result)| result.clone()).collect()
}

#[cfg(test)]
#[path = "rank_test.rs"]
mod tests;
