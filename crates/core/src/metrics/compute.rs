//! Per rated search metric computation
//!
//! Only the top `k` retrieved results are considered. A retrieved document
//! with a rating is a hit, anything else is unrated. A hit is relevant when
//! its rating reaches `relevant_rating_threshold`.

use std::collections::{HashMap, HashSet};
use tracing::warn;

use super::MetricKind;
use crate::configuration::{MetricConfiguration, MetricParams};
use crate::rated_search::RatedSearch;
use crate::search_models::{MetricResult, RatedHit, SearchResult, SearchResults};

/// Score one rated search against the results a backend returned for it
pub fn compute_metric(
    configuration: &MetricConfiguration,
    search: &RatedSearch,
    results: &SearchResults,
) -> MetricResult {
    let params = &configuration.params;
    let ratings = search.ratings_by_document();
    let top_k = top_k_unique(search, results, params.k);

    // Rating per rank position; None for unrated documents
    let ranked: Vec<Option<i64>> = top_k
        .iter()
        .map(|r| ratings.get(r.id.as_str()).copied())
        .collect();

    let metric = match configuration.metric {
        MetricKind::PrecisionAtK => precision_at_k(&ranked, params),
        MetricKind::RecallAtK => recall_at_k(&ranked, &ratings, params),
        MetricKind::MeanReciprocalRank => reciprocal_rank(&ranked, params),
        MetricKind::ExpectedReciprocalRank => expected_reciprocal_rank(&ranked, params),
        MetricKind::DiscountedCumulativeGain => dcg(&ranked, params),
        MetricKind::NormalizedDiscountedCumulativeGain => ndcg(&ranked, &ratings, params),
    };

    let mut hits = Vec::new();
    let mut unrated = Vec::new();
    for (result, rating) in top_k.into_iter().zip(&ranked) {
        match rating {
            Some(rating) => hits.push(RatedHit {
                result: result.clone(),
                rating: *rating as f64,
            }),
            None => unrated.push(result.clone()),
        }
    }

    MetricResult {
        id: search.id.clone(),
        metric,
        hits,
        unrated,
    }
}

/// First `k` results with repeated document ids removed
///
/// A document counts once, at the rank it first appeared.
fn top_k_unique<'a>(
    search: &RatedSearch,
    results: &'a SearchResults,
    k: usize,
) -> Vec<&'a SearchResult> {
    let mut seen = HashSet::new();
    let mut duplicates = 0;
    let top_k: Vec<&SearchResult> = results
        .results
        .iter()
        .filter(|r| {
            let first = seen.insert(r.id.as_str());
            if !first {
                duplicates += 1;
            }
            first
        })
        .take(k)
        .collect();

    if duplicates > 0 {
        warn!(
            test_case = %search.id,
            "Ignoring {duplicates} repeated document ids in search results"
        );
    }
    top_k
}

/// Overall metric value: the mean over all rated searches, 0.0 for none
pub fn aggregate(details: &[MetricResult]) -> f64 {
    if details.is_empty() {
        return 0.0;
    }
    details.iter().map(|d| d.metric).sum::<f64>() / details.len() as f64
}

fn is_relevant(rating: Option<i64>, params: &MetricParams) -> bool {
    rating.is_some_and(|r| r >= params.relevant_rating_threshold)
}

fn precision_at_k(ranked: &[Option<i64>], params: &MetricParams) -> f64 {
    let relevant = ranked.iter().filter(|r| is_relevant(**r, params)).count();
    relevant as f64 / params.k as f64
}

fn recall_at_k(
    ranked: &[Option<i64>],
    ratings: &HashMap<&str, i64>,
    params: &MetricParams,
) -> f64 {
    let total_relevant = ratings
        .values()
        .filter(|r| **r >= params.relevant_rating_threshold)
        .count();
    if total_relevant == 0 {
        return 1.0; // Nothing to find means nothing was missed
    }
    let retrieved = ranked.iter().filter(|r| is_relevant(**r, params)).count();
    retrieved as f64 / total_relevant as f64
}

fn reciprocal_rank(ranked: &[Option<i64>], params: &MetricParams) -> f64 {
    ranked
        .iter()
        .position(|r| is_relevant(*r, params))
        .map_or(0.0, |idx| 1.0 / (idx + 1) as f64)
}

fn expected_reciprocal_rank(ranked: &[Option<i64>], params: &MetricParams) -> f64 {
    let max_gain = 2f64.powi(params.max_relevance as i32);
    let mut p_continue = 1.0;
    let mut err = 0.0;
    for (idx, rating) in ranked.iter().enumerate() {
        let grade = rating.unwrap_or(0).clamp(0, params.max_relevance);
        let p_stop = (2f64.powi(grade as i32) - 1.0) / max_gain;
        err += p_continue * p_stop / (idx + 1) as f64;
        p_continue *= 1.0 - p_stop;
    }
    err
}

fn gain(rating: i64, params: &MetricParams) -> f64 {
    let rating = rating.max(0);
    if params.use_linear_gains {
        rating as f64
    } else {
        2f64.powi(rating as i32) - 1.0
    }
}

/// Discount for a zero based rank position
fn discount(idx: usize) -> f64 {
    ((idx + 2) as f64).log2()
}

fn dcg(ranked: &[Option<i64>], params: &MetricParams) -> f64 {
    ranked
        .iter()
        .enumerate()
        .map(|(idx, rating)| gain(rating.unwrap_or(0), params) / discount(idx))
        .sum()
}

fn ndcg(ranked: &[Option<i64>], ratings: &HashMap<&str, i64>, params: &MetricParams) -> f64 {
    let mut ideal: Vec<i64> = ratings.values().copied().collect();
    ideal.sort_by(|a, b| b.cmp(a));

    let idcg: f64 = ideal
        .iter()
        .take(params.k)
        .enumerate()
        .map(|(idx, rating)| gain(*rating, params) / discount(idx))
        .sum();

    if idcg == 0.0 {
        1.0
    } else {
        dcg(ranked, params) / idcg
    }
}
