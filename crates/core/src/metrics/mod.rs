//! Ranking quality metrics
//!
//! Each [`MetricKind`] knows how to score a single rated search and carries a
//! default threshold used when a metric configuration does not set `expected`.
//!
//! - Precision@k, Recall@k
//! - MRR (Mean Reciprocal Rank)
//! - ERR (Expected Reciprocal Rank)
//! - DCG / NDCG (Discounted Cumulative Gain, normalized)

mod compute;

pub use compute::{aggregate, compute_metric};

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::{Error, Result};

/// Default rank cutoff when a metric does not specify `k`
pub const DEFAULT_K: usize = 5;

/// A named ranking-quality measure
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum MetricKind {
    #[strum(to_string = "PrecisionAtK", serialize = "precision", serialize = "p")]
    PrecisionAtK,
    #[strum(to_string = "RecallAtK", serialize = "recall", serialize = "r")]
    RecallAtK,
    #[strum(to_string = "MeanReciprocalRank", serialize = "mrr")]
    MeanReciprocalRank,
    #[strum(to_string = "ExpectedReciprocalRank", serialize = "err")]
    ExpectedReciprocalRank,
    #[strum(to_string = "DiscountedCumulativeGain", serialize = "dcg")]
    DiscountedCumulativeGain,
    #[strum(to_string = "NormalizedDiscountedCumulativeGain", serialize = "ndcg")]
    NormalizedDiscountedCumulativeGain,
}

impl MetricKind {
    /// Minimum acceptable value when no explicit `expected` is configured
    pub const fn default_expected(self) -> f64 {
        match self {
            Self::PrecisionAtK => 0.6,
            Self::RecallAtK => 0.6,
            Self::MeanReciprocalRank => 0.5,
            Self::ExpectedReciprocalRank => 0.3,
            // DCG is unbounded, so there is no meaningful default floor
            Self::DiscountedCumulativeGain => 0.0,
            Self::NormalizedDiscountedCumulativeGain => 0.6,
        }
    }

    /// Parse a metric reference such as `ndcg`, `PrecisionAtK` or `precision@5`
    ///
    /// Returns the kind together with the `k` embedded in an `@k` suffix, if any.
    pub fn parse_reference(reference: &str) -> Result<(Self, Option<usize>)> {
        let (name, k) = match reference.split_once('@') {
            Some((name, k)) => {
                let k = k.trim().parse::<usize>().map_err(|_| {
                    Error::invalid_input(format!("Invalid cutoff in metric '{reference}'"))
                })?;
                if k == 0 {
                    return Err(Error::invalid_input(format!(
                        "Metric cutoff must be greater than 0 in '{reference}'"
                    )));
                }
                (name, Some(k))
            }
            None => (reference, None),
        };

        let kind = Self::from_str(name.trim()).map_err(|_| {
            Error::invalid_input(format!(
                "Unknown metric '{reference}'. Valid metrics: precision, recall, mrr, err, dcg, ndcg"
            ))
        })?;
        Ok((kind, k))
    }
}

impl TryFrom<String> for MetricKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse_reference(&value).map(|(kind, _)| kind)
    }
}

impl From<MetricKind> for String {
    fn from(kind: MetricKind) -> Self {
        kind.to_string()
    }
}
