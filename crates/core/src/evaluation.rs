//! Threshold evaluation of metric outputs
//!
//! A metric passes when its achieved value is at or above its expected value.
//! The same threshold marks the individual rated searches of the metric.

use crate::metrics::MetricKind;
use crate::search_models::MetricsOutput;

/// `achieved >= expected`; NaN never passes
pub fn meets_threshold(achieved: f64, expected: f64) -> bool {
    achieved >= expected
}

/// Pass/fail of a single rated search within a metric
#[derive(Debug, Clone, PartialEq)]
pub struct RowVerdict {
    pub id: String,
    pub metric: f64,
    pub passed: bool,
}

/// Pass/fail of one configured metric
#[derive(Debug, Clone, PartialEq)]
pub struct MetricVerdict {
    pub name: String,
    pub kind: MetricKind,
    pub expected: f64,
    pub achieved: f64,
    pub passed: bool,
    pub rows: Vec<RowVerdict>,
}

impl MetricVerdict {
    pub fn from_output(output: &MetricsOutput) -> Self {
        let expected = output.configuration.expected_value();
        let achieved = output.results.metric;
        let rows = output
            .results
            .details
            .iter()
            .map(|d| RowVerdict {
                id: d.id.clone(),
                metric: d.metric,
                passed: meets_threshold(d.metric, expected),
            })
            .collect();

        Self {
            name: output.configuration.name.clone(),
            kind: output.configuration.metric,
            expected,
            achieved,
            passed: meets_threshold(achieved, expected),
            rows,
        }
    }
}

/// Verdicts for every evaluated metric of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub verdicts: Vec<MetricVerdict>,
}

impl Evaluation {
    pub fn from_outputs(outputs: &[MetricsOutput]) -> Self {
        Self {
            verdicts: outputs.iter().map(MetricVerdict::from_output).collect(),
        }
    }

    /// True when every evaluated metric passed
    pub fn passed(&self) -> bool {
        self.verdicts.iter().all(|v| v.passed)
    }

    pub fn failing(&self) -> impl Iterator<Item = &MetricVerdict> {
        self.verdicts.iter().filter(|v| !v.passed)
    }

    /// Names of the metrics below their expected value, in report order
    pub fn failing_names(&self) -> Vec<String> {
        self.failing().map(|v| v.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::MetricConfiguration;
    use crate::search_models::{MetricResult, MetricResults};

    fn output(name: &str, expected: Option<f64>, overall: f64, rows: &[(&str, f64)]) -> MetricsOutput {
        let mut configuration = MetricConfiguration::new(MetricKind::PrecisionAtK, name).with_k(5);
        configuration.expected = expected;
        MetricsOutput {
            search_configuration_name: "movies".to_string(),
            configuration,
            results: MetricResults {
                metric: overall,
                details: rows
                    .iter()
                    .map(|(id, metric)| MetricResult {
                        id: id.to_string(),
                        metric: *metric,
                        hits: Vec::new(),
                        unrated: Vec::new(),
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn test_threshold_boundary_passes() {
        assert!(meets_threshold(0.8, 0.8));
        assert!(meets_threshold(0.81, 0.8));
        assert!(!meets_threshold(0.79, 0.8));
        assert!(!meets_threshold(f64::NAN, 0.0));
    }

    #[test]
    fn test_precision_scenario_marks_rows_individually() {
        let outputs = [output(
            "precision@5",
            Some(0.8),
            0.8,
            &[("tc-1", 0.75), ("tc-2", 0.85)],
        )];
        let evaluation = Evaluation::from_outputs(&outputs);

        let verdict = &evaluation.verdicts[0];
        assert_eq!(verdict.expected, 0.8);
        assert!(verdict.passed);
        assert!(!verdict.rows[0].passed);
        assert!(verdict.rows[1].passed);
        assert!(evaluation.passed());
    }

    #[test]
    fn test_default_threshold_used_without_override() {
        let outputs = [output("precision", None, 0.59, &[])];
        let evaluation = Evaluation::from_outputs(&outputs);
        assert_eq!(
            evaluation.verdicts[0].expected,
            MetricKind::PrecisionAtK.default_expected()
        );
        assert!(!evaluation.passed());
    }

    #[test]
    fn test_single_failing_metric_fails_run() {
        let outputs = [
            output("a", Some(0.1), 0.9, &[]),
            output("b", Some(0.95), 0.9, &[]),
            output("c", Some(0.5), 0.9, &[]),
        ];
        let evaluation = Evaluation::from_outputs(&outputs);
        assert!(!evaluation.passed());
        assert_eq!(evaluation.failing_names(), vec!["b".to_string()]);
    }

    #[test]
    fn test_empty_evaluation_passes() {
        assert!(Evaluation::from_outputs(&[]).passed());
    }
}
