//! Human and machine readable reports of a metrics run
//!
//! The console report goes to any writer so it can be rendered into a buffer
//! in tests. File reports are JSON and never overwrite an existing file.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::{OwoColorize, Style};
use rankquest_core::evaluation::MetricVerdict;
use rankquest_core::{
    Error, Evaluation, MetricConfiguration, MetricsOutput, RatedSearch, Result, TestCaseFailure,
};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::error;

/// Where the metric results of a run are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Human readable report on stdout
    Console,
    /// JSON report in a file that must not exist yet
    File(PathBuf),
}

impl OutputTarget {
    /// Pick the target for an optional output path
    ///
    /// Fails with [`Error::OutputAlreadyExists`] when the path is taken, so the
    /// check can run before any search is executed.
    pub fn prepare(output: Option<PathBuf>) -> Result<Self> {
        match output {
            None => Ok(Self::Console),
            Some(path) if path.exists() => Err(Error::OutputAlreadyExists(path)),
            Some(path) => Ok(Self::File(path)),
        }
    }
}

/// Write the metric outputs as a pretty printed JSON array
pub fn write_json_report(path: &Path, outputs: &[MetricsOutput]) -> Result<()> {
    let json = serde_json::to_string_pretty(outputs)
        .map_err(|e| Error::with_context("Failed to serialize report", e))?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => Error::OutputAlreadyExists(path.to_path_buf()),
            _ => Error::with_context(format!("Failed to create {}", path.display()), e),
        })?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Final line of every run
///
/// Metrics below their expected value take precedence over metrics that
/// could not be evaluated.
pub fn summary_line(failing_metrics: &[String], unevaluated_metrics: &[String]) -> String {
    if !failing_metrics.is_empty() {
        format!(
            "The following metrics: [{}] are below their expected values.",
            failing_metrics.join(", ")
        )
    } else if !unevaluated_metrics.is_empty() {
        format!(
            "The following metrics: [{}] were not evaluated because no rated search succeeded.",
            unevaluated_metrics.join(", ")
        )
    } else {
        "All metrics are within acceptable range".to_string()
    }
}

/// Rated to unrated hit ratio for display, `-` when nothing is unrated
pub fn rated_ratio(rated: usize, unrated: usize) -> String {
    if unrated == 0 {
        "-".to_string()
    } else {
        format!("{:.2}", rated as f64 / unrated as f64)
    }
}

/// Progress bar over rated searches, drawn on stderr
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .map_err(|e| error!("Failed to set progress bar style: {}", e))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb
}

const TABLE_HEADER: [&str; 6] = [
    "Id",
    "Metric",
    "Rated",
    "Unrated",
    "Rated/Unrated",
    "Search Context",
];

/// Renders a run for humans
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReport {
    /// Emit ANSI colours
    pub color: bool,
    /// Add a per rated search table under every metric
    pub verbose: bool,
}

impl ConsoleReport {
    fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    fn verdict_style(passed: bool) -> Style {
        if passed {
            Style::new().green()
        } else {
            Style::new().red()
        }
    }

    /// Warn about rated searches that failed and metrics left without data
    pub fn render_failures(
        &self,
        out: &mut dyn Write,
        failures: &[&TestCaseFailure],
        unevaluated: &[MetricConfiguration],
    ) -> io::Result<()> {
        let warning = Style::new().yellow();
        if !failures.is_empty() {
            let heading = format!("{} rated searches failed:", failures.len());
            writeln!(out, "{}", self.paint(&heading, warning))?;
            for failure in failures {
                writeln!(out, "{}", self.paint(&format!("  {failure}"), warning))?;
            }
        }
        for metric in unevaluated {
            let line = format!(
                "Metric {} was not evaluated: no rated search succeeded",
                metric.name
            );
            writeln!(out, "{}", self.paint(&line, warning))?;
        }
        Ok(())
    }

    /// One line per metric, plus the detail table in verbose mode
    pub fn render_metrics(
        &self,
        out: &mut dyn Write,
        outputs: &[MetricsOutput],
        test_cases: &[RatedSearch],
    ) -> io::Result<()> {
        let by_id: HashMap<&str, &RatedSearch> =
            test_cases.iter().map(|t| (t.id.as_str(), t)).collect();

        for output in outputs {
            let verdict = MetricVerdict::from_output(output);
            let value = format!(
                "{:.4} (expected {:.4}) {}",
                verdict.achieved,
                verdict.expected,
                if verdict.passed { "PASS" } else { "FAIL" }
            );
            writeln!(
                out,
                "{}: {}",
                self.paint(&verdict.name, Style::new().bold()),
                self.paint(&value, Self::verdict_style(verdict.passed))
            )?;

            if self.verbose {
                self.render_table(out, &verdict, output, &by_id)?;
            }
        }
        Ok(())
    }

    fn render_table(
        &self,
        out: &mut dyn Write,
        verdict: &MetricVerdict,
        output: &MetricsOutput,
        by_id: &HashMap<&str, &RatedSearch>,
    ) -> io::Result<()> {
        let rows: Vec<([String; 6], bool)> = verdict
            .rows
            .iter()
            .zip(&output.results.details)
            .map(|(row, detail)| {
                let context = by_id
                    .get(row.id.as_str())
                    .map(|t| t.context_summary())
                    .unwrap_or_default();
                let cells = [
                    row.id.clone(),
                    format!("{:.4}", row.metric),
                    detail.hits.len().to_string(),
                    detail.unrated.len().to_string(),
                    rated_ratio(detail.hits.len(), detail.unrated.len()),
                    context,
                ];
                (cells, row.passed)
            })
            .collect();

        let mut widths = TABLE_HEADER.map(|h| h.chars().count());
        for (cells, _) in &rows {
            for (width, cell) in widths.iter_mut().zip(cells) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let header = TABLE_HEADER.map(str::to_string);
        writeln!(
            out,
            "{}",
            self.paint(&format_row(&header, &widths), Style::new().bold())
        )?;
        for (cells, passed) in &rows {
            let mut padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| pad(cell, *width))
                .collect();
            padded[1] = self.paint(&padded[1], Self::verdict_style(*passed));
            writeln!(out, "{}", padded.join("  ").trim_end())?;
        }
        writeln!(out)
    }

    /// Final summary naming the metrics below their expected value or left
    /// unevaluated
    pub fn render_summary(
        &self,
        out: &mut dyn Write,
        evaluation: &Evaluation,
        unevaluated: &[MetricConfiguration],
    ) -> io::Result<()> {
        let failing = evaluation.failing_names();
        let unevaluated: Vec<String> = unevaluated.iter().map(|m| m.name.clone()).collect();
        let line = summary_line(&failing, &unevaluated);
        let style = if failing.is_empty() && !unevaluated.is_empty() {
            Style::new().yellow()
        } else {
            Self::verdict_style(evaluation.passed())
        };
        writeln!(out, "{}", self.paint(&line, style))
    }
}

fn pad(cell: &str, width: usize) -> String {
    let len = cell.chars().count();
    format!("{cell}{}", " ".repeat(width.saturating_sub(len)))
}

fn format_row(cells: &[String; 6], widths: &[usize; 6]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| pad(cell, *width))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rankquest_core::{MetricKind, MetricResult, MetricResults, RatedHit, SearchResult};

    fn output(expected: f64, rows: &[(&str, f64, usize, usize)]) -> MetricsOutput {
        let details: Vec<MetricResult> = rows
            .iter()
            .map(|(id, metric, rated, unrated)| MetricResult {
                id: id.to_string(),
                metric: *metric,
                hits: (0..*rated)
                    .map(|i| RatedHit {
                        result: SearchResult::new(format!("r{i}")),
                        rating: 1.0,
                    })
                    .collect(),
                unrated: (0..*unrated)
                    .map(|i| SearchResult::new(format!("u{i}")))
                    .collect(),
            })
            .collect();
        let overall = details.iter().map(|d| d.metric).sum::<f64>() / details.len() as f64;
        MetricsOutput {
            search_configuration_name: "movies".to_string(),
            configuration: MetricConfiguration::new(MetricKind::PrecisionAtK, "precision@5")
                .with_k(5)
                .with_expected(expected),
            results: MetricResults {
                metric: overall,
                details,
            },
        }
    }

    fn rated_search(id: &str, q: &str) -> RatedSearch {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "searchContext": { "q": q },
            "ratings": []
        }))
        .expect("valid rated search")
    }

    fn render(report: ConsoleReport, outputs: &[MetricsOutput], tests: &[RatedSearch]) -> String {
        let mut buf = Vec::new();
        report
            .render_metrics(&mut buf, outputs, tests)
            .expect("render should succeed");
        String::from_utf8(buf).expect("utf8 output")
    }

    #[test]
    fn test_prepare_rejects_existing_output() {
        let file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        let err = OutputTarget::prepare(Some(file.path().to_path_buf()))
            .err()
            .expect("existing output should be rejected");
        assert!(matches!(err, Error::OutputAlreadyExists(_)));
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_prepare_console_and_new_file() {
        assert_eq!(
            OutputTarget::prepare(None).expect("console target"),
            OutputTarget::Console
        );
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("report.json");
        assert_eq!(
            OutputTarget::prepare(Some(path.clone())).expect("file target"),
            OutputTarget::File(path)
        );
    }

    #[test]
    fn test_write_json_report_never_overwrites() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("report.json");
        let outputs = vec![output(0.5, &[("tc-1", 0.6, 3, 2)])];

        write_json_report(&path, &outputs).expect("first write should succeed");
        let written: Vec<MetricsOutput> = serde_json::from_str(
            &std::fs::read_to_string(&path).expect("report should exist"),
        )
        .expect("report should be valid JSON");
        assert_eq!(written, outputs);

        let err = write_json_report(&path, &outputs)
            .err()
            .expect("second write should fail");
        assert!(matches!(err, Error::OutputAlreadyExists(_)));
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(summary_line(&[], &[]), "All metrics are within acceptable range");
        assert_eq!(
            summary_line(&["ndcg".to_string(), "mrr".to_string()], &[]),
            "The following metrics: [ndcg, mrr] are below their expected values."
        );
    }

    #[test]
    fn test_summary_line_names_unevaluated_metrics() {
        assert_eq!(
            summary_line(&[], &["mrr".to_string()]),
            "The following metrics: [mrr] were not evaluated because no rated search succeeded."
        );
        assert!(summary_line(&["ndcg".to_string()], &["mrr".to_string()])
            .contains("[ndcg] are below"));
    }

    #[test]
    fn test_summary_without_evaluated_metrics_is_not_success() {
        let evaluation = Evaluation::from_outputs(&[]);
        let unevaluated = vec![MetricConfiguration::new(MetricKind::MeanReciprocalRank, "mrr")];
        let mut buf = Vec::new();
        ConsoleReport::default()
            .render_summary(&mut buf, &evaluation, &unevaluated)
            .expect("render should succeed");
        let text = String::from_utf8(buf).expect("utf8 output");
        assert!(!text.contains("All metrics are within acceptable range"));
        assert!(text.contains("[mrr] were not evaluated"));
    }

    #[test]
    fn test_rated_ratio_guards_zero_unrated() {
        assert_eq!(rated_ratio(3, 0), "-");
        assert_eq!(rated_ratio(3, 2), "1.50");
        assert_eq!(rated_ratio(0, 4), "0.00");
    }

    #[test]
    fn test_metric_line_marks_verdict() {
        let text = render(
            ConsoleReport::default(),
            &[output(0.8, &[("tc-1", 0.75, 1, 1), ("tc-2", 0.85, 1, 0)])],
            &[],
        );
        assert_eq!(text, "precision@5: 0.8000 (expected 0.8000) PASS\n");
    }

    #[test]
    fn test_verbose_table() {
        let report = ConsoleReport {
            color: false,
            verbose: true,
        };
        let text = render(
            report,
            &[output(0.8, &[("tc-1", 0.75, 3, 2), ("tc-2", 0.85, 2, 0)])],
            &[rated_search("tc-1", "alien")],
        );
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "precision@5: 0.8000 (expected 0.8000) PASS");
        assert_eq!(
            lines[1],
            "Id    Metric  Rated  Unrated  Rated/Unrated  Search Context"
        );
        assert_eq!(
            lines[2],
            "tc-1  0.7500  3      2        1.50           q=alien"
        );
        // Unknown ids have no context
        assert_eq!(lines[3], "tc-2  0.8500  2      0        -");
    }

    #[test]
    fn test_colored_output_contains_escape_codes() {
        let report = ConsoleReport {
            color: true,
            verbose: false,
        };
        let text = render(report, &[output(0.9, &[("tc-1", 0.5, 1, 1)])], &[]);
        assert!(text.contains("\u{1b}["));
        assert!(text.contains("FAIL"));
    }

    #[test]
    fn test_render_failures() {
        let failure = TestCaseFailure {
            id: "tc-7".to_string(),
            cause: "Search error: boom".to_string(),
        };
        let unevaluated =
            vec![MetricConfiguration::new(MetricKind::MeanReciprocalRank, "mrr")];
        let mut buf = Vec::new();
        ConsoleReport::default()
            .render_failures(&mut buf, &[&failure], &unevaluated)
            .expect("render should succeed");
        assert_eq!(
            String::from_utf8(buf).expect("utf8 output"),
            "1 rated searches failed:\n  tc-7: Search error: boom\n\
             Metric mrr was not evaluated: no rated search succeeded\n"
        );
    }
}
