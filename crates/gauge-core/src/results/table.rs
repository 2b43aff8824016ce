//! Metrics tables over result files.
//!
//! Each file is loaded on its own so rows keep the model configuration they
//! were produced with; nothing is merged across files here.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::error::AggregationResult;
use super::load::load_simulation_file;
use super::stats::{compute_task_metrics, TaskMetrics};
use crate::config::AggregationConfig;

/// Identity columns, in output order.
pub const IDENTITY_COLUMNS: [&str; 6] = [
    "domain",
    "user_model",
    "user_model_params",
    "agent_model",
    "agent_model_params",
    "task",
];

/// Fixed metric columns, in output order. pass^k columns follow.
pub const METRIC_COLUMNS: [&str; 8] = [
    "num_trials",
    "success_count",
    "avg_reward",
    "std_reward",
    "avg_agent_cost",
    "avg_user_cost",
    "avg_duration",
    "avg_num_messages",
];

/// One (file, domain, task) row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRow {
    pub domain: String,
    pub user_model: Option<String>,
    pub user_model_params: String,
    pub agent_model: Option<String>,
    pub agent_model_params: String,
    pub task: String,
    pub metrics: TaskMetrics,
}

impl MetricsRow {
    fn cells(&self, pass_ks: &[u32], float: fn(f64) -> String) -> Vec<String> {
        let m = &self.metrics;
        let opt = |v: Option<f64>| v.map(float).unwrap_or_default();
        let mut cells = vec![
            self.domain.clone(),
            self.user_model.clone().unwrap_or_default(),
            self.user_model_params.clone(),
            self.agent_model.clone().unwrap_or_default(),
            self.agent_model_params.clone(),
            self.task.clone(),
            m.num_trials.to_string(),
            m.success_count.to_string(),
            float(m.avg_reward),
            float(m.std_reward),
            opt(m.avg_agent_cost),
            opt(m.avg_user_cost),
            float(m.avg_duration),
            float(m.avg_num_messages),
        ];
        cells.extend(pass_ks.iter().map(|k| opt(m.pass_hat_k.get(k).copied())));
        cells
    }
}

/// Overview printed above the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub configurations: usize,
    /// Distinct domains in order of first row.
    pub domains: Vec<String>,
    pub tasks: usize,
    pub user_models: usize,
    pub agent_models: usize,
    pub avg_reward: f64,
    pub pass_hat_1: Option<f64>,
    pub avg_agent_cost: Option<f64>,
}

fn distinct<T: Eq + std::hash::Hash>(values: impl Iterator<Item = T>) -> usize {
    values.collect::<HashSet<_>>().len()
}

fn mean_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsTable {
    pub rows: Vec<MetricsRow>,
}

impl MetricsTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// pass^k values of `k` present in any row, ascending.
    fn pass_ks(&self) -> Vec<u32> {
        let ks: BTreeSet<u32> = self
            .rows
            .iter()
            .flat_map(|r| r.metrics.pass_hat_k.keys().copied())
            .collect();
        ks.into_iter().collect()
    }

    /// Identity columns, metric columns, then `pass^k` columns.
    pub fn columns(&self) -> Vec<String> {
        IDENTITY_COLUMNS
            .iter()
            .chain(METRIC_COLUMNS.iter())
            .map(|c| c.to_string())
            .chain(self.pass_ks().into_iter().map(|k| format!("pass^{k}")))
            .collect()
    }

    /// Whitespace-aligned text table.
    pub fn render_text(&self) -> String {
        let ks = self.pass_ks();
        let header = self.columns();
        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| r.cells(&ks, |v| format!("{v:.4}")))
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
        for row in &body {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, &w)| format!("{c:<w$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = String::new();
        out.push_str(&line(&header));
        out.push('\n');
        for row in &body {
            out.push_str(&line(row));
            out.push('\n');
        }
        out
    }

    /// RFC 4180 CSV with a header row.
    pub fn to_csv(&self) -> String {
        let ks = self.pass_ks();
        let mut out = String::new();
        push_csv_record(&mut out, &self.columns());
        for row in &self.rows {
            push_csv_record(&mut out, &row.cells(&ks, |v| v.to_string()));
        }
        out
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_csv()).with_context(|| format!("write {:?}", path))?;
        Ok(())
    }

    /// `None` when the table has no rows.
    pub fn summary(&self) -> Option<MetricsSummary> {
        if self.rows.is_empty() {
            return None;
        }
        let mut seen = HashSet::new();
        let domains = self
            .rows
            .iter()
            .filter(|r| seen.insert(r.domain.as_str()))
            .map(|r| r.domain.clone())
            .collect();
        Some(MetricsSummary {
            configurations: self.rows.len(),
            domains,
            tasks: distinct(self.rows.iter().map(|r| r.task.as_str())),
            user_models: distinct(self.rows.iter().map(|r| r.user_model.as_deref())),
            agent_models: distinct(self.rows.iter().map(|r| r.agent_model.as_deref())),
            avg_reward: mean_of(self.rows.iter().map(|r| r.metrics.avg_reward)).unwrap_or(0.0),
            pass_hat_1: mean_of(
                self.rows
                    .iter()
                    .filter_map(|r| r.metrics.pass_hat_k.get(&1).copied()),
            ),
            avg_agent_cost: mean_of(self.rows.iter().filter_map(|r| r.metrics.avg_agent_cost)),
        })
    }

    /// Summary block, or a "no data" line for an empty table.
    pub fn render_summary(&self) -> String {
        let Some(s) = self.summary() else {
            return "No data found in simulation files.\n".to_string();
        };
        let rule = "=".repeat(80);
        let mut out = String::new();
        out.push_str(&format!("{rule}\nSUMMARY STATISTICS\n{rule}\n\n"));
        out.push_str(&format!("Total unique configurations: {}\n", s.configurations));
        out.push_str(&format!(
            "Domains: {} ({})\n",
            s.domains.len(),
            s.domains.join(", ")
        ));
        out.push_str(&format!("Tasks: {}\n", s.tasks));
        out.push_str(&format!("User models: {}\n", s.user_models));
        out.push_str(&format!("Agent models: {}\n", s.agent_models));
        out.push_str(&format!("\nOverall average reward: {:.4}\n", s.avg_reward));
        if let Some(p) = s.pass_hat_1 {
            out.push_str(&format!("Overall pass^1: {p:.4}\n"));
        }
        if let Some(c) = s.avg_agent_cost {
            out.push_str(&format!("Overall average agent cost: {c:.4}\n"));
        }
        out
    }
}

fn push_csv_record(out: &mut String, cells: &[String]) {
    let fields: Vec<String> = cells
        .iter()
        .map(|c| {
            if c.contains([',', '"', '\n', '\r']) {
                format!("\"{}\"", c.replace('"', "\"\""))
            } else {
                c.clone()
            }
        })
        .collect();
    out.push_str(&fields.join(","));
    out.push_str("\r\n");
}

/// One row per (file, domain, task), tasks in order of first simulation.
pub fn generate_metrics_table<P: AsRef<Path>>(
    paths: &[P],
    config: &AggregationConfig,
) -> AggregationResult<MetricsTable> {
    let mut rows = Vec::new();
    for path in paths {
        for (domain, results) in load_simulation_file(path.as_ref())? {
            let user = &results.info.user_info;
            let agent = &results.info.agent_info;
            for task_id in results.simulated_task_ids() {
                let Some(metrics) = compute_task_metrics(&results, task_id, config) else {
                    continue;
                };
                rows.push(MetricsRow {
                    domain: domain.clone(),
                    user_model: user.llm.clone(),
                    user_model_params: user.params_json(),
                    agent_model: agent.llm.clone(),
                    agent_model_params: agent.params_json(),
                    task: task_id.to_string(),
                    metrics,
                });
            }
        }
    }
    Ok(MetricsTable { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn row(domain: &str, task: &str, pass: &[(u32, f64)], cost: Option<f64>) -> MetricsRow {
        MetricsRow {
            domain: domain.into(),
            user_model: Some("user-llm".into()),
            user_model_params: "{}".into(),
            agent_model: Some("agent-llm".into()),
            agent_model_params: r#"{"temperature":0.5}"#.into(),
            task: task.into(),
            metrics: TaskMetrics {
                num_trials: pass.len() as u64,
                success_count: 1,
                avg_reward: 0.5,
                std_reward: 0.5,
                avg_agent_cost: cost,
                avg_user_cost: None,
                avg_duration: 1.0,
                avg_num_messages: 4.0,
                pass_hat_k: pass.iter().copied().collect::<BTreeMap<_, _>>(),
            },
        }
    }

    #[test]
    fn test_columns_order() {
        let table = MetricsTable {
            rows: vec![
                row("collab", "t1", &[(1, 0.5)], None),
                row("collab", "t2", &[(1, 0.5), (2, 0.0)], None),
            ],
        };
        let cols = table.columns();
        assert_eq!(&cols[..6], &IDENTITY_COLUMNS.map(String::from)[..]);
        assert_eq!(cols[6], "num_trials");
        assert_eq!(&cols[cols.len() - 2..], &["pass^1".to_string(), "pass^2".to_string()]);
    }

    #[test]
    fn test_csv_quotes_json_params() {
        let table = MetricsTable {
            rows: vec![row("collab", "t1", &[(1, 0.5)], None)],
        };
        let csv = table.to_csv();
        let mut lines = csv.split("\r\n");
        assert!(lines.next().unwrap().starts_with("domain,user_model,"));
        let record = lines.next().unwrap();
        assert!(record.contains(r#""{""temperature"":0.5}""#));
        assert!(record.ends_with(",0.5"));
    }

    #[test]
    fn test_missing_pass_k_renders_empty_cell() {
        let table = MetricsTable {
            rows: vec![
                row("collab", "t1", &[(1, 1.0)], None),
                row("collab", "t2", &[(1, 0.5), (2, 0.0)], None),
            ],
        };
        let csv = table.to_csv();
        let first = csv.split("\r\n").nth(1).unwrap();
        assert!(first.ends_with(",1,"));
    }

    #[test]
    fn test_summary_of_empty_table_is_none() {
        let table = MetricsTable::default();
        assert!(table.summary().is_none());
        assert!(table.render_summary().contains("No data"));
    }

    #[test]
    fn test_summary_aggregates_rows() {
        let table = MetricsTable {
            rows: vec![
                row("collab", "t1", &[(1, 1.0)], Some(0.2)),
                row("infra_loadshed", "t2", &[(1, 0.0)], None),
                row("collab", "t3", &[(1, 0.5)], Some(0.4)),
            ],
        };
        let s = table.summary().unwrap();
        assert_eq!(s.configurations, 3);
        assert_eq!(s.domains, vec!["collab", "infra_loadshed"]);
        assert_eq!(s.tasks, 3);
        assert_eq!(s.agent_models, 1);
        assert!((s.pass_hat_1.unwrap() - 0.5).abs() < 1e-12);
        assert!((s.avg_agent_cost.unwrap() - 0.3).abs() < 1e-12);
        assert!(table.render_summary().contains("Domains: 2 (collab, infra_loadshed)"));
    }

    #[test]
    fn test_text_table_aligns_columns() {
        let table = MetricsTable {
            rows: vec![row("collab", "t1", &[(1, 1.0)], None)],
        };
        let text = table.render_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let task_col = lines[0].find("task").unwrap();
        assert_eq!(&lines[1][task_col..task_col + 2], "t1");
    }
}
