//! agentgauge CLI
//!
//! The `gauge` command inspects bundled domains, replays tasks as scripted
//! trials, and aggregates simulation result files into pass^k tables.
//!
//! ## Commands
//!
//! - `domains`: List registered domains
//! - `tools`: List a domain's tools with their capability tags
//! - `tasks`: Load and validate a domain's task set
//! - `replay`: Run a task's expected actions and write a results file
//! - `merge`: Merge result files into one multi-domain file
//! - `metrics`: Per-task metrics table, CSV export and summary

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use gauge_core::metrics::METRICS;
use gauge_core::telemetry::init_tracing;
use gauge_core::{
    build_results, generate_metrics_table, load_simulations_concurrent, run_trials,
    scripted_calls, AggregationConfig, CapabilityPolicy, HarnessConfig, MultiDomainResults,
};
use gauge_domains::{bundled_data_dir, load_tasks, lookup, DOMAINS};
use tracing::{debug, info, Level};

#[derive(Parser)]
#[command(name = "gauge")]
#[command(author = "agentgauge contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Evaluation harness for tool-using agents", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Root holding <domain>/{db.json, policy.md, tasks.json}
    #[arg(long, global = true, env = "GAUGE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered domains
    Domains,

    /// List a domain's tools and assertion predicates
    Tools {
        /// Domain name
        domain: String,

        /// Show only the tools a read-only agent would see
        #[arg(long)]
        read_only: bool,
    },

    /// Load, resolve and validate a domain's task set
    Tasks {
        /// Domain name
        domain: String,
    },

    /// Replay a task's expected actions as scripted trials
    Replay {
        /// Domain name
        domain: String,

        /// Task id
        #[arg(short, long)]
        task: String,

        /// Number of independent trials
        #[arg(short = 'n', long, default_value_t = 1)]
        trials: u32,

        /// Run without a simulated user
        #[arg(long)]
        solo: bool,

        /// Results file to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Merge simulation result files into one multi-domain file
    Merge {
        /// Result files, earlier files win on task id conflicts
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Merged file to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Per-task metrics across simulation result files
    Metrics {
        /// Result files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Also write the table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Skip the table
        #[arg(long)]
        no_table: bool,

        /// Skip the summary
        #[arg(long)]
        no_summary: bool,

        /// Minimum reward counted as success
        #[arg(long, env = "GAUGE_SUCCESS_THRESHOLD")]
        success_threshold: Option<f64>,

        /// Largest k reported for pass^k
        #[arg(long, env = "GAUGE_MAX_PASS_K")]
        max_pass_k: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = HarnessConfig::from_env();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json || config.log_json, level);

    let data_dir = resolve_data_dir(cli.data_dir, &config);

    let outcome = match cli.command {
        Commands::Domains => cmd_domains(),
        Commands::Tools { domain, read_only } => cmd_tools(&data_dir, &domain, read_only),
        Commands::Tasks { domain } => cmd_tasks(&data_dir, &domain),
        Commands::Replay {
            domain,
            task,
            trials,
            solo,
            output,
        } => cmd_replay(&data_dir, &domain, &task, trials, solo, &output).await,
        Commands::Merge { files, output } => cmd_merge(&files, &output).await,
        Commands::Metrics {
            files,
            csv,
            no_table,
            no_summary,
            success_threshold,
            max_pass_k,
        } => {
            let mut aggregation = config.aggregation();
            if let Some(threshold) = success_threshold {
                aggregation.success_threshold = threshold;
            }
            if let Some(k) = max_pass_k {
                aggregation.max_pass_k = k;
            }
            cmd_metrics(&files, &aggregation, csv.as_deref(), !no_table, !no_summary)
        }
    };

    METRICS.flush();
    outcome
}

/// Explicit flag, then the configured directory, then the data shipped with
/// the domains crate.
fn resolve_data_dir(flag: Option<PathBuf>, config: &HarnessConfig) -> PathBuf {
    if let Some(dir) = flag {
        return dir;
    }
    if config.data_dir.is_dir() {
        return config.data_dir.clone();
    }
    let bundled = bundled_data_dir();
    debug!(
        configured = %config.data_dir.display(),
        bundled = %bundled.display(),
        "configured data dir missing, using bundled data"
    );
    bundled
}

/// List registered domains
fn cmd_domains() -> Result<()> {
    for entry in DOMAINS {
        println!("{:<20} {}", entry.name, entry.summary);
    }
    Ok(())
}

/// List tools and predicates
fn cmd_tools(data_dir: &Path, domain: &str, read_only: bool) -> Result<()> {
    let mut factory = lookup(domain)?.environment_factory(data_dir)?;
    if read_only {
        factory = factory.with_capability_policy(CapabilityPolicy::read_only());
    }
    let env = factory.instantiate();

    println!("Tools ({}):", env.domain_name());
    for tool in env.tools() {
        let tag = tool.tool_type.to_string();
        println!("  [{:<5}] {:<32} {}", tag, tool.name, tool.description);
        for param in &tool.params {
            let marker = if param.required { "" } else { " (optional)" };
            println!("          {}{}: {}", param.name, marker, param.description);
        }
    }

    println!("Assertions:");
    for predicate in env.predicates() {
        println!("  {} ({:?})", predicate.name, predicate.arity);
    }
    Ok(())
}

/// Validate a task set
fn cmd_tasks(data_dir: &Path, domain: &str) -> Result<()> {
    let tasks = load_tasks(domain, data_dir)?;
    for task in tasks.tasks() {
        let purpose = task
            .description
            .as_ref()
            .and_then(|d| d.purpose.as_deref())
            .unwrap_or("");
        println!(
            "{:<32} assertions={:<2} actions={:<2} {}",
            task.id,
            task.env_assertions().len(),
            task.expected_actions().len(),
            purpose
        );
    }
    println!("{} task(s) valid", tasks.len());
    Ok(())
}

/// Replay a task as scripted trials
async fn cmd_replay(
    data_dir: &Path,
    domain: &str,
    task_id: &str,
    trials: u32,
    solo: bool,
    output: &Path,
) -> Result<()> {
    anyhow::ensure!(trials > 0, "--trials must be at least 1");

    let factory = lookup(domain)?
        .environment_factory(data_dir)?
        .with_solo_mode(solo)?;
    let tasks = load_tasks(domain, data_dir)?;
    let task = tasks
        .get(task_id)
        .with_context(|| format!("task {task_id} not found in {domain}"))?
        .clone();

    let script = scripted_calls(&task);
    let runs = run_trials(&factory, &task, &script, trials).await?;
    for run in &runs {
        println!(
            "trial {:>3}  reward {:.3}  {:.3}s",
            run.trial.unwrap_or_default(),
            run.reward(),
            run.duration
        );
    }

    let results = build_results(&factory, vec![task], runs, trials);
    results.save(output)?;
    info!(path = %output.display(), trials, "results written");
    println!("Wrote {}", output.display());
    Ok(())
}

/// Merge result files
async fn cmd_merge(files: &[PathBuf], output: &Path) -> Result<()> {
    let domains = load_simulations_concurrent(files)
        .await
        .context("failed to load simulation files")?;
    for (name, results) in &domains {
        println!(
            "{:<20} tasks={:<4} simulations={}",
            name,
            results.tasks.len(),
            results.simulations.len()
        );
    }
    let merged = MultiDomainResults {
        timestamp: Some(Utc::now().to_rfc3339()),
        domains,
    };
    merged.save(output)?;
    println!("Wrote {}", output.display());
    Ok(())
}

/// Metrics table and summary
fn cmd_metrics(
    files: &[PathBuf],
    config: &AggregationConfig,
    csv: Option<&Path>,
    show_table: bool,
    show_summary: bool,
) -> Result<()> {
    let table = generate_metrics_table(files, config)?;

    if show_table && !table.is_empty() {
        println!("{}", table.render_text());
        println!();
    }
    if let Some(path) = csv {
        table.write_csv(path)?;
        println!("CSV written to {}", path.display());
    }
    if show_summary {
        println!("{}", table.render_summary());
    }
    Ok(())
}
