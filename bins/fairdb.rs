//! CFD discovery → rule parsing → fairness evaluation CLI
//!
//! Usage:
//!   fairdb discover --input outputs/cleaned_data_for_cfd.csv --output outputs/cfds.txt
//!   fairdb rules --input outputs/cfds.txt --output outputs/rules.json
//!   fairdb evaluate --data outputs/cleaned_data_for_cfd.csv --rules outputs/rules.json
//!   fairdb run-all --input outputs/cleaned_data_for_cfd.csv

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use fairdb::cfd::{filter_cfds, load_raw_cfds, load_rules_json, write_rules_json, CfdDiscovery, Rule};
use fairdb::config::Config;
use fairdb::data::read_table;
use fairdb::fairness::{evaluate, print_summary, write_scored_rules, FairnessReport};

#[derive(Parser)]
#[command(name = "fairdb")]
#[command(about = "CFD discovery and fairness evaluation pipeline")]
struct Cli {
    #[arg(long, global = true, default_value = "config/fairdb.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the external CFD miner on a CSV file
    Discover {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Filter and parse mined rule text into structured rules
    Rules {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Score rules for disparate treatment of protected groups
    Evaluate {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        rules: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Override fairness.min_diff
        #[arg(long)]
        min_diff: Option<f64>,
    },
    /// Run discover, rules and evaluate in sequence
    RunAll {
        #[arg(long)]
        input: PathBuf,
    },
}

fn artifact(config: &Config, name: &str) -> PathBuf {
    Path::new(&config.data_dir).join(name)
}

async fn run_discover_command(config: &Config, input: &Path, output: &Path) -> Result<()> {
    tracing::info!("Discovering CFDs in {:?}", input);

    let discovery = CfdDiscovery::new(config.cfd.clone());
    discovery
        .run(input, output)
        .await
        .context("CFD discovery failed")?;

    Ok(())
}

fn run_rules_command(config: &Config, input: &Path, output: &Path) -> Result<Vec<Rule>> {
    tracing::info!("Parsing mined rules from {:?}", input);

    let raw = load_raw_cfds(input)
        .with_context(|| format!("Failed to read mined rules from {:?}", input))?;
    let (rules, counts) = filter_cfds(&raw, &config.cfd)?;
    tracing::debug!("Stage counts: {:?}", counts);

    write_rules_json(output, &rules)?;
    Ok(rules)
}

fn run_evaluate_command(
    config: &Config,
    data: &Path,
    rules_path: &Path,
    output: &Path,
    min_diff: Option<f64>,
) -> Result<FairnessReport> {
    tracing::info!("Evaluating rules from {:?} against {:?}", rules_path, data);

    let rules = load_rules_json(rules_path)
        .with_context(|| format!("Rules file not readable: {:?}. Run 'rules' first.", rules_path))?;
    let df = read_table(data)?;

    let mut fairness = config.fairness.clone();
    if let Some(min_diff) = min_diff {
        fairness.min_diff = min_diff;
    }

    let report = evaluate(&rules, &df, &fairness)?;
    write_scored_rules(output, &report.selected, &fairness.protected_attributes)?;
    print_summary(&report.selected, &fairness.protected_attributes, 40);

    Ok(report)
}

async fn run_all_command(config: &Config, input: &Path) -> Result<()> {
    let started = Utc::now();
    tracing::info!("Running full pipeline for {:?}", input);

    let cfds_path = artifact(config, "cfds.txt");
    let rules_path = artifact(config, "rules.json");
    let scored_path = artifact(config, "fairness.csv");

    // 1. Discover
    run_discover_command(config, input, &cfds_path).await?;
    tracing::info!("Step 1/3: Mined rules written to {:?}", cfds_path);

    // 2. Parse
    let rules = run_rules_command(config, &cfds_path, &rules_path)?;
    tracing::info!("Step 2/3: Parsed {} rules", rules.len());

    // 3. Evaluate
    let report = run_evaluate_command(config, input, &rules_path, &scored_path, None)?;
    tracing::info!("Step 3/3: {} rules above threshold", report.selected.len());

    println!("\n=== Pipeline Summary ===");
    println!("Input: {}", input.display());
    println!("Started: {}", started.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Rules parsed: {}", rules.len());
    println!("Rules scored: {}", report.scored);
    println!("Duplicates removed: {}", report.duplicates_removed);
    println!("Rules above min_diff ({}): {}", config.fairness.min_diff, report.selected.len());
    println!("Scored table: {}", scored_path.display());

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Discover { input, output } => {
            let output = output.unwrap_or_else(|| artifact(&config, "cfds.txt"));
            run_discover_command(&config, &input, &output).await?;
        }
        Commands::Rules { input, output } => {
            let input = input.unwrap_or_else(|| artifact(&config, "cfds.txt"));
            let output = output.unwrap_or_else(|| artifact(&config, "rules.json"));
            run_rules_command(&config, &input, &output)?;
        }
        Commands::Evaluate { data, rules, output, min_diff } => {
            let rules = rules.unwrap_or_else(|| artifact(&config, "rules.json"));
            let output = output.unwrap_or_else(|| artifact(&config, "fairness.csv"));
            run_evaluate_command(&config, &data, &rules, &output, min_diff)?;
        }
        Commands::RunAll { input } => {
            run_all_command(&config, &input).await?;
        }
    }

    Ok(())
}
