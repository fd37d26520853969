use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tag_aggregator::{
    load_csv, AggregatorConfig, ConfidenceAggregator, FrequencyAggregator, RuleModel,
    TagAggregator, TagType,
};

#[derive(Parser, Debug)]
#[command(name = "tag-aggregator", version, about = "Filter noisy entity-tag observations")]
struct Cli {
    /// JSON file overriding the cutoff table, capacity cap, trash label or floor
    #[arg(long, global = true, env = "TAG_AGGREGATOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Keep tags observed often enough relative to their property type
    Frequency {
        /// CSV file with `property,value` rows
        input: PathBuf,
    },

    /// Keep tags a confidence model fully trusts
    Confidence {
        /// CSV file with `property,value` rows
        input: PathBuf,

        /// JSON rule file for the confidence model
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AggregatorConfig::from_file(path)?,
        None => AggregatorConfig::default(),
    };

    match cli.command {
        Command::Frequency { input } => {
            let mut aggregator = FrequencyAggregator::with_config(&config)?;
            run(&mut aggregator, &input)
        }
        Command::Confidence { input, rules } => {
            let model = match rules {
                Some(path) => RuleModel::from_file(path)?,
                None => RuleModel::new(),
            };
            info!(rules = model.rule_count(), "Confidence model loaded");
            let mut aggregator = ConfidenceAggregator::with_config(model, &config)?;
            run(&mut aggregator, &input)
        }
    }
}

fn run<A: TagAggregator<TagType>>(aggregator: &mut A, input: &Path) -> Result<()> {
    let observations = load_csv(input)?;
    info!(observations = observations.len(), input = ?input, "Loaded observations");

    for observation in &observations {
        aggregator.add_opt(&observation.prop, observation.value.as_deref());
    }
    info!(groups = aggregator.len(), "Aggregated observations");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for group in aggregator.drain()? {
        serde_json::to_writer(&mut out, &group)?;
        writeln!(out)?;
    }

    Ok(())
}
