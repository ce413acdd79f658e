//! Geo Router command-line entry point
//!
//! Loads settings and a domain from `config/`, then routes queries given as
//! arguments or read line by line from stdin.

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use geo_router_config::{
    load_settings_from, DomainConfiguration, DomainDocument, DomainValidator, RouterSettings,
};
use geo_router_core::{DatasetContext, FeedbackRecord, PlainTextRenderer, ResponseRenderer};
use geo_router_engine::HybridRoutingEngine;

#[derive(Parser)]
#[command(name = "geo-router")]
#[command(author, version, about = "Route analytics questions to analysis endpoints", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding default.toml and {env}.toml
    #[arg(long, global = true, default_value = "config")]
    config_dir: PathBuf,

    /// Settings overlay to load (e.g. staging, production)
    #[arg(long, global = true)]
    env: Option<String>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Route queries (arguments, or one per stdin line)
    Route {
        queries: Vec<String>,
        /// Domain id under the domain config directory
        #[arg(short, long)]
        domain: Option<String>,
        /// Dataset metadata snapshot (JSON)
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Feedback records (JSON array) applied before routing
        #[arg(long)]
        feedback: Option<PathBuf>,
        /// Split compound queries and route each part
        #[arg(long)]
        compound: bool,
    },

    /// Load and validate a domain, printing lints
    CheckDomain {
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// Print the effective settings as TOML
    Settings,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match load_settings_from(&cli.config_dir, cli.env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing is not initialized yet
            eprintln!("Warning: failed to load settings: {}. Using defaults.", e);
            RouterSettings::default()
        }
    };
    init_tracing(&settings);

    tracing::debug!(
        environment = ?settings.environment,
        config_dir = %cli.config_dir.display(),
        "Settings loaded"
    );

    match cli.command {
        Commands::Route {
            queries,
            domain,
            dataset,
            feedback,
            compound,
        } => {
            let config = load_domain(&settings, domain.as_deref())?;
            let engine = HybridRoutingEngine::new(config, &settings)?;

            if let Some(path) = feedback {
                let records = load_feedback(&path)?;
                let update = engine.learn(&records);
                tracing::info!(
                    records = records.len(),
                    direction = ?update.direction,
                    high = update.current.high,
                    medium = update.current.medium,
                    "Applied feedback"
                );
            }

            let dataset = match dataset {
                Some(path) => load_dataset(&path)?,
                None => DatasetContext::new(),
            };
            let dataset = engine.bind_dataset(dataset);

            let queries = if queries.is_empty() {
                read_queries(io::stdin().lock())?
            } else {
                queries
            };

            for query in &queries {
                let results = if compound {
                    engine.route_compound(query, &dataset)?
                } else {
                    vec![engine.route(query, &dataset)?]
                };
                for result in &results {
                    match cli.format {
                        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
                        OutputFormat::Text => println!("{}", PlainTextRenderer.render(result)),
                    }
                }
            }
        }

        Commands::CheckDomain { domain } => {
            let config = load_domain(&settings, domain.as_deref())?;
            println!(
                "{} v{}: {} endpoint(s), {} vocabulary term(s)",
                config.name,
                config.version,
                config.endpoint_mappings.len(),
                config.vocabulary.term_count()
            );
            for lint in &config.lints {
                println!("  warning: {}", lint);
            }
        }

        Commands::Settings => {
            print!("{}", settings.to_toml()?);
        }
    }

    Ok(())
}

fn init_tracing(settings: &RouterSettings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &settings.logging.level;
        format!("geo_router={},warn", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let json = settings.logging.json || settings.environment.is_production();
    let fmt_layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_writer(io::stderr).boxed()
    };
    subscriber.with(fmt_layer).init();
}

/// Load `domains/{id}/domain.yaml` layered over `base/defaults.yaml`
fn load_domain(settings: &RouterSettings, domain: Option<&str>) -> Result<DomainConfiguration> {
    let domain_id = domain.unwrap_or(&settings.domain.default_domain);
    if domain_id.trim().is_empty() {
        bail!("No domain given and domain.default_domain is empty");
    }

    let document = DomainDocument::load_domain(domain_id, &settings.domain.config_dir)
        .with_context(|| {
            format!(
                "Failed to load domain '{}' from {}",
                domain_id,
                settings.domain.config_dir.display()
            )
        })?;
    let config = DomainValidator::new()
        .with_max_synonym_cycle(settings.domain.max_synonym_cycle)
        .build(document)
        .with_context(|| format!("Domain '{}' is invalid", domain_id))?;

    tracing::info!(
        domain = %config.name,
        version = %config.version,
        endpoints = config.endpoint_mappings.len(),
        lints = config.lints.len(),
        "Loaded domain"
    );
    Ok(config)
}

fn load_dataset(path: &Path) -> Result<DatasetContext> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset {}", path.display()))?;
    let dataset: DatasetContext = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse dataset {}", path.display()))?;
    tracing::debug!(fields = dataset.field_count(), "Loaded dataset snapshot");
    Ok(dataset)
}

fn load_feedback(path: &Path) -> Result<Vec<FeedbackRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read feedback {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse feedback {}", path.display()))
}

/// Non-blank lines, trimmed
fn read_queries(reader: impl BufRead) -> Result<Vec<String>> {
    let mut queries = Vec::new();
    for line in reader.lines() {
        let line = line.context("Failed to read stdin")?;
        let line = line.trim();
        if !line.is_empty() {
            queries.push(line.to_string());
        }
    }
    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_queries_skips_blank_lines() {
        let input = "Analyze the market\n\n   \n  rank stores by sales  \n";
        let queries = read_queries(input.as_bytes()).unwrap();
        assert_eq!(queries, vec!["Analyze the market", "rank stores by sales"]);
    }

    #[test]
    fn test_load_dataset_and_feedback() {
        let dir = tempfile::tempdir().unwrap();
        let dataset_path = dir.path().join("dataset.json");
        std::fs::write(
            &dataset_path,
            r#"{
                "available_fields": {"competition": ["market_share"]},
                "field_characteristics": {
                    "market_share": {"coverage": 0.9, "variance": 0.3, "uniqueness": 0.8, "relevance_score": 0.7}
                }
            }"#,
        )
        .unwrap();
        let dataset = load_dataset(&dataset_path).unwrap();
        assert_eq!(dataset.field_count(), 1);

        let feedback_path = dir.path().join("feedback.json");
        std::fs::write(
            &feedback_path,
            r#"[{"query": "rank stores", "chosen_endpoint": "/performance-ranking", "was_correct": true}]"#,
        )
        .unwrap();
        let records = load_feedback(&feedback_path).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].was_correct);
    }

    #[test]
    fn test_load_domain_from_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let domain_dir = dir.path().join("domains/retail");
        std::fs::create_dir_all(&domain_dir).unwrap();
        std::fs::write(
            domain_dir.join("domain.yaml"),
            "endpoint_mappings:\n  /market-overview:\n    primary_intents: [comprehensive_overview]\n",
        )
        .unwrap();

        let mut settings = RouterSettings::default();
        settings.domain.config_dir = dir.path().to_path_buf();
        let config = load_domain(&settings, None).unwrap();
        // name falls back to the directory id
        assert_eq!(config.name, "retail");

        assert!(load_domain(&settings, Some("missing")).is_err());
    }
}
