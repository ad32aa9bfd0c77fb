//! Architecture Review
//!
//! Reads an Azure architecture graph, estimates its monthly cost and checks
//! it against the policy catalog. Reports are printed as JSON.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{Environment, FromEnv};
use domain_architecture::ArchitectureGraph;
use domain_compliance::{
    ComplianceEngine, DirectoryRuleSource, EnforcementTable, RuleCatalog, RuleOrigin, RuleSource,
};
use domain_pricing::{CostEstimator, MultiplierTable, PricingCatalog};
use eyre::{Result, WrapErr};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::info;

mod config;
mod pipeline;

use config::Config;
use pipeline::{ReviewPipeline, ReviewRequest, Stages};

#[derive(Parser)]
#[command(name = "architecture-review")]
#[command(about = "Estimate cost and check policy compliance for Azure architecture graphs")]
struct Cli {
    /// Print the Prometheus metrics exposition to stderr before exiting
    #[arg(long, global = true)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cost estimation and compliance evaluation together
    Review(AnalysisArgs),

    /// Run cost estimation only
    Estimate(AnalysisArgs),

    /// Run compliance evaluation only
    Evaluate(AnalysisArgs),

    /// List the effective rule catalog
    Rules {
        /// Directory of Azure Policy JSON definitions
        #[arg(short, long)]
        policies: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List priced resource types and their default SKUs
    Catalog {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct AnalysisArgs {
    /// Architecture graph JSON file, or `-` for stdin
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// development, staging or production
    #[arg(short, long)]
    environment: Option<String>,

    /// Azure region. Defaults to the graph's region, then REVIEW_REGION.
    #[arg(short, long)]
    region: Option<String>,

    /// Directory of Azure Policy JSON definitions
    #[arg(short, long)]
    policies: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report timestamp (RFC 3339). Defaults to now.
    #[arg(long)]
    generated_at: Option<String>,

    /// JSON multiplier table replacing the built-in one
    #[arg(long)]
    multipliers: Option<PathBuf>,

    /// JSON enforcement table replacing the built-in one
    #[arg(long)]
    enforcement: Option<PathBuf>,
}

/// One line of `rules` output
#[derive(Serialize)]
struct RuleListing<'a> {
    id: &'a str,
    name: &'a str,
    category: String,
    severity: String,
    scope: String,
    enabled: bool,
    auto_fixable: bool,
    origin: &'a RuleOrigin,
}

#[derive(Serialize)]
struct RuleCatalogListing<'a> {
    version: &'a str,
    rules: Vec<RuleListing<'a>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    // `--help` and usage errors must not depend on the environment.
    let cli = Cli::parse();

    let config = Config::from_env()?;
    init_tracing(config.log_format);

    // Initialize metrics
    observability::init_metrics();

    match cli.command {
        Commands::Review(args) => analyze(&config, args, Stages::Both).await?,
        Commands::Estimate(args) => analyze(&config, args, Stages::CostOnly).await?,
        Commands::Evaluate(args) => analyze(&config, args, Stages::ComplianceOnly).await?,

        Commands::Rules { policies, output } => {
            let catalog = load_rules(policies.as_deref().or(config.policies_dir.as_deref()));
            let listing = RuleCatalogListing {
                version: catalog.version(),
                rules: catalog
                    .rules()
                    .iter()
                    .map(|rule| RuleListing {
                        id: &rule.id,
                        name: &rule.name,
                        category: rule.category.to_string(),
                        severity: rule.severity.to_string(),
                        scope: rule.scope_label(),
                        enabled: rule.enabled,
                        auto_fixable: rule.auto_fixable(),
                        origin: &rule.origin,
                    })
                    .collect(),
            };
            write_json(&listing, output.as_deref()).await?;
        }

        Commands::Catalog { output } => {
            let catalog = PricingCatalog::builtin();
            let listing = serde_json::json!({
                "version": catalog.version(),
                "entries": catalog.entries().collect::<Vec<_>>(),
            });
            write_json(&listing, output.as_deref()).await?;
        }
    }

    if cli.print_metrics {
        eprintln!("{}", observability::render_metrics());
    }

    Ok(())
}

async fn analyze(config: &Config, args: AnalysisArgs, stages: Stages) -> Result<()> {
    let environment = match args.environment.as_deref() {
        Some(value) => value.parse::<Environment>()?,
        None => config.environment,
    };
    let generated_at = match args.generated_at.as_deref() {
        Some(value) => DateTime::parse_from_rfc3339(value)
            .wrap_err_with(|| format!("invalid --generated-at '{value}'"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let multipliers = match &args.multipliers {
        Some(path) => MultiplierTable::from_json(&read_file(path).await?)
            .wrap_err_with(|| format!("invalid multiplier table {}", path.display()))?,
        None => MultiplierTable::default(),
    };
    let enforcement = match &args.enforcement {
        Some(path) => EnforcementTable::from_json(&read_file(path).await?)
            .wrap_err_with(|| format!("invalid enforcement table {}", path.display()))?,
        None => EnforcementTable::default(),
    };

    let rules = if stages == Stages::CostOnly {
        RuleCatalog::builtin()
    } else {
        load_rules(args.policies.as_deref().or(config.policies_dir.as_deref()))
    };

    let pipeline = ReviewPipeline::new(
        Arc::new(CostEstimator::new(
            Arc::new(PricingCatalog::builtin()),
            Arc::new(multipliers),
        )),
        Arc::new(ComplianceEngine::new(Arc::new(rules), Arc::new(enforcement))),
    );

    let graph = read_graph(&args.input).await?;
    info!(
        resources = graph.resources.len(),
        relationships = graph.relationships.len(),
        %environment,
        "Starting review"
    );

    let request = ReviewRequest {
        environment,
        region: args.region,
        default_region: config.region.clone(),
        generated_at,
        stages,
    };
    let output = pipeline.run(&graph, &request).await?;

    match stages {
        Stages::Both => write_json(&output, args.output.as_deref()).await,
        Stages::CostOnly => write_json(&output.cost, args.output.as_deref()).await,
        Stages::ComplianceOnly => write_json(&output.compliance, args.output.as_deref()).await,
    }
}

/// Built-in rules plus any definitions found in `policies`.
fn load_rules(policies: Option<&Path>) -> RuleCatalog {
    let catalog = match policies {
        Some(dir) => {
            let source = DirectoryRuleSource::new(dir);
            let sources: [&dyn RuleSource; 1] = [&source];
            RuleCatalog::load(&sources)
        }
        None => RuleCatalog::builtin(),
    };

    let custom = catalog
        .rules()
        .iter()
        .filter(|rule| !matches!(rule.origin, RuleOrigin::Builtin))
        .count();
    observability::ComplianceMetrics::set_rules_loaded("builtin", catalog.len() - custom);
    observability::ComplianceMetrics::set_rules_loaded("custom", custom);
    info!(version = catalog.version(), rules = catalog.len(), "Rule catalog ready");

    catalog
}

async fn read_graph(input: &Path) -> Result<ArchitectureGraph> {
    let contents = if input.as_os_str() == "-" {
        let mut buffer = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buffer)
            .await
            .wrap_err("failed to read graph from stdin")?;
        buffer
    } else {
        read_file(input).await?
    };
    serde_json::from_str(&contents)
        .wrap_err_with(|| format!("input is not a valid architecture graph: {}", input.display()))
}

async fn read_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("failed to read {}", path.display()))
}

async fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            tokio::fs::write(path, json + "\n")
                .await
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_and_parsing_ignore_a_broken_environment() {
        temp_env::with_var("REVIEW_ENVIRONMENT", Some("qa"), || {
            assert!(Config::from_env().is_err());

            let help = Cli::try_parse_from(["architecture-review", "--help"])
                .err()
                .map(|err| err.kind());
            assert_eq!(help, Some(ErrorKind::DisplayHelp));

            let cli = Cli::try_parse_from(["architecture-review", "catalog"]).unwrap();
            assert!(matches!(cli.command, Commands::Catalog { output: None }));
        });
    }

    #[test]
    fn test_analysis_flags() {
        let cli = Cli::try_parse_from([
            "architecture-review",
            "review",
            "--input",
            "graph.json",
            "--environment",
            "staging",
            "--region",
            "westeurope",
            "--print-metrics",
        ])
        .unwrap();

        assert!(cli.print_metrics);
        let Commands::Review(args) = cli.command else {
            panic!("expected review");
        };
        assert_eq!(args.input, PathBuf::from("graph.json"));
        assert_eq!(args.environment.as_deref(), Some("staging"));
        assert_eq!(args.region.as_deref(), Some("westeurope"));
    }
}
