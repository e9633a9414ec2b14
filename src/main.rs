use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use season_stats::apis::html_table::HtmlTableSource;
use season_stats::config::Config;
use season_stats::constants::DEFAULT_CONFIG;
use season_stats::logging;
use season_stats::pipeline::{Pipeline, PipelineReport};
use season_stats::storage::CsvSink;
use season_stats::types::TableSource;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "season_stats")]
#[command(about = "Merges league season stat tables into one canonical CSV")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every source, unify the tables and write the CSV
    Run {
        /// Config file; built-in sources are used if it doesn't exist
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        /// Override the output path
        #[arg(long)]
        output: Option<PathBuf>,
        /// Specific sources to run (comma-separated display names)
        #[arg(long)]
        sources: Option<String>,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List configured sources
    Sources {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
    /// Validate the config and print the rule sets
    Check {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::load(path).with_context(|| format!("loading {}", path.display()))
    } else {
        warn!(path = %path.display(), "config file not found; using built-in sources");
        Ok(Config::default())
    }
}

fn print_report(report: &PipelineReport) {
    println!("\n📊 Run results:");
    println!("   Rows: {}", report.total_rows);
    println!("   Columns: {}", report.columns.len());
    for s in &report.succeeded {
        println!("   ✅ {}: {} rows ({} header rows dropped)", s.source, s.rows, s.dropped_rows);
    }
    for f in &report.failed {
        println!("   ❌ {}: {}", f.source, f.reason);
    }
    if !report.warnings.is_empty() {
        println!("\n⚠️  Warnings:");
        for w in &report.warnings {
            println!("   - {}", w);
        }
    }
    println!("💾 Saved table to {}", report.output_file);
}

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = logging::init_logging("logs");
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output,
            sources,
            json,
        } => {
            let mut config = load_config(&config)?;
            if let Some(list) = sources {
                let names: Vec<String> = list.split(',').map(|s| s.trim().to_string()).collect();
                config.retain_sources(&names)?;
            }
            if let Some(output) = output {
                config.output = output;
            }

            let client = HtmlTableSource::client(&config.fetch)?;
            let table_sources: Vec<Arc<dyn TableSource>> = config
                .sources
                .iter()
                .map(|s| Arc::new(HtmlTableSource::new(s, client.clone())) as Arc<dyn TableSource>)
                .collect();
            let sink = CsvSink::new(config.output.clone());

            info!(sources = table_sources.len(), "running pipeline");
            let pipeline = Pipeline::new(config);
            match pipeline.run(table_sources, &sink).await {
                Ok(report) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    } else {
                        print_report(&report);
                    }
                }
                Err(e) => {
                    error!("pipeline failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Sources { config } => {
            let config = load_config(&config)?;
            for s in &config.sources {
                match (&s.source_id, s.inject_source_id) {
                    (Some(id), true) => println!("{}  {}  [{}]", s.name, s.url, id),
                    _ => println!("{}  {}", s.name, s.url),
                }
            }
        }
        Commands::Check { config } => {
            let config = load_config(&config)?;
            config.validate()?;
            let join = |labels: Vec<String>| labels.join(", ");
            println!("✅ {} sources configured", config.sources.len());
            println!("   identity column: {}", config.rules.identity_column);
            println!("   source id column: {}", config.rules.source_id_column);
            println!(
                "   ambiguous: {}",
                join(config.rules.ambiguous.iter().map(|l| l.to_string()).collect())
            );
            println!(
                "   always derived: {}",
                join(config.rules.always_derived.iter().map(|l| l.to_string()).collect())
            );
            println!("   rename policy: {:?}", config.rules.rename_policy);
            println!("   output: {}", config.output.display());
        }
    }
    Ok(())
}
