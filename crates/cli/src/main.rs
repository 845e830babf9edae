//! `testgen` - generate XML test data from XSD schemas and submit the
//! extracted field observations to the Ceremony Field Catalog.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use url::Url;

use ceremony_testgen::meta::generate_meta_template;
use ceremony_testgen::runner::{RunnerOptions, TestLaneRunner};
use ceremony_testgen::xsd::{extract_field_paths, parse_xsd};

#[derive(Parser)]
#[command(name = "testgen")]
#[command(about = "Generate test XML data from XSD schemas for the Ceremony Field Catalog", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a meta.yaml file from an XSD schema
    #[command(name = "init-meta")]
    InitMeta {
        /// Path to the XSD schema file
        #[arg(long)]
        xsd: PathBuf,

        /// Output path (default: alongside the XSD, with a .meta.yaml extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Context ID to pre-populate in the template
        #[arg(short, long)]
        context: Option<String>,

        /// Overwrite an existing meta file
        #[arg(short, long)]
        force: bool,
    },

    /// Generate XML test data and submit to the API
    Run {
        /// Directory containing test lanes (XSD + meta.yaml pairs)
        lanes_dir: PathBuf,

        /// Number of XMLs to generate per lane
        #[arg(short = 'n', long = "count", default_value_t = 10)]
        count: usize,

        /// Specific lane(s) to run (repeatable); all lanes when omitted
        #[arg(short = 'l', long = "lane")]
        lanes: Vec<String>,

        /// Override optional field fill rate (0.0-1.0)
        #[arg(long)]
        fill_rate: Option<f64>,

        /// Generate XMLs but don't submit to the API
        #[arg(long)]
        dry_run: bool,

        /// Directory to save generated XMLs
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// API base URL
        #[arg(long, env = "CATALOG_API_URL", default_value = "http://localhost:8080")]
        api_url: String,

        /// Random seed for reproducible generation
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::InitMeta {
            xsd,
            output,
            context,
            force,
        } => cmd_init_meta(xsd, output, context.as_deref(), force),
        Commands::Run {
            lanes_dir,
            count,
            lanes,
            fill_rate,
            dry_run,
            output_dir,
            api_url,
            seed,
        } => {
            cmd_run(
                lanes_dir, count, lanes, fill_rate, dry_run, output_dir, api_url, seed,
            )
            .await
        }
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            error!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_init_meta(
    xsd: PathBuf,
    output: Option<PathBuf>,
    context: Option<&str>,
    force: bool,
) -> anyhow::Result<ExitCode> {
    if !xsd.exists() {
        eprintln!("Error: XSD file not found: {}", xsd.display());
        return Ok(ExitCode::FAILURE);
    }

    let output_path = output.unwrap_or_else(|| xsd.with_extension("meta.yaml"));
    if output_path.exists() && !force {
        eprintln!("Error: Output file already exists: {}", output_path.display());
        eprintln!("Use --force to overwrite");
        return Ok(ExitCode::FAILURE);
    }

    println!("Parsing XSD: {}", xsd.display());
    let schema = parse_xsd(&xsd).context("failed to parse XSD")?;
    let field_paths = extract_field_paths(&schema);
    println!("Found {} field paths", field_paths.len());

    let xsd_filename = xsd
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("schema.xsd");
    let template = generate_meta_template(&field_paths, xsd_filename, context);

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&output_path, template)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    println!("Generated: {}", output_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit the meta.yaml to set contextId and metadata");
    println!("  2. Set semantic types for fields needing realistic data");
    println!("  3. Adjust field overrides as needed");
    Ok(ExitCode::SUCCESS)
}

#[allow(clippy::too_many_arguments)]
async fn cmd_run(
    lanes_dir: PathBuf,
    count: usize,
    lanes: Vec<String>,
    fill_rate: Option<f64>,
    dry_run: bool,
    output_dir: Option<PathBuf>,
    api_url: String,
    seed: Option<u64>,
) -> anyhow::Result<ExitCode> {
    if !lanes_dir.exists() {
        eprintln!("Error: Lanes directory not found: {}", lanes_dir.display());
        return Ok(ExitCode::FAILURE);
    }
    if !lanes_dir.is_dir() {
        eprintln!("Error: Not a directory: {}", lanes_dir.display());
        return Ok(ExitCode::FAILURE);
    }
    Url::parse(&api_url).with_context(|| format!("invalid API URL: {api_url}"))?;

    let options = RunnerOptions {
        api_url,
        count,
        dry_run,
        output_dir,
        fill_rate_override: fill_rate,
        seed,
        progress: true,
    };
    let mut runner = TestLaneRunner::new(lanes_dir, options);

    let result = if lanes.is_empty() {
        runner.run_all_lanes().await?
    } else {
        runner.run_selected_lanes(&lanes).await?
    };

    Ok(if result.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
