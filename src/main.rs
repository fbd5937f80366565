use anyhow::Result;
use clap::{Parser, Subcommand};
use proxy_sift::{
    config::{self, PipelineConfig, ValidatorConfig},
    logging,
    proxy::{normalizer, store, ProxyValidator},
};
use std::path::PathBuf;
use tracing::info;

/// Normalizes scraped proxy listings and keeps the reachable proxies
#[derive(Parser)]
#[command(name = "proxy-sift")]
#[command(about = "Normalizes scraped proxy listings and keeps the reachable proxies")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe every endpoint in a file and save the reachable ones
    Check {
        /// File with one scheme://host:port endpoint per line
        #[arg(short, long)]
        file: PathBuf,
        /// URL to fetch through each proxy
        #[arg(short, long)]
        url: String,
        /// Timeout in seconds for each probe
        #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
        timeout: f64,
        /// Number of concurrent workers
        #[arg(short = 'n', long, default_value_t = config::DEFAULT_WORKER_COUNT)]
        threads: usize,
        /// Output file for reachable proxies
        #[arg(short, long, default_value = config::DEFAULT_OUTPUT_FILE)]
        output: PathBuf,
        /// Optional output file for unreachable proxies
        #[arg(short, long)]
        bad_output: Option<PathBuf>,
    },
    /// Merge the scraped listing files into one endpoint list
    Normalize {
        /// Directory holding the raw listing files
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,
        /// Output file for the merged list
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Normalize the listings, then check the merged list
    Run {
        /// Directory holding the raw listing files
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,
        /// Directory the merged list is written to
        #[arg(short, long, default_value = "./storage")]
        storage_dir: PathBuf,
        /// Output file for reachable proxies
        #[arg(short, long, default_value = config::DEFAULT_OUTPUT_FILE)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Check {
            file,
            url,
            timeout,
            threads,
            output,
            bad_output,
        } => {
            let config = ValidatorConfig::new()
                .with_reference_url(url)
                .with_timeout(config::timeout_from_secs(timeout)?)
                .with_worker_count(threads);

            let validator = ProxyValidator::new(config)?;
            let report = validator.run(&file, &output).await?;

            if let Some(bad_path) = bad_output {
                store::save_results(&report.bad, &bad_path)?;
                info!(path = ?bad_path, count = report.bad.len(), "saved unreachable endpoints");
            }

            println!("Runtime: {:.2}s", report.elapsed.as_secs_f64());
        }
        Commands::Normalize { data_dir, output } => {
            let config = PipelineConfig::new().with_data_dir(data_dir);
            let endpoints = normalizer::normalize_sources(&config)?;
            store::save_endpoints(&endpoints, &output)?;
            println!("Saved {} endpoints to {:?}", endpoints.len(), output);
        }
        Commands::Run {
            data_dir,
            storage_dir,
            output,
        } => {
            let config = PipelineConfig::new()
                .with_data_dir(data_dir)
                .with_storage_dir(storage_dir)
                .with_output_file(output);

            let endpoints = normalizer::normalize_into_storage(&config)?;
            println!("Total proxy count to validate: {}", endpoints.len());

            let validator = ProxyValidator::new(config.validator.clone())?;
            let report = validator
                .run(&config.merged_path(), &config.output_file)
                .await?;

            println!("Runtime: {:.2}s", report.elapsed.as_secs_f64());
            println!("See {} for the checked proxy list", config.output_file.display());
        }
    }

    Ok(())
}
