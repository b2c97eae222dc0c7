//! RepoProfiles - Organization profile aggregation gateway
//!
//! Main entry point for the RepoProfiles CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use repoprofiles::aggregator::Aggregator;
use repoprofiles::config::{validate_config_result, GatewayConfig};
use repoprofiles::profile::{Normalize, SourceKind};
use repoprofiles::server::ProfileServer;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process;

/// RepoProfiles - GitHub and Bitbucket organization profiles, merged
#[derive(Parser, Debug)]
#[command(name = "repoprofiles")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/repoprofiles/config.yaml)
    #[arg(short, long, env = "REPOPROFILES_CONFIG")]
    config: Option<PathBuf>,

    /// Per-request upstream timeout in seconds (overrides config)
    #[arg(short, long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file
    Init,

    /// Run the HTTP server
    Serve {
        /// Address to listen on (overrides config)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Fetch one source's profile and print it as JSON
    Profile {
        /// Source to query (github, bitbucket)
        source: SourceKind,

        /// Organization (GitHub) or workspace (Bitbucket)
        identifier: String,

        /// Print the full enriched record instead of the public profile
        #[arg(short, long)]
        extended: bool,
    },

    /// Fetch several sources and print the merged profile as JSON
    Merged {
        /// GitHub organization
        #[arg(long)]
        github: Option<String>,

        /// Bitbucket workspace
        #[arg(long)]
        bitbucket: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Server logs are operational output; one-shot commands stay quiet
    let default_directive = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    if let Err(e) = repoprofiles::logging::init(default_directive) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Init = cli.command {
        return handle_init_command(cli.config);
    }

    let mut config = match cli.config {
        Some(ref path) => GatewayConfig::load(path)?,
        None => GatewayConfig::load_or_default()?,
    };
    if let Some(timeout) = cli.timeout {
        config.request_timeout_secs = timeout;
    }

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            validate_config_result(&config)?;

            let aggregator = Aggregator::from_config(&config)?;
            ProfileServer::new(aggregator)
                .run(&config.server.bind)
                .await
                .with_context(|| format!("Server on {} failed", config.server.bind))?;
        }

        Commands::Profile {
            source,
            identifier,
            extended,
        } => {
            validate_config_result(&config)?;

            let aggregator = Aggregator::from_config(&config)?;
            let record = aggregator.fetch(source, &identifier).await?;
            let json = if extended {
                serde_json::to_string_pretty(&record)?
            } else {
                serde_json::to_string_pretty(&record.normalize())?
            };
            println!("{}", json);
        }

        Commands::Merged { github, bitbucket } => {
            validate_config_result(&config)?;

            let requests: BTreeMap<SourceKind, String> = [
                (SourceKind::GitHub, github),
                (SourceKind::Bitbucket, bitbucket),
            ]
            .into_iter()
            .filter_map(|(kind, identifier)| identifier.map(|id| (kind, id)))
            .collect();

            let aggregator = Aggregator::from_config(&config)?;
            let aggregation = aggregator.aggregate(&requests).await?;
            println!("{}", serde_json::to_string_pretty(&aggregation)?);
        }

        Commands::Init => unreachable!("Init is handled before loading configuration"),
    }

    Ok(())
}

fn handle_init_command(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config_file = config_path.unwrap_or_else(GatewayConfig::default_path);

    if config_file.exists() {
        println!("Configuration already exists at {}", config_file.display());
        return Ok(());
    }

    GatewayConfig::new()
        .save(&config_file)
        .with_context(|| format!("Failed to write {}", config_file.display()))?;

    println!("✓ Created configuration at {}", config_file.display());
    println!();
    println!("Next steps:");
    println!("  1. Optionally add API credentials under github.auth / bitbucket.auth");
    println!("  2. Start the server:");
    println!("     repoprofiles serve");
    println!("  3. Or query directly:");
    println!("     repoprofiles merged --github <org> --bitbucket <workspace>");

    Ok(())
}
