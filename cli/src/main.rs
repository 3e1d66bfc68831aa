//! endorse-cli: inspect configuration, preview endorser plans and run the
//! invocation pipeline against a simulated channel.

use anyhow::{bail, Context};
use clap::Parser;
use endorse_client::{ClientConfig, Gateway, NetworkClient};
use endorse_nullables::{NullConnector, NullIdentityProvider, Topology};
use endorse_selection::{EndorsementSelector, RequiredOrgs};
use endorse_utils::{format_duration, init_logging, LogFormat};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "endorse-cli", about = "Endorsement-aware transaction client")]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(long, env = "ENDORSE_CONFIG")]
    config: Option<PathBuf>,

    /// Semicolon-separated affiliations file
    /// (`name;msp_id;ca_name;ca_url;registrar;secret` per line).
    #[arg(long, env = "ENDORSE_AFFILIATIONS")]
    affiliations: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    /// Overrides the config file.
    #[arg(long, env = "ENDORSE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format: "human" or "json". Overrides the config file.
    #[arg(long, env = "ENDORSE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Configuration commands.
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Resolve endorsement plans over a topology file without sending anything.
    Plan {
        /// Topology TOML describing peers and layouts.
        #[arg(long)]
        topology: PathBuf,

        /// Required organization (repeatable). Policy default when omitted.
        #[arg(long = "require")]
        require: Vec<String>,

        /// Seed for reproducible plans.
        #[arg(long)]
        seed: Option<u64>,

        /// Number of plans to draw.
        #[arg(long, default_value_t = 1)]
        count: usize,
    },

    /// Run invocations end to end against a simulated channel.
    Simulate {
        /// Topology TOML describing peers, layouts, oracle and ordering service.
        #[arg(long)]
        topology: PathBuf,

        /// Invoking user.
        #[arg(long, default_value = "admin")]
        user: String,

        /// Affiliation of the invoking user, looked up in the configuration.
        #[arg(long)]
        affiliation: String,

        #[arg(long)]
        contract: String,

        #[arg(long)]
        function: String,

        /// Seed for reproducible endorser selection.
        #[arg(long)]
        seed: Option<u64>,

        /// Number of concurrent invocations.
        #[arg(long, default_value_t = 1)]
        count: usize,

        /// Contract arguments.
        args: Vec<String>,
    },
}

#[derive(clap::Subcommand)]
enum ConfigAction {
    /// Validate the configuration and print it with defaults filled in.
    Check,
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(path) = &cli.affiliations {
        config
            .load_affiliations_file(path)
            .with_context(|| format!("loading affiliations from {}", path.display()))?;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    config.validate()?;
    Ok(config)
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    init_logging(config.log_format, &config.log_level);

    match cli.command {
        Command::Config { action } => match action {
            ConfigAction::Check => {
                tracing::info!(
                    channel = %config.channel_name,
                    affiliations = config.affiliations.len(),
                    "configuration is valid"
                );
                print!("{}", config.to_toml_string()?);
            }
        },

        Command::Plan {
            topology,
            require,
            seed,
            count,
        } => {
            let topology = Topology::from_toml_file(&topology)?;
            let layouts = topology.layouts()?;
            let required = if require.is_empty() {
                None
            } else {
                Some(RequiredOrgs::new(require)?)
            };
            let selector = EndorsementSelector;
            let strategy = selector.strategy_for(required);
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            let mut plans = Vec::with_capacity(count);
            for _ in 0..count {
                plans.push(selector.select(strategy.as_ref(), &layouts, &mut rng)?);
            }
            print_json(&plans)?;
        }

        Command::Simulate {
            topology,
            user,
            affiliation,
            contract,
            function,
            seed,
            count,
            args,
        } => {
            if count == 0 {
                bail!("--count must be at least 1");
            }
            let topology = Topology::from_toml_file(&topology)?;
            if topology.channel != config.channel_name {
                tracing::info!(
                    configured = %config.channel_name,
                    simulated = %topology.channel,
                    "using the topology's channel"
                );
                config.channel_name = topology.channel.clone();
            }
            if seed.is_some() {
                config.selection_seed = seed;
            }

            let channel = Arc::new(topology.build_channel()?);
            let connector = Arc::new(NullConnector::new(channel));
            let client = NetworkClient::enroll(
                config,
                &NullIdentityProvider::new(),
                connector,
                &user,
                &affiliation,
            )
            .await?;
            let gateway = Gateway::new(Arc::new(client));

            let started = Instant::now();
            let handles: Vec<_> = (0..count)
                .map(|_| gateway.invoke(contract.as_str(), function.as_str(), args.clone()))
                .collect();

            let mut failures = 0;
            for handle in handles {
                let tx_id = handle.tx_id().clone();
                match handle.wait().await {
                    Ok(receipt) => print_json(&receipt)?,
                    Err(e) => {
                        failures += 1;
                        print_json(&serde_json::json!({
                            "tx_id": tx_id,
                            "outcome": e.outcome(),
                            "stage": e.stage().map(|s| s.as_str()),
                            "error": e.to_string(),
                        }))?;
                    }
                }
            }

            tracing::info!(
                invocations = count,
                failures,
                elapsed = %format_duration(started.elapsed()),
                "simulation finished"
            );
            print_json(&gateway.stats().snapshot())?;
            if failures == count {
                bail!("every invocation failed");
            }
        }
    }

    Ok(())
}
