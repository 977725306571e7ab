//! MJVS command line: drives a majority judgment election contract through
//! a JSON-RPC ledger gateway.

mod chart;

use anyhow::Context;
use clap::Parser;
use mjvs_client::{Ledger, RpcClient};
use mjvs_orchestrator::{
    deploy_contract, CancellationSource, ClientConfig, DeploymentRecord, ElectionOrchestrator,
    IdentityPool, OrchestratorConfig, Timeouts,
};
use mjvs_types::{ElectionId, Grade};
use mjvs_utils::{format_duration, LogFormat};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "mjvs", about = "Majority judgment voting system orchestrator")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "MJVS_CONFIG")]
    config: Option<PathBuf>,

    /// JSON-RPC ledger gateway URL.
    #[arg(long, env = "MJVS_RPC_URL")]
    rpc_url: Option<String>,

    /// Deployment record holding the contract address.
    #[arg(long, env = "MJVS_DEPLOYMENT_FILE")]
    deployment_file: Option<PathBuf>,

    /// Event poll interval in milliseconds.
    #[arg(long, env = "MJVS_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// Deadline for creation and voting-state confirmation events, in seconds.
    #[arg(long, env = "MJVS_CREATION_TIMEOUT_SECS")]
    creation_timeout_secs: Option<u64>,

    /// Deadline for each decryption fulfilment event, in seconds.
    #[arg(long, env = "MJVS_DECRYPTION_TIMEOUT_SECS")]
    decryption_timeout_secs: Option<u64>,

    /// Deadline for the decryption oracle, in seconds.
    #[arg(long, env = "MJVS_ORACLE_TIMEOUT_SECS")]
    oracle_timeout_secs: Option<u64>,

    /// Log format: "human" or "json".
    #[arg(long, env = "MJVS_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "MJVS_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Deploy a fresh election contract and record its address.
    Deploy,

    /// Create an election owned by the first gateway account.
    CreateElection {
        /// Number of candidates (at least 1).
        #[arg(long)]
        candidates: u32,
        #[arg(long)]
        label: String,
    },

    /// Open or close voting on an election.
    SetVotingState {
        #[arg(long)]
        election: u64,
        #[arg(long, action = clap::ArgAction::Set)]
        open: bool,
    },

    /// Cast one random ballot as a gateway account.
    CastRandomBallot {
        #[arg(long)]
        election: u64,
        /// Index of the voting account in the gateway's account list.
        #[arg(long, default_value_t = 0)]
        voter: usize,
        /// Seed for the grade generator; random when omitted.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Request decryption of every candidate, one at a time.
    DecryptElection {
        #[arg(long)]
        election: u64,
    },

    /// Print decrypted results, optionally rendering an SVG chart.
    GetResults {
        #[arg(long)]
        election: u64,
        #[arg(long)]
        chart: Option<PathBuf>,
    },
}

impl Cli {
    fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_toml_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => ClientConfig::default(),
        };
        if let Some(url) = &self.rpc_url {
            config.rpc_url = url.clone();
        }
        if let Some(path) = &self.deployment_file {
            config.deployment_file = path.clone();
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval_ms = ms;
        }
        if let Some(secs) = self.creation_timeout_secs {
            config.creation_timeout_secs = secs;
        }
        if let Some(secs) = self.decryption_timeout_secs {
            config.decryption_timeout_secs = secs;
        }
        if let Some(secs) = self.oracle_timeout_secs {
            config.oracle_timeout_secs = secs;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.client_config()?;
    mjvs_utils::init_logging(config.log_format, &config.log_level);

    let timeouts = config.timeouts();
    let rpc = RpcClient::new(config.rpc_url.as_str())?.with_oracle_timeout(timeouts.oracle);

    let cancel_source = Arc::new(CancellationSource::new());
    let cancel = cancel_source.token();
    {
        let source = Arc::clone(&cancel_source);
        tokio::spawn(async move { source.wait_for_signal().await });
    }

    match cli.command {
        Command::Deploy => {
            let signer = first_account(&rpc).await?;
            let contract = deploy_contract(&rpc, &signer).await?;
            DeploymentRecord::new(contract).save(&config.deployment_file)?;
            println!("Contract deployed at {contract}");
        }
        Command::CreateElection { candidates, label } => {
            let election = connect(&rpc, &config, timeouts)
                .await?
                .create_election(candidates, &label, &cancel)
                .await?;
            println!(
                "Election created: id {}, label {:?}, {} candidates",
                election.id, election.label, election.candidate_number
            );
        }
        Command::SetVotingState { election, open } => {
            let receipt = connect(&rpc, &config, timeouts)
                .await?
                .set_voting_state(ElectionId(election), open, &cancel)
                .await?;
            println!(
                "Voting on election {election} is now {} (tx {})",
                if open { "open" } else { "closed" },
                receipt.tx_hash
            );
        }
        Command::CastRandomBallot {
            election,
            voter,
            seed,
        } => {
            let seed = seed.unwrap_or_else(rand::random);
            tracing::info!(seed, "grade generator seeded");
            let cast = connect(&rpc, &config, timeouts)
                .await?
                .with_grade_seed(seed)
                .cast_random_ballot(ElectionId(election), voter)
                .await?;
            for (candidate, value) in cast.grades.iter().enumerate() {
                let label = Grade::from_bitmask(*value).map(Grade::label).unwrap_or("?");
                println!("Candidate {candidate} grade: {label}");
            }
            println!("Ballot from {} accepted (tx {})", cast.voter, cast.receipt.tx_hash);
        }
        Command::DecryptElection { election } => {
            let started = Instant::now();
            let requests = connect(&rpc, &config, timeouts)
                .await?
                .decrypt_election(ElectionId(election), &cancel)
                .await?;
            for request in &requests {
                println!(
                    "Decryption fulfilled for candidate {} on election {}",
                    request.candidate, request.election
                );
            }
            println!("Done in {}", format_duration(started.elapsed()));
        }
        Command::GetResults { election, chart } => {
            let results = connect(&rpc, &config, timeouts)
                .await?
                .get_results(ElectionId(election))
                .await?;
            for (i, (result, median)) in results.results.iter().zip(results.medians()).enumerate() {
                println!("Results for candidate {} ({} votes):", i + 1, result.licit_total());
                for grade in Grade::ALL {
                    println!("\t{:<10} {}", grade.label(), result.count(grade));
                }
                match median {
                    Some(grade) => println!("\tmedian     {}", grade.label()),
                    None => println!("\tmedian     -"),
                }
            }
            if results.report.unaccounted_ballots > 0 {
                println!(
                    "{} of {} ballots carried no licit grade",
                    results.report.unaccounted_ballots, results.report.total_vote_count
                );
            }
            if let Some(path) = chart {
                chart::write(&path, &results.counts(), results.report.total_licit_votes)
                    .with_context(|| format!("writing chart to {}", path.display()))?;
                println!("Chart saved as {}", path.display());
            }
        }
    }

    Ok(())
}

type Orchestrator<'a> =
    ElectionOrchestrator<&'a RpcClient, &'a RpcClient, &'a RpcClient, &'a RpcClient>;

/// Build an orchestrator for the recorded deployment. A missing record
/// fails before the gateway is contacted.
async fn connect<'a>(
    rpc: &'a RpcClient,
    config: &ClientConfig,
    timeouts: Timeouts,
) -> anyhow::Result<Orchestrator<'a>> {
    let record = DeploymentRecord::load(&config.deployment_file)?;
    let accounts = rpc.accounts().await?;
    let signer = *accounts
        .first()
        .context("ledger gateway reported no accounts")?;
    tracing::info!(
        contract = %record.contract_address,
        %signer,
        gateway = rpc.gateway_url(),
        "using deployment"
    );
    let orch_config = OrchestratorConfig::new(record.contract_address, signer).with_timeouts(timeouts);
    Ok(ElectionOrchestrator::new(orch_config, rpc, rpc, rpc, rpc).with_identities(IdentityPool::new(accounts)))
}

async fn first_account(rpc: &RpcClient) -> anyhow::Result<mjvs_types::Address> {
    rpc.accounts()
        .await?
        .first()
        .copied()
        .context("ledger gateway reported no accounts")
}
