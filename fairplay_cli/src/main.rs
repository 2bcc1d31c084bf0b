use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use rand::RngCore;
use serde_json::json;
use tracing::{info, warn};

use fairplay_core::{
    analysis, derive_hash_hex, verify_grid, EngineConfig, EngineParams, SeedTriple, Symbol,
};
use fairplay_shared::{
    ApiError, CrashRoundRequest, Game, RoundReceipt, SlotRoundRequest, VerifyRequest,
};

#[derive(Parser)]
#[command(name = "fairplay-cli", about = "Play, verify and audit provably-fair rounds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Engine configuration (JSON); built-in tables when omitted
    #[arg(long, global = true, env = "FAIRPLAY_CONFIG")]
    config: Option<String>,
    /// Crash target RTP, overriding the configured alpha
    #[arg(long, global = true)]
    target_rtp: Option<f64>,
}

#[derive(Args)]
struct SeedArgs {
    #[arg(long, env = "FAIRPLAY_SERVER_SEED", hide_env_values = true)]
    server_seed: String,
    #[arg(long, default_value = "")]
    client_seed: String,
    /// Round nonce; for slots, the nonce of the first cell
    #[arg(long, default_value = "0")]
    nonce: String,
}

impl SeedArgs {
    fn seeds(&self) -> anyhow::Result<SeedTriple> {
        Ok(SeedTriple::parse(
            self.server_seed.as_str(),
            self.client_seed.as_str(),
            &self.nonce,
        )?)
    }

    fn crash_request(&self, target_rtp: f64) -> anyhow::Result<CrashRoundRequest> {
        let seeds = self.seeds()?;
        Ok(CrashRoundRequest {
            server_seed: seeds.server_seed,
            client_seed: seeds.client_seed,
            nonce: seeds.nonce,
            target_rtp,
        })
    }

    fn slot_request(&self, stake: f64) -> anyhow::Result<SlotRoundRequest> {
        let seeds = self.seeds()?;
        Ok(SlotRoundRequest {
            server_seed: seeds.server_seed,
            client_seed: seeds.client_seed,
            nonce_base: seeds.nonce,
            stake,
        })
    }

    fn verify_request(&self, commitment: &str) -> anyhow::Result<VerifyRequest> {
        let seeds = self.seeds()?;
        Ok(VerifyRequest {
            server_seed: seeds.server_seed,
            server_seed_hash: commitment.to_string(),
            client_seed: seeds.client_seed,
            nonce: seeds.nonce,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a fresh server seed and its commitment
    NewSeed {
        #[arg(long, default_value_t = 32)]
        bytes: usize,
    },
    /// Print the SHA-256 commitment of a server seed
    Commit {
        #[arg(long, env = "FAIRPLAY_SERVER_SEED", hide_env_values = true)]
        server_seed: String,
    },
    /// Play one crash round
    Crash {
        #[command(flatten)]
        seeds: SeedArgs,
        /// Cashout target used to settle the stake
        #[arg(long)]
        cashout: Option<f64>,
        #[arg(long, default_value_t = 1.0)]
        stake: f64,
    },
    /// Play one slot spin
    Slot {
        #[command(flatten)]
        seeds: SeedArgs,
        #[arg(long, default_value_t = 5.0)]
        stake: f64,
    },
    /// Recompute a crash round from a revealed seed
    VerifyCrash {
        #[command(flatten)]
        seeds: SeedArgs,
        #[arg(long)]
        commitment: String,
        #[arg(long)]
        raw_multiplier: f64,
    },
    /// Recompute a slot grid from a revealed seed
    VerifySlot {
        #[command(flatten)]
        seeds: SeedArgs,
        #[arg(long)]
        commitment: String,
        /// Grid as JSON symbol indices, rows x reels
        #[arg(long)]
        grid: String,
    },
    /// Monte Carlo crash run at a fixed cashout
    SimulateCrash {
        #[command(flatten)]
        seeds: SeedArgs,
        #[arg(long, default_value_t = 200_000)]
        rounds: u64,
        #[arg(long, default_value_t = 2.0)]
        cashout: f64,
    },
    /// Monte Carlo slot run compared against the analytic RTP
    SimulateSlot {
        #[command(flatten)]
        seeds: SeedArgs,
        #[arg(long, default_value_t = 100_000)]
        spins: u64,
    },
    /// Kolmogorov-Smirnov check of the draw distribution
    Uniformity {
        #[command(flatten)]
        seeds: SeedArgs,
        #[arg(long, default_value_t = 100_000)]
        count: u64,
    },
}

fn load_params(path: Option<&str>, target_rtp: Option<f64>) -> anyhow::Result<EngineParams> {
    let mut config = match path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(alpha) = target_rtp {
        config.crash.alpha = alpha;
    }
    Ok(config.into_params()?)
}

fn check_commitment(req: &VerifyRequest) -> anyhow::Result<SeedTriple> {
    match req.verified_seeds() {
        Err(ApiError::CommitmentMismatch) => {
            warn!(commitment = %req.server_seed_hash, "revealed seed does not match commitment");
            Err(ApiError::CommitmentMismatch.into())
        }
        other => Ok(other?),
    }
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    run(Cli::parse())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        config,
        target_rtp,
    } = cli;
    let params = || load_params(config.as_deref(), target_rtp);

    match command {
        Commands::NewSeed { bytes } => {
            if bytes == 0 {
                bail!("seed length must be positive");
            }
            let mut buf = vec![0u8; bytes];
            rand::rngs::OsRng.fill_bytes(&mut buf);
            let seed = hex::encode(buf);
            let commitment = derive_hash_hex(seed.as_bytes());
            info!(%commitment, "generated server seed");
            print_json(&json!({ "server_seed": seed, "server_seed_hash": commitment }))?;
        }
        Commands::Commit { server_seed } => {
            println!("{}", derive_hash_hex(server_seed.as_bytes()));
        }
        Commands::Crash {
            seeds,
            cashout,
            stake,
        } => {
            let params = params()?;
            let response = seeds
                .crash_request(params.crash.alpha())?
                .play(params.crash.cap())?;
            match cashout {
                Some(cashout) => {
                    let receipt = RoundReceipt {
                        ts: Utc::now(),
                        game: Game::Crash,
                        proof: response.proof.clone(),
                        stake,
                        payout: response.outcome().payout(stake, cashout)?,
                    };
                    print_json(&json!({ "round": response, "receipt": receipt }))?;
                }
                None => print_json(&response)?,
            }
        }
        Commands::Slot { seeds, stake } => {
            let params = params()?;
            let response = seeds.slot_request(stake)?.spin(&params.slot)?;
            let receipt = RoundReceipt {
                ts: Utc::now(),
                game: Game::Slot,
                proof: response.proof.clone(),
                stake,
                payout: response.total_payout,
            };
            for row in &response.grid {
                let cells = row
                    .iter()
                    .map(|&i| Symbol::from_index(i).map(|s| s.to_string()))
                    .collect::<Result<Vec<_>, _>>()?;
                info!("{}", cells.join(" "));
            }
            print_json(&json!({ "round": response, "receipt": receipt }))?;
        }
        Commands::VerifyCrash {
            seeds,
            commitment,
            raw_multiplier,
        } => {
            let params = params()?;
            let req = seeds.verify_request(&commitment)?;
            check_commitment(&req)?;
            let recomputed = req
                .crash_request(params.crash.alpha())
                .play(params.crash.cap())?;
            let matches = recomputed.raw_multiplier == raw_multiplier;
            print_json(&json!({
                "verified": matches,
                "target_rtp": params.crash.alpha(),
                "recomputed": recomputed,
            }))?;
            if !matches {
                bail!("crash round does not match the revealed seeds");
            }
        }
        Commands::VerifySlot {
            seeds,
            commitment,
            grid,
        } => {
            let params = params()?;
            let seeds = check_commitment(&seeds.verify_request(&commitment)?)?;
            let expected: Vec<Vec<u8>> =
                serde_json::from_str(&grid).context("grid must be a JSON array of rows")?;
            let matches = verify_grid(
                &seeds.server_seed,
                &seeds.client_seed,
                seeds.nonce,
                &params.slot.reels,
                &expected,
            )?;
            print_json(&json!({ "verified": matches }))?;
            if !matches {
                bail!("slot grid does not match the revealed seeds");
            }
        }
        Commands::SimulateCrash {
            seeds,
            rounds,
            cashout,
        } => {
            let params = params()?;
            let seeds = seeds.seeds()?;
            let config = &params.crash;
            let report = analysis::simulate_crash(
                config,
                &seeds.server_seed,
                &seeds.client_seed,
                rounds,
                cashout,
            )?;
            print_json(&json!({
                "alpha": config.alpha(),
                "cashout": cashout,
                "expected_hit_rate": config.alpha() / cashout,
                "z_score": report.z_score(config.alpha()),
                "report": report,
            }))?;
        }
        Commands::SimulateSlot { seeds, spins } => {
            let params = params()?;
            let seeds = seeds.seeds()?;
            let expected = analysis::theoretical_slot_rtp(&params.slot);
            let report = analysis::simulate_slot(
                &params.slot,
                &seeds.server_seed,
                &seeds.client_seed,
                spins,
            )?;
            print_json(&json!({
                "target_rtp": params.slot.rtp_target,
                "theoretical_rtp": expected,
                "line_expected_multiplier": analysis::line_expected_multiplier(&params.slot),
                "royal_probability": analysis::royal_probability(&params.slot),
                "z_score": report.z_score(expected),
                "report": report,
            }))?;
        }
        Commands::Uniformity { seeds, count } => {
            let seeds = seeds.seeds()?;
            let d = analysis::uniformity_ks(&seeds.server_seed, &seeds.client_seed, count)?;
            let critical = 1.63 / (count.max(1) as f64).sqrt();
            print_json(&json!({
                "count": count,
                "ks_statistic": d,
                "critical_0_01": critical,
                "uniform": d < critical,
            }))?;
        }
    }

    Ok(())
}
