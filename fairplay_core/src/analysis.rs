//! Return-to-player analysis: closed-form slot RTP and Monte Carlo runs over
//! real seeded rounds.

use rayon::prelude::*;
use serde::Serialize;

use crate::{
    crash::{check_cashout, CrashConfig},
    engine::{self, SlotParams, CELLS, LINES, REELS, ROYAL_SEQUENCE},
    error::{EngineError, Result},
    paytable::{MAX_COUNT, MIN_COUNT},
    rng::ProvablyFairRng,
    symbols::Symbol,
};

fn binomial(n: u32, k: u32) -> f64 {
    (0..k).fold(1.0, |acc, i| acc * f64::from(n - i) / f64::from(i + 1))
}

/// Expected multiplier of one payline for a one-unit line stake.
pub fn line_expected_multiplier(params: &SlotParams) -> f64 {
    let cells = REELS as u32;
    Symbol::ALL
        .iter()
        .map(|&symbol| {
            let p = params.reels.probability(symbol);
            (MIN_COUNT..=MAX_COUNT)
                .map(|count| {
                    let k = u32::from(count);
                    binomial(cells, k)
                        * p.powi(k as i32)
                        * (1.0 - p).powi((cells - k) as i32)
                        * params.paytable.multiplier(symbol, count)
                })
                .sum::<f64>()
        })
        .sum()
}

pub fn royal_probability(params: &SlotParams) -> f64 {
    ROYAL_SEQUENCE
        .iter()
        .map(|&s| params.reels.probability(s))
        .product()
}

/// Analytic RTP: every line is an independent draw of five cells, and the
/// royal bonus adds `P(royal) * multiplier` on the middle line.
pub fn theoretical_slot_rtp(params: &SlotParams) -> f64 {
    let lines = LINES as f64;
    let per_spin = lines * line_expected_multiplier(params)
        + royal_probability(params) * params.royal_multiplier;
    per_spin / lines
}

#[derive(Debug, Clone, Default)]
struct Stats {
    rounds: u64,
    staked: f64,
    returned: f64,
    ratio_sq: f64,
    hits: u64,
    busts: u64,
}

impl Stats {
    fn add(&mut self, stake: f64, payout: f64, hit: bool, bust: bool) {
        let ratio = payout / stake;
        self.rounds += 1;
        self.staked += stake;
        self.returned += payout;
        self.ratio_sq += ratio * ratio;
        self.hits += u64::from(hit);
        self.busts += u64::from(bust);
    }

    fn merge(mut self, other: Stats) -> Stats {
        self.rounds += other.rounds;
        self.staked += other.staked;
        self.returned += other.returned;
        self.ratio_sq += other.ratio_sq;
        self.hits += other.hits;
        self.busts += other.busts;
        self
    }

    fn report(&self) -> SimulationReport {
        let n = self.rounds as f64;
        let (mean_return, std_error, hit_rate, bust_rate) = if self.rounds == 0 {
            (0.0, 0.0, 0.0, 0.0)
        } else {
            // Stakes are constant within a run, so mean(payout / stake) == returned / staked.
            let mean = self.returned / self.staked;
            let var = (self.ratio_sq / n - mean * mean).max(0.0);
            (
                mean,
                (var / n).sqrt(),
                self.hits as f64 / n,
                self.busts as f64 / n,
            )
        };
        SimulationReport {
            rounds: self.rounds,
            total_staked: self.staked,
            total_returned: self.returned,
            mean_return,
            std_error,
            hit_rate,
            bust_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub rounds: u64,
    pub total_staked: f64,
    pub total_returned: f64,
    /// Returned per unit staked.
    pub mean_return: f64,
    pub std_error: f64,
    pub hit_rate: f64,
    /// Instant busts (crash only).
    pub bust_rate: f64,
}

impl SimulationReport {
    /// Distance from `expected` in standard errors.
    pub fn z_score(&self, expected: f64) -> f64 {
        if self.std_error == 0.0 {
            return if self.mean_return == expected {
                0.0
            } else {
                f64::INFINITY
            };
        }
        (self.mean_return - expected) / self.std_error
    }
}

/// Plays `spins` slot rounds at nonce bases `0, 15, 30, ...` with one unit per line.
pub fn simulate_slot(
    params: &SlotParams,
    server_seed: &str,
    client_seed: &str,
    spins: u64,
) -> Result<SimulationReport> {
    let rng = ProvablyFairRng::from_parts(server_seed, client_seed, 0)?;
    if spins.checked_mul(CELLS).is_none() {
        return Err(EngineError::NonceOverflow {
            base: 0,
            offset: spins.saturating_mul(CELLS),
        });
    }
    let stake = LINES as f64;
    let stats = (0..spins)
        .into_par_iter()
        .try_fold(Stats::default, |mut stats, i| {
            let outcome = engine::spin_once(&rng.with_nonce(i * CELLS), params, stake)?;
            stats.add(stake, outcome.total_payout, !outcome.wins.is_empty(), false);
            Ok::<_, EngineError>(stats)
        })
        .try_reduce(Stats::default, |a, b| Ok(a.merge(b)))?;
    Ok(stats.report())
}

/// Plays `rounds` crash rounds at nonces `0..rounds`, cashing out at `cashout`.
pub fn simulate_crash(
    config: &CrashConfig,
    server_seed: &str,
    client_seed: &str,
    rounds: u64,
    cashout: f64,
) -> Result<SimulationReport> {
    check_cashout(cashout)?;
    let rng = ProvablyFairRng::from_parts(server_seed, client_seed, 0)?;
    let stats = (0..rounds)
        .into_par_iter()
        .fold(Stats::default, |mut stats, nonce| {
            let outcome = config.outcome_from_draw(rng.with_nonce(nonce).draw());
            stats.add(
                1.0,
                outcome.settle(1.0, cashout),
                outcome.wins_at(cashout),
                outcome.instant_bust,
            );
            stats
        })
        .reduce(Stats::default, Stats::merge);
    Ok(stats.report())
}

/// Kolmogorov-Smirnov distance between draws at nonces `0..count` and Uniform(0, 1).
pub fn uniformity_ks(server_seed: &str, client_seed: &str, count: u64) -> Result<f64> {
    let rng = ProvablyFairRng::from_parts(server_seed, client_seed, 0)?;
    let mut draws: Vec<f64> = (0..count)
        .into_par_iter()
        .map(|nonce| rng.with_nonce(nonce).draw())
        .collect();
    draws.par_sort_unstable_by(f64::total_cmp);
    let n = draws.len() as f64;
    Ok(draws
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let below = i as f64 / n;
            let at = (i + 1) as f64 / n;
            (at - x).max(x - below)
        })
        .fold(0.0, f64::max))
}
