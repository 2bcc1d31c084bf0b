//! Crash multipliers.
//!
//! One draw `r` maps to `raw = alpha / (1 - r)`, so `P(raw >= x) = alpha / x`
//! for every `x >= 1` and a cashout at any target returns `alpha` on average.
//! The remaining `1 - alpha` of the mass lands below 1 and busts immediately.
//!
//! `display_multiplier` is clamped to `[1, cap]` for presentation. Settlement
//! goes through [`CrashOutcome::wins_at`], which only looks at the raw value.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::rng::{ProvablyFairRng, SeedTriple};

/// Smallest denominator used by the transform; `1 - r` never goes below it.
pub const MIN_DENOMINATOR: f64 = f64::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CrashConfig {
    alpha: f64,
    cap: f64,
}

impl CrashConfig {
    pub const DEFAULT_ALPHA: f64 = 0.96;
    pub const DEFAULT_CAP: f64 = 20.0;

    pub fn new(alpha: f64, cap: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(EngineError::InvalidRtp(alpha));
        }
        if !(cap.is_finite() && cap >= 1.0) {
            return Err(EngineError::InvalidCap(cap));
        }
        Ok(Self { alpha, cap })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn cap(&self) -> f64 {
        self.cap
    }

    pub fn outcome_from_draw(&self, r: f64) -> CrashOutcome {
        let denom = (1.0 - r).max(MIN_DENOMINATOR);
        let raw_multiplier = self.alpha / denom;
        CrashOutcome {
            raw_multiplier,
            display_multiplier: raw_multiplier.max(1.0).min(self.cap),
            instant_bust: raw_multiplier < 1.0,
        }
    }

    pub fn play(&self, seeds: &SeedTriple) -> CrashOutcome {
        let rng = ProvablyFairRng::new(seeds.clone());
        let outcome = self.outcome_from_draw(rng.draw());
        debug!(
            nonce = seeds.nonce,
            raw = outcome.raw_multiplier,
            display = outcome.display_multiplier,
            instant_bust = outcome.instant_bust,
            "crash round"
        );
        outcome
    }

    /// Recomputes a round from revealed seeds and compares it with `claimed`.
    pub fn verify(&self, seeds: &SeedTriple, claimed: &CrashOutcome) -> bool {
        self.play(seeds) == *claimed
    }
}

impl Default for CrashConfig {
    fn default() -> Self {
        Self {
            alpha: Self::DEFAULT_ALPHA,
            cap: Self::DEFAULT_CAP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrashOutcome {
    pub raw_multiplier: f64,
    pub display_multiplier: f64,
    pub instant_bust: bool,
}

/// Cashout targets below 1.00x are not bets the game accepts.
pub fn check_cashout(cashout: f64) -> Result<()> {
    if cashout.is_finite() && cashout >= 1.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidCashout(cashout))
    }
}

impl CrashOutcome {
    /// Whether a cashout placed at `cashout` survives this round.
    pub fn wins_at(&self, cashout: f64) -> bool {
        !self.instant_bust && self.raw_multiplier >= cashout
    }

    /// Settles `stake` at `cashout`; both are checked before anything is paid.
    pub fn payout(&self, stake: f64, cashout: f64) -> Result<f64> {
        if !(stake.is_finite() && stake > 0.0) {
            return Err(EngineError::InvalidStake(stake));
        }
        check_cashout(cashout)?;
        Ok(self.settle(stake, cashout))
    }

    pub(crate) fn settle(&self, stake: f64, cashout: f64) -> f64 {
        if self.wins_at(cashout) {
            stake * cashout
        } else {
            0.0
        }
    }
}

/// Convenience: one crash round straight from seeds.
pub fn play_with_seeds(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    config: &CrashConfig,
) -> Result<CrashOutcome> {
    let seeds = SeedTriple::new(server_seed, client_seed, nonce)?;
    Ok(config.play(&seeds))
}
