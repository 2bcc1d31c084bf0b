use chrono::{DateTime, Utc};
use fairplay_core::{
    spin_with_seeds, verify_commitment, CrashConfig, CrashOutcome, EngineError, LineWin,
    SeedTriple, SlotParams, SpinOutcome, WinKind,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CrashRoundRequest {
    pub server_seed: String,
    pub client_seed: String,
    pub nonce: u64,
    pub target_rtp: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CrashRoundResponse {
    pub raw_multiplier: f64,
    pub display_multiplier: f64,
    pub instant_bust: bool,
    pub proof: RoundProof,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SlotRoundRequest {
    pub server_seed: String,
    pub client_seed: String,
    pub nonce_base: u64,
    pub stake: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SlotRoundResponse {
    pub grid: Vec<Vec<u8>>, // indices of symbols, rows x reels
    pub wins: Vec<WinRecord>,
    pub total_payout: f64,
    pub proof: RoundProof,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WinRecord {
    pub line_id: u8,
    /// `None` for the Royal Sequence.
    pub symbol: Option<u8>,
    pub count: u8,
    pub payout: f64,
}

/// What a player needs to re-derive a round once the server seed is revealed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RoundProof {
    pub server_seed_hash: String,
    pub client_seed: String,
    pub nonce: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VerifyRequest {
    pub server_seed: String,
    pub server_seed_hash: String,
    pub client_seed: String,
    pub nonce: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Game {
    Crash,
    Slot,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RoundReceipt {
    pub ts: DateTime<Utc>,
    pub game: Game,
    pub proof: RoundProof,
    pub stake: f64,
    pub payout: f64,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("server seed does not match its commitment")]
    CommitmentMismatch,
    #[error("internal server error")]
    Internal,
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::ConfigIo(_) => ApiError::Internal,
            other => ApiError::Invalid(other.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl RoundProof {
    pub fn for_seeds(seeds: &SeedTriple) -> Self {
        Self {
            server_seed_hash: fairplay_core::derive_hash_hex(seeds.server_seed.as_bytes()),
            client_seed: seeds.client_seed.clone(),
            nonce: seeds.nonce,
        }
    }
}

impl CrashRoundRequest {
    pub fn seeds(&self) -> ApiResult<SeedTriple> {
        Ok(SeedTriple::new(
            self.server_seed.as_str(),
            self.client_seed.as_str(),
            self.nonce,
        )?)
    }

    /// Plays the round at the requested `target_rtp`, clamping the display at `cap`.
    pub fn play(&self, cap: f64) -> ApiResult<CrashRoundResponse> {
        let seeds = self.seeds()?;
        let config = CrashConfig::new(self.target_rtp, cap)?;
        Ok(CrashRoundResponse::new(config.play(&seeds), &seeds))
    }
}

impl SlotRoundRequest {
    pub fn seeds(&self) -> ApiResult<SeedTriple> {
        Ok(SeedTriple::new(
            self.server_seed.as_str(),
            self.client_seed.as_str(),
            self.nonce_base,
        )?)
    }

    pub fn spin(&self, params: &SlotParams) -> ApiResult<SlotRoundResponse> {
        let seeds = self.seeds()?;
        let outcome = spin_with_seeds(
            &seeds.server_seed,
            &seeds.client_seed,
            seeds.nonce,
            params,
            self.stake,
        )?;
        Ok(SlotRoundResponse::new(&outcome, &seeds))
    }
}

impl VerifyRequest {
    /// Checks the revealed seed against its commitment and hands back the
    /// triple to replay the round with.
    pub fn verified_seeds(&self) -> ApiResult<SeedTriple> {
        if !verify_commitment(&self.server_seed, &self.server_seed_hash) {
            return Err(ApiError::CommitmentMismatch);
        }
        Ok(SeedTriple::new(
            self.server_seed.as_str(),
            self.client_seed.as_str(),
            self.nonce,
        )?)
    }

    pub fn crash_request(&self, target_rtp: f64) -> CrashRoundRequest {
        CrashRoundRequest {
            server_seed: self.server_seed.clone(),
            client_seed: self.client_seed.clone(),
            nonce: self.nonce,
            target_rtp,
        }
    }
}

impl CrashRoundResponse {
    pub fn new(outcome: CrashOutcome, seeds: &SeedTriple) -> Self {
        Self {
            raw_multiplier: outcome.raw_multiplier,
            display_multiplier: outcome.display_multiplier,
            instant_bust: outcome.instant_bust,
            proof: RoundProof::for_seeds(seeds),
        }
    }

    pub fn outcome(&self) -> CrashOutcome {
        CrashOutcome {
            raw_multiplier: self.raw_multiplier,
            display_multiplier: self.display_multiplier,
            instant_bust: self.instant_bust,
        }
    }
}

impl From<&LineWin> for WinRecord {
    fn from(win: &LineWin) -> Self {
        let (symbol, count) = match win.kind {
            WinKind::Match { symbol, count } => (Some(symbol.to_index()), count),
            WinKind::RoyalSequence => (None, fairplay_core::engine::REELS as u8),
        };
        Self {
            line_id: win.line.id(),
            symbol,
            count,
            payout: win.payout,
        }
    }
}

impl SlotRoundResponse {
    pub fn new(outcome: &SpinOutcome, seeds: &SeedTriple) -> Self {
        Self {
            grid: outcome.grid.to_indices(),
            wins: outcome.wins.iter().map(WinRecord::from).collect(),
            total_payout: outcome.total_payout,
            proof: RoundProof::for_seeds(seeds),
        }
    }
}
