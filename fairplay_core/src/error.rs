use crate::symbols::Symbol;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("server seed must not be empty")]
    EmptyServerSeed,
    #[error("nonce must be a non-negative integer, got {0:?}")]
    InvalidNonce(String),
    #[error("nonce {base} + offset {offset} overflows u64")]
    NonceOverflow { base: u64, offset: u64 },
    #[error("stake must be finite and positive, got {0}")]
    InvalidStake(f64),
    #[error("cashout target must be finite and >= 1, got {0}")]
    InvalidCashout(f64),
    #[error("target RTP must lie in (0, 1], got {0}")]
    InvalidRtp(f64),
    #[error("display cap must be finite and >= 1, got {0}")]
    InvalidCap(f64),
    #[error("reel weights sum to {sum}, expected {expected}")]
    ReelWeights { sum: u32, expected: u32 },
    #[error("reel strip lists {0:?} more than once")]
    DuplicateReelSymbol(Symbol),
    #[error("reel strip has no stops for {0:?}")]
    MissingReelSymbol(Symbol),
    #[error("unknown symbol index {0}")]
    UnknownSymbol(u8),
    #[error("paytable count must be 3, 4 or 5, got {0}")]
    InvalidCount(u8),
    #[error("paytable is missing {symbol:?} x{count}")]
    MissingPaytableEntry { symbol: Symbol, count: u8 },
    #[error("paytable lists {symbol:?} x{count} more than once")]
    DuplicatePaytableEntry { symbol: Symbol, count: u8 },
    #[error("paytable multiplier for {symbol:?} x{count} must be finite and >= 0, got {multiplier}")]
    InvalidMultiplier {
        symbol: Symbol,
        count: u8,
        multiplier: f64,
    },
    #[error("paytable multipliers for {0:?} must not decrease with count")]
    NonMonotonicPaytable(Symbol),
    #[error("royal multiplier must be finite and >= 0, got {0}")]
    InvalidRoyalMultiplier(f64),
    #[error("RTP tolerance must be finite and >= 0, got {0}")]
    InvalidTolerance(f64),
    #[error("configured RTP {computed:.4} is outside {target:.4} +/- {tolerance}")]
    RtpMismatch {
        target: f64,
        computed: f64,
        tolerance: f64,
    },
    #[error("could not read config: {0}")]
    ConfigIo(String),
    #[error("could not parse config: {0}")]
    ConfigParse(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
