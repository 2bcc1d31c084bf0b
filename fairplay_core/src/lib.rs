pub mod analysis;
pub mod config;
pub mod crash;
pub mod engine;
pub mod error;
pub mod paytable;
pub mod rng;
pub mod symbols;

pub use crate::analysis::{
    simulate_crash, simulate_slot, theoretical_slot_rtp, uniformity_ks, SimulationReport,
};
pub use crate::config::{CrashSettings, EngineConfig, EngineParams, SlotSettings};
pub use crate::crash::{check_cashout, play_with_seeds, CrashConfig, CrashOutcome};
pub use crate::engine::{
    compute_grid, evaluate, spin_once, spin_with_seeds, verify_grid, Grid, LineWin, Payline,
    SlotParams, SpinOutcome, WinKind,
};
pub use crate::error::{EngineError, Result};
pub use crate::paytable::{Paytable, PaytableEntry};
pub use crate::rng::{derive_hash_hex, verify_commitment, ProvablyFairRng, SeedTriple};
pub use crate::symbols::{ReelStrip, ReelWeight, Symbol};
