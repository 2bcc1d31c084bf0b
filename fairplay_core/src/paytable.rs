use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::symbols::Symbol;

pub const MIN_COUNT: u8 = 3;
pub const MAX_COUNT: u8 = 5;
const TIERS: usize = (MAX_COUNT - MIN_COUNT + 1) as usize;

/// Wire/config form of one paytable row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PaytableEntry {
    pub symbol: u8, // Symbol index
    pub count: u8,
    pub payout_multiplier: f64,
}

/// Line multipliers indexed by symbol and match count.
#[derive(Debug, Clone, PartialEq)]
pub struct Paytable {
    table: [[f64; TIERS]; Symbol::COUNT],
}

impl Paytable {
    /// Builds a table from per-symbol `[x3, x4, x5]` multipliers, checking
    /// that every multiplier is non-negative and never decreases with count.
    pub fn from_tiers(table: [[f64; TIERS]; Symbol::COUNT]) -> Result<Self> {
        for symbol in Symbol::ALL {
            let tiers = &table[symbol.to_index() as usize];
            for (i, &multiplier) in tiers.iter().enumerate() {
                if !multiplier.is_finite() || multiplier < 0.0 {
                    return Err(EngineError::InvalidMultiplier {
                        symbol,
                        count: MIN_COUNT + i as u8,
                        multiplier,
                    });
                }
            }
            if tiers.windows(2).any(|w| w[1] < w[0]) {
                return Err(EngineError::NonMonotonicPaytable(symbol));
            }
        }
        Ok(Self { table })
    }

    pub fn from_entries(entries: &[PaytableEntry]) -> Result<Self> {
        let mut table = [[f64::NAN; TIERS]; Symbol::COUNT];
        for entry in entries {
            let symbol = Symbol::from_index(entry.symbol)?;
            if !(MIN_COUNT..=MAX_COUNT).contains(&entry.count) {
                return Err(EngineError::InvalidCount(entry.count));
            }
            let slot = &mut table[entry.symbol as usize][(entry.count - MIN_COUNT) as usize];
            if !slot.is_nan() {
                return Err(EngineError::DuplicatePaytableEntry {
                    symbol,
                    count: entry.count,
                });
            }
            *slot = entry.payout_multiplier;
            if slot.is_nan() {
                return Err(EngineError::InvalidMultiplier {
                    symbol,
                    count: entry.count,
                    multiplier: entry.payout_multiplier,
                });
            }
        }
        for symbol in Symbol::ALL {
            for (i, m) in table[symbol.to_index() as usize].iter().enumerate() {
                if m.is_nan() {
                    return Err(EngineError::MissingPaytableEntry {
                        symbol,
                        count: MIN_COUNT + i as u8,
                    });
                }
            }
        }
        Self::from_tiers(table)
    }

    pub fn simple_default() -> Self {
        Self {
            table: [
                [2.5, 8.0, 30.0],   // cherry
                [3.0, 10.0, 40.0],  // banana
                [4.0, 13.0, 50.0],  // orange
                [5.5, 15.0, 75.0],  // grape
                [6.0, 20.0, 100.0], // strawberry
                [10.0, 40.0, 200.0],
                [15.0, 60.0, 300.0],
                [25.0, 100.0, 1000.0],
            ],
        }
    }

    /// Line multiplier for `count` matching `symbol`s; zero below three.
    pub fn multiplier(&self, symbol: Symbol, count: u8) -> f64 {
        if !(MIN_COUNT..=MAX_COUNT).contains(&count) {
            return 0.0;
        }
        self.table[symbol.to_index() as usize][(count - MIN_COUNT) as usize]
    }

    pub fn entries(&self) -> Vec<PaytableEntry> {
        Symbol::ALL
            .iter()
            .flat_map(|&symbol| {
                (MIN_COUNT..=MAX_COUNT).map(move |count| PaytableEntry {
                    symbol: symbol.to_index(),
                    count,
                    payout_multiplier: self.multiplier(symbol, count),
                })
            })
            .collect()
    }
}
