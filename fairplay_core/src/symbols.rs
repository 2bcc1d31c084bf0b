use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Reel symbols, ordered from most to least common on the default strip.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Symbol {
    Cherry,
    Banana,
    Orange,
    Grape,
    Strawberry,
    Bell,
    Bar,
    Seven,
}

impl Symbol {
    pub const COUNT: usize = 8;

    pub const ALL: [Symbol; Symbol::COUNT] = [
        Symbol::Cherry,
        Symbol::Banana,
        Symbol::Orange,
        Symbol::Grape,
        Symbol::Strawberry,
        Symbol::Bell,
        Symbol::Bar,
        Symbol::Seven,
    ];

    pub fn from_index(i: u8) -> Result<Self> {
        Self::ALL
            .get(i as usize)
            .copied()
            .ok_or(EngineError::UnknownSymbol(i))
    }

    pub fn to_index(self) -> u8 {
        match self {
            Symbol::Cherry => 0,
            Symbol::Banana => 1,
            Symbol::Orange => 2,
            Symbol::Grape => 3,
            Symbol::Strawberry => 4,
            Symbol::Bell => 5,
            Symbol::Bar => 6,
            Symbol::Seven => 7,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Symbol::Cherry => "🍒",
            Symbol::Banana => "🍌",
            Symbol::Orange => "🍊",
            Symbol::Grape => "🍇",
            Symbol::Strawberry => "🍓",
            Symbol::Bell => "🔔",
            Symbol::Bar => "🟫",
            Symbol::Seven => "7️⃣",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.emoji())
    }
}

/// Stops a symbol occupies on the reel strip.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReelWeight {
    pub symbol: Symbol,
    pub stops: u32,
}

/// A weighted reel strip shared by every reel.
///
/// Sampling is an inverse CDF over cumulative stop counts: the draw selects
/// stop `floor(r * len)` and the symbol owning that stop is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReelStrip {
    weights: Vec<ReelWeight>,
    cumulative: Vec<u32>,
    len: u32,
}

impl ReelStrip {
    pub const STANDARD_LEN: u32 = 100;

    pub fn new(weights: Vec<ReelWeight>) -> Result<Self> {
        Self::with_len(weights, Self::STANDARD_LEN)
    }

    /// Validates that every symbol appears once and the stops add up to `len`.
    pub fn with_len(weights: Vec<ReelWeight>, len: u32) -> Result<Self> {
        let mut seen = [false; Symbol::COUNT];
        for w in &weights {
            let slot = &mut seen[w.symbol.to_index() as usize];
            if *slot {
                return Err(EngineError::DuplicateReelSymbol(w.symbol));
            }
            *slot = true;
            if w.stops == 0 {
                return Err(EngineError::MissingReelSymbol(w.symbol));
            }
        }
        if let Some(missing) = Symbol::ALL.iter().find(|s| !seen[s.to_index() as usize]) {
            return Err(EngineError::MissingReelSymbol(*missing));
        }

        let sum = weights
            .iter()
            .fold(0u32, |acc, w| acc.saturating_add(w.stops));
        if sum != len {
            return Err(EngineError::ReelWeights { sum, expected: len });
        }

        let cumulative = weights
            .iter()
            .scan(0u32, |acc, w| {
                *acc += w.stops;
                Some(*acc)
            })
            .collect();
        Ok(Self {
            weights,
            cumulative,
            len,
        })
    }

    pub fn default_strip() -> Self {
        let weights = [22, 18, 16, 14, 12, 8, 6, 4]
            .into_iter()
            .zip(Symbol::ALL)
            .map(|(stops, symbol)| ReelWeight { symbol, stops })
            .collect();
        Self {
            cumulative: vec![22, 40, 56, 70, 82, 90, 96, 100],
            weights,
            len: Self::STANDARD_LEN,
        }
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn weights(&self) -> &[ReelWeight] {
        &self.weights
    }

    pub fn stops(&self, symbol: Symbol) -> u32 {
        self.weights
            .iter()
            .find(|w| w.symbol == symbol)
            .map_or(0, |w| w.stops)
    }

    /// Probability of `symbol` landing in any one cell.
    pub fn probability(&self, symbol: Symbol) -> f64 {
        f64::from(self.stops(symbol)) / f64::from(self.len)
    }

    /// Maps a uniform draw in `[0, 1)` onto a symbol.
    pub fn sample(&self, r: f64) -> Symbol {
        let stop = ((r * f64::from(self.len)).floor() as u32).min(self.len - 1);
        let idx = self.cumulative.partition_point(|&c| c <= stop);
        self.weights[idx].symbol
    }
}
