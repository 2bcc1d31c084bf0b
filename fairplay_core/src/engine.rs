use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{EngineError, Result},
    paytable::{Paytable, MIN_COUNT},
    rng::ProvablyFairRng,
    symbols::{ReelStrip, Symbol},
};

pub const REELS: usize = 5;
pub const ROWS: usize = 3;
pub const CELLS: u64 = (REELS * ROWS) as u64;

/// Middle-line pattern paying the Royal Sequence bonus.
pub const ROYAL_SEQUENCE: [Symbol; REELS] = [
    Symbol::Cherry,
    Symbol::Banana,
    Symbol::Orange,
    Symbol::Grape,
    Symbol::Strawberry,
];

pub const DEFAULT_ROYAL_MULTIPLIER: f64 = 2000.0;

#[derive(Debug, Clone)]
pub struct SlotParams {
    pub reels: ReelStrip,
    pub paytable: Paytable,
    pub royal_multiplier: f64,
    pub rtp_target: f64, // checked against the analytic RTP at load, not used per spin
}

impl Default for SlotParams {
    fn default() -> Self {
        Self {
            reels: ReelStrip::default_strip(),
            paytable: Paytable::simple_default(),
            royal_multiplier: DEFAULT_ROYAL_MULTIPLIER,
            rtp_target: 0.96,
        }
    }
}

/// Visible symbols, stored reel-major: `cells[reel][row]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    cells: [[Symbol; ROWS]; REELS],
}

impl Grid {
    pub fn from_reels(cells: [[Symbol; ROWS]; REELS]) -> Self {
        Self { cells }
    }

    pub fn from_rows(rows: [[Symbol; REELS]; ROWS]) -> Self {
        let mut cells = [[Symbol::Cherry; ROWS]; REELS];
        for (row, symbols) in rows.iter().enumerate() {
            for (reel, &symbol) in symbols.iter().enumerate() {
                cells[reel][row] = symbol;
            }
        }
        Self { cells }
    }

    pub fn get(&self, reel: usize, row: usize) -> Symbol {
        self.cells[reel][row]
    }

    pub fn row(&self, row: usize) -> [Symbol; REELS] {
        std::array::from_fn(|reel| self.cells[reel][row])
    }

    pub fn line(&self, line: Payline) -> [Symbol; REELS] {
        let rows = line.rows();
        std::array::from_fn(|reel| self.cells[reel][rows[reel]])
    }

    /// Symbol indices, rows x reels.
    pub fn to_indices(&self) -> Vec<Vec<u8>> {
        (0..ROWS)
            .map(|row| self.row(row).iter().map(|s| s.to_index()).collect())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payline {
    Top,
    Middle,
    Bottom,
    DiagonalDown,
    DiagonalUp,
}

impl Payline {
    pub const ALL: [Payline; 5] = [
        Payline::Top,
        Payline::Middle,
        Payline::Bottom,
        Payline::DiagonalDown,
        Payline::DiagonalUp,
    ];

    pub fn id(self) -> u8 {
        match self {
            Payline::Top => 0,
            Payline::Middle => 1,
            Payline::Bottom => 2,
            Payline::DiagonalDown => 3,
            Payline::DiagonalUp => 4,
        }
    }

    /// Row visited on each reel, left to right.
    pub fn rows(self) -> [usize; REELS] {
        match self {
            Payline::Top => [0; REELS],
            Payline::Middle => [1; REELS],
            Payline::Bottom => [2; REELS],
            Payline::DiagonalDown => [0, 0, 1, 2, 2],
            Payline::DiagonalUp => [2, 2, 1, 0, 0],
        }
    }
}

pub const LINES: usize = Payline::ALL.len();

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WinKind {
    Match { symbol: Symbol, count: u8 },
    RoyalSequence,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineWin {
    pub line: Payline,
    pub kind: WinKind,
    pub payout: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinOutcome {
    pub grid: Grid,
    pub wins: Vec<LineWin>,
    pub total_payout: f64,
}

fn check_stake(stake: f64) -> Result<()> {
    if stake.is_finite() && stake > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidStake(stake))
    }
}

/// Nonce offset of the draw behind cell `(reel, row)`.
pub fn cell_offset(reel: usize, row: usize) -> u64 {
    (reel * ROWS + row) as u64
}

/// Fills the grid with one draw per cell at `rng.nonce() + reel * 3 + row`.
pub fn compute_grid(rng: &ProvablyFairRng, reels: &ReelStrip) -> Result<Grid> {
    let base = rng.nonce();
    if base.checked_add(CELLS - 1).is_none() {
        return Err(EngineError::NonceOverflow {
            base,
            offset: CELLS - 1,
        });
    }
    let mut cells = [[Symbol::Cherry; ROWS]; REELS];
    for (reel, column) in cells.iter_mut().enumerate() {
        for (row, cell) in column.iter_mut().enumerate() {
            let draw = rng.with_nonce(base + cell_offset(reel, row)).draw();
            *cell = reels.sample(draw);
        }
    }
    Ok(Grid { cells })
}

/// Scores `grid` for a total `stake` split evenly across the five lines.
///
/// Every paytable symbol is counted anywhere on every line; three or more
/// pays. The Royal Sequence on the middle line pays on top of those wins.
pub fn evaluate(grid: &Grid, params: &SlotParams, stake: f64) -> Result<SpinOutcome> {
    check_stake(stake)?;
    let per_line = stake / LINES as f64;
    let mut wins = Vec::new();

    for line in Payline::ALL {
        let symbols = grid.line(line);
        let mut counts = [0u8; Symbol::COUNT];
        for s in symbols {
            counts[s.to_index() as usize] += 1;
        }
        for symbol in Symbol::ALL {
            let count = counts[symbol.to_index() as usize];
            if count < MIN_COUNT {
                continue;
            }
            let multiplier = params.paytable.multiplier(symbol, count);
            wins.push(LineWin {
                line,
                kind: WinKind::Match { symbol, count },
                payout: per_line * multiplier,
            });
        }
        if line == Payline::Middle && symbols == ROYAL_SEQUENCE {
            wins.push(LineWin {
                line,
                kind: WinKind::RoyalSequence,
                payout: per_line * params.royal_multiplier,
            });
        }
    }

    let total_payout = wins.iter().map(|w| w.payout).sum();
    Ok(SpinOutcome {
        grid: *grid,
        wins,
        total_payout,
    })
}

pub fn spin_once(rng: &ProvablyFairRng, params: &SlotParams, stake: f64) -> Result<SpinOutcome> {
    check_stake(stake)?;
    let grid = compute_grid(rng, &params.reels)?;
    let outcome = evaluate(&grid, params, stake)?;
    debug!(
        nonce_base = rng.nonce(),
        stake,
        wins = outcome.wins.len(),
        payout = outcome.total_payout,
        "slot spin"
    );
    Ok(outcome)
}

/// Convenience: perform a spin creating the RNG from seeds.
pub fn spin_with_seeds(
    server_seed: &str,
    client_seed: &str,
    nonce_base: u64,
    params: &SlotParams,
    stake: f64,
) -> Result<SpinOutcome> {
    let rng = ProvablyFairRng::from_parts(server_seed, client_seed, nonce_base)?;
    spin_once(&rng, params, stake)
}

/// Verify that a given grid matches what the RNG would produce for the seeds.
pub fn verify_grid(
    server_seed: &str,
    client_seed: &str,
    nonce_base: u64,
    reels: &ReelStrip,
    expected_indices: &[Vec<u8>],
) -> Result<bool> {
    let rng = ProvablyFairRng::from_parts(server_seed, client_seed, nonce_base)?;
    let grid = compute_grid(&rng, reels)?;
    Ok(grid.to_indices() == expected_indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::Symbol::*;

    fn royal_grid() -> Grid {
        Grid::from_reels([
            [Cherry; ROWS],
            [Banana; ROWS],
            [Orange; ROWS],
            [Grape; ROWS],
            [Strawberry; ROWS],
        ])
    }

    #[test]
    fn test_spin_deterministic() {
        let params = SlotParams::default();
        let rng = ProvablyFairRng::from_parts("server", "client", 1).unwrap();
        let out1 = spin_once(&rng, &params, 1.0).unwrap();
        let out2 = spin_once(&rng, &params, 1.0).unwrap();
        assert_eq!(out1, out2);
    }

    #[test]
    fn paylines_visit_one_cell_per_reel() {
        let grid = royal_grid();
        for line in Payline::ALL {
            assert_eq!(grid.line(line), ROYAL_SEQUENCE);
        }
        let ids: Vec<u8> = Payline::ALL.iter().map(|l| l.id()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn diagonals_cross_the_grid() {
        let grid = Grid::from_rows([
            [Seven, Seven, Cherry, Banana, Banana],
            [Bell, Bell, Seven, Bell, Bell],
            [Banana, Banana, Cherry, Seven, Seven],
        ]);
        assert_eq!(grid.line(Payline::DiagonalDown), [Seven; REELS]);
        assert_eq!(
            grid.line(Payline::DiagonalUp),
            [Banana, Banana, Seven, Banana, Banana]
        );
    }

    #[test]
    fn royal_sequence_pays_on_middle_only() {
        let params = SlotParams::default();
        let out = evaluate(&royal_grid(), &params, 5.0).unwrap();
        assert_eq!(
            out.wins,
            vec![LineWin {
                line: Payline::Middle,
                kind: WinKind::RoyalSequence,
                payout: 2000.0,
            }]
        );
        assert_eq!(out.total_payout, 2000.0);
    }

    #[test]
    fn counts_anywhere_on_the_line() {
        let params = SlotParams::default();
        let grid = Grid::from_rows([
            [Grape, Cherry, Grape, Bell, Grape],
            [Seven; REELS],
            [Bar, Bar, Bar, Bar, Cherry],
        ]);
        let out = evaluate(&grid, &params, 10.0).unwrap();
        assert_eq!(
            out.wins,
            vec![
                LineWin {
                    line: Payline::Top,
                    kind: WinKind::Match { symbol: Grape, count: 3 },
                    payout: 11.0,
                },
                LineWin {
                    line: Payline::Middle,
                    kind: WinKind::Match { symbol: Seven, count: 5 },
                    payout: 2000.0,
                },
                LineWin {
                    line: Payline::Bottom,
                    kind: WinKind::Match { symbol: Bar, count: 4 },
                    payout: 120.0,
                },
            ]
        );
        assert_eq!(out.total_payout, 2131.0);
    }

    #[test]
    fn losing_grid_pays_nothing() {
        let params = SlotParams::default();
        let grid = Grid::from_rows([
            [Cherry, Banana, Orange, Grape, Strawberry],
            [Banana, Orange, Grape, Strawberry, Bell],
            [Bell, Bar, Seven, Cherry, Banana],
        ]);
        let out = evaluate(&grid, &params, 1.0).unwrap();
        assert!(out.wins.is_empty());
        assert_eq!(out.total_payout, 0.0);
    }

    #[test]
    fn rejects_bad_stake() {
        let params = SlotParams::default();
        for stake in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                evaluate(&royal_grid(), &params, stake),
                Err(EngineError::InvalidStake(_))
            ));
        }
    }

    #[test]
    fn grid_overflowing_nonce_is_rejected() {
        let params = SlotParams::default();
        let rng = ProvablyFairRng::from_parts("s", "c", u64::MAX - 5).unwrap();
        assert!(matches!(
            spin_once(&rng, &params, 1.0),
            Err(EngineError::NonceOverflow { .. })
        ));
    }

    #[test]
    fn cells_use_reel_major_nonces() {
        let params = SlotParams::default();
        let rng = ProvablyFairRng::from_parts("server", "client", 40).unwrap();
        let grid = compute_grid(&rng, &params.reels).unwrap();
        for reel in 0..REELS {
            for row in 0..ROWS {
                let draw = rng.with_nonce(40 + cell_offset(reel, row)).draw();
                assert_eq!(grid.get(reel, row), params.reels.sample(draw));
            }
        }
    }
}
