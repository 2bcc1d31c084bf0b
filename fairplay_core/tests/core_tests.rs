use fairplay_core::{
    engine::{REELS, ROWS},
    simulate_crash, simulate_slot, spin_with_seeds, theoretical_slot_rtp, uniformity_ks,
    verify_grid, CrashConfig, Grid, LineWin, Payline, ProvablyFairRng, SeedTriple, SlotParams,
    Symbol, WinKind,
};
use proptest::prelude::*;

#[test]
fn rng_repeatable() {
    let rng1 = ProvablyFairRng::from_parts("s", "c", 42).unwrap();
    let rng2 = ProvablyFairRng::from_parts("s", "c", 42).unwrap();
    assert_eq!(rng1.draws(10).unwrap(), rng2.draws(10).unwrap());
}

#[test]
fn draws_are_uniform() {
    let n = 100_000;
    let d = uniformity_ks("fairness-server-seed", "fairness-client-seed", n).unwrap();
    // alpha = 0.01
    let critical = 1.63 / (n as f64).sqrt();
    assert!(d < critical, "KS D = {d}, critical = {critical}");
}

#[test]
fn crash_ev_matches_alpha() {
    let config = CrashConfig::new(0.96, 20.0).unwrap();
    let n = 200_000;
    for cashout in [1.5, 2.0, 5.0, 10.0, 20.0] {
        let report = simulate_crash(&config, "crash-server-seed", "crash-client-seed", n, cashout)
            .unwrap();
        let p = 0.96 / cashout;
        let se = cashout * (p * (1.0 - p) / n as f64).sqrt();
        assert!(
            (report.mean_return - 0.96).abs() < 3.0 * se,
            "cashout {cashout}: ev {} se {se}",
            report.mean_return
        );
        assert!((report.hit_rate - p).abs() < 3.0 * (p * (1.0 - p) / n as f64).sqrt());
    }
}

#[test]
fn instant_bust_rate_is_one_minus_alpha() {
    let config = CrashConfig::new(0.96, 20.0).unwrap();
    let n = 200_000;
    let report = simulate_crash(&config, "crash-server-seed", "crash-client-seed", n, 2.0).unwrap();
    let se = (0.04 * 0.96 / n as f64).sqrt();
    assert!((report.bust_rate - 0.04).abs() < 3.0 * se, "bust rate {}", report.bust_rate);
}

/// Settling against the clamped multiplier is wrong: above the cap nothing
/// ever wins, and at 1.00x instant busts would be paid out.
#[test]
fn display_multiplier_must_not_settle_bets() {
    let config = CrashConfig::new(0.96, 20.0).unwrap();
    let rng = ProvablyFairRng::from_parts("crash-server-seed", "crash-client-seed", 0).unwrap();
    let n = 200_000u64;

    for cashout in [25.0, 1.0] {
        let (mut by_raw, mut by_display) = (0.0, 0.0);
        for nonce in 0..n {
            let out = config.outcome_from_draw(rng.with_nonce(nonce).draw());
            by_raw += out.payout(1.0, cashout).unwrap();
            if out.display_multiplier >= cashout {
                by_display += cashout;
            }
        }
        let (ev_raw, ev_display) = (by_raw / n as f64, by_display / n as f64);
        let p = 0.96 / cashout;
        let se = cashout * (p * (1.0 - p) / n as f64).sqrt();
        assert!((ev_raw - 0.96).abs() < 3.0 * se, "raw ev {ev_raw} at {cashout}");
        assert!(
            (ev_display - 0.96).abs() > 10.0 * se.max(1e-3),
            "display ev {ev_display} at {cashout} should break the RTP"
        );
    }
}

#[test]
fn royal_grid_reports_royal_win() {
    let grid = Grid::from_reels([
        [Symbol::Cherry; ROWS],
        [Symbol::Banana; ROWS],
        [Symbol::Orange; ROWS],
        [Symbol::Grape; ROWS],
        [Symbol::Strawberry; ROWS],
    ]);
    let out = fairplay_core::evaluate(&grid, &SlotParams::default(), 1.0).unwrap();
    assert_eq!(out.wins.len(), 1);
    assert_eq!(out.wins[0].line, Payline::Middle);
    assert_eq!(out.wins[0].kind, WinKind::RoyalSequence);
    assert_eq!(out.total_payout, 400.0);
}

#[test]
fn golden_spins() {
    let params = SlotParams::default();
    use fairplay_core::Symbol::*;

    let out = spin_with_seeds("server", "client", 0, &params, 5.0).unwrap();
    assert_eq!(
        out.grid,
        Grid::from_rows([
            [Orange, Bar, Banana, Orange, Banana],
            [Banana, Banana, Cherry, Orange, Cherry],
            [Cherry, Strawberry, Banana, Grape, Orange],
        ])
    );
    assert!(out.wins.is_empty());

    let out = spin_with_seeds("server", "client", 15, &params, 5.0).unwrap();
    assert_eq!(
        out.wins,
        vec![
            LineWin {
                line: Payline::Top,
                kind: WinKind::Match {
                    symbol: Grape,
                    count: 3
                },
                payout: 5.5,
            },
            LineWin {
                line: Payline::Bottom,
                kind: WinKind::Match {
                    symbol: Cherry,
                    count: 3
                },
                payout: 2.5,
            },
        ]
    );
    assert_eq!(out.total_payout, 8.0);
    assert!(verify_grid("server", "client", 15, &params.reels, &out.grid.to_indices()).unwrap());
    assert!(!verify_grid("server", "client", 16, &params.reels, &out.grid.to_indices()).unwrap());
}

#[test]
fn slot_rtp_converges() {
    let params = SlotParams::default();
    let expected = theoretical_slot_rtp(&params);
    assert!((expected - 0.96).abs() < 0.005);
    let report = simulate_slot(&params, "slot-server-seed", "slot-client-seed", 100_000).unwrap();
    assert_eq!(report.rounds, 100_000);
    assert!(
        report.z_score(expected).abs() < 4.0,
        "simulated {} vs {expected} (se {})",
        report.mean_return,
        report.std_error
    );
}

proptest! {
    #[test]
    fn draws_stay_in_unit_interval(server in "[a-z0-9]{1,32}", client in ".{0,32}", nonce in any::<u64>()) {
        let rng = ProvablyFairRng::from_parts(server, client, nonce).unwrap();
        let r = rng.draw();
        prop_assert!((0.0..1.0).contains(&r));
        prop_assert_eq!(rng.draw_bits() >> 52, 0);
    }

    #[test]
    fn crash_display_is_cosmetic(r in 0.0f64..1.0, alpha in 0.01f64..=1.0, cap in 1.0f64..1000.0) {
        let config = CrashConfig::new(alpha, cap).unwrap();
        let out = config.outcome_from_draw(r);
        prop_assert!(out.raw_multiplier.is_finite());
        prop_assert!(out.display_multiplier >= 1.0 && out.display_multiplier <= cap);
        prop_assert_eq!(out.instant_bust, out.raw_multiplier < 1.0);
        if !out.instant_bust && out.raw_multiplier <= cap {
            prop_assert_eq!(out.display_multiplier, out.raw_multiplier);
        }
        prop_assert!(out.raw_multiplier >= alpha);
    }

    #[test]
    fn slot_payout_is_sum_of_wins(nonce in 0u64..1_000_000, stake in 0.01f64..1000.0) {
        let params = SlotParams::default();
        let out = spin_with_seeds("prop-server", "prop-client", nonce, &params, stake).unwrap();
        let sum: f64 = out.wins.iter().map(|w| w.payout).sum();
        prop_assert!((sum - out.total_payout).abs() <= 1e-9 * out.total_payout.max(1.0));
        for w in &out.wins {
            prop_assert!(w.payout > 0.0);
            if let WinKind::Match { symbol, count } = w.kind {
                let on_line = out.grid.line(w.line).iter().filter(|&&s| s == symbol).count();
                prop_assert_eq!(on_line, count as usize);
            }
        }
        prop_assert_eq!(out.grid.to_indices().len(), ROWS);
        prop_assert_eq!(out.grid.to_indices()[0].len(), REELS);
    }

    #[test]
    fn seed_triple_parse_matches_new(nonce in any::<u64>()) {
        let parsed = SeedTriple::parse("srv", "cli", &nonce.to_string()).unwrap();
        prop_assert_eq!(parsed, SeedTriple::new("srv", "cli", nonce).unwrap());
    }
}
