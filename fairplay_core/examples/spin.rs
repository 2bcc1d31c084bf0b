use fairplay_core::{spin_with_seeds, CrashConfig, ProvablyFairRng, SeedTriple, SlotParams};

fn main() -> fairplay_core::Result<()> {
    // Example end-to-end rounds
    let server_seed = "example-server-seed";
    let client_seed = "example-client-seed";
    let nonce = 1u64;

    let seeds = SeedTriple::new(server_seed, client_seed, nonce)?;
    let rng = ProvablyFairRng::new(seeds.clone());
    let crash = CrashConfig::default().play(&seeds);
    println!(
        "server_seed_hash={} r={} crash={:?}",
        rng.server_seed_hash_hex(),
        rng.draw(),
        crash
    );

    let outcome = spin_with_seeds(server_seed, client_seed, nonce, &SlotParams::default(), 1.0)?;
    for row in 0..fairplay_core::engine::ROWS {
        let line: Vec<String> = outcome.grid.row(row).iter().map(|s| s.to_string()).collect();
        println!("{}", line.join(" "));
    }
    println!("wins={:?} payout={}", outcome.wins, outcome.total_payout);
    Ok(())
}
