//! Provably-fair draws.
//!
//! A draw is reproducible by anyone holding the revealed server seed:
//!
//! 1. `mac = HMAC-SHA256(key = server_seed, message = "{client_seed}:{nonce}")`,
//!    nonce written in base 10;
//! 2. take the first 13 lowercase hex characters of `mac` (52 bits) as an
//!    unsigned integer `h`;
//! 3. `r = h / 2^52`, which is exact in an `f64` and lies in `[0, 1)`.
//!
//! Before play the operator publishes `SHA-256(server_seed)` as a commitment;
//! [`verify_commitment`] checks a revealed seed against it.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::{EngineError, Result};

pub type HmacSha256 = Hmac<Sha256>;

/// Bits of the digest used for one draw.
pub const DRAW_BITS: u32 = 52;
const DRAW_HEX_CHARS: usize = (DRAW_BITS / 4) as usize;
const DRAW_SCALE: f64 = (1u64 << DRAW_BITS) as f64;

pub fn derive_hash_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hex::encode(hasher.finalize())
}

/// Checks a revealed server seed against its pre-published SHA-256 commitment.
pub fn verify_commitment(server_seed: &str, commitment_hex: &str) -> bool {
    derive_hash_hex(server_seed.as_bytes()).eq_ignore_ascii_case(commitment_hex.trim())
}

/// Maps the 52-bit prefix of a draw into `[0, 1)`.
pub fn bits_to_unit(bits: u64) -> f64 {
    (bits & ((1u64 << DRAW_BITS) - 1)) as f64 / DRAW_SCALE
}

/// The complete input of one round.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeedTriple {
    pub server_seed: String,
    pub client_seed: String,
    pub nonce: u64,
}

impl SeedTriple {
    pub fn new(
        server_seed: impl Into<String>,
        client_seed: impl Into<String>,
        nonce: u64,
    ) -> Result<Self> {
        let server_seed = server_seed.into();
        if server_seed.is_empty() {
            warn!("rejected round with empty server seed");
            return Err(EngineError::EmptyServerSeed);
        }
        Ok(Self {
            server_seed,
            client_seed: client_seed.into(),
            nonce,
        })
    }

    /// Builds a triple from a textual nonce, as received from a caller.
    pub fn parse(
        server_seed: impl Into<String>,
        client_seed: impl Into<String>,
        nonce: &str,
    ) -> Result<Self> {
        let trimmed = nonce.trim();
        let parsed = if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            trimmed.parse::<u64>().ok()
        } else {
            None
        };
        match parsed {
            Some(n) => Self::new(server_seed, client_seed, n),
            None => {
                warn!(nonce, "rejected round with malformed nonce");
                Err(EngineError::InvalidNonce(nonce.to_string()))
            }
        }
    }

    /// Same seed pair, `offset` rounds further along.
    pub fn offset(&self, offset: u64) -> Result<Self> {
        let nonce = self
            .nonce
            .checked_add(offset)
            .ok_or(EngineError::NonceOverflow {
                base: self.nonce,
                offset,
            })?;
        Ok(Self {
            nonce,
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProvablyFairRng {
    seeds: SeedTriple,
}

impl ProvablyFairRng {
    pub fn new(seeds: SeedTriple) -> Self {
        Self { seeds }
    }

    pub fn from_parts(
        server_seed: impl Into<String>,
        client_seed: impl Into<String>,
        nonce: u64,
    ) -> Result<Self> {
        SeedTriple::new(server_seed, client_seed, nonce).map(Self::new)
    }

    pub fn seeds(&self) -> &SeedTriple {
        &self.seeds
    }

    pub fn nonce(&self) -> u64 {
        self.seeds.nonce
    }

    pub fn with_nonce(&self, nonce: u64) -> Self {
        Self {
            seeds: SeedTriple {
                nonce,
                ..self.seeds.clone()
            },
        }
    }

    pub fn server_seed_hash_hex(&self) -> String {
        derive_hash_hex(self.seeds.server_seed.as_bytes())
    }

    pub fn hmac_bytes(&self) -> [u8; 32] {
        let mut mac = match HmacSha256::new_from_slice(self.seeds.server_seed.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC-SHA256 takes keys of any size"),
        };
        let msg = format!("{}:{}", self.seeds.client_seed, self.seeds.nonce);
        mac.update(msg.as_bytes());
        let res = mac.finalize().into_bytes();
        let mut out = [0u8; 32];
        out.copy_from_slice(&res);
        out
    }

    pub fn hmac_hex(&self) -> String {
        hex::encode(self.hmac_bytes())
    }

    /// The 52-bit integer behind [`Self::draw`]: the first 13 hex digits of the digest.
    pub fn draw_bits(&self) -> u64 {
        let bytes = self.hmac_bytes();
        let mut prefix = [0u8; 8];
        prefix[1..].copy_from_slice(&bytes[..7]);
        // 7 bytes hold 14 hex digits; drop the last one.
        u64::from_be_bytes(prefix) >> (56 - DRAW_HEX_CHARS * 4)
    }

    pub fn draw(&self) -> f64 {
        bits_to_unit(self.draw_bits())
    }

    /// `count` draws at consecutive nonces starting from this one.
    pub fn draws(&self, count: u64) -> Result<Vec<f64>> {
        (0..count)
            .map(|i| self.seeds.offset(i).map(|s| Self::new(s).draw()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let rng1 = ProvablyFairRng::from_parts("server", "client", 1).unwrap();
        let rng2 = ProvablyFairRng::from_parts("server", "client", 1).unwrap();
        assert_eq!(rng1.server_seed_hash_hex(), rng2.server_seed_hash_hex());
        assert_eq!(rng1.hmac_bytes(), rng2.hmac_bytes());
        assert_eq!(rng1.draw().to_bits(), rng2.draw().to_bits());
        assert_eq!(rng1.draws(5).unwrap(), rng2.draws(5).unwrap());
    }

    #[test]
    fn golden_vector() {
        let rng = ProvablyFairRng::from_parts("server", "client", 1).unwrap();
        assert_eq!(
            rng.hmac_hex(),
            "50042145df160f2c8a6d2b12dbdbb748295502e9cf687b0e0fe08db72995c50d"
        );
        assert_eq!(rng.draw_bits(), 0x50042145df160);
        assert_eq!(rng.draw(), 0x50042145df160_u64 as f64 / 4503599627370496.0);
        assert_eq!(
            rng.server_seed_hash_hex(),
            "b3eacd33433b31b5252351032c9b3e7a2e7aa7738d5decdf0dd6c62680853c06"
        );
    }

    #[test]
    fn draw_bits_match_hex_prefix() {
        for nonce in 0..50 {
            let rng = ProvablyFairRng::from_parts("audit", "player", nonce).unwrap();
            let expected = u64::from_str_radix(&rng.hmac_hex()[..13], 16).unwrap();
            assert_eq!(rng.draw_bits(), expected);
            assert!((0.0..1.0).contains(&rng.draw()));
        }
    }

    #[test]
    fn nonce_changes_draw() {
        let rng = ProvablyFairRng::from_parts("server", "client", 0).unwrap();
        assert_ne!(rng.draw_bits(), rng.with_nonce(1).draw_bits());
        assert_eq!(rng.with_nonce(1).draw_bits(), 0x50042145df160);
    }

    #[test]
    fn rejects_empty_server_seed() {
        assert_eq!(
            SeedTriple::new("", "client", 0),
            Err(EngineError::EmptyServerSeed)
        );
    }

    #[test]
    fn parses_textual_nonce() {
        let seeds = SeedTriple::parse("s", "c", " 42 ").unwrap();
        assert_eq!(seeds.nonce, 42);
        for bad in ["", "-1", "4x", "1.5", "+3", "99999999999999999999"] {
            assert_eq!(
                SeedTriple::parse("s", "c", bad),
                Err(EngineError::InvalidNonce(bad.to_string()))
            );
        }
    }

    #[test]
    fn offset_overflow() {
        let seeds = SeedTriple::new("s", "c", u64::MAX).unwrap();
        assert!(matches!(
            seeds.offset(1),
            Err(EngineError::NonceOverflow { .. })
        ));
        assert_eq!(seeds.offset(0).unwrap().nonce, u64::MAX);
    }

    #[test]
    fn commitment_round_trip() {
        let commitment = derive_hash_hex(b"server");
        assert!(verify_commitment("server", &commitment));
        assert!(verify_commitment("server", &commitment.to_uppercase()));
        assert!(!verify_commitment("other", &commitment));
    }
}
