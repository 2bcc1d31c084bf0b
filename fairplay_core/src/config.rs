//! Engine configuration.
//!
//! Everything is validated once, when the configuration is turned into
//! [`EngineParams`]; round functions never see an unchecked table.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    analysis::theoretical_slot_rtp,
    crash::CrashConfig,
    engine::{SlotParams, DEFAULT_ROYAL_MULTIPLIER},
    error::{EngineError, Result},
    paytable::{Paytable, PaytableEntry},
    symbols::{ReelStrip, ReelWeight},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashSettings {
    pub alpha: f64,
    pub cap: f64,
}

impl Default for CrashSettings {
    fn default() -> Self {
        Self {
            alpha: CrashConfig::DEFAULT_ALPHA,
            cap: CrashConfig::DEFAULT_CAP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotSettings {
    pub target_rtp: f64,
    /// Allowed gap between `target_rtp` and the RTP implied by the tables.
    pub rtp_tolerance: f64,
    pub reel_strip: Vec<ReelWeight>,
    pub paytable: Vec<PaytableEntry>,
    pub royal_multiplier: f64,
}

impl Default for SlotSettings {
    fn default() -> Self {
        Self {
            target_rtp: 0.96,
            rtp_tolerance: 0.005,
            reel_strip: ReelStrip::default_strip().weights().to_vec(),
            paytable: Paytable::simple_default().entries(),
            royal_multiplier: DEFAULT_ROYAL_MULTIPLIER,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub crash: CrashSettings,
    pub slot: SlotSettings,
}

/// Validated parameters for both games.
#[derive(Debug, Clone)]
pub struct EngineParams {
    pub crash: CrashConfig,
    pub slot: SlotParams,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::ConfigParse(e.to_string()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EngineError::ConfigIo(format!("{}: {e}", path.display())))?;
        let config = Self::from_json_str(&raw)?;
        info!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::ConfigParse(e.to_string()))
    }

    pub fn into_params(self) -> Result<EngineParams> {
        let crash = CrashConfig::new(self.crash.alpha, self.crash.cap)?;
        let slot = self.slot.into_params()?;
        Ok(EngineParams { crash, slot })
    }
}

impl SlotSettings {
    pub fn into_params(self) -> Result<SlotParams> {
        if !(self.target_rtp > 0.0 && self.target_rtp <= 1.0) {
            return Err(EngineError::InvalidRtp(self.target_rtp));
        }
        if !(self.rtp_tolerance.is_finite() && self.rtp_tolerance >= 0.0) {
            return Err(EngineError::InvalidTolerance(self.rtp_tolerance));
        }
        let reels = ReelStrip::new(self.reel_strip)?;
        let paytable = Paytable::from_entries(&self.paytable)?;
        if !(self.royal_multiplier.is_finite() && self.royal_multiplier >= 0.0) {
            return Err(EngineError::InvalidRoyalMultiplier(self.royal_multiplier));
        }
        let params = SlotParams {
            reels,
            paytable,
            royal_multiplier: self.royal_multiplier,
            rtp_target: self.target_rtp,
        };
        let computed = theoretical_slot_rtp(&params);
        if (computed - self.target_rtp).abs() > self.rtp_tolerance {
            return Err(EngineError::RtpMismatch {
                target: self.target_rtp,
                computed,
                tolerance: self.rtp_tolerance,
            });
        }
        info!(target_rtp = self.target_rtp, computed, "slot configuration accepted");
        Ok(params)
    }
}
