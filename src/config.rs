//! OpusCheckers - Engine configuration
//!
//! Search settings are read once, either built directly or looked up by
//! (section, key) in a JSON settings document such as
//!
//! ```json
//! { "Bot": { "MaxDepth": 6, "BotScoringType": "NumberAndPotential",
//!            "Optimization": "O1", "NoRandom": false } }
//! ```

use crate::error::EngineError;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Settings section read by default
pub const DEFAULT_SECTION: &str = "Bot";

pub const DEFAULT_MAX_DEPTH: u32 = 4;

/// Position scoring mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringMode {
    /// Men and kings only
    #[serde(rename = "Number", alias = "material-only")]
    MaterialOnly,
    /// Material plus a bonus for advanced men
    #[default]
    #[serde(rename = "NumberAndPotential", alias = "material-plus-potential")]
    MaterialPlusPotential,
}

/// Alpha-beta pruning switch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PruningMode {
    #[default]
    #[serde(rename = "O1", alias = "O2", alias = "enabled")]
    Enabled,
    #[serde(rename = "O0", alias = "disabled")]
    Disabled,
}

impl PruningMode {
    pub fn is_enabled(self) -> bool {
        self == PruningMode::Enabled
    }
}

/// Seed of the move-order shuffle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SeedPolicy {
    /// Seed 0, reapplied at every search
    Fixed,
    /// Seeded from the clock once
    #[default]
    TimeDerived,
}

impl SeedPolicy {
    pub fn seed(self) -> u64 {
        match self {
            SeedPolicy::Fixed => 0,
            SeedPolicy::TimeDerived => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    pub fn is_fixed(self) -> bool {
        self == SeedPolicy::Fixed
    }
}

/// (section, key) lookup over a settings source
pub trait ConfigLookup {
    fn lookup(&self, section: &str, key: &str) -> Option<&Value>;
}

impl ConfigLookup for Value {
    fn lookup(&self, section: &str, key: &str) -> Option<&Value> {
        self.get(section)?.get(key)
    }
}

/// Read a JSON settings file
pub fn load_settings(path: &Path) -> Result<Value, EngineError> {
    let text = std::fs::read_to_string(path)?;
    let settings = serde_json::from_str(&text)?;
    info!("loaded settings from {}", path.display());
    Ok(settings)
}

/// Search configuration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchConfig {
    /// Maximum search depth in plies, at least 1
    pub max_depth: u32,
    pub scoring: ScoringMode,
    pub pruning: PruningMode,
    pub seed: SeedPolicy,
}

impl SearchConfig {
    pub fn new(max_depth: u32) -> Result<Self, EngineError> {
        SearchConfig::default().with_max_depth(max_depth)
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Result<Self, EngineError> {
        if max_depth == 0 {
            return Err(EngineError::InvalidDepth(0));
        }
        self.max_depth = max_depth;
        Ok(self)
    }

    pub fn with_scoring(mut self, scoring: ScoringMode) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_pruning(mut self, pruning: PruningMode) -> Self {
        self.pruning = pruning;
        self
    }

    pub fn with_seed(mut self, seed: SeedPolicy) -> Self {
        self.seed = seed;
        self
    }

    /// Build a configuration from the keys of `section`. Missing keys keep
    /// their defaults; present keys must hold valid values.
    pub fn from_lookup<L: ConfigLookup + ?Sized>(
        lookup: &L,
        section: &str,
    ) -> Result<Self, EngineError> {
        let mut config = SearchConfig::default();

        if let Some(value) = lookup.lookup(section, "MaxDepth") {
            let depth = value.as_i64().ok_or_else(|| invalid("MaxDepth", value))?;
            let depth = u32::try_from(depth).map_err(|_| EngineError::InvalidDepth(depth))?;
            config = config.with_max_depth(depth)?;
        }

        if let Some(value) = lookup.lookup(section, "BotScoringType") {
            config.scoring = serde_json::from_value(value.clone())
                .map_err(|_| invalid("BotScoringType", value))?;
        }

        if let Some(value) = lookup.lookup(section, "Optimization") {
            config.pruning = serde_json::from_value(value.clone())
                .map_err(|_| invalid("Optimization", value))?;
        }

        if let Some(value) = lookup.lookup(section, "NoRandom") {
            let fixed = value.as_bool().ok_or_else(|| invalid("NoRandom", value))?;
            config.seed = if fixed { SeedPolicy::Fixed } else { SeedPolicy::TimeDerived };
        }

        Ok(config)
    }
}

fn invalid(key: &str, value: &Value) -> EngineError {
    EngineError::InvalidOption { key: key.to_string(), value: value.to_string() }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_depth: DEFAULT_MAX_DEPTH,
            scoring: ScoringMode::default(),
            pruning: PruningMode::default(),
            seed: SeedPolicy::default(),
        }
    }
}
