//! Progression Configuration
//!
//! Tunable knobs for the progression engine: the level curve, the level cap,
//! timer cadences, the passive drain amount and the attention-check penalty.
//! All fields have serde defaults so a partial config file loads cleanly.

use serde::{Deserialize, Serialize};

/// XP required to advance from a given level to the next.
///
/// The curve is expected to be monotonically non-decreasing in `level`; the
/// level-up loop in the engine relies on that to terminate. It is supplied
/// as configuration because the exact shape is a game-design decision, not
/// an engine invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelCurve {
    /// `base + per_level * (level - 1)`
    Linear {
        /// XP required at level 1
        base: f64,
        /// Additional XP required per level gained
        per_level: f64,
    },
    /// Explicit per-level thresholds; levels past the end reuse the last
    /// entry. An empty table is treated as unreachable (no level-ups).
    Table(Vec<f64>),
}

impl LevelCurve {
    /// XP needed to go from `level` to `level + 1`.
    #[must_use]
    pub fn xp_for_next_level(&self, level: u32) -> f64 {
        match self {
            Self::Linear { base, per_level } => base + per_level * f64::from(level.saturating_sub(1)),
            Self::Table(thresholds) => {
                let index = (level.saturating_sub(1)) as usize;
                thresholds
                    .get(index.min(thresholds.len().saturating_sub(1)))
                    .copied()
                    .unwrap_or(f64::INFINITY)
            }
        }
    }
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self::Linear {
            base: 100.0,
            per_level: 25.0,
        }
    }
}

/// Progression engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Level cap; awards to a persona at or above this level are no-ops
    #[serde(default = "default_max_level")]
    pub max_level: u32,
    /// XP curve for level-ups
    #[serde(default)]
    pub level_curve: LevelCurve,
    /// Passive drain tick cadence in seconds
    #[serde(default = "default_drain_interval_secs")]
    pub drain_interval_secs: u64,
    /// XP removed from the global player pool per drain tick
    #[serde(default = "default_drain_per_tick")]
    pub drain_per_tick: f64,
    /// Active-time accrual cadence in seconds
    #[serde(default = "default_active_time_interval_secs")]
    pub active_time_interval_secs: u64,
    /// XP subtracted from `current_xp` on a failed attention check
    #[serde(default = "default_attention_penalty")]
    pub attention_penalty: f64,
    /// Maximum level-ups processed by a single `add_xp` call
    #[serde(default = "default_level_up_cap")]
    pub level_up_cap: u32,
}

fn default_max_level() -> u32 {
    50
}

fn default_drain_interval_secs() -> u64 {
    1
}

fn default_drain_per_tick() -> f64 {
    1.0
}

fn default_active_time_interval_secs() -> u64 {
    60
}

fn default_attention_penalty() -> f64 {
    25.0
}

fn default_level_up_cap() -> u32 {
    20
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            max_level: default_max_level(),
            level_curve: LevelCurve::default(),
            drain_interval_secs: default_drain_interval_secs(),
            drain_per_tick: default_drain_per_tick(),
            active_time_interval_secs: default_active_time_interval_secs(),
            attention_penalty: default_attention_penalty(),
            level_up_cap: default_level_up_cap(),
        }
    }
}

impl ProgressionConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the level cap
    #[must_use]
    pub fn with_max_level(mut self, max_level: u32) -> Self {
        self.max_level = max_level;
        self
    }

    /// Set the level curve
    #[must_use]
    pub fn with_level_curve(mut self, curve: LevelCurve) -> Self {
        self.level_curve = curve;
        self
    }

    /// Set the per-tick drain amount
    #[must_use]
    pub fn with_drain_per_tick(mut self, amount: f64) -> Self {
        self.drain_per_tick = amount;
        self
    }

    /// Set the attention-check penalty
    #[must_use]
    pub fn with_attention_penalty(mut self, penalty: f64) -> Self {
        self.attention_penalty = penalty;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_curve() {
        let curve = LevelCurve::default();
        assert_eq!(curve.xp_for_next_level(1), 100.0);
        assert_eq!(curve.xp_for_next_level(2), 125.0);
        assert_eq!(curve.xp_for_next_level(5), 200.0);
    }

    #[test]
    fn test_linear_curve_is_non_decreasing() {
        let curve = LevelCurve::default();
        let mut prev = 0.0;
        for level in 1..=100 {
            let next = curve.xp_for_next_level(level);
            assert!(next >= prev, "curve decreased at level {}", level);
            prev = next;
        }
    }

    #[test]
    fn test_table_curve() {
        let curve = LevelCurve::Table(vec![10.0, 20.0, 30.0]);
        assert_eq!(curve.xp_for_next_level(1), 10.0);
        assert_eq!(curve.xp_for_next_level(2), 20.0);
        assert_eq!(curve.xp_for_next_level(3), 30.0);
        // Past the end: last entry repeats
        assert_eq!(curve.xp_for_next_level(10), 30.0);
    }

    #[test]
    fn test_empty_table_never_levels() {
        let curve = LevelCurve::Table(Vec::new());
        assert_eq!(curve.xp_for_next_level(1), f64::INFINITY);
    }

    #[test]
    fn test_default_config() {
        let config = ProgressionConfig::default();
        assert_eq!(config.max_level, 50);
        assert_eq!(config.drain_interval_secs, 1);
        assert_eq!(config.active_time_interval_secs, 60);
        assert_eq!(config.attention_penalty, 25.0);
        assert_eq!(config.level_up_cap, 20);
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: ProgressionConfig = serde_json::from_str(r#"{"max_level": 10}"#).unwrap();
        assert_eq!(config.max_level, 10);
        assert_eq!(config.drain_per_tick, 1.0);
        assert_eq!(config.level_curve, LevelCurve::default());
    }

    #[test]
    fn test_builder_style_setters() {
        let config = ProgressionConfig::new()
            .with_max_level(5)
            .with_drain_per_tick(3.0)
            .with_attention_penalty(10.0);
        assert_eq!(config.max_level, 5);
        assert_eq!(config.drain_per_tick, 3.0);
        assert_eq!(config.attention_penalty, 10.0);
    }
}
