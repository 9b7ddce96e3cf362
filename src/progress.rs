//! Per-Persona Progress Records
//!
//! One mutable [`PersonaProgress`] exists per persona once touched. Records
//! are owned by [`crate::settings::CompanionSettings`] and created lazily on
//! first access; the engine mutates them in place and persists after every
//! mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mutable progression record for a single persona
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaProgress {
    /// Current level, always >= 1
    pub level: u32,
    /// XP accumulated toward the next level
    pub current_xp: f64,
    /// Lifetime XP earned across all levels
    pub total_xp_earned: f64,
    /// Cumulative seconds this persona has been the active one
    pub total_active_secs: u64,
    /// When this persona was first made active, if ever
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_activated: Option<DateTime<Utc>>,
}

impl PersonaProgress {
    /// Create a fresh level-1 record
    #[must_use]
    pub fn new() -> Self {
        Self {
            level: 1,
            current_xp: 0.0,
            total_xp_earned: 0.0,
            total_active_secs: 0,
            first_activated: None,
        }
    }

    /// Whether this record has reached the configured level cap
    #[must_use]
    pub fn is_max_level(&self, max_level: u32) -> bool {
        self.level >= max_level
    }
}

impl Default for PersonaProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_starts_at_level_one() {
        let progress = PersonaProgress::new();
        assert_eq!(progress.level, 1);
        assert_eq!(progress.current_xp, 0.0);
        assert_eq!(progress.total_xp_earned, 0.0);
        assert_eq!(progress.total_active_secs, 0);
        assert!(progress.first_activated.is_none());
    }

    #[test]
    fn test_is_max_level() {
        let mut progress = PersonaProgress::new();
        assert!(!progress.is_max_level(50));

        progress.level = 50;
        assert!(progress.is_max_level(50));

        // Levels beyond the cap still count as maxed
        progress.level = 51;
        assert!(progress.is_max_level(50));
    }

    #[test]
    fn test_serde_round_trip() {
        let mut progress = PersonaProgress::new();
        progress.level = 7;
        progress.current_xp = 42.5;
        progress.total_xp_earned = 1234.0;
        progress.total_active_secs = 3600;
        progress.first_activated = Some(Utc::now());

        let json = serde_json::to_string(&progress).unwrap();
        let loaded: PersonaProgress = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, progress);
    }

    #[test]
    fn test_first_activated_omitted_when_none() {
        let progress = PersonaProgress::new();
        let json = serde_json::to_string(&progress).unwrap();
        assert!(!json.contains("first_activated"));
    }
}
