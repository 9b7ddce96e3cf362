//! Persona Registry
//!
//! Closed set of companion personas with stable persisted integer codes,
//! plus the immutable definition table (display name, unlock level, bonus
//! type). Definitions are fixed at compile time and never mutated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Companion persona identifier.
///
/// Each variant carries a stable integer code used for persistence. Codes
/// must never be reused or renumbered; save files written by old versions
/// decode through [`PersonaId::from_code`], which maps unknown codes to the
/// default persona instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", from = "u32")]
pub enum PersonaId {
    /// Lumi - the original companion (legacy saves migrate onto her)
    Lumi,
    /// Rosette - rewards running with the pink filter up
    Rosette,
    /// Nyx - rewards autonomy-triggered interactions
    Nyx,
    /// Vesta - strict-mode disciplinarian
    Vesta,
    /// Umbra - passively drains the player's XP pool while active
    Umbra,
}

impl PersonaId {
    /// All persona ids, in code order
    pub const ALL: [PersonaId; 5] = [
        PersonaId::Lumi,
        PersonaId::Rosette,
        PersonaId::Nyx,
        PersonaId::Vesta,
        PersonaId::Umbra,
    ];

    /// Stable integer code used in save data
    #[must_use]
    pub const fn code(&self) -> u32 {
        match self {
            Self::Lumi => 0,
            Self::Rosette => 1,
            Self::Nyx => 2,
            Self::Vesta => 3,
            Self::Umbra => 4,
        }
    }

    /// Decode a persisted integer code.
    ///
    /// Total over `u32`: codes written by a newer (or corrupted) save
    /// resolve to [`PersonaId::Lumi`] rather than failing the load.
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Lumi,
            1 => Self::Rosette,
            2 => Self::Nyx,
            3 => Self::Vesta,
            4 => Self::Umbra,
            _ => Self::Lumi,
        }
    }
}

impl From<PersonaId> for u32 {
    fn from(id: PersonaId) -> Self {
        id.code()
    }
}

impl From<u32> for PersonaId {
    fn from(code: u32) -> Self {
        Self::from_code(code)
    }
}

impl Default for PersonaId {
    fn default() -> Self {
        Self::Lumi
    }
}

impl fmt::Display for PersonaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.definition().display_name)
    }
}

/// XP-modifier category associated with a persona
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusType {
    /// Multiplier scales with the pink filter opacity
    PinkFilter,
    /// Bonus for autonomy-triggered interactions
    Autonomy,
    /// Strict mode gates the multiplier (0.5 / 1.0 / 2.0)
    StrictMode,
    /// No gain bonus; drains the global XP pool while active
    XpDrain,
    /// No modifier
    None,
}

/// Immutable persona definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonaDefinition {
    /// Display name shown in the UI
    pub display_name: &'static str,
    /// Minimum global player level required to switch to this persona
    pub required_unlock_level: u32,
    /// XP-modifier category
    pub bonus_type: BonusType,
}

impl PersonaId {
    /// Look up the static definition for this persona.
    #[must_use]
    pub const fn definition(&self) -> &'static PersonaDefinition {
        match self {
            Self::Lumi => &PersonaDefinition {
                display_name: "Lumi",
                required_unlock_level: 1,
                bonus_type: BonusType::None,
            },
            Self::Rosette => &PersonaDefinition {
                display_name: "Rosette",
                required_unlock_level: 5,
                bonus_type: BonusType::PinkFilter,
            },
            Self::Nyx => &PersonaDefinition {
                display_name: "Nyx",
                required_unlock_level: 10,
                bonus_type: BonusType::Autonomy,
            },
            Self::Vesta => &PersonaDefinition {
                display_name: "Vesta",
                required_unlock_level: 15,
                bonus_type: BonusType::StrictMode,
            },
            Self::Umbra => &PersonaDefinition {
                display_name: "Umbra",
                required_unlock_level: 20,
                bonus_type: BonusType::XpDrain,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(PersonaId::Lumi.code(), 0);
        assert_eq!(PersonaId::Rosette.code(), 1);
        assert_eq!(PersonaId::Nyx.code(), 2);
        assert_eq!(PersonaId::Vesta.code(), 3);
        assert_eq!(PersonaId::Umbra.code(), 4);
    }

    #[test]
    fn test_code_round_trip() {
        for id in PersonaId::ALL {
            assert_eq!(PersonaId::from_code(id.code()), id);
        }
    }

    #[test]
    fn test_unknown_code_falls_back_to_default() {
        assert_eq!(PersonaId::from_code(99), PersonaId::Lumi);
        assert_eq!(PersonaId::from_code(u32::MAX), PersonaId::Lumi);
    }

    #[test]
    fn test_serializes_as_integer_code() {
        let json = serde_json::to_string(&PersonaId::Umbra).unwrap();
        assert_eq!(json, "4");

        let id: PersonaId = serde_json::from_str("2").unwrap();
        assert_eq!(id, PersonaId::Nyx);

        // Unknown codes deserialize to the default persona
        let id: PersonaId = serde_json::from_str("1234").unwrap();
        assert_eq!(id, PersonaId::Lumi);
    }

    #[test]
    fn test_definition_lookup_is_total() {
        for id in PersonaId::ALL {
            let def = id.definition();
            assert!(!def.display_name.is_empty());
            assert!(def.required_unlock_level >= 1);
        }
    }

    #[test]
    fn test_bonus_types() {
        assert_eq!(PersonaId::Lumi.definition().bonus_type, BonusType::None);
        assert_eq!(
            PersonaId::Rosette.definition().bonus_type,
            BonusType::PinkFilter
        );
        assert_eq!(PersonaId::Nyx.definition().bonus_type, BonusType::Autonomy);
        assert_eq!(
            PersonaId::Vesta.definition().bonus_type,
            BonusType::StrictMode
        );
        assert_eq!(PersonaId::Umbra.definition().bonus_type, BonusType::XpDrain);
    }

    #[test]
    fn test_display_uses_display_name() {
        assert_eq!(format!("{}", PersonaId::Rosette), "Rosette");
    }
}
