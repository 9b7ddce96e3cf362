//! XP Modifier Calculation
//!
//! Pure mapping from (source, context, bonus type) to a multiplier. No side
//! effects and no access to live state: the context is a snapshot taken at
//! the moment the award is made.

use crate::persona::BonusType;
use serde::{Deserialize, Serialize};

/// Maximum pink filter opacity accepted by [`XpContext`]
pub const MAX_PINK_FILTER_OPACITY: f64 = 50.0;

/// What triggered an XP award
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpSource {
    /// Direct user interaction (typing, clicking)
    Interaction,
    /// The companion acted on its own
    Autonomy,
    /// A passed attention check
    AttentionCheck,
    /// Explicit grant (debug console, scripted reward)
    Manual,
}

/// Snapshot of the application state relevant to modifier calculation.
///
/// Constructed fresh per award and discarded afterwards; never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XpContext {
    /// The award was triggered by the companion's autonomy loop
    pub triggered_by_autonomy: bool,
    /// Strict mode is locked on
    pub strict_mode: bool,
    /// The panic key is disabled (no-escape mode)
    pub no_escape_mode: bool,
    /// Attention checks are enabled
    pub attention_checks_enabled: bool,
    /// Pink filter opacity, clamped to `[0, 50]`
    pub pink_filter_opacity: f64,
}

impl XpContext {
    /// Create a context, clamping the opacity into its valid range.
    #[must_use]
    pub fn new(
        triggered_by_autonomy: bool,
        strict_mode: bool,
        no_escape_mode: bool,
        attention_checks_enabled: bool,
        pink_filter_opacity: f64,
    ) -> Self {
        Self {
            triggered_by_autonomy,
            strict_mode,
            no_escape_mode,
            attention_checks_enabled,
            pink_filter_opacity: pink_filter_opacity.clamp(0.0, MAX_PINK_FILTER_OPACITY),
        }
    }
}

impl Default for XpContext {
    fn default() -> Self {
        Self {
            triggered_by_autonomy: false,
            strict_mode: false,
            no_escape_mode: false,
            attention_checks_enabled: false,
            pink_filter_opacity: 0.0,
        }
    }
}

/// Resolve the XP multiplier for an award.
///
/// Pure function; the rules per bonus type:
///
/// | bonus        | multiplier |
/// |--------------|------------|
/// | `PinkFilter` | `1.0 + opacity / 100` when opacity > 0, else 1.0 |
/// | `Autonomy`   | 1.5 when the award is autonomy-triggered, else 1.0 |
/// | `StrictMode` | 0.5 outside strict mode; 2.0 under strict + no-escape + attention checks; 1.0 otherwise |
/// | `XpDrain`    | always 1.0 (drain never affects gains) |
/// | `None`       | always 1.0 |
#[must_use]
pub fn calculate_modifier(source: XpSource, context: &XpContext, bonus: BonusType) -> f64 {
    match bonus {
        BonusType::PinkFilter => {
            if context.pink_filter_opacity > 0.0 {
                1.0 + context.pink_filter_opacity / 100.0
            } else {
                1.0
            }
        }
        BonusType::Autonomy => {
            if context.triggered_by_autonomy || source == XpSource::Autonomy {
                1.5
            } else {
                1.0
            }
        }
        BonusType::StrictMode => {
            if !context.strict_mode {
                0.5
            } else if context.no_escape_mode && context.attention_checks_enabled {
                2.0
            } else {
                1.0
            }
        }
        BonusType::XpDrain | BonusType::None => 1.0,
    }
}
