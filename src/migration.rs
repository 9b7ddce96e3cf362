//! Legacy Save Migration
//!
//! Saves written before the multi-persona model carried a single global
//! level/XP pair and no per-persona records. Migration seeds the legacy
//! persona from the player level, once. Guarded by the "store already
//! populated" check, so running it again is a silent no-op.

use crate::persona::PersonaId;
use crate::settings::CompanionSettings;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Persona that inherits the legacy single-track progression
pub const LEGACY_PERSONA: PersonaId = PersonaId::Lumi;

/// Legacy saves never exceeded this seeded level
const LEGACY_LEVEL_CAP: u32 = 50;

/// Convert a legacy single-persona save into the per-persona model.
///
/// Seeds [`LEGACY_PERSONA`] with `level = clamp(player_level / 2, 1, 50)`
/// and makes it the active persona. No-op when any progress record already
/// exists; returns whether the migration actually ran.
pub fn migrate_from_legacy(settings: &mut CompanionSettings, now: DateTime<Utc>) -> bool {
    if !settings.progress.is_empty() {
        debug!("progress store already populated, skipping legacy migration");
        return false;
    }

    let seeded_level = (settings.player_level / 2).clamp(1, LEGACY_LEVEL_CAP);

    let progress = settings.progress_mut(LEGACY_PERSONA);
    progress.level = seeded_level;
    progress.first_activated = Some(now);

    settings.active_persona = LEGACY_PERSONA;

    info!(
        persona = %LEGACY_PERSONA,
        level = seeded_level,
        "migrated legacy save into per-persona model"
    );
    true
}
