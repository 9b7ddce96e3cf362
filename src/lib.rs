//! Lumi Core - Companion Progression Engine
//!
//! This crate provides the progression logic for the Lumi desktop
//! companion, including:
//! - Persona: closed persona registry with stable persisted codes
//! - Modifier: pure context-dependent XP multiplier calculation
//! - Engine: XP awards, level-ups, penalties and persona switching
//! - Scheduler: passive XP drain and active-time accrual timers
//! - Migration: one-time legacy single-persona save conversion
//! - EventBus: broadcast events for UI and haptics subscribers

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod event_bus;
pub mod hooks;
pub mod migration;
pub mod modifier;
pub mod persona;
pub mod progress;
mod scheduler;
pub mod settings;

pub use config::{LevelCurve, ProgressionConfig};
pub use engine::{CompanionEngine, CompanionEngineBuilder};
pub use error::{Error, Result};
pub use event_bus::{CompanionEvent, EventBus};
pub use hooks::{Haptics, NoopHaptics, NoopPromptCatalog, PromptCatalog};
pub use migration::{migrate_from_legacy, LEGACY_PERSONA};
pub use modifier::{calculate_modifier, XpContext, XpSource, MAX_PINK_FILTER_OPACITY};
pub use persona::{BonusType, PersonaDefinition, PersonaId};
pub use progress::PersonaProgress;
pub use settings::{CompanionSettings, JsonSettingsStore, MemorySettingsStore, SettingsStore};
