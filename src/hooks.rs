//! Collaborator Hooks
//!
//! Seams to the rest of the desktop application: haptic feedback on
//! level-up and the prompt catalog that associates a persona with the hypno
//! prompt it activates. Both are fire-and-forget from the engine's point of
//! view - failures are logged at the call site and never block progression.

use crate::error::Result;
use crate::persona::PersonaId;

/// Fire-and-forget haptic feedback trigger
#[cfg_attr(test, mockall::automock)]
pub trait Haptics: Send + Sync {
    /// Pulse once (called on every level-up)
    fn pulse(&self) -> Result<()>;
}

/// Prompt association lookup and activation
#[cfg_attr(test, mockall::automock)]
pub trait PromptCatalog: Send + Sync {
    /// Prompt id associated with a persona, if any
    fn prompt_for(&self, persona: PersonaId) -> Option<String>;
    /// Activate a prompt by id
    fn activate(&self, prompt_id: &str) -> Result<()>;
}

/// No-op haptics for headless runs and tests
#[derive(Debug, Default)]
pub struct NoopHaptics;

impl Haptics for NoopHaptics {
    fn pulse(&self) -> Result<()> {
        Ok(())
    }
}

/// Empty prompt catalog: no persona has an associated prompt
#[derive(Debug, Default)]
pub struct NoopPromptCatalog;

impl PromptCatalog for NoopPromptCatalog {
    fn prompt_for(&self, _persona: PersonaId) -> Option<String> {
        None
    }

    fn activate(&self, _prompt_id: &str) -> Result<()> {
        Ok(())
    }
}
