//! Companion Progression Engine
//!
//! Owns the live [`CompanionSettings`], computes XP awards, drives level-up
//! transitions, validates persona switches, accrues active time and rebinds
//! the passive drain timer. All mutation happens behind a single lock, so
//! timer ticks, awards and switches never interleave partial updates, and
//! every mutation is followed by a synchronous persist through the settings
//! store.

use crate::config::ProgressionConfig;
use crate::event_bus::{CompanionEvent, EventBus};
use crate::hooks::{Haptics, NoopHaptics, NoopPromptCatalog, PromptCatalog};
use crate::migration;
use crate::modifier::{calculate_modifier, XpContext, XpSource};
use crate::persona::{BonusType, PersonaId};
use crate::progress::PersonaProgress;
use crate::scheduler;
use crate::settings::{CompanionSettings, SettingsStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Mutable engine state, guarded by one lock (single logical timeline)
struct EngineState {
    settings: CompanionSettings,
    /// Last moment active time was flushed into the active persona
    last_time_flush: DateTime<Utc>,
    /// Token for the running drain loop, if any
    drain_token: Option<CancellationToken>,
    /// Token for the active-time accrual loop, if any
    active_time_token: Option<CancellationToken>,
}

struct EngineInner {
    state: Mutex<EngineState>,
    store: Arc<dyn SettingsStore>,
    config: ProgressionConfig,
    bus: EventBus,
    haptics: Arc<dyn Haptics>,
    prompts: Arc<dyn PromptCatalog>,
}

/// The companion progression engine.
///
/// A cheap-to-clone handle over shared engine state; timer loops hold their
/// own clone. Construct through [`CompanionEngine::builder`], then call
/// [`start`](Self::start) to bring up the timer loops and
/// [`shutdown`](Self::shutdown) to flush and stop them.
#[derive(Clone)]
pub struct CompanionEngine {
    inner: Arc<EngineInner>,
}

impl CompanionEngine {
    /// Create a builder over the given settings store.
    #[must_use]
    pub fn builder(store: Arc<dyn SettingsStore>) -> CompanionEngineBuilder {
        CompanionEngineBuilder::new(store)
    }

    /// Start the timer loops.
    ///
    /// Spawns the active-time accrual loop, and the drain loop when the
    /// active persona is a drain-type one. Calling `start` twice does not
    /// double the active-time loop.
    pub async fn start(&self) {
        let mut state = self.inner.state.lock().await;
        state.last_time_flush = Utc::now();

        if state.active_time_token.is_none() {
            let token = CancellationToken::new();
            scheduler::spawn_active_time_loop(
                self.clone(),
                token.clone(),
                self.inner.config.active_time_interval_secs,
            );
            state.active_time_token = Some(token);
        }

        let bonus = state.settings.active_persona.definition().bonus_type;
        self.rebind_drain_locked(&mut state, bonus);

        info!(persona = %state.settings.active_persona, "progression engine started");
    }

    /// Flush active time, stop both timer loops and persist.
    pub async fn shutdown(&self) {
        let mut state = self.inner.state.lock().await;
        let now = Utc::now();
        Self::flush_active_time_locked(
            &mut state,
            now,
            self.inner.config.active_time_interval_secs,
        );

        if let Some(token) = state.drain_token.take() {
            token.cancel();
        }
        if let Some(token) = state.active_time_token.take() {
            token.cancel();
        }

        self.persist(&state.settings);
        info!("progression engine stopped");
    }

    /// Subscribe to progression events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CompanionEvent> {
        self.inner.bus.subscribe()
    }

    /// Award XP to the active persona.
    ///
    /// The base amount is scaled by the modifier resolved from the active
    /// persona's bonus type and the context; when no context is supplied one
    /// is synthesized from the current settings. A persona at the level cap
    /// absorbs the award silently. Level-ups are processed in a bounded loop
    /// against the configured curve, so `current_xp` is strictly below the
    /// next threshold when this returns.
    pub async fn add_xp(&self, base_amount: f64, source: XpSource, context: Option<XpContext>) {
        let mut state = self.inner.state.lock().await;
        let active = state.settings.active_persona;
        let bonus = active.definition().bonus_type;

        if state
            .settings
            .progress
            .get(&active)
            .is_some_and(|p| p.is_max_level(self.inner.config.max_level))
        {
            debug!(persona = %active, "award ignored: persona at level cap");
            return;
        }

        let context = context.unwrap_or_else(|| Self::context_from(&state.settings));
        let modifier = calculate_modifier(source, &context, bonus);
        let final_amount = base_amount * modifier;

        let max_level = self.inner.config.max_level;
        let cap = self.inner.config.level_up_cap;
        let curve = &self.inner.config.level_curve;

        let progress = state.settings.progress_mut(active);
        progress.current_xp += final_amount;
        progress.total_xp_earned += final_amount;

        let mut new_levels = Vec::new();
        while !progress.is_max_level(max_level)
            && progress.current_xp >= curve.xp_for_next_level(progress.level)
        {
            if new_levels.len() as u32 >= cap {
                warn!(
                    persona = %active,
                    cap,
                    leftover_xp = progress.current_xp,
                    "level-up iteration cap hit, deferring remaining levels"
                );
                break;
            }
            progress.current_xp -= curve.xp_for_next_level(progress.level);
            progress.level += 1;
            new_levels.push(progress.level);
        }

        debug!(
            persona = %active,
            base = base_amount,
            modifier,
            awarded = final_amount,
            ?source,
            "XP awarded"
        );

        for new_level in new_levels {
            info!(persona = %active, new_level, "companion leveled up");
            self.inner.bus.publish(CompanionEvent::LevelUp {
                persona: active,
                new_level,
            });
            if let Err(e) = self.inner.haptics.pulse() {
                warn!(error = %e, "haptics pulse failed");
            }
        }

        self.inner.bus.publish(CompanionEvent::XpAwarded {
            persona: active,
            amount: final_amount,
            modifier,
        });

        self.persist(&state.settings);
    }

    /// Apply the attention-check penalty.
    ///
    /// Only effective while a strict-mode persona is active: subtracts the
    /// configured penalty from `current_xp`, floored at 0. Never changes the
    /// level.
    pub async fn on_attention_check_failed(&self) {
        let mut state = self.inner.state.lock().await;
        let active = state.settings.active_persona;

        if active.definition().bonus_type != BonusType::StrictMode {
            debug!(persona = %active, "attention-check penalty ignored: not a strict-mode persona");
            return;
        }

        let penalty = self.inner.config.attention_penalty;
        let progress = state.settings.progress_mut(active);
        progress.current_xp = (progress.current_xp - penalty).max(0.0);

        warn!(persona = %active, penalty, "attention check failed, XP penalty applied");
        self.persist(&state.settings);
    }

    /// Switch the active companion.
    ///
    /// Returns `false` without any state change when the player level does
    /// not meet the target's unlock requirement (unless the unlock bypass is
    /// set). Switching to the already-active persona is a `true` no-op.
    /// Otherwise: accrued active time is flushed into the *old* persona,
    /// the swap is persisted, `first_activated` is stamped on first use,
    /// the drain loop is rebound to the new persona's bonus type, the
    /// associated prompt is activated (failures logged, never propagated)
    /// and a switched event is published.
    pub async fn switch_companion(&self, target: PersonaId) -> bool {
        let mut state = self.inner.state.lock().await;
        let def = target.definition();

        if !state.settings.unlock_bypass
            && state.settings.player_level < def.required_unlock_level
        {
            warn!(
                persona = %target,
                required = def.required_unlock_level,
                player_level = state.settings.player_level,
                "switch refused: unlock level not met"
            );
            return false;
        }

        if target == state.settings.active_persona {
            debug!(persona = %target, "switch requested for already-active persona");
            return true;
        }

        // Flush into the old persona before the swap; the other order would
        // credit the elapsed time to the wrong persona.
        let now = Utc::now();
        Self::flush_active_time_locked(
            &mut state,
            now,
            self.inner.config.active_time_interval_secs,
        );

        state.settings.active_persona = target;
        let progress = state.settings.progress_mut(target);
        if progress.first_activated.is_none() {
            progress.first_activated = Some(now);
        }
        self.persist(&state.settings);

        self.rebind_drain_locked(&mut state, def.bonus_type);

        if let Some(prompt_id) = self.inner.prompts.prompt_for(target) {
            if let Err(e) = self.inner.prompts.activate(&prompt_id) {
                warn!(persona = %target, prompt = %prompt_id, error = %e, "prompt activation failed");
            }
        }

        self.inner
            .bus
            .publish(CompanionEvent::Switched { persona: target });
        info!(persona = %target, "companion switched");
        true
    }

    /// One passive drain tick: remove the configured amount from the global
    /// player XP pool, floored at 0, and publish the amount actually removed.
    pub async fn drain_tick(&self) {
        let mut state = self.inner.state.lock().await;

        // A tick scheduled before a switch may run after it; drain only
        // applies while a drain-type persona is active.
        if state.settings.active_persona.definition().bonus_type != BonusType::XpDrain {
            return;
        }

        let removed = state
            .settings
            .player_xp
            .min(self.inner.config.drain_per_tick)
            .max(0.0);
        state.settings.player_xp -= removed;

        debug!(removed, remaining = state.settings.player_xp, "player XP drained");
        self.inner
            .bus
            .publish(CompanionEvent::XpDrained { amount: removed });
        self.persist(&state.settings);
    }

    /// Flush wall-clock time elapsed since the last flush into the active
    /// persona and persist. Called by the accrual loop, before a switch and
    /// on shutdown.
    pub async fn flush_active_time(&self) {
        let mut state = self.inner.state.lock().await;
        let now = Utc::now();
        Self::flush_active_time_locked(
            &mut state,
            now,
            self.inner.config.active_time_interval_secs,
        );
        self.persist(&state.settings);
    }

    /// Run the legacy single-persona save migration. Returns whether it ran.
    pub async fn migrate_from_legacy(&self) -> bool {
        let mut state = self.inner.state.lock().await;
        let migrated = migration::migrate_from_legacy(&mut state.settings, Utc::now());
        if migrated {
            self.persist(&state.settings);
        }
        migrated
    }

    /// Reset a persona's progress to a fresh level-1 record.
    ///
    /// The only sanctioned way a level decreases.
    pub async fn reset_progress(&self, persona: PersonaId) {
        let mut state = self.inner.state.lock().await;
        state
            .settings
            .progress
            .insert(persona, PersonaProgress::new());
        info!(persona = %persona, "progress reset");
        self.persist(&state.settings);
    }

    /// Add to the global player XP pool (floored at 0).
    pub async fn add_player_xp(&self, amount: f64) {
        let mut state = self.inner.state.lock().await;
        state.settings.player_xp = (state.settings.player_xp + amount).max(0.0);
        self.persist(&state.settings);
    }

    /// Set the global player level.
    pub async fn set_player_level(&self, level: u32) {
        self.mutate(|s| s.player_level = level.max(1)).await;
    }

    /// Toggle strict mode.
    pub async fn set_strict_mode(&self, on: bool) {
        self.mutate(|s| s.strict_mode = on).await;
    }

    /// Toggle no-escape mode (panic key disabled).
    pub async fn set_no_escape_mode(&self, on: bool) {
        self.mutate(|s| s.no_escape_mode = on).await;
    }

    /// Toggle attention checks.
    pub async fn set_attention_checks_enabled(&self, on: bool) {
        self.mutate(|s| s.attention_checks_enabled = on).await;
    }

    /// Set pink filter state and opacity.
    pub async fn set_pink_filter(&self, enabled: bool, opacity: f64) {
        self.mutate(|s| {
            s.pink_filter_enabled = enabled;
            s.pink_filter_opacity = opacity.clamp(0.0, crate::modifier::MAX_PINK_FILTER_OPACITY);
        })
        .await;
    }

    /// Toggle the unlock bypass.
    pub async fn set_unlock_bypass(&self, on: bool) {
        self.mutate(|s| s.unlock_bypass = on).await;
    }

    /// Currently active persona.
    pub async fn active_persona(&self) -> PersonaId {
        self.inner.state.lock().await.settings.active_persona
    }

    /// Snapshot of a persona's progress, if it has ever been touched.
    pub async fn progress(&self, persona: PersonaId) -> Option<PersonaProgress> {
        self.inner
            .state
            .lock()
            .await
            .settings
            .progress
            .get(&persona)
            .cloned()
    }

    /// Global player XP pool.
    pub async fn player_xp(&self) -> f64 {
        self.inner.state.lock().await.settings.player_xp
    }

    /// Global player level.
    pub async fn player_level(&self) -> u32 {
        self.inner.state.lock().await.settings.player_level
    }

    /// Snapshot of the full settings object.
    pub async fn settings_snapshot(&self) -> CompanionSettings {
        self.inner.state.lock().await.settings.clone()
    }

    /// Whether the drain loop is currently bound.
    pub async fn drain_running(&self) -> bool {
        self.inner.state.lock().await.drain_token.is_some()
    }

    async fn mutate(&self, f: impl FnOnce(&mut CompanionSettings)) {
        let mut state = self.inner.state.lock().await;
        f(&mut state.settings);
        self.persist(&state.settings);
    }

    /// Persist-after-mutation. Store failures degrade to a warning; the
    /// in-memory state stays authoritative.
    fn persist(&self, settings: &CompanionSettings) {
        if let Err(e) = self.inner.store.save(settings) {
            warn!(error = %e, "failed to persist settings");
        }
    }

    fn context_from(settings: &CompanionSettings) -> XpContext {
        XpContext::new(
            false,
            settings.strict_mode,
            settings.no_escape_mode,
            settings.attention_checks_enabled,
            settings.effective_pink_opacity(),
        )
    }

    /// Credit elapsed wall-clock time to the active persona.
    ///
    /// Elapsed time is clamped to `[0, 2 * interval]`: negative deltas
    /// (clock rollback) credit nothing, and suspend/sleep gaps credit at
    /// most two intervals instead of the whole gap.
    fn flush_active_time_locked(state: &mut EngineState, now: DateTime<Utc>, interval_secs: u64) {
        let elapsed = (now - state.last_time_flush).num_seconds();
        let ceiling = interval_secs.saturating_mul(2) as i64;
        let credited = elapsed.clamp(0, ceiling) as u64;
        state.last_time_flush = now;

        if credited == 0 {
            return;
        }

        let active = state.settings.active_persona;
        state.settings.progress_mut(active).total_active_secs += credited;
        debug!(persona = %active, secs = credited, "active time flushed");
    }

    /// Stop any running drain loop and start a fresh one iff the bonus type
    /// calls for it. Runs under the state lock, so no tick can observe a
    /// half-switched persona.
    fn rebind_drain_locked(&self, state: &mut EngineState, bonus: BonusType) {
        if let Some(token) = state.drain_token.take() {
            token.cancel();
        }

        if bonus == BonusType::XpDrain {
            let token = CancellationToken::new();
            scheduler::spawn_drain_loop(
                self.clone(),
                token.clone(),
                self.inner.config.drain_interval_secs,
            );
            state.drain_token = Some(token);
        }
    }

    #[cfg(test)]
    pub(crate) async fn rewind_last_flush(&self, secs: i64) {
        let mut state = self.inner.state.lock().await;
        state.last_time_flush = state.last_time_flush - chrono::Duration::seconds(secs);
    }
}

/// Builder for [`CompanionEngine`]
pub struct CompanionEngineBuilder {
    store: Arc<dyn SettingsStore>,
    config: ProgressionConfig,
    haptics: Arc<dyn Haptics>,
    prompts: Arc<dyn PromptCatalog>,
    bus_capacity: usize,
}

impl CompanionEngineBuilder {
    /// Create a builder over the given settings store
    #[must_use]
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            config: ProgressionConfig::default(),
            haptics: Arc::new(NoopHaptics),
            prompts: Arc::new(NoopPromptCatalog),
            bus_capacity: 256,
        }
    }

    /// Set the progression configuration
    #[must_use]
    pub fn config(mut self, config: ProgressionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the haptics trigger
    #[must_use]
    pub fn haptics(mut self, haptics: Arc<dyn Haptics>) -> Self {
        self.haptics = haptics;
        self
    }

    /// Set the prompt catalog
    #[must_use]
    pub fn prompts(mut self, prompts: Arc<dyn PromptCatalog>) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set the event bus capacity
    #[must_use]
    pub fn bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    /// Build the engine, loading persisted settings.
    ///
    /// A missing save starts from defaults; a corrupted or unreadable save
    /// is logged and also degrades to defaults rather than failing.
    #[must_use]
    pub fn build(self) -> CompanionEngine {
        let settings = match self.store.load() {
            Ok(Some(settings)) => settings,
            Ok(None) => CompanionSettings::default(),
            Err(e) => {
                warn!(error = %e, "failed to load settings, starting from defaults");
                CompanionSettings::default()
            }
        };

        CompanionEngine {
            inner: Arc::new(EngineInner {
                state: Mutex::new(EngineState {
                    settings,
                    last_time_flush: Utc::now(),
                    drain_token: None,
                    active_time_token: None,
                }),
                store: self.store,
                config: self.config,
                bus: EventBus::new(self.bus_capacity),
                haptics: self.haptics,
                prompts: self.prompts,
            }),
        }
    }
}
