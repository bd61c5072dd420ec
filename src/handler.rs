//! Effect handlers module.
//!
//! A handler is one behaviour unit inside an effect. The effect calls
//! `on_start` once when it is added, `tick` every manager tick, and
//! `on_end` exactly once when it is removed. Handlers compose: an effect
//! may carry several, including several of the same kind, and they run in
//! the order they were added.

use crate::context::EffectContext;
use crate::error::EffectError;
use crate::modifier::{Modifier, ModifierId, ModifierKind};
use crate::stat_tag::StatTag;

/// Trait for effect handlers.
///
/// All three lifecycle methods default to doing nothing. Returning an
/// error marks the handler as faulted for that call: the error is logged
/// and the remaining handlers and effects still run.
///
/// # Examples
///
/// ```rust
/// use zzeffect::*;
///
/// /// Grants one level every time experience crosses 100.
/// #[derive(Debug)]
/// struct LevelUp;
///
/// impl EffectHandler for LevelUp {
///     fn tick(&mut self, ctx: &mut EffectContext<'_>, _delta_time: f64) -> Result<(), EffectError> {
///         let exp = ctx.stats().try_base_value(StatTag::Exp)?;
///         if exp >= 100.0 {
///             ctx.stats().modify_base_value(StatTag::Exp, -100.0);
///             ctx.stats().modify_base_value(StatTag::Level, 1.0);
///         }
///         Ok(())
///     }
///
///     fn description(&self) -> String {
///         "LevelUp".to_string()
///     }
/// }
///
/// let config = StatConfig::new().with(StatTag::Level, 1.0).with(StatTag::Exp, 120.0);
/// let mut manager = EffectManager::new(&config);
/// manager.add_effect(EffectSpec::create(EffectType::Test).handler(LevelUp));
/// manager.tick(0.1);
/// manager.stats_mut().apply_pending_changes();
/// assert_eq!(manager.stats().base_value(StatTag::Level), 2.0);
/// assert_eq!(manager.stats().base_value(StatTag::Exp), 20.0);
/// ```
pub trait EffectHandler: Send {
    /// Called once, when the owning effect is added.
    fn on_start(&mut self, _ctx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        Ok(())
    }

    /// Called every manager tick while the owning effect is active.
    fn tick(&mut self, _ctx: &mut EffectContext<'_>, _delta_time: f64) -> Result<(), EffectError> {
        Ok(())
    }

    /// Called exactly once, when the owning effect is removed.
    fn on_end(&mut self, _ctx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        Ok(())
    }

    /// Human-readable description, used in logs.
    fn description(&self) -> String;
}

/// Applies one base-value delta when the effect starts.
///
/// Used for direct damage, heals and consumption. By default it ends its
/// effect right away; call [`InstantHandler::without_auto_end`] when it
/// shares an effect with longer-lived handlers.
///
/// # Examples
///
/// ```rust
/// use zzeffect::*;
///
/// let mut manager = EffectManager::new(&StatConfig::new().with(StatTag::Health, 100.0));
/// let id = manager.add_effect(
///     EffectSpec::create(EffectType::Damage).handler(InstantHandler::new(StatTag::Health, -30.0)),
/// );
/// manager.tick(0.016);
/// manager.stats_mut().apply_pending_changes();
///
/// assert!(!manager.is_active(id));
/// assert_eq!(manager.stats().final_value(StatTag::Health), 70.0);
/// ```
#[derive(Debug, Clone)]
pub struct InstantHandler {
    tag: StatTag,
    delta: f64,
    auto_end: bool,
}

impl InstantHandler {
    pub fn new(tag: StatTag, delta: f64) -> Self {
        Self {
            tag,
            delta,
            auto_end: true,
        }
    }

    /// Keep the effect alive after the delta is applied.
    pub fn without_auto_end(mut self) -> Self {
        self.auto_end = false;
        self
    }

    pub fn tag(&self) -> StatTag {
        self.tag
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn auto_end(&self) -> bool {
        self.auto_end
    }
}

impl EffectHandler for InstantHandler {
    fn on_start(&mut self, ctx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        ctx.stats().modify_base_value(self.tag, self.delta);
        if self.auto_end {
            ctx.request_end();
        }
        Ok(())
    }

    fn description(&self) -> String {
        format!("Instant({} {:+.2})", self.tag, self.delta)
    }
}

/// Applies a base-value delta every `interval` seconds.
///
/// Elapsed time is accumulated and the interval subtracted on each
/// application, so the remainder carries over and long runs do not drift.
/// Applies at most once per tick; a backlog from a long tick drains one
/// application per following tick. Stops applying once the owning effect
/// has been asked to end.
#[derive(Debug, Clone)]
pub struct PeriodicHandler {
    tag: StatTag,
    interval: f64,
    value: f64,
    elapsed: f64,
}

impl PeriodicHandler {
    pub fn new(tag: StatTag, interval: f64, value: f64) -> Self {
        Self {
            tag,
            interval,
            value,
            elapsed: 0.0,
        }
    }

    /// Time accumulated toward the next application.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    fn has_valid_interval(&self) -> bool {
        self.interval.is_finite() && self.interval > 0.0
    }
}

impl EffectHandler for PeriodicHandler {
    fn on_start(&mut self, ctx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        if self.has_valid_interval() {
            return Ok(());
        }
        ctx.request_end();
        Err(EffectError::InvalidHandler {
            handler: self.description(),
            reason: format!("interval must be positive, got {}", self.interval),
        })
    }

    fn tick(&mut self, ctx: &mut EffectContext<'_>, delta_time: f64) -> Result<(), EffectError> {
        if ctx.end_requested() || !self.has_valid_interval() {
            return Ok(());
        }

        self.elapsed += delta_time;
        if self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            ctx.stats().modify_base_value(self.tag, self.value);
        }
        Ok(())
    }

    fn description(&self) -> String {
        format!(
            "Periodic({} {:+.2} every {:.2}s)",
            self.tag, self.value, self.interval
        )
    }
}

/// Ends its effect after `duration` seconds.
///
/// Carries no stat mutation; pair it with other handlers to bound how long
/// they stay active.
#[derive(Debug, Clone)]
pub struct LifetimeHandler {
    duration: f64,
    remaining: f64,
}

impl LifetimeHandler {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            remaining: duration,
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }
}

impl EffectHandler for LifetimeHandler {
    fn tick(&mut self, ctx: &mut EffectContext<'_>, delta_time: f64) -> Result<(), EffectError> {
        self.remaining -= delta_time;
        if self.remaining <= 0.0 {
            ctx.request_end();
        }
        Ok(())
    }

    fn description(&self) -> String {
        format!("Lifetime({:.2}s)", self.duration)
    }
}

/// Registers a modifier for as long as its effect is active.
///
/// The modifier is registered on start and removed on end, so it never
/// outlives the effect. Several of these on the same stat stack correctly
/// whatever order they expire in, because composition is rebuilt from the
/// active set every tick.
#[derive(Debug, Clone)]
pub struct TemporaryModifierHandler {
    modifier: Modifier,
    modifier_id: Option<ModifierId>,
}

impl TemporaryModifierHandler {
    pub fn new(tag: StatTag, kind: ModifierKind, magnitude: f64) -> Self {
        Self {
            modifier: Modifier::new(tag, kind, magnitude),
            modifier_id: None,
        }
    }

    pub fn modifier(&self) -> &Modifier {
        &self.modifier
    }

    /// Id of the registered modifier, while registered.
    pub fn modifier_id(&self) -> Option<ModifierId> {
        self.modifier_id
    }
}

impl EffectHandler for TemporaryModifierHandler {
    fn on_start(&mut self, ctx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        if let Some(previous) = self.modifier_id.take() {
            ctx.manager().remove_modifier(previous);
        }
        self.modifier_id = Some(ctx.manager().add_modifier(self.modifier));
        Ok(())
    }

    fn on_end(&mut self, ctx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        if let Some(id) = self.modifier_id.take() {
            ctx.manager().remove_modifier(id);
        }
        Ok(())
    }

    fn description(&self) -> String {
        format!(
            "TemporaryModifier({} {})",
            self.modifier.tag,
            self.modifier.description()
        )
    }
}
