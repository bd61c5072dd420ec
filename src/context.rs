//! Context handed to effect handlers.
//!
//! The `EffectContext` gives a handler access to the entity's stat store,
//! the effect manager (for registering modifiers or submitting further
//! effects), and the end flag of the effect it belongs to.

use crate::effect::EffectId;
use crate::manager::EffectManager;
use crate::stat_tag::EffectType;
use crate::store::StatStore;

/// Per-dispatch view of the owning effect and its manager.
///
/// # Examples
///
/// ```rust
/// use zzeffect::*;
///
/// #[derive(Debug)]
/// struct Poke;
///
/// impl EffectHandler for Poke {
///     fn on_start(&mut self, ctx: &mut EffectContext<'_>) -> Result<(), EffectError> {
///         ctx.stats().modify_base_value(StatTag::Health, -1.0);
///         ctx.request_end();
///         ctx.request_end(); // idempotent
///         assert!(ctx.end_requested());
///         Ok(())
///     }
///
///     fn description(&self) -> String {
///         "Poke".to_string()
///     }
/// }
///
/// let mut manager = EffectManager::new(&StatConfig::new().with(StatTag::Health, 10.0));
/// manager.add_effect(EffectSpec::create(EffectType::Damage).handler(Poke));
/// manager.stats_mut().apply_pending_changes();
/// assert_eq!(manager.stats().base_value(StatTag::Health), 9.0);
/// ```
pub struct EffectContext<'a> {
    manager: &'a mut EffectManager,
    effect_id: EffectId,
    effect_type: EffectType,
    end_requested: &'a mut bool,
}

impl<'a> EffectContext<'a> {
    pub(crate) fn new(
        manager: &'a mut EffectManager,
        effect_id: EffectId,
        effect_type: EffectType,
        end_requested: &'a mut bool,
    ) -> Self {
        Self {
            manager,
            effect_id,
            effect_type,
            end_requested,
        }
    }

    /// The entity's stat store.
    pub fn stats(&mut self) -> &mut StatStore {
        self.manager.stats_mut()
    }

    /// The manager running this effect.
    ///
    /// Effects and modifiers may be added or removed from here, including
    /// the effect currently running; removal of a running effect takes
    /// place once its handlers return.
    pub fn manager(&mut self) -> &mut EffectManager {
        self.manager
    }

    pub fn effect_id(&self) -> EffectId {
        self.effect_id
    }

    pub fn effect_type(&self) -> EffectType {
        self.effect_type
    }

    /// Ask the manager to end this effect after the current tick.
    ///
    /// Once requested, stays requested.
    pub fn request_end(&mut self) {
        *self.end_requested = true;
    }

    pub fn end_requested(&self) -> bool {
        *self.end_requested
    }
}
