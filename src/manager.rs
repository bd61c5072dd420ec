//! Effect manager module.
//!
//! Provides the `EffectManager` type, the per-entity owner of the stat
//! store, the active effects and the modifier registry. It is the only
//! place effects and modifiers are created or destroyed, and it drives the
//! per-tick pipeline.

use crate::breakdown::StatBreakdown;
use crate::builder::EffectSpec;
use crate::config::StatConfig;
use crate::context::EffectContext;
use crate::effect::{fan_out, Effect, EffectId, Phase};
use crate::error::EffectError;
use crate::modifier::{Modifier, ModifierId, ModifierRegistry};
use crate::stat_tag::{EffectType, StatTag};
use crate::store::StatStore;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, trace, warn};

/// Owns one entity's stats, effects and modifiers.
///
/// Every [`tick`](EffectManager::tick) runs, in order:
/// 1. Re-sort active effects by order class if the set changed
///    (Early → Default → Late, ties by insertion order)
/// 2. Regroup modifiers by stat if they changed
///    (Additive → Multiplicative → Override within each stat)
/// 3. Tick every handler of every active effect, in sorted order
/// 4. Remove the effects that requested their end
/// 5. Recompose the final value of every modified stat from its committed
///    base, writing committed state directly
///
/// Base-value writes made by handlers stay staged in the stat store until
/// the caller commits them with
/// [`StatStore::apply_pending_changes`](crate::StatStore::apply_pending_changes).
///
/// # Examples
///
/// ```rust
/// use zzeffect::*;
///
/// let config = StatConfig::new().with(StatTag::MoveSpeed, 10.0);
/// let mut manager = EffectManager::new(&config);
///
/// let slow = EffectSpec::create(EffectType::Slow)
///     .unique(true)
///     .handler(LifetimeHandler::new(2.0))
///     .handler(TemporaryModifierHandler::new(
///         StatTag::MoveSpeed,
///         ModifierKind::Multiplicative,
///         0.5,
///     ));
/// let id = manager.add_effect(slow);
///
/// manager.tick(1.0);
/// assert_eq!(manager.stats().final_value(StatTag::MoveSpeed), 5.0);
///
/// manager.tick(1.0);
/// assert!(!manager.is_active(id));
/// assert_eq!(manager.stats().final_value(StatTag::MoveSpeed), 10.0);
/// ```
#[derive(Debug)]
pub struct EffectManager {
    stats: StatStore,
    effects: BTreeMap<EffectId, Effect>,
    by_type: HashMap<EffectType, BTreeSet<EffectId>>,
    /// Tick order. Rebuilt when `effects_dirty` is set.
    sorted: Vec<EffectId>,
    modifiers: ModifierRegistry,
    /// Shared by effects and modifiers; 0 is never handed out.
    next_instance_id: u64,
    effects_dirty: bool,
}

impl EffectManager {
    /// Create a manager with a fresh stat store built from `config`.
    pub fn new(config: &StatConfig) -> Self {
        Self::with_store(StatStore::new(config))
    }

    /// Create a manager around an existing stat store.
    pub fn with_store(stats: StatStore) -> Self {
        Self {
            stats,
            effects: BTreeMap::new(),
            by_type: HashMap::new(),
            sorted: Vec::new(),
            modifiers: ModifierRegistry::new(),
            next_instance_id: 1,
            effects_dirty: false,
        }
    }

    pub fn stats(&self) -> &StatStore {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut StatStore {
        &mut self.stats
    }

    /// Add an effect, or explain why it was rejected.
    ///
    /// A unique spec is rejected while any effect of the same type is
    /// active. The rejected spec's handlers never run.
    pub fn try_add_effect(&mut self, spec: impl Into<EffectSpec>) -> Result<EffectId, EffectError> {
        let spec = spec.into();
        if spec.is_unique() && self.effect_count(spec.effect_type()) > 0 {
            return Err(EffectError::DuplicateUniqueEffect(spec.effect_type()));
        }

        let id = EffectId::from_raw(self.allocate_id());
        let (effect_type, order, unique, handlers) = spec.into_parts();
        debug!(effect = %id, %effect_type, ?order, unique, "effect added");

        self.effects
            .insert(id, Effect::new(id, effect_type, order, unique, handlers));
        self.by_type.entry(effect_type).or_default().insert(id);
        self.effects_dirty = true;

        self.dispatch(id, Phase::Start);
        Ok(id)
    }

    /// Add an effect. Returns [`EffectId::NONE`] if it was rejected.
    pub fn add_effect(&mut self, spec: impl Into<EffectSpec>) -> EffectId {
        match self.try_add_effect(spec) {
            Ok(id) => id,
            Err(err) => {
                debug!("{err}; effect rejected");
                EffectId::NONE
            }
        }
    }

    /// Remove an effect, running `on_end` on all of its handlers.
    ///
    /// Returns `false` if the id does not resolve. If the effect's handlers
    /// are running right now, it is detached as soon as they return.
    pub fn remove_effect(&mut self, id: EffectId) -> bool {
        match self.effects.get_mut(&id) {
            None => return false,
            Some(effect) if effect.dispatching => {
                effect.detach_requested = true;
                return true;
            }
            Some(_) => {}
        }

        let Some(mut effect) = self.effects.remove(&id) else {
            return false;
        };
        if let Some(ids) = self.by_type.get_mut(&effect.effect_type) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_type.remove(&effect.effect_type);
            }
        }
        self.effects_dirty = true;
        debug!(effect = %id, effect_type = %effect.effect_type, "effect removed");

        let effect_type = effect.effect_type;
        let mut ctx = EffectContext::new(self, id, effect_type, &mut effect.end_requested);
        fan_out(&mut effect.handlers, &mut ctx, Phase::End);
        true
    }

    /// Remove an effect only if `id` still resolves to an effect of
    /// `expected` type. Anything else is a silent no-op.
    pub fn safe_remove_effect(&mut self, id: EffectId, expected: EffectType) -> bool {
        self.try_safe_remove_effect(id, expected).is_ok()
    }

    pub fn try_safe_remove_effect(
        &mut self,
        id: EffectId,
        expected: EffectType,
    ) -> Result<(), EffectError> {
        match self.effects.get(&id) {
            Some(effect) if effect.effect_type == expected => {
                self.remove_effect(id);
                Ok(())
            }
            _ => Err(EffectError::StaleHandle { id, expected }),
        }
    }

    /// Remove every active effect of one type. Returns how many were removed.
    pub fn remove_effects_of_type(&mut self, effect_type: EffectType) -> usize {
        let ids: Vec<EffectId> = self
            .by_type
            .get(&effect_type)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        ids.into_iter().filter(|id| self.remove_effect(*id)).count()
    }

    /// Remove every active effect, oldest first.
    pub fn clear_effects(&mut self) -> usize {
        let ids: Vec<EffectId> = self.effects.keys().copied().collect();
        ids.into_iter().filter(|id| self.remove_effect(*id)).count()
    }

    /// Register a modifier directly.
    pub fn add_modifier(&mut self, modifier: Modifier) -> ModifierId {
        if !self.stats.contains(modifier.tag) {
            warn!(
                "modifier {} targets unconfigured stat {}; it will have no effect",
                modifier.description(),
                modifier.tag
            );
        }
        let id = ModifierId::from_raw(self.allocate_id());
        self.modifiers.insert(id, modifier);
        id
    }

    /// Remove a modifier. Returns `false` if the id does not resolve.
    pub fn remove_modifier(&mut self, id: ModifierId) -> bool {
        self.modifiers.remove(id).is_some()
    }

    /// Advance every active effect by `delta_time` seconds.
    pub fn tick(&mut self, delta_time: f64) {
        if self.effects_dirty {
            self.sort_effects();
        }
        self.refresh_compositions();

        // Handlers may add or remove effects while we iterate; walk a
        // snapshot and let missing ids fall through.
        let snapshot = self.sorted.clone();
        for &id in &snapshot {
            self.dispatch(id, Phase::Tick(delta_time));
        }

        // Includes effects added during the pass that ended in `on_start`.
        let ended: Vec<EffectId> = self
            .effects
            .values()
            .filter(|effect| effect.end_requested)
            .map(Effect::id)
            .collect();
        for id in ended {
            self.remove_effect(id);
        }

        self.refresh_compositions();
        self.stats.recompose();
        trace!(
            effects = self.effects.len(),
            modifiers = self.modifiers.len(),
            delta_time,
            "tick complete"
        );
    }

    /// Number of active effects of a type.
    pub fn effect_count(&self, effect_type: EffectType) -> usize {
        self.by_type.get(&effect_type).map_or(0, BTreeSet::len)
    }

    pub fn active_effect_count(&self) -> usize {
        self.effects.len()
    }

    pub fn is_active(&self, id: EffectId) -> bool {
        self.effects.contains_key(&id)
    }

    pub fn effect_type_of(&self, id: EffectId) -> Option<EffectType> {
        self.effects.get(&id).map(Effect::effect_type)
    }

    pub fn effect(&self, id: EffectId) -> Option<&Effect> {
        self.effects.get(&id)
    }

    /// Active effects in insertion order.
    pub fn effects(&self) -> impl Iterator<Item = &Effect> + '_ {
        self.effects.values()
    }

    pub fn modifier(&self, id: ModifierId) -> Option<&Modifier> {
        self.modifiers.get(id)
    }

    pub fn modifier_count(&self) -> usize {
        self.modifiers.len()
    }

    pub fn modifiers(&self) -> &ModifierRegistry {
        &self.modifiers
    }

    /// Explain a stat's value from its committed base and the modifiers
    /// registered right now. `None` for unconfigured stats.
    pub fn breakdown(&self, tag: StatTag) -> Option<StatBreakdown> {
        let base = self.stats.try_base_value(tag).ok()?;
        let stack = self.modifiers.stack_for(tag);
        if stack.is_empty() {
            return Some(StatBreakdown::new(tag, base));
        }
        Some(StatBreakdown::compose(tag, base, &stack))
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_instance_id;
        self.next_instance_id += 1;
        id
    }

    fn sort_effects(&mut self) {
        self.sorted.clear();
        // Map order is id order, which is insertion order; the stable sort
        // keeps it within each order class.
        self.sorted.extend(self.effects.keys().copied());
        let effects = &self.effects;
        self.sorted
            .sort_by_key(|id| effects.get(id).map(Effect::order));
        self.effects_dirty = false;
    }

    fn refresh_compositions(&mut self) {
        if let Some(groups) = self.modifiers.take_groups() {
            self.stats.install_compositions(groups);
        }
    }

    /// Run a start or tick phase on one effect.
    ///
    /// The handlers are checked out of the effect while they run so they
    /// can be handed a context borrowing the whole manager. The effect
    /// itself stays registered; a removal requested meanwhile is applied
    /// once the handlers are back.
    fn dispatch(&mut self, id: EffectId, phase: Phase) {
        let (mut handlers, effect_type, mut end_requested) = match self.effects.get_mut(&id) {
            Some(effect) if !effect.dispatching => {
                effect.dispatching = true;
                (
                    std::mem::take(&mut effect.handlers),
                    effect.effect_type,
                    effect.end_requested,
                )
            }
            _ => return,
        };

        {
            let mut ctx = EffectContext::new(self, id, effect_type, &mut end_requested);
            fan_out(&mut handlers, &mut ctx, phase);
        }

        let detach = match self.effects.get_mut(&id) {
            Some(effect) => {
                effect.handlers = handlers;
                effect.end_requested |= end_requested;
                effect.dispatching = false;
                effect.detach_requested
            }
            None => {
                warn!(effect = %id, "effect vanished while its handlers were running");
                false
            }
        };
        if detach {
            self.remove_effect(id);
        }
    }
}
