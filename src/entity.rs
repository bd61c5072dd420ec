//! Stat entity driver.
//!
//! A `StatEntity` wraps one `EffectManager` and runs the per-step calling
//! pattern: caller logic, the effect tick, then (optionally) the commit of
//! staged base-value writes.

use crate::config::StatConfig;
use crate::manager::EffectManager;
use crate::store::StatStore;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// When staged base-value writes become committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Commit at the end of every [`StatEntity::step`].
    #[default]
    Immediate,
    /// Leave staged writes pending until [`StatEntity::commit`] is called.
    Deferred,
}

/// One entity's stats and effects, driven step by step.
///
/// # Examples
///
/// ```rust
/// use zzeffect::*;
///
/// let config = StatConfig::new().with(StatTag::Health, 100.0);
/// let mut entity = StatEntity::new(&config, CommitPolicy::Immediate);
///
/// entity.step(0.02, |manager| {
///     manager.add_effect(
///         EffectSpec::create(EffectType::Damage)
///             .handler(InstantHandler::new(StatTag::Health, -30.0)),
///     );
/// });
///
/// assert_eq!(entity.stats().base_value(StatTag::Health), 70.0);
/// assert_eq!(entity.manager().active_effect_count(), 0);
/// ```
#[derive(Debug)]
pub struct StatEntity {
    manager: EffectManager,
    commit: CommitPolicy,
}

impl StatEntity {
    pub fn new(config: &StatConfig, commit: CommitPolicy) -> Self {
        Self::with_manager(EffectManager::new(config), commit)
    }

    pub fn with_manager(manager: EffectManager, commit: CommitPolicy) -> Self {
        Self { manager, commit }
    }

    /// Run one step: `pre_logic`, then the effect tick, then the commit
    /// under [`CommitPolicy::Immediate`].
    ///
    /// Returns the number of stats whose change was committed this step.
    pub fn step<F>(&mut self, delta_time: f64, pre_logic: F) -> usize
    where
        F: FnOnce(&mut EffectManager),
    {
        pre_logic(&mut self.manager);
        self.manager.tick(delta_time);

        let committed = match self.commit {
            CommitPolicy::Immediate => self.manager.stats_mut().apply_pending_changes(),
            CommitPolicy::Deferred => 0,
        };
        trace!(delta_time, policy = ?self.commit, committed, "entity step");
        committed
    }

    /// Commit staged writes now, whatever the policy.
    pub fn commit(&mut self) -> usize {
        self.manager.stats_mut().apply_pending_changes()
    }

    pub fn commit_policy(&self) -> CommitPolicy {
        self.commit
    }

    pub fn set_commit_policy(&mut self, commit: CommitPolicy) {
        self.commit = commit;
    }

    pub fn manager(&self) -> &EffectManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut EffectManager {
        &mut self.manager
    }

    pub fn stats(&self) -> &StatStore {
        self.manager.stats()
    }

    pub fn stats_mut(&mut self) -> &mut StatStore {
        self.manager.stats_mut()
    }

    pub fn into_manager(self) -> EffectManager {
        self.manager
    }
}
