//! Stat store module.
//!
//! Provides `StatStore`, the per-entity table of base and final values.
//!
//! Writes never touch committed state directly. Every setter stages into
//! a per-tag pending change; `apply_pending_changes()` flushes the whole
//! batch at once and fires one notification per tag that actually changed.
//! The only writes that bypass staging are modifier recompositions issued
//! by the effect manager, which must be visible in the tick that computed
//! them.

use crate::config::StatConfig;
use crate::error::StatError;
use crate::modifier::ModifierStack;
use crate::stat_tag::StatTag;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, trace, warn};

/// Committed values of one stat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
    pub tag: StatTag,
    /// Permanent component, mutated by direct and periodic handlers.
    pub base_value: f64,
    /// Base after modifier composition. What gameplay reads.
    pub final_value: f64,
}

/// Notification fired for every tag whose committed values changed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatChangedEvent {
    pub tag: StatTag,
    pub old_base: f64,
    pub new_base: f64,
    pub old_final: f64,
    pub new_final: f64,
}

/// Handle returned by [`StatStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Change listener. Receives the store so it can stage follow-up writes;
/// those land in the next batch.
pub type StatListener = Box<dyn FnMut(&StatChangedEvent, &mut StatStore) + Send>;

#[derive(Debug, Clone, Copy, Default)]
struct PendingChange {
    base: Option<f64>,
    final_value: Option<f64>,
}

/// Per-entity base/final value table with deferred-write, explicit-commit
/// semantics.
///
/// # Examples
///
/// ```rust
/// use zzeffect::{StatConfig, StatStore, StatTag};
///
/// let config = StatConfig::new().with(StatTag::Health, 100.0);
/// let mut store = StatStore::new(&config);
///
/// store.modify_base_value(StatTag::Health, -30.0);
/// store.modify_base_value(StatTag::Health, -5.0);
/// // Nothing is visible until the batch is committed.
/// assert_eq!(store.base_value(StatTag::Health), 100.0);
///
/// assert_eq!(store.apply_pending_changes(), 1);
/// assert_eq!(store.base_value(StatTag::Health), 65.0);
/// assert_eq!(store.final_value(StatTag::Health), 65.0);
/// ```
pub struct StatStore {
    records: HashMap<StatTag, StatRecord>,
    /// Configured tags, in configuration order.
    order: Vec<StatTag>,
    pending: BTreeMap<StatTag, PendingChange>,
    /// Modifier stacks installed by the effect manager.
    compositions: BTreeMap<StatTag, ModifierStack>,
    listeners: Vec<(ListenerId, StatListener)>,
    next_listener_id: u64,
    notifying: bool,
    /// Listeners taken out for the current notification pass.
    checked_out: Vec<ListenerId>,
    unsubscribed_while_notifying: Vec<ListenerId>,
}

impl StatStore {
    /// Build a store from an initial configuration.
    ///
    /// Duplicate tags are skipped with a warning; the first entry wins.
    pub fn new(config: &StatConfig) -> Self {
        let mut records = HashMap::with_capacity(config.len());
        let mut order = Vec::with_capacity(config.len());

        for entry in config.entries() {
            if records.contains_key(&entry.tag) {
                warn!("{}; entry skipped", StatError::DuplicateStat(entry.tag));
                continue;
            }
            records.insert(
                entry.tag,
                StatRecord {
                    tag: entry.tag,
                    base_value: entry.base_value,
                    final_value: entry.base_value,
                },
            );
            order.push(entry.tag);
        }

        Self {
            records,
            order,
            pending: BTreeMap::new(),
            compositions: BTreeMap::new(),
            listeners: Vec::new(),
            next_listener_id: 1,
            notifying: false,
            checked_out: Vec::new(),
            unsubscribed_while_notifying: Vec::new(),
        }
    }

    /// Configured tags, in configuration order.
    pub fn all_stat_tags(&self) -> &[StatTag] {
        &self.order
    }

    pub fn contains(&self, tag: StatTag) -> bool {
        self.records.contains_key(&tag)
    }

    /// Committed record of a tag.
    pub fn record(&self, tag: StatTag) -> Option<&StatRecord> {
        self.records.get(&tag)
    }

    /// All committed records, in configuration order.
    pub fn records(&self) -> impl Iterator<Item = &StatRecord> + '_ {
        self.order.iter().filter_map(|tag| self.records.get(tag))
    }

    pub fn try_base_value(&self, tag: StatTag) -> Result<f64, StatError> {
        self.records
            .get(&tag)
            .map(|record| record.base_value)
            .ok_or(StatError::UnknownStat(tag))
    }

    pub fn try_final_value(&self, tag: StatTag) -> Result<f64, StatError> {
        self.records
            .get(&tag)
            .map(|record| record.final_value)
            .ok_or(StatError::UnknownStat(tag))
    }

    /// Committed base value. Unknown tags warn and read as 0.
    pub fn base_value(&self, tag: StatTag) -> f64 {
        self.try_base_value(tag).unwrap_or_else(|err| {
            warn!("{err}; reading 0");
            0.0
        })
    }

    /// Committed final value. Unknown tags warn and read as 0.
    pub fn final_value(&self, tag: StatTag) -> f64 {
        self.try_final_value(tag).unwrap_or_else(|err| {
            warn!("{err}; reading 0");
            0.0
        })
    }

    /// Stage `base = value`, overwriting anything staged for base.
    pub fn try_set_base_value(&mut self, tag: StatTag, value: f64) -> Result<(), StatError> {
        self.stage(tag)?.base = Some(value);
        Ok(())
    }

    /// Stage `base += delta`. Deltas within one batch accumulate.
    pub fn try_modify_base_value(&mut self, tag: StatTag, delta: f64) -> Result<(), StatError> {
        let committed = self.try_base_value(tag)?;
        let change = self.stage(tag)?;
        change.base = Some(change.base.unwrap_or(committed) + delta);
        Ok(())
    }

    /// Stage `final = value`. A modifier recomposition on this tag will
    /// overwrite it.
    pub fn try_set_final_value(&mut self, tag: StatTag, value: f64) -> Result<(), StatError> {
        self.stage(tag)?.final_value = Some(value);
        Ok(())
    }

    /// Stage `final += delta`.
    pub fn try_modify_final_value(&mut self, tag: StatTag, delta: f64) -> Result<(), StatError> {
        let committed = self.try_final_value(tag)?;
        let change = self.stage(tag)?;
        change.final_value = Some(change.final_value.unwrap_or(committed) + delta);
        Ok(())
    }

    pub fn set_base_value(&mut self, tag: StatTag, value: f64) {
        if let Err(err) = self.try_set_base_value(tag, value) {
            warn!("{err}; write dropped");
        }
    }

    pub fn modify_base_value(&mut self, tag: StatTag, delta: f64) {
        if let Err(err) = self.try_modify_base_value(tag, delta) {
            warn!("{err}; write dropped");
        }
    }

    pub fn set_final_value(&mut self, tag: StatTag, value: f64) {
        if let Err(err) = self.try_set_final_value(tag, value) {
            warn!("{err}; write dropped");
        }
    }

    pub fn modify_final_value(&mut self, tag: StatTag, delta: f64) {
        if let Err(err) = self.try_modify_final_value(tag, delta) {
            warn!("{err}; write dropped");
        }
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drop every staged write without committing it.
    pub fn discard_pending_changes(&mut self) {
        self.pending.clear();
    }

    /// Commit the staged batch.
    ///
    /// Tags are flushed in tag order. A tag whose base was staged but whose
    /// final was not gets its final recomputed from the new base through
    /// the installed modifier stack. Listeners are notified synchronously,
    /// once per tag whose values changed, after the whole batch is written.
    ///
    /// Returns the number of change events fired. Calling this from inside
    /// a listener does nothing; the listener's writes wait for the next
    /// commit.
    pub fn apply_pending_changes(&mut self) -> usize {
        if self.notifying {
            debug!("commit requested while notifying; deferred to the next commit");
            return 0;
        }
        if self.pending.is_empty() {
            return 0;
        }

        let batch = std::mem::take(&mut self.pending);
        let mut events = Vec::with_capacity(batch.len());

        for (tag, change) in batch {
            let Some(record) = self.records.get_mut(&tag) else {
                continue;
            };
            let old_base = record.base_value;
            let old_final = record.final_value;

            let new_base = change.base.unwrap_or(old_base);
            let new_final = match (change.final_value, change.base) {
                (Some(final_value), _) => final_value,
                (None, Some(base)) => self
                    .compositions
                    .get(&tag)
                    .map_or(base, |stack| stack.apply(base)),
                (None, None) => old_final,
            };

            record.base_value = new_base;
            record.final_value = new_final;

            if new_base != old_base || new_final != old_final {
                events.push(StatChangedEvent {
                    tag,
                    old_base,
                    new_base,
                    old_final,
                    new_final,
                });
            }
        }

        trace!(changed = events.len(), "committed pending stat changes");
        self.notify(&events);
        events.len()
    }

    /// Register a change listener.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::{Arc, Mutex};
    /// use zzeffect::{StatConfig, StatStore, StatTag};
    ///
    /// let mut store = StatStore::new(&StatConfig::new().with(StatTag::Exp, 0.0));
    /// let seen = Arc::new(Mutex::new(Vec::new()));
    /// let sink = Arc::clone(&seen);
    /// store.subscribe(move |event, _| sink.lock().unwrap().push(event.new_base));
    ///
    /// store.modify_base_value(StatTag::Exp, 10.0);
    /// store.apply_pending_changes();
    /// assert_eq!(*seen.lock().unwrap(), vec![10.0]);
    /// ```
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&StatChangedEvent, &mut StatStore) + Send + 'static,
    {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        if let Some(index) = self.listeners.iter().position(|(other, _)| *other == id) {
            self.listeners.remove(index);
            return true;
        }
        if self.notifying
            && self.checked_out.contains(&id)
            && !self.unsubscribed_while_notifying.contains(&id)
        {
            self.unsubscribed_while_notifying.push(id);
            return true;
        }
        false
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Modifier stack currently composed into a tag, if any.
    pub fn modifier_stack(&self, tag: StatTag) -> Option<&ModifierStack> {
        self.compositions.get(&tag)
    }

    /// Replace the installed modifier stacks.
    ///
    /// Tags that no longer have any modifier fall back to their base value
    /// immediately.
    pub(crate) fn install_compositions(&mut self, compositions: BTreeMap<StatTag, ModifierStack>) {
        for tag in self.compositions.keys() {
            if compositions.contains_key(tag) {
                continue;
            }
            if let Some(record) = self.records.get_mut(tag) {
                record.final_value = record.base_value;
            }
        }
        self.compositions = compositions;
    }

    /// Recompute final from committed base for every tag with a modifier
    /// stack, writing committed state directly.
    pub(crate) fn recompose(&mut self) {
        for (tag, stack) in &self.compositions {
            if let Some(record) = self.records.get_mut(tag) {
                record.final_value = stack.apply(record.base_value);
            }
        }
    }

    fn stage(&mut self, tag: StatTag) -> Result<&mut PendingChange, StatError> {
        if !self.records.contains_key(&tag) {
            return Err(StatError::UnknownStat(tag));
        }
        Ok(self.pending.entry(tag).or_default())
    }

    fn notify(&mut self, events: &[StatChangedEvent]) {
        if events.is_empty() {
            return;
        }

        let mut listeners = std::mem::take(&mut self.listeners);
        self.notifying = true;
        self.checked_out = listeners.iter().map(|(id, _)| *id).collect();
        for event in events {
            for (id, listener) in listeners.iter_mut() {
                if self.unsubscribed_while_notifying.contains(id) {
                    continue;
                }
                listener(event, self);
            }
        }
        self.notifying = false;
        self.checked_out.clear();

        let unsubscribed = std::mem::take(&mut self.unsubscribed_while_notifying);
        listeners.retain(|(id, _)| !unsubscribed.contains(id));
        // Listeners subscribed during the pass were pushed onto the
        // emptied list.
        listeners.append(&mut self.listeners);
        self.listeners = listeners;
    }
}

impl fmt::Debug for StatStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatStore")
            .field("records", &self.records().collect::<Vec<_>>())
            .field("pending", &self.pending)
            .field("compositions", &self.compositions)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
