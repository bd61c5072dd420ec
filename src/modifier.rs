//! Modifiers module.
//!
//! A `Modifier` is a standalone numeric transform on one stat. Modifiers
//! are grouped per stat tag and composed in a fixed kind order:
//! Additive → Multiplicative → Override. Within a kind they keep
//! registration order. Because the order depends only on kind, the result
//! does not depend on the order modifiers were added or removed in.

use crate::stat_tag::StatTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How a modifier folds into the running value.
///
/// The declaration order is the composition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    /// `value + magnitude`
    Additive,
    /// `value × magnitude`
    Multiplicative,
    /// `magnitude`, discarding everything before it.
    Override,
}

/// Opaque handle to a registered modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModifierId(u64);

impl ModifierId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mod#{}", self.0)
    }
}

/// A numeric transform targeting one stat.
///
/// # Examples
///
/// ```rust
/// use zzeffect::{Modifier, StatTag};
///
/// let slow = Modifier::multiplicative(StatTag::MoveSpeed, 0.5);
/// assert_eq!(slow.apply(10.0), 5.0);
///
/// let bonus = Modifier::additive(StatTag::Health, 25.0);
/// assert_eq!(bonus.apply(100.0), 125.0);
///
/// let pinned = Modifier::r#override(StatTag::FireInterval, 0.1);
/// assert_eq!(pinned.apply(0.5), 0.1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub tag: StatTag,
    pub kind: ModifierKind,
    pub magnitude: f64,
}

impl Modifier {
    pub fn new(tag: StatTag, kind: ModifierKind, magnitude: f64) -> Self {
        Self {
            tag,
            kind,
            magnitude,
        }
    }

    pub fn additive(tag: StatTag, magnitude: f64) -> Self {
        Self::new(tag, ModifierKind::Additive, magnitude)
    }

    pub fn multiplicative(tag: StatTag, magnitude: f64) -> Self {
        Self::new(tag, ModifierKind::Multiplicative, magnitude)
    }

    pub fn r#override(tag: StatTag, magnitude: f64) -> Self {
        Self::new(tag, ModifierKind::Override, magnitude)
    }

    /// Fold this modifier into the running value.
    pub fn apply(&self, value: f64) -> f64 {
        match self.kind {
            ModifierKind::Additive => value + self.magnitude,
            ModifierKind::Multiplicative => value * self.magnitude,
            ModifierKind::Override => self.magnitude,
        }
    }

    /// Short human-readable form, e.g. `+10.00`, `×1.20`, `=5.00`.
    pub fn description(&self) -> String {
        match self.kind {
            ModifierKind::Additive if self.magnitude < 0.0 => format!("{:.2}", self.magnitude),
            ModifierKind::Additive => format!("+{:.2}", self.magnitude),
            ModifierKind::Multiplicative => format!("×{:.2}", self.magnitude),
            ModifierKind::Override => format!("={:.2}", self.magnitude),
        }
    }
}

/// The modifiers targeting one stat, already in composition order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifierStack {
    modifiers: Vec<Modifier>,
}

impl ModifierStack {
    /// Build a stack, stable-sorting by kind.
    pub fn new(mut modifiers: Vec<Modifier>) -> Self {
        modifiers.sort_by_key(|modifier| modifier.kind);
        Self { modifiers }
    }

    /// Fold every modifier over `base`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use zzeffect::{Modifier, ModifierStack, StatTag};
    ///
    /// let stack = ModifierStack::new(vec![
    ///     Modifier::multiplicative(StatTag::Health, 1.2),
    ///     Modifier::additive(StatTag::Health, 10.0),
    /// ]);
    /// // (100 + 10) × 1.2, whatever order they were listed in
    /// assert!((stack.apply(100.0) - 132.0).abs() < 1e-9);
    /// ```
    pub fn apply(&self, base: f64) -> f64 {
        self.modifiers
            .iter()
            .fold(base, |value, modifier| modifier.apply(value))
    }

    /// Fold over `base`, recording `(description, value_after)` per modifier.
    pub fn steps(&self, base: f64) -> Vec<(String, f64)> {
        let mut value = base;
        self.modifiers
            .iter()
            .map(|modifier| {
                value = modifier.apply(value);
                (modifier.description(), value)
            })
            .collect()
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }
}

/// Owns every active modifier of one entity.
///
/// Ids are assigned by the caller (the effect manager). Iteration is by
/// id, which is registration order, so grouping is deterministic.
#[derive(Debug, Default)]
pub struct ModifierRegistry {
    modifiers: BTreeMap<ModifierId, Modifier>,
    dirty: bool,
}

impl ModifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ModifierId, modifier: Modifier) {
        self.modifiers.insert(id, modifier);
        self.dirty = true;
    }

    /// Remove a modifier. Unknown ids are ignored.
    pub fn remove(&mut self, id: ModifierId) -> Option<Modifier> {
        let removed = self.modifiers.remove(&id);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    pub fn get(&self, id: ModifierId) -> Option<&Modifier> {
        self.modifiers.get(&id)
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Whether the grouping changed since it was last taken.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Group modifiers by tag, each group in composition order.
    pub fn group(&self) -> BTreeMap<StatTag, ModifierStack> {
        let mut grouped: BTreeMap<StatTag, Vec<Modifier>> = BTreeMap::new();
        for modifier in self.modifiers.values() {
            grouped.entry(modifier.tag).or_default().push(*modifier);
        }
        grouped
            .into_iter()
            .map(|(tag, modifiers)| (tag, ModifierStack::new(modifiers)))
            .collect()
    }

    /// Composition-ordered stack of the modifiers targeting one tag.
    pub fn stack_for(&self, tag: StatTag) -> ModifierStack {
        ModifierStack::new(
            self.modifiers
                .values()
                .filter(|modifier| modifier.tag == tag)
                .copied()
                .collect(),
        )
    }

    /// Regroup if anything changed since the last call.
    pub(crate) fn take_groups(&mut self) -> Option<BTreeMap<StatTag, ModifierStack>> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.group())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_order() {
        assert!(ModifierKind::Additive < ModifierKind::Multiplicative);
        assert!(ModifierKind::Multiplicative < ModifierKind::Override);
    }

    #[test]
    fn test_stack_sorts_by_kind_not_insertion() {
        let stack = ModifierStack::new(vec![
            Modifier::r#override(StatTag::Damage, 3.0),
            Modifier::multiplicative(StatTag::Damage, 2.0),
            Modifier::additive(StatTag::Damage, 1.0),
        ]);
        let kinds: Vec<_> = stack.modifiers().iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ModifierKind::Additive,
                ModifierKind::Multiplicative,
                ModifierKind::Override
            ]
        );
        assert_eq!(stack.apply(100.0), 3.0);
    }

    #[test]
    fn test_stack_is_stable_within_kind() {
        let stack = ModifierStack::new(vec![
            Modifier::multiplicative(StatTag::Damage, 2.0),
            Modifier::additive(StatTag::Damage, 5.0),
            Modifier::multiplicative(StatTag::Damage, 3.0),
        ]);
        let magnitudes: Vec<_> = stack.modifiers().iter().map(|m| m.magnitude).collect();
        assert_eq!(magnitudes, vec![5.0, 2.0, 3.0]);
    }

    #[test]
    fn test_stack_steps() {
        let stack = ModifierStack::new(vec![
            Modifier::multiplicative(StatTag::Health, 2.0),
            Modifier::additive(StatTag::Health, -10.0),
        ]);
        let steps = stack.steps(50.0);
        assert_eq!(steps[0], ("-10.00".to_string(), 40.0));
        assert_eq!(steps[1], ("×2.00".to_string(), 80.0));
    }

    #[test]
    fn test_empty_stack_is_identity() {
        assert_eq!(ModifierStack::default().apply(42.0), 42.0);
    }

    #[test]
    fn test_registry_groups_by_tag() {
        let mut registry = ModifierRegistry::new();
        registry.insert(ModifierId::from_raw(1), Modifier::additive(StatTag::Health, 10.0));
        registry.insert(ModifierId::from_raw(2), Modifier::multiplicative(StatTag::MoveSpeed, 0.5));
        registry.insert(ModifierId::from_raw(3), Modifier::additive(StatTag::Health, 5.0));

        let groups = registry.take_groups().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&StatTag::Health].len(), 2);
        assert_eq!(groups[&StatTag::Health].apply(100.0), 115.0);
        assert!(registry.take_groups().is_none());
    }

    #[test]
    fn test_registry_remove_marks_dirty_only_when_present() {
        let mut registry = ModifierRegistry::new();
        let id = ModifierId::from_raw(4);
        registry.insert(id, Modifier::additive(StatTag::Exp, 1.0));
        registry.take_groups();

        assert!(registry.remove(ModifierId::from_raw(99)).is_none());
        assert!(!registry.is_dirty());

        assert!(registry.remove(id).is_some());
        assert!(registry.is_dirty());
        assert!(registry.take_groups().unwrap().is_empty());
    }
}
