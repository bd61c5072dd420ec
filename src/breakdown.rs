//! Stat breakdown module.
//!
//! Contains the `StatBreakdown` type, a read-only explanation of how a
//! stat's final value is composed from its base value and the modifiers
//! currently targeting it. Useful for debug overlays and tooltips.

use crate::modifier::ModifierStack;
use crate::stat_tag::StatTag;
use serde::{Deserialize, Serialize};

/// A composed stat value with a step-by-step breakdown.
///
/// This is read-only, copyable and serializable.
///
/// # Examples
///
/// ```rust
/// use zzeffect::{Modifier, ModifierStack, StatBreakdown, StatTag};
///
/// let stack = ModifierStack::new(vec![
///     Modifier::multiplicative(StatTag::Damage, 2.0),
///     Modifier::additive(StatTag::Damage, 5.0),
/// ]);
/// let breakdown = StatBreakdown::compose(StatTag::Damage, 10.0, &stack);
///
/// assert_eq!(breakdown.value, 30.0);
/// assert_eq!(breakdown.steps[0], ("+5.00".to_string(), 15.0));
/// assert_eq!(breakdown.steps[1], ("×2.00".to_string(), 30.0));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatBreakdown {
    pub tag: StatTag,

    /// Committed base value the composition starts from.
    pub base: f64,

    /// Value after every modifier has been folded in.
    pub value: f64,

    /// Each entry is `(modifier_description, value_after_modifier)`, in
    /// composition order.
    pub steps: Vec<(String, f64)>,
}

impl StatBreakdown {
    /// Breakdown of a stat with no modifiers.
    pub fn new(tag: StatTag, base: f64) -> Self {
        Self {
            tag,
            base,
            value: base,
            steps: Vec::new(),
        }
    }

    /// Fold `stack` over `base`, recording every step.
    pub fn compose(tag: StatTag, base: f64, stack: &ModifierStack) -> Self {
        let steps = stack.steps(base);
        let value = steps.last().map_or(base, |(_, value)| *value);
        Self {
            tag,
            base,
            value,
            steps,
        }
    }

    pub fn is_modified(&self) -> bool {
        !self.steps.is_empty()
    }
}
