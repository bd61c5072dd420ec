//! Effect spec builder.
//!
//! An `EffectSpec` describes an effect before it exists: its type tag,
//! order class, uniqueness and ordered handlers. It is assembled with a
//! fluent builder and moved into
//! [`EffectManager::add_effect`](crate::EffectManager::add_effect), which
//! consumes it.

use crate::effect::EffectOrder;
use crate::handler::EffectHandler;
use crate::stat_tag::EffectType;
use std::fmt;

/// Immutable description of an effect, consumed once.
pub struct EffectSpec {
    effect_type: EffectType,
    order: EffectOrder,
    unique: bool,
    handlers: Vec<Box<dyn EffectHandler>>,
}

/// Fluent builder for [`EffectSpec`].
pub struct EffectSpecBuilder {
    spec: EffectSpec,
}

impl EffectSpec {
    /// Start building a spec for an effect type.
    ///
    /// Defaults: not unique, [`EffectOrder::Default`], no handlers.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use zzeffect::*;
    ///
    /// let spec = EffectSpec::create(EffectType::Slow)
    ///     .unique(true)
    ///     .order(EffectOrder::Late)
    ///     .handler(LifetimeHandler::new(2.0))
    ///     .handler(TemporaryModifierHandler::new(
    ///         StatTag::MoveSpeed,
    ///         ModifierKind::Multiplicative,
    ///         0.5,
    ///     ))
    ///     .build();
    ///
    /// assert_eq!(spec.effect_type(), EffectType::Slow);
    /// assert!(spec.is_unique());
    /// assert_eq!(spec.handler_count(), 2);
    /// ```
    pub fn create(effect_type: EffectType) -> EffectSpecBuilder {
        EffectSpecBuilder {
            spec: EffectSpec {
                effect_type,
                order: EffectOrder::Default,
                unique: false,
                handlers: Vec::new(),
            },
        }
    }

    pub fn effect_type(&self) -> EffectType {
        self.effect_type
    }

    pub fn order(&self) -> EffectOrder {
        self.order
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub(crate) fn into_parts(self) -> (EffectType, EffectOrder, bool, Vec<Box<dyn EffectHandler>>) {
        (self.effect_type, self.order, self.unique, self.handlers)
    }
}

impl EffectSpecBuilder {
    /// At most one effect of this type may be active at a time.
    pub fn unique(mut self, unique: bool) -> Self {
        self.spec.unique = unique;
        self
    }

    pub fn order(mut self, order: EffectOrder) -> Self {
        self.spec.order = order;
        self
    }

    /// Append a handler. Handlers run in the order they are added.
    pub fn handler(mut self, handler: impl EffectHandler + 'static) -> Self {
        self.spec.handlers.push(Box::new(handler));
        self
    }

    /// Append an already boxed handler.
    pub fn boxed_handler(mut self, handler: Box<dyn EffectHandler>) -> Self {
        self.spec.handlers.push(handler);
        self
    }

    pub fn build(self) -> EffectSpec {
        self.spec
    }
}

impl From<EffectSpecBuilder> for EffectSpec {
    fn from(builder: EffectSpecBuilder) -> Self {
        builder.build()
    }
}

impl fmt::Debug for EffectSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectSpec")
            .field("effect_type", &self.effect_type)
            .field("order", &self.order)
            .field("unique", &self.unique)
            .field(
                "handlers",
                &self
                    .handlers
                    .iter()
                    .map(|handler| handler.description())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl fmt::Debug for EffectSpecBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EffectSpecBuilder").field(&self.spec).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{InstantHandler, PeriodicHandler};
    use crate::stat_tag::StatTag;

    #[test]
    fn test_defaults() {
        let spec = EffectSpec::create(EffectType::Damage).build();
        assert_eq!(spec.order(), EffectOrder::Default);
        assert!(!spec.is_unique());
        assert_eq!(spec.handler_count(), 0);
    }

    #[test]
    fn test_duplicate_handler_kinds_keep_order() {
        let spec: EffectSpec = EffectSpec::create(EffectType::Pickup)
            .handler(InstantHandler::new(StatTag::Health, 10.0))
            .handler(InstantHandler::new(StatTag::Exp, 10.0))
            .boxed_handler(Box::new(PeriodicHandler::new(StatTag::Health, 1.0, 1.0)))
            .into();

        let (_, _, _, handlers) = spec.into_parts();
        let descriptions: Vec<_> = handlers.iter().map(|h| h.description()).collect();
        assert_eq!(
            descriptions,
            vec![
                "Instant(health +10.00)",
                "Instant(exp +10.00)",
                "Periodic(health +1.00 every 1.00s)",
            ]
        );
    }

    #[test]
    fn test_debug_lists_handlers() {
        let spec = EffectSpec::create(EffectType::Heal)
            .handler(InstantHandler::new(StatTag::Health, 5.0))
            .build();
        let debug = format!("{:?}", spec);
        assert!(debug.contains("Instant(health +5.00)"));
    }
}
