//! # zzeffect - Deferred-Commit Stat & Effect Engine
//!
//! A per-entity stat engine for action games that provides:
//! - **Deferred** base-value writes (staged, coalesced, committed explicitly)
//! - **Composable** effects built from small reusable handlers
//! - **Deterministic** modifier stacking (fixed kind order, not insertion order)
//! - **Re-entrant** ticks (handlers may add or remove effects mid-tick)
//!
//! ## Core Concepts
//!
//! ### Stat Pipeline
//!
//! Every stat has a base value and a final value:
//!
//! ```text
//! write → [pending] → apply_pending_changes → [base] → modifiers → [final]
//! ```
//!
//! 1. **Writes** to base values are staged and coalesce per stat
//! 2. **Commit** applies them and notifies listeners once per changed stat
//! 3. **Modifiers** are folded over the committed base every tick
//!    (Additive → Multiplicative → Override) and written to final directly
//!
//! ### Effects
//!
//! An effect is a typed bundle of handlers. The built-in handlers cover
//! instant changes, periodic changes, lifetimes and temporary modifiers;
//! custom behaviour implements [`EffectHandler`].
//!
//! ## Example
//!
//! ```rust
//! use zzeffect::*;
//!
//! let config = StatConfig::new()
//!     .with(StatTag::Health, 100.0)
//!     .with(StatTag::MoveSpeed, 10.0);
//! let mut manager = EffectManager::new(&config);
//!
//! // Instant damage is staged until committed
//! manager.add_effect(
//!     EffectSpec::create(EffectType::Damage)
//!         .handler(InstantHandler::new(StatTag::Health, -30.0)),
//! );
//! assert_eq!(manager.stats().base_value(StatTag::Health), 100.0);
//! manager.stats_mut().apply_pending_changes();
//! assert_eq!(manager.stats().base_value(StatTag::Health), 70.0);
//!
//! // Modifiers are composed on tick
//! manager.add_modifier(Modifier::additive(StatTag::MoveSpeed, 2.0));
//! manager.add_modifier(Modifier::multiplicative(StatTag::MoveSpeed, 0.5));
//! manager.tick(0.02);
//! assert_eq!(manager.stats().final_value(StatTag::MoveSpeed), 6.0); // (10 + 2) * 0.5
//! ```
//!
//! ## Modules
//!
//! - [`stat_tag`] - Stat and effect type tags
//! - [`config`] - Initial stat configuration
//! - [`store`] - Stat store with deferred commit and change listeners
//! - [`modifier`] - Modifiers and their composition
//! - [`handler`] - Effect handler trait and built-in handlers
//! - [`effect`] - Runtime effects and their ids
//! - [`builder`] - Effect spec builder
//! - [`context`] - Context handed to handlers
//! - [`manager`] - Effect manager and tick pipeline
//! - [`breakdown`] - Stat value breakdowns
//! - [`entity`] - Per-step entity driver
//! - [`error`] - Error types

pub mod breakdown;
pub mod builder;
pub mod config;
pub mod context;
pub mod effect;
pub mod entity;
pub mod error;
pub mod handler;
pub mod manager;
pub mod modifier;
pub mod stat_tag;
pub mod store;

// Re-export main types for convenience
pub use breakdown::StatBreakdown;
pub use builder::{EffectSpec, EffectSpecBuilder};
pub use config::{StatConfig, StatConfigEntry};
pub use context::EffectContext;
pub use effect::{Effect, EffectId, EffectOrder};
pub use entity::{CommitPolicy, StatEntity};
pub use error::{EffectError, StatError};
pub use handler::{
    EffectHandler, InstantHandler, LifetimeHandler, PeriodicHandler, TemporaryModifierHandler,
};
pub use manager::EffectManager;
pub use modifier::{Modifier, ModifierId, ModifierKind, ModifierRegistry, ModifierStack};
pub use stat_tag::{EffectType, StatTag};
pub use store::{ListenerId, StatChangedEvent, StatListener, StatRecord, StatStore};
