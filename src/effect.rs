//! Runtime effects.
//!
//! An `Effect` is a dumb composite: it owns an ordered list of handlers
//! and some metadata, and fans each lifecycle phase out to the handlers in
//! declared order. It holds no gameplay logic of its own. Effects are owned
//! by the [`EffectManager`](crate::EffectManager); callers only ever hold
//! an [`EffectId`].

use crate::context::EffectContext;
use crate::error::EffectError;
use crate::handler::EffectHandler;
use crate::stat_tag::EffectType;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

/// Opaque, manager-scoped handle to an effect.
///
/// Ids are allocated monotonically and never reused, so a stale id simply
/// stops resolving. [`EffectId::NONE`] is returned when an effect is
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EffectId(u64);

impl EffectId {
    /// The rejection sentinel.
    pub const NONE: EffectId = EffectId(0);

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Coarse ordering bucket for effect ticks. Ties keep insertion order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EffectOrder {
    Early,
    #[default]
    Default,
    Late,
}

/// Lifecycle phase being dispatched to handlers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Phase {
    Start,
    Tick(f64),
    End,
}

/// An active effect.
pub struct Effect {
    pub(crate) id: EffectId,
    pub(crate) effect_type: EffectType,
    pub(crate) order: EffectOrder,
    pub(crate) unique: bool,
    pub(crate) handlers: Vec<Box<dyn EffectHandler>>,
    pub(crate) end_requested: bool,
    /// Handlers are checked out and running.
    pub(crate) dispatching: bool,
    /// Removal was requested while dispatching.
    pub(crate) detach_requested: bool,
}

impl Effect {
    pub(crate) fn new(
        id: EffectId,
        effect_type: EffectType,
        order: EffectOrder,
        unique: bool,
        handlers: Vec<Box<dyn EffectHandler>>,
    ) -> Self {
        Self {
            id,
            effect_type,
            order,
            unique,
            handlers,
            end_requested: false,
            dispatching: false,
            detach_requested: false,
        }
    }

    pub fn id(&self) -> EffectId {
        self.id
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

    pub fn end_requested(&self) -> bool {
        self.end_requested
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id)
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
            .field("end_requested", &self.end_requested)
            .finish()
    }
}

/// Run one phase on every handler, in order.
///
/// A handler that returns an error or panics is logged and skipped; the
/// remaining handlers still run and the effect's bookkeeping stays intact.
pub(crate) fn fan_out(
    handlers: &mut [Box<dyn EffectHandler>],
    ctx: &mut EffectContext<'_>,
    phase: Phase,
) {
    for handler in handlers.iter_mut() {
        let result = panic::catch_unwind(AssertUnwindSafe(|| match phase {
            Phase::Start => handler.on_start(ctx),
            Phase::Tick(delta_time) => handler.tick(ctx, delta_time),
            Phase::End => handler.on_end(ctx),
        }))
        .unwrap_or_else(|payload| {
            Err(EffectError::fault(
                handler.description(),
                panic_message(&*payload),
            ))
        });
        if let Err(err) = result {
            warn!(
                effect = %ctx.effect_id(),
                effect_type = %ctx.effect_type(),
                ?phase,
                "handler {} faulted: {err}",
                handler.description(),
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
