//! Effect system module
//!
//! Timed, stackable, mergeable effects applied to entities:
//! - Effect types and the registry that builds them
//! - The base effect state machine (ticking, expiry, renewal, cure)
//! - Conditions grouping named child effects
//! - Diseases with symptoms, self-healing and spread
//! - Variant behaviors (damage, stat modifiers, attributes, ...)

mod condition;
mod disease;
mod effect;
mod format;
mod host;
mod kind;
mod registry;
mod trigger;
pub mod variants;

#[cfg(test)]
pub(crate) mod testing;

pub use condition::Condition;
pub use disease::{Disease, Symptom, HEALING_INTERVAL, SPREAD_INTERVAL};
pub use effect::{merge_states, CureProps, Effect, EffectState, ExpireFlags, MergedState};
pub use format::{format_or_raw, format_template, FormatArg, FormatError};
pub use host::{Detached, EffectHost, EntityId, Neighbor};
pub use kind::{EffectType, EffectTypeDef, VariantKind};
pub use registry::{EffectError, EffectRegistry, EffectRegistryBuilder};
pub use trigger::{ChanceTrigger, Trigger, DISEASE_TRIGGER};
pub use variants::{Behavior, DamageType};
