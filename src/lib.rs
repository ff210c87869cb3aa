//! afflict - status effect simulation engine
//!
//! Timed, stackable effects on entities: damage and healing over time,
//! stat modifiers, conditions that bundle child effects, and diseases that
//! heal, grow symptoms and spread to nearby entities.

pub mod attributes;
pub mod catalog;
pub mod config;
pub mod effects;
pub mod entity;
pub mod store;
pub mod world;

pub use attributes::AttributeTree;
pub use config::Config;
pub use effects::{Effect, EffectError, EffectHost, EffectRegistry, EffectRegistryBuilder, EntityId};
pub use entity::{AddOutcome, EntityEffects, Position};
pub use store::{EffectStore, StoreError};
pub use world::{World, WorldReport};
