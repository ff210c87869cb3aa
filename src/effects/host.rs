//! Capabilities an effect may call on its owner
//!
//! Effects never hold their owner. Every lifecycle hook receives the owner as
//! an `EffectHost` for the duration of the call instead.

use serde::{Deserialize, Serialize};

use super::variants::DamageType;
use super::Effect;

/// Identifier of an entity that can carry effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// Another entity within reach of the owner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: EntityId,
    pub squared_distance: f64,
}

/// Owner capabilities used by effects.
///
/// Every method has a no-op default so hosts only implement what they
/// support. Additions must be queued: the owner may be iterating its live
/// effects while the call happens.
pub trait EffectHost {
    /// The entity this host represents, if any
    fn entity(&self) -> Option<EntityId> {
        None
    }

    /// Queue an effect for addition once the current pass is over
    fn add_effect(&mut self, _effect: Effect) {}

    /// Make the owner immune to an effect type for `duration` seconds
    fn set_immunity(&mut self, _effect_type: &str, _duration: f64) {}

    /// Flag the owner's effect state as changed
    fn mark_dirty(&mut self) {}

    /// Add `delta` to a named multiplicative bonus
    fn apply_multiplier(&mut self, _stat: &str, _delta: f64) {}

    /// Write a named entity attribute
    fn set_attribute(&mut self, _key: &str, _value: f64) {}

    /// Drive a named overlay intensity
    fn set_shader_intensity(&mut self, _shader: &str, _value: f64) {}

    /// Deal damage; negative amounts heal
    fn apply_damage(&mut self, _amount: f64, _damage_type: DamageType) {}

    fn play_animation(&mut self, _name: &str) {}

    fn play_sound(&mut self, _name: &str) {}

    /// Roll against `chance` in [0, 1]
    fn roll(&mut self, _chance: f64) -> bool {
        false
    }

    /// Uniform draw in [0, 1)
    fn random(&mut self) -> f64 {
        0.0
    }

    /// Other entities within `range`, limited to `vertical_range` on the vertical axis
    fn nearby(&self, _range: f64, _vertical_range: f64) -> Vec<Neighbor> {
        Vec::new()
    }

    /// Queue an effect for another entity
    fn spread_effect(&mut self, _target: EntityId, _effect: Effect) {}
}

/// Host for effects that are not attached to anything yet
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

impl EffectHost for Detached {}
