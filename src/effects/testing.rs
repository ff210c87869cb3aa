//! Host double that records every capability call

use std::collections::HashMap;

use super::host::{EffectHost, EntityId, Neighbor};
use super::variants::DamageType;
use super::Effect;

#[derive(Debug, Default)]
pub(crate) struct RecordingHost {
    pub entity: Option<EntityId>,
    pub queued: Vec<Effect>,
    pub immunities: Vec<(String, f64)>,
    pub dirty: usize,
    pub multipliers: HashMap<String, f64>,
    pub attributes: HashMap<String, f64>,
    pub shaders: HashMap<String, f64>,
    pub damage: Vec<(f64, DamageType)>,
    pub animations: Vec<String>,
    pub sounds: Vec<String>,
    pub roll_result: bool,
    pub rolls: Vec<f64>,
    pub random_value: f64,
    pub neighbors: Vec<Neighbor>,
    pub spread: Vec<(EntityId, Effect)>,
}

impl EffectHost for RecordingHost {
    fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    fn add_effect(&mut self, effect: Effect) {
        self.queued.push(effect);
    }

    fn set_immunity(&mut self, effect_type: &str, duration: f64) {
        self.immunities.push((effect_type.to_string(), duration));
    }

    fn mark_dirty(&mut self) {
        self.dirty += 1;
    }

    fn apply_multiplier(&mut self, stat: &str, delta: f64) {
        *self.multipliers.entry(stat.to_string()).or_insert(0.0) += delta;
    }

    fn set_attribute(&mut self, key: &str, value: f64) {
        self.attributes.insert(key.to_string(), value);
    }

    fn set_shader_intensity(&mut self, shader: &str, value: f64) {
        self.shaders.insert(shader.to_string(), value);
    }

    fn apply_damage(&mut self, amount: f64, damage_type: DamageType) {
        self.damage.push((amount, damage_type));
    }

    fn play_animation(&mut self, name: &str) {
        self.animations.push(name.to_string());
    }

    fn play_sound(&mut self, name: &str) {
        self.sounds.push(name.to_string());
    }

    fn roll(&mut self, chance: f64) -> bool {
        self.rolls.push(chance);
        self.roll_result
    }

    fn random(&mut self) -> f64 {
        self.random_value
    }

    fn nearby(&self, range: f64, _vertical_range: f64) -> Vec<Neighbor> {
        self.neighbors
            .iter()
            .filter(|n| n.squared_distance <= range * range)
            .copied()
            .collect()
    }

    fn spread_effect(&mut self, target: EntityId, effect: Effect) {
        self.spread.push((target, effect));
    }
}
