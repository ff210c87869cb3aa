//! Common test utilities - registry builders and a recording host

#![allow(dead_code)]

use std::sync::Arc;

use afflict::effects::{DamageType, EffectTypeDef, VariantKind};
use afflict::{AttributeTree, Effect, EffectHost, EffectRegistry, EffectRegistryBuilder};

/// Definition with defaults given as JSON
pub fn def(name: &str, variant: VariantKind, defaults: serde_json::Value) -> EffectTypeDef {
    let defaults = AttributeTree::from_value(defaults).expect("defaults must be an object");
    EffectTypeDef::new(name, variant).with_defaults(defaults)
}

/// Registry holding only the given definitions
pub fn registry(defs: Vec<EffectTypeDef>) -> Arc<EffectRegistry> {
    let mut builder = EffectRegistryBuilder::new();
    for d in defs {
        builder.register(d).expect("Failed to register definition");
    }
    builder.build()
}

/// Registry with the built-in catalog
pub fn catalog() -> Arc<EffectRegistry> {
    EffectRegistryBuilder::with_defaults().build()
}

pub fn create(registry: &EffectRegistry, name: &str) -> Effect {
    registry
        .create_effect(name)
        .unwrap_or_else(|| panic!("unknown effect type {}", name))
}

/// Host that records what effects ask of it
#[derive(Debug, Default)]
pub struct Recorder {
    pub queued: Vec<Effect>,
    pub immunities: Vec<(String, f64)>,
    pub damage: Vec<(f64, DamageType)>,
    pub dirty: usize,
}

impl EffectHost for Recorder {
    fn add_effect(&mut self, effect: Effect) {
        self.queued.push(effect);
    }

    fn set_immunity(&mut self, effect_type: &str, duration: f64) {
        self.immunities.push((effect_type.to_string(), duration));
    }

    fn mark_dirty(&mut self) {
        self.dirty += 1;
    }

    fn apply_damage(&mut self, amount: f64, damage_type: DamageType) {
        self.damage.push((amount, damage_type));
    }
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
