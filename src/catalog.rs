//! Built-in effect catalog
//!
//! A small set of ready-made effect types covering every variant. Loaded
//! by `EffectRegistryBuilder::with_defaults`; definition files loaded later
//! replace entries with the same name.

use serde_json::{json, Value};

use crate::attributes::AttributeTree;
use crate::effects::{EffectTypeDef, VariantKind};

fn tree(value: Value) -> AttributeTree {
    AttributeTree::from_value(value).unwrap_or_default()
}

/// Definitions of the built-in effect types
pub fn builtin_definitions() -> Vec<EffectTypeDef> {
    vec![
        // poison - stacking damage over time
        EffectTypeDef::new("poison", VariantKind::Damage)
            .with_display_name("Poisoned")
            .with_description("Deals {0:.1} {2} damage every {1}s")
            .with_category("poison")
            .with_icon("poison")
            .with_defaults(tree(json!({
                "duration": 10.0,
                "interval": 1.0,
                "intensity": 1.0,
                "max_stacks": 5,
                "expires_over_time": true,
                "damage_type": "poison"
            }))),

        // regeneration - healing over time
        EffectTypeDef::new("regeneration", VariantKind::Heal)
            .with_display_name("Regenerating")
            .with_description("Restores {0:.1} health every {1}s")
            .with_category("buff")
            .with_defaults(tree(json!({
                "duration": 20.0,
                "interval": 2.0,
                "intensity": 1.0,
                "max_stacks": 3,
                "expires_over_time": true
            }))),

        // haste and slow share a group: one replaces the other
        EffectTypeDef::new("haste", VariantKind::Stat)
            .with_display_name("Haste")
            .with_description("Speed +{0:.2}")
            .with_group("speed")
            .with_category("buff")
            .with_defaults(tree(json!({
                "duration": 15.0,
                "intensity": 0.2,
                "max_stacks": 3,
                "expires_over_time": true,
                "stats": { "move_speed": 1.0, "attack_speed": 0.5 }
            }))),
        EffectTypeDef::new("slow", VariantKind::Stat)
            .with_display_name("Slowed")
            .with_description("Speed -{0:.2}")
            .with_group("speed")
            .with_category("debuff")
            .with_defaults(tree(json!({
                "duration": 10.0,
                "intensity": 0.3,
                "expires_over_time": true,
                "stats": { "move_speed": -1.0 }
            }))),

        EffectTypeDef::new("mining_speed", VariantKind::MiningSpeed)
            .with_display_name("Mining Speed")
            .with_description("Mining speed +{0:.2}")
            .with_category("buff")
            .with_defaults(tree(json!({
                "duration": 60.0,
                "intensity": 0.5,
                "expires_over_time": true
            }))),

        // Symptoms; intensities are driven by the owning disease
        EffectTypeDef::new("fever", VariantKind::Attribute)
            .with_display_name("Fever")
            .with_description("Body temperature +{0:.1}")
            .with_category("symptom")
            .with_defaults(tree(json!({
                "attribute": "temperature_offset",
                "resting": 0.0,
                "intensity": 0.0
            }))),
        EffectTypeDef::new("nausea", VariantKind::Shader)
            .with_display_name("Nausea")
            .with_category("symptom")
            .with_defaults(tree(json!({
                "shader": "nausea",
                "intensity": 0.0
            }))),
        EffectTypeDef::new("cough", VariantKind::Sound)
            .with_display_name("Coughing")
            .with_category("symptom")
            .with_defaults(tree(json!({
                "interval": 5.0,
                "intensity": 0.0,
                "clip": "cough"
            }))),
        EffectTypeDef::new("shivering", VariantKind::Animation)
            .with_display_name("Shivering")
            .with_category("symptom")
            .with_defaults(tree(json!({
                "interval": 3.0,
                "intensity": 0.0,
                "clip": "shiver"
            }))),

        // delayed_poison - poisons the owner when it runs out
        EffectTypeDef::new("delayed_poison", VariantKind::Trigger)
            .with_display_name("Venom")
            .with_description("Turns into {2}")
            .with_category("poison")
            .with_defaults(tree(json!({
                "duration": 5.0,
                "intensity": 1.0,
                "max_stacks": 5,
                "expires_over_time": true,
                "effect": "poison",
                "scale": 1.0
            }))),

        // exhaustion - condition bundling slow and reduced mining speed
        EffectTypeDef::new("exhaustion", VariantKind::Condition)
            .with_display_name("Exhausted")
            .with_category("debuff")
            .with_defaults(tree(json!({
                "duration": 30.0,
                "max_stacks": 3,
                "expires_over_time": true,
                "immunity_duration": 10.0,
                "synchronized_max_stacks": true,
                "effects": {
                    "slow": { "intensity": 0.2 },
                    "mining_speed": { "intensity": -0.3 }
                }
            }))),

        // flu - self-healing, spreading disease
        EffectTypeDef::new("flu", VariantKind::Disease)
            .with_display_name("Flu")
            .with_description("Recovering at {2:.3}/s")
            .with_category("disease")
            .with_defaults(tree(json!({
                "interval": 1.0,
                "intensity": 0.3,
                "expires_through_intensity": true,
                "immunity_duration": 300.0,
                "healing_rate": 0.002,
                "healing_growth": 0.0005,
                "min_healing_rate": 0.0,
                "max_healing_rate": 0.02,
                "max_healing_growth": 0.002,
                "spread_range": 5.0,
                "spread_chance": 0.0005,
                "symptoms": {
                    "cough": { "threshold": 0.2, "max_intensity": 0.5 },
                    "fever": { "threshold": 0.4, "max_intensity": 3.0 },
                    "shivering": { "threshold": 0.5, "max_intensity": 0.4 },
                    "nausea": { "threshold": 0.7, "max_intensity": 1.0 }
                }
            }))),
    ]
}
