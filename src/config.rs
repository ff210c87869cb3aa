//! Simulation configuration
//!
//! Layered with figment: built-in defaults, then an optional TOML file,
//! then `AFFLICT_*` environment variables.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::effects::{
    ChanceTrigger, EffectError, EffectRegistry, EffectRegistryBuilder, DISEASE_TRIGGER,
};
use crate::entity::Position;
use crate::world::World;

/// An entity created when the simulation starts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub position: Position,
    /// Effect type names added right after spawning
    pub effects: Vec<String>,
}

/// Trigger bound to a disease type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Disease effect type name
    pub disease: String,
    pub susceptibility: f64,
    pub base_chance: f64,
    pub recovery_threshold: f64,
    pub intensity_scale: f64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            disease: "flu".to_string(),
            susceptibility: 1.0,
            base_chance: 0.0,
            recovery_threshold: 1.0,
            intensity_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds advanced per tick
    pub tick_seconds: f64,
    pub ticks: u64,
    pub seed: u64,
    /// SQLite file for saving entity state; None = don't persist
    pub db_path: Option<String>,
    /// JSON file of extra effect type definitions
    pub definitions: Option<PathBuf>,
    pub entities: Vec<SpawnConfig>,
    pub triggers: Vec<TriggerConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_seconds: 1.0,
            ticks: 120,
            seed: 42,
            db_path: None,
            definitions: None,
            entities: vec![
                SpawnConfig {
                    position: Position::new(0.0, 0.0, 0.0),
                    effects: vec!["flu".to_string(), "haste".to_string()],
                },
                SpawnConfig {
                    position: Position::new(2.0, 0.0, 1.0),
                    effects: vec!["delayed_poison".to_string()],
                },
                SpawnConfig {
                    position: Position::new(4.0, 0.5, -1.0),
                    effects: vec!["exhaustion".to_string(), "regeneration".to_string()],
                },
            ],
            triggers: Vec::new(),
        }
    }
}

impl Config {
    /// Configuration layers, lowest priority first
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("AFFLICT_"))
    }

    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    /// Built-in catalog, plus the definitions file and configured triggers
    pub fn build_registry(&self) -> Result<Arc<EffectRegistry>, EffectError> {
        let mut builder = EffectRegistryBuilder::with_defaults();
        if let Some(path) = &self.definitions {
            builder.load_definitions(path)?;
        }

        for (index, trigger) in self.triggers.iter().enumerate() {
            let chance = ChanceTrigger::seeded(self.seed.wrapping_add(index as u64))
                .with_susceptibility(trigger.susceptibility)
                .with_base_chance(trigger.base_chance)
                .with_recovery_threshold(trigger.recovery_threshold)
                .with_intensity_scale(trigger.intensity_scale);
            builder.register_trigger(&trigger.disease, DISEASE_TRIGGER, Arc::new(chance));
        }

        let registry = builder.build();
        info!("Effect registry ready with {} types", registry.len());
        Ok(registry)
    }

    /// Spawn the configured entities into a fresh world
    pub fn build_world(&self, registry: Arc<EffectRegistry>) -> World {
        let mut world = World::new(registry, self.seed);
        for spawn in &self.entities {
            let id = world.spawn(spawn.position);
            for name in &spawn.effects {
                if world.add_effect(id, name).is_none() {
                    warn!("Unknown effect type {} for {}", name, id);
                }
            }
        }
        world
    }
}
