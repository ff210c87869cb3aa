//! Probability triggers consulted for chance-based transitions

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::host::EntityId;

/// Trigger kind used by diseases for spread and recovery
pub const DISEASE_TRIGGER: &str = "disease";

/// Opaque probability strategy
pub trait Trigger: std::fmt::Debug + Send + Sync {
    /// Roll against `chance` for the given target
    fn should_trigger(&self, target: EntityId, chance: f64) -> bool;

    /// Current chance for `entity`, scaled by `scale`
    fn chance(&self, entity: Option<EntityId>, scale: f64) -> f64;

    /// A chance above this value counts as recovering
    fn recovery_threshold(&self) -> f64;

    /// Map a uniform draw onto an initial intensity
    fn scale_intensity(&self, target: EntityId, value: f64) -> f64;
}

/// Trigger backed by a seeded RNG
#[derive(Debug)]
pub struct ChanceTrigger {
    rng: Mutex<StdRng>,
    /// Multiplier applied to every roll
    pub susceptibility: f64,
    /// Base value reported by `chance`
    pub base_chance: f64,
    pub recovery_threshold: f64,
    /// Multiplier applied to spread intensity draws
    pub intensity_scale: f64,
}

impl ChanceTrigger {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            susceptibility: 1.0,
            base_chance: 0.0,
            recovery_threshold: 1.0,
            intensity_scale: 1.0,
        }
    }

    pub fn with_susceptibility(mut self, susceptibility: f64) -> Self {
        self.susceptibility = susceptibility;
        self
    }

    pub fn with_base_chance(mut self, chance: f64) -> Self {
        self.base_chance = chance;
        self
    }

    pub fn with_recovery_threshold(mut self, threshold: f64) -> Self {
        self.recovery_threshold = threshold;
        self
    }

    pub fn with_intensity_scale(mut self, scale: f64) -> Self {
        self.intensity_scale = scale;
        self
    }
}

impl Trigger for ChanceTrigger {
    fn should_trigger(&self, _target: EntityId, chance: f64) -> bool {
        let chance = chance * self.susceptibility;
        if chance <= 0.0 {
            return false;
        }
        self.rng.lock().random::<f64>() < chance
    }

    fn chance(&self, _entity: Option<EntityId>, scale: f64) -> f64 {
        self.base_chance * scale
    }

    fn recovery_threshold(&self) -> f64 {
        self.recovery_threshold
    }

    fn scale_intensity(&self, _target: EntityId, value: f64) -> f64 {
        (value * self.intensity_scale).clamp(0.0, 1.0)
    }
}
