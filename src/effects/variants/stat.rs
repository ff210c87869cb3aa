//! Multiplicative stat bonuses
//!
//! The resulting intensity, scaled by a per-stat weight, is added to each
//! named multiplier on start, re-applied as a delta on every update and
//! withdrawn on end.

use super::VariantHooks;
use crate::attributes::AttributeTree;
use crate::effects::effect::EffectState;
use crate::effects::format::FormatArg;
use crate::effects::host::EffectHost;

pub const MINING_SPEED: &str = "mining_speed";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatEffect {
    stats: Vec<(String, f64)>,
    /// Resulting intensity currently applied to the owner
    applied: f64,
}

impl StatEffect {
    pub fn mining_speed() -> Self {
        Self {
            stats: vec![(MINING_SPEED.to_string(), 1.0)],
            applied: 0.0,
        }
    }

    /// Affected stats and their weights
    pub fn stats(&self) -> &[(String, f64)] {
        &self.stats
    }

    pub fn applied(&self) -> f64 {
        self.applied
    }

    fn apply(&self, delta: f64, host: &mut dyn EffectHost) {
        if delta == 0.0 {
            return;
        }
        for (stat, weight) in &self.stats {
            host.apply_multiplier(stat, weight * delta);
        }
    }
}

impl VariantHooks for StatEffect {
    fn read_tree(&mut self, tree: &AttributeTree) {
        let Some(stats) = tree.get_tree("stats") else {
            return;
        };
        self.stats = stats
            .keys()
            .map(|name| (name.to_string(), stats.get_float(name, f64::NAN)))
            .filter(|(_, weight)| weight.is_finite())
            .collect();
    }

    fn write_tree(&self, tree: &mut AttributeTree) {
        let mut stats = AttributeTree::new();
        for (name, weight) in &self.stats {
            stats.set_float(name, *weight);
        }
        tree.set_tree("stats", stats);
    }

    fn on_start(&mut self, state: &EffectState, host: &mut dyn EffectHost) {
        self.applied = state.resulting_intensity();
        self.apply(self.applied, host);
    }

    fn on_update(&mut self, state: &EffectState, host: &mut dyn EffectHost) {
        let target = state.resulting_intensity();
        self.apply(target - self.applied, host);
        self.applied = target;
    }

    fn on_end(&mut self, _state: &EffectState, host: &mut dyn EffectHost) {
        self.apply(-self.applied, host);
        self.applied = 0.0;
    }

    fn description_args(&self, _state: &EffectState) -> Vec<FormatArg> {
        let names: Vec<&str> = self.stats.iter().map(|(n, _)| n.as_str()).collect();
        vec![names.join(", ").into()]
    }
}
