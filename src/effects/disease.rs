//! Diseases - conditions with symptoms, self-healing and spread
//!
//! Symptoms are child effects gated on the disease intensity. Healing runs
//! on a fixed one second cadence and spread on a fixed thirty second
//! cadence, both measured against the disease's own runtime and checked
//! whenever its interval fires.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::condition::Condition;
use super::effect::{CureProps, EffectState};
use super::format::FormatArg;
use super::host::{Detached, EffectHost};
use super::kind::EffectType;
use super::trigger::{Trigger, DISEASE_TRIGGER};
use crate::attributes::AttributeTree;

/// Seconds between healing steps
pub const HEALING_INTERVAL: f64 = 1.0;

/// Seconds between spread attempts
pub const SPREAD_INTERVAL: f64 = 30.0;

/// A threshold-gated child effect
#[derive(Debug, Clone, PartialEq)]
pub struct Symptom {
    /// Disease intensity in [0, 1] at which the symptom appears
    pub threshold: f64,
    pub effect_name: String,
    /// Symptom intensity when the disease is at full strength
    pub max_intensity: f64,
    /// Applied to the symptom effect when it is created
    pub params: AttributeTree,
}

impl Symptom {
    /// Position of `intensity` between the threshold and 1
    pub fn local_intensity(&self, intensity: f64) -> f64 {
        if self.threshold >= 1.0 {
            1.0
        } else {
            (intensity - self.threshold) / (1.0 - self.threshold)
        }
    }
}

#[derive(Debug, Clone)]
pub struct Disease {
    condition: Condition,
    symptoms: Vec<Symptom>,
    spread_range: f64,
    spread_chance: f64,
    last_spread_trigger: f64,
    last_healing_trigger: f64,
    healing_rate: f64,
    healing_growth: f64,
    min_healing_rate: f64,
    max_healing_rate: f64,
    max_healing_growth: f64,
    trigger: Option<Arc<dyn Trigger>>,
}

impl Default for Disease {
    fn default() -> Self {
        Self {
            condition: Condition::default(),
            symptoms: Vec::new(),
            spread_range: 0.0,
            spread_chance: 0.0,
            last_spread_trigger: 0.0,
            last_healing_trigger: 0.0,
            healing_rate: 0.0,
            healing_growth: 0.0,
            min_healing_rate: 0.0,
            max_healing_rate: 1.0,
            max_healing_growth: 1.0,
            trigger: None,
        }
    }
}

impl Disease {
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn condition_mut(&mut self) -> &mut Condition {
        &mut self.condition
    }

    pub(crate) fn into_condition(self) -> Condition {
        self.condition
    }

    pub fn symptoms(&self) -> &[Symptom] {
        &self.symptoms
    }

    pub fn spread_range(&self) -> f64 {
        self.spread_range
    }

    pub fn spread_chance(&self) -> f64 {
        self.spread_chance
    }

    pub fn healing_rate(&self) -> f64 {
        self.healing_rate
    }

    pub fn healing_growth(&self) -> f64 {
        self.healing_growth
    }

    pub fn last_healing_trigger(&self) -> f64 {
        self.last_healing_trigger
    }

    pub fn last_spread_trigger(&self) -> f64 {
        self.last_spread_trigger
    }

    pub fn trigger(&self) -> Option<&Arc<dyn Trigger>> {
        self.trigger.as_ref()
    }

    pub fn set_trigger(&mut self, trigger: Option<Arc<dyn Trigger>>) {
        self.trigger = trigger;
    }

    /// Keep the healing and spread phases across a runtime reset
    pub(crate) fn shift_checkpoints(&mut self, offset: f64) {
        self.last_healing_trigger += offset;
        self.last_spread_trigger += offset;
    }

    pub(crate) fn on_start(
        &mut self,
        effect_type: &EffectType,
        state: &EffectState,
        host: &mut dyn EffectHost,
    ) {
        if self.trigger.is_none() {
            self.trigger = effect_type
                .registry()
                .and_then(|registry| registry.find_trigger(effect_type.name(), DISEASE_TRIGGER));
        }
        self.condition.start_children(host);
        self.check_symptoms(effect_type, state, host);
    }

    /// Set intensity and stacks directly, then re-check symptoms
    pub(crate) fn update(
        &mut self,
        effect_type: &EffectType,
        state: &mut EffectState,
        intensity: f64,
        stacks: Option<u32>,
        host: &mut dyn EffectHost,
    ) {
        state.intensity = intensity;
        if let Some(stacks) = stacks {
            state.set_stacks(stacks as i64);
        }
        if state.running {
            host.mark_dirty();
        }
        self.check_symptoms(effect_type, state, host);
    }

    /// Add symptoms at or above their threshold, drop those below it, then
    /// rescale every present symptom.
    pub(crate) fn check_symptoms(
        &mut self,
        effect_type: &EffectType,
        state: &EffectState,
        host: &mut dyn EffectHost,
    ) {
        let intensity = state.intensity;

        for symptom in &self.symptoms {
            let name = symptom.effect_name.as_str();
            let present = self.condition.contains(name);

            if intensity < symptom.threshold && present {
                self.condition.remove_effect(name, host);
                debug!("Disease {} dropped symptom {}", effect_type.name(), name);
            } else if intensity >= symptom.threshold && !present {
                let created = effect_type
                    .registry()
                    .and_then(|registry| registry.create_effect(name));
                match created {
                    Some(mut effect) => {
                        effect.from_tree(&symptom.params, &mut Detached);
                        self.condition
                            .add_effect(state, effect, state.running, host);
                        debug!("Disease {} developed symptom {}", effect_type.name(), name);
                    }
                    None => {
                        warn!(
                            "Disease {} references unknown symptom {}",
                            effect_type.name(),
                            name
                        );
                        continue;
                    }
                }
            }

            if let Some(child) = self.condition.child_mut(name) {
                let stacks = child.stacks();
                let local = symptom.local_intensity(intensity);
                child.update(local * symptom.max_intensity, Some(stacks), host);
            }
        }
    }

    pub(crate) fn on_interval(
        &mut self,
        effect_type: &EffectType,
        state: &mut EffectState,
        host: &mut dyn EffectHost,
    ) {
        self.check_healing(effect_type, state, host);
        self.check_spread(effect_type, state, host);
        self.condition.on_interval(state, host);
    }

    /// Decay intensity by the healing rate once per elapsed healing step,
    /// then grow the rate unless the trigger reports recovery.
    fn check_healing(
        &mut self,
        effect_type: &EffectType,
        state: &mut EffectState,
        host: &mut dyn EffectHost,
    ) {
        let steps = ((state.runtime - self.last_healing_trigger) / HEALING_INTERVAL).floor();
        if steps < 1.0 {
            return;
        }
        self.last_healing_trigger += steps * HEALING_INTERVAL;

        let intensity = (state.intensity - self.healing_rate * steps).clamp(0.0, 1.0);
        if intensity != state.intensity {
            self.update(effect_type, state, intensity, None, host);
        }

        let recovering = self.trigger.as_ref().is_some_and(|trigger| {
            trigger.chance(host.entity(), 1.0) > trigger.recovery_threshold()
        });
        if !recovering {
            self.healing_rate = (self.healing_rate + self.healing_growth)
                .clamp(self.min_healing_rate, self.max_healing_rate.max(self.min_healing_rate));
        }
    }

    /// Roll a fresh infection against every neighbour in range
    fn check_spread(
        &mut self,
        effect_type: &EffectType,
        state: &EffectState,
        host: &mut dyn EffectHost,
    ) {
        let periods = ((state.runtime - self.last_spread_trigger) / SPREAD_INTERVAL).floor();
        if periods < 1.0 {
            return;
        }
        self.last_spread_trigger += periods * SPREAD_INTERVAL;

        if self.spread_chance <= 0.0 || self.spread_range <= 0.0 {
            return;
        }
        let Some(registry) = effect_type.registry() else {
            return;
        };

        let range_sq = self.spread_range * self.spread_range;
        for neighbor in host.nearby(self.spread_range, self.spread_range / 2.0) {
            let chance = range_sq
                * SPREAD_INTERVAL
                * (1.0 - neighbor.squared_distance / range_sq)
                * state.intensity
                * self.spread_chance;

            let infected = match &self.trigger {
                Some(trigger) => trigger.should_trigger(neighbor.id, chance),
                None => host.roll(chance),
            };
            if !infected {
                continue;
            }

            let Some(mut effect) = registry.create_effect(effect_type.name()) else {
                continue;
            };
            let draw = host.random();
            let intensity = match &self.trigger {
                Some(trigger) => trigger.scale_intensity(neighbor.id, draw),
                None => draw,
            };
            if let Some(disease) = effect.as_disease_mut() {
                disease.trigger = self.trigger.clone();
            }
            effect.update(intensity, None, &mut Detached);

            info!(
                "Disease {} spread to {} with intensity {:.3}",
                effect_type.name(),
                neighbor.id,
                intensity
            );
            host.spread_effect(neighbor.id, effect);
        }
    }

    /// Cure channels for healing growth and rate, each capped by the cure's
    /// max and the disease's max
    pub(crate) fn cure_healing(&mut self, cure: &CureProps, multiplier: f64) -> bool {
        let mut used = false;

        let growth = cure.healing_growth * multiplier;
        if growth > 0.0 {
            let cap = cure.max_healing_growth.min(self.max_healing_growth);
            let next = (self.healing_growth + growth).min(cap);
            if next > self.healing_growth {
                self.healing_growth = next;
                used = true;
            }
        }

        let rate = cure.healing_rate * multiplier;
        if rate > 0.0 {
            let cap = cure.max_healing_rate.min(self.max_healing_rate);
            let next = (self.healing_rate + rate).min(cap);
            if next > self.healing_rate {
                self.healing_rate = next;
                used = true;
            }
        }

        used
    }

    pub(crate) fn read_tree(&mut self, tree: &AttributeTree) {
        self.condition.read_flags(tree);

        self.spread_range = tree.get_float("spread_range", self.spread_range);
        self.spread_chance = tree.get_float("spread_chance", self.spread_chance);
        self.last_spread_trigger = tree.get_float("last_spread_trigger", self.last_spread_trigger);
        self.last_healing_trigger =
            tree.get_float("last_healing_trigger", self.last_healing_trigger);
        self.healing_rate = tree.get_float("healing_rate", self.healing_rate);
        self.healing_growth = tree.get_float("healing_growth", self.healing_growth);
        self.min_healing_rate = tree.get_float("min_healing_rate", self.min_healing_rate);
        self.max_healing_rate = tree.get_float("max_healing_rate", self.max_healing_rate);
        self.max_healing_growth = tree.get_float("max_healing_growth", self.max_healing_growth);

        let Some(symptoms) = tree.get_tree("symptoms") else {
            return;
        };
        for (name, entry) in symptoms.subtrees() {
            let existing = self.symptoms.iter().position(|s| s.effect_name == name);
            let mut symptom = match existing {
                Some(index) => self.symptoms[index].clone(),
                None => Symptom {
                    threshold: 1.0,
                    effect_name: name.to_string(),
                    max_intensity: 1.0,
                    params: AttributeTree::new(),
                },
            };
            symptom.threshold = entry.get_float("threshold", symptom.threshold);
            symptom.max_intensity = entry.get_float("max_intensity", symptom.max_intensity);
            if let Some(params) = entry.get_tree("params") {
                symptom.params = params;
            }

            match existing {
                Some(index) => self.symptoms[index] = symptom,
                None => self.symptoms.push(symptom),
            }
        }
    }

    pub(crate) fn write_tree(&self, tree: &mut AttributeTree) {
        self.condition.write_tree(tree);

        tree.set_float("spread_range", self.spread_range);
        tree.set_float("spread_chance", self.spread_chance);
        tree.set_float("last_spread_trigger", self.last_spread_trigger);
        tree.set_float("last_healing_trigger", self.last_healing_trigger);
        tree.set_float("healing_rate", self.healing_rate);
        tree.set_float("healing_growth", self.healing_growth);
        tree.set_float("min_healing_rate", self.min_healing_rate);
        tree.set_float("max_healing_rate", self.max_healing_rate);
        tree.set_float("max_healing_growth", self.max_healing_growth);

        let mut symptoms = AttributeTree::new();
        for symptom in &self.symptoms {
            let mut entry = AttributeTree::new();
            entry.set_float("threshold", symptom.threshold);
            entry.set_float("max_intensity", symptom.max_intensity);
            entry.set_tree("params", symptom.params.clone());
            symptoms.set_tree(&symptom.effect_name, entry);
        }
        tree.set_tree("symptoms", symptoms);
    }

    /// `{2}` healing rate, `{3}` spread range
    pub(crate) fn description_args(&self) -> Vec<FormatArg> {
        vec![self.healing_rate.into(), self.spread_range.into()]
    }
}
