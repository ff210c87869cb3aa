//! Periodic damage and healing
//!
//! Each interval deals the resulting intensity as damage of the configured
//! type. Healing variants deal it as negative damage.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::VariantHooks;
use crate::attributes::AttributeTree;
use crate::effects::effect::EffectState;
use crate::effects::format::FormatArg;
use crate::effects::host::EffectHost;
use crate::effects::kind::EffectType;

/// Types of damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DamageType {
    /// Untyped damage
    #[default]
    Generic,
    /// Physical damage (cuts, bruises, falls)
    Physical,
    Fire,
    /// Cold/ice damage
    Cold,
    Poison,
    /// Illness damage dealt by disease symptoms
    Disease,
    /// Necrotic/death damage
    Necrotic,
    /// Radiant/holy damage
    Radiant,
}

impl DamageType {
    pub fn all() -> &'static [DamageType] {
        &[
            DamageType::Generic,
            DamageType::Physical,
            DamageType::Fire,
            DamageType::Cold,
            DamageType::Poison,
            DamageType::Disease,
            DamageType::Necrotic,
            DamageType::Radiant,
        ]
    }
}

impl FromStr for DamageType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generic" => Ok(DamageType::Generic),
            "physical" => Ok(DamageType::Physical),
            "fire" => Ok(DamageType::Fire),
            "cold" | "ice" => Ok(DamageType::Cold),
            "poison" => Ok(DamageType::Poison),
            "disease" | "sickness" => Ok(DamageType::Disease),
            "necrotic" => Ok(DamageType::Necrotic),
            "radiant" | "holy" => Ok(DamageType::Radiant),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for DamageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DamageType::Generic => "generic",
            DamageType::Physical => "physical",
            DamageType::Fire => "fire",
            DamageType::Cold => "cold",
            DamageType::Poison => "poison",
            DamageType::Disease => "disease",
            DamageType::Necrotic => "necrotic",
            DamageType::Radiant => "radiant",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DamageEffect {
    damage_type: DamageType,
    heal: bool,
}

impl DamageEffect {
    pub fn damage() -> Self {
        Self {
            damage_type: DamageType::Generic,
            heal: false,
        }
    }

    pub fn heal() -> Self {
        Self {
            damage_type: DamageType::Generic,
            heal: true,
        }
    }

    pub fn damage_type(&self) -> DamageType {
        self.damage_type
    }

    pub fn is_heal(&self) -> bool {
        self.heal
    }

    /// Signed amount dealt per interval
    pub fn amount(&self, state: &EffectState) -> f64 {
        let amount = state.resulting_intensity();
        if self.heal {
            -amount
        } else {
            amount
        }
    }
}

impl VariantHooks for DamageEffect {
    fn read_tree(&mut self, tree: &AttributeTree) {
        let name = tree.get_string("damage_type", &self.damage_type.to_string());
        if let Ok(damage_type) = name.parse() {
            self.damage_type = damage_type;
        }
    }

    fn write_tree(&self, tree: &mut AttributeTree) {
        tree.set_string("damage_type", &self.damage_type.to_string());
    }

    fn on_interval(
        &mut self,
        _effect_type: &EffectType,
        state: &EffectState,
        host: &mut dyn EffectHost,
    ) {
        host.apply_damage(self.amount(state), self.damage_type);
    }

    fn description_args(&self, _state: &EffectState) -> Vec<FormatArg> {
        vec![self.damage_type.to_string().into()]
    }
}
