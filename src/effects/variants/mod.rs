//! Effect variant behaviors
//!
//! The closed set of behaviors an effect type can instantiate. Simple
//! variants implement `VariantHooks`; conditions and diseases own child
//! effects and are driven directly by `Effect`.

mod attribute;
mod chance;
mod damage;
mod delayed;
mod shader;
mod stat;

pub use attribute::AttributeEffect;
pub use chance::{ChanceEffect, ChanceOutput};
pub use damage::{DamageEffect, DamageType};
pub use delayed::DelayedEffect;
pub use shader::ShaderEffect;
pub use stat::StatEffect;

use super::condition::Condition;
use super::disease::Disease;
use super::effect::EffectState;
use super::format::FormatArg;
use super::host::EffectHost;
use super::kind::{EffectType, VariantKind};
use crate::attributes::AttributeTree;

/// Lifecycle hooks for the simple variants. Defaults do nothing.
pub(crate) trait VariantHooks {
    /// Load variant parameters
    fn read_tree(&mut self, _tree: &AttributeTree) {}

    /// Persist variant parameters
    fn write_tree(&self, _tree: &mut AttributeTree) {}

    fn on_start(&mut self, _state: &EffectState, _host: &mut dyn EffectHost) {}

    fn on_end(&mut self, _state: &EffectState, _host: &mut dyn EffectHost) {}

    fn on_interval(
        &mut self,
        _effect_type: &EffectType,
        _state: &EffectState,
        _host: &mut dyn EffectHost,
    ) {
    }

    /// Intensity or stacks changed while running
    fn on_update(&mut self, _state: &EffectState, _host: &mut dyn EffectHost) {}

    /// Natural expiry, before the effect ends
    fn on_expires(
        &mut self,
        _effect_type: &EffectType,
        _state: &EffectState,
        _host: &mut dyn EffectHost,
    ) {
    }

    /// Extra description arguments after intensity and interval
    fn description_args(&self, _state: &EffectState) -> Vec<FormatArg> {
        Vec::new()
    }
}

/// The behavior attached to an effect instance
#[derive(Debug, Clone)]
pub enum Behavior {
    Plain,
    Damage(DamageEffect),
    Stat(StatEffect),
    Attribute(AttributeEffect),
    Chance(ChanceEffect),
    Shader(ShaderEffect),
    Delayed(DelayedEffect),
    Condition(Condition),
    Disease(Disease),
}

impl Behavior {
    /// Fresh behavior for a variant, before defaults are applied
    pub(crate) fn for_variant(kind: VariantKind) -> Self {
        match kind {
            VariantKind::Effect => Behavior::Plain,
            VariantKind::Damage => Behavior::Damage(DamageEffect::damage()),
            VariantKind::Heal => Behavior::Damage(DamageEffect::heal()),
            VariantKind::Stat => Behavior::Stat(StatEffect::default()),
            VariantKind::MiningSpeed => Behavior::Stat(StatEffect::mining_speed()),
            VariantKind::Attribute => Behavior::Attribute(AttributeEffect::default()),
            VariantKind::Animation => Behavior::Chance(ChanceEffect::new(ChanceOutput::Animation)),
            VariantKind::Sound => Behavior::Chance(ChanceEffect::new(ChanceOutput::Sound)),
            VariantKind::Shader => Behavior::Shader(ShaderEffect::default()),
            VariantKind::Trigger => Behavior::Delayed(DelayedEffect::default()),
            VariantKind::Condition => Behavior::Condition(Condition::default()),
            VariantKind::Disease => Behavior::Disease(Disease::default()),
        }
    }

    /// Hooks of a simple variant; `None` for plain and composite behaviors
    pub(crate) fn hooks_mut(&mut self) -> Option<&mut dyn VariantHooks> {
        match self {
            Behavior::Damage(b) => Some(b),
            Behavior::Stat(b) => Some(b),
            Behavior::Attribute(b) => Some(b),
            Behavior::Chance(b) => Some(b),
            Behavior::Shader(b) => Some(b),
            Behavior::Delayed(b) => Some(b),
            Behavior::Plain | Behavior::Condition(_) | Behavior::Disease(_) => None,
        }
    }

    pub(crate) fn hooks(&self) -> Option<&dyn VariantHooks> {
        match self {
            Behavior::Damage(b) => Some(b),
            Behavior::Stat(b) => Some(b),
            Behavior::Attribute(b) => Some(b),
            Behavior::Chance(b) => Some(b),
            Behavior::Shader(b) => Some(b),
            Behavior::Delayed(b) => Some(b),
            Behavior::Plain | Behavior::Condition(_) | Behavior::Disease(_) => None,
        }
    }

    /// Child container for conditions and diseases
    pub fn condition(&self) -> Option<&Condition> {
        match self {
            Behavior::Condition(c) => Some(c),
            Behavior::Disease(d) => Some(d.condition()),
            _ => None,
        }
    }

    pub fn condition_mut(&mut self) -> Option<&mut Condition> {
        match self {
            Behavior::Condition(c) => Some(c),
            Behavior::Disease(d) => Some(d.condition_mut()),
            _ => None,
        }
    }
}
