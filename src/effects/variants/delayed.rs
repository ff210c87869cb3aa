//! Effects that add another effect when they expire
//!
//! The follow-up effect is created from the registry, takes this effect's
//! intensity times `scale` and is queued on the owner. It starts on the
//! owner's next flush, never during the pass that queued it. With `repeat`
//! set, a follow-up is also queued on every interval.

use tracing::{debug, warn};

use super::VariantHooks;
use crate::attributes::AttributeTree;
use crate::effects::effect::EffectState;
use crate::effects::format::FormatArg;
use crate::effects::host::{Detached, EffectHost};
use crate::effects::kind::EffectType;

#[derive(Debug, Clone, PartialEq)]
pub struct DelayedEffect {
    effect: String,
    scale: f64,
    repeat: bool,
}

impl Default for DelayedEffect {
    fn default() -> Self {
        Self {
            effect: String::new(),
            scale: 1.0,
            repeat: false,
        }
    }
}

impl DelayedEffect {
    /// Name of the effect added on expiry
    pub fn effect(&self) -> &str {
        &self.effect
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Whether every interval also queues a follow-up
    pub fn repeats(&self) -> bool {
        self.repeat
    }

    fn queue_follow_up(
        &self,
        effect_type: &EffectType,
        state: &EffectState,
        host: &mut dyn EffectHost,
    ) {
        if self.effect.is_empty() {
            return;
        }
        let created = effect_type
            .registry()
            .and_then(|registry| registry.create_effect(&self.effect));
        let Some(mut follow_up) = created else {
            warn!(
                "Effect {} triggers unknown effect type {}",
                effect_type.name(),
                self.effect
            );
            return;
        };

        let intensity = state.intensity() * self.scale;
        let stacks = state.stacks();
        // Stacks clamp against the follow-up's own max
        follow_up.update(intensity, Some(stacks), &mut Detached);
        debug!("Effect {} triggered {}", effect_type.name(), self.effect);
        host.add_effect(follow_up);
    }
}

impl VariantHooks for DelayedEffect {
    fn read_tree(&mut self, tree: &AttributeTree) {
        self.effect = tree.get_string("effect", &self.effect);
        self.scale = tree.get_float("scale", self.scale);
        self.repeat = tree.get_bool("repeat", self.repeat);
    }

    fn write_tree(&self, tree: &mut AttributeTree) {
        tree.set_string("effect", &self.effect);
        tree.set_float("scale", self.scale);
        tree.set_bool("repeat", self.repeat);
    }

    fn on_interval(
        &mut self,
        effect_type: &EffectType,
        state: &EffectState,
        host: &mut dyn EffectHost,
    ) {
        if self.repeat {
            self.queue_follow_up(effect_type, state, host);
        }
    }

    fn on_expires(
        &mut self,
        effect_type: &EffectType,
        state: &EffectState,
        host: &mut dyn EffectHost,
    ) {
        self.queue_follow_up(effect_type, state, host);
    }

    fn description_args(&self, _state: &EffectState) -> Vec<FormatArg> {
        vec![self.effect.as_str().into()]
    }
}
