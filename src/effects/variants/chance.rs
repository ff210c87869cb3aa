//! Chance-based animations and sounds
//!
//! Every interval the owner rolls against the resulting intensity, clamped
//! to [0, 1], and plays the configured clip on success.

use super::VariantHooks;
use crate::attributes::AttributeTree;
use crate::effects::effect::EffectState;
use crate::effects::format::FormatArg;
use crate::effects::host::EffectHost;
use crate::effects::kind::EffectType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanceOutput {
    Animation,
    Sound,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChanceEffect {
    output: ChanceOutput,
    clip: String,
}

impl ChanceEffect {
    pub fn new(output: ChanceOutput) -> Self {
        Self {
            output,
            clip: String::new(),
        }
    }

    pub fn output(&self) -> ChanceOutput {
        self.output
    }

    pub fn clip(&self) -> &str {
        &self.clip
    }
}

impl VariantHooks for ChanceEffect {
    fn read_tree(&mut self, tree: &AttributeTree) {
        self.clip = tree.get_string("clip", &self.clip);
    }

    fn write_tree(&self, tree: &mut AttributeTree) {
        tree.set_string("clip", &self.clip);
    }

    fn on_interval(
        &mut self,
        _effect_type: &EffectType,
        state: &EffectState,
        host: &mut dyn EffectHost,
    ) {
        if self.clip.is_empty() {
            return;
        }
        let chance = state.resulting_intensity().clamp(0.0, 1.0);
        if !host.roll(chance) {
            return;
        }
        match self.output {
            ChanceOutput::Animation => host.play_animation(&self.clip),
            ChanceOutput::Sound => host.play_sound(&self.clip),
        }
    }

    fn description_args(&self, _state: &EffectState) -> Vec<FormatArg> {
        vec![self.clip.as_str().into()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::kind::{EffectType, EffectTypeDef, VariantKind};
    use crate::effects::testing::RecordingHost;
    use crate::effects::Effect;

    fn create(kind: VariantKind, clip: &str, intensity: f64) -> Effect {
        let mut defaults = AttributeTree::new();
        defaults.set_string("clip", clip);
        defaults.set_float("interval", 1.0);
        defaults.set_float("intensity", intensity);
        EffectType::standalone(EffectTypeDef::new("twitch", kind).with_defaults(defaults))
            .unwrap()
            .create()
    }

    #[test]
    fn test_animation_plays_on_successful_roll() {
        let mut effect = create(VariantKind::Animation, "shiver", 0.25);
        let mut host = RecordingHost {
            roll_result: true,
            ..Default::default()
        };
        effect.on_start(&mut host);
        effect.on_tick(1.5, &mut host);
        assert_eq!(host.rolls, vec![0.25]);
        assert_eq!(host.animations, vec!["shiver".to_string()]);
        assert!(host.sounds.is_empty());
    }

    #[test]
    fn test_sound_chance_is_clamped() {
        let mut effect = create(VariantKind::Sound, "cough", 4.0);
        let mut host = RecordingHost::default();
        effect.on_start(&mut host);
        effect.on_tick(1.5, &mut host);
        assert_eq!(host.rolls, vec![1.0]);
        assert!(host.sounds.is_empty());
    }

    #[test]
    fn test_tree_round_trip() {
        for kind in [VariantKind::Animation, VariantKind::Sound] {
            let effect = create(kind, "shiver", 0.5);
            let tree = effect.to_tree();

            let mut restored = EffectType::standalone(EffectTypeDef::new("twitch", kind))
                .unwrap()
                .create();
            restored.from_tree(&tree, &mut RecordingHost::default());
            assert_eq!(restored.to_tree(), tree);
        }

        let mut restored = EffectType::standalone(EffectTypeDef::new("twitch", VariantKind::Sound))
            .unwrap()
            .create();
        restored.from_tree(
            &create(VariantKind::Sound, "cough", 1.0).to_tree(),
            &mut RecordingHost::default(),
        );
        let mut host = RecordingHost {
            roll_result: true,
            ..Default::default()
        };
        restored.on_start(&mut host);
        restored.on_tick(1.5, &mut host);
        assert_eq!(host.sounds, vec!["cough".to_string()]);
    }
}
