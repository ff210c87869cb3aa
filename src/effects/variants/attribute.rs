//! Entity attribute writers
//!
//! While running, a named entity attribute holds the resulting intensity.
//! On end it falls back to the configured resting value.

use super::VariantHooks;
use crate::attributes::AttributeTree;
use crate::effects::effect::EffectState;
use crate::effects::format::FormatArg;
use crate::effects::host::EffectHost;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeEffect {
    key: String,
    resting: f64,
}

impl AttributeEffect {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn resting(&self) -> f64 {
        self.resting
    }

    fn write(&self, value: f64, host: &mut dyn EffectHost) {
        if !self.key.is_empty() {
            host.set_attribute(&self.key, value);
        }
    }
}

impl VariantHooks for AttributeEffect {
    fn read_tree(&mut self, tree: &AttributeTree) {
        self.key = tree.get_string("attribute", &self.key);
        self.resting = tree.get_float("resting", self.resting);
    }

    fn write_tree(&self, tree: &mut AttributeTree) {
        tree.set_string("attribute", &self.key);
        tree.set_float("resting", self.resting);
    }

    fn on_start(&mut self, state: &EffectState, host: &mut dyn EffectHost) {
        self.write(state.resulting_intensity(), host);
    }

    fn on_update(&mut self, state: &EffectState, host: &mut dyn EffectHost) {
        self.write(state.resulting_intensity(), host);
    }

    fn on_end(&mut self, _state: &EffectState, host: &mut dyn EffectHost) {
        self.write(self.resting, host);
    }

    fn description_args(&self, _state: &EffectState) -> Vec<FormatArg> {
        vec![self.key.as_str().into()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::kind::{EffectType, EffectTypeDef, VariantKind};
    use crate::effects::testing::RecordingHost;

    #[test]
    fn test_attribute_lifecycle() {
        let mut defaults = AttributeTree::new();
        defaults.set_string("attribute", "body_temperature");
        defaults.set_float("resting", 37.0);
        defaults.set_float("intensity", 39.5);
        let mut effect = EffectType::standalone(
            EffectTypeDef::new("fever", VariantKind::Attribute).with_defaults(defaults),
        )
        .unwrap()
        .create();

        let mut host = RecordingHost::default();
        effect.on_start(&mut host);
        assert_eq!(host.attributes["body_temperature"], 39.5);

        effect.update(38.0, None, &mut host);
        assert_eq!(host.attributes["body_temperature"], 38.0);

        effect.on_end(&mut host);
        assert_eq!(host.attributes["body_temperature"], 37.0);
    }

    #[test]
    fn test_missing_key_writes_nothing() {
        let mut effect =
            EffectType::standalone(EffectTypeDef::new("blank", VariantKind::Attribute))
                .unwrap()
                .create();
        let mut host = RecordingHost::default();
        effect.on_start(&mut host);
        effect.on_end(&mut host);
        assert!(host.attributes.is_empty());
    }

    #[test]
    fn test_tree_round_trip() {
        let mut defaults = AttributeTree::new();
        defaults.set_string("attribute", "body_temperature");
        defaults.set_float("resting", 37.0);
        defaults.set_float("intensity", 39.5);
        let effect = EffectType::standalone(
            EffectTypeDef::new("fever", VariantKind::Attribute).with_defaults(defaults),
        )
        .unwrap()
        .create();
        let tree = effect.to_tree();

        let mut restored =
            EffectType::standalone(EffectTypeDef::new("fever", VariantKind::Attribute))
                .unwrap()
                .create();
        restored.from_tree(&tree, &mut RecordingHost::default());
        assert_eq!(restored.to_tree(), tree);

        let mut host = RecordingHost::default();
        restored.on_start(&mut host);
        restored.on_end(&mut host);
        assert_eq!(host.attributes["body_temperature"], 37.0);
    }
}
