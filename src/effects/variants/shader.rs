//! Overlay intensity drivers

use super::VariantHooks;
use crate::attributes::AttributeTree;
use crate::effects::effect::EffectState;
use crate::effects::host::EffectHost;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderEffect {
    shader: String,
}

impl ShaderEffect {
    pub fn shader(&self) -> &str {
        &self.shader
    }

    fn drive(&self, value: f64, host: &mut dyn EffectHost) {
        if !self.shader.is_empty() {
            host.set_shader_intensity(&self.shader, value);
        }
    }
}

impl VariantHooks for ShaderEffect {
    fn read_tree(&mut self, tree: &AttributeTree) {
        self.shader = tree.get_string("shader", &self.shader);
    }

    fn write_tree(&self, tree: &mut AttributeTree) {
        tree.set_string("shader", &self.shader);
    }

    fn on_start(&mut self, state: &EffectState, host: &mut dyn EffectHost) {
        self.drive(state.resulting_intensity(), host);
    }

    fn on_update(&mut self, state: &EffectState, host: &mut dyn EffectHost) {
        self.drive(state.resulting_intensity(), host);
    }

    fn on_end(&mut self, _state: &EffectState, host: &mut dyn EffectHost) {
        self.drive(0.0, host);
    }
}
