//! Effect types - immutable descriptors that build effect instances

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::{Arc, Weak};

use super::host::Detached;
use super::registry::{EffectError, EffectRegistry};
use super::Effect;
use crate::attributes::AttributeTree;

/// Which effect behavior an effect type instantiates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    /// Bookkeeping only
    Effect,
    /// Periodic damage
    Damage,
    /// Periodic healing
    Heal,
    /// Named multiplicative stat bonus
    Stat,
    /// Stat bonus bound to mining speed
    MiningSpeed,
    /// Writes an entity attribute
    Attribute,
    /// Chance-based animation
    Animation,
    /// Chance-based sound
    Sound,
    /// Overlay intensity driver
    Shader,
    /// Adds another effect when it expires
    Trigger,
    /// Container of named child effects
    Condition,
    /// Condition with symptoms, healing and spread
    Disease,
}

impl VariantKind {
    /// Variants that own child effects
    pub fn is_composite(&self) -> bool {
        matches!(self, VariantKind::Condition | VariantKind::Disease)
    }
}

impl FromStr for VariantKind {
    type Err = EffectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "effect" | "plain" => Ok(VariantKind::Effect),
            "damage" | "dot" => Ok(VariantKind::Damage),
            "heal" | "regen" => Ok(VariantKind::Heal),
            "stat" => Ok(VariantKind::Stat),
            "mining_speed" | "mining" => Ok(VariantKind::MiningSpeed),
            "attribute" => Ok(VariantKind::Attribute),
            "animation" => Ok(VariantKind::Animation),
            "sound" => Ok(VariantKind::Sound),
            "shader" => Ok(VariantKind::Shader),
            "trigger" => Ok(VariantKind::Trigger),
            "condition" => Ok(VariantKind::Condition),
            "disease" => Ok(VariantKind::Disease),
            _ => Err(EffectError::UnknownVariant(s.to_string())),
        }
    }
}

impl std::fmt::Display for VariantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VariantKind::Effect => "effect",
            VariantKind::Damage => "damage",
            VariantKind::Heal => "heal",
            VariantKind::Stat => "stat",
            VariantKind::MiningSpeed => "mining_speed",
            VariantKind::Attribute => "attribute",
            VariantKind::Animation => "animation",
            VariantKind::Sound => "sound",
            VariantKind::Shader => "shader",
            VariantKind::Trigger => "trigger",
            VariantKind::Condition => "condition",
            VariantKind::Disease => "disease",
        };
        write!(f, "{}", s)
    }
}

/// Serialized definition of an effect type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectTypeDef {
    pub name: String,
    pub variant: String,
    #[serde(default)]
    pub defaults: AttributeTree,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Format string; `{0}` is the resulting intensity, `{1}` the interval
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// Mutual exclusion tag: an entity holds one effect per group
    #[serde(default)]
    pub group: Option<String>,
    /// Free-form tag used by cures and abilities to target effects
    #[serde(default)]
    pub category: Option<String>,
}

impl EffectTypeDef {
    pub fn new(name: &str, variant: VariantKind) -> Self {
        Self {
            name: name.to_string(),
            variant: variant.to_string(),
            defaults: AttributeTree::new(),
            display_name: None,
            description: String::new(),
            icon: None,
            group: None,
            category: None,
        }
    }

    pub fn with_defaults(mut self, defaults: AttributeTree) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_description(mut self, template: &str) -> Self {
        self.description = template.to_string();
        self
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = Some(name.to_string());
        self
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    /// Check the required fields and resolve the variant tag
    pub fn validate(&self) -> Result<VariantKind, EffectError> {
        if self.name.trim().is_empty() {
            return Err(EffectError::EmptyName);
        }
        self.variant.parse()
    }
}

/// Immutable descriptor and factory for one kind of effect
#[derive(Debug)]
pub struct EffectType {
    name: String,
    variant: VariantKind,
    defaults: AttributeTree,
    display_name: String,
    description: String,
    icon: Option<String>,
    group: Option<String>,
    category: Option<String>,
    registry: Weak<EffectRegistry>,
}

impl EffectType {
    pub(crate) fn from_def(
        def: EffectTypeDef,
        variant: VariantKind,
        registry: Weak<EffectRegistry>,
    ) -> Self {
        let display_name = def.display_name.unwrap_or_else(|| def.name.clone());
        Self {
            name: def.name,
            variant,
            defaults: def.defaults,
            display_name,
            description: def.description,
            icon: def.icon,
            group: def.group,
            category: def.category,
            registry,
        }
    }

    /// Build a type outside of any registry. Such types cannot create
    /// related effects (symptoms, triggered effects).
    pub fn standalone(def: EffectTypeDef) -> Result<Arc<Self>, EffectError> {
        let variant = def.validate()?;
        Ok(Arc::new(Self::from_def(def, variant, Weak::new())))
    }

    /// Construct a new instance with the type defaults applied
    pub fn create(self: &Arc<Self>) -> Effect {
        let mut effect = Effect::new(Arc::clone(self));
        effect.from_tree(&self.defaults, &mut Detached);
        effect
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variant(&self) -> VariantKind {
        self.variant
    }

    pub fn defaults(&self) -> &AttributeTree {
        &self.defaults
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description_template(&self) -> &str {
        &self.description
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// The registry that created this type, if it is still alive
    pub fn registry(&self) -> Option<Arc<EffectRegistry>> {
        self.registry.upgrade()
    }
}
