//! Effect type registry
//!
//! Types are registered on a builder, validated up front, then frozen into a
//! shared registry. Every type keeps a weak handle back to the registry so
//! variants can build related effects (symptoms, triggered effects) by name.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::attributes::AttributeTree;

use super::kind::{EffectType, EffectTypeDef, VariantKind};
use super::trigger::Trigger;
use super::Effect;

/// Errors raised while defining effect types
#[derive(Debug, Error)]
pub enum EffectError {
    #[error("effect type name cannot be empty")]
    EmptyName,

    #[error("unknown effect variant '{0}'")]
    UnknownVariant(String),

    #[error("effect type '{0}' is already registered")]
    DuplicateType(String),

    #[error("effect type '{0}' references itself through its children or symptoms")]
    ReferenceCycle(String),

    #[error("failed to read effect definitions: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid effect definitions: {0}")]
    Definition(#[from] serde_json::Error),
}

/// Collects effect type definitions and triggers before freezing them
#[derive(Debug, Default)]
pub struct EffectRegistryBuilder {
    defs: Vec<(EffectTypeDef, VariantKind)>,
    triggers: HashMap<(String, String), Arc<dyn Trigger>>,
}

impl EffectRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder preloaded with the built-in effect catalog
    pub fn with_defaults() -> Self {
        let mut builder = Self::new();
        for def in crate::catalog::builtin_definitions() {
            // The catalog is static and known to be valid
            if let Err(e) = builder.register(def) {
                tracing::warn!("Skipping built-in effect type: {}", e);
            }
        }
        builder
    }

    /// Register an effect type definition
    pub fn register(&mut self, def: EffectTypeDef) -> Result<&mut Self, EffectError> {
        let variant = def.validate()?;
        if self.contains(&def.name) {
            return Err(EffectError::DuplicateType(def.name));
        }
        debug!("Registered effect type {} ({})", def.name, variant);
        self.defs.push((def, variant));
        if let Err(e) = self.check_cycle() {
            self.defs.pop();
            return Err(e);
        }
        Ok(self)
    }

    /// Register or replace an effect type definition
    pub fn register_or_replace(&mut self, def: EffectTypeDef) -> Result<&mut Self, EffectError> {
        let variant = def.validate()?;
        let previous = self
            .defs
            .iter()
            .position(|(d, _)| d.name == def.name)
            .map(|index| self.defs.remove(index));
        self.defs.push((def, variant));
        if let Err(e) = self.check_cycle() {
            self.defs.pop();
            if let Some(previous) = previous {
                self.defs.push(previous);
            }
            return Err(e);
        }
        Ok(self)
    }

    /// Reject the last definition if its children or symptoms lead back to it.
    /// The set is acyclic before every insert, so only the new type can close
    /// a cycle.
    fn check_cycle(&self) -> Result<(), EffectError> {
        let Some((def, _)) = self.defs.last() else {
            return Ok(());
        };
        let root = def.name.as_str();
        let mut seen = HashSet::new();
        let mut stack = self.references(root);
        while let Some(name) = stack.pop() {
            if name == root {
                return Err(EffectError::ReferenceCycle(root.to_string()));
            }
            if seen.insert(name.clone()) {
                stack.extend(self.references(&name));
            }
        }
        Ok(())
    }

    /// Types a composite creates from its defaults: children under
    /// `effects`, symptoms under `symptoms`, and anything nested in them
    fn references(&self, name: &str) -> Vec<String> {
        let mut out = Vec::new();
        let found = self.defs.iter().find(|(d, _)| d.name == name);
        if let Some((def, variant)) = found {
            if variant.is_composite() {
                collect_references(&def.defaults, &mut out);
            }
        }
        out
    }

    /// Bind a trigger to an effect type for a given trigger kind
    pub fn register_trigger(
        &mut self,
        effect_type: &str,
        kind: &str,
        trigger: Arc<dyn Trigger>,
    ) -> &mut Self {
        self.triggers
            .insert((effect_type.to_string(), kind.to_string()), trigger);
        self
    }

    /// Parse a JSON array of definitions. Later definitions replace earlier
    /// ones with the same name.
    pub fn parse_definitions(&mut self, json: &str) -> Result<usize, EffectError> {
        let defs: Vec<EffectTypeDef> = serde_json::from_str(json)?;
        let count = defs.len();
        for def in defs {
            self.register_or_replace(def)?;
        }
        Ok(count)
    }

    /// Load a JSON definitions file
    pub fn load_definitions(&mut self, path: &Path) -> Result<usize, EffectError> {
        let json = std::fs::read_to_string(path)?;
        let count = self.parse_definitions(&json)?;
        info!("Loaded {} effect types from {}", count, path.display());
        Ok(count)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.iter().any(|(d, _)| d.name == name)
    }

    /// Names of every registered type, in registration order
    pub fn names(&self) -> Vec<String> {
        self.defs.iter().map(|(d, _)| d.name.clone()).collect()
    }

    /// Freeze the definitions into a shared registry
    pub fn build(self) -> Arc<EffectRegistry> {
        let Self { defs, triggers } = self;
        Arc::new_cyclic(|weak| {
            let types = defs
                .into_iter()
                .map(|(def, variant)| {
                    let name = def.name.clone();
                    (
                        name,
                        Arc::new(EffectType::from_def(def, variant, weak.clone())),
                    )
                })
                .collect();
            EffectRegistry { types, triggers }
        })
    }
}

fn collect_references(tree: &AttributeTree, out: &mut Vec<String>) {
    if let Some(children) = tree.get_tree("effects") {
        for (name, child) in children.subtrees() {
            out.push(name.to_string());
            collect_references(&child, out);
        }
    }
    if let Some(symptoms) = tree.get_tree("symptoms") {
        for (name, entry) in symptoms.subtrees() {
            out.push(name.to_string());
            if let Some(params) = entry.get_tree("params") {
                collect_references(&params, out);
            }
        }
    }
}

/// Frozen set of effect types, shared by everything that creates effects
#[derive(Debug)]
pub struct EffectRegistry {
    types: HashMap<String, Arc<EffectType>>,
    triggers: HashMap<(String, String), Arc<dyn Trigger>>,
}

impl EffectRegistry {
    pub fn builder() -> EffectRegistryBuilder {
        EffectRegistryBuilder::new()
    }

    /// Look up an effect type by name
    pub fn effect_type(&self, name: &str) -> Option<Arc<EffectType>> {
        self.types.get(name).cloned()
    }

    /// Create a fresh instance of the named effect type
    pub fn create_effect(&self, name: &str) -> Option<Effect> {
        self.types.get(name).map(|ty| ty.create())
    }

    /// Find the trigger bound to an effect type for a trigger kind
    pub fn find_trigger(&self, effect_type: &str, kind: &str) -> Option<Arc<dyn Trigger>> {
        self.triggers
            .get(&(effect_type.to_string(), kind.to_string()))
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered type names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Types carrying the given category tag
    pub fn by_category(&self, category: &str) -> Vec<Arc<EffectType>> {
        let mut types: Vec<Arc<EffectType>> = self
            .types
            .values()
            .filter(|t| t.category() == Some(category))
            .cloned()
            .collect();
        types.sort_by(|a, b| a.name().cmp(b.name()));
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::trigger::{ChanceTrigger, DISEASE_TRIGGER};

    #[test]
    fn test_register_and_create() {
        let mut builder = EffectRegistry::builder();
        builder
            .register(EffectTypeDef::new("poison", VariantKind::Damage))
            .unwrap();
        let registry = builder.build();

        assert!(registry.contains("poison"));
        let effect = registry.create_effect("poison").unwrap();
        assert_eq!(effect.name(), "poison");
        assert!(registry.create_effect("missing").is_none());
        assert!(registry.effect_type("missing").is_none());
    }

    #[test]
    fn test_types_point_back_to_registry() {
        let mut builder = EffectRegistry::builder();
        builder
            .register(EffectTypeDef::new("a", VariantKind::Effect))
            .unwrap();
        let registry = builder.build();

        let ty = registry.effect_type("a").unwrap();
        let back = ty.registry().unwrap();
        assert!(Arc::ptr_eq(&back, &registry));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut builder = EffectRegistry::builder();
        builder
            .register(EffectTypeDef::new("a", VariantKind::Effect))
            .unwrap();
        let err = builder
            .register(EffectTypeDef::new("a", VariantKind::Stat))
            .unwrap_err();
        assert!(matches!(err, EffectError::DuplicateType(name) if name == "a"));
    }

    #[test]
    fn test_parse_definitions() {
        let json = r#"[
            { "name": "burn", "variant": "damage", "defaults": { "interval": 1.0 },
              "category": "fire" },
            { "name": "chill", "variant": "stat", "category": "cold" },
            { "name": "burn", "variant": "damage", "defaults": { "interval": 2.0 },
              "category": "fire" }
        ]"#;
        let mut builder = EffectRegistry::builder();
        assert_eq!(builder.parse_definitions(json).unwrap(), 3);
        let registry = builder.build();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.create_effect("burn").unwrap().interval(), 2.0);
        assert_eq!(registry.by_category("fire").len(), 1);
    }

    #[test]
    fn test_parse_definitions_bad_variant() {
        let json = r#"[{ "name": "x", "variant": "laser" }]"#;
        let mut builder = EffectRegistry::builder();
        assert!(matches!(
            builder.parse_definitions(json),
            Err(EffectError::UnknownVariant(_))
        ));
    }

    #[test]
    fn test_find_trigger() {
        let mut builder = EffectRegistry::builder();
        builder
            .register(EffectTypeDef::new("flu", VariantKind::Disease))
            .unwrap();
        builder.register_trigger("flu", DISEASE_TRIGGER, Arc::new(ChanceTrigger::seeded(1)));
        let registry = builder.build();

        assert!(registry.find_trigger("flu", DISEASE_TRIGGER).is_some());
        assert!(registry.find_trigger("flu", "skill").is_none());
        assert!(registry.find_trigger("cold", DISEASE_TRIGGER).is_none());
    }

    #[test]
    fn test_builtin_catalog_builds() {
        let registry = EffectRegistryBuilder::with_defaults().build();
        assert!(registry.contains("poison"));
        assert!(registry.contains("flu"));
        assert!(registry.names().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_condition_listing_itself_is_rejected() {
        let json = r#"[{"name":"loop","variant":"condition","defaults":{"effects":{"loop":{}}}}]"#;
        let mut builder = EffectRegistry::builder();
        let err = builder.parse_definitions(json).unwrap_err();
        assert!(matches!(err, EffectError::ReferenceCycle(name) if name == "loop"));
        assert!(!builder.contains("loop"));

        let registry = builder.build();
        assert!(registry.create_effect("loop").is_none());
    }

    #[test]
    fn test_disease_with_itself_as_symptom_is_rejected() {
        let json = r#"[{"name":"rot","variant":"disease",
            "defaults":{"symptoms":{"rot":{"threshold":0.5}}}}]"#;
        let mut builder = EffectRegistry::builder();
        assert!(matches!(
            builder.parse_definitions(json),
            Err(EffectError::ReferenceCycle(name)) if name == "rot"
        ));
    }

    #[test]
    fn test_indirect_cycle_is_rejected() {
        let mut children = AttributeTree::new();
        children.set_tree("b", AttributeTree::new());
        let mut a = AttributeTree::new();
        a.set_tree("effects", children);

        let mut symptoms = AttributeTree::new();
        let mut entry = AttributeTree::new();
        entry.set_float("threshold", 0.2);
        symptoms.set_tree("a", entry);
        let mut b = AttributeTree::new();
        b.set_tree("symptoms", symptoms);

        let mut builder = EffectRegistry::builder();
        builder
            .register(EffectTypeDef::new("a", VariantKind::Condition).with_defaults(a))
            .unwrap();
        let err = builder
            .register(EffectTypeDef::new("b", VariantKind::Disease).with_defaults(b))
            .unwrap_err();
        assert!(matches!(err, EffectError::ReferenceCycle(name) if name == "b"));
        assert_eq!(builder.names(), vec!["a".to_string()]);
    }

    #[test]
    fn test_nested_child_reference_is_followed() {
        let mut inner = AttributeTree::new();
        inner.set_tree("outer", AttributeTree::new());
        let mut inner_tree = AttributeTree::new();
        inner_tree.set_tree("effects", inner);
        let mut children = AttributeTree::new();
        children.set_tree("inner", inner_tree);
        let mut outer = AttributeTree::new();
        outer.set_tree("effects", children);

        let mut builder = EffectRegistry::builder();
        builder
            .register(EffectTypeDef::new("inner", VariantKind::Condition))
            .unwrap();
        let outer = EffectTypeDef::new("outer", VariantKind::Condition).with_defaults(outer);
        assert!(matches!(
            builder.register(outer),
            Err(EffectError::ReferenceCycle(_))
        ));
    }

    #[test]
    fn test_rejected_replacement_keeps_previous() {
        let json = r#"[
            {"name":"bundle","variant":"condition","defaults":{"effects":{"poison":{}}}},
            {"name":"poison","variant":"damage"}
        ]"#;
        let mut builder = EffectRegistry::builder();
        builder.parse_definitions(json).unwrap();

        let looped = r#"[{"name":"bundle","variant":"condition","defaults":{"effects":{"bundle":{}}}}]"#;
        assert!(builder.parse_definitions(looped).is_err());

        let registry = builder.build();
        let bundle = registry.create_effect("bundle").unwrap();
        let condition = bundle.as_condition().unwrap();
        assert!(condition.contains("poison"));
        assert!(!condition.contains("bundle"));
    }

    #[test]
    fn test_non_composite_children_are_ignored() {
        let json = r#"[{"name":"burn","variant":"damage","defaults":{"effects":{"burn":{}}}}]"#;
        let mut builder = EffectRegistry::builder();
        builder.parse_definitions(json).unwrap();
        assert!(builder.build().create_effect("burn").is_some());
    }
}
