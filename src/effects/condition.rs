//! Conditions - effects that own a named set of child effects
//!
//! A condition keeps its own clock. Children either tick on their own or,
//! with a synchronized interval, only run their interval logic when the
//! condition fires. Synchronized fields are written through to every child
//! by `sync_children` whenever they change on the condition.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::effect::{Effect, EffectState};
use super::host::{Detached, EffectHost, EntityId};
use super::kind::EffectType;
use crate::attributes::AttributeTree;

/// Child container shared by conditions and diseases
#[derive(Debug, Clone, Default)]
pub struct Condition {
    children: BTreeMap<String, Effect>,
    synchronized_max_stacks: bool,
    synchronized_interval: bool,
}

impl Condition {
    pub fn synchronized_max_stacks(&self) -> bool {
        self.synchronized_max_stacks
    }

    pub fn synchronized_interval(&self) -> bool {
        self.synchronized_interval
    }

    pub fn set_synchronized_max_stacks(&mut self, value: bool) {
        self.synchronized_max_stacks = value;
    }

    pub fn set_synchronized_interval(&mut self, value: bool) {
        self.synchronized_interval = value;
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    pub fn child(&self, name: &str) -> Option<&Effect> {
        self.children.get(name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Effect> {
        self.children.get_mut(name)
    }

    /// Children ordered by type name
    pub fn children(&self) -> impl Iterator<Item = &Effect> {
        self.children.values()
    }

    /// Adopt a child. Rejects duplicates by type name. The child takes the
    /// parent's owner, plus its stacks and interval when synchronized.
    pub(crate) fn add_effect(
        &mut self,
        parent: &EffectState,
        mut effect: Effect,
        should_start: bool,
        host: &mut dyn EffectHost,
    ) -> bool {
        if self.children.contains_key(effect.name()) {
            debug!("Condition already holds {}", effect.name());
            return false;
        }

        effect.set_owner(parent.owner);
        self.sync_child(parent, &mut effect);
        if should_start {
            effect.on_start(host);
        }
        self.children.insert(effect.name().to_string(), effect);
        true
    }

    /// End and discard the named child
    pub(crate) fn remove_effect(
        &mut self,
        name: &str,
        host: &mut dyn EffectHost,
    ) -> Option<Effect> {
        let mut effect = self.children.remove(name)?;
        effect.on_end(host);
        Some(effect)
    }

    /// Intensity of the named child, 0 if absent
    pub fn intensity_of(&self, name: &str) -> f64 {
        self.children.get(name).map_or(0.0, Effect::intensity)
    }

    pub(crate) fn set_intensity_of(&mut self, name: &str, value: f64, host: &mut dyn EffectHost) {
        if let Some(child) = self.children.get_mut(name) {
            child.update(value, None, host);
        }
    }

    /// Write synchronized fields through to every child
    pub(crate) fn sync_children(&mut self, parent: &EffectState) {
        let (max_stacks, interval) = (self.synchronized_max_stacks, self.synchronized_interval);
        for child in self.children.values_mut() {
            sync_fields(max_stacks, interval, parent, child);
        }
    }

    fn sync_child(&self, parent: &EffectState, child: &mut Effect) {
        sync_fields(
            self.synchronized_max_stacks,
            self.synchronized_interval,
            parent,
            child,
        );
    }

    pub(crate) fn set_owner(&mut self, owner: Option<EntityId>) {
        for child in self.children.values_mut() {
            child.set_owner(owner);
        }
    }

    /// Rescale every child by `new / old` so relative weights are kept.
    /// Stacks follow the parent when synchronized. A zero `old` leaves
    /// child intensities untouched.
    pub(crate) fn update_children(
        &mut self,
        old: f64,
        new: f64,
        stacks: Option<u32>,
        host: &mut dyn EffectHost,
    ) {
        let ratio = if old != 0.0 { new / old } else { 1.0 };
        let stacks = stacks.filter(|_| self.synchronized_max_stacks);

        for child in self.children.values_mut() {
            let intensity = child.intensity() * ratio;
            if intensity != child.intensity() || stacks.is_some() {
                child.update(intensity, stacks, host);
            }
        }
    }

    pub(crate) fn tick_children(&mut self, dt: f64, host: &mut dyn EffectHost) {
        for child in self.children.values_mut() {
            child.on_tick(dt, host);
        }
    }

    /// Synchronized children run their interval logic on the parent's clock
    pub(crate) fn on_interval(&mut self, parent: &EffectState, host: &mut dyn EffectHost) {
        if !self.synchronized_interval {
            return;
        }
        for child in self.children.values_mut() {
            child.set_runtime(parent.runtime());
            child.on_interval(host);
        }
    }

    pub(crate) fn start_children(&mut self, host: &mut dyn EffectHost) {
        for child in self.children.values_mut() {
            child.on_start(host);
        }
    }

    pub(crate) fn end_children(&mut self, host: &mut dyn EffectHost) {
        for child in self.children.values_mut() {
            child.on_end(host);
        }
    }

    pub(crate) fn expire_children(&mut self, host: &mut dyn EffectHost) {
        for child in self.children.values_mut() {
            child.on_expires(host);
        }
    }

    pub(crate) fn kill_children(&mut self, host: &mut dyn EffectHost) {
        for child in self.children.values_mut() {
            child.on_death(host);
        }
    }

    pub(crate) fn remove_children(&mut self, host: &mut dyn EffectHost) {
        for child in self.children.values_mut() {
            child.on_removed(host);
        }
    }

    /// Merge each same-named child of `incoming` into ours
    pub(crate) fn renew_children(&mut self, incoming: Condition, host: &mut dyn EffectHost) {
        for (name, theirs) in incoming.children {
            if let Some(mine) = self.children.get_mut(&name) {
                mine.on_renewed(theirs, host);
            }
        }
    }

    pub(crate) fn read_flags(&mut self, tree: &AttributeTree) {
        self.synchronized_max_stacks =
            tree.get_bool("synchronized_max_stacks", self.synchronized_max_stacks);
        self.synchronized_interval =
            tree.get_bool("synchronized_interval", self.synchronized_interval);
    }

    /// Load child trees. Unknown children are created from the registry and
    /// started when the parent is running.
    pub(crate) fn read_children(
        &mut self,
        tree: &AttributeTree,
        effect_type: &EffectType,
        parent: &EffectState,
        host: &mut dyn EffectHost,
    ) {
        for (name, child_tree) in tree.subtrees() {
            if let Some(child) = self.children.get_mut(name) {
                child.from_tree(&child_tree, host);
                continue;
            }

            let created = effect_type
                .registry()
                .and_then(|registry| registry.create_effect(name));
            match created {
                Some(mut child) => {
                    child.from_tree(&child_tree, &mut Detached);
                    self.add_effect(parent, child, parent.is_running(), host);
                }
                None => warn!(
                    "Condition {} references unknown effect type {}",
                    effect_type.name(),
                    name
                ),
            }
        }
    }

    pub(crate) fn write_tree(&self, tree: &mut AttributeTree) {
        tree.set_bool("synchronized_max_stacks", self.synchronized_max_stacks);
        tree.set_bool("synchronized_interval", self.synchronized_interval);

        let mut children = AttributeTree::new();
        for (name, child) in &self.children {
            children.set_tree(name, child.to_tree());
        }
        tree.set_tree("effects", children);
    }
}

fn sync_fields(max_stacks: bool, interval: bool, parent: &EffectState, child: &mut Effect) {
    if max_stacks {
        child.set_max_stacks(parent.max_stacks() as i64);
        child.set_stacks(parent.stacks() as i64);
    }
    if interval {
        child.set_interval(parent.interval());
    }
}
