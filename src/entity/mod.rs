//! Per-entity effect ownership
//!
//! `EntityEffects` owns the live effects of one entity and the state they
//! act on (multipliers, attributes, health, immunities). Effects reach that
//! state through `HostState`, which implements `EffectHost`. Additions made
//! by effects while the live list is being walked are queued and applied
//! once the pass is over.

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::attributes::AttributeTree;
use crate::effects::{
    CureProps, DamageType, Detached, Effect, EffectHost, EffectRegistry, EntityId, Neighbor,
};

/// Health of a fresh entity
pub const MAX_HEALTH: f64 = 100.0;

/// Queue drains per tick before leftovers wait for the next tick
const MAX_FLUSH_ROUNDS: usize = 8;

/// Location of an entity; `y` is the vertical axis
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn squared_distance(&self, other: &Position) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        dx * dx + dy * dy + dz * dz
    }
}

/// What happened to an effect passed to `EntityEffects::add_effect`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Started as a new live effect
    Added,
    /// Merged into a live effect of the same type
    Renewed,
    /// Started after removing the live effect of the same group
    Replaced,
    /// Rejected by a running immunity
    Immune,
}

/// Summary of one `EntityEffects::tick` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Effects whose interval fired
    pub intervals: usize,
    /// Names of effects that expired
    pub expired: Vec<String>,
    /// Names of queued effects applied after the pass
    pub added: Vec<String>,
}

/// Observable side effects requested by effects
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Damage { amount: f64, damage_type: DamageType },
    Animation(String),
    Sound(String),
}

/// Owner state that effects act on
#[derive(Debug)]
pub struct HostState {
    entity: EntityId,
    pending: Vec<Effect>,
    immunities: HashMap<String, f64>,
    multipliers: BTreeMap<String, f64>,
    attributes: BTreeMap<String, f64>,
    shaders: BTreeMap<String, f64>,
    health: f64,
    events: Vec<HostEvent>,
    dirty: bool,
    rng: StdRng,
    position: Position,
    neighbors: Vec<(EntityId, Position)>,
    outbound: Vec<(EntityId, Effect)>,
}

impl HostState {
    fn new(entity: EntityId, seed: u64) -> Self {
        Self {
            entity,
            pending: Vec::new(),
            immunities: HashMap::new(),
            multipliers: BTreeMap::new(),
            attributes: BTreeMap::new(),
            shaders: BTreeMap::new(),
            health: MAX_HEALTH,
            events: Vec::new(),
            dirty: false,
            rng: StdRng::seed_from_u64(seed),
            position: Position::default(),
            neighbors: Vec::new(),
            outbound: Vec::new(),
        }
    }
}

impl EffectHost for HostState {
    fn entity(&self) -> Option<EntityId> {
        Some(self.entity)
    }

    fn add_effect(&mut self, effect: Effect) {
        debug!("{} queued {}", self.entity, effect.name());
        self.pending.push(effect);
    }

    fn set_immunity(&mut self, effect_type: &str, duration: f64) {
        let left = self.immunities.entry(effect_type.to_string()).or_insert(0.0);
        *left = left.max(duration);
        debug!("{} is immune to {} for {}s", self.entity, effect_type, duration);
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn apply_multiplier(&mut self, stat: &str, delta: f64) {
        *self.multipliers.entry(stat.to_string()).or_insert(0.0) += delta;
    }

    fn set_attribute(&mut self, key: &str, value: f64) {
        self.attributes.insert(key.to_string(), value);
    }

    fn set_shader_intensity(&mut self, shader: &str, value: f64) {
        self.shaders.insert(shader.to_string(), value);
    }

    fn apply_damage(&mut self, amount: f64, damage_type: DamageType) {
        self.health = (self.health - amount).clamp(0.0, MAX_HEALTH);
        self.events.push(HostEvent::Damage {
            amount,
            damage_type,
        });
    }

    fn play_animation(&mut self, name: &str) {
        self.events.push(HostEvent::Animation(name.to_string()));
    }

    fn play_sound(&mut self, name: &str) {
        self.events.push(HostEvent::Sound(name.to_string()));
    }

    fn roll(&mut self, chance: f64) -> bool {
        self.rng.random::<f64>() < chance
    }

    fn random(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn nearby(&self, range: f64, vertical_range: f64) -> Vec<Neighbor> {
        let range_sq = range * range;
        self.neighbors
            .iter()
            .filter(|(id, _)| *id != self.entity)
            .filter(|(_, pos)| (pos.y - self.position.y).abs() <= vertical_range)
            .map(|(id, pos)| Neighbor {
                id: *id,
                squared_distance: self.position.squared_distance(pos),
            })
            .filter(|n| n.squared_distance <= range_sq)
            .collect()
    }

    fn spread_effect(&mut self, target: EntityId, effect: Effect) {
        self.outbound.push((target, effect));
    }
}

/// Live effects of a single entity
#[derive(Debug)]
pub struct EntityEffects {
    effects: Vec<Effect>,
    host: HostState,
}

impl EntityEffects {
    pub fn new(entity: EntityId) -> Self {
        Self::with_seed(entity, entity.0)
    }

    /// Entity whose rolls come from a seeded RNG
    pub fn with_seed(entity: EntityId, seed: u64) -> Self {
        Self {
            effects: Vec::new(),
            host: HostState::new(entity, seed),
        }
    }

    pub fn id(&self) -> EntityId {
        self.host.entity
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Check if a live effect of this type is present
    pub fn has(&self, name: &str) -> bool {
        self.effects.iter().any(|e| e.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&Effect> {
        self.effects.iter().find(|e| e.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Effect> {
        self.effects.iter_mut().find(|e| e.name() == name)
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn names(&self) -> Vec<&str> {
        self.effects.iter().map(Effect::name).collect()
    }

    /// Add an effect: immunity check, renewal, group replacement, start
    pub fn add_effect(&mut self, mut effect: Effect) -> AddOutcome {
        let name = effect.name().to_string();
        let id = self.host.entity;

        if self.host.immunities.contains_key(&name) {
            info!("{} is immune to {}", id, name);
            return AddOutcome::Immune;
        }

        if let Some(existing) = self.effects.iter_mut().find(|e| e.name() == name) {
            existing.on_renewed(effect, &mut self.host);
            return AddOutcome::Renewed;
        }

        let mut outcome = AddOutcome::Added;
        if let Some(group) = effect.effect_type().group().map(str::to_string) {
            if let Some(index) = self
                .effects
                .iter()
                .position(|e| e.effect_type().group() == Some(group.as_str()))
            {
                let mut replaced = self.effects.remove(index);
                replaced.on_removed(&mut self.host);
                info!("{} replaced {} with {}", id, replaced.name(), name);
                outcome = AddOutcome::Replaced;
            }
        }

        effect.set_owner(Some(id));
        effect.on_start(&mut self.host);
        self.effects.push(effect);
        debug!("{} gained {}", id, name);
        outcome
    }

    /// Force-remove a live effect
    pub fn remove_effect(&mut self, name: &str) -> Option<Effect> {
        let index = self.effects.iter().position(|e| e.name() == name)?;
        let mut effect = self.effects.remove(index);
        effect.on_removed(&mut self.host);
        debug!("{} lost {}", self.host.entity, name);
        Some(effect)
    }

    /// Remove every effect
    pub fn clear(&mut self) {
        for mut effect in std::mem::take(&mut self.effects) {
            effect.on_removed(&mut self.host);
        }
    }

    /// The entity died. Effects that expire on death end; the rest stay.
    /// Returns how many ended.
    pub fn kill(&mut self) -> usize {
        let (dying, kept): (Vec<Effect>, Vec<Effect>) = std::mem::take(&mut self.effects)
            .into_iter()
            .partition(|e| e.flags().on_death);
        self.effects = kept;

        let count = dying.len();
        for mut effect in dying {
            effect.on_death(&mut self.host);
        }
        info!("{} died, {} effects ended", self.host.entity, count);
        count
    }

    /// Apply a cure to every live effect, optionally limited to one category.
    /// Returns how many effects it changed.
    pub fn cure(&mut self, props: &CureProps, multiplier: f64, category: Option<&str>) -> usize {
        let mut cured = 0;
        for effect in &mut self.effects {
            if category.is_some() && effect.effect_type().category() != category {
                continue;
            }
            if effect.on_cured(props, multiplier, &mut self.host) {
                cured += 1;
            }
        }
        cured
    }

    /// Advance every live effect by `dt`
    pub fn tick(&mut self, dt: f64) -> TickReport {
        let mut report = TickReport::default();

        self.host.immunities.retain(|_, left| {
            *left -= dt;
            *left > 0.0
        });

        for effect in &mut self.effects {
            if effect.on_tick(dt, &mut self.host) {
                report.intervals += 1;
            }
        }

        let (expired, live): (Vec<Effect>, Vec<Effect>) = std::mem::take(&mut self.effects)
            .into_iter()
            .partition(Effect::should_expire);
        self.effects = live;
        for mut effect in expired {
            effect.on_expires(&mut self.host);
            debug!("{} expired on {}", effect.name(), self.host.entity);
            report.expired.push(effect.name().to_string());
        }

        report.added = self.flush_pending();
        report
    }

    /// Apply queued additions, repeating while effects keep queueing more
    fn flush_pending(&mut self) -> Vec<String> {
        let mut added = Vec::new();
        for _ in 0..MAX_FLUSH_ROUNDS {
            let pending = std::mem::take(&mut self.host.pending);
            if pending.is_empty() {
                return added;
            }
            for effect in pending {
                let name = effect.name().to_string();
                if self.add_effect(effect) != AddOutcome::Immune {
                    added.push(name);
                }
            }
        }

        if !self.host.pending.is_empty() {
            warn!(
                "{} still has {} queued effects, deferring to next tick",
                self.host.entity,
                self.host.pending.len()
            );
        }
        added
    }

    pub fn is_immune(&self, name: &str) -> bool {
        self.host.immunities.contains_key(name)
    }

    /// Seconds of immunity left against an effect type
    pub fn immunity(&self, name: &str) -> Option<f64> {
        self.host.immunities.get(name).copied()
    }

    pub fn set_immunity(&mut self, name: &str, seconds: f64) {
        self.host.set_immunity(name, seconds);
    }

    /// Summed bonus applied to a stat, 0 if none
    pub fn multiplier(&self, stat: &str) -> f64 {
        self.host.multipliers.get(stat).copied().unwrap_or(0.0)
    }

    pub fn attribute(&self, key: &str) -> Option<f64> {
        self.host.attributes.get(key).copied()
    }

    pub fn shader(&self, name: &str) -> f64 {
        self.host.shaders.get(name).copied().unwrap_or(0.0)
    }

    pub fn health(&self) -> f64 {
        self.host.health
    }

    pub fn is_dead(&self) -> bool {
        self.host.health <= 0.0
    }

    pub fn events(&self) -> &[HostEvent] {
        &self.host.events
    }

    pub fn take_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.host.events)
    }

    /// Whether effect state changed since the last call
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.host.dirty, false)
    }

    pub fn position(&self) -> Position {
        self.host.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.host.position = position;
    }

    /// Replace the read-only view of other entities used for spread
    pub(crate) fn set_neighbors(&mut self, neighbors: Vec<(EntityId, Position)>) {
        self.host.neighbors = neighbors;
    }

    /// Spread results waiting for delivery to other entities
    pub(crate) fn take_outbound(&mut self) -> Vec<(EntityId, Effect)> {
        std::mem::take(&mut self.host.outbound)
    }

    /// Persist live effects, immunities and health
    pub fn to_tree(&self) -> AttributeTree {
        let mut effects = AttributeTree::new();
        for effect in &self.effects {
            effects.set_tree(effect.name(), effect.to_tree());
        }

        let mut immunities = AttributeTree::new();
        let mut names: Vec<&String> = self.host.immunities.keys().collect();
        names.sort();
        for name in names {
            immunities.set_float(name, self.host.immunities[name]);
        }

        let mut tree = AttributeTree::new();
        tree.set_float("health", self.host.health);
        tree.set_tree("effects", effects);
        tree.set_tree("immunities", immunities);
        tree
    }

    /// Load a persisted entity. Effects are recreated from the registry and
    /// started without immunity checks; unknown types are skipped. Returns
    /// how many effects were loaded.
    pub fn from_tree(&mut self, registry: &EffectRegistry, tree: &AttributeTree) -> usize {
        self.host.health = tree
            .get_float("health", self.host.health)
            .clamp(0.0, MAX_HEALTH);

        if let Some(immunities) = tree.get_tree("immunities") {
            for name in immunities.keys() {
                let seconds = immunities.get_float(name, 0.0);
                if seconds > 0.0 {
                    self.host.set_immunity(name, seconds);
                }
            }
        }

        let Some(effects) = tree.get_tree("effects") else {
            return 0;
        };

        let mut loaded = 0;
        for (name, effect_tree) in effects.subtrees() {
            if let Some(existing) = self.effects.iter_mut().find(|e| e.name() == name) {
                existing.from_tree(&effect_tree, &mut self.host);
                loaded += 1;
                continue;
            }

            let Some(mut effect) = registry.create_effect(name) else {
                warn!("Skipping unknown effect type {} on {}", name, self.host.entity);
                continue;
            };
            effect.from_tree(&effect_tree, &mut Detached);
            effect.set_owner(Some(self.host.entity));
            effect.on_start(&mut self.host);
            self.effects.push(effect);
            loaded += 1;
        }

        debug!("Loaded {} effects for {}", loaded, self.host.entity);
        loaded
    }
}
