//! Simulation world
//!
//! Positioned entities ticked one after another. Each entity sees a
//! read-only snapshot of everyone's position taken before the pass, and
//! effects spreading to other entities are delivered only after every
//! entity has ticked.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::effects::{EffectRegistry, EntityId};
use crate::entity::{AddOutcome, EntityEffects, Position};

/// An entity and whether it is still alive
#[derive(Debug)]
pub struct Entity {
    pub effects: EntityEffects,
    alive: bool,
}

impl Entity {
    pub fn id(&self) -> EntityId {
        self.effects.id()
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }
}

/// Summary of one `World::tick`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldReport {
    pub intervals: usize,
    pub expired: usize,
    pub added: usize,
    /// Spread infections delivered to other entities
    pub infections: usize,
    /// Entities that died during this tick
    pub deaths: Vec<EntityId>,
}

#[derive(Debug)]
pub struct World {
    registry: Arc<EffectRegistry>,
    entities: BTreeMap<EntityId, Entity>,
    next_id: u64,
    rng: StdRng,
    time: f64,
}

impl World {
    pub fn new(registry: Arc<EffectRegistry>, seed: u64) -> Self {
        Self {
            registry,
            entities: BTreeMap::new(),
            next_id: 1,
            rng: StdRng::seed_from_u64(seed),
            time: 0.0,
        }
    }

    pub fn registry(&self) -> &Arc<EffectRegistry> {
        &self.registry
    }

    /// Seconds simulated so far
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Create a live entity at `position`
    pub fn spawn(&mut self, position: Position) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;

        let mut effects = EntityEffects::with_seed(id, self.rng.random::<u64>());
        effects.set_position(position);
        self.entities.insert(
            id,
            Entity {
                effects,
                alive: true,
            },
        );
        debug!("Spawned {} at {:?}", id, position);
        id
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.get(&id).is_some_and(|e| e.alive)
    }

    /// Create a named effect from the registry and add it to an entity.
    /// `None` if the entity or the effect type is unknown, or the entity is dead.
    pub fn add_effect(&mut self, id: EntityId, name: &str) -> Option<AddOutcome> {
        let effect = self.registry.create_effect(name)?;
        let entity = self.entities.get_mut(&id).filter(|e| e.alive)?;
        Some(entity.effects.add_effect(effect))
    }

    /// Kill an entity. Returns false if it is unknown or already dead.
    pub fn kill(&mut self, id: EntityId) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) if entity.alive => {
                entity.effects.kill();
                entity.alive = false;
                true
            }
            _ => false,
        }
    }

    /// Tick every live entity, then deliver spread and settle deaths
    pub fn tick(&mut self, dt: f64) -> WorldReport {
        self.time += dt;
        let mut report = WorldReport::default();

        let snapshot: Vec<(EntityId, Position)> = self
            .entities
            .values()
            .filter(|e| e.alive)
            .map(|e| (e.id(), e.effects.position()))
            .collect();

        let mut outbound = Vec::new();
        for entity in self.entities.values_mut().filter(|e| e.alive) {
            entity.effects.set_neighbors(snapshot.clone());
            let tick = entity.effects.tick(dt);
            report.intervals += tick.intervals;
            report.expired += tick.expired.len();
            report.added += tick.added.len();
            outbound.extend(entity.effects.take_outbound());
        }

        for (target, effect) in outbound {
            let Some(entity) = self.entities.get_mut(&target).filter(|e| e.alive) else {
                debug!("Dropping spread of {} to missing {}", effect.name(), target);
                continue;
            };
            let name = effect.name().to_string();
            match entity.effects.add_effect(effect) {
                AddOutcome::Immune => {}
                AddOutcome::Renewed => debug!("{} re-exposed to {}", target, name),
                _ => {
                    info!("{} caught {}", target, name);
                    report.infections += 1;
                }
            }
        }

        for entity in self.entities.values_mut() {
            if entity.alive && entity.effects.is_dead() {
                entity.effects.kill();
                entity.alive = false;
                report.deaths.push(entity.id());
                info!("{} died at t={:.1}", entity.id(), self.time);
            }
        }

        report
    }
}
