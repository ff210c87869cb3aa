//! Base effect state machine
//!
//! Time, stack and intensity bookkeeping shared by every variant:
//! - interval dispatch that keeps its phase across frames
//! - expiry by time or by zero intensity
//! - merge-on-renewal of two instances of the same type
//! - cure handling and attribute tree persistence

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::condition::Condition;
use super::disease::Disease;
use super::format::{format_or_raw, FormatArg};
use super::host::{EffectHost, EntityId};
use super::kind::EffectType;
use super::variants::Behavior;
use crate::attributes::AttributeTree;

/// Independent expiry and merge policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpireFlags {
    /// Removed when the owner dies
    pub on_death: bool,
    /// Expires once `runtime >= duration`
    pub over_time: bool,
    /// Expires once intensity reaches zero
    pub through_intensity: bool,
    /// Renewal sums intensities instead of averaging them
    pub accumulates: bool,
}

impl Default for ExpireFlags {
    fn default() -> Self {
        Self {
            on_death: true,
            over_time: false,
            through_intensity: false,
            accumulates: false,
        }
    }
}

/// Strength of a cure applied through `Effect::on_cured`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CureProps {
    pub intensity: f64,
    pub duration: f64,
    pub min_intensity: f64,
    pub min_duration: f64,
    pub healing_rate: f64,
    pub max_healing_rate: f64,
    pub healing_growth: f64,
    pub max_healing_growth: f64,
}

/// Bookkeeping fields common to every effect
#[derive(Debug, Clone, PartialEq)]
pub struct EffectState {
    pub(crate) duration: f64,
    pub(crate) runtime: f64,
    pub(crate) interval: f64,
    pub(crate) last_triggered: f64,
    pub(crate) stacks: u32,
    pub(crate) max_stacks: u32,
    pub(crate) intensity: f64,
    pub(crate) flags: ExpireFlags,
    pub(crate) immunity_duration: f64,
    pub(crate) running: bool,
    pub(crate) owner: Option<EntityId>,
}

impl Default for EffectState {
    fn default() -> Self {
        Self {
            duration: 0.0,
            runtime: 0.0,
            interval: 0.0,
            last_triggered: 0.0,
            stacks: 1,
            max_stacks: 1,
            intensity: 1.0,
            flags: ExpireFlags::default(),
            immunity_duration: 0.0,
            running: false,
            owner: None,
        }
    }
}

impl EffectState {
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn runtime(&self) -> f64 {
        self.runtime
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn last_triggered(&self) -> f64 {
        self.last_triggered
    }

    pub fn stacks(&self) -> u32 {
        self.stacks
    }

    pub fn max_stacks(&self) -> u32 {
        self.max_stacks
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn flags(&self) -> ExpireFlags {
        self.flags
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// `intensity * stacks`
    pub fn resulting_intensity(&self) -> f64 {
        self.intensity * self.stacks as f64
    }

    /// Seconds until time-based expiry; only meaningful with `over_time`
    pub fn time_left(&self) -> f64 {
        self.duration - self.runtime
    }

    /// Clamp into `[1, max_stacks]`
    pub(crate) fn set_stacks(&mut self, stacks: i64) {
        self.stacks = stacks.clamp(1, self.max_stacks as i64) as u32;
    }

    /// At least 1; current stacks are re-clamped
    pub(crate) fn set_max_stacks(&mut self, max_stacks: i64) {
        self.max_stacks = max_stacks.clamp(1, u32::MAX as i64) as u32;
        self.stacks = self.stacks.clamp(1, self.max_stacks);
    }

    pub fn should_expire(&self) -> bool {
        (self.flags.over_time && self.runtime >= self.duration)
            || (self.flags.through_intensity && self.intensity == 0.0)
    }

    fn interval_due(&self) -> bool {
        self.interval > 0.0 && self.last_triggered + self.interval < self.runtime
    }
}

/// Result of merging two states of the same effect type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergedState {
    pub intensity: f64,
    pub interval: f64,
    /// Raw sum, clamped when applied
    pub stacks: u32,
    pub duration: f64,
    pub max_stacks: u32,
    pub last_triggered: f64,
}

/// Combine an active state with an incoming one.
///
/// Without `accumulates`, intensity and interval are averaged: weighted by
/// stacks when the active effect has no duration, otherwise by
/// `stacks * duration`. A non-positive combined weight falls back to the
/// stack-weighted average so the result is always finite.
pub fn merge_states(current: &EffectState, incoming: &EffectState) -> MergedState {
    let intensity = if current.flags.accumulates {
        current.intensity + incoming.intensity
    } else {
        weighted_average(current.intensity, incoming.intensity, current, incoming)
    };
    let interval = weighted_average(current.interval, incoming.interval, current, incoming);

    MergedState {
        intensity,
        interval,
        stacks: current.stacks.saturating_add(incoming.stacks),
        duration: current.duration.max(incoming.duration),
        max_stacks: current.max_stacks.max(incoming.max_stacks),
        last_triggered: current.last_triggered - current.runtime,
    }
}

fn weighted_average(a: f64, b: f64, current: &EffectState, incoming: &EffectState) -> f64 {
    let (sa, sb) = (current.stacks as f64, incoming.stacks as f64);
    let by_stacks = (a * sa + b * sb) / (sa + sb);
    if current.duration == 0.0 {
        return by_stacks;
    }

    let wa = sa * current.duration;
    let wb = sb * incoming.duration;
    let total = wa + wb;
    if total > 0.0 && total.is_finite() {
        (a * wa + b * wb) / total
    } else {
        by_stacks
    }
}

/// A live effect instance
#[derive(Debug, Clone)]
pub struct Effect {
    effect_type: Arc<EffectType>,
    state: EffectState,
    behavior: Behavior,
}

impl Effect {
    pub(crate) fn new(effect_type: Arc<EffectType>) -> Self {
        let behavior = Behavior::for_variant(effect_type.variant());
        Self {
            effect_type,
            state: EffectState::default(),
            behavior,
        }
    }

    pub fn effect_type(&self) -> &Arc<EffectType> {
        &self.effect_type
    }

    /// Effect type name
    pub fn name(&self) -> &str {
        self.effect_type.name()
    }

    pub fn state(&self) -> &EffectState {
        &self.state
    }

    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    pub fn duration(&self) -> f64 {
        self.state.duration
    }

    pub fn runtime(&self) -> f64 {
        self.state.runtime
    }

    pub fn interval(&self) -> f64 {
        self.state.interval
    }

    pub fn last_triggered(&self) -> f64 {
        self.state.last_triggered
    }

    pub fn stacks(&self) -> u32 {
        self.state.stacks
    }

    pub fn max_stacks(&self) -> u32 {
        self.state.max_stacks
    }

    pub fn intensity(&self) -> f64 {
        self.state.intensity
    }

    pub fn resulting_intensity(&self) -> f64 {
        self.state.resulting_intensity()
    }

    pub fn flags(&self) -> ExpireFlags {
        self.state.flags
    }

    pub fn immunity_duration(&self) -> f64 {
        self.state.immunity_duration
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn owner(&self) -> Option<EntityId> {
        self.state.owner
    }

    pub fn time_left(&self) -> f64 {
        self.state.time_left()
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.state.duration = duration;
    }

    pub fn set_flags(&mut self, flags: ExpireFlags) {
        self.state.flags = flags;
    }

    pub fn set_immunity_duration(&mut self, seconds: f64) {
        self.state.immunity_duration = seconds;
    }

    /// Set stacks, clamped into `[1, max_stacks]`
    pub fn set_stacks(&mut self, stacks: i64) {
        self.state.set_stacks(stacks);
        if let Some(c) = self.behavior.condition_mut() {
            c.sync_children(&self.state);
        }
    }

    /// Set max stacks (at least 1); cascades to children when synchronized
    pub fn set_max_stacks(&mut self, max_stacks: i64) {
        self.state.set_max_stacks(max_stacks);
        if let Some(c) = self.behavior.condition_mut() {
            c.sync_children(&self.state);
        }
    }

    /// Set the periodic interval; cascades to children when synchronized
    pub fn set_interval(&mut self, interval: f64) {
        self.state.interval = interval;
        if let Some(c) = self.behavior.condition_mut() {
            c.sync_children(&self.state);
        }
    }

    /// Align runtime with a synchronized parent
    pub(crate) fn set_runtime(&mut self, runtime: f64) {
        self.state.runtime = runtime;
    }

    /// Record the owning entity on this effect and every child
    pub fn set_owner(&mut self, owner: Option<EntityId>) {
        self.state.owner = owner;
        if let Some(c) = self.behavior.condition_mut() {
            c.set_owner(owner);
        }
    }

    pub fn as_condition(&self) -> Option<&Condition> {
        self.behavior.condition()
    }

    pub fn as_condition_mut(&mut self) -> Option<&mut Condition> {
        self.behavior.condition_mut()
    }

    pub fn as_disease(&self) -> Option<&Disease> {
        match &self.behavior {
            Behavior::Disease(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_disease_mut(&mut self) -> Option<&mut Disease> {
        match &mut self.behavior {
            Behavior::Disease(d) => Some(d),
            _ => None,
        }
    }

    /// Add a child effect to a condition. Returns false for non-conditions
    /// and for duplicate child names.
    pub fn add_child(
        &mut self,
        effect: Effect,
        should_start: bool,
        host: &mut dyn EffectHost,
    ) -> bool {
        match self.behavior.condition_mut() {
            Some(c) => c.add_effect(&self.state, effect, should_start, host),
            None => false,
        }
    }

    /// End and discard a named child; no-op if absent
    pub fn remove_child(&mut self, name: &str, host: &mut dyn EffectHost) -> Option<Effect> {
        self.behavior
            .condition_mut()
            .and_then(|c| c.remove_effect(name, host))
    }

    /// Intensity of a named child, 0 if absent
    pub fn child_intensity(&self, name: &str) -> f64 {
        self.behavior
            .condition()
            .map_or(0.0, |c| c.intensity_of(name))
    }

    /// Update a named child's intensity; no-op if absent
    pub fn set_child_intensity(&mut self, name: &str, value: f64, host: &mut dyn EffectHost) {
        if let Some(c) = self.behavior.condition_mut() {
            c.set_intensity_of(name, value, host);
        }
    }

    /// The one authorized way to change intensity and stacks after start
    pub fn update(&mut self, intensity: f64, stacks: Option<u32>, host: &mut dyn EffectHost) {
        if !intensity.is_finite() {
            warn!(
                "Ignoring non-finite intensity {} for effect {}",
                intensity,
                self.effect_type.name()
            );
            return;
        }

        let Effect {
            effect_type,
            state,
            behavior,
        } = self;

        match behavior {
            Behavior::Disease(d) => d.update(effect_type, state, intensity, stacks, host),
            Behavior::Condition(c) => {
                c.update_children(state.intensity, intensity, stacks, host);
                apply_update(state, intensity, stacks, host);
                c.sync_children(state);
            }
            other => {
                apply_update(state, intensity, stacks, host);
                if state.running {
                    if let Some(hooks) = other.hooks_mut() {
                        hooks.on_update(state, host);
                    }
                }
            }
        }
    }

    /// Advance runtime by `dt`. Fires at most one interval per call and
    /// advances `last_triggered` by exactly one interval. Returns whether an
    /// interval fired.
    pub fn on_tick(&mut self, dt: f64, host: &mut dyn EffectHost) -> bool {
        if let Some(c) = self.behavior.condition_mut() {
            if !c.synchronized_interval() {
                c.tick_children(dt, host);
            }
        }

        self.state.runtime += dt;
        if self.state.interval_due() {
            self.on_interval(host);
            self.state.last_triggered += self.state.interval;
            true
        } else {
            false
        }
    }

    pub fn on_interval(&mut self, host: &mut dyn EffectHost) {
        let Effect {
            effect_type,
            state,
            behavior,
        } = self;

        match behavior {
            Behavior::Condition(c) => c.on_interval(state, host),
            Behavior::Disease(d) => d.on_interval(effect_type, state, host),
            other => {
                if let Some(hooks) = other.hooks_mut() {
                    hooks.on_interval(effect_type, state, host);
                }
            }
        }
    }

    pub fn should_expire(&self) -> bool {
        self.state.should_expire()
    }

    pub fn on_start(&mut self, host: &mut dyn EffectHost) {
        let Effect {
            effect_type,
            state,
            behavior,
        } = self;

        state.running = true;
        match behavior {
            Behavior::Condition(c) => c.start_children(host),
            Behavior::Disease(d) => d.on_start(effect_type, state, host),
            other => {
                if let Some(hooks) = other.hooks_mut() {
                    hooks.on_start(state, host);
                }
            }
        }
        host.mark_dirty();
        debug!("Effect {} started", effect_type.name());
    }

    /// Stop the effect; idempotent
    pub fn on_end(&mut self, host: &mut dyn EffectHost) {
        if !self.state.running {
            return;
        }

        let Effect {
            effect_type,
            state,
            behavior,
        } = self;

        state.running = false;
        if let Some(c) = behavior.condition_mut() {
            c.end_children(host);
        } else if let Some(hooks) = behavior.hooks_mut() {
            hooks.on_end(state, host);
        }
        host.mark_dirty();
        debug!("Effect {} ended", effect_type.name());
    }

    /// Natural expiry: children first, then immunity, then end
    pub fn on_expires(&mut self, host: &mut dyn EffectHost) {
        {
            let Effect {
                effect_type,
                state,
                behavior,
            } = &mut *self;

            if let Some(c) = behavior.condition_mut() {
                c.expire_children(host);
            } else if let Some(hooks) = behavior.hooks_mut() {
                hooks.on_expires(effect_type, state, host);
            }

            if state.immunity_duration > 0.0 {
                host.set_immunity(effect_type.name(), state.immunity_duration);
            }
        }
        self.on_end(host);
    }

    /// The owner died
    pub fn on_death(&mut self, host: &mut dyn EffectHost) {
        if let Some(c) = self.behavior.condition_mut() {
            c.kill_children(host);
        }
        self.on_end(host);
    }

    /// Forced removal by the owner
    pub fn on_removed(&mut self, host: &mut dyn EffectHost) {
        if let Some(c) = self.behavior.condition_mut() {
            c.remove_children(host);
        }
        self.on_end(host);
    }

    /// Merge an incoming instance of the same type into this one. The
    /// incoming instance is consumed.
    pub fn on_renewed(&mut self, other: Effect, host: &mut dyn EffectHost) {
        let merged = merge_states(&self.state, &other.state);
        let elapsed = self.state.runtime;
        if let Behavior::Disease(d) = &mut self.behavior {
            d.shift_checkpoints(-elapsed);
        }

        self.state.duration = merged.duration;
        self.set_max_stacks(merged.max_stacks as i64);
        self.set_interval(merged.interval);
        self.state.last_triggered = merged.last_triggered;
        self.state.runtime = 0.0;
        self.update(merged.intensity, Some(merged.stacks), host);

        let Effect {
            behavior: incoming, ..
        } = other;
        if let Some(mine) = self.behavior.condition_mut() {
            match incoming {
                Behavior::Condition(theirs) => mine.renew_children(theirs, host),
                Behavior::Disease(theirs) => mine.renew_children(theirs.into_condition(), host),
                _ => {}
            }
        }

        debug!(
            "Effect {} renewed: intensity {:.3}, stacks {}",
            self.name(),
            self.state.intensity,
            self.state.stacks
        );
    }

    /// Reduce intensity and duration toward the cure floors. Returns whether
    /// anything changed.
    pub fn on_cured(&mut self, cure: &CureProps, multiplier: f64, host: &mut dyn EffectHost) -> bool {
        let mut used = false;

        let requested = cure.intensity * multiplier;
        if requested > 0.0 && self.state.intensity > cure.min_intensity {
            let amount = (requested / self.state.stacks as f64)
                .min(self.state.intensity - cure.min_intensity);
            if amount > 0.0 {
                let intensity = self.state.intensity - amount;
                self.update(intensity, None, host);
                used = true;
            }
        }

        let requested = cure.duration * multiplier;
        if requested > 0.0 && self.state.duration > cure.min_duration {
            let amount = requested.min(self.state.duration - cure.min_duration);
            self.state.duration -= amount;
            used = true;
        }

        if let Behavior::Disease(d) = &mut self.behavior {
            used |= d.cure_healing(cure, multiplier);
        }

        if used {
            host.mark_dirty();
        }
        used
    }

    /// Load state from a tree. Missing or malformed entries keep their
    /// current value. A running effect whose intensity or stacks change is
    /// updated through `update` so variant side effects fire.
    pub fn from_tree(&mut self, tree: &AttributeTree, host: &mut dyn EffectHost) {
        {
            let s = &mut self.state;
            s.duration = tree.get_float("duration", s.duration);
            s.runtime = tree.get_float("runtime", s.runtime);
            s.last_triggered = tree.get_float("last_triggered", s.last_triggered);
            s.immunity_duration = tree.get_float("immunity_duration", s.immunity_duration);
            s.flags.on_death = tree.get_bool("expires_on_death", s.flags.on_death);
            s.flags.over_time = tree.get_bool("expires_over_time", s.flags.over_time);
            s.flags.through_intensity =
                tree.get_bool("expires_through_intensity", s.flags.through_intensity);
            s.flags.accumulates = tree.get_bool("accumulates", s.flags.accumulates);
        }

        match &mut self.behavior {
            Behavior::Condition(c) => c.read_flags(tree),
            Behavior::Disease(d) => d.read_tree(tree),
            other => {
                if let Some(hooks) = other.hooks_mut() {
                    hooks.read_tree(tree);
                }
            }
        }

        let max_stacks = tree.get_int("max_stacks", self.state.max_stacks as i64);
        self.set_max_stacks(max_stacks);
        let interval = tree.get_float("interval", self.state.interval);
        self.set_interval(interval);

        let intensity = tree.get_float("intensity", self.state.intensity);
        let stacks = tree
            .get_int("stacks", self.state.stacks as i64)
            .clamp(1, self.state.max_stacks as i64) as u32;
        if self.state.running {
            if intensity != self.state.intensity || stacks != self.state.stacks {
                self.update(intensity, Some(stacks), host);
            }
        } else {
            self.state.intensity = intensity;
            self.state.set_stacks(stacks as i64);
        }

        if let Some(children) = tree.get_tree("effects") {
            let Effect {
                effect_type,
                state,
                behavior,
            } = self;
            if let Some(c) = behavior.condition_mut() {
                c.read_children(&children, effect_type, state, host);
            }
        }
    }

    /// Persist every field except `running` and the owner
    pub fn to_tree(&self) -> AttributeTree {
        let s = &self.state;
        let mut tree = AttributeTree::new();
        tree.set_float("duration", s.duration);
        tree.set_float("runtime", s.runtime);
        tree.set_float("interval", s.interval);
        tree.set_float("last_triggered", s.last_triggered);
        tree.set_int("stacks", s.stacks as i64);
        tree.set_int("max_stacks", s.max_stacks as i64);
        tree.set_float("intensity", s.intensity);
        tree.set_bool("expires_on_death", s.flags.on_death);
        tree.set_bool("expires_over_time", s.flags.over_time);
        tree.set_bool("expires_through_intensity", s.flags.through_intensity);
        tree.set_bool("accumulates", s.flags.accumulates);
        tree.set_float("immunity_duration", s.immunity_duration);

        match &self.behavior {
            Behavior::Condition(c) => c.write_tree(&mut tree),
            Behavior::Disease(d) => d.write_tree(&mut tree),
            other => {
                if let Some(hooks) = other.hooks() {
                    hooks.write_tree(&mut tree);
                }
            }
        }
        tree
    }

    pub fn display_name(&self) -> &str {
        self.effect_type.display_name()
    }

    /// Fill the type's description template. `{0}` is the resulting
    /// intensity, `{1}` the interval, later slots are variant specific. A
    /// mismatched template is returned unformatted.
    pub fn description(&self) -> String {
        let mut args: Vec<FormatArg> = vec![
            self.resulting_intensity().into(),
            self.state.interval.into(),
        ];
        match &self.behavior {
            Behavior::Disease(d) => args.extend(d.description_args()),
            other => {
                if let Some(hooks) = other.hooks() {
                    args.extend(hooks.description_args(&self.state));
                }
            }
        }
        format_or_raw(self.effect_type.description_template(), &args)
    }
}

fn apply_update(
    state: &mut EffectState,
    intensity: f64,
    stacks: Option<u32>,
    host: &mut dyn EffectHost,
) {
    state.intensity = intensity;
    if let Some(stacks) = stacks {
        state.set_stacks(stacks as i64);
    }
    if state.running {
        host.mark_dirty();
    }
}
