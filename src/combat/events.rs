//! Combat events
//!
//! Telemetry events emitted by the simulation for logging and for external
//! collaborators (renderer, analysis tools) that read them between ticks.

use bevy::prelude::*;

/// Event fired when a hit resolves against a target, whether or not any
/// warmth was lost. `applied` is zero for evaded, blocked, or immune hits.
#[derive(Event, Debug, Clone)]
pub struct DamageEvent {
    pub source: Entity,
    pub target: Entity,
    pub skill_name: String,
    /// Post-mitigation amount attempted against the warmth pool.
    pub amount: f32,
    /// Warmth actually removed.
    pub applied: f32,
    /// Portion of `amount` past zero warmth.
    pub overkill: f32,
    pub blocked: bool,
    pub evaded: bool,
    /// Damage sent back to the source by reflection.
    pub reflected: f32,
}

/// Event fired when healing resolves against a target.
#[derive(Event, Debug, Clone)]
pub struct HealingEvent {
    pub source: Entity,
    pub target: Entity,
    pub skill_name: String,
    /// Multiplied amount before the max-warmth clamp.
    pub raw: f32,
    /// Warmth actually restored.
    pub applied: f32,
    /// raw − applied, never negative.
    pub overheal: f32,
}

/// Event fired when a cast is accepted and the activation timer starts.
#[derive(Event, Debug, Clone)]
pub struct CastStartedEvent {
    pub caster: Entity,
    pub skill_name: String,
}

/// Event fired when a cast's payload executes.
#[derive(Event, Debug, Clone)]
pub struct CastResolvedEvent {
    pub caster: Entity,
    pub skill_name: String,
}

/// Event fired when a persistent effect lands on a target.
#[derive(Event, Debug, Clone)]
pub struct EffectAppliedEvent {
    pub source: Entity,
    pub target: Entity,
    pub effect_name: String,
    pub duration: f32,
}

/// Event fired when a persistent effect leaves a target.
#[derive(Event, Debug, Clone)]
pub struct EffectRemovedEvent {
    pub target: Entity,
    pub effect_name: String,
    pub reason: EffectRemovalReason,
}

/// Why an effect was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectRemovalReason {
    /// Duration expired.
    Expired,
    /// Stripped by another effect before expiry.
    Stripped,
    /// Owner died.
    TargetDied,
}

/// Event fired when a combatant's warmth reaches zero.
#[derive(Event, Debug, Clone)]
pub struct DeathEvent {
    pub victim: Entity,
    /// None when the killing blow has no attributable source (drains).
    pub killer: Option<Entity>,
}
