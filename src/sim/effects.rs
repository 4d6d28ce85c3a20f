//! Effect & Condition Engine
//!
//! Effects are composable descriptors with four orthogonal dimensions:
//! - WHAT: a list of `Modifier { kind, value }` pairs
//! - WHEN: an `EffectTiming` hook (on-cast, on-hit, while-active, ...)
//! - WHO: a `TargetShape` relative to the caster or target
//! - IF: an `EffectCondition` gate evaluated against a `ConditionSnapshot`
//!
//! The engine answers "what is the net numeric/boolean value of everything
//! currently active" via a single generic fold; it never decides *when* a
//! hook fires. That is the job of whichever system owns the hook (casting,
//! combat resolution, effect expiry).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::combat::events::{EffectRemovalReason, EffectRemovedEvent};
use crate::combat::log::{CombatLog, CombatLogEventType};
use super::components::{Combatant, Roster};
use super::SimClock;

/// Cooldown reduction aggregates are capped so recharge can never drop below
/// 20% of its base duration.
pub const COOLDOWN_REDUCTION_CAP: f32 = 0.8;

/// Inline capacity for per-entity active effect lists. Effects beyond this
/// spill to the heap; content rarely stacks more than a handful.
pub const ACTIVE_EFFECT_INLINE: usize = 8;

// ============================================================================
// Modifiers & aggregation
// ============================================================================

/// How a modifier kind folds across all active effects that carry it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AggregatePolicy {
    /// Fold by product, seeded at 1.0 (damage/armor/speed multipliers).
    Product,
    /// Fold by sum, seeded at 0.0 (flat adds, per-second drains, chances).
    Sum,
    /// Fold by sum, then clamp to the given upper bound.
    SumClamped(f32),
    /// Logical OR across effects carrying a value of 1 (flags).
    OrFlag,
}

/// Closed set of modifier kinds the engine understands.
///
/// Each kind carries its aggregation policy via [`ModifierKind::policy`],
/// so there is exactly one fold function instead of one per kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKind {
    // Multiplicative (Product)
    DamageMult,
    ArmorMult,
    MoveSpeedMult,
    AttackSpeedMult,
    CastSpeedMult,
    EnergyCostMult,
    EnergyRegenMult,
    MaxWarmthMult,
    MaxEnergyMult,
    HealingMult,
    // Additive (Sum)
    DamageAdd,
    ArmorAdd,
    MaxWarmthAdd,
    MaxEnergyAdd,
    WarmthPerSecond,
    EnergyPerSecond,
    BlockChance,
    EvadeChance,
    ReflectPercent,
    /// Instantaneous warmth delta (positive heals, negative damages).
    /// Only meaningful when an effect fires, never while it persists.
    WarmthDelta,
    /// Instantaneous energy delta, clamped into `[0, max]`.
    EnergyDelta,
    // Sum then clamp
    CooldownReduction,
    // Flags (OrFlag)
    Knockdown,
    DamageImmune,
    SkillsDisabled,
    /// Firing strips every chill from the target.
    StripChills,
    /// Firing strips every cozy from the target.
    StripCozies,
}

impl ModifierKind {
    /// The aggregation policy for this kind.
    pub fn policy(self) -> AggregatePolicy {
        use ModifierKind::*;
        match self {
            DamageMult | ArmorMult | MoveSpeedMult | AttackSpeedMult | CastSpeedMult
            | EnergyCostMult | EnergyRegenMult | MaxWarmthMult | MaxEnergyMult | HealingMult => {
                AggregatePolicy::Product
            }
            DamageAdd | ArmorAdd | MaxWarmthAdd | MaxEnergyAdd | WarmthPerSecond
            | EnergyPerSecond | BlockChance | EvadeChance | ReflectPercent | WarmthDelta
            | EnergyDelta => AggregatePolicy::Sum,
            CooldownReduction => AggregatePolicy::SumClamped(COOLDOWN_REDUCTION_CAP),
            Knockdown | DamageImmune | SkillsDisabled | StripChills | StripCozies => {
                AggregatePolicy::OrFlag
            }
        }
    }
}

/// A single `{kind, value}` pair inside an effect.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub kind: ModifierKind,
    pub value: f32,
}

// ============================================================================
// Timing, shape, polarity, stacking
// ============================================================================

/// When an effect's modifiers take hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectTiming {
    /// Fires when the cast executes, regardless of hit outcome.
    OnCast,
    /// Fires only on targets that actually took damage.
    OnHit,
    /// Modifiers participate in aggregation for the effect's lifetime.
    WhileActive,
    /// Dormant while active; fires its instant modifiers on natural expiry.
    OnEnd,
    /// Dormant while active; fires its instant modifiers only if stripped.
    OnRemovedEarly,
    /// Dormant; fires whenever the owner takes warmth damage.
    OnTakeDamage,
    /// Dormant; fires whenever the owner blocks.
    OnBlock,
    /// Dormant; fires when the owner is knocked down.
    OnKnockdown,
}

/// Who an effect (or a skill's damage/healing) lands on, relative to the
/// resolved cast.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum TargetShape {
    Caster,
    Target,
    RadiusAroundCaster(f32),
    RadiusAroundTarget(f32),
    /// The entity that dealt the triggering damage (reflection hooks).
    DamageSource,
}

/// Cozies are beneficial, chills are hostile. Strips select by polarity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Cozy,
    Chill,
}

/// What happens when an effect is applied while an instance from the same
/// spec is already active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackPolicy {
    RefreshDuration,
    AddIntensity,
    IgnoreIfActive,
}

fn default_max_stacks() -> u32 {
    1
}

// ============================================================================
// Conditions
// ============================================================================

/// Closed set of gating conditions, evaluated by a single match over a
/// [`ConditionSnapshot`]. Conditions whose backing snapshot field is not
/// populated by the caller evaluate permissively to `true`; content authored
/// against unfinished wiring relies on that default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectCondition {
    Always,
    // Warmth thresholds
    TargetWarmthBelow25,
    TargetWarmthBelow50,
    TargetWarmthBelow75,
    TargetWarmthAbove50,
    TargetWarmthAbove75,
    CasterWarmthBelow25,
    CasterWarmthBelow50,
    CasterWarmthAbove50,
    CasterWarmthAbove75,
    // Energy thresholds
    CasterEnergyBelow25,
    CasterEnergyBelow50,
    CasterEnergyAbove50,
    CasterEnergyAbove75,
    TargetEnergyBelow50,
    // Movement / action state
    TargetMoving,
    TargetStationary,
    TargetCasting,
    TargetNotCasting,
    TargetBlocking,
    TargetKnockedDown,
    CasterMoving,
    CasterStationary,
    // Status counts and flags
    TargetChilled,
    TargetNotChilled,
    TargetCozy,
    TargetNotCozy,
    TargetChillsAtLeast2,
    TargetCoziesAtLeast2,
    CasterChilled,
    CasterCozy,
    // Positional / terrain
    CasterOnSnow,
    TargetSheltered,
    // Skill-type history
    LastSkillWasWindup,
    LastSkillWasStandard,
    // Team composition
    AllyNearby,
    EnemiesNearbyAtLeast2,
}

/// Point-in-time view of the game state a condition may inspect.
///
/// `Option` fields are the ones not every call site can populate; `None`
/// means "not wired here" and the matching conditions pass permissively.
#[derive(Clone, Debug, Default)]
pub struct ConditionSnapshot {
    pub caster_warmth_pct: f32,
    pub target_warmth_pct: f32,
    pub caster_energy_pct: f32,
    pub target_energy_pct: f32,
    pub caster_chills: u32,
    pub caster_cozies: u32,
    pub target_chills: u32,
    pub target_cozies: u32,
    pub caster_moving: Option<bool>,
    pub target_moving: Option<bool>,
    pub target_casting: Option<bool>,
    pub target_blocking: Option<bool>,
    pub target_knocked_down: Option<bool>,
    pub caster_on_snow: Option<bool>,
    pub target_sheltered: Option<bool>,
    pub last_skill_windup: Option<bool>,
    pub ally_nearby: Option<bool>,
    pub enemies_nearby: Option<u32>,
}

/// Evaluate a condition against a snapshot.
///
/// Unwired `Option` fields default to `true` (permissive), never `false`.
pub fn evaluate_condition(cond: EffectCondition, snap: &ConditionSnapshot) -> bool {
    use EffectCondition::*;
    match cond {
        Always => true,
        TargetWarmthBelow25 => snap.target_warmth_pct < 0.25,
        TargetWarmthBelow50 => snap.target_warmth_pct < 0.50,
        TargetWarmthBelow75 => snap.target_warmth_pct < 0.75,
        TargetWarmthAbove50 => snap.target_warmth_pct > 0.50,
        TargetWarmthAbove75 => snap.target_warmth_pct > 0.75,
        CasterWarmthBelow25 => snap.caster_warmth_pct < 0.25,
        CasterWarmthBelow50 => snap.caster_warmth_pct < 0.50,
        CasterWarmthAbove50 => snap.caster_warmth_pct > 0.50,
        CasterWarmthAbove75 => snap.caster_warmth_pct > 0.75,
        CasterEnergyBelow25 => snap.caster_energy_pct < 0.25,
        CasterEnergyBelow50 => snap.caster_energy_pct < 0.50,
        CasterEnergyAbove50 => snap.caster_energy_pct > 0.50,
        CasterEnergyAbove75 => snap.caster_energy_pct > 0.75,
        TargetEnergyBelow50 => snap.target_energy_pct < 0.50,
        TargetMoving => snap.target_moving.unwrap_or(true),
        TargetStationary => snap.target_moving.map_or(true, |m| !m),
        TargetCasting => snap.target_casting.unwrap_or(true),
        TargetNotCasting => snap.target_casting.map_or(true, |c| !c),
        TargetBlocking => snap.target_blocking.unwrap_or(true),
        TargetKnockedDown => snap.target_knocked_down.unwrap_or(true),
        CasterMoving => snap.caster_moving.unwrap_or(true),
        CasterStationary => snap.caster_moving.map_or(true, |m| !m),
        TargetChilled => snap.target_chills >= 1,
        TargetNotChilled => snap.target_chills == 0,
        TargetCozy => snap.target_cozies >= 1,
        TargetNotCozy => snap.target_cozies == 0,
        TargetChillsAtLeast2 => snap.target_chills >= 2,
        TargetCoziesAtLeast2 => snap.target_cozies >= 2,
        CasterChilled => snap.caster_chills >= 1,
        CasterCozy => snap.caster_cozies >= 1,
        CasterOnSnow => snap.caster_on_snow.unwrap_or(true),
        TargetSheltered => snap.target_sheltered.unwrap_or(true),
        LastSkillWasWindup => snap.last_skill_windup.unwrap_or(true),
        LastSkillWasStandard => snap.last_skill_windup.map_or(true, |w| !w),
        AllyNearby => snap.ally_nearby.unwrap_or(true),
        EnemiesNearbyAtLeast2 => snap.enemies_nearby.map_or(true, |n| n >= 2),
    }
}

// ============================================================================
// Effect descriptor & runtime instance
// ============================================================================

/// Static effect descriptor, authored in skill content (RON).
///
/// A duration of 0.0 means the effect is instantaneous: its modifiers fire
/// once and nothing persists. An empty modifier list is a legal no-op
/// placeholder. Immutable content; runtime instances clone it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    /// Display name, also the stacking identity.
    pub name: String,
    pub polarity: Polarity,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    pub timing: EffectTiming,
    pub shape: TargetShape,
    #[serde(default = "default_condition")]
    pub condition: EffectCondition,
    /// Seconds; 0.0 = instantaneous.
    #[serde(default)]
    pub duration: f32,
    #[serde(default = "default_stacking")]
    pub stacking: StackPolicy,
    #[serde(default = "default_max_stacks")]
    pub max_stacks: u32,
}

fn default_condition() -> EffectCondition {
    EffectCondition::Always
}

fn default_stacking() -> StackPolicy {
    StackPolicy::RefreshDuration
}

impl EffectSpec {
    /// The first modifier value of the given kind, if any. Used when firing
    /// instant modifiers.
    pub fn value_of(&self, kind: ModifierKind) -> Option<f32> {
        self.modifiers.iter().find(|m| m.kind == kind).map(|m| m.value)
    }

    pub fn has_flag(&self, kind: ModifierKind) -> bool {
        self.modifiers
            .iter()
            .any(|m| m.kind == kind && m.value as i32 == 1)
    }
}

/// Runtime instantiation of an [`EffectSpec`] on one entity.
#[derive(Clone, Debug)]
pub struct ActiveEffect {
    pub spec: EffectSpec,
    /// Remaining lifetime in seconds; clamped at zero on removal.
    pub remaining: f32,
    /// Never exceeds `spec.max_stacks`.
    pub stacks: u32,
    /// Who applied this effect (reflection and kill-credit attribution).
    pub source: Entity,
}

/// Per-entity collection of active effects.
#[derive(Component, Default, Debug)]
pub struct ActiveEffects {
    pub effects: SmallVec<[ActiveEffect; ACTIVE_EFFECT_INLINE]>,
}

impl ActiveEffects {
    /// Fold the aggregate value of one modifier kind across all while-active
    /// effects, per the kind's [`AggregatePolicy`].
    ///
    /// Sum-family stacking multiplies by stack count; product-family raises
    /// to the stack count.
    pub fn aggregate(&self, kind: ModifierKind) -> f32 {
        let mut relevant = self
            .effects
            .iter()
            .filter(|e| e.spec.timing == EffectTiming::WhileActive)
            .flat_map(|e| {
                e.spec
                    .modifiers
                    .iter()
                    .filter(move |m| m.kind == kind)
                    .map(move |m| (m.value, e.stacks))
            });

        match kind.policy() {
            AggregatePolicy::Product => {
                relevant.fold(1.0, |acc, (v, stacks)| acc * v.powi(stacks as i32))
            }
            AggregatePolicy::Sum => relevant.fold(0.0, |acc, (v, stacks)| acc + v * stacks as f32),
            AggregatePolicy::SumClamped(cap) => relevant
                .fold(0.0, |acc, (v, stacks)| acc + v * stacks as f32)
                .min(cap),
            AggregatePolicy::OrFlag => {
                if relevant.any(|(v, _)| v as i32 == 1) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// OR-fold for flag kinds across while-active effects.
    pub fn flag(&self, kind: ModifierKind) -> bool {
        debug_assert!(
            matches!(kind.policy(), AggregatePolicy::OrFlag),
            "flag() called on non-flag modifier kind {kind:?}"
        );
        self.effects.iter().any(|e| {
            e.spec.timing == EffectTiming::WhileActive && e.spec.has_flag(kind)
        })
    }

    /// Count of active effects of the given polarity.
    pub fn count(&self, polarity: Polarity) -> u32 {
        self.effects
            .iter()
            .filter(|e| e.spec.polarity == polarity)
            .count() as u32
    }

    pub fn has_named(&self, name: &str) -> bool {
        self.effects.iter().any(|e| e.spec.name == name)
    }

    /// Insert a persistent effect, applying the spec's stacking policy.
    /// Returns `false` if `IgnoreIfActive` suppressed the application.
    ///
    /// Caller is responsible for only passing specs with `duration > 0`.
    pub fn apply(&mut self, spec: &EffectSpec, source: Entity) -> bool {
        debug_assert!(spec.duration > 0.0, "apply() called with instantaneous effect");
        if let Some(existing) = self.effects.iter_mut().find(|e| e.spec.name == spec.name) {
            match spec.stacking {
                StackPolicy::RefreshDuration => {
                    existing.remaining = spec.duration;
                    existing.source = source;
                }
                StackPolicy::AddIntensity => {
                    existing.stacks = (existing.stacks + 1).min(spec.max_stacks);
                    existing.remaining = spec.duration;
                    existing.source = source;
                }
                StackPolicy::IgnoreIfActive => return false,
            }
        } else {
            self.effects.push(ActiveEffect {
                spec: spec.clone(),
                remaining: spec.duration,
                stacks: 1,
                source,
            });
        }
        true
    }

    /// Remove every effect of the given polarity, returning the stripped
    /// instances so the caller can fire their on-removed-early hooks.
    pub fn strip(&mut self, polarity: Polarity) -> Vec<ActiveEffect> {
        let mut stripped = Vec::new();
        self.effects.retain(|e| {
            if e.spec.polarity == polarity {
                stripped.push(e.clone());
                false
            } else {
                true
            }
        });
        stripped
    }
}

// ============================================================================
// Effect countdown & expiry
// ============================================================================

/// Tick down every active effect and remove the expired ones.
///
/// Expired effects with `OnEnd` timing fire their instant modifiers on the
/// owner as they go. Stripped riders do not cascade further strips.
pub fn tick_effects(
    clock: Res<SimClock>,
    roster: Res<Roster>,
    mut query: Query<(&mut Combatant, &mut ActiveEffects)>,
    mut removed_events: EventWriter<EffectRemovedEvent>,
    mut combat_log: ResMut<CombatLog>,
) {
    let dt = clock.dt;

    for &entity in roster.entities.iter() {
        let Ok((mut combatant, mut effects)) = query.get_mut(entity) else {
            continue;
        };

        for effect in effects.effects.iter_mut() {
            effect.remaining = (effect.remaining - dt).max(0.0);
        }

        let expired: Vec<ActiveEffect> = {
            let mut out = Vec::new();
            effects.effects.retain(|e| {
                if e.remaining <= 0.0 {
                    out.push(e.clone());
                    false
                } else {
                    true
                }
            });
            out
        };

        for effect in expired {
            if effect.spec.timing == EffectTiming::OnEnd {
                fire_instant_on_owner(&effect.spec, &mut combatant, &mut effects);
            }
            combat_log.log(
                CombatLogEventType::EffectRemoved,
                format!("{} fades from {}", effect.spec.name, combatant.id),
            );
            removed_events.send(EffectRemovedEvent {
                target: entity,
                effect_name: effect.spec.name.clone(),
                reason: EffectRemovalReason::Expired,
            });
        }
    }
}

/// Fire the instantaneous portion of an effect on its owner: warmth/energy
/// deltas and polarity strips. Conditions were checked at application time.
///
/// Returns the effects stripped as a side consequence, already removed.
pub fn fire_instant_on_owner(
    spec: &EffectSpec,
    combatant: &mut Combatant,
    effects: &mut ActiveEffects,
) -> Vec<ActiveEffect> {
    // Pools are frozen once dead; nothing fires on a corpse.
    if combatant.dead {
        return Vec::new();
    }
    if let Some(delta) = spec.value_of(ModifierKind::WarmthDelta) {
        if delta >= 0.0 {
            let _ = super::resources::apply_healing(combatant, delta, 1.0);
        } else {
            let _ = super::resources::apply_damage(combatant, -delta);
        }
    }
    if let Some(delta) = spec.value_of(ModifierKind::EnergyDelta) {
        combatant.energy = (combatant.energy + delta).clamp(0.0, combatant.max_energy);
    }

    let mut stripped = Vec::new();
    if spec.has_flag(ModifierKind::StripChills) {
        stripped.extend(effects.strip(Polarity::Chill));
    }
    if spec.has_flag(ModifierKind::StripCozies) {
        stripped.extend(effects.strip(Polarity::Cozy));
    }
    // Stripped effects with an on-removed-early hook fire once, without
    // cascading into further strips.
    for removed in &stripped {
        if removed.spec.timing == EffectTiming::OnRemovedEarly {
            if let Some(delta) = removed.spec.value_of(ModifierKind::WarmthDelta) {
                if delta >= 0.0 {
                    let _ = super::resources::apply_healing(combatant, delta, 1.0);
                } else {
                    let _ = super::resources::apply_damage(combatant, -delta);
                }
            }
            if let Some(delta) = removed.spec.value_of(ModifierKind::EnergyDelta) {
                combatant.energy = (combatant.energy + delta).clamp(0.0, combatant.max_energy);
            }
        }
    }
    stripped
}

/// Fire every dormant hook effect of the given timing on an owner.
/// Used by combat resolution for on-take-damage / on-block / on-knockdown.
pub fn fire_hooks(timing: EffectTiming, combatant: &mut Combatant, effects: &mut ActiveEffects) {
    let hooks: Vec<EffectSpec> = effects
        .effects
        .iter()
        .filter(|e| e.spec.timing == timing)
        .map(|e| e.spec.clone())
        .collect();
    for spec in hooks {
        fire_instant_on_owner(&spec, combatant, effects);
    }
}
