//! Cooldown & Cast State Machine
//!
//! Cast-start gates run in a fixed order and are all-or-nothing: a rejected
//! intent leaves combatant state untouched. An accepted cast debits energy
//! and arms the slot cooldown immediately, then the state machine advances
//! through Activating and Aftercast in `sim::resolution`.

use bevy::prelude::*;

use super::components::{CastState, CastTarget, Combatant, CooldownTable, Roster, SkillBar};
use super::effects::{ActiveEffects, ModifierKind, COOLDOWN_REDUCTION_CAP};
use super::SimClock;
use crate::skills::{SkillSpec, TargetKind};

/// Why a cast intent was refused. Rejection is an expected outcome, not an
/// error; callers (AI, input layer) match on it to pick another action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastRejection {
    CasterDead,
    NotIdle,
    EmptySlot,
    OnCooldown,
    SkillsDisabled,
    InvalidTarget,
    OutOfRange,
    NotEnoughEnergy,
}

/// Check every cast-start gate in order without mutating anything.
///
/// On success returns the effective energy cost (base × EnergyCostMult
/// aggregate) so `start_cast` debits exactly what was checked.
#[allow(clippy::too_many_arguments)]
pub fn can_start_cast(
    caster: &Combatant,
    cast_state: &CastState,
    bar: &SkillBar,
    cooldowns: &CooldownTable,
    effects: &ActiveEffects,
    spec: Option<&SkillSpec>,
    slot: usize,
    target: &CastTarget,
    caster_pos: Vec3,
    target_info: Option<(&Combatant, Vec3)>,
) -> Result<f32, CastRejection> {
    if caster.dead {
        return Err(CastRejection::CasterDead);
    }
    if !cast_state.is_idle() {
        return Err(CastRejection::NotIdle);
    }
    if bar.skill_in_slot(slot).is_none() {
        return Err(CastRejection::EmptySlot);
    }
    let Some(spec) = spec else {
        return Err(CastRejection::EmptySlot);
    };
    if !cooldowns.is_ready(slot) {
        return Err(CastRejection::OnCooldown);
    }
    if effects.flag(ModifierKind::SkillsDisabled) || effects.flag(ModifierKind::Knockdown) {
        return Err(CastRejection::SkillsDisabled);
    }

    // Target validity for the skill's target kind.
    let target_pos = match (spec.target_kind, target) {
        (TargetKind::SelfOnly, CastTarget::SelfCast) => None,
        (TargetKind::SelfOnly, _) => return Err(CastRejection::InvalidTarget),
        (TargetKind::Ground, CastTarget::Ground(pos)) => Some(*pos),
        (TargetKind::Ground, _) => return Err(CastRejection::InvalidTarget),
        (TargetKind::Ally, CastTarget::Unit(_)) | (TargetKind::Enemy, CastTarget::Unit(_)) => {
            let Some((target_combatant, pos)) = target_info else {
                return Err(CastRejection::InvalidTarget);
            };
            if target_combatant.dead {
                return Err(CastRejection::InvalidTarget);
            }
            let same_team = target_combatant.team == caster.team;
            match spec.target_kind {
                TargetKind::Ally if !same_team => return Err(CastRejection::InvalidTarget),
                TargetKind::Enemy if same_team => return Err(CastRejection::InvalidTarget),
                _ => {}
            }
            Some(pos)
        }
        (TargetKind::Ally, _) | (TargetKind::Enemy, _) => {
            return Err(CastRejection::InvalidTarget)
        }
    };

    if let Some(pos) = target_pos {
        if caster_pos.distance(pos) > spec.range {
            return Err(CastRejection::OutOfRange);
        }
    }

    let cost = spec.energy_cost * effects.aggregate(ModifierKind::EnergyCostMult);
    if caster.energy < cost {
        return Err(CastRejection::NotEnoughEnergy);
    }

    Ok(cost)
}

/// Effective activation time: base scaled down by cast speed.
pub fn effective_activation(spec: &SkillSpec, effects: &ActiveEffects) -> f32 {
    let speed = effects.aggregate(ModifierKind::CastSpeedMult).max(0.01);
    spec.activation / speed
}

/// Effective recharge: base scaled by the capped cooldown-reduction sum.
pub fn effective_recharge(spec: &SkillSpec, effects: &ActiveEffects) -> f32 {
    let reduction = effects
        .aggregate(ModifierKind::CooldownReduction)
        .min(COOLDOWN_REDUCTION_CAP);
    spec.recharge * (1.0 - reduction)
}

/// Commit an accepted cast: debit energy, arm the slot cooldown, enter
/// Activating. `cost` must come from the matching `can_start_cast` call.
pub fn start_cast(
    caster: &mut Combatant,
    cast_state: &mut CastState,
    cooldowns: &mut CooldownTable,
    effects: &ActiveEffects,
    spec: &SkillSpec,
    skill: crate::skills::SkillId,
    slot: usize,
    target: CastTarget,
    cost: f32,
) {
    debug_assert!(caster.energy >= cost, "start_cast called without a passing gate check");
    caster.energy -= cost;
    cooldowns.arm(slot, effective_recharge(spec, effects));

    let total = effective_activation(spec, effects);
    *cast_state = CastState::Activating {
        slot,
        skill,
        remaining: total,
        total,
        executed: false,
        target,
    };
}

/// Count down every armed cooldown. Runs once per tick, before intent
/// application, so a skill that just came off cooldown is castable in the
/// same tick.
pub fn tick_cooldowns(
    clock: Res<SimClock>,
    roster: Res<Roster>,
    mut query: Query<&mut CooldownTable>,
) {
    for &entity in roster.entities.iter() {
        if let Ok(mut cooldowns) = query.get_mut(entity) {
            cooldowns.tick(clock.dt);
        }
    }
}
