//! Combat resolution
//!
//! Advances the cast state machine each tick and resolves executed skill
//! payloads: target selection by shape, the evade/block/mitigation pipeline,
//! healing with overheal accounting, reflection, and effect application.
//!
//! Every target resolves independently; there is no shared damage pool for
//! area skills. All randomness comes from the explicit `SimRng` resource.

use bevy::prelude::*;
use std::collections::HashMap;

use super::components::{CastState, CastTarget, Combatant, CombatantId, Roster, SimRng};
use super::effects::{
    self, evaluate_condition, ActiveEffects, ConditionSnapshot, EffectTiming, ModifierKind,
    Polarity, TargetShape,
};
use super::resources::apply_damage;
use super::SimClock;
use crate::combat::events::{
    CastResolvedEvent, DamageEvent, DeathEvent, EffectAppliedEvent, EffectRemovalReason,
    EffectRemovedEvent, HealingEvent,
};
use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::skills::{SkillBook, SkillId, TargetKind};

/// Caster-side outgoing damage parameters, snapshotted before the target
/// is borrowed.
#[derive(Debug, Clone, Copy)]
pub struct OutgoingDamage {
    pub base: f32,
    pub damage_mult: f32,
    pub damage_add: f32,
}

/// What happened to one target of one hit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HitOutcome {
    /// Post-mitigation amount attempted against the warmth pool.
    pub attempted: f32,
    pub applied: f32,
    pub overkill: f32,
    pub blocked: bool,
    pub evaded: bool,
    /// Damage owed back to the source. Never re-reflected.
    pub reflected: f32,
    pub killing_blow: bool,
}

/// What happened to one target of one heal.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HealOutcome {
    pub raw: f32,
    pub applied: f32,
    pub overheal: f32,
}

/// Run the hit pipeline against a single target.
///
/// Order: evade roll, block roll (fires on-block hooks), mitigation
/// (caster multipliers then target armor, floored at zero), immunity,
/// application with overkill accounting, reflection, on-take-damage hooks.
pub fn resolve_damage_on(
    target: &mut Combatant,
    target_fx: &mut ActiveEffects,
    out: OutgoingDamage,
    rng: &mut SimRng,
) -> HitOutcome {
    let mut outcome = HitOutcome::default();
    if target.dead {
        return outcome;
    }

    let evade = target_fx.aggregate(ModifierKind::EvadeChance);
    if evade > 0.0 && rng.random_f32() < evade {
        outcome.evaded = true;
        return outcome;
    }

    let block = target_fx.aggregate(ModifierKind::BlockChance);
    if block > 0.0 && rng.random_f32() < block {
        outcome.blocked = true;
        effects::fire_hooks(EffectTiming::OnBlock, target, target_fx);
        return outcome;
    }

    let pre_armor = (out.base * out.damage_mult + out.damage_add).max(0.0);
    let mut mitigated = (pre_armor * target_fx.aggregate(ModifierKind::ArmorMult)
        - target_fx.aggregate(ModifierKind::ArmorAdd))
    .max(0.0);
    if target_fx.flag(ModifierKind::DamageImmune) {
        mitigated = 0.0;
    }

    outcome.attempted = mitigated;
    let applied = apply_damage(target, mitigated);
    outcome.applied = applied.applied;
    outcome.overkill = applied.overkill;
    outcome.killing_blow = applied.killing_blow;

    if outcome.applied > 0.0 {
        let reflect = target_fx.aggregate(ModifierKind::ReflectPercent).max(0.0);
        outcome.reflected = outcome.applied * reflect;
        effects::fire_hooks(EffectTiming::OnTakeDamage, target, target_fx);
    }
    outcome
}

/// Run the healing pipeline against a single target. The healing-received
/// multiplier comes from the target's while-active aggregate.
pub fn resolve_healing_on(
    target: &mut Combatant,
    target_fx: &ActiveEffects,
    base: f32,
) -> HealOutcome {
    let mult = target_fx.aggregate(ModifierKind::HealingMult);
    let result = super::resources::apply_healing(target, base, mult);
    HealOutcome {
        raw: base * mult,
        applied: result.applied,
        overheal: result.overheal,
    }
}

/// Point-in-time entity facts captured before payload resolution.
#[derive(Clone, Debug)]
struct EntityInfo {
    id: CombatantId,
    team: u8,
    dead: bool,
    pos: Vec3,
    warmth_pct: f32,
    energy_pct: f32,
    chills: u32,
    cozies: u32,
    knocked_down: bool,
    casting: bool,
    last_skill_windup: Option<bool>,
}

struct Execution {
    caster: Entity,
    skill: SkillId,
    target: CastTarget,
}

/// Advance every cast state machine one tick and resolve payloads that
/// crossed their execution threshold.
///
/// Windup skills execute once elapsed time reaches half the activation;
/// everything else executes at completion. Timers always run to completion
/// even when the target died mid-cast; the payload is then skipped with no
/// refund.
#[allow(clippy::too_many_arguments)]
pub fn advance_casts(
    clock: Res<SimClock>,
    roster: Res<Roster>,
    book: Res<SkillBook>,
    mut rng: ResMut<SimRng>,
    mut query: Query<(&mut Combatant, &mut CastState, &mut ActiveEffects, &Transform)>,
    mut damage_events: EventWriter<DamageEvent>,
    mut healing_events: EventWriter<HealingEvent>,
    mut resolved_events: EventWriter<CastResolvedEvent>,
    mut applied_events: EventWriter<EffectAppliedEvent>,
    mut removed_events: EventWriter<EffectRemovedEvent>,
    mut death_events: EventWriter<DeathEvent>,
    mut combat_log: ResMut<CombatLog>,
) {
    let dt = clock.dt;
    let mut executions: Vec<Execution> = Vec::new();

    // Phase 1: advance timers in roster order, collecting executions.
    for &entity in roster.entities.iter() {
        let Ok((mut combatant, mut state, _fx, _transform)) = query.get_mut(entity) else {
            continue;
        };

        // Forced cancel: death resets the machine, no refund.
        if combatant.dead {
            if !state.is_idle() {
                *state = CastState::Idle;
            }
            continue;
        }

        let mut next: Option<CastState> = None;
        match &mut *state {
            CastState::Idle => {}
            CastState::Activating {
                skill,
                remaining,
                total,
                executed,
                target,
                ..
            } => {
                *remaining = (*remaining - dt).max(0.0);
                let spec = book.get_unchecked(skill);
                let threshold = if spec.windup { *total * 0.5 } else { 0.0 };
                if !*executed && *remaining <= threshold {
                    *executed = true;
                    combatant.last_skill_was_windup = Some(spec.windup);
                    executions.push(Execution {
                        caster: entity,
                        skill: *skill,
                        target: *target,
                    });
                }
                if *remaining <= 0.0 {
                    next = Some(if spec.aftercast > 0.0 {
                        CastState::Aftercast {
                            remaining: spec.aftercast,
                            move_allowed: spec.aftercast_move,
                        }
                    } else {
                        CastState::Idle
                    });
                }
            }
            CastState::Aftercast { remaining, .. } => {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    next = Some(CastState::Idle);
                }
            }
        }
        if let Some(next_state) = next {
            *state = next_state;
        }
    }

    if executions.is_empty() {
        return;
    }

    // Phase 2: snapshot entity facts for target selection and conditions.
    let mut infos: HashMap<Entity, EntityInfo> = HashMap::new();
    for &entity in roster.entities.iter() {
        if let Ok((combatant, state, fx, transform)) = query.get(entity) {
            infos.insert(
                entity,
                EntityInfo {
                    id: combatant.id.clone(),
                    team: combatant.team,
                    dead: combatant.dead,
                    pos: transform.translation,
                    warmth_pct: combatant.warmth_pct(),
                    energy_pct: combatant.energy_pct(),
                    chills: fx.count(Polarity::Chill),
                    cozies: fx.count(Polarity::Cozy),
                    knocked_down: fx.flag(ModifierKind::Knockdown),
                    casting: state.is_activating(),
                    last_skill_windup: combatant.last_skill_was_windup,
                },
            );
        }
    }

    // Phase 3: resolve each execution in order.
    for exec in executions {
        let Some(spec) = book.get(&exec.skill) else {
            continue;
        };
        let Some(caster_info) = infos.get(&exec.caster).cloned() else {
            continue;
        };

        let (damage_mult, damage_add) = match query.get(exec.caster) {
            Ok((_c, _s, fx, _t)) => (
                fx.aggregate(ModifierKind::DamageMult),
                fx.aggregate(ModifierKind::DamageAdd),
            ),
            Err(_) => continue,
        };

        combat_log.log(
            CombatLogEventType::SkillUsed,
            format!("{} uses {}", caster_info.id, spec.name),
        );
        resolved_events.send(CastResolvedEvent {
            caster: exec.caster,
            skill_name: spec.name.clone(),
        });

        let payload_friendly = spec.is_heal()
            || matches!(spec.target_kind, TargetKind::Ally | TargetKind::SelfOnly);
        let payload_targets = select_targets(
            spec.shape,
            exec.caster,
            &exec.target,
            payload_friendly,
            &infos,
            &roster,
        );

        let mut total_reflected = 0.0;
        let mut caster_damage_dealt = 0.0;
        let mut caster_healing = 0.0;
        let mut caster_overheal = 0.0;
        let mut damaged: Vec<Entity> = Vec::new();

        for &target_entity in payload_targets.iter() {
            let target_id = match infos.get(&target_entity) {
                Some(info) => info.id.clone(),
                None => continue,
            };

            if spec.is_damage() {
                let Ok((mut tc, _s, mut tfx, _t)) = query.get_mut(target_entity) else {
                    continue;
                };
                let outcome = resolve_damage_on(
                    &mut tc,
                    &mut tfx,
                    OutgoingDamage {
                        base: spec.base_damage,
                        damage_mult,
                        damage_add,
                    },
                    &mut rng,
                );
                caster_damage_dealt += outcome.applied;
                total_reflected += outcome.reflected;
                if outcome.applied > 0.0 {
                    damaged.push(target_entity);
                }

                if outcome.evaded {
                    combat_log.log(
                        CombatLogEventType::Damage,
                        format!("{} evades {}'s {}", target_id, caster_info.id, spec.name),
                    );
                } else if outcome.blocked {
                    combat_log.log(
                        CombatLogEventType::Damage,
                        format!("{} blocks {}'s {}", target_id, caster_info.id, spec.name),
                    );
                } else {
                    combat_log.record_damage(
                        &caster_info.id,
                        &target_id,
                        &spec.name,
                        outcome.applied,
                    );
                }
                damage_events.send(DamageEvent {
                    source: exec.caster,
                    target: target_entity,
                    skill_name: spec.name.clone(),
                    amount: outcome.attempted,
                    applied: outcome.applied,
                    overkill: outcome.overkill,
                    blocked: outcome.blocked,
                    evaded: outcome.evaded,
                    reflected: outcome.reflected,
                });

                if outcome.killing_blow {
                    handle_death(
                        target_entity,
                        &target_id,
                        Some(exec.caster),
                        &mut tfx,
                        &mut combat_log,
                        &mut death_events,
                        &mut removed_events,
                    );
                }
            }

            if spec.is_heal() {
                let Ok((mut tc, _s, tfx, _t)) = query.get_mut(target_entity) else {
                    continue;
                };
                let outcome = resolve_healing_on(&mut tc, &tfx, spec.base_healing);
                caster_healing += outcome.applied;
                caster_overheal += outcome.overheal;
                combat_log.record_healing(
                    &caster_info.id,
                    &target_id,
                    &spec.name,
                    outcome.applied,
                    outcome.overheal,
                );
                healing_events.send(HealingEvent {
                    source: exec.caster,
                    target: target_entity,
                    skill_name: spec.name.clone(),
                    raw: outcome.raw,
                    applied: outcome.applied,
                    overheal: outcome.overheal,
                });
            }
        }

        // Carried effects, each with its own shape, timing, and condition.
        for effect in spec.effects.iter() {
            let friendly = effect.polarity == Polarity::Cozy;
            let mut recipients = select_targets(
                effect.shape,
                exec.caster,
                &exec.target,
                friendly,
                &infos,
                &roster,
            );
            // On-hit effects only land on targets that actually lost warmth.
            if effect.timing == EffectTiming::OnHit {
                recipients.retain(|e| damaged.contains(e));
            }

            for recipient in recipients {
                let Some(rinfo) = infos.get(&recipient) else {
                    continue;
                };
                let snap = ConditionSnapshot {
                    caster_warmth_pct: caster_info.warmth_pct,
                    target_warmth_pct: rinfo.warmth_pct,
                    caster_energy_pct: caster_info.energy_pct,
                    target_energy_pct: rinfo.energy_pct,
                    caster_chills: caster_info.chills,
                    caster_cozies: caster_info.cozies,
                    target_chills: rinfo.chills,
                    target_cozies: rinfo.cozies,
                    target_casting: Some(rinfo.casting),
                    target_knocked_down: Some(rinfo.knocked_down),
                    last_skill_windup: caster_info.last_skill_windup,
                    ..Default::default()
                };
                // False conditions skip silently.
                if !evaluate_condition(effect.condition, &snap) {
                    continue;
                }

                let Ok((mut tc, _s, mut tfx, _t)) = query.get_mut(recipient) else {
                    continue;
                };
                if tc.dead {
                    continue;
                }

                if effect.duration > 0.0 {
                    if tfx.apply(effect, exec.caster) {
                        combat_log.log(
                            CombatLogEventType::EffectApplied,
                            format!("{} gains {}", tc.id, effect.name),
                        );
                        applied_events.send(EffectAppliedEvent {
                            source: exec.caster,
                            target: recipient,
                            effect_name: effect.name.clone(),
                            duration: effect.duration,
                        });
                        if effect.has_flag(ModifierKind::Knockdown) {
                            effects::fire_hooks(EffectTiming::OnKnockdown, &mut tc, &mut tfx);
                        }
                    }
                } else {
                    let stripped = effects::fire_instant_on_owner(effect, &mut tc, &mut tfx);
                    for removed in stripped {
                        combat_log.log(
                            CombatLogEventType::EffectRemoved,
                            format!("{} is stripped from {}", removed.spec.name, tc.id),
                        );
                        removed_events.send(EffectRemovedEvent {
                            target: recipient,
                            effect_name: removed.spec.name,
                            reason: EffectRemovalReason::Stripped,
                        });
                    }
                    if tc.dead {
                        let victim_id = tc.id.clone();
                        handle_death(
                            recipient,
                            &victim_id,
                            Some(exec.caster),
                            &mut tfx,
                            &mut combat_log,
                            &mut death_events,
                            &mut removed_events,
                        );
                    }
                }
            }
        }

        // Reflection comes home last and is never itself reflected.
        if total_reflected > 0.0 {
            if let Ok((mut cc, _s, mut cfx, _t)) = query.get_mut(exec.caster) {
                let result = apply_damage(&mut cc, total_reflected);
                combat_log.log(
                    CombatLogEventType::Damage,
                    format!(
                        "{} takes {:.0} reflected warmth damage",
                        cc.id, result.applied
                    ),
                );
                if result.killing_blow {
                    let victim_id = cc.id.clone();
                    handle_death(
                        exec.caster,
                        &victim_id,
                        None,
                        &mut cfx,
                        &mut combat_log,
                        &mut death_events,
                        &mut removed_events,
                    );
                }
            }
        }

        if let Ok((mut cc, _s, _fx, _t)) = query.get_mut(exec.caster) {
            cc.damage_dealt += caster_damage_dealt;
            cc.healing_done += caster_healing;
            cc.overheal_done += caster_overheal;
        }
    }
}

/// Resolve a target shape into concrete entities, in roster order.
///
/// `friendly` selects which side of the caster's team the shape gathers.
/// A shape that resolves to nothing is a legal no-op.
fn select_targets(
    shape: TargetShape,
    caster: Entity,
    cast_target: &CastTarget,
    friendly: bool,
    infos: &HashMap<Entity, EntityInfo>,
    roster: &Roster,
) -> Vec<Entity> {
    let caster_team = match infos.get(&caster) {
        Some(info) => info.team,
        None => return Vec::new(),
    };

    let center_of = |t: &CastTarget| -> Option<Vec3> {
        match t {
            CastTarget::SelfCast => infos.get(&caster).map(|i| i.pos),
            CastTarget::Unit(e) => infos.get(e).map(|i| i.pos),
            CastTarget::Ground(p) => Some(*p),
        }
    };

    let in_radius = |center: Vec3, radius: f32| -> Vec<Entity> {
        roster
            .entities
            .iter()
            .copied()
            .filter(|e| {
                infos.get(e).is_some_and(|i| {
                    !i.dead
                        && (if friendly {
                            i.team == caster_team
                        } else {
                            i.team != caster_team
                        })
                        && i.pos.distance(center) <= radius
                })
            })
            .collect()
    };

    match shape {
        TargetShape::Caster => vec![caster],
        TargetShape::Target => match cast_target {
            CastTarget::SelfCast => vec![caster],
            CastTarget::Unit(e) => {
                if infos.get(e).is_some_and(|i| !i.dead) {
                    vec![*e]
                } else {
                    Vec::new()
                }
            }
            CastTarget::Ground(_) => Vec::new(),
        },
        TargetShape::RadiusAroundCaster(r) => match infos.get(&caster) {
            Some(info) => in_radius(info.pos, r),
            None => Vec::new(),
        },
        TargetShape::RadiusAroundTarget(r) => match center_of(cast_target) {
            Some(center) => in_radius(center, r),
            None => Vec::new(),
        },
        // Only meaningful inside reactive hooks, where the source is known.
        TargetShape::DamageSource => Vec::new(),
    }
}

fn handle_death(
    victim: Entity,
    victim_id: &str,
    killer: Option<Entity>,
    fx: &mut ActiveEffects,
    combat_log: &mut CombatLog,
    death_events: &mut EventWriter<DeathEvent>,
    removed_events: &mut EventWriter<EffectRemovedEvent>,
) {
    for effect in fx.effects.drain(..) {
        removed_events.send(EffectRemovedEvent {
            target: victim,
            effect_name: effect.spec.name,
            reason: EffectRemovalReason::TargetDied,
        });
    }
    combat_log.log(
        CombatLogEventType::Death,
        format!("{} is out of the fight", victim_id),
    );
    death_events.send(DeathEvent { victim, killer });
}
