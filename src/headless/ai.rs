//! Scripted intent driver for headless matches
//!
//! Stands in for the external player/AI collaborator: it submits the same
//! movement and cast intents a player would, through the same queue. It is
//! deliberately simple and fully deterministic (roster order, no RNG);
//! decision quality is not a goal.

use bevy::prelude::*;

use crate::sim::components::{
    CastState, CastTarget, Combatant, CooldownTable, Roster, SkillBar, SKILL_BAR_SLOTS,
};
use crate::sim::effects::{ActiveEffects, ModifierKind};
use crate::sim::intents::PendingIntents;
use crate::sim::outcome::MatchOutcome;
use crate::skills::{SkillBook, TargetKind};

/// How close a combatant walks toward its nearest enemy before holding.
const ENGAGE_DISTANCE: f32 = 12.0;

/// Heal allies below this warmth fraction.
const HEAL_THRESHOLD: f32 = 0.9;

struct UnitFacts {
    entity: Entity,
    team: u8,
    dead: bool,
    pos: Vec3,
    warmth_pct: f32,
}

/// Submit one intent per idle combatant per tick: the first usable skill
/// in bar order, otherwise a step toward the nearest enemy.
#[allow(clippy::type_complexity)]
pub fn scripted_intents(
    roster: Res<Roster>,
    book: Res<SkillBook>,
    outcome: Res<MatchOutcome>,
    query: Query<(
        &Combatant,
        &CastState,
        &SkillBar,
        &CooldownTable,
        &ActiveEffects,
        &Transform,
    )>,
    mut intents: ResMut<PendingIntents>,
) {
    if *outcome != MatchOutcome::Active {
        return;
    }

    let facts: Vec<UnitFacts> = roster
        .entities
        .iter()
        .filter_map(|&entity| {
            query.get(entity).ok().map(|(c, _s, _b, _cd, _fx, t)| UnitFacts {
                entity,
                team: c.team,
                dead: c.dead,
                pos: t.translation,
                warmth_pct: c.warmth_pct(),
            })
        })
        .collect();

    for &entity in roster.entities.iter() {
        let Ok((combatant, state, bar, cooldowns, fx, transform)) = query.get(entity) else {
            continue;
        };
        if combatant.dead || !state.is_idle() {
            continue;
        }
        let my_pos = transform.translation;

        let nearest_enemy = facts
            .iter()
            .filter(|f| !f.dead && f.team != combatant.team)
            .min_by(|a, b| {
                a.pos
                    .distance(my_pos)
                    .partial_cmp(&b.pos.distance(my_pos))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

        let mut submitted = false;
        for slot in 0..SKILL_BAR_SLOTS {
            let Some(skill) = bar.skill_in_slot(slot) else {
                continue;
            };
            let Some(spec) = book.get(&skill) else {
                continue;
            };
            if !cooldowns.is_ready(slot) {
                continue;
            }
            let cost = spec.energy_cost * fx.aggregate(ModifierKind::EnergyCostMult);
            if combatant.energy < cost {
                continue;
            }

            let target = match spec.target_kind {
                TargetKind::SelfOnly => {
                    // Skip re-buffing while the carried effect is still up.
                    let redundant = spec
                        .effects
                        .first()
                        .is_some_and(|e| fx.has_named(&e.name));
                    if redundant {
                        None
                    } else {
                        Some(CastTarget::SelfCast)
                    }
                }
                TargetKind::Ally => facts
                    .iter()
                    .filter(|f| {
                        !f.dead
                            && f.team == combatant.team
                            && f.warmth_pct < HEAL_THRESHOLD
                            && f.pos.distance(my_pos) <= spec.range
                    })
                    .min_by(|a, b| {
                        a.warmth_pct
                            .partial_cmp(&b.warmth_pct)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .map(|f| CastTarget::Unit(f.entity)),
                TargetKind::Enemy => nearest_enemy
                    .filter(|f| f.pos.distance(my_pos) <= spec.range)
                    .map(|f| CastTarget::Unit(f.entity)),
                TargetKind::Ground => nearest_enemy
                    .filter(|f| f.pos.distance(my_pos) <= spec.range)
                    .map(|f| CastTarget::Ground(f.pos)),
            };

            if let Some(target) = target {
                intents.submit_cast(entity, slot, target);
                submitted = true;
                break;
            }
        }

        if !submitted {
            if let Some(enemy) = nearest_enemy {
                if enemy.pos.distance(my_pos) > ENGAGE_DISTANCE {
                    intents.submit_move(entity, enemy.pos - my_pos);
                }
            }
        }
    }
}
