//! Queued intent application
//!
//! External collaborators (input layer, AI driver) never mutate simulation
//! state directly; they queue intents into `PendingIntents` between ticks.
//! This system drains the queue once per tick, in submission order, applying
//! movement and starting casts through the gate checks in `sim::casting`.

use bevy::prelude::*;

use super::casting::{can_start_cast, start_cast};
use super::components::{CastState, CastTarget, Combatant, CooldownTable, SkillBar};
use super::effects::{ActiveEffects, ModifierKind};
use super::SimClock;
use crate::combat::events::CastStartedEvent;
use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::skills::SkillBook;

/// A movement request for one tick. Direction is normalized on application.
#[derive(Debug, Clone, Copy)]
pub struct MoveIntent {
    pub entity: Entity,
    pub direction: Vec3,
}

/// A request to start casting the skill in a bar slot.
#[derive(Debug, Clone, Copy)]
pub struct CastIntent {
    pub caster: Entity,
    pub slot: usize,
    pub target: CastTarget,
}

/// Intent queue, drained once per tick in submission order.
#[derive(Resource, Default)]
pub struct PendingIntents {
    pub moves: Vec<MoveIntent>,
    pub casts: Vec<CastIntent>,
}

impl PendingIntents {
    pub fn submit_move(&mut self, entity: Entity, direction: Vec3) {
        self.moves.push(MoveIntent { entity, direction });
    }

    pub fn submit_cast(&mut self, caster: Entity, slot: usize, target: CastTarget) {
        self.casts.push(CastIntent { caster, slot, target });
    }
}

/// Drain and apply all queued intents for this tick.
///
/// Movement is refused while activating, while knocked down, and during a
/// non-moving aftercast. Cast starts run the full gate check; rejections
/// leave all state untouched.
#[allow(clippy::type_complexity)]
pub fn apply_intents(
    clock: Res<SimClock>,
    book: Res<SkillBook>,
    mut intents: ResMut<PendingIntents>,
    mut query: Query<(
        &mut Combatant,
        &mut CastState,
        &mut CooldownTable,
        &SkillBar,
        &ActiveEffects,
        &mut Transform,
    )>,
    mut started_events: EventWriter<CastStartedEvent>,
    mut combat_log: ResMut<CombatLog>,
) {
    let dt = clock.dt;

    let moves = std::mem::take(&mut intents.moves);
    for intent in moves {
        let Ok((combatant, state, _cds, _bar, fx, mut transform)) = query.get_mut(intent.entity)
        else {
            continue;
        };
        if combatant.dead || fx.flag(ModifierKind::Knockdown) {
            continue;
        }
        match &*state {
            CastState::Activating { .. } => continue,
            CastState::Aftercast { move_allowed, .. } if !*move_allowed => continue,
            _ => {}
        }

        let speed = combatant.move_speed * fx.aggregate(ModifierKind::MoveSpeedMult);
        let step = intent.direction.normalize_or_zero() * speed * dt;
        transform.translation += step;
    }

    let casts = std::mem::take(&mut intents.casts);
    for intent in casts {
        // Snapshot target facts before mutably borrowing the caster.
        let target_info: Option<(Combatant, Vec3)> = match intent.target {
            CastTarget::Unit(e) => query
                .get(e)
                .ok()
                .map(|(c, _s, _cd, _b, _fx, t)| (c.clone(), t.translation)),
            _ => None,
        };

        let Ok((mut caster, mut state, mut cooldowns, bar, fx, transform)) =
            query.get_mut(intent.caster)
        else {
            continue;
        };

        let skill = bar.skill_in_slot(intent.slot);
        let spec = skill.and_then(|id| book.get(&id));
        let caster_pos = transform.translation;

        match can_start_cast(
            &caster,
            &state,
            bar,
            &cooldowns,
            fx,
            spec,
            intent.slot,
            &intent.target,
            caster_pos,
            target_info.as_ref().map(|(c, p)| (c, *p)),
        ) {
            Ok(cost) => {
                let (Some(skill), Some(spec)) = (skill, spec) else {
                    continue;
                };
                start_cast(
                    &mut caster,
                    &mut state,
                    &mut cooldowns,
                    fx,
                    spec,
                    skill,
                    intent.slot,
                    intent.target,
                    cost,
                );
                combat_log.log(
                    CombatLogEventType::SkillUsed,
                    format!("{} begins {}", caster.id, spec.name),
                );
                started_events.send(CastStartedEvent {
                    caster: intent.caster,
                    skill_name: spec.name.clone(),
                });
            }
            Err(rejection) => {
                debug!(
                    "{} cast intent for slot {} rejected: {:?}",
                    caster.id, intent.slot, rejection
                );
            }
        }
    }
}
