//! Terminal-condition evaluation
//!
//! Last phase of the tick: decide whether the match is still live. Victory
//! (all enemies of the controlled combatant down) is checked before defeat,
//! so a mutual final blow counts as a win.

use bevy::prelude::*;

use super::components::{Combatant, ControlledCombatant, Roster};
use crate::combat::log::{CombatLog, CombatLogEventType};

/// Match status, evaluated once per tick after combat resolution.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchOutcome {
    #[default]
    Active,
    Victory,
    Defeat,
}

/// Evaluate the terminal condition. Once the outcome leaves `Active` it
/// never changes; later ticks are no-ops.
pub fn evaluate_outcome(
    roster: Res<Roster>,
    mut outcome: ResMut<MatchOutcome>,
    query: Query<(&Combatant, Option<&ControlledCombatant>)>,
    mut combat_log: ResMut<CombatLog>,
) {
    if *outcome != MatchOutcome::Active {
        return;
    }

    let mut controlled: Option<(u8, bool)> = None;
    let mut enemy_alive = false;

    for &entity in roster.entities.iter() {
        let Ok((combatant, control)) = query.get(entity) else {
            continue;
        };
        if control.is_some() {
            controlled = Some((combatant.team, combatant.is_alive()));
        }
    }
    let Some((controlled_team, controlled_alive)) = controlled else {
        return;
    };

    for &entity in roster.entities.iter() {
        if let Ok((combatant, _)) = query.get(entity) {
            if combatant.team != controlled_team && combatant.is_alive() {
                enemy_alive = true;
            }
        }
    }

    if !enemy_alive {
        *outcome = MatchOutcome::Victory;
        combat_log.log(
            CombatLogEventType::MatchEvent,
            "All enemies are down. Victory!".to_string(),
        );
    } else if !controlled_alive {
        *outcome = MatchOutcome::Defeat;
        combat_log.log(
            CombatLogEventType::MatchEvent,
            "The controlled combatant is down. Defeat.".to_string(),
        );
    }
}
