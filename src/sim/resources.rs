//! Resource Model
//!
//! Warmth (health) and energy pools. All pool mutation funnels through
//! `apply_damage` / `apply_healing`, which report applied vs. attempted
//! amounts so callers can account overkill and overheal. The regen system
//! advances both pools each tick, scaled by active effect aggregates.

use bevy::prelude::*;

use super::components::{Combatant, Roster};
use super::effects::{ActiveEffects, ModifierKind};
use super::SimClock;
use crate::combat::events::{DeathEvent, EffectRemovalReason, EffectRemovedEvent};
use crate::combat::log::{CombatLog, CombatLogEventType};

/// Outcome of a damage application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageApplied {
    /// Warmth actually removed.
    pub applied: f32,
    /// Portion of the attempted amount past zero warmth.
    pub overkill: f32,
    /// Whether this application dropped warmth to zero.
    pub killing_blow: bool,
}

/// Outcome of a healing application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealApplied {
    /// Warmth actually restored.
    pub applied: f32,
    /// Portion of the attempted amount past max warmth.
    pub overheal: f32,
}

/// Remove warmth from a combatant, clamping at zero.
///
/// `amount` must be non-negative; mitigation happens in combat resolution
/// before this is called. Dead combatants take no further damage.
pub fn apply_damage(combatant: &mut Combatant, amount: f32) -> DamageApplied {
    debug_assert!(amount >= 0.0, "apply_damage takes a non-negative amount");
    if combatant.dead || amount <= 0.0 {
        return DamageApplied {
            applied: 0.0,
            overkill: 0.0,
            killing_blow: false,
        };
    }

    let applied = amount.min(combatant.warmth);
    let overkill = amount - applied;
    combatant.warmth -= applied;
    combatant.damage_taken += applied;

    let killing_blow = combatant.warmth <= 0.0;
    if killing_blow {
        combatant.warmth = 0.0;
        combatant.dead = true;
    }

    debug_assert!(overkill >= 0.0);
    DamageApplied {
        applied,
        overkill,
        killing_blow,
    }
}

/// Restore warmth to a combatant, clamping at max.
///
/// `multiplier` is the healing-received aggregate (HealingMult); the raw
/// heal is `amount * multiplier` and overheal is measured against that raw
/// value. Dead combatants cannot be healed back.
pub fn apply_healing(combatant: &mut Combatant, amount: f32, multiplier: f32) -> HealApplied {
    debug_assert!(amount >= 0.0, "apply_healing takes a non-negative amount");
    if combatant.dead || amount <= 0.0 {
        return HealApplied {
            applied: 0.0,
            overheal: 0.0,
        };
    }

    let raw = amount * multiplier;
    let applied = (combatant.warmth + raw).min(combatant.max_warmth) - combatant.warmth;
    let overheal = raw - applied;
    combatant.warmth += applied;

    debug_assert!(overheal >= 0.0);
    debug_assert!(combatant.warmth <= combatant.max_warmth);
    HealApplied { applied, overheal }
}

/// Advance warmth and energy regeneration for every living combatant.
///
/// Effective rates fold in the while-active aggregates: flat per-second
/// adds for both pools plus the energy regen multiplier. Negative
/// per-second aggregates (drains) can kill; that goes through
/// `apply_damage` so death accounting stays in one place, and a drain
/// death drains the victim's effects exactly like a combat kill.
pub fn regenerate_resources(
    clock: Res<SimClock>,
    roster: Res<Roster>,
    mut query: Query<(&mut Combatant, &mut ActiveEffects)>,
    mut death_events: EventWriter<DeathEvent>,
    mut removed_events: EventWriter<EffectRemovedEvent>,
    mut combat_log: ResMut<CombatLog>,
) {
    let dt = clock.dt;

    for &entity in roster.entities.iter() {
        let Ok((mut combatant, mut effects)) = query.get_mut(entity) else {
            continue;
        };
        if combatant.dead {
            continue;
        }

        let warmth_rate = combatant.warmth_regen + effects.aggregate(ModifierKind::WarmthPerSecond);
        let energy_rate = combatant.energy_regen * effects.aggregate(ModifierKind::EnergyRegenMult)
            + effects.aggregate(ModifierKind::EnergyPerSecond);

        let warmth_delta = warmth_rate * dt;
        if warmth_delta >= 0.0 {
            combatant.warmth = (combatant.warmth + warmth_delta).min(combatant.max_warmth);
        } else {
            let result = apply_damage(&mut combatant, -warmth_delta);
            if result.killing_blow {
                // Same cleanup as a combat kill: the corpse carries nothing.
                for effect in effects.effects.drain(..) {
                    removed_events.send(EffectRemovedEvent {
                        target: entity,
                        effect_name: effect.spec.name,
                        reason: EffectRemovalReason::TargetDied,
                    });
                }
                combat_log.log(
                    CombatLogEventType::Death,
                    format!("{} succumbs to the cold", combatant.id),
                );
                death_events.send(DeathEvent {
                    victim: entity,
                    killer: None,
                });
            }
        }

        // Pools freeze at death, including the tick the drain landed.
        if !combatant.dead {
            combatant.energy =
                (combatant.energy + energy_rate * dt).clamp(0.0, combatant.max_energy);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::components::ClassKind;

    #[test]
    fn damage_is_clamped_with_overkill() {
        let mut c = Combatant::new(1, ClassKind::Slinger);
        c.warmth = 30.0;
        let result = apply_damage(&mut c, 50.0);
        assert_eq!(result.applied, 30.0);
        assert_eq!(result.overkill, 20.0);
        assert!(result.killing_blow);
        assert_eq!(c.warmth, 0.0);
        assert!(c.dead);
    }

    #[test]
    fn dead_combatants_take_no_damage() {
        let mut c = Combatant::new(1, ClassKind::Slinger);
        c.dead = true;
        c.warmth = 0.0;
        let result = apply_damage(&mut c, 10.0);
        assert_eq!(result.applied, 0.0);
        assert!(!result.killing_blow);
    }

    #[test]
    fn heal_clamps_at_max_with_overheal() {
        let mut c = Combatant::new(1, ClassKind::Slinger);
        c.warmth = 80.0;
        let result = apply_healing(&mut c, 35.0, 1.0);
        assert_eq!(result.applied, 20.0);
        assert_eq!(result.overheal, 15.0);
        assert_eq!(c.warmth, 100.0);
    }

    #[test]
    fn heal_multiplier_inflates_raw_before_clamp() {
        let mut c = Combatant::new(1, ClassKind::Slinger);
        c.warmth = 80.0;
        let result = apply_healing(&mut c, 20.0, 1.5);
        // raw 30, applied 20, overheal 10
        assert_eq!(result.applied, 20.0);
        assert_eq!(result.overheal, 10.0);
        assert_eq!(c.warmth, 100.0);
    }

    #[test]
    fn overheal_is_never_negative() {
        let mut c = Combatant::new(1, ClassKind::Slinger);
        c.warmth = 10.0;
        let result = apply_healing(&mut c, 5.0, 1.0);
        assert_eq!(result.applied, 5.0);
        assert_eq!(result.overheal, 0.0);
    }

    #[test]
    fn dead_combatants_cannot_be_healed() {
        let mut c = Combatant::new(1, ClassKind::Slinger);
        c.dead = true;
        c.warmth = 0.0;
        let result = apply_healing(&mut c, 50.0, 1.0);
        assert_eq!(result.applied, 0.0);
        assert_eq!(c.warmth, 0.0);
        assert!(c.dead);
    }
}
