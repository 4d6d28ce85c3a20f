//! Determinism tests
//!
//! Two matches from the same seed and the same setup must produce
//! bit-identical state, tick for tick. The scripted intent driver is
//! RNG-free; every random roll (block, evade) draws from the seeded
//! simulation RNG, so the full match is a pure function of the seed.

use bevy::prelude::*;
use snowsim::combat::log::CombatLog;
use snowsim::combat::CombatPlugin;
use snowsim::headless::ai::scripted_intents;
use snowsim::sim::components::{ControlledCombatant, Roster, SimRng};
use snowsim::sim::{combatant_bundle, snapshot_entities, SimulationPlugin, TickDriver};
use snowsim::skills::SkillBook;
use snowsim::ClassKind;

// =============================================================================
// Helpers
// =============================================================================

fn build_match(seed: u64) -> App {
    let mut app = App::new();
    app.add_plugins(CombatPlugin);
    app.add_plugins(SimulationPlugin {
        driver: TickDriver::Lockstep,
    });
    app.insert_resource(SkillBook::default());
    app.insert_resource(SimRng::from_seed(seed));
    app.add_systems(PreUpdate, scripted_intents);

    let team1 = [ClassKind::Slinger, ClassKind::Medic];
    let team2 = [ClassKind::Bulwark, ClassKind::Slinger];
    for (i, &class) in team1.iter().enumerate() {
        let pos = Vec3::new(-20.0, 0.0, i as f32 * 3.0);
        let entity = app.world_mut().spawn(combatant_bundle(1, class, pos)).id();
        if i == 0 {
            app.world_mut().entity_mut(entity).insert(ControlledCombatant);
        }
        app.world_mut().resource_mut::<Roster>().register(entity);
    }
    for (i, &class) in team2.iter().enumerate() {
        let pos = Vec3::new(20.0, 0.0, i as f32 * 3.0);
        let entity = app.world_mut().spawn(combatant_bundle(2, class, pos)).id();
        app.world_mut().resource_mut::<Roster>().register(entity);
    }
    app
}

/// Exact per-combatant fingerprint. Floats compared by bit pattern, not
/// tolerance: determinism means identical, not close.
fn fingerprint(app: &mut App) -> Vec<(String, u32, u32, [u32; 3], bool, Vec<String>)> {
    snapshot_entities(app.world_mut())
        .into_iter()
        .map(|s| {
            (
                s.id,
                s.warmth.to_bits(),
                s.energy.to_bits(),
                [s.pos.x.to_bits(), s.pos.y.to_bits(), s.pos.z.to_bits()],
                s.dead,
                s.effect_names,
            )
        })
        .collect()
}

// =============================================================================
// Seed reproducibility
// =============================================================================

#[test]
fn same_seed_produces_bit_identical_state() {
    let mut a = build_match(42);
    let mut b = build_match(42);

    // 30 simulated seconds, compared at several checkpoints so a transient
    // divergence cannot cancel out by the end.
    for checkpoint in 0..6 {
        for _ in 0..100 {
            a.update();
            b.update();
        }
        assert_eq!(
            fingerprint(&mut a),
            fingerprint(&mut b),
            "state diverged by checkpoint {}",
            checkpoint
        );
    }
}

#[test]
fn same_seed_produces_identical_combat_logs() {
    let mut a = build_match(7);
    let mut b = build_match(7);

    for _ in 0..400 {
        a.update();
        b.update();
    }

    let log_a = a.world().resource::<CombatLog>();
    let log_b = b.world().resource::<CombatLog>();
    assert_eq!(log_a.entries.len(), log_b.entries.len());
    for (ea, eb) in log_a.entries.iter().zip(log_b.entries.iter()) {
        assert_eq!(ea.timestamp.to_bits(), eb.timestamp.to_bits());
        assert_eq!(ea.message, eb.message);
    }
}

#[test]
fn simulation_progresses_under_scripted_driver() {
    let mut app = build_match(3);
    for _ in 0..400 {
        app.update();
    }

    // Sanity: combat actually happened, this is not two teams idling.
    let log = app.world().resource::<CombatLog>();
    assert!(
        !log.entries.is_empty(),
        "scripted driver should produce combat activity"
    );
    let snapshots = snapshot_entities(app.world_mut());
    assert!(
        snapshots
            .iter()
            .any(|s| s.warmth < s.max_warmth || s.dead || !s.effect_names.is_empty()),
        "someone should have taken damage or gained an effect"
    );
}
