//! Deterministic fixed-timestep simulation core
//!
//! The simulation advances in fixed 50 ms ticks (20 Hz) run through the
//! dedicated [`SimTick`] schedule. Phases are strictly chained; entity
//! processing follows stable roster order; all mutation happens inside the
//! schedule. External collaborators read snapshots between ticks and submit
//! intents through [`intents::PendingIntents`].
//!
//! Two drivers exist: the realtime driver accumulates presentation-frame
//! time and runs zero or more ticks per frame, while the lockstep driver
//! runs exactly one tick per app update for headless and test use.

use bevy::ecs::schedule::ScheduleLabel;
use bevy::prelude::*;

pub mod casting;
pub mod components;
pub mod effects;
pub mod intents;
pub mod outcome;
pub mod resolution;
pub mod resources;

use components::{
    CastState, ClassKind, Combatant, CombatantId, CooldownTable, PrevPosition, Roster,
};
use effects::ActiveEffects;
use crate::combat::log::CombatLog;

/// Fixed simulation quantum in seconds (20 Hz).
pub const TICK_SECONDS: f32 = 0.05;

/// Schedule label for one simulation tick.
#[derive(ScheduleLabel, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SimTick;

/// Phases of one tick, chained in this order.
#[derive(SystemSet, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TickPhase {
    /// Previous-position capture and clock advance.
    Snapshot,
    /// Warmth/energy regeneration.
    Regen,
    /// Cooldown countdown.
    Cooldowns,
    /// Active-effect countdown and expiry.
    Effects,
    /// Queued movement and cast-start intents.
    Intents,
    /// Cast advancement and payload resolution.
    Casts,
    /// Terminal-condition evaluation.
    Outcome,
}

/// Simulation clock: completed tick count and the fixed step size.
#[derive(Resource, Debug, Clone, Copy)]
pub struct SimClock {
    pub tick: u64,
    pub dt: f32,
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            tick: 0,
            dt: TICK_SECONDS,
        }
    }
}

impl SimClock {
    /// Seconds of simulated time elapsed.
    pub fn elapsed(&self) -> f32 {
        self.tick as f32 * self.dt
    }
}

/// Unspent presentation time carried between frames by the realtime driver.
#[derive(Resource, Debug, Default)]
pub struct TickAccumulator {
    pub accumulated: f32,
}

/// How ticks are triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickDriver {
    /// Accumulate wall-clock frame time; run zero or more ticks per frame.
    #[default]
    Realtime,
    /// Exactly one tick per app update. Headless and test use.
    Lockstep,
}

/// Plugin wiring the tick schedule, its phases, and the chosen driver.
pub struct SimulationPlugin {
    pub driver: TickDriver,
}

impl Default for SimulationPlugin {
    fn default() -> Self {
        Self {
            driver: TickDriver::Realtime,
        }
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimClock>()
            .init_resource::<TickAccumulator>()
            .init_resource::<Roster>()
            .init_resource::<intents::PendingIntents>()
            .init_resource::<outcome::MatchOutcome>();

        app.add_schedule(Schedule::new(SimTick));
        app.configure_sets(
            SimTick,
            (
                TickPhase::Snapshot,
                TickPhase::Regen,
                TickPhase::Cooldowns,
                TickPhase::Effects,
                TickPhase::Intents,
                TickPhase::Casts,
                TickPhase::Outcome,
            )
                .chain(),
        );
        app.add_systems(
            SimTick,
            (
                (advance_clock, snapshot_positions).in_set(TickPhase::Snapshot),
                resources::regenerate_resources.in_set(TickPhase::Regen),
                casting::tick_cooldowns.in_set(TickPhase::Cooldowns),
                effects::tick_effects.in_set(TickPhase::Effects),
                intents::apply_intents.in_set(TickPhase::Intents),
                resolution::advance_casts.in_set(TickPhase::Casts),
                outcome::evaluate_outcome.in_set(TickPhase::Outcome),
            ),
        );

        match self.driver {
            TickDriver::Realtime => {
                app.add_systems(Update, drive_simulation);
            }
            TickDriver::Lockstep => {
                app.add_systems(Update, lockstep_tick);
            }
        }
    }
}

/// Realtime driver: fold frame time into the accumulator and run whole
/// ticks while it holds at least one quantum. Fractional remainders carry
/// over, so tick cadence is independent of frame cadence.
pub fn drive_simulation(world: &mut World) {
    let delta = world.resource::<Time>().delta_secs();
    world.resource_mut::<TickAccumulator>().accumulated += delta;

    loop {
        {
            let mut acc = world.resource_mut::<TickAccumulator>();
            if acc.accumulated < TICK_SECONDS {
                break;
            }
            acc.accumulated -= TICK_SECONDS;
        }
        world.run_schedule(SimTick);
    }
}

/// Lockstep driver: one tick per app update, wall clock ignored.
pub fn lockstep_tick(world: &mut World) {
    world.run_schedule(SimTick);
}

/// Run the tick schedule `n` times directly. Test helper.
pub fn run_ticks(app: &mut App, n: u32) {
    for _ in 0..n {
        app.world_mut().run_schedule(SimTick);
    }
}

/// Advance the tick counter and the combat log's match time.
fn advance_clock(mut clock: ResMut<SimClock>, mut combat_log: ResMut<CombatLog>) {
    clock.tick += 1;
    combat_log.match_time += clock.dt;
}

/// Capture each entity's position at the start of the tick so readers can
/// interpolate between previous and current.
fn snapshot_positions(mut query: Query<(&Transform, &mut PrevPosition)>) {
    for (transform, mut prev) in query.iter_mut() {
        prev.0 = transform.translation;
    }
}

/// Everything needed to spawn one combatant. Register the returned entity
/// in the [`Roster`] to include it in tick processing.
pub fn combatant_bundle(team: u8, class: ClassKind, pos: Vec3) -> impl Bundle {
    (
        Combatant::new(team, class),
        class.default_skill_bar(),
        CooldownTable::default(),
        CastState::default(),
        ActiveEffects::default(),
        Transform::from_translation(pos),
        PrevPosition(pos),
    )
}

/// Read-only view of one combatant between ticks.
#[derive(Debug, Clone)]
pub struct EntitySnapshot {
    pub entity: Entity,
    pub id: CombatantId,
    pub team: u8,
    pub class: ClassKind,
    pub warmth: f32,
    pub max_warmth: f32,
    pub energy: f32,
    pub max_energy: f32,
    pub pos: Vec3,
    pub prev_pos: Vec3,
    pub dead: bool,
    pub casting: bool,
    pub effect_names: Vec<String>,
}

/// Snapshot every rostered combatant in roster order.
pub fn snapshot_entities(world: &mut World) -> Vec<EntitySnapshot> {
    let roster = world.resource::<Roster>().entities.clone();
    let mut query = world.query::<(
        &Combatant,
        &CastState,
        &ActiveEffects,
        &Transform,
        &PrevPosition,
    )>();

    roster
        .iter()
        .filter_map(|&entity| {
            query
                .get(world, entity)
                .ok()
                .map(|(c, state, fx, transform, prev)| EntitySnapshot {
                    entity,
                    id: c.id.clone(),
                    team: c.team,
                    class: c.class,
                    warmth: c.warmth,
                    max_warmth: c.max_warmth,
                    energy: c.energy,
                    max_energy: c.max_energy,
                    pos: transform.translation,
                    prev_pos: prev.0,
                    dead: c.dead,
                    casting: state.is_activating(),
                    effect_names: fx.effects.iter().map(|e| e.spec.name.clone()).collect(),
                })
        })
        .collect()
}
