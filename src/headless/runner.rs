//! Headless match execution
//!
//! Runs matches without graphical output in lockstep mode: one simulation
//! tick per app update, decoupled from wall clock, so results depend only
//! on the configuration and seed.

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use std::time::Duration;

use crate::combat::log::{CombatLog, CombatLogEventType, CombatantMetadata, MatchMetadata};
use crate::combat::CombatPlugin;
use crate::sim::components::{ClassKind, Combatant, ControlledCombatant, Roster, SimRng};
use crate::sim::outcome::MatchOutcome;
use crate::sim::{combatant_bundle, SimClock, SimulationPlugin, TickDriver};
use crate::skills::SkillBookPlugin;

use super::ai::scripted_intents;
use super::config::HeadlessMatchConfig;

/// Result of a completed headless match
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// The winning team (1 or 2), or None for a timeout draw
    pub winner: Option<u8>,
    /// Terminal state the simulation reached
    pub outcome: MatchOutcome,
    /// Simulated match duration in seconds
    pub match_time: f32,
    /// Ticks executed
    pub ticks: u64,
    pub team1_combatants: Vec<CombatantResult>,
    pub team2_combatants: Vec<CombatantResult>,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
}

/// Statistics for a single combatant after the match
#[derive(Debug, Clone)]
pub struct CombatantResult {
    pub class_name: String,
    pub max_warmth: f32,
    pub final_warmth: f32,
    pub max_energy: f32,
    pub final_energy: f32,
    pub survived: bool,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub healing_done: f32,
    pub overheal_done: f32,
}

/// Resource tracking headless match state
#[derive(Resource)]
pub struct HeadlessMatchState {
    pub team1: Vec<ClassKind>,
    pub team2: Vec<ClassKind>,
    pub max_duration: f32,
    pub output_path: Option<String>,
    pub match_complete: bool,
    pub random_seed: Option<u64>,
    pub result: Option<MatchResult>,
}

/// Plugin for headless match execution
pub struct HeadlessPlugin {
    pub config: HeadlessMatchConfig,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        let (team1, team2) = self
            .config
            .rosters()
            .expect("Invalid match configuration");

        app.insert_resource(HeadlessMatchState {
            team1,
            team2,
            max_duration: self.config.max_duration_secs,
            output_path: self.config.output_path.clone(),
            match_complete: false,
            random_seed: self.config.random_seed,
            result: None,
        });

        app.add_plugins(CombatPlugin)
            .add_plugins(SimulationPlugin {
                driver: TickDriver::Lockstep,
            });

        app.add_systems(Startup, headless_setup_match)
            // Intents queue before the tick runs in Update.
            .add_systems(PreUpdate, scripted_intents)
            .add_systems(PostUpdate, headless_check_match_end)
            .add_systems(Last, headless_exit_on_complete);
    }
}

/// Spawn both rosters and seed the RNG.
fn headless_setup_match(
    mut commands: Commands,
    headless_state: Res<HeadlessMatchState>,
    mut combat_log: ResMut<CombatLog>,
    mut roster: ResMut<Roster>,
) {
    combat_log.clear();
    combat_log.log(
        CombatLogEventType::MatchEvent,
        "Match started (headless mode)!".to_string(),
    );

    let sim_rng = match headless_state.random_seed {
        Some(seed) => {
            info!("Using deterministic RNG with seed: {}", seed);
            SimRng::from_seed(seed)
        }
        None => {
            info!("Using non-deterministic RNG (no seed provided)");
            SimRng::from_entropy()
        }
    };
    commands.insert_resource(sim_rng);

    let team1_spawn_x = -20.0;
    for (i, &class) in headless_state.team1.iter().enumerate() {
        combat_log.register_combatant(crate::sim::components::combatant_id(1, class));
        let pos = Vec3::new(team1_spawn_x, 0.0, (i as f32 - 1.0) * 3.0);
        let mut entity = commands.spawn(combatant_bundle(1, class, pos));
        // The first member of team 1 is the controlled combatant.
        if i == 0 {
            entity.insert(ControlledCombatant);
        }
        roster.register(entity.id());
    }

    let team2_spawn_x = 20.0;
    for (i, &class) in headless_state.team2.iter().enumerate() {
        combat_log.register_combatant(crate::sim::components::combatant_id(2, class));
        let pos = Vec3::new(team2_spawn_x, 0.0, (i as f32 - 1.0) * 3.0);
        let entity = commands.spawn(combatant_bundle(2, class, pos));
        roster.register(entity.id());
    }

    info!(
        "Headless match setup complete: Team 1 ({} members) vs Team 2 ({} members)",
        headless_state.team1.len(),
        headless_state.team2.len()
    );
}

/// Check whether the match ended (terminal outcome or timeout) and build
/// the result exactly once.
fn headless_check_match_end(
    clock: Res<SimClock>,
    outcome: Res<MatchOutcome>,
    roster: Res<Roster>,
    combatants: Query<&Combatant>,
    combat_log: Res<CombatLog>,
    mut headless_state: ResMut<HeadlessMatchState>,
) {
    if headless_state.match_complete {
        return;
    }

    let timed_out = clock.elapsed() >= headless_state.max_duration;
    let winner = match *outcome {
        MatchOutcome::Victory => Some(1),
        MatchOutcome::Defeat => Some(2),
        MatchOutcome::Active => {
            if !timed_out {
                return;
            }
            info!("Match timed out after {:.1}s - declaring DRAW", clock.elapsed());
            None
        }
    };

    if winner.is_some() {
        info!("Match ended after {:.1}s! Team {} wins!", clock.elapsed(), winner.unwrap_or(0));
    }

    let result = build_match_result(&clock, *outcome, winner, &roster, &combatants, &headless_state);
    save_match_log(&combat_log, &result, &headless_state);
    headless_state.result = Some(result);
    headless_state.match_complete = true;
}

fn build_match_result(
    clock: &SimClock,
    outcome: MatchOutcome,
    winner: Option<u8>,
    roster: &Roster,
    combatants: &Query<&Combatant>,
    headless_state: &HeadlessMatchState,
) -> MatchResult {
    let mut team1_combatants = Vec::new();
    let mut team2_combatants = Vec::new();

    for &entity in roster.entities.iter() {
        let Ok(combatant) = combatants.get(entity) else {
            continue;
        };
        let result = CombatantResult {
            class_name: combatant.class.name().to_string(),
            max_warmth: combatant.max_warmth,
            final_warmth: combatant.warmth,
            max_energy: combatant.max_energy,
            final_energy: combatant.energy,
            survived: combatant.is_alive(),
            damage_dealt: combatant.damage_dealt,
            damage_taken: combatant.damage_taken,
            healing_done: combatant.healing_done,
            overheal_done: combatant.overheal_done,
        };
        if combatant.team == 1 {
            team1_combatants.push(result);
        } else {
            team2_combatants.push(result);
        }
    }

    MatchResult {
        winner,
        outcome,
        match_time: clock.elapsed(),
        ticks: clock.tick,
        team1_combatants,
        team2_combatants,
        random_seed: headless_state.random_seed,
    }
}

/// Export the combat log with end-of-match metadata.
fn save_match_log(combat_log: &CombatLog, result: &MatchResult, state: &HeadlessMatchState) {
    let to_metadata = |r: &CombatantResult| CombatantMetadata {
        class_name: r.class_name.clone(),
        max_warmth: r.max_warmth,
        final_warmth: r.final_warmth,
        max_energy: r.max_energy,
        final_energy: r.final_energy,
        damage_dealt: r.damage_dealt,
        damage_taken: r.damage_taken,
        healing_done: r.healing_done,
        overheal_done: r.overheal_done,
        survived: r.survived,
    };

    let metadata = MatchMetadata {
        winner: result.winner,
        duration: result.match_time,
        seed: result.random_seed,
        team1: result.team1_combatants.iter().map(to_metadata).collect(),
        team2: result.team2_combatants.iter().map(to_metadata).collect(),
    };

    match combat_log.save_to_file(&metadata, state.output_path.as_deref()) {
        Ok(filename) => {
            println!("Match complete. Log saved to: {}", filename);
        }
        Err(e) => {
            eprintln!("Failed to save combat log: {}", e);
        }
    }
}

/// Exit the app when the match is complete
fn headless_exit_on_complete(
    headless_state: Res<HeadlessMatchState>,
    mut exit: EventWriter<AppExit>,
) {
    if headless_state.match_complete {
        exit.send(AppExit::Success);
    }
}

/// Run a headless match with the given configuration
pub fn run_headless_match(config: HeadlessMatchConfig) -> Result<(), String> {
    config.validate()?;

    println!("Starting headless match simulation...");
    println!("  Team 1: {:?}", config.team1);
    println!("  Team 2: {:?}", config.team2);
    println!("  Max duration: {:.0}s", config.max_duration_secs);

    App::new()
        // Minimal plugins - no window, no rendering. Duration::ZERO runs
        // updates back to back; lockstep makes wall time irrelevant.
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)))
        .add_plugins(TransformPlugin)
        .add_plugins(SkillBookPlugin)
        .add_plugins(HeadlessPlugin { config })
        .run();

    Ok(())
}
