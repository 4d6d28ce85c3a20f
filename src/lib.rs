//! snowsim - Deterministic snowball-fight combat simulator
//!
//! A fixed-timestep (20 Hz) combat simulation engine for a tick-based team
//! snowball fight: warmth/energy resource pools, a composable effect and
//! condition engine, a cooldown/cast state machine, and seeded combat
//! resolution. The library exposes the simulation core; rendering, input,
//! and AI are external collaborators that read snapshots and queue intents.

pub mod cli;
pub mod combat;
pub mod headless;
pub mod sim;
pub mod skills;

// Re-export commonly used types
pub use combat::log::{CombatLog, CombatLogEventType};
pub use headless::HeadlessMatchConfig;
pub use sim::components::{CastState, CastTarget, ClassKind, Combatant};
pub use sim::outcome::MatchOutcome;
pub use sim::{SimClock, SimTick, SimulationPlugin, TickDriver, TICK_SECONDS};
pub use skills::{SkillBook, SkillId};
