//! Combat telemetry
//!
//! Events emitted by the simulation and the combat log resource that
//! records them. The simulation writes the log directly while also firing
//! events for external readers.

use bevy::prelude::*;

pub mod events;
pub mod log;

use events::*;

/// Plugin registering combat events and the combat log.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DamageEvent>()
            .add_event::<HealingEvent>()
            .add_event::<CastStartedEvent>()
            .add_event::<CastResolvedEvent>()
            .add_event::<EffectAppliedEvent>()
            .add_event::<EffectRemovedEvent>()
            .add_event::<DeathEvent>()
            .init_resource::<log::CombatLog>();
    }
}
