//! Core simulation components and resources
//!
//! Combatant state lives here: resource pools, class archetypes, skill bars,
//! cooldowns, cast state, and the deterministic roster/RNG resources.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smallvec::SmallVec;
use std::collections::HashMap;

use crate::skills::SkillId;

/// Number of slots in a skill bar.
pub const SKILL_BAR_SLOTS: usize = 8;

/// Identifier used for combatants in the combat log.
/// Format: "Team {team} {class}" e.g., "Team 1 Slinger"
pub type CombatantId = String;

/// Generate a consistent combatant ID for the combat log.
pub fn combatant_id(team: u8, class: ClassKind) -> CombatantId {
    format!("Team {} {}", team, class.name())
}

/// Class archetypes with distinct stat blocks and regen rates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ClassKind {
    /// Ranged damage dealer: fast throws, low warmth.
    Slinger,
    /// Frontline: high warmth, blocks, armor cozies.
    Bulwark,
    /// Support: heals and cozy upkeep.
    Medic,
}

impl ClassKind {
    pub fn name(&self) -> &'static str {
        match self {
            ClassKind::Slinger => "Slinger",
            ClassKind::Bulwark => "Bulwark",
            ClassKind::Medic => "Medic",
        }
    }

    pub fn max_warmth(&self) -> f32 {
        match self {
            ClassKind::Slinger => 100.0,
            ClassKind::Bulwark => 140.0,
            ClassKind::Medic => 110.0,
        }
    }

    pub fn max_energy(&self) -> f32 {
        match self {
            ClassKind::Slinger => 100.0,
            ClassKind::Bulwark => 80.0,
            ClassKind::Medic => 120.0,
        }
    }

    /// Passive warmth recovery per second.
    pub fn warmth_regen(&self) -> f32 {
        match self {
            ClassKind::Slinger => 0.5,
            ClassKind::Bulwark => 1.0,
            ClassKind::Medic => 0.5,
        }
    }

    /// Passive energy recovery per second.
    pub fn energy_regen(&self) -> f32 {
        match self {
            ClassKind::Slinger => 5.0,
            ClassKind::Bulwark => 4.0,
            ClassKind::Medic => 6.0,
        }
    }

    pub fn move_speed(&self) -> f32 {
        match self {
            ClassKind::Slinger => 6.0,
            ClassKind::Bulwark => 4.5,
            ClassKind::Medic => 5.0,
        }
    }

    /// Default skill bar for this class. Unused slots stay empty.
    pub fn default_skill_bar(&self) -> SkillBar {
        let skills: &[SkillId] = match self {
            ClassKind::Slinger => &[
                SkillId::SnowballToss,
                SkillId::PackedIceball,
                SkillId::FlurryVolley,
                SkillId::QuickHands,
            ],
            ClassKind::Bulwark => &[
                SkillId::SnowballToss,
                SkillId::SnowFort,
                SkillId::ThickMittens,
                SkillId::MirrorGlaze,
            ],
            ClassKind::Medic => &[
                SkillId::SnowballToss,
                SkillId::WarmCocoa,
                SkillId::EmberBrew,
                SkillId::BrainFreeze,
            ],
        };
        let mut bar = SkillBar::default();
        for (slot, &skill) in skills.iter().enumerate() {
            bar.slots[slot] = Some(skill);
        }
        bar
    }
}

/// A combatant in the simulation.
///
/// Warmth is the health pool; at 0 the combatant is knocked out of the match.
/// Energy fuels skill casts. Both are clamped to `[0, max]` at every
/// mutation; the only mutation paths are the `sim::resources` entry points
/// and the regen system.
#[derive(Component, Debug, Clone)]
pub struct Combatant {
    pub id: CombatantId,
    pub team: u8,
    pub class: ClassKind,
    pub max_warmth: f32,
    pub warmth: f32,
    pub max_energy: f32,
    pub energy: f32,
    pub warmth_regen: f32,
    pub energy_regen: f32,
    pub move_speed: f32,
    /// Dead combatants stay in the world for end-of-match reporting.
    pub dead: bool,
    // Match statistics
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub healing_done: f32,
    pub overheal_done: f32,
    /// Whether the most recently executed skill used the windup mechanic.
    pub last_skill_was_windup: Option<bool>,
}

impl Combatant {
    pub fn new(team: u8, class: ClassKind) -> Self {
        Self {
            id: combatant_id(team, class),
            team,
            class,
            max_warmth: class.max_warmth(),
            warmth: class.max_warmth(),
            max_energy: class.max_energy(),
            energy: class.max_energy(),
            warmth_regen: class.warmth_regen(),
            energy_regen: class.energy_regen(),
            move_speed: class.move_speed(),
            dead: false,
            damage_dealt: 0.0,
            damage_taken: 0.0,
            healing_done: 0.0,
            overheal_done: 0.0,
            last_skill_was_windup: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn warmth_pct(&self) -> f32 {
        if self.max_warmth > 0.0 {
            self.warmth / self.max_warmth
        } else {
            0.0
        }
    }

    pub fn energy_pct(&self) -> f32 {
        if self.max_energy > 0.0 {
            self.energy / self.max_energy
        } else {
            0.0
        }
    }
}

/// Fixed-capacity skill bar. Slots hold `Option<SkillId>`; empty slots are
/// simply `None`, there is no sentinel skill.
#[derive(Component, Debug, Clone)]
pub struct SkillBar {
    pub slots: SmallVec<[Option<SkillId>; SKILL_BAR_SLOTS]>,
}

impl Default for SkillBar {
    fn default() -> Self {
        Self {
            slots: smallvec::smallvec![None; SKILL_BAR_SLOTS],
        }
    }
}

impl SkillBar {
    pub fn skill_in_slot(&self, slot: usize) -> Option<SkillId> {
        self.slots.get(slot).copied().flatten()
    }
}

/// Per-slot remaining recharge time in seconds. Monotonically decreasing
/// between arms, floored at zero. Absent entries mean ready.
#[derive(Component, Debug, Clone, Default)]
pub struct CooldownTable {
    pub remaining: HashMap<usize, f32>,
}

impl CooldownTable {
    pub fn is_ready(&self, slot: usize) -> bool {
        self.remaining.get(&slot).copied().unwrap_or(0.0) <= 0.0
    }

    pub fn arm(&mut self, slot: usize, duration: f32) {
        self.remaining.insert(slot, duration.max(0.0));
    }

    pub fn tick(&mut self, dt: f32) {
        for value in self.remaining.values_mut() {
            *value = (*value - dt).max(0.0);
        }
        self.remaining.retain(|_, v| *v > 0.0);
    }
}

/// What a cast is aimed at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CastTarget {
    SelfCast,
    Unit(Entity),
    Ground(Vec3),
}

/// The cast state machine. Idle → Activating → (Aftercast | Idle).
///
/// `executed` guards the single execution of the skill payload; windup
/// skills flip it at the halfway threshold, everything else at completion.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub enum CastState {
    #[default]
    Idle,
    Activating {
        slot: usize,
        skill: SkillId,
        remaining: f32,
        total: f32,
        executed: bool,
        target: CastTarget,
    },
    Aftercast {
        remaining: f32,
        move_allowed: bool,
    },
}

impl CastState {
    pub fn is_idle(&self) -> bool {
        matches!(self, CastState::Idle)
    }

    pub fn is_activating(&self) -> bool {
        matches!(self, CastState::Activating { .. })
    }
}

/// Position at the start of the current tick, for interpolation and
/// movement-detection by external readers.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PrevPosition(pub Vec3);

/// Marks the entity whose death ends the match in defeat.
#[derive(Component, Debug, Clone, Copy)]
pub struct ControlledCombatant;

/// Seeded random number generator for deterministic simulation.
///
/// All combat randomness (block, evade) flows through this resource; nothing
/// in the simulation touches thread-local RNG.
#[derive(Resource)]
pub struct SimRng {
    rng: StdRng,
    pub seed: Option<u64>,
}

impl SimRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Uniform float in [0, 1).
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..max)
    }
}

/// Combatants in spawn order. Every per-tick system iterates this list
/// instead of raw query order, which bevy does not guarantee stable.
#[derive(Resource, Debug, Default)]
pub struct Roster {
    pub entities: Vec<Entity>,
}

impl Roster {
    pub fn register(&mut self, entity: Entity) {
        self.entities.push(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combatant_id_format() {
        assert_eq!(combatant_id(1, ClassKind::Slinger), "Team 1 Slinger");
        assert_eq!(combatant_id(2, ClassKind::Medic), "Team 2 Medic");
    }

    #[test]
    fn new_combatant_starts_full() {
        let c = Combatant::new(1, ClassKind::Bulwark);
        assert_eq!(c.warmth, c.max_warmth);
        assert_eq!(c.energy, c.max_energy);
        assert!(c.is_alive());
        assert_eq!(c.warmth_pct(), 1.0);
    }

    #[test]
    fn cooldown_table_floors_at_zero() {
        let mut cd = CooldownTable::default();
        cd.arm(0, 1.0);
        assert!(!cd.is_ready(0));
        cd.tick(0.6);
        assert!(!cd.is_ready(0));
        cd.tick(0.6);
        assert!(cd.is_ready(0));
        // Never armed slots are always ready
        assert!(cd.is_ready(5));
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let mut a = SimRng::from_seed(42);
        let mut b = SimRng::from_seed(42);
        for _ in 0..32 {
            assert_eq!(a.random_f32(), b.random_f32());
        }
    }

    #[test]
    fn default_skill_bars_fit_slots() {
        for class in [ClassKind::Slinger, ClassKind::Bulwark, ClassKind::Medic] {
            let bar = class.default_skill_bar();
            assert_eq!(bar.slots.len(), SKILL_BAR_SLOTS);
            assert!(bar.skill_in_slot(0).is_some());
        }
    }
}
