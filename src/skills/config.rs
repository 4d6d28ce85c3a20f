//! Data-driven skill configuration
//!
//! Skill numbers are defined in `assets/config/skills.ron` rather than
//! hardcoded, so balance passes don't require recompilation. The full table
//! is validated at startup and exposed as the `SkillBook` resource.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{SkillId, TargetKind};
use crate::sim::effects::{EffectSpec, TargetShape};

/// Complete skill configuration loaded from RON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkillSpec {
    /// Display name of the skill.
    pub name: String,

    // === Casting ===
    /// Activation time in seconds (0.0 = instant).
    #[serde(default)]
    pub activation: f32,
    /// Aftercast recovery in seconds.
    #[serde(default)]
    pub aftercast: f32,
    /// Recharge in seconds, armed at cast start.
    #[serde(default)]
    pub recharge: f32,
    /// Energy cost, debited in full at cast start.
    #[serde(default)]
    pub energy_cost: f32,
    /// Maximum range in units (ignored for SelfOnly).
    #[serde(default)]
    pub range: f32,

    // === Targeting ===
    pub target_kind: TargetKind,
    /// Where damage/healing lands relative to the resolved cast.
    pub shape: TargetShape,

    // === Payload ===
    /// Base damage per affected target (0.0 = none).
    #[serde(default)]
    pub base_damage: f32,
    /// Base healing per affected target (0.0 = none).
    #[serde(default)]
    pub base_healing: f32,
    /// Effects carried by this skill; each resolves its own timing,
    /// shape, and condition independently.
    #[serde(default)]
    pub effects: Vec<EffectSpec>,

    // === Behavior flags ===
    /// Windup mechanic: payload executes at half activation instead of
    /// at completion.
    #[serde(default)]
    pub windup: bool,
    /// Whether the caster may move during aftercast.
    #[serde(default)]
    pub aftercast_move: bool,
}

impl SkillSpec {
    pub fn is_damage(&self) -> bool {
        self.base_damage > 0.0
    }

    pub fn is_heal(&self) -> bool {
        self.base_healing > 0.0
    }
}

/// Root structure for the skills.ron file.
#[derive(Debug, Serialize, Deserialize)]
pub struct SkillsConfig {
    pub skills: HashMap<SkillId, SkillSpec>,
}

/// Resource containing all skill definitions.
///
/// Loaded from `assets/config/skills.ron` at startup. Access via
/// `Res<SkillBook>` in systems.
#[derive(Resource)]
pub struct SkillBook {
    specs: HashMap<SkillId, SkillSpec>,
}

impl Default for SkillBook {
    /// Load the skill book from the default config file.
    /// Panics if the file cannot be loaded - use for tests only.
    fn default() -> Self {
        load_skill_book().expect("Failed to load skill book in Default impl")
    }
}

impl SkillBook {
    pub fn new(config: SkillsConfig) -> Self {
        Self {
            specs: config.skills,
        }
    }

    pub fn get(&self, skill: &SkillId) -> Option<&SkillSpec> {
        self.specs.get(skill)
    }

    /// Get the spec for a skill, panicking if not found.
    /// Use this when the skill must exist (validated at startup).
    pub fn get_unchecked(&self, skill: &SkillId) -> &SkillSpec {
        self.specs
            .get(skill)
            .unwrap_or_else(|| panic!("Skill {:?} not found in skill book", skill))
    }

    /// Check that every skill id is defined and sane.
    pub fn validate(&self) -> Result<(), String> {
        let missing: Vec<SkillId> = SkillId::ALL
            .into_iter()
            .filter(|id| !self.specs.contains_key(id))
            .collect();
        if !missing.is_empty() {
            return Err(format!("Missing skill definitions: {:?}", missing));
        }

        for (id, spec) in self.specs.iter() {
            if spec.activation < 0.0 || spec.aftercast < 0.0 || spec.recharge < 0.0 {
                return Err(format!("{:?}: negative timing values", id));
            }
            if spec.energy_cost < 0.0 {
                return Err(format!("{:?}: negative energy cost", id));
            }
            if spec.target_kind != TargetKind::SelfOnly && spec.range <= 0.0 {
                return Err(format!("{:?}: targeted skill needs a positive range", id));
            }
            for effect in spec.effects.iter() {
                if effect.duration < 0.0 {
                    return Err(format!("{:?}: effect '{}' has negative duration", id, effect.name));
                }
                if effect.max_stacks == 0 {
                    return Err(format!("{:?}: effect '{}' has max_stacks 0", id, effect.name));
                }
            }
        }
        Ok(())
    }

    pub fn skill_ids(&self) -> impl Iterator<Item = &SkillId> {
        self.specs.keys()
    }
}

/// Load skill definitions from assets/config/skills.ron
pub fn load_skill_book() -> Result<SkillBook, String> {
    let config_path = "assets/config/skills.ron";

    let contents = std::fs::read_to_string(config_path)
        .map_err(|e| format!("Failed to read {}: {}", config_path, e))?;

    let config: SkillsConfig =
        ron::from_str(&contents).map_err(|e| format!("Failed to parse {}: {}", config_path, e))?;

    let book = SkillBook::new(config);
    book.validate()?;

    info!("Loaded {} skill definitions from {}", book.specs.len(), config_path);

    Ok(book)
}

/// Bevy plugin for skill configuration loading
pub struct SkillBookPlugin;

impl Plugin for SkillBookPlugin {
    fn build(&self, app: &mut App) {
        match load_skill_book() {
            Ok(book) => {
                app.insert_resource(book);
            }
            Err(e) => {
                // Config must always be valid; fail loudly at startup.
                panic!("Failed to load skill book: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effects::{EffectCondition, EffectTiming, Polarity, StackPolicy};

    fn minimal_spec(name: &str) -> SkillSpec {
        SkillSpec {
            name: name.to_string(),
            activation: 1.0,
            aftercast: 0.5,
            recharge: 2.0,
            energy_cost: 10.0,
            range: 20.0,
            target_kind: TargetKind::Enemy,
            shape: TargetShape::Target,
            base_damage: 12.0,
            base_healing: 0.0,
            effects: vec![],
            windup: false,
            aftercast_move: false,
        }
    }

    fn full_book() -> SkillsConfig {
        let skills = SkillId::ALL
            .into_iter()
            .map(|id| (id, minimal_spec(&format!("{:?}", id))))
            .collect();
        SkillsConfig { skills }
    }

    #[test]
    fn validate_accepts_complete_book() {
        let book = SkillBook::new(full_book());
        assert!(book.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_skill() {
        let mut config = full_book();
        config.skills.remove(&SkillId::WarmCocoa);
        let book = SkillBook::new(config);
        let err = book.validate().unwrap_err();
        assert!(err.contains("WarmCocoa"));
    }

    #[test]
    fn validate_rejects_negative_cost() {
        let mut config = full_book();
        config.skills.get_mut(&SkillId::SnowballToss).unwrap().energy_cost = -5.0;
        let book = SkillBook::new(config);
        assert!(book.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_max_stacks() {
        let mut config = full_book();
        config
            .skills
            .get_mut(&SkillId::PackedIceball)
            .unwrap()
            .effects
            .push(EffectSpec {
                name: "Broken".to_string(),
                polarity: Polarity::Chill,
                modifiers: vec![],
                timing: EffectTiming::OnHit,
                shape: TargetShape::Target,
                condition: EffectCondition::Always,
                duration: 3.0,
                stacking: StackPolicy::AddIntensity,
                max_stacks: 0,
            });
        let book = SkillBook::new(config);
        assert!(book.validate().is_err());
    }

    #[test]
    fn spec_round_trips_through_ron() {
        let spec = minimal_spec("Snowball Toss");
        let text = ron::to_string(&spec).unwrap();
        let parsed: SkillSpec = ron::from_str(&text).unwrap();
        assert_eq!(parsed.name, "Snowball Toss");
        assert_eq!(parsed.base_damage, 12.0);
    }
}
