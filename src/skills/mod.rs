//! Skill content layer
//!
//! Skill identities and kinds live here; the numbers live in
//! `assets/config/skills.ron` and are loaded through [`config::SkillBook`].

pub mod config;

pub use config::{SkillBook, SkillBookPlugin, SkillSpec};

use serde::{Deserialize, Serialize};

/// Closed set of skill identities. The RON config must define every one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillId {
    /// Basic thrown snowball, windup mechanic.
    SnowballToss,
    /// Harder-packed projectile that chills the target.
    PackedIceball,
    /// Burst of snowballs around the target.
    FlurryVolley,
    /// Direct heal.
    WarmCocoa,
    /// Healing-received cozy.
    EmberBrew,
    /// Armor cozy.
    ThickMittens,
    /// Block-chance cozy.
    SnowFort,
    /// Reflects part of incoming hits.
    MirrorGlaze,
    /// Disables the target's skills briefly.
    BrainFreeze,
    /// Cooldown-reduction cozy.
    QuickHands,
}

impl SkillId {
    pub const ALL: [SkillId; 10] = [
        SkillId::SnowballToss,
        SkillId::PackedIceball,
        SkillId::FlurryVolley,
        SkillId::WarmCocoa,
        SkillId::EmberBrew,
        SkillId::ThickMittens,
        SkillId::SnowFort,
        SkillId::MirrorGlaze,
        SkillId::BrainFreeze,
        SkillId::QuickHands,
    ];
}

/// Legal target categories for a skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    SelfOnly,
    Ally,
    Enemy,
    /// Ground-targeted; resolves an area, needs no unit target.
    Ground,
}
