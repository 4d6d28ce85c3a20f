//! Tests for the shipped skill definitions
//!
//! These tests verify that:
//! - The skills.ron file loads and validates
//! - Every skill id has a definition with sane numbers
//! - Individual skills carry the effects and flags they are built around

use snowsim::sim::effects::{EffectTiming, ModifierKind, Polarity, StackPolicy};
use snowsim::skills::config::load_skill_book;
use snowsim::skills::{SkillBook, SkillId, TargetKind};

// =============================================================================
// Loading and validation
// =============================================================================

fn load_book() -> SkillBook {
    load_skill_book().expect("shipped skills.ron should load and validate")
}

#[test]
fn shipped_config_defines_every_skill() {
    let book = load_book();
    for id in SkillId::ALL {
        let spec = book.get(&id);
        assert!(spec.is_some(), "{:?} should be defined", id);
        assert!(!spec.unwrap().name.is_empty(), "{:?} should have a name", id);
    }
}

#[test]
fn all_skills_have_sane_numbers() {
    let book = load_book();
    for id in SkillId::ALL {
        let spec = book.get_unchecked(&id);
        assert!(
            spec.activation >= 0.0,
            "{:?} should have non-negative activation, got {}",
            id,
            spec.activation
        );
        assert!(
            spec.aftercast >= 0.0,
            "{:?} should have non-negative aftercast, got {}",
            id,
            spec.aftercast
        );
        assert!(
            spec.recharge >= 0.0,
            "{:?} should have non-negative recharge, got {}",
            id,
            spec.recharge
        );
        assert!(
            spec.energy_cost >= 0.0,
            "{:?} should have non-negative energy cost, got {}",
            id,
            spec.energy_cost
        );
        if spec.target_kind != TargetKind::SelfOnly {
            assert!(
                spec.range > 0.0,
                "{:?} is targeted and should have a positive range",
                id
            );
        }
    }
}

#[test]
fn effects_have_positive_durations_or_are_instant() {
    let book = load_book();
    for id in SkillId::ALL {
        for effect in &book.get_unchecked(&id).effects {
            assert!(
                effect.duration >= 0.0,
                "{:?} effect '{}' has negative duration",
                id,
                effect.name
            );
            assert!(
                effect.max_stacks >= 1,
                "{:?} effect '{}' should allow at least one stack",
                id,
                effect.name
            );
        }
    }
}

// =============================================================================
// Per-skill content checks
// =============================================================================

#[test]
fn snowball_toss_is_a_windup_projectile() {
    let book = load_book();
    let toss = book.get_unchecked(&SkillId::SnowballToss);
    assert!(toss.windup, "the throw leaves the hand at half activation");
    assert!(toss.aftercast_move, "throwers keep moving through recovery");
    assert!(toss.is_damage());
    assert_eq!(toss.target_kind, TargetKind::Enemy);
}

#[test]
fn packed_iceball_chills_and_punishes_chilled() {
    let book = load_book();
    let iceball = book.get_unchecked(&SkillId::PackedIceball);
    assert_eq!(iceball.effects.len(), 2);

    let chill = &iceball.effects[0];
    assert_eq!(chill.timing, EffectTiming::OnHit);
    assert_eq!(chill.polarity, Polarity::Chill);
    assert!(chill.value_of(ModifierKind::MoveSpeedMult).unwrap() < 1.0);
    assert!(chill.duration > 0.0);

    // The follow-up sting is instant and conditional.
    let sting = &iceball.effects[1];
    assert_eq!(sting.duration, 0.0, "instant portion, not a lingering effect");
    assert!(sting.value_of(ModifierKind::WarmthDelta).unwrap() < 0.0);
}

#[test]
fn flurry_volley_stacks_its_energy_drain() {
    let book = load_book();
    let volley = book.get_unchecked(&SkillId::FlurryVolley);
    assert_eq!(volley.target_kind, TargetKind::Ground);

    let flurried = &volley.effects[0];
    assert_eq!(flurried.stacking, StackPolicy::AddIntensity);
    assert!(flurried.max_stacks > 1);
    assert!(flurried.value_of(ModifierKind::EnergyPerSecond).unwrap() < 0.0);
}

#[test]
fn warm_cocoa_is_the_direct_heal() {
    let book = load_book();
    let cocoa = book.get_unchecked(&SkillId::WarmCocoa);
    assert_eq!(cocoa.target_kind, TargetKind::Ally);
    assert!(cocoa.is_heal());
    assert!(!cocoa.is_damage());
}

#[test]
fn ember_brew_amplifies_healing_received() {
    let book = load_book();
    let brew = book.get_unchecked(&SkillId::EmberBrew);
    let warmth = &brew.effects[0];
    assert_eq!(warmth.timing, EffectTiming::WhileActive);
    assert!(warmth.value_of(ModifierKind::HealingMult).unwrap() > 1.0);
}

#[test]
fn thick_mittens_does_not_stack_with_itself() {
    let book = load_book();
    let mittens = book.get_unchecked(&SkillId::ThickMittens);
    let effect = &mittens.effects[0];
    assert_eq!(effect.stacking, StackPolicy::IgnoreIfActive);
    assert!(
        effect.value_of(ModifierKind::ArmorMult).unwrap() < 1.0,
        "mittens reduce incoming damage"
    );
}

#[test]
fn snow_fort_blocks_and_restores_on_block() {
    let book = load_book();
    let fort = book.get_unchecked(&SkillId::SnowFort);
    let block = &fort.effects[0];
    let chance = block.value_of(ModifierKind::BlockChance).unwrap();
    assert!(chance > 0.0 && chance <= 1.0);

    let walls = &fort.effects[1];
    assert_eq!(walls.timing, EffectTiming::OnBlock);
    assert!(walls.value_of(ModifierKind::WarmthDelta).unwrap() > 0.0);
}

#[test]
fn mirror_glaze_reflects_and_refunds_on_expiry() {
    let book = load_book();
    let glaze = book.get_unchecked(&SkillId::MirrorGlaze);
    let reflect = &glaze.effects[0];
    let pct = reflect.value_of(ModifierKind::ReflectPercent).unwrap();
    assert!(pct > 0.0 && pct < 1.0);

    let meltwater = &glaze.effects[1];
    assert_eq!(meltwater.timing, EffectTiming::OnEnd);
    assert!(meltwater.value_of(ModifierKind::EnergyDelta).unwrap() > 0.0);
}

#[test]
fn brain_freeze_silences() {
    let book = load_book();
    let freeze = book.get_unchecked(&SkillId::BrainFreeze);
    let effect = &freeze.effects[0];
    assert!(effect.has_flag(ModifierKind::SkillsDisabled));
    assert!(effect.duration > 0.0);
}

#[test]
fn quick_hands_stays_under_the_cooldown_cap() {
    let book = load_book();
    let hands = book.get_unchecked(&SkillId::QuickHands);
    let reduction = hands.effects[0].value_of(ModifierKind::CooldownReduction).unwrap();
    assert!(reduction > 0.0 && reduction <= 0.8);
}
