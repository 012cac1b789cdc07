//! Tests for ScribingEngine orchestration and batch detection
//!
//! Verifies that:
//! - Lookup misses produce no result regardless of combat data
//! - Never-cast and insufficient-evidence outcomes stay distinguishable
//! - Banner abilities resolve their focus and synthesize casts end to end
//! - Batch progress and fault isolation behave per pair

use std::sync::Mutex;

use quill_types::{DetectionConfig, DetectionStatus, SCHEMA_VERSION};

use super::fixtures::*;
use super::{DetectionError, PlayerAbilities, ScribingEngine};
use crate::combat_log::CombatEvent;

// ═══════════════════════════════════════════════════════════════════════════
// Test Helpers
// ═══════════════════════════════════════════════════════════════════════════

fn engine() -> ScribingEngine {
    ScribingEngine::new(catalog())
}

/// Two trample casts, each followed by a signature hit and an immediate buff
fn trample_fight() -> Vec<CombatEvent> {
    let mut events = casts_at(TRAMPLE, &[0, 10_000]);
    for t in [0, 10_000] {
        events.push(self_buff(t, HEROISM));
        events.push(CombatEvent::damage(t + 400, PLAYER, TARGET, LINGERING, 120));
    }
    events
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ═══════════════════════════════════════════════════════════════════════════
// Single Pair
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn unknown_ability_yields_nothing() {
    let events = fight(casts_at(UNRELATED, &[0, 1000, 2000]));
    let engine = engine();

    assert!(engine.detect(UNRELATED, PLAYER, &events).is_none());
    assert!(matches!(engine.try_detect(UNRELATED, PLAYER, &events), Ok(None)));
}

#[test]
fn full_detection_carries_recipe_and_scripts() {
    let events = fight(trample_fight());
    let result = engine().detect(TRAMPLE, PLAYER, &events).unwrap();

    assert_eq!(result.schema_version, SCHEMA_VERSION);
    assert_eq!(result.ability_id, TRAMPLE);
    assert_eq!(result.effective_ability_id, TRAMPLE);
    assert!(result.was_cast_in_fight);
    assert_eq!(result.cast_count, 2);
    assert_eq!(result.synthetic_cast_count, 0);

    assert_eq!(result.recipe.grimoire, "Trample");
    assert_eq!(result.recipe.transformation, "Magical Trample");
    assert_eq!(result.recipe.transformation_type, "Focus Script");
    assert_eq!(result.recipe.confidence, 1.0);
    assert_eq!(result.recipe.summary, "Trample + Magical Trample");

    assert_eq!(result.signature.name, "Lingering Torment");
    assert_eq!(result.signature.status, DetectionStatus::Detected);
    assert_eq!(result.primary_affix().map(|a| a.name.as_str()), Some("Heroism"));
}

#[test]
fn never_cast_differs_from_insufficient_evidence() {
    let engine = engine();

    let silent = fight(vec![CombatEvent::damage(500, PLAYER, TARGET, LINGERING, 1)]);
    let never = engine.detect(TRAMPLE, PLAYER, &silent).unwrap();
    assert!(!never.was_cast_in_fight);
    assert_eq!(never.signature.status, DetectionStatus::NoCastEvidence);
    assert_eq!(never.signature.confidence, 0.0);
    assert!(never.affixes.is_empty());
    // Recipe is still reported from the catalog
    assert_eq!(never.recipe.confidence, 1.0);

    let quiet = fight(casts_at(TRAMPLE, &[0, 10_000, 20_000]));
    let weak = engine.detect(TRAMPLE, PLAYER, &quiet).unwrap();
    assert!(weak.was_cast_in_fight);
    assert_eq!(weak.signature.status, DetectionStatus::InsufficientEvidence);
    assert_eq!(weak.signature.confidence, 0.5);
    assert_eq!(weak.signature.name, "Unknown Signature");
    assert_eq!(weak.affixes.len(), 1);
    assert_eq!(weak.affixes[0].status, DetectionStatus::InsufficientEvidence);
    assert_eq!(weak.affixes[0].confidence, 0.3);

    assert_ne!(never.signature.detection_method, weak.signature.detection_method);
}

#[test]
fn banner_resolves_focus_and_synthesizes_casts() {
    let events = fight(vec![
        self_buff(0, SHIELD_BANNER),
        self_buff(300, SHIELD_BANNER_PULSE),
        self_buff(2000, SHIELD_BANNER),
        self_buff(4000, SHIELD_BANNER),
    ]);
    let result = engine().detect(BANNER_BASE, PLAYER, &events).unwrap();

    assert_eq!(result.ability_id, BANNER_BASE);
    assert_eq!(result.effective_ability_id, SHIELD_BANNER);
    assert_eq!(result.skill.transformation, "Shield Banner");
    assert_eq!(result.recipe.summary, "Banner Bearer + Shield Banner");
    assert!(result.was_cast_in_fight);
    assert_eq!(result.cast_count, 0);
    assert_eq!(result.synthetic_cast_count, 3);
}

#[test]
fn invalid_config_is_a_fault_not_a_miss() {
    let config = DetectionConfig {
        signature_window_ms: 0,
        ..DetectionConfig::default()
    };
    let engine = ScribingEngine::with_config(catalog(), config);
    let events = fight(trample_fight());

    assert!(matches!(
        engine.try_detect(TRAMPLE, PLAYER, &events),
        Err(DetectionError::InvalidConfig { .. })
    ));
    assert!(engine.detect(TRAMPLE, PLAYER, &events).is_none());
}

#[test]
fn confidence_outside_unit_range_is_rejected() {
    let config = DetectionConfig {
        insufficient_affix_confidence: 1.5,
        ..DetectionConfig::default()
    };
    let err = super::validate_config(&config).unwrap_err();
    assert!(err.to_string().contains("insufficient_affix_confidence"));
    assert!(super::validate_config(&DetectionConfig::default()).is_ok());
}

// ═══════════════════════════════════════════════════════════════════════════
// Batch
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn empty_roster_reports_completion_once() {
    let events = fight(Vec::new());
    let mut calls = Vec::new();
    let mut on_progress = |p: f64| calls.push(p);

    let map = engine().detect_all(7, &events, &[], Some(&mut on_progress));

    assert!(map.is_empty());
    assert_eq!(map.fight_id, 7);
    assert_eq!(calls, vec![1.0]);
}

#[test]
fn progress_counts_every_pair() {
    let mut raw = trample_fight();
    raw.push(CombatEvent::cast(500, OTHER_PLAYER, TRAMPLE_BASE));
    let events = fight(raw);
    let roster = vec![
        PlayerAbilities::new(PLAYER, vec![TRAMPLE, UNRELATED]),
        PlayerAbilities::new(OTHER_PLAYER, vec![TRAMPLE_BASE]),
    ];

    let mut calls = Vec::new();
    let mut on_progress = |p: f64| calls.push(p);
    let map = engine().detect_all(1, &events, &roster, Some(&mut on_progress));

    assert_eq!(calls.len(), 3);
    assert!(approx(calls[0], 1.0 / 3.0));
    assert!(approx(calls[1], 2.0 / 3.0));
    assert!(approx(calls[2], 1.0));

    // Non-scribing ids are skipped silently
    assert_eq!(map.len(), 2);
    assert!(map.get(PLAYER, TRAMPLE).is_some());
    assert!(map.get(PLAYER, UNRELATED).is_none());
    assert!(map.get(OTHER_PLAYER, TRAMPLE_BASE).unwrap().was_cast_in_fight);
}

#[test]
fn faulty_config_does_not_abort_batch() {
    let config = DetectionConfig {
        affix_window_ms: -5,
        ..DetectionConfig::default()
    };
    let engine = ScribingEngine::with_config(catalog(), config);
    let events = fight(trample_fight());
    let roster = vec![PlayerAbilities::new(PLAYER, vec![TRAMPLE, TRAMPLE_BASE])];

    let mut calls = 0;
    let mut on_progress = |_: f64| calls += 1;
    let map = engine.detect_all(1, &events, &roster, Some(&mut on_progress));

    assert!(map.is_empty());
    assert_eq!(calls, 2);
}

#[test]
fn parallel_batch_matches_sequential() {
    let mut raw = trample_fight();
    raw.push(self_buff(3000, SHIELD_BANNER));
    raw.push(CombatEvent::cast(500, OTHER_PLAYER, TRAMPLE));
    let events = fight(raw);
    let engine = engine();
    let roster = engine.scribing_roster(&events);

    let sequential = engine.detect_all(1, &events, &roster, None);

    let seen = Mutex::new(Vec::new());
    let on_progress = |p: f64| seen.lock().unwrap().push(p);
    let parallel = engine.par_detect_all(1, &events, &roster, Some(&on_progress));

    assert_eq!(sequential, parallel);
    let seen = seen.into_inner().unwrap();
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().any(|&p| approx(p, 1.0)));
}

#[test]
fn roster_lists_scribing_abilities_per_player() {
    let mut raw = trample_fight();
    raw.push(self_buff(3000, SHIELD_BANNER));
    raw.push(CombatEvent::cast(500, OTHER_PLAYER, UNRELATED));
    let events = fight(raw);
    let engine = engine();

    // Heroism is an affix effect, not a scribing ability
    assert_eq!(
        engine.scribing_abilities_for_player(&events, PLAYER),
        vec![TRAMPLE, SHIELD_BANNER]
    );
    assert_eq!(
        engine.scribing_roster(&events),
        vec![PlayerAbilities::new(PLAYER, vec![TRAMPLE, SHIELD_BANNER])]
    );
}
