//! Detection orchestrator
//!
//! Composes resolution, cast normalization and the two script detectors into
//! one result per (player, ability) pair, and fans that out over a fight.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use quill_types::{
    AffixResult, DetectionConfig, RecipeInfo, ResolvedScribingDetection, SCHEMA_VERSION,
    ScribingDetectionsMap, SignatureResult,
};
use rayon::prelude::*;

use super::affix::detect_affixes;
use super::casts::normalize_casts;
use super::error::DetectionError;
use super::resolver::SkillResolver;
use super::signature::detect_signature;
use crate::catalog::ScribingCatalog;
use crate::combat_log::FightEvents;

/// Abilities to analyze for one player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerAbilities {
    pub player_id: i64,
    pub ability_ids: Vec<i64>,
}

impl PlayerAbilities {
    pub fn new(player_id: i64, ability_ids: Vec<i64>) -> Self {
        Self {
            player_id,
            ability_ids,
        }
    }
}

#[derive(Debug)]
pub struct ScribingEngine {
    resolver: SkillResolver,
    config: DetectionConfig,
}

impl ScribingEngine {
    pub fn new(catalog: Arc<ScribingCatalog>) -> Self {
        Self::with_config(catalog, DetectionConfig::default())
    }

    pub fn with_config(catalog: Arc<ScribingCatalog>, config: DetectionConfig) -> Self {
        Self {
            resolver: SkillResolver::new(catalog),
            config,
        }
    }

    pub fn catalog(&self) -> &ScribingCatalog {
        self.resolver.catalog()
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn resolver(&self) -> &SkillResolver {
        &self.resolver
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Single Pair
    // ═══════════════════════════════════════════════════════════════════════

    /// Detect the scribing recipe of one ability for one player.
    ///
    /// `Ok(None)` means the ability is not a scribing ability.
    pub fn try_detect(
        &self,
        ability_id: i64,
        player_id: i64,
        events: &FightEvents,
    ) -> Result<Option<ResolvedScribingDetection>, DetectionError> {
        validate_config(&self.config)?;

        let Some(mut skill) = self.resolver.lookup(ability_id) else {
            return Ok(None);
        };
        if self.catalog().grimoire(&skill.grimoire_key).is_none() {
            return Err(DetectionError::MissingGrimoire {
                ability_id,
                grimoire: skill.grimoire_key,
            });
        }

        let mut effective_ability_id = ability_id;
        if let Some(resolved) =
            self.resolver
                .resolve_ambiguous_focus(&skill, player_id, events, &self.config)
        {
            effective_ability_id = resolved.ability_id;
            skill = resolved;
        }

        let normalized = normalize_casts(
            self.catalog(),
            &self.config,
            &skill,
            effective_ability_id,
            player_id,
            events,
        );
        let was_cast_in_fight = !normalized.is_empty();

        let (signature, affixes) = if was_cast_in_fight {
            (
                detect_signature(
                    self.catalog(),
                    &self.config,
                    effective_ability_id,
                    player_id,
                    &normalized.casts,
                    events,
                ),
                detect_affixes(
                    self.catalog(),
                    &self.config,
                    effective_ability_id,
                    player_id,
                    Some(&skill.grimoire_key),
                    &normalized.casts,
                    events,
                ),
            )
        } else {
            (SignatureResult::no_cast_evidence(), Vec::<AffixResult>::new())
        };

        tracing::debug!(
            ability_id,
            effective_ability_id,
            player_id,
            casts = normalized.logged,
            synthetic_casts = normalized.synthetic,
            signature = %signature.name,
            affix = ?affixes.first().map(|a| &a.name),
            "Scribing detection complete"
        );

        Ok(Some(ResolvedScribingDetection {
            schema_version: SCHEMA_VERSION,
            ability_id,
            effective_ability_id,
            recipe: RecipeInfo::from_skill(&skill),
            skill,
            was_cast_in_fight,
            cast_count: normalized.logged,
            synthetic_cast_count: normalized.synthetic,
            signature,
            affixes,
        }))
    }

    /// Like [`Self::try_detect`], but a fault is logged and reported as
    /// "not a scribing ability" so one bad pair never aborts a batch.
    pub fn detect(
        &self,
        ability_id: i64,
        player_id: i64,
        events: &FightEvents,
    ) -> Option<ResolvedScribingDetection> {
        match self.try_detect(ability_id, player_id, events) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(ability_id, player_id, error = %e, "Scribing detection failed");
                None
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Batch
    // ═══════════════════════════════════════════════════════════════════════

    /// Detect every (player, ability) pair in order, reporting the fraction of
    /// pairs processed after each one. With no pairs, progress fires once
    /// with 1.0.
    pub fn detect_all(
        &self,
        fight_id: i64,
        events: &FightEvents,
        roster: &[PlayerAbilities],
        mut on_progress: Option<&mut dyn FnMut(f64)>,
    ) -> ScribingDetectionsMap {
        let mut detections = ScribingDetectionsMap::new(fight_id);
        let total = pair_count(roster);
        let mut processed = 0usize;

        for entry in roster {
            for &ability_id in &entry.ability_ids {
                if let Some(result) = self.detect(ability_id, entry.player_id, events) {
                    detections.insert(entry.player_id, result);
                }
                processed += 1;
                if let Some(cb) = on_progress.as_mut() {
                    cb(processed as f64 / total as f64);
                }
            }
        }

        if total == 0
            && let Some(cb) = on_progress.as_mut()
        {
            cb(1.0);
        }

        tracing::info!(
            fight_id,
            pairs = total,
            detected = detections.len(),
            "Scribing detection batch complete"
        );
        detections
    }

    /// Parallel form of [`Self::detect_all`]. Progress may arrive out of
    /// order but each value is the fraction completed at that moment.
    pub fn par_detect_all(
        &self,
        fight_id: i64,
        events: &FightEvents,
        roster: &[PlayerAbilities],
        on_progress: Option<&(dyn Fn(f64) + Sync)>,
    ) -> ScribingDetectionsMap {
        let pairs: Vec<(i64, i64)> = roster
            .iter()
            .flat_map(|entry| entry.ability_ids.iter().map(|&a| (entry.player_id, a)))
            .collect();
        let total = pairs.len();
        let processed = AtomicUsize::new(0);

        let results: Vec<(i64, ResolvedScribingDetection)> = pairs
            .par_iter()
            .filter_map(|&(player_id, ability_id)| {
                let result = self.detect(ability_id, player_id, events);
                let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(cb) = on_progress {
                    cb(done as f64 / total as f64);
                }
                result.map(|r| (player_id, r))
            })
            .collect();

        if total == 0
            && let Some(cb) = on_progress
        {
            cb(1.0);
        }

        let mut detections = ScribingDetectionsMap::new(fight_id);
        for (player_id, result) in results {
            detections.insert(player_id, result);
        }

        tracing::info!(
            fight_id,
            pairs = total,
            detected = detections.len(),
            "Scribing detection batch complete"
        );
        detections
    }

    /// Abilities the player cast or applied that resolve in the catalog
    pub fn scribing_abilities_for_player(&self, events: &FightEvents, player_id: i64) -> Vec<i64> {
        events
            .abilities_of(player_id)
            .into_iter()
            .filter(|&id| self.catalog().is_scribing_ability(id))
            .collect()
    }

    /// Every player with at least one scribing ability in the fight
    pub fn scribing_roster(&self, events: &FightEvents) -> Vec<PlayerAbilities> {
        events
            .players()
            .into_iter()
            .filter_map(|player_id| {
                let ability_ids = self.scribing_abilities_for_player(events, player_id);
                (!ability_ids.is_empty()).then(|| PlayerAbilities::new(player_id, ability_ids))
            })
            .collect()
    }
}

fn pair_count(roster: &[PlayerAbilities]) -> usize {
    roster.iter().map(|entry| entry.ability_ids.len()).sum()
}

/// Reject configs that would make detection meaningless
pub fn validate_config(config: &DetectionConfig) -> Result<(), DetectionError> {
    let invalid = |reason: String| Err(DetectionError::InvalidConfig { reason });

    for (name, value) in [
        ("signature_window_ms", config.signature_window_ms),
        ("affix_window_ms", config.affix_window_ms),
        ("affix_buff_window_ms", config.affix_buff_window_ms),
    ] {
        if value <= 0 {
            return invalid(format!("{name} must be positive, got {value}"));
        }
    }
    for (name, value) in [
        ("immediate_trigger_ms", config.immediate_trigger_ms),
        ("pseudo_cast_window_ms", config.pseudo_cast_window_ms),
    ] {
        if value < 0 {
            return invalid(format!("{name} must not be negative, got {value}"));
        }
    }
    for (name, value) in [
        ("signature_min_consistency", config.signature_min_consistency),
        ("signature_confidence_cap", config.signature_confidence_cap),
        ("immediate_ratio_threshold", config.immediate_ratio_threshold),
        (
            "insufficient_signature_confidence",
            config.insufficient_signature_confidence,
        ),
        ("insufficient_affix_confidence", config.insufficient_affix_confidence),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return invalid(format!("{name} must be within 0..=1, got {value}"));
        }
    }
    Ok(())
}
