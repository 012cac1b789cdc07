//! Shared detection types for Quill
//!
//! This crate contains the serializable value objects produced by the scribing
//! detection engine (quill-core) and read by consumers such as the CLI or a
//! report generator, plus the tunable `DetectionConfig` and the persisted
//! `QuillConfig`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Bumped whenever the shape or semantics of `ResolvedScribingDetection` change.
pub const SCHEMA_VERSION: u32 = 2;

// ─────────────────────────────────────────────────────────────────────────────
// Skill Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Resolved identity of a scribed ability: which grimoire and which focus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScribingSkillInfo {
    /// Ability id this identity was resolved for
    pub ability_id: i64,
    pub grimoire_key: String,
    pub grimoire_name: String,
    pub grimoire_id: i64,
    /// Focus script display name ("Base Ability" for the grimoire's own id)
    pub transformation: String,
    /// "Focus Script" or "Base Grimoire"
    pub transformation_type: String,
}

/// Static recipe facts for a resolved skill. Never inferred from combat data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeInfo {
    pub grimoire: String,
    pub transformation: String,
    pub transformation_type: String,
    pub confidence: f64,
    pub match_method: String,
    pub summary: String,
    pub tooltip: String,
}

impl RecipeInfo {
    pub fn from_skill(skill: &ScribingSkillInfo) -> Self {
        Self {
            grimoire: skill.grimoire_name.clone(),
            transformation: skill.transformation.clone(),
            transformation_type: skill.transformation_type.clone(),
            confidence: 1.0,
            match_method: "Database Lookup".to_string(),
            summary: format!("{} + {}", skill.grimoire_name, skill.transformation),
            tooltip: "Detected from scribing database with 100% confidence".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Script Results
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome state of a script detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStatus {
    #[default]
    Detected,
    /// Cast at least once, but no candidate cleared the consistency threshold
    InsufficientEvidence,
    /// Never cast in the fight, so there was nothing to analyze
    NoCastEvidence,
}

/// Kind of secondary event an affix candidate was observed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Buff,
    Debuff,
    Damage,
    Heal,
}

impl EffectKind {
    /// Preference order used when a group was observed as several kinds
    pub const PREFERENCE: [EffectKind; 4] = [
        EffectKind::Buff,
        EffectKind::Debuff,
        EffectKind::Damage,
        EffectKind::Heal,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EffectKind::Buff => "Buff",
            EffectKind::Debuff => "Debuff",
            EffectKind::Damage => "Damage",
            EffectKind::Heal => "Heal",
        }
    }

    pub fn detection_method(&self) -> &'static str {
        match self {
            EffectKind::Buff => "Buff Pattern Analysis (No extraAbilityGameID)",
            EffectKind::Debuff => "Debuff Pattern Analysis (No extraAbilityGameID)",
            EffectKind::Damage => "Damage Pattern Analysis",
            EffectKind::Heal => "Healing Pattern Analysis",
        }
    }

    /// Human readable description for a group seen in `percent`% of casts
    pub fn describe(&self, percent: u32) -> String {
        match self {
            EffectKind::Buff => format!("Applies buff effects in {percent}% of casts"),
            EffectKind::Debuff => format!("Applies debuff effects in {percent}% of casts"),
            EffectKind::Damage => format!("Adds additional damage effects in {percent}% of casts"),
            EffectKind::Heal => format!("Adds additional healing effects in {percent}% of casts"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureResult {
    pub name: String,
    pub confidence: f64,
    pub detection_method: String,
    pub evidence: Vec<String>,
    #[serde(default)]
    pub status: DetectionStatus,
}

impl SignatureResult {
    /// Placeholder for an ability that was cast but matched no signature effect.
    pub fn insufficient_evidence(confidence: f64, mut evidence: Vec<String>) -> Self {
        evidence.insert(
            0,
            "Unable to reach consistency threshold during detection".to_string(),
        );
        Self {
            name: "Unknown Signature".to_string(),
            confidence,
            detection_method: "Insufficient combat evidence".to_string(),
            evidence,
            status: DetectionStatus::InsufficientEvidence,
        }
    }

    /// Placeholder for an ability that was never cast.
    pub fn no_cast_evidence() -> Self {
        Self {
            name: "Signature undetermined".to_string(),
            confidence: 0.0,
            detection_method: "No casts in fight".to_string(),
            evidence: vec![
                "Skill was never cast in this fight, so there is no combat data.".to_string(),
            ],
            status: DetectionStatus::NoCastEvidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffixResult {
    /// Stable identifier: `affix-<script name>` or `affix-<lowest ability id>`
    pub id: String,
    pub name: String,
    pub description: String,
    pub confidence: f64,
    pub detection_method: String,
    pub evidence: Vec<String>,
    #[serde(default)]
    pub status: DetectionStatus,
    /// Dominant kind the group was observed as (None for placeholders)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_kind: Option<EffectKind>,
    #[serde(default)]
    pub matched_ability_ids: Vec<i64>,
    /// Number of casts in which the group was observed
    #[serde(default)]
    pub occurrence_count: usize,
    /// Fraction of matched casts where a buff landed at the window start,
    /// taken from the best-timed buff id of the script
    #[serde(default)]
    pub immediate_ratio: f64,
}

impl AffixResult {
    /// Placeholder for an ability that was cast but produced no affix candidate.
    pub fn insufficient_evidence(confidence: f64) -> Self {
        Self {
            id: "affix-unknown".to_string(),
            name: "Unknown Affix".to_string(),
            description: "Scribing affix script".to_string(),
            confidence,
            detection_method: "Insufficient combat evidence".to_string(),
            evidence: vec![
                "No buff, debuff, damage or heal candidate observed after casts".to_string(),
            ],
            status: DetectionStatus::InsufficientEvidence,
            effect_kind: None,
            matched_ability_ids: Vec::new(),
            occurrence_count: 0,
            immediate_ratio: 0.0,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Detection Output
// ─────────────────────────────────────────────────────────────────────────────

/// Detection output for one (player, ability) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedScribingDetection {
    pub schema_version: u32,
    pub ability_id: i64,
    /// Ability id after focus disambiguation (equal to `ability_id` in most cases)
    pub effective_ability_id: i64,
    pub skill: ScribingSkillInfo,
    pub was_cast_in_fight: bool,
    /// Casts found in the log
    pub cast_count: usize,
    /// Casts synthesized from buff applications
    pub synthetic_cast_count: usize,
    pub signature: SignatureResult,
    /// Ranked affix candidates, best first. Empty when never cast.
    pub affixes: Vec<AffixResult>,
    pub recipe: RecipeInfo,
}

impl ResolvedScribingDetection {
    /// Top ranked affix, if any
    pub fn primary_affix(&self) -> Option<&AffixResult> {
        self.affixes.first()
    }
}

/// Batch output for one fight: player id -> ability id -> detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScribingDetectionsMap {
    pub fight_id: i64,
    pub players: BTreeMap<i64, BTreeMap<i64, ResolvedScribingDetection>>,
}

impl ScribingDetectionsMap {
    pub fn new(fight_id: i64) -> Self {
        Self {
            fight_id,
            players: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, player_id: i64, detection: ResolvedScribingDetection) {
        self.players
            .entry(player_id)
            .or_default()
            .insert(detection.ability_id, detection);
    }

    pub fn get(&self, player_id: i64, ability_id: i64) -> Option<&ResolvedScribingDetection> {
        self.players.get(&player_id)?.get(&ability_id)
    }

    pub fn len(&self) -> usize {
        self.players.values().map(|abilities| abilities.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Detection Config
// ─────────────────────────────────────────────────────────────────────────────

fn default_signature_window_ms() -> i64 {
    1500
}
fn default_min_consistency() -> f64 {
    0.5
}
fn default_signature_confidence_cap() -> f64 {
    0.95
}
fn default_affix_window_ms() -> i64 {
    1000
}
fn default_affix_buff_window_ms() -> i64 {
    1200
}
fn default_immediate_trigger_ms() -> i64 {
    10
}
fn default_immediate_ratio_threshold() -> f64 {
    0.5
}
fn default_pseudo_cast_window_ms() -> i64 {
    1000
}
fn default_deferred_trigger_abilities() -> Vec<i64> {
    // Ulfsild's Contingency
    vec![240150]
}
fn default_banner_grimoires() -> Vec<String> {
    vec!["banner-bearer".to_string()]
}
fn default_insufficient_signature_confidence() -> f64 {
    0.5
}
fn default_insufficient_affix_confidence() -> f64 {
    0.3
}
fn default_true() -> bool {
    true
}

/// Tunables for the detection engine. Every field has a serde default, so a
/// partial TOML table only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Post-cast window scanned for signature effects
    #[serde(default = "default_signature_window_ms")]
    pub signature_window_ms: i64,
    /// Minimum occurrences per cast for a signature candidate to be selectable
    #[serde(default = "default_min_consistency")]
    pub signature_min_consistency: f64,
    #[serde(default = "default_signature_confidence_cap")]
    pub signature_confidence_cap: f64,

    /// Damage/heal window after the affix trigger start
    #[serde(default = "default_affix_window_ms")]
    pub affix_window_ms: i64,
    /// Buff/debuff window after the affix trigger start
    #[serde(default = "default_affix_buff_window_ms")]
    pub affix_buff_window_ms: i64,
    /// Only sample buffs the player applied to themselves
    #[serde(default = "default_true")]
    pub self_buffs_only: bool,
    #[serde(default = "default_immediate_trigger_ms")]
    pub immediate_trigger_ms: i64,
    #[serde(default = "default_immediate_ratio_threshold")]
    pub immediate_ratio_threshold: f64,

    /// Abilities whose affix applies on the next player action instead of at cast
    #[serde(default = "default_deferred_trigger_abilities")]
    pub deferred_trigger_abilities: Vec<i64>,
    /// Grimoires whose casts are not logged and must be synthesized from buffs
    #[serde(default = "default_banner_grimoires")]
    pub pseudo_cast_grimoires: Vec<String>,
    /// Grimoires whose visible ability id is shared by several foci
    #[serde(default = "default_banner_grimoires")]
    pub ambiguous_focus_grimoires: Vec<String>,
    #[serde(default = "default_pseudo_cast_window_ms")]
    pub pseudo_cast_window_ms: i64,

    #[serde(default = "default_insufficient_signature_confidence")]
    pub insufficient_signature_confidence: f64,
    #[serde(default = "default_insufficient_affix_confidence")]
    pub insufficient_affix_confidence: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            signature_window_ms: default_signature_window_ms(),
            signature_min_consistency: default_min_consistency(),
            signature_confidence_cap: default_signature_confidence_cap(),
            affix_window_ms: default_affix_window_ms(),
            affix_buff_window_ms: default_affix_buff_window_ms(),
            self_buffs_only: true,
            immediate_trigger_ms: default_immediate_trigger_ms(),
            immediate_ratio_threshold: default_immediate_ratio_threshold(),
            deferred_trigger_abilities: default_deferred_trigger_abilities(),
            pseudo_cast_grimoires: default_banner_grimoires(),
            ambiguous_focus_grimoires: default_banner_grimoires(),
            pseudo_cast_window_ms: default_pseudo_cast_window_ms(),
            insufficient_signature_confidence: default_insufficient_signature_confidence(),
            insufficient_affix_confidence: default_insufficient_affix_confidence(),
        }
    }
}

impl DetectionConfig {
    pub fn is_deferred_trigger(&self, ability_id: i64) -> bool {
        self.deferred_trigger_abilities.contains(&ability_id)
    }

    pub fn synthesizes_casts(&self, grimoire_key: &str) -> bool {
        self.pseudo_cast_grimoires.iter().any(|g| g == grimoire_key)
    }

    pub fn has_ambiguous_focus(&self, grimoire_key: &str) -> bool {
        self.ambiguous_focus_grimoires.iter().any(|g| g == grimoire_key)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Application Config
// ─────────────────────────────────────────────────────────────────────────────

/// Persisted tool configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuillConfig {
    /// Catalog file replacing the bundled one
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    #[serde(default)]
    pub detection: DetectionConfig,
    /// Run batch detection across threads
    #[serde(default)]
    pub parallel: bool,
}
