//! Affix script detection
//!
//! Samples buffs, debuffs, damage and heals that follow each cast, groups the
//! hits by affix script, and ranks the groups by how many casts they appear in.
//! Buff groups that land at the very start of the window (scripted affixes)
//! outrank buffs that arrive later (incidental passives sharing the id space).

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use hashbrown::HashSet;
use quill_types::{AffixResult, DetectionConfig, DetectionStatus, EffectKind};

use crate::catalog::ScribingCatalog;
use crate::combat_log::{CombatEvent, EventKind, FightEvents, after, window, window_inclusive};

// ═══════════════════════════════════════════════════════════════════════════
// Trigger Window
// ═══════════════════════════════════════════════════════════════════════════

/// Start of the affix window for one cast.
///
/// Deferred-trigger abilities apply their affix on the player's next action:
/// the earliest of the next cast of a different ability, next damage, next
/// heal, or next resource spend. Falls back to the next cast of anything,
/// then to the cast itself.
pub fn trigger_start(
    config: &DetectionConfig,
    ability_id: i64,
    player_id: i64,
    cast: &CombatEvent,
    events: &FightEvents,
) -> i64 {
    let cast_time = cast.timestamp;
    if !config.is_deferred_trigger(ability_id) {
        return cast_time;
    }

    let by_player = |e: &&CombatEvent| e.source_id == player_id;
    let next_action = [
        after(events.casts(), cast_time)
            .iter()
            .find(|e| e.source_id == player_id && e.ability_id != ability_id),
        after(events.damage(), cast_time).iter().find(by_player),
        after(events.heals(), cast_time).iter().find(by_player),
        after(events.resources(), cast_time)
            .iter()
            .find(|e| e.source_id == player_id && e.resource_delta() < 0),
    ]
    .into_iter()
    .flatten()
    .map(|e| e.timestamp)
    .min();

    next_action
        .or_else(|| {
            after(events.casts(), cast_time)
                .iter()
                .find(by_player)
                .map(|e| e.timestamp)
        })
        .unwrap_or(cast_time)
}

// ═══════════════════════════════════════════════════════════════════════════
// Candidate Collection
// ═══════════════════════════════════════════════════════════════════════════

/// Hits for one (kind, ability id) pair
#[derive(Debug, Default)]
struct IdHits {
    casts: BTreeSet<usize>,
    /// Casts where the hit landed within the immediate threshold (buffs only)
    immediate: BTreeSet<usize>,
    events: usize,
}

fn kind_index(kind: EffectKind) -> usize {
    EffectKind::PREFERENCE
        .iter()
        .position(|k| *k == kind)
        .unwrap_or(0)
}

#[derive(Default)]
struct Collector {
    hits: BTreeMap<(usize, i64), IdHits>,
}

impl Collector {
    fn record(&mut self, kind: EffectKind, ability_id: i64, cast_index: usize, immediate: bool) {
        let entry = self.hits.entry((kind_index(kind), ability_id)).or_default();
        entry.casts.insert(cast_index);
        entry.events += 1;
        if immediate {
            entry.immediate.insert(cast_index);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Aggregation
// ═══════════════════════════════════════════════════════════════════════════

/// Candidates sharing one affix script (or one unnamed ability id)
#[derive(Debug, Default)]
struct AffixGroup {
    script_name: Option<String>,
    ability_ids: BTreeSet<i64>,
    /// Union of cast indices across member ids
    casts: BTreeSet<usize>,
    /// Raw matching events across member ids
    raw_matches: usize,
    kind_counts: [usize; 4],
    /// Immediate-trigger ratio of each buff member id
    buff_ratios: Vec<f64>,
}

impl AffixGroup {
    fn dominant_kind(&self) -> EffectKind {
        let mut dominant = 0;
        for i in 1..EffectKind::PREFERENCE.len() {
            if self.kind_counts[i] > self.kind_counts[dominant] {
                dominant = i;
            }
        }
        EffectKind::PREFERENCE[dominant]
    }

    /// Best ratio among buff member ids, so a late sibling id cannot dilute
    /// an immediately applied one
    fn immediate_ratio(&self) -> f64 {
        if self.dominant_kind() != EffectKind::Buff {
            return 0.0;
        }
        self.buff_ratios.iter().copied().fold(0.0, f64::max)
    }

    fn min_ability_id(&self) -> i64 {
        self.ability_ids.first().copied().unwrap_or_default()
    }
}

fn aggregate(catalog: &ScribingCatalog, collector: Collector) -> Vec<AffixGroup> {
    let mut groups: BTreeMap<String, AffixGroup> = BTreeMap::new();

    for ((kind, ability_id), hits) in collector.hits {
        let script_name = catalog.affix_name(ability_id).map(str::to_string);
        let key = script_name
            .clone()
            .unwrap_or_else(|| format!("ability-{ability_id}"));

        let group = groups.entry(key).or_default();
        group.script_name = script_name;
        group.ability_ids.insert(ability_id);
        group.casts.extend(hits.casts.iter().copied());
        group.raw_matches += hits.events;
        group.kind_counts[kind] += 1;
        if EffectKind::PREFERENCE[kind] == EffectKind::Buff && !hits.casts.is_empty() {
            group
                .buff_ratios
                .push(hits.immediate.len() as f64 / hits.casts.len() as f64);
        }
    }

    groups.into_values().collect()
}

fn rank(a: &AffixGroup, b: &AffixGroup, immediate_threshold: f64) -> Ordering {
    let a_immediate = a.immediate_ratio() >= immediate_threshold;
    let b_immediate = b.immediate_ratio() >= immediate_threshold;

    // Consistency shares a denominator, so cast counts compare directly
    b_immediate
        .cmp(&a_immediate)
        .then_with(|| b.casts.len().cmp(&a.casts.len()))
        .then_with(|| b.raw_matches.cmp(&a.raw_matches))
        .then_with(|| match (&a.script_name, &b.script_name) {
            (Some(a_name), Some(b_name)) => a_name.cmp(b_name),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.min_ability_id().cmp(&b.min_ability_id()))
}

// ═══════════════════════════════════════════════════════════════════════════
// Detection
// ═══════════════════════════════════════════════════════════════════════════

/// Ranked affix candidates for the player's casts, best first.
///
/// Empty when there are no casts. A single insufficient-evidence placeholder
/// when casts exist but nothing was observed.
pub fn detect_affixes(
    catalog: &ScribingCatalog,
    config: &DetectionConfig,
    ability_id: i64,
    player_id: i64,
    grimoire_key: Option<&str>,
    casts: &[CombatEvent],
    events: &FightEvents,
) -> Vec<AffixResult> {
    if casts.is_empty() {
        tracing::debug!(ability_id, player_id, "Affix detection skipped: no casts");
        return Vec::new();
    }

    let compatible = catalog.affix_ids_for(grimoire_key);
    tracing::debug!(
        ability_id,
        player_id,
        grimoire = ?grimoire_key,
        casts = casts.len(),
        compatible_ids = compatible.len(),
        "Affix detection window initialization"
    );

    let mut collector = Collector::default();
    for (cast_index, cast) in casts.iter().enumerate() {
        let start = trigger_start(config, ability_id, player_id, cast, events);
        sample_cast(
            config,
            compatible,
            ability_id,
            player_id,
            cast_index,
            start,
            events,
            &mut collector,
        );
    }

    let mut groups = aggregate(catalog, collector);
    if groups.is_empty() {
        tracing::debug!(ability_id, player_id, "Affix detection found no viable candidates");
        return vec![AffixResult::insufficient_evidence(
            config.insufficient_affix_confidence,
        )];
    }

    groups.sort_by(|a, b| rank(a, b, config.immediate_ratio_threshold));

    let top = &groups[0];
    tracing::info!(
        ability_id,
        player_id,
        grimoire = ?grimoire_key,
        script = ?top.script_name,
        kind = ?top.dominant_kind(),
        consistency = top.casts.len() as f64 / casts.len() as f64,
        immediate_ratio = top.immediate_ratio(),
        ability_ids = ?top.ability_ids,
        "Affix detection selected top candidate"
    );

    groups
        .iter()
        .map(|group| to_result(group, casts.len()))
        .collect()
}

fn sample_cast(
    config: &DetectionConfig,
    compatible: &HashSet<i64>,
    ability_id: i64,
    player_id: i64,
    cast_index: usize,
    start: i64,
    events: &FightEvents,
    collector: &mut Collector,
) {
    let aura_end = start + config.affix_buff_window_ms;
    let hit_end = start + config.affix_window_ms;
    let candidate = |e: &CombatEvent| {
        e.source_id == player_id && e.ability_id != ability_id && compatible.contains(&e.ability_id)
    };
    let fresh_apply = |e: &CombatEvent| {
        matches!(e.kind, EventKind::BuffApply { .. }) && e.secondary_ability_id.is_none()
    };

    let mut seen: Vec<(EffectKind, i64)> = Vec::new();

    for buff in window_inclusive(events.buffs(), start, aura_end) {
        if !candidate(buff) || !fresh_apply(buff) {
            continue;
        }
        if config.self_buffs_only && buff.target_id != player_id {
            continue;
        }
        let immediate = buff.timestamp - start <= config.immediate_trigger_ms;
        collector.record(EffectKind::Buff, buff.ability_id, cast_index, immediate);
        seen.push((EffectKind::Buff, buff.ability_id));
    }

    for debuff in window_inclusive(events.debuffs(), start, aura_end) {
        if candidate(debuff) && fresh_apply(debuff) {
            collector.record(EffectKind::Debuff, debuff.ability_id, cast_index, false);
            seen.push((EffectKind::Debuff, debuff.ability_id));
        }
    }

    for (partition, kind) in [
        (events.damage(), EffectKind::Damage),
        (events.heals(), EffectKind::Heal),
    ] {
        for event in window(partition, start, hit_end) {
            if candidate(event) {
                collector.record(kind, event.ability_id, cast_index, false);
                seen.push((kind, event.ability_id));
            }
        }
    }

    tracing::debug!(
        ability_id,
        player_id,
        cast_index,
        trigger_start = start,
        hits = ?seen,
        "Affix detection cast window results"
    );
}

fn to_result(group: &AffixGroup, cast_count: usize) -> AffixResult {
    let kind = group.dominant_kind();
    let confidence = group.casts.len() as f64 / cast_count as f64;
    let percent = (confidence * 100.0).round() as u32;
    let immediate_ratio = group.immediate_ratio();

    let id = match &group.script_name {
        Some(name) => format!("affix-{name}"),
        None => format!("affix-{}", group.min_ability_id()),
    };
    let name = group
        .script_name
        .clone()
        .unwrap_or_else(|| format!("{} Affix Script", kind.label()));

    let ids = group
        .ability_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let mut evidence = vec![
        format!("Observed in {} of {} casts", group.casts.len(), cast_count),
        format!("{} ids: {}", kind.label(), ids),
        format!("{} matching events", group.raw_matches),
    ];
    if kind == EffectKind::Buff {
        evidence.push(format!(
            "Immediate trigger in {}% of matched casts",
            (immediate_ratio * 100.0).round() as u32
        ));
    }

    AffixResult {
        id,
        name,
        description: kind.describe(percent),
        confidence,
        detection_method: kind.detection_method().to_string(),
        evidence,
        status: DetectionStatus::Detected,
        effect_kind: Some(kind),
        matched_ability_ids: group.ability_ids.iter().copied().collect(),
        occurrence_count: group.casts.len(),
        immediate_ratio,
    }
}
