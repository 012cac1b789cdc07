//! Signature script detection
//!
//! A signature script produces a secondary effect shortly after each cast.
//! Every signature effect observed in the post-cast window is counted per
//! event (not per cast), and the most frequent effect seen in at least half
//! as many events as there were casts wins.

use hashbrown::HashMap;
use quill_types::{DetectionConfig, DetectionStatus, SignatureResult};

use crate::catalog::ScribingCatalog;
use crate::combat_log::{CombatEvent, FightEvents, window};

pub const DETECTION_METHOD: &str = "Post-Cast Pattern Analysis";

/// Partition a signature effect was first observed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seen {
    Buff,
    Debuff,
    Damage,
    Healing,
    Resource,
    Cast,
}

impl Seen {
    fn label(&self) -> &'static str {
        match self {
            Seen::Buff => "buff",
            Seen::Debuff => "debuff",
            Seen::Damage => "damage",
            Seen::Healing => "healing",
            Seen::Resource => "resource",
            Seen::Cast => "cast",
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    effect_id: i64,
    seen: Seen,
    count: usize,
}

#[derive(Default)]
struct Tally {
    candidates: Vec<Candidate>,
    index: HashMap<i64, usize>,
}

impl Tally {
    fn hit(&mut self, effect_id: i64, seen: Seen) {
        match self.index.get(&effect_id) {
            Some(&i) => self.candidates[i].count += 1,
            None => {
                self.index.insert(effect_id, self.candidates.len());
                self.candidates.push(Candidate {
                    effect_id,
                    seen,
                    count: 1,
                });
            }
        }
    }
}

pub fn detect_signature(
    catalog: &ScribingCatalog,
    config: &DetectionConfig,
    ability_id: i64,
    player_id: i64,
    casts: &[CombatEvent],
    events: &FightEvents,
) -> SignatureResult {
    if casts.is_empty() {
        return SignatureResult::no_cast_evidence();
    }

    let mut tally = Tally::default();
    let mut check = |event: &CombatEvent, seen: Seen| {
        if event.ability_id != ability_id && catalog.is_signature_effect(event.ability_id) {
            tally.hit(event.ability_id, seen);
        }
        if let Some(secondary) = event.secondary_ability_id
            && secondary != ability_id
            && catalog.is_signature_effect(secondary)
        {
            tally.hit(secondary, seen);
        }
    };

    for cast in casts {
        let from = cast.timestamp;
        let until = from + config.signature_window_ms;
        let partitions = [
            (events.buffs(), Seen::Buff),
            (events.debuffs(), Seen::Debuff),
            (events.damage(), Seen::Damage),
            (events.heals(), Seen::Healing),
            (events.resources(), Seen::Resource),
            (events.casts(), Seen::Cast),
        ];
        for (partition, seen) in partitions {
            for event in window(partition, from, until) {
                if event.source_id != player_id {
                    continue;
                }
                if seen == Seen::Cast && event.ability_id == ability_id {
                    continue;
                }
                check(event, seen);
            }
        }
    }

    let cast_count = casts.len();
    let threshold = cast_count as f64 * config.signature_min_consistency;
    // Stable sort: equal counts keep first-seen order
    let mut ranked = tally.candidates;
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    let (consistent, weak): (Vec<_>, Vec<_>) =
        ranked.into_iter().partition(|c| c.count as f64 >= threshold);

    tracing::debug!(
        ability_id,
        player_id,
        casts = cast_count,
        consistent = consistent.len(),
        below_threshold = weak.len(),
        "Signature candidate summary"
    );

    let Some(top) = consistent.first() else {
        let mut evidence = vec![format!("Analyzed {cast_count} casts")];
        evidence.extend(weak.iter().take(3).map(|c| {
            format!(
                "Below threshold: {} ID {} ({}/{} casts)",
                c.seen.label(),
                c.effect_id,
                c.count,
                cast_count
            )
        }));
        return SignatureResult::insufficient_evidence(
            config.insufficient_signature_confidence,
            evidence,
        );
    };

    let confidence = (top.count as f64 / cast_count as f64).min(config.signature_confidence_cap);
    let name = catalog
        .signature_name(top.effect_id)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Signature Script (Effect ID: {})", top.effect_id));

    let mut evidence = vec![
        format!("Analyzed {cast_count} casts"),
        format!("Found {} consistent effects", consistent.len()),
        format!(
            "Top effect: {} ID {} ({}/{} casts)",
            top.seen.label(),
            top.effect_id,
            top.count,
            cast_count
        ),
    ];
    evidence.extend(consistent.iter().take(3).map(|c| {
        format!("{} {}: {} occurrences", c.seen.label(), c.effect_id, c.count)
    }));

    SignatureResult {
        name,
        confidence,
        detection_method: DETECTION_METHOD.to_string(),
        evidence,
        status: DetectionStatus::Detected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::fixtures::*;

    fn detect(events: Vec<CombatEvent>) -> SignatureResult {
        let fight = fight(events);
        let casts = fight.casts_of(PLAYER, TRAMPLE);
        detect_signature(
            &catalog(),
            &DetectionConfig::default(),
            TRAMPLE,
            PLAYER,
            &casts,
            &fight,
        )
    }

    #[test]
    fn confidence_is_occurrences_over_casts() {
        let mut events = casts_at(TRAMPLE, &[0, 10_000, 20_000, 30_000]);
        for t in [400, 10_400, 20_400] {
            events.push(CombatEvent::damage(t, PLAYER, TARGET, LINGERING, 50));
        }
        let result = detect(events);

        assert_eq!(result.name, "Lingering Torment");
        assert_eq!(result.status, DetectionStatus::Detected);
        assert!((result.confidence - 0.75).abs() < 1e-9);
        assert_eq!(result.detection_method, DETECTION_METHOD);
        assert_eq!(result.evidence[0], "Analyzed 4 casts");
        assert_eq!(result.evidence[2], "Top effect: damage ID 7001 (3/4 casts)");
    }

    #[test]
    fn below_half_is_not_selectable() {
        let mut events = casts_at(TRAMPLE, &[0, 10_000, 20_000, 30_000]);
        events.push(CombatEvent::damage(400, PLAYER, TARGET, LINGERING, 50));
        let result = detect(events);

        assert_eq!(result.status, DetectionStatus::InsufficientEvidence);
        assert_eq!(result.name, "Unknown Signature");
        assert_eq!(result.confidence, 0.5);
        assert!(result.evidence.iter().any(|e| e.contains("ID 7001 (1/4 casts)")));
    }

    #[test]
    fn counts_events_not_casts_and_caps_confidence() {
        let mut events = casts_at(TRAMPLE, &[0, 10_000]);
        for t in [200, 400, 600, 10_200] {
            events.push(CombatEvent::debuff_apply(t, PLAYER, TARGET, LINGERING_TICK));
        }
        let result = detect(events);

        assert_eq!(result.confidence, 0.95);
        assert!(result.evidence.contains(&"debuff 7002: 4 occurrences".to_string()));
    }

    #[test]
    fn window_is_open_at_cast_and_closed_at_end() {
        let mut events = casts_at(TRAMPLE, &[1000, 5000]);
        // At the cast itself and past the window: ignored
        events.push(CombatEvent::damage(1000, PLAYER, TARGET, SNARE, 1));
        events.push(CombatEvent::damage(6501, PLAYER, TARGET, SNARE, 1));
        // Exactly at the window end: counted
        events.push(CombatEvent::damage(2500, PLAYER, TARGET, LINGERING, 1));
        let result = detect(events);

        assert_eq!(result.name, "Lingering Torment");
        assert!(!result.evidence.iter().any(|e| e.contains("7101")));
    }

    #[test]
    fn secondary_ids_are_checked() {
        let mut events = casts_at(TRAMPLE, &[0, 3000]);
        events.push(CombatEvent::heal(100, PLAYER, PLAYER, UNRELATED, 10).with_secondary(SNARE));
        events.push(CombatEvent::heal(3100, PLAYER, PLAYER, UNRELATED, 10).with_secondary(SNARE));
        let result = detect(events);

        assert_eq!(result.name, "Hunter's Snare");
        assert_eq!(result.confidence, 0.95);
        assert!(result.evidence[2].starts_with("Top effect: healing ID 7101"));
    }

    #[test]
    fn ignores_other_players() {
        let mut events = casts_at(TRAMPLE, &[0, 3000]);
        events.push(CombatEvent::damage(100, OTHER_PLAYER, TARGET, LINGERING, 1));
        events.push(CombatEvent::damage(3100, OTHER_PLAYER, TARGET, LINGERING, 1));
        assert_eq!(detect(events).status, DetectionStatus::InsufficientEvidence);
    }

    #[test]
    fn no_casts_means_no_evidence() {
        let result = detect(vec![CombatEvent::damage(100, PLAYER, TARGET, LINGERING, 1)]);
        assert_eq!(result.status, DetectionStatus::NoCastEvidence);
        assert_eq!(result.confidence, 0.0);
    }
}
