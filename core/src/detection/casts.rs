//! Cast normalization
//!
//! Some grimoires never log their own cast. For those, casts are rebuilt from
//! the buffs the ability applies.

use quill_types::{DetectionConfig, ScribingSkillInfo};

use crate::catalog::ScribingCatalog;
use crate::combat_log::{CombatEvent, FightEvents};

/// Casts used for downstream detection
#[derive(Debug, Clone, Default)]
pub struct NormalizedCasts {
    /// Logged and synthetic casts, sorted by timestamp
    pub casts: Vec<CombatEvent>,
    pub logged: usize,
    pub synthetic: usize,
}

impl NormalizedCasts {
    pub fn is_empty(&self) -> bool {
        self.casts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.casts.len()
    }
}

/// Player's casts of `ability_id`, synthesizing pseudo-casts when the
/// grimoire is known to omit its cast event and none were logged.
pub fn normalize_casts(
    catalog: &ScribingCatalog,
    config: &DetectionConfig,
    skill: &ScribingSkillInfo,
    ability_id: i64,
    player_id: i64,
    events: &FightEvents,
) -> NormalizedCasts {
    let mut casts = events.casts_of(player_id, ability_id);
    let logged = casts.len();

    if logged > 0 || !config.synthesizes_casts(&skill.grimoire_key) {
        return NormalizedCasts {
            casts,
            logged,
            synthetic: 0,
        };
    }

    let synthetic = synthesize_casts(
        catalog,
        &skill.grimoire_key,
        ability_id,
        player_id,
        events,
        config.pseudo_cast_window_ms,
    );
    let synthetic_count = synthetic.len();
    if synthetic_count > 0 {
        tracing::debug!(
            ability_id,
            player_id,
            grimoire = %skill.grimoire_key,
            additional_casts = synthetic_count,
            "Synthesized casts from buff events"
        );
    }

    casts.extend(synthetic);
    casts.sort_by_key(|c| c.timestamp);

    NormalizedCasts {
        casts,
        logged,
        synthetic: synthetic_count,
    }
}

/// One pseudo-cast per buff application from the grimoire, skipping
/// applications within `window_ms` of the previous pseudo-cast (refresh ticks).
fn synthesize_casts(
    catalog: &ScribingCatalog,
    grimoire_key: &str,
    ability_id: i64,
    player_id: i64,
    events: &FightEvents,
    window_ms: i64,
) -> Vec<CombatEvent> {
    let mut synthetic = Vec::new();
    let mut last: Option<i64> = None;

    for buff in events.buff_applies_by(player_id) {
        if catalog.grimoire_key_of(buff.ability_id) != Some(grimoire_key) {
            continue;
        }
        if last.is_some_and(|t| buff.timestamp - t < window_ms) {
            continue;
        }
        last = Some(buff.timestamp);
        synthetic.push(CombatEvent::synthetic_cast(
            buff.timestamp,
            player_id,
            buff.target_id,
            ability_id,
        ));
    }

    synthetic
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::fixtures::*;

    fn normalize(ability: i64, events: &FightEvents) -> NormalizedCasts {
        let catalog = catalog();
        let skill = catalog.lookup_skill(ability).unwrap();
        normalize_casts(
            &catalog,
            &DetectionConfig::default(),
            &skill,
            ability,
            PLAYER,
            events,
        )
    }

    #[test]
    fn banner_refreshes_are_not_casts() {
        let events = fight(vec![
            self_buff(0, SHIELD_BANNER),
            self_buff(500, SHIELD_BANNER),
            self_buff(1500, SHIELD_BANNER),
        ]);
        let normalized = normalize(SHIELD_BANNER, &events);

        assert_eq!(normalized.logged, 0);
        assert_eq!(normalized.synthetic, 2);
        let times: Vec<i64> = normalized.casts.iter().map(|c| c.timestamp).collect();
        assert_eq!(times, vec![0, 1500]);
        assert!(normalized.casts.iter().all(|c| c.is_synthetic()));
        assert!(normalized.casts.iter().all(|c| c.ability_id == SHIELD_BANNER));
    }

    #[test]
    fn window_measures_from_last_emitted_cast() {
        // 900 is suppressed, so 1100 is measured against 0 and emitted
        let events = fight(vec![
            self_buff(0, MAGICAL_BANNER),
            self_buff(900, MAGICAL_BANNER),
            self_buff(1100, SHIELD_BANNER_PULSE),
            self_buff(2050, MAGICAL_BANNER),
        ]);
        let times: Vec<i64> = normalize(MAGICAL_BANNER, &events)
            .casts
            .iter()
            .map(|c| c.timestamp)
            .collect();
        assert_eq!(times, vec![0, 1100]);
    }

    #[test]
    fn logged_casts_are_used_unmodified() {
        let mut events = casts_at(SHIELD_BANNER, &[100, 3000]);
        events.push(self_buff(100, SHIELD_BANNER));
        events.push(self_buff(2000, SHIELD_BANNER));
        let normalized = normalize(SHIELD_BANNER, &fight(events));

        assert_eq!(normalized.logged, 2);
        assert_eq!(normalized.synthetic, 0);
        assert!(normalized.casts.iter().all(|c| !c.is_synthetic()));
    }

    #[test]
    fn other_grimoires_are_never_synthesized() {
        let events = fight(vec![self_buff(0, TRAMPLE), self_buff(2000, TRAMPLE)]);
        let normalized = normalize(TRAMPLE, &events);
        assert!(normalized.is_empty());
    }
}
