//! In-memory event store for a single fight
//!
//! Events arrive already parsed. They are partitioned by kind and sorted by
//! timestamp once, so every detection window is a binary search plus a slice.

use std::fs;
use std::path::Path;

use hashbrown::HashSet;
use serde::Deserialize;

use super::{AuraKind, CombatEvent, EventKind, EventsError};

/// On-disk dump: either a bare event array or an object carrying the fight id
#[derive(Deserialize)]
#[serde(untagged)]
enum FightDump {
    Wrapped {
        #[serde(default)]
        fight_id: i64,
        events: Vec<CombatEvent>,
    },
    Bare(Vec<CombatEvent>),
}

#[derive(Debug, Clone, Default)]
pub struct FightEvents {
    fight_id: i64,
    casts: Vec<CombatEvent>,
    /// Buff applications and removals
    buffs: Vec<CombatEvent>,
    /// Debuff applications and removals
    debuffs: Vec<CombatEvent>,
    damage: Vec<CombatEvent>,
    heals: Vec<CombatEvent>,
    resources: Vec<CombatEvent>,
}

impl FightEvents {
    pub fn new(fight_id: i64, events: impl IntoIterator<Item = CombatEvent>) -> Self {
        let mut fight = Self {
            fight_id,
            ..Default::default()
        };

        for event in events {
            let bucket = match &event.kind {
                EventKind::Cast { .. } => &mut fight.casts,
                EventKind::BuffApply { aura, .. } | EventKind::BuffRemove { aura } => match aura {
                    AuraKind::Buff => &mut fight.buffs,
                    AuraKind::Debuff => &mut fight.debuffs,
                },
                EventKind::Damage { .. } => &mut fight.damage,
                EventKind::Heal { .. } => &mut fight.heals,
                EventKind::ResourceChange { .. } => &mut fight.resources,
            };
            bucket.push(event);
        }

        // Stable sort keeps log order for events sharing a timestamp
        for bucket in [
            &mut fight.casts,
            &mut fight.buffs,
            &mut fight.debuffs,
            &mut fight.damage,
            &mut fight.heals,
            &mut fight.resources,
        ] {
            bucket.sort_by_key(|e| e.timestamp);
        }

        fight
    }

    pub fn from_json_str(json: &str) -> Result<Self, EventsError> {
        let dump: FightDump = serde_json::from_str(json).map_err(EventsError::InvalidDump)?;
        Ok(Self::from_dump(dump))
    }

    /// Load a JSON fight dump from disk
    pub fn load(path: &Path) -> Result<Self, EventsError> {
        let content = fs::read_to_string(path).map_err(|source| EventsError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let dump: FightDump =
            serde_json::from_str(&content).map_err(|source| EventsError::ParseJson {
                path: path.to_path_buf(),
                source,
            })?;
        let fight = Self::from_dump(dump);

        tracing::debug!(
            path = %path.display(),
            fight_id = fight.fight_id,
            events = fight.len(),
            "Loaded fight events"
        );
        Ok(fight)
    }

    fn from_dump(dump: FightDump) -> Self {
        match dump {
            FightDump::Wrapped { fight_id, events } => Self::new(fight_id, events),
            FightDump::Bare(events) => Self::new(0, events),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Partitions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn fight_id(&self) -> i64 {
        self.fight_id
    }

    pub fn casts(&self) -> &[CombatEvent] {
        &self.casts
    }

    pub fn buffs(&self) -> &[CombatEvent] {
        &self.buffs
    }

    pub fn debuffs(&self) -> &[CombatEvent] {
        &self.debuffs
    }

    pub fn damage(&self) -> &[CombatEvent] {
        &self.damage
    }

    pub fn heals(&self) -> &[CombatEvent] {
        &self.heals
    }

    pub fn resources(&self) -> &[CombatEvent] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.casts.len()
            + self.buffs.len()
            + self.debuffs.len()
            + self.damage.len()
            + self.heals.len()
            + self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Logged casts of `ability_id` by `player_id`, in time order
    pub fn casts_of(&self, player_id: i64, ability_id: i64) -> Vec<CombatEvent> {
        self.casts
            .iter()
            .filter(|e| e.source_id == player_id && e.ability_id == ability_id)
            .cloned()
            .collect()
    }

    /// Buff applications (not removals) sourced by `player_id`
    pub fn buff_applies_by(&self, player_id: i64) -> impl Iterator<Item = &CombatEvent> {
        self.buffs.iter().filter(move |e| {
            e.source_id == player_id && matches!(e.kind, EventKind::BuffApply { .. })
        })
    }

    /// Every player that cast something or applied a buff, ascending
    pub fn players(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .casts
            .iter()
            .chain(self.buffs.iter())
            .map(|e| e.source_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Distinct ability ids a player cast or applied as a buff, ascending
    pub fn abilities_of(&self, player_id: i64) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .casts
            .iter()
            .chain(self.buffs.iter())
            .filter(|e| e.source_id == player_id)
            .map(|e| e.ability_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        ids.sort_unstable();
        ids
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Window Lookups
// ─────────────────────────────────────────────────────────────────────────────

/// Events with `after < timestamp <= until`
pub fn window(events: &[CombatEvent], after: i64, until: i64) -> &[CombatEvent] {
    let start = events.partition_point(|e| e.timestamp <= after);
    let end = events.partition_point(|e| e.timestamp <= until);
    &events[start..end.max(start)]
}

/// Events with `from <= timestamp <= until`
pub fn window_inclusive(events: &[CombatEvent], from: i64, until: i64) -> &[CombatEvent] {
    let start = events.partition_point(|e| e.timestamp < from);
    let end = events.partition_point(|e| e.timestamp <= until);
    &events[start..end.max(start)]
}

/// Events strictly after `after`
pub fn after(events: &[CombatEvent], after: i64) -> &[CombatEvent] {
    let start = events.partition_point(|e| e.timestamp <= after);
    &events[start..]
}
