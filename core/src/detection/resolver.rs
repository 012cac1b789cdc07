//! Ability id to grimoire/focus resolution

use std::sync::{Arc, PoisonError, RwLock};

use hashbrown::HashMap;
use quill_types::{DetectionConfig, ScribingSkillInfo};

use crate::catalog::ScribingCatalog;
use crate::combat_log::FightEvents;

/// Resolves ability ids against the catalog, memoizing each lookup for the
/// lifetime of the resolver.
#[derive(Debug)]
pub struct SkillResolver {
    catalog: Arc<ScribingCatalog>,
    cache: RwLock<HashMap<i64, Option<ScribingSkillInfo>>>,
}

impl SkillResolver {
    pub fn new(catalog: Arc<ScribingCatalog>) -> Self {
        Self {
            catalog,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &ScribingCatalog {
        &self.catalog
    }

    /// Naive catalog resolution, `None` for ids outside the scribing system
    pub fn lookup(&self, ability_id: i64) -> Option<ScribingSkillInfo> {
        if let Some(hit) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&ability_id)
        {
            return hit.clone();
        }

        let info = self.catalog.lookup_skill(ability_id);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ability_id, info.clone());
        info
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn clear_cache(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Re-resolve an ability whose visible id is shared by several foci.
    ///
    /// Counts the player's buff applications per focus of the grimoire and
    /// returns the most frequent focus when it beats the naive one. Returns
    /// `None` when the naive resolution stands.
    pub fn resolve_ambiguous_focus(
        &self,
        naive: &ScribingSkillInfo,
        player_id: i64,
        events: &FightEvents,
        config: &DetectionConfig,
    ) -> Option<ScribingSkillInfo> {
        if !config.has_ambiguous_focus(&naive.grimoire_key) {
            return None;
        }
        let grimoire = self.catalog.grimoire(&naive.grimoire_key)?;

        let mut counts = vec![0usize; grimoire.foci.len()];
        for buff in events.buff_applies_by(player_id) {
            if buff.ability_id == grimoire.id {
                continue;
            }
            if let Some(i) = grimoire
                .foci
                .iter()
                .position(|focus| focus.ability_ids.contains(&buff.ability_id))
            {
                counts[i] += 1;
            }
        }

        let naive_index = grimoire
            .foci
            .iter()
            .position(|focus| focus.name == naive.transformation);
        let mut top_index = naive_index;
        let mut top_count = naive_index.map_or(0, |i| counts[i]);
        for (i, &count) in counts.iter().enumerate() {
            if count > top_count {
                top_index = Some(i);
                top_count = count;
            }
        }

        let top_index = top_index?;
        if Some(top_index) == naive_index {
            return None;
        }

        let focus = &grimoire.foci[top_index];
        let resolved = self.lookup(focus.primary_id)?;
        if resolved.grimoire_key != naive.grimoire_key {
            // Primary id claimed by another grimoire in the catalog
            tracing::warn!(
                ability_id = focus.primary_id,
                grimoire = %naive.grimoire_key,
                "Focus primary id resolves outside its grimoire"
            );
            return None;
        }

        tracing::info!(
            original_ability_id = naive.ability_id,
            resolved_ability_id = resolved.ability_id,
            player_id,
            transformation = %resolved.transformation,
            buff_count = top_count,
            "Resolved banner focus from combat data"
        );
        Some(resolved)
    }
}
