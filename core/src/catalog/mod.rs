//! Scribing catalog
//!
//! Static reference data mapping ability ids to grimoires, focus scripts,
//! signature scripts and affix scripts. Built once from TOML and shared by
//! reference (usually behind an `Arc`) with every engine instance.

mod definition;
mod error;

use std::fs;
use std::path::Path;

use hashbrown::{HashMap, HashSet};
use quill_types::ScribingSkillInfo;

pub use definition::{
    AffixScriptDefinition, CatalogDefinition, FocusDefinition, GrimoireDefinition,
    GrimoireEffects, SignatureScriptDefinition,
};
pub use error::CatalogError;

/// Catalog shipped with the crate
const BUNDLED_CATALOG: &str = include_str!("../../data/scribing.toml");

pub const BASE_TRANSFORMATION: &str = "Base Ability";
pub const BASE_TRANSFORMATION_TYPE: &str = "Base Grimoire";
pub const FOCUS_TRANSFORMATION_TYPE: &str = "Focus Script";

#[derive(Debug, Clone)]
pub struct Grimoire {
    pub key: String,
    pub name: String,
    pub id: i64,
    pub foci: Vec<Focus>,
}

#[derive(Debug, Clone)]
pub struct Focus {
    pub key: String,
    pub name: String,
    /// Representative id used when re-resolving to this focus
    pub primary_id: i64,
    pub ability_ids: Vec<i64>,
}

#[derive(Debug, Clone, Copy)]
enum SkillSlot {
    Base,
    Focus(usize),
}

#[derive(Debug, Clone, Copy)]
struct SkillEntry {
    grimoire: usize,
    slot: SkillSlot,
}

/// Summary counts, mostly for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogStats {
    pub grimoires: usize,
    pub foci: usize,
    pub skill_ids: usize,
    pub signature_scripts: usize,
    pub signature_ids: usize,
    pub affix_scripts: usize,
    pub affix_ids: usize,
}

#[derive(Debug, Clone)]
pub struct ScribingCatalog {
    version: String,
    grimoires: Vec<Grimoire>,
    grimoire_by_key: HashMap<String, usize>,
    skills: HashMap<i64, SkillEntry>,
    signature_names: HashMap<i64, String>,
    signature_script_count: usize,
    affix_names: HashMap<i64, String>,
    affix_script_count: usize,
    affix_ids_by_grimoire: HashMap<String, HashSet<i64>>,
    all_affix_ids: HashSet<i64>,
    no_affix_ids: HashSet<i64>,
}

impl ScribingCatalog {
    // ═══════════════════════════════════════════════════════════════════════
    // Loading
    // ═══════════════════════════════════════════════════════════════════════

    /// The catalog embedded in the binary
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::parse(BUNDLED_CATALOG, "<bundled>")
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        Self::parse(content, "<string>")
    }

    /// Load a catalog override from disk
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    fn parse(content: &str, origin: &str) -> Result<Self, CatalogError> {
        let definition: CatalogDefinition =
            toml::from_str(content).map_err(|source| CatalogError::ParseToml {
                origin: origin.to_string(),
                source,
            })?;
        let catalog = Self::from_definition(definition)?;

        let stats = catalog.stats();
        tracing::debug!(
            origin,
            version = %catalog.version,
            grimoires = stats.grimoires,
            signature_ids = stats.signature_ids,
            affix_ids = stats.affix_ids,
            "Loaded scribing catalog"
        );
        Ok(catalog)
    }

    /// Validate a definition and build the lookup indices
    pub fn from_definition(definition: CatalogDefinition) -> Result<Self, CatalogError> {
        let mut catalog = Self {
            version: definition.version,
            grimoires: Vec::with_capacity(definition.grimoires.len()),
            grimoire_by_key: HashMap::new(),
            skills: HashMap::new(),
            signature_names: HashMap::new(),
            signature_script_count: definition.signature_scripts.len(),
            affix_names: HashMap::new(),
            affix_script_count: definition.affix_scripts.len(),
            affix_ids_by_grimoire: HashMap::new(),
            all_affix_ids: HashSet::new(),
            no_affix_ids: HashSet::new(),
        };

        for grimoire in definition.grimoires {
            catalog.add_grimoire(grimoire)?;
        }

        for script in &definition.signature_scripts {
            require_name("signature script", &script.key, &script.name)?;
            catalog.warn_unknown_grimoires(&script.name, &script.compatible_grimoires);
            catalog.warn_unknown_grimoires(&script.name, script.grimoire_effects.keys());
            for id in script.all_effect_ids() {
                // First script to claim an id keeps it
                catalog
                    .signature_names
                    .entry(id)
                    .or_insert_with(|| script.name.clone());
            }
        }

        for script in &definition.affix_scripts {
            require_name("affix script", &script.key, &script.name)?;
            catalog.warn_unknown_grimoires(&script.name, &script.compatible_grimoires);
            for &id in &script.ability_ids {
                catalog.all_affix_ids.insert(id);
                catalog
                    .affix_names
                    .entry(id)
                    .or_insert_with(|| script.name.clone());
            }
            for grimoire in &script.compatible_grimoires {
                catalog
                    .affix_ids_by_grimoire
                    .entry(grimoire.clone())
                    .or_default()
                    .extend(script.ability_ids.iter().copied());
            }
        }

        Ok(catalog)
    }

    fn add_grimoire(&mut self, def: GrimoireDefinition) -> Result<(), CatalogError> {
        require_name("grimoire", &def.key, &def.name)?;
        if self.grimoire_by_key.contains_key(&def.key) {
            return Err(CatalogError::InvalidDefinition {
                reason: format!("duplicate grimoire key '{}'", def.key),
            });
        }

        let index = self.grimoires.len();
        let mut foci = Vec::with_capacity(def.focus.len());
        for focus in def.focus {
            require_name("focus", &focus.key, &focus.name)?;
            let Some(&primary_id) = focus.ability_ids.first() else {
                return Err(CatalogError::InvalidDefinition {
                    reason: format!("focus '{}' of '{}' has no ability ids", focus.key, def.key),
                });
            };
            foci.push(Focus {
                key: focus.key,
                name: focus.name,
                primary_id,
                ability_ids: focus.ability_ids,
            });
        }

        self.claim_skill(def.id, index, SkillSlot::Base);
        for (focus_index, focus) in foci.iter().enumerate() {
            for &id in &focus.ability_ids {
                self.claim_skill(id, index, SkillSlot::Focus(focus_index));
            }
        }

        self.grimoire_by_key.insert(def.key.clone(), index);
        self.grimoires.push(Grimoire {
            key: def.key,
            name: def.name,
            id: def.id,
            foci,
        });
        Ok(())
    }

    /// Naive mapping: the first grimoire/focus to declare an id owns it
    fn claim_skill(&mut self, ability_id: i64, grimoire: usize, slot: SkillSlot) {
        if self.skills.contains_key(&ability_id) {
            tracing::debug!(ability_id, "Ability id declared twice in catalog, keeping first");
            return;
        }
        self.skills.insert(ability_id, SkillEntry { grimoire, slot });
    }

    fn warn_unknown_grimoires<'a>(&self, script: &str, keys: impl IntoIterator<Item = &'a String>) {
        for key in keys {
            if !self.grimoire_by_key.contains_key(key.as_str()) {
                tracing::warn!(script, grimoire = %key, "Script references unknown grimoire");
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn grimoires(&self) -> &[Grimoire] {
        &self.grimoires
    }

    pub fn grimoire(&self, key: &str) -> Option<&Grimoire> {
        self.grimoire_by_key.get(key).map(|&i| &self.grimoires[i])
    }

    /// Resolve an ability id to its grimoire and focus. `None` means the id is
    /// not part of the scribing system.
    pub fn lookup_skill(&self, ability_id: i64) -> Option<ScribingSkillInfo> {
        let entry = self.skills.get(&ability_id)?;
        let grimoire = &self.grimoires[entry.grimoire];
        let (transformation, transformation_type) = match entry.slot {
            SkillSlot::Base => (BASE_TRANSFORMATION, BASE_TRANSFORMATION_TYPE),
            SkillSlot::Focus(i) => (grimoire.foci[i].name.as_str(), FOCUS_TRANSFORMATION_TYPE),
        };
        Some(ScribingSkillInfo {
            ability_id,
            grimoire_key: grimoire.key.clone(),
            grimoire_name: grimoire.name.clone(),
            grimoire_id: grimoire.id,
            transformation: transformation.to_string(),
            transformation_type: transformation_type.to_string(),
        })
    }

    pub fn is_scribing_ability(&self, ability_id: i64) -> bool {
        self.skills.contains_key(&ability_id)
    }

    /// Key of the grimoire an id belongs to, base id included
    pub fn grimoire_key_of(&self, ability_id: i64) -> Option<&str> {
        self.skills
            .get(&ability_id)
            .map(|entry| self.grimoires[entry.grimoire].key.as_str())
    }

    /// Focus an id belongs to within `grimoire_key`. The grimoire's own id
    /// belongs to no focus.
    pub fn focus_of(&self, grimoire_key: &str, ability_id: i64) -> Option<&Focus> {
        let grimoire = self.grimoire(grimoire_key)?;
        if ability_id == grimoire.id {
            return None;
        }
        grimoire
            .foci
            .iter()
            .find(|focus| focus.ability_ids.contains(&ability_id))
    }

    pub fn is_signature_effect(&self, ability_id: i64) -> bool {
        self.signature_names.contains_key(&ability_id)
    }

    pub fn signature_name(&self, ability_id: i64) -> Option<&str> {
        self.signature_names.get(&ability_id).map(String::as_str)
    }

    pub fn signature_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.signature_names.keys().copied()
    }

    pub fn affix_name(&self, ability_id: i64) -> Option<&str> {
        self.affix_names.get(&ability_id).map(String::as_str)
    }

    /// Affix ids compatible with a grimoire. Falls back to every affix id
    /// when the grimoire is absent or not in the catalog.
    pub fn affix_ids_for(&self, grimoire_key: Option<&str>) -> &HashSet<i64> {
        match grimoire_key {
            Some(key) if self.grimoire_by_key.contains_key(key) => self
                .affix_ids_by_grimoire
                .get(key)
                .unwrap_or(&self.no_affix_ids),
            _ => &self.all_affix_ids,
        }
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            grimoires: self.grimoires.len(),
            foci: self.grimoires.iter().map(|g| g.foci.len()).sum(),
            skill_ids: self.skills.len(),
            signature_scripts: self.signature_script_count,
            signature_ids: self.signature_names.len(),
            affix_scripts: self.affix_script_count,
            affix_ids: self.all_affix_ids.len(),
        }
    }
}

fn require_name(what: &str, key: &str, name: &str) -> Result<(), CatalogError> {
    if key.trim().is_empty() || name.trim().is_empty() {
        return Err(CatalogError::InvalidDefinition {
            reason: format!("{what} '{key}' needs a non-empty key and name"),
        });
    }
    Ok(())
}
