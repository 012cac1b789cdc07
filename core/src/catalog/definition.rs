//! Scribing catalog file format
//!
//! Deserialized straight from TOML. Validation and indexing happen in
//! [`super::ScribingCatalog`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root of a catalog file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDefinition {
    #[serde(default)]
    pub version: String,

    #[serde(default, rename = "grimoire")]
    pub grimoires: Vec<GrimoireDefinition>,

    #[serde(default, rename = "signature")]
    pub signature_scripts: Vec<SignatureScriptDefinition>,

    #[serde(default, rename = "affix")]
    pub affix_scripts: Vec<AffixScriptDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrimoireDefinition {
    pub key: String,
    pub name: String,
    /// Ability id of the unmodified grimoire
    pub id: i64,

    /// Focus scripts in declaration order
    #[serde(default)]
    pub focus: Vec<FocusDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusDefinition {
    pub key: String,
    pub name: String,
    /// First entry is the focus's primary ability id
    pub ability_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureScriptDefinition {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub ability_ids: Vec<i64>,

    #[serde(default)]
    pub compatible_grimoires: Vec<String>,

    /// Sub-effects that only appear when the script is on a given grimoire
    #[serde(default)]
    pub grimoire_effects: BTreeMap<String, GrimoireEffects>,

    /// Status effects logged under their own id
    #[serde(default)]
    pub extra_effect_ids: Vec<i64>,
}

impl SignatureScriptDefinition {
    /// Every id that signals this script, including grimoire-specific ones
    pub fn all_effect_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.ability_ids
            .iter()
            .copied()
            .chain(self.grimoire_effects.values().flat_map(|fx| {
                fx.main_ability_id
                    .into_iter()
                    .chain(fx.status_effects.iter().copied())
            }))
            .chain(self.extra_effect_ids.iter().copied())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrimoireEffects {
    #[serde(default)]
    pub main_ability_id: Option<i64>,
    #[serde(default)]
    pub status_effects: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffixScriptDefinition {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub ability_ids: Vec<i64>,
    #[serde(default)]
    pub compatible_grimoires: Vec<String>,
}
