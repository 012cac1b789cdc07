//! Shared test fixtures: a small catalog and event builders

use std::sync::Arc;

use crate::catalog::ScribingCatalog;
use crate::combat_log::{CombatEvent, FightEvents};

pub const PLAYER: i64 = 1;
pub const OTHER_PLAYER: i64 = 2;
pub const TARGET: i64 = 99;

pub const TRAMPLE: i64 = 1001;
pub const TRAMPLE_BASE: i64 = 1000;
pub const CONTINGENCY: i64 = 240150;
pub const BANNER_BASE: i64 = 5000;
pub const MAGICAL_BANNER: i64 = 5001;
pub const SHIELD_BANNER: i64 = 5002;
pub const SHIELD_BANNER_PULSE: i64 = 5012;

pub const LINGERING: i64 = 7001;
pub const LINGERING_TICK: i64 = 7002;
pub const SNARE: i64 = 7101;

pub const HEROISM: i64 = 61709;
pub const MINOR_PROTECTION: i64 = 61721;
pub const MAJOR_PROTECTION: i64 = 61722;
pub const ALPHA: i64 = 3001;
pub const BETA: i64 = 3002;
pub const SPLIT_A: i64 = 4001;
pub const SPLIT_B: i64 = 4002;
pub const VULNERABILITY: i64 = 106754;
pub const SHOCK: i64 = 4501;

pub const UNRELATED: i64 = 9999;

pub const CATALOG: &str = r#"
version = "fixture"

[[grimoire]]
key = "trample"
name = "Trample"
id = 1000

[[grimoire.focus]]
key = "magical-trample"
name = "Magical Trample"
ability_ids = [1001]

[[grimoire]]
key = "ulfsilds-contingency"
name = "Ulfsild's Contingency"
id = 240150

[[grimoire.focus]]
key = "healing-contingency"
name = "Healing Contingency"
ability_ids = [240151]

[[grimoire]]
key = "banner-bearer"
name = "Banner Bearer"
id = 5000

[[grimoire.focus]]
key = "magical-banner"
name = "Magical Banner"
ability_ids = [5001, 5011]

[[grimoire.focus]]
key = "shield-banner"
name = "Shield Banner"
ability_ids = [5002, 5012]

[[signature]]
key = "lingering-torment"
name = "Lingering Torment"
ability_ids = [7001, 7002]

[[signature]]
key = "hunters-snare"
name = "Hunter's Snare"
ability_ids = [7101]

[[affix]]
key = "heroism"
name = "Heroism"
ability_ids = [61709]
compatible_grimoires = ["trample", "ulfsilds-contingency", "banner-bearer"]

[[affix]]
key = "protection"
name = "Protection"
ability_ids = [61721, 61722]
compatible_grimoires = ["trample", "ulfsilds-contingency", "banner-bearer"]

[[affix]]
key = "beta"
name = "Beta"
ability_ids = [3002]
compatible_grimoires = ["trample"]

[[affix]]
key = "alpha"
name = "Alpha"
ability_ids = [3001]
compatible_grimoires = ["trample"]

[[affix]]
key = "split"
name = "Split"
ability_ids = [4001, 4002]
compatible_grimoires = ["trample"]

[[affix]]
key = "vulnerability"
name = "Vulnerability"
ability_ids = [106754]
compatible_grimoires = ["trample"]

[[affix]]
key = "shock"
name = "Shock"
ability_ids = [4501]
compatible_grimoires = ["trample"]
"#;

pub fn catalog() -> Arc<ScribingCatalog> {
    Arc::new(ScribingCatalog::from_toml_str(CATALOG).expect("fixture catalog parses"))
}

pub fn fight(events: Vec<CombatEvent>) -> FightEvents {
    FightEvents::new(1, events)
}

/// Player casts of `ability` at each timestamp
pub fn casts_at(ability: i64, times: &[i64]) -> Vec<CombatEvent> {
    times
        .iter()
        .map(|&t| CombatEvent::cast(t, PLAYER, ability))
        .collect()
}

pub fn self_buff(t: i64, ability: i64) -> CombatEvent {
    CombatEvent::buff_apply(t, PLAYER, PLAYER, ability)
}
