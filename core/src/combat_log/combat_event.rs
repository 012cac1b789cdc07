use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuraKind {
    #[default]
    Buff,
    Debuff,
}

/// Kind-specific payload of a combat event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Cast {
        /// Inferred from buff applications rather than read from the log
        #[serde(default)]
        synthetic: bool,
    },
    BuffApply {
        #[serde(default)]
        aura: AuraKind,
        #[serde(default)]
        stacks: u32,
    },
    BuffRemove {
        #[serde(default)]
        aura: AuraKind,
    },
    Damage {
        #[serde(default)]
        amount: i64,
        #[serde(default)]
        critical: bool,
    },
    Heal {
        #[serde(default)]
        amount: i64,
        #[serde(default)]
        overheal: i64,
    },
    ResourceChange {
        #[serde(default)]
        resource: i32,
        /// Negative when a resource was spent
        delta: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatEvent {
    /// Milliseconds, monotonic within a fight
    pub timestamp: i64,
    pub source_id: i64,
    #[serde(default)]
    pub target_id: i64,
    pub ability_id: i64,
    /// Set when the effect is already attributed to another ability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_ability_id: Option<i64>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl CombatEvent {
    pub fn cast(timestamp: i64, source_id: i64, ability_id: i64) -> Self {
        Self {
            timestamp,
            source_id,
            target_id: source_id,
            ability_id,
            secondary_ability_id: None,
            kind: EventKind::Cast { synthetic: false },
        }
    }

    /// Synthetic cast standing in for a cast the log never recorded
    pub fn synthetic_cast(timestamp: i64, source_id: i64, target_id: i64, ability_id: i64) -> Self {
        Self {
            timestamp,
            source_id,
            target_id,
            ability_id,
            secondary_ability_id: None,
            kind: EventKind::Cast { synthetic: true },
        }
    }

    pub fn buff_apply(timestamp: i64, source_id: i64, target_id: i64, ability_id: i64) -> Self {
        Self {
            timestamp,
            source_id,
            target_id,
            ability_id,
            secondary_ability_id: None,
            kind: EventKind::BuffApply {
                aura: AuraKind::Buff,
                stacks: 1,
            },
        }
    }

    pub fn debuff_apply(timestamp: i64, source_id: i64, target_id: i64, ability_id: i64) -> Self {
        Self {
            kind: EventKind::BuffApply {
                aura: AuraKind::Debuff,
                stacks: 1,
            },
            ..Self::buff_apply(timestamp, source_id, target_id, ability_id)
        }
    }

    pub fn damage(
        timestamp: i64,
        source_id: i64,
        target_id: i64,
        ability_id: i64,
        amount: i64,
    ) -> Self {
        Self {
            timestamp,
            source_id,
            target_id,
            ability_id,
            secondary_ability_id: None,
            kind: EventKind::Damage {
                amount,
                critical: false,
            },
        }
    }

    pub fn heal(
        timestamp: i64,
        source_id: i64,
        target_id: i64,
        ability_id: i64,
        amount: i64,
    ) -> Self {
        Self {
            timestamp,
            source_id,
            target_id,
            ability_id,
            secondary_ability_id: None,
            kind: EventKind::Heal {
                amount,
                overheal: 0,
            },
        }
    }

    pub fn resource_change(timestamp: i64, source_id: i64, ability_id: i64, delta: i64) -> Self {
        Self {
            timestamp,
            source_id,
            target_id: source_id,
            ability_id,
            secondary_ability_id: None,
            kind: EventKind::ResourceChange { resource: 0, delta },
        }
    }

    pub fn with_secondary(mut self, secondary_ability_id: i64) -> Self {
        self.secondary_ability_id = Some(secondary_ability_id);
        self
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self.kind, EventKind::Cast { synthetic: true })
    }

    /// Resource delta, zero for every non-resource event
    pub fn resource_delta(&self) -> i64 {
        match self.kind {
            EventKind::ResourceChange { delta, .. } => delta,
            _ => 0,
        }
    }
}
