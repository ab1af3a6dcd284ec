use serde::{Deserialize, Serialize};

use crate::moves::Combo;

/// What the user asked to train.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightRequest {
    pub category: String,
    pub difficulty: String,
}

impl FightRequest {
    pub fn new(category: impl Into<String>, difficulty: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            difficulty: difficulty.into(),
        }
    }
}

/// Combos for one session, plus the remaining quota when the service reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FightResponse {
    #[serde(default)]
    pub combos: Vec<Combo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fights_left: Option<u32>,
}

impl FightResponse {
    pub fn move_count(&self) -> usize {
        self.combos.iter().map(|combo| combo.moves.len()).sum()
    }

    /// An empty body with a zero quota is the service's way of saying no.
    pub fn is_quota_exhausted(&self) -> bool {
        self.fights_left == Some(0) && self.move_count() == 0
    }
}
