//! Deterministic mapping from stored preferences to a persona block.

use serde::{Deserialize, Serialize};

use crate::design::{self, BlockId, ChoiceSet, DesignRow, DesignTable};
use crate::hash::{block_for_hash, string_hash};
use crate::preferences::PreferenceRecord;

/// The block a respondent is assigned to, with the rows that block shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedBlock {
    pub block_id: BlockId,
    /// Preference key the hash was computed from.
    pub key: String,
    pub hash: i32,
    pub rows: Vec<DesignRow>,
}

impl AssignedBlock {
    /// True when the table carries no rows for the assigned block.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn choice_sets(&self) -> Vec<ChoiceSet> {
        design::group_choice_sets(&self.rows)
    }
}

/// Block for a preference record, without touching any table.
#[must_use]
pub fn block_for_preferences(prefs: &PreferenceRecord) -> BlockId {
    block_for_hash(string_hash(&prefs.key()))
}

/// Assign a block against the embedded design table.
#[must_use]
pub fn assign_block(prefs: &PreferenceRecord) -> AssignedBlock {
    assign_block_in(design::embedded(), prefs)
}

/// Assign a block against `table`. An absent block yields an empty row list.
#[must_use]
pub fn assign_block_in(table: &DesignTable, prefs: &PreferenceRecord) -> AssignedBlock {
    let key = prefs.key();
    let hash = string_hash(&key);
    let block_id = block_for_hash(hash);
    log::debug!("preference key {key:?} hashed to {hash}, block {block_id}");

    let rows = table.block(block_id);
    if rows.is_empty() {
        log::debug!("design table has no rows for block {block_id}");
    }
    AssignedBlock {
        block_id,
        key,
        hash,
        rows,
    }
}
