//! Discrete-choice design rows grouped into persona blocks.
//!
//! The table is read-only after load. An incomplete table (blocks absent from
//! the asset) is a data concern: lookups for an absent block yield no rows.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{ALTS_PER_SET, BLOCK_COUNT, EMBEDDED_DESIGN_JSON, SETS_PER_BLOCK};

/// Identifier of one persona block, always within `1..=BLOCK_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct BlockId(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("block id {0} outside 1..={max}", max = BLOCK_COUNT)]
pub struct InvalidBlockId(pub u8);

impl BlockId {
    pub const FIRST: Self = Self(1);

    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value >= 1 && value <= BLOCK_COUNT {
            Some(Self(value))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Every block of a complete design, in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=BLOCK_COUNT).map(Self)
    }
}

impl TryFrom<u8> for BlockId {
    type Error = InvalidBlockId;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidBlockId(value))
    }
}

impl From<BlockId> for u8 {
    fn from(value: BlockId) -> Self {
        value.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One alternative within one choice set of one persona block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignRow {
    #[serde(rename = "BlockID")]
    pub block_id: u8,
    #[serde(rename = "Set")]
    pub set: u8,
    #[serde(rename = "Alt")]
    pub alt: u8,
    #[serde(rename = "Cost")]
    pub cost: f64,
    /// Walking distance in meters.
    #[serde(rename = "Walk")]
    pub walk: u32,
    #[serde(rename = "CO2save")]
    pub co2_save: u32,
    /// Delivery reliability as a percentage.
    #[serde(rename = "Reliability")]
    pub reliability: u8,
    #[serde(rename = "Resched")]
    pub resched: u32,
    #[serde(rename = "Noise")]
    pub noise: u32,
    #[serde(rename = "ModeFlag")]
    pub mode_flag: u8,
}

impl DesignRow {
    #[must_use]
    pub const fn key(&self) -> (u8, u8, u8) {
        (self.block_id, self.set, self.alt)
    }

    #[must_use]
    pub fn in_block(&self, block: BlockId) -> bool {
        self.block_id == block.get()
    }
}

/// Alternatives presented together in one survey question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceSet {
    pub set: u8,
    pub alternatives: Vec<DesignRow>,
}

/// Structural violations found while auditing a design table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DesignIssue {
    #[error("row {index}: block {block} outside 1..={max}", max = BLOCK_COUNT)]
    BlockOutOfRange { index: usize, block: u8 },
    #[error("row {index}: alternative {alt} outside 1..={max}", max = ALTS_PER_SET)]
    AltOutOfRange { index: usize, alt: u8 },
    #[error("row {index}: duplicate (block {block}, set {set}, alt {alt}) of row {first}")]
    DuplicateKey {
        index: usize,
        first: usize,
        block: u8,
        set: u8,
        alt: u8,
    },
    #[error("block {block} set {set} has {count} alternatives, expected {expected}", expected = ALTS_PER_SET)]
    SetSize { block: u8, set: u8, count: usize },
}

/// Summary of a table's structure and completeness.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DesignAudit {
    pub row_count: usize,
    #[serde(serialize_with = "serialize_issues")]
    pub issues: Vec<DesignIssue>,
    pub missing_blocks: Vec<BlockId>,
    /// Number of distinct choice sets per block present in the table.
    pub sets_per_block: BTreeMap<u8, usize>,
}

fn serialize_issues<S>(issues: &[DesignIssue], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(issues.iter().map(ToString::to_string))
}

impl DesignAudit {
    /// True when no structural issue was found. Missing blocks do not count.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// True when the table is valid and every block carries a full set list.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.is_valid()
            && self.missing_blocks.is_empty()
            && BlockId::all().all(|block| {
                self.sets_per_block.get(&block.get()).copied() == Some(SETS_PER_BLOCK)
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct DesignTable {
    rows: Vec<DesignRow>,
}

impl DesignTable {
    #[must_use]
    pub const fn empty() -> Self {
        Self { rows: Vec::new() }
    }

    #[must_use]
    pub const fn from_rows(rows: Vec<DesignRow>) -> Self {
        Self { rows }
    }

    /// Load a design table from a JSON array of rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into design rows.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse the design asset compiled into the crate, falling back to an
    /// empty table if the asset is malformed.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(EMBEDDED_DESIGN_JSON).unwrap_or_else(|err| {
            log::warn!("embedded design table is malformed, using an empty table: {err}");
            Self::empty()
        })
    }

    #[must_use]
    pub fn rows(&self) -> &[DesignRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DesignRow> {
        self.rows.iter()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of one block in table order.
    pub fn block_rows(&self, block: BlockId) -> impl Iterator<Item = &DesignRow> + '_ {
        self.rows.iter().filter(move |row| row.in_block(block))
    }

    #[must_use]
    pub fn block(&self, block: BlockId) -> Vec<DesignRow> {
        self.block_rows(block).cloned().collect()
    }

    /// Blocks that have at least one row.
    #[must_use]
    pub fn present_blocks(&self) -> BTreeSet<BlockId> {
        self.rows
            .iter()
            .filter_map(|row| BlockId::new(row.block_id))
            .collect()
    }

    #[must_use]
    pub fn missing_blocks(&self) -> Vec<BlockId> {
        let present = self.present_blocks();
        BlockId::all()
            .filter(|block| !present.contains(block))
            .collect()
    }

    /// Group a block's rows into choice sets, ordered by first appearance.
    #[must_use]
    pub fn choice_sets(&self, block: BlockId) -> Vec<ChoiceSet> {
        group_choice_sets(self.block_rows(block))
    }

    /// Check the row keys and set sizes and report block coverage.
    #[must_use]
    pub fn audit(&self) -> DesignAudit {
        let mut issues = Vec::new();
        let mut seen: BTreeMap<(u8, u8, u8), usize> = BTreeMap::new();
        let mut set_sizes: BTreeMap<(u8, u8), usize> = BTreeMap::new();

        for (index, row) in self.rows.iter().enumerate() {
            if BlockId::new(row.block_id).is_none() {
                issues.push(DesignIssue::BlockOutOfRange {
                    index,
                    block: row.block_id,
                });
            }
            if row.alt == 0 || row.alt > ALTS_PER_SET {
                issues.push(DesignIssue::AltOutOfRange {
                    index,
                    alt: row.alt,
                });
            }
            if let Some(&first) = seen.get(&row.key()) {
                issues.push(DesignIssue::DuplicateKey {
                    index,
                    first,
                    block: row.block_id,
                    set: row.set,
                    alt: row.alt,
                });
                continue;
            }
            seen.insert(row.key(), index);
            *set_sizes.entry((row.block_id, row.set)).or_default() += 1;
        }

        let mut sets_per_block: BTreeMap<u8, usize> = BTreeMap::new();
        for (&(block, set), &count) in &set_sizes {
            *sets_per_block.entry(block).or_default() += 1;
            if count != usize::from(ALTS_PER_SET) {
                issues.push(DesignIssue::SetSize { block, set, count });
            }
        }

        DesignAudit {
            row_count: self.rows.len(),
            issues,
            missing_blocks: self.missing_blocks(),
            sets_per_block,
        }
    }
}

impl<'a> IntoIterator for &'a DesignTable {
    type Item = &'a DesignRow;
    type IntoIter = std::slice::Iter<'a, DesignRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub(crate) fn group_choice_sets<'a, I>(rows: I) -> Vec<ChoiceSet>
where
    I: IntoIterator<Item = &'a DesignRow>,
{
    let mut sets: Vec<ChoiceSet> = Vec::new();
    for row in rows {
        if let Some(existing) = sets.iter_mut().find(|s| s.set == row.set) {
            existing.alternatives.push(row.clone());
        } else {
            sets.push(ChoiceSet {
                set: row.set,
                alternatives: vec![row.clone()],
            });
        }
    }
    sets
}

/// Process-wide design table parsed from the embedded asset on first use.
#[must_use]
pub fn embedded() -> &'static DesignTable {
    static TABLE: OnceLock<DesignTable> = OnceLock::new();
    TABLE.get_or_init(DesignTable::load_from_static)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(block_id: u8, set: u8, alt: u8) -> DesignRow {
        DesignRow {
            block_id,
            set,
            alt,
            cost: 0.0,
            walk: 0,
            co2_save: 0,
            reliability: 75,
            resched: 2,
            noise: 0,
            mode_flag: 0,
        }
    }

    fn full_set(block_id: u8, set: u8) -> Vec<DesignRow> {
        (1..=ALTS_PER_SET).map(|alt| row(block_id, set, alt)).collect()
    }

    #[test]
    fn parses_row_wire_names() {
        let json = r#"[
            {"BlockID": 2, "Set": 3, "Alt": 1, "Cost": 0.5, "Walk": 100, "CO2save": 40,
             "Reliability": 90, "Resched": 2, "Noise": 30, "ModeFlag": 1}
        ]"#;
        let table = DesignTable::from_json(json).unwrap();
        assert_eq!(table.len(), 1);
        let parsed = &table.rows()[0];
        assert_eq!(parsed.key(), (2, 3, 1));
        assert!((parsed.cost - 0.5).abs() < f64::EPSILON);
        assert_eq!(parsed.walk, 100);
        assert_eq!(parsed.co2_save, 40);
        assert_eq!(parsed.mode_flag, 1);
    }

    #[test]
    fn rejects_missing_fields() {
        let json = r#"[{"BlockID": 1, "Set": 1, "Alt": 1}]"#;
        assert!(DesignTable::from_json(json).is_err());
    }

    #[test]
    fn block_id_bounds() {
        assert!(BlockId::new(0).is_none());
        assert!(BlockId::new(7).is_none());
        assert_eq!(BlockId::new(6).map(BlockId::get), Some(6));
        assert_eq!(BlockId::all().count(), usize::from(BLOCK_COUNT));
        assert_eq!(BlockId::try_from(9), Err(InvalidBlockId(9)));
    }

    #[test]
    fn block_id_serializes_as_number() {
        let block = BlockId::new(3).unwrap();
        assert_eq!(serde_json::to_string(&block).unwrap(), "3");
        assert!(serde_json::from_str::<BlockId>("0").is_err());
    }

    #[test]
    fn block_lookup_preserves_order_and_tolerates_absent_blocks() {
        let mut rows = full_set(2, 2);
        rows.extend(full_set(1, 1));
        rows.extend(full_set(2, 1));
        let table = DesignTable::from_rows(rows);

        let block_two = table.block(BlockId::new(2).unwrap());
        let keys: Vec<_> = block_two.iter().map(|r| (r.set, r.alt)).collect();
        assert_eq!(keys, vec![(2, 1), (2, 2), (2, 3), (1, 1), (1, 2), (1, 3)]);
        assert!(table.block(BlockId::new(5).unwrap()).is_empty());
    }

    #[test]
    fn choice_sets_group_by_first_appearance() {
        let mut rows = full_set(1, 4);
        rows.extend(full_set(1, 2));
        let table = DesignTable::from_rows(rows);
        let sets = table.choice_sets(BlockId::FIRST);
        assert_eq!(sets.iter().map(|s| s.set).collect::<Vec<_>>(), vec![4, 2]);
        assert!(sets.iter().all(|s| s.alternatives.len() == 3));
    }

    #[test]
    fn audit_flags_structural_issues() {
        let mut rows = full_set(1, 1);
        rows.push(row(1, 1, 2));
        rows.push(row(7, 1, 1));
        rows.push(row(2, 1, 4));
        let audit = DesignTable::from_rows(rows).audit();

        assert!(!audit.is_valid());
        assert!(audit.issues.contains(&DesignIssue::DuplicateKey {
            index: 3,
            first: 1,
            block: 1,
            set: 1,
            alt: 2,
        }));
        assert!(
            audit
                .issues
                .contains(&DesignIssue::BlockOutOfRange { index: 4, block: 7 })
        );
        assert!(
            audit
                .issues
                .contains(&DesignIssue::AltOutOfRange { index: 5, alt: 4 })
        );
        assert!(audit.issues.contains(&DesignIssue::SetSize {
            block: 2,
            set: 1,
            count: 1,
        }));
    }

    #[test]
    fn audit_reports_completeness() {
        let mut rows = Vec::new();
        for block in 1..=BLOCK_COUNT {
            for set in 1..=6 {
                rows.extend(full_set(block, set));
            }
        }
        let complete = DesignTable::from_rows(rows.clone()).audit();
        assert!(complete.is_complete());
        assert_eq!(complete.row_count, 108);

        rows.retain(|r| r.block_id != 3);
        let partial = DesignTable::from_rows(rows).audit();
        assert!(partial.is_valid());
        assert!(!partial.is_complete());
        assert_eq!(partial.missing_blocks, vec![BlockId::new(3).unwrap()]);
    }

    #[test]
    fn embedded_table_parses() {
        let table = embedded();
        assert_eq!(table.len(), 6);
        assert!(table.audit().is_valid());
        assert_eq!(
            table.present_blocks().into_iter().collect::<Vec<_>>(),
            vec![BlockId::FIRST]
        );
    }
}
