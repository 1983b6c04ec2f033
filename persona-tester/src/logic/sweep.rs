use std::collections::BTreeMap;

use persona_core::numbers::share_pct;
use persona_core::{BlockId, DesignTable, PreferenceRecord, assign_block_in};
use serde::{Deserialize, Serialize};

/// Attribute levels enumerated by a distribution sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepGrid {
    #[serde(default = "SweepGrid::default_fee")]
    pub max_fee: Vec<f64>,
    #[serde(default = "SweepGrid::default_walk")]
    pub max_walk: Vec<f64>,
    #[serde(default = "SweepGrid::default_co2")]
    pub min_co2: Vec<f64>,
    #[serde(default = "SweepGrid::default_day")]
    pub max_day: Vec<f64>,
    #[serde(default = "SweepGrid::default_mode")]
    pub mode: Vec<f64>,
}

impl Default for SweepGrid {
    fn default() -> Self {
        Self {
            max_fee: Self::default_fee(),
            max_walk: Self::default_walk(),
            min_co2: Self::default_co2(),
            max_day: Self::default_day(),
            mode: Self::default_mode(),
        }
    }
}

impl SweepGrid {
    fn default_fee() -> Vec<f64> {
        vec![0.0, 0.5, 1.0, 1.5, 2.0]
    }

    fn default_walk() -> Vec<f64> {
        vec![0.0, 50.0, 100.0, 150.0, 200.0, 250.0]
    }

    fn default_co2() -> Vec<f64> {
        vec![0.0, 20.0, 40.0, 55.0]
    }

    fn default_day() -> Vec<f64> {
        vec![0.0, 1.0, 2.0, 3.0]
    }

    fn default_mode() -> Vec<f64> {
        vec![0.0, 1.0, 2.0, 3.0]
    }

    /// Load a grid from JSON; omitted attributes keep their default levels.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a grid.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn combinations(&self) -> usize {
        [
            &self.max_fee,
            &self.max_walk,
            &self.min_co2,
            &self.max_day,
            &self.mode,
        ]
        .iter()
        .map(|levels| levels.len().max(1))
        .product()
    }

    /// Every record of the grid. An attribute with no levels is left unset.
    #[must_use]
    pub fn records(&self) -> Vec<PreferenceRecord> {
        let records = vec![PreferenceRecord::default()];
        let records = expand(records, &self.max_fee, |r, v| r.max_fee = Some(v));
        let records = expand(records, &self.max_walk, |r, v| r.max_walk = Some(v));
        let records = expand(records, &self.min_co2, |r, v| r.min_co2 = Some(v));
        let records = expand(records, &self.max_day, |r, v| r.max_day = Some(v));
        expand(records, &self.mode, |r, v| r.mode = Some(v))
    }
}

fn expand<F>(records: Vec<PreferenceRecord>, levels: &[f64], set: F) -> Vec<PreferenceRecord>
where
    F: Fn(&mut PreferenceRecord, f64),
{
    if levels.is_empty() {
        return records;
    }
    let mut expanded = Vec::with_capacity(records.len() * levels.len());
    for base in records {
        for &level in levels {
            let mut record = base;
            set(&mut record, level);
            expanded.push(record);
        }
    }
    expanded
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockShare {
    pub block_id: BlockId,
    pub assignments: usize,
    pub share_pct: f64,
    /// Assignments that found no rows for this block in the table.
    pub empty_assignments: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepSummary {
    pub total: usize,
    pub blocks: Vec<BlockShare>,
    pub unreachable: Vec<BlockId>,
    pub empty_assignments: usize,
}

impl SweepSummary {
    #[must_use]
    pub fn all_blocks_reachable(&self) -> bool {
        self.unreachable.is_empty()
    }
}

/// Assign every grid record against `table` and tally blocks.
#[must_use]
pub fn run_sweep(table: &DesignTable, grid: &SweepGrid) -> SweepSummary {
    let mut counts: BTreeMap<BlockId, (usize, usize)> =
        BlockId::all().map(|block| (block, (0, 0))).collect();
    let records = grid.records();
    for prefs in &records {
        let assigned = assign_block_in(table, prefs);
        let entry = counts.entry(assigned.block_id).or_default();
        entry.0 += 1;
        if assigned.is_empty() {
            entry.1 += 1;
        }
    }

    let total = records.len();
    let blocks: Vec<BlockShare> = counts
        .iter()
        .map(|(&block_id, &(assignments, empty_assignments))| BlockShare {
            block_id,
            assignments,
            share_pct: share_pct(assignments, total),
            empty_assignments,
        })
        .collect();
    let unreachable = blocks
        .iter()
        .filter(|share| share.assignments == 0)
        .map(|share| share.block_id)
        .collect();
    let empty_assignments = blocks.iter().map(|share| share.empty_assignments).sum();

    SweepSummary {
        total,
        blocks,
        unreachable,
        empty_assignments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_reaches_every_block() {
        let grid = SweepGrid::default();
        assert_eq!(grid.combinations(), 1_920);
        let summary = run_sweep(persona_core::design::embedded(), &grid);
        assert_eq!(summary.total, 1_920);
        assert!(summary.all_blocks_reachable());
        assert_eq!(summary.blocks[0].assignments, 323);
        // Only block 1 ships rows in the embedded table.
        assert_eq!(summary.blocks[0].empty_assignments, 0);
        assert_eq!(summary.empty_assignments, 1_920 - 323);
    }

    #[test]
    fn single_record_grid_reaches_one_block() {
        let grid = SweepGrid {
            max_fee: vec![],
            max_walk: vec![100.0],
            min_co2: vec![],
            max_day: vec![],
            mode: vec![],
        };
        let records = grid.records();
        assert_eq!(grid.combinations(), 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key(), "0100003");

        let summary = run_sweep(&DesignTable::empty(), &grid);
        assert_eq!(summary.unreachable.len(), 5);
        assert_eq!(summary.blocks[0].assignments, 1);
        assert!((summary.blocks[0].share_pct - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn grid_json_keeps_defaults_for_missing_axes() {
        let grid = SweepGrid::from_json(r#"{"mode": [1, 2]}"#).unwrap();
        assert_eq!(grid.mode, vec![1.0, 2.0]);
        assert_eq!(grid.max_walk, SweepGrid::default_walk());
        assert_eq!(grid.combinations(), 5 * 6 * 4 * 4 * 2);
    }
}
