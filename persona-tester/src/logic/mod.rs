pub mod reports;
pub mod sweep;

use persona_core::{AssignedBlock, DesignAudit, PreferenceRecord, ResolvedPreferences};
use serde::Serialize;

pub use sweep::{BlockShare, SweepGrid, SweepSummary, run_sweep};

/// Everything one tester run produced, in report order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub preferences: PreferenceRecord,
    pub resolved: ResolvedPreferences,
    pub assignment: AssignedBlock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit: Option<DesignAudit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep: Option<SweepSummary>,
}

impl RunReport {
    #[must_use]
    pub fn new(preferences: PreferenceRecord, assignment: AssignedBlock) -> Self {
        Self {
            preferences,
            resolved: preferences.resolve(),
            assignment,
            audit: None,
            sweep: None,
        }
    }

    /// Problems that fail a strict run: structural table issues, blocks the
    /// sweep never reached, and an assignment without rows.
    #[must_use]
    pub fn strict_failures(&self) -> Vec<String> {
        let mut failures = Vec::new();
        if let Some(audit) = &self.audit {
            failures.extend(audit.issues.iter().map(ToString::to_string));
        }
        if let Some(sweep) = &self.sweep {
            failures.extend(
                sweep
                    .unreachable
                    .iter()
                    .map(|block| format!("block {block} unreachable from sweep grid")),
            );
        }
        if self.assignment.is_empty() {
            failures.push(format!(
                "design table has no rows for assigned block {}",
                self.assignment.block_id
            ));
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_core::{DesignTable, assign_block, assign_block_in};

    #[test]
    fn strict_failures_flag_empty_assignment() {
        let prefs = PreferenceRecord::default();
        let report = RunReport::new(prefs, assign_block(&prefs));
        let failures = report.strict_failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("block 4"));
    }

    #[test]
    fn strict_failures_include_sweep_and_audit() {
        let prefs = PreferenceRecord {
            max_walk: Some(100.0),
            ..PreferenceRecord::default()
        };
        let mut report = RunReport::new(prefs, assign_block(&prefs));
        assert!(report.strict_failures().is_empty());

        let empty = DesignTable::empty();
        let grid = SweepGrid {
            max_fee: vec![],
            max_walk: vec![100.0],
            min_co2: vec![],
            max_day: vec![],
            mode: vec![],
        };
        report.audit = Some(empty.audit());
        report.sweep = Some(run_sweep(&empty, &grid));
        assert_eq!(report.strict_failures().len(), 5);

        report.assignment = assign_block_in(&empty, &prefs);
        assert_eq!(report.strict_failures().len(), 6);
    }
}
