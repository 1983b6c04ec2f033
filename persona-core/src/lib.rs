//! Persona Block Engine
//!
//! Deterministic assignment of survey respondents to one of six persona
//! blocks of a discrete-choice experiment. The block is derived from a hash
//! of the respondent's stored preferences, and the block's rows are read
//! from a design table embedded at build time.

pub mod constants;
pub mod design;
pub mod hash;
pub mod numbers;
pub mod preferences;
pub mod selector;
pub mod telemetry;

// Re-export commonly used types
pub use design::{BlockId, ChoiceSet, DesignAudit, DesignIssue, DesignRow, DesignTable};
pub use hash::{block_for_hash, string_hash};
pub use preferences::{PreferenceRecord, ResolvedPreferences};
pub use selector::{AssignedBlock, assign_block, assign_block_in, block_for_preferences};
pub use telemetry::{AnalyticsSink, NoAnalytics, PersonaEvent, report_assignment};

/// Trait for abstracting where stored preferences come from
/// Platform-specific implementations should provide this
pub trait PreferenceSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the respondent's preference record
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load_preferences(&self) -> Result<PreferenceRecord, Self::Error>;
}

/// Preference source over a fixed, already-known record.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticPreferences(pub PreferenceRecord);

impl PreferenceSource for StaticPreferences {
    type Error = std::convert::Infallible;

    fn load_preferences(&self) -> Result<PreferenceRecord, Self::Error> {
        Ok(self.0)
    }
}

/// Startup entry point: reads preferences once, assigns a block and reports
/// it. The caller keeps the returned [`AssignedBlock`] for the rest of the
/// session.
pub struct PersonaEngine<'t, P, A = NoAnalytics>
where
    P: PreferenceSource,
    A: AnalyticsSink,
{
    preferences: P,
    analytics: Option<A>,
    table: &'t DesignTable,
}

impl<P> PersonaEngine<'static, P, NoAnalytics>
where
    P: PreferenceSource,
{
    /// Create an engine over the embedded design table with no analytics
    #[must_use]
    pub fn new(preferences: P) -> Self {
        Self {
            preferences,
            analytics: None,
            table: design::embedded(),
        }
    }
}

impl<'t, P, A> PersonaEngine<'t, P, A>
where
    P: PreferenceSource,
    A: AnalyticsSink,
{
    /// Use a different design table, e.g. a fully populated one loaded from disk
    #[must_use]
    pub fn with_table<'u>(self, table: &'u DesignTable) -> PersonaEngine<'u, P, A> {
        PersonaEngine {
            preferences: self.preferences,
            analytics: self.analytics,
            table,
        }
    }

    /// Report assignments to `sink`
    #[must_use]
    pub fn with_analytics<B>(self, sink: B) -> PersonaEngine<'t, P, B>
    where
        B: AnalyticsSink,
    {
        PersonaEngine {
            preferences: self.preferences,
            analytics: Some(sink),
            table: self.table,
        }
    }

    #[must_use]
    pub const fn table(&self) -> &'t DesignTable {
        self.table
    }

    /// Read preferences, substituting the empty record if the source fails
    #[must_use]
    pub fn load_preferences(&self) -> PreferenceRecord {
        self.preferences.load_preferences().unwrap_or_else(|err| {
            log::warn!("preference source unavailable, using defaults: {err}");
            PreferenceRecord::default()
        })
    }

    /// Assign the persona block for the stored preferences
    #[must_use]
    pub fn initialize(&self) -> AssignedBlock {
        let prefs = self.load_preferences();
        let assigned = assign_block_in(self.table, &prefs);
        report_assignment(self.analytics.as_ref(), assigned.block_id);
        log::info!("persona block loaded: {}", assigned.block_id);
        assigned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Debug, thiserror::Error)]
    #[error("store locked")]
    struct Locked;

    struct BrokenStore;

    impl PreferenceSource for BrokenStore {
        type Error = Locked;

        fn load_preferences(&self) -> Result<PreferenceRecord, Self::Error> {
            Err(Locked)
        }
    }

    #[derive(Clone, Default)]
    struct MemorySink {
        events: Rc<RefCell<Vec<PersonaEvent>>>,
    }

    impl AnalyticsSink for MemorySink {
        type Error = Infallible;

        fn send_event(&self, event: &PersonaEvent) -> Result<(), Self::Error> {
            self.events.borrow_mut().push(*event);
            Ok(())
        }
    }

    fn walk_100() -> PreferenceRecord {
        PreferenceRecord {
            max_walk: Some(100.0),
            ..PreferenceRecord::default()
        }
    }

    #[test]
    fn engine_assigns_and_reports_once() {
        let sink = MemorySink::default();
        let engine = PersonaEngine::new(StaticPreferences(walk_100())).with_analytics(sink.clone());
        let assigned = engine.initialize();

        assert_eq!(assigned.block_id, BlockId::FIRST);
        assert_eq!(assigned.len(), 6);
        assert_eq!(
            sink.events.borrow().as_slice(),
            &[PersonaEvent::assigned(BlockId::FIRST)]
        );
    }

    #[test]
    fn failing_source_falls_back_to_defaults() {
        let engine = PersonaEngine::new(BrokenStore);
        let assigned = engine.initialize();
        assert_eq!(assigned.key, "00003");
        assert_eq!(assigned, assign_block(&PreferenceRecord::default()));
    }

    #[test]
    fn custom_table_is_used() {
        let table = DesignTable::empty();
        let engine = PersonaEngine::new(StaticPreferences(walk_100())).with_table(&table);
        assert!(engine.table().is_empty());
        let assigned = engine.initialize();
        assert_eq!(assigned.block_id, BlockId::FIRST);
        assert!(assigned.is_empty());
    }

    #[test]
    fn repeated_initialization_is_stable() {
        let engine = PersonaEngine::new(StaticPreferences(walk_100()));
        assert_eq!(engine.initialize(), engine.initialize());
    }
}
