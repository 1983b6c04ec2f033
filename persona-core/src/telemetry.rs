//! Best-effort reporting of persona assignments to an analytics collaborator.

use std::convert::Infallible;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::constants::{PERSONA_EVENT_NAME, PERSONA_EVENT_PARAM};
use crate::design::BlockId;

/// Event emitted once per successful assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonaEvent {
    pub name: &'static str,
    pub persona_id: BlockId,
}

impl Serialize for PersonaEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut event = serializer.serialize_struct("PersonaEvent", 2)?;
        event.serialize_field("name", self.name)?;
        event.serialize_field(PERSONA_EVENT_PARAM, &self.persona_id)?;
        event.end()
    }
}

impl PersonaEvent {
    #[must_use]
    pub const fn assigned(persona_id: BlockId) -> Self {
        Self {
            name: PERSONA_EVENT_NAME,
            persona_id,
        }
    }
}

/// Destination for analytics events.
/// Platform-specific collectors should provide this
pub trait AnalyticsSink {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Deliver one event.
    ///
    /// # Errors
    ///
    /// Returns an error if the collector rejects or cannot receive the event.
    fn send_event(&self, event: &PersonaEvent) -> Result<(), Self::Error>;
}

/// Sink used when no collector is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnalytics;

impl AnalyticsSink for NoAnalytics {
    type Error = Infallible;

    fn send_event(&self, _event: &PersonaEvent) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Send the assignment event if a sink is present. Failures are logged and
/// swallowed; the return value only says whether delivery succeeded.
pub fn report_assignment<A>(sink: Option<&A>, block: BlockId) -> bool
where
    A: AnalyticsSink,
{
    let Some(sink) = sink else {
        log::debug!("no analytics collector, skipping persona event");
        return false;
    };
    match sink.send_event(&PersonaEvent::assigned(block)) {
        Ok(()) => true,
        Err(err) => {
            log::debug!("persona event for block {block} not delivered: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSink {
        events: RefCell<Vec<PersonaEvent>>,
    }

    impl AnalyticsSink for RecordingSink {
        type Error = Infallible;

        fn send_event(&self, event: &PersonaEvent) -> Result<(), Self::Error> {
            self.events.borrow_mut().push(*event);
            Ok(())
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("collector offline")]
    struct Offline;

    struct FailingSink;

    impl AnalyticsSink for FailingSink {
        type Error = Offline;

        fn send_event(&self, _event: &PersonaEvent) -> Result<(), Self::Error> {
            Err(Offline)
        }
    }

    #[test]
    fn delivers_single_persona_event() {
        let sink = RecordingSink::default();
        let block = BlockId::new(4).unwrap();
        assert!(report_assignment(Some(&sink), block));
        let events = sink.events.borrow();
        assert_eq!(events.as_slice(), &[PersonaEvent::assigned(block)]);
        assert_eq!(events[0].name, "persona");
    }

    #[test]
    fn missing_or_failing_sink_is_skipped() {
        let block = BlockId::FIRST;
        assert!(!report_assignment::<NoAnalytics>(None, block));
        assert!(!report_assignment(Some(&FailingSink), block));
        assert!(report_assignment(Some(&NoAnalytics), block));
    }

    #[test]
    fn event_serializes_persona_id() {
        let event = PersonaEvent::assigned(BlockId::new(2).unwrap());
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json[PERSONA_EVENT_PARAM], 2);
        assert_eq!(json["persona_id"], 2);
        assert_eq!(json["name"], "persona");
        assert_eq!(json.as_object().map(serde_json::Map::len), Some(2));
    }
}
