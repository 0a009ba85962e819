//! Test-only helpers shared by unit tests.

use std::sync::{Arc, Mutex};

use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Metadata, Subscriber};

/// Subscriber that records the field names of every event it sees.
#[derive(Clone, Default)]
pub(crate) struct EventFields {
    events: Arc<Mutex<Vec<Vec<String>>>>,
}

impl EventFields {
    /// Field names per recorded event, in emission order.
    pub(crate) fn events(&self) -> Vec<Vec<String>> {
        self.events.lock().unwrap().clone()
    }
}

impl Subscriber for EventFields {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let names = event
            .fields()
            .map(|field| field.name().to_owned())
            .collect();
        self.events.lock().unwrap().push(names);
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}
