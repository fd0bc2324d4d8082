//! Event sink that captures raised events for assertions.

use async_trait::async_trait;
use tokio::sync::Mutex;
use veridian_auth::events::{Event, EventSink};

/// Records every raised event in order.
#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingEventSink {
    /// An empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of the events raised so far.
    pub async fn events(&self) -> Vec<Event> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn raise(&self, event: Event) {
        self.events.lock().await.push(event);
    }
}
