use crate::domain::event::DomainEvent;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Fan-out of domain events to the shell and any other listener.
///
/// Slow subscribers lag and lose old events rather than blocking publishers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: DomainEvent) {
        tracing::trace!(event = event.event_name(), "Publishing event");
        if let Err(e) = self.sender.send(event) {
            tracing::trace!("No subscribers for event: {}", e);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        // A run publishes several events per task
        Self::new(1024)
    }
}

pub type SharedEventBus = Arc<EventBus>;

pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::default())
}
