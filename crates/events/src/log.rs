//! Structured-log event sink.
//!
//! [`EventLog`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! broadcast channel and emits every received [`DomainEvent`] to the
//! tracing pipeline. It runs as a long-lived background task and shuts
//! down gracefully when the bus sender is dropped.

use tokio::sync::broadcast;

use crate::bus::DomainEvent;

/// Background service that logs every domain event.
pub struct EventLog;

impl EventLog {
    /// Run the logging loop.
    ///
    /// Subscribes via the provided `receiver` and logs every event it
    /// receives. The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](crate::bus::EventBus) is dropped).
    pub async fn run(mut receiver: broadcast::Receiver<DomainEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    tracing::info!(
                        event_type = %event.event_type,
                        entity_type = event.source_entity_type.as_deref().unwrap_or("-"),
                        entity_id = event.source_entity_id.as_deref().unwrap_or("-"),
                        actor = event.actor.as_deref().unwrap_or("-"),
                        "domain event"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event log lagged, some events were not logged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, event log shutting down");
                    break;
                }
            }
        }
    }
}
