//! Domain event emission
//!
//! Services report successful mutations through an injected [`EventSink`];
//! how events reach downstream consumers (WebSocket fan-out, queue, log) is
//! the collaborator's concern, not the core's. The sink is injected at
//! service construction so the core carries no process-wide mutable state.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Mutation kind carried by every domain event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Updated => "updated",
            EventKind::Deleted => "deleted",
        }
    }
}

/// A successful mutation, described for downstream broadcast.
#[derive(Debug, Clone, Serialize)]
pub struct DomainEvent {
    pub entity_type: &'static str,
    pub kind: EventKind,
    pub entity_id: Uuid,
    pub payload: Value,
}

impl DomainEvent {
    pub fn new(entity_type: &'static str, kind: EventKind, entity_id: Uuid, payload: Value) -> Self {
        Self {
            entity_type,
            kind,
            entity_id,
            payload,
        }
    }
}

/// Receiver of domain events emitted by the services.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: DomainEvent);
}

/// Event sink backed by a tokio broadcast channel. Lagging or absent
/// subscribers never block or fail the emitting request.
pub struct BroadcastSink {
    tx: broadcast::Sender<DomainEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe a downstream consumer (fan-out worker, test harness).
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: DomainEvent) {
        tracing::info!(
            entity_type = event.entity_type,
            kind = event.kind.as_str(),
            entity_id = %event.entity_id,
            "domain event"
        );
        // Err means no live subscribers, which is not an error for the core.
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_sink_delivers_to_subscribers() {
        let sink = BroadcastSink::new(8);
        let mut rx = sink.subscribe();
        sink.emit(DomainEvent::new(
            "parcel",
            EventKind::Created,
            Uuid::new_v4(),
            serde_json::json!({"name": "North Field"}),
        ));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.entity_type, "parcel");
        assert_eq!(event.kind, EventKind::Created);
    }

    #[test]
    fn emit_without_subscribers_does_not_panic() {
        let sink = BroadcastSink::new(8);
        sink.emit(DomainEvent::new(
            "sub_parcel",
            EventKind::Deleted,
            Uuid::new_v4(),
            Value::Null,
        ));
    }
}
