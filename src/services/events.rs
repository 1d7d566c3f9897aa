//! In-process realtime event hub.
//!
//! Routes publish [`EventoPortal`]s after a successful write; the SSE route
//! forwards them to connected admin pages. Delivery is fire-and-forget: no
//! acknowledgement, no replay, and slow subscribers skip what they missed.

use tokio::sync::broadcast;

use crate::domain::EventoPortal;

#[derive(Clone)]
pub struct EventHub {
    sender: broadcast::Sender<EventoPortal>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Returns how many subscribers received it.
    pub fn publish(&self, evento: EventoPortal) -> usize {
        match self.sender.send(evento) {
            Ok(receivers) => {
                tracing::debug!(receivers, "Portal event published");
                receivers
            }
            // No subscribers connected
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventoPortal> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::eventos::EVENTO_DOCUMENTO_CARGADO;

    #[test]
    fn publish_without_subscribers_is_not_an_error() {
        let hub = EventHub::new(4);
        let sent = hub.publish(EventoPortal::admin_proveedores(
            EVENTO_DOCUMENTO_CARGADO,
            1,
            "CURP",
        ));
        assert_eq!(sent, 0);
    }

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let hub = EventHub::new(4);
        let mut rx = hub.subscribe();

        hub.publish(EventoPortal::admin_proveedores(EVENTO_DOCUMENTO_CARGADO, 1, "uno"));
        hub.publish(EventoPortal::admin_proveedores(EVENTO_DOCUMENTO_CARGADO, 2, "dos"));

        assert_eq!(rx.recv().await.unwrap().id_proveedor, Some(1));
        assert_eq!(rx.recv().await.unwrap().id_proveedor, Some(2));
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_missed_events() {
        let hub = EventHub::new(1);
        let mut rx = hub.subscribe();

        hub.publish(EventoPortal::admin_proveedores(EVENTO_DOCUMENTO_CARGADO, 1, "uno"));
        hub.publish(EventoPortal::admin_proveedores(EVENTO_DOCUMENTO_CARGADO, 2, "dos"));

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        assert_eq!(rx.recv().await.unwrap().id_proveedor, Some(2));
    }
}
