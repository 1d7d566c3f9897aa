//! Server-sent events for the admin supplier page

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::app::AppState;
use crate::auth::RequireAdmin;
use crate::domain::EventoPortal;

fn a_evento(evento: &EventoPortal) -> Event {
    match Event::default().event(&evento.evento).json_data(evento) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode portal event");
            Event::default().comment("evento omitido")
        }
    }
}

/// Turn a broadcast receiver into an SSE stream. Lagged receivers skip ahead;
/// the stream ends when the hub is dropped.
fn stream_de(
    receiver: broadcast::Receiver<EventoPortal>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(evento) => return Some((Ok(a_evento(&evento)), receiver)),
                Err(RecvError::Lagged(perdidos)) => {
                    tracing::warn!(perdidos, "SSE subscriber lagged, events skipped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

/// GET /api/eventos
pub async fn stream_eventos(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!(admin_id = admin.user_id, "Admin subscribed to portal events");
    Sse::new(stream_de(state.events.subscribe())).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::eventos::EVENTO_ESTATUS_REVISION;
    use crate::services::EventHub;
    use futures::StreamExt;

    #[tokio::test]
    async fn stream_forwards_published_events() {
        let hub = EventHub::new(8);
        let stream = stream_de(hub.subscribe());
        futures::pin_mut!(stream);

        hub.publish(EventoPortal::admin_proveedores(
            EVENTO_ESTATUS_REVISION,
            3,
            "APROBADO",
        ));
        drop(hub);

        assert!(stream.next().await.is_some());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn lagged_subscribers_skip_ahead() {
        let hub = EventHub::new(1);
        let stream = stream_de(hub.subscribe());
        futures::pin_mut!(stream);

        for id in 1..=3 {
            hub.publish(EventoPortal::admin_proveedores(
                EVENTO_ESTATUS_REVISION,
                id,
                "cambio",
            ));
        }
        drop(hub);

        // Only the newest event survives a capacity-1 channel
        assert!(stream.next().await.is_some());
        assert!(stream.next().await.is_none());
    }
}
