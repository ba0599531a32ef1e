use axum::{
    Extension,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::StreamExt;

use crate::{
    error::{Error, Result},
    middleware::auth::AuthenticatedUser,
    models::events::NotificationEvent,
    state::AppState,
};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

fn to_sse_event(event: &NotificationEvent) -> std::result::Result<Event, serde_json::Error> {
    Ok(Event::default()
        .event(event.event_name())
        .data(serde_json::to_string(event)?))
}

/// GET /api/notifications/stream
///
/// Server-Sent Events stream of `newMessage` and `messageRead` events for the
/// caller. The token may be given as `?token=` for `EventSource` clients.
/// The connection is unregistered when the client goes away.
pub async fn notification_stream(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let subscription = state.notifier.register(auth_user.id);
    tracing::info!(
        user_id = %auth_user.id,
        connection_id = %subscription.connection_id(),
        "Notification stream opened"
    );

    let connected = to_sse_event(&NotificationEvent::Connected {
        user_id: auth_user.id,
    })
    .map_err(Error::Json)?;

    let events = subscription.filter_map(|event| match to_sse_event(&event) {
        Ok(sse_event) => Some(Ok::<_, Infallible>(sse_event)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize notification event");
            None
        }
    });

    let stream = tokio_stream::once(Ok::<_, Infallible>(connected)).chain(events);

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL)))
}
