//! # Change Notifier Module
//!
//! Pushes catalog availability changes to connected clients over WebSocket.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Change Notifier Flow                              │
//! │                                                                         │
//! │  Circulation commit                                                     │
//! │       │                                                                 │
//! │       │  notifier.book_updated(book)        fire-and-forget             │
//! │       ▼                                                                 │
//! │  ┌─────────────────┐      broadcast       ┌──────────────────────────┐ │
//! │  │  ChangeNotifier │ ───────────────────► │  /ws subscribers         │ │
//! │  │  (tokio         │                      │  {"event":"book-updated",│ │
//! │  │   broadcast)    │                      │   "book":{...}}          │ │
//! │  └─────────────────┘                      └──────────────────────────┘ │
//! │                                                                         │
//! │  Delivery is best-effort: a failed or lagging subscriber never          │
//! │  affects the circulation operation that produced the event.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::AppState;
use biblio_core::Book;

/// Buffered events per subscriber before lagging ones drop messages.
const EVENT_BUFFER: usize = 64;

/// A catalog change event, serialized to every WebSocket subscriber.
#[derive(Debug, Clone, Serialize)]
pub struct BookEvent {
    /// Event name. Currently always `book-updated`.
    pub event: &'static str,
    /// The book in its post-transition state.
    pub book: Book,
}

/// In-process fan-out for catalog change events.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<BookEvent>,
}

impl ChangeNotifier {
    /// Creates a notifier with a fresh broadcast channel.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        ChangeNotifier { tx }
    }

    /// Publishes a book-updated event. Never fails; with no subscribers the
    /// event is simply dropped.
    pub fn book_updated(&self, book: Book) {
        let event = BookEvent {
            event: "book-updated",
            book,
        };

        let receivers = self.tx.send(event).unwrap_or(0);
        debug!(receivers, "Published book-updated event");
    }

    /// Subscribes to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<BookEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// WebSocket Endpoint
// =============================================================================

/// `GET /ws` upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let rx = state.notifier.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, rx))
}

/// Forwards broadcast events to one connected client until it disconnects.
async fn handle_socket(socket: WebSocket, mut rx: broadcast::Receiver<BookEvent>) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        let payload = match serde_json::to_string(&event) {
                            Ok(json) => json,
                            Err(e) => {
                                warn!(?e, "Failed to serialize book event");
                                continue;
                            }
                        };
                        if sender.send(Message::Text(payload.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "WebSocket subscriber lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            // Clients only listen; drain their frames and notice disconnects
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    debug!("WebSocket subscriber disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn book() -> Book {
        let now = Utc::now();
        Book {
            id: "b1".to_string(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            category: "Sci-Fi".to_string(),
            is_available: true,
            borrowed_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let notifier = ChangeNotifier::new();
        let mut rx = notifier.subscribe();

        notifier.book_updated(book());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, "book-updated");
        assert_eq!(event.book.id, "b1");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let notifier = ChangeNotifier::new();
        // Must not panic or block
        notifier.book_updated(book());
    }
}
