//! Session lifecycle notifications.
//!
//! The gateway never navigates; it announces what happened and the
//! application shell decides where to go.

use tokio::sync::broadcast;
use tracing::debug;

/// Route the shell shows once a session has expired.
pub const LOGIN_ROUTE: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A request came back 401; the token has already been cleared.
    Expired { url: String },
    LoggedIn,
    LoggedOut,
}

impl SessionEvent {
    /// Where the shell should navigate in response, if anywhere.
    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            SessionEvent::Expired { .. } | SessionEvent::LoggedOut => Some(LOGIN_ROUTE),
            SessionEvent::LoggedIn => None,
        }
    }
}

#[derive(Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish `event`; returns how many subscribers received it.
    pub fn emit(&self, event: SessionEvent) -> usize {
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                debug!(?event, "session event dropped; no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let events = SessionEvents::default();
        let mut rx = events.subscribe();

        assert_eq!(events.emit(SessionEvent::LoggedIn), 1);
        assert_eq!(events.emit(SessionEvent::Expired { url: "http://x/client".into() }), 1);

        assert_eq!(rx.recv().await.unwrap(), SessionEvent::LoggedIn);
        let expired = rx.recv().await.unwrap();
        assert_eq!(expired.redirect_target(), Some(LOGIN_ROUTE));
    }

    #[test]
    fn emit_without_subscribers_is_harmless() {
        let events = SessionEvents::default();
        assert_eq!(events.emit(SessionEvent::LoggedOut), 0);
    }

    #[test]
    fn login_does_not_redirect() {
        assert_eq!(SessionEvent::LoggedIn.redirect_target(), None);
    }
}
