//! Outbound status envelopes.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError},
};

use {
    docbridge_protocol::{ProtocolMessage, encode},
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use docbridge_metrics::{counter, envelopes, labels};

use crate::channel::HostChannel;

/// Encodes protocol messages and posts them to the host, if one is attached.
///
/// Running without a host (a plain browser tab) is normal: messages are
/// dropped and nothing is reported as an error.
#[derive(Clone, Default)]
pub struct Notifier {
    channel: Option<Arc<dyn HostChannel>>,
}

impl Notifier {
    #[must_use]
    pub fn new(channel: Option<Arc<dyn HostChannel>>) -> Self {
        Self { channel }
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.channel.is_some()
    }

    /// Returns whether the host accepted the envelope.
    pub fn notify(&self, message: &ProtocolMessage) -> bool {
        let message_type = message.type_name();
        let Some(channel) = &self.channel else {
            debug!(message_type, "no host channel attached, dropping envelope");
            #[cfg(feature = "metrics")]
            counter!(envelopes::UNDELIVERED_TOTAL, labels::MESSAGE_TYPE => message_type)
                .increment(1);
            return false;
        };

        let delivered = channel.post(&encode(message));
        if delivered {
            debug!(message_type, "posted envelope to host");
            #[cfg(feature = "metrics")]
            counter!(envelopes::SENT_TOTAL, labels::MESSAGE_TYPE => message_type).increment(1);
        } else {
            warn!(message_type, "host channel rejected envelope");
            #[cfg(feature = "metrics")]
            counter!(envelopes::UNDELIVERED_TOTAL, labels::MESSAGE_TYPE => message_type)
                .increment(1);
        }
        delivered
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("attached", &self.is_attached())
            .finish()
    }
}

// ── Outbox ──────────────────────────────────────────────────────────────────

/// Ordered queue in front of a [`Notifier`].
///
/// Messages are queued while the lifecycle lock is held, which fixes their
/// order, and posted by [`Outbox::flush`] once it is released. A slow host
/// therefore never holds up state transitions.
#[derive(Debug, Default)]
pub(crate) struct Outbox {
    notifier: Notifier,
    queue: Mutex<VecDeque<ProtocolMessage>>,
    delivering: Mutex<()>,
}

impl Outbox {
    pub(crate) fn new(notifier: Notifier) -> Self {
        Self {
            notifier,
            ..Self::default()
        }
    }

    pub(crate) fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub(crate) fn push(&self, message: ProtocolMessage) {
        lock(&self.queue).push_back(message);
    }

    /// Post everything queued, in order. When another caller is already
    /// posting, it takes over this caller's messages before it stops.
    pub(crate) fn flush(&self) {
        loop {
            let delivering = match self.delivering.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => return,
            };
            while let Some(message) = self.pop() {
                self.notifier.notify(&message);
            }
            drop(delivering);

            // A message queued after the last pop but before the guard was
            // released would otherwise be stranded.
            if lock(&self.queue).is_empty() {
                return;
            }
        }
    }

    fn pop(&self) -> Option<ProtocolMessage> {
        lock(&self.queue).pop_front()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, tokio::sync::mpsc};

    fn loaded(file_name: &str) -> ProtocolMessage {
        ProtocolMessage::Loaded {
            file_name: file_name.into(),
        }
    }

    #[test]
    fn detached_notifier_drops_silently() {
        let notifier = Notifier::default();
        assert!(!notifier.is_attached());
        assert!(!notifier.notify(&ProtocolMessage::Ready));
    }

    #[test]
    fn envelopes_are_encoded_on_the_wire() {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let notifier = Notifier::new(Some(Arc::new(tx)));

        assert!(notifier.notify(&loaded("a.xlsx")));
        assert!(notifier.notify(&ProtocolMessage::WebError {
            message: "failed to decode document data: bad".into(),
        }));

        let loaded: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(loaded, serde_json::json!({ "type": "LOADED", "fileName": "a.xlsx" }));

        let error: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(error["type"], "WEB_ERROR");
        assert_eq!(error["message"], "failed to decode document data: bad");
    }

    #[test]
    fn closed_host_is_reported() {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        drop(rx);
        let notifier = Notifier::new(Some(Arc::new(tx)));
        assert!(!notifier.notify(&ProtocolMessage::Ready));
    }

    #[test]
    fn outbox_posts_only_on_flush_and_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let outbox = Outbox::new(Notifier::new(Some(Arc::new(tx))));

        outbox.push(ProtocolMessage::Ready);
        outbox.push(loaded("a.docx"));
        assert!(rx.try_recv().is_err());

        outbox.flush();
        assert_eq!(rx.try_recv().unwrap(), r#"{"type":"READY"}"#);
        assert_eq!(rx.try_recv().unwrap(), r#"{"type":"LOADED","fileName":"a.docx"}"#);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn flush_while_another_caller_delivers_leaves_messages_queued() {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let outbox = Outbox::new(Notifier::new(Some(Arc::new(tx))));

        let delivering = outbox.delivering.lock().unwrap();
        outbox.push(loaded("a.docx"));
        outbox.flush();
        assert!(rx.try_recv().is_err());
        drop(delivering);

        outbox.flush();
        assert_eq!(rx.try_recv().unwrap(), r#"{"type":"LOADED","fileName":"a.docx"}"#);
    }
}
