//! Single-shot result delivery
//!
//! A [`ResultSink`] wraps the caller's callback contract. The first `complete()`
//! takes the delivery out of its slot; every later call is a no-op. Clones share the
//! slot, so a cancel handler and an event pump racing each other still produce one
//! terminal result.

use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::debug;

use crate::types::{ErrorCode, TerminalResult};

type Delivery = Box<dyn FnOnce(TerminalResult) + Send>;

#[derive(Clone)]
pub struct ResultSink {
    slot: Arc<Mutex<Option<Delivery>>>,
}

impl ResultSink {
    /// Deliver the terminal result to a single closure
    pub fn new<F>(deliver: F) -> Self
    where
        F: FnOnce(TerminalResult) + Send + 'static,
    {
        Self {
            slot: Arc::new(Mutex::new(Some(Box::new(deliver)))),
        }
    }

    /// Split delivery into the onError / onSuccess callback pair
    pub fn from_callbacks<E, S>(on_error: E, on_success: S) -> Self
    where
        E: FnOnce(String, ErrorCode) + Send + 'static,
        S: FnOnce() + Send + 'static,
    {
        Self::new(move |result| match result.as_error() {
            Some((message, code)) => on_error(message.to_string(), code),
            None => on_success(),
        })
    }

    /// Deliver into a oneshot channel
    pub fn channel() -> (Self, oneshot::Receiver<TerminalResult>) {
        let (tx, rx) = oneshot::channel();
        let sink = Self::new(move |result| {
            let _ = tx.send(result);
        });
        (sink, rx)
    }

    /// Deliver `result` if nothing has been delivered yet; returns whether it was
    pub fn complete(&self, result: TerminalResult) -> bool {
        let delivery = self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        match delivery {
            Some(deliver) => {
                deliver(result);
                true
            }
            None => {
                debug!("Dropping late terminal result: {:?}", result);
                false
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_none()
    }
}

impl std::fmt::Debug for ResultSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSink")
            .field("completed", &self.is_completed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_first_result_wins() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(None));

        let sink = {
            let hits = Arc::clone(&hits);
            let seen = Arc::clone(&seen);
            ResultSink::new(move |result| {
                hits.fetch_add(1, Ordering::SeqCst);
                *seen.lock().unwrap() = Some(result);
            })
        };

        assert!(sink.complete(TerminalResult::cancelled()));
        assert!(!sink.clone().complete(TerminalResult::Success));
        assert!(!sink.complete(TerminalResult::failed("late")));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), Some(TerminalResult::cancelled()));
        assert!(sink.is_completed());
    }

    #[test]
    fn test_callbacks_are_mutually_exclusive() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let successes = Arc::new(AtomicUsize::new(0));

        let sink = {
            let errors = Arc::clone(&errors);
            let successes = Arc::clone(&successes);
            ResultSink::from_callbacks(
                move |message, code| errors.lock().unwrap().push((message, code)),
                move || {
                    successes.fetch_add(1, Ordering::SeqCst);
                },
            )
        };

        sink.complete(TerminalResult::cancelled());
        sink.complete(TerminalResult::Success);

        assert_eq!(successes.load(Ordering::SeqCst), 0);
        assert_eq!(
            *errors.lock().unwrap(),
            vec![("User Cancelled".to_string(), ErrorCode::AuthenticationCanceled)]
        );
    }

    #[tokio::test]
    async fn test_channel_delivery() {
        let (sink, rx) = ResultSink::channel();
        sink.complete(TerminalResult::Success);
        assert_eq!(rx.await.unwrap(), TerminalResult::Success);
    }

    #[tokio::test]
    async fn test_dropped_sink_closes_channel() {
        let (sink, rx) = ResultSink::channel();
        drop(sink);
        assert!(rx.await.is_err());
    }
}
