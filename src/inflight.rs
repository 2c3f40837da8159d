//! In-flight request coalescing for Tier-3 generation.
//!
//! Guarantees at most one outstanding generation per normalized key.
//! The first caller for a key becomes the *leader* and runs the
//! generation; everyone else arriving while the ticket exists becomes a
//! *joiner* and awaits the leader's published outcome over a
//! `tokio::sync::watch` channel.
//!
//! The leader must call [`resolve`](InFlightCoordinator::resolve) exactly
//! once — on success or failure — which publishes the outcome and removes
//! the ticket. Joiners never wait unboundedly: [`Waiter::wait`] carries a
//! timeout, and a leader that drops its ticket sender without resolving
//! wakes joiners immediately with `None`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::watch;

/// Outcome handed to a caller that joined an existing generation.
pub struct Waiter<T> {
    rx: watch::Receiver<Option<T>>,
    timeout: Duration,
}

impl<T: Clone> Waiter<T> {
    /// Await the leader's outcome.
    ///
    /// Returns `None` if the wait times out or the leader vanished
    /// without resolving; callers treat that like a failed generation.
    pub async fn wait(mut self) -> Option<T> {
        match tokio::time::timeout(self.timeout, self.rx.wait_for(|v| v.is_some())).await {
            Ok(Ok(value)) => value.clone(),
            // Err(Elapsed) or the sender dropped unresolved.
            _ => None,
        }
    }
}

/// Result of [`InFlightCoordinator::acquire`].
pub enum Ticket<T> {
    /// No generation was running for this key; the caller now owns it
    /// and must call [`InFlightCoordinator::resolve`] when done.
    Leader,
    /// A generation is already running; await its shared outcome.
    Joiner(Waiter<T>),
}

/// Ticket table enforcing the at-most-one-in-flight invariant.
///
/// `acquire` is a test-and-set under one mutex, so two concurrent
/// callers for the same key can never both become leader.
pub struct InFlightCoordinator<T> {
    tickets: Mutex<HashMap<String, watch::Sender<Option<T>>>>,
    wait_timeout: Duration,
}

impl<T: Clone> InFlightCoordinator<T> {
    /// `wait_timeout` bounds how long joiners wait for a leader; it
    /// should exceed the generation call's own timeout by a margin.
    pub fn new(wait_timeout: Duration) -> Self {
        Self {
            tickets: Mutex::new(HashMap::new()),
            wait_timeout,
        }
    }

    /// Acquire the ticket for `key`, becoming leader or joiner.
    pub fn acquire(&self, key: &str) -> Ticket<T> {
        let mut tickets = self.tickets.lock().expect("ticket table lock poisoned");

        if let Some(tx) = tickets.get(key) {
            return Ticket::Joiner(Waiter {
                rx: tx.subscribe(),
                timeout: self.wait_timeout,
            });
        }

        let (tx, _rx) = watch::channel(None);
        tickets.insert(key.to_string(), tx);
        Ticket::Leader
    }

    /// Publish the leader's outcome to all joiners and retire the ticket.
    ///
    /// Idempotence is not provided — the leader calls this exactly once.
    /// Resolving a key with no ticket is a no-op.
    pub fn resolve(&self, key: &str, outcome: T) {
        let tx = {
            let mut tickets = self.tickets.lock().expect("ticket table lock poisoned");
            tickets.remove(key)
        };
        if let Some(tx) = tx {
            // Publish before the sender drops so late borrows still see it.
            tx.send_replace(Some(outcome));
        }
    }

    /// Number of generations currently in flight.
    pub fn in_flight_count(&self) -> usize {
        self.tickets.lock().expect("ticket table lock poisoned").len()
    }
}
