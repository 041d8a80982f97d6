//! What the subscriber thread hands to the UI thread.
//!
//! The channel carrying these is the only thing shared between the two.

use std::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Connected,
    Disconnected,
    /// A decoded text payload to show as an overlay.
    Text(String),
}

/// Whether the broker is currently reachable, as last reported by the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Offline,
    Online,
}

/// Sending half given to the subscriber thread. `wake` nudges the UI loop so a
/// message shows up without waiting for the next repaint.
pub struct Outbox {
    sender: mpsc::Sender<Inbound>,
    wake: Box<dyn Fn() + Send>,
}

impl std::fmt::Debug for Outbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outbox").finish_non_exhaustive()
    }
}

impl Outbox {
    /// Returns false once the UI side has gone away.
    pub fn send(&self, message: Inbound) -> bool {
        let delivered = self.sender.send(message).is_ok();
        if delivered {
            (self.wake)();
        }
        delivered
    }
}

#[must_use]
pub fn channel(wake: impl Fn() + Send + 'static) -> (Outbox, mpsc::Receiver<Inbound>) {
    let (sender, receiver) = mpsc::channel();
    (
        Outbox {
            sender,
            wake: Box::new(wake),
        },
        receiver,
    )
}
