//! Lightweight signaling primitives for worker coordination.
//!
//! Abstracts tokio's watch channels into payload-free signal types used to
//! notify workers that an event has occurred, e.g. that a fatal write error
//! tripped the circuit breaker.

use tokio::sync::watch;

/// Transmitter side of a coordination signal channel.
pub type SignalTx = watch::Sender<()>;

/// Receiver side of a coordination signal channel.
///
/// All receivers cloned from the same channel observe the same signal, which
/// is what distinguishes this from an mpsc channel.
pub type SignalRx = watch::Receiver<()>;

/// Creates a new coordination signal channel.
pub fn create_signal() -> (SignalTx, SignalRx) {
    let (tx, rx) = watch::channel(());
    (tx, rx)
}
