//! Pipeline lifecycle phases and the controller that drives them.
//!
//! The pipeline moves through three phases, broadcast over a watch channel so
//! every worker observes transitions without polling shared state:
//!
//! `Running` -> `Draining` -> `Terminated`
//!
//! Transitions are one way. Requesting an earlier phase after a later one has
//! been reached is a no-op.

use tokio::sync::watch;

/// The lifecycle phase of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelinePhase {
    /// Producers may enqueue and workers drain the queue normally.
    Running,
    /// No new records are accepted; workers flush what remains.
    Draining,
    /// All workers have exited and accounting is final.
    Terminated,
}

/// Transmitter side of the phase channel, held by the pipeline.
#[derive(Debug, Clone)]
pub struct PhaseTx {
    tx: watch::Sender<PipelinePhase>,
}

/// Receiver side of the phase channel, cloned into each worker.
pub type PhaseRx = watch::Receiver<PipelinePhase>;

impl PhaseTx {
    /// Moves the pipeline into [`PipelinePhase::Draining`].
    ///
    /// Idempotent, and ignored once the pipeline has terminated.
    pub fn begin_drain(&self) {
        self.advance(PipelinePhase::Draining);
    }

    /// Moves the pipeline into [`PipelinePhase::Terminated`].
    pub fn terminate(&self) {
        self.advance(PipelinePhase::Terminated);
    }

    pub fn subscribe(&self) -> PhaseRx {
        self.tx.subscribe()
    }

    pub fn current(&self) -> PipelinePhase {
        *self.tx.borrow()
    }

    fn advance(&self, next: PipelinePhase) {
        self.tx.send_if_modified(|phase| {
            if *phase < next {
                *phase = next;
                true
            } else {
                false
            }
        });
    }
}

/// Creates a phase channel starting in [`PipelinePhase::Running`].
pub fn create_phase_channel() -> (PhaseTx, PhaseRx) {
    let (tx, rx) = watch::channel(PipelinePhase::Running);
    (PhaseTx { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_in_order() {
        let (tx, rx) = create_phase_channel();
        assert_eq!(*rx.borrow(), PipelinePhase::Running);

        tx.begin_drain();
        assert_eq!(*rx.borrow(), PipelinePhase::Draining);

        tx.terminate();
        assert_eq!(*rx.borrow(), PipelinePhase::Terminated);
    }

    #[test]
    fn transitions_never_move_backwards() {
        let (tx, rx) = create_phase_channel();
        tx.terminate();
        tx.begin_drain();
        assert_eq!(*rx.borrow(), PipelinePhase::Terminated);
    }

    #[test]
    fn begin_drain_is_idempotent() {
        let (tx, mut rx) = create_phase_channel();
        tx.begin_drain();
        rx.mark_unchanged();
        tx.begin_drain();
        assert!(!rx.has_changed().unwrap());
    }
}
