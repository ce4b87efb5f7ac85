//! Single-fire history gate.
//!
//! The gate starts [`GateState::Waiting`] and moves to
//! [`GateState::Signaled`] exactly once. Two triggers race for that
//! transition: the history handler finishing (successfully or not) and the
//! bootstrap timeout. The first one wins and later fires are no-ops; the gate
//! never re-arms within a session.
//!
//! ```text
//! Waiting ──history handled──► Signaled(HistoryDelivered)
//!    │
//!    └──────timeout──────────► Signaled(Timeout)
//! ```

use std::{future::Future, sync::Arc};

use tokio::sync::watch;

/// What caused the gate to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTrigger {
    /// The history handler ran to completion (or bailed out).
    HistoryDelivered,
    /// No history signal arrived before the timeout.
    Timeout,
}

/// Latch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Not yet fired.
    Waiting,
    /// Fired; terminal.
    Signaled(GateTrigger),
}

impl GateState {
    /// True once the gate has fired.
    pub fn is_signaled(&self) -> bool {
        matches!(self, Self::Signaled(_))
    }
}

/// Cloneable handle to one session's gate.
///
/// All clones share the same latch.
#[derive(Debug, Clone)]
pub struct HistoryGate {
    state: Arc<watch::Sender<GateState>>,
}

impl HistoryGate {
    /// New gate in the `Waiting` state.
    pub fn new() -> Self {
        Self { state: Arc::new(watch::Sender::new(GateState::Waiting)) }
    }

    /// Fire the gate.
    ///
    /// Returns `true` if this call caused the transition, `false` if the gate
    /// had already fired.
    pub fn fire(&self, trigger: GateTrigger) -> bool {
        self.state.send_if_modified(|state| match state {
            GateState::Waiting => {
                *state = GateState::Signaled(trigger);
                true
            },
            GateState::Signaled(_) => false,
        })
    }

    /// Current latch state.
    pub fn state(&self) -> GateState {
        *self.state.borrow()
    }

    /// True once the gate has fired.
    pub fn is_signaled(&self) -> bool {
        self.state().is_signaled()
    }

    /// Wait until the gate fires or `timer` completes, whichever is first.
    ///
    /// If the timer wins, the gate is fired with [`GateTrigger::Timeout`].
    /// Returns the trigger that actually opened the gate. Waiting on an
    /// already-signaled gate returns immediately.
    pub async fn wait(&self, timer: impl Future<Output = ()>) -> GateTrigger {
        let mut signaled = self.state.subscribe();

        tokio::select! {
            biased;
            _ = signaled.wait_for(GateState::is_signaled) => {},
            () = timer => {
                if self.fire(GateTrigger::Timeout) {
                    tracing::warn!("history not delivered before timeout, continuing without it");
                }
            },
        }

        match self.state() {
            GateState::Signaled(trigger) => trigger,
            GateState::Waiting => GateTrigger::Timeout,
        }
    }
}

impl Default for HistoryGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Fires the gate with [`GateTrigger::HistoryDelivered`] when dropped.
///
/// Held for the whole history handler so that every exit path, including an
/// early return or a cancelled future, still opens the gate.
pub(crate) struct SignalOnDrop<'a>(pub(crate) &'a HistoryGate);

impl Drop for SignalOnDrop<'_> {
    fn drop(&mut self) {
        if self.0.fire(GateTrigger::HistoryDelivered) {
            tracing::debug!("history gate signaled by history handler");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::{Instant, sleep};

    use super::*;

    #[test]
    fn fires_exactly_once() {
        let gate = HistoryGate::new();

        assert!(gate.fire(GateTrigger::HistoryDelivered));
        assert!(!gate.fire(GateTrigger::Timeout));
        assert!(!gate.fire(GateTrigger::HistoryDelivered));
        assert_eq!(gate.state(), GateState::Signaled(GateTrigger::HistoryDelivered));
    }

    #[test]
    fn clones_share_the_latch() {
        let gate = HistoryGate::new();
        let other = gate.clone();

        other.fire(GateTrigger::HistoryDelivered);

        assert!(gate.is_signaled());
    }

    #[test]
    fn drop_guard_signals() {
        let gate = HistoryGate::new();
        {
            let _guard = SignalOnDrop(&gate);
            assert!(!gate.is_signaled());
        }
        assert_eq!(gate.state(), GateState::Signaled(GateTrigger::HistoryDelivered));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_opens_the_gate_at_the_deadline() {
        let gate = HistoryGate::new();
        let start = Instant::now();

        let trigger = gate.wait(sleep(Duration::from_millis(30_000))).await;

        assert_eq!(trigger, GateTrigger::Timeout);
        assert!(start.elapsed() >= Duration::from_millis(30_000));
        assert_eq!(gate.state(), GateState::Signaled(GateTrigger::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn signal_beats_the_timeout() {
        let gate = HistoryGate::new();
        let signaller = gate.clone();
        let start = Instant::now();

        tokio::spawn(async move {
            sleep(Duration::from_millis(500)).await;
            signaller.fire(GateTrigger::HistoryDelivered);
        });

        let trigger = gate.wait(sleep(Duration::from_millis(30_000))).await;

        assert_eq!(trigger, GateTrigger::HistoryDelivered);
        assert!(start.elapsed() < Duration::from_millis(30_000));
    }

    #[tokio::test(start_paused = true)]
    async fn late_signal_after_timeout_is_a_no_op() {
        let gate = HistoryGate::new();

        gate.wait(sleep(Duration::from_millis(10))).await;

        assert!(!gate.fire(GateTrigger::HistoryDelivered));
        assert_eq!(gate.state(), GateState::Signaled(GateTrigger::Timeout));
    }

    #[tokio::test]
    async fn already_signaled_returns_immediately() {
        let gate = HistoryGate::new();
        gate.fire(GateTrigger::HistoryDelivered);

        let trigger = gate.wait(std::future::pending()).await;

        assert_eq!(trigger, GateTrigger::HistoryDelivered);
    }
}
