//! Session bootstrap sequencing.
//!
//! ```text
//! acquire identity ──► Announcing ──newuser + loading──► AwaitingHistory
//!                                                            │
//!                                      gate fired (history or timeout)
//!                                                            ▼
//!                                                          Ready
//! ```
//!
//! Identity acquisition is the only fatal step. Once announced, readiness is
//! guaranteed within the configured history timeout.

use murmur_proto::{Frame, Opcode};

use crate::{
    error::IdentityError,
    gate::GateTrigger,
    identity::{IdentityStore, Prompter},
    pipeline::PipelineAction,
    session::{Session, SessionConfig},
};

/// Bootstrap phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapPhase {
    /// Identity acquired, presence not yet announced.
    Announcing,
    /// `newuser` sent, waiting on the history gate.
    AwaitingHistory,
    /// Gate fired; the session is live.
    Ready(GateTrigger),
}

/// Sans-IO bootstrap state machine.
#[derive(Debug)]
pub struct SessionBootstrap {
    phase: BootstrapPhase,
}

impl SessionBootstrap {
    /// Acquire an identity and build the session context.
    ///
    /// # Errors
    ///
    /// Any [`IdentityError`] is fatal: the session cannot start.
    pub async fn acquire<P: Prompter>(
        identities: &mut IdentityStore,
        prompter: &mut P,
        config: SessionConfig,
    ) -> Result<Session, IdentityError> {
        let identity = identities.acquire(prompter).await?;
        Ok(Session::new(identity, config))
    }

    /// Fresh bootstrap, not yet announced.
    pub fn new() -> Self {
        Self { phase: BootstrapPhase::Announcing }
    }

    /// Current phase.
    pub fn phase(&self) -> BootstrapPhase {
        self.phase
    }

    /// True once the session is live.
    pub fn is_ready(&self) -> bool {
        matches!(self.phase, BootstrapPhase::Ready(_))
    }

    /// Announce presence and show the loading indicator.
    ///
    /// Only the first call produces actions.
    pub fn announce(&mut self) -> Vec<PipelineAction> {
        if self.phase != BootstrapPhase::Announcing {
            return Vec::new();
        }

        self.phase = BootstrapPhase::AwaitingHistory;
        vec![PipelineAction::Send(Frame::bare(Opcode::NewUser)), PipelineAction::SetLoading(true)]
    }

    /// Mark the session ready and hide the loading indicator.
    ///
    /// Only the first call after [`announce`](Self::announce) produces
    /// actions.
    pub fn complete(&mut self, trigger: GateTrigger) -> Vec<PipelineAction> {
        if self.phase != BootstrapPhase::AwaitingHistory {
            return Vec::new();
        }

        self.phase = BootstrapPhase::Ready(trigger);
        vec![PipelineAction::SetLoading(false)]
    }
}

impl Default for SessionBootstrap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn announce_sends_newuser_once() {
        let mut bootstrap = SessionBootstrap::new();

        let actions = bootstrap.announce();
        assert_eq!(
            actions,
            vec![
                PipelineAction::Send(Frame::bare(Opcode::NewUser)),
                PipelineAction::SetLoading(true),
            ]
        );
        assert!(bootstrap.announce().is_empty());
        assert_eq!(bootstrap.phase(), BootstrapPhase::AwaitingHistory);
    }

    #[test]
    fn complete_before_announce_is_ignored() {
        let mut bootstrap = SessionBootstrap::new();

        assert!(bootstrap.complete(GateTrigger::Timeout).is_empty());
        assert!(!bootstrap.is_ready());
    }

    #[test]
    fn complete_hides_loading_once() {
        let mut bootstrap = SessionBootstrap::new();
        bootstrap.announce();

        assert_eq!(
            bootstrap.complete(GateTrigger::HistoryDelivered),
            vec![PipelineAction::SetLoading(false)]
        );
        assert!(bootstrap.complete(GateTrigger::Timeout).is_empty());
        assert_eq!(bootstrap.phase(), BootstrapPhase::Ready(GateTrigger::HistoryDelivered));
    }
}
