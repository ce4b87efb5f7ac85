//! Explicit session context.
//!
//! Everything the pipeline needs to know about "who am I and how do I
//! behave" lives in one [`Session`] built at bootstrap and passed in, rather
//! than in shared mutable globals.

use std::time::Duration;

use crate::identity::Identity;

/// Tunables fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Upper bound on the bootstrap wait for history.
    pub history_timeout: Duration,
    /// Leading character that turns input into a command lookup.
    pub command_trigger: char,
}

impl SessionConfig {
    /// Default bound on the history wait (30 s).
    pub const DEFAULT_HISTORY_TIMEOUT: Duration = Duration::from_secs(30);

    /// Default command trigger.
    pub const DEFAULT_COMMAND_TRIGGER: char = '!';
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_timeout: Self::DEFAULT_HISTORY_TIMEOUT,
            command_trigger: Self::DEFAULT_COMMAND_TRIGGER,
        }
    }
}

/// Identity plus configuration for one running session.
#[derive(Debug, Clone)]
pub struct Session {
    identity: Identity,
    config: SessionConfig,
}

impl Session {
    /// Bundle a complete identity with its configuration.
    pub fn new(identity: Identity, config: SessionConfig) -> Self {
        Self { identity, config }
    }

    /// Current identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Mutable identity, for user-driven name or secret changes.
    pub fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
