//! Local identity: display name and shared secret.
//!
//! An [`Identity`] can only exist with a non-blank name and a non-blank
//! secret, so everything downstream (sealing, sending) can assume both are
//! present. [`IdentityStore`] owns the acquisition sequence and the persisted
//! display name.

use std::{collections::HashMap, future::Future};

use zeroize::Zeroize;

use crate::error::IdentityError;

/// Symmetric passphrase shared by everyone in the room.
///
/// Never blank. Zeroized on drop and redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(String);

impl SharedSecret {
    /// Accept a secret exactly as typed.
    ///
    /// Surrounding whitespace is kept (it is part of the passphrase), but a
    /// secret made only of whitespace is rejected.
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentityError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(IdentityError::BlankSecret);
        }
        Ok(Self(raw))
    }

    /// Secret bytes used as key material.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

/// Display name and shared secret for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    name: String,
    secret: SharedSecret,
}

impl Identity {
    /// Build an identity; the name is trimmed and must not be blank.
    pub fn new(name: &str, secret: SharedSecret) -> Result<Self, IdentityError> {
        Ok(Self { name: validate_name(name)?, secret })
    }

    /// Display name attached to outgoing messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared secret used for every seal and open.
    pub fn secret(&self) -> &SharedSecret {
        &self.secret
    }
}

/// Key-value persistence for the display name.
pub trait NameStore {
    /// Previously saved name, if any.
    fn load(&self) -> Result<Option<String>, IdentityError>;

    /// Persist the name for the next session.
    fn save(&mut self, name: &str) -> Result<(), IdentityError>;
}

/// In-memory [`NameStore`], lost when dropped.
#[derive(Debug, Default, Clone)]
pub struct MemoryNameStore {
    values: HashMap<&'static str, String>,
}

impl MemoryNameStore {
    const KEY: &'static str = "username";

    /// Store pre-populated with a saved name.
    pub fn with_name(name: impl Into<String>) -> Self {
        let mut store = Self::default();
        store.values.insert(Self::KEY, name.into());
        store
    }
}

impl NameStore for MemoryNameStore {
    fn load(&self) -> Result<Option<String>, IdentityError> {
        Ok(self.values.get(Self::KEY).cloned())
    }

    fn save(&mut self, name: &str) -> Result<(), IdentityError> {
        self.values.insert(Self::KEY, name.to_owned());
        Ok(())
    }
}

/// Interactive credential entry.
///
/// `None` from a prompt means the user dismissed it, which is treated the same
/// as blank input.
pub trait Prompter: Send {
    /// Ask for the shared secret.
    fn prompt_secret(&mut self) -> impl Future<Output = Option<String>> + Send;

    /// Ask for a display name.
    fn prompt_name(&mut self) -> impl Future<Output = Option<String>> + Send;

    /// Offer to change a previously saved name. `true` means change it.
    fn confirm_change_name(&mut self, current: &str) -> impl Future<Output = bool> + Send;

    /// Show a blocking message to the user.
    fn alert(&mut self, message: &str);
}

/// Acquires and updates the local [`Identity`].
pub struct IdentityStore {
    names: Box<dyn NameStore + Send>,
}

impl IdentityStore {
    /// Create a store backed by the given name persistence.
    pub fn new(names: impl NameStore + Send + 'static) -> Self {
        Self { names: Box::new(names) }
    }

    /// Run the bootstrap acquisition sequence.
    ///
    /// 1. Prompt for the shared secret. Blank is fatal.
    /// 2. If a name was saved earlier, offer to keep it; otherwise (or if the
    ///    user wants to change it) prompt for one. Blank is fatal.
    /// 3. Persist the resolved name.
    ///
    /// # Errors
    ///
    /// - `BlankSecret` / `BlankName`: the session is unusable
    /// - `Storage`: the name could not be read or persisted
    pub async fn acquire<P: Prompter>(
        &mut self,
        prompter: &mut P,
    ) -> Result<Identity, IdentityError> {
        let raw_secret = prompter.prompt_secret().await.unwrap_or_default();
        let secret = match SharedSecret::new(raw_secret) {
            Ok(secret) => secret,
            Err(err) => {
                prompter.alert("NO PASSWORD IS SET! Restart to set a password...");
                return Err(err);
            },
        };

        let saved = self.names.load()?.filter(|name| !name.trim().is_empty());
        let raw_name = match saved {
            Some(name) if !prompter.confirm_change_name(&name).await => Some(name),
            _ => prompter.prompt_name().await,
        };

        let identity = match Identity::new(raw_name.as_deref().unwrap_or_default(), secret) {
            Ok(identity) => identity,
            Err(err) => {
                prompter.alert("Username is required! Restart to set a username...");
                return Err(err);
            },
        };

        self.names.save(identity.name())?;
        tracing::info!(name = identity.name(), "identity acquired");
        Ok(identity)
    }

    /// Change the display name and persist it.
    ///
    /// Idempotent: setting the current name again is a no-op apart from the
    /// redundant save. On error the identity is left unchanged.
    pub fn set_name(&mut self, identity: &mut Identity, raw: &str) -> Result<(), IdentityError> {
        let name = validate_name(raw)?;
        self.names.save(&name)?;

        if identity.name != name {
            tracing::info!(from = %identity.name, to = %name, "display name changed");
            identity.name = name;
        }
        Ok(())
    }

    /// Replace the shared secret for the rest of the session.
    ///
    /// The secret is never persisted. On error the previous secret is kept.
    pub fn change_secret(&self, identity: &mut Identity, raw: &str) -> Result<(), IdentityError> {
        identity.secret = SharedSecret::new(raw)?;
        tracing::info!("shared secret changed");
        Ok(())
    }
}

fn validate_name(raw: &str) -> Result<String, IdentityError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(IdentityError::BlankName);
    }
    Ok(name.to_owned())
}
