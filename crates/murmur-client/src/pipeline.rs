//! Message pipeline: outbound sends and inbound live/history receives.
//!
//! The pipeline is sans-IO: every operation returns [`PipelineAction`]s for
//! the runtime to execute against its driver. Crypto goes through a
//! [`CryptoGateway`], which is the only suspension point.
//!
//! # Failure isolation
//!
//! Every arrived envelope produces exactly one [`RenderedMessageUnit`]. An
//! envelope that cannot be opened is rendered as a placeholder, never dropped,
//! and never affects its neighbours. A failed send produces a notice and no
//! transport traffic.

use std::fmt;

use murmur_proto::{
    Envelope, Frame, HistoryPayload, Opcode, Payload, PlaintextMessage, ProtocolError,
};

use crate::{
    gate::{HistoryGate, SignalOnDrop},
    gateway::CryptoGateway,
    session::Session,
};

/// A decrypted (or placeholder) message ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessageUnit {
    /// Sender's display name.
    pub display_name: String,
    /// Message text.
    pub text: String,
}

impl RenderedMessageUnit {
    /// Name shown when the plaintext carries no sender.
    pub const UNKNOWN_SENDER: &'static str = "unknown";
    /// Name shown for an envelope that could not be opened.
    pub const PLACEHOLDER_SENDER: &'static str = "USER";
    /// Text shown for an envelope that could not be opened.
    pub const PLACEHOLDER_TEXT: &'static str = "Encrypted Message";

    /// Build a unit from opened plaintext, filling in missing fields.
    pub fn from_plaintext(plaintext: PlaintextMessage) -> Self {
        let display_name = if plaintext.username.is_empty() {
            Self::UNKNOWN_SENDER.to_owned()
        } else {
            plaintext.username
        };
        Self { display_name, text: plaintext.msg }
    }

    /// Opaque unit for an envelope that could not be opened.
    pub fn placeholder() -> Self {
        Self {
            display_name: Self::PLACEHOLDER_SENDER.to_owned(),
            text: Self::PLACEHOLDER_TEXT.to_owned(),
        }
    }

    /// True if this is the opaque placeholder.
    pub fn is_placeholder(&self) -> bool {
        *self == Self::placeholder()
    }
}

impl fmt::Display for RenderedMessageUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.display_name, self.text)
    }
}

/// Side effects requested by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineAction {
    /// Emit a frame over the transport.
    Send(Frame),
    /// Append a unit to the message list.
    Render(RenderedMessageUnit),
    /// Scroll the message list to its end.
    ScrollToEnd,
    /// Remove every rendered unit.
    ClearMessages,
    /// Show or hide the loading indicator.
    SetLoading(bool),
    /// Show a notice to the user.
    Notify(String),
}

/// Outbound and inbound message processing for one session.
pub struct MessagePipeline<G> {
    session: Session,
    gateway: G,
    gate: HistoryGate,
}

impl<G: CryptoGateway> MessagePipeline<G> {
    /// Notice shown when an outgoing message cannot be sealed.
    pub const ENCRYPT_FAILED_NOTICE: &'static str =
        "Failed to encrypt message. Check the logs for details.";
    /// Notice shown when an outgoing frame cannot be built.
    pub const SEND_FAILED_NOTICE: &'static str = "Message not sent. It is too large.";

    /// Create a pipeline for a session, feeding `gate` from the history path.
    pub fn new(session: Session, gateway: G, gate: HistoryGate) -> Self {
        Self { session, gateway, gate }
    }

    /// Session context.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable session context, for identity changes.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Gate fed by the history handler.
    pub fn gate(&self) -> &HistoryGate {
        &self.gate
    }

    /// Process one line of user input.
    ///
    /// - Empty input: nothing.
    /// - Command trigger: a `GetCommand` frame with the trimmed token, or
    ///   nothing if the token is blank. Never encrypted.
    /// - Anything else: sealed and sent as a `Message` frame, or a notice if
    ///   sealing fails.
    pub async fn send_text(&self, raw: &str) -> Vec<PipelineAction> {
        if raw.is_empty() {
            return Vec::new();
        }

        if let Some(rest) = raw.strip_prefix(self.session.config().command_trigger) {
            let token = rest.trim();
            if token.is_empty() {
                tracing::debug!("dropping empty command");
                return Vec::new();
            }
            return self.send(Payload::GetCommand(token.to_owned()));
        }

        let identity = self.session.identity();
        let plaintext = PlaintextMessage::new(identity.name(), raw);

        match self.gateway.encrypt(identity.secret(), &plaintext).await {
            Ok(envelope) => self.send(Payload::Message(envelope)),
            Err(failure) => {
                tracing::error!(%failure, "failed to encrypt outgoing message");
                vec![PipelineAction::Notify(Self::ENCRYPT_FAILED_NOTICE.to_owned())]
            },
        }
    }

    /// Process one frame from the server.
    pub async fn handle_frame(&self, frame: &Frame) -> Vec<PipelineAction> {
        match Payload::from_frame(frame) {
            Ok(Payload::Message(envelope)) => self.handle_message(&envelope).await,
            Ok(Payload::History(history)) => self.handle_history(history).await,
            Ok(Payload::HistoryCleared) => self.handle_history_cleared(),
            Ok(Payload::Error(err)) => {
                tracing::warn!(code = err.code, message = %err.message, "server reported an error");
                vec![PipelineAction::Notify(format!("Server error: {}", err.message))]
            },
            Ok(payload @ (Payload::NewUser | Payload::GetCommand(_))) => {
                tracing::debug!(opcode = %payload.opcode(), "ignoring client-bound event");
                Vec::new()
            },
            Err(error) => self.handle_malformed(frame, &error),
        }
    }

    /// Open and render one live message.
    pub async fn handle_message(&self, envelope: &Envelope) -> Vec<PipelineAction> {
        let unit = self.open(envelope, "live").await;
        vec![PipelineAction::Render(unit), PipelineAction::ScrollToEnd]
    }

    /// Open and render a history batch, then signal the gate.
    ///
    /// Entries are opened strictly in delivered order, each independently.
    /// The gate is signaled on every exit path, including when this future
    /// is dropped before completion.
    pub async fn handle_history(&self, history: HistoryPayload) -> Vec<PipelineAction> {
        let _signal = SignalOnDrop(&self.gate);

        let mut actions = Vec::with_capacity(history.len() + 1);
        for envelope in history.entries() {
            actions.push(PipelineAction::Render(self.open(envelope, "history").await));
        }

        if !actions.is_empty() {
            actions.push(PipelineAction::ScrollToEnd);
        }

        tracing::info!(entries = history.len(), "history replayed");
        actions
    }

    /// Clear rendered messages and hide the loading indicator.
    ///
    /// Does not touch the gate.
    pub fn handle_history_cleared(&self) -> Vec<PipelineAction> {
        tracing::info!("server cleared history");
        vec![PipelineAction::ClearMessages, PipelineAction::SetLoading(false)]
    }

    fn handle_malformed(&self, frame: &Frame, error: &ProtocolError) -> Vec<PipelineAction> {
        match frame.header.opcode_enum() {
            Some(Opcode::History) => {
                let _signal = SignalOnDrop(&self.gate);
                tracing::warn!(%error, "ignoring malformed history payload");
                Vec::new()
            },
            Some(Opcode::Message) => {
                tracing::warn!(%error, "malformed message payload");
                vec![
                    PipelineAction::Render(RenderedMessageUnit::placeholder()),
                    PipelineAction::ScrollToEnd,
                ]
            },
            _ => {
                tracing::warn!(%error, opcode = frame.header.opcode(), "dropping undecodable frame");
                Vec::new()
            },
        }
    }

    async fn open(&self, envelope: &Envelope, source: &'static str) -> RenderedMessageUnit {
        match self.gateway.decrypt(self.session.identity().secret(), envelope).await {
            Ok(plaintext) => RenderedMessageUnit::from_plaintext(plaintext),
            Err(failure) => {
                tracing::warn!(%failure, source, "decryption failed, rendering placeholder");
                RenderedMessageUnit::placeholder()
            },
        }
    }

    fn send(&self, payload: Payload) -> Vec<PipelineAction> {
        match payload.into_frame() {
            Ok(frame) => vec![PipelineAction::Send(frame)],
            Err(error) => {
                tracing::error!(%error, "failed to encode outgoing frame");
                vec![PipelineAction::Notify(Self::SEND_FAILED_NOTICE.to_owned())]
            },
        }
    }
}
