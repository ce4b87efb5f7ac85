//! In-memory relay standing in for the chat server.
//!
//! Behaves like the real relay from a single client's point of view: it
//! stores every message envelope, echoes it back unmodified, and answers
//! `newuser` with a history replay. The history answer can be replaced to
//! exercise the gate's failure paths.

use murmur_proto::{Envelope, Frame, HistoryPayload, Payload};

/// How the relay answers `newuser`.
#[derive(Debug, Clone)]
pub enum HistoryReply {
    /// Replay every envelope stored so far.
    Stored,
    /// Never send history (exercises the timeout path).
    Never,
    /// Send this frame verbatim (malformed or hand-built payloads).
    Raw(Frame),
}

/// Simulated relay server.
#[derive(Debug)]
pub struct SimServer {
    stored: Vec<Envelope>,
    history: HistoryReply,
    commands: Vec<String>,
}

impl SimServer {
    /// Relay with no stored messages.
    pub fn new() -> Self {
        Self { stored: Vec::new(), history: HistoryReply::Stored, commands: Vec::new() }
    }

    /// Relay pre-loaded with stored envelopes, replayed at join.
    pub fn with_history(entries: Vec<Envelope>) -> Self {
        Self { stored: entries, ..Self::new() }
    }

    /// Replace how `newuser` is answered.
    #[must_use]
    pub fn history_reply(mut self, reply: HistoryReply) -> Self {
        self.history = reply;
        self
    }

    /// Command tokens received so far.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Handle one client frame and return the relay's replies, in order.
    pub fn handle(&mut self, frame: &Frame) -> Vec<Frame> {
        let payload = match Payload::from_frame(frame) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(%error, "relay dropping undecodable frame");
                return Vec::new();
            },
        };

        match payload {
            Payload::NewUser => match &self.history {
                HistoryReply::Stored => {
                    encode(Payload::History(HistoryPayload::new(self.stored.clone())))
                },
                HistoryReply::Never => Vec::new(),
                HistoryReply::Raw(frame) => vec![frame.clone()],
            },
            Payload::Message(envelope) => {
                self.stored.push(envelope.clone());
                encode(Payload::Message(envelope))
            },
            Payload::GetCommand(token) => {
                self.commands.push(token);
                Vec::new()
            },
            Payload::History(_) | Payload::HistoryCleared | Payload::Error(_) => Vec::new(),
        }
    }
}

impl Default for SimServer {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(payload: Payload) -> Vec<Frame> {
    payload.into_frame().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use murmur_proto::Opcode;

    use super::*;

    #[test]
    fn newuser_replays_stored_history() {
        let mut server = SimServer::with_history(vec![Envelope::from(vec![1])]);

        let replies = server.handle(&Frame::bare(Opcode::NewUser));

        assert_eq!(replies.len(), 1);
        assert_eq!(
            Payload::from_frame(&replies[0]).unwrap(),
            Payload::History(HistoryPayload::new(vec![Envelope::from(vec![1])]))
        );
    }

    #[test]
    fn messages_are_stored_and_echoed() {
        let mut server = SimServer::new();
        let frame = Payload::Message(Envelope::from(vec![7])).into_frame().unwrap();

        assert_eq!(server.handle(&frame), vec![frame.clone()]);
        assert_eq!(server.stored, vec![Envelope::from(vec![7])]);
    }

    #[test]
    fn silent_relay_sends_no_history() {
        let mut server = SimServer::new().history_reply(HistoryReply::Never);
        assert!(server.handle(&Frame::bare(Opcode::NewUser)).is_empty());
    }

    #[test]
    fn commands_are_recorded() {
        let mut server = SimServer::new();
        let frame = Payload::GetCommand("help".into()).into_frame().unwrap();

        assert!(server.handle(&frame).is_empty());
        assert_eq!(server.commands(), ["help".to_owned()]);
    }
}
