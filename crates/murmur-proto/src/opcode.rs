//! Event opcodes.

/// Identifies the event a frame carries.
///
/// Client-to-server events are `NewUser`, `Message` and `GetCommand`. The
/// server sends `Message`, `History`, `HistoryCleared` and `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    /// Presence announcement after connecting (no payload).
    NewUser = 0x0001,
    /// A single encrypted chat message.
    Message = 0x0002,
    /// Command lookup request carrying a bare token.
    GetCommand = 0x0003,
    /// Bulk replay of stored envelopes.
    History = 0x0010,
    /// The server wiped its stored history (no payload).
    HistoryCleared = 0x0011,
    /// Server-side error report.
    Error = 0x00FF,
}

impl Opcode {
    /// Every assigned opcode, in wire-value order.
    pub const ALL: [Self; 6] = [
        Self::NewUser,
        Self::Message,
        Self::GetCommand,
        Self::History,
        Self::HistoryCleared,
        Self::Error,
    ];

    /// Raw wire value.
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Parse a wire value. `None` if unassigned.
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0001 => Some(Self::NewUser),
            0x0002 => Some(Self::Message),
            0x0003 => Some(Self::GetCommand),
            0x0010 => Some(Self::History),
            0x0011 => Some(Self::HistoryCleared),
            0x00FF => Some(Self::Error),
            _ => None,
        }
    }

    /// Event name as used in logs.
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::NewUser => "newuser",
            Self::Message => "message",
            Self::GetCommand => "getcommand",
            Self::History => "history",
            Self::HistoryCleared => "history_cleared",
            Self::Error => "error",
        }
    }

    /// Whether this event carries no payload bytes.
    pub const fn is_bare(self) -> bool {
        matches!(self, Self::NewUser | Self::HistoryCleared)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.event_name())
    }
}
