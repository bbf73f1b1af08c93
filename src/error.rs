//! Error taxonomy (§7). Plain enums, not `thiserror`: protocol/game-rule
//! errors never propagate across players, they become a per-sender
//! failure event or a silent drop, so there's no call for `?`-chaining
//! through multiple error types here.

use std::error::Error;
use std::fmt::{self, Display};

/// Errors a connection's read/write loop can hit. Transport errors close
/// the connection; protocol errors just drop the offending frame.
#[derive(Debug)]
pub enum ConnectionError {
    MalformedFrame(serde_json::Error),
    UnknownMessageKind(String),
    WriteFailed,
    RoomFull,
    NoRoomAvailable,
}

impl Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::MalformedFrame(e) => write!(f, "malformed frame: {e}"),
            ConnectionError::UnknownMessageKind(kind) => write!(f, "unknown message kind: {kind}"),
            ConnectionError::WriteFailed => write!(f, "write to connection failed"),
            ConnectionError::RoomFull => write!(f, "room at capacity"),
            ConnectionError::NoRoomAvailable => write!(f, "no room available"),
        }
    }
}

impl Error for ConnectionError {}

/// Raised when a Room's tick loop hits an unrecoverable condition. The
/// Room catches this, ends its Match with `server_error`, and tears
/// itself down; other rooms are unaffected (§7 Fatal).
#[derive(Debug)]
pub struct RoomFatalError {
    pub room_id: String,
    pub reason: String,
}

impl Display for RoomFatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room {} hit a fatal error: {}", self.room_id, self.reason)
    }
}

impl Error for RoomFatalError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_error_display_is_human_readable() {
        let err = ConnectionError::UnknownMessageKind("bogus:kind".to_string());
        assert_eq!(err.to_string(), "unknown message kind: bogus:kind");
    }
}
