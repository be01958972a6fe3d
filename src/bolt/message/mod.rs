//! Bolt protocol message types.
//!
//! Requests reach the session already decoded; responses leave it as
//! [`BoltResponse`] values for the transport to encode.

pub mod metadata;
pub mod request;
pub mod response;

pub use metadata::*;
pub use request::*;
pub use response::*;

use std::fmt;

/// Bolt message tags.
pub mod tag {
    /// HELLO message tag (0x01)
    pub const HELLO: u8 = 0x01;
    /// GOODBYE message tag (0x02)
    pub const GOODBYE: u8 = 0x02;
    /// RESET message tag (0x0F)
    pub const RESET: u8 = 0x0F;
    /// RUN message tag (0x10)
    pub const RUN: u8 = 0x10;
    /// BEGIN message tag (0x11)
    pub const BEGIN: u8 = 0x11;
    /// COMMIT message tag (0x12)
    pub const COMMIT: u8 = 0x12;
    /// ROLLBACK message tag (0x13)
    pub const ROLLBACK: u8 = 0x13;
    /// DISCARD message tag (0x2F)
    pub const DISCARD: u8 = 0x2F;
    /// PULL message tag (0x3F)
    pub const PULL: u8 = 0x3F;
    /// LOGON message tag (0x6A) - Bolt 5.1+
    pub const LOGON: u8 = 0x6A;
    /// LOGOFF message tag (0x6B) - Bolt 5.1+
    pub const LOGOFF: u8 = 0x6B;

    /// SUCCESS response tag (0x70)
    pub const SUCCESS: u8 = 0x70;
    /// RECORD response tag (0x71)
    pub const RECORD: u8 = 0x71;
    /// IGNORED response tag (0x7E)
    pub const IGNORED: u8 = 0x7E;
    /// FAILURE response tag (0x7F)
    pub const FAILURE: u8 = 0x7F;
}

/// Request kind, without payload.
///
/// This is what the session's legality table is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// HELLO
    Hello,
    /// LOGON
    Logon,
    /// LOGOFF
    Logoff,
    /// RUN
    Run,
    /// BEGIN
    Begin,
    /// PULL
    Pull,
    /// DISCARD
    Discard,
    /// COMMIT
    Commit,
    /// ROLLBACK
    Rollback,
    /// RESET
    Reset,
    /// GOODBYE
    Goodbye,
}

impl MessageKind {
    /// Every request kind.
    pub const ALL: [MessageKind; 11] = [
        MessageKind::Hello,
        MessageKind::Logon,
        MessageKind::Logoff,
        MessageKind::Run,
        MessageKind::Begin,
        MessageKind::Pull,
        MessageKind::Discard,
        MessageKind::Commit,
        MessageKind::Rollback,
        MessageKind::Reset,
        MessageKind::Goodbye,
    ];

    /// Get the message tag.
    pub fn tag(self) -> u8 {
        match self {
            MessageKind::Hello => tag::HELLO,
            MessageKind::Logon => tag::LOGON,
            MessageKind::Logoff => tag::LOGOFF,
            MessageKind::Run => tag::RUN,
            MessageKind::Begin => tag::BEGIN,
            MessageKind::Pull => tag::PULL,
            MessageKind::Discard => tag::DISCARD,
            MessageKind::Commit => tag::COMMIT,
            MessageKind::Rollback => tag::ROLLBACK,
            MessageKind::Reset => tag::RESET,
            MessageKind::Goodbye => tag::GOODBYE,
        }
    }

    /// Get message name for logging.
    pub fn name(self) -> &'static str {
        match self {
            MessageKind::Hello => "HELLO",
            MessageKind::Logon => "LOGON",
            MessageKind::Logoff => "LOGOFF",
            MessageKind::Run => "RUN",
            MessageKind::Begin => "BEGIN",
            MessageKind::Pull => "PULL",
            MessageKind::Discard => "DISCARD",
            MessageKind::Commit => "COMMIT",
            MessageKind::Rollback => "ROLLBACK",
            MessageKind::Reset => "RESET",
            MessageKind::Goodbye => "GOODBYE",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
