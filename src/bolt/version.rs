//! Bolt protocol version definitions.
//!
//! The version is agreed during the handshake, before the session state
//! machine exists; the machine only asks it what the session may do.

use std::fmt;

/// Bolt protocol versions.
///
/// Version numbers are encoded as 4-byte big-endian integers:
/// - Major version in high 2 bytes
/// - Minor version in low 2 bytes
///
/// For example: V4_3 = 0x0004_0003 (major=4, minor=3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BoltVersion {
    /// Bolt 4.0
    V4_0 = 0x0004_0000,
    /// Bolt 4.1
    V4_1 = 0x0004_0001,
    /// Bolt 4.2
    V4_2 = 0x0004_0002,
    /// Bolt 4.3 - connection hints
    V4_3 = 0x0004_0003,
    /// Bolt 4.4
    V4_4 = 0x0004_0004,
    /// Bolt 5.0 - element IDs
    V5_0 = 0x0005_0000,
    /// Bolt 5.1 - LOGON/LOGOFF, authentication split from HELLO
    V5_1 = 0x0005_0001,
    /// Bolt 5.2
    V5_2 = 0x0005_0002,
    /// Bolt 5.3
    V5_3 = 0x0005_0003,
    /// Bolt 5.4
    V5_4 = 0x0005_0004,
}

impl BoltVersion {
    /// All supported versions in order of preference (newest first).
    pub const ALL: [BoltVersion; 10] = [
        BoltVersion::V5_4,
        BoltVersion::V5_3,
        BoltVersion::V5_2,
        BoltVersion::V5_1,
        BoltVersion::V5_0,
        BoltVersion::V4_4,
        BoltVersion::V4_3,
        BoltVersion::V4_2,
        BoltVersion::V4_1,
        BoltVersion::V4_0,
    ];

    /// Create a BoltVersion from a raw u32 value.
    pub fn from_u32(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_u32() == value)
    }

    /// Get the raw u32 value.
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Get the major version number.
    pub fn major(self) -> u16 {
        ((self as u32) >> 16) as u16
    }

    /// Get the minor version number.
    pub fn minor(self) -> u16 {
        ((self as u32) & 0xFFFF) as u16
    }

    /// Check if authentication is a separate LOGON step after HELLO.
    ///
    /// Older versions authenticate inline with HELLO.
    pub fn supports_logon(self) -> bool {
        self >= BoltVersion::V5_1
    }

    /// Check if HELLO SUCCESS may carry connection hints.
    pub fn supports_hints(self) -> bool {
        self >= BoltVersion::V4_3
    }

    /// Check if the `utc` patch can be negotiated in HELLO.
    pub fn supports_utc_patch(self) -> bool {
        matches!(self, BoltVersion::V4_3 | BoltVersion::V4_4)
    }
}

impl fmt::Display for BoltVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

impl PartialOrd for BoltVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BoltVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_u32().cmp(&other.as_u32())
    }
}
