//! Standard exit codes (BSD sysexits.h compatible)

/// Relation chain addresses no node
pub const NOMATCH: i32 = 2;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error
pub const DATAERR: i32 = 65;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
