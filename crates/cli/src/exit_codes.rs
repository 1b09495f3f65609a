//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | Success, every row reconciled                    |
//! | 1    | Run completed but unreconciled rows remain       |
//! | 2    | CLI usage error (bad args, missing file)         |
//! | 3    | Invalid pipeline config                          |
//! | 4    | Snapshot or rows parse error                     |
//! | 5    | Runtime/IO error                                 |

/// Success - command completed and every row reconciled.
pub const EXIT_SUCCESS: u8 = 0;

/// Run completed but unmatched or malformed rows remain.
/// Like `diff(1)`, exit 1 means "there is something to look at."
pub const EXIT_UNRESOLVED: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Pipeline config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Snapshot or incoming rows document failed to parse.
pub const EXIT_PARSE: u8 = 4;

/// Runtime error - file IO, serialization.
pub const EXIT_RUNTIME: u8 = 5;
