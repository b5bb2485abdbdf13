//! Process exit codes shared by the `syndic` binary and its callers.

/// Every targeted platform published or was skipped by policy.
pub const SUCCESS: i32 = 0;

/// Unexpected fault (I/O, corrupt ledger) outside any single platform.
pub const INTERNAL_ERROR: i32 = 1;

/// The run completed, but at least one platform failed generation,
/// validation after retry, or publishing.
pub const PLATFORM_FAILURES: i32 = 2;

/// Operator configuration problem: unknown entity, missing generator key.
pub const CONFIG_ERROR: i32 = 3;
