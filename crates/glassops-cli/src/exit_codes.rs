//! Process exit codes. Stable across releases; CI scripts branch on them.

pub const SUCCESS: i32 = 0;
pub const RUN_FAILED: i32 = 1; // A phase failed after policy passed
pub const CONFIG_ERROR: i32 = 2; // Invalid config, context or arguments
pub const FROZEN: i32 = 3; // Blocked by a freeze window
pub const TIMEOUT: i32 = 4; // Watchdog expired
