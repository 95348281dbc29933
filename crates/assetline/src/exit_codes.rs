//! Process exit codes

#![allow(dead_code)]

/// Everything succeeded
pub const SUCCESS: i32 = 0;

/// Unspecified failure
pub const ERROR: i32 = 1;

/// Configuration could not be loaded or is invalid
pub const CONFIG_ERROR: i32 = 2;

/// At least one task failed
pub const TASK_FAILED: i32 = 3;

/// The dev server could not bind its address
pub const SERVE_ERROR: i32 = 4;

/// Interrupted by the user
pub const CANCELLED: i32 = 130;
