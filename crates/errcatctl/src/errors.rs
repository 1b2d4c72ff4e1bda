//! Exit codes for errcatctl

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors (unreadable or malformed catalog, bad config)
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Exit code when the requested id is not in the catalog
pub const EXIT_NOT_FOUND: i32 = 2;
