//! Platform constants
//!
//! Error codes and subcodes are the values the Graph API puts in its
//! `error.code` / `error.error_subcode` fields.

use std::time::Duration;

// Graph API error codes
pub const CODE_APP_CALL_LIMIT: i64 = 4;
pub const CODE_PERMISSION_DENIED: i64 = 10;
pub const CODE_USER_CALL_LIMIT: i64 = 17;
pub const CODE_INVALID_PARAMETER: i64 = 100;
pub const CODE_ACCESS_TOKEN: i64 = 190;
pub const CODE_PERMISSION: i64 = 200;
pub const CODE_API_TOO_MANY_CALLS: i64 = 613;

// Subcodes that mark a throttle with a known cool-down
pub const SUBCODE_USER_REQUEST_LIMIT: i64 = 2_446_079;
pub const SUBCODE_ADS_INSIGHTS_LIMIT: i64 = 1_487_742;
pub const SUBCODE_APP_ACCOUNT_LIMIT: i64 = 1_504_022;
pub const SUBCODE_APP_ACCOUNT_LIMIT_ALT: i64 = 1_504_039;

// Cool-down hints attached to the subcodes above
pub const HINT_USER_REQUEST_LIMIT: Duration = Duration::from_millis(300_000);
pub const HINT_ADS_INSIGHTS_LIMIT: Duration = Duration::from_millis(60_000);
pub const HINT_APP_ACCOUNT_LIMIT: Duration = Duration::from_millis(300_000);

// Endpoint defaults
pub const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_API_VERSION: &str = "v23.0";
pub const ACCOUNT_ID_PREFIX: &str = "act_";

/// Tool-name prefixes that identify write operations
pub const MUTATION_PREFIXES: [&str; 5] = ["create_", "update_", "pause_", "resume_", "delete_"];
