//! Application-wide constants
//!
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default seconds to wait for a pooled connection
pub const DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// ENGINE DEFAULTS
// =============================================================================

/// How many times a rule edit is retried after losing a version race
pub const DEFAULT_RULE_UPDATE_MAX_RETRIES: u32 = 3;

/// Actor recorded for edits made by the engine itself
pub const SYSTEM_ACTOR: &str = "system";

// =============================================================================
// LOGGING DEFAULTS
// =============================================================================

/// Default tracing filter when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "podium=info,sqlx=warn";

/// Log output formats
pub mod log_formats {
    pub const PRETTY: &str = "pretty";
    pub const JSON: &str = "json";

    pub const ALL: &[&str] = &[PRETTY, JSON];
}
