//! Runtime configuration for the sign-up desk.
//!
//! # Responsibility
//! - Carry the gate reference secret and notice lifetimes into the desk.
//! - Read deployment overrides from environment variables.
//!
//! # Invariants
//! - The gate secret is injected at startup; no value is compiled in.
//! - A missing or blank secret leaves the gate permanently locked.

use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "SIGNUP_DB_PATH";
pub const ENV_GATE_SECRET: &str = "SIGNUP_GATE_SECRET";
pub const ENV_GATE_MAX_ATTEMPTS: &str = "SIGNUP_GATE_MAX_ATTEMPTS";
pub const ENV_LOG_LEVEL: &str = "SIGNUP_LOG_LEVEL";

const DEFAULT_DB_FILE_NAME: &str = "signup_desk.sqlite3";
const DEFAULT_FEEDBACK_TTL_MS: u64 = 3_000;
const DEFAULT_WELCOME_TTL_MS: u64 = 2_500;
const DEFAULT_GATE_ERROR_TTL_MS: u64 = 1_500;

/// Access gate configuration.
#[derive(Clone, Default)]
pub struct GateConfig {
    /// Reference secret compared against gate attempts.
    pub secret: Option<String>,
    /// Optional lockout after this many consecutive failures.
    ///
    /// `None` keeps the unlimited-attempt behavior of the original demo.
    pub max_failed_attempts: Option<u32>,
}

impl GateConfig {
    /// Builds a gate configuration with the given reference secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
            max_failed_attempts: None,
        }
    }

    /// Returns the configured secret, treating blank values as absent.
    pub fn reference_secret(&self) -> Option<&str> {
        self.secret
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

impl Debug for GateConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("max_failed_attempts", &self.max_failed_attempts)
            .finish()
    }
}

/// Top-level desk configuration.
#[derive(Debug, Clone)]
pub struct DeskConfig {
    pub gate: GateConfig,
    /// Lifetime of submit feedback messages.
    pub feedback_ttl: Duration,
    /// Lifetime of the gate welcome notice.
    pub welcome_ttl: Duration,
    /// Lifetime of the gate mismatch notice; shorter than the welcome.
    pub gate_error_ttl: Duration,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            gate: GateConfig::default(),
            feedback_ttl: Duration::from_millis(DEFAULT_FEEDBACK_TTL_MS),
            welcome_ttl: Duration::from_millis(DEFAULT_WELCOME_TTL_MS),
            gate_error_ttl: Duration::from_millis(DEFAULT_GATE_ERROR_TTL_MS),
        }
    }
}

impl DeskConfig {
    /// Builds a default config with the given gate secret.
    pub fn with_gate_secret(secret: impl Into<String>) -> Self {
        Self {
            gate: GateConfig::with_secret(secret),
            ..Self::default()
        }
    }

    /// Reads `SIGNUP_GATE_SECRET` and `SIGNUP_GATE_MAX_ATTEMPTS`.
    ///
    /// Unparseable attempt limits are ignored (no lockout).
    pub fn from_env() -> Self {
        let secret = non_blank_env(ENV_GATE_SECRET);
        let max_failed_attempts = non_blank_env(ENV_GATE_MAX_ATTEMPTS)
            .and_then(|raw| raw.parse::<u32>().ok())
            .filter(|limit| *limit > 0);
        Self {
            gate: GateConfig {
                secret,
                max_failed_attempts,
            },
            ..Self::default()
        }
    }
}

/// Resolves the database path from `SIGNUP_DB_PATH`, falling back to the
/// system temp directory.
pub fn resolve_db_path() -> PathBuf {
    non_blank_env(ENV_DB_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}
