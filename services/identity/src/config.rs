use serde::Deserialize;

use tessera_core::config::Config;

/// Identity service configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// Length of generated session tokens, 1 to 64 (default 32). Env var: `SESSION_TOKEN_LEN`.
    #[serde(default = "default_session_token_len")]
    pub session_token_len: usize,
    /// How many times a failed role assign is attempted before giving up
    /// (default 2). Env var: `ROLE_SYNC_ASSIGN_ATTEMPTS`.
    #[serde(default = "default_role_sync_assign_attempts")]
    pub role_sync_assign_attempts: u32,
    /// Argon2 memory cost in KiB (default 19456). Env var: `ARGON2_MEMORY_KIB`.
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,
    /// Argon2 iterations (default 2). Env var: `ARGON2_ITERATIONS`.
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,
    /// Argon2 lanes (default 1). Env var: `ARGON2_PARALLELISM`.
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

impl Config for IdentityConfig {}

fn default_session_token_len() -> usize {
    32
}

fn default_role_sync_assign_attempts() -> u32 {
    2
}

fn default_argon2_memory_kib() -> u32 {
    19 * 1024
}

fn default_argon2_iterations() -> u32 {
    2
}

fn default_argon2_parallelism() -> u32 {
    1
}
