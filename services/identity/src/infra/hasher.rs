use anyhow::anyhow;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngExt;

use crate::config::IdentityConfig;
use crate::domain::repository::CredentialHasher;

/// Charset for session tokens (URL-safe alphanumeric plus `-` and `_`).
const TOKEN_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Width of the `identities.session_token` column.
pub const MAX_TOKEN_LEN: usize = 64;

/// Argon2id password hasher producing PHC strings.
///
/// Verification reads the parameters embedded in the stored hash, so hashes
/// created under older settings keep verifying after a config change.
#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
    token_len: usize,
}

impl Argon2Hasher {
    pub fn new(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
        token_len: usize,
    ) -> anyhow::Result<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| anyhow!("invalid argon2 params: {e}"))?;
        if token_len == 0 || token_len > MAX_TOKEN_LEN {
            return Err(anyhow!(
                "session token length must be between 1 and {MAX_TOKEN_LEN}, got {token_len}"
            ));
        }
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            token_len,
        })
    }

    pub fn from_config(config: &IdentityConfig) -> anyhow::Result<Self> {
        Self::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
            config.session_token_len,
        )
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| anyhow!("hash password: {e}"))?;
        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, hash: &str) -> anyhow::Result<bool> {
        // An identity that never had a password set cannot authenticate.
        if hash.is_empty() {
            return Ok(false);
        }
        let parsed = PasswordHash::new(hash).map_err(|e| anyhow!("malformed credential hash: {e}"))?;
        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(anyhow!("verify password: {e}")),
        }
    }

    fn random_token(&self) -> String {
        let mut rng = rand::rng();
        (0..self.token_len)
            .map(|_| TOKEN_CHARSET[rng.random_range(0..TOKEN_CHARSET.len())] as char)
            .collect()
    }
}
