/// Password hashing and verification using Argon2id
///
/// Hashes are PHC strings: algorithm, parameters and the random salt are
/// encoded in the output, so verification needs nothing but the stored string.
/// The work factor comes from [`PasswordConfig`].
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2, Params,
};
use gatehouse_core::AuthConfig;
use thiserror::Error;

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Argon2 work factor
///
/// Increasing memory or iterations improves brute-force resistance but slows
/// down every register and login.
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Memory cost in KiB (default: 19456 = 19 MiB)
    pub memory_cost: u32,
    /// Time cost (iterations, default: 2)
    pub time_cost: u32,
    /// Parallelism (lanes, default: 1)
    pub parallelism: u32,
    /// Output length in bytes (default: 32)
    pub output_len: Option<usize>,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost: 19_456,
            time_cost: 2,
            parallelism: 1,
            output_len: Some(32),
        }
    }
}

impl From<&AuthConfig> for PasswordConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            memory_cost: config.password_memory_kib,
            time_cost: config.password_time_cost,
            parallelism: config.password_parallelism,
            ..Self::default()
        }
    }
}

impl PasswordConfig {
    fn to_params(&self) -> Result<Params, PasswordError> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            self.output_len,
        )
        .map_err(|e| PasswordError::InvalidParams(e.to_string()))
    }
}

/// Salted one-way password hasher
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Create a hasher, rejecting parameters Argon2 cannot run with
    pub fn new(config: &PasswordConfig) -> Result<Self, PasswordError> {
        Ok(Self {
            params: config.to_params()?,
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            self.params.clone(),
        )
    }

    /// Hash a plaintext password with a fresh random salt
    ///
    /// # Example
    ///
    /// ```no_run
    /// use gatehouse_api::auth::password::{Argon2Hasher, PasswordConfig};
    ///
    /// let hasher = Argon2Hasher::new(&PasswordConfig::default()).unwrap();
    /// let hash = hasher.hash("SecurePass456!").unwrap();
    /// assert!(hash.starts_with("$argon2id$"));
    /// ```
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        Ok(password_hash.to_string())
    }

    /// Verify a plaintext password against a stored hash
    ///
    /// The parameters recorded in `hash` are used, so hashes produced under an
    /// older work factor keep verifying.
    ///
    /// * `Ok(true)` - Password matches
    /// * `Ok(false)` - Password does not match
    /// * `Err(PasswordError)` - The stored hash is unusable
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

        match self
            .argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
        }
    }
}
