//! Password hashing and verification
//!
//! New credentials use PBKDF2-HMAC-SHA256 with a per-password salt. Hashes
//! created by the previous system (SHA-256 with one application-wide salt)
//! still verify, and are reported as needing an upgrade.

use crate::{
    auth::codec,
    config::{AppConfig, SecurityConfig},
    error::AppError,
};
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, Secret};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Prefix of the self-describing PBKDF2 format
pub const PBKDF2_PREFIX: &str = "pbkdf2_sha256";

const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;
const MAX_ITERATIONS: u32 = 10_000_000;

/// A parsed stored password hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredCredential {
    /// `hex(sha256(password ‖ legacy_salt))`
    Legacy { digest: [u8; 32] },
    /// `pbkdf2_sha256$<iterations>$<salt>$<key>`, salt and key base64url
    Pbkdf2 {
        iterations: u32,
        salt: Vec<u8>,
        key: Vec<u8>,
    },
}

impl StoredCredential {
    /// Recognize one of the two stored formats
    pub fn parse(stored: &str) -> Option<Self> {
        let stored = stored.trim();

        if let Some(rest) = stored
            .strip_prefix(PBKDF2_PREFIX)
            .and_then(|rest| rest.strip_prefix('$'))
        {
            let mut fields = rest.split('$');
            let (Some(iterations), Some(salt), Some(key), None) =
                (fields.next(), fields.next(), fields.next(), fields.next())
            else {
                return None;
            };

            let iterations: u32 = iterations.parse().ok()?;
            let salt = codec::decode(salt).ok()?;
            let key = codec::decode(key).ok()?;

            if iterations == 0 || iterations > MAX_ITERATIONS || salt.is_empty() {
                return None;
            }
            if key.is_empty() || key.len() > 64 {
                return None;
            }

            return Some(StoredCredential::Pbkdf2 {
                iterations,
                salt,
                key,
            });
        }

        if stored.len() == 64 {
            let mut digest = [0u8; 32];
            hex::decode_to_slice(stored, &mut digest).ok()?;
            return Some(StoredCredential::Legacy { digest });
        }

        None
    }

    /// Text form as stored in the database (legacy digests render as hex)
    pub fn encode(&self) -> String {
        match self {
            StoredCredential::Legacy { digest } => hex::encode(digest),
            StoredCredential::Pbkdf2 {
                iterations,
                salt,
                key,
            } => format!(
                "{}${}${}${}",
                PBKDF2_PREFIX,
                iterations,
                codec::encode(salt),
                codec::encode(key)
            ),
        }
    }
}

/// Outcome of a password check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PasswordVerification {
    pub valid: bool,
    /// The stored hash should be replaced with a fresh [`PasswordHasher::hash`]
    pub needs_upgrade: bool,
}

impl PasswordVerification {
    const REJECTED: Self = Self {
        valid: false,
        needs_upgrade: false,
    };
}

/// Password hasher with configurable parameters
pub struct PasswordHasher {
    iterations: u32,
    legacy_salt: Option<Secret<String>>,
    /// Hash of a random secret, checked when no stored hash exists
    decoy: String,
}

impl PasswordHasher {
    /// `legacy_salt` enables verification of pre-migration hashes
    pub fn new(iterations: u32, legacy_salt: Option<Secret<String>>) -> Self {
        let iterations = iterations.clamp(1, MAX_ITERATIONS);

        let mut secret = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut secret);
        let decoy = Self::derive(&hex::encode(secret), iterations);

        Self {
            iterations,
            legacy_salt,
            decoy,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.security.password_iterations,
            config.security.legacy_password_salt.clone(),
        )
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> String {
        Self::derive(password, self.iterations)
    }

    fn derive(password: &str, iterations: u32) -> String {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let mut key = [0u8; KEY_LEN];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut key);

        StoredCredential::Pbkdf2 {
            iterations,
            salt: salt.to_vec(),
            key: key.to_vec(),
        }
        .encode()
    }

    /// Spend the same work as [`verify`](Self::verify) for an account that does not exist.
    /// Always rejects.
    pub fn verify_decoy(&self, password: &str) -> PasswordVerification {
        std::hint::black_box(self.verify(password, &self.decoy));
        PasswordVerification::REJECTED
    }

    /// Verify a password against a stored hash; never fails
    pub fn verify(&self, password: &str, stored: &str) -> PasswordVerification {
        let Some(credential) = StoredCredential::parse(stored) else {
            tracing::debug!("Stored password hash has an unrecognized format");
            return PasswordVerification::REJECTED;
        };

        match credential {
            StoredCredential::Pbkdf2 {
                iterations,
                salt,
                key,
            } => {
                let mut derived = vec![0u8; key.len()];
                pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut derived);

                PasswordVerification {
                    valid: derived[..].ct_eq(&key[..]).into(),
                    needs_upgrade: false,
                }
            }
            StoredCredential::Legacy { digest } => {
                let Some(legacy_salt) = &self.legacy_salt else {
                    tracing::warn!("Legacy password hash found but no legacy salt is configured");
                    return PasswordVerification::REJECTED;
                };

                let expected = legacy_digest(password, legacy_salt.expose_secret());
                let valid: bool = expected[..].ct_eq(&digest[..]).into();

                PasswordVerification {
                    valid,
                    needs_upgrade: valid,
                }
            }
        }
    }

    /// Validate password against policy
    pub fn validate_password_policy(password: &str, policy: &SecurityConfig) -> Result<(), AppError> {
        // Check length
        if password.chars().count() < policy.password_min_length {
            return Err(AppError::BadRequest(format!(
                "Password must be at least {} characters",
                policy.password_min_length
            )));
        }

        // Check uppercase
        if policy.password_require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            return Err(AppError::BadRequest(
                "Password must contain at least one uppercase letter".to_string(),
            ));
        }

        // Check digit
        if policy.password_require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AppError::BadRequest(
                "Password must contain at least one digit".to_string(),
            ));
        }

        // Check special character
        if policy.password_require_special && password.chars().all(char::is_alphanumeric) {
            return Err(AppError::BadRequest(
                "Password must contain at least one special character".to_string(),
            ));
        }

        Ok(())
    }
}

/// Hex digest in the previous system's format
pub fn legacy_hash(password: &str, legacy_salt: &str) -> String {
    hex::encode(legacy_digest(password, legacy_salt))
}

fn legacy_digest(password: &str, legacy_salt: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(legacy_salt.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST_ITERATIONS: u32 = 1_000;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(FAST_ITERATIONS, Some(Secret::new("club-salt".to_string())))
    }

    #[test]
    fn test_hash_format() {
        let hash = hasher().hash("Socio2024");
        let fields: Vec<&str> = hash.split('$').collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0], PBKDF2_PREFIX);
        assert_eq!(fields[1], "1000");

        match StoredCredential::parse(&hash).unwrap() {
            StoredCredential::Pbkdf2 { salt, key, .. } => {
                assert_eq!(salt.len(), SALT_LEN);
                assert_eq!(key.len(), KEY_LEN);
            }
            other => panic!("unexpected credential: {:?}", other),
        }
    }

    #[test]
    fn test_parse_round_trips_encode() {
        let hash = hasher().hash("Socio2024");
        assert_eq!(StoredCredential::parse(&hash).unwrap().encode(), hash);

        let legacy = legacy_hash("Socio2024", "club-salt");
        assert_eq!(StoredCredential::parse(&legacy).unwrap().encode(), legacy);
    }

    #[test]
    fn test_parse_rejects_unknown_formats() {
        let not_hex = "z".repeat(64);
        let too_short = "a".repeat(63);
        for stored in [
            "",
            "plaintext",
            "pbkdf2_sha256$abc$c2FsdA$a2V5",
            "pbkdf2_sha256$0$c2FsdA$a2V5",
            "pbkdf2_sha256$1000$c2FsdA",
            "pbkdf2_sha256$1000$c2FsdA$a2V5$extra",
            "pbkdf2_sha256$1000$$a2V5",
            "$argon2id$v=19$m=65536,t=3,p=4$c2FsdA$a2V5",
            not_hex.as_str(),
            too_short.as_str(),
        ] {
            assert_eq!(StoredCredential::parse(stored), None, "{stored}");
        }
    }

    #[test]
    fn test_legacy_requires_configured_salt() {
        let stored = legacy_hash("Socio2024", "club-salt");
        let without_salt = PasswordHasher::new(FAST_ITERATIONS, None);

        assert_eq!(
            without_salt.verify("Socio2024", &stored),
            PasswordVerification::default()
        );
    }

    #[test]
    fn test_legacy_hash_is_case_insensitive_hex() {
        let stored = legacy_hash("Socio2024", "club-salt").to_uppercase();
        let result = hasher().verify("Socio2024", &stored);
        assert!(result.valid);
        assert!(result.needs_upgrade);
    }

    #[test]
    fn test_decoy_costs_configured_iterations() {
        let hasher = hasher();
        match StoredCredential::parse(&hasher.decoy) {
            Some(StoredCredential::Pbkdf2 { iterations, key, .. }) => {
                assert_eq!(iterations, FAST_ITERATIONS);
                assert_eq!(key.len(), KEY_LEN);
            }
            other => panic!("unexpected decoy: {:?}", other),
        }

        assert_eq!(hasher.verify_decoy("Socio2024"), PasswordVerification::default());
        assert_eq!(hasher.verify_decoy(""), PasswordVerification::default());
    }

    #[test]
    fn test_zero_iterations_clamped() {
        let hasher = PasswordHasher::new(0, None);
        assert_eq!(hasher.iterations(), 1);
        let hash = hasher.hash("x");
        assert!(hasher.verify("x", &hash).valid);
    }
}
