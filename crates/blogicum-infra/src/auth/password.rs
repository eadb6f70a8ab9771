//! Argon2id password hashing.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use blogicum_core::ports::{AuthError, PasswordService};

/// Stores passwords as PHC strings (`$argon2id$v=19$...`).
///
/// Verification reads the cost parameters from the stored hash, so hashes
/// made under older parameters keep working after a cost change.
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
}

impl Argon2PasswordService {
    /// Argon2id with the crate's recommended cost.
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Argon2id with explicit memory (KiB), iteration and lane counts.
    pub fn with_cost(memory_kib: u32, iterations: u32, lanes: u32) -> Result<Self, AuthError> {
        let params = Params::new(memory_kib, iterations, lanes, None)
            .map_err(|e| AuthError::HashingError(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl Default for Argon2PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::HashingError(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let stored = PasswordHash::new(hash).map_err(|e| AuthError::HashingError(e.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &stored) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::HashingError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2PasswordService {
        Argon2PasswordService::with_cost(1024, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let service = cheap();

        let hash = service.hash("correct horse battery").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(service.verify("correct horse battery", &hash).unwrap());
        assert!(!service.verify("wrong horse battery", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_fresh_salt() {
        let service = cheap();

        let first = service.hash("same-password").unwrap();
        let second = service.hash("same-password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_hash_verifies_under_other_cost() {
        let hash = cheap().hash("correct horse battery").unwrap();

        assert!(
            Argon2PasswordService::new()
                .verify("correct horse battery", &hash)
                .unwrap()
        );
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        let result = cheap().verify("anything", "not-a-phc-string");
        assert!(matches!(result, Err(AuthError::HashingError(_))));
    }

    #[test]
    fn test_invalid_cost_rejected() {
        assert!(Argon2PasswordService::with_cost(0, 0, 0).is_err());
    }
}
