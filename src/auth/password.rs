use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

lazy_static! {
    // Verified against when the identifier matches nobody, so unknown
    // accounts cost the same Argon2 work as known ones.
    static ref DUMMY_HASH: Option<String> = hash("not-a-real-password").ok();
}

/// Argon2id PHC string for `plain`.
pub fn hash(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| {
            error!(error = %e, "argon2 hash error");
            anyhow::anyhow!("password hashing failed: {e}")
        })
}

pub fn verify(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "stored password hash unreadable");
        anyhow::anyhow!("invalid stored hash: {e}")
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Spends one verification on a throwaway hash; the result is discarded.
pub fn burn_verify(plain: &str) {
    if let Some(h) = DUMMY_HASH.as_deref() {
        let _ = verify(plain, h);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_verifies() {
        let stored = hash("hunter22").expect("hash");
        assert!(stored.starts_with("$argon2"));
        assert!(verify("hunter22", &stored).expect("verify"));
    }

    #[test]
    fn wrong_password_is_false_not_error() {
        let stored = hash("hunter22").expect("hash");
        assert!(!verify("hunter23", &stored).expect("verify"));
    }

    #[test]
    fn same_password_hashes_differently() {
        assert_ne!(hash("abcdef").unwrap(), hash("abcdef").unwrap());
    }

    #[test]
    fn malformed_hash_is_error() {
        assert!(verify("anything", "plaintext-in-db").is_err());
    }
}
