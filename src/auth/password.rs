use bcrypt::{BcryptError, DEFAULT_COST, hash, verify};

pub fn hash_password(plain: &str) -> Result<String, BcryptError> {
    hash(plain, DEFAULT_COST)
}

/// A malformed stored hash counts as a failed verification rather than an
/// error, so unknown-hash and wrong-password are indistinguishable to the
/// caller.
pub fn verify_password(plain: &str, hashed: &str) -> bool {
    verify(plain, hashed).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hashed = hash_password("password123").unwrap();
        assert!(verify_password("password123", &hashed));
        assert!(!verify_password("password124", &hashed));
    }

    #[test]
    fn garbage_hash_does_not_verify() {
        assert!(!verify_password("password123", "not-a-bcrypt-hash"));
    }
}
