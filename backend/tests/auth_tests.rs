//! Authentication tests
//!
//! Pure tests for credential validation and refresh-token hashing.

use sha2::{Digest, Sha256};

use shared::validation::{validate_email, validate_password};

/// Hash a token the way the auth service stores refresh tokens
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(validate_email("admin@backoffice.example").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_password_minimum_length() {
        assert!(validate_password("longenough1").is_ok());
        assert!(validate_password("2short").is_err());
    }

    #[test]
    fn test_token_hash_is_stable() {
        let token = "3f2c9e1a-8b1a-4a7b-9d2e-111111111111";
        assert_eq!(hash_token(token), hash_token(token));
    }

    #[test]
    fn test_token_hash_differs_per_token() {
        assert_ne!(hash_token("token-a"), hash_token("token-b"));
    }

    #[test]
    fn test_token_hash_is_hex_sha256() {
        let digest = hash_token("anything");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
