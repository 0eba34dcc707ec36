use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Generate an opaque bearer token key.
///
/// Keys are 32 lowercase hex chars; they carry no claims, the identity is
/// resolved by looking the key up in the token table.
pub fn generate_token_key() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Digest a raw password for storage.
pub fn hash_password(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Constant-shape check of a raw password against a stored digest.
pub fn verify_password(raw: &str, stored: &str) -> bool {
    hash_password(raw) == stored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_keys_are_unique_hex() {
        let a = generate_token_key();
        let b = generate_token_key();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn password_roundtrip() {
        let digest = hash_password("s3cret");
        assert!(verify_password("s3cret", &digest));
        assert!(!verify_password("other", &digest));
    }
}
