use sha2::{Digest, Sha256};

/// Hash a secret (password or OTP code) for at-rest storage.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn verify(input: &str, stored_hash: &str) -> bool {
    sha256_hex(input) == stored_hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_hex() {
        let h = sha256_hex("changeme");
        assert_eq!(h.len(), 64);
        assert_eq!(h, sha256_hex("changeme"));
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn verify_matches_only_the_original_secret() {
        let h = sha256_hex("s3cret");
        assert!(verify("s3cret", &h));
        assert!(!verify("s3cret ", &h));
        assert!(!verify("other", &h));
    }
}
