use sha2::{Digest, Sha256};

pub(crate) fn hash_bytes_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    to_hex_lower(&hasher.finalize())
}

fn to_hex_lower(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        use std::fmt::Write as _;
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_content_sensitive() {
        let first = hash_bytes_hex(b"[]");
        assert_eq!(first, hash_bytes_hex(b"[]"));
        assert_eq!(first.len(), 64);
        assert_ne!(first, hash_bytes_hex(b"[{\"id\":1}]"));
    }

    #[test]
    fn empty_input_matches_known_digest() {
        assert_eq!(
            hash_bytes_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
