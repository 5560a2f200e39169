use serde::Serialize;
use sha2::{Digest, Sha256};

/// Incremental SHA-256 over a sequence of labelled parts.
///
/// Each part is length-prefixed so that `("ab", "c")` and `("a", "bc")`
/// never produce the same digest.
#[derive(Clone, Default)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_str(mut self, part: &str) -> Self {
        self.push_bytes(part.as_bytes());
        self
    }

    pub fn with_json<T: Serialize + ?Sized>(mut self, value: &T) -> crate::Result<Self> {
        let bytes = serde_json::to_vec(value)?;
        self.push_bytes(&bytes);
        Ok(self)
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
    }

    pub fn finish(self) -> String {
        format!("{:x}", self.hasher.finalize())
    }

    /// First `len` hex characters of the digest.
    pub fn finish_short(self, len: usize) -> String {
        let hex = self.finish();
        hex[..len.min(hex.len())].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fingerprint_stable() {
        let first = Fingerprint::new().with_str("scored").finish();
        let second = Fingerprint::new().with_str("scored").finish();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn parts_are_length_prefixed() {
        let a = Fingerprint::new().with_str("ab").with_str("c").finish();
        let b = Fingerprint::new().with_str("a").with_str("bc").finish();
        assert_ne!(a, b);
    }

    #[test]
    fn json_parts_change_digest() {
        let a = Fingerprint::new()
            .with_json(&json!({"likes": 1}))
            .unwrap()
            .finish();
        let b = Fingerprint::new()
            .with_json(&json!({"likes": 2}))
            .unwrap()
            .finish();
        assert_ne!(a, b);
    }

    #[test]
    fn short_digest_is_prefix() {
        let full = Fingerprint::new().with_str("x").finish();
        let short = Fingerprint::new().with_str("x").finish_short(16);
        assert_eq!(short.len(), 16);
        assert!(full.starts_with(&short));
    }
}
