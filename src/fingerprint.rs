//! Compatibility fingerprints for generated records

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 64-bit compatibility marker derived from a record's shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(i64);

impl Fingerprint {
    /// Compute the fingerprint of a record shape.
    ///
    /// Hashes `name`, then `field:signature` for every field in declaration
    /// order, then every capability, and folds the first 8 SHA-256 bytes
    /// big-endian.
    pub fn from_shape<'a, F, C>(name: &str, fields: F, capabilities: C) -> Self
    where
        F: IntoIterator<Item = (&'a str, &'a str)>,
        C: IntoIterator<Item = &'a str>,
    {
        let mut text = String::from(name);
        for (field, signature) in fields {
            text.push_str(field);
            text.push(':');
            text.push_str(signature);
        }
        for capability in capabilities {
            text.push_str(capability);
        }
        Self::from_bytes(text.as_bytes())
    }

    /// Fold the leading digest bytes of `data`
    pub fn from_bytes(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        Self(i64::from_be_bytes(head))
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Fingerprint {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_consistency() {
        let a = Fingerprint::from_shape("Order", [("id", "LONG")], ["Auditable"]);
        let b = Fingerprint::from_shape("Order", [("id", "LONG")], ["Auditable"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_known_value() {
        // SHA-256("abc") starts with ba 78 16 bf 8f 01 cf ea
        let fp = Fingerprint::from_bytes(b"abc");
        assert_eq!(fp.as_i64(), i64::from_be_bytes([0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea]));
    }

    #[test]
    fn test_fingerprint_is_order_sensitive() {
        let a = Fingerprint::from_shape("Order", [("id", "LONG"), ("note", "STRING")], []);
        let b = Fingerprint::from_shape("Order", [("note", "STRING"), ("id", "LONG")], []);
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_capabilities() {
        let plain = Fingerprint::from_shape("Order", [("id", "LONG")], []);
        let marked = Fingerprint::from_shape("Order", [("id", "LONG")], ["Auditable"]);
        assert_ne!(plain, marked);
    }
}
