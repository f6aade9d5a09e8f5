//! Checksum manifests: one `<checksum> <filename>` entry per line.

use crate::error::{ReleaseError, Result};
use sha2::{Digest as _, Sha256};

/// An expected digest; the algorithm follows from the hex length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checksum {
    /// 32 hex characters
    Md5(String),
    /// 64 hex characters
    Sha256(String),
}

impl Checksum {
    /// Interpret a hex digest. Returns `None` for unknown lengths or non-hex input.
    pub fn parse(hex_digest: &str) -> Option<Self> {
        if !hex_digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let digest = hex_digest.to_ascii_lowercase();
        match digest.len() {
            32 => Some(Checksum::Md5(digest)),
            64 => Some(Checksum::Sha256(digest)),
            _ => None,
        }
    }

    /// The expected hex digest.
    pub fn expected(&self) -> &str {
        match self {
            Checksum::Md5(d) | Checksum::Sha256(d) => d,
        }
    }

    /// Hex digest of `data` using this checksum's algorithm.
    pub fn compute(&self, data: &[u8]) -> String {
        match self {
            Checksum::Md5(_) => format!("{:x}", md5::compute(data)),
            Checksum::Sha256(_) => hex::encode(Sha256::digest(data)),
        }
    }

    /// Verify `data`, reporting the mismatch against `file`.
    pub fn verify(&self, file: &str, data: &[u8]) -> Result<()> {
        let actual = self.compute(data);
        if actual.eq_ignore_ascii_case(self.expected()) {
            Ok(())
        } else {
            Err(ReleaseError::IntegrityError {
                file: file.to_string(),
                expected: self.expected().to_string(),
                actual,
            })
        }
    }
}

/// Parsed checksum manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumManifest {
    entries: Vec<(String, String)>,
}

impl ChecksumManifest {
    /// Parse manifest text. Lines with fewer than two fields are ignored; a
    /// leading `*` on the file name (binary-mode md5sum output) is dropped.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                let digest = fields.next()?;
                let name = fields.next()?;
                let name = name.strip_prefix('*').unwrap_or(name);
                Some((digest.to_string(), name.to_string()))
            })
            .collect();
        Self { entries }
    }

    /// Raw digest recorded for the exact file name, first entry wins.
    pub fn digest_for(&self, file: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, name)| name == file)
            .map(|(digest, _)| digest.as_str())
    }

    /// Expected checksum for `file` fetched from `manifest_url`.
    pub fn checksum_for(&self, file: &str, manifest_url: &str) -> Result<Checksum> {
        let digest = self
            .digest_for(file)
            .ok_or_else(|| ReleaseError::MissingChecksum {
                file: file.to_string(),
                manifest_url: manifest_url.to_string(),
            })?;
        Checksum::parse(digest).ok_or_else(|| ReleaseError::IntegrityError {
            file: file.to_string(),
            expected: digest.to_string(),
            actual: "<unsupported digest format>".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_MD5: &str = "5d41402abc4b2a76b9719d911017c592";
    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn algorithm_follows_digest_length() {
        assert!(matches!(Checksum::parse(HELLO_MD5), Some(Checksum::Md5(_))));
        assert!(matches!(Checksum::parse(HELLO_SHA256), Some(Checksum::Sha256(_))));
        assert_eq!(Checksum::parse("abc123"), None);
        assert_eq!(Checksum::parse(&"z".repeat(32)), None);
    }

    #[test]
    fn verify_matches_and_mismatches() {
        let md5 = Checksum::parse(&HELLO_MD5.to_uppercase()).unwrap();
        assert!(md5.verify("hello.zip", b"hello").is_ok());

        let sha = Checksum::parse(HELLO_SHA256).unwrap();
        assert!(sha.verify("hello.zip", b"hello").is_ok());

        match md5.verify("hello.zip", b"tampered") {
            Err(ReleaseError::IntegrityError { file, expected, .. }) => {
                assert_eq!(file, "hello.zip");
                assert_eq!(expected, HELLO_MD5);
            }
            other => panic!("expected IntegrityError, got {other:?}"),
        }
    }

    #[test]
    fn manifest_lookup_is_exact() {
        let text = format!(
            "{HELLO_MD5}  bundle.zip.old\n\n{HELLO_SHA256} *bundle.zip\nmalformed\n"
        );
        let manifest = ChecksumManifest::parse(&text);
        assert_eq!(manifest.digest_for("bundle.zip"), Some(HELLO_SHA256));
        assert_eq!(manifest.digest_for("bundle"), None);

        let err = manifest.checksum_for("other.zip", "https://x/sums").unwrap_err();
        assert!(matches!(err, ReleaseError::MissingChecksum { .. }));
    }
}
