use std::collections::BTreeSet;
use std::fmt;

use sha2::{Digest, Sha256};

/// SHA-256 digest of a secret. Registries keep only digests, so raw secrets
/// are dropped once startup is done.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Credential([u8; 32]);

impl Credential {
    pub fn from_secret(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Sensor names requested together with the credentials presented for them.
/// Duplicate credentials collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialPresentation {
    pub names: Vec<String>,
    pub credentials: BTreeSet<Credential>,
}

impl CredentialPresentation {
    pub fn new<N, S>(names: impl IntoIterator<Item = N>, secrets: impl IntoIterator<Item = S>) -> Self
    where
        N: Into<String>,
        S: AsRef<str>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            credentials: secrets.into_iter().map(|s| Credential::from_secret(s.as_ref())).collect(),
        }
    }

    pub fn presented(&self) -> usize {
        self.credentials.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_secrets_give_equal_credentials() {
        assert_eq!(Credential::from_secret("abc"), Credential::from_secret("abc"));
        assert_ne!(Credential::from_secret("abc"), Credential::from_secret("abd"));
    }

    #[test]
    fn duplicate_credentials_collapse() {
        let presentation = CredentialPresentation::new(["a", "b"], ["tok", "tok"]);
        assert_eq!(presentation.presented(), 1);
        assert_eq!(presentation.names, vec!["a", "b"]);
    }

    #[test]
    fn debug_does_not_print_full_digest() {
        let rendered = format!("{:?}", Credential::from_secret("secret"));
        assert!(rendered.len() < 20);
    }
}
