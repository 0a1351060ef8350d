//! # Store Entries
//!
//! The two record kinds held in the configuration store: certificate
//! authorities and leaf certificates. Both are read-only snapshots fetched
//! by name for the duration of one resolution.

use serde::{Deserialize, Serialize};

use crate::blob::Blob;

/// Which namespace of the configuration store an entry lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Certificate authority records (`sslmgmt::ca`).
    Ca,
    /// Leaf certificate records (`sslmgmt::certs`).
    Cert,
}

impl EntryKind {
    /// The configuration-store namespace holding entries of this kind.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Ca => "sslmgmt::ca",
            Self::Cert => "sslmgmt::certs",
        }
    }

    /// Returns the kind identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ca => "ca",
            Self::Cert => "cert",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A certificate authority record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaEntry {
    /// Unique name of the CA in `sslmgmt::ca`.
    pub name: String,
    /// The CA certificate.
    pub cert: Blob,
}

/// A leaf certificate record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertEntry {
    /// Unique name of the certificate in `sslmgmt::certs`.
    pub name: String,
    /// The leaf certificate.
    pub cert: Blob,
    /// The private key. `None` only when the request disabled key
    /// installation and the store entry carries no key.
    pub key: Option<Blob>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaces() {
        assert_eq!(EntryKind::Ca.namespace(), "sslmgmt::ca");
        assert_eq!(EntryKind::Cert.namespace(), "sslmgmt::certs");
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&EntryKind::Ca).unwrap(), "\"ca\"");
        let kind: EntryKind = serde_json::from_str("\"cert\"").unwrap();
        assert_eq!(kind, EntryKind::Cert);
    }
}
