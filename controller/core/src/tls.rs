use std::str::FromStr;

/// A server certificate and its private key, resolved from a `kubernetes.io/tls` secret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TlsSecret {
    pub name: String,
    pub namespace: String,
    pub cert_chain: Vec<u8>,
    pub private_key: Vec<u8>,
}

/// Trust anchors used to validate a peer, resolved from a secret's `ca.crt` entry.
///
/// The bundle's content is not parsed; it may hold any number of PEM blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaBundle {
    pub name: String,
    pub namespace: String,
    pub certificates: Vec<u8>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TlsVersion {
    #[default]
    V1_2,
    V1_3,
}

#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
#[error("unsupported TLS version: {0}")]
pub struct InvalidTlsVersion(String);

// === impl TlsVersion ===

impl FromStr for TlsVersion {
    type Err = InvalidTlsVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.2" => Ok(Self::V1_2),
            "1.3" => Ok(Self::V1_3),
            s => Err(InvalidTlsVersion(s.to_string())),
        }
    }
}

impl TlsVersion {
    /// Versions below the supported minimum are raised to it rather than rejected.
    pub fn parse_or_default(s: Option<&str>) -> Result<Self, InvalidTlsVersion> {
        match s {
            None | Some("") | Some("1.1") | Some("1.0") => Ok(Self::default()),
            Some(s) => s.parse(),
        }
    }
}

impl std::fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V1_2 => "1.2".fmt(f),
            Self::V1_3 => "1.3".fmt(f),
        }
    }
}
