//! Manifest signing.
//!
//! The cryptography lives behind `ManifestSigner`; this crate only decides
//! what gets signed and where the signature goes.

use crate::error::Result;

/// Certificate and private key handed to the signer as opaque bytes.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SigningIdentity {
    pub certificate: Vec<u8>,
    pub private_key: Vec<u8>,
    pub key_password: Option<String>,
}

// keep key material out of logs
impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("certificate", &format_args!("{} bytes", self.certificate.len()))
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl SigningIdentity {
    pub fn new(certificate: impl Into<Vec<u8>>, private_key: impl Into<Vec<u8>>) -> Self {
        Self {
            certificate: certificate.into(),
            private_key: private_key.into(),
            key_password: None,
        }
    }
}

/// Produces the detached signature stored as the bundle's `signature` file.
pub trait ManifestSigner {
    fn sign(&self, identity: &SigningIdentity, manifest: &[u8]) -> Result<Vec<u8>>;
}

impl<F> ManifestSigner for F
where
    F: Fn(&SigningIdentity, &[u8]) -> Result<Vec<u8>>,
{
    fn sign(&self, identity: &SigningIdentity, manifest: &[u8]) -> Result<Vec<u8>> {
        self(identity, manifest)
    }
}
