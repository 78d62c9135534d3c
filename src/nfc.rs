//! NFC payload attached to store cards.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{PassError, Result};

/// Longest message the terminal accepts, in bytes.
pub const MAX_NFC_MESSAGE_LEN: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawNfcPayload")]
pub struct NfcPayload {
    message: String,
    /// Base64 of the DER-encoded X.509 SubjectPublicKeyInfo.
    #[serde(skip_serializing_if = "Option::is_none")]
    encryption_public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    requires_authentication: Option<bool>,
}

/// Descriptor shape before the message limit is checked.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNfcPayload {
    #[serde(default)]
    message: String,
    encryption_public_key: Option<String>,
    requires_authentication: Option<bool>,
}

impl TryFrom<RawNfcPayload> for NfcPayload {
    type Error = PassError;

    fn try_from(raw: RawNfcPayload) -> Result<Self> {
        let mut nfc = NfcPayload::new(raw.message)?;
        nfc.encryption_public_key = raw.encryption_public_key.filter(|k| !k.is_empty());
        nfc.requires_authentication = raw.requires_authentication;
        Ok(nfc)
    }
}

fn check_message(message: &str) -> Result<()> {
    if message.len() > MAX_NFC_MESSAGE_LEN {
        return Err(PassError::type_error(format!(
            "NFC message must be at most {MAX_NFC_MESSAGE_LEN} bytes, received {}",
            message.len()
        )));
    }
    Ok(())
}

impl NfcPayload {
    pub fn new(message: impl Into<String>) -> Result<Self> {
        let message = message.into();
        check_message(&message)?;
        Ok(Self {
            message,
            ..Default::default()
        })
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        check_message(&message)?;
        self.message = message;
        Ok(())
    }

    pub fn encryption_public_key(&self) -> Option<&str> {
        self.encryption_public_key.as_deref()
    }

    pub fn with_public_key_der(mut self, der: &[u8]) -> Self {
        self.encryption_public_key =
            Some(base64::engine::general_purpose::STANDARD.encode(der));
        self
    }

    pub fn requires_authentication(&self) -> Option<bool> {
        self.requires_authentication
    }

    pub fn with_requires_authentication(mut self, required: bool) -> Self {
        self.requires_authentication = Some(required);
        self
    }

    /// An empty payload is left out of the descriptor.
    pub fn is_empty(&self) -> bool {
        self.message.is_empty() && self.encryption_public_key.is_none()
    }
}
