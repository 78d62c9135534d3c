//! Barcode and beacon dictionaries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::BarcodeFormat;
use crate::error::{PassError, Result};

pub const DEFAULT_MESSAGE_ENCODING: &str = "iso-8859-1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Barcode {
    pub format: BarcodeFormat,
    pub message: String,
    pub message_encoding: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

impl Barcode {
    pub fn new(format: BarcodeFormat, message: impl Into<String>) -> Self {
        Self {
            format,
            message: message.into(),
            message_encoding: DEFAULT_MESSAGE_ENCODING.to_string(),
            alt_text: None,
        }
    }

    /// Check an untyped barcode dictionary field by field.
    pub fn from_json(value: &Value) -> Result<Self> {
        let format = value.get("format").and_then(Value::as_str).unwrap_or_default();
        let format: BarcodeFormat = format.parse().map_err(|_| {
            PassError::type_error(format!(
                "Barcode format value {} is invalid!",
                value.get("format").unwrap_or(&Value::Null)
            ))
        })?;
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| PassError::type_error("Barcode message string is required"))?;
        let message_encoding = value
            .get("messageEncoding")
            .and_then(Value::as_str)
            .ok_or_else(|| PassError::type_error("Barcode messageEncoding is required"))?;
        Ok(Self {
            format,
            message: message.to_string(),
            message_encoding: message_encoding.to_string(),
            alt_text: value.get("altText").and_then(Value::as_str).map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beacon {
    #[serde(rename = "proximityUUID")]
    pub proximity_uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_text: Option<String>,
}

impl Beacon {
    pub fn new(proximity_uuid: impl Into<String>) -> Self {
        Self {
            proximity_uuid: proximity_uuid.into(),
            major: None,
            minor: None,
            relevant_text: None,
        }
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let missing = || PassError::type_error("each beacon must contain proximityUUID");
        match value.get("proximityUUID").and_then(Value::as_str) {
            Some(uuid) if !uuid.is_empty() => {}
            _ => return Err(missing()),
        }
        serde_json::from_value(value.clone())
            .map_err(|e| PassError::type_error(format!("Invalid beacon {value}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_barcode_from_json_checks_every_key() {
        let ok = json!({"format": "PKBarcodeFormatQR", "message": "123", "messageEncoding": "utf-8"});
        assert_eq!(Barcode::from_json(&ok).unwrap().format, BarcodeFormat::Qr);

        let bad_format = json!({"format": "PKBarcodeFormatEAN", "message": "1", "messageEncoding": "x"});
        let err = Barcode::from_json(&bad_format).unwrap_err();
        assert!(err.to_string().contains("PKBarcodeFormatEAN"));

        let no_message = json!({"format": "PKBarcodeFormatQR", "messageEncoding": "x"});
        assert!(Barcode::from_json(&no_message).is_err());
        let no_encoding = json!({"format": "PKBarcodeFormatQR", "message": "1"});
        assert!(Barcode::from_json(&no_encoding).is_err());
    }

    #[test]
    fn test_beacon_requires_uuid() {
        assert!(Beacon::from_json(&json!({"major": 1})).is_err());
        assert!(Beacon::from_json(&json!({"proximityUUID": ""})).is_err());
        let b = Beacon::from_json(&json!({"proximityUUID": "E2C56DB5", "minor": 3})).unwrap();
        assert_eq!(b.minor, Some(3));
        assert_eq!(
            serde_json::to_value(&b).unwrap(),
            json!({"proximityUUID": "E2C56DB5", "minor": 3})
        );
    }
}
