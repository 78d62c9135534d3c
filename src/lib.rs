//! PassForge Core - Signed Wallet Pass Compiler
//!
//! # The Rules (Non-Negotiable)
//! 1. One Style At A Time
//! 2. Setters Reject, Never Repair
//! 3. Images Are Checked On Entry
//! 4. Every Member Is In The Manifest
//! 5. Assemble Always Validates
//! 6. No Partial Bundles

pub mod attributes;
pub mod barcode;
pub mod color;
pub mod constants;
pub mod error;
pub mod fields;
pub mod geo;
pub mod hashing;
pub mod images;
pub mod locale;
pub mod localization;
pub mod nfc;
pub mod options;
pub mod pipeline;
pub mod signing;
pub mod structure;
pub mod w3cdate;

pub use attributes::{ColorField, PassFields};
pub use barcode::{Barcode, Beacon};
pub use color::PassColor;
pub use constants::{BarcodeFormat, DateStyle, Style, TransitType, PASS_MIME_TYPE};
pub use error::{PassError, Result};
pub use fields::{DateTimeOptions, Field, FieldValue, FieldsMap};
pub use geo::{GeoInput, GeoPoint, Location};
pub use hashing::{canonical_json, DigestAlgorithm, Manifest};
pub use images::{Density, ImageSource, ImageType, PassImages};
pub use localization::Localizations;
pub use nfc::NfcPayload;
pub use options::PassOptions;
pub use pipeline::{BundleContents, BundleMember, Pass};
pub use signing::{ManifestSigner, SigningIdentity};
pub use structure::{PassStructure, StructureField};
pub use w3cdate::DateInput;

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
