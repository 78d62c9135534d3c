//! Assembly Pipeline - Single Entry Point
//!
//! CRITICAL: assemble MUST call validate internally. No bypass.
//!
//! Stages run strictly in order: serialize, collect members, hash every
//! member, build the manifest, sign it, zip. Any failure before the zip
//! stage returns an error and no bytes.

use std::io::{Cursor, Write};

use serde_json::{Map, Value};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::attributes::PassFields;
use crate::constants::{Style, FORMAT_VERSION};
use crate::error::{PassError, Result};
use crate::hashing::Manifest;
use crate::images::PassImages;
use crate::localization::Localizations;
use crate::options::PassOptions;
use crate::signing::{ManifestSigner, SigningIdentity};
use crate::structure::PassStructure;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

pub const PASS_JSON: &str = "pass.json";
pub const MANIFEST_JSON: &str = "manifest.json";
pub const SIGNATURE: &str = "signature";

/// One file of the output bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleMember {
    pub path: String,
    pub data: Vec<u8>,
}

/// Everything that goes into the bundle before signing.
#[derive(Debug, Clone)]
pub struct BundleContents {
    pub members: Vec<BundleMember>,
    pub manifest: Manifest,
}

impl BundleContents {
    pub fn manifest_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.manifest.to_bytes()?)
    }
}

/// A pass being built: descriptor attributes, style structure, images,
/// localizations and the identity used to sign it.
#[derive(Debug, Clone, Default)]
pub struct Pass {
    options: PassOptions,
    fields: PassFields,
    structure: PassStructure,
    images: PassImages,
    localization: Localizations,
    identity: Option<SigningIdentity>,
}

impl Pass {
    pub fn new(options: PassOptions) -> Self {
        Self {
            fields: PassFields::with_allow_http(options.allow_http),
            options,
            ..Self::default()
        }
    }

    /// Hydrate from a descriptor, replaying every setter so the same rules
    /// apply as for a pass built by hand. Images and localizations are
    /// copied; the caller's values stay independent.
    pub fn from_json(
        descriptor: &Value,
        images: &PassImages,
        localization: &Localizations,
        options: PassOptions,
    ) -> Result<Self> {
        let obj = descriptor.as_object().ok_or_else(|| {
            PassError::type_error(format!("Pass descriptor must be an object, received {descriptor}"))
        })?;

        let mut pass = Pass::new(options);
        pass.structure = PassStructure::from_descriptor(obj)?;
        for (key, value) in obj {
            if key == "formatVersion" || key == "nfc" || key.parse::<Style>().is_ok() {
                continue;
            }
            if !pass.fields.apply_json(key, value)? {
                debug!(%key, "ignoring unknown descriptor key");
            }
        }
        pass.images = images.clone();
        pass.localization = localization.clone();
        Ok(pass)
    }

    pub fn options(&self) -> &PassOptions {
        &self.options
    }

    pub fn fields(&self) -> &PassFields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut PassFields {
        &mut self.fields
    }

    pub fn structure(&self) -> &PassStructure {
        &self.structure
    }

    pub fn structure_mut(&mut self) -> &mut PassStructure {
        &mut self.structure
    }

    pub fn images(&self) -> &PassImages {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut PassImages {
        &mut self.images
    }

    pub fn localization(&self) -> &Localizations {
        &self.localization
    }

    pub fn localization_mut(&mut self) -> &mut Localizations {
        &mut self.localization
    }

    pub fn set_identity(&mut self, identity: Option<SigningIdentity>) {
        self.identity = identity;
    }

    /// The `pass.json` object.
    pub fn to_json(&self) -> Result<Value> {
        let mut out = Map::new();
        out.insert("formatVersion".to_string(), Value::from(FORMAT_VERSION));
        if let Value::Object(attrs) = serde_json::to_value(&self.fields)? {
            out.extend(attrs);
        }
        if let Some((style, body)) = self.structure.style_entry()? {
            out.insert(style.as_str().to_string(), body);
        }
        if let Ok(nfc) = self.structure.nfc() {
            if !nfc.is_empty() {
                out.insert("nfc".to_string(), serde_json::to_value(nfc)?);
            }
        }
        Ok(Value::Object(out))
    }

    /// Check required attributes, the web service pairing and the images.
    ///
    /// This is the ONLY validation entry point.
    pub fn validate(&self) -> Result<()> {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        if let Some(missing) = self.fields.missing_required().first() {
            return Err(PassError::reference(format!("{missing} is required in a Pass")));
        }

        match (self.fields.web_service_url(), self.fields.authentication_token()) {
            (Some(_), None) => {
                return Err(PassError::reference(
                    "While webServiceURL is present, authenticationToken also required!",
                ))
            }
            (None, Some(_)) => {
                return Err(PassError::type_error(
                    "authenticationToken is presented in Pass data while webServiceURL is missing!",
                ))
            }
            _ => {}
        }

        self.images.validate()
    }

    /// Validated bundle members with their manifest, ready to be signed.
    pub fn manifest(&self) -> Result<BundleContents> {
        self.validate()?;
        self.collect_contents()
    }

    fn collect_contents(&self) -> Result<BundleContents> {
        let mut members = vec![BundleMember {
            path: PASS_JSON.to_string(),
            data: serde_json::to_vec(&self.to_json()?)?,
        }];
        members.extend(self.localization.to_members());
        members.extend(self.images.to_members()?);

        let mut manifest = Manifest::new();
        for member in &members {
            let digest = self.options.digest.hex_digest(&member.data);
            debug!(path = %member.path, %digest, bytes = member.data.len(), "member hashed");
            manifest.insert(member.path.clone(), digest);
        }

        Ok(BundleContents { members, manifest })
    }

    /// Produce the signed, zipped bundle.
    ///
    /// CRITICAL: This ALWAYS calls validate internally. No bypass possible.
    pub fn assemble(&self, signer: &impl ManifestSigner) -> Result<Vec<u8>> {
        // MANDATORY: Validation is always called. This is non-negotiable.
        self.validate()?;

        let identity = self.identity.as_ref();
        let identity = match identity {
            Some(id) if id.certificate.is_empty() => None,
            other => other,
        }
        .ok_or_else(|| {
            PassError::reference("Set pass certificate before producing pass bundles")
        })?;
        if identity.private_key.is_empty() {
            return Err(PassError::reference(
                "Set private key before producing pass bundles",
            ));
        }

        let BundleContents { mut members, manifest } = self.collect_contents()?;
        let manifest_bytes = manifest.to_bytes()?;
        let signature = signer.sign(identity, &manifest_bytes)?;

        members.push(BundleMember {
            path: MANIFEST_JSON.to_string(),
            data: manifest_bytes,
        });
        members.push(BundleMember {
            path: SIGNATURE.to_string(),
            data: signature,
        });

        let bundle = zip_members(&members)?;
        info!(
            serial_number = self.fields.serial_number().unwrap_or_default(),
            members = members.len(),
            bytes = bundle.len(),
            "pass assembled"
        );
        Ok(bundle)
    }
}

fn zip_members(members: &[BundleMember]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for member in members {
        zip.start_file(member.path.as_str(), options)?;
        zip.write_all(&member.data)?;
    }
    Ok(zip.finish()?.into_inner())
}
