//! Contract Invariant Tests
//!
//! These tests verify the non-negotiable guarantees of the assembled bundle.

use std::io::{Cursor, Read};

use passforge::{
    Barcode, BarcodeFormat, Density, ImageType, Pass, PassError, PassOptions, Result,
    SigningIdentity, Style,
};
use serde_json::{json, Value};

const STUB_SIGNATURE_PREFIX: &[u8] = b"signed:";

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut v = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    v.extend_from_slice(&13u32.to_be_bytes());
    v.extend_from_slice(b"IHDR");
    v.extend_from_slice(&width.to_be_bytes());
    v.extend_from_slice(&height.to_be_bytes());
    v.extend_from_slice(&[8, 6, 0, 0, 0, 0, 0, 0, 0]);
    v
}

fn stub_signer(_: &SigningIdentity, manifest: &[u8]) -> Result<Vec<u8>> {
    let mut out = STUB_SIGNATURE_PREFIX.to_vec();
    out.extend_from_slice(manifest);
    Ok(out)
}

fn create_minimal_pass() -> Pass {
    let mut pass = Pass::new(PassOptions::default());
    let fields = pass.fields_mut();
    fields.set_description("Concert ticket");
    fields.set_organization_name("Example Events");
    fields.set_pass_type_identifier("pass.com.example.events");
    fields.set_serial_number("E-0001");
    fields.set_team_identifier("A1B2C3D4E5");
    pass.images_mut()
        .add(ImageType::Icon, png(29, 29), Density::X1, None)
        .unwrap()
        .add(ImageType::Logo, png(160, 50), Density::X1, None)
        .unwrap();
    pass.set_identity(Some(SigningIdentity::new(b"cert".to_vec(), b"key".to_vec())));
    pass
}

fn read_bundle(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_string(), data)
        })
        .collect()
}

#[test]
fn invariant_minimal_pass_validates_without_style() {
    let pass = create_minimal_pass();
    assert_eq!(pass.structure().style(), None);
    pass.validate().unwrap();
}

#[test]
fn invariant_assemble_produces_signed_manifest() {
    let pass = create_minimal_pass();
    let bundle = pass.assemble(&stub_signer).unwrap();
    let members = read_bundle(&bundle);

    let names: Vec<_> = members.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["pass.json", "icon.png", "logo.png", "manifest.json", "signature"]);

    let manifest_bytes = &members[3].1;
    let manifest: Value = serde_json::from_slice(manifest_bytes).unwrap();
    let manifest = manifest.as_object().unwrap();
    assert_eq!(manifest.len(), 3);
    for (name, data) in &members[..3] {
        assert_eq!(
            manifest[name.as_str()],
            json!(passforge::hashing::sha1_hex(data))
        );
    }

    let mut expected = STUB_SIGNATURE_PREFIX.to_vec();
    expected.extend_from_slice(manifest_bytes);
    assert_eq!(members[4].1, expected);
}

#[test]
fn invariant_assemble_calls_validate() {
    let mut pass = create_minimal_pass();
    pass.images_mut().remove("logo.png");
    let err = pass.assemble(&stub_signer).unwrap_err();
    assert!(matches!(err, PassError::MissingImage(_)));
}

#[test]
fn invariant_missing_identity_fails_after_validation() {
    let mut pass = create_minimal_pass();
    pass.set_identity(None);
    assert!(matches!(pass.assemble(&stub_signer), Err(PassError::Reference(_))));
}

#[test]
fn invariant_pass_json_carries_single_style() {
    let mut pass = create_minimal_pass();
    pass.structure_mut().set_style(Some(Style::Coupon));
    pass.structure_mut().set_style(Some(Style::EventTicket));
    pass.structure_mut()
        .primary_fields()
        .unwrap()
        .set_value("event", "Spring Gala")
        .unwrap();

    let members = read_bundle(&pass.assemble(&stub_signer).unwrap());
    let descriptor: Value = serde_json::from_slice(&members[0].1).unwrap();
    assert_eq!(descriptor["formatVersion"], json!(1));
    assert!(descriptor.get("coupon").is_none());
    assert_eq!(
        descriptor["eventTicket"],
        json!({"primaryFields": [{"key": "event", "value": "Spring Gala"}]})
    );
}

#[test]
fn invariant_cleared_barcodes_leave_descriptor() {
    let mut pass = create_minimal_pass();
    pass.fields_mut()
        .set_legacy_barcode(Some(Barcode::new(BarcodeFormat::Qr, "legacy")));
    pass.fields_mut()
        .set_barcodes(Some(vec![Barcode::new(BarcodeFormat::Aztec, "E-0001")]));
    let json = pass.to_json().unwrap();
    assert!(json.get("barcodes").is_some());
    assert!(json.get("barcode").is_some());

    pass.fields_mut().set_barcodes(None);
    let json = pass.to_json().unwrap();
    assert!(json.get("barcodes").is_none());
    assert!(json.get("barcode").is_none());
}

#[test]
fn invariant_web_service_needs_token_both_ways() {
    let mut pass = create_minimal_pass();
    pass.fields_mut()
        .set_web_service_url("https://passes.example.com/")
        .unwrap();
    assert!(pass.validate().is_err());

    let mut pass = create_minimal_pass();
    pass.fields_mut()
        .set_authentication_token("0123456789ABCDEF")
        .unwrap();
    assert!(pass.validate().is_err());
}

#[test]
fn invariant_bundle_is_deterministic() {
    let pass = create_minimal_pass();
    let a = pass.assemble(&stub_signer).unwrap();
    let b = pass.assemble(&stub_signer).unwrap();
    assert_eq!(a, b);
}

#[cfg(feature = "test-hooks")]
#[test]
fn invariant_assemble_counts_validation() {
    use passforge::pipeline::{get_validation_call_count, reset_validation_call_count};

    let pass = create_minimal_pass();
    reset_validation_call_count();
    pass.assemble(&stub_signer).unwrap();
    // other tests share the counter, so only a lower bound holds
    assert!(get_validation_call_count() >= 1);
}
