//! Top-level pass attributes.
//!
//! Every setter follows the same contract: an empty value clears the
//! attribute, anything else is validated and stored, and a rejected value
//! leaves the previous one untouched.

use chrono::{DateTime, FixedOffset};
use serde::{Serialize, Serializer};
use serde_json::Value;
use url::Url;

use crate::barcode::{Barcode, Beacon};
use crate::color::PassColor;
use crate::constants::{MIN_AUTH_TOKEN_LEN, REQUIRED_FIELDS};
use crate::error::{PassError, Result};
use crate::geo::{self, GeoInput, Location};
use crate::w3cdate::{self, DateInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorField {
    Background,
    Foreground,
    Label,
    Strip,
}

impl ColorField {
    pub fn key(&self) -> &'static str {
        match self {
            ColorField::Background => "backgroundColor",
            ColorField::Foreground => "foregroundColor",
            ColorField::Label => "labelColor",
            ColorField::Strip => "stripColor",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassFields {
    #[serde(skip)]
    allow_http: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    organization_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pass_type_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    team_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    grouping_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logo_text: Option<String>,
    #[serde(rename = "appLaunchURL", skip_serializing_if = "Option::is_none")]
    app_launch_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    associated_store_identifiers: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_info: Option<Value>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    sharing_prohibited: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    voided: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    suppress_strip_shine: bool,

    #[serde(serialize_with = "serialize_date", skip_serializing_if = "Option::is_none")]
    expiration_date: Option<DateInput>,
    #[serde(serialize_with = "serialize_date", skip_serializing_if = "Option::is_none")]
    relevant_date: Option<DateInput>,

    #[serde(skip_serializing_if = "Option::is_none")]
    background_color: Option<PassColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    foreground_color: Option<PassColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label_color: Option<PassColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    strip_color: Option<PassColor>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_distance: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    beacons: Option<Vec<Beacon>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    locations: Vec<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    barcodes: Option<Vec<Barcode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    barcode: Option<Barcode>,

    #[serde(rename = "webServiceURL", skip_serializing_if = "Option::is_none")]
    web_service_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authentication_token: Option<String>,
}

fn serialize_date<S: Serializer>(
    value: &Option<DateInput>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(date) => {
            let text = w3cdate::encode_input(date).map_err(serde::ser::Error::custom)?;
            serializer.serialize_str(&text)
        }
        None => serializer.serialize_none(),
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Text of a scalar attribute given as JSON; numbers are accepted verbatim.
fn json_text(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(PassError::type_error(format!(
            "{key} must be a string, received {other}"
        ))),
    }
}

fn coerce_date(key: &str, value: DateInput) -> Result<Option<DateInput>> {
    match value {
        DateInput::Text(s) if s.is_empty() => Ok(None),
        DateInput::Text(s) if w3cdate::is_valid(&s) => Ok(Some(DateInput::Text(s))),
        other => w3cdate::to_timestamp(&other)
            .map(|ts| Some(DateInput::Timestamp(ts)))
            .map_err(|_| {
                PassError::type_error(format!(
                    "Value for {key} must be a valid Date, received {other:?}"
                ))
            }),
    }
}

fn stored_timestamp(value: &Option<DateInput>) -> Option<DateTime<FixedOffset>> {
    value.as_ref().and_then(|d| w3cdate::to_timestamp(d).ok())
}

impl PassFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `http://` web service URLs (development devices only).
    pub fn with_allow_http(allow_http: bool) -> Self {
        Self {
            allow_http,
            ..Self::default()
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, v: &str) {
        self.description = non_empty(v);
    }

    pub fn organization_name(&self) -> Option<&str> {
        self.organization_name.as_deref()
    }

    pub fn set_organization_name(&mut self, v: &str) {
        self.organization_name = non_empty(v);
    }

    pub fn pass_type_identifier(&self) -> Option<&str> {
        self.pass_type_identifier.as_deref()
    }

    pub fn set_pass_type_identifier(&mut self, v: &str) {
        self.pass_type_identifier = non_empty(v);
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.serial_number.as_deref()
    }

    pub fn set_serial_number(&mut self, v: &str) {
        self.serial_number = non_empty(v);
    }

    pub fn team_identifier(&self) -> Option<&str> {
        self.team_identifier.as_deref()
    }

    pub fn set_team_identifier(&mut self, v: &str) {
        self.team_identifier = non_empty(v);
    }

    /// Groups related event tickets or boarding passes.
    pub fn grouping_identifier(&self) -> Option<&str> {
        self.grouping_identifier.as_deref()
    }

    pub fn set_grouping_identifier(&mut self, v: &str) {
        self.grouping_identifier = non_empty(v);
    }

    pub fn logo_text(&self) -> Option<&str> {
        self.logo_text.as_deref()
    }

    pub fn set_logo_text(&mut self, v: &str) {
        self.logo_text = non_empty(v);
    }

    pub fn app_launch_url(&self) -> Option<&str> {
        self.app_launch_url.as_deref()
    }

    pub fn set_app_launch_url(&mut self, v: &str) {
        self.app_launch_url = non_empty(v);
    }

    pub fn user_info(&self) -> Option<&Value> {
        self.user_info.as_ref()
    }

    /// Any JSON value; falsy values clear the attribute.
    pub fn set_user_info(&mut self, v: Option<Value>) {
        self.user_info = v.filter(|v| !is_falsy(v));
    }

    pub fn associated_store_identifiers(&self) -> Option<&[i64]> {
        self.associated_store_identifiers.as_deref()
    }

    /// Keeps integers only; nothing left means the attribute is cleared.
    pub fn set_associated_store_identifiers(&mut self, values: &[Value]) {
        let ids: Vec<i64> = values
            .iter()
            .filter_map(|v| {
                v.as_i64().or_else(|| {
                    v.as_f64()
                        // 2^63 itself is out of range
                        .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                        .map(|f| f as i64)
                })
            })
            .collect();
        self.associated_store_identifiers = (!ids.is_empty()).then_some(ids);
    }

    pub fn sharing_prohibited(&self) -> bool {
        self.sharing_prohibited
    }

    pub fn set_sharing_prohibited(&mut self, v: bool) {
        self.sharing_prohibited = v;
    }

    pub fn voided(&self) -> bool {
        self.voided
    }

    pub fn set_voided(&mut self, v: bool) {
        self.voided = v;
    }

    pub fn suppress_strip_shine(&self) -> bool {
        self.suppress_strip_shine
    }

    pub fn set_suppress_strip_shine(&mut self, v: bool) {
        self.suppress_strip_shine = v;
    }

    pub fn expiration_date(&self) -> Option<DateTime<FixedOffset>> {
        stored_timestamp(&self.expiration_date)
    }

    pub fn set_expiration_date(&mut self, v: Option<DateInput>) -> Result<()> {
        self.expiration_date = match v {
            Some(v) => coerce_date("expirationDate", v)?,
            None => None,
        };
        Ok(())
    }

    pub fn relevant_date(&self) -> Option<DateTime<FixedOffset>> {
        stored_timestamp(&self.relevant_date)
    }

    pub fn set_relevant_date(&mut self, v: Option<DateInput>) -> Result<()> {
        self.relevant_date = match v {
            Some(v) => coerce_date("relevantDate", v)?,
            None => None,
        };
        Ok(())
    }

    pub fn web_service_url(&self) -> Option<&str> {
        self.web_service_url.as_deref()
    }

    pub fn set_web_service_url(&mut self, v: &str) -> Result<()> {
        if v.is_empty() {
            self.web_service_url = None;
            return Ok(());
        }
        let url = Url::parse(v)?;
        if url.scheme() != "https" && !(self.allow_http && url.scheme() == "http") {
            return Err(PassError::type_error("webServiceURL must be on HTTPS!"));
        }
        self.web_service_url = Some(v.to_string());
        Ok(())
    }

    pub fn authentication_token(&self) -> Option<&str> {
        self.authentication_token.as_deref()
    }

    pub fn set_authentication_token(&mut self, v: &str) -> Result<()> {
        if v.is_empty() {
            self.authentication_token = None;
            return Ok(());
        }
        if v.chars().count() < MIN_AUTH_TOKEN_LEN {
            return Err(PassError::type_error(format!(
                "authenticationToken must be {MIN_AUTH_TOKEN_LEN} characters or longer"
            )));
        }
        self.authentication_token = Some(v.to_string());
        Ok(())
    }

    fn color_slot(&mut self, which: ColorField) -> &mut Option<PassColor> {
        match which {
            ColorField::Background => &mut self.background_color,
            ColorField::Foreground => &mut self.foreground_color,
            ColorField::Label => &mut self.label_color,
            ColorField::Strip => &mut self.strip_color,
        }
    }

    pub fn color(&self, which: ColorField) -> Option<PassColor> {
        match which {
            ColorField::Background => self.background_color,
            ColorField::Foreground => self.foreground_color,
            ColorField::Label => self.label_color,
            ColorField::Strip => self.strip_color,
        }
    }

    /// Parse and store a color. A parse failure keeps the old value.
    pub fn set_color(&mut self, which: ColorField, v: &str) -> Result<()> {
        let parsed = if v.is_empty() { None } else { Some(v.parse::<PassColor>()?) };
        *self.color_slot(which) = parsed;
        Ok(())
    }

    pub fn set_background_color(&mut self, v: &str) -> Result<()> {
        self.set_color(ColorField::Background, v)
    }

    pub fn set_foreground_color(&mut self, v: &str) -> Result<()> {
        self.set_color(ColorField::Foreground, v)
    }

    pub fn set_label_color(&mut self, v: &str) -> Result<()> {
        self.set_color(ColorField::Label, v)
    }

    pub fn set_strip_color(&mut self, v: &str) -> Result<()> {
        self.set_color(ColorField::Strip, v)
    }

    /// Meters from a location within which the pass is relevant.
    pub fn max_distance(&self) -> Option<u64> {
        self.max_distance
    }

    pub fn set_max_distance(&mut self, v: u64) {
        self.max_distance = (v > 0).then_some(v);
    }

    pub fn beacons(&self) -> Option<&[Beacon]> {
        self.beacons.as_deref()
    }

    pub fn set_beacons(&mut self, v: Option<Vec<Beacon>>) -> Result<()> {
        if let Some(beacons) = &v {
            if beacons.iter().any(|b| b.proximity_uuid.is_empty()) {
                return Err(PassError::type_error("each beacon must contain proximityUUID"));
            }
        }
        self.beacons = v;
        Ok(())
    }

    pub fn barcodes(&self) -> Option<&[Barcode]> {
        self.barcodes.as_deref()
    }

    /// Clearing also drops the legacy single `barcode` entry.
    pub fn set_barcodes(&mut self, v: Option<Vec<Barcode>>) {
        if v.is_none() {
            self.barcode = None;
        }
        self.barcodes = v;
    }

    pub fn legacy_barcode(&self) -> Option<&Barcode> {
        self.barcode.as_ref()
    }

    pub fn set_legacy_barcode(&mut self, v: Option<Barcode>) {
        self.barcode = v;
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn add_location(&mut self, point: &GeoInput, relevant_text: Option<&str>) -> Result<&mut Self> {
        let point = geo::normalize(point)?;
        self.locations.push(Location {
            point,
            relevant_text: relevant_text.map(str::to_string),
        });
        Ok(self)
    }

    pub fn set_locations(&mut self, v: Vec<Location>) {
        self.locations = v;
    }

    /// Apply an attribute given as JSON, with the same checks as the typed
    /// setters. Returns `false` for keys that are not top-level attributes.
    pub fn apply_json(&mut self, key: &str, value: &Value) -> Result<bool> {
        let falsy = is_falsy(value);
        match key {
            "description" | "organizationName" | "passTypeIdentifier" | "serialNumber"
            | "teamIdentifier" | "groupingIdentifier" | "logoText" | "appLaunchURL" => {
                let text = if falsy { String::new() } else { json_text(key, value)? };
                match key {
                    "description" => self.set_description(&text),
                    "organizationName" => self.set_organization_name(&text),
                    "passTypeIdentifier" => self.set_pass_type_identifier(&text),
                    "serialNumber" => self.set_serial_number(&text),
                    "teamIdentifier" => self.set_team_identifier(&text),
                    "groupingIdentifier" => self.set_grouping_identifier(&text),
                    "logoText" => self.set_logo_text(&text),
                    _ => self.set_app_launch_url(&text),
                }
            }
            "userInfo" => self.set_user_info(Some(value.clone())),
            "sharingProhibited" => self.set_sharing_prohibited(!falsy),
            "voided" => self.set_voided(!falsy),
            "suppressStripShine" => self.set_suppress_strip_shine(!falsy),
            "associatedStoreIdentifiers" => match value {
                Value::Array(items) => self.set_associated_store_identifiers(items),
                _ => self.associated_store_identifiers = None,
            },
            "expirationDate" | "relevantDate" => {
                let date = if falsy {
                    None
                } else {
                    Some(DateInput::Text(json_text(key, value)?))
                };
                if key == "expirationDate" {
                    self.set_expiration_date(date)?;
                } else {
                    self.set_relevant_date(date)?;
                }
            }
            "webServiceURL" => {
                let text = if falsy { String::new() } else { json_text(key, value)? };
                self.set_web_service_url(&text)?;
            }
            "authenticationToken" => {
                let text = match value {
                    _ if falsy => String::new(),
                    Value::String(s) => s.clone(),
                    other => {
                        return Err(PassError::type_error(format!(
                            "authenticationToken must be a string, received {other}"
                        )))
                    }
                };
                self.set_authentication_token(&text)?;
            }
            "backgroundColor" | "foregroundColor" | "labelColor" | "stripColor" => {
                let which = match key {
                    "backgroundColor" => ColorField::Background,
                    "foregroundColor" => ColorField::Foreground,
                    "labelColor" => ColorField::Label,
                    _ => ColorField::Strip,
                };
                let text = if falsy { String::new() } else { json_text(key, value)? };
                self.set_color(which, &text)?;
            }
            "maxDistance" => {
                if falsy {
                    self.max_distance = None;
                } else {
                    let meters = value.as_u64().ok_or_else(|| {
                        PassError::type_error(
                            "maxDistance must be a positive integer distance in meters!",
                        )
                    })?;
                    self.set_max_distance(meters);
                }
            }
            "beacons" => match value {
                Value::Array(items) => {
                    let beacons = items.iter().map(Beacon::from_json).collect::<Result<Vec<_>>>()?;
                    self.set_beacons(Some(beacons))?;
                }
                _ => self.beacons = None,
            },
            "barcodes" => match value {
                _ if falsy => self.set_barcodes(None),
                Value::Array(items) => {
                    let barcodes = items.iter().map(Barcode::from_json).collect::<Result<Vec<_>>>()?;
                    self.set_barcodes(Some(barcodes));
                }
                other => {
                    return Err(PassError::type_error(format!(
                        "barcodes must be an Array, received {other}"
                    )))
                }
            },
            "barcode" => {
                let legacy = if falsy { None } else { Some(Barcode::from_json(value)?) };
                self.set_legacy_barcode(legacy);
            }
            "locations" => match value {
                _ if falsy => self.locations.clear(),
                Value::Array(items) => {
                    let locations = items.iter().map(Location::from_json).collect::<Result<Vec<_>>>()?;
                    self.set_locations(locations);
                }
                _ => return Err(PassError::type_error("locations must be an array")),
            },
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Names of the required attributes that are not set.
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .into_iter()
            .filter(|name| !self.is_set(name))
            .collect()
    }

    fn is_set(&self, name: &str) -> bool {
        match name {
            "description" => self.description.is_some(),
            "organizationName" => self.organization_name.is_some(),
            "passTypeIdentifier" => self.pass_type_identifier.is_some(),
            "serialNumber" => self.serial_number.is_some(),
            "teamIdentifier" => self.team_identifier.is_some(),
            _ => false,
        }
    }
}
