//! Geographic points for pass relevance.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PassError, Result};

/// Coordinates in any of the accepted caller shapes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GeoInput {
    /// `[longitude, latitude, altitude?]`
    Array(Vec<f64>),
    Short {
        lat: f64,
        #[serde(alias = "lon")]
        lng: f64,
        #[serde(default)]
        alt: Option<f64>,
    },
    Long {
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        altitude: Option<f64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        normalize(&GeoInput::Long {
            latitude,
            longitude,
            altitude: None,
        })
    }
}

pub fn normalize(input: &GeoInput) -> Result<GeoPoint> {
    let (longitude, latitude, altitude) = match input {
        GeoInput::Array(v) => match v.as_slice() {
            [lng, lat] => (*lng, *lat, None),
            [lng, lat, alt] => (*lng, *lat, Some(*alt)),
            _ => {
                return Err(PassError::type_error(format!(
                    "Geo point array must be [longitude, latitude, altitude?], received {} values",
                    v.len()
                )))
            }
        },
        GeoInput::Short { lat, lng, alt } => (*lng, *lat, *alt),
        GeoInput::Long {
            latitude,
            longitude,
            altitude,
        } => (*longitude, *latitude, *altitude),
    };

    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(PassError::type_error(format!("Invalid latitude {latitude}")));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(PassError::type_error(format!("Invalid longitude {longitude}")));
    }
    // zero altitude is dropped
    let altitude = altitude.filter(|a| a.is_finite() && *a != 0.0);

    Ok(GeoPoint {
        longitude,
        latitude,
        altitude,
    })
}

/// A relevant location as written into the descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(flatten)]
    pub point: GeoPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_text: Option<String>,
}

impl Location {
    pub fn from_json(value: &Value) -> Result<Self> {
        let input: GeoInput = serde_json::from_value(value.clone())
            .map_err(|_| PassError::type_error(format!("Invalid geo point {value}")))?;
        let relevant_text = value
            .get("relevantText")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(Self {
            point: normalize(&input)?,
            relevant_text,
        })
    }
}
