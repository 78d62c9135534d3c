//! Structure fields: ordered, key-unique display records.
//!
//! Insertion order is display order. Re-adding an existing key replaces the
//! record in place without moving it.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::constants::{DataDetector, DateStyle, NumberStyle, TextAlignment};
use crate::error::{PassError, Result};
use crate::w3cdate::{self, DateInput};

/// Value shown by a field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
    #[serde(skip_deserializing)]
    Date(DateTime<FixedOffset>),
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Number(n) => n.serialize(serializer),
            FieldValue::Date(ts) => serializer.serialize_str(&w3cdate::encode(ts)),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Number(v.into())
    }
}

impl From<DateTime<FixedOffset>> for FieldValue {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Self::Date(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Date(v.fixed_offset())
    }
}

impl FieldValue {
    fn to_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            FieldValue::Date(ts) => Some(*ts),
            FieldValue::Text(s) => w3cdate::to_timestamp(&DateInput::Text(s.clone())).ok(),
            // numbers are epoch milliseconds
            FieldValue::Number(n) => n
                .as_i64()
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                .map(|ts| ts.fixed_offset()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub value: FieldValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributed_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_alignment: Option<TextAlignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_detector_types: Option<Vec<DataDetector>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_style: Option<NumberStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_style: Option<DateStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_style: Option<DateStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignores_time_zone: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_relative: Option<bool>,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            label: None,
            value: value.into(),
            attributed_value: None,
            change_message: None,
            text_alignment: None,
            data_detector_types: None,
            currency_code: None,
            number_style: None,
            date_style: None,
            time_style: None,
            ignores_time_zone: None,
            is_relative: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Build a field from untyped JSON, reporting shape errors the way
    /// `FieldsMap::add` would.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            PassError::type_error(format!("A field must be an object, received {value}"))
        })?;
        match obj.get("key") {
            Some(Value::String(_)) => {}
            other => {
                return Err(PassError::type_error(format!(
                    "To add a field you must provide string key value, received {}",
                    other.map_or("nothing".to_string(), |v| v.to_string())
                )))
            }
        }
        if !obj.contains_key("value") {
            return Err(PassError::type_error(format!(
                "To add a field you must provide a value field, received: {value}"
            )));
        }
        serde_json::from_value(value.clone())
            .map_err(|e| PassError::type_error(format!("Invalid field {value}: {e}")))
    }
}

/// Formatting options for `FieldsMap::set_date_time`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeOptions {
    #[serde(default)]
    pub date_style: Option<DateStyle>,
    #[serde(default)]
    pub time_style: Option<DateStyle>,
    #[serde(default)]
    pub ignores_time_zone: Option<bool>,
    #[serde(default)]
    pub is_relative: Option<bool>,
    #[serde(default)]
    pub change_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Vec<Value>")]
pub struct FieldsMap {
    fields: Vec<Field>,
}

impl FieldsMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.key == key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Field> {
        let idx = self.fields.iter().position(|f| f.key == key)?;
        Some(self.fields.remove(idx))
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Add a field to the end of the list, or replace the field with the
    /// same key where it stands.
    pub fn add(&mut self, mut field: Field) -> Result<&mut Self> {
        if field.key.is_empty() {
            return Err(PassError::type_error(
                "To add a field you must provide a non-empty key",
            ));
        }
        if field.date_style.is_some() {
            let ts = field.value.to_timestamp().ok_or_else(|| {
                PassError::type_error(format!(
                    "When dateStyle specified the value must be a valid date, received {:?}",
                    field.value
                ))
            })?;
            field.value = FieldValue::Date(ts);
        }
        self.upsert(field);
        Ok(self)
    }

    /// Set only the value of a field, keeping its other properties.
    pub fn set_value(&mut self, key: &str, value: impl Into<String>) -> Result<&mut Self> {
        if key.is_empty() {
            return Err(PassError::type_error("key for set_value must be a non-empty string"));
        }
        let value = FieldValue::Text(value.into());
        match self.get_mut(key) {
            Some(field) => field.value = value,
            None => self.fields.push(Field::new(key, value)),
        }
        Ok(self)
    }

    /// Set a date-valued field. Date and time styles go together or not at all.
    pub fn set_date_time(
        &mut self,
        key: &str,
        label: &str,
        date: impl Into<DateInput>,
        options: DateTimeOptions,
    ) -> Result<&mut Self> {
        if key.is_empty() {
            return Err(PassError::type_error("Key must be a non-empty string"));
        }
        let date = w3cdate::to_timestamp(&date.into())?;
        if options.date_style.is_some() != options.time_style.is_some() {
            return Err(PassError::reference(
                "Either specify both a date style and a time style, or neither",
            ));
        }
        let DateTimeOptions {
            date_style,
            time_style,
            ignores_time_zone,
            is_relative,
            change_message,
        } = options;
        self.upsert(Field {
            label: Some(label.to_string()),
            change_message,
            date_style,
            time_style,
            ignores_time_zone,
            is_relative,
            ..Field::new(key, FieldValue::Date(date))
        });
        Ok(self)
    }

    fn upsert(&mut self, field: Field) {
        match self.fields.iter_mut().find(|f| f.key == field.key) {
            Some(slot) => *slot = field,
            None => self.fields.push(field),
        }
    }
}

impl Serialize for FieldsMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.fields)
    }
}

impl TryFrom<Vec<Value>> for FieldsMap {
    type Error = PassError;

    fn try_from(values: Vec<Value>) -> Result<Self> {
        let mut map = FieldsMap::new();
        for value in &values {
            map.add(Field::from_json(value)?)?;
        }
        Ok(map)
    }
}
