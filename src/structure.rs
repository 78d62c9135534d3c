//! Pass Structure - Style State Machine
//!
//! A pass has at most one active style. Each style owns its own five field
//! lists; boarding passes add a transit type and store cards an NFC payload.
//! Changing style discards the previous style's data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{Style, TransitType};
use crate::error::{PassError, Result};
use crate::fields::{Field, FieldsMap};
use crate::nfc::NfcPayload;

/// The five display areas of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureField {
    Header,
    Primary,
    Secondary,
    Auxiliary,
    Back,
}

impl StructureField {
    pub const ALL: [StructureField; 5] = [
        StructureField::Header,
        StructureField::Primary,
        StructureField::Secondary,
        StructureField::Auxiliary,
        StructureField::Back,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            StructureField::Header => "headerFields",
            StructureField::Primary => "primaryFields",
            StructureField::Secondary => "secondaryFields",
            StructureField::Auxiliary => "auxiliaryFields",
            StructureField::Back => "backFields",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleFields {
    #[serde(default, skip_serializing_if = "FieldsMap::is_empty")]
    pub header_fields: FieldsMap,
    #[serde(default, skip_serializing_if = "FieldsMap::is_empty")]
    pub primary_fields: FieldsMap,
    #[serde(default, skip_serializing_if = "FieldsMap::is_empty")]
    pub secondary_fields: FieldsMap,
    #[serde(default, skip_serializing_if = "FieldsMap::is_empty")]
    pub auxiliary_fields: FieldsMap,
    #[serde(default, skip_serializing_if = "FieldsMap::is_empty")]
    pub back_fields: FieldsMap,
}

impl StyleFields {
    pub fn get(&self, which: StructureField) -> &FieldsMap {
        match which {
            StructureField::Header => &self.header_fields,
            StructureField::Primary => &self.primary_fields,
            StructureField::Secondary => &self.secondary_fields,
            StructureField::Auxiliary => &self.auxiliary_fields,
            StructureField::Back => &self.back_fields,
        }
    }

    pub fn get_mut(&mut self, which: StructureField) -> &mut FieldsMap {
        match which {
            StructureField::Header => &mut self.header_fields,
            StructureField::Primary => &mut self.primary_fields,
            StructureField::Secondary => &mut self.secondary_fields,
            StructureField::Auxiliary => &mut self.auxiliary_fields,
            StructureField::Back => &mut self.back_fields,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PassStructure {
    #[default]
    Unset,
    BoardingPass {
        fields: StyleFields,
        transit_type: Option<TransitType>,
    },
    Coupon(StyleFields),
    EventTicket(StyleFields),
    StoreCard {
        fields: StyleFields,
        nfc: NfcPayload,
    },
    Generic(StyleFields),
}

impl PassStructure {
    pub fn new() -> Self {
        Self::Unset
    }

    pub fn style(&self) -> Option<Style> {
        match self {
            PassStructure::Unset => None,
            PassStructure::BoardingPass { .. } => Some(Style::BoardingPass),
            PassStructure::Coupon(_) => Some(Style::Coupon),
            PassStructure::EventTicket(_) => Some(Style::EventTicket),
            PassStructure::StoreCard { .. } => Some(Style::StoreCard),
            PassStructure::Generic(_) => Some(Style::Generic),
        }
    }

    /// Switch style. Re-selecting the active style keeps its data; `None`
    /// removes the style entirely.
    pub fn set_style(&mut self, style: Option<Style>) {
        if self.style() == style {
            return;
        }
        *self = match style {
            None => PassStructure::Unset,
            Some(Style::BoardingPass) => PassStructure::BoardingPass {
                fields: StyleFields::default(),
                transit_type: None,
            },
            Some(Style::Coupon) => PassStructure::Coupon(StyleFields::default()),
            Some(Style::EventTicket) => PassStructure::EventTicket(StyleFields::default()),
            Some(Style::StoreCard) => PassStructure::StoreCard {
                fields: StyleFields::default(),
                nfc: NfcPayload::default(),
            },
            Some(Style::Generic) => PassStructure::Generic(StyleFields::default()),
        };
    }

    /// Parse and switch style; an unknown name leaves the structure as it was.
    pub fn set_style_str(&mut self, style: &str) -> Result<()> {
        let style: Style = style.parse()?;
        self.set_style(Some(style));
        Ok(())
    }

    fn style_name(&self) -> &'static str {
        self.style().map_or("undefined", |s| s.as_str())
    }

    pub fn transit_type(&self) -> Result<Option<TransitType>> {
        match self {
            PassStructure::BoardingPass { transit_type, .. } => Ok(*transit_type),
            _ => Err(PassError::reference(format!(
                "transitType field only allowed in Boarding Passes, current pass is {}",
                self.style_name()
            ))),
        }
    }

    /// Setting a transit type on a pass without a style makes it a boarding
    /// pass. Clearing it on such a pass does nothing.
    pub fn set_transit_type(&mut self, value: Option<TransitType>) -> Result<()> {
        if self.style().is_none() {
            if value.is_none() {
                return Ok(());
            }
            self.set_style(Some(Style::BoardingPass));
        }
        match self {
            PassStructure::BoardingPass { transit_type, .. } => {
                *transit_type = value;
                Ok(())
            }
            _ => Err(PassError::reference(
                "transitType field is only allowed at boarding passes",
            )),
        }
    }

    /// String form of `set_transit_type`. The implicit switch to boarding
    /// pass happens before the value is checked.
    pub fn set_transit_type_str(&mut self, value: &str) -> Result<()> {
        if value.is_empty() {
            return self.set_transit_type(None);
        }
        if self.style().is_none() {
            self.set_style(Some(Style::BoardingPass));
        }
        if self.style() != Some(Style::BoardingPass) {
            return Err(PassError::reference(
                "transitType field is only allowed at boarding passes",
            ));
        }
        let parsed: TransitType = value.parse()?;
        self.set_transit_type(Some(parsed))
    }

    pub fn nfc(&self) -> Result<&NfcPayload> {
        match self {
            PassStructure::StoreCard { nfc, .. } => Ok(nfc),
            _ => Err(self.nfc_unavailable()),
        }
    }

    pub fn nfc_mut(&mut self) -> Result<&mut NfcPayload> {
        let err = self.nfc_unavailable();
        match self {
            PassStructure::StoreCard { nfc, .. } => Ok(nfc),
            _ => Err(err),
        }
    }

    fn nfc_unavailable(&self) -> PassError {
        PassError::reference(format!(
            "NFC fields only available for storeCard passes, current is {}",
            self.style_name()
        ))
    }

    fn style_fields(&self) -> Option<&StyleFields> {
        match self {
            PassStructure::Unset => None,
            PassStructure::BoardingPass { fields, .. }
            | PassStructure::StoreCard { fields, .. }
            | PassStructure::Coupon(fields)
            | PassStructure::EventTicket(fields)
            | PassStructure::Generic(fields) => Some(fields),
        }
    }

    fn style_fields_mut(&mut self) -> Option<&mut StyleFields> {
        match self {
            PassStructure::Unset => None,
            PassStructure::BoardingPass { fields, .. }
            | PassStructure::StoreCard { fields, .. }
            | PassStructure::Coupon(fields)
            | PassStructure::EventTicket(fields)
            | PassStructure::Generic(fields) => Some(fields),
        }
    }

    fn no_style() -> PassError {
        PassError::reference(
            "Pass style is undefined, set the pass style before accessing pass structure fields",
        )
    }

    pub fn fields(&self, which: StructureField) -> Result<&FieldsMap> {
        self.style_fields()
            .map(|f| f.get(which))
            .ok_or_else(Self::no_style)
    }

    /// Field list of the active style, ready to be filled.
    pub fn fields_mut(&mut self, which: StructureField) -> Result<&mut FieldsMap> {
        self.style_fields_mut()
            .map(|f| f.get_mut(which))
            .ok_or_else(Self::no_style)
    }

    pub fn header_fields(&mut self) -> Result<&mut FieldsMap> {
        self.fields_mut(StructureField::Header)
    }

    pub fn primary_fields(&mut self) -> Result<&mut FieldsMap> {
        self.fields_mut(StructureField::Primary)
    }

    pub fn secondary_fields(&mut self) -> Result<&mut FieldsMap> {
        self.fields_mut(StructureField::Secondary)
    }

    pub fn auxiliary_fields(&mut self) -> Result<&mut FieldsMap> {
        self.fields_mut(StructureField::Auxiliary)
    }

    pub fn back_fields(&mut self) -> Result<&mut FieldsMap> {
        self.fields_mut(StructureField::Back)
    }

    /// Copy every record of `source` into one of the active style's lists.
    /// The list is left untouched if any record is rejected.
    pub fn copy_fields(&mut self, which: StructureField, source: &FieldsMap) -> Result<()> {
        let target = self.fields_mut(which)?;
        let mut staged = target.clone();
        for field in source.iter() {
            staged.add(field.clone())?;
        }
        *target = staged;
        Ok(())
    }

    /// Rebuild a structure from a descriptor object, replaying every rule
    /// the setters enforce.
    pub fn from_descriptor(descriptor: &Map<String, Value>) -> Result<Self> {
        let present: Vec<Style> = Style::ALL
            .iter()
            .copied()
            .filter(|s| descriptor.contains_key(s.as_str()))
            .collect();

        let mut structure = PassStructure::Unset;
        let style = match present.as_slice() {
            [] => return Ok(structure),
            [style] => *style,
            many => {
                let names: Vec<_> = many.iter().map(|s| s.as_str()).collect();
                return Err(PassError::type_error(format!(
                    "A pass may have only one style, found: {}",
                    names.join(", ")
                )));
            }
        };
        structure.set_style(Some(style));

        let body = match descriptor.get(style.as_str()) {
            Some(Value::Object(body)) => body,
            Some(Value::Null) | None => return Ok(structure),
            Some(other) => {
                return Err(PassError::type_error(format!(
                    "{style} must be an object, received {other}"
                )))
            }
        };

        if style == Style::BoardingPass {
            match body.get("transitType") {
                Some(Value::String(t)) => structure.set_transit_type_str(t)?,
                Some(Value::Null) | None => {}
                Some(other) => {
                    return Err(PassError::type_error(format!(
                        "Unknown transit type {other}"
                    )))
                }
            }
        }
        if style == Style::StoreCard {
            if let Some(nfc) = descriptor.get("nfc").filter(|v| !v.is_null()) {
                *structure.nfc_mut()? = serde_json::from_value(nfc.clone())
                    .map_err(|e| PassError::type_error(format!("Invalid nfc payload: {e}")))?;
            }
        }

        for which in StructureField::ALL {
            match body.get(which.key()) {
                Some(Value::Array(items)) => {
                    let target = structure.fields_mut(which)?;
                    for item in items {
                        target.add(Field::from_json(item)?)?;
                    }
                }
                Some(Value::Null) | None => {}
                Some(other) => {
                    return Err(PassError::type_error(format!(
                        "{} must be an array, received {other}",
                        which.key()
                    )))
                }
            }
        }

        Ok(structure)
    }

    /// Style key and its object as written into the descriptor.
    pub fn style_entry(&self) -> Result<Option<(Style, Value)>> {
        let (Some(style), Some(fields)) = (self.style(), self.style_fields()) else {
            return Ok(None);
        };
        let mut body = serde_json::to_value(fields)?;
        if let (PassStructure::BoardingPass { transit_type: Some(t), .. }, Value::Object(map)) =
            (self, &mut body)
        {
            map.insert("transitType".to_string(), Value::String(t.as_str().to_string()));
        }
        Ok(Some((style, body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_switching_style_discards_previous_fields() {
        let mut s = PassStructure::new();
        s.set_style(Some(Style::Coupon));
        s.primary_fields().unwrap().set_value("offer", "20%").unwrap();
        s.set_style(Some(Style::Coupon));
        assert_eq!(s.fields(StructureField::Primary).unwrap().len(), 1);
        s.set_style(Some(Style::Generic));
        assert!(s.fields(StructureField::Primary).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_style_leaves_model_unchanged() {
        let mut s = PassStructure::new();
        s.set_style(Some(Style::EventTicket));
        assert!(matches!(s.set_style_str("ticket"), Err(PassError::Type(_))));
        assert_eq!(s.style(), Some(Style::EventTicket));
    }

    #[test]
    fn test_transit_type_promotes_unset_to_boarding_pass() {
        let mut s = PassStructure::new();
        s.set_transit_type(None).unwrap();
        assert_eq!(s.style(), None);
        s.set_transit_type(Some(TransitType::Air)).unwrap();
        assert_eq!(s.style(), Some(Style::BoardingPass));
        assert_eq!(s.transit_type().unwrap(), Some(TransitType::Air));
    }

    #[test]
    fn test_transit_type_string_switches_before_checking() {
        let mut s = PassStructure::new();
        assert!(matches!(s.set_transit_type_str("PKTransitTypeZeppelin"), Err(PassError::Type(_))));
        assert_eq!(s.style(), Some(Style::BoardingPass));
    }

    #[test]
    fn test_transit_type_rejected_for_other_styles() {
        let mut s = PassStructure::new();
        s.set_style(Some(Style::Coupon));
        let err = s.transit_type().unwrap_err();
        assert!(matches!(err, PassError::Reference(_)));
        assert!(err.to_string().contains("coupon"));
        assert!(matches!(
            s.set_transit_type(Some(TransitType::Bus)),
            Err(PassError::Reference(_))
        ));
    }

    #[test]
    fn test_nfc_only_for_store_cards() {
        let mut s = PassStructure::new();
        assert!(matches!(s.nfc(), Err(PassError::Reference(_))));
        s.set_style(Some(Style::StoreCard));
        assert!(s.nfc().unwrap().is_empty());
        s.nfc_mut().unwrap().set_message("member-1").unwrap();
        assert!(s.nfc_mut().unwrap().set_message("m".repeat(65)).is_err());
        s.set_style(Some(Style::Generic));
        assert!(matches!(s.nfc(), Err(PassError::Reference(_))));
    }

    #[test]
    fn test_fields_need_a_style() {
        let mut s = PassStructure::new();
        assert!(matches!(s.header_fields(), Err(PassError::Reference(_))));
        assert!(matches!(s.fields(StructureField::Back), Err(PassError::Reference(_))));
    }

    #[test]
    fn test_from_descriptor_replays_rules() {
        let descriptor = json!({
            "boardingPass": {
                "transitType": "PKTransitTypeTrain",
                "headerFields": [{"key": "gate", "value": "23"}],
                "backFields": [{"key": "terms", "label": "Terms", "value": "none"}]
            }
        });
        let s = PassStructure::from_descriptor(descriptor.as_object().unwrap()).unwrap();
        assert_eq!(s.style(), Some(Style::BoardingPass));
        assert_eq!(s.transit_type().unwrap(), Some(TransitType::Train));
        assert_eq!(s.fields(StructureField::Header).unwrap().len(), 1);
        assert_eq!(s.fields(StructureField::Back).unwrap().len(), 1);
    }

    #[test]
    fn test_copy_fields_replays_add() {
        use crate::constants::DateStyle;
        use crate::fields::FieldValue;

        let mut source = FieldsMap::new();
        source.set_value("seat", "14C").unwrap();
        source.set_value("boards", "2024-05-01T08:15+02:00").unwrap();
        source.set_value("gate", "B7").unwrap();
        // set the style after the fact so the source still holds text
        source.get_mut("boards").unwrap().date_style = Some(DateStyle::Short);
        assert!(matches!(source.get("boards").unwrap().value, FieldValue::Text(_)));

        let mut s = PassStructure::new();
        assert!(matches!(
            s.copy_fields(StructureField::Secondary, &source),
            Err(PassError::Reference(_))
        ));

        s.set_style(Some(Style::EventTicket));
        s.copy_fields(StructureField::Secondary, &source).unwrap();
        let copied = s.fields(StructureField::Secondary).unwrap();
        assert_eq!(copied.keys().collect::<Vec<_>>(), ["seat", "boards", "gate"]);
        assert!(matches!(copied.get("boards").unwrap().value, FieldValue::Date(_)));

        source.set_value("boards", "whenever").unwrap();
        assert!(matches!(
            s.copy_fields(StructureField::Back, &source),
            Err(PassError::Type(_))
        ));
        assert!(s.fields(StructureField::Back).unwrap().is_empty());
    }

    #[test]
    fn test_from_descriptor_rejects_two_styles() {
        let descriptor = json!({"coupon": {}, "generic": {}});
        assert!(PassStructure::from_descriptor(descriptor.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_style_entry_omits_empty_lists() {
        let mut s = PassStructure::new();
        s.set_transit_type(Some(TransitType::Boat)).unwrap();
        s.auxiliary_fields().unwrap().set_value("deck", "B").unwrap();
        let (style, body) = s.style_entry().unwrap().unwrap();
        assert_eq!(style, Style::BoardingPass);
        assert_eq!(
            body,
            json!({
                "auxiliaryFields": [{"key": "deck", "value": "B"}],
                "transitType": "PKTransitTypeBoat"
            })
        );
    }
}
