//! Wire constants of the pass descriptor format.
//!
//! Each enum serializes to the exact string the wallet consumer expects and
//! parses back from it with `FromStr`.

use serde::{Deserialize, Serialize};

use crate::error::{PassError, Result};

pub const PASS_MIME_TYPE: &str = "application/vnd.apple.pkpass";

/// `formatVersion` written into every descriptor.
pub const FORMAT_VERSION: u32 = 1;

/// Top-level keys that must be present before a pass can be assembled.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "description",
    "organizationName",
    "passTypeIdentifier",
    "serialNumber",
    "teamIdentifier",
];

pub const MIN_AUTH_TOKEN_LEN: usize = 16;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($what:literal) {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = PassError;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => {
                        let allowed: Vec<_> = Self::ALL.iter().map(|v| v.as_str()).collect();
                        Err(PassError::type_error(format!(
                            "Invalid {} \"{}\", expected one of: {}",
                            $what,
                            other,
                            allowed.join(", ")
                        )))
                    }
                }
            }
        }
    };
}

wire_enum! {
    /// Mutually exclusive pass category.
    Style ("pass style") {
        BoardingPass => "boardingPass",
        Coupon => "coupon",
        EventTicket => "eventTicket",
        StoreCard => "storeCard",
        Generic => "generic",
    }
}

wire_enum! {
    TransitType ("transit type") {
        Air => "PKTransitTypeAir",
        Boat => "PKTransitTypeBoat",
        Bus => "PKTransitTypeBus",
        Train => "PKTransitTypeTrain",
        Generic => "PKTransitTypeGeneric",
    }
}

wire_enum! {
    BarcodeFormat ("barcode format") {
        Qr => "PKBarcodeFormatQR",
        Pdf417 => "PKBarcodeFormatPDF417",
        Aztec => "PKBarcodeFormatAztec",
        Code128 => "PKBarcodeFormatCode128",
    }
}

wire_enum! {
    /// Used for both `dateStyle` and `timeStyle`.
    DateStyle ("date style") {
        None => "PKDateStyleNone",
        Short => "PKDateStyleShort",
        Medium => "PKDateStyleMedium",
        Long => "PKDateStyleLong",
        Full => "PKDateStyleFull",
    }
}

wire_enum! {
    TextAlignment ("text alignment") {
        Left => "PKTextAlignmentLeft",
        Center => "PKTextAlignmentCenter",
        Right => "PKTextAlignmentRight",
        Natural => "PKTextAlignmentNatural",
    }
}

wire_enum! {
    DataDetector ("data detector type") {
        PhoneNumber => "PKDataDetectorTypePhoneNumber",
        Link => "PKDataDetectorTypeLink",
        Address => "PKDataDetectorTypeAddress",
        CalendarEvent => "PKDataDetectorTypeCalendarEvent",
    }
}

wire_enum! {
    NumberStyle ("number style") {
        Decimal => "PKNumberStyleDecimal",
        Percent => "PKNumberStylePercent",
        Scientific => "PKNumberStyleScientific",
        SpellOut => "PKNumberStyleSpellOut",
    }
}
