//! EMV QRCPS-MPM data object ids, as profiled by the BR Code manual.

use {
    super::Scope,
    serde::{Serialize, Serializer},
    std::fmt::{self, Display, Formatter},
};

/// Two-digit data object id, `00` to `99`.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct TagId(u8);

impl TagId {
    pub const PAYLOAD_FORMAT_INDICATOR: Self = Self(0);
    pub const POINT_OF_INITIATION: Self = Self(1);
    pub const MERCHANT_ACCOUNT: Self = Self(26);
    pub const MERCHANT_CATEGORY_CODE: Self = Self(52);
    pub const TRANSACTION_CURRENCY: Self = Self(53);
    pub const TRANSACTION_AMOUNT: Self = Self(54);
    pub const COUNTRY_CODE: Self = Self(58);
    pub const MERCHANT_NAME: Self = Self(59);
    pub const MERCHANT_CITY: Self = Self(60);
    pub const POSTAL_CODE: Self = Self(61);
    pub const ADDITIONAL_DATA: Self = Self(62);
    pub const CRC: Self = Self(63);

    // Inside the merchant account template.
    pub const GUI: Self = Self(0);
    pub const PIX_KEY: Self = Self(1);
    pub const DESCRIPTION: Self = Self(2);
    pub const URL: Self = Self(25);

    // Inside the additional data template.
    pub const REFERENCE_LABEL: Self = Self(5);

    /// Returns `None` above `99`.
    pub const fn new(id: u8) -> Option<Self> {
        if id < 100 {
            Some(Self(id))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Merchant account information templates occupy `26..=51`.
    pub const fn is_merchant_account(self) -> bool {
        matches!(self.0, 26..=51)
    }

    pub fn name(self, scope: Scope) -> &'static str {
        match scope {
            Scope::TopLevel => match self.0 {
                0 => "Payload Format Indicator",
                1 => "Point of Initiation Method",
                2..=25 => "Reserved Merchant Account Information",
                26 => "Merchant Account Information (PIX)",
                27..=51 => "Merchant Account Information",
                52 => "Merchant Category Code",
                53 => "Transaction Currency",
                54 => "Transaction Amount",
                55 => "Tip or Convenience Indicator",
                56 => "Value of Convenience Fee Fixed",
                57 => "Value of Convenience Fee Percentage",
                58 => "Country Code",
                59 => "Merchant Name",
                60 => "Merchant City",
                61 => "Postal Code",
                62 => "Additional Data Field Template",
                63 => "CRC",
                64 => "Merchant Information Language Template",
                65..=79 => "RFU for EMVCo",
                _ => "Unreserved Template",
            },
            Scope::MerchantAccount => match self.0 {
                0 => "Globally Unique Identifier",
                1 => "PIX Key",
                2 => "Additional Information",
                25 => "Payload URL",
                _ => "Unknown Merchant Account Field",
            },
            Scope::AdditionalData => match self.0 {
                1 => "Bill Number",
                2 => "Mobile Number",
                3 => "Store Label",
                4 => "Loyalty Number",
                5 => "Reference Label",
                6 => "Customer Label",
                7 => "Terminal Label",
                8 => "Purpose of Transaction",
                9 => "Additional Consumer Data Request",
                10..=49 => "RFU for EMVCo",
                _ => "Payment System Specific Template",
            },
        }
    }
}

impl Display for TagId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl Serialize for TagId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<TagId> for u8 {
    fn from(value: TagId) -> u8 {
        value.0
    }
}
