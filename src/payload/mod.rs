//! Payload assembly and decoding.
//!
//! Encoding is two phase. [`Encoder::unsigned`] frames every tag except the
//! checksum. [`UnsignedPayload::sign`] then computes the CRC over that text
//! followed by the checksum tag's own header `6304`, and appends the four hex
//! digits. The checksum is computed once, last, and never patched.

mod conformance;
mod fields;

pub use self::{
    conformance::Violation,
    fields::{MerchantSettings, PixFields, PixKeyKind, PointOfInitiation},
};
use {
    crate::{
        amount::MAX_AMOUNT_LEN,
        crc::CRC_TAG_HEADER,
        normalize::{self, Leniency},
        tlv::{self, Codec, Scope, Tag, TagId, TlvCodec, MAX_VALUE_LEN},
        Amount, Checksum, ConfigError, Error, Result,
    },
    serde::Serialize,
    std::{
        collections::BTreeMap,
        fmt::{self, Display, Formatter},
    },
    tracing::{debug, warn},
};

pub const PAYLOAD_FORMAT_INDICATOR: &str = "01";
pub const PIX_GUI: &str = "BR.GOV.BCB.PIX";
pub const CURRENCY_BRL: &str = "986";
pub const COUNTRY_BR: &str = "BR";
pub const DEFAULT_CATEGORY_CODE: &str = "0000";

/// Reference label used when none is given.
pub const NO_REFERENCE: &str = "***";

/// Encodes with the default [`Encoder`].
pub fn build_payload(fields: &PixFields) -> Result<PixPayload> {
    Encoder::default().encode(fields)
}

/// Decodes with the default [`TlvCodec`].
pub fn parse_payload(payload: &str) -> Result<DecodedPayload> {
    DecodedPayload::parse_with(&TlvCodec::default(), payload)
}

/// Encoding options that are not part of the per-payment fields.
#[derive(Clone, Debug)]
pub struct Encoder {
    pub point_of_initiation: PointOfInitiation,

    /// ISO 18245 merchant category code, four digits.
    pub category_code: String,

    /// What to do with text fields longer than the format allows.
    pub truncation: Leniency,

    /// What to do with a PIX key that is not ASCII. Keys are never rewritten,
    /// and their length is counted in bytes.
    pub non_ascii_key: Leniency,
}

impl Default for Encoder {
    fn default() -> Self {
        Self {
            point_of_initiation: PointOfInitiation::default(),
            category_code:       DEFAULT_CATEGORY_CODE.to_owned(),
            truncation:          Leniency::Warn,
            non_ascii_key:       Leniency::Warn,
        }
    }
}

impl Encoder {
    pub fn encode(&self, fields: &PixFields) -> Result<PixPayload> {
        Ok(self.unsigned(fields)?.sign())
    }

    /// Frames every tag but the checksum, in the fixed order payment apps
    /// expect.
    pub fn unsigned(&self, fields: &PixFields) -> Result<UnsignedPayload> {
        fields.validate()?;
        let mcc = &self.category_code;
        if mcc.len() != 4 || !mcc.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidCategoryCode(self.category_code.clone()));
        }
        if !fields.pix_key.is_ascii() {
            self.non_ascii_key.check("PIX key is not ASCII", || {
                Error::NonAsciiKey(fields.pix_key.clone())
            })?;
        }
        let leniency = self.truncation;

        let mut account = vec![
            Tag::leaf(TagId::GUI, PIX_GUI)?,
            Tag::leaf(TagId::PIX_KEY, fields.pix_key.as_str())?,
        ];
        if let Some(description) = &fields.description {
            // The description also has to fit in what the key leaves of the
            // template.
            let used = account.iter().map(Tag::encoded_len).sum::<usize>() + 4;
            let room = MAX_VALUE_LEN.saturating_sub(used);
            let description = normalize::description(description, leniency)?;
            let description = normalize::clamp("description", description, room, leniency)?;
            if !description.is_empty() {
                account.push(Tag::leaf(TagId::DESCRIPTION, description)?);
            }
        }

        let mut reference = normalize::reference_label(&fields.transaction_reference, leniency)?;
        if reference.is_empty() {
            reference = NO_REFERENCE.to_owned();
        }

        let mut tags = vec![
            Tag::leaf(TagId::PAYLOAD_FORMAT_INDICATOR, PAYLOAD_FORMAT_INDICATOR)?,
            Tag::leaf(TagId::POINT_OF_INITIATION, self.point_of_initiation.code())?,
            Tag::nested(TagId::MERCHANT_ACCOUNT, account)?,
            Tag::leaf(TagId::MERCHANT_CATEGORY_CODE, self.category_code.as_str())?,
            Tag::leaf(TagId::TRANSACTION_CURRENCY, CURRENCY_BRL)?,
        ];
        if let Some(amount) = fields.amount.and_then(Amount::to_field) {
            if amount.len() > MAX_AMOUNT_LEN {
                return Err(Error::InvalidAmount(amount));
            }
            tags.push(Tag::leaf(TagId::TRANSACTION_AMOUNT, amount)?);
        }
        tags.push(Tag::leaf(TagId::COUNTRY_CODE, COUNTRY_BR)?);
        let merchant_name = normalize::merchant_name(&fields.merchant_name, leniency)?;
        if merchant_name.is_empty() {
            return Err(ConfigError::MissingMerchantName.into());
        }
        tags.push(Tag::leaf(TagId::MERCHANT_NAME, merchant_name)?);
        let merchant_city = normalize::merchant_city(&fields.merchant_city, leniency)?;
        if merchant_city.is_empty() {
            return Err(ConfigError::MissingMerchantCity.into());
        }
        tags.push(Tag::leaf(TagId::MERCHANT_CITY, merchant_city)?);
        if let Some(postal_code) = &fields.postal_code {
            let postal_code = normalize::postal_code(postal_code, leniency)?;
            if !postal_code.is_empty() {
                tags.push(Tag::leaf(TagId::POSTAL_CODE, postal_code)?);
            }
        }
        tags.push(Tag::nested(TagId::ADDITIONAL_DATA, vec![Tag::leaf(
            TagId::REFERENCE_LABEL,
            reference,
        )?])?);

        let text = tlv::encode_tags(&tags);
        Ok(UnsignedPayload { tags, text })
    }
}

/// All tags except the checksum.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnsignedPayload {
    tags: Vec<Tag>,
    text: String,
}

impl UnsignedPayload {
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Appends the checksum tag. The CRC covers the tag header `6304` too.
    pub fn sign(self) -> PixPayload {
        let mut text = self.text;
        text.push_str(CRC_TAG_HEADER);
        let checksum = Checksum::compute(text.as_bytes());
        text.push_str(&checksum.to_string());
        debug!(len = text.len(), %checksum, "encoded BR Code payload");
        PixPayload { text, checksum }
    }
}

/// A complete BR Code. Immutable: changing a field means encoding again.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PixPayload {
    text:     String,
    checksum: Checksum,
}

impl PixPayload {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub const fn checksum(&self) -> Checksum {
        self.checksum
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl AsRef<str> for PixPayload {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl Display for PixPayload {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A parsed payload. A checksum mismatch is reported in `crc_valid` rather
/// than as an error, so that broken payloads can still be inspected. Callers
/// must refuse payment when it is `false`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DecodedPayload {
    pub tags:      Vec<Tag>,
    pub crc_valid: bool,

    /// The trailing four characters, if they are hex.
    pub checksum: Option<Checksum>,

    /// CRC of everything before the trailing four characters.
    pub computed_checksum: Checksum,
}

impl DecodedPayload {
    pub fn parse_with(codec: &TlvCodec, payload: &str) -> Result<Self> {
        let tags = Codec::<Vec<Tag>>::decode(codec, &mut payload.as_bytes(), Scope::TopLevel)?;

        let bytes = payload.as_bytes();
        let split = bytes.len().saturating_sub(4);
        let computed_checksum = Checksum::compute(&bytes[..split]);
        let checksum: Option<Checksum> =
            payload.get(split..).and_then(|tail| tail.parse().ok());
        let terminated = tags
            .last()
            .is_some_and(|tag| tag.id() == TagId::CRC && tag.value().encoded_len() == 4);
        let crc_valid = terminated && checksum == Some(computed_checksum);

        if crc_valid {
            debug!(tags = tags.len(), "decoded BR Code payload");
        } else {
            warn!(
                declared = ?checksum,
                computed = %computed_checksum,
                "BR Code checksum does not match"
            );
        }
        Ok(Self {
            tags,
            crc_valid,
            checksum,
            computed_checksum,
        })
    }

    pub fn tag(&self, id: TagId) -> Option<&Tag> {
        Tag::find(&self.tags, id)
    }

    /// Text of a top-level leaf.
    pub fn get(&self, id: TagId) -> Option<&str> {
        self.tag(id)?.value().as_leaf()
    }

    /// Text of a leaf inside a template.
    pub fn get_sub(&self, template: TagId, id: TagId) -> Option<&str> {
        Tag::find(self.tag(template)?.value().children(), id)?
            .value()
            .as_leaf()
    }

    pub fn payload_format_indicator(&self) -> Option<&str> {
        self.get(TagId::PAYLOAD_FORMAT_INDICATOR)
    }

    pub fn point_of_initiation(&self) -> Option<PointOfInitiation> {
        PointOfInitiation::from_code(self.get(TagId::POINT_OF_INITIATION)?)
    }

    pub fn gui(&self) -> Option<&str> {
        self.get_sub(TagId::MERCHANT_ACCOUNT, TagId::GUI)
    }

    pub fn pix_key(&self) -> Option<&str> {
        self.get_sub(TagId::MERCHANT_ACCOUNT, TagId::PIX_KEY)
    }

    pub fn description(&self) -> Option<&str> {
        self.get_sub(TagId::MERCHANT_ACCOUNT, TagId::DESCRIPTION)
    }

    /// Location of a dynamic payload, in place of a key.
    pub fn url(&self) -> Option<&str> {
        self.get_sub(TagId::MERCHANT_ACCOUNT, TagId::URL)
    }

    pub fn merchant_category_code(&self) -> Option<&str> {
        self.get(TagId::MERCHANT_CATEGORY_CODE)
    }

    pub fn currency(&self) -> Option<&str> {
        self.get(TagId::TRANSACTION_CURRENCY)
    }

    /// Raw text of the amount tag.
    pub fn amount_text(&self) -> Option<&str> {
        self.get(TagId::TRANSACTION_AMOUNT)
    }

    /// `None` if the tag is absent or not a decimal amount.
    pub fn amount(&self) -> Option<Amount> {
        self.amount_text()?.parse().ok()
    }

    pub fn country_code(&self) -> Option<&str> {
        self.get(TagId::COUNTRY_CODE)
    }

    pub fn merchant_name(&self) -> Option<&str> {
        self.get(TagId::MERCHANT_NAME)
    }

    pub fn merchant_city(&self) -> Option<&str> {
        self.get(TagId::MERCHANT_CITY)
    }

    pub fn postal_code(&self) -> Option<&str> {
        self.get(TagId::POSTAL_CODE)
    }

    pub fn reference_label(&self) -> Option<&str> {
        self.get_sub(TagId::ADDITIONAL_DATA, TagId::REFERENCE_LABEL)
    }

    /// Raw values keyed by id. Sub-tags of templates are keyed as
    /// `template.id`, for example `26.01` for the PIX key, next to the raw
    /// template value itself.
    pub fn fields(&self) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        for tag in &self.tags {
            fields.insert(tag.id().to_string(), tag.raw_value());
            for child in tag.value().children() {
                fields.insert(format!("{}.{}", tag.id(), child.id()), child.raw_value());
            }
        }
        fields
    }

    /// Checks the payload against the BR Code profile.
    pub fn conformance(&self) -> Vec<Violation> {
        conformance::check(self)
    }
}
